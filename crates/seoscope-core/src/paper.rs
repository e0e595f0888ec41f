//! The content under analysis.
//!
//! A [`Paper`] is built once per analysis request from a [`PaperInput`] and
//! never changes afterwards. Derived values (the parsed document, the
//! keyphrase, the slug) are computed on first use and memoized.

use std::sync::OnceLock;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::markdown::Document;
use crate::text;

/// Paper fields as they arrive from a caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct PaperInput {
    /// Body text: CommonMark, optionally with embedded HTML.
    pub text: String,
    /// SEO title.
    pub title: String,
    /// Meta description.
    pub description: String,
    /// URL or slug of the page.
    pub url: String,
    /// Focus keyphrase. Wrap it in double quotes to require an exact match.
    pub keyword: String,
    /// Comma-separated keyphrase synonyms.
    pub synonyms: String,
    /// Content locale, e.g. `en_US`. Empty means the configured locale.
    pub locale: String,
    /// Canonical URL; decides which links are internal.
    pub permalink: String,
    /// Rendered title width in pixels, when the caller measured it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title_width: Option<f64>,
}

/// A parsed keyphrase or synonym.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keyphrase {
    /// The phrase as entered, without surrounding quotes.
    pub text: String,
    /// Normalized words of the phrase.
    pub words: Vec<String>,
    /// Whether the phrase was quoted and must match word for word.
    pub exact: bool,
}

impl Keyphrase {
    /// Parse a phrase; `None` when it contains no words.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        let unquoted = trimmed
            .strip_prefix(['"', '“'])
            .and_then(|rest| rest.strip_suffix(['"', '”']));
        let exact = unquoted.is_some();
        let phrase = unquoted.unwrap_or(trimmed).trim();
        let words = text::normalized_words(phrase);
        if words.is_empty() {
            return None;
        }
        Some(Self {
            text: phrase.to_string(),
            words,
            exact,
        })
    }
}

/// Immutable snapshot of one piece of content.
#[derive(Debug, Default)]
pub struct Paper {
    input: PaperInput,
    document: OnceLock<Document>,
    keyphrase: OnceLock<Option<Keyphrase>>,
    synonyms: OnceLock<Vec<Keyphrase>>,
    slug: OnceLock<String>,
}

impl From<PaperInput> for Paper {
    fn from(input: PaperInput) -> Self {
        Self::new(input)
    }
}

impl Clone for Paper {
    fn clone(&self) -> Self {
        Self::new(self.input.clone())
    }
}

impl Paper {
    /// Freeze the caller's fields into a paper.
    pub fn new(input: PaperInput) -> Self {
        Self {
            input,
            document: OnceLock::new(),
            keyphrase: OnceLock::new(),
            synonyms: OnceLock::new(),
            slug: OnceLock::new(),
        }
    }

    /// The fields this paper was built from.
    pub const fn input(&self) -> &PaperInput {
        &self.input
    }

    /// Raw body text.
    pub fn text(&self) -> &str {
        &self.input.text
    }

    /// SEO title.
    pub fn title(&self) -> &str {
        &self.input.title
    }

    /// Meta description.
    pub fn description(&self) -> &str {
        &self.input.description
    }

    /// Page URL or slug as given.
    pub fn url(&self) -> &str {
        &self.input.url
    }

    /// Keyphrase as given.
    pub fn keyword(&self) -> &str {
        &self.input.keyword
    }

    /// Content locale as given.
    pub fn locale(&self) -> &str {
        &self.input.locale
    }

    /// Canonical URL as given.
    pub fn permalink(&self) -> &str {
        &self.input.permalink
    }

    /// Caller-measured title width.
    pub const fn title_width(&self) -> Option<f64> {
        self.input.title_width
    }

    /// Whether the body has any non-whitespace text.
    pub fn has_text(&self) -> bool {
        !self.input.text.trim().is_empty()
    }

    /// Whether a keyphrase with at least one word was given.
    pub fn has_keyword(&self) -> bool {
        self.keyphrase().is_some()
    }

    /// Whether a title was given.
    pub fn has_title(&self) -> bool {
        !self.input.title.trim().is_empty()
    }

    /// Whether a meta description was given.
    pub fn has_description(&self) -> bool {
        !self.input.description.trim().is_empty()
    }

    /// Whether a URL or permalink was given.
    pub fn has_url(&self) -> bool {
        !self.slug().is_empty()
    }

    /// The parsed body.
    pub fn document(&self) -> &Document {
        self.document.get_or_init(|| Document::parse(&self.input.text))
    }

    /// The parsed keyphrase.
    pub fn keyphrase(&self) -> Option<&Keyphrase> {
        self.keyphrase
            .get_or_init(|| Keyphrase::parse(&self.input.keyword))
            .as_ref()
    }

    /// The parsed synonyms, empty entries dropped.
    pub fn synonyms(&self) -> &[Keyphrase] {
        self.synonyms.get_or_init(|| {
            self.input
                .synonyms
                .split(',')
                .filter_map(Keyphrase::parse)
                .collect()
        })
    }

    /// The keyphrase followed by its synonyms.
    pub fn keyphrase_forms(&self) -> impl Iterator<Item = &Keyphrase> {
        self.keyphrase().into_iter().chain(self.synonyms())
    }

    /// Last path segment of the URL (or permalink), lowercased, without
    /// query, fragment or file extension.
    pub fn slug(&self) -> &str {
        self.slug.get_or_init(|| {
            let source = if self.input.url.trim().is_empty() {
                &self.input.permalink
            } else {
                &self.input.url
            };
            slug_of(source)
        })
    }
}

fn slug_of(url: &str) -> String {
    let without_scheme = url
        .split_once("://")
        .map_or(url, |(_, rest)| rest.split_once('/').map_or("", |(_, path)| path));
    let path = without_scheme
        .split(['?', '#'])
        .next()
        .unwrap_or_default();
    let segment = path
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default();
    let segment = segment
        .rsplit_once('.')
        .filter(|(_, ext)| matches!(*ext, "html" | "htm" | "php" | "aspx"))
        .map_or(segment, |(stem, _)| stem);
    segment.trim().to_lowercase()
}
