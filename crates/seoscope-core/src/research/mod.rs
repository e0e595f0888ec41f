//! Researches: named fact extractors over a paper.
//!
//! A research is a plain function from a [`ResearchContext`] to a [`Fact`].
//! The [`ResearchRegistry`] maps names to functions for one language: the
//! language-neutral set first, then whatever the language pack adds or
//! overrides. A [`Researcher`] runs researches for one analysis, applying
//! content filters once up front and memoizing every fact it computes.
//!
//! Researches never fail. Empty input produces a zero fact, and a research
//! that panics is recorded as [`Fact::Empty`].

use std::borrow::Cow;
use std::cell::{OnceCell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::rc::Rc;

use crate::language::LanguagePack;
use crate::markdown::{Document, Heading};
use crate::paper::{Keyphrase, Paper};
use crate::pluggable::{FilterHook, FilterSet};
use crate::text;

pub mod keyphrase;
pub mod readability;
pub mod structure;

/// Signature shared by every research.
pub type ResearchFn = fn(&ResearchContext<'_>) -> Fact;

/// Link counts split by destination and `rel=nofollow`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkStatistics {
    /// Every link with a usable target.
    pub total: usize,
    /// Links to other sites without `nofollow`.
    pub external_followed: usize,
    /// Links to other sites with `nofollow`.
    pub external_nofollow: usize,
    /// Links within the site without `nofollow`.
    pub internal_followed: usize,
    /// Links within the site with `nofollow`.
    pub internal_nofollow: usize,
}

impl LinkStatistics {
    /// Number of links to other sites.
    pub const fn external(&self) -> usize {
        self.external_followed + self.external_nofollow
    }

    /// Number of links within the site.
    pub const fn internal(&self) -> usize {
        self.internal_followed + self.internal_nofollow
    }
}

/// Image counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImageStatistics {
    /// Every image.
    pub total: usize,
    /// Images with non-empty alt text.
    pub with_alt: usize,
    /// Images whose alt text contains the keyphrase or a synonym.
    pub keyphrase_in_alt: usize,
}

/// Where the keyphrase shows up in the first paragraph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntroductionMatch {
    /// All keyphrase words appear within one sentence.
    pub in_one_sentence: bool,
    /// All keyphrase words appear somewhere in the paragraph.
    pub in_paragraph: bool,
    /// The sentence that matched, if any.
    pub sentence: Option<String>,
}

/// How the keyphrase appears in the title.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TitleMatch {
    /// The phrase appears word for word.
    pub exact: bool,
    /// The exact phrase opens the title.
    pub at_start: bool,
    /// Every content word appears, in any order.
    pub all_words: bool,
}

/// Subheadings that reflect the keyphrase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubheadingMatches {
    /// Level 2 and 3 subheadings.
    pub total: usize,
    /// Subheadings containing at least half of the keyphrase's content words.
    pub matching: usize,
}

/// Word count of one text section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionLength {
    /// The subheading that opens the section.
    pub heading: Option<String>,
    /// Words in the section body.
    pub words: usize,
}

/// Consecutive sentences opening with the same word(s).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeginningRun {
    /// The shared opening, normalized.
    pub opening: String,
    /// The sentences in the run.
    pub sentences: Vec<String>,
}

/// Sentences that have some property, out of all sentences.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SentenceShare {
    /// Number of sentences examined.
    pub total: usize,
    /// The sentences that have the property.
    pub matched: Vec<String>,
}

impl SentenceShare {
    /// Matched sentences as a percentage of all sentences.
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.matched.len() as f64 * 100.0 / self.total as f64
        }
    }
}

/// Keyphrase occurrences with the sentences they were found in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Occurrences {
    /// Total occurrences.
    pub count: usize,
    /// Sentences with at least one occurrence.
    pub sentences: Vec<String>,
}

/// The result of one research.
#[derive(Debug, Clone, PartialEq)]
pub enum Fact {
    /// The research produced nothing usable.
    Empty,
    /// A count.
    Count(usize),
    /// A measurement.
    Number(f64),
    /// A yes/no answer.
    Flag(bool),
    /// Text fragments such as sentences or paragraphs.
    Texts(Vec<String>),
    /// Headings in document order.
    Headings(Vec<Heading>),
    /// Section lengths in document order.
    Sections(Vec<SectionLength>),
    /// Link statistics.
    Links(LinkStatistics),
    /// Image statistics.
    Images(ImageStatistics),
    /// Keyphrase occurrences.
    Occurrences(Occurrences),
    /// Keyphrase placement in the introduction.
    Introduction(IntroductionMatch),
    /// Keyphrase placement in the title.
    Title(TitleMatch),
    /// Share of keyphrase words found, as `(matched, total)`.
    Ratio(usize, usize),
    /// Keyphrase coverage of subheadings.
    Subheadings(SubheadingMatches),
    /// Runs of repeated sentence openings.
    Beginnings(Vec<BeginningRun>),
    /// Sentences with some property.
    Sentences(SentenceShare),
}

/// Everything a research may look at.
pub struct ResearchContext<'r> {
    /// The paper being analyzed.
    pub paper: &'r Paper,
    /// The language pack of the run.
    pub language: &'static LanguagePack,
    /// The parsed body, after content filters.
    pub document: &'r Document,
    /// The title, after title filters.
    pub title: &'r str,
    /// The meta description, after description filters.
    pub description: &'r str,
    sentences: &'r OnceCell<Vec<String>>,
}

impl ResearchContext<'_> {
    /// Sentences of the body paragraphs, headings excluded.
    pub fn sentences(&self) -> &[String] {
        self.sentences
            .get_or_init(|| text::split_sentences(&self.document.body_text()))
    }

    /// The keyphrase and its synonyms.
    pub fn keyphrase_forms(&self) -> impl Iterator<Item = &Keyphrase> {
        self.paper.keyphrase_forms()
    }

    /// Stem every normalized word of `text`.
    pub fn stems(&self, text: &str) -> Vec<String> {
        text::normalized_words(text)
            .iter()
            .map(|w| self.language.stem(w))
            .collect()
    }
}

/// Research functions available for one language.
#[derive(Clone)]
pub struct ResearchRegistry {
    language: &'static LanguagePack,
    researches: HashMap<&'static str, ResearchFn>,
}

impl fmt::Debug for ResearchRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResearchRegistry")
            .field("language", &self.language.code)
            .field("researches", &self.names())
            .finish()
    }
}

/// Researches every language gets.
const NEUTRAL: &[(&str, ResearchFn)] = &[
    ("wordCount", structure::word_count),
    ("textLength", structure::text_length),
    ("sentences", structure::sentences),
    ("paragraphs", structure::paragraphs),
    ("headings", structure::headings),
    ("subheadingSections", structure::subheading_sections),
    ("linkStatistics", structure::link_statistics),
    ("images", structure::images),
    ("sentenceBeginnings", structure::sentence_beginnings),
    ("keyphraseLength", keyphrase::keyphrase_length),
    ("keywordCount", keyphrase::keyword_count),
    ("keywordDensity", keyphrase::keyword_density),
    ("introductionKeyword", keyphrase::introduction_keyword),
    ("metaDescriptionKeyword", keyphrase::meta_description_keyword),
    ("metaDescriptionLength", keyphrase::meta_description_length),
    ("titleKeyword", keyphrase::title_keyword),
    ("titleWidth", keyphrase::title_width),
    ("slugKeyword", keyphrase::slug_keyword),
    ("subheadingsKeyword", keyphrase::subheadings_keyword),
];

impl ResearchRegistry {
    /// The neutral researches plus the pack's own, the pack winning on name clashes.
    pub fn for_language(language: &'static LanguagePack) -> Self {
        let researches = NEUTRAL
            .iter()
            .chain(language.researches())
            .map(|&(name, research)| (name, research))
            .collect();
        Self {
            language,
            researches,
        }
    }

    /// The language these researches were assembled for.
    pub const fn language(&self) -> &'static LanguagePack {
        self.language
    }

    /// Add or replace a research.
    pub fn register(&mut self, name: &'static str, research: ResearchFn) {
        self.researches.insert(name, research);
    }

    /// Whether a research with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.researches.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.researches.keys().copied().collect();
        names.sort_unstable();
        names
    }

    fn get(&self, name: &str) -> Option<(&'static str, ResearchFn)> {
        self.researches.get_key_value(name).map(|(k, v)| (*k, *v))
    }
}

/// Runs researches for a single analysis.
pub struct Researcher<'a> {
    paper: &'a Paper,
    registry: &'a ResearchRegistry,
    document: Cow<'a, Document>,
    title: Cow<'a, str>,
    description: Cow<'a, str>,
    sentences: OnceCell<Vec<String>>,
    cache: RefCell<HashMap<&'static str, Rc<Fact>>>,
}

impl fmt::Debug for Researcher<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Researcher")
            .field("language", &self.registry.language.code)
            .field("cached", &self.cache.borrow().len())
            .finish_non_exhaustive()
    }
}

impl<'a> Researcher<'a> {
    /// A researcher over the unfiltered paper.
    pub fn new(paper: &'a Paper, registry: &'a ResearchRegistry) -> Self {
        Self::with_filters(paper, registry, &FilterSet::default())
    }

    /// A researcher over the paper as transformed by `filters`.
    pub fn with_filters(
        paper: &'a Paper,
        registry: &'a ResearchRegistry,
        filters: &FilterSet,
    ) -> Self {
        let document = match filters.apply(FilterHook::Content, paper.text()) {
            Some(text) => Cow::Owned(Document::parse(&text)),
            None => Cow::Borrowed(paper.document()),
        };
        let title = filters
            .apply(FilterHook::Title, paper.title())
            .map_or(Cow::Borrowed(paper.title()), Cow::Owned);
        let description = filters
            .apply(FilterHook::MetaDescription, paper.description())
            .map_or(Cow::Borrowed(paper.description()), Cow::Owned);

        Self {
            paper,
            registry,
            document,
            title,
            description,
            sentences: OnceCell::new(),
            cache: RefCell::new(HashMap::new()),
        }
    }

    /// The language pack of this run.
    pub const fn language(&self) -> &'static LanguagePack {
        self.registry.language
    }

    /// The paper under analysis.
    pub const fn paper(&self) -> &'a Paper {
        self.paper
    }

    /// Whether a research is registered.
    pub fn has(&self, name: &str) -> bool {
        self.registry.contains(name)
    }

    /// Run a research, or return its memoized fact.
    ///
    /// `None` when no research of that name is registered.
    pub fn run(&self, name: &str) -> Option<Rc<Fact>> {
        let (key, research) = self.registry.get(name)?;
        if let Some(fact) = self.cache.borrow().get(key) {
            return Some(Rc::clone(fact));
        }

        let context = ResearchContext {
            paper: self.paper,
            language: self.registry.language,
            document: &self.document,
            title: &self.title,
            description: &self.description,
            sentences: &self.sentences,
        };
        let fact = catch_unwind(AssertUnwindSafe(|| research(&context))).unwrap_or_else(|_| {
            tracing::warn!(research = key, "research panicked, recording an empty fact");
            Fact::Empty
        });
        tracing::trace!(research = key, ?fact, "research complete");

        let fact = Rc::new(fact);
        self.cache.borrow_mut().insert(key, Rc::clone(&fact));
        Some(fact)
    }

    /// Shorthand for a research that yields [`Fact::Count`], zero otherwise.
    pub fn count(&self, name: &str) -> usize {
        match self.run(name).as_deref() {
            Some(Fact::Count(n)) => *n,
            _ => 0,
        }
    }

    /// Shorthand for a research that yields [`Fact::Number`], zero otherwise.
    pub fn number(&self, name: &str) -> f64 {
        match self.run(name).as_deref() {
            Some(Fact::Number(n)) => *n,
            _ => 0.0,
        }
    }
}
