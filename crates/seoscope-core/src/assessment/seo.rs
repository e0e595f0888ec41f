//! SEO assessments.

use super::bands::ScoreBands;
use super::{
    AssessmentResult, AssessmentRule, LinkFragments, Mark, count, fact, format_number,
    has_keyphrase_and_text,
};
use crate::error::AssessmentError;
use crate::paper::Paper;
use crate::research::{
    Fact, ImageStatistics, IntroductionMatch, LinkStatistics, Occurrences, Researcher,
    SubheadingMatches, TitleMatch,
};

/// Whether the keyphrase or a synonym shows up in the first paragraph.
#[derive(Debug, Clone)]
pub struct IntroductionKeyword {
    links: LinkFragments,
}

impl IntroductionKeyword {
    /// Identifier of this assessment.
    pub const ID: &'static str = "introductionKeyword";

    /// Build with the given feedback links.
    pub const fn new(links: LinkFragments) -> Self {
        Self { links }
    }
}

impl AssessmentRule for IntroductionKeyword {
    fn identifier(&self) -> &str {
        Self::ID
    }

    fn required_researches(&self) -> &[&'static str] {
        &["introductionKeyword"]
    }

    fn uses_keyphrase(&self) -> bool {
        true
    }

    fn is_applicable(&self, paper: &Paper, _: &Researcher<'_>) -> bool {
        has_keyphrase_and_text(paper)
    }

    fn get_result(
        &self,
        _: &Paper,
        researcher: &Researcher<'_>,
    ) -> Result<AssessmentResult, AssessmentError> {
        let found: IntroductionMatch = fact(researcher, Self::ID, "introductionKeyword", |f| {
            match f {
                Fact::Introduction(found) => Some(found.clone()),
                _ => None,
            }
        })?;
        let title = self.links.title("Keyphrase in introduction");
        let (points, text) = if found.in_one_sentence {
            (9, format!("{title}: Well done!"))
        } else if found.in_paragraph {
            (
                6,
                format!(
                    "{title}: Your keyphrase or its synonyms appear in the first paragraph of \
                     the copy, but not within one sentence. {}!",
                    self.links.cta("Fix that")
                ),
            )
        } else {
            (
                3,
                format!(
                    "{title}: Your keyphrase or its synonyms do not appear in the first \
                     paragraph. {}!",
                    self.links.cta("Make sure the topic is clear immediately")
                ),
            )
        };
        let marks = found.sentence.as_deref().map(Mark::whole).into_iter().collect();
        Ok(AssessmentResult::points(Self::ID, points, text).with_marks(marks))
    }

    linked_rule!();
}

/// Number of content words in the keyphrase.
#[derive(Debug, Clone)]
pub struct KeyphraseLength {
    bands: ScoreBands,
    links: LinkFragments,
}

impl KeyphraseLength {
    /// Identifier of this assessment.
    pub const ID: &'static str = "keyphraseLength";

    /// Build with the given feedback links.
    pub fn new(links: LinkFragments) -> Self {
        Self {
            bands: ScoreBands::new(
                1,
                &[
                    ("minimum", 1.0, 9),
                    ("recommendedMaximum", 4.0, 6),
                    ("acceptableMaximum", 8.0, 3),
                ],
            ),
            links,
        }
    }
}

impl AssessmentRule for KeyphraseLength {
    fn identifier(&self) -> &str {
        Self::ID
    }

    fn required_researches(&self) -> &[&'static str] {
        &["keyphraseLength"]
    }

    fn is_applicable(&self, paper: &Paper, _: &Researcher<'_>) -> bool {
        paper.has_text()
    }

    fn get_result(
        &self,
        _: &Paper,
        researcher: &Researcher<'_>,
    ) -> Result<AssessmentResult, AssessmentError> {
        let length = count(researcher, Self::ID, "keyphraseLength")?;
        let points = self.bands.score(length as f64);
        let title = self.links.title("Keyphrase length");
        let text = match (length, points) {
            (0, _) => format!(
                "{title}: No focus keyphrase was set for this page. {}.",
                self.links.cta("Set a keyphrase in order to calculate your SEO score")
            ),
            (_, 9) => format!("{title}: Good job!"),
            _ => format!(
                "{title}: The keyphrase contains {length} content words. That's more than the \
                 recommended maximum of {} content words. {}!",
                format_number(self.bands.get("recommendedMaximum").unwrap_or_default()),
                self.links.cta("Make it shorter")
            ),
        };
        Ok(AssessmentResult::points(Self::ID, points, text))
    }

    banded_rule!();
}

/// Keyphrase occurrences per 100 words.
#[derive(Debug, Clone)]
pub struct KeyphraseDensity {
    bands: ScoreBands,
    links: LinkFragments,
}

impl KeyphraseDensity {
    /// Identifier of this assessment.
    pub const ID: &'static str = "keyphraseDensity";

    /// Texts shorter than this are not assessed.
    pub const MIN_WORDS: usize = 100;

    /// Build with the given feedback links.
    pub fn new(links: LinkFragments) -> Self {
        Self {
            bands: ScoreBands::new(
                4,
                &[
                    ("minimum", 0.5, 9),
                    ("maximum", 3.0, 2),
                    ("overMaximum", 3.5, 1),
                ],
            ),
            links,
        }
    }
}

impl AssessmentRule for KeyphraseDensity {
    fn identifier(&self) -> &str {
        Self::ID
    }

    fn required_researches(&self) -> &[&'static str] {
        &["keywordDensity", "keywordCount", "wordCount"]
    }

    fn uses_keyphrase(&self) -> bool {
        true
    }

    fn is_applicable(&self, paper: &Paper, researcher: &Researcher<'_>) -> bool {
        has_keyphrase_and_text(paper) && researcher.count("wordCount") >= Self::MIN_WORDS
    }

    fn get_result(
        &self,
        _: &Paper,
        researcher: &Researcher<'_>,
    ) -> Result<AssessmentResult, AssessmentError> {
        let density = fact(researcher, Self::ID, "keywordDensity", |f| match f {
            Fact::Number(n) => Some(*n),
            _ => None,
        })?;
        let found: Occurrences = fact(researcher, Self::ID, "keywordCount", |f| match f {
            Fact::Occurrences(found) => Some(found.clone()),
            _ => None,
        })?;
        let title = self.links.title("Keyphrase density");
        let times = found.count;
        let points = if times == 0 { 4 } else { self.bands.score(density) };
        let text = match points {
            9 => format!("{title}: The focus keyphrase was found {times} times. This is great!"),
            4 => format!(
                "{title}: The focus keyphrase was found {times} times. That's less than is \
                 recommended for the length of this text. {}!",
                self.links.cta("Focus on your keyphrase")
            ),
            _ => format!(
                "{title}: The focus keyphrase was found {times} times. That's way more than \
                 the recommended maximum for the length of this text. {}!",
                self.links.cta("Don't overoptimize")
            ),
        };
        let marks = found.sentences.iter().map(|s| Mark::whole(s)).collect();
        Ok(AssessmentResult::points(Self::ID, points, text).with_marks(marks))
    }

    banded_rule!();
}

/// Meta description sentences containing the keyphrase.
#[derive(Debug, Clone)]
pub struct MetaDescriptionKeyword {
    bands: ScoreBands,
    links: LinkFragments,
}

impl MetaDescriptionKeyword {
    /// Identifier of this assessment.
    pub const ID: &'static str = "metaDescriptionKeyword";

    /// Build with the given feedback links.
    pub fn new(links: LinkFragments) -> Self {
        Self {
            bands: ScoreBands::new(3, &[("minimum", 1.0, 9), ("maximum", 2.0, 3)]),
            links,
        }
    }
}

impl AssessmentRule for MetaDescriptionKeyword {
    fn identifier(&self) -> &str {
        Self::ID
    }

    fn required_researches(&self) -> &[&'static str] {
        &["metaDescriptionKeyword"]
    }

    fn uses_keyphrase(&self) -> bool {
        true
    }

    fn is_applicable(&self, paper: &Paper, _: &Researcher<'_>) -> bool {
        has_keyphrase_and_text(paper) && paper.has_description()
    }

    fn get_result(
        &self,
        _: &Paper,
        researcher: &Researcher<'_>,
    ) -> Result<AssessmentResult, AssessmentError> {
        let sentences = count(researcher, Self::ID, "metaDescriptionKeyword")?;
        let points = self.bands.score(sentences as f64);
        let title = self.links.title("Keyphrase in meta description");
        let text = if points == 9 {
            format!("{title}: Keyphrase or synonym appear in the meta description. Well done!")
        } else if sentences == 0 {
            format!(
                "{title}: The meta description has been specified, but it does not contain \
                 the keyphrase. {}!",
                self.links.cta("Fix that")
            )
        } else {
            format!(
                "{title}: The meta description contains the keyphrase {sentences} times, \
                 which is over the advised maximum of {} times. {}!",
                format_number(self.bands.get("maximum").unwrap_or_default()),
                self.links.cta("Limit that")
            )
        };
        Ok(AssessmentResult::points(Self::ID, points, text))
    }

    banded_rule!();
}

/// Meta description length in characters.
#[derive(Debug, Clone)]
pub struct MetaDescriptionLength {
    bands: ScoreBands,
    links: LinkFragments,
}

impl MetaDescriptionLength {
    /// Identifier of this assessment.
    pub const ID: &'static str = "metaDescriptionLength";

    /// Build with the given feedback links.
    pub fn new(links: LinkFragments) -> Self {
        Self {
            bands: ScoreBands::new(
                1,
                &[
                    ("present", 1.0, 6),
                    ("recommendedMinimum", 120.0, 9),
                    ("maximum", 156.0, 6),
                ],
            ),
            links,
        }
    }
}

impl AssessmentRule for MetaDescriptionLength {
    fn identifier(&self) -> &str {
        Self::ID
    }

    fn required_researches(&self) -> &[&'static str] {
        &["metaDescriptionLength"]
    }

    fn get_result(
        &self,
        _: &Paper,
        researcher: &Researcher<'_>,
    ) -> Result<AssessmentResult, AssessmentError> {
        let length = count(researcher, Self::ID, "metaDescriptionLength")?;
        let band = self.bands.band(length as f64);
        let points = self.bands.score(length as f64);
        let title = self.links.title("Meta description length");
        let text = match band {
            0 => format!(
                "{title}: No meta description has been specified. Search engines will display \
                 copy from the page instead. {}!",
                self.links.cta("Make sure to write one")
            ),
            1 => format!(
                "{title}: The meta description is too short (under {} characters). Up to {} \
                 characters are available. {}!",
                format_number(self.bands.get("recommendedMinimum").unwrap_or_default()),
                format_number(self.bands.get("maximum").unwrap_or_default()),
                self.links.cta("Use the space")
            ),
            2 => format!("{title}: Well done!"),
            _ => format!(
                "{title}: The meta description is over {} characters. To ensure the entire \
                 description will be visible, {}!",
                format_number(self.bands.get("maximum").unwrap_or_default()),
                self.links.cta("you should reduce the length")
            ),
        };
        Ok(AssessmentResult::points(Self::ID, points, text))
    }

    banded_rule!();
}

/// Text length in words.
#[derive(Debug, Clone)]
pub struct TextLength {
    bands: ScoreBands,
    links: LinkFragments,
}

impl TextLength {
    /// Identifier of this assessment.
    pub const ID: &'static str = "textLength";

    fn with_boundaries(links: LinkFragments, boundaries: [f64; 4]) -> Self {
        let [very_far, below, slightly_below, recommended] = boundaries;
        Self {
            bands: ScoreBands::new(
                1,
                &[
                    ("veryFarBelowMinimum", very_far, 2),
                    ("belowMinimum", below, 3),
                    ("slightlyBelowMinimum", slightly_below, 6),
                    ("recommendedMinimum", recommended, 9),
                ],
            ),
            links,
        }
    }

    /// Regular posts and pages: at least 300 words.
    pub fn new(links: LinkFragments) -> Self {
        Self::with_boundaries(links, [100.0, 200.0, 250.0, 300.0])
    }

    /// Cornerstone content: at least 900 words.
    pub fn cornerstone(links: LinkFragments) -> Self {
        Self::with_boundaries(links, [100.0, 300.0, 400.0, 900.0])
    }

    /// Taxonomy and collection pages: at least 250 words.
    pub fn taxonomy(links: LinkFragments) -> Self {
        Self::with_boundaries(links, [50.0, 100.0, 200.0, 250.0])
    }
}

impl AssessmentRule for TextLength {
    fn identifier(&self) -> &str {
        Self::ID
    }

    fn required_researches(&self) -> &[&'static str] {
        &["wordCount"]
    }

    fn get_result(
        &self,
        _: &Paper,
        researcher: &Researcher<'_>,
    ) -> Result<AssessmentResult, AssessmentError> {
        let words = count(researcher, Self::ID, "wordCount")?;
        let points = self.bands.score(words as f64);
        let title = self.links.title("Text length");
        let minimum = format_number(self.bands.get("recommendedMinimum").unwrap_or_default());
        let text = if points >= 9 {
            format!("{title}: The text contains {words} words. Good job!")
        } else {
            format!(
                "{title}: The text contains {words} words. This is below the recommended \
                 minimum of {minimum} words. {}.",
                self.links.cta("Add more content")
            )
        };
        Ok(AssessmentResult::points(Self::ID, points, text))
    }

    banded_rule!();
}

/// Keyphrase placement in the SEO title.
#[derive(Debug, Clone)]
pub struct TitleKeyword {
    links: LinkFragments,
}

impl TitleKeyword {
    /// Identifier of this assessment.
    pub const ID: &'static str = "titleKeyword";

    /// Build with the given feedback links.
    pub const fn new(links: LinkFragments) -> Self {
        Self { links }
    }
}

impl AssessmentRule for TitleKeyword {
    fn identifier(&self) -> &str {
        Self::ID
    }

    fn required_researches(&self) -> &[&'static str] {
        &["titleKeyword"]
    }

    fn uses_keyphrase(&self) -> bool {
        true
    }

    fn is_applicable(&self, paper: &Paper, _: &Researcher<'_>) -> bool {
        has_keyphrase_and_text(paper) && paper.has_title()
    }

    fn get_result(
        &self,
        paper: &Paper,
        researcher: &Researcher<'_>,
    ) -> Result<AssessmentResult, AssessmentError> {
        let found: TitleMatch = fact(researcher, Self::ID, "titleKeyword", |f| match f {
            Fact::Title(found) => Some(*found),
            _ => None,
        })?;
        let title = self.links.title("Keyphrase in title");
        let keyword = paper.keyphrase().map_or("", |k| k.text.as_str());
        let (points, text) = if found.at_start {
            (
                9,
                format!(
                    "{title}: The exact match of the focus keyphrase appears at the beginning \
                     of the SEO title. Good job!"
                ),
            )
        } else if found.exact {
            (
                6,
                format!(
                    "{title}: The exact match of the focus keyphrase appears in the SEO title, \
                     but not at the beginning. {}!",
                    self.links.cta("Move it to the beginning for the best results")
                ),
            )
        } else if found.all_words {
            (
                6,
                format!(
                    "{title}: Does not contain the exact match. {}!",
                    self.links
                        .cta("Try to write the exact match of your keyphrase in the SEO title")
                ),
            )
        } else {
            (
                2,
                format!(
                    "{title}: Not all the words from your keyphrase \"{keyword}\" appear in the \
                     SEO title. {}!",
                    self.links
                        .cta("Try to use the exact match of your keyphrase in the SEO title")
                ),
            )
        };
        Ok(AssessmentResult::points(Self::ID, points, text))
    }

    linked_rule!();
}

/// Rendered width of the SEO title.
#[derive(Debug, Clone)]
pub struct TitleWidth {
    bands: ScoreBands,
    links: LinkFragments,
}

impl TitleWidth {
    /// Identifier of this assessment.
    pub const ID: &'static str = "titleWidth";

    /// Build with the given feedback links.
    pub fn new(links: LinkFragments) -> Self {
        Self {
            bands: ScoreBands::new(
                1,
                &[
                    ("present", 1.0, 6),
                    ("minimum", 400.0, 9),
                    ("maximum", 600.0, 3),
                ],
            ),
            links,
        }
    }
}

impl AssessmentRule for TitleWidth {
    fn identifier(&self) -> &str {
        Self::ID
    }

    fn required_researches(&self) -> &[&'static str] {
        &["titleWidth"]
    }

    fn get_result(
        &self,
        _: &Paper,
        researcher: &Researcher<'_>,
    ) -> Result<AssessmentResult, AssessmentError> {
        let width = fact(researcher, Self::ID, "titleWidth", |f| match f {
            Fact::Number(n) => Some(*n),
            _ => None,
        })?;
        let points = self.bands.score(width);
        let title = self.links.title("SEO title width");
        let text = match self.bands.band(width) {
            0 => format!(
                "{title}: {}.",
                self.links.cta("Please create an SEO title")
            ),
            1 => format!(
                "{title}: The SEO title is too short. {}.",
                self.links.cta(
                    "Use the space to add keyphrase variations or create compelling \
                     call-to-action copy"
                )
            ),
            2 => format!("{title}: Good job!"),
            _ => format!(
                "{title}: The SEO title is wider than the viewable limit. {}.",
                self.links.cta("Try to make it shorter")
            ),
        };
        Ok(AssessmentResult::points(Self::ID, points, text))
    }

    banded_rule!();
}

/// Share of keyphrase content words in the slug.
#[derive(Debug, Clone)]
pub struct SlugKeyword {
    bands: ScoreBands,
    links: LinkFragments,
}

impl SlugKeyword {
    /// Identifier of this assessment.
    pub const ID: &'static str = "slugKeyword";

    /// Build with the given feedback links.
    pub fn new(links: LinkFragments) -> Self {
        Self {
            bands: ScoreBands::new(3, &[("partial", 0.5, 6), ("complete", 1.0, 9)]),
            links,
        }
    }
}

impl AssessmentRule for SlugKeyword {
    fn identifier(&self) -> &str {
        Self::ID
    }

    fn required_researches(&self) -> &[&'static str] {
        &["slugKeyword"]
    }

    fn uses_keyphrase(&self) -> bool {
        true
    }

    fn is_applicable(&self, paper: &Paper, _: &Researcher<'_>) -> bool {
        has_keyphrase_and_text(paper) && paper.has_url()
    }

    fn get_result(
        &self,
        _: &Paper,
        researcher: &Researcher<'_>,
    ) -> Result<AssessmentResult, AssessmentError> {
        let (matched, total) = fact(researcher, Self::ID, "slugKeyword", |f| match f {
            Fact::Ratio(matched, total) => Some((*matched, *total)),
            _ => None,
        })?;
        let ratio = if total == 0 {
            0.0
        } else {
            matched as f64 / total as f64
        };
        let points = self.bands.score(ratio);
        let title = self.links.title("Keyphrase in slug");
        let text = match points {
            9 => format!("{title}: Great work!"),
            6 => format!(
                "{title}: (Part of) your keyphrase does not appear in the slug. {}!",
                self.links.cta("Change that")
            ),
            _ => format!(
                "{title}: The slug does not contain your keyphrase. {}!",
                self.links.cta("Change that")
            ),
        };
        Ok(AssessmentResult::points(Self::ID, points, text))
    }

    banded_rule!();
}

/// Keyphrases made only of function words.
#[derive(Debug, Clone)]
pub struct FunctionWordsInKeyphrase {
    links: LinkFragments,
}

impl FunctionWordsInKeyphrase {
    /// Identifier of this assessment.
    pub const ID: &'static str = "functionWordsInKeyphrase";

    /// Build with the given feedback links.
    pub const fn new(links: LinkFragments) -> Self {
        Self { links }
    }
}

impl AssessmentRule for FunctionWordsInKeyphrase {
    fn identifier(&self) -> &str {
        Self::ID
    }

    fn required_researches(&self) -> &[&'static str] {
        &["functionWordsInKeyphrase"]
    }

    fn uses_keyphrase(&self) -> bool {
        true
    }

    fn is_applicable(&self, paper: &Paper, researcher: &Researcher<'_>) -> bool {
        has_keyphrase_and_text(paper)
            && matches!(
                researcher.run("functionWordsInKeyphrase").as_deref(),
                Some(Fact::Flag(true))
            )
    }

    fn get_result(
        &self,
        paper: &Paper,
        _: &Researcher<'_>,
    ) -> Result<AssessmentResult, AssessmentError> {
        let keyword = paper.keyphrase().map_or("", |k| k.text.as_str());
        let text = format!(
            "{}: Your keyphrase \"{keyword}\" contains function words only. {}!",
            self.links.title("Function words in keyphrase"),
            self.links.cta("Learn more about what makes a good keyphrase")
        );
        Ok(AssessmentResult::points(Self::ID, 1, text))
    }

    linked_rule!();
}

/// More than one H1 in the body.
#[derive(Debug, Clone)]
pub struct SingleH1 {
    links: LinkFragments,
}

impl SingleH1 {
    /// Identifier of this assessment.
    pub const ID: &'static str = "singleH1";

    /// Build with the given feedback links.
    pub const fn new(links: LinkFragments) -> Self {
        Self { links }
    }

    fn h1s(researcher: &Researcher<'_>) -> Vec<String> {
        match researcher.run("headings").as_deref() {
            Some(Fact::Headings(headings)) => headings
                .iter()
                .filter(|h| h.level == 1)
                .map(|h| h.text.clone())
                .collect(),
            _ => Vec::new(),
        }
    }
}

impl AssessmentRule for SingleH1 {
    fn identifier(&self) -> &str {
        Self::ID
    }

    fn required_researches(&self) -> &[&'static str] {
        &["headings"]
    }

    fn is_applicable(&self, paper: &Paper, researcher: &Researcher<'_>) -> bool {
        paper.has_text() && Self::h1s(researcher).len() > 1
    }

    fn get_result(
        &self,
        _: &Paper,
        researcher: &Researcher<'_>,
    ) -> Result<AssessmentResult, AssessmentError> {
        let marks = Self::h1s(researcher).iter().map(|h| Mark::whole(h)).collect();
        let text = format!(
            "{}: H1s should only be used as your main title. Find all H1s in your text that \
             aren't your main title and {}!",
            self.links.title("Single title"),
            self.links.cta("change them to a lower heading level")
        );
        Ok(AssessmentResult::points(Self::ID, 1, text).with_marks(marks))
    }

    linked_rule!();
}

fn link_statistics(
    researcher: &Researcher<'_>,
    assessment: &str,
) -> Result<LinkStatistics, AssessmentError> {
    fact(researcher, assessment, "linkStatistics", |f| match f {
        Fact::Links(stats) => Some(*stats),
        _ => None,
    })
}

/// Links to other sites.
#[derive(Debug, Clone)]
pub struct ExternalLinks {
    links: LinkFragments,
}

impl ExternalLinks {
    /// Identifier of this assessment.
    pub const ID: &'static str = "externalLinks";

    /// Build with the given feedback links.
    pub const fn new(links: LinkFragments) -> Self {
        Self { links }
    }
}

impl AssessmentRule for ExternalLinks {
    fn identifier(&self) -> &str {
        Self::ID
    }

    fn required_researches(&self) -> &[&'static str] {
        &["linkStatistics"]
    }

    fn is_applicable(&self, paper: &Paper, _: &Researcher<'_>) -> bool {
        paper.has_text()
    }

    fn get_result(
        &self,
        _: &Paper,
        researcher: &Researcher<'_>,
    ) -> Result<AssessmentResult, AssessmentError> {
        let stats = link_statistics(researcher, Self::ID)?;
        let title = self.links.title("Outbound links");
        let (points, text) = if stats.external() == 0 {
            (
                3,
                format!(
                    "{title}: No outbound links appear in this page. {}!",
                    self.links.cta("Add some")
                ),
            )
        } else if stats.external_followed == 0 {
            (
                7,
                format!(
                    "{title}: All outbound links on this page are nofollowed. {}!",
                    self.links.cta("Add some normal links")
                ),
            )
        } else {
            (8, format!("{title}: Good job!"))
        };
        Ok(AssessmentResult::points(Self::ID, points, text))
    }

    linked_rule!();
}

/// Links within the site.
#[derive(Debug, Clone)]
pub struct InternalLinks {
    links: LinkFragments,
}

impl InternalLinks {
    /// Identifier of this assessment.
    pub const ID: &'static str = "internalLinks";

    /// Build with the given feedback links.
    pub const fn new(links: LinkFragments) -> Self {
        Self { links }
    }
}

impl AssessmentRule for InternalLinks {
    fn identifier(&self) -> &str {
        Self::ID
    }

    fn required_researches(&self) -> &[&'static str] {
        &["linkStatistics"]
    }

    fn is_applicable(&self, paper: &Paper, _: &Researcher<'_>) -> bool {
        paper.has_text()
    }

    fn get_result(
        &self,
        _: &Paper,
        researcher: &Researcher<'_>,
    ) -> Result<AssessmentResult, AssessmentError> {
        let stats = link_statistics(researcher, Self::ID)?;
        let title = self.links.title("Internal links");
        let (points, text) = if stats.internal() == 0 {
            (
                3,
                format!(
                    "{title}: No internal links appear in this page, {}!",
                    self.links.cta("make sure to add some")
                ),
            )
        } else if stats.internal_followed == 0 {
            (
                7,
                format!(
                    "{title}: The internal links in this page are all nofollowed. {}!",
                    self.links.cta("Add some good internal links")
                ),
            )
        } else if stats.internal_nofollow > 0 {
            (
                8,
                format!(
                    "{title}: There are both nofollowed and normal internal links on this \
                     page. Good job!"
                ),
            )
        } else {
            (9, format!("{title}: You have enough internal links. Good job!"))
        };
        Ok(AssessmentResult::points(Self::ID, points, text))
    }

    linked_rule!();
}

/// Share of subheadings reflecting the keyphrase.
#[derive(Debug, Clone)]
pub struct SubheadingsKeyword {
    bands: ScoreBands,
    links: LinkFragments,
}

impl SubheadingsKeyword {
    /// Identifier of this assessment.
    pub const ID: &'static str = "subheadingsKeyword";

    /// Build with the given feedback links.
    pub fn new(links: LinkFragments) -> Self {
        Self {
            bands: ScoreBands::new(3, &[("minimum", 30.0, 9), ("maximum", 75.0, 3)]),
            links,
        }
    }

    fn matches(researcher: &Researcher<'_>) -> Result<SubheadingMatches, AssessmentError> {
        fact(researcher, Self::ID, "subheadingsKeyword", |f| match f {
            Fact::Subheadings(found) => Some(*found),
            _ => None,
        })
    }
}

impl AssessmentRule for SubheadingsKeyword {
    fn identifier(&self) -> &str {
        Self::ID
    }

    fn required_researches(&self) -> &[&'static str] {
        &["subheadingsKeyword"]
    }

    fn uses_keyphrase(&self) -> bool {
        true
    }

    fn is_applicable(&self, paper: &Paper, researcher: &Researcher<'_>) -> bool {
        has_keyphrase_and_text(paper)
            && Self::matches(researcher).is_ok_and(|found| found.total > 0)
    }

    fn get_result(
        &self,
        _: &Paper,
        researcher: &Researcher<'_>,
    ) -> Result<AssessmentResult, AssessmentError> {
        let found = Self::matches(researcher)?;
        let title = self.links.title("Keyphrase in subheading");
        let percentage = found.matching as f64 * 100.0 / found.total.max(1) as f64;
        let points = if found.total == 1 && found.matching == 1 {
            9
        } else {
            self.bands.score(percentage)
        };
        let text = if points == 9 {
            format!(
                "{title}: {} of your higher-level subheadings reflect the topic of your copy. \
                 Good job!",
                found.matching
            )
        } else if found.matching == 0 || percentage < self.bands.get("minimum").unwrap_or(0.0) {
            format!(
                "{title}: {}.",
                self.links.cta(
                    "Use more keyphrases or synonyms in your higher-level subheadings"
                )
            )
        } else {
            format!(
                "{title}: More than {}% of your higher-level subheadings reflect the topic of \
                 your copy. That's too much. {}.",
                format_number(self.bands.get("maximum").unwrap_or_default()),
                self.links.cta("Don't over-optimize")
            )
        };
        Ok(AssessmentResult::points(Self::ID, points, text))
    }

    banded_rule!();
}

/// Images and keyphrase alt text.
#[derive(Debug, Clone)]
pub struct Images {
    links: LinkFragments,
}

impl Images {
    /// Identifier of this assessment.
    pub const ID: &'static str = "images";

    /// Build with the given feedback links.
    pub const fn new(links: LinkFragments) -> Self {
        Self { links }
    }
}

impl AssessmentRule for Images {
    fn identifier(&self) -> &str {
        Self::ID
    }

    fn required_researches(&self) -> &[&'static str] {
        &["images"]
    }

    fn is_applicable(&self, paper: &Paper, _: &Researcher<'_>) -> bool {
        paper.has_text()
    }

    fn get_result(
        &self,
        paper: &Paper,
        researcher: &Researcher<'_>,
    ) -> Result<AssessmentResult, AssessmentError> {
        let stats: ImageStatistics = fact(researcher, Self::ID, "images", |f| match f {
            Fact::Images(stats) => Some(*stats),
            _ => None,
        })?;
        let title = self.links.title("Images");
        let (points, text) = if stats.total == 0 {
            (
                3,
                format!(
                    "{title}: No images appear on this page. {}!",
                    self.links.cta("Add some")
                ),
            )
        } else if stats.keyphrase_in_alt > 0 {
            (9, format!("{title}: Good job!"))
        } else if paper.has_keyword() {
            (
                6,
                format!(
                    "{title}: Images on this page do not have alt attributes that reflect the \
                     topic of your text. {}!",
                    self.links
                        .cta("Add your keyphrase or synonyms to the alt tags of relevant images")
                ),
            )
        } else {
            (
                6,
                format!(
                    "{title}: Images on this page do not have alt attributes with at least \
                     half of the words from your keyphrase. {}!",
                    self.links.cta("Fix that")
                ),
            )
        };
        Ok(AssessmentResult::points(Self::ID, points, text))
    }

    linked_rule!();
}
