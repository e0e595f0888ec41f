//! Assessments: scored judgments over research facts.
//!
//! Every assessment implements [`AssessmentRule`]. The built-in ones are
//! plain structs gathered in the [`Assessment`] enum, next to the
//! configuration-defined [`Assessment::Pattern`] and the open
//! [`Assessment::Plugin`] variant for rules supplied by library users.
//!
//! Feedback text embeds call-to-action links. Assessments never resolve
//! link targets themselves; they format whatever [`LinkFragments`] they
//! were built with.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::AssessmentError;
use crate::paper::Paper;
use crate::research::{Fact, Researcher};

use self::bands::{InvalidBoundary, ScoreBands};

/// Implements the band and link accessors of [`AssessmentRule`] for a struct
/// with `bands` and `links` fields.
macro_rules! banded_rule {
    () => {
        fn bands(&self) -> Option<&$crate::assessment::bands::ScoreBands> {
            Some(&self.bands)
        }

        fn bands_mut(&mut self) -> Option<&mut $crate::assessment::bands::ScoreBands> {
            Some(&mut self.bands)
        }

        fn links_mut(&mut self) -> Option<&mut $crate::assessment::LinkFragments> {
            Some(&mut self.links)
        }
    };
}

/// Implements the link accessor of [`AssessmentRule`] for a struct with a
/// `links` field.
macro_rules! linked_rule {
    () => {
        fn links_mut(&mut self) -> Option<&mut $crate::assessment::LinkFragments> {
            Some(&mut self.links)
        }
    };
}

pub mod bands;
pub mod custom;
pub mod readability;
pub mod seo;

/// Base URL of the default call-to-action links.
pub const DEFAULT_LINK_BASE: &str = "https://yoa.st";

/// Opening anchor tag for a feedback link.
pub fn create_anchor_opening_tag(url: &str) -> String {
    format!("<a href='{url}' target='_blank'>")
}

/// Opening anchor tags wrapped around an assessment's title and its call
/// to action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkFragments {
    /// Anchor opening tag for the title.
    pub title: String,
    /// Anchor opening tag for the call to action.
    pub call_to_action: String,
}

impl LinkFragments {
    /// Fragments pointing at explicit URLs.
    pub fn new(title_url: &str, call_to_action_url: &str) -> Self {
        Self {
            title: create_anchor_opening_tag(title_url),
            call_to_action: create_anchor_opening_tag(call_to_action_url),
        }
    }

    /// The default fragments: `<base>/<identifier>` and `<base>/<identifier>-cta`.
    pub fn for_identifier(base: &str, identifier: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self::new(
            &format!("{base}/{identifier}"),
            &format!("{base}/{identifier}-cta"),
        )
    }

    /// Fragments under `base` with explicit path segments.
    pub fn with_paths(base: &str, title_path: &str, call_to_action_path: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self::new(
            &format!("{base}/{title_path}"),
            &format!("{base}/{call_to_action_path}"),
        )
    }

    pub(crate) fn title(&self, label: &str) -> String {
        format!("{}{label}</a>", self.title)
    }

    pub(crate) fn cta(&self, label: &str) -> String {
        format!("{}{label}</a>", self.call_to_action)
    }
}

/// A boolean assessment outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    /// The content passes.
    Good,
    /// The content fails.
    Bad,
}

/// Score contributed by a good verdict.
pub const GOOD_VERDICT_POINTS: u8 = 9;
/// Score contributed by a bad verdict.
pub const BAD_VERDICT_POINTS: u8 = 3;

/// An assessment score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Score {
    /// Points on the 0–9 scale.
    Points(u8),
    /// A good/bad verdict.
    Verdict(Verdict),
}

impl Score {
    /// The score on the 0–9 scale.
    pub const fn points(self) -> u8 {
        match self {
            Self::Points(points) => points,
            Self::Verdict(Verdict::Good) => GOOD_VERDICT_POINTS,
            Self::Verdict(Verdict::Bad) => BAD_VERDICT_POINTS,
        }
    }
}

/// User-facing interpretation of a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    /// No score; informational only.
    Feedback,
    /// Needs work.
    Bad,
    /// Acceptable.
    Ok,
    /// Good.
    Good,
}

impl Rating {
    /// Rating of a 0–9 assessment score: 1–4 bad, 5–6 ok, 7–9 good.
    pub const fn from_points(points: u8) -> Self {
        match points {
            0 => Self::Feedback,
            1..=4 => Self::Bad,
            5..=6 => Self::Ok,
            _ => Self::Good,
        }
    }

    /// Rating of a 0–100 overall score: up to 40 bad, up to 70 ok.
    pub const fn from_overall(score: u8) -> Self {
        match score {
            0 => Self::Feedback,
            1..=40 => Self::Bad,
            41..=70 => Self::Ok,
            _ => Self::Good,
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Feedback => "feedback",
            Self::Bad => "bad",
            Self::Ok => "ok",
            Self::Good => "good",
        })
    }
}

/// A span of text an assessment points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mark {
    /// The text as it appears in the content.
    pub original: String,
    /// The same text wrapped in highlight markup.
    pub marked: String,
}

impl Mark {
    /// Highlight a whole sentence, paragraph or heading.
    pub fn whole(text: &str) -> Self {
        Self {
            original: text.to_string(),
            marked: format!("<mark>{text}</mark>"),
        }
    }
}

/// The outcome of one assessment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentResult {
    /// Identifier of the assessment.
    pub identifier: String,
    /// The score.
    pub score: Score,
    /// Interpretation of the score.
    pub rating: Rating,
    /// Feedback, with embedded anchor markup.
    pub feedback_text: String,
    /// Whether [`marks`](Self::marks) is non-empty.
    pub has_marks: bool,
    /// Text spans the feedback refers to.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub marks: Vec<Mark>,
}

impl AssessmentResult {
    /// A result on the 0–9 scale.
    pub fn points(identifier: &str, points: u8, feedback_text: String) -> Self {
        Self {
            identifier: identifier.to_string(),
            score: Score::Points(points),
            rating: Rating::from_points(points),
            feedback_text,
            has_marks: false,
            marks: Vec::new(),
        }
    }

    /// A good/bad result.
    pub fn verdict(identifier: &str, verdict: Verdict, feedback_text: String) -> Self {
        let score = Score::Verdict(verdict);
        Self {
            identifier: identifier.to_string(),
            score,
            rating: Rating::from_points(score.points()),
            feedback_text,
            has_marks: false,
            marks: Vec::new(),
        }
    }

    /// Attach marks.
    #[must_use]
    pub fn with_marks(mut self, marks: Vec<Mark>) -> Self {
        self.has_marks = !marks.is_empty();
        self.marks = marks;
        self
    }
}

/// The capability set every assessment provides.
pub trait AssessmentRule: Send + Sync + fmt::Debug {
    /// Identifier reported in results and used by overrides.
    fn identifier(&self) -> &str;

    /// Researches the assessment reads. When one is missing for the active
    /// language, the assessment is not applicable.
    fn required_researches(&self) -> &[&'static str] {
        &[]
    }

    /// Whether the assessment depends on the keyphrase.
    fn uses_keyphrase(&self) -> bool {
        false
    }

    /// Whether there is enough content to assess.
    fn is_applicable(&self, paper: &Paper, researcher: &Researcher<'_>) -> bool {
        let _ = (paper, researcher);
        true
    }

    /// Score the paper.
    fn get_result(
        &self,
        paper: &Paper,
        researcher: &Researcher<'_>,
    ) -> Result<AssessmentResult, AssessmentError>;

    /// Score bands, for banded assessments.
    fn bands(&self) -> Option<&ScoreBands> {
        None
    }

    /// Mutable score bands, for banded assessments.
    fn bands_mut(&mut self) -> Option<&mut ScoreBands> {
        None
    }

    /// Mutable link fragments, for assessments with feedback links.
    fn links_mut(&mut self) -> Option<&mut LinkFragments> {
        None
    }

    /// Named boundaries and their values.
    fn thresholds(&self) -> Vec<(&'static str, f64)> {
        self.bands().map(ScoreBands::thresholds).unwrap_or_default()
    }

    /// Replace one named boundary.
    fn set_threshold(&mut self, name: &str, value: f64) -> Result<(), InvalidBoundary> {
        self.set_thresholds(&BTreeMap::from([(name.to_string(), value)]))
    }

    /// Replace named boundaries, all or none.
    fn set_thresholds(&mut self, values: &BTreeMap<String, f64>) -> Result<(), InvalidBoundary> {
        match self.bands_mut() {
            Some(bands) => {
                bands.set_all(values.iter().map(|(name, value)| (name.as_str(), *value)))
            }
            None => Err(fixed_thresholds(values, "the assessment has no adjustable thresholds")),
        }
    }
}

/// Every assessment an assessor can run.
#[derive(Debug, Clone)]
pub enum Assessment {
    /// Keyphrase in the first paragraph.
    IntroductionKeyword(seo::IntroductionKeyword),
    /// Keyphrase word count.
    KeyphraseLength(seo::KeyphraseLength),
    /// Keyphrase occurrences per 100 words.
    KeyphraseDensity(seo::KeyphraseDensity),
    /// Keyphrase in the meta description.
    MetaDescriptionKeyword(seo::MetaDescriptionKeyword),
    /// Meta description length.
    MetaDescriptionLength(seo::MetaDescriptionLength),
    /// Text length in words.
    TextLength(seo::TextLength),
    /// Keyphrase in the SEO title.
    TitleKeyword(seo::TitleKeyword),
    /// SEO title width.
    TitleWidth(seo::TitleWidth),
    /// Keyphrase in the slug.
    SlugKeyword(seo::SlugKeyword),
    /// Keyphrase made of function words only.
    FunctionWordsInKeyphrase(seo::FunctionWordsInKeyphrase),
    /// More than one H1.
    SingleH1(seo::SingleH1),
    /// Outbound links.
    ExternalLinks(seo::ExternalLinks),
    /// Internal links.
    InternalLinks(seo::InternalLinks),
    /// Keyphrase in subheadings.
    SubheadingsKeyword(seo::SubheadingsKeyword),
    /// Images and keyphrase alt text.
    Images(seo::Images),
    /// Text length between subheadings.
    SubheadingsTooLong(readability::SubheadingsTooLong),
    /// Paragraph length.
    ParagraphTooLong(readability::ParagraphTooLong),
    /// Share of long sentences.
    SentenceLength(readability::SentenceLength),
    /// Share of sentences with transition words.
    TransitionWords(readability::TransitionWords),
    /// Share of passive sentences.
    PassiveVoice(readability::PassiveVoice),
    /// Repeated sentence openings.
    SentenceBeginnings(readability::SentenceBeginnings),
    /// Very short texts.
    TextPresence(readability::TextPresence),
    /// Reading ease.
    FleschReadingEase(readability::FleschReadingEase),
    /// A configuration-defined regex rule.
    Pattern(custom::PatternAssessment),
    /// A rule supplied by library code.
    Plugin(Arc<dyn AssessmentRule>),
}

impl Assessment {
    /// Wrap a library-supplied rule.
    pub fn plugin(rule: impl AssessmentRule + 'static) -> Self {
        Self::Plugin(Arc::new(rule))
    }

    fn rule(&self) -> &dyn AssessmentRule {
        match self {
            Self::IntroductionKeyword(rule) => rule,
            Self::KeyphraseLength(rule) => rule,
            Self::KeyphraseDensity(rule) => rule,
            Self::MetaDescriptionKeyword(rule) => rule,
            Self::MetaDescriptionLength(rule) => rule,
            Self::TextLength(rule) => rule,
            Self::TitleKeyword(rule) => rule,
            Self::TitleWidth(rule) => rule,
            Self::SlugKeyword(rule) => rule,
            Self::FunctionWordsInKeyphrase(rule) => rule,
            Self::SingleH1(rule) => rule,
            Self::ExternalLinks(rule) => rule,
            Self::InternalLinks(rule) => rule,
            Self::SubheadingsKeyword(rule) => rule,
            Self::Images(rule) => rule,
            Self::SubheadingsTooLong(rule) => rule,
            Self::ParagraphTooLong(rule) => rule,
            Self::SentenceLength(rule) => rule,
            Self::TransitionWords(rule) => rule,
            Self::PassiveVoice(rule) => rule,
            Self::SentenceBeginnings(rule) => rule,
            Self::TextPresence(rule) => rule,
            Self::FleschReadingEase(rule) => rule,
            Self::Pattern(rule) => rule,
            Self::Plugin(rule) => rule.as_ref(),
        }
    }

    /// Plugin rules are shared and cannot be adjusted.
    fn rule_mut(&mut self) -> Option<&mut dyn AssessmentRule> {
        let rule: &mut dyn AssessmentRule = match self {
            Self::IntroductionKeyword(rule) => rule,
            Self::KeyphraseLength(rule) => rule,
            Self::KeyphraseDensity(rule) => rule,
            Self::MetaDescriptionKeyword(rule) => rule,
            Self::MetaDescriptionLength(rule) => rule,
            Self::TextLength(rule) => rule,
            Self::TitleKeyword(rule) => rule,
            Self::TitleWidth(rule) => rule,
            Self::SlugKeyword(rule) => rule,
            Self::FunctionWordsInKeyphrase(rule) => rule,
            Self::SingleH1(rule) => rule,
            Self::ExternalLinks(rule) => rule,
            Self::InternalLinks(rule) => rule,
            Self::SubheadingsKeyword(rule) => rule,
            Self::Images(rule) => rule,
            Self::SubheadingsTooLong(rule) => rule,
            Self::ParagraphTooLong(rule) => rule,
            Self::SentenceLength(rule) => rule,
            Self::TransitionWords(rule) => rule,
            Self::PassiveVoice(rule) => rule,
            Self::SentenceBeginnings(rule) => rule,
            Self::TextPresence(rule) => rule,
            Self::FleschReadingEase(rule) => rule,
            Self::Pattern(rule) => rule,
            Self::Plugin(_) => return None,
        };
        Some(rule)
    }
}

impl AssessmentRule for Assessment {
    fn identifier(&self) -> &str {
        self.rule().identifier()
    }

    fn required_researches(&self) -> &[&'static str] {
        self.rule().required_researches()
    }

    fn uses_keyphrase(&self) -> bool {
        self.rule().uses_keyphrase()
    }

    fn is_applicable(&self, paper: &Paper, researcher: &Researcher<'_>) -> bool {
        self.rule().is_applicable(paper, researcher)
    }

    fn get_result(
        &self,
        paper: &Paper,
        researcher: &Researcher<'_>,
    ) -> Result<AssessmentResult, AssessmentError> {
        self.rule().get_result(paper, researcher)
    }

    fn bands(&self) -> Option<&ScoreBands> {
        self.rule().bands()
    }

    fn bands_mut(&mut self) -> Option<&mut ScoreBands> {
        self.rule_mut()?.bands_mut()
    }

    fn links_mut(&mut self) -> Option<&mut LinkFragments> {
        self.rule_mut()?.links_mut()
    }

    fn thresholds(&self) -> Vec<(&'static str, f64)> {
        self.rule().thresholds()
    }

    fn set_thresholds(&mut self, values: &BTreeMap<String, f64>) -> Result<(), InvalidBoundary> {
        match self.rule_mut() {
            Some(rule) => rule.set_thresholds(values),
            None => Err(fixed_thresholds(values, "plugin assessments have fixed thresholds")),
        }
    }
}

fn fixed_thresholds(values: &BTreeMap<String, f64>, reason: &str) -> InvalidBoundary {
    InvalidBoundary {
        name: values.keys().next().cloned().unwrap_or_default(),
        reason: reason.to_string(),
    }
}

/// Run a research and pick the expected shape out of its fact.
pub(crate) fn fact<T>(
    researcher: &Researcher<'_>,
    assessment: &str,
    research: &'static str,
    pick: impl FnOnce(&Fact) -> Option<T>,
) -> Result<T, AssessmentError> {
    let fact = researcher
        .run(research)
        .ok_or_else(|| AssessmentError::MissingResearch {
            assessment: assessment.to_string(),
            research,
        })?;
    pick(&fact).ok_or_else(|| AssessmentError::UnexpectedFact {
        assessment: assessment.to_string(),
        research,
    })
}

/// Run a counting research.
pub(crate) fn count(
    researcher: &Researcher<'_>,
    assessment: &str,
    research: &'static str,
) -> Result<usize, AssessmentError> {
    fact(researcher, assessment, research, |fact| match fact {
        Fact::Count(n) => Some(*n),
        _ => None,
    })
}

/// Whether the paper has both a keyphrase and body text.
pub(crate) fn has_keyphrase_and_text(paper: &Paper) -> bool {
    paper.has_keyword() && paper.has_text()
}

/// Display a measure without a trailing `.0`.
pub(crate) fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.1}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anchors_and_default_links() {
        assert_eq!(
            create_anchor_opening_tag("https://yoa.st/34j"),
            "<a href='https://yoa.st/34j' target='_blank'>"
        );
        let links = LinkFragments::for_identifier("https://example.com/help/", "textLength");
        assert_eq!(
            links.title("Text length"),
            "<a href='https://example.com/help/textLength' target='_blank'>Text length</a>"
        );
        assert_eq!(
            links.call_to_action,
            "<a href='https://example.com/help/textLength-cta' target='_blank'>"
        );
    }

    #[test]
    fn ratings_follow_score_ranges() {
        assert_eq!(Rating::from_points(0), Rating::Feedback);
        assert_eq!(Rating::from_points(4), Rating::Bad);
        assert_eq!(Rating::from_points(5), Rating::Ok);
        assert_eq!(Rating::from_points(7), Rating::Good);
        assert_eq!(Rating::from_overall(40), Rating::Bad);
        assert_eq!(Rating::from_overall(41), Rating::Ok);
        assert_eq!(Rating::from_overall(71), Rating::Good);
    }

    #[test]
    fn verdicts_have_fixed_points() {
        assert_eq!(Score::Verdict(Verdict::Good).points(), 9);
        assert_eq!(Score::Verdict(Verdict::Bad).points(), 3);
        let result = AssessmentResult::verdict("x", Verdict::Bad, String::new());
        assert_eq!(result.rating, Rating::Bad);
    }

    #[test]
    fn single_threshold_override() {
        let mut assessment =
            Assessment::TextLength(seo::TextLength::new(LinkFragments::for_identifier(
                "https://example.com/",
                "textLength",
            )));
        assessment.set_threshold("recommendedMinimum", 400.0).unwrap();
        assert!(
            assessment
                .thresholds()
                .contains(&("recommendedMinimum", 400.0))
        );
        let err = assessment.set_threshold("recommendedMinimum", 10.0).unwrap_err();
        assert_eq!(err.name, "recommendedMinimum");
        assert!(assessment.set_threshold("nope", 1.0).is_err());
    }

    #[test]
    fn results_serialize_camel_case() {
        let result = AssessmentResult::points("textLength", 9, "Good job!".into())
            .with_marks(vec![Mark::whole("A sentence.")]);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["feedbackText"], "Good job!");
        assert_eq!(json["hasMarks"], true);
        assert_eq!(json["score"], 9);
        assert_eq!(json["rating"], "good");
        assert_eq!(json["marks"][0]["original"], "A sentence.");

        let verdict = AssessmentResult::verdict("noLorem", Verdict::Good, String::new());
        let json = serde_json::to_value(&verdict).unwrap();
        assert_eq!(json["score"], "good");
        assert!(json.get("marks").is_none());
    }
}
