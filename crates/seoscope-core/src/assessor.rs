//! Assessors: ordered assessment lists per content profile.
//!
//! There is one [`Assessor`] type. What differs between SEO, cornerstone,
//! taxonomy, collection and readability analysis is only the list of
//! assessments [`AssessorKind::assessments`] builds and how they are
//! configured.

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::assessment::readability::{
    FleschReadingEase, ParagraphTooLong, PassiveVoice, SentenceBeginnings, SentenceLength,
    SubheadingsTooLong, TextPresence, TransitionWords,
};
use crate::assessment::seo::{
    ExternalLinks, FunctionWordsInKeyphrase, Images, InternalLinks, IntroductionKeyword,
    KeyphraseDensity, KeyphraseLength, MetaDescriptionKeyword, MetaDescriptionLength, SingleH1,
    SlugKeyword, SubheadingsKeyword, TextLength, TitleKeyword, TitleWidth,
};
use crate::assessment::{Assessment, AssessmentResult, AssessmentRule, LinkFragments, Rating};
use crate::error::Cancelled;
use crate::paper::Paper;
use crate::pluggable::Pluggable;
use crate::research::{ResearchRegistry, Researcher};

/// Content profiles an assessor can be built for.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Deserialize,
    Serialize,
    JsonSchema,
)]
#[serde(rename_all = "kebab-case")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum AssessorKind {
    /// Posts and pages.
    #[default]
    Seo,
    /// Cornerstone posts and pages, with a higher text length target.
    CornerstoneSeo,
    /// Taxonomy archive pages.
    TaxonomySeo,
    /// Shop collection pages.
    CollectionSeo,
    /// Readability of posts and pages.
    Readability,
    /// Readability of cornerstone content.
    CornerstoneReadability,
}

impl AssessorKind {
    /// Every profile.
    pub const ALL: [Self; 6] = [
        Self::Seo,
        Self::CornerstoneSeo,
        Self::TaxonomySeo,
        Self::CollectionSeo,
        Self::Readability,
        Self::CornerstoneReadability,
    ];

    /// The profile name as used in configuration and on the wire.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Seo => "seo",
            Self::CornerstoneSeo => "cornerstone-seo",
            Self::TaxonomySeo => "taxonomy-seo",
            Self::CollectionSeo => "collection-seo",
            Self::Readability => "readability",
            Self::CornerstoneReadability => "cornerstone-readability",
        }
    }

    /// Whether this is one of the readability profiles.
    pub const fn is_readability(&self) -> bool {
        matches!(self, Self::Readability | Self::CornerstoneReadability)
    }

    /// The built-in assessments of this profile, in run order, with default
    /// feedback links under `link_base`.
    pub fn assessments(self, link_base: &str) -> Vec<Assessment> {
        let link = |id: &str| LinkFragments::for_identifier(link_base, id);
        let shop = |title: &str, cta: &str| LinkFragments::with_paths(link_base, title, cta);

        match self {
            Self::Seo | Self::CornerstoneSeo => {
                let text_length = if self == Self::CornerstoneSeo {
                    TextLength::cornerstone(link(TextLength::ID))
                } else {
                    TextLength::new(link(TextLength::ID))
                };
                vec![
                    Assessment::IntroductionKeyword(IntroductionKeyword::new(link(
                        IntroductionKeyword::ID,
                    ))),
                    Assessment::KeyphraseLength(KeyphraseLength::new(link(KeyphraseLength::ID))),
                    Assessment::KeyphraseDensity(KeyphraseDensity::new(link(
                        KeyphraseDensity::ID,
                    ))),
                    Assessment::MetaDescriptionKeyword(MetaDescriptionKeyword::new(link(
                        MetaDescriptionKeyword::ID,
                    ))),
                    Assessment::MetaDescriptionLength(MetaDescriptionLength::new(link(
                        MetaDescriptionLength::ID,
                    ))),
                    Assessment::SubheadingsKeyword(SubheadingsKeyword::new(link(
                        SubheadingsKeyword::ID,
                    ))),
                    Assessment::Images(Images::new(link(Images::ID))),
                    Assessment::TextLength(text_length),
                    Assessment::ExternalLinks(ExternalLinks::new(link(ExternalLinks::ID))),
                    Assessment::TitleKeyword(TitleKeyword::new(link(TitleKeyword::ID))),
                    Assessment::InternalLinks(InternalLinks::new(link(InternalLinks::ID))),
                    Assessment::TitleWidth(TitleWidth::new(link(TitleWidth::ID))),
                    Assessment::SlugKeyword(SlugKeyword::new(link(SlugKeyword::ID))),
                    Assessment::FunctionWordsInKeyphrase(FunctionWordsInKeyphrase::new(link(
                        FunctionWordsInKeyphrase::ID,
                    ))),
                    Assessment::SingleH1(SingleH1::new(link(SingleH1::ID))),
                ]
            }
            Self::TaxonomySeo => vec![
                Assessment::IntroductionKeyword(IntroductionKeyword::new(link(
                    IntroductionKeyword::ID,
                ))),
                Assessment::KeyphraseLength(KeyphraseLength::new(link(KeyphraseLength::ID))),
                Assessment::KeyphraseDensity(KeyphraseDensity::new(link(KeyphraseDensity::ID))),
                Assessment::MetaDescriptionKeyword(MetaDescriptionKeyword::new(link(
                    MetaDescriptionKeyword::ID,
                ))),
                Assessment::MetaDescriptionLength(MetaDescriptionLength::new(link(
                    MetaDescriptionLength::ID,
                ))),
                Assessment::TextLength(TextLength::taxonomy(link(TextLength::ID))),
                Assessment::TitleKeyword(TitleKeyword::new(link(TitleKeyword::ID))),
                Assessment::TitleWidth(TitleWidth::new(link(TitleWidth::ID))),
                Assessment::SlugKeyword(SlugKeyword::new(link(SlugKeyword::ID))),
                Assessment::FunctionWordsInKeyphrase(FunctionWordsInKeyphrase::new(link(
                    FunctionWordsInKeyphrase::ID,
                ))),
                Assessment::SingleH1(SingleH1::new(link(SingleH1::ID))),
            ],
            Self::CollectionSeo => vec![
                Assessment::IntroductionKeyword(IntroductionKeyword::new(shop(
                    "shopify8", "shopify9",
                ))),
                Assessment::KeyphraseLength(KeyphraseLength::new(link(KeyphraseLength::ID))),
                Assessment::KeyphraseDensity(KeyphraseDensity::new(link(KeyphraseDensity::ID))),
                Assessment::MetaDescriptionKeyword(MetaDescriptionKeyword::new(link(
                    MetaDescriptionKeyword::ID,
                ))),
                Assessment::MetaDescriptionLength(MetaDescriptionLength::new(link(
                    MetaDescriptionLength::ID,
                ))),
                Assessment::TextLength(TextLength::taxonomy(shop("34j", "34k"))),
                Assessment::TitleKeyword(TitleKeyword::new(shop("shopify24", "shopify25"))),
                Assessment::TitleWidth(TitleWidth::new(link(TitleWidth::ID))),
                Assessment::SlugKeyword(SlugKeyword::new(shop("shopify26", "shopify27"))),
                Assessment::FunctionWordsInKeyphrase(FunctionWordsInKeyphrase::new(link(
                    FunctionWordsInKeyphrase::ID,
                ))),
                Assessment::SingleH1(SingleH1::new(link(SingleH1::ID))),
            ],
            Self::Readability | Self::CornerstoneReadability => {
                let cornerstone = self == Self::CornerstoneReadability;
                let subheadings = if cornerstone {
                    SubheadingsTooLong::cornerstone(link(SubheadingsTooLong::ID))
                } else {
                    SubheadingsTooLong::new(link(SubheadingsTooLong::ID))
                };
                let sentences = if cornerstone {
                    SentenceLength::cornerstone(link(SentenceLength::ID))
                } else {
                    SentenceLength::new(link(SentenceLength::ID))
                };
                vec![
                    Assessment::SubheadingsTooLong(subheadings),
                    Assessment::ParagraphTooLong(ParagraphTooLong::new(link(
                        ParagraphTooLong::ID,
                    ))),
                    Assessment::SentenceLength(sentences),
                    Assessment::TransitionWords(TransitionWords::new(link(TransitionWords::ID))),
                    Assessment::PassiveVoice(PassiveVoice::new(link(PassiveVoice::ID))),
                    Assessment::TextPresence(TextPresence::new(link(TextPresence::ID))),
                    Assessment::SentenceBeginnings(SentenceBeginnings::new(link(
                        SentenceBeginnings::ID,
                    ))),
                    Assessment::FleschReadingEase(FleschReadingEase::new(link(
                        FleschReadingEase::ID,
                    ))),
                ]
            }
        }
    }
}

impl fmt::Display for AssessorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared flag that asks a running assessor to stop.
///
/// Checked before each assessment and once more before a run completes.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    /// A lowered flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the flag.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Whether the flag was raised.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Lifecycle of an [`Assessor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AssessorState {
    /// Never run, or the last run was cancelled.
    Idle,
    /// A run is in progress.
    Running,
    /// The last run finished; its results are available.
    Complete,
}

/// Runs an ordered list of assessments over a paper.
#[derive(Debug)]
pub struct Assessor {
    kind: AssessorKind,
    assessments: Vec<Assessment>,
    pluggable: Arc<Pluggable>,
    state: AssessorState,
    results: Vec<AssessmentResult>,
}

impl Assessor {
    /// An assessor running `assessments`, then whatever the registry holds
    /// for `kind` at the start of each run.
    pub fn new(
        kind: AssessorKind,
        assessments: Vec<Assessment>,
        pluggable: Arc<Pluggable>,
    ) -> Self {
        Self {
            kind,
            assessments,
            pluggable,
            state: AssessorState::Idle,
            results: Vec::new(),
        }
    }

    /// An assessor with the profile's built-in assessments.
    pub fn for_profile(kind: AssessorKind, link_base: &str, pluggable: Arc<Pluggable>) -> Self {
        Self::new(kind, kind.assessments(link_base), pluggable)
    }

    /// The profile this assessor runs.
    pub const fn kind(&self) -> AssessorKind {
        self.kind
    }

    /// Current lifecycle state.
    pub const fn state(&self) -> AssessorState {
        self.state
    }

    /// The built-in assessments, in run order.
    pub fn assessments(&self) -> &[Assessment] {
        &self.assessments
    }

    /// A built-in assessment by identifier, for reconfiguration.
    pub fn assessment_mut(&mut self, identifier: &str) -> Option<&mut Assessment> {
        self.assessments
            .iter_mut()
            .find(|a| a.identifier() == identifier)
    }

    /// Results of the last completed run.
    pub fn results(&self) -> &[AssessmentResult] {
        &self.results
    }

    /// Overall score of the last completed run, 0–100.
    pub fn overall_score(&self) -> u8 {
        overall_score(&self.results)
    }

    /// Rating of [`overall_score`](Self::overall_score).
    pub fn rating(&self) -> Rating {
        Rating::from_overall(self.overall_score())
    }

    /// Run every applicable assessment and replace the previous results.
    ///
    /// Plugin assessments and content filters are snapshotted from the
    /// registry when the run starts. A plugin assessment sharing an
    /// identifier with a built-in one is skipped. When `cancel` is raised the
    /// partial results are dropped and the assessor goes back to idle.
    #[tracing::instrument(skip_all, fields(profile = %self.kind))]
    pub fn assess(
        &mut self,
        paper: &Paper,
        registry: &ResearchRegistry,
        cancel: &CancellationFlag,
    ) -> Result<&[AssessmentResult], Cancelled> {
        self.state = AssessorState::Running;
        self.results.clear();

        let plugins = self.pluggable.assessments_for(self.kind);
        let researcher = Researcher::with_filters(paper, registry, &self.pluggable.filters());
        let builtin = &self.assessments;
        let extra = plugins.iter().filter(|plugin| {
            let shadowed = builtin
                .iter()
                .any(|a| a.identifier() == plugin.identifier());
            if shadowed {
                tracing::warn!(
                    identifier = plugin.identifier(),
                    "plugin assessment shadows a built-in one, skipping"
                );
            }
            !shadowed
        });

        let mut results = Vec::new();
        for assessment in builtin.iter().chain(extra) {
            if cancel.is_cancelled() {
                break;
            }
            if let Some(result) = run_assessment(assessment, paper, &researcher) {
                results.push(result);
            }
        }

        if cancel.is_cancelled() {
            tracing::debug!(completed = results.len(), "run cancelled");
            self.state = AssessorState::Idle;
            return Err(Cancelled);
        }

        self.results = results;
        self.state = AssessorState::Complete;
        tracing::debug!(
            results = self.results.len(),
            overall = self.overall_score(),
            "run complete"
        );
        Ok(&self.results)
    }
}

/// Run one assessment, or `None` when it does not apply or fails.
fn run_assessment(
    assessment: &Assessment,
    paper: &Paper,
    researcher: &Researcher<'_>,
) -> Option<AssessmentResult> {
    let identifier = assessment.identifier();
    if let Some(missing) = assessment
        .required_researches()
        .iter()
        .find(|name| !researcher.has(name))
    {
        tracing::debug!(identifier, research = missing, "research unavailable, not applicable");
        return None;
    }

    let outcome = catch_unwind(AssertUnwindSafe(|| {
        if assessment.is_applicable(paper, researcher) {
            assessment.get_result(paper, researcher).map(Some)
        } else {
            Ok(None)
        }
    }));
    match outcome {
        Ok(Ok(Some(result))) => {
            tracing::trace!(identifier, score = result.score.points(), "assessed");
            Some(result)
        }
        Ok(Ok(None)) => {
            tracing::trace!(identifier, "not applicable");
            None
        }
        Ok(Err(error)) => {
            tracing::warn!(identifier, %error, "assessment failed, excluding it");
            None
        }
        Err(_) => {
            tracing::warn!(identifier, "assessment panicked, excluding it");
            None
        }
    }
}

/// Aggregate 0–9 scores into a 0–100 score, rounding half up.
///
/// Zero when there are no results.
pub fn overall_score(results: &[AssessmentResult]) -> u8 {
    if results.is_empty() {
        return 0;
    }
    let sum: u32 = results.iter().map(|r| u32::from(r.score.points())).sum();
    let score = (f64::from(sum) * 100.0 / (results.len() as f64 * 9.0)).round();
    score.clamp(0.0, 100.0) as u8
}
