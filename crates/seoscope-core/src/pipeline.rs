//! The reusable analysis pipeline.
//!
//! A [`Pipeline`] is built once from an [`AnalysisConfig`]: it resolves the
//! language pack, assembles that language's researches, builds one
//! [`Assessor`] per profile and applies link and threshold overrides. Custom
//! assessments from the configuration are registered on the shared
//! [`Pluggable`]. After that it analyzes any number of papers.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::assessment::custom::PatternAssessment;
use crate::assessment::{Assessment, AssessmentResult, AssessmentRule, LinkFragments, Rating};
use crate::assessor::{Assessor, AssessorKind, CancellationFlag};
use crate::config::AnalysisConfig;
use crate::error::{Cancelled, ConfigError, ConfigResult};
use crate::language::{self, LanguagePack};
use crate::paper::Paper;
use crate::pluggable::Pluggable;
use crate::research::ResearchRegistry;

/// Results of one analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    /// The profile that ran.
    pub profile: AssessorKind,
    /// Results of the applicable assessments, in run order.
    pub results: Vec<AssessmentResult>,
    /// Aggregate score, 0–100.
    pub overall_score: u8,
    /// Rating of the aggregate score.
    pub rating: Rating,
}

/// A configured language pack, research registry and set of assessors.
#[derive(Debug)]
pub struct Pipeline {
    config: AnalysisConfig,
    registry: ResearchRegistry,
    other_languages: HashMap<&'static str, ResearchRegistry>,
    pluggable: Arc<Pluggable>,
    assessors: BTreeMap<AssessorKind, Assessor>,
}

impl Pipeline {
    /// Build a pipeline with a fresh extension registry.
    pub fn new(config: AnalysisConfig) -> ConfigResult<Self> {
        Self::with_pluggable(config, Arc::new(Pluggable::new()))
    }

    /// Build a pipeline around an existing extension registry.
    ///
    /// Fails on a malformed or unsupported locale, an override that names an
    /// unknown assessment or boundary, or an invalid custom pattern.
    #[tracing::instrument(skip_all, fields(locale = %config.locale))]
    pub fn with_pluggable(config: AnalysisConfig, pluggable: Arc<Pluggable>) -> ConfigResult<Self> {
        let language = language::resolve(&config.locale, config.locale_fallback)?;
        let registry = ResearchRegistry::for_language(language);

        let mut assessors: BTreeMap<AssessorKind, Assessor> = AssessorKind::ALL
            .into_iter()
            .map(|kind| {
                let assessor =
                    Assessor::for_profile(kind, &config.link_base, Arc::clone(&pluggable));
                (kind, assessor)
            })
            .collect();

        apply_link_overrides(&mut assessors, &config)?;
        apply_threshold_overrides(&mut assessors, &config)?;
        register_custom_assessments(&pluggable, &config)?;

        tracing::info!(
            language = language.name,
            researches = registry.names().len(),
            "pipeline ready"
        );
        Ok(Self {
            config,
            registry,
            other_languages: HashMap::new(),
            pluggable,
            assessors,
        })
    }

    /// The configuration the pipeline was built from.
    pub const fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// The resolved language pack.
    pub const fn language(&self) -> &'static LanguagePack {
        self.registry.language()
    }

    /// The research registry.
    pub const fn registry(&self) -> &ResearchRegistry {
        &self.registry
    }

    /// The shared extension registry.
    pub const fn pluggable(&self) -> &Arc<Pluggable> {
        &self.pluggable
    }

    /// The assessor of one profile.
    pub fn assessor(&self, kind: AssessorKind) -> Option<&Assessor> {
        self.assessors.get(&kind)
    }

    /// Analyze a paper with the configured default profile.
    pub fn analyze(&mut self, paper: &Paper) -> AnalysisReport {
        let profile = self.config.profile;
        self.run(paper, profile, &CancellationFlag::new())
            .unwrap_or_else(|Cancelled| empty_report(profile))
    }

    /// Analyze a paper with the given profile, stopping when `cancel` is raised.
    ///
    /// A paper that names its own locale is researched with that language's
    /// pack, falling back like the configured locale does. A locale that
    /// cannot be resolved is ignored with a warning.
    #[tracing::instrument(skip(self, paper, cancel))]
    pub fn run(
        &mut self,
        paper: &Paper,
        profile: AssessorKind,
        cancel: &CancellationFlag,
    ) -> Result<AnalysisReport, Cancelled> {
        let language = self.paper_language(paper);
        let registry: &ResearchRegistry = if language.code == self.registry.language().code {
            &self.registry
        } else {
            self.other_languages
                .entry(language.code)
                .or_insert_with(|| ResearchRegistry::for_language(language))
        };
        let assessor = self
            .assessors
            .entry(profile)
            .or_insert_with(|| {
                Assessor::for_profile(profile, &self.config.link_base, Arc::clone(&self.pluggable))
            });
        assessor.assess(paper, registry, cancel)?;
        Ok(AnalysisReport {
            profile,
            results: assessor.results().to_vec(),
            overall_score: assessor.overall_score(),
            rating: assessor.rating(),
        })
    }

    fn paper_language(&self, paper: &Paper) -> &'static LanguagePack {
        let locale = paper.locale().trim();
        if locale.is_empty() {
            return self.registry.language();
        }
        match language::resolve(locale, self.config.locale_fallback) {
            Ok(language) => language,
            Err(error) => {
                tracing::warn!(locale, %error, "ignoring paper locale");
                self.registry.language()
            }
        }
    }
}

fn empty_report(profile: AssessorKind) -> AnalysisReport {
    AnalysisReport {
        profile,
        results: Vec::new(),
        overall_score: 0,
        rating: Rating::Feedback,
    }
}

fn apply_link_overrides(
    assessors: &mut BTreeMap<AssessorKind, Assessor>,
    config: &AnalysisConfig,
) -> ConfigResult<()> {
    for (identifier, targets) in &config.link_overrides {
        let mut found = false;
        for assessor in assessors.values_mut() {
            if let Some(links) = assessor
                .assessment_mut(identifier)
                .and_then(AssessmentRule::links_mut)
            {
                *links = LinkFragments::new(&targets.title, &targets.call_to_action);
                found = true;
            }
        }
        if !found {
            return Err(ConfigError::UnknownAssessment {
                identifier: identifier.clone(),
            });
        }
    }
    Ok(())
}

/// Apply each override to every profile whose ladder accepts it.
///
/// Profiles ship different defaults, so a value can be valid for one and
/// cross a boundary in another. Those profiles keep their defaults. The
/// override fails only when no profile carries the assessment or none
/// accepts the values.
fn apply_threshold_overrides(
    assessors: &mut BTreeMap<AssessorKind, Assessor>,
    config: &AnalysisConfig,
) -> ConfigResult<()> {
    for (identifier, boundaries) in &config.assessment_overrides {
        let mut applied = 0_usize;
        let mut rejected = None;
        for assessor in assessors.values_mut() {
            let profile = assessor.kind();
            let Some(assessment) = assessor.assessment_mut(identifier) else {
                continue;
            };
            match assessment.set_thresholds(boundaries) {
                Ok(()) => {
                    applied += 1;
                    tracing::debug!(%profile, %identifier, "thresholds overridden");
                }
                Err(invalid) => {
                    tracing::warn!(
                        %profile,
                        %identifier,
                        boundary = %invalid.name,
                        reason = %invalid.reason,
                        "override does not fit this profile, keeping its defaults"
                    );
                    rejected.get_or_insert(invalid);
                }
            }
        }
        match (applied, rejected) {
            (0, Some(invalid)) => {
                return Err(ConfigError::MalformedOverride {
                    identifier: identifier.clone(),
                    boundary: invalid.name,
                    reason: invalid.reason,
                });
            }
            (0, None) => {
                return Err(ConfigError::UnknownAssessment {
                    identifier: identifier.clone(),
                });
            }
            _ => {}
        }
    }
    Ok(())
}

/// Compile every custom assessment before registering any, so a bad pattern
/// leaves the registry untouched.
fn register_custom_assessments(pluggable: &Pluggable, config: &AnalysisConfig) -> ConfigResult<()> {
    let compiled = config
        .custom_assessments
        .iter()
        .map(|custom| Ok((custom, PatternAssessment::from_config(custom)?)))
        .collect::<ConfigResult<Vec<_>>>()?;

    for (custom, assessment) in compiled {
        if !pluggable.plugins().iter().any(|p| p.name == custom.plugin) {
            pluggable.register_plugin(&custom.plugin)?;
        }
        // Re-initializing replaces the previous definition.
        pluggable.remove_assessment(custom.assessor, &custom.identifier, &custom.plugin);
        pluggable.register_assessment(
            custom.assessor,
            Assessment::Pattern(assessment),
            &custom.plugin,
        )?;
        tracing::debug!(
            identifier = %custom.identifier,
            assessor = %custom.assessor,
            plugin = %custom.plugin,
            "custom assessment registered"
        );
    }
    Ok(())
}
