//! Pattern assessments declared in configuration.

use regex::{Regex, RegexBuilder};

use super::{AssessmentResult, AssessmentRule, Mark, Verdict, fact};
use crate::config::CustomAssessmentConfig;
use crate::error::{AssessmentError, ConfigError, ConfigResult};
use crate::paper::Paper;
use crate::research::{Fact, Researcher};

/// Counts regex matches in the body sentences.
///
/// Good while the number of matches stays at or below `max_occurrences`.
#[derive(Debug, Clone)]
pub struct PatternAssessment {
    identifier: String,
    pattern: Regex,
    max_occurrences: usize,
    title: String,
    good_feedback: Option<String>,
    bad_feedback: Option<String>,
}

impl PatternAssessment {
    /// Compile a configured rule.
    pub fn from_config(config: &CustomAssessmentConfig) -> ConfigResult<Self> {
        let pattern = RegexBuilder::new(&config.pattern)
            .case_insensitive(config.case_insensitive)
            .build()
            .map_err(|source| ConfigError::InvalidPattern {
                identifier: config.identifier.clone(),
                source,
            })?;
        Ok(Self {
            identifier: config.identifier.clone(),
            pattern,
            max_occurrences: config.max_occurrences,
            title: config.title.clone(),
            good_feedback: config.good_feedback.clone(),
            bad_feedback: config.bad_feedback.clone(),
        })
    }
}

impl AssessmentRule for PatternAssessment {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn required_researches(&self) -> &[&'static str] {
        &["sentences"]
    }

    fn is_applicable(&self, paper: &Paper, _: &Researcher<'_>) -> bool {
        paper.has_text()
    }

    fn get_result(
        &self,
        _: &Paper,
        researcher: &Researcher<'_>,
    ) -> Result<AssessmentResult, AssessmentError> {
        let sentences = fact(researcher, &self.identifier, "sentences", |f| match f {
            Fact::Texts(texts) => Some(texts.clone()),
            _ => None,
        })?;

        let mut matches = 0;
        let mut marks = Vec::new();
        for sentence in &sentences {
            let found = self.pattern.find_iter(sentence).count();
            if found > 0 {
                matches += found;
                marks.push(Mark::whole(sentence));
            }
        }

        let (verdict, feedback) = if matches <= self.max_occurrences {
            let text = self
                .good_feedback
                .clone()
                .unwrap_or_else(|| "No problems found.".to_string());
            (Verdict::Good, text)
        } else {
            let text = self.bad_feedback.clone().unwrap_or_else(|| {
                format!(
                    "Found {matches} matches, at most {} allowed.",
                    self.max_occurrences
                )
            });
            (Verdict::Bad, text)
        };
        tracing::trace!(identifier = %self.identifier, matches, "pattern assessed");
        Ok(AssessmentResult::verdict(
            &self.identifier,
            verdict,
            format!("{}: {feedback}", self.title),
        )
        .with_marks(marks))
    }
}
