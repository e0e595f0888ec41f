//! Language packs.
//!
//! A [`LanguagePack`] bundles the word lists and helpers that
//! language-aware researches need, plus the researches only that language
//! supports. [`resolve`] maps a locale onto a pack, falling back to the
//! language-neutral [`default_pack`] when no dedicated pack exists.

use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;

use aho_corasick::{AhoCorasick, AhoCorasickBuilder, MatchKind};

use crate::error::{ConfigError, ConfigResult};
use crate::research::ResearchFn;

mod english;
mod german;
pub mod syllables;

/// Coefficients of a Flesch-style reading ease formula:
/// `base - sentence_weight * words_per_sentence - syllable_weight * syllables_per_word`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FleschFormula {
    /// Constant term.
    pub base: f64,
    /// Weight of the average sentence length in words.
    pub sentence_weight: f64,
    /// Weight of the average word length in syllables.
    pub syllable_weight: f64,
}

impl FleschFormula {
    /// Reading ease for the given averages, clamped to 0..=100.
    pub fn score(&self, words_per_sentence: f64, syllables_per_word: f64) -> f64 {
        let raw = self.base
            - self.sentence_weight * words_per_sentence
            - self.syllable_weight * syllables_per_word;
        raw.clamp(0.0, 100.0)
    }
}

/// Per-language data and helpers.
pub struct LanguagePack {
    /// ISO 639-1 code, empty for the language-neutral pack.
    pub code: &'static str,
    /// English name of the language.
    pub name: &'static str,
    function_words: HashSet<&'static str>,
    first_word_exceptions: HashSet<&'static str>,
    transitions: Option<AhoCorasick>,
    stem: fn(&str) -> String,
    syllables: Option<fn(&str) -> usize>,
    flesch: Option<FleschFormula>,
    passive: Option<fn(&[String]) -> bool>,
    researches: &'static [(&'static str, ResearchFn)],
}

impl fmt::Debug for LanguagePack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LanguagePack")
            .field("code", &self.code)
            .field("name", &self.name)
            .field("function_words", &self.function_words.len())
            .field("researches", &self.researches.len())
            .finish_non_exhaustive()
    }
}

/// Ingredients for a [`LanguagePack`].
pub(crate) struct PackSpec {
    pub code: &'static str,
    pub name: &'static str,
    pub function_words: &'static [&'static str],
    pub first_word_exceptions: &'static [&'static str],
    pub transition_words: &'static [&'static str],
    pub stem: fn(&str) -> String,
    pub syllables: Option<fn(&str) -> usize>,
    pub flesch: Option<FleschFormula>,
    pub passive: Option<fn(&[String]) -> bool>,
    pub researches: &'static [(&'static str, ResearchFn)],
}

impl LanguagePack {
    pub(crate) fn build(spec: PackSpec) -> Self {
        let transitions = (!spec.transition_words.is_empty())
            .then(|| {
                AhoCorasickBuilder::new()
                    .ascii_case_insensitive(true)
                    .match_kind(MatchKind::Standard)
                    .build(spec.transition_words)
                    .ok()
            })
            .flatten();
        Self {
            code: spec.code,
            name: spec.name,
            function_words: spec.function_words.iter().copied().collect(),
            first_word_exceptions: spec.first_word_exceptions.iter().copied().collect(),
            transitions,
            stem: spec.stem,
            syllables: spec.syllables,
            flesch: spec.flesch,
            passive: spec.passive,
            researches: spec.researches,
        }
    }

    /// Whether this is the language-neutral fallback pack.
    pub fn is_default(&self) -> bool {
        self.code.is_empty()
    }

    /// Whether a normalized word is a function word (article, preposition, ...).
    pub fn is_function_word(&self, word: &str) -> bool {
        self.function_words.contains(word)
    }

    /// Whether the pack knows any function words.
    pub fn has_function_words(&self) -> bool {
        !self.function_words.is_empty()
    }

    /// Whether a normalized word is skipped when comparing sentence openings.
    pub fn is_first_word_exception(&self, word: &str) -> bool {
        self.first_word_exceptions.contains(word)
    }

    /// Reduce a normalized word to a stem for keyphrase matching.
    pub fn stem(&self, word: &str) -> String {
        (self.stem)(word)
    }

    /// Syllables in a word, when the pack can count them.
    pub fn syllables(&self, word: &str) -> Option<usize> {
        self.syllables.map(|count| count(word))
    }

    /// The reading ease formula, when the pack has one.
    pub const fn flesch(&self) -> Option<FleschFormula> {
        self.flesch
    }

    /// Whether the pack can detect passive sentences.
    pub const fn detects_passive(&self) -> bool {
        self.passive.is_some()
    }

    /// Whether the pack knows any transition words.
    pub const fn detects_transitions(&self) -> bool {
        self.transitions.is_some()
    }

    /// Whether a sentence (as normalized words) is in the passive voice.
    pub fn is_passive(&self, words: &[String]) -> Option<bool> {
        self.passive.map(|detect| detect(words))
    }

    /// Whether the sentence contains a transition word or phrase.
    ///
    /// Matches must start and end on word boundaries, so "so" does not
    /// match inside "also".
    pub fn has_transition(&self, sentence: &str) -> Option<bool> {
        let matcher = self.transitions.as_ref()?;
        let lower = sentence.to_lowercase();
        let found = matcher.find_overlapping_iter(&lower).any(|m| {
            let before = lower[..m.start()].chars().next_back();
            let after = lower[m.end()..].chars().next();
            before.is_none_or(|c| !c.is_alphanumeric())
                && after.is_none_or(|c| !c.is_alphanumeric())
        });
        Some(found)
    }

    /// Language-specific researches registered on top of the neutral set.
    pub fn researches(&self) -> &'static [(&'static str, ResearchFn)] {
        self.researches
    }
}

static DEFAULT: LazyLock<LanguagePack> = LazyLock::new(|| {
    LanguagePack::build(PackSpec {
        code: "",
        name: "language-neutral",
        function_words: &[],
        first_word_exceptions: &[],
        transition_words: &[],
        stem: str::to_string,
        syllables: None,
        flesch: None,
        passive: None,
        researches: &[],
    })
});

/// The language-neutral pack.
pub fn default_pack() -> &'static LanguagePack {
    &DEFAULT
}

/// Every dedicated pack.
pub fn packs() -> [&'static LanguagePack; 2] {
    [english::pack(), german::pack()]
}

/// Split a locale such as `en_US`, `en-us` or `de` into its language code.
pub fn language_code(locale: &str) -> ConfigResult<String> {
    let mut parts = locale.trim().split(['_', '-']);
    let language = parts.next().unwrap_or_default();
    let region = parts.next();
    let well_formed = (2..=3).contains(&language.len())
        && language.chars().all(|c| c.is_ascii_alphabetic())
        && region.is_none_or(|r| {
            (2..=3).contains(&r.len()) && r.chars().all(|c| c.is_ascii_alphanumeric())
        })
        && parts.next().is_none();
    if !well_formed {
        return Err(ConfigError::InvalidLocale(locale.to_string()));
    }
    Ok(language.to_ascii_lowercase())
}

/// Find the pack for `locale`.
///
/// Unknown languages resolve to [`default_pack`] when `fallback` is set and
/// are a configuration error otherwise.
#[tracing::instrument]
pub fn resolve(locale: &str, fallback: bool) -> ConfigResult<&'static LanguagePack> {
    let code = language_code(locale)?;
    if let Some(pack) = packs().into_iter().find(|pack| pack.code == code) {
        return Ok(pack);
    }
    if fallback {
        tracing::info!(locale, "no language pack, using language-neutral researches");
        Ok(default_pack())
    } else {
        Err(ConfigError::UnsupportedLocale {
            locale: locale.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locale_forms() {
        assert_eq!(language_code("en_US").unwrap(), "en");
        assert_eq!(language_code("de-de").unwrap(), "de");
        assert_eq!(language_code("nl").unwrap(), "nl");
        for bad in ["", "english", "e", "en_US_x", "12_US", "en_"] {
            assert!(
                matches!(language_code(bad), Err(ConfigError::InvalidLocale(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn resolve_known_and_fallback() {
        assert_eq!(resolve("en_GB", false).unwrap().code, "en");
        assert_eq!(resolve("de_AT", false).unwrap().code, "de");
        assert!(resolve("fr_FR", true).unwrap().is_default());
        assert!(matches!(
            resolve("fr_FR", false),
            Err(ConfigError::UnsupportedLocale { .. })
        ));
        assert!(matches!(
            resolve("not a locale", true),
            Err(ConfigError::InvalidLocale(_))
        ));
    }

    #[test]
    fn transitions_respect_word_boundaries() {
        let english = resolve("en", false).unwrap();
        assert_eq!(english.has_transition("Therefore, we left."), Some(true));
        assert_eq!(english.has_transition("It rained. As a result we stayed."), Some(true));
        assert_eq!(english.has_transition("The firstborn left."), Some(false));
        assert_eq!(default_pack().has_transition("Therefore we left."), None);
    }

    #[test]
    fn flesch_is_clamped() {
        let formula = FleschFormula {
            base: 206.835,
            sentence_weight: 1.015,
            syllable_weight: 84.6,
        };
        assert_eq!(formula.score(1.0, 1.0), 100.0);
        assert_eq!(formula.score(80.0, 3.0), 0.0);
    }
}
