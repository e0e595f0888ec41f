//! Readability researches that depend on a language pack.

use super::{Fact, ResearchContext, SentenceShare};
use crate::text;

/// Sentences in the passive voice.
pub fn passive_voice(ctx: &ResearchContext<'_>) -> Fact {
    if !ctx.language.detects_passive() {
        return Fact::Empty;
    }
    let sentences = ctx.sentences();
    let matched = sentences
        .iter()
        .filter(|s| {
            ctx.language
                .is_passive(&text::normalized_words(s))
                .unwrap_or(false)
        })
        .cloned()
        .collect();
    Fact::Sentences(SentenceShare {
        total: sentences.len(),
        matched,
    })
}

/// Sentences containing a transition word or phrase.
pub fn transition_words(ctx: &ResearchContext<'_>) -> Fact {
    if !ctx.language.detects_transitions() {
        return Fact::Empty;
    }
    let sentences = ctx.sentences();
    let matched = sentences
        .iter()
        .filter(|s| ctx.language.has_transition(s).unwrap_or(false))
        .cloned()
        .collect();
    Fact::Sentences(SentenceShare {
        total: sentences.len(),
        matched,
    })
}

/// Reading ease of the body text on the pack's Flesch-style scale.
///
/// Zero for a text without words.
pub fn flesch_reading_ease(ctx: &ResearchContext<'_>) -> Fact {
    let Some(formula) = ctx.language.flesch() else {
        return Fact::Empty;
    };
    let sentences = ctx.sentences();
    let mut words = 0usize;
    let mut syllables = 0usize;
    for sentence in sentences {
        for word in text::words(sentence) {
            words += 1;
            syllables += ctx.language.syllables(word).unwrap_or(1).max(1);
        }
    }
    if words == 0 {
        return Fact::Number(0.0);
    }
    let words_per_sentence = words as f64 / sentences.len() as f64;
    let syllables_per_word = syllables as f64 / words as f64;
    let score = formula.score(words_per_sentence, syllables_per_word);
    Fact::Number((score * 10.0).round() / 10.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language;
    use crate::paper::{Paper, PaperInput};
    use crate::research::{ResearchRegistry, Researcher};

    fn run(locale: &str, body: &str, research: &str) -> Fact {
        let registry = ResearchRegistry::for_language(language::resolve(locale, false).unwrap());
        let paper = Paper::new(PaperInput {
            text: body.into(),
            ..PaperInput::default()
        });
        let researcher = Researcher::new(&paper, &registry);
        researcher.run(research).unwrap().as_ref().clone()
    }

    #[test]
    fn passive_share() {
        let Fact::Sentences(share) = run(
            "en",
            "The report was written by the team. The team wrote it.",
            "passiveVoice",
        ) else {
            panic!("expected sentences");
        };
        assert_eq!(share.total, 2);
        assert_eq!(share.matched, vec!["The report was written by the team.".to_string()]);
        assert!((share.percentage() - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn german_passive_share() {
        let text = "Das Haus wird gebaut. Wir wohnen hier.";
        let Fact::Sentences(share) = run("de", text, "passiveVoice") else {
            panic!("expected sentences");
        };
        assert_eq!(share.matched.len(), 1);
    }

    #[test]
    fn transition_share() {
        let Fact::Sentences(share) = run(
            "en",
            "It rained. Therefore, we stayed in. We read books.",
            "transitionWords",
        ) else {
            panic!("expected sentences");
        };
        assert_eq!(share.total, 3);
        assert_eq!(share.matched.len(), 1);
    }

    #[test]
    fn reading_ease_extremes() {
        assert_eq!(
            run("en", "The cat sat on the mat.", "fleschReadingEase"),
            Fact::Number(100.0)
        );
        let Fact::Number(hard) = run(
            "en",
            "Institutional accountability necessitates comprehensive organizational transformation.",
            "fleschReadingEase",
        ) else {
            panic!("expected a number");
        };
        assert!(hard < 50.0, "{hard}");
    }
}
