//! German language pack.

use std::sync::LazyLock;

use super::{FleschFormula, LanguagePack, PackSpec, syllables};
use crate::research::{ResearchFn, keyphrase, readability};

static PACK: LazyLock<LanguagePack> = LazyLock::new(|| {
    LanguagePack::build(PackSpec {
        code: "de",
        name: "German",
        function_words: FUNCTION_WORDS,
        first_word_exceptions: FIRST_WORD_EXCEPTIONS,
        transition_words: TRANSITION_WORDS,
        stem,
        syllables: Some(syllables::german),
        // Amstad's adaptation of the Flesch formula.
        flesch: Some(FleschFormula {
            base: 180.0,
            sentence_weight: 1.0,
            syllable_weight: 58.5,
        }),
        passive: Some(is_passive),
        researches: RESEARCHES,
    })
});

const RESEARCHES: &[(&str, ResearchFn)] = &[
    ("functionWordsInKeyphrase", keyphrase::function_words_in_keyphrase),
    ("passiveVoice", readability::passive_voice),
    ("transitionWords", readability::transition_words),
    ("fleschReadingEase", readability::flesch_reading_ease),
];

pub(super) fn pack() -> &'static LanguagePack {
    &PACK
}

const FUNCTION_WORDS: &[&str] = &[
    "der", "die", "das", "den", "dem", "des", "ein", "eine", "einen", "einem", "einer", "eines",
    "ich", "du", "er", "sie", "es", "wir", "ihr", "mich", "dich", "sich", "uns", "euch", "ihn",
    "ihm", "ihnen", "mein", "dein", "sein", "unser", "euer", "dieser", "diese", "dieses",
    "jener", "jede", "jeder", "jedes", "kein", "keine", "alle", "an", "auf", "aus", "bei",
    "bis", "durch", "für", "gegen", "hinter", "in", "im", "ins", "mit", "nach", "neben", "ohne",
    "über", "um", "unter", "von", "vom", "vor", "zu", "zum", "zur", "zwischen", "und", "oder",
    "aber", "denn", "sondern", "dass", "ob", "weil", "wenn", "als", "wie", "auch", "nicht",
    "nur", "noch", "schon", "sehr", "so", "ist", "sind", "war", "waren", "bin", "bist", "hat",
    "haben", "hatte", "wird", "werden", "wurde", "kann", "können", "muss", "soll", "will",
];

const FIRST_WORD_EXCEPTIONS: &[&str] = &[
    "der", "die", "das", "den", "dem", "des", "ein", "eine", "einen", "einem", "einer", "eines",
    "dieser", "diese", "dieses", "zwei", "drei", "vier", "fünf",
];

const TRANSITION_WORDS: &[&str] = &[
    "allerdings", "also", "anschließend", "außerdem", "dadurch", "daher", "danach",
    "dagegen", "darum", "dennoch", "deshalb", "deswegen", "ebenfalls", "ebenso", "endlich",
    "erstens", "folglich", "hingegen", "jedoch", "nämlich", "schließlich", "somit",
    "trotzdem", "zudem", "zunächst", "zuletzt", "zweitens", "abgesehen davon",
    "auf der anderen seite", "aus diesem grund", "im gegensatz dazu", "im grunde",
    "infolgedessen", "mit anderen worten", "zum beispiel", "zum schluss", "vor allem",
];

/// Finite and non-finite forms of "werden".
const WERDEN: &[&str] = &[
    "werde", "wirst", "wird", "werden", "werdet", "wurde", "wurdest", "wurden", "wurdet",
    "worden", "würde", "würden",
];

/// A passive sentence pairs a form of "werden" with a participle
/// ("wird gebaut", "wurde repariert", "ist verkauft worden").
fn is_passive(words: &[String]) -> bool {
    words.iter().any(|w| WERDEN.contains(&w.as_str())) && words.iter().any(|w| is_participle(w))
}

fn is_participle(word: &str) -> bool {
    let len = word.chars().count();
    (len >= 5 && word.starts_with("ge") && (word.ends_with('t') || word.ends_with("en")))
        || (len >= 6 && word.ends_with("iert"))
}

/// Strip common inflectional endings.
fn stem(word: &str) -> String {
    for suffix in ["ern", "em", "en", "er", "es", "e", "n", "s"] {
        if let Some(rest) = word.strip_suffix(suffix)
            && rest.chars().count() >= 3
        {
            return rest.to_string();
        }
    }
    word.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(sentence: &str) -> Vec<String> {
        crate::text::normalized_words(sentence)
    }

    #[test]
    fn detects_werden_passive() {
        assert!(is_passive(&words("Das Haus wird gebaut.")));
        assert!(is_passive(&words("Der Motor wurde gestern repariert.")));
        assert!(!is_passive(&words("Wir bauen ein Haus.")));
        assert!(!is_passive(&words("Er wird morgen kommen.")));
    }

    #[test]
    fn stems_inflections() {
        assert_eq!(stem("häusern"), "häus");
        assert_eq!(stem("gartens"), "garten");
        assert_eq!(stem("hund"), "hund");
        assert_eq!(stem("kinder"), "kind");
    }
}
