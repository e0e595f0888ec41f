//! English language pack.

use std::sync::LazyLock;

use super::{FleschFormula, LanguagePack, PackSpec, syllables};
use crate::research::{ResearchFn, keyphrase, readability};

static PACK: LazyLock<LanguagePack> = LazyLock::new(|| {
    LanguagePack::build(PackSpec {
        code: "en",
        name: "English",
        function_words: FUNCTION_WORDS,
        first_word_exceptions: FIRST_WORD_EXCEPTIONS,
        transition_words: TRANSITION_WORDS,
        stem,
        syllables: Some(syllables::english),
        flesch: Some(FleschFormula {
            base: 206.835,
            sentence_weight: 1.015,
            syllable_weight: 84.6,
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
    // articles and determiners
    "a", "an", "the", "this", "that", "these", "those", "some", "any", "each", "every", "no",
    "all", "both", "either", "neither", "another", "other", "such", "what", "which", "whose",
    // pronouns
    "i", "me", "my", "mine", "you", "your", "yours", "he", "him", "his", "she", "her", "hers",
    "it", "its", "we", "us", "our", "ours", "they", "them", "their", "theirs", "who", "whom",
    "myself", "yourself", "himself", "herself", "itself", "ourselves", "themselves",
    // prepositions
    "about", "above", "across", "after", "against", "along", "among", "around", "at", "before",
    "behind", "below", "beneath", "beside", "between", "beyond", "by", "down", "during",
    "except", "for", "from", "in", "inside", "into", "like", "near", "of", "off", "on", "onto",
    "out", "outside", "over", "past", "since", "through", "throughout", "to", "toward",
    "towards", "under", "until", "up", "upon", "with", "within", "without",
    // conjunctions
    "and", "but", "or", "nor", "so", "yet", "if", "because", "although", "though", "while",
    "whereas", "unless", "than", "whether", "when", "where", "how", "why",
    // auxiliaries and modals
    "am", "is", "are", "was", "were", "be", "been", "being", "have", "has", "had", "having",
    "do", "does", "did", "doing", "can", "could", "may", "might", "must", "shall", "should",
    "will", "would", "can't", "don't", "doesn't", "isn't", "aren't", "wasn't", "won't",
    // quantifiers and frequent adverbs
    "very", "too", "also", "just", "only", "not", "more", "most", "much", "many", "few",
    "less", "least", "own", "same", "then", "there", "here", "now", "again", "ever", "never",
    "one", "two", "three", "four", "five", "first", "second", "third",
];

const FIRST_WORD_EXCEPTIONS: &[&str] = &[
    "a", "an", "the", "this", "that", "these", "those", "one", "two", "three", "four", "five",
    "six", "seven", "eight", "nine", "ten",
];

const TRANSITION_WORDS: &[&str] = &[
    "accordingly", "additionally", "afterward", "afterwards", "also", "although",
    "altogether", "besides", "consequently", "conversely", "finally", "first", "firstly",
    "further", "furthermore", "hence", "however", "indeed", "instead", "lastly", "likewise",
    "meanwhile", "moreover", "namely", "nevertheless", "next", "nonetheless", "notably",
    "otherwise", "overall", "particularly", "rather", "second", "secondly", "similarly",
    "subsequently", "then", "therefore", "third", "thirdly", "thus", "ultimately", "whereas",
    "above all", "after all", "all in all", "as a result", "as well as", "at first",
    "at last", "at the same time", "because of", "by contrast", "due to", "even though",
    "for example", "for instance", "for this reason", "in addition", "in conclusion",
    "in contrast", "in fact", "in other words", "in short", "in summary", "in the end",
    "most importantly", "on the other hand", "on the contrary", "so that", "such as",
    "to begin with", "to conclude", "to summarize", "to sum up",
];

/// Auxiliaries that can introduce a passive construction.
const PASSIVE_AUXILIARIES: &[&str] = &[
    "am", "is", "are", "was", "were", "be", "been", "being", "get", "gets", "got", "gotten",
    "getting", "isn't", "aren't", "wasn't", "weren't",
];

/// Words that may sit between the auxiliary and the participle.
const PASSIVE_INTERRUPTERS: &[&str] = &[
    "not", "never", "always", "often", "also", "being", "been", "just",
];

/// Participles that do not end in -ed.
const IRREGULAR_PARTICIPLES: &[&str] = &[
    "awoken", "been", "beaten", "become", "begun", "bent", "bitten", "blown", "broken",
    "brought", "built", "bought", "caught", "chosen", "dealt", "done", "drawn", "driven",
    "eaten", "fallen", "fed", "felt", "fought", "found", "forbidden", "forgiven", "forgotten",
    "frozen", "given", "gone", "grown", "held", "hidden", "hit", "hung", "hurt", "kept",
    "known", "laid", "led", "left", "lent", "lost", "made", "meant", "met", "paid", "put",
    "read", "ridden", "rung", "risen", "run", "said", "seen", "sent", "set", "shaken", "shot",
    "shown", "shut", "sold", "sought", "spent", "spoken", "spun", "stolen", "struck", "sung",
    "sunk", "swept", "sworn", "taken", "taught", "thought", "thrown", "told", "torn", "understood",
    "woken", "won", "worn", "written", "wound",
];

/// -ed words that usually act as adjectives after a form of "be".
const ADJECTIVE_EXCEPTIONS: &[&str] = &[
    "advanced", "aged", "annoyed", "ashamed", "bored", "concerned", "confused", "crowded",
    "depressed", "detailed", "disappointed", "embarrassed", "excited", "exhausted", "frightened",
    "interested", "involved", "naked", "pleased", "prepared", "relaxed", "satisfied", "scared",
    "shocked", "sophisticated", "surprised", "tired", "used", "wicked", "worried",
];

/// Whether a sentence contains an auxiliary followed by a past participle.
///
/// Up to one adverb or negation may separate the two ("was not seen",
/// "is often used"). Common -ed adjectives ("was tired") do not count.
fn is_passive(words: &[String]) -> bool {
    words.iter().enumerate().any(|(i, word)| {
        if !PASSIVE_AUXILIARIES.contains(&word.as_str()) {
            return false;
        }
        let mut next = i + 1;
        if words
            .get(next)
            .is_some_and(|w| PASSIVE_INTERRUPTERS.contains(&w.as_str()) || w.ends_with("ly"))
        {
            next += 1;
        }
        words.get(next).is_some_and(|w| is_participle(w))
    })
}

fn is_participle(word: &str) -> bool {
    if ADJECTIVE_EXCEPTIONS.contains(&word) {
        return false;
    }
    IRREGULAR_PARTICIPLES.contains(&word) || (word.len() > 4 && word.ends_with("ed"))
}

/// Light suffix stripping so "running", "runs" and "run" compare equal.
fn stem(word: &str) -> String {
    let word = word.trim_end_matches("'s");
    let strip = |suffix: &str, min_left: usize| {
        word.strip_suffix(suffix)
            .filter(|rest| rest.chars().count() >= min_left)
    };

    if let Some(rest) = strip("ies", 2) {
        return format!("{rest}y");
    }
    for suffix in ["ing", "ed"] {
        if let Some(rest) = strip(suffix, 3) {
            return undouble(rest);
        }
    }
    if let Some(rest) = strip("es", 3)
        .filter(|r| r.ends_with(['s', 'x', 'z']) || r.ends_with("ch") || r.ends_with("sh"))
    {
        return rest.to_string();
    }
    if let Some(rest) = strip("s", 3).filter(|r| !r.ends_with('s') && !r.ends_with('u')) {
        return rest.to_string();
    }
    word.to_string()
}

/// "runn" -> "run", "stopp" -> "stop".
fn undouble(stem: &str) -> String {
    let mut chars: Vec<char> = stem.chars().collect();
    let n = chars.len();
    if n >= 2
        && chars[n - 1] == chars[n - 2]
        && !matches!(chars[n - 1], 'l' | 's' | 'z' | 'e' | 'o')
    {
        chars.pop();
    }
    chars.into_iter().collect()
}
