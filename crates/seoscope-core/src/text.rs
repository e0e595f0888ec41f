//! Sentence and word tokenization.
//!
//! Everything here works on plain text; markup is removed by
//! [`markdown`](crate::markdown) before these functions see it.

use std::sync::LazyLock;

use regex::Regex;

/// A word: letters or digits, optionally joined by apostrophes or hyphens.
static WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\p{L}\p{N}]+(?:['’\-][\p{L}\p{N}]+)*").expect("valid regex")
});

/// Lowercase abbreviations (without the trailing period) that do not end a sentence.
const ABBREVIATIONS: &[&str] = &[
    "approx", "bzw", "ca", "cf", "co", "corp", "dept", "dr", "e.g", "eg", "etc", "fig", "i.e",
    "ie", "inc", "jr", "ltd", "mr", "mrs", "ms", "no", "nr", "prof", "sr", "st", "usw", "vgl",
    "vs", "z.b",
];

/// Split plain text into sentences.
///
/// Paragraph breaks (blank lines) always end a sentence. Within a paragraph a
/// `.`, `!`, `?` or `…` ends a sentence when it is followed by whitespace and
/// then an uppercase letter, a digit, an opening quote or bracket, or the end
/// of the text. Periods after known abbreviations, single initials and
/// inside numbers are not boundaries.
#[tracing::instrument(skip_all, fields(text_len = text.len()))]
pub fn split_sentences(text: &str) -> Vec<String> {
    text.split("\n\n")
        .flat_map(split_block)
        .collect()
}

fn split_block(block: &str) -> Vec<String> {
    let chars: Vec<char> = block.chars().collect();
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < chars.len() {
        if is_terminator(chars[i]) {
            // Swallow runs like "?!" or "..." and closing quotes/brackets.
            let mut end = i + 1;
            while end < chars.len() && (is_terminator(chars[end]) || is_closer(chars[end])) {
                end += 1;
            }
            if ends_sentence(&chars, start, i, end) {
                push_sentence(&mut sentences, &chars[start..end]);
                start = end;
            }
            i = end;
        } else {
            i += 1;
        }
    }
    push_sentence(&mut sentences, &chars[start..]);
    sentences
}

fn push_sentence(out: &mut Vec<String>, chars: &[char]) {
    let sentence: String = chars.iter().collect();
    let sentence = sentence.split_whitespace().collect::<Vec<_>>().join(" ");
    if WORD.is_match(&sentence) {
        out.push(sentence);
    }
}

const fn is_terminator(ch: char) -> bool {
    matches!(ch, '.' | '!' | '?' | '…')
}

const fn is_closer(ch: char) -> bool {
    matches!(ch, '"' | '\'' | '”' | '’' | ')' | ']' | '»')
}

const fn is_opener(ch: char) -> bool {
    matches!(ch, '"' | '\'' | '“' | '‘' | '(' | '[' | '«' | '„' | '¿' | '¡')
}

/// Decide whether the terminator at `at` (run ending at `end`) closes a sentence.
fn ends_sentence(chars: &[char], start: usize, at: usize, end: usize) -> bool {
    let mut next = end;
    if next < chars.len() && !chars[next].is_whitespace() {
        return false;
    }
    while next < chars.len() && chars[next].is_whitespace() {
        next += 1;
    }
    let Some(&following) = chars.get(next) else {
        return true;
    };

    if chars[at] == '.' && end == at + 1 {
        let word = word_before(chars, start, at);
        if is_abbreviation(&word) || is_initial(&word) {
            return false;
        }
    }

    following.is_uppercase() || following.is_ascii_digit() || is_opener(following)
}

fn word_before(chars: &[char], start: usize, at: usize) -> String {
    let mut begin = at;
    while begin > start && (chars[begin - 1].is_alphanumeric() || chars[begin - 1] == '.') {
        begin -= 1;
    }
    chars[begin..at].iter().collect()
}

fn is_abbreviation(word: &str) -> bool {
    let lower = word.to_lowercase();
    ABBREVIATIONS.contains(&lower.as_str())
}

/// A single capital like the "J" in "J. Smith", or dotted initials like "U.S".
fn is_initial(word: &str) -> bool {
    word.split('.')
        .all(|part| part.chars().count() == 1 && part.chars().all(char::is_uppercase))
}

/// The words of `text`, in order, as borrowed slices.
pub fn words(text: &str) -> Vec<&str> {
    WORD.find_iter(text).map(|m| m.as_str()).collect()
}

/// Number of words in `text`.
pub fn word_count(text: &str) -> usize {
    WORD.find_iter(text).count()
}

/// Lowercase a word and unify apostrophe variants.
pub fn normalize(word: &str) -> String {
    word.to_lowercase().replace('’', "'")
}

/// The normalized words of `text`.
pub fn normalized_words(text: &str) -> Vec<String> {
    WORD.find_iter(text).map(|m| normalize(m.as_str())).collect()
}

/// Number of characters in `text`, ignoring leading and trailing whitespace.
pub fn char_count(text: &str) -> usize {
    text.trim().chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_terminal_punctuation() {
        let sentences = split_sentences("First one. Second one! Third one? Fourth");
        assert_eq!(
            sentences,
            vec!["First one.", "Second one!", "Third one?", "Fourth"]
        );
    }

    #[test]
    fn abbreviations_and_initials_do_not_split() {
        let sentences = split_sentences("Dr. Smith met J. K. Rowling, e.g. at lunch. Then left.");
        assert_eq!(sentences.len(), 2);
        assert!(sentences[0].starts_with("Dr. Smith"));
    }

    #[test]
    fn decimals_do_not_split() {
        let sentences = split_sentences("Pi is 3.14 roughly. Yes.");
        assert_eq!(sentences, vec!["Pi is 3.14 roughly.", "Yes."]);
    }

    #[test]
    fn lowercase_continuation_does_not_split() {
        assert_eq!(split_sentences("It costs 5 vs. the usual 7. ok then").len(), 1);
    }

    #[test]
    fn closing_quotes_stay_with_sentence() {
        let sentences = split_sentences("She said \"stop.\" Then he stopped.");
        assert_eq!(sentences, vec!["She said \"stop.\"", "Then he stopped."]);
    }

    #[test]
    fn paragraph_breaks_end_sentences() {
        let sentences = split_sentences("A heading without period\n\nBody text here.");
        assert_eq!(sentences, vec!["A heading without period", "Body text here."]);
    }

    #[test]
    fn punctuation_only_fragments_are_dropped() {
        assert!(split_sentences("... !!").is_empty());
        assert!(split_sentences("   ").is_empty());
    }

    #[test]
    fn words_keep_contractions_and_hyphens() {
        assert_eq!(
            words("Don't re-use well‐known state-of-the-art, ok?"),
            vec!["Don't", "re-use", "well", "known", "state-of-the-art", "ok"]
        );
    }

    #[test]
    fn normalize_unifies_apostrophes() {
        assert_eq!(normalize("Don’t"), "don't");
    }

    #[test]
    fn unicode_words_are_counted() {
        assert_eq!(word_count("Größere Häuser für alle"), 4);
        assert_eq!(char_count("  héllo "), 5);
    }
}
