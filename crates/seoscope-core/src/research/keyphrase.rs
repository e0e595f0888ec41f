//! Keyphrase researches: where and how often the keyphrase shows up.
//!
//! Unquoted keyphrases match on the stems of their content words, in any
//! order. Quoted keyphrases match word for word, function words included.

use std::collections::HashSet;

use super::{
    Fact, IntroductionMatch, Occurrences, ResearchContext, SubheadingMatches, TitleMatch,
};
use crate::language::LanguagePack;
use crate::paper::Keyphrase;
use crate::text;

/// Matches one keyphrase form against word sequences.
#[derive(Debug, Clone)]
pub struct PhraseMatcher {
    language: &'static LanguagePack,
    exact: bool,
    words: Vec<String>,
    stems: Vec<String>,
}

impl PhraseMatcher {
    /// Prepare a matcher for `phrase` in `language`.
    pub fn new(phrase: &Keyphrase, language: &'static LanguagePack) -> Self {
        let mut stems: Vec<String> = Vec::new();
        for word in content_words(&phrase.words, language) {
            let stem = language.stem(word);
            if !stems.contains(&stem) {
                stems.push(stem);
            }
        }
        Self {
            language,
            exact: phrase.exact,
            words: phrase.words.clone(),
            stems,
        }
    }

    /// Number of distinct content stems.
    pub fn len(&self) -> usize {
        self.stems.len()
    }

    /// Whether the phrase has no content stems.
    pub fn is_empty(&self) -> bool {
        self.stems.is_empty()
    }

    /// Whether the phrase is present in `words`.
    pub fn all_in(&self, words: &[String]) -> bool {
        if self.exact {
            return sequence_count(words, &self.words) > 0;
        }
        let found = self.stem_set(words);
        self.stems.iter().all(|stem| found.contains(stem))
    }

    /// How many distinct content stems occur in `words`.
    pub fn matched_in(&self, words: &[String]) -> usize {
        let found = self.stem_set(words);
        self.stems.iter().filter(|stem| found.contains(*stem)).count()
    }

    /// Complete occurrences of the phrase in `words`.
    ///
    /// For unquoted phrases this is the count of the rarest content stem,
    /// since every occurrence needs one of each.
    pub fn occurrences(&self, words: &[String]) -> usize {
        if self.exact {
            return sequence_count(words, &self.words);
        }
        let stems: Vec<String> = words.iter().map(|w| self.language.stem(w)).collect();
        self.stems
            .iter()
            .map(|stem| stems.iter().filter(|s| *s == stem).count())
            .min()
            .unwrap_or(0)
    }

    fn stem_set(&self, words: &[String]) -> HashSet<String> {
        words.iter().map(|w| self.language.stem(w)).collect()
    }
}

/// Words that carry meaning; all words when every word is a function word.
fn content_words<'w>(words: &'w [String], language: &LanguagePack) -> Vec<&'w String> {
    let content: Vec<&String> = words
        .iter()
        .filter(|w| !language.is_function_word(w))
        .collect();
    if content.is_empty() {
        words.iter().collect()
    } else {
        content
    }
}

/// Non-overlapping occurrences of `needle` in `haystack`.
fn sequence_count(haystack: &[String], needle: &[String]) -> usize {
    if needle.is_empty() || needle.len() > haystack.len() {
        return 0;
    }
    let mut count = 0;
    let mut i = 0;
    while i + needle.len() <= haystack.len() {
        if haystack[i..i + needle.len()] == *needle {
            count += 1;
            i += needle.len();
        } else {
            i += 1;
        }
    }
    count
}

fn primary(ctx: &ResearchContext<'_>) -> Option<PhraseMatcher> {
    ctx.paper
        .keyphrase()
        .map(|phrase| PhraseMatcher::new(phrase, ctx.language))
}

fn all_forms(ctx: &ResearchContext<'_>) -> Vec<PhraseMatcher> {
    ctx.keyphrase_forms()
        .map(|phrase| PhraseMatcher::new(phrase, ctx.language))
        .collect()
}

/// Content words in the keyphrase.
pub fn keyphrase_length(ctx: &ResearchContext<'_>) -> Fact {
    let count = ctx
        .paper
        .keyphrase()
        .map_or(0, |phrase| content_words(&phrase.words, ctx.language).len());
    Fact::Count(count)
}

/// Keyphrase occurrences in the body, per sentence.
pub fn keyword_count(ctx: &ResearchContext<'_>) -> Fact {
    let Some(matcher) = primary(ctx) else {
        return Fact::Occurrences(Occurrences::default());
    };
    let mut found = Occurrences::default();
    for sentence in ctx.sentences() {
        let n = matcher.occurrences(&text::normalized_words(sentence));
        if n > 0 {
            found.count += n;
            found.sentences.push(sentence.clone());
        }
    }
    Fact::Occurrences(found)
}

/// Keyphrase occurrences per 100 words of body text.
pub fn keyword_density(ctx: &ResearchContext<'_>) -> Fact {
    let words: usize = ctx.sentences().iter().map(|s| text::word_count(s)).sum();
    let Some(matcher) = primary(ctx).filter(|_| words > 0) else {
        return Fact::Number(0.0);
    };
    let count: usize = ctx
        .sentences()
        .iter()
        .map(|s| matcher.occurrences(&text::normalized_words(s)))
        .sum();
    Fact::Number(count as f64 * 100.0 / words as f64)
}

/// Keyphrase or synonym placement in the first paragraph.
pub fn introduction_keyword(ctx: &ResearchContext<'_>) -> Fact {
    let matchers = all_forms(ctx);
    let Some(paragraph) = ctx.document.paragraphs().next() else {
        return Fact::Introduction(IntroductionMatch::default());
    };

    let mut found = IntroductionMatch::default();
    for sentence in text::split_sentences(paragraph) {
        let words = text::normalized_words(&sentence);
        if matchers.iter().any(|m| m.all_in(&words)) {
            found.in_one_sentence = true;
            found.in_paragraph = true;
            found.sentence = Some(sentence);
            return Fact::Introduction(found);
        }
    }
    let words = text::normalized_words(paragraph);
    found.in_paragraph = matchers.iter().any(|m| m.all_in(&words));
    Fact::Introduction(found)
}

/// Meta description sentences containing the keyphrase or a synonym.
pub fn meta_description_keyword(ctx: &ResearchContext<'_>) -> Fact {
    let matchers = all_forms(ctx);
    let count = text::split_sentences(ctx.description)
        .iter()
        .filter(|sentence| {
            let words = text::normalized_words(sentence);
            matchers.iter().any(|m| m.all_in(&words))
        })
        .count();
    Fact::Count(count)
}

/// Meta description length in characters.
pub fn meta_description_length(ctx: &ResearchContext<'_>) -> Fact {
    Fact::Count(text::char_count(ctx.description))
}

/// How the keyphrase appears in the SEO title.
pub fn title_keyword(ctx: &ResearchContext<'_>) -> Fact {
    let Some(phrase) = ctx.paper.keyphrase() else {
        return Fact::Title(TitleMatch::default());
    };
    let matcher = PhraseMatcher::new(phrase, ctx.language);
    let title = text::normalized_words(ctx.title);
    let exact = sequence_count(&title, &phrase.words) > 0;
    Fact::Title(TitleMatch {
        exact,
        at_start: exact && title.starts_with(&phrase.words),
        all_words: exact || (!phrase.exact && matcher.all_in(&title)),
    })
}

/// Approximate widths in pixels of the search result title font.
fn char_width(ch: char) -> f64 {
    match ch {
        'i' | 'j' | 'l' | '.' | ',' | ':' | ';' | '\'' | '|' | '!' | 'I' => 4.5,
        'f' | 't' | 'r' | ' ' | '-' | '(' | ')' => 6.0,
        'm' | 'w' => 14.0,
        'M' | 'W' => 16.0,
        c if c.is_uppercase() => 12.0,
        c if c.is_ascii_digit() => 10.0,
        _ => 9.5,
    }
}

/// Rendered title width in pixels: the caller's measurement when given,
/// otherwise an estimate from character widths.
pub fn title_width(ctx: &ResearchContext<'_>) -> Fact {
    if ctx.title.trim().is_empty() {
        return Fact::Number(0.0);
    }
    if let Some(width) = ctx.paper.title_width().filter(|w| w.is_finite() && *w > 0.0) {
        return Fact::Number(width);
    }
    Fact::Number(ctx.title.trim().chars().map(char_width).sum())
}

/// Keyphrase content words found in the slug, as `(matched, total)`.
pub fn slug_keyword(ctx: &ResearchContext<'_>) -> Fact {
    let Some(matcher) = primary(ctx) else {
        return Fact::Ratio(0, 0);
    };
    let slug: Vec<String> = ctx
        .paper
        .slug()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(text::normalize)
        .collect();
    Fact::Ratio(matcher.matched_in(&slug), matcher.len())
}

/// Level 2 and 3 subheadings reflecting the keyphrase or a synonym.
///
/// A subheading reflects a phrase when it contains at least half of the
/// phrase's content words.
pub fn subheadings_keyword(ctx: &ResearchContext<'_>) -> Fact {
    let matchers = all_forms(ctx);
    let mut found = SubheadingMatches::default();
    for heading in ctx.document.headings() {
        if !(2..=3).contains(&heading.level) {
            continue;
        }
        found.total += 1;
        let words = text::normalized_words(&heading.text);
        if matchers
            .iter()
            .any(|m| !m.is_empty() && m.matched_in(&words) * 2 >= m.len())
        {
            found.matching += 1;
        }
    }
    Fact::Subheadings(found)
}

/// Whether the keyphrase consists of function words only.
pub fn function_words_in_keyphrase(ctx: &ResearchContext<'_>) -> Fact {
    let only_function_words = ctx.language.has_function_words()
        && ctx.paper.keyphrase().is_some_and(|phrase| {
            phrase
                .words
                .iter()
                .all(|w| ctx.language.is_function_word(w))
        });
    Fact::Flag(only_function_words)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language;
    use crate::paper::{Paper, PaperInput};
    use crate::research::{ResearchRegistry, Researcher};

    fn run(input: PaperInput, research: &str) -> Fact {
        let registry = ResearchRegistry::for_language(language::resolve("en", false).unwrap());
        let paper = Paper::new(input);
        let researcher = Researcher::new(&paper, &registry);
        researcher.run(research).unwrap().as_ref().clone()
    }

    fn keyed(keyword: &str) -> PaperInput {
        PaperInput {
            keyword: keyword.into(),
            ..PaperInput::default()
        }
    }

    #[test]
    fn length_skips_function_words() {
        assert_eq!(run(keyed("the best garden tools"), "keyphraseLength"), Fact::Count(3));
        assert_eq!(run(keyed("the and"), "keyphraseLength"), Fact::Count(2));
        assert_eq!(run(keyed(""), "keyphraseLength"), Fact::Count(0));
    }

    #[test]
    fn counts_stemmed_occurrences() {
        let input = PaperInput {
            text: "Gardening tools help. A good tool lasts in the garden. Nothing else.".into(),
            ..keyed("garden tools")
        };
        let Fact::Occurrences(found) = run(input.clone(), "keywordCount") else {
            panic!("expected occurrences");
        };
        assert_eq!(found.count, 2);
        assert_eq!(found.sentences.len(), 2);

        let Fact::Number(density) = run(input, "keywordDensity") else {
            panic!("expected density");
        };
        assert!((density - 2.0 * 100.0 / 12.0).abs() < 1e-9);
    }

    #[test]
    fn exact_phrases_match_word_for_word() {
        let input = PaperInput {
            text: "Garden tools are great. Tools for the garden too.".into(),
            ..keyed("\"garden tools\"")
        };
        let Fact::Occurrences(found) = run(input, "keywordCount") else {
            panic!("expected occurrences");
        };
        assert_eq!(found.count, 1);
    }

    #[test]
    fn introduction_sentence_and_paragraph() {
        let one = PaperInput {
            text: "Our garden tools are old. We love them.\n\nLater text.".into(),
            ..keyed("garden tools")
        };
        let Fact::Introduction(found) = run(one, "introductionKeyword") else {
            panic!("expected introduction");
        };
        assert!(found.in_one_sentence);
        assert_eq!(found.sentence.as_deref(), Some("Our garden tools are old."));

        let spread = PaperInput {
            text: "Our garden is big. The tools are old.".into(),
            ..keyed("garden tools")
        };
        let Fact::Introduction(found) = run(spread, "introductionKeyword") else {
            panic!("expected introduction");
        };
        assert!(!found.in_one_sentence);
        assert!(found.in_paragraph);
    }

    #[test]
    fn synonyms_count_in_introduction() {
        let input = PaperInput {
            text: "Spades dig well.".into(),
            synonyms: "spade".into(),
            ..keyed("garden tools")
        };
        let Fact::Introduction(found) = run(input, "introductionKeyword") else {
            panic!("expected introduction");
        };
        assert!(found.in_one_sentence);
    }

    #[test]
    fn meta_description_sentences() {
        let input = PaperInput {
            description: "A garden tools guide. Buy garden tools now. Nothing here.".into(),
            ..keyed("garden tools")
        };
        assert_eq!(run(input.clone(), "metaDescriptionKeyword"), Fact::Count(2));
        assert_eq!(run(input, "metaDescriptionLength"), Fact::Count(57));
    }

    #[test]
    fn title_placement() {
        let start = PaperInput {
            title: "Garden tools for beginners".into(),
            ..keyed("garden tools")
        };
        assert_eq!(
            run(start, "titleKeyword"),
            Fact::Title(TitleMatch {
                exact: true,
                at_start: true,
                all_words: true
            })
        );

        let shuffled = PaperInput {
            title: "Tools for the garden".into(),
            ..keyed("garden tools")
        };
        assert_eq!(
            run(shuffled, "titleKeyword"),
            Fact::Title(TitleMatch {
                exact: false,
                at_start: false,
                all_words: true
            })
        );
    }

    #[test]
    fn title_width_prefers_measurement() {
        assert_eq!(run(PaperInput::default(), "titleWidth"), Fact::Number(0.0));
        let measured = PaperInput {
            title: "Anything".into(),
            title_width: Some(420.5),
            ..PaperInput::default()
        };
        assert_eq!(run(measured, "titleWidth"), Fact::Number(420.5));
        let estimated = PaperInput {
            title: "ab".into(),
            ..PaperInput::default()
        };
        assert_eq!(run(estimated, "titleWidth"), Fact::Number(19.0));
    }

    #[test]
    fn slug_ratio() {
        let full = PaperInput {
            url: "https://example.com/best-garden-tools/".into(),
            ..keyed("garden tools")
        };
        assert_eq!(run(full, "slugKeyword"), Fact::Ratio(2, 2));
        let half = PaperInput {
            url: "garden-guide".into(),
            ..keyed("garden tools")
        };
        assert_eq!(run(half, "slugKeyword"), Fact::Ratio(1, 2));
    }

    #[test]
    fn subheading_coverage() {
        let input = PaperInput {
            text: "# Title\n\n## Choosing garden tools\n\nText.\n\n## Other things\n\nText.\n\n#### Deep\n\nText."
                .into(),
            ..keyed("garden tools")
        };
        assert_eq!(
            run(input, "subheadingsKeyword"),
            Fact::Subheadings(SubheadingMatches {
                total: 2,
                matching: 1
            })
        );
    }

    #[test]
    fn function_word_keyphrase() {
        assert_eq!(run(keyed("the and"), "functionWordsInKeyphrase"), Fact::Flag(true));
        assert_eq!(run(keyed("the garden"), "functionWordsInKeyphrase"), Fact::Flag(false));
    }

    #[test]
    fn sequence_counting() {
        let words = |s: &str| text::normalized_words(s);
        assert_eq!(sequence_count(&words("a b a b a"), &words("a b")), 2);
        assert_eq!(sequence_count(&words("a"), &words("a b")), 0);
    }
}
