//! Structural researches: lengths, blocks, links and images.

use super::{
    BeginningRun, Fact, ImageStatistics, LinkStatistics, ResearchContext, SectionLength,
};
use crate::markdown;
use crate::research::keyphrase::PhraseMatcher;
use crate::text;

/// Words in the whole text, headings included.
pub fn word_count(ctx: &ResearchContext<'_>) -> Fact {
    Fact::Count(markdown::word_count(ctx.document))
}

/// Characters in the whole text.
pub fn text_length(ctx: &ResearchContext<'_>) -> Fact {
    Fact::Count(text::char_count(&ctx.document.text()))
}

/// Body sentences.
pub fn sentences(ctx: &ResearchContext<'_>) -> Fact {
    Fact::Texts(ctx.sentences().to_vec())
}

/// Body paragraphs.
pub fn paragraphs(ctx: &ResearchContext<'_>) -> Fact {
    Fact::Texts(ctx.document.paragraphs().map(str::to_string).collect())
}

/// Every heading, H1 included.
pub fn headings(ctx: &ResearchContext<'_>) -> Fact {
    Fact::Headings(ctx.document.headings())
}

/// Word counts of the text between subheadings.
pub fn subheading_sections(ctx: &ResearchContext<'_>) -> Fact {
    Fact::Sections(
        ctx.document
            .sections()
            .into_iter()
            .map(|section| SectionLength {
                words: text::word_count(&section.text),
                heading: section.heading,
            })
            .collect(),
    )
}

/// Links classified as internal or external, followed or `nofollow`.
///
/// Relative links are internal. Absolute links are internal when their host
/// matches the permalink's host (ignoring a leading `www.`). Fragment,
/// `mailto:`, `tel:` and `javascript:` links are not counted.
pub fn link_statistics(ctx: &ResearchContext<'_>) -> Fact {
    let site = host(ctx.paper.permalink());
    let mut stats = LinkStatistics::default();

    for link in ctx.document.links() {
        let href = link.href.trim();
        let lower = href.to_ascii_lowercase();
        if href.is_empty()
            || href.starts_with('#')
            || ["mailto:", "tel:", "javascript:"]
                .iter()
                .any(|scheme| lower.starts_with(scheme))
        {
            continue;
        }
        stats.total += 1;
        let internal = match host(href) {
            Some(target) => site.as_deref() == Some(target.as_str()),
            None => true,
        };
        match (internal, link.nofollow) {
            (true, false) => stats.internal_followed += 1,
            (true, true) => stats.internal_nofollow += 1,
            (false, false) => stats.external_followed += 1,
            (false, true) => stats.external_nofollow += 1,
        }
    }
    Fact::Links(stats)
}

/// Host of an absolute or protocol-relative URL, lowercased, without `www.`.
fn host(url: &str) -> Option<String> {
    let rest = url
        .split_once("://")
        .map(|(_, rest)| rest)
        .or_else(|| url.strip_prefix("//"))?;
    let host = rest
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default()
        .rsplit('@')
        .next()
        .unwrap_or_default()
        .split(':')
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    let host = host.strip_prefix("www.").map_or(host.clone(), str::to_string);
    (!host.is_empty()).then_some(host)
}

/// Image counts, including images whose alt text names the keyphrase.
pub fn images(ctx: &ResearchContext<'_>) -> Fact {
    let matchers: Vec<PhraseMatcher> = ctx
        .keyphrase_forms()
        .map(|phrase| PhraseMatcher::new(phrase, ctx.language))
        .collect();
    let mut stats = ImageStatistics::default();

    for image in ctx.document.images() {
        stats.total += 1;
        if image.alt.trim().is_empty() {
            continue;
        }
        stats.with_alt += 1;
        let alt = text::normalized_words(&image.alt);
        if matchers.iter().any(|m| m.all_in(&alt)) {
            stats.keyphrase_in_alt += 1;
        }
    }
    Fact::Images(stats)
}

/// Runs of consecutive sentences that open with the same word.
///
/// When the first word is one of the language's first-word exceptions
/// (articles, numerals, demonstratives) the opening is the first two words,
/// so "The cat" and "The dog" do not form a run.
pub fn sentence_beginnings(ctx: &ResearchContext<'_>) -> Fact {
    let mut runs: Vec<BeginningRun> = Vec::new();
    for sentence in ctx.sentences() {
        let words = text::normalized_words(sentence);
        let Some(first) = words.first() else {
            continue;
        };
        let opening = match words.get(1) {
            Some(second) if ctx.language.is_first_word_exception(first) => {
                format!("{first} {second}")
            }
            _ => first.clone(),
        };
        match runs.last_mut() {
            Some(run) if run.opening == opening => run.sentences.push(sentence.clone()),
            _ => runs.push(BeginningRun {
                opening,
                sentences: vec![sentence.clone()],
            }),
        }
    }
    Fact::Beginnings(runs)
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

    fn text(text: &str) -> PaperInput {
        PaperInput {
            text: text.into(),
            ..PaperInput::default()
        }
    }

    #[test]
    fn counts_words_and_characters() {
        assert_eq!(run(text("## Hi there\n\nOne two."), "wordCount"), Fact::Count(4));
        assert_eq!(run(text("abc"), "textLength"), Fact::Count(3));
    }

    #[test]
    fn classifies_links() {
        let input = PaperInput {
            text: "[a](/about) [b](https://www.example.com/x) [c](https://other.org) \
                   <a href=\"https://other.org/y\" rel=\"nofollow\">d</a> [e](#top) [f](mailto:x@y.z)"
                .into(),
            permalink: "https://example.com/post".into(),
            ..PaperInput::default()
        };
        assert_eq!(
            run(input, "linkStatistics"),
            Fact::Links(LinkStatistics {
                total: 4,
                external_followed: 1,
                external_nofollow: 1,
                internal_followed: 2,
                internal_nofollow: 0,
            })
        );
    }

    #[test]
    fn hosts_are_normalized() {
        assert_eq!(host("https://WWW.Example.com:8080/x"), Some("example.com".into()));
        assert_eq!(host("//cdn.example.com/a.js"), Some("cdn.example.com".into()));
        assert_eq!(host("/relative/path"), None);
    }

    #[test]
    fn images_with_keyphrase_alt() {
        let input = PaperInput {
            text: "![garden shears](a.png) ![](b.png) <img src=\"c.png\" alt=\"Pruning a garden\">"
                .into(),
            keyword: "garden".into(),
            ..PaperInput::default()
        };
        assert_eq!(
            run(input, "images"),
            Fact::Images(ImageStatistics {
                total: 3,
                with_alt: 2,
                keyphrase_in_alt: 2,
            })
        );
    }

    #[test]
    fn section_lengths() {
        let input = text("Lead in.\n\n## One\n\nA b c.\n\n## Two\n\nD.");
        let Fact::Sections(sections) = run(input, "subheadingSections") else {
            panic!("expected sections");
        };
        let words: Vec<usize> = sections.iter().map(|s| s.words).collect();
        assert_eq!(words, vec![2, 3, 1]);
        assert_eq!(sections[1].heading.as_deref(), Some("One"));
    }

    #[test]
    fn repeated_beginnings_form_runs() {
        let Fact::Beginnings(runs) = run(
            text("Cats sleep. Cats eat. Cats play. The cat naps. The dog barks."),
            "sentenceBeginnings",
        ) else {
            panic!("expected beginnings");
        };
        let lengths: Vec<(String, usize)> = runs
            .iter()
            .map(|r| (r.opening.clone(), r.sentences.len()))
            .collect();
        assert_eq!(
            lengths,
            vec![
                ("cats".to_string(), 3),
                ("the cat".to_string(), 1),
                ("the dog".to_string(), 1)
            ]
        );
    }
}
