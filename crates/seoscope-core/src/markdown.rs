//! Markup parsing.
//!
//! Paper text is CommonMark that may embed HTML, which is what editors
//! usually produce. [`Document::parse`] walks the pulldown-cmark event stream
//! and also reads the HTML it meets (blocks and inline tags) so headings,
//! paragraphs, links and images are found whichever syntax was used.

use std::sync::LazyLock;

use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};
use regex::Regex;

use crate::text;

/// `<h1>`..`<h6>` elements inside an HTML block.
static HTML_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<h([1-6])\b[^>]*>(.*?)</h[1-6]\s*>").expect("valid regex")
});

/// Tags that separate paragraphs inside an HTML block.
static HTML_BLOCK_BREAK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)</?(?:p|div|li|ul|ol|blockquote|section|article|table|tr|td|th)\b[^>]*>|\n\s*\n")
        .expect("valid regex")
});

/// Anchor elements with their attributes and inner markup.
static HTML_ANCHOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<a\b([^>]*)>(.*?)</a\s*>").expect("valid regex"));

/// Image elements.
static HTML_IMAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<img\b([^>]*)/?>").expect("valid regex"));

/// Any tag.
static HTML_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid regex"));

/// `name="value"` or `name='value'` attribute pairs.
static HTML_ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)([a-z][a-z0-9-]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>]+))"#)
        .expect("valid regex")
});

/// A heading in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    /// Heading level, 1 through 6.
    pub level: u8,
    /// Plain heading text.
    pub text: String,
}

/// Body text following a subheading (or the start of the document).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// The subheading that opens the section, `None` for leading text.
    pub heading: Option<String>,
    /// Plain text of the section's paragraphs.
    pub text: String,
}

/// A hyperlink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    /// Link target as written.
    pub href: String,
    /// Visible link text.
    pub text: String,
    /// Whether `rel` contains `nofollow`.
    pub nofollow: bool,
}

/// An image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    /// Image source as written.
    pub src: String,
    /// Alternative text, empty when absent.
    pub alt: String,
}

/// A block of text in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// A heading of the given level.
    Heading(u8, String),
    /// A paragraph, list item or similar run of prose.
    Paragraph(String),
}

/// Structure extracted from a paper's markup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    blocks: Vec<Block>,
    links: Vec<Link>,
    images: Vec<Image>,
}

impl Document {
    /// Parse markdown/HTML text.
    #[tracing::instrument(skip_all, fields(input_len = text.len()))]
    pub fn parse(text: &str) -> Self {
        let mut builder = Builder::default();
        let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH;

        for event in Parser::new_ext(text, options) {
            builder.event(event);
        }
        builder.finish()
    }

    /// All blocks in document order.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Plain text of every block, blocks separated by blank lines.
    pub fn text(&self) -> String {
        self.blocks
            .iter()
            .map(|block| match block {
                Block::Heading(_, text) | Block::Paragraph(text) => text.as_str(),
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Plain text of the body paragraphs only.
    pub fn body_text(&self) -> String {
        self.paragraphs().collect::<Vec<_>>().join("\n\n")
    }

    /// Body paragraphs, headings excluded.
    pub fn paragraphs(&self) -> impl Iterator<Item = &str> {
        self.blocks.iter().filter_map(|block| match block {
            Block::Paragraph(text) => Some(text.as_str()),
            Block::Heading(..) => None,
        })
    }

    /// Headings with their levels.
    pub fn headings(&self) -> Vec<Heading> {
        self.blocks
            .iter()
            .filter_map(|block| match block {
                Block::Heading(level, text) => Some(Heading {
                    level: *level,
                    text: text.clone(),
                }),
                Block::Paragraph(_) => None,
            })
            .collect()
    }

    /// Body text split at every subheading (levels 2 through 6).
    ///
    /// Text before the first subheading forms a leading section without a
    /// heading; it is omitted when empty.
    pub fn sections(&self) -> Vec<Section> {
        let mut sections = vec![Section {
            heading: None,
            text: String::new(),
        }];
        for block in &self.blocks {
            match block {
                Block::Heading(level, text) if *level >= 2 => sections.push(Section {
                    heading: Some(text.clone()),
                    text: String::new(),
                }),
                Block::Heading(..) => {}
                Block::Paragraph(text) => {
                    if let Some(current) = sections.last_mut() {
                        if !current.text.is_empty() {
                            current.text.push_str("\n\n");
                        }
                        current.text.push_str(text);
                    }
                }
            }
        }
        if sections[0].text.is_empty() {
            sections.remove(0);
        }
        sections
    }

    /// Links in document order.
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Images in document order.
    pub fn images(&self) -> &[Image] {
        &self.images
    }
}

#[derive(Default)]
struct OpenLink {
    href: String,
    text: String,
    nofollow: bool,
}

#[derive(Default)]
struct Builder {
    doc: Document,
    current: String,
    heading: Option<u8>,
    link: Option<OpenLink>,
    image: Option<Image>,
    html_block: Option<String>,
    skip_depth: usize,
}

impl Builder {
    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(Tag::CodeBlock(_)) => self.skip_depth += 1,
            Event::End(TagEnd::CodeBlock) => self.skip_depth = self.skip_depth.saturating_sub(1),
            _ if self.skip_depth > 0 => {}

            Event::Start(Tag::HtmlBlock) => {
                self.flush();
                self.html_block = Some(String::new());
            }
            Event::End(TagEnd::HtmlBlock) => {
                if let Some(raw) = self.html_block.take() {
                    self.absorb_html_block(&raw);
                }
            }
            Event::Html(raw) => match self.html_block.as_mut() {
                Some(buffer) => buffer.push_str(&raw),
                None => self.absorb_html_block(&raw),
            },
            Event::InlineHtml(raw) => self.inline_html(&raw),

            Event::Start(Tag::Heading { level, .. }) => {
                self.flush();
                self.heading = Some(level as u8);
            }
            Event::End(TagEnd::Heading(_)) => self.flush(),
            Event::Start(Tag::Paragraph | Tag::Item) => self.flush(),
            Event::End(TagEnd::Paragraph | TagEnd::Item | TagEnd::TableCell) => self.flush(),

            Event::Start(Tag::Link { dest_url, .. }) => {
                self.link = Some(OpenLink {
                    href: dest_url.to_string(),
                    ..OpenLink::default()
                });
            }
            Event::End(TagEnd::Link) => self.close_link(),
            Event::Start(Tag::Image { dest_url, .. }) => {
                self.image = Some(Image {
                    src: dest_url.to_string(),
                    alt: String::new(),
                });
            }
            Event::End(TagEnd::Image) => {
                if let Some(image) = self.image.take() {
                    self.doc.images.push(image);
                }
            }

            Event::Text(t) | Event::Code(t) => self.push_text(&t),
            Event::SoftBreak | Event::HardBreak => self.push_text(" "),
            _ => {}
        }
    }

    fn push_text(&mut self, text: &str) {
        if let Some(image) = self.image.as_mut() {
            image.alt.push_str(text);
            return;
        }
        if let Some(link) = self.link.as_mut() {
            link.text.push_str(text);
        }
        self.current.push_str(text);
    }

    fn close_link(&mut self) {
        if let Some(link) = self.link.take() {
            self.doc.links.push(Link {
                href: link.href,
                text: collapse(&link.text),
                nofollow: link.nofollow,
            });
        }
    }

    /// Close the current block, if it has any text.
    fn flush(&mut self) {
        let text = collapse(&self.current);
        self.current.clear();
        let heading = self.heading.take();
        if text.is_empty() {
            return;
        }
        self.doc.blocks.push(match heading {
            Some(level) => Block::Heading(level, text),
            None => Block::Paragraph(text),
        });
    }

    fn inline_html(&mut self, raw: &str) {
        let tag = raw.trim().to_ascii_lowercase();
        if tag.starts_with("</a") {
            self.close_link();
        } else if tag.starts_with("<a ") || tag.starts_with("<a>") {
            let attributes = attributes(raw);
            self.link = Some(OpenLink {
                href: attribute(&attributes, "href"),
                text: String::new(),
                nofollow: is_nofollow(&attributes),
            });
        } else if tag.starts_with("<img") {
            let attributes = attributes(raw);
            self.doc.images.push(Image {
                src: attribute(&attributes, "src"),
                alt: attribute(&attributes, "alt"),
            });
        } else if tag.starts_with("<br") {
            self.push_text(" ");
        }
    }

    /// Read a raw HTML block: headings, paragraphs, links and images.
    fn absorb_html_block(&mut self, raw: &str) {
        for image in HTML_IMAGE.captures_iter(raw) {
            let attributes = attributes(&image[1]);
            self.doc.images.push(Image {
                src: attribute(&attributes, "src"),
                alt: attribute(&attributes, "alt"),
            });
        }
        for anchor in HTML_ANCHOR.captures_iter(raw) {
            let attributes = attributes(&anchor[1]);
            self.doc.links.push(Link {
                href: attribute(&attributes, "href"),
                text: plain(&anchor[2]),
                nofollow: is_nofollow(&attributes),
            });
        }

        let mut rest = 0;
        for heading in HTML_HEADING.captures_iter(raw) {
            let (Some(whole), Some(level)) = (heading.get(0), heading[1].parse::<u8>().ok())
            else {
                continue;
            };
            self.absorb_html_paragraphs(&raw[rest..whole.start()]);
            let text = plain(&heading[2]);
            if !text.is_empty() {
                self.doc.blocks.push(Block::Heading(level, text));
            }
            rest = whole.end();
        }
        self.absorb_html_paragraphs(&raw[rest..]);
    }

    fn absorb_html_paragraphs(&mut self, raw: &str) {
        for chunk in HTML_BLOCK_BREAK.split(raw) {
            let text = plain(chunk);
            if !text.is_empty() {
                self.doc.blocks.push(Block::Paragraph(text));
            }
        }
    }

    fn finish(mut self) -> Document {
        self.close_link();
        self.flush();
        self.doc
    }
}

fn attributes(tag: &str) -> Vec<(String, String)> {
    HTML_ATTRIBUTE
        .captures_iter(tag)
        .map(|c| {
            let value = c
                .get(2)
                .or_else(|| c.get(3))
                .or_else(|| c.get(4))
                .map_or("", |m| m.as_str());
            (c[1].to_ascii_lowercase(), decode_entities(value))
        })
        .collect()
}

fn attribute(attributes: &[(String, String)], name: &str) -> String {
    attributes
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.clone())
        .unwrap_or_default()
}

fn is_nofollow(attributes: &[(String, String)]) -> bool {
    attributes.iter().any(|(key, value)| {
        key == "rel"
            && value
                .split_whitespace()
                .any(|token| token.eq_ignore_ascii_case("nofollow"))
    })
}

/// Strip tags from an HTML fragment and collapse whitespace.
fn plain(html: &str) -> String {
    collapse(&decode_entities(&HTML_TAG.replace_all(html, " ")))
}

fn collapse(text: &str) -> String {
    let joined = text.split_whitespace().collect::<Vec<_>>().join(" ");
    // Tag removal leaves "word ." when markup ends right before punctuation.
    joined
        .replace(" .", ".")
        .replace(" ,", ",")
        .replace(" !", "!")
        .replace(" ?", "?")
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Word count of a document's full text.
pub fn word_count(doc: &Document) -> usize {
    doc.blocks
        .iter()
        .map(|block| match block {
            Block::Heading(_, text) | Block::Paragraph(text) => text::word_count(text),
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markdown_blocks_in_order() {
        let doc = Document::parse(
            "# Title\n\nIntro text.\n\n## Part one\n\nBody *here*.\n\n- item a\n- item b\n",
        );
        assert_eq!(
            doc.blocks(),
            &[
                Block::Heading(1, "Title".into()),
                Block::Paragraph("Intro text.".into()),
                Block::Heading(2, "Part one".into()),
                Block::Paragraph("Body here.".into()),
                Block::Paragraph("item a".into()),
                Block::Paragraph("item b".into()),
            ]
        );
    }

    #[test]
    fn code_blocks_are_ignored() {
        let doc = Document::parse("Text.\n\n```\nlet x = 1;\n```\n");
        assert_eq!(doc.body_text(), "Text.");
    }

    #[test]
    fn markdown_links_and_images() {
        let doc =
            Document::parse("See [the docs](https://example.com/docs) and ![a cat](cat.png).");
        assert_eq!(doc.links().len(), 1);
        assert_eq!(doc.links()[0].href, "https://example.com/docs");
        assert_eq!(doc.links()[0].text, "the docs");
        assert!(!doc.links()[0].nofollow);
        assert_eq!(
            doc.images(),
            &[Image {
                src: "cat.png".into(),
                alt: "a cat".into()
            }]
        );
        assert_eq!(doc.body_text(), "See the docs and.");
    }

    #[test]
    fn html_block_headings_and_paragraphs() {
        let doc = Document::parse(
            "<h2 class=\"x\">Why &amp; how</h2>\n<p>First <b>bold</b> paragraph.</p>\n<p>Second one.</p>\n",
        );
        assert_eq!(
            doc.headings(),
            vec![Heading {
                level: 2,
                text: "Why & how".into()
            }]
        );
        assert_eq!(
            doc.paragraphs().collect::<Vec<_>>(),
            vec!["First bold paragraph.", "Second one."]
        );
    }

    #[test]
    fn html_links_detect_nofollow() {
        let doc = Document::parse(
            "<p><a href='https://a.example' rel=\"nofollow noopener\">A</a> and <a href=\"/b\">B</a></p>",
        );
        let links = doc.links();
        assert_eq!(links.len(), 2);
        assert!(links[0].nofollow);
        assert_eq!(links[1].href, "/b");
        assert!(!links[1].nofollow);
    }

    #[test]
    fn inline_html_inside_markdown_paragraph() {
        let doc = Document::parse(
            "Read <a href=\"https://x.example\" rel=\"nofollow\">this</a> now <img src=\"i.png\" alt=\"pic\">.",
        );
        assert_eq!(doc.links()[0].text, "this");
        assert!(doc.links()[0].nofollow);
        assert_eq!(doc.images()[0].alt, "pic");
        assert_eq!(doc.body_text(), "Read this now.");
    }

    #[test]
    fn sections_split_at_subheadings() {
        let doc = Document::parse("Lead.\n\n## A\n\nOne.\n\nTwo.\n\n### B\n\nThree.");
        let sections = doc.sections();
        assert_eq!(sections.len(), 3);
        assert_eq!(sections[0].heading, None);
        assert_eq!(sections[1].heading.as_deref(), Some("A"));
        assert_eq!(sections[1].text, "One.\n\nTwo.");
        assert_eq!(sections[2].text, "Three.");
    }

    #[test]
    fn sections_without_lead_text() {
        let doc = Document::parse("## Only\n\nBody.");
        assert_eq!(doc.sections().len(), 1);
    }

    #[test]
    fn word_count_includes_headings() {
        let doc = Document::parse("## Two words\n\nThree more words.");
        assert_eq!(word_count(&doc), 5);
    }
}
