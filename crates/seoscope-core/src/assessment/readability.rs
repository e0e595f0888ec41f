//! Readability assessments.

use super::bands::ScoreBands;
use super::{AssessmentResult, AssessmentRule, LinkFragments, Mark, count, fact, format_number};
use crate::error::AssessmentError;
use crate::paper::Paper;
use crate::research::{BeginningRun, Fact, Researcher, SectionLength, SentenceShare};
use crate::text;

fn sentence_share(
    researcher: &Researcher<'_>,
    assessment: &str,
    research: &'static str,
) -> Result<SentenceShare, AssessmentError> {
    fact(researcher, assessment, research, |f| match f {
        Fact::Sentences(share) => Some(share.clone()),
        _ => None,
    })
}

fn texts(
    researcher: &Researcher<'_>,
    assessment: &str,
    research: &'static str,
) -> Result<Vec<String>, AssessmentError> {
    fact(researcher, assessment, research, |f| match f {
        Fact::Texts(texts) => Some(texts.clone()),
        _ => None,
    })
}

/// Length of the text between subheadings.
#[derive(Debug, Clone)]
pub struct SubheadingsTooLong {
    bands: ScoreBands,
    links: LinkFragments,
}

impl SubheadingsTooLong {
    /// Identifier of this assessment.
    pub const ID: &'static str = "subheadingsTooLong";

    fn with_boundaries(links: LinkFragments, recommended: f64, maximum: f64) -> Self {
        Self {
            bands: ScoreBands::new(
                9,
                &[("recommendedMaximum", recommended, 6), ("maximum", maximum, 3)],
            ),
            links,
        }
    }

    /// Regular content: sections up to 300 words.
    pub fn new(links: LinkFragments) -> Self {
        Self::with_boundaries(links, 300.0, 350.0)
    }

    /// Cornerstone content: sections up to 250 words.
    pub fn cornerstone(links: LinkFragments) -> Self {
        Self::with_boundaries(links, 250.0, 300.0)
    }
}

impl AssessmentRule for SubheadingsTooLong {
    fn identifier(&self) -> &str {
        Self::ID
    }

    fn required_researches(&self) -> &[&'static str] {
        &["subheadingSections", "wordCount"]
    }

    fn is_applicable(&self, paper: &Paper, _: &Researcher<'_>) -> bool {
        paper.has_text()
    }

    fn get_result(
        &self,
        _: &Paper,
        researcher: &Researcher<'_>,
    ) -> Result<AssessmentResult, AssessmentError> {
        let sections: Vec<SectionLength> =
            fact(researcher, Self::ID, "subheadingSections", |f| match f {
                Fact::Sections(sections) => Some(sections.clone()),
                _ => None,
            })?;
        let title = self.links.title("Subheading distribution");
        let recommended = self.bands.get("recommendedMaximum").unwrap_or_default();

        if sections.iter().all(|s| s.heading.is_none()) {
            let words = count(researcher, Self::ID, "wordCount")?;
            return Ok(if words as f64 <= recommended {
                AssessmentResult::points(
                    Self::ID,
                    9,
                    format!(
                        "{title}: You are not using any subheadings, but your text is short \
                         enough and probably doesn't need them."
                    ),
                )
            } else {
                AssessmentResult::points(
                    Self::ID,
                    2,
                    format!(
                        "{title}: You are not using any subheadings, although your text is \
                         rather long. {}.",
                        self.links.cta("Try and add some subheadings")
                    ),
                )
            });
        }

        let longest = sections.iter().map(|s| s.words).max().unwrap_or(0);
        let points = self.bands.score(longest as f64);
        let too_long: Vec<&SectionLength> = sections
            .iter()
            .filter(|s| s.words as f64 > recommended)
            .collect();
        let text = if points == 9 {
            format!("{title}: Great job!")
        } else {
            format!(
                "{title}: {} section(s) of your text are longer than {} words and are not \
                 separated by any subheadings. {}.",
                too_long.len(),
                format_number(recommended),
                self.links.cta("Add subheadings to improve readability")
            )
        };
        let marks = too_long
            .iter()
            .filter_map(|s| s.heading.as_deref())
            .map(Mark::whole)
            .collect();
        Ok(AssessmentResult::points(Self::ID, points, text).with_marks(marks))
    }

    banded_rule!();
}

/// Paragraph length in words.
#[derive(Debug, Clone)]
pub struct ParagraphTooLong {
    bands: ScoreBands,
    links: LinkFragments,
}

impl ParagraphTooLong {
    /// Identifier of this assessment.
    pub const ID: &'static str = "textParagraphTooLong";

    /// Build with the given feedback links.
    pub fn new(links: LinkFragments) -> Self {
        Self {
            bands: ScoreBands::new(9, &[("recommendedMaximum", 150.0, 6), ("maximum", 200.0, 3)]),
            links,
        }
    }
}

impl AssessmentRule for ParagraphTooLong {
    fn identifier(&self) -> &str {
        Self::ID
    }

    fn required_researches(&self) -> &[&'static str] {
        &["paragraphs"]
    }

    fn is_applicable(&self, paper: &Paper, _: &Researcher<'_>) -> bool {
        paper.has_text()
    }

    fn get_result(
        &self,
        _: &Paper,
        researcher: &Researcher<'_>,
    ) -> Result<AssessmentResult, AssessmentError> {
        let paragraphs = texts(researcher, Self::ID, "paragraphs")?;
        let recommended = self.bands.get("recommendedMaximum").unwrap_or_default();
        let lengths: Vec<(usize, &String)> = paragraphs
            .iter()
            .map(|p| (text::word_count(p), p))
            .collect();
        let longest = lengths.iter().map(|(n, _)| *n).max().unwrap_or(0);
        let points = self.bands.score(longest as f64);
        let too_long: Vec<&String> = lengths
            .iter()
            .filter(|(n, _)| *n as f64 > recommended)
            .map(|(_, p)| *p)
            .collect();
        let title = self.links.title("Paragraph length");
        let text = if points == 9 {
            format!("{title}: None of the paragraphs are too long. Great job!")
        } else {
            format!(
                "{title}: {} of the paragraphs contains more than the recommended maximum of \
                 {} words. {}!",
                too_long.len(),
                format_number(recommended),
                self.links.cta("Shorten your paragraphs")
            )
        };
        let marks = too_long.iter().map(|p| Mark::whole(p)).collect();
        Ok(AssessmentResult::points(Self::ID, points, text).with_marks(marks))
    }

    banded_rule!();
}

/// Share of sentences longer than [`SentenceLength::MAX_WORDS`].
#[derive(Debug, Clone)]
pub struct SentenceLength {
    bands: ScoreBands,
    links: LinkFragments,
}

impl SentenceLength {
    /// Identifier of this assessment.
    pub const ID: &'static str = "textSentenceLength";

    /// Sentences with more words than this count as long.
    pub const MAX_WORDS: usize = 20;

    fn with_boundaries(links: LinkFragments, recommended: f64, maximum: f64) -> Self {
        Self {
            bands: ScoreBands::new(
                9,
                &[("recommendedMaximum", recommended, 6), ("maximum", maximum, 3)],
            ),
            links,
        }
    }

    /// Regular content: at most 25% long sentences.
    pub fn new(links: LinkFragments) -> Self {
        Self::with_boundaries(links, 25.0, 30.0)
    }

    /// Cornerstone content: at most 20% long sentences.
    pub fn cornerstone(links: LinkFragments) -> Self {
        Self::with_boundaries(links, 20.0, 25.0)
    }
}

impl AssessmentRule for SentenceLength {
    fn identifier(&self) -> &str {
        Self::ID
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
        let sentences = texts(researcher, Self::ID, "sentences")?;
        let long: Vec<&String> = sentences
            .iter()
            .filter(|s| text::word_count(s) > Self::MAX_WORDS)
            .collect();
        let percentage = if sentences.is_empty() {
            0.0
        } else {
            long.len() as f64 * 100.0 / sentences.len() as f64
        };
        let points = self.bands.score(percentage);
        let title = self.links.title("Sentence length");
        let text = if points == 9 {
            format!("{title}: Great!")
        } else {
            format!(
                "{title}: {}% of the sentences contain more than {} words, which is more than \
                 the recommended maximum of {}%. {}!",
                format_number((percentage * 10.0).round() / 10.0),
                Self::MAX_WORDS,
                format_number(self.bands.get("recommendedMaximum").unwrap_or_default()),
                self.links.cta("Try to shorten the sentences")
            )
        };
        let marks = long.iter().map(|s| Mark::whole(s)).collect();
        Ok(AssessmentResult::points(Self::ID, points, text).with_marks(marks))
    }

    banded_rule!();
}

/// Share of sentences with a transition word.
#[derive(Debug, Clone)]
pub struct TransitionWords {
    bands: ScoreBands,
    links: LinkFragments,
}

impl TransitionWords {
    /// Identifier of this assessment.
    pub const ID: &'static str = "textTransitionWords";

    /// Texts shorter than this are not assessed.
    pub const MIN_WORDS: usize = 200;

    /// Build with the given feedback links.
    pub fn new(links: LinkFragments) -> Self {
        Self {
            bands: ScoreBands::new(3, &[("minimum", 20.0, 6), ("recommendedMinimum", 30.0, 9)]),
            links,
        }
    }
}

impl AssessmentRule for TransitionWords {
    fn identifier(&self) -> &str {
        Self::ID
    }

    fn required_researches(&self) -> &[&'static str] {
        &["transitionWords", "wordCount"]
    }

    fn is_applicable(&self, paper: &Paper, researcher: &Researcher<'_>) -> bool {
        paper.has_text() && researcher.count("wordCount") >= Self::MIN_WORDS
    }

    fn get_result(
        &self,
        _: &Paper,
        researcher: &Researcher<'_>,
    ) -> Result<AssessmentResult, AssessmentError> {
        let share = sentence_share(researcher, Self::ID, "transitionWords")?;
        let percentage = share.percentage();
        let points = self.bands.score(percentage);
        let title = self.links.title("Transition words");
        let text = if points == 9 {
            format!("{title}: Well done!")
        } else if share.matched.is_empty() {
            format!(
                "{title}: None of the sentences contain transition words. {}.",
                self.links.cta("Use some")
            )
        } else {
            format!(
                "{title}: Only {}% of the sentences contain transition words, which is not \
                 enough. {}.",
                format_number((percentage * 10.0).round() / 10.0),
                self.links.cta("Use more of them")
            )
        };
        let marks = share.matched.iter().map(|s| Mark::whole(s)).collect();
        Ok(AssessmentResult::points(Self::ID, points, text).with_marks(marks))
    }

    banded_rule!();
}

/// Share of passive sentences.
#[derive(Debug, Clone)]
pub struct PassiveVoice {
    bands: ScoreBands,
    links: LinkFragments,
}

impl PassiveVoice {
    /// Identifier of this assessment.
    pub const ID: &'static str = "passiveVoice";

    /// Build with the given feedback links.
    pub fn new(links: LinkFragments) -> Self {
        Self {
            bands: ScoreBands::new(9, &[("recommendedMaximum", 10.0, 6), ("maximum", 15.0, 3)]),
            links,
        }
    }
}

impl AssessmentRule for PassiveVoice {
    fn identifier(&self) -> &str {
        Self::ID
    }

    fn required_researches(&self) -> &[&'static str] {
        &["passiveVoice"]
    }

    fn is_applicable(&self, paper: &Paper, _: &Researcher<'_>) -> bool {
        paper.has_text()
    }

    fn get_result(
        &self,
        _: &Paper,
        researcher: &Researcher<'_>,
    ) -> Result<AssessmentResult, AssessmentError> {
        let share = sentence_share(researcher, Self::ID, "passiveVoice")?;
        let percentage = share.percentage();
        let points = self.bands.score(percentage);
        let title = self.links.title("Passive voice");
        let text = if points == 9 {
            format!("{title}: You are not using too much passive voice. That's great!")
        } else {
            format!(
                "{title}: {}% of the sentences contain passive voice, which is more than the \
                 recommended maximum of {}%. {}!",
                format_number((percentage * 10.0).round() / 10.0),
                format_number(self.bands.get("recommendedMaximum").unwrap_or_default()),
                self.links.cta("Try to use their active counterparts")
            )
        };
        let marks = share.matched.iter().map(|s| Mark::whole(s)).collect();
        Ok(AssessmentResult::points(Self::ID, points, text).with_marks(marks))
    }

    banded_rule!();
}

/// Runs of sentences opening with the same word.
#[derive(Debug, Clone)]
pub struct SentenceBeginnings {
    bands: ScoreBands,
    links: LinkFragments,
}

impl SentenceBeginnings {
    /// Identifier of this assessment.
    pub const ID: &'static str = "sentenceBeginnings";

    /// Build with the given feedback links.
    pub fn new(links: LinkFragments) -> Self {
        Self {
            bands: ScoreBands::new(9, &[("maximum", 2.0, 3)]),
            links,
        }
    }
}

impl AssessmentRule for SentenceBeginnings {
    fn identifier(&self) -> &str {
        Self::ID
    }

    fn required_researches(&self) -> &[&'static str] {
        &["sentenceBeginnings"]
    }

    fn is_applicable(&self, paper: &Paper, _: &Researcher<'_>) -> bool {
        paper.has_text()
    }

    fn get_result(
        &self,
        _: &Paper,
        researcher: &Researcher<'_>,
    ) -> Result<AssessmentResult, AssessmentError> {
        let runs: Vec<BeginningRun> = fact(researcher, Self::ID, "sentenceBeginnings", |f| {
            match f {
                Fact::Beginnings(runs) => Some(runs.clone()),
                _ => None,
            }
        })?;
        let maximum = self.bands.get("maximum").unwrap_or_default();
        let longest = runs.iter().map(|r| r.sentences.len()).max().unwrap_or(0);
        let points = self.bands.score(longest as f64);
        let repeated: Vec<&BeginningRun> = runs
            .iter()
            .filter(|r| r.sentences.len() as f64 > maximum)
            .collect();
        let title = self.links.title("Consecutive sentences");
        let text = if points == 9 {
            format!("{title}: There is enough variety in your sentences. That's great!")
        } else {
            format!(
                "{title}: The text contains {longest} consecutive sentences starting with the \
                 same word. {}!",
                self.links.cta("Try to mix things up")
            )
        };
        let marks = repeated
            .iter()
            .flat_map(|r| r.sentences.iter())
            .map(|s| Mark::whole(s))
            .collect();
        Ok(AssessmentResult::points(Self::ID, points, text).with_marks(marks))
    }

    banded_rule!();
}

/// Flags texts too short to assess.
#[derive(Debug, Clone)]
pub struct TextPresence {
    links: LinkFragments,
}

impl TextPresence {
    /// Identifier of this assessment.
    pub const ID: &'static str = "textPresence";

    /// Texts with fewer characters than this are flagged.
    pub const MIN_CHARACTERS: usize = 50;

    /// Build with the given feedback links.
    pub const fn new(links: LinkFragments) -> Self {
        Self { links }
    }
}

impl AssessmentRule for TextPresence {
    fn identifier(&self) -> &str {
        Self::ID
    }

    fn required_researches(&self) -> &[&'static str] {
        &["textLength"]
    }

    fn is_applicable(&self, _: &Paper, researcher: &Researcher<'_>) -> bool {
        researcher.count("textLength") < Self::MIN_CHARACTERS
    }

    fn get_result(
        &self,
        _: &Paper,
        _: &Researcher<'_>,
    ) -> Result<AssessmentResult, AssessmentError> {
        let text = format!(
            "{}: You have far too little content. {}.",
            self.links.title("Not enough content"),
            self.links.cta("Please add some content to enable a good analysis")
        );
        Ok(AssessmentResult::points(Self::ID, 3, text))
    }

    linked_rule!();
}

/// Flesch-style reading ease.
#[derive(Debug, Clone)]
pub struct FleschReadingEase {
    bands: ScoreBands,
    links: LinkFragments,
}

impl FleschReadingEase {
    /// Identifier of this assessment.
    pub const ID: &'static str = "fleschReadingEase";

    /// Build with the given feedback links.
    pub fn new(links: LinkFragments) -> Self {
        Self {
            bands: ScoreBands::new(3, &[("fairlyDifficult", 50.0, 6), ("standard", 60.0, 9)]),
            links,
        }
    }
}

impl AssessmentRule for FleschReadingEase {
    fn identifier(&self) -> &str {
        Self::ID
    }

    fn required_researches(&self) -> &[&'static str] {
        &["fleschReadingEase", "wordCount"]
    }

    fn is_applicable(&self, paper: &Paper, researcher: &Researcher<'_>) -> bool {
        paper.has_text() && researcher.count("wordCount") > 0
    }

    fn get_result(
        &self,
        _: &Paper,
        researcher: &Researcher<'_>,
    ) -> Result<AssessmentResult, AssessmentError> {
        let ease = fact(researcher, Self::ID, "fleschReadingEase", |f| match f {
            Fact::Number(n) => Some(*n),
            _ => None,
        })?;
        let points = self.bands.score(ease);
        let title = self.links.title("Flesch Reading Ease");
        let score = format_number(ease);
        let text = match points {
            9 => format!(
                "{title}: The copy scores {score} in the test, which is considered easy to \
                 read. Good job!"
            ),
            6 => format!(
                "{title}: The copy scores {score} in the test, which is considered fairly \
                 difficult to read. {}.",
                self.links.cta("Try to make shorter sentences to improve readability")
            ),
            _ => format!(
                "{title}: The copy scores {score} in the test, which is considered difficult \
                 to read. {}.",
                self.links.cta(
                    "Try to make shorter sentences, using less difficult words to improve \
                     readability"
                )
            ),
        };
        Ok(AssessmentResult::points(Self::ID, points, text))
    }

    banded_rule!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assessment::DEFAULT_LINK_BASE;
    use crate::language;
    use crate::paper::PaperInput;
    use crate::research::ResearchRegistry;

    fn links(id: &str) -> LinkFragments {
        LinkFragments::for_identifier(DEFAULT_LINK_BASE, id)
    }

    fn assess(rule: &dyn AssessmentRule, text: &str) -> Option<AssessmentResult> {
        let registry = ResearchRegistry::for_language(language::resolve("en", false).unwrap());
        let paper = Paper::new(PaperInput {
            text: text.into(),
            ..PaperInput::default()
        });
        let researcher = Researcher::new(&paper, &registry);
        rule.is_applicable(&paper, &researcher)
            .then(|| rule.get_result(&paper, &researcher).unwrap())
    }

    fn points(rule: &dyn AssessmentRule, text: &str) -> Option<u8> {
        assess(rule, text).map(|r| r.score.points())
    }

    fn sentence(words: usize) -> String {
        format!("{}.", vec!["word"; words].join(" "))
    }

    #[test]
    fn subheading_sections() {
        let rule = SubheadingsTooLong::new(links(SubheadingsTooLong::ID));
        assert_eq!(points(&rule, &sentence(300)), Some(9));
        assert_eq!(points(&rule, &sentence(301)), Some(2));

        let sectioned = |words: usize| format!("## Part\n\n{}", sentence(words));
        assert_eq!(points(&rule, &sectioned(300)), Some(9));
        assert_eq!(points(&rule, &sectioned(350)), Some(6));
        let long = assess(&rule, &sectioned(351)).unwrap();
        assert_eq!(long.score.points(), 3);
        assert_eq!(long.marks[0].original, "Part");

        let cornerstone = SubheadingsTooLong::cornerstone(links(SubheadingsTooLong::ID));
        assert_eq!(points(&cornerstone, &sectioned(300)), Some(6));
    }

    #[test]
    fn paragraph_length_boundaries() {
        let rule = ParagraphTooLong::new(links(ParagraphTooLong::ID));
        assert_eq!(points(&rule, &sentence(150)), Some(9));
        assert_eq!(points(&rule, &sentence(151)), Some(6));
        assert_eq!(points(&rule, &sentence(200)), Some(6));
        let result = assess(&rule, &format!("Short.\n\n{}", sentence(201))).unwrap();
        assert_eq!(result.score.points(), 3);
        assert_eq!(result.marks.len(), 1);
    }

    #[test]
    fn sentence_length_shares() {
        let rule = SentenceLength::new(links(SentenceLength::ID));
        let mix = |long: usize, short: usize| {
            let mut parts = vec![sentence(25); long];
            parts.extend(vec!["Short one.".to_string(); short]);
            parts.join(" ")
        };
        assert_eq!(points(&rule, &mix(1, 3)), Some(9));
        assert_eq!(points(&rule, &mix(3, 7)), Some(6));
        assert_eq!(points(&rule, &mix(4, 6)), Some(3));
        assert_eq!(points(&rule, &mix(0, 5)), Some(9));

        let cornerstone = SentenceLength::cornerstone(links(SentenceLength::ID));
        assert_eq!(points(&cornerstone, &mix(1, 3)), Some(6));
    }

    #[test]
    fn transition_words_need_long_text() {
        let rule = TransitionWords::new(links(TransitionWords::ID));
        assert_eq!(points(&rule, "Therefore, it works."), None);

        let filler = sentence(10);
        let with_share = |transitions: usize| {
            let mut parts = vec![format!("Therefore, {}", sentence(9)); transitions];
            parts.extend(vec![filler.clone(); 20 - transitions]);
            parts.join(" ")
        };
        assert_eq!(points(&rule, &with_share(2)), Some(3));
        assert_eq!(points(&rule, &with_share(4)), Some(6));
        assert_eq!(points(&rule, &with_share(6)), Some(9));
    }

    #[test]
    fn passive_voice_share() {
        let rule = PassiveVoice::new(links(PassiveVoice::ID));
        let passive = "The report was written by the team.";
        let active = "The team wrote the report.";
        let text = |p: usize, a: usize| {
            let mut parts = vec![passive; p];
            parts.extend(vec![active; a]);
            parts.join(" ")
        };
        assert_eq!(points(&rule, &text(1, 9)), Some(9));
        assert_eq!(points(&rule, &text(1, 7)), Some(6));
        let result = assess(&rule, &text(1, 1)).unwrap();
        assert_eq!(result.score.points(), 3);
        assert!(result.has_marks);
    }

    #[test]
    fn repeated_beginnings() {
        let rule = SentenceBeginnings::new(links(SentenceBeginnings::ID));
        assert_eq!(points(&rule, "Cats nap. Cats eat. Dogs bark."), Some(9));
        let result = assess(&rule, "Cats nap. Cats eat. Cats play. Dogs bark.").unwrap();
        assert_eq!(result.score.points(), 3);
        assert_eq!(result.marks.len(), 3);
    }

    #[test]
    fn text_presence_applies_to_short_texts() {
        let rule = TextPresence::new(links(TextPresence::ID));
        assert_eq!(points(&rule, ""), Some(3));
        assert_eq!(points(&rule, "Too short."), Some(3));
        assert_eq!(points(&rule, &sentence(20)), None);
    }

    #[test]
    fn reading_ease_bands() {
        let rule = FleschReadingEase::new(links(FleschReadingEase::ID));
        assert_eq!(points(&rule, ""), None);
        assert_eq!(points(&rule, "The cat sat on the mat."), Some(9));
        assert_eq!(
            points(
                &rule,
                "Institutional accountability necessitates comprehensive organizational transformation."
            ),
            Some(3)
        );
    }
}
