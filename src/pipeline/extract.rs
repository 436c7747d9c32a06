//! Question extraction: ordered paragraph blocks → [`QuestionDraft`]s.
//!
//! Every block is classified by the first matching entry of [`RULES`]. The
//! scan is a fold over an `Option<QuestionDraft>` (the open question): a
//! question-start line closes the open draft and opens a new one, other
//! lines fill fields of the open draft, and [`Scan::finish`] flushes the
//! last draft when the stream ends. Blocks seen while no question is open
//! are dropped.

use crate::output::QuestionDraft;
use crate::pipeline::segment::ParagraphBlock;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

static RE_QUESTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"^Q?\d+\.").unwrap());
static RE_OPTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([A-D])[).]").unwrap());
static RE_ANSWER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^answer:").unwrap());
static RE_EXPLANATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^explanation:").unwrap());

/// Option slot named by a line prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionSlot {
    A,
    B,
    C,
    D,
}

impl OptionSlot {
    fn from_letter(letter: &str) -> Option<Self> {
        match letter {
            "A" => Some(Self::A),
            "B" => Some(Self::B),
            "C" => Some(Self::C),
            "D" => Some(Self::D),
            _ => None,
        }
    }

    fn field<'a>(self, draft: &'a mut QuestionDraft) -> &'a mut String {
        match self {
            Self::A => &mut draft.option_a,
            Self::B => &mut draft.option_b,
            Self::C => &mut draft.option_c,
            Self::D => &mut draft.option_d,
        }
    }
}

/// What a paragraph's text means to the scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    /// Numbered marker; carries the stem text after the marker.
    QuestionStart(String),
    Option(OptionSlot, String),
    /// Empty, or one uppercase letter.
    Answer(String),
    Explanation(String),
    /// Anything else: possibly more stem text.
    Continuation,
}

/// A named classifier; `None` means "not mine".
pub struct Rule {
    pub name: &'static str,
    pub classify: fn(&str) -> Option<Line>,
}

/// Classification rules in priority order.
pub static RULES: &[Rule] = &[
    Rule {
        name: "question",
        classify: question_start,
    },
    Rule {
        name: "option",
        classify: option_line,
    },
    Rule {
        name: "answer",
        classify: answer_line,
    },
    Rule {
        name: "explanation",
        classify: explanation_line,
    },
];

/// Classify stripped paragraph text with [`RULES`].
pub fn classify(text: &str) -> Line {
    RULES
        .iter()
        .find_map(|rule| (rule.classify)(text))
        .unwrap_or(Line::Continuation)
}

fn question_start(text: &str) -> Option<Line> {
    let m = RE_QUESTION.find(text)?;
    Some(Line::QuestionStart(text[m.end()..].trim().to_string()))
}

fn option_line(text: &str) -> Option<Line> {
    let caps = RE_OPTION.captures(text)?;
    let slot = OptionSlot::from_letter(caps.get(1)?.as_str())?;
    let prefix_len = caps.get(0)?.end();
    Some(Line::Option(slot, text[prefix_len..].trim().to_string()))
}

fn answer_line(text: &str) -> Option<Line> {
    if !RE_ANSWER.is_match(text) {
        return None;
    }
    Some(Line::Answer(answer_letter(after_colon(text))))
}

fn explanation_line(text: &str) -> Option<Line> {
    if !RE_EXPLANATION.is_match(text) {
        return None;
    }
    Some(Line::Explanation(after_colon(text).to_string()))
}

fn after_colon(text: &str) -> &str {
    text.split_once(':').map(|(_, rest)| rest.trim()).unwrap_or("")
}

/// First character of the remainder, uppercased. Empty unless that yields
/// exactly one uppercase letter (`ß` and CJK characters do not).
fn answer_letter(rest: &str) -> String {
    let Some(c) = rest.chars().next().filter(|c| c.is_alphabetic()) else {
        return String::new();
    };
    let mut upper = c.to_uppercase();
    match (upper.next(), upper.next()) {
        (Some(u), None) if u.is_uppercase() => u.to_string(),
        _ => String::new(),
    }
}

/// Questions found in a document.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub questions: Vec<QuestionDraft>,
    /// Blocks seen before the first question marker.
    pub dropped_paragraphs: usize,
}

/// Fold state.
#[derive(Debug, Default)]
struct Scan {
    open: Option<QuestionDraft>,
    done: Vec<QuestionDraft>,
    dropped: usize,
}

impl Scan {
    fn step(mut self, block: &ParagraphBlock, difficulty: &str) -> Self {
        let line = classify(&block.text);

        if let Line::QuestionStart(stem) = line {
            self.close();
            let mut draft = QuestionDraft::new(stem, difficulty);
            attach_image(&mut draft, block);
            self.open = Some(draft);
            return self;
        }

        let Some(draft) = self.open.as_mut() else {
            debug!("Dropping paragraph outside any question: {:?}", block.text);
            self.dropped += 1;
            return self;
        };

        match line {
            Line::Option(slot, text) => *slot.field(draft) = text,
            Line::Answer(letter) => draft.correct_answer = letter,
            Line::Explanation(text) => draft.explanation = text,
            Line::Continuation => {
                if !block.has_image() && draft.accepts_stem_text() && !block.text.is_empty() {
                    draft.question_text.push(' ');
                    draft.question_text.push_str(&block.text);
                }
            }
            Line::QuestionStart(_) => {}
        }
        attach_image(draft, block);
        self
    }

    fn close(&mut self) {
        if let Some(mut draft) = self.open.take() {
            draft.question_text = draft.question_text.trim().to_string();
            self.done.push(draft);
        }
    }

    fn finish(mut self) -> Extraction {
        self.close();
        Extraction {
            questions: self.done,
            dropped_paragraphs: self.dropped,
        }
    }
}

fn attach_image(draft: &mut QuestionDraft, block: &ParagraphBlock) {
    if let Some(ref url) = block.image {
        if draft.accepts_image() {
            draft.image_url = Some(url.clone());
        }
    }
}

/// Run the scan over every block and flush the last open question.
pub fn extract_questions(blocks: &[ParagraphBlock], difficulty: &str) -> Extraction {
    blocks
        .iter()
        .fold(Scan::default(), |scan, block| scan.step(block, difficulty))
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::segment::segment;

    fn run(paragraphs: &[&str]) -> Extraction {
        let html: String = paragraphs.iter().map(|p| format!("<p>{p}</p>")).collect();
        extract_questions(&segment(&html), "medium")
    }

    #[test]
    fn classifies_in_rule_order() {
        assert_eq!(classify("1. Hi"), Line::QuestionStart("Hi".into()));
        assert_eq!(classify("Q12. Hi"), Line::QuestionStart("Hi".into()));
        assert_eq!(classify("C) Paris"), Line::Option(OptionSlot::C, "Paris".into()));
        assert_eq!(classify("D. Rome"), Line::Option(OptionSlot::D, "Rome".into()));
        assert_eq!(classify("ANSWER: b"), Line::Answer("B".into()));
        assert_eq!(classify("Explanation: because"), Line::Explanation("because".into()));
        assert_eq!(classify("E) not an option"), Line::Continuation);
        assert_eq!(classify("Q. no number"), Line::Continuation);
    }

    #[test]
    fn answer_must_start_with_a_letter() {
        assert_eq!(classify("Answer: 4"), Line::Answer(String::new()));
        assert_eq!(classify("Answer:"), Line::Answer(String::new()));
        assert_eq!(classify("answer:   c) Paris"), Line::Answer("C".into()));
    }

    #[test]
    fn two_question_scenario() {
        let out = run(&[
            "1. What is 2+2?",
            "A) 3",
            "B) 4",
            "C) 5",
            "D) 6",
            "Answer: B",
            "Explanation: basic arithmetic",
            "2. Capital of France?",
            "A) Berlin",
            "B) Madrid",
            "C) Paris",
            "D) Rome",
            "Answer: c",
        ]);
        assert_eq!(out.questions.len(), 2);

        let q1 = &out.questions[0];
        assert_eq!(q1.question_text, "What is 2+2?");
        assert_eq!(q1.option_b, "4");
        assert_eq!(q1.correct_answer, "B");
        assert_eq!(q1.explanation, "basic arithmetic");
        assert_eq!(q1.difficulty, "medium");
        assert!(q1.image_url.is_none());

        let q2 = &out.questions[1];
        assert_eq!(q2.question_text, "Capital of France?");
        assert_eq!(q2.option_c, "Paris");
        assert_eq!(q2.correct_answer, "C");
        assert_eq!(q2.explanation, "");
    }

    #[test]
    fn short_second_question_leaves_later_options_empty() {
        let out = run(&[
            "1. What is 2+2?",
            "A) 3",
            "B) 4",
            "C) 5",
            "D) 6",
            "Answer: B",
            "Explanation: 2+2=4",
            "2. Capital of France?",
            "A) Paris",
            "B) Rome",
            "Answer: A",
        ]);
        assert_eq!(out.questions.len(), 2);
        assert_eq!(out.questions[0].explanation, "2+2=4");
        let q2 = &out.questions[1];
        assert_eq!(q2.question_text, "Capital of France?");
        assert_eq!(q2.option_a, "Paris");
        assert_eq!(q2.correct_answer, "A");
        assert_eq!((q2.option_c.as_str(), q2.option_d.as_str()), ("", ""));
        assert_eq!(q2.explanation, "");
    }

    #[test]
    fn leading_prose_is_dropped() {
        let out = run(&["Chapter 3 quiz", "Answer: A", "1. Real question", "A) yes"]);
        assert_eq!(out.questions.len(), 1);
        assert_eq!(out.dropped_paragraphs, 2);
        assert_eq!(out.questions[0].correct_answer, "");
        assert_eq!(out.questions[0].option_a, "yes");
    }

    #[test]
    fn multi_paragraph_stem_stops_at_first_option() {
        let out = run(&[
            "1. Read the passage.",
            "The quick brown fox",
            "jumps over the dog.",
            "A) fox",
            "this line is ignored",
            "B) dog",
        ]);
        let q = &out.questions[0];
        assert_eq!(
            q.question_text,
            "Read the passage. The quick brown fox jumps over the dog."
        );
        assert_eq!(q.option_a, "fox");
        assert_eq!(q.option_b, "dog");
    }

    #[test]
    fn repeated_option_letter_overwrites() {
        let out = run(&["1. Q", "A) first", "A) second"]);
        assert_eq!(out.questions[0].option_a, "second");
    }

    #[test]
    fn first_image_wins() {
        let out = run(&[
            "1. Which shape?",
            r#"<img src="https://cdn/one.png" />"#,
            r#"<img src="https://cdn/two.png" />"#,
            "A) circle",
        ]);
        let q = &out.questions[0];
        assert_eq!(q.image_url.as_deref(), Some("https://cdn/one.png"));
        assert_eq!(q.question_text, "Which shape?");
    }

    #[test]
    fn failed_upload_leaves_slot_open() {
        let out = run(&[
            "1. Which shape?",
            r#"<img src="" />"#,
            r#"<img src="https://cdn/two.png" />"#,
        ]);
        assert_eq!(out.questions[0].image_url.as_deref(), Some("https://cdn/two.png"));

        let out = run(&["1. Which shape?", r#"<img src="" />"#]);
        assert_eq!(out.questions[0].image_url.as_deref(), Some(""));
    }

    #[test]
    fn image_on_marker_paragraph_belongs_to_new_question() {
        let out = run(&[
            "1. First",
            r#"2. Second <img src="https://cdn/s.png" />"#,
        ]);
        assert!(out.questions[0].image_url.is_none());
        assert_eq!(out.questions[1].image_url.as_deref(), Some("https://cdn/s.png"));
        assert_eq!(out.questions[1].question_text, "Second");
    }

    #[test]
    fn image_paragraph_text_is_not_stem_text() {
        let out = run(&["1. Look", r#"caption <img src="u" />"#]);
        assert_eq!(out.questions[0].question_text, "Look");
        assert_eq!(out.questions[0].image_url.as_deref(), Some("u"));
    }

    #[test]
    fn image_before_any_question_is_dropped() {
        let out = run(&[r#"<img src="u" />"#, "1. Q"]);
        assert_eq!(out.dropped_paragraphs, 1);
        assert!(out.questions[0].image_url.is_none());
    }

    #[test]
    fn draft_count_equals_marker_count() {
        let out = run(&["1. a", "2. b", "noise", "3. c"]);
        assert_eq!(out.questions.len(), 3);
        assert_eq!(out.questions[1].question_text, "b noise");
    }

    #[test]
    fn empty_stream_yields_nothing() {
        let out = extract_questions(&[], "medium");
        assert!(out.questions.is_empty());
        assert_eq!(out.dropped_paragraphs, 0);
    }

    #[test]
    fn answers_are_single_uppercase_letters() {
        let out = run(&[
            "1. q",
            "Answer: dog",
            "2. q",
            "Answer: ?",
            "3. q",
            "Answer: ß",
            "4. q",
            "Answer: 答",
            "5. q",
            "Answer: é",
        ]);
        for q in &out.questions {
            assert!(q.correct_answer.is_empty()
                || (q.correct_answer.chars().count() == 1
                    && q.correct_answer.chars().all(|c| c.is_uppercase())));
        }
        assert_eq!(out.questions[0].correct_answer, "D");
        assert_eq!(out.questions[2].correct_answer, "");
        assert_eq!(out.questions[3].correct_answer, "");
        assert_eq!(out.questions[4].correct_answer, "É");
    }

    #[test]
    fn label_colon_must_follow_immediately() {
        assert_eq!(classify("Answer : B"), Line::Continuation);
        assert_eq!(classify("Explanation : why"), Line::Continuation);
        assert_eq!(classify("answer:b"), Line::Answer("B".into()));
    }

    #[test]
    fn rule_names_are_unique() {
        let mut names: Vec<&str> = RULES.iter().map(|r| r.name).collect();
        names.dedup();
        assert_eq!(names.len(), RULES.len());
    }
}
