//! Quiz draft construction and validation.
//!
//! Owners build a quiz one question at a time. A question is complete when
//! it has text and a correct option with text; options are keyed `A`, `B`,
//! ... in insertion order and exactly one is marked correct at a time.

use quizcast_proto::{QuizDraft, QuizOption, QuizQuestion};
use thiserror::Error;

/// Upper bound on questions per quiz.
pub const MAX_QUESTIONS: usize = 100;
/// Upper bound on options per question (`A` through `Z`).
pub const MAX_OPTIONS: usize = 26;
/// Time limit given to new questions.
pub const DEFAULT_TIME_LIMIT_SECONDS: u32 = 60;
/// Marks given to new questions.
pub const DEFAULT_MAX_MARKS: u32 = 10;
/// Title used when the owner leaves it blank.
pub const UNTITLED: &str = "Untitled Quiz";

/// Draft validation failure. Indices are 0-based; messages are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DraftError {
    /// Question text is blank.
    #[error("question {}: Please add a question title", index + 1)]
    EmptyText {
        /// Question index.
        index: usize,
    },

    /// No option with text is marked correct.
    #[error("question {}: Please add at least one correct answer option", index + 1)]
    NoCorrectOption {
        /// Question index.
        index: usize,
    },

    /// Draft has no questions.
    #[error("a quiz needs at least one question")]
    NoQuestions,

    /// Question cap reached.
    #[error("a quiz holds at most {MAX_QUESTIONS} questions")]
    TooManyQuestions,

    /// Option cap reached.
    #[error("a question holds at most {MAX_OPTIONS} options")]
    TooManyOptions,
}

/// Key of the option at `position`.
fn option_key(position: usize) -> String {
    let offset = u8::try_from(position).unwrap_or(u8::MAX).min(25);
    char::from(b'A' + offset).to_string()
}

/// One question under construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionBuilder {
    text: String,
    options: Vec<QuizOption>,
    time_limit_seconds: u32,
    max_marks: u32,
}

impl Default for QuestionBuilder {
    fn default() -> Self {
        Self {
            text: String::new(),
            options: vec![QuizOption::new("A", ""), QuizOption::new("B", "")],
            time_limit_seconds: DEFAULT_TIME_LIMIT_SECONDS,
            max_marks: DEFAULT_MAX_MARKS,
        }
    }
}

impl QuestionBuilder {
    /// Blank question with two empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the question text.
    pub fn text(&mut self, text: impl Into<String>) -> &mut Self {
        self.text = text.into();
        self
    }

    /// Set the countdown length.
    pub fn time_limit(&mut self, seconds: u32) -> &mut Self {
        self.time_limit_seconds = seconds;
        self
    }

    /// Set the marks for a correct answer.
    pub fn max_marks(&mut self, marks: u32) -> &mut Self {
        self.max_marks = marks;
        self
    }

    /// Set the text of the option at `position`, appending blank options up
    /// to it if needed. Returns the option's key.
    ///
    /// # Errors
    ///
    /// `TooManyOptions` if `position` is past `Z`.
    pub fn option(&mut self, position: usize, text: impl Into<String>) -> Result<String, DraftError> {
        if position >= MAX_OPTIONS {
            return Err(DraftError::TooManyOptions);
        }
        while self.options.len() <= position {
            self.options.push(QuizOption::new(option_key(self.options.len()), ""));
        }
        let option = &mut self.options[position];
        option.text = text.into();
        Ok(option.key.clone())
    }

    /// Append an option and return its key.
    ///
    /// # Errors
    ///
    /// `TooManyOptions` once `Z` is taken.
    pub fn add_option(&mut self, text: impl Into<String>) -> Result<String, DraftError> {
        self.option(self.options.len(), text)
    }

    /// Mark `key` as the only correct option. Unknown keys clear every mark.
    pub fn mark_correct(&mut self, key: &str) -> &mut Self {
        for option in &mut self.options {
            option.is_correct = Some(option.key == key);
        }
        self
    }

    /// Options so far.
    pub fn options(&self) -> &[QuizOption] {
        &self.options
    }

    /// Check the question at `index` is complete.
    ///
    /// # Errors
    ///
    /// `EmptyText` or `NoCorrectOption`.
    pub fn validate(&self, index: usize) -> Result<(), DraftError> {
        validate_question(index, &self.text, &self.options)
    }

    /// Finished question.
    pub fn build(&self) -> QuizQuestion {
        QuizQuestion {
            question_id: None,
            text: self.text.trim().to_string(),
            options: self.options.clone(),
            time_limit_seconds: self.time_limit_seconds,
            max_marks: self.max_marks,
        }
    }
}

/// A quiz under construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftBuilder {
    title: String,
    description: String,
    questions: Vec<QuestionBuilder>,
}

impl Default for DraftBuilder {
    fn default() -> Self {
        Self { title: String::new(), description: String::new(), questions: vec![QuestionBuilder::new()] }
    }
}

impl DraftBuilder {
    /// Draft with one blank question.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the title.
    pub fn title(&mut self, title: impl Into<String>) -> &mut Self {
        self.title = title.into();
        self
    }

    /// Set the description.
    pub fn description(&mut self, description: impl Into<String>) -> &mut Self {
        self.description = description.into();
        self
    }

    /// Number of questions.
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Whether the draft has no questions.
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Append a blank question and return it.
    ///
    /// # Errors
    ///
    /// `TooManyQuestions` at the cap.
    pub fn add_question(&mut self) -> Result<&mut QuestionBuilder, DraftError> {
        if self.questions.len() >= MAX_QUESTIONS {
            return Err(DraftError::TooManyQuestions);
        }
        self.questions.push(QuestionBuilder::new());
        let last = self.questions.len() - 1;
        Ok(&mut self.questions[last])
    }

    /// Question at `index`.
    pub fn question_mut(&mut self, index: usize) -> Option<&mut QuestionBuilder> {
        self.questions.get_mut(index)
    }

    /// Remove the question at `index`. The last remaining question is kept.
    pub fn remove_question(&mut self, index: usize) -> bool {
        if self.questions.len() <= 1 || index >= self.questions.len() {
            return false;
        }
        self.questions.remove(index);
        true
    }

    /// Validate every question and produce the request body.
    ///
    /// # Errors
    ///
    /// The first incomplete question's error.
    pub fn build(&self) -> Result<QuizDraft, DraftError> {
        prepare(QuizDraft {
            title: self.title.clone(),
            description: Some(self.description.clone()),
            questions: self.questions.iter().map(QuestionBuilder::build).collect(),
        })
    }
}

fn validate_question(index: usize, text: &str, options: &[QuizOption]) -> Result<(), DraftError> {
    if text.trim().is_empty() {
        return Err(DraftError::EmptyText { index });
    }
    let has_correct = options
        .iter()
        .any(|o| o.is_correct == Some(true) && !o.text.trim().is_empty());
    if !has_correct {
        return Err(DraftError::NoCorrectOption { index });
    }
    Ok(())
}

/// Validate a draft from any source and fill in defaults.
///
/// Blank titles become [`UNTITLED`], blank descriptions are dropped, and a
/// zero time limit or mark count takes the default.
///
/// # Errors
///
/// `NoQuestions`, `TooManyQuestions`, or the first incomplete question's
/// error.
pub fn prepare(mut draft: QuizDraft) -> Result<QuizDraft, DraftError> {
    if draft.questions.is_empty() {
        return Err(DraftError::NoQuestions);
    }
    if draft.questions.len() > MAX_QUESTIONS {
        return Err(DraftError::TooManyQuestions);
    }
    for (index, question) in draft.questions.iter_mut().enumerate() {
        validate_question(index, &question.text, &question.options)?;
        if question.options.len() > MAX_OPTIONS {
            return Err(DraftError::TooManyOptions);
        }
        if question.time_limit_seconds == 0 {
            question.time_limit_seconds = DEFAULT_TIME_LIMIT_SECONDS;
        }
        if question.max_marks == 0 {
            question.max_marks = DEFAULT_MAX_MARKS;
        }
    }

    draft.title = draft.title.trim().to_string();
    if draft.title.is_empty() {
        draft.title = UNTITLED.to_string();
    }
    draft.description = draft.description.map(|d| d.trim().to_string()).filter(|d| !d.is_empty());
    Ok(draft)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_question(builder: &mut DraftBuilder, index: usize, text: &str) {
        let question = builder.question_mut(index).unwrap();
        question.text(text);
        question.option(0, "3").unwrap();
        let key = question.option(1, "4").unwrap();
        question.mark_correct(&key);
    }

    #[test]
    fn blank_draft_is_untitled() {
        let mut builder = DraftBuilder::new();
        complete_question(&mut builder, 0, "2+2?");

        let draft = builder.build().unwrap();
        assert_eq!(draft.title, UNTITLED);
        assert_eq!(draft.description, None);
        assert_eq!(draft.questions[0].time_limit_seconds, DEFAULT_TIME_LIMIT_SECONDS);
        assert_eq!(draft.questions[0].max_marks, DEFAULT_MAX_MARKS);
    }

    #[test]
    fn option_keys_follow_insertion_order() {
        let mut question = QuestionBuilder::new();
        assert_eq!(question.add_option("c").unwrap(), "C");
        assert_eq!(question.add_option("d").unwrap(), "D");
        let keys: Vec<_> = question.options().iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, ["A", "B", "C", "D"]);
    }

    #[test]
    fn options_stop_at_z() {
        let mut question = QuestionBuilder::new();
        for _ in 2..MAX_OPTIONS {
            question.add_option("x").unwrap();
        }
        assert_eq!(question.options().last().unwrap().key, "Z");
        assert_eq!(question.add_option("x").unwrap_err(), DraftError::TooManyOptions);
    }

    #[test]
    fn marking_correct_is_exclusive() {
        let mut question = QuestionBuilder::new();
        question.mark_correct("A").mark_correct("B");
        let marks: Vec<_> = question.options().iter().map(|o| o.is_correct).collect();
        assert_eq!(marks, [Some(false), Some(true)]);
    }

    #[test]
    fn empty_text_is_rejected() {
        let mut builder = DraftBuilder::new();
        complete_question(&mut builder, 0, "   ");
        let err = builder.build().unwrap_err();
        assert_eq!(err, DraftError::EmptyText { index: 0 });
        assert_eq!(err.to_string(), "question 1: Please add a question title");
    }

    #[test]
    fn correct_option_needs_text() {
        let mut builder = DraftBuilder::new();
        complete_question(&mut builder, 0, "2+2?");
        builder.add_question().unwrap().text("3+3?").mark_correct("A");
        assert_eq!(builder.build().unwrap_err(), DraftError::NoCorrectOption { index: 1 });
    }

    #[test]
    fn question_cap() {
        let mut builder = DraftBuilder::new();
        for _ in 1..MAX_QUESTIONS {
            builder.add_question().unwrap();
        }
        assert_eq!(builder.len(), MAX_QUESTIONS);
        assert_eq!(builder.add_question().unwrap_err(), DraftError::TooManyQuestions);
    }

    #[test]
    fn last_question_cannot_be_removed() {
        let mut builder = DraftBuilder::new();
        assert!(!builder.remove_question(0));
        builder.add_question().unwrap();
        assert!(builder.remove_question(0));
        assert_eq!(builder.len(), 1);
    }

    #[test]
    fn prepare_rejects_empty_draft() {
        let draft = QuizDraft { title: "t".into(), description: None, questions: Vec::new() };
        assert_eq!(prepare(draft).unwrap_err(), DraftError::NoQuestions);
    }
}
