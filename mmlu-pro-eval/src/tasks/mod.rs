//! Benchmark questions and per-question result records

pub mod loader;
pub mod prompt;

pub use loader::{load_split, load_split_file, split_by_category, Dataset, LoadError};
pub use prompt::{build_prompt, format_example};

use serde::{Deserialize, Serialize};

/// Choice letters in option order
pub const CHOICE_LETTERS: &str = "ABCDEFGHIJ";

/// Letter for an option index, if it is within `A..=J`
pub fn choice_letter(index: usize) -> Option<char> {
    CHOICE_LETTERS.chars().nth(index)
}

/// An MMLU-Pro benchmark item
///
/// Fields the driver does not interpret (for example `src`) are kept in
/// `extra` and written back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub question_id: i64,
    pub question: String,
    pub options: Vec<String>,
    pub answer: String,
    pub answer_index: usize,
    #[serde(default)]
    pub cot_content: String,
    pub category: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Question {
    /// Create a question with no chain-of-thought content
    pub fn new(
        question_id: i64,
        category: impl Into<String>,
        question: impl Into<String>,
        options: Vec<String>,
        answer_index: usize,
    ) -> Self {
        let answer = choice_letter(answer_index)
            .map(String::from)
            .unwrap_or_default();
        Self {
            question_id,
            question: question.into(),
            options,
            answer,
            answer_index,
            cot_content: String::new(),
            category: category.into(),
            extra: serde_json::Map::new(),
        }
    }

    /// Set the worked-example text
    pub fn with_cot(mut self, cot: impl Into<String>) -> Self {
        self.cot_content = cot.into();
        self
    }

    /// Whether `other` is the same item: same id and same question text
    pub fn same_item(&self, other: &Question) -> bool {
        self.question_id == other.question_id && self.question == other.question
    }
}

/// Outcome of evaluating one question
///
/// Serialized as the question's own fields plus `pred`, `model_outputs`,
/// `already_existed` and, for failed requests, `error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    #[serde(default)]
    pub pred: Option<String>,
    #[serde(default)]
    pub model_outputs: Option<String>,
    #[serde(default)]
    pub already_existed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub question: Question,
}

impl ResultRecord {
    /// Record for a completed request
    pub fn answered(question: Question, pred: Option<String>, model_outputs: String) -> Self {
        Self {
            pred,
            model_outputs: Some(model_outputs),
            already_existed: false,
            error: None,
            question,
        }
    }

    /// Record for a request that failed; counts as unanswered
    pub fn failed(question: Question, error: impl Into<String>) -> Self {
        Self {
            pred: None,
            model_outputs: None,
            already_existed: false,
            error: Some(error.into()),
            question,
        }
    }

    pub fn question_id(&self) -> i64 {
        self.question.question_id
    }

    pub fn category(&self) -> &str {
        &self.question.category
    }

    /// Whether a prediction exists; an empty string counts as absent
    pub fn has_prediction(&self) -> bool {
        self.pred.as_deref().is_some_and(|p| !p.is_empty())
    }

    /// Whether the prediction matches the correct letter
    pub fn is_correct(&self) -> bool {
        self.pred.as_deref() == Some(self.question.answer.as_str())
    }
}
