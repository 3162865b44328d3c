//! Dataset loading from local MMLU-Pro exports
//!
//! A split is either a JSON array of question objects or JSON Lines with one
//! object per line. `load_split` looks for `<name>.json` then `<name>.jsonl`.

use indexmap::IndexMap;
use std::path::{Path, PathBuf};

use super::Question;

/// Placeholder option text used by the dataset for padded choices
const MISSING_OPTION: &str = "N/A";

/// Error type for dataset loading
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error in {path}: {message}")]
    Parse { path: String, message: String },

    #[error("No split named '{split}' in {dir} (looked for .json and .jsonl)")]
    MissingFile { split: String, dir: String },
}

/// Questions grouped by category, in first-appearance order
pub type Dataset = IndexMap<String, Vec<Question>>;

/// Load a named split (`test`, `validation`) from a data directory
pub fn load_split(data_dir: impl AsRef<Path>, split: &str) -> Result<Dataset, LoadError> {
    let dir = data_dir.as_ref();
    let candidates: [PathBuf; 2] = [
        dir.join(format!("{}.json", split)),
        dir.join(format!("{}.jsonl", split)),
    ];

    let path = candidates
        .iter()
        .find(|p| p.is_file())
        .ok_or_else(|| LoadError::MissingFile {
            split: split.to_string(),
            dir: dir.display().to_string(),
        })?;

    let questions = load_split_file(path)?;
    tracing::info!("Loaded {} {} questions from {}", questions.len(), split, path.display());
    Ok(split_by_category(questions))
}

/// Load every question from one file, dropping `N/A` options
pub fn load_split_file(path: impl AsRef<Path>) -> Result<Vec<Question>, LoadError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;
    let parse_err = |message: String| LoadError::Parse {
        path: path.display().to_string(),
        message,
    };

    let questions: Vec<Question> = if content.trim_start().starts_with('[') {
        serde_json::from_str(&content).map_err(|e| parse_err(e.to_string()))?
    } else {
        content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(idx, line)| {
                serde_json::from_str::<Question>(line)
                    .map_err(|e| parse_err(format!("line {}: {}", idx + 1, e)))
            })
            .collect::<Result<_, _>>()?
    };

    Ok(questions.into_iter().map(strip_missing_options).collect())
}

/// Group questions by category, keeping input order within each category
pub fn split_by_category(questions: Vec<Question>) -> Dataset {
    let mut dataset = Dataset::new();
    for question in questions {
        dataset
            .entry(question.category.clone())
            .or_default()
            .push(question);
    }
    dataset
}

fn strip_missing_options(mut question: Question) -> Question {
    question.options.retain(|opt| opt != MISSING_OPTION);
    question
}
