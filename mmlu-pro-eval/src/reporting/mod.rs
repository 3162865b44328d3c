//! Results reporting

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::analysis::{CategoryAccuracy, TOTAL_KEY};
use crate::runner::CategoryOutcome;
use crate::tasks::ResultRecord;

/// Print the per-category lines and the combined summary table
pub fn print_console_report(outcomes: &[CategoryOutcome]) {
    println!("\n=== MMLU-Pro Evaluation Results ===\n");

    if outcomes.is_empty() {
        println!("No categories evaluated.");
        return;
    }

    let mut combined = CategoryAccuracy::new();
    for outcome in outcomes {
        if let Some(counts) = outcome.counts() {
            combined.merge_category(&outcome.category, counts);
        }
    }

    println!(
        "{:<20} {:>8} {:>8} {:>9} {:>6} {:>9}",
        "Category", "Correct", "Wrong", "Accuracy", "New", "Time(s)"
    );
    println!("{:-<65}", "");

    for outcome in outcomes {
        let (corr, wrong, acc) = outcome
            .counts()
            .map(|c| (c.corr, c.wrong, c.accuracy()))
            .unwrap_or((0.0, 0.0, 0.0));
        println!(
            "{:<20} {:>8} {:>8} {:>8.2}% {:>6} {:>9.2}",
            outcome.category,
            corr,
            wrong,
            acc * 100.0,
            outcome.dispatched,
            outcome.elapsed.as_secs_f64()
        );
    }

    let total = combined.total();
    println!("{:-<65}", "");
    println!(
        "{:<20} {:>8} {:>8} {:>8.2}%",
        TOTAL_KEY,
        total.corr,
        total.wrong,
        total.accuracy() * 100.0
    );
    println!("\n{:=<65}", "");
}

/// One analyzed result file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultFileStats {
    /// Directory holding the file, relative to the scanned root
    pub run: String,
    pub category: String,
    pub correct: usize,
    pub total: usize,
    pub pass_rate: f64,
    /// Mean character length of non-empty model outputs
    pub avg_output_len: f64,
}

impl ResultFileStats {
    pub fn from_records(run: impl Into<String>, category: impl Into<String>, records: &[ResultRecord]) -> Self {
        let correct = records
            .iter()
            .filter(|r| r.pred.as_deref() == Some(r.question.answer.as_str()))
            .count();
        let lengths: Vec<usize> = records
            .iter()
            .filter_map(|r| r.model_outputs.as_deref())
            .filter(|out| !out.is_empty())
            .map(|out| out.chars().count())
            .collect();

        let total = records.len();
        Self {
            run: run.into(),
            category: category.into(),
            correct,
            total,
            pass_rate: if total > 0 { correct as f64 / total as f64 } else { 0.0 },
            avg_output_len: if lengths.is_empty() {
                0.0
            } else {
                lengths.iter().sum::<usize>() as f64 / lengths.len() as f64
            },
        }
    }

    /// Row in the analysis table
    pub fn to_row(&self) -> String {
        format!(
            "{}, {}, {}, {}, {:.4}, {:.2}",
            self.run, self.category, self.correct, self.total, self.pass_rate, self.avg_output_len
        )
    }
}

pub const ANALYSIS_HEADER: &str = "run, category, correct, total, pass_rate, avg_output_len";

/// Analyze every `*_result.json` in `root` and its immediate subdirectories
///
/// Files that cannot be read or parsed are skipped with a warning.
pub fn analyze_results_dir(root: impl AsRef<Path>) -> std::io::Result<Vec<ResultFileStats>> {
    let root = root.as_ref();
    let mut dirs = vec![(".".to_string(), root.to_path_buf())];
    let mut subdirs: Vec<PathBuf> = std::fs::read_dir(root)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    subdirs.sort();
    for dir in subdirs {
        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        dirs.push((name, dir));
    }

    let mut stats = Vec::new();
    for (run, dir) in dirs {
        let mut files: Vec<(String, PathBuf)> = std::fs::read_dir(&dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .filter_map(|path| {
                let name = path.file_name()?.to_str()?;
                let category = name.strip_suffix("_result.json")?.to_string();
                Some((category, path))
            })
            .collect();
        files.sort();

        for (category, path) in files {
            match read_result_file(&path) {
                Ok(records) => stats.push(ResultFileStats::from_records(run.clone(), category, &records)),
                Err(e) => tracing::warn!("Error processing {}: {}", path.display(), e),
            }
        }
    }

    Ok(stats)
}

fn read_result_file(path: &Path) -> Result<Vec<ResultRecord>, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Print the analysis table to stdout
pub fn print_analysis(stats: &[ResultFileStats]) {
    println!("{}", ANALYSIS_HEADER);
    for row in stats {
        println!("{}", row.to_row());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{result_path, ResultStore};
    use crate::tasks::Question;
    use std::time::Duration;

    fn question(id: i64, answer_index: usize) -> Question {
        Question::new(id, "law", format!("q{}", id), vec!["a".into(), "b".into(), "c".into()], answer_index)
    }

    fn sample_records() -> Vec<ResultRecord> {
        vec![
            ResultRecord::answered(question(1, 0), Some("A".into()), "The answer is (A)".into()),
            ResultRecord::answered(question(2, 1), Some("C".into()), "C".into()),
            ResultRecord::answered(question(3, 2), None, String::new()),
            ResultRecord::failed(question(4, 0), "Timeout after 10ms"),
        ]
    }

    #[test]
    fn test_stats_from_records() {
        let stats = ResultFileStats::from_records("run1", "law", &sample_records());
        assert_eq!(stats.correct, 1);
        assert_eq!(stats.total, 4);
        assert!((stats.pass_rate - 0.25).abs() < 1e-9);
        // "The answer is (A)" is 17 chars, "C" is 1; the empty output is ignored
        assert!((stats.avg_output_len - 9.0).abs() < 1e-9);
        assert_eq!(stats.to_row(), "run1, law, 1, 4, 0.2500, 9.00");
    }

    #[test]
    fn test_stats_empty_file() {
        let stats = ResultFileStats::from_records(".", "law", &[]);
        assert_eq!(stats.pass_rate, 0.0);
        assert_eq!(stats.avg_output_len, 0.0);
    }

    #[test]
    fn test_analyze_scans_root_and_subdirs() {
        let dir = tempfile::tempdir().unwrap();
        let run_dir = dir.path().join("qwen_run");
        std::fs::create_dir_all(&run_dir).unwrap();

        ResultStore::save(&sample_records(), result_path(dir.path(), "law")).unwrap();
        ResultStore::save(&sample_records()[..1], result_path(&run_dir, "law")).unwrap();
        std::fs::write(run_dir.join("broken_result.json"), "{not json").unwrap();
        std::fs::write(run_dir.join("law_summary.json"), "{}").unwrap();

        let stats = analyze_results_dir(dir.path()).unwrap();
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].run, ".");
        assert_eq!(stats[0].total, 4);
        assert_eq!(stats[1].run, "qwen_run");
        assert_eq!(stats[1].category, "law");
        assert_eq!(stats[1].correct, 1);
    }

    #[test]
    fn test_console_report_handles_outcomes() {
        let records = sample_records();
        let outcome = CategoryOutcome {
            category: "law".into(),
            dispatched: 4,
            skipped: 0,
            stored: 4,
            accuracy: CategoryAccuracy::from_records(&records),
            elapsed: Duration::from_millis(1500),
        };
        print_console_report(&[outcome]);
        print_console_report(&[]);
    }
}
