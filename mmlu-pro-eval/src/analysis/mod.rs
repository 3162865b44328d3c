//! Answer extraction and accuracy accounting

pub mod accuracy;
pub mod extractor;

pub use accuracy::{AccuracyCounts, AccuracyEntry, CategoryAccuracy, TOTAL_KEY};
pub use extractor::{extract_answer, extract_answer_with_tier, normalize_output, ExtractionTier};
