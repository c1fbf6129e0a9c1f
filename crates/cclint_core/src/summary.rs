//! Aggregation of per-file results into run totals.

use std::time::Instant;

use serde::Serialize;

use crate::result::LintResult;

/// Totals over every result of one lint run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LintSummary {
    pub total_files: usize,
    pub valid_files: usize,
    /// Sum of `errors` plus `custom_schema_errors` over all results.
    pub total_errors: usize,
    pub total_warnings: usize,
    pub total_suggestions: usize,
    /// Wall-clock duration of the run in milliseconds.
    pub duration: u64,
    pub results: Vec<LintResult>,
}

impl LintSummary {
    /// Reduces `results` into a summary; `start` marks the beginning of the run.
    pub fn from_results(results: Vec<LintResult>, start: Instant) -> Self {
        let total_files = results.len();
        let valid_files = results.iter().filter(|r| r.valid).count();
        let total_errors = results.iter().map(LintResult::error_count).sum();
        let total_warnings = results.iter().map(|r| r.warnings.len()).sum();
        let total_suggestions = results.iter().map(|r| r.suggestions.len()).sum();
        let duration = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        Self {
            total_files,
            valid_files,
            total_errors,
            total_warnings,
            total_suggestions,
            duration,
            results,
        }
    }
}
