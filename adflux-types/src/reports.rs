//! Report envelopes produced by orchestrators and helpers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::batch::BatchResult;

/// Result of one batch inside a multi-batch upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchOutcome {
    /// Tag the batch was submitted under.
    pub batch_id: String,
    /// What the uploader reported.
    pub result: BatchResult,
}

/// Summary of a multi-batch upload.
///
/// Folds the per-batch results into totals and a cross-batch view of the
/// grouped failures, while keeping every batch's own result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadReport {
    /// Per-batch outcomes in submission order.
    pub batches: Vec<BatchOutcome>,
    /// Total input lines across all batches.
    pub total_lines: usize,
    /// Lines that failed, counting every line of wholly failed batches.
    pub failed_lines: usize,
    /// Failed lines across batches keyed by normalized error message.
    pub grouped_failed: BTreeMap<String, Vec<String>>,
    /// Distinct error messages across batches in order of first occurrence.
    pub errors: Vec<String>,
}

impl UploadReport {
    /// Fold one batch outcome into the report.
    pub fn push(&mut self, outcome: BatchOutcome) {
        let r = &outcome.result;
        self.total_lines += r.number_of_lines;
        self.failed_lines += r.failed_count();
        for e in r.errors() {
            if !self.errors.contains(e) {
                self.errors.push(e.clone());
            }
        }
        if let Some(grouped) = &r.grouped_failed {
            for (msg, lines) in grouped {
                self.grouped_failed
                    .entry(msg.clone())
                    .or_default()
                    .extend(lines.iter().cloned());
            }
        }
        self.batches.push(outcome);
    }

    /// Returns true when every batch succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.batches.iter().all(|b| b.result.result)
    }

    /// Batches that failed as a whole and should be resubmitted unchanged.
    pub fn retryable_batches(&self) -> impl Iterator<Item = &BatchOutcome> {
        self.batches
            .iter()
            .filter(|b| b.result.is_whole_batch_failure())
    }
}
