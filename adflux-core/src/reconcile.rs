//! Reconciling per-record statuses into a [`BatchResult`].

use std::collections::{BTreeMap, HashSet};

use adflux_types::BatchResult;
use serde::{Deserialize, Serialize};

/// Marker that separates instance-specific detail from the error class.
pub const ERROR_MARKER: &str = "error: ";

/// One structured error attached to a record status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordError {
    /// Error code, when the platform provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Raw error message.
    pub message: String,
}

impl RecordError {
    /// Error with a message only.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }
}

/// Status of one submitted record, aligned by position with the request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordStatus {
    /// Errors for this record; empty when it was accepted.
    #[serde(default)]
    pub errors: Vec<RecordError>,
}

/// Strip everything up to and including the last [`ERROR_MARKER`].
///
/// `"Conversion 12 rejected: 400 error: INVALID_ID"` becomes `"INVALID_ID"`;
/// messages without the marker are returned unchanged.
#[must_use]
pub fn normalize_error_message(message: &str) -> &str {
    message
        .rfind(ERROR_MARKER)
        .map_or(message, |i| &message[i + ERROR_MARKER.len()..])
}

/// Collects per-line failures and folds them into a [`BatchResult`].
///
/// Failures may be recorded in any order and from several sources (local
/// validation, remote statuses); they are folded in input order.
#[derive(Debug, Default)]
pub struct FailureAccumulator {
    by_line: BTreeMap<usize, Vec<String>>,
}

impl FailureAccumulator {
    /// Empty accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record raw error messages for the line at `index`.
    pub fn record<I, S>(&mut self, index: usize, messages: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entry = self.by_line.entry(index).or_default();
        entry.extend(messages.into_iter().map(Into::into));
    }

    /// Returns true when no failure has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_line.values().all(Vec::is_empty)
    }

    /// Fold the recorded failures against the batch's raw lines.
    ///
    /// Indices outside `lines` are skipped.
    #[must_use]
    pub fn finish(self, lines: &[String]) -> BatchResult {
        let mut failed_lines = Vec::new();
        let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let mut errors = Vec::new();
        let mut seen = HashSet::new();

        for (index, messages) in self.by_line {
            if messages.is_empty() {
                continue;
            }
            let Some(line) = lines.get(index) else {
                #[cfg(feature = "tracing")]
                tracing::warn!(index, lines = lines.len(), "status index outside batch; skipped");
                continue;
            };
            failed_lines.push(line.clone());
            let mut groups_for_line = HashSet::new();
            for message in &messages {
                let general = normalize_error_message(message);
                if seen.insert(general.to_string()) {
                    errors.push(general.to_string());
                }
                if groups_for_line.insert(general) {
                    grouped
                        .entry(general.to_string())
                        .or_default()
                        .push(line.clone());
                }
            }
        }

        if failed_lines.is_empty() {
            return BatchResult::success(lines.len());
        }
        BatchResult {
            result: false,
            number_of_lines: lines.len(),
            failed_lines: Some(failed_lines),
            grouped_failed: Some(grouped),
            errors: Some(errors),
        }
    }
}

/// Reconcile positional record statuses against the lines they were built from.
#[must_use]
pub fn reconcile(lines: &[String], statuses: &[RecordStatus]) -> BatchResult {
    let mut acc = FailureAccumulator::new();
    for (index, status) in statuses.iter().enumerate() {
        if !status.errors.is_empty() {
            acc.record(index, status.errors.iter().map(|e| e.message.clone()));
        }
    }
    acc.finish(lines)
}
