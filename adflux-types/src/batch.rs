use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Outcome of one batch submission.
///
/// On success only `result` and `number_of_lines` are set. On failure
/// `errors` is always non-empty; the per-line fields are set only when the
/// platform (or local validation) reported individual records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResult {
    /// Overall success flag.
    pub result: bool,
    /// Number of input lines in the batch.
    pub number_of_lines: usize,
    /// Raw lines that were rejected, in input order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_lines: Option<Vec<String>>,
    /// Rejected lines keyed by their normalized error message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grouped_failed: Option<BTreeMap<String, Vec<String>>>,
    /// Distinct error messages in order of first occurrence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

impl BatchResult {
    /// A fully successful batch.
    #[must_use]
    pub const fn success(number_of_lines: usize) -> Self {
        Self {
            result: true,
            number_of_lines,
            failed_lines: None,
            grouped_failed: None,
            errors: None,
        }
    }

    /// A batch that failed as a whole, e.g. because the remote call itself failed.
    #[must_use]
    pub fn whole_batch_failure(number_of_lines: usize, message: impl Into<String>) -> Self {
        Self {
            result: false,
            number_of_lines,
            failed_lines: None,
            grouped_failed: None,
            errors: Some(vec![message.into()]),
        }
    }

    /// Returns true when the whole batch failed without a per-line breakdown.
    ///
    /// Callers retry every line of such a batch.
    #[must_use]
    pub const fn is_whole_batch_failure(&self) -> bool {
        !self.result && self.failed_lines.is_none()
    }

    /// Number of lines that failed; every line for a whole-batch failure.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        if self.result {
            0
        } else {
            self.failed_lines
                .as_ref()
                .map_or(self.number_of_lines, Vec::len)
        }
    }

    /// Error messages, empty on success.
    #[must_use]
    pub fn errors(&self) -> &[String] {
        self.errors.as_deref().unwrap_or_default()
    }
}
