use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for the adflux workspace.
///
/// Configuration faults, locally rejected records, transport failures reported
/// by a platform, report-status violations and driver-level outcomes all flow
/// through this one enum.
#[derive(Debug, Error, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AdfluxError {
    /// Invalid or incomplete configuration, detected before any remote call.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A single input record could not be turned into a payload.
    #[error("invalid record: {0}")]
    InvalidRecord(String),

    /// A platform call failed at the transport level (network, auth, 5xx).
    #[error("{platform} failed: {msg}")]
    Transport {
        /// Platform that failed, e.g. "CM".
        platform: String,
        /// Human-readable error message.
        msg: String,
    },

    /// A remote resource could not be found.
    #[error("not found: {what}")]
    NotFound {
        /// Description of the missing resource.
        what: String,
    },

    /// More than one user profile matched an account id.
    #[error("ambiguous profile: {count} profiles match account {account_id}")]
    AmbiguousProfile {
        /// Account id that was looked up.
        account_id: String,
        /// Number of matching profiles.
        count: usize,
    },

    /// A report job reported a status outside the supported vocabulary.
    #[error("unsupported report status on {platform}: {status}")]
    UnsupportedStatus {
        /// Platform that reported the status.
        platform: String,
        /// Raw status value.
        status: String,
    },

    /// An operation has no implementation for this report kind.
    #[error("unimplemented: {operation}")]
    Unimplemented {
        /// Operation name, e.g. "generate_schema".
        operation: String,
    },

    /// Issues with returned data (missing fields, malformed payloads).
    #[error("data issue: {0}")]
    Data(String),

    /// A report job failed with an error its platform classifies as fatal.
    #[error("fatal error on {platform}: {msg}")]
    FatalJob {
        /// Platform of the failing job.
        platform: String,
        /// Message of the fatal error.
        msg: String,
    },

    /// A report job kept failing until the attempt budget ran out.
    #[error("retries exhausted after {attempts} attempts: {last}")]
    RetriesExhausted {
        /// Number of attempts made.
        attempts: u32,
        /// Message of the last failure.
        last: String,
    },

    /// An operation exceeded the caller-supplied deadline.
    #[error("request timed out: {operation}")]
    RequestTimeout {
        /// Operation label, e.g. "report" or "upload".
        operation: String,
    },
}

impl AdfluxError {
    /// Helper: build a `Config` error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Helper: build an `InvalidRecord` error.
    pub fn invalid_record(msg: impl Into<String>) -> Self {
        Self::InvalidRecord(msg.into())
    }

    /// Helper: build a `Transport` error with the platform name and message.
    pub fn transport(platform: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Transport {
            platform: platform.into(),
            msg: msg.into(),
        }
    }

    /// Helper: build a `NotFound` error.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// Helper: build an `UnsupportedStatus` error.
    pub fn unsupported_status(platform: impl Into<String>, status: impl Into<String>) -> Self {
        Self::UnsupportedStatus {
            platform: platform.into(),
            status: status.into(),
        }
    }

    /// Helper: build an `Unimplemented` error.
    pub fn unimplemented(operation: impl Into<String>) -> Self {
        Self::Unimplemented {
            operation: operation.into(),
        }
    }

    /// Helper: build a `RequestTimeout` error.
    pub fn request_timeout(operation: impl Into<String>) -> Self {
        Self::RequestTimeout {
            operation: operation.into(),
        }
    }

    /// Returns true for faults in the caller's configuration or input rather
    /// than in a remote system. Retrying these never helps.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Config(_)
                | Self::InvalidRecord(_)
                | Self::AmbiguousProfile { .. }
                | Self::Unimplemented { .. }
        )
    }

    /// Returns true for errors a fresh attempt cannot fix: configuration
    /// faults, a missing remote resource such as an unmatched profile, and a
    /// report status outside the supported vocabulary.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        self.is_configuration()
            || matches!(self, Self::NotFound { .. } | Self::UnsupportedStatus { .. })
    }

    /// The message a report classifier should inspect.
    ///
    /// Transport errors expose the platform's own message so that
    /// platform-specific signatures can be matched without the prefix.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Transport { msg, .. } | Self::FatalJob { msg, .. } => msg.clone(),
            other => other.to_string(),
        }
    }
}
