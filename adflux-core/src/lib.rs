//! adflux-core
//!
//! Contracts and platform-independent algorithms shared across the adflux
//! workspace.
//!
//! - `uploader`: the `ConversionUploader` trait for batch conversion uploads.
//! - `report`: the `ReportJob` trait implemented once per report platform.
//! - `conversion`: building conversion payloads from raw input lines.
//! - `reconcile`: folding per-record statuses into a `BatchResult`.
//! - `profile`: resolving a working user profile from an account.
//! - `clock`: the injectable time source for per-batch defaults.
#![warn(missing_docs)]

/// Injectable time source.
pub mod clock;
/// Conversion payload building.
pub mod conversion;
/// User profile resolution.
pub mod profile;
/// Partial-failure reconciliation.
pub mod reconcile;
/// The report job contract.
pub mod report;
/// The conversion uploader contract.
pub mod uploader;

pub use adflux_types::*;
pub use clock::{Clock, FixedClock, SystemClock};
pub use conversion::{ConversionBuilder, ConversionsRequest, PreparedBatch, prepare_batch};
pub use profile::{ProfileLookup, ProfileSelector, UserProfile, resolve_profile_id};
pub use reconcile::{FailureAccumulator, RecordError, RecordStatus, normalize_error_message, reconcile};
pub use report::ReportJob;
pub use uploader::ConversionUploader;
