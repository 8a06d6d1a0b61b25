//! adflux uploads marketing conversions and retrieves advertising reports.
//!
//! Overview
//! - Uploads: an [`UploadPipeline`] splits raw conversion lines into batches
//!   and submits them through a [`ConversionUploader`], typically the
//!   Campaign Manager uploader from [`CmConnector::uploader`]. Per-record
//!   rejections come back grouped by normalized error message in an
//!   [`UploadReport`]; nothing is raised for a partially failed batch.
//! - Reports: [`build_report`] turns a tagged [`ReportConfig`] into an
//!   `Arc<dyn ReportJob>` for Campaign Manager, DV360, SA360, Google Ads or
//!   YouTube. A [`ReportTask`] drives any such job through generate, poll and
//!   fetch without knowing which platform is behind it.
//!
//! Key behaviors and trade-offs
//! - Retries: a failed job call restarts the job from `generate` after an
//!   exponential backoff with jitter. Configuration faults, unsupported
//!   report statuses, missing profiles and errors the job classifies as fatal
//!   stop the task at once.
//! - Polling: the poll interval is fixed; an optional deadline bounds the
//!   whole run. Without one, a job that never finishes is polled forever.
//! - Uploads: batches run concurrently without an internal bound. Whole-batch
//!   failures are listed by [`UploadReport::retryable_batches`] for callers
//!   that resubmit.
//!
//! Examples
//! Running a DV360 report:
//! ```rust,ignore
//! use adflux::{PlatformClients, ReportConfig, ReportParameters, ReportTask, build_report};
//! use adflux_platforms::adapter::RealAdapter;
//!
//! let clients = PlatformClients::new().with_google(RealAdapter::new_default(token));
//! let config: ReportConfig = serde_json::from_str(
//!     r#"{"target": "DV360", "config": {"queryId": "123"}}"#,
//! )?;
//! let job = build_report(&config, &clients)?;
//! let params = ReportParameters::new()
//!     .with("startDate", "2024-01-01")
//!     .with("endDate", "2024-01-31");
//! let outcome = ReportTask::builder().build()?.run(job.as_ref(), &params).await?;
//! ```
//!
//! Uploading conversions:
//! ```rust,ignore
//! use std::sync::Arc;
//! use adflux::{CmConnector, UploadPipeline};
//!
//! let cm = CmConnector::new_default(token);
//! let uploader = Arc::new(cm.uploader(batch_config)?);
//! let report = UploadPipeline::new(uploader).batch_size(500).run(&lines).await?;
//! for (error, lines) in &report.grouped_failed {
//!     eprintln!("{error}: {} lines", lines.len());
//! }
//! ```
//!
//! See `adflux/demos/` for runnable end-to-end demonstrations.
#![warn(missing_docs)]

pub(crate) mod core;
mod driver;
mod factory;
mod upload;
mod util;

pub use crate::core::{ReportTask, ReportTaskBuilder, TaskOutcome};
pub use factory::{PlatformClients, build_report};
pub use upload::{DEFAULT_BATCH_SIZE, UploadPipeline};
pub use util::join_with_deadline;

pub use adflux_cm::CmConnector;

// Re-export core types for convenience
pub use adflux_core::{
    AdfluxError,
    AdsReportConfig,
    BackoffConfig,
    BatchConfig,
    BatchOutcome,
    BatchResult,
    CmReportConfig,
    ConversionUploader,
    Dv360ReportConfig,
    FieldMode,
    FieldType,
    IdType,
    JobDescriptor,
    Platform,
    ReportConfig,
    ReportJob,
    ReportParameters,
    Sa360ReportConfig,
    TableField,
    TableSchema,
    TaskConfig,
    UploadReport,
    YouTubeReportConfig,
};
