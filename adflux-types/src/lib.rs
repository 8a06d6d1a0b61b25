//! Adflux data transfer objects and configuration primitives.
#![warn(missing_docs)]

mod batch;
mod config;
mod error;
mod job;
mod platform;
mod report_config;
mod reports;

pub use batch::BatchResult;
pub use config::{
    BackoffConfig, BatchConfig, ConversionTemplate, EncryptionInfo, IdType, TaskConfig,
};
pub use error::AdfluxError;
pub use job::{
    FieldMode, FieldType, JobDescriptor, ReportParameters, TableField, TableSchema,
};
pub use platform::Platform;
pub use report_config::{
    AdsReportConfig, AdsReportQuery, CmReportConfig, Dv360ReportConfig, ReportConfig,
    Sa360ReportConfig, YouTubeReportConfig,
};
pub use reports::{BatchOutcome, UploadReport};
