use adflux_types::{AdfluxError, JobDescriptor, Platform, ReportParameters, TableSchema};
use async_trait::async_trait;

/// A report on an external platform, generated and fetched as a job.
///
/// A driver calls `generate`, then (for asynchronous reports) `is_ready` until
/// it returns `true`, then `get_content`. The driver owns the polling cadence,
/// deadlines and retries; implementations make one remote round-trip per call
/// and never loop.
#[async_trait]
pub trait ReportJob: Send + Sync {
    /// Platform backing this report.
    fn platform(&self) -> Platform;

    /// Start generating the report.
    ///
    /// Asynchronous platforms return the remote job identifiers. Synchronous
    /// platforms may fetch the whole report here and return
    /// [`JobDescriptor::completed`].
    async fn generate(&self, params: &ReportParameters) -> Result<JobDescriptor, AdfluxError>;

    /// Check whether the report is ready.
    ///
    /// Returns `false` while the platform reports a processing state, `true`
    /// once it is available, and `UnsupportedStatus` for anything else.
    async fn is_ready(
        &self,
        job: &JobDescriptor,
        params: &ReportParameters,
    ) -> Result<bool, AdfluxError> {
        let _ = (job, params);
        Ok(true)
    }

    /// Fetch the finished report.
    async fn get_content(
        &self,
        job: &JobDescriptor,
        params: &ReportParameters,
    ) -> Result<String, AdfluxError>;

    /// Whether `message` is an error that retrying cannot fix.
    ///
    /// Default: every error is retryable.
    fn is_fatal_error(&self, message: &str) -> bool {
        let _ = message;
        false
    }

    /// Schema of the report content for downstream loading.
    ///
    /// Every concrete report overrides this.
    fn generate_schema(&self) -> Result<TableSchema, AdfluxError> {
        Err(AdfluxError::unimplemented("generate_schema"))
    }

    /// Whether the driver must poll `is_ready` before `get_content`.
    fn is_asynchronous(&self) -> bool {
        true
    }
}

/// Content captured by `generate` for synchronous reports.
///
/// # Errors
/// Returns `AdfluxError::Data` when the descriptor carries no content.
pub fn captured_content(job: &JobDescriptor) -> Result<String, AdfluxError> {
    job.content()
        .map(str::to_string)
        .ok_or_else(|| AdfluxError::Data("report content was not captured at generation".into()))
}

/// Returns true when `message` contains any of `signatures`.
#[must_use]
pub fn matches_any(message: &str, signatures: &[&str]) -> bool {
    signatures.iter().any(|s| message.contains(s))
}
