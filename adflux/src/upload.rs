use std::sync::Arc;
use std::time::Duration;

use adflux_core::{AdfluxError, BatchOutcome, ConversionUploader, UploadReport};

use crate::util::join_with_deadline;

/// Largest batch `conversions.batchinsert` accepts.
pub const DEFAULT_BATCH_SIZE: usize = 1_000;

/// Splits conversion lines into batches and submits them concurrently.
#[derive(Clone)]
pub struct UploadPipeline {
    uploader: Arc<dyn ConversionUploader>,
    batch_size: usize,
    deadline: Option<Duration>,
    batch_prefix: String,
}

impl UploadPipeline {
    /// Pipeline over `uploader` with [`DEFAULT_BATCH_SIZE`] and no deadline.
    #[must_use]
    pub fn new(uploader: Arc<dyn ConversionUploader>) -> Self {
        Self {
            uploader,
            batch_size: DEFAULT_BATCH_SIZE,
            deadline: None,
            batch_prefix: "batch".to_string(),
        }
    }

    /// Lines per batch.
    #[must_use]
    pub const fn batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    /// Overall deadline across every batch.
    #[must_use]
    pub const fn deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Prefix of batch ids; batch `i` is tagged `{prefix}-{i}`.
    #[must_use]
    pub fn batch_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.batch_prefix = prefix.into();
        self
    }

    /// Submit `lines` and fold every batch result into one report.
    ///
    /// Batches run concurrently without bound. Partial and whole-batch
    /// failures are reported, not raised: the call succeeds once every batch
    /// has answered.
    ///
    /// # Errors
    /// Returns `AdfluxError::Config` for a zero batch size and
    /// `RequestTimeout("upload")` when the deadline elapses first.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "adflux::upload_pipeline::run",
            skip(self, lines),
            fields(platform = %self.uploader.platform(), lines = lines.len(), batch_size = self.batch_size),
        )
    )]
    pub async fn run(&self, lines: &[String]) -> Result<UploadReport, AdfluxError> {
        if self.batch_size == 0 {
            return Err(AdfluxError::config("batch_size must be at least 1"));
        }
        let tasks = lines.chunks(self.batch_size).enumerate().map(|(i, chunk)| {
            let uploader = Arc::clone(&self.uploader);
            let batch_id = format!("{}-{i}", self.batch_prefix);
            async move {
                let result = uploader.submit(chunk, &batch_id).await;
                BatchOutcome { batch_id, result }
            }
        });
        let outcomes = join_with_deadline(tasks, self.deadline, "upload").await?;

        let mut report = UploadReport::default();
        for outcome in outcomes {
            report.push(outcome);
        }
        #[cfg(feature = "tracing")]
        if !report.is_success() {
            tracing::warn!(
                batches = report.batches.len(),
                failed_lines = report.failed_lines,
                errors = ?report.errors,
                "upload finished with failures"
            );
        }
        Ok(report)
    }
}
