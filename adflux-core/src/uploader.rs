use adflux_types::{BatchResult, Platform};
use async_trait::async_trait;

/// Uploads one batch of raw conversion lines.
///
/// Implementations own their batch configuration. `submit` never fails: every
/// outcome, including transport failures, is encoded in the returned
/// [`BatchResult`] so a pipeline can move on to the next batch.
#[async_trait]
pub trait ConversionUploader: Send + Sync {
    /// Platform receiving the conversions.
    fn platform(&self) -> Platform;

    /// Submit `lines` as one batch. `batch_id` tags logs only.
    async fn submit(&self, lines: &[String], batch_id: &str) -> BatchResult;
}
