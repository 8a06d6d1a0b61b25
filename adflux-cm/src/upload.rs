use std::sync::Arc;

use adflux_core::{
    BatchConfig, BatchResult, Clock, ConversionUploader, FailureAccumulator, Platform,
    prepare_batch,
};
use async_trait::async_trait;

use crate::ConversionsAdapter;
use crate::adapter::CmConversions;

/// Uploads conversion batches for one validated [`BatchConfig`].
///
/// Built by [`crate::CmConnector::uploader`]. The configuration is fixed at
/// construction and never modified by a submit.
pub struct CmUploader {
    pub(crate) conversions: ConversionsAdapter,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) config: BatchConfig,
}

impl std::fmt::Debug for CmUploader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CmUploader")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl CmUploader {
    /// The batch configuration this uploader submits with.
    #[must_use]
    pub const fn config(&self) -> &BatchConfig {
        &self.config
    }
}

#[async_trait]
impl ConversionUploader for CmUploader {
    fn platform(&self) -> Platform {
        Platform::CampaignManager
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "adflux_cm::submit",
            skip(self, lines),
            fields(batch_id = batch_id, lines = lines.len(), profile_id = %self.config.profile_id),
        )
    )]
    #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
    async fn submit(&self, lines: &[String], batch_id: &str) -> BatchResult {
        let prepared = prepare_batch(&self.config, lines, self.clock.now_millis());

        let mut failures = FailureAccumulator::new();
        for (index, err) in &prepared.rejected {
            failures.record(*index, [err.to_string()]);
        }

        if !prepared.is_empty() {
            match self
                .conversions
                .batch_insert(&self.config.profile_id, &prepared.request)
                .await
            {
                Ok(resp) if resp.has_failures => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(batch_id, "CM batch has failures");
                    for (pos, status) in resp.status.iter().enumerate() {
                        if status.errors.is_empty() {
                            continue;
                        }
                        // Statuses follow the request, which holds only the submitted lines.
                        let Some(&index) = prepared.submitted.get(pos) else {
                            #[cfg(feature = "tracing")]
                            tracing::warn!(
                                batch_id,
                                position = pos,
                                submitted = prepared.submitted.len(),
                                "status position outside request; skipped"
                            );
                            continue;
                        };
                        failures.record(index, status.errors.iter().map(|e| e.message.clone()));
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    #[cfg(feature = "tracing")]
                    tracing::error!(batch_id, error = %e, "CM batch failed");
                    return BatchResult::whole_batch_failure(lines.len(), e.message());
                }
            }
        } else {
            #[cfg(feature = "tracing")]
            tracing::warn!(batch_id, "no valid record in batch; nothing sent");
        }

        let result = failures.finish(lines);
        #[cfg(feature = "tracing")]
        if !result.result {
            tracing::warn!(
                batch_id,
                failed = result.failed_count(),
                errors = ?result.errors(),
                "CM batch finished with failed lines"
            );
        }
        result
    }
}
