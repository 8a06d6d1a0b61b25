//! adflux-mock
//!
//! Mock report jobs and conversion uploaders for CI-safe tests and demos.
//!
//! [`MockReport`] and [`MockUploader`] answer from static fixtures.
//! [`ScriptedReport`] and [`ScriptedUploader`] defer every call to a
//! controller handle that tests drive from the outside.
#![warn(missing_docs)]

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use adflux_core::report::captured_content;
use adflux_core::{
    AdfluxError, BatchResult, ConversionUploader, FailureAccumulator, JobDescriptor, Platform,
    ReportJob, ReportParameters, TableSchema,
};
use async_trait::async_trait;

mod dynamic;
mod fixtures;

pub use dynamic::{
    MockBehavior, ReportCall, ScriptedReport, ScriptedReportBuilder, ScriptedReportController,
    ScriptedUploader, ScriptedUploaderController,
};

/// Delay applied to lines containing `TIMEOUT`.
pub const SLOW_LINE_DELAY: Duration = Duration::from_millis(200);

/// Fixture-backed report job.
///
/// Asynchronous by default: `is_ready` answers `false` for the first
/// `polls_before_ready` calls, then `true`. Platforms that are synchronous in
/// production (Google Ads, YouTube) capture their content at generation.
pub struct MockReport {
    platform: Platform,
    polls_before_ready: u32,
    polls: AtomicU32,
}

impl MockReport {
    /// Mock report for `platform`, ready on the first poll.
    #[must_use]
    pub const fn new(platform: Platform) -> Self {
        Self {
            platform,
            polls_before_ready: 0,
            polls: AtomicU32::new(0),
        }
    }

    /// Number of polls that report "not ready" before the report is available.
    #[must_use]
    pub fn with_polls_before_ready(mut self, polls: u32) -> Self {
        self.polls_before_ready = polls;
        self
    }

    const fn synchronous(&self) -> bool {
        matches!(self.platform, Platform::GoogleAds | Platform::YouTube)
    }
}

#[async_trait]
impl ReportJob for MockReport {
    fn platform(&self) -> Platform {
        self.platform
    }

    async fn generate(&self, params: &ReportParameters) -> Result<JobDescriptor, AdfluxError> {
        if params.get("fail") == Some("generate") {
            return Err(AdfluxError::transport(
                "adflux-mock",
                "forced failure: generate",
            ));
        }
        if self.synchronous() {
            return Ok(JobDescriptor::completed(fixtures::content(self.platform)));
        }
        self.polls.store(0, Ordering::SeqCst);
        Ok(JobDescriptor::new().with("mockJob", self.platform.as_str()))
    }

    async fn is_ready(
        &self,
        job: &JobDescriptor,
        _params: &ReportParameters,
    ) -> Result<bool, AdfluxError> {
        job.require("mockJob")?;
        let seen = self.polls.fetch_add(1, Ordering::SeqCst);
        Ok(seen >= self.polls_before_ready)
    }

    async fn get_content(
        &self,
        job: &JobDescriptor,
        _params: &ReportParameters,
    ) -> Result<String, AdfluxError> {
        if self.synchronous() {
            return captured_content(job);
        }
        job.require("mockJob")?;
        Ok(fixtures::content(self.platform).to_string())
    }

    fn generate_schema(&self) -> Result<TableSchema, AdfluxError> {
        Ok(fixtures::schema(self.platform))
    }

    fn is_asynchronous(&self) -> bool {
        !self.synchronous()
    }
}

/// Fixture-backed conversion uploader.
///
/// Lines containing `FAIL` are rejected with a per-record error; lines
/// containing `TIMEOUT` delay the batch by [`SLOW_LINE_DELAY`]. Everything
/// else succeeds.
pub struct MockUploader {
    platform: Platform,
}

impl Default for MockUploader {
    fn default() -> Self {
        Self::new()
    }
}

impl MockUploader {
    /// Mock uploader reporting as Campaign Manager.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            platform: Platform::CampaignManager,
        }
    }
}

#[async_trait]
impl ConversionUploader for MockUploader {
    fn platform(&self) -> Platform {
        self.platform
    }

    async fn submit(&self, lines: &[String], _batch_id: &str) -> BatchResult {
        if lines.iter().any(|l| l.contains("TIMEOUT")) {
            tokio::time::sleep(SLOW_LINE_DELAY).await;
        }
        let mut failures = FailureAccumulator::new();
        for (index, line) in lines.iter().enumerate() {
            if line.contains("FAIL") {
                failures.record(index, [format!("Conversion {index} error: INVALID_GCLID")]);
            }
        }
        failures.finish(lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_report_becomes_ready_after_polls() {
        let job = MockReport::new(Platform::Dv360).with_polls_before_ready(2);
        let params = ReportParameters::new();
        let d = job.generate(&params).await.unwrap();
        assert!(!job.is_ready(&d, &params).await.unwrap());
        assert!(!job.is_ready(&d, &params).await.unwrap());
        assert!(job.is_ready(&d, &params).await.unwrap());
        let csv = job.get_content(&d, &params).await.unwrap();
        assert!(csv.starts_with("Date,Campaign"));
    }

    #[tokio::test]
    async fn synchronous_platforms_capture_content() {
        let job = MockReport::new(Platform::YouTube);
        assert!(!job.is_asynchronous());
        let params = ReportParameters::new();
        let d = job.generate(&params).await.unwrap();
        assert_eq!(d.content().map(str::lines).map(Iterator::count), Some(2));
        assert_eq!(job.generate_schema().unwrap().fields.len(), 2);
    }

    #[tokio::test]
    async fn mock_uploader_rejects_marked_lines() {
        let lines = vec!["{\"gclid\":\"ok\"}".to_string(), "{\"gclid\":\"FAIL\"}".to_string()];
        let r = MockUploader::new().submit(&lines, "b1").await;
        assert!(!r.result);
        assert_eq!(r.failed_lines, Some(vec![lines[1].clone()]));
        assert_eq!(r.errors(), ["INVALID_GCLID".to_string()]);
    }
}
