//! adflux-cm
//!
//! Campaign Manager connector. [`CmConnector`] holds the REST adapters and
//! hands out two kinds of workers:
//!
//! - [`CmUploader`], a [`ConversionUploader`] bound to one validated
//!   [`BatchConfig`], which submits `conversions.batchinsert` requests and
//!   reconciles per-record failures;
//! - [`CmReport`], a [`ReportJob`](adflux_core::ReportJob) that runs a saved
//!   report and downloads the file once it is available.
#![warn(missing_docs)]

/// Adapter definitions and the production adapter backed by `reqwest`.
pub mod adapter;
mod report;
mod upload;

use std::sync::Arc;

#[cfg(feature = "test-adapters")]
use adapter::CloneArcAdapters;
use adapter::{CmProfiles, RealAdapter};
#[cfg(feature = "test-adapters")]
use adapter::{CmConversions, CmReports};
use adflux_core::{
    AdfluxError, BatchConfig, Clock, CmReportConfig, ConversionUploader, ProfileSelector,
    SystemClock,
};

pub use report::{CmReport, STATUS_AVAILABLE, STATUS_PROCESSING, default_schema};
pub use upload::CmUploader;

#[cfg(not(feature = "test-adapters"))]
type AdapterArc = Arc<RealAdapter>;

#[cfg(feature = "test-adapters")]
pub(crate) type ConversionsAdapter = Arc<dyn CmConversions>;
#[cfg(not(feature = "test-adapters"))]
pub(crate) type ConversionsAdapter = AdapterArc;

#[cfg(feature = "test-adapters")]
pub(crate) type ProfilesAdapter = Arc<dyn CmProfiles>;
#[cfg(not(feature = "test-adapters"))]
pub(crate) type ProfilesAdapter = AdapterArc;

#[cfg(feature = "test-adapters")]
pub(crate) type ReportsAdapter = Arc<dyn CmReports>;
#[cfg(not(feature = "test-adapters"))]
pub(crate) type ReportsAdapter = AdapterArc;

/// Public connector type. Production users construct it with
/// [`CmConnector::new_default`] or [`CmConnector::new_with_adapter`].
#[derive(Clone)]
pub struct CmConnector {
    conversions: ConversionsAdapter,
    profiles: ProfilesAdapter,
    reports: ReportsAdapter,
    clock: Arc<dyn Clock>,
}

impl CmConnector {
    /// Build against the public endpoint with a bearer token.
    #[must_use]
    pub fn new_default(token: impl Into<String>) -> Self {
        Self::new_with_adapter(&RealAdapter::new_default(token))
    }

    /// Build from a configured [`RealAdapter`], e.g. one pointed at a mock server.
    #[must_use]
    pub fn new_with_adapter(adapter: &RealAdapter) -> Self {
        #[cfg(feature = "test-adapters")]
        {
            Self::from_adapter(adapter)
        }
        #[cfg(not(feature = "test-adapters"))]
        {
            let shared = Arc::new(adapter.clone());
            Self {
                conversions: Arc::clone(&shared),
                profiles: Arc::clone(&shared),
                reports: shared,
                clock: Arc::new(SystemClock),
            }
        }
    }

    /// For tests/injection (requires the `test-adapters` feature).
    ///
    /// Accepts a borrowed adapter to avoid unnecessary moves.
    #[cfg(feature = "test-adapters")]
    pub fn from_adapter<A: CloneArcAdapters + 'static>(adapter: &A) -> Self {
        Self {
            conversions: adapter.clone_arc_conversions(),
            profiles: adapter.clone_arc_profiles(),
            reports: adapter.clone_arc_reports(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the clock that seeds per-batch defaults.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Create an uploader bound to `config`.
    ///
    /// # Errors
    /// Returns `AdfluxError::Config` when the configuration violates its
    /// invariants (see [`BatchConfig::validate`]). No remote call is made.
    pub fn uploader(&self, config: BatchConfig) -> Result<CmUploader, AdfluxError> {
        config.validate()?;
        Ok(CmUploader {
            conversions: Arc::clone(&self.conversions),
            clock: Arc::clone(&self.clock),
            config,
        })
    }

    /// Same as [`CmConnector::uploader`], boxed behind the uploader trait.
    ///
    /// # Errors
    /// See [`CmConnector::uploader`].
    pub fn dyn_uploader(
        &self,
        config: BatchConfig,
    ) -> Result<Arc<dyn ConversionUploader>, AdfluxError> {
        Ok(Arc::new(self.uploader(config)?))
    }

    /// Create a report job for a saved report.
    ///
    /// # Errors
    /// Returns `AdfluxError::Config` when the report id is empty or when
    /// neither a profile id nor an account id is configured.
    pub fn report(&self, config: &CmReportConfig) -> Result<CmReport, AdfluxError> {
        if config.report_id.trim().is_empty() {
            return Err(AdfluxError::config("CM report config has an empty reportId"));
        }
        let selector = ProfileSelector::from_ids(
            config.profile_id.as_deref(),
            config.account_id.as_deref(),
        )?;
        Ok(CmReport {
            profiles: Arc::clone(&self.profiles),
            reports: Arc::clone(&self.reports),
            selector,
            report_id: config.report_id.clone(),
            schema: default_schema(),
        })
    }

    /// Describe every user profile visible to the caller, one line each.
    ///
    /// # Errors
    /// Propagates the profile listing failure.
    pub async fn describe_profiles(&self) -> Result<Vec<String>, AdfluxError> {
        let profiles = self.profiles.list_user_profiles().await?;
        Ok(profiles
            .into_iter()
            .map(|p| {
                format!(
                    "Profile: {}[{}] Account: {}[{}]",
                    p.profile_id, p.user_name, p.account_id, p.account_name
                )
            })
            .collect())
    }
}
