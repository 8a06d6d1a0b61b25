use adflux_core::report::matches_any;
use adflux_core::{
    AdfluxError, FieldType, JobDescriptor, Platform, ProfileLookup, ProfileSelector,
    ReportJob, ReportParameters, TableField, TableSchema, UserProfile, resolve_profile_id,
};
use async_trait::async_trait;

use crate::adapter::{CmProfiles, CmReports, ReportFile};
use crate::{ProfilesAdapter, ReportsAdapter};

/// Status of a report file that is still being generated.
pub const STATUS_PROCESSING: &str = "PROCESSING";
/// Status of a report file that can be downloaded.
pub const STATUS_AVAILABLE: &str = "REPORT_AVAILABLE";

/// Error fragments that rerunning the report cannot fix.
const FATAL_SIGNATURES: &[&str] = &[
    "status 401",
    "status 403",
    "status 404",
    "PERMISSION_DENIED",
    "NOT_FOUND",
    "UNAUTHENTICATED",
];

const KEY_PROFILE: &str = "profileId";
const KEY_REPORT: &str = "reportId";
const KEY_FILE: &str = "fileId";

/// A saved Campaign Manager report run asynchronously.
///
/// `generate` resolves the profile and starts a run; the returned descriptor
/// carries `profileId`, `reportId` and `fileId` so later calls never list
/// profiles again.
pub struct CmReport {
    pub(crate) profiles: ProfilesAdapter,
    pub(crate) reports: ReportsAdapter,
    pub(crate) selector: ProfileSelector,
    pub(crate) report_id: String,
    pub(crate) schema: TableSchema,
}

impl CmReport {
    /// Replace the load schema of this report's CSV content.
    #[must_use]
    pub fn with_schema(mut self, schema: TableSchema) -> Self {
        self.schema = schema;
        self
    }

    async fn file(&self, job: &JobDescriptor) -> Result<ReportFile, AdfluxError> {
        self.reports
            .get_file(
                job.require(KEY_PROFILE)?,
                job.require(KEY_REPORT)?,
                job.require(KEY_FILE)?,
            )
            .await
    }
}

/// Default columns of a standard delivery report.
#[must_use]
pub fn default_schema() -> TableSchema {
    TableSchema::new(vec![
        TableField::new("Date", FieldType::Date),
        TableField::new("Advertiser", FieldType::String),
        TableField::new("Advertiser_ID", FieldType::Integer),
        TableField::new("Campaign", FieldType::String),
        TableField::new("Campaign_ID", FieldType::Integer),
        TableField::new("Placement", FieldType::String),
        TableField::new("Placement_ID", FieldType::Integer),
        TableField::new("Impressions", FieldType::Integer),
        TableField::new("Clicks", FieldType::Integer),
        TableField::new("Media_Cost", FieldType::Float),
    ])
}

struct Lookup<'a>(&'a dyn CmProfiles);

#[async_trait]
impl ProfileLookup for Lookup<'_> {
    async fn list_user_profiles(&self) -> Result<Vec<UserProfile>, AdfluxError> {
        self.0.list_user_profiles().await
    }
}

#[async_trait]
impl ReportJob for CmReport {
    fn platform(&self) -> Platform {
        Platform::CampaignManager
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "adflux_cm::report::generate", skip(self, _params), fields(report_id = %self.report_id))
    )]
    async fn generate(&self, _params: &ReportParameters) -> Result<JobDescriptor, AdfluxError> {
        let profile_id = resolve_profile_id(&self.selector, &Lookup(&*self.profiles)).await?;
        let file = self.reports.run_report(&profile_id, &self.report_id).await?;
        if file.id.is_empty() {
            return Err(AdfluxError::Data("reports.run returned no file id".into()));
        }
        Ok(JobDescriptor::new()
            .with(KEY_PROFILE, profile_id)
            .with(KEY_REPORT, self.report_id.clone())
            .with(KEY_FILE, file.id))
    }

    async fn is_ready(
        &self,
        job: &JobDescriptor,
        _params: &ReportParameters,
    ) -> Result<bool, AdfluxError> {
        let file = self.file(job).await?;
        #[cfg(feature = "tracing")]
        tracing::debug!(file_id = %file.id, status = %file.status, "CM report file status");
        match file.status.as_str() {
            STATUS_PROCESSING => Ok(false),
            STATUS_AVAILABLE => Ok(true),
            other => Err(AdfluxError::unsupported_status("CM", other)),
        }
    }

    async fn get_content(
        &self,
        job: &JobDescriptor,
        _params: &ReportParameters,
    ) -> Result<String, AdfluxError> {
        let file = self.file(job).await?;
        if file.status != STATUS_AVAILABLE {
            return Err(AdfluxError::unsupported_status("CM", file.status));
        }
        let url = file
            .api_url()
            .ok_or_else(|| AdfluxError::Data(format!("report file {} has no apiUrl", file.id)))?;
        self.reports.download(url).await
    }

    fn is_fatal_error(&self, message: &str) -> bool {
        matches_any(message, FATAL_SIGNATURES)
    }

    fn generate_schema(&self) -> Result<TableSchema, AdfluxError> {
        Ok(self.schema.clone())
    }
}
