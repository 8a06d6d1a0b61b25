//! Display & Video 360 reports, run from saved Bid Manager queries.

use std::sync::Arc;

use adflux_core::report::matches_any;
use adflux_core::{
    AdfluxError, Dv360ReportConfig, FieldType, JobDescriptor, Platform, ReportJob,
    ReportParameters, TableField, TableSchema,
};
use async_trait::async_trait;
use serde_json::Value;

use crate::adapter::Dv360Api;

const FATAL_SIGNATURES: &[&str] = &["status 404", "PERMISSION_DENIED"];

/// An asynchronous DV360 report.
pub struct Dv360Report {
    api: Arc<dyn Dv360Api>,
    config: Dv360ReportConfig,
}

impl Dv360Report {
    /// Bind a report configuration to an API client.
    ///
    /// # Errors
    /// Returns `AdfluxError::Config` when the query id is empty.
    pub fn new(api: Arc<dyn Dv360Api>, config: Dv360ReportConfig) -> Result<Self, AdfluxError> {
        if config.query_id.trim().is_empty() {
            return Err(AdfluxError::config("DV360 report config has an empty queryId"));
        }
        Ok(Self { api, config })
    }

    /// Render the run request body, filling `${key}` placeholders in string
    /// values from the run parameters.
    fn request_body(&self, params: &ReportParameters) -> Option<Value> {
        self.config.request_body.as_ref().map(|b| fill(b, params))
    }
}

fn fill(v: &Value, params: &ReportParameters) -> Value {
    match v {
        Value::String(s) => Value::String(params.substitute(s)),
        Value::Array(items) => Value::Array(items.iter().map(|i| fill(i, params)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), fill(v, params)))
                .collect(),
        ),
        other => other.clone(),
    }
}

#[async_trait]
impl ReportJob for Dv360Report {
    fn platform(&self) -> Platform {
        Platform::Dv360
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "adflux_platforms::dv360::generate", skip(self, params), fields(query_id = %self.config.query_id))
    )]
    async fn generate(&self, params: &ReportParameters) -> Result<JobDescriptor, AdfluxError> {
        let body = self.request_body(params);
        let report = self
            .api
            .run_query(&self.config.query_id, body.as_ref())
            .await?;
        if report.report_id.is_empty() {
            return Err(AdfluxError::Data("queries.run returned no report id".into()));
        }
        let query_id = if report.query_id.is_empty() {
            self.config.query_id.clone()
        } else {
            report.query_id
        };
        Ok(JobDescriptor::new()
            .with("queryId", query_id)
            .with("reportId", report.report_id))
    }

    async fn is_ready(
        &self,
        job: &JobDescriptor,
        _params: &ReportParameters,
    ) -> Result<bool, AdfluxError> {
        let report = self
            .api
            .get_report(job.require("queryId")?, job.require("reportId")?)
            .await?;
        #[cfg(feature = "tracing")]
        tracing::debug!(report_id = %report.report_id, state = %report.state, "DV360 report state");
        match report.state.as_str() {
            "QUEUED" | "RUNNING" => Ok(false),
            "DONE" => Ok(true),
            other => Err(AdfluxError::unsupported_status("DV360", other)),
        }
    }

    async fn get_content(
        &self,
        job: &JobDescriptor,
        _params: &ReportParameters,
    ) -> Result<String, AdfluxError> {
        let report = self
            .api
            .get_report(job.require("queryId")?, job.require("reportId")?)
            .await?;
        let path = report.gcs_path.filter(|p| !p.is_empty()).ok_or_else(|| {
            AdfluxError::Data(format!(
                "DV360 report {} has no storage path",
                report.report_id
            ))
        })?;
        self.api.download(&path).await
    }

    fn is_fatal_error(&self, message: &str) -> bool {
        matches_any(message, FATAL_SIGNATURES)
    }

    fn generate_schema(&self) -> Result<TableSchema, AdfluxError> {
        Ok(TableSchema::new(vec![
            TableField::new("Date", FieldType::Date),
            TableField::new("Advertiser_ID", FieldType::Integer),
            TableField::new("Advertiser", FieldType::String),
            TableField::new("Insertion_Order_ID", FieldType::Integer),
            TableField::new("Insertion_Order", FieldType::String),
            TableField::new("Line_Item_ID", FieldType::Integer),
            TableField::new("Line_Item", FieldType::String),
            TableField::new("Impressions", FieldType::Integer),
            TableField::new("Clicks", FieldType::Integer),
            TableField::new("Revenue_Adv_Currency", FieldType::Float),
        ]))
    }
}
