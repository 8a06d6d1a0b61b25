//! Search Ads 360 reports requested through DoubleClick Search.

use std::sync::Arc;

use adflux_core::report::matches_any;
use adflux_core::{
    AdfluxError, FieldType, JobDescriptor, Platform, ReportJob, ReportParameters,
    Sa360ReportConfig, TableField, TableSchema,
};
use async_trait::async_trait;
use serde_json::Value;

use crate::adapter::Sa360Api;

const FATAL_SIGNATURES: &[&str] = &["PERMISSION_DENIED"];

/// An asynchronous SA360 report.
pub struct Sa360Report {
    api: Arc<dyn Sa360Api>,
    config: Sa360ReportConfig,
}

impl Sa360Report {
    /// Bind a report configuration to an API client.
    ///
    /// # Errors
    /// Returns `AdfluxError::Config` when the request is not a JSON object.
    pub fn new(api: Arc<dyn Sa360Api>, config: Sa360ReportConfig) -> Result<Self, AdfluxError> {
        if !config.request.is_object() {
            return Err(AdfluxError::config("SA360 report request must be a JSON object"));
        }
        Ok(Self { api, config })
    }

    fn request(&self, params: &ReportParameters) -> Value {
        let mut request = self.config.request.clone();
        // Run parameters set the time range unless the request pins one.
        if let (Some(obj), Some(start), Some(end)) = (
            request.as_object_mut(),
            params.get("startDate"),
            params.get("endDate"),
        ) {
            obj.entry("timeRange").or_insert_with(|| {
                serde_json::json!({ "startDate": start, "endDate": end })
            });
        }
        request
    }
}

/// Join report fragments, keeping the header line of the first one only.
#[must_use]
pub fn merge_fragments(fragments: &[String]) -> String {
    let mut out = String::new();
    for (i, fragment) in fragments.iter().enumerate() {
        let body = if i == 0 {
            fragment.as_str()
        } else {
            fragment.split_once('\n').map_or("", |(_, rest)| rest)
        };
        if !out.is_empty() && !out.ends_with('\n') && !body.is_empty() {
            out.push('\n');
        }
        out.push_str(body);
    }
    out
}

#[async_trait]
impl ReportJob for Sa360Report {
    fn platform(&self) -> Platform {
        Platform::Sa360
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "adflux_platforms::sa360::generate", skip(self, params))
    )]
    async fn generate(&self, params: &ReportParameters) -> Result<JobDescriptor, AdfluxError> {
        let report = self.api.request_report(&self.request(params)).await?;
        if report.id.is_empty() {
            return Err(AdfluxError::Data("reports.request returned no report id".into()));
        }
        Ok(JobDescriptor::new().with("reportId", report.id))
    }

    async fn is_ready(
        &self,
        job: &JobDescriptor,
        _params: &ReportParameters,
    ) -> Result<bool, AdfluxError> {
        let report = self.api.get_report(job.require("reportId")?).await?;
        #[cfg(feature = "tracing")]
        tracing::debug!(report_id = %report.id, ready = report.is_report_ready, "SA360 report state");
        Ok(report.is_report_ready)
    }

    async fn get_content(
        &self,
        job: &JobDescriptor,
        _params: &ReportParameters,
    ) -> Result<String, AdfluxError> {
        let report_id = job.require("reportId")?;
        let report = self.api.get_report(report_id).await?;
        if !report.is_report_ready {
            return Err(AdfluxError::unsupported_status("SA360", "NOT_READY"));
        }
        let mut fragments = Vec::with_capacity(report.files.len());
        for index in 0..report.files.len() {
            fragments.push(self.api.get_fragment(report_id, index).await?);
        }
        Ok(merge_fragments(&fragments))
    }

    fn is_fatal_error(&self, message: &str) -> bool {
        matches_any(message, FATAL_SIGNATURES)
    }

    fn generate_schema(&self) -> Result<TableSchema, AdfluxError> {
        let columns = self
            .config
            .request
            .get("columns")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();
        if columns.is_empty() {
            return Err(AdfluxError::config("SA360 report request declares no columns"));
        }
        let fields = columns
            .iter()
            .filter_map(|c| {
                c.get("columnName")
                    .or_else(|| c.get("savedColumnName"))
                    .and_then(Value::as_str)
            })
            .map(|name| TableField::new(name, column_type(name)))
            .collect();
        Ok(TableSchema::new(fields))
    }
}

fn column_type(name: &str) -> FieldType {
    match name {
        "date" => FieldType::Date,
        "impr" | "clicks" | "visits" => FieldType::Integer,
        "cost" | "ctr" | "avgCpc" | "avgPos" | "dfaRevenue" | "dfaTransactions" => {
            FieldType::Float
        }
        n if n.ends_with("Id") => FieldType::Integer,
        _ => FieldType::String,
    }
}
