//! Google Ads reports. Queries are answered in one call, so the job is
//! synchronous and the CSV content is captured by `generate`.

use std::sync::Arc;

use adflux_core::report::{captured_content, matches_any};
use adflux_core::{
    AdfluxError, AdsReportConfig, AdsReportQuery, FieldType, JobDescriptor, Platform, ReportJob,
    ReportParameters, TableField, TableSchema,
};
use async_trait::async_trait;
use serde_json::Value;

use crate::adapter::{AdsApi, AdsSearch};

const FATAL_SIGNATURES: &[&str] = &["PERMISSION_DENIED", "INVALID_CUSTOMER_ID", "DEVELOPER_TOKEN"];

/// A synchronous Google Ads report.
pub struct AdsReport {
    api: Arc<dyn AdsApi>,
    config: AdsReportConfig,
    query: AdsReportQuery,
}

impl AdsReport {
    /// Bind a report configuration to an API client.
    ///
    /// # Errors
    /// Returns `AdfluxError::Config` when the developer token or the report
    /// query is missing.
    pub fn new(api: Arc<dyn AdsApi>, config: AdsReportConfig) -> Result<Self, AdfluxError> {
        if config.developer_token.trim().is_empty() {
            return Err(AdfluxError::config("Google Ads report config has no developerToken"));
        }
        let query = config
            .report_query
            .clone()
            .filter(|q| !q.fields.is_empty() && !q.from.is_empty())
            .ok_or_else(|| AdfluxError::config("Google Ads report config has no reportQuery"))?;
        Ok(Self { api, config, query })
    }

    fn search(&self, params: &ReportParameters) -> Result<AdsSearch, AdfluxError> {
        let customer_id = params
            .get("customerId")
            .map(str::to_string)
            .or_else(|| self.config.customer_id.clone())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| AdfluxError::config("no customerId in configuration or parameters"))?;
        Ok(AdsSearch {
            customer_id: customer_id.replace('-', ""),
            login_customer_id: self
                .config
                .login_customer_id
                .as_ref()
                .map(|l| l.replace('-', "")),
            developer_token: self.config.developer_token.clone(),
            query: params.substitute(&self.query.to_gaql()),
        })
    }
}

/// `metrics.cost_micros` becomes `costMicros` as used in result rows.
fn camel(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    let mut upper = false;
    for c in segment.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

fn lookup<'v>(row: &'v Value, field: &str) -> Option<&'v Value> {
    field
        .split('.')
        .try_fold(row, |v, segment| v.get(camel(segment)))
}

fn csv_cell(v: Option<&Value>) -> String {
    let raw = match v {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    };
    if raw.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw
    }
}

/// Render result rows as CSV with one column per selected field.
#[must_use]
pub fn rows_to_csv(fields: &[String], rows: &[Value]) -> String {
    let mut out = fields
        .iter()
        .map(|f| column_name(f))
        .collect::<Vec<_>>()
        .join(",");
    out.push('\n');
    for row in rows {
        let line = fields
            .iter()
            .map(|f| csv_cell(lookup(row, f)))
            .collect::<Vec<_>>()
            .join(",");
        out.push_str(&line);
        out.push('\n');
    }
    out
}

fn column_name(field: &str) -> String {
    field.replace('.', "_")
}

fn column_type(field: &str) -> FieldType {
    let leaf = field.rsplit('.').next().unwrap_or(field);
    if field == "segments.date" {
        FieldType::Date
    } else if leaf == "id"
        || leaf.ends_with("_micros")
        || (field.starts_with("metrics.")
            && matches!(leaf, "clicks" | "impressions" | "interactions"))
    {
        FieldType::Integer
    } else if field.starts_with("metrics.") {
        FieldType::Float
    } else {
        FieldType::String
    }
}

#[async_trait]
impl ReportJob for AdsReport {
    fn platform(&self) -> Platform {
        Platform::GoogleAds
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "adflux_platforms::ads::generate", skip(self, params), fields(from = %self.query.from))
    )]
    async fn generate(&self, params: &ReportParameters) -> Result<JobDescriptor, AdfluxError> {
        let search = self.search(params)?;
        let rows = self.api.search(&search).await?;
        #[cfg(feature = "tracing")]
        tracing::debug!(rows = rows.len(), customer_id = %search.customer_id, "Google Ads rows fetched");
        Ok(JobDescriptor::completed(rows_to_csv(&self.query.fields, &rows))
            .with("customerId", search.customer_id))
    }

    async fn get_content(
        &self,
        job: &JobDescriptor,
        _params: &ReportParameters,
    ) -> Result<String, AdfluxError> {
        captured_content(job)
    }

    fn is_fatal_error(&self, message: &str) -> bool {
        matches_any(message, FATAL_SIGNATURES)
    }

    fn generate_schema(&self) -> Result<TableSchema, AdfluxError> {
        Ok(TableSchema::new(
            self.query
                .fields
                .iter()
                .map(|f| TableField::new(column_name(f), column_type(f)))
                .collect(),
        ))
    }

    fn is_asynchronous(&self) -> bool {
        false
    }
}
