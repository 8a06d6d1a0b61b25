//! Report configuration: one tagged variant per platform.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::platform::Platform;

/// Campaign Manager report configuration.
///
/// Either `profile_id` or `account_id` must be set; the profile is resolved
/// from the account when only the account is known.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CmReportConfig {
    /// Campaign Manager account id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    /// User profile id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_id: Option<String>,
    /// Saved report to run.
    pub report_id: String,
}

/// DV360 (Bid Manager) report configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dv360ReportConfig {
    /// Saved query to run.
    pub query_id: String,
    /// Optional run-query request body (date range, timezone).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_body: Option<Value>,
}

/// SA360 (DoubleClick Search) report configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sa360ReportConfig {
    /// Report request as accepted by the reports.request endpoint.
    pub request: Value,
}

/// Google Ads report configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdsReportConfig {
    /// Developer token for the Google Ads API.
    pub developer_token: String,
    /// Customer account to query.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    /// Manager account used to log in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login_customer_id: Option<String>,
    /// Report query.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_query: Option<AdsReportQuery>,
}

/// Structured Google Ads report query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdsReportQuery {
    /// Selected attributes, segments and metrics, e.g. `campaign.id`.
    pub fields: Vec<String>,
    /// Resource to select from, e.g. `campaign`.
    pub from: String,
    /// Optional WHERE conditions joined with AND.
    #[serde(default)]
    pub conditions: Vec<String>,
}

impl AdsReportQuery {
    /// Render the query as GAQL.
    #[must_use]
    pub fn to_gaql(&self) -> String {
        let mut q = format!("SELECT {} FROM {}", self.fields.join(", "), self.from);
        if !self.conditions.is_empty() {
            q.push_str(" WHERE ");
            q.push_str(&self.conditions.join(" AND "));
        }
        q
    }
}

/// YouTube report configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YouTubeReportConfig {
    /// Resource to list, e.g. `channel` or `video`.
    pub target: String,
    /// Maximum number of items to return.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_limit: Option<u32>,
    /// List request parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_query: Option<Value>,
}

/// Report configuration tagged by platform.
///
/// Serialized as `{"target": "CM", "config": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "target", content = "config")]
pub enum ReportConfig {
    /// Campaign Manager.
    #[serde(rename = "CM")]
    CampaignManager(CmReportConfig),
    /// Display & Video 360.
    #[serde(rename = "DV360")]
    Dv360(Dv360ReportConfig),
    /// Search Ads 360.
    #[serde(rename = "SA360")]
    Sa360(Sa360ReportConfig),
    /// Google Ads.
    #[serde(rename = "ADS")]
    GoogleAds(AdsReportConfig),
    /// YouTube.
    #[serde(rename = "YT")]
    YouTube(YouTubeReportConfig),
}

impl ReportConfig {
    /// Platform selected by this configuration.
    #[must_use]
    pub const fn platform(&self) -> Platform {
        match self {
            Self::CampaignManager(_) => Platform::CampaignManager,
            Self::Dv360(_) => Platform::Dv360,
            Self::Sa360(_) => Platform::Sa360,
            Self::GoogleAds(_) => Platform::GoogleAds,
            Self::YouTube(_) => Platform::YouTube,
        }
    }
}
