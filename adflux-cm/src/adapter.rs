#[cfg(feature = "test-adapters")]
use std::sync::Arc;

use adflux_core::conversion::ConversionsRequest;
use adflux_core::{AdfluxError, RecordStatus, UserProfile};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

/// Campaign Manager REST endpoint used when no override is configured.
pub const DEFAULT_BASE_URL: &str = "https://dfareporting.googleapis.com/dfareporting/v3.5/";

/// Response of `conversions.batchinsert`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchInsertResponse {
    /// Whether any conversion of the request failed.
    #[serde(default)]
    pub has_failures: bool,
    /// One status per submitted conversion, in request order.
    #[serde(default)]
    pub status: Vec<RecordStatus>,
}

/// A report file as returned by `reports.run` and `reports.files.get`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportFile {
    /// File id.
    pub id: String,
    /// Processing status, e.g. `PROCESSING` or `REPORT_AVAILABLE`.
    pub status: String,
    /// Download locations, set once the file is available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urls: Option<ReportFileUrls>,
}

impl ReportFile {
    /// Authenticated download URL, if the file has one.
    #[must_use]
    pub fn api_url(&self) -> Option<&str> {
        self.urls.as_ref().and_then(|u| u.api_url.as_deref())
    }
}

/// Download locations of a report file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportFileUrls {
    /// URL for authenticated API download.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    /// URL for browser download.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub browser_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct UserProfileList {
    #[serde(default)]
    items: Vec<UserProfile>,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorBody {
    error: GoogleErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorDetail {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

/// Conversion upload abstraction (so we can inject mocks in tests).
#[async_trait]
pub trait CmConversions: Send + Sync {
    /// Insert one batch of conversions for `profile_id`.
    async fn batch_insert(
        &self,
        profile_id: &str,
        request: &ConversionsRequest,
    ) -> Result<BatchInsertResponse, AdfluxError>;
}

/// User profile listing abstraction.
#[async_trait]
pub trait CmProfiles: Send + Sync {
    /// List every user profile of the authenticated caller.
    async fn list_user_profiles(&self) -> Result<Vec<UserProfile>, AdfluxError>;
}

/// Report run, status and download abstraction.
#[async_trait]
pub trait CmReports: Send + Sync {
    /// Start an asynchronous run of a saved report.
    async fn run_report(&self, profile_id: &str, report_id: &str)
    -> Result<ReportFile, AdfluxError>;

    /// Read the current state of a report file.
    async fn get_file(
        &self,
        profile_id: &str,
        report_id: &str,
        file_id: &str,
    ) -> Result<ReportFile, AdfluxError>;

    /// Download a report file from its API URL.
    async fn download(&self, api_url: &str) -> Result<String, AdfluxError>;
}

/// Real adapter backed by a `reqwest::Client` and a bearer token.
/// `reqwest::Client` is `Clone + Send + Sync`, so no external locking is needed.
#[derive(Clone)]
pub struct RealAdapter {
    http: reqwest::Client,
    base: Url,
    token: String,
}

impl std::fmt::Debug for RealAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealAdapter")
            .field("base", &self.base.as_str())
            .finish_non_exhaustive()
    }
}

impl RealAdapter {
    /// Build with a fresh HTTP client against the public endpoint.
    ///
    /// # Panics
    /// Panics if the built-in base URL fails to parse, which cannot happen
    /// for the constant shipped with this crate.
    #[must_use]
    pub fn new_default(token: impl Into<String>) -> Self {
        Self::new(reqwest::Client::new(), token)
    }

    /// Wrap an existing HTTP client.
    ///
    /// # Panics
    /// See [`RealAdapter::new_default`].
    #[must_use]
    pub fn new(http: reqwest::Client, token: impl Into<String>) -> Self {
        Self {
            http,
            base: Url::parse(DEFAULT_BASE_URL).expect("built-in Campaign Manager URL is valid"),
            token: token.into(),
        }
    }

    /// Point the adapter at another endpoint, e.g. a local mock server.
    ///
    /// # Errors
    /// Returns `AdfluxError::Config` if `base` is not an absolute URL.
    pub fn with_base_url(mut self, base: &str) -> Result<Self, AdfluxError> {
        let url = Url::parse(base)
            .map_err(|e| AdfluxError::config(format!("invalid CM base URL {base}: {e}")))?;
        if url.cannot_be_a_base() {
            return Err(AdfluxError::config(format!(
                "CM base URL {base} cannot carry a path"
            )));
        }
        self.base = url;
        Ok(self)
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, AdfluxError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| AdfluxError::config("CM base URL cannot carry a path"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send_text(
        &self,
        req: reqwest::RequestBuilder,
        context: &str,
    ) -> Result<String, AdfluxError> {
        let resp = req
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| map_reqwest_err(&e, context))?;
        let status = resp.status();
        let body = resp.text().await.map_err(|e| map_reqwest_err(&e, context))?;
        if !status.is_success() {
            return Err(map_status_err(status, &body, context));
        }
        Ok(body)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        req: reqwest::RequestBuilder,
        context: &str,
    ) -> Result<T, AdfluxError> {
        let body = self.send_text(req, context).await?;
        serde_json::from_str(&body)
            .map_err(|e| AdfluxError::Data(format!("malformed {context} response: {e}")))
    }
}

fn map_reqwest_err(e: &reqwest::Error, context: &str) -> AdfluxError {
    if e.is_timeout() {
        AdfluxError::transport("CM", format!("timeout: {context}"))
    } else if e.is_connect() {
        AdfluxError::transport("CM", format!("connect failed: {context}: {e}"))
    } else {
        AdfluxError::transport("CM", format!("{context}: {e}"))
    }
}

fn map_status_err(status: reqwest::StatusCode, body: &str, context: &str) -> AdfluxError {
    let detail = serde_json::from_str::<GoogleErrorBody>(body).map_or_else(
        |_| body.trim().to_string(),
        |b| match b.error.status {
            Some(s) => format!("{s}: {}", b.error.message),
            None => b.error.message,
        },
    );
    AdfluxError::transport(
        "CM",
        format!("status {}: {context}: {detail}", status.as_u16()),
    )
}

#[async_trait]
impl CmConversions for RealAdapter {
    async fn batch_insert(
        &self,
        profile_id: &str,
        request: &ConversionsRequest,
    ) -> Result<BatchInsertResponse, AdfluxError> {
        let url = self.endpoint(&["userprofiles", profile_id, "conversions", "batchinsert"])?;
        self.send_json(self.http.post(url).json(request), "conversions.batchinsert")
            .await
    }
}

#[async_trait]
impl CmProfiles for RealAdapter {
    async fn list_user_profiles(&self) -> Result<Vec<UserProfile>, AdfluxError> {
        let url = self.endpoint(&["userprofiles"])?;
        let list: UserProfileList = self.send_json(self.http.get(url), "userProfiles.list").await?;
        Ok(list.items)
    }
}

#[async_trait]
impl CmReports for RealAdapter {
    async fn run_report(
        &self,
        profile_id: &str,
        report_id: &str,
    ) -> Result<ReportFile, AdfluxError> {
        let mut url = self.endpoint(&["userprofiles", profile_id, "reports", report_id, "run"])?;
        url.query_pairs_mut().append_pair("synchronous", "false");
        self.send_json(self.http.post(url), "reports.run").await
    }

    async fn get_file(
        &self,
        profile_id: &str,
        report_id: &str,
        file_id: &str,
    ) -> Result<ReportFile, AdfluxError> {
        let url = self.endpoint(&[
            "userprofiles",
            profile_id,
            "reports",
            report_id,
            "files",
            file_id,
        ])?;
        self.send_json(self.http.get(url), "reports.files.get").await
    }

    async fn download(&self, api_url: &str) -> Result<String, AdfluxError> {
        let url = Url::parse(api_url)
            .map_err(|e| AdfluxError::Data(format!("invalid report file URL {api_url}: {e}")))?;
        self.send_text(self.http.get(url), "report file download")
            .await
    }
}

/* -------- Test-only lightweight adapter constructors ------- */

#[cfg(feature = "test-adapters")]
impl dyn CmConversions {
    /// Build a `CmConversions` from a closure (tests only).
    pub fn from_fn<F>(f: F) -> Arc<dyn CmConversions>
    where
        F: Send
            + Sync
            + 'static
            + Fn(String, ConversionsRequest) -> Result<BatchInsertResponse, AdfluxError>,
    {
        struct FnConversions<F>(F);
        #[async_trait]
        impl<F> CmConversions for FnConversions<F>
        where
            F: Send
                + Sync
                + 'static
                + Fn(String, ConversionsRequest) -> Result<BatchInsertResponse, AdfluxError>,
        {
            async fn batch_insert(
                &self,
                profile_id: &str,
                request: &ConversionsRequest,
            ) -> Result<BatchInsertResponse, AdfluxError> {
                (self.0)(profile_id.to_string(), request.clone())
            }
        }
        Arc::new(FnConversions(f))
    }
}

#[cfg(feature = "test-adapters")]
impl dyn CmProfiles {
    /// Build a `CmProfiles` from a closure (tests only).
    pub fn from_fn<F>(f: F) -> Arc<dyn CmProfiles>
    where
        F: Send + Sync + 'static + Fn() -> Result<Vec<UserProfile>, AdfluxError>,
    {
        struct FnProfiles<F>(F);
        #[async_trait]
        impl<F> CmProfiles for FnProfiles<F>
        where
            F: Send + Sync + 'static + Fn() -> Result<Vec<UserProfile>, AdfluxError>,
        {
            async fn list_user_profiles(&self) -> Result<Vec<UserProfile>, AdfluxError> {
                (self.0)()
            }
        }
        Arc::new(FnProfiles(f))
    }
}

#[cfg(feature = "test-adapters")]
impl dyn CmReports {
    /// Build a `CmReports` from closures (tests only).
    pub fn from_fns<FRun, FGet, FDown>(frun: FRun, fget: FGet, fdown: FDown) -> Arc<dyn CmReports>
    where
        FRun: Send + Sync + 'static + Fn(String, String) -> Result<ReportFile, AdfluxError>,
        FGet: Send + Sync + 'static + Fn(String, String, String) -> Result<ReportFile, AdfluxError>,
        FDown: Send + Sync + 'static + Fn(String) -> Result<String, AdfluxError>,
    {
        struct FnReports<FRun, FGet, FDown> {
            frun: FRun,
            fget: FGet,
            fdown: FDown,
        }
        #[async_trait]
        impl<FRun, FGet, FDown> CmReports for FnReports<FRun, FGet, FDown>
        where
            FRun: Send + Sync + 'static + Fn(String, String) -> Result<ReportFile, AdfluxError>,
            FGet: Send
                + Sync
                + 'static
                + Fn(String, String, String) -> Result<ReportFile, AdfluxError>,
            FDown: Send + Sync + 'static + Fn(String) -> Result<String, AdfluxError>,
        {
            async fn run_report(
                &self,
                profile_id: &str,
                report_id: &str,
            ) -> Result<ReportFile, AdfluxError> {
                (self.frun)(profile_id.to_string(), report_id.to_string())
            }
            async fn get_file(
                &self,
                profile_id: &str,
                report_id: &str,
                file_id: &str,
            ) -> Result<ReportFile, AdfluxError> {
                (self.fget)(
                    profile_id.to_string(),
                    report_id.to_string(),
                    file_id.to_string(),
                )
            }
            async fn download(&self, api_url: &str) -> Result<String, AdfluxError> {
                (self.fdown)(api_url.to_string())
            }
        }
        Arc::new(FnReports { frun, fget, fdown })
    }
}

/// Helper trait to split a concrete adapter into arc trait objects.
#[cfg(feature = "test-adapters")]
pub trait CloneArcAdapters {
    /// Clone as `Arc<dyn CmConversions>`.
    fn clone_arc_conversions(&self) -> Arc<dyn CmConversions> {
        <dyn CmConversions>::from_fn(|_, _| Err(AdfluxError::unimplemented("conversions")))
    }
    /// Clone as `Arc<dyn CmProfiles>`.
    fn clone_arc_profiles(&self) -> Arc<dyn CmProfiles> {
        <dyn CmProfiles>::from_fn(|| Err(AdfluxError::unimplemented("userprofiles")))
    }
    /// Clone as `Arc<dyn CmReports>`.
    fn clone_arc_reports(&self) -> Arc<dyn CmReports> {
        <dyn CmReports>::from_fns(
            |_, _| Err(AdfluxError::unimplemented("reports/run")),
            |_, _, _| Err(AdfluxError::unimplemented("reports/files")),
            |_| Err(AdfluxError::unimplemented("reports/download")),
        )
    }
}

#[cfg(feature = "test-adapters")]
impl CloneArcAdapters for RealAdapter {
    fn clone_arc_conversions(&self) -> Arc<dyn CmConversions> {
        Arc::new(self.clone()) as Arc<dyn CmConversions>
    }
    fn clone_arc_profiles(&self) -> Arc<dyn CmProfiles> {
        Arc::new(self.clone()) as Arc<dyn CmProfiles>
    }
    fn clone_arc_reports(&self) -> Arc<dyn CmReports> {
        Arc::new(self.clone()) as Arc<dyn CmReports>
    }
}
