#[cfg(feature = "test-adapters")]
use std::sync::Arc;

use std::collections::BTreeMap;

use adflux_core::{AdfluxError, Platform};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

/// Bid Manager endpoint.
pub const DV360_BASE_URL: &str = "https://doubleclickbidmanager.googleapis.com/v2/";
/// DoubleClick Search endpoint.
pub const SA360_BASE_URL: &str = "https://www.googleapis.com/doubleclicksearch/v2/";
/// Google Ads endpoint.
pub const ADS_BASE_URL: &str = "https://googleads.googleapis.com/v17/";
/// YouTube Data endpoint.
pub const YOUTUBE_BASE_URL: &str = "https://www.googleapis.com/youtube/v3/";

/// State of one DV360 report run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dv360Run {
    /// Query the report belongs to.
    pub query_id: String,
    /// Report id.
    pub report_id: String,
    /// Run state, e.g. `QUEUED`, `RUNNING`, `DONE` or `FAILED`.
    pub state: String,
    /// Cloud Storage download path once the report is done.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gcs_path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Dv360Wire {
    #[serde(default)]
    key: Dv360Key,
    #[serde(default)]
    metadata: Dv360Metadata,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Dv360Key {
    #[serde(default)]
    query_id: String,
    #[serde(default)]
    report_id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Dv360Metadata {
    #[serde(default)]
    status: Dv360Status,
    #[serde(default)]
    google_cloud_storage_path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Dv360Status {
    #[serde(default)]
    state: String,
}

impl From<Dv360Wire> for Dv360Run {
    fn from(w: Dv360Wire) -> Self {
        Self {
            query_id: w.key.query_id,
            report_id: w.key.report_id,
            state: w.metadata.status.state,
            gcs_path: w.metadata.google_cloud_storage_path,
        }
    }
}

/// State of one SA360 report request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sa360Status {
    /// Report id.
    pub id: String,
    /// Whether every fragment can be downloaded.
    #[serde(default)]
    pub is_report_ready: bool,
    /// Fragments of the report, in order.
    #[serde(default)]
    pub files: Vec<Sa360File>,
}

/// One downloadable fragment of an SA360 report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sa360File {
    /// Download URL.
    #[serde(default)]
    pub url: String,
    /// Fragment size in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub byte_count: Option<String>,
}

/// One Google Ads search request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdsSearch {
    /// Customer account to query.
    pub customer_id: String,
    /// Manager account used to log in.
    pub login_customer_id: Option<String>,
    /// Developer token.
    pub developer_token: String,
    /// GAQL query.
    pub query: String,
}

/// One page of a YouTube list call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YouTubePage {
    /// Resources on this page.
    #[serde(default)]
    pub items: Vec<Value>,
    /// Token of the next page, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
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

#[derive(Debug, Default, Deserialize)]
struct AdsStreamBatch {
    #[serde(default)]
    results: Vec<Value>,
}

/// Bid Manager abstraction (so we can inject mocks in tests).
#[async_trait]
pub trait Dv360Api: Send + Sync {
    /// Run a saved query, optionally with a run request body.
    async fn run_query(
        &self,
        query_id: &str,
        body: Option<&Value>,
    ) -> Result<Dv360Run, AdfluxError>;
    /// Read one report of a query.
    async fn get_report(&self, query_id: &str, report_id: &str)
    -> Result<Dv360Run, AdfluxError>;
    /// Download a finished report file.
    async fn download(&self, url: &str) -> Result<String, AdfluxError>;
}

/// DoubleClick Search abstraction.
#[async_trait]
pub trait Sa360Api: Send + Sync {
    /// Request an asynchronous report.
    async fn request_report(&self, request: &Value) -> Result<Sa360Status, AdfluxError>;
    /// Read the state of a report.
    async fn get_report(&self, report_id: &str) -> Result<Sa360Status, AdfluxError>;
    /// Download fragment `index` of a ready report.
    async fn get_fragment(&self, report_id: &str, index: usize) -> Result<String, AdfluxError>;
}

/// Google Ads abstraction.
#[async_trait]
pub trait AdsApi: Send + Sync {
    /// Run a search and return every result row.
    async fn search(&self, search: &AdsSearch) -> Result<Vec<Value>, AdfluxError>;
}

/// YouTube Data abstraction.
#[async_trait]
pub trait YouTubeApi: Send + Sync {
    /// List one page of `resource` (e.g. `channels`, `videos`).
    async fn list(
        &self,
        resource: &str,
        query: &BTreeMap<String, String>,
        page_token: Option<&str>,
    ) -> Result<YouTubePage, AdfluxError>;
}

/// Real adapter for every platform API, sharing one `reqwest::Client` and
/// bearer token.
#[derive(Clone)]
pub struct RealAdapter {
    http: reqwest::Client,
    token: String,
    dv360: Url,
    sa360: Url,
    ads: Url,
    youtube: Url,
}

impl std::fmt::Debug for RealAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealAdapter")
            .field("dv360", &self.dv360.as_str())
            .field("sa360", &self.sa360.as_str())
            .field("ads", &self.ads.as_str())
            .field("youtube", &self.youtube.as_str())
            .finish_non_exhaustive()
    }
}

impl RealAdapter {
    /// Build with a fresh HTTP client against the public endpoints.
    ///
    /// # Panics
    /// Panics if a built-in endpoint fails to parse, which cannot happen for
    /// the constants shipped with this crate.
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
        let parse = |u: &str| Url::parse(u).expect("built-in endpoint is valid");
        Self {
            http,
            token: token.into(),
            dv360: parse(DV360_BASE_URL),
            sa360: parse(SA360_BASE_URL),
            ads: parse(ADS_BASE_URL),
            youtube: parse(YOUTUBE_BASE_URL),
        }
    }

    /// Point one platform at another endpoint, e.g. a local mock server.
    ///
    /// # Errors
    /// Returns `AdfluxError::Config` if `base` is not an absolute URL or the
    /// platform is not served by this adapter.
    pub fn with_endpoint(mut self, platform: Platform, base: &str) -> Result<Self, AdfluxError> {
        let url = Url::parse(base)
            .map_err(|e| AdfluxError::config(format!("invalid {platform} base URL {base}: {e}")))?;
        if url.cannot_be_a_base() {
            return Err(AdfluxError::config(format!(
                "{platform} base URL {base} cannot carry a path"
            )));
        }
        match platform {
            Platform::Dv360 => self.dv360 = url,
            Platform::Sa360 => self.sa360 = url,
            Platform::GoogleAds => self.ads = url,
            Platform::YouTube => self.youtube = url,
            Platform::CampaignManager => {
                return Err(AdfluxError::config(
                    "Campaign Manager is served by the adflux-cm adapter",
                ));
            }
        }
        Ok(self)
    }

    fn endpoint(base: &Url, platform: Platform, segments: &[&str]) -> Result<Url, AdfluxError> {
        let mut url = base.clone();
        url.path_segments_mut()
            .map_err(|()| AdfluxError::config(format!("{platform} base URL cannot carry a path")))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send_text(
        &self,
        platform: Platform,
        req: reqwest::RequestBuilder,
        context: &str,
    ) -> Result<String, AdfluxError> {
        let resp = req
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| map_reqwest_err(platform, &e, context))?;
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| map_reqwest_err(platform, &e, context))?;
        if !status.is_success() {
            return Err(map_status_err(platform, status, &body, context));
        }
        Ok(body)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        platform: Platform,
        req: reqwest::RequestBuilder,
        context: &str,
    ) -> Result<T, AdfluxError> {
        let body = self.send_text(platform, req, context).await?;
        serde_json::from_str(&body)
            .map_err(|e| AdfluxError::Data(format!("malformed {context} response: {e}")))
    }
}

fn map_reqwest_err(platform: Platform, e: &reqwest::Error, context: &str) -> AdfluxError {
    if e.is_timeout() {
        AdfluxError::transport(platform.as_str(), format!("timeout: {context}"))
    } else if e.is_connect() {
        AdfluxError::transport(platform.as_str(), format!("connect failed: {context}: {e}"))
    } else {
        AdfluxError::transport(platform.as_str(), format!("{context}: {e}"))
    }
}

fn map_status_err(
    platform: Platform,
    status: reqwest::StatusCode,
    body: &str,
    context: &str,
) -> AdfluxError {
    let detail = serde_json::from_str::<GoogleErrorBody>(body).map_or_else(
        |_| body.trim().to_string(),
        |b| match b.error.status {
            Some(s) => format!("{s}: {}", b.error.message),
            None => b.error.message,
        },
    );
    AdfluxError::transport(
        platform.as_str(),
        format!("status {}: {context}: {detail}", status.as_u16()),
    )
}

#[async_trait]
impl Dv360Api for RealAdapter {
    async fn run_query(
        &self,
        query_id: &str,
        body: Option<&Value>,
    ) -> Result<Dv360Run, AdfluxError> {
        let url = Self::endpoint(&self.dv360, Platform::Dv360, &["queries", &format!("{query_id}:run")])?;
        let body = body.cloned().unwrap_or_else(|| Value::Object(serde_json::Map::new()));
        let wire: Dv360Wire = self
            .send_json(Platform::Dv360, self.http.post(url).json(&body), "queries.run")
            .await?;
        Ok(wire.into())
    }

    async fn get_report(
        &self,
        query_id: &str,
        report_id: &str,
    ) -> Result<Dv360Run, AdfluxError> {
        let url = Self::endpoint(
            &self.dv360,
            Platform::Dv360,
            &["queries", query_id, "reports", report_id],
        )?;
        let wire: Dv360Wire = self
            .send_json(Platform::Dv360, self.http.get(url), "queries.reports.get")
            .await?;
        Ok(wire.into())
    }

    async fn download(&self, url: &str) -> Result<String, AdfluxError> {
        let url = Url::parse(url)
            .map_err(|e| AdfluxError::Data(format!("invalid DV360 report path {url}: {e}")))?;
        // Storage paths are signed URLs and are fetched without the bearer token.
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| map_reqwest_err(Platform::Dv360, &e, "report download"))?;
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| map_reqwest_err(Platform::Dv360, &e, "report download"))?;
        if !status.is_success() {
            return Err(map_status_err(Platform::Dv360, status, &body, "report download"));
        }
        Ok(body)
    }
}

#[async_trait]
impl Sa360Api for RealAdapter {
    async fn request_report(&self, request: &Value) -> Result<Sa360Status, AdfluxError> {
        let url = Self::endpoint(&self.sa360, Platform::Sa360, &["reports"])?;
        self.send_json(Platform::Sa360, self.http.post(url).json(request), "reports.request")
            .await
    }

    async fn get_report(&self, report_id: &str) -> Result<Sa360Status, AdfluxError> {
        let url = Self::endpoint(&self.sa360, Platform::Sa360, &["reports", report_id])?;
        self.send_json(Platform::Sa360, self.http.get(url), "reports.get")
            .await
    }

    async fn get_fragment(&self, report_id: &str, index: usize) -> Result<String, AdfluxError> {
        let fragment = index.to_string();
        let url = Self::endpoint(
            &self.sa360,
            Platform::Sa360,
            &["reports", report_id, "files", &fragment],
        )?;
        self.send_text(Platform::Sa360, self.http.get(url), "reports.getFile")
            .await
    }
}

#[async_trait]
impl AdsApi for RealAdapter {
    async fn search(&self, search: &AdsSearch) -> Result<Vec<Value>, AdfluxError> {
        let url = Self::endpoint(
            &self.ads,
            Platform::GoogleAds,
            &["customers", &search.customer_id, "googleAds:searchStream"],
        )?;
        let mut req = self
            .http
            .post(url)
            .header("developer-token", &search.developer_token)
            .json(&serde_json::json!({ "query": search.query }));
        if let Some(login) = &search.login_customer_id {
            req = req.header("login-customer-id", login);
        }
        let batches: Vec<AdsStreamBatch> = self
            .send_json(Platform::GoogleAds, req, "googleAds.searchStream")
            .await?;
        Ok(batches.into_iter().flat_map(|b| b.results).collect())
    }
}

#[async_trait]
impl YouTubeApi for RealAdapter {
    async fn list(
        &self,
        resource: &str,
        query: &BTreeMap<String, String>,
        page_token: Option<&str>,
    ) -> Result<YouTubePage, AdfluxError> {
        let mut url = Self::endpoint(&self.youtube, Platform::YouTube, &[resource])?;
        {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in query {
                pairs.append_pair(k, v);
            }
            if let Some(token) = page_token {
                pairs.append_pair("pageToken", token);
            }
        }
        self.send_json(Platform::YouTube, self.http.get(url), &format!("{resource}.list"))
            .await
    }
}

/* -------- Test-only lightweight adapter constructors ------- */

#[cfg(feature = "test-adapters")]
impl dyn Dv360Api {
    /// Build a `Dv360Api` from closures (tests only).
    pub fn from_fns<FRun, FGet, FDown>(frun: FRun, fget: FGet, fdown: FDown) -> Arc<dyn Dv360Api>
    where
        FRun: Send + Sync + 'static + Fn(String, Option<Value>) -> Result<Dv360Run, AdfluxError>,
        FGet: Send + Sync + 'static + Fn(String, String) -> Result<Dv360Run, AdfluxError>,
        FDown: Send + Sync + 'static + Fn(String) -> Result<String, AdfluxError>,
    {
        struct FnDv360<FRun, FGet, FDown> {
            frun: FRun,
            fget: FGet,
            fdown: FDown,
        }
        #[async_trait]
        impl<FRun, FGet, FDown> Dv360Api for FnDv360<FRun, FGet, FDown>
        where
            FRun: Send
                + Sync
                + 'static
                + Fn(String, Option<Value>) -> Result<Dv360Run, AdfluxError>,
            FGet: Send + Sync + 'static + Fn(String, String) -> Result<Dv360Run, AdfluxError>,
            FDown: Send + Sync + 'static + Fn(String) -> Result<String, AdfluxError>,
        {
            async fn run_query(
                &self,
                query_id: &str,
                body: Option<&Value>,
            ) -> Result<Dv360Run, AdfluxError> {
                (self.frun)(query_id.to_string(), body.cloned())
            }
            async fn get_report(
                &self,
                query_id: &str,
                report_id: &str,
            ) -> Result<Dv360Run, AdfluxError> {
                (self.fget)(query_id.to_string(), report_id.to_string())
            }
            async fn download(&self, url: &str) -> Result<String, AdfluxError> {
                (self.fdown)(url.to_string())
            }
        }
        Arc::new(FnDv360 { frun, fget, fdown })
    }
}

#[cfg(feature = "test-adapters")]
impl dyn Sa360Api {
    /// Build a `Sa360Api` from closures (tests only).
    pub fn from_fns<FReq, FGet, FFrag>(freq: FReq, fget: FGet, ffrag: FFrag) -> Arc<dyn Sa360Api>
    where
        FReq: Send + Sync + 'static + Fn(Value) -> Result<Sa360Status, AdfluxError>,
        FGet: Send + Sync + 'static + Fn(String) -> Result<Sa360Status, AdfluxError>,
        FFrag: Send + Sync + 'static + Fn(String, usize) -> Result<String, AdfluxError>,
    {
        struct FnSa360<FReq, FGet, FFrag> {
            freq: FReq,
            fget: FGet,
            ffrag: FFrag,
        }
        #[async_trait]
        impl<FReq, FGet, FFrag> Sa360Api for FnSa360<FReq, FGet, FFrag>
        where
            FReq: Send + Sync + 'static + Fn(Value) -> Result<Sa360Status, AdfluxError>,
            FGet: Send + Sync + 'static + Fn(String) -> Result<Sa360Status, AdfluxError>,
            FFrag: Send + Sync + 'static + Fn(String, usize) -> Result<String, AdfluxError>,
        {
            async fn request_report(&self, request: &Value) -> Result<Sa360Status, AdfluxError> {
                (self.freq)(request.clone())
            }
            async fn get_report(&self, report_id: &str) -> Result<Sa360Status, AdfluxError> {
                (self.fget)(report_id.to_string())
            }
            async fn get_fragment(
                &self,
                report_id: &str,
                index: usize,
            ) -> Result<String, AdfluxError> {
                (self.ffrag)(report_id.to_string(), index)
            }
        }
        Arc::new(FnSa360 { freq, fget, ffrag })
    }
}

#[cfg(feature = "test-adapters")]
impl dyn AdsApi {
    /// Build an `AdsApi` from a closure (tests only).
    pub fn from_fn<F>(f: F) -> Arc<dyn AdsApi>
    where
        F: Send + Sync + 'static + Fn(AdsSearch) -> Result<Vec<Value>, AdfluxError>,
    {
        struct FnAds<F>(F);
        #[async_trait]
        impl<F> AdsApi for FnAds<F>
        where
            F: Send + Sync + 'static + Fn(AdsSearch) -> Result<Vec<Value>, AdfluxError>,
        {
            async fn search(&self, search: &AdsSearch) -> Result<Vec<Value>, AdfluxError> {
                (self.0)(search.clone())
            }
        }
        Arc::new(FnAds(f))
    }
}

#[cfg(feature = "test-adapters")]
impl dyn YouTubeApi {
    /// Build a `YouTubeApi` from a closure (tests only).
    pub fn from_fn<F>(f: F) -> Arc<dyn YouTubeApi>
    where
        F: Send
            + Sync
            + 'static
            + Fn(String, BTreeMap<String, String>, Option<String>) -> Result<YouTubePage, AdfluxError>,
    {
        struct FnYouTube<F>(F);
        #[async_trait]
        impl<F> YouTubeApi for FnYouTube<F>
        where
            F: Send
                + Sync
                + 'static
                + Fn(
                    String,
                    BTreeMap<String, String>,
                    Option<String>,
                ) -> Result<YouTubePage, AdfluxError>,
        {
            async fn list(
                &self,
                resource: &str,
                query: &BTreeMap<String, String>,
                page_token: Option<&str>,
            ) -> Result<YouTubePage, AdfluxError> {
                (self.0)(
                    resource.to_string(),
                    query.clone(),
                    page_token.map(str::to_string),
                )
            }
        }
        Arc::new(FnYouTube(f))
    }
}
