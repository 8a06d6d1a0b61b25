use std::sync::Arc;

use adflux_cm::CmConnector;
use adflux_core::{AdfluxError, Platform, ReportConfig, ReportJob};
use adflux_platforms::adapter::{AdsApi, Dv360Api, RealAdapter, Sa360Api, YouTubeApi};
use adflux_platforms::{AdsReport, Dv360Report, Sa360Report, YouTubeReport};

/// API clients report jobs are built on, one optional slot per platform.
#[derive(Clone, Default)]
pub struct PlatformClients {
    cm: Option<CmConnector>,
    dv360: Option<Arc<dyn Dv360Api>>,
    sa360: Option<Arc<dyn Sa360Api>>,
    ads: Option<Arc<dyn AdsApi>>,
    youtube: Option<Arc<dyn YouTubeApi>>,
}

impl PlatformClients {
    /// No clients registered.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the Campaign Manager connector.
    #[must_use]
    pub fn with_cm(mut self, cm: CmConnector) -> Self {
        self.cm = Some(cm);
        self
    }

    /// Register one adapter for DV360, SA360, Google Ads and YouTube.
    #[must_use]
    pub fn with_google(self, adapter: RealAdapter) -> Self {
        let shared = Arc::new(adapter);
        self.with_dv360(shared.clone())
            .with_sa360(shared.clone())
            .with_ads(shared.clone())
            .with_youtube(shared)
    }

    /// Register the DV360 client.
    #[must_use]
    pub fn with_dv360(mut self, api: Arc<dyn Dv360Api>) -> Self {
        self.dv360 = Some(api);
        self
    }

    /// Register the SA360 client.
    #[must_use]
    pub fn with_sa360(mut self, api: Arc<dyn Sa360Api>) -> Self {
        self.sa360 = Some(api);
        self
    }

    /// Register the Google Ads client.
    #[must_use]
    pub fn with_ads(mut self, api: Arc<dyn AdsApi>) -> Self {
        self.ads = Some(api);
        self
    }

    /// Register the YouTube client.
    #[must_use]
    pub fn with_youtube(mut self, api: Arc<dyn YouTubeApi>) -> Self {
        self.youtube = Some(api);
        self
    }

    /// Platforms with a registered client.
    #[must_use]
    pub fn platforms(&self) -> Vec<Platform> {
        [
            (self.cm.is_some(), Platform::CampaignManager),
            (self.dv360.is_some(), Platform::Dv360),
            (self.sa360.is_some(), Platform::Sa360),
            (self.ads.is_some(), Platform::GoogleAds),
            (self.youtube.is_some(), Platform::YouTube),
        ]
        .into_iter()
        .filter_map(|(present, p)| present.then_some(p))
        .collect()
    }
}

fn missing(platform: Platform) -> AdfluxError {
    AdfluxError::config(format!("no {platform} client registered"))
}

/// Build the report job a configuration describes.
///
/// The returned job is only ever seen through [`ReportJob`].
///
/// # Errors
/// Returns `AdfluxError::Config` when no client is registered for the
/// configured platform or the platform rejects the configuration.
pub fn build_report(
    config: &ReportConfig,
    clients: &PlatformClients,
) -> Result<Arc<dyn ReportJob>, AdfluxError> {
    let platform = config.platform();
    let job: Arc<dyn ReportJob> = match config {
        ReportConfig::CampaignManager(c) => {
            Arc::new(clients.cm.as_ref().ok_or_else(|| missing(platform))?.report(c)?)
        }
        ReportConfig::Dv360(c) => {
            let api = clients.dv360.clone().ok_or_else(|| missing(platform))?;
            Arc::new(Dv360Report::new(api, c.clone())?)
        }
        ReportConfig::Sa360(c) => {
            let api = clients.sa360.clone().ok_or_else(|| missing(platform))?;
            Arc::new(Sa360Report::new(api, c.clone())?)
        }
        ReportConfig::GoogleAds(c) => {
            let api = clients.ads.clone().ok_or_else(|| missing(platform))?;
            Arc::new(AdsReport::new(api, c.clone())?)
        }
        ReportConfig::YouTube(c) => {
            let api = clients.youtube.clone().ok_or_else(|| missing(platform))?;
            Arc::new(YouTubeReport::new(api, c.clone())?)
        }
    };
    Ok(job)
}
