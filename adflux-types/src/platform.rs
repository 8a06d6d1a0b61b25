use core::fmt;
use serde::{Deserialize, Serialize};

/// Report platforms that can back a report job.
///
/// The serialized form matches the `target` tag of a report configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    /// Campaign Manager 360 (DFA Reporting).
    #[serde(rename = "CM")]
    CampaignManager,
    /// Display & Video 360 (DoubleClick Bid Manager).
    #[serde(rename = "DV360")]
    Dv360,
    /// Search Ads 360 (DoubleClick Search).
    #[serde(rename = "SA360")]
    Sa360,
    /// Google Ads.
    #[serde(rename = "ADS")]
    GoogleAds,
    /// YouTube Data API.
    #[serde(rename = "YT")]
    YouTube,
}

impl Platform {
    /// Stable short identifier for logs and errors.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CampaignManager => "CM",
            Self::Dv360 => "DV360",
            Self::Sa360 => "SA360",
            Self::GoogleAds => "ADS",
            Self::YouTube => "YT",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
