//! adflux-platforms
//!
//! Report jobs for the platforms beside Campaign Manager. Each job implements
//! [`ReportJob`](adflux_core::ReportJob) over an injectable API trait from
//! [`adapter`]:
//!
//! | platform | job | mode |
//! |----------|-----|------|
//! | Display & Video 360 | [`Dv360Report`] | asynchronous |
//! | Search Ads 360 | [`Sa360Report`] | asynchronous |
//! | Google Ads | [`AdsReport`] | synchronous |
//! | YouTube | [`YouTubeReport`] | synchronous |
#![warn(missing_docs)]

/// API traits and the production adapter backed by `reqwest`.
pub mod adapter;
pub mod ads;
pub mod dv360;
pub mod sa360;
pub mod youtube;

pub use ads::AdsReport;
pub use dv360::Dv360Report;
pub use sa360::Sa360Report;
pub use youtube::{YouTubeReport, YouTubeTarget};
