//! YouTube Data reports. Listing is synchronous; items are captured as
//! newline-delimited JSON by `generate`.

use std::collections::BTreeMap;
use std::sync::Arc;

use adflux_core::report::captured_content;
use adflux_core::{
    AdfluxError, FieldMode, FieldType, JobDescriptor, Platform, ReportJob, ReportParameters,
    TableField, TableSchema, YouTubeReportConfig,
};
use async_trait::async_trait;
use serde_json::Value;

use crate::adapter::YouTubeApi;

/// Largest page the list endpoints accept.
const MAX_PAGE_SIZE: u32 = 50;

/// Listable YouTube resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YouTubeTarget {
    /// `channels.list`
    Channel,
    /// `videos.list`
    Video,
    /// `commentThreads.list`
    CommentThread,
    /// `playlists.list`
    Playlist,
    /// `search.list`
    Search,
}

impl YouTubeTarget {
    /// Parse a configured target; singular and plural names are accepted.
    ///
    /// # Errors
    /// Returns `AdfluxError::Config` for unknown targets.
    pub fn parse(target: &str) -> Result<Self, AdfluxError> {
        match target {
            "channel" | "channels" => Ok(Self::Channel),
            "video" | "videos" => Ok(Self::Video),
            "commentThread" | "commentThreads" => Ok(Self::CommentThread),
            "playlist" | "playlists" => Ok(Self::Playlist),
            "search" => Ok(Self::Search),
            other => Err(AdfluxError::config(format!("unsupported YouTube target: {other}"))),
        }
    }

    /// REST resource path.
    #[must_use]
    pub const fn resource(self) -> &'static str {
        match self {
            Self::Channel => "channels",
            Self::Video => "videos",
            Self::CommentThread => "commentThreads",
            Self::Playlist => "playlists",
            Self::Search => "search",
        }
    }
}

/// A synchronous YouTube listing report.
pub struct YouTubeReport {
    api: Arc<dyn YouTubeApi>,
    target: YouTubeTarget,
    result_limit: Option<u32>,
    query: BTreeMap<String, String>,
}

impl YouTubeReport {
    /// Bind a report configuration to an API client.
    ///
    /// # Errors
    /// Returns `AdfluxError::Config` for an unknown target or a report query
    /// that is not a JSON object.
    pub fn new(api: Arc<dyn YouTubeApi>, config: YouTubeReportConfig) -> Result<Self, AdfluxError> {
        let target = YouTubeTarget::parse(&config.target)?;
        let query = match config.report_query {
            None => BTreeMap::new(),
            Some(Value::Object(map)) => map
                .into_iter()
                .map(|(k, v)| (k, query_value(&v)))
                .collect(),
            Some(_) => {
                return Err(AdfluxError::config("YouTube reportQuery must be a JSON object"));
            }
        };
        Ok(Self {
            api,
            target,
            result_limit: config.result_limit,
            query,
        })
    }

    fn page_query(&self, params: &ReportParameters, fetched: usize) -> BTreeMap<String, String> {
        let mut q: BTreeMap<String, String> = self
            .query
            .iter()
            .map(|(k, v)| (k.clone(), params.substitute(v)))
            .collect();
        q.entry("part".into()).or_insert_with(|| "id,snippet".into());
        let remaining = self
            .result_limit
            .map_or(MAX_PAGE_SIZE, |l| l.saturating_sub(u32::try_from(fetched).unwrap_or(u32::MAX)));
        q.entry("maxResults".into())
            .or_insert_with(|| remaining.clamp(1, MAX_PAGE_SIZE).to_string());
        q
    }
}

fn query_value(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(query_value).collect::<Vec<_>>().join(","),
        other => other.to_string(),
    }
}

#[async_trait]
impl ReportJob for YouTubeReport {
    fn platform(&self) -> Platform {
        Platform::YouTube
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "adflux_platforms::youtube::generate", skip(self, params), fields(resource = self.target.resource()))
    )]
    async fn generate(&self, params: &ReportParameters) -> Result<JobDescriptor, AdfluxError> {
        let limit = self
            .result_limit
            .map(|l| usize::try_from(l).unwrap_or(usize::MAX));
        let mut items: Vec<Value> = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            if limit.is_some_and(|l| items.len() >= l) {
                break;
            }
            let page = self
                .api
                .list(
                    self.target.resource(),
                    &self.page_query(params, items.len()),
                    page_token.as_deref(),
                )
                .await?;
            let empty = page.items.is_empty();
            items.extend(page.items);
            match page.next_page_token {
                Some(token) if !empty && !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }
        if let Some(l) = limit {
            items.truncate(l);
        }
        let mut content = String::new();
        for item in &items {
            let line = serde_json::to_string(item)
                .map_err(|e| AdfluxError::Data(format!("unserializable YouTube item: {e}")))?;
            content.push_str(&line);
            content.push('\n');
        }
        Ok(JobDescriptor::completed(content).with("items", items.len().to_string()))
    }

    async fn get_content(
        &self,
        job: &JobDescriptor,
        _params: &ReportParameters,
    ) -> Result<String, AdfluxError> {
        captured_content(job)
    }

    fn generate_schema(&self) -> Result<TableSchema, AdfluxError> {
        let id = TableField::new("id", FieldType::String);
        let title = TableField::new("title", FieldType::String);
        let description = TableField::new("description", FieldType::String);
        let published = TableField::new("publishedAt", FieldType::Timestamp);
        let count = |name: &str| TableField::new(name, FieldType::Integer);
        let fields = match self.target {
            YouTubeTarget::Channel => vec![
                id.mode(FieldMode::Required),
                TableField::record("snippet", vec![title, description, published]),
                TableField::record(
                    "statistics",
                    vec![count("viewCount"), count("subscriberCount"), count("videoCount")],
                ),
            ],
            YouTubeTarget::Video => vec![
                id.mode(FieldMode::Required),
                TableField::record(
                    "snippet",
                    vec![
                        title,
                        description,
                        published,
                        TableField::new("channelId", FieldType::String),
                        TableField::new("tags", FieldType::String).mode(FieldMode::Repeated),
                    ],
                ),
                TableField::record(
                    "statistics",
                    vec![count("viewCount"), count("likeCount"), count("commentCount")],
                ),
            ],
            YouTubeTarget::CommentThread => vec![
                id.mode(FieldMode::Required),
                TableField::record(
                    "snippet",
                    vec![
                        TableField::new("videoId", FieldType::String),
                        count("totalReplyCount"),
                        TableField::record(
                            "topLevelComment",
                            vec![TableField::record(
                                "snippet",
                                vec![
                                    TableField::new("textDisplay", FieldType::String),
                                    TableField::new("authorDisplayName", FieldType::String),
                                    count("likeCount"),
                                    published,
                                ],
                            )],
                        ),
                    ],
                ),
            ],
            YouTubeTarget::Playlist => vec![
                id.mode(FieldMode::Required),
                TableField::record(
                    "snippet",
                    vec![title, description, published, TableField::new("channelId", FieldType::String)],
                ),
                TableField::record("contentDetails", vec![count("itemCount")]),
            ],
            YouTubeTarget::Search => vec![
                TableField::record(
                    "id",
                    vec![
                        TableField::new("kind", FieldType::String),
                        TableField::new("videoId", FieldType::String),
                        TableField::new("channelId", FieldType::String),
                        TableField::new("playlistId", FieldType::String),
                    ],
                ),
                TableField::record(
                    "snippet",
                    vec![title, description, published, TableField::new("channelId", FieldType::String)],
                ),
            ],
        };
        Ok(TableSchema::new(fields))
    }

    fn is_asynchronous(&self) -> bool {
        false
    }
}
