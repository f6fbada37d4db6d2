//! Metadata client: resolves a human-readable title for a video id through the
//! YouTube Data API. Title resolution is best-effort: every failure mode maps to
//! a placeholder title, never to an error the user sees.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

const YOUTUBE_VIDEOS_URL: &str = "https://www.googleapis.com/youtube/v3/videos";
const REQUEST_TIMEOUT_SECS: u64 = 10;

pub const TITLE_NOT_FOUND: &str = "Title not found (private or deleted video?)";
pub const TITLE_FETCH_ERROR: &str = "Error fetching title";
pub const TITLE_KEY_MISSING: &str = "Title unavailable (API key missing)";

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct VideosResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
struct VideoItem {
    snippet: Snippet,
}

#[derive(Debug, Deserialize)]
struct Snippet {
    title: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Looks up a video's title. `Ok(None)` means the call worked but no video came back.
#[async_trait]
pub trait TitleLookup: Send + Sync {
    async fn lookup_title(&self, video_id: &str) -> Result<Option<String>, MetadataError>;
}

#[derive(Clone)]
pub struct YouTubeClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl YouTubeClient {
    pub fn new(api_key: String) -> Result<Self, MetadataError> {
        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()?,
            api_key,
            base_url: YOUTUBE_VIDEOS_URL.to_string(),
        })
    }
}

#[async_trait]
impl TitleLookup for YouTubeClient {
    async fn lookup_title(&self, video_id: &str) -> Result<Option<String>, MetadataError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("id", video_id),
                ("key", self.api_key.as_str()),
                ("part", "snippet"),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(MetadataError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let title = title_from_body(&body)?;
        debug!("Metadata lookup for {video_id}: found={}", title.is_some());
        Ok(title)
    }
}

fn title_from_body(body: &str) -> Result<Option<String>, MetadataError> {
    let parsed: VideosResponse = serde_json::from_str(body)?;
    Ok(parsed.items.into_iter().next().map(|item| item.snippet.title))
}

/// Resolves the title to store for `video_id`, substituting a placeholder for
/// every failure mode.
pub async fn resolve_title(lookup: Option<&dyn TitleLookup>, video_id: &str) -> String {
    let Some(lookup) = lookup else {
        return TITLE_KEY_MISSING.to_string();
    };

    match lookup.lookup_title(video_id).await {
        Ok(Some(title)) => title,
        Ok(None) => TITLE_NOT_FOUND.to_string(),
        Err(e) => {
            warn!("Title lookup failed for {video_id}: {e}");
            TITLE_FETCH_ERROR.to_string()
        }
    }
}
