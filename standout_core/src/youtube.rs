use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

use crate::config::YouTubeConfig;
use crate::error::{AnalyzerError, Result};
use crate::model::{
    ChannelRef, FetchOutcome, SkipReason, SkippedVideo, UploadRef, VideoMetrics, VideoRecord,
};

/// Largest upload listing the analyzer asks for.
pub const MAX_UPLOADS: usize = 10;

const QUOTA_REASONS: [&str; 3] = ["quotaExceeded", "dailyLimitExceeded", "rateLimitExceeded"];
const NOT_FOUND_REASONS: [&str; 3] = ["videoNotFound", "notFound", "forbidden"];
const KEY_REASONS: [&str; 4] = ["keyInvalid", "keyExpired", "ipRefererBlocked", "API_KEY_INVALID"];

/// Read-only access to the video platform.
///
/// Implementations issue one request per call; callers await each call before
/// issuing the next.
#[async_trait]
pub trait VideoPlatform: Send + Sync {
    /// Owning channel of `video_id`. A private, deleted or unknown video is
    /// `AnalyzerError::VideoNotFound`.
    async fn resolve_channel(&self, video_id: &str) -> Result<ChannelRef>;

    /// Most recent uploads of the channel, newest first. `limit` is clamped to
    /// `1..=MAX_UPLOADS`.
    async fn list_recent_uploads(&self, channel_id: &str, limit: usize) -> Result<Vec<UploadRef>>;

    /// Counters for one video, or `None` when it is private or removed.
    async fn fetch_metrics(&self, video_id: &str) -> Result<Option<VideoMetrics>>;
}

pub fn clamp_limit(limit: usize) -> usize {
    limit.clamp(1, MAX_UPLOADS)
}

/// Fetches metrics for every upload in listing order, turning unavailable
/// videos into skips. Any other error aborts the whole stage.
pub async fn fetch_all<P>(
    platform: &P,
    uploads: &[UploadRef],
    now: DateTime<Utc>,
) -> Result<Vec<FetchOutcome>>
where
    P: VideoPlatform + ?Sized,
{
    let mut outcomes = Vec::with_capacity(uploads.len());
    for upload in uploads {
        let outcome = match platform.fetch_metrics(&upload.id).await {
            Ok(Some(metrics)) => FetchOutcome::Fetched(VideoRecord::from_metrics(metrics, now)),
            Ok(None) => skipped(upload, SkipReason::Unavailable),
            Err(AnalyzerError::VideoNotFound(_)) => skipped(upload, SkipReason::Removed),
            Err(e) => return Err(e),
        };
        outcomes.push(outcome);
    }
    Ok(outcomes)
}

fn skipped(upload: &UploadRef, reason: SkipReason) -> FetchOutcome {
    tracing::warn!(
        video_id = %upload.id,
        title = %upload.title,
        %reason,
        "Skipping video"
    );
    FetchOutcome::Skipped(SkippedVideo {
        id: upload.id.clone(),
        title: upload.title.clone(),
        reason,
    })
}

/// YouTube Data API v3 client authenticated with an API key.
#[derive(Clone)]
pub struct YouTubeClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl YouTubeClient {
    pub fn new(config: &YouTubeConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("standout/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, params: &[(&str, String)]) -> Result<T> {
        let url = format!("{}/{}", self.base_url, path);
        tracing::debug!(%url, ?params, "YouTube request");
        let resp = self
            .client
            .get(&url)
            .query(params)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await?;
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(classify_error(status.as_u16(), &body));
        }
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl VideoPlatform for YouTubeClient {
    async fn resolve_channel(&self, video_id: &str) -> Result<ChannelRef> {
        let resp: ListResponse<VideoItem> = self
            .get(
                "videos",
                &[("part", "snippet".into()), ("id", video_id.to_string())],
            )
            .await?;
        let snippet = resp
            .items
            .into_iter()
            .next()
            .and_then(|item| item.snippet)
            .ok_or_else(|| AnalyzerError::VideoNotFound(video_id.to_string()))?;
        Ok(ChannelRef {
            title: snippet
                .channel_title
                .unwrap_or_else(|| snippet.channel_id.clone()),
            id: snippet.channel_id,
        })
    }

    async fn list_recent_uploads(&self, channel_id: &str, limit: usize) -> Result<Vec<UploadRef>> {
        let limit = clamp_limit(limit);
        let resp: ListResponse<SearchItem> = self
            .get(
                "search",
                &[
                    ("part", "snippet".into()),
                    ("channelId", channel_id.to_string()),
                    ("order", "date".into()),
                    ("type", "video".into()),
                    ("maxResults", limit.to_string()),
                ],
            )
            .await?;
        let uploads = resp
            .items
            .into_iter()
            .filter_map(|item| {
                let id = item.id.video_id?;
                let snippet = item.snippet?;
                Some(UploadRef {
                    id,
                    title: snippet.title,
                    published_at: snippet.published_at,
                })
            })
            .take(limit)
            .collect();
        Ok(uploads)
    }

    async fn fetch_metrics(&self, video_id: &str) -> Result<Option<VideoMetrics>> {
        let resp = self
            .get::<ListResponse<VideoItem>>(
                "videos",
                &[
                    ("part", "snippet,statistics".into()),
                    ("id", video_id.to_string()),
                ],
            )
            .await;
        let resp = match resp {
            Ok(r) => r,
            Err(AnalyzerError::VideoNotFound(_)) => return Ok(None),
            Err(e) => return Err(e),
        };
        let Some(item) = resp.items.into_iter().next() else {
            return Ok(None);
        };
        let Some(snippet) = item.snippet else {
            return Ok(None);
        };
        let stats = item.statistics.unwrap_or_default();
        Ok(Some(VideoMetrics {
            id: item.id,
            title: snippet.title,
            published_at: snippet.published_at,
            views: parse_count(stats.view_count.as_deref()),
            likes: parse_count(stats.like_count.as_deref()),
            comments: parse_count(stats.comment_count.as_deref()),
        }))
    }
}

/// Maps a non-2xx platform response onto an error kind using the `reason`
/// fields of the standard Google error envelope.
pub fn classify_error(status: u16, body: &str) -> AnalyzerError {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let error = parsed.as_ref().and_then(|v| v.get("error"));
    let message = error
        .and_then(|e| e.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| body.trim().to_string());

    let mut reasons: Vec<&str> = error
        .and_then(|e| e.get("errors"))
        .and_then(Value::as_array)
        .map(|errs| {
            errs.iter()
                .filter_map(|e| e.get("reason").and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default();
    if let Some(details) = error.and_then(|e| e.get("details")).and_then(Value::as_array) {
        reasons.extend(
            details
                .iter()
                .filter_map(|d| d.get("reason").and_then(Value::as_str)),
        );
    }

    let has = |set: &[&str]| reasons.iter().any(|r| set.contains(r));
    if has(&QUOTA_REASONS[..]) {
        AnalyzerError::QuotaExceeded(message)
    } else if has(&KEY_REASONS[..]) || status == 401 {
        AnalyzerError::Authentication(message)
    } else if has(&NOT_FOUND_REASONS[..]) || status == 404 {
        AnalyzerError::VideoNotFound(message)
    } else {
        AnalyzerError::Upstream { status, message }
    }
}

fn parse_count(raw: Option<&str>) -> u64 {
    raw.and_then(|s| s.trim().parse().ok()).unwrap_or(0)
}

#[derive(Debug, Deserialize)]
struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct VideoItem {
    id: String,
    snippet: Option<VideoSnippet>,
    statistics: Option<Statistics>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoSnippet {
    #[serde(default)]
    channel_id: String,
    channel_title: Option<String>,
    #[serde(default)]
    title: String,
    published_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Statistics {
    view_count: Option<String>,
    like_count: Option<String>,
    comment_count: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchId,
    snippet: Option<SearchSnippet>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchId {
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchSnippet {
    #[serde(default)]
    title: String,
    published_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn envelope(code: u16, reason: &str, message: &str) -> String {
        json!({
            "error": {
                "code": code,
                "message": message,
                "errors": [{ "reason": reason, "domain": "youtube.quota" }]
            }
        })
        .to_string()
    }

    #[test]
    fn quota_reasons_map_to_quota_exceeded() {
        for reason in QUOTA_REASONS {
            let err = classify_error(403, &envelope(403, reason, "The request cannot be completed"));
            match err {
                AnalyzerError::QuotaExceeded(msg) => {
                    assert_eq!(msg, "The request cannot be completed")
                }
                other => panic!("{reason}: unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn forbidden_and_not_found_map_to_video_not_found() {
        assert!(matches!(
            classify_error(403, &envelope(403, "forbidden", "private")),
            AnalyzerError::VideoNotFound(_)
        ));
        assert!(matches!(
            classify_error(404, &envelope(404, "videoNotFound", "gone")),
            AnalyzerError::VideoNotFound(_)
        ));
    }

    #[test]
    fn bad_key_is_authentication() {
        let body = json!({
            "error": {
                "code": 400,
                "message": "API key not valid. Please pass a valid API key.",
                "errors": [{ "reason": "badRequest" }],
                "details": [{ "reason": "API_KEY_INVALID" }]
            }
        })
        .to_string();
        assert!(matches!(
            classify_error(400, &body),
            AnalyzerError::Authentication(_)
        ));
    }

    #[test]
    fn unknown_errors_are_upstream() {
        match classify_error(500, "backend exploded") {
            AnalyzerError::Upstream { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "backend exploded");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn counts_parse_from_strings() {
        assert_eq!(parse_count(Some("12345")), 12_345);
        assert_eq!(parse_count(None), 0);
        assert_eq!(parse_count(Some("n/a")), 0);
    }

    #[test]
    fn limit_is_clamped() {
        assert_eq!(clamp_limit(0), 1);
        assert_eq!(clamp_limit(7), 7);
        assert_eq!(clamp_limit(50), MAX_UPLOADS);
    }

    #[test]
    fn search_items_without_video_id_are_ignored() {
        let raw = json!({
            "items": [
                { "id": { "kind": "youtube#channel", "channelId": "UC1" },
                  "snippet": { "title": "chan", "publishedAt": "2024-01-01T00:00:00Z" } },
                { "id": { "kind": "youtube#video", "videoId": "dQw4w9WgXcQ" },
                  "snippet": { "title": "vid", "publishedAt": "2024-01-02T00:00:00Z" } }
            ]
        });
        let resp: ListResponse<SearchItem> = serde_json::from_value(raw).unwrap();
        let ids: Vec<_> = resp.items.into_iter().filter_map(|i| i.id.video_id).collect();
        assert_eq!(ids, ["dQw4w9WgXcQ"]);
    }
}
