//! Records that flow through one analysis run.
//!
//! Nothing here is persisted; every value lives for a single invocation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AnalyzerError, Result};
use crate::scoring::{average_score, ScoreBreakdown};

/// Channel that owns the analysed video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelRef {
    pub id: String,
    pub title: String,
}

/// One entry of the channel's upload listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadRef {
    pub id: String,
    pub title: String,
    pub published_at: DateTime<Utc>,
}

/// Raw counters as returned by the platform's video-details lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoMetrics {
    pub id: String,
    pub title: String,
    pub published_at: DateTime<Utc>,
    pub views: u64,
    pub likes: u64,
    pub comments: u64,
}

/// A fetched video with its score. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoRecord {
    pub id: String,
    pub title: String,
    pub published_at: DateTime<Utc>,
    pub views: u64,
    pub likes: u64,
    pub comments: u64,
    #[serde(flatten)]
    pub breakdown: ScoreBreakdown,
}

impl VideoRecord {
    pub fn from_metrics(metrics: VideoMetrics, now: DateTime<Utc>) -> Self {
        let breakdown = ScoreBreakdown::compute(
            metrics.views,
            metrics.likes,
            metrics.comments,
            metrics.published_at,
            now,
        );
        Self {
            id: metrics.id,
            title: metrics.title,
            published_at: metrics.published_at,
            views: metrics.views,
            likes: metrics.likes,
            comments: metrics.comments,
            breakdown,
        }
    }

    pub fn score(&self) -> f64 {
        self.breakdown.score
    }

    pub fn url(&self) -> String {
        video_url(&self.id)
    }
}

pub fn video_url(id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", id)
}

/// Why a listed upload was left out of the dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The details lookup returned no item for the id.
    Unavailable,
    /// The platform answered with a not-found/forbidden error for the id.
    Removed,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::Unavailable => write!(f, "private or unavailable"),
            SkipReason::Removed => write!(f, "removed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedVideo {
    pub id: String,
    pub title: String,
    pub reason: SkipReason,
}

/// Result of the metrics stage for a single upload.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Fetched(VideoRecord),
    Skipped(SkippedVideo),
}

impl FetchOutcome {
    /// Splits outcomes into fetched records and skips, keeping listing order.
    pub fn partition(outcomes: Vec<FetchOutcome>) -> (Vec<VideoRecord>, Vec<SkippedVideo>) {
        let mut fetched = Vec::with_capacity(outcomes.len());
        let mut skipped = Vec::new();
        for outcome in outcomes {
            match outcome {
                FetchOutcome::Fetched(record) => fetched.push(record),
                FetchOutcome::Skipped(skip) => skipped.push(skip),
            }
        }
        (fetched, skipped)
    }
}

/// The post-skip video set of a channel and its mean score.
///
/// The average is derived from the set in the constructor and the set cannot
/// be changed afterwards, so the two always agree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelSummary {
    channel: ChannelRef,
    videos: Vec<VideoRecord>,
    average_score: f64,
}

impl ChannelSummary {
    pub fn new(channel: ChannelRef, videos: Vec<VideoRecord>) -> Result<Self> {
        if videos.is_empty() {
            return Err(AnalyzerError::NoUploads(format!(
                "channel {} has no analysable uploads",
                channel.title
            )));
        }
        let average_score = average_score(videos.iter().map(VideoRecord::score));
        Ok(Self {
            channel,
            videos,
            average_score,
        })
    }

    pub fn channel(&self) -> &ChannelRef {
        &self.channel
    }

    /// Videos in listing order (newest upload first).
    pub fn videos(&self) -> &[VideoRecord] {
        &self.videos
    }

    pub fn average_score(&self) -> f64 {
        self.average_score
    }

    pub fn len(&self) -> usize {
        self.videos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.videos.is_empty()
    }

    /// Videos ordered by score, highest first.
    pub fn by_score(&self) -> Vec<&VideoRecord> {
        let mut sorted: Vec<&VideoRecord> = self.videos.iter().collect();
        sorted.sort_by(|a, b| crate::selection::rank_order(a, b));
        sorted
    }
}

/// A selected standout video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandoutEntry {
    pub rank: usize,
    pub video: VideoRecord,
    pub vs_average_pct: f64,
    pub rationale: String,
}

/// Up to N videos scoring strictly above the channel average, best first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopSelection {
    pub entries: Vec<StandoutEntry>,
}

impl TopSelection {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, StandoutEntry> {
        self.entries.iter()
    }
}

/// Everything one run produced, ready for rendering or export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub source_url: String,
    pub video_id: String,
    pub generated_at: DateTime<Utc>,
    pub summary: ChannelSummary,
    pub top: TopSelection,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedVideo>,
}
