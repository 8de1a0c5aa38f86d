use chrono::{DateTime, Utc};

use crate::annotate::{Annotator, HeuristicAnnotator};
use crate::error::{AnalyzerError, Result};
use crate::model::{AnalysisReport, ChannelSummary, FetchOutcome};
use crate::selection::{select_standouts, DEFAULT_TOP};
use crate::url_parser::parse_video_id;
use crate::youtube::{clamp_limit, fetch_all, VideoPlatform, MAX_UPLOADS};

/// Runs URL parsing, channel lookup, listing, metrics, scoring and selection
/// in order against one platform.
pub struct Analyzer<P> {
    platform: P,
    upload_limit: usize,
    top_limit: usize,
    annotator: Box<dyn Annotator>,
}

impl<P: VideoPlatform> Analyzer<P> {
    pub fn new(platform: P) -> Self {
        Self {
            platform,
            upload_limit: MAX_UPLOADS,
            top_limit: DEFAULT_TOP,
            annotator: Box::new(HeuristicAnnotator),
        }
    }

    /// Number of recent uploads to analyse, clamped to `1..=10`.
    pub fn with_upload_limit(mut self, limit: usize) -> Self {
        self.upload_limit = clamp_limit(limit);
        self
    }

    /// Number of standouts to report, at most [`DEFAULT_TOP`].
    pub fn with_top_limit(mut self, limit: usize) -> Self {
        self.top_limit = limit.min(DEFAULT_TOP);
        self
    }

    pub fn with_annotator(mut self, annotator: Box<dyn Annotator>) -> Self {
        self.annotator = annotator;
        self
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub async fn analyze(&self, url: &str, now: DateTime<Utc>) -> Result<AnalysisReport> {
        let video_id = parse_video_id(url)?;
        tracing::info!(%video_id, "Resolving channel");

        let channel = self.platform.resolve_channel(&video_id).await?;
        tracing::info!(channel_id = %channel.id, channel = %channel.title, "Listing uploads");

        let uploads = self
            .platform
            .list_recent_uploads(&channel.id, self.upload_limit)
            .await?;
        if uploads.is_empty() {
            return Err(AnalyzerError::NoUploads(format!(
                "channel {} has no public uploads",
                channel.title
            )));
        }
        tracing::info!(count = uploads.len(), "Fetching video metrics");

        let outcomes = fetch_all(&self.platform, &uploads, now).await?;
        let (records, skipped) = FetchOutcome::partition(outcomes);
        if !skipped.is_empty() {
            tracing::info!(
                skipped = skipped.len(),
                kept = records.len(),
                "Some uploads were skipped"
            );
        }

        let summary = ChannelSummary::new(channel, records)?;
        let top = select_standouts(&summary, self.top_limit, self.annotator.as_ref());
        tracing::info!(
            videos = summary.len(),
            average = summary.average_score(),
            standouts = top.len(),
            "Analysis complete"
        );

        Ok(AnalysisReport {
            source_url: url.trim().to_string(),
            video_id,
            generated_at: now,
            summary,
            top,
            skipped,
        })
    }
}
