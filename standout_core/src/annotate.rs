//! Free-text rationale attached to each standout entry.
//!
//! The rationale never feeds back into scoring or ranking.

use std::collections::HashMap;
use std::path::Path;

use crate::error::{AnalyzerError, Result};
use crate::model::VideoRecord;
use crate::url_parser::parse_video_id;

const HIGH_REACH_VIEWS: u64 = 10_000;
const EXCEPTIONAL_ENGAGEMENT_PCT: f64 = 5.0;
const GOOD_ENGAGEMENT_PCT: f64 = 3.0;
const BREAKOUT_MAX_DAYS: i64 = 7;
const BREAKOUT_MIN_VIEWS: u64 = 1_000;
const OUTLIER_FACTOR: f64 = 2.0;

pub trait Annotator: Send + Sync {
    fn rationale(&self, video: &VideoRecord, average: f64) -> String;
}

/// Labels a video from its counters relative to fixed thresholds.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicAnnotator;

impl Annotator for HeuristicAnnotator {
    fn rationale(&self, video: &VideoRecord, average: f64) -> String {
        let engagement = video.breakdown.engagement_rate_pct;
        let mut reasons = Vec::new();

        if video.views > HIGH_REACH_VIEWS {
            reasons.push("High reach");
        }
        if engagement > EXCEPTIONAL_ENGAGEMENT_PCT {
            reasons.push("Exceptional engagement");
        } else if engagement > GOOD_ENGAGEMENT_PCT {
            reasons.push("Good engagement");
        }
        if video.breakdown.days_since_publish < BREAKOUT_MAX_DAYS
            && video.views > BREAKOUT_MIN_VIEWS
        {
            reasons.push("Recent breakout");
        }
        if average > 0.0 && video.score() > average * OUTLIER_FACTOR {
            reasons.push("Significant outlier");
        }

        if reasons.is_empty() {
            "Consistent performance".to_string()
        } else {
            reasons.join(", ")
        }
    }
}

/// Hand-written notes keyed by video id, falling back to the heuristic for
/// videos without a note.
#[derive(Debug, Clone, Default)]
pub struct ManualNotes {
    notes: HashMap<String, String>,
    fallback: HeuristicAnnotator,
}

impl ManualNotes {
    /// Loads a YAML mapping of video id (or video URL) to note text.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AnalyzerError::Config(format!("cannot read notes file {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&raw)
            .map_err(|e| AnalyzerError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn from_yaml(raw: &str) -> Result<Self> {
        let parsed: HashMap<String, String> = serde_yaml::from_str(raw)
            .map_err(|e| AnalyzerError::Config(format!("invalid notes file: {}", e)))?;
        let mut notes = HashMap::with_capacity(parsed.len());
        for (key, text) in parsed {
            let id = parse_video_id(&key)?;
            let text = text.trim().to_string();
            if !text.is_empty() {
                notes.insert(id, text);
            }
        }
        tracing::debug!(count = notes.len(), "Loaded manual notes");
        Ok(Self {
            notes,
            fallback: HeuristicAnnotator,
        })
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}

impl Annotator for ManualNotes {
    fn rationale(&self, video: &VideoRecord, average: f64) -> String {
        match self.notes.get(&video.id) {
            Some(note) => note.clone(),
            None => self.fallback.rationale(video, average),
        }
    }
}
