use std::cmp::Ordering;

use crate::annotate::Annotator;
use crate::model::{ChannelSummary, StandoutEntry, TopSelection, VideoRecord};
use crate::scoring::round_to;

pub const DEFAULT_TOP: usize = 5;

/// Ranking order: score descending, then newer uploads first, then id.
pub fn rank_order(a: &VideoRecord, b: &VideoRecord) -> Ordering {
    b.score()
        .partial_cmp(&a.score())
        .unwrap_or(Ordering::Equal)
        .then_with(|| b.published_at.cmp(&a.published_at))
        .then_with(|| a.id.cmp(&b.id))
}

/// Percentage by which `score` exceeds `average`, one decimal. Zero when the
/// average is zero.
pub fn vs_average_pct(score: f64, average: f64) -> f64 {
    if average == 0.0 {
        return 0.0;
    }
    round_to((score / average - 1.0) * 100.0, 1)
}

/// Picks up to `limit` videos whose score is strictly above the channel
/// average, best first, and annotates each with a rationale. `limit` never
/// exceeds [`DEFAULT_TOP`].
pub fn select_standouts(
    summary: &ChannelSummary,
    limit: usize,
    annotator: &dyn Annotator,
) -> TopSelection {
    let average = summary.average_score();
    let mut above: Vec<&VideoRecord> = summary
        .videos()
        .iter()
        .filter(|v| v.score() > average)
        .collect();
    above.sort_by(|a, b| rank_order(a, b));

    let entries = above
        .into_iter()
        .take(limit.min(DEFAULT_TOP))
        .enumerate()
        .map(|(i, video)| StandoutEntry {
            rank: i + 1,
            vs_average_pct: vs_average_pct(video.score(), average),
            rationale: annotator.rationale(video, average),
            video: video.clone(),
        })
        .collect();
    TopSelection { entries }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotate::HeuristicAnnotator;
    use crate::model::{ChannelRef, VideoMetrics};
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    fn video(id: &str, views: u64, age_days: i64) -> VideoRecord {
        VideoRecord::from_metrics(
            VideoMetrics {
                id: id.into(),
                title: id.to_uppercase(),
                published_at: now() - Duration::days(age_days),
                views,
                likes: 0,
                comments: 0,
            },
            now(),
        )
    }

    fn summary(videos: Vec<VideoRecord>) -> ChannelSummary {
        ChannelSummary::new(
            ChannelRef {
                id: "UC1".into(),
                title: "Chan".into(),
            },
            videos,
        )
        .unwrap()
    }

    #[test]
    fn ties_at_the_average_are_excluded() {
        let s = summary(vec![video("a", 1_000, 10), video("b", 1_000, 10)]);
        let top = select_standouts(&s, DEFAULT_TOP, &HeuristicAnnotator);
        assert!(top.is_empty());
    }

    #[test]
    fn selection_is_capped_and_above_average() {
        let mut videos: Vec<_> = (0..9)
            .map(|i| video(&format!("v{i}"), 1_000 * (i + 1), 10))
            .collect();
        videos.push(video("huge", 1_000_000, 10));
        let s = summary(videos);
        let top = select_standouts(&s, DEFAULT_TOP, &HeuristicAnnotator);
        assert!(top.len() <= DEFAULT_TOP);
        assert!(top.len() <= s.len());
        for entry in top.iter() {
            assert!(entry.video.score() > s.average_score());
        }
        assert_eq!(top.entries[0].video.id, "huge");
        assert_eq!(top.entries[0].rank, 1);
    }

    #[test]
    fn at_most_limit_entries() {
        let mut videos: Vec<_> = (0..7).map(|i| video(&format!("hi{i}"), 10_000, 10)).collect();
        videos.extend((0..3).map(|i| video(&format!("lo{i}"), 10, 10)));
        let s = summary(videos);
        let top = select_standouts(&s, DEFAULT_TOP, &HeuristicAnnotator);
        assert_eq!(top.len(), DEFAULT_TOP);
        let ranks: Vec<_> = top.iter().map(|e| e.rank).collect();
        assert_eq!(ranks, [1, 2, 3, 4, 5]);
    }

    #[test]
    fn larger_limits_are_capped_at_five() {
        let mut videos: Vec<_> = (0..8).map(|i| video(&format!("hi{i}"), 10_000, 10)).collect();
        videos.extend((0..2).map(|i| video(&format!("lo{i}"), 10, 10)));
        let s = summary(videos);
        let top = select_standouts(&s, 8, &HeuristicAnnotator);
        assert_eq!(top.len(), DEFAULT_TOP);
        assert_eq!(top.entries.last().map(|e| e.rank), Some(DEFAULT_TOP));
    }

    #[test]
    fn equal_scores_prefer_newer_then_id() {
        // Identical scores; only publish time and id differ.
        let older = VideoRecord {
            published_at: now() - Duration::days(2) - Duration::hours(3),
            ..video("bbbbbbbbbbb", 2_000, 2)
        };
        let newer = video("zzzzzzzzzzz", 2_000, 2);
        let same = video("aaaaaaaaaaa", 2_000, 2);
        let mut v = vec![&older, &newer, &same];
        v.sort_by(|a, b| rank_order(a, b));
        let ids: Vec<_> = v.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["aaaaaaaaaaa", "zzzzzzzzzzz", "bbbbbbbbbbb"]);
    }

    #[test]
    fn vs_average_is_rounded_and_guarded() {
        assert_eq!(vs_average_pct(150.0, 100.0), 50.0);
        assert_eq!(vs_average_pct(1.0, 3.0), -66.7);
        assert_eq!(vs_average_pct(10.0, 0.0), 0.0);
    }
}
