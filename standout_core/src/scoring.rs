//! Composite "standout" score.
//!
//! score = 0.4 * views_per_day + 0.3 * (engagement_rate_pct * 100) + 0.3 * (views / 1000)
//!
//! The first term rewards reach normalized by age, the second rewards
//! engagement and the third rewards absolute reach.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const VIEWS_PER_DAY_WEIGHT: f64 = 0.4;
pub const ENGAGEMENT_WEIGHT: f64 = 0.3;
pub const REACH_WEIGHT: f64 = 0.3;

/// Per-video score components, kept so they can be shown next to the score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub days_since_publish: i64,
    pub views_per_day: f64,
    pub engagement_rate_pct: f64,
    pub score: f64,
}

impl ScoreBreakdown {
    pub fn compute(
        views: u64,
        likes: u64,
        comments: u64,
        published_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Self {
        let days_since_publish = days_since_publish(published_at, now);
        let views_per_day = views_per_day(views, days_since_publish);
        let engagement_rate_pct = engagement_rate_pct(views, likes, comments);
        Self {
            days_since_publish,
            views_per_day,
            engagement_rate_pct,
            score: composite_score(views_per_day, engagement_rate_pct, views),
        }
    }
}

/// Whole days between `published_at` and `now`, floored at 1 so same-day and
/// future-dated uploads never divide by zero.
pub fn days_since_publish(published_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - published_at).num_days().max(1)
}

pub fn views_per_day(views: u64, days_since_publish: i64) -> f64 {
    views as f64 / days_since_publish.max(1) as f64
}

/// `(likes + comments) / views * 100`, or 0 when there are no views.
pub fn engagement_rate_pct(views: u64, likes: u64, comments: u64) -> f64 {
    if views == 0 {
        return 0.0;
    }
    (likes.saturating_add(comments)) as f64 / views as f64 * 100.0
}

pub fn composite_score(views_per_day: f64, engagement_rate_pct: f64, views: u64) -> f64 {
    VIEWS_PER_DAY_WEIGHT * views_per_day
        + ENGAGEMENT_WEIGHT * (engagement_rate_pct * 100.0)
        + REACH_WEIGHT * (views as f64 / 1000.0)
}

/// Arithmetic mean; 0 for an empty slice.
pub fn average_score(scores: impl IntoIterator<Item = f64>) -> f64 {
    let (sum, count) = scores
        .into_iter()
        .fold((0.0_f64, 0_usize), |(sum, count), s| (sum + s, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Rounds for display; scores themselves keep full precision.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10_f64.powi(decimals as i32);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn worked_example_scores_983() {
        let published = now() - Duration::days(5);
        let b = ScoreBreakdown::compute(10_000, 500, 100, published, now());
        assert_eq!(b.days_since_publish, 5);
        assert!((b.views_per_day - 2000.0).abs() < 1e-9);
        assert!((b.engagement_rate_pct - 6.0).abs() < 1e-9);
        assert!((b.score - 983.0).abs() < 1e-9);
    }

    #[test]
    fn same_day_upload_counts_as_one_day() {
        assert_eq!(days_since_publish(now(), now()), 1);
        assert_eq!(days_since_publish(now() - Duration::hours(23), now()), 1);
    }

    #[test]
    fn future_timestamp_is_floored() {
        assert_eq!(days_since_publish(now() + Duration::days(3), now()), 1);
    }

    #[test]
    fn partial_days_are_truncated() {
        let published = now() - Duration::days(2) - Duration::hours(20);
        assert_eq!(days_since_publish(published, now()), 2);
    }

    #[test]
    fn zero_views_short_circuits_engagement() {
        assert_eq!(engagement_rate_pct(0, 10, 5), 0.0);
        let b = ScoreBreakdown::compute(0, 10, 5, now(), now());
        assert_eq!(b.score, 0.0);
    }

    #[test]
    fn engagement_rate_formula() {
        assert!((engagement_rate_pct(200, 10, 10) - 10.0).abs() < 1e-9);
        assert_eq!(engagement_rate_pct(100, 0, 0), 0.0);
    }

    #[test]
    fn score_is_monotonic_in_each_term() {
        let base = composite_score(100.0, 2.0, 5_000);
        assert!(composite_score(101.0, 2.0, 5_000) >= base);
        assert!(composite_score(100.0, 2.5, 5_000) >= base);
        assert!(composite_score(100.0, 2.0, 6_000) >= base);
    }

    #[test]
    fn average_of_empty_is_zero() {
        assert_eq!(average_score(Vec::<f64>::new()), 0.0);
        assert!((average_score([1.0, 2.0, 6.0]) - 3.0).abs() < 1e-9);
    }

    #[test]
    fn rounding_for_display() {
        assert_eq!(round_to(983.456, 2), 983.46);
        assert_eq!(round_to(12.34, 1), 12.3);
    }
}
