use crate::cli::OutputFormat;
use crate::commands::{CommandError, Result};
use owo_colors::Style;
use serde::Serialize;
use serde_json::json;
use standout_core::scoring::round_to;
use standout_core::sheets::format_vs_average;
use standout_core::AnalysisReport;

mod pretty;
pub use pretty::format_pretty;

/// What gets printed for one run: the report plus the export outcome.
#[derive(Debug, Serialize)]
pub struct ReportOutput<'a> {
    #[serde(flatten)]
    pub report: &'a AnalysisReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spreadsheet_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export_error: Option<String>,
}

impl<'a> ReportOutput<'a> {
    pub fn new(report: &'a AnalysisReport) -> Self {
        Self {
            report,
            spreadsheet_url: None,
            export_error: None,
        }
    }
}

/// Terminal styles; all plain when color is off.
#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub heading: Style,
    pub accent: Style,
    pub good: Style,
    pub dim: Style,
    pub warn: Style,
}

impl Theme {
    pub fn new(color: bool) -> Self {
        if !color {
            return Self {
                heading: Style::new(),
                accent: Style::new(),
                good: Style::new(),
                dim: Style::new(),
                warn: Style::new(),
            };
        }
        Self {
            heading: Style::new().cyan().bold(),
            accent: Style::new().bold(),
            good: Style::new().green(),
            dim: Style::new().dimmed(),
            warn: Style::new().yellow(),
        }
    }
}

pub fn format_output(out: &ReportOutput<'_>, format: OutputFormat, theme: &Theme) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(out)?);
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yaml::to_string(out)?);
        }
        OutputFormat::Text => {
            print!("{}", format_text(out.report));
        }
        OutputFormat::Pretty => {
            print!("{}", format_pretty(out.report, theme));
        }
    }
    Ok(())
}

/// `{"error": {"code", "message"}}` for machine-readable output modes.
pub fn error_document(err: &CommandError) -> serde_json::Value {
    json!({ "error": err.to_json() })
}

pub fn format_error(err: &CommandError, format: OutputFormat) -> Result<String> {
    let doc = error_document(err);
    Ok(match format {
        OutputFormat::Yaml => serde_yaml::to_string(&doc)?,
        _ => format!("{}\n", serde_json::to_string_pretty(&doc)?),
    })
}

/// Tab-separated rendering, one line per record.
pub fn format_text(report: &AnalysisReport) -> String {
    let summary = &report.summary;
    let mut out = String::new();
    out.push_str(&format!(
        "channel\t{}\t{}\n",
        summary.channel().id,
        summary.channel().title
    ));
    out.push_str(&format!(
        "average\t{:.2}\nvideos\t{}\n",
        summary.average_score(),
        summary.len()
    ));
    for entry in report.top.iter() {
        out.push_str(&format!(
            "top\t{}\t{}\t{:.2}\t{}\t{}\t{}\n",
            entry.rank,
            entry.video.id,
            entry.video.score(),
            format_vs_average(entry.vs_average_pct),
            entry.video.title,
            entry.rationale
        ));
    }
    for v in summary.by_score() {
        out.push_str(&format!(
            "video\t{}\t{:.2}\t{}\t{}\t{}\t{}\t{}\t{}\n",
            v.id,
            v.score(),
            v.views,
            v.likes,
            v.comments,
            v.breakdown.days_since_publish,
            round_to(v.breakdown.engagement_rate_pct, 2),
            v.title
        ));
    }
    for s in &report.skipped {
        out.push_str(&format!("skipped\t{}\t{}\t{}\n", s.id, s.reason, s.title));
    }
    out
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::{Duration, TimeZone, Utc};
    use standout_core::selection::select_standouts;
    use standout_core::{
        AnalysisReport, ChannelRef, ChannelSummary, HeuristicAnnotator, SkipReason, SkippedVideo,
        VideoMetrics, VideoRecord,
    };

    pub fn report() -> AnalysisReport {
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();
        let videos = [("aaaaaaaaaaa", 40_000), ("bbbbbbbbbbb", 300), ("ccccccccccc", 100)]
            .into_iter()
            .map(|(id, views)| {
                VideoRecord::from_metrics(
                    VideoMetrics {
                        id: id.into(),
                        title: format!("Video {id}"),
                        published_at: now - Duration::days(4),
                        views,
                        likes: views / 25,
                        comments: 3,
                    },
                    now,
                )
            })
            .collect();
        let summary = ChannelSummary::new(
            ChannelRef {
                id: "UC1".into(),
                title: "Test Channel".into(),
            },
            videos,
        )
        .unwrap();
        let top = select_standouts(&summary, 5, &HeuristicAnnotator);
        AnalysisReport {
            source_url: "https://youtu.be/aaaaaaaaaaa".into(),
            video_id: "aaaaaaaaaaa".into(),
            generated_at: now,
            summary,
            top,
            skipped: vec![SkippedVideo {
                id: "ddddddddddd".into(),
                title: "Gone".into(),
                reason: SkipReason::Removed,
            }],
        }
    }
}
