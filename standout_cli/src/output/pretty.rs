use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, ContentArrangement, Table};
use owo_colors::OwoColorize;
use standout_core::scoring::round_to;
use standout_core::sheets::format_vs_average;
use standout_core::AnalysisReport;

use super::Theme;

const TITLE_WIDTH: usize = 48;
const RATIONALE_WIDTH: usize = 40;

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

fn thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

pub fn format_pretty(report: &AnalysisReport, theme: &Theme) -> String {
    let summary = &report.summary;
    let mut out = String::new();

    out.push('\n');
    out.push_str(&format!(
        "{} {}\n",
        summary.channel().title.style(theme.heading),
        format!("({})", summary.channel().id).style(theme.dim)
    ));
    out.push_str(&format!(
        "{} {}   {} {}\n\n",
        "Videos analysed:".style(theme.dim),
        summary.len().style(theme.accent),
        "Average score:".style(theme.dim),
        format!("{:.2}", summary.average_score()).style(theme.accent)
    ));

    out.push_str(&format!("{}\n", "Top Standouts".style(theme.heading)));
    if report.top.is_empty() {
        out.push_str(&format!(
            "{}\n\n",
            "No video scored above the channel average.".style(theme.dim)
        ));
    } else {
        let mut table = new_table(vec![
            "#",
            "Title",
            "Score",
            "vs Avg",
            "Views",
            "Likes",
            "Eng %",
            "Why It Stands Out",
        ]);
        for entry in report.top.iter() {
            let v = &entry.video;
            table.add_row(vec![
                entry.rank.to_string(),
                truncate(&v.title, TITLE_WIDTH),
                format!("{:.2}", v.score()),
                format_vs_average(entry.vs_average_pct),
                thousands(v.views),
                thousands(v.likes),
                format!("{:.2}", round_to(v.breakdown.engagement_rate_pct, 2)),
                truncate(&entry.rationale, RATIONALE_WIDTH),
            ]);
        }
        out.push_str(&format!("{}\n\n", table));
    }

    out.push_str(&format!("{}\n", "All Videos".style(theme.heading)));
    let mut table = new_table(vec![
        "Title", "Score", "Views", "Likes", "Comments", "Days", "Eng %", "URL",
    ]);
    for v in summary.by_score() {
        table.add_row(vec![
            truncate(&v.title, TITLE_WIDTH),
            format!("{:.2}", v.score()),
            thousands(v.views),
            thousands(v.likes),
            thousands(v.comments),
            v.breakdown.days_since_publish.to_string(),
            format!("{:.2}", round_to(v.breakdown.engagement_rate_pct, 2)),
            v.url(),
        ]);
    }
    out.push_str(&format!("{}\n", table));

    if !report.skipped.is_empty() {
        out.push('\n');
        out.push_str(&format!("{}\n", "Skipped".style(theme.warn)));
        for s in &report.skipped {
            out.push_str(&format!(
                "  {}\n",
                format!("{} {} ({})", s.id, s.title, s.reason).style(theme.dim)
            ));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::test_support;

    #[test]
    fn thousands_separators() {
        assert_eq!(thousands(0), "0");
        assert_eq!(thousands(999), "999");
        assert_eq!(thousands(1_000), "1,000");
        assert_eq!(thousands(1_234_567), "1,234,567");
    }

    #[test]
    fn long_titles_are_truncated() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghijkl", 5), "abcd…");
    }

    #[test]
    fn plain_rendering_lists_everything() {
        let report = test_support::report();
        let text = format_pretty(&report, &Theme::new(false));
        assert!(text.contains("Test Channel (UC1)"));
        assert!(text.contains("Top Standouts"));
        assert!(text.contains("Video aaaaaaaaaaa"));
        assert!(text.contains("ddddddddddd Gone (removed)"));
        assert!(!text.contains('\x1b'));
    }
}
