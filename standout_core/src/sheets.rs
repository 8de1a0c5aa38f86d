//! Spreadsheet export: one tab with every analysed video, one with the
//! standouts. Each tab is cleared (or created) and then written in a single
//! values update.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Mutex;
use std::time::Duration;

use crate::config::SheetsConfig;
use crate::error::{AnalyzerError, Result};
use crate::model::AnalysisReport;
use crate::oauth::{refresh_access_token, AuthorizedUserCredentials};
use crate::scoring::round_to;

pub const ALL_VIDEOS_SHEET: &str = "All Videos";
pub const TOP_SHEET: &str = "Top 5 Standouts";

pub const ALL_VIDEOS_HEADER: [&str; 8] = [
    "Title",
    "Views",
    "Likes",
    "Comments",
    "Days Published",
    "Engagement %",
    "Score",
    "URL",
];

pub const TOP_HEADER: [&str; 8] = [
    "Rank",
    "Title",
    "Score",
    "vs Average",
    "Views",
    "Engagement %",
    "Why It Stands Out",
    "URL",
];

pub type Row = Vec<Value>;

#[async_trait]
pub trait SheetWriter: Send + Sync {
    /// Replaces the whole content of the tab `title` with `rows`, creating the
    /// tab when it does not exist.
    async fn replace_sheet(&self, title: &str, rows: Vec<Row>) -> Result<()>;

    /// Link to the target document.
    fn document_url(&self) -> String;
}

/// Writes both tables and returns the document URL.
///
/// The two writes are independent: if the second fails the first stays
/// written. Every failure surfaces as `AnalyzerError::Export`.
pub async fn export_report(writer: &dyn SheetWriter, report: &AnalysisReport) -> Result<String> {
    tracing::info!(sheet = ALL_VIDEOS_SHEET, "Writing sheet");
    writer
        .replace_sheet(ALL_VIDEOS_SHEET, all_videos_rows(report))
        .await
        .map_err(AnalyzerError::into_export)?;

    tracing::info!(sheet = TOP_SHEET, "Writing sheet");
    writer
        .replace_sheet(TOP_SHEET, top_rows(report))
        .await
        .map_err(AnalyzerError::into_export)?;

    Ok(writer.document_url())
}

fn header(cells: &[&str]) -> Row {
    cells.iter().map(|c| json!(c)).collect()
}

pub fn format_vs_average(pct: f64) -> String {
    format!("{:+.1}%", pct)
}

/// Every video sorted by score, then a blank row and a channel footer.
pub fn all_videos_rows(report: &AnalysisReport) -> Vec<Row> {
    let summary = &report.summary;
    let mut rows = Vec::with_capacity(summary.len() + 3);
    rows.push(header(&ALL_VIDEOS_HEADER));
    for v in summary.by_score() {
        rows.push(vec![
            json!(v.title),
            json!(v.views),
            json!(v.likes),
            json!(v.comments),
            json!(v.breakdown.days_since_publish),
            json!(round_to(v.breakdown.engagement_rate_pct, 2)),
            json!(round_to(v.score(), 2)),
            json!(v.url()),
        ]);
    }
    rows.push(Vec::new());
    rows.push(vec![
        json!(format!("Channel: {}", summary.channel().title)),
        json!(format!(
            "Average Score: {:.2}",
            summary.average_score()
        )),
    ]);
    rows
}

pub fn top_rows(report: &AnalysisReport) -> Vec<Row> {
    let mut rows = Vec::with_capacity(report.top.len() + 1);
    rows.push(header(&TOP_HEADER));
    for entry in report.top.iter() {
        let v = &entry.video;
        rows.push(vec![
            json!(entry.rank),
            json!(v.title),
            json!(round_to(v.score(), 2)),
            json!(format_vs_average(entry.vs_average_pct)),
            json!(v.views),
            json!(round_to(v.breakdown.engagement_rate_pct, 2)),
            json!(entry.rationale),
            json!(v.url()),
        ]);
    }
    rows
}

/// Google Sheets v4 REST client using OAuth user credentials.
pub struct GoogleSheetsClient {
    client: Client,
    base_url: String,
    token_url: String,
    spreadsheet_id: String,
    credentials: AuthorizedUserCredentials,
    access_token: Mutex<Option<String>>,
}

impl GoogleSheetsClient {
    pub fn new(config: &SheetsConfig) -> Result<Self> {
        let credentials = AuthorizedUserCredentials::parse(&config.credentials.read()?)?;
        let client = Client::builder()
            .user_agent(concat!("standout/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token_url: config.token_url.clone(),
            spreadsheet_id: config.spreadsheet_id.clone(),
            credentials,
            access_token: Mutex::new(None),
        })
    }

    async fn token(&self) -> Result<String> {
        if let Some(token) = self.cached_token() {
            return Ok(token);
        }
        let token = match self.credentials.usable_token(Utc::now()) {
            Some(t) => t.to_string(),
            None => {
                refresh_access_token(&self.client, &self.token_url, &self.credentials).await?
            }
        };
        if let Ok(mut guard) = self.access_token.lock() {
            *guard = Some(token.clone());
        }
        Ok(token)
    }

    fn cached_token(&self) -> Option<String> {
        self.access_token.lock().ok().and_then(|g| g.clone())
    }

    fn spreadsheet_url(&self) -> String {
        format!("{}/spreadsheets/{}", self.base_url, self.spreadsheet_id)
    }

    fn values_url(&self, range: &str) -> String {
        format!(
            "{}/values/{}",
            self.spreadsheet_url(),
            urlencoding::encode(range)
        )
    }

    async fn send(&self, req: reqwest::RequestBuilder) -> Result<Value> {
        let token = self.token().await?;
        let resp = req.bearer_auth(token).send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            let message = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
                .unwrap_or(body);
            return Err(AnalyzerError::Upstream {
                status: status.as_u16(),
                message,
            });
        }
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body)?)
    }

    pub async fn sheet_titles(&self) -> Result<Vec<String>> {
        let v = self
            .send(
                self.client
                    .get(self.spreadsheet_url())
                    .query(&[("fields", "sheets.properties.title")]),
            )
            .await?;
        let parsed: SpreadsheetMeta = serde_json::from_value(v)?;
        Ok(parsed
            .sheets
            .into_iter()
            .map(|s| s.properties.title)
            .collect())
    }

    async fn add_sheet(&self, title: &str) -> Result<()> {
        tracing::debug!(%title, "Creating sheet");
        let body = json!({
            "requests": [{ "addSheet": { "properties": { "title": title } } }]
        });
        self.send(
            self.client
                .post(format!("{}:batchUpdate", self.spreadsheet_url()))
                .json(&body),
        )
        .await?;
        Ok(())
    }

    async fn clear(&self, title: &str) -> Result<()> {
        tracing::debug!(%title, "Clearing sheet");
        self.send(
            self.client
                .post(format!("{}:clear", self.values_url(&quote_title(title))))
                .json(&json!({})),
        )
        .await?;
        Ok(())
    }

    async fn write_rows(&self, title: &str, rows: Vec<Row>) -> Result<()> {
        let range = format!("{}!A1", quote_title(title));
        tracing::debug!(%range, rows = rows.len(), "Writing rows");
        let body = json!({ "majorDimension": "ROWS", "values": rows });
        self.send(
            self.client
                .put(self.values_url(&range))
                .query(&[("valueInputOption", "RAW")])
                .json(&body),
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl SheetWriter for GoogleSheetsClient {
    async fn replace_sheet(&self, title: &str, rows: Vec<Row>) -> Result<()> {
        let titles = self.sheet_titles().await?;
        if titles.iter().any(|t| t == title) {
            self.clear(title).await?;
        } else {
            self.add_sheet(title).await?;
        }
        self.write_rows(title, rows).await
    }

    fn document_url(&self) -> String {
        format!(
            "https://docs.google.com/spreadsheets/d/{}",
            self.spreadsheet_id
        )
    }
}

/// A1 notation needs sheet names with spaces wrapped in single quotes.
fn quote_title(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    title: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotate::HeuristicAnnotator;
    use crate::model::{ChannelRef, ChannelSummary, VideoMetrics, VideoRecord};
    use crate::selection::select_standouts;
    use chrono::{DateTime, Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    fn report() -> AnalysisReport {
        let videos = [
            ("aaaaaaaaaaa", 10_000, 500, 100, 5),
            ("bbbbbbbbbbb", 100, 1, 0, 20),
        ]
        .into_iter()
        .map(|(id, views, likes, comments, age)| {
                VideoRecord::from_metrics(
                    VideoMetrics {
                        id: id.into(),
                        title: format!("Title {id}"),
                        published_at: now() - Duration::days(age),
                        views,
                        likes,
                        comments,
                    },
                    now(),
                )
            })
            .collect();
        let summary = ChannelSummary::new(
            ChannelRef {
                id: "UC1".into(),
                title: "My Channel".into(),
            },
            videos,
        )
        .unwrap();
        let top = select_standouts(&summary, 5, &HeuristicAnnotator);
        AnalysisReport {
            source_url: "https://youtu.be/aaaaaaaaaaa".into(),
            video_id: "aaaaaaaaaaa".into(),
            generated_at: now(),
            summary,
            top,
            skipped: vec![],
        }
    }

    #[test]
    fn all_videos_layout() {
        let rows = all_videos_rows(&report());
        assert_eq!(rows[0], header(&ALL_VIDEOS_HEADER));
        // header + 2 videos + blank + footer
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[1][0], json!("Title aaaaaaaaaaa"));
        assert_eq!(rows[1][4], json!(5));
        assert_eq!(rows[1][6], json!(983.0));
        assert_eq!(rows[1][7], json!("https://www.youtube.com/watch?v=aaaaaaaaaaa"));
        assert!(rows[3].is_empty());
        assert_eq!(rows[4][0], json!("Channel: My Channel"));
        assert!(rows[4][1].as_str().unwrap().starts_with("Average Score: "));
    }

    #[test]
    fn top_layout() {
        let r = report();
        let rows = top_rows(&r);
        assert_eq!(rows[0], header(&TOP_HEADER));
        assert_eq!(rows.len(), 1 + r.top.len());
        assert_eq!(rows[1][0], json!(1));
        assert!(rows[1][3].as_str().unwrap().starts_with('+'));
        assert!(rows[1][3].as_str().unwrap().ends_with('%'));
    }

    #[test]
    fn vs_average_formatting() {
        assert_eq!(format_vs_average(12.34), "+12.3%");
        assert_eq!(format_vs_average(0.0), "+0.0%");
    }

    #[test]
    fn titles_are_quoted_for_ranges() {
        assert_eq!(quote_title("All Videos"), "'All Videos'");
        assert_eq!(quote_title("Bob's"), "'Bob''s'");
    }
}
