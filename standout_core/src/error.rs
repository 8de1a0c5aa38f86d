// src/error.rs
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum AnalyzerError {
    #[error("Invalid video URL: {0}")]
    InvalidUrl(String),

    #[error("Video not found, private or deleted: {0}")]
    VideoNotFound(String),

    #[error("API quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("Spreadsheet export failed: {0}")]
    Export(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("No videos to analyze: {0}")]
    NoUploads(String),

    #[error("Upstream error ({status}): {message}")]
    Upstream { status: u16, message: String },

    #[error("HTTP request error: {0}")]
    HttpRequest(#[from] reqwest::Error),

    #[error("Serde JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AnalyzerError {
    pub fn code_str(&self) -> &'static str {
        match self {
            AnalyzerError::InvalidUrl(_) => "invalid_url",
            AnalyzerError::VideoNotFound(_) => "video_not_found",
            AnalyzerError::QuotaExceeded(_) => "quota_exceeded",
            AnalyzerError::Export(_) => "export_failed",
            AnalyzerError::Config(_) => "invalid_config",
            AnalyzerError::Authentication(_) => "auth_failed",
            AnalyzerError::NoUploads(_) => "no_uploads",
            AnalyzerError::Upstream { .. } => "upstream_error",
            AnalyzerError::HttpRequest(_) => "upstream_error",
            AnalyzerError::SerdeJson(_) => "parse_error",
            AnalyzerError::Io(_) => "io_error",
        }
    }

    /// Wraps any failure raised while talking to the spreadsheet service so the
    /// caller sees a single export error kind.
    pub fn into_export(self) -> Self {
        match self {
            AnalyzerError::Export(_) => self,
            other => AnalyzerError::Export(other.to_string()),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "code": self.code_str(),
            "message": self.to_string(),
        })
    }
}

pub type Result<T> = std::result::Result<T, AnalyzerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn export_wrapping_keeps_message() {
        let err = AnalyzerError::Authentication("refresh failed".into()).into_export();
        assert!(matches!(err, AnalyzerError::Export(_)));
        assert_eq!(err.code_str(), "export_failed");
        assert!(err.to_string().contains("refresh failed"));
    }

    #[test]
    fn quota_message_is_verbatim() {
        let err = AnalyzerError::QuotaExceeded("The request cannot be completed".into());
        let v = err.to_json();
        assert_eq!(v["code"], "quota_exceeded");
        assert_eq!(
            v["message"],
            "API quota exceeded: The request cannot be completed"
        );
    }
}
