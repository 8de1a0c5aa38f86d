pub mod analyze;

use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("{0}")]
    Core(#[from] standout_core::AnalyzerError),

    /// A failure already recorded in the printed report.
    #[error("{0}")]
    Reported(standout_core::AnalyzerError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl CommandError {
    pub fn code_str(&self) -> &'static str {
        match self {
            CommandError::Core(e) | CommandError::Reported(e) => e.code_str(),
            CommandError::Serialization(_) | CommandError::Yaml(_) => "output_error",
            CommandError::Io(_) => "io_error",
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            CommandError::Core(e) | CommandError::Reported(e) => e.to_json(),
            other => json!({
                "code": other.code_str(),
                "message": other.to_string(),
            }),
        }
    }

    /// Whether stdout already carries a document describing this failure.
    pub fn is_reported(&self) -> bool {
        matches!(self, CommandError::Reported(_))
    }
}

pub type Result<T> = std::result::Result<T, CommandError>;
