use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "standout")]
#[command(about = "Find the recent uploads that outperform their channel's average")]
#[command(version)]
#[command(after_help = "\x1b[1;36mExamples:\x1b[0m
  standout https://www.youtube.com/watch?v=dQw4w9WgXcQ
  standout https://youtu.be/dQw4w9WgXcQ --no-export --output json
  standout <URL> --notes notes.yaml       Use hand-written rationales

\x1b[1;36mEnvironment:\x1b[0m
  YOUTUBE_API_KEY       YouTube Data API key (required)
  GOOGLE_SHEETS_ID      Target spreadsheet (required unless --no-export)
  GOOGLE_TOKEN_JSON     Inline OAuth authorized-user JSON
  GOOGLE_TOKEN_PATH     Path to the OAuth authorized-user JSON (default ./token.json)
  RUST_LOG              Log filter, overrides -v")]
pub struct Cli {
    /// URL of any video on the channel to analyse
    pub url: String,

    /// Number of recent uploads to analyse (1-10)
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u8).range(1..=10))]
    pub limit: u8,

    /// Maximum number of standout videos to report (1-5)
    #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u8).range(1..=5))]
    pub top: u8,

    /// YAML file mapping video ids to hand-written rationales
    #[arg(long, value_name = "FILE")]
    pub notes: Option<PathBuf>,

    /// Skip the spreadsheet export
    #[arg(long)]
    pub no_export: bool,

    /// YouTube Data API key
    #[arg(long, env = "YOUTUBE_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Spreadsheet document id to write to
    #[arg(long, env = "GOOGLE_SHEETS_ID")]
    pub spreadsheet_id: Option<String>,

    /// Path to OAuth authorized-user credentials
    #[arg(long, value_name = "PATH", env = "GOOGLE_TOKEN_PATH")]
    pub credentials: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Pretty)]
    pub output: OutputFormat,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Verbose output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable tables
    Pretty,
    /// Plain tab-separated text
    Text,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
}

impl OutputFormat {
    pub fn is_machine(self) -> bool {
        matches!(self, OutputFormat::Json | OutputFormat::Yaml)
    }
}
