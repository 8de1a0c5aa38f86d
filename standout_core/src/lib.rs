// src/lib.rs
pub mod analyzer;
pub mod annotate;
pub mod config;
pub mod error;
pub mod model;
pub mod oauth;
pub mod scoring;
pub mod selection;
pub mod sheets;
pub mod url_parser;
pub mod youtube;

pub use crate::analyzer::Analyzer;
pub use crate::annotate::{Annotator, HeuristicAnnotator, ManualNotes};
pub use crate::config::{Config, ConfigOverrides, CredentialsSource, SheetsConfig, YouTubeConfig};
pub use crate::error::{AnalyzerError, Result};
pub use crate::model::{
    AnalysisReport, ChannelRef, ChannelSummary, FetchOutcome, SkipReason, SkippedVideo,
    StandoutEntry, TopSelection, UploadRef, VideoMetrics, VideoRecord,
};
pub use crate::sheets::{export_report, GoogleSheetsClient, SheetWriter};
pub use crate::url_parser::parse_video_id;
pub use crate::youtube::{fetch_all, VideoPlatform, YouTubeClient};
