//! Runtime configuration, resolved once at startup from flags and the
//! environment and then passed by reference to each component.

use std::path::{Path, PathBuf};

use crate::error::{AnalyzerError, Result};

pub const DEFAULT_YOUTUBE_BASE: &str = "https://www.googleapis.com/youtube/v3";
pub const DEFAULT_SHEETS_BASE: &str = "https://sheets.googleapis.com/v4";
pub const DEFAULT_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

pub const ENV_API_KEY: &str = "YOUTUBE_API_KEY";
pub const ENV_API_BASE: &str = "YOUTUBE_API_BASE";
pub const ENV_SHEETS_ID: &str = "GOOGLE_SHEETS_ID";
pub const ENV_TOKEN_JSON: &str = "GOOGLE_TOKEN_JSON";
pub const ENV_TOKEN_PATH: &str = "GOOGLE_TOKEN_PATH";

const TOKEN_FILE: &str = "token.json";
const APP_DIR: &str = "standout";

#[derive(Debug, Clone)]
pub struct YouTubeConfig {
    pub api_key: String,
    pub base_url: String,
}

impl YouTubeConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_YOUTUBE_BASE.to_string(),
        }
    }
}

/// Where the OAuth authorized-user credentials come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialsSource {
    Inline(String),
    File(PathBuf),
}

impl CredentialsSource {
    pub fn read(&self) -> Result<String> {
        match self {
            CredentialsSource::Inline(raw) => Ok(raw.clone()),
            CredentialsSource::File(path) => std::fs::read_to_string(path).map_err(|e| {
                AnalyzerError::Config(format!(
                    "cannot read credentials file {}: {}",
                    path.display(),
                    e
                ))
            }),
        }
    }
}

impl std::fmt::Display for CredentialsSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CredentialsSource::Inline(_) => write!(f, "${}", ENV_TOKEN_JSON),
            CredentialsSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SheetsConfig {
    pub spreadsheet_id: String,
    pub credentials: CredentialsSource,
    pub base_url: String,
    pub token_url: String,
}

impl SheetsConfig {
    pub fn new(spreadsheet_id: impl Into<String>, credentials: CredentialsSource) -> Self {
        Self {
            spreadsheet_id: spreadsheet_id.into(),
            credentials,
            base_url: DEFAULT_SHEETS_BASE.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
        }
    }
}

/// Values supplied on the command line; they win over the environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub api_key: Option<String>,
    pub spreadsheet_id: Option<String>,
    pub credentials_path: Option<PathBuf>,
    pub skip_export: bool,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub youtube: YouTubeConfig,
    /// `None` when export is disabled.
    pub sheets: Option<SheetsConfig>,
}

impl Config {
    pub fn from_env(overrides: &ConfigOverrides) -> Result<Self> {
        Self::from_lookup(
            |key| std::env::var(key).ok(),
            overrides,
            &default_token_paths(),
        )
    }

    /// Resolves configuration through `lookup` instead of the process
    /// environment. `token_paths` are tried in order when neither inline
    /// credentials nor an explicit path are given.
    pub fn from_lookup<F>(
        lookup: F,
        overrides: &ConfigOverrides,
        token_paths: &[PathBuf],
    ) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = non_empty(overrides.api_key.clone())
            .or_else(|| get(ENV_API_KEY))
            .ok_or_else(|| missing(ENV_API_KEY))?;
        let youtube = YouTubeConfig {
            api_key,
            base_url: get(ENV_API_BASE).unwrap_or_else(|| DEFAULT_YOUTUBE_BASE.to_string()),
        };

        if overrides.skip_export {
            return Ok(Self {
                youtube,
                sheets: None,
            });
        }

        let spreadsheet_id = non_empty(overrides.spreadsheet_id.clone())
            .or_else(|| get(ENV_SHEETS_ID))
            .ok_or_else(|| missing(ENV_SHEETS_ID))?;
        let credentials = resolve_credentials(&get, overrides, token_paths)?;
        tracing::debug!(%credentials, "Using OAuth credentials");

        Ok(Self {
            youtube,
            sheets: Some(SheetsConfig::new(spreadsheet_id, credentials)),
        })
    }
}

fn resolve_credentials<G>(
    get: &G,
    overrides: &ConfigOverrides,
    token_paths: &[PathBuf],
) -> Result<CredentialsSource>
where
    G: Fn(&str) -> Option<String>,
{
    if let Some(raw) = get(ENV_TOKEN_JSON) {
        return Ok(CredentialsSource::Inline(raw));
    }
    let explicit = overrides
        .credentials_path
        .clone()
        .filter(|p| !p.as_os_str().is_empty())
        .or_else(|| get(ENV_TOKEN_PATH).map(PathBuf::from));
    if let Some(path) = explicit {
        if !path.is_file() {
            return Err(AnalyzerError::Config(format!(
                "credentials file not found: {}",
                path.display()
            )));
        }
        return Ok(CredentialsSource::File(path));
    }
    token_paths
        .iter()
        .find(|p| p.is_file())
        .map(|p| CredentialsSource::File(p.clone()))
        .ok_or_else(|| {
            AnalyzerError::Config(format!(
                "no OAuth credentials found; set {} or {}, or place {} in the working directory",
                ENV_TOKEN_JSON, ENV_TOKEN_PATH, TOKEN_FILE
            ))
        })
}

/// `./token.json`, then `<config dir>/standout/token.json`.
pub fn default_token_paths() -> Vec<PathBuf> {
    let mut paths = vec![Path::new(TOKEN_FILE).to_path_buf()];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join(APP_DIR).join(TOKEN_FILE));
    }
    paths
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn missing(key: &str) -> AnalyzerError {
    AnalyzerError::Config(format!("{} is not set", key))
}
