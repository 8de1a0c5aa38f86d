//! Video id extraction for the URL shapes the platform hands out.
//!
//! Long links carry the id in the `v` query parameter, short links carry it as
//! the first path segment, and embed/shorts/live links carry it after a fixed
//! path prefix. Ids are always 11 characters of `[A-Za-z0-9_-]`.

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::error::{AnalyzerError, Result};

static VIDEO_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]{11}$").expect("valid video id regex"));

const PATH_PREFIXES: [&str; 4] = ["embed", "shorts", "live", "v"];

/// Extract the video id from `input`.
///
/// Accepts full and scheme-less URLs as well as a bare id.
pub fn parse_video_id(input: &str) -> Result<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(AnalyzerError::InvalidUrl("empty input".to_string()));
    }

    if is_video_id(trimmed) {
        return Ok(trimmed.to_string());
    }

    let with_scheme = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let url = Url::parse(&with_scheme)
        .map_err(|e| AnalyzerError::InvalidUrl(format!("{}: {}", trimmed, e)))?;

    extract_from_url(&url)
        .ok_or_else(|| AnalyzerError::InvalidUrl(format!("no video id found in {}", trimmed)))
}

pub fn is_video_id(candidate: &str) -> bool {
    VIDEO_ID_RE.is_match(candidate)
}

fn extract_from_url(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_ascii_lowercase();
    let host = host
        .strip_prefix("www.")
        .or_else(|| host.strip_prefix("m."))
        .or_else(|| host.strip_prefix("music."))
        .unwrap_or(&host);

    let mut segments = url.path_segments()?.filter(|s| !s.is_empty());

    match host {
        "youtu.be" => segments
            .next()
            .filter(|id| is_video_id(id))
            .map(str::to_string),
        "youtube.com" | "youtube-nocookie.com" => {
            if let Some((_, id)) = url.query_pairs().find(|(key, _)| key == "v") {
                return is_video_id(&id).then(|| id.into_owned());
            }
            let prefix = segments.next()?;
            if !PATH_PREFIXES.contains(&prefix) {
                return None;
            }
            segments
                .next()
                .filter(|id| is_video_id(id))
                .map(str::to_string)
        }
        _ => None,
    }
}
