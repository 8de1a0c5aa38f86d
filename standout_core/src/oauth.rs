use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AnalyzerError, Result};

/// Seconds of remaining lifetime below which a token is treated as expired.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// The `authorized_user` JSON document Google tooling writes after a consent
/// flow (`token.json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizedUserCredentials {
    pub client_id: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    pub refresh_token: String,
    /// Last access token, if the file still carries one.
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub expiry: Option<String>,
    #[serde(default)]
    pub scopes: Option<Vec<String>>,
}

impl AuthorizedUserCredentials {
    pub fn parse(raw: &str) -> Result<Self> {
        serde_json::from_str(raw)
            .map_err(|e| AnalyzerError::Config(format!("invalid OAuth credentials: {}", e)))
    }

    /// The stored access token when it is still usable at `now`.
    pub fn usable_token(&self, now: DateTime<Utc>) -> Option<&str> {
        let token = self.token.as_deref().filter(|t| !t.is_empty())?;
        match self.expiry.as_deref().map(parse_expiry) {
            None => Some(token),
            Some(Some(expiry)) if expiry - Duration::seconds(EXPIRY_MARGIN_SECS) > now => {
                Some(token)
            }
            Some(_) => None,
        }
    }
}

fn parse_expiry(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            // Python tooling writes naive timestamps such as "2024-06-15T12:00:00.123456".
            chrono::NaiveDateTime::parse_from_str(raw.trim_end_matches('Z'), "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

/// Exchanges the refresh token for a new access token at `token_url`.
pub async fn refresh_access_token(
    client: &reqwest::Client,
    token_url: &str,
    creds: &AuthorizedUserCredentials,
) -> Result<String> {
    let mut body = vec![
        ("grant_type", "refresh_token".to_string()),
        ("client_id", creds.client_id.clone()),
        ("refresh_token", creds.refresh_token.clone()),
    ];
    if let Some(cs) = creds.client_secret.as_deref() {
        if !cs.is_empty() {
            body.push(("client_secret", cs.to_string()));
        }
    }
    tracing::debug!(%token_url, "Refreshing OAuth access token");
    let resp = client.post(token_url).form(&body).send().await?;
    let status = resp.status();
    let v = resp
        .json::<serde_json::Value>()
        .await
        .map_err(|e| AnalyzerError::Authentication(format!("unreadable token response: {}", e)))?;
    if !status.is_success() {
        let detail = v
            .get("error_description")
            .or_else(|| v.get("error"))
            .and_then(|s| s.as_str())
            .unwrap_or("unknown error");
        return Err(AnalyzerError::Authentication(format!(
            "token refresh failed ({}): {}",
            status.as_u16(),
            detail
        )));
    }
    v["access_token"]
        .as_str()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            AnalyzerError::Authentication("token response has no access_token".to_string())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn creds(token: Option<&str>, expiry: Option<&str>) -> AuthorizedUserCredentials {
        AuthorizedUserCredentials {
            client_id: "cid".into(),
            client_secret: Some("secret".into()),
            refresh_token: "refresh".into(),
            token: token.map(str::to_string),
            expiry: expiry.map(str::to_string),
            scopes: None,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn parses_python_token_file() {
        let raw = r#"{
            "token": "ya29.a0",
            "refresh_token": "1//0g",
            "token_uri": "https://oauth2.googleapis.com/token",
            "client_id": "123.apps.googleusercontent.com",
            "client_secret": "GOCSPX",
            "scopes": ["https://www.googleapis.com/auth/spreadsheets"],
            "expiry": "2024-06-15T13:00:00.123456Z"
        }"#;
        let c = AuthorizedUserCredentials::parse(raw).unwrap();
        assert_eq!(c.refresh_token, "1//0g");
        assert_eq!(c.usable_token(now()), Some("ya29.a0"));
    }

    #[test]
    fn expired_or_missing_token_needs_refresh() {
        assert_eq!(creds(None, None).usable_token(now()), None);
        assert_eq!(
            creds(Some("t"), Some("2024-06-15T11:00:00Z")).usable_token(now()),
            None
        );
        // Inside the safety margin.
        assert_eq!(
            creds(Some("t"), Some("2024-06-15T12:00:30Z")).usable_token(now()),
            None
        );
    }

    #[test]
    fn token_without_expiry_is_used() {
        assert_eq!(creds(Some("t"), None).usable_token(now()), Some("t"));
    }

    #[test]
    fn naive_expiry_is_read_as_utc() {
        assert_eq!(
            creds(Some("t"), Some("2024-06-15T14:00:00")).usable_token(now()),
            Some("t")
        );
    }

    #[test]
    fn malformed_credentials_are_config_errors() {
        let err = AuthorizedUserCredentials::parse("{\"token\":\"x\"}").unwrap_err();
        assert!(matches!(err, AnalyzerError::Config(_)));
    }
}
