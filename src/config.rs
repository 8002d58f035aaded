use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::models::Settings;

const DEFAULT_STREAM_PATH: &str = "/events/stream";

#[derive(Deserialize)]
struct SessionFile {
    token: Option<String>,
}

/// Loads settings from the environment (after reading a `.env` file when one
/// exists). The bearer token comes from `VALIFLOW_TOKEN` or, failing that,
/// from the session file named by `VALIFLOW_SESSION_FILE`.
pub fn load_settings() -> Result<Settings> {
    let _ = dotenvy::dotenv();
    settings_from(|key| std::env::var(key).ok())
}

pub fn settings_from(lookup: impl Fn(&str) -> Option<String>) -> Result<Settings> {
    let read = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

    let api_base_url = read("VALIFLOW_API_URL").ok_or_else(|| anyhow!("VALIFLOW_API_URL is not set"))?;
    let stream_path = read("VALIFLOW_STREAM_PATH").unwrap_or_else(|| DEFAULT_STREAM_PATH.to_string());
    let stream_path = if stream_path.starts_with('/') {
        stream_path
    } else {
        format!("/{}", stream_path)
    };

    let token = match read("VALIFLOW_TOKEN") {
        Some(token) => Some(token),
        None => match read("VALIFLOW_SESSION_FILE") {
            Some(path) => read_session_token(Path::new(&path))?,
            None => None,
        },
    };

    Ok(Settings {
        api_base_url,
        stream_path,
        company_id: read("VALIFLOW_COMPANY_ID"),
        token,
    })
}

fn read_session_token(path: &Path) -> Result<Option<String>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Read session file {}", path.display()))?;
    let session: SessionFile = serde_json::from_str(&raw)
        .with_context(|| format!("Parse session file {}", path.display()))?;
    Ok(session.token.filter(|t| !t.trim().is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_optional_values_are_missing() {
        let settings = settings_from(env(&[("VALIFLOW_API_URL", "https://api.example.test/")])).unwrap();
        assert_eq!(settings.stream_path, "/events/stream");
        assert!(settings.company_id.is_none());
        assert!(settings.token.is_none());
        assert_eq!(
            settings.stream_url("42").unwrap(),
            "https://api.example.test/events/stream?companyId=42"
        );
    }

    #[test]
    fn stream_url_encodes_the_company_id() {
        let settings = settings_from(env(&[("VALIFLOW_API_URL", "https://api.example.test")])).unwrap();
        assert_eq!(
            settings.stream_url("a&b c").unwrap(),
            "https://api.example.test/events/stream?companyId=a%26b+c"
        );

        let broken = settings_from(env(&[("VALIFLOW_API_URL", "not a url")])).unwrap();
        assert!(broken.stream_url("42").is_err());
    }

    #[test]
    fn missing_api_url_is_an_error() {
        assert!(settings_from(env(&[])).is_err());
    }

    #[test]
    fn token_falls_back_to_session_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, r#"{"token":"from-session"}"#).unwrap();
        let path_str = path.to_string_lossy().to_string();

        let settings = settings_from(env(&[
            ("VALIFLOW_API_URL", "http://localhost:8080"),
            ("VALIFLOW_SESSION_FILE", path_str.as_str()),
            ("VALIFLOW_STREAM_PATH", "sse"),
        ]))
        .unwrap();
        assert_eq!(settings.token.as_deref(), Some("from-session"));
        assert_eq!(settings.stream_path, "/sse");

        let explicit = settings_from(env(&[
            ("VALIFLOW_API_URL", "http://localhost:8080"),
            ("VALIFLOW_SESSION_FILE", path_str.as_str()),
            ("VALIFLOW_TOKEN", "explicit"),
        ]))
        .unwrap();
        assert_eq!(explicit.token.as_deref(), Some("explicit"));
    }
}
