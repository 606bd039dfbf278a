use std::env;
use std::path::PathBuf;
use std::time::Duration;

use super::coordinator::DEFAULT_COUNTDOWN_TICKS;
use crate::error::AppError;

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Client session settings, from `DOODLE_*` environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Backend root; required to build an HTTP session.
    pub api_url: Option<String>,
    /// Broadcast relay; derived from `api_url` when unset.
    pub relay_url: Option<String>,
    pub classifier_url: Option<String>,
    /// Without an archive URL attempts are not archived.
    pub archive_url: Option<String>,
    pub countdown_secs: u32,
    pub http_timeout: Duration,
    /// Snapshot file; in-memory when unset.
    pub state_path: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: None,
            relay_url: None,
            classifier_url: None,
            archive_url: None,
            countdown_secs: DEFAULT_COUNTDOWN_TICKS,
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            state_path: None,
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let countdown_secs = match non_empty("DOODLE_COUNTDOWN_SECS") {
            Some(raw) => positive("DOODLE_COUNTDOWN_SECS", &raw)? as u32,
            None => DEFAULT_COUNTDOWN_TICKS,
        };
        let http_timeout = match non_empty("DOODLE_HTTP_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(positive("DOODLE_HTTP_TIMEOUT_SECS", &raw)?),
            None => Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        };

        Ok(Self {
            api_url: non_empty("DOODLE_API_URL"),
            relay_url: non_empty("DOODLE_RELAY_URL"),
            classifier_url: non_empty("DOODLE_CLASSIFIER_URL"),
            archive_url: non_empty("DOODLE_ARCHIVE_URL"),
            countdown_secs,
            http_timeout,
            state_path: non_empty("DOODLE_STATE_PATH").map(PathBuf::from),
        })
    }
}

impl ClientConfig {
    /// WebSocket relay URL: `DOODLE_RELAY_URL`, or `{api_url}/api/ws` with the
    /// scheme switched to `ws`/`wss`.
    pub fn relay_url(&self) -> Result<String, AppError> {
        if let Some(url) = &self.relay_url {
            return Ok(url.clone());
        }
        let api_url = self
            .api_url
            .as_deref()
            .ok_or_else(|| AppError::config("DOODLE_API_URL or DOODLE_RELAY_URL must be set"))?
            .trim_end_matches('/');

        let base = if let Some(rest) = api_url.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = api_url.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            return Err(AppError::config(format!(
                "DOODLE_API_URL must be an http(s) URL, got '{api_url}'"
            )));
        };
        Ok(format!("{base}/api/ws"))
    }
}

fn positive(name: &str, raw: &str) -> Result<u64, AppError> {
    match raw.trim().parse::<u32>() {
        Ok(n) if n > 0 => Ok(u64::from(n)),
        _ => Err(AppError::config(format!(
            "{name} must be a positive integer, got '{raw}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ClientConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.countdown_secs, 60);
        assert_eq!(config.http_timeout, Duration::from_secs(30));
    }

    #[test]
    fn reads_urls_and_numbers() {
        let config = ClientConfig::from_lookup(|name| match name {
            "DOODLE_API_URL" => Some("http://localhost:3001".into()),
            "DOODLE_CLASSIFIER_URL" => Some("http://classifier/api".into()),
            "DOODLE_COUNTDOWN_SECS" => Some("5".into()),
            "DOODLE_HTTP_TIMEOUT_SECS" => Some("2".into()),
            "DOODLE_STATE_PATH" => Some("/tmp/doodle.json".into()),
            _ => None,
        })
        .unwrap();

        assert_eq!(config.api_url.as_deref(), Some("http://localhost:3001"));
        assert_eq!(config.classifier_url.as_deref(), Some("http://classifier/api"));
        assert_eq!(config.archive_url, None);
        assert_eq!(config.countdown_secs, 5);
        assert_eq!(config.http_timeout, Duration::from_secs(2));
        assert_eq!(config.state_path, Some(PathBuf::from("/tmp/doodle.json")));
    }

    #[test]
    fn relay_url_follows_the_api_url_unless_set() {
        let mut config = ClientConfig {
            api_url: Some("http://localhost:3001/".into()),
            ..ClientConfig::default()
        };
        assert_eq!(config.relay_url().unwrap(), "ws://localhost:3001/api/ws");

        config.api_url = Some("https://doodle.example".into());
        assert_eq!(config.relay_url().unwrap(), "wss://doodle.example/api/ws");

        config.relay_url = Some("ws://relay:9000/api/ws".into());
        assert_eq!(config.relay_url().unwrap(), "ws://relay:9000/api/ws");

        let err = ClientConfig::default().relay_url().unwrap_err();
        assert!(err.to_string().contains("DOODLE_RELAY_URL"));

        let ftp = ClientConfig {
            api_url: Some("ftp://nope".into()),
            ..ClientConfig::default()
        };
        assert!(ftp.relay_url().is_err());
    }

    #[test]
    fn zero_countdown_is_a_config_error() {
        let err = ClientConfig::from_lookup(|name| {
            (name == "DOODLE_COUNTDOWN_SECS").then(|| "0".to_string())
        })
        .unwrap_err();
        assert!(err.to_string().contains("DOODLE_COUNTDOWN_SECS"));
    }
}
