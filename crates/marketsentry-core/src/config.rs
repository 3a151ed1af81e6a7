use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::http_client::DEFAULT_TIMEOUT_MS;

pub const DEFAULT_API_URL: &str = "http://103.151.53.134:8081/api";
pub const DEFAULT_WS_URL: &str = "wss://marketsentry.site/assets/prices";
pub const DEFAULT_EXPIRED_CODE: &str = "TOKEN_EXPIRED";
pub const DEFAULT_FLASH_MS: u64 = 500;

/// Client settings resolved from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_url: String,
    pub ws_url: String,
    pub timeout_ms: u64,
    pub session_file: PathBuf,
    /// Error code that marks a response as eligible for a silent refresh.
    pub expired_code: String,
    pub flash_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl Settings {
    /// Reads `MARKETSENTRY_*` variables, loading `.env` first when present.
    pub fn load() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let text = |key: &str, default: &str| {
            lookup(key)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
                .unwrap_or_else(|| default.to_owned())
        };
        let millis = |key: &str, default: u64| {
            lookup(key)
                .and_then(|value| value.trim().parse::<u64>().ok())
                .filter(|value| *value > 0)
                .unwrap_or(default)
        };

        let session_file = lookup("MARKETSENTRY_SESSION_FILE")
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| default_session_file(lookup("HOME")));

        Self {
            api_url: text("MARKETSENTRY_API_URL", DEFAULT_API_URL)
                .trim_end_matches('/')
                .to_owned(),
            ws_url: text("MARKETSENTRY_WS_URL", DEFAULT_WS_URL),
            timeout_ms: millis("MARKETSENTRY_TIMEOUT_MS", DEFAULT_TIMEOUT_MS),
            session_file,
            expired_code: text("MARKETSENTRY_EXPIRED_CODE", DEFAULT_EXPIRED_CODE),
            flash_ms: millis("MARKETSENTRY_FLASH_MS", DEFAULT_FLASH_MS),
        }
    }

    pub fn flash_window(&self) -> Duration {
        Duration::from_millis(self.flash_ms)
    }
}

fn default_session_file(home: Option<String>) -> PathBuf {
    home.filter(|value| !value.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".marketsentry")
        .join("session.json")
}
