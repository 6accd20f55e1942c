use std::env;
use std::time::Duration;

pub const DEFAULT_EXECUTION_API_URL: &str = "https://emkc.org/api/v2/piston";
pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";
pub const DEFAULT_LANGUAGE_CONFIG_PATH: &str = "config/languages.json";

/// Safety limits to keep pathological submissions away from the execution service
pub const DEFAULT_MAX_SOURCE_BYTES: usize = 1024 * 1024; // 1MB
pub const DEFAULT_MAX_INPUT_BYTES: usize = 10 * 1024 * 1024; // 10MB

/// Application configuration
/// Provides defaults with environment variable overrides
#[derive(Debug, Clone)]
pub struct Config {
    pub execution_api_url: String,
    /// HTTP client timeout for one execution request.
    /// None leaves the request unbounded.
    pub execution_timeout: Option<Duration>,
    pub redis_url: String,
    pub language_config_path: String,
    pub max_source_bytes: usize,
    pub max_input_bytes: usize,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup, so tests don't touch process env
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            execution_api_url: lookup("EXECUTION_API_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_EXECUTION_API_URL.to_string()),
            execution_timeout: lookup("EXECUTION_TIMEOUT_MS")
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis),
            redis_url: lookup("REDIS_URL")
                .unwrap_or_else(|| DEFAULT_REDIS_URL.to_string()),
            language_config_path: lookup("LANGUAGE_CONFIG_PATH")
                .unwrap_or_else(|| DEFAULT_LANGUAGE_CONFIG_PATH.to_string()),
            max_source_bytes: lookup("MAX_SOURCE_BYTES")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_SOURCE_BYTES),
            max_input_bytes: lookup("MAX_INPUT_BYTES")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_INPUT_BYTES),
            port: lookup("PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}
