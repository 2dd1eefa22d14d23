use crate::error::{AvatarError, Result};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_PUBLIC_DIR: &str = "public";
pub const DEFAULT_MAX_BODY_BYTES: usize = 25 * 1024 * 1024;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_BACKOFF_UNIT_MS: u64 = 2500;

/// MiniMax serves two regions with separate accounts and keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiRegion {
    Global,
    China,
}

impl ApiRegion {
    pub fn base_url(&self) -> &'static str {
        match self {
            ApiRegion::Global => "https://api.minimax.io/v1",
            ApiRegion::China => "https://api.minimaxi.com/v1",
        }
    }
}

impl Default for ApiRegion {
    fn default() -> Self {
        ApiRegion::Global
    }
}

impl FromStr for ApiRegion {
    type Err = AvatarError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "global" | "intl" => Ok(ApiRegion::Global),
            "china" | "cn" => Ok(ApiRegion::China),
            other => Err(AvatarError::Config(format!(
                "Unknown API region '{}', expected 'global' or 'china'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub api_key: Option<String>,
    pub api_base: Option<String>,
}

impl Credentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Credentials {
            api_key: non_empty(lookup("MINIMAX_API_KEY")),
            api_base: non_empty(lookup("MINIMAX_API_BASE")),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = non_empty(Some(api_key.into()));
        self
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = non_empty(Some(api_base.into()));
        self
    }

    pub fn with_region(self, region: ApiRegion) -> Self {
        self.with_api_base(region.base_url())
    }

    /// Pinned (server-side) values win; the caller's values only fill gaps.
    pub fn overlay(&self, client: &Credentials) -> Credentials {
        Credentials {
            api_key: self.api_key.clone().or_else(|| non_empty(client.api_key.clone())),
            api_base: self
                .api_base
                .clone()
                .or_else(|| non_empty(client.api_base.clone())),
        }
    }

    pub fn has_key(&self) -> bool {
        self.api_key.is_some()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Bounded linear backoff: attempt `n` failing transiently waits `n * unit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_unit: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_unit: Duration::from_millis(DEFAULT_BACKOFF_UNIT_MS),
        }
    }
}

impl RetryPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_backoff_unit(mut self, unit: Duration) -> Self {
        self.backoff_unit = unit;
        self
    }

    pub fn allows_retry_after(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.backoff_unit * attempt
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub public_dir: PathBuf,
    pub credentials: Credentials,
    pub max_body_bytes: usize,
    pub request_timeout: Duration,
    pub json_logs: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            public_dir: PathBuf::from(DEFAULT_PUBLIC_DIR),
            credentials: Credentials::default(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            json_logs: false,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Config::default();

        let host = non_empty(lookup("HOST")).unwrap_or(defaults.host);
        let port = lookup("PORT")
            .and_then(|port| port.trim().parse().ok())
            .unwrap_or(defaults.port);
        let public_dir = non_empty(lookup("PUBLIC_DIR"))
            .map(PathBuf::from)
            .unwrap_or(defaults.public_dir);
        let max_body_bytes = lookup("MAX_BODY_BYTES")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(defaults.max_body_bytes);
        let request_timeout = lookup("REQUEST_TIMEOUT_SECS")
            .and_then(|v| v.trim().parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.request_timeout);
        let json_logs = lookup("LOG_FORMAT").map_or(false, |val| val.eq_ignore_ascii_case("json"));

        Config {
            host,
            port,
            public_dir,
            credentials: Credentials::from_lookup(&lookup),
            max_body_bytes,
            request_timeout,
            json_logs,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_public_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.public_dir = dir.into();
        self
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn with_max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = limit;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults_when_env_is_empty() {
        let config = Config::from_lookup(lookup_from(&[]));
        assert_eq!(config.port, 5000);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.max_body_bytes, 25 * 1024 * 1024);
        assert_eq!(config.request_timeout, Duration::from_secs(120));
        assert!(!config.credentials.has_key());
    }

    #[test]
    fn test_env_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("PORT", "8080"),
            ("MINIMAX_API_KEY", "server-key"),
            ("MINIMAX_API_BASE", "https://api.minimaxi.com/v1"),
            ("REQUEST_TIMEOUT_SECS", "30"),
            ("LOG_FORMAT", "JSON"),
        ]));
        assert_eq!(config.port, 8080);
        assert_eq!(config.credentials.api_key.as_deref(), Some("server-key"));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert!(config.json_logs);
    }

    #[test]
    fn test_unparseable_port_falls_back() {
        let config = Config::from_lookup(lookup_from(&[("PORT", "not-a-port")]));
        assert_eq!(config.port, DEFAULT_PORT);
    }

    #[test]
    fn test_server_credentials_take_precedence() {
        let server = Credentials::new().with_api_key("server-key");
        let client = Credentials::new()
            .with_api_key("client-key")
            .with_api_base("https://client.example/v1");

        let effective = server.overlay(&client);
        assert_eq!(effective.api_key.as_deref(), Some("server-key"));
        assert_eq!(effective.api_base.as_deref(), Some("https://client.example/v1"));
    }

    #[test]
    fn test_blank_values_are_absent() {
        let creds = Credentials::new().with_api_key("   ");
        assert!(!creds.has_key());
        let effective = Credentials::new().overlay(&Credentials {
            api_key: Some(String::new()),
            api_base: None,
        });
        assert_eq!(effective, Credentials::default());
    }

    #[test]
    fn test_retry_policy_delays() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(1), Duration::from_millis(2500));
        assert_eq!(policy.delay_for(2), Duration::from_millis(5000));
        assert!(policy.allows_retry_after(2));
        assert!(!policy.allows_retry_after(3));
    }

    #[test]
    fn test_region_parsing() {
        assert_eq!("china".parse::<ApiRegion>().unwrap(), ApiRegion::China);
        assert_eq!(" Global ".parse::<ApiRegion>().unwrap(), ApiRegion::Global);
        assert!("mars".parse::<ApiRegion>().is_err());
    }
}
