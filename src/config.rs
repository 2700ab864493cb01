//! Engine configuration (connection, quota, scheduling).
//!
//! [`SyncConfig`] is a `clap::Args` struct so the binary can flatten it into
//! its CLI; every field can also come from the environment. Library users
//! build it with [`SyncConfig::default`] and the `with_*` methods.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use clap::Args;
use std::fmt;
use std::time::Duration;

/// Default API root
pub const DEFAULT_BASE_URL: &str = "https://frc-api.firstinspires.org/v3.0";

/// Requests per minute used when the configured value is not positive
pub const DEFAULT_REQUESTS_PER_MINUTE: u32 = 20;

/// Default season
pub const DEFAULT_SEASON_YEAR: i32 = 2025;

/// Default period between scheduled syncs (one hour)
pub const DEFAULT_AUTO_SYNC_INTERVAL_SECS: u64 = 3600;

/// Default overall request timeout
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default retry budget for transient failures
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// Credentials attached to every request
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Username and auth key, base64-encoded on use
    Basic {
        /// API username
        username: String,
        /// API authorization key
        auth_key: String,
    },
    /// Already-encoded `username:key` token
    Token(String),
}

impl Credentials {
    /// Value for the `Authorization` header
    pub fn authorization_header(&self) -> String {
        match self {
            Self::Basic { username, auth_key } => {
                format!("Basic {}", STANDARD.encode(format!("{username}:{auth_key}")))
            }
            Self::Token(token) => format!("Basic {token}"),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("auth_key", &"<redacted>")
                .finish(),
            Self::Token(_) => f.debug_tuple("Token").field(&"<redacted>").finish(),
        }
    }
}

/// FRC API sync settings
#[derive(Args, Clone)]
pub struct SyncConfig {
    /// FRC Events API base URL
    #[arg(long, env = "FRC_API_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// API username
    #[arg(long, env = "FRC_API_USERNAME", default_value = "")]
    pub username: String,

    /// API authorization key
    #[arg(long, env = "FRC_API_AUTH_KEY", default_value = "", hide_env_values = true)]
    pub auth_key: String,

    /// Pre-encoded Basic auth token (used when username/key are not set)
    #[arg(long, env = "FRC_API_TOKEN", default_value = "", hide_env_values = true)]
    pub auth_token: String,

    /// Team whose events are synced first (0 disables the team query)
    #[arg(long, env = "FRC_DEFAULT_TEAM", default_value_t = 0)]
    pub default_team: u32,

    /// Season to synchronize
    #[arg(long = "season", env = "FRC_SEASON_YEAR", default_value_t = DEFAULT_SEASON_YEAR)]
    pub season_year: i32,

    /// Request quota per endpoint (non-positive falls back to 20)
    #[arg(
        long,
        env = "FRC_API_REQUESTS_PER_MINUTE",
        default_value_t = 20,
        allow_negative_numbers = true
    )]
    pub requests_per_minute: i64,

    /// Whether scheduled and manual syncs run at all
    #[arg(
        long,
        env = "FRC_SYNC_ENABLED",
        default_value_t = true,
        action = clap::ArgAction::Set
    )]
    pub sync_enabled: bool,

    /// Seconds between scheduled syncs
    #[arg(long = "auto-sync-interval", env = "FRC_AUTO_SYNC_INTERVAL", default_value_t = DEFAULT_AUTO_SYNC_INTERVAL_SECS)]
    pub auto_sync_interval_secs: u64,

    /// Seconds a cached query result stays fresh (default: half the sync interval)
    #[arg(long = "cache-ttl", env = "FRC_CACHE_TTL")]
    pub cache_ttl_secs: Option<u64>,

    /// Overall timeout for one HTTP request, in seconds
    #[arg(long = "request-timeout", env = "FRC_API_TIMEOUT", default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS)]
    pub request_timeout_secs: u64,

    /// Retries for 429, 5xx and network failures (0-10)
    #[arg(
        long,
        env = "FRC_API_MAX_RETRIES",
        default_value_t = DEFAULT_MAX_RETRIES,
        value_parser = clap::value_parser!(u32).range(0..=10)
    )]
    pub max_retries: u32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            username: String::new(),
            auth_key: String::new(),
            auth_token: String::new(),
            default_team: 0,
            season_year: DEFAULT_SEASON_YEAR,
            requests_per_minute: DEFAULT_REQUESTS_PER_MINUTE as i64,
            sync_enabled: true,
            auto_sync_interval_secs: DEFAULT_AUTO_SYNC_INTERVAL_SECS,
            cache_ttl_secs: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl fmt::Debug for SyncConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncConfig")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("auth_key", &redact(&self.auth_key))
            .field("auth_token", &redact(&self.auth_token))
            .field("default_team", &self.default_team)
            .field("season_year", &self.season_year)
            .field("requests_per_minute", &self.requests_per_minute)
            .field("sync_enabled", &self.sync_enabled)
            .field("auto_sync_interval_secs", &self.auto_sync_interval_secs)
            .field("cache_ttl_secs", &self.cache_ttl_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

fn redact(secret: &str) -> &'static str {
    if secret.is_empty() {
        ""
    } else {
        "<redacted>"
    }
}

impl SyncConfig {
    /// Set the API root
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set username and auth key
    pub fn with_credentials(mut self, username: impl Into<String>, auth_key: impl Into<String>) -> Self {
        self.username = username.into();
        self.auth_key = auth_key.into();
        self
    }

    /// Set a pre-encoded token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = token.into();
        self
    }

    /// Set the default team
    pub fn with_default_team(mut self, team: u32) -> Self {
        self.default_team = team;
        self
    }

    /// Set the season
    pub fn with_season(mut self, season_year: i32) -> Self {
        self.season_year = season_year;
        self
    }

    /// Set the per-endpoint quota
    pub fn with_requests_per_minute(mut self, requests_per_minute: i64) -> Self {
        self.requests_per_minute = requests_per_minute;
        self
    }

    /// Enable or disable syncing
    pub fn with_sync_enabled(mut self, enabled: bool) -> Self {
        self.sync_enabled = enabled;
        self
    }

    /// Set the scheduled sync period in seconds
    pub fn with_auto_sync_interval_secs(mut self, secs: u64) -> Self {
        self.auto_sync_interval_secs = secs;
        self
    }

    /// Set the cache TTL in seconds
    pub fn with_cache_ttl_secs(mut self, secs: u64) -> Self {
        self.cache_ttl_secs = Some(secs);
        self
    }

    /// Set the retry budget
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the request timeout in seconds
    pub fn with_request_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout_secs = secs;
        self
    }

    /// Credentials to send, if any are configured.
    ///
    /// Username and key take precedence over a token.
    pub fn credentials(&self) -> Option<Credentials> {
        if !self.username.is_empty() && !self.auth_key.is_empty() {
            return Some(Credentials::Basic {
                username: self.username.clone(),
                auth_key: self.auth_key.clone(),
            });
        }
        if !self.auth_token.is_empty() {
            return Some(Credentials::Token(self.auth_token.clone()));
        }
        None
    }

    /// Whether credentials are present
    pub fn is_configured(&self) -> bool {
        self.credentials().is_some()
    }

    /// Whether the default-team query runs
    pub fn has_default_team(&self) -> bool {
        self.default_team > 0
    }

    /// Effective requests per minute
    pub fn effective_requests_per_minute(&self) -> u32 {
        if self.requests_per_minute > 0 {
            u32::try_from(self.requests_per_minute).unwrap_or(u32::MAX)
        } else {
            DEFAULT_REQUESTS_PER_MINUTE
        }
    }

    /// Minimum spacing between two calls to one endpoint: `60s / requests_per_minute`
    pub fn min_request_interval(&self) -> Duration {
        Duration::from_millis(60_000 / u64::from(self.effective_requests_per_minute()))
    }

    /// Scheduled sync period, never shorter than one second
    pub fn auto_sync_interval(&self) -> Duration {
        Duration::from_secs(self.auto_sync_interval_secs.max(1))
    }

    /// Cache TTL: configured value or half the sync interval
    pub fn cache_ttl(&self) -> Duration {
        match self.cache_ttl_secs {
            Some(secs) => Duration::from_secs(secs),
            None => self.auto_sync_interval() / 2,
        }
    }

    /// Overall HTTP timeout
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// Base URL without a trailing slash
    pub fn normalized_base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}
