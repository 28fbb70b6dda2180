//! Runtime configuration.
//!
//! Settings resolve from three layers, weakest first: compiled-in defaults,
//! an optional `config.toml`, then `MATCHDECK_`-prefixed environment
//! variables. Secrets (`DATABASE_URL`, `SALT`, `SECRET_KEY`) are read from
//! the environment only and never belong in the file.

use config::{Config, ConfigError, Environment, File, FileFormat};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::sync::RwLock;

static SETTINGS: Lazy<RwLock<Settings>> = Lazy::new(|| {
    RwLock::new(Settings::load().unwrap_or_else(|err| {
        log::warn!("Could not load config.toml, running on defaults: {}", err);
        Settings::default()
    }))
});

/// Force the lazy load early so a bad file complains at startup rather than
/// on the first request that happens to read a setting.
pub fn init() {
    let settings = SETTINGS.read().unwrap();
    log::info!("Configuration ready; server.bind = {}", settings.server.bind);
}

fn snapshot() -> Settings {
    SETTINGS.read().map(|s| s.clone()).unwrap_or_default()
}

pub fn server() -> ServerSettings {
    snapshot().server
}

pub fn security() -> SecuritySettings {
    snapshot().security
}

pub fn rate_limit() -> RateLimitSettings {
    snapshot().rate_limit
}

pub fn limits() -> ContentLimits {
    snapshot().limits
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub security: SecuritySettings,
    pub rate_limit: RateLimitSettings,
    pub limits: ContentLimits,
}

impl Settings {
    fn load() -> Result<Self, ConfigError> {
        Self::load_from_path("config.toml")
    }

    /// Layered load: defaults under the file, the file under the environment.
    fn load_from_path(path: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(Config::try_from(&Settings::default())?)
            .add_source(File::new(path, FileFormat::Toml).required(false))
            .add_source(
                Environment::with_prefix("MATCHDECK")
                    .separator("_")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

/// HTTP front door.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Bind address, host:port.
    pub bind: String,
    /// Directory holding the built client bundle, served as the fallback route.
    pub client_dist: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".into(),
            client_dist: "./client/dist".into(),
        }
    }
}

/// Login and session hardening knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecuritySettings {
    /// Failed logins tolerated before the account locks.
    pub max_failed_logins: u32,
    /// How long a locked account stays locked, in minutes.
    pub lockout_duration_minutes: u32,
    /// Server-side session lifetime, in days.
    pub session_lifetime_days: u32,
}

impl Default for SecuritySettings {
    fn default() -> Self {
        Self {
            max_failed_logins: 5,
            lockout_duration_minutes: 15,
            session_lifetime_days: 14,
        }
    }
}

/// Per-account budgets for the abuse-prone writes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitSettings {
    pub login_max_attempts: u32,
    pub login_window_seconds: u32,
    pub registration_per_hour: u32,
    pub queries_per_hour: u32,
    pub call_requests_per_day: u32,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            login_max_attempts: 5,
            login_window_seconds: 300,
            registration_per_hour: 3,
            queries_per_hour: 10,
            call_requests_per_day: 5,
        }
    }
}

/// Sizing caps for user-submitted content.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentLimits {
    pub catalog_page_size: usize,
    /// Ceiling for question, response, and description bodies, in characters.
    pub max_message_length: usize,
    /// Topic tags allowed on either side of a query.
    pub max_topics: usize,
}

impl Default for ContentLimits {
    fn default() -> Self {
        Self {
            catalog_page_size: 24,
            max_message_length: 10_000,
            max_topics: 12,
        }
    }
}
