use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_EVENT_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug, thiserror::Error)]
pub enum ServiceConfigError {
    #[error("missing required service config field: {0}")]
    MissingField(&'static str),
    #[error("event_timeout_ms must be greater than zero")]
    ZeroEventTimeout,
}

/// Final, merged configuration used by the running process.
///
/// Merge order: CLI > ENV > built-in defaults. clap resolves CLI vs ENV per
/// field; the result is overlaid on [`ServiceConfigPatch::default`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    /// Relational store DSN (`mysql://`, `sqlite://`, ...).
    pub dsn: String,
    /// Cache URL (`redis://host:port/db`). Ignored when `memory_cache` is set.
    pub redis_url: String,
    /// Use the in-process cache instead of Redis.
    pub memory_cache: bool,
    /// Upper bound for processing one event (cache + store round trips).
    pub event_timeout_ms: u64,
    /// Create or alter the `pointdata` table on startup. Off by default: an
    /// existing table gains the surrogate `id` column when synced.
    pub schema_sync: bool,
}

impl ServiceConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn event_timeout(&self) -> Duration {
        Duration::from_millis(self.event_timeout_ms)
    }
}

/// Optional layer used for merging service config.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceConfigPatch {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub dsn: Option<String>,
    pub redis_url: Option<String>,
    pub memory_cache: Option<bool>,
    pub event_timeout_ms: Option<u64>,
    pub schema_sync: Option<bool>,
}

impl ServiceConfigPatch {
    pub fn overlay(&mut self, other: ServiceConfigPatch) {
        if other.host.is_some() {
            self.host = other.host;
        }
        if other.port.is_some() {
            self.port = other.port;
        }
        if other.dsn.is_some() {
            self.dsn = other.dsn;
        }
        if other.redis_url.is_some() {
            self.redis_url = other.redis_url;
        }
        if other.memory_cache.is_some() {
            self.memory_cache = other.memory_cache;
        }
        if other.event_timeout_ms.is_some() {
            self.event_timeout_ms = other.event_timeout_ms;
        }
        if other.schema_sync.is_some() {
            self.schema_sync = other.schema_sync;
        }
    }

    pub fn into_config(self) -> Result<ServiceConfig, ServiceConfigError> {
        let event_timeout_ms = self.event_timeout_ms.unwrap_or(DEFAULT_EVENT_TIMEOUT_MS);
        if event_timeout_ms == 0 {
            return Err(ServiceConfigError::ZeroEventTimeout);
        }
        Ok(ServiceConfig {
            host: self.host.unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: self.port.unwrap_or(DEFAULT_PORT),
            dsn: self.dsn.ok_or(ServiceConfigError::MissingField("dsn"))?,
            redis_url: self
                .redis_url
                .ok_or(ServiceConfigError::MissingField("redis_url"))?,
            memory_cache: self.memory_cache.unwrap_or(false),
            event_timeout_ms,
            schema_sync: self.schema_sync.unwrap_or(false),
        })
    }
}
