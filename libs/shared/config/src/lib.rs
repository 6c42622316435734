use std::env;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

pub const DEFAULT_HOLD_DURATION_SECONDS: u64 = 300;
pub const DEFAULT_HOLD_TTL_GRACE_SECONDS: u64 = 3600;
pub const DEFAULT_SLOT_HORIZON_DAYS: u32 = 14;
pub const DEFAULT_SWEEP_INTERVAL_SECONDS: u64 = 30;
pub const DEFAULT_SERVER_PORT: u16 = 3000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    Memory,
    Redis,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StorageBackend::Memory),
            "redis" => Ok(StorageBackend::Redis),
            other => Err(format!("unknown storage backend '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub storage_backend: StorageBackend,
    pub redis_url: Option<String>,
    pub redis_key_prefix: String,
    pub hold_duration_seconds: u64,
    pub hold_ttl_grace_seconds: u64,
    pub slot_horizon_days: u32,
    pub sweep_interval_seconds: u64,
    pub doctors_file: Option<String>,
    pub server_port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage_backend: StorageBackend::Memory,
            redis_url: None,
            redis_key_prefix: "medibook".to_string(),
            hold_duration_seconds: DEFAULT_HOLD_DURATION_SECONDS,
            hold_ttl_grace_seconds: DEFAULT_HOLD_TTL_GRACE_SECONDS,
            slot_horizon_days: DEFAULT_SLOT_HORIZON_DAYS,
            sweep_interval_seconds: DEFAULT_SWEEP_INTERVAL_SECONDS,
            doctors_file: None,
            server_port: DEFAULT_SERVER_PORT,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let config = Self {
            storage_backend: parse_or("STORAGE_BACKEND", defaults.storage_backend),
            redis_url: env::var("REDIS_URL").ok().filter(|url| !url.is_empty()),
            redis_key_prefix: env::var("REDIS_KEY_PREFIX")
                .unwrap_or_else(|_| {
                    warn!("REDIS_KEY_PREFIX not set, using default");
                    defaults.redis_key_prefix.clone()
                }),
            hold_duration_seconds: parse_or("HOLD_DURATION_SECONDS", defaults.hold_duration_seconds),
            hold_ttl_grace_seconds: parse_or("HOLD_TTL_GRACE_SECONDS", defaults.hold_ttl_grace_seconds),
            slot_horizon_days: parse_or("SLOT_HORIZON_DAYS", defaults.slot_horizon_days),
            sweep_interval_seconds: parse_or("SWEEP_INTERVAL_SECONDS", defaults.sweep_interval_seconds),
            doctors_file: env::var("DOCTORS_FILE").ok().filter(|path| !path.is_empty()),
            server_port: parse_or("SERVER_PORT", defaults.server_port),
        };

        if !config.is_configured() {
            warn!("Redis storage selected but REDIS_URL is not set");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        match self.storage_backend {
            StorageBackend::Memory => true,
            StorageBackend::Redis => self.redis_url.is_some(),
        }
    }

    pub fn hold_duration(&self) -> Duration {
        Duration::from_secs(self.hold_duration_seconds)
    }

    /// Lifetime of a stored hold record: the hold itself plus a grace period
    /// so the sweeper still sees lapsed holds before the store drops them.
    pub fn hold_record_ttl(&self) -> Duration {
        Duration::from_secs(self.hold_duration_seconds.saturating_add(self.hold_ttl_grace_seconds))
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_seconds.max(1))
    }
}

fn parse_or<T>(key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Debug,
{
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("{} has invalid value '{}', using default {:?}", key, raw, default);
            default
        }),
        Err(_) => {
            warn!("{} not set, using default {:?}", key, default);
            default
        }
    }
}
