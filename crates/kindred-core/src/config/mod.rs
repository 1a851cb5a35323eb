//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section. Every field has a default, so an empty configuration is valid.

pub mod app;
pub mod cache;
pub mod devices;
pub mod logging;

use serde::{Deserialize, Serialize};

pub use self::app::ServerConfig;
pub use self::cache::{CacheConfig, RedisCacheConfig};
pub use self::devices::{DeviceLockConfig, DeviceSessionConfig};
pub use self::logging::LoggingConfig;

use crate::error::AppError;

/// Environment variable prefix for configuration overrides.
const ENV_PREFIX: &str = "KINDRED";

/// Root application configuration.
///
/// This struct is the top-level deserialization target for the merged
/// TOML configuration files (default.toml + environment overlay).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Cache provider settings.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Device session registry settings.
    #[serde(default)]
    pub devices: DeviceSessionConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges `config/default.toml` with `config/{env}.toml` and environment
    /// variables prefixed with `KINDRED__` (e.g. `KINDRED__CACHE__PROVIDER`).
    pub fn load(env: &str) -> Result<Self, AppError> {
        Self::load_from("config", env)
    }

    /// Load configuration from TOML files in `dir`.
    pub fn load_from(dir: &str, env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(&format!("{dir}/default")).required(false))
            .add_source(config::File::with_name(&format!("{dir}/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let parsed: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;

        parsed.validate()?;
        Ok(parsed)
    }

    /// Reject settings the registry cannot operate with.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.devices.max_devices == 0 {
            return Err(AppError::configuration(
                "devices.max_devices must be at least 1",
            ));
        }
        if self.devices.ttl_seconds == 0 {
            return Err(AppError::configuration(
                "devices.ttl_seconds must be at least 1",
            ));
        }
        if self.devices.lock.enabled {
            let floor = self
                .devices
                .locked_round_trips()
                .saturating_mul(self.cache.operation_timeout_ms);
            if self.devices.lock.lease_ms <= floor {
                return Err(AppError::configuration(format!(
                    "devices.lock.lease_ms must exceed {floor} ms ({} cache calls of up to {} ms each)",
                    self.devices.locked_round_trips(),
                    self.cache.operation_timeout_ms
                )));
            }
        }
        Ok(())
    }
}
