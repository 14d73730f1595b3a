//! # gb-config
//!
//! Layered configuration loading for the guestbook using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`GUESTBOOK_*` prefix, `__` as separator)
//! 2. Bare deployment variables (`PORT`, `SITE_NAME`, `NEOCITIES_USER`,
//!    `NC_USER`, `NEOCITIES_PASS`, `NC_PASS`, `NEOCITIES_API_KEY`)
//! 3. Project-level `.guestbook/config.toml`
//! 4. User-level `~/.config/guestbook/config.toml`
//! 5. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `GUESTBOOK_SERVER__PORT` -> `server.port`,
//! `GUESTBOOK_NEOCITIES__API_KEY` -> `neocities.api_key`, etc.
//!
//! # Usage
//!
//! ```no_run
//! use gb_config::GuestbookConfig;
//!
//! let config = GuestbookConfig::load_with_dotenv().expect("config");
//! if !config.neocities.is_configured() {
//!     eprintln!("uploads will fail: no Neocities credentials");
//! }
//! ```

mod error;
mod neocities;
mod server;

pub use error::ConfigError;
pub use neocities::{NeocitiesConfig, ReadPolicy};
pub use server::ServerConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Bare variable names accepted for deployment platforms, mapped onto their
/// config key. Later entries win over earlier ones for the same key.
const ENV_ALIASES: &[(&str, &str)] = &[
    ("PORT", "server.port"),
    ("SITE_NAME", "neocities.site_name"),
    ("NC_USER", "neocities.user"),
    ("NEOCITIES_USER", "neocities.user"),
    ("NC_PASS", "neocities.password"),
    ("NEOCITIES_PASS", "neocities.password"),
    ("NEOCITIES_API_KEY", "neocities.api_key"),
];

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GuestbookConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub neocities: NeocitiesConfig,
}

impl GuestbookConfig {
    /// Load and validate configuration from all sources.
    ///
    /// Does NOT call `dotenvy` -- use [`Self::load_with_dotenv`] if you need
    /// `.env` file loading.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if extraction fails or a value is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_figment(&Self::figment())
    }

    /// Load configuration with `.env` file support.
    ///
    /// # Errors
    ///
    /// Same as [`Self::load`].
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load()
    }

    /// Extract and validate from an arbitrary figment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if extraction fails or a value is invalid.
    pub fn from_figment(figment: &Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract()?;
        config.neocities.validate()?;
        Ok(config)
    }

    /// Build the figment provider chain.
    ///
    /// Public so tests can inspect the figment or layer more providers on top.
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        let local_path = PathBuf::from(".guestbook/config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        for &(var, key) in ENV_ALIASES {
            figment = figment.merge(Env::raw().only(&[var]).map(move |_| key.into()));
        }

        figment.merge(Env::prefixed("GUESTBOOK_").split("__"))
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("guestbook").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_loads() {
        let config = GuestbookConfig::default();
        assert!(!config.neocities.is_configured());
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn every_alias_targets_a_known_section() {
        for (_, key) in ENV_ALIASES {
            assert!(key.starts_with("server.") || key.starts_with("neocities."), "{key}");
        }
    }
}
