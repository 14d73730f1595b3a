//! Neocities remote document configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

const DEFAULT_API_URL: &str = "https://neocities.org/api";

fn default_site_name() -> String {
    String::from("whispering-forest")
}

fn default_document_path() -> String {
    String::from("data/a_entries.json")
}

const fn default_timeout_secs() -> u64 {
    10
}

/// How `load_all` reacts to an unreadable remote document.
///
/// Network failures always degrade to an empty collection. This only decides
/// non-2xx/non-404 statuses and unparseable JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadPolicy {
    /// Serve an empty list and log a warning.
    #[default]
    Lenient,
    /// Surface the failure to the caller.
    Strict,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NeocitiesConfig {
    /// Site name, the `<name>` in `<name>.neocities.org`.
    #[serde(default = "default_site_name")]
    pub site_name: String,

    /// Account user name for basic auth uploads.
    #[serde(default)]
    pub user: String,

    /// Account password for basic auth uploads.
    #[serde(default)]
    pub password: String,

    /// API key. Takes precedence over user/password when set.
    #[serde(default)]
    pub api_key: String,

    /// Path of the JSON document inside the site.
    #[serde(default = "default_document_path")]
    pub document_path: String,

    /// Base URL the document is fetched from. If empty, built from `site_name`.
    #[serde(default)]
    pub site_url: String,

    /// Base URL of the Neocities API. If empty, the public API is used.
    #[serde(default)]
    pub api_url: String,

    /// Timeout applied to every upstream request.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Local file the document is written to before each upload.
    /// Empty disables staging.
    #[serde(default)]
    pub staging_path: String,

    #[serde(default)]
    pub read_policy: ReadPolicy,
}

impl Default for NeocitiesConfig {
    fn default() -> Self {
        Self {
            site_name: default_site_name(),
            user: String::new(),
            password: String::new(),
            api_key: String::new(),
            document_path: default_document_path(),
            site_url: String::new(),
            api_url: String::new(),
            timeout_secs: default_timeout_secs(),
            staging_path: String::new(),
            read_policy: ReadPolicy::default(),
        }
    }
}

impl NeocitiesConfig {
    /// Check whether upload credentials are present.
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty() || (!self.user.is_empty() && !self.password.is_empty())
    }

    /// Public URL of the remote document.
    pub fn document_url(&self) -> String {
        let base = if self.site_url.is_empty() {
            format!("https://{}.neocities.org", self.site_name)
        } else {
            self.site_url.trim_end_matches('/').to_string()
        };
        format!("{base}/{}", self.document_path)
    }

    /// Upload endpoint of the Neocities API.
    pub fn upload_url(&self) -> String {
        let base = if self.api_url.is_empty() {
            DEFAULT_API_URL
        } else {
            self.api_url.trim_end_matches('/')
        };
        format!("{base}/upload")
    }

    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn staging_path(&self) -> Option<PathBuf> {
        (!self.staging_path.is_empty()).then(|| PathBuf::from(&self.staging_path))
    }

    /// Reject values that would produce a broken document URL or a client
    /// that never times out.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field: &str, reason: &str| ConfigError::InvalidValue {
            field: format!("neocities.{field}"),
            reason: reason.to_string(),
        };

        if self.site_url.is_empty() && self.site_name.is_empty() {
            return Err(invalid("site_name", "must be set when site_url is empty"));
        }
        if self.document_path.is_empty() {
            return Err(invalid("document_path", "must not be empty"));
        }
        if self.document_path.starts_with('/') {
            return Err(invalid("document_path", "must be relative to the site root"));
        }
        if self.document_path.split('/').any(|segment| segment == "..") {
            return Err(invalid("document_path", "must not contain '..'"));
        }
        if self.timeout_secs == 0 {
            return Err(invalid("timeout_secs", "must be greater than zero"));
        }
        Ok(())
    }
}
