//! HTTP listener configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

fn default_host() -> String {
    String::from("0.0.0.0")
}

const fn default_port() -> u16 {
    3000
}

/// Default cap on request bodies, in bytes.
const fn default_max_body_bytes() -> usize {
    16 * 1024
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Interface to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Listening port. Also settable through the bare `PORT` variable.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory of static assets served for non-API `GET` paths.
    /// Empty disables static serving.
    #[serde(default)]
    pub public_dir: String,

    /// Request bodies above this size are rejected with 413.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_dir: String::new(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl ServerConfig {
    /// `host:port` string for the listener.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    #[must_use]
    pub fn public_dir(&self) -> Option<PathBuf> {
        (!self.public_dir.is_empty()).then(|| PathBuf::from(&self.public_dir))
    }
}
