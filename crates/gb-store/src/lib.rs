//! # gb-store
//!
//! The entry store: one JSON array on a Neocities site is the whole
//! guestbook, across every scene.
//!
//! - [`NeocitiesStore::load_all`] fetches the document over HTTPS and degrades
//!   to an empty collection according to the configured [`ReadPolicy`].
//! - [`NeocitiesStore::replace_all`] uploads a full replacement through the
//!   Neocities upload API. No merge, no conditional write.
//! - [`NeocitiesStore::modify`] runs load, mutate and upload while holding a
//!   process-wide lock, so two appends in this process never overwrite each
//!   other. Writers in other processes are still last-writer-wins.

mod error;
mod http;

pub use error::StoreError;

use std::fmt;
use std::path::{Path, PathBuf};

use gb_config::{NeocitiesConfig, ReadPolicy};
use gb_core::EntryCollection;
use tokio::sync::Mutex;

// ── Credentials ───────────────────────────────────────────────────

#[derive(Clone)]
enum Credentials {
    ApiKey(String),
    Basic { user: String, password: String },
}

impl Credentials {
    fn from_config(config: &NeocitiesConfig) -> Option<Self> {
        if !config.api_key.is_empty() {
            Some(Self::ApiKey(config.api_key.clone()))
        } else if config.is_configured() {
            Some(Self::Basic {
                user: config.user.clone(),
                password: config.password.clone(),
            })
        } else {
            None
        }
    }

    fn apply(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self {
            Self::ApiKey(key) => request.bearer_auth(key),
            Self::Basic { user, password } => request.basic_auth(user, Some(password)),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ApiKey(_) => f.write_str("ApiKey(***)"),
            Self::Basic { user, .. } => write!(f, "Basic({user}, ***)"),
        }
    }
}

// ── Store ─────────────────────────────────────────────────────────

/// Entry store backed by a JSON document on Neocities.
#[derive(Debug)]
pub struct NeocitiesStore {
    http: reqwest::Client,
    document_url: String,
    upload_url: String,
    document_path: String,
    credentials: Option<Credentials>,
    staging_path: Option<PathBuf>,
    read_policy: ReadPolicy,
    write_lock: Mutex<()>,
}

impl NeocitiesStore {
    /// Build a store from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Client`] if the HTTP client cannot be built.
    pub fn new(config: &NeocitiesConfig) -> Result<Self, StoreError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("guestbook/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout())
            .build()
            .map_err(StoreError::Client)?;

        let credentials = Credentials::from_config(config);
        if credentials.is_none() {
            tracing::warn!("no Neocities credentials configured; uploads will be rejected");
        }

        Ok(Self {
            http,
            document_url: config.document_url(),
            upload_url: config.upload_url(),
            document_path: config.document_path.clone(),
            credentials,
            staging_path: config.staging_path(),
            read_policy: config.read_policy,
            write_lock: Mutex::new(()),
        })
    }

    #[must_use]
    pub fn document_url(&self) -> &str {
        &self.document_url
    }

    /// Load the whole document for reading.
    ///
    /// Network failures and non-array documents always yield an empty
    /// collection. Unexpected statuses and invalid JSON yield an empty
    /// collection under [`ReadPolicy::Lenient`] and an error under
    /// [`ReadPolicy::Strict`].
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Upstream`] or [`StoreError::Parse`] in strict
    /// mode only.
    pub async fn load_all(&self) -> Result<EntryCollection, StoreError> {
        match self.fetch().await {
            Ok(collection) => Ok(collection),
            Err(err) if self.degrades(&err) => {
                tracing::warn!(
                    url = %self.document_url,
                    error = %err,
                    "remote document unavailable; serving empty collection"
                );
                Ok(EntryCollection::new())
            }
            Err(err) => Err(err),
        }
    }

    /// Overwrite the remote document with `entries`.
    ///
    /// The document is written to the staging file first when one is
    /// configured. No read-back is performed after a successful upload.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Auth`] when credentials are missing or rejected,
    /// [`StoreError::Upload`] for any other upload failure, and
    /// [`StoreError::Staging`] if the staging file cannot be written.
    pub async fn replace_all(&self, entries: &EntryCollection) -> Result<(), StoreError> {
        let credentials = self.require_credentials()?;
        let body = entries.to_pretty_json()?;

        if let Some(path) = &self.staging_path {
            write_staging(path, &body).await?;
        }

        let file_name = Path::new(&self.document_path)
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("a_entries.json")
            .to_string();
        let part = reqwest::multipart::Part::bytes(body)
            .file_name(file_name)
            .mime_str("application/json")
            .map_err(|e| StoreError::Upload(e.to_string()))?;
        let form = reqwest::multipart::Form::new().part(self.document_path.clone(), part);

        let resp = credentials
            .apply(self.http.post(&self.upload_url))
            .multipart(form)
            .send()
            .await
            .map_err(|e| StoreError::Upload(format!("request to {} failed: {e}", self.upload_url)))?;
        let status = resp.status().as_u16();
        let reply = resp.text().await.unwrap_or_default();
        http::check_upload_reply(status, &reply)?;

        tracing::info!(
            path = %self.document_path,
            records = entries.len(),
            "remote document replaced"
        );
        Ok(())
    }

    /// Run one serialized read-modify-write cycle.
    ///
    /// The load inside the cycle is strict: any failure to read the current
    /// document aborts before anything is uploaded, except a 404 or empty
    /// body, which start a fresh document.
    ///
    /// # Errors
    ///
    /// Returns the fetch error, or any error from [`Self::replace_all`].
    pub async fn modify<T, F>(&self, mutate: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut EntryCollection) -> T,
    {
        self.require_credentials()?;
        let _guard = self.write_lock.lock().await;

        let mut collection = self.fetch().await?;
        let output = mutate(&mut collection);
        self.replace_all(&collection).await?;
        Ok(output)
    }

    async fn fetch(&self) -> Result<EntryCollection, StoreError> {
        tracing::debug!(url = %self.document_url, "fetching remote document");
        let resp = self
            .http
            .get(&self.document_url)
            .send()
            .await
            .map_err(StoreError::Transient)?;
        http::read_document(resp).await
    }

    fn degrades(&self, err: &StoreError) -> bool {
        match err {
            StoreError::Transient(_) | StoreError::UnexpectedShape(_) => true,
            StoreError::Parse(_) | StoreError::Upstream { .. } => {
                self.read_policy == ReadPolicy::Lenient
            }
            _ => false,
        }
    }

    fn require_credentials(&self) -> Result<&Credentials, StoreError> {
        self.credentials.as_ref().ok_or_else(|| {
            StoreError::Auth("missing Neocities credentials (invalid_auth)".into())
        })
    }
}

async fn write_staging(path: &Path, body: &[u8]) -> Result<(), StoreError> {
    let staging_err = |source| StoreError::Staging {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(staging_err)?;
    }
    tokio::fs::write(path, body).await.map_err(staging_err)?;
    tracing::debug!(path = %path.display(), bytes = body.len(), "staging file written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> NeocitiesConfig {
        NeocitiesConfig {
            site_url: "http://127.0.0.1:9".into(),
            api_url: "http://127.0.0.1:9/api".into(),
            ..Default::default()
        }
    }

    #[test]
    fn api_key_wins_over_basic_auth() {
        let creds = Credentials::from_config(&NeocitiesConfig {
            api_key: "k".into(),
            user: "u".into(),
            password: "p".into(),
            ..Default::default()
        });
        assert!(matches!(creds, Some(Credentials::ApiKey(_))));
    }

    #[test]
    fn credentials_debug_is_redacted() {
        let creds = Credentials::Basic {
            user: "forest".into(),
            password: "hunter2".into(),
        };
        let debug = format!("{creds:?}");
        assert!(debug.contains("forest"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn strict_policy_keeps_parse_errors() {
        let store = NeocitiesStore::new(&NeocitiesConfig {
            read_policy: ReadPolicy::Strict,
            ..config()
        })
        .unwrap();
        assert!(!store.degrades(&StoreError::Parse("x".into())));
        assert!(store.degrades(&StoreError::UnexpectedShape("object")));
        assert!(!store.degrades(&StoreError::Upload("x".into())));
    }

    #[test]
    fn lenient_policy_degrades_upstream_errors() {
        let store = NeocitiesStore::new(&config()).unwrap();
        assert!(store.degrades(&StoreError::Upstream {
            status: 500,
            url: String::new()
        }));
    }

    #[tokio::test]
    async fn replace_all_without_credentials_is_auth_error() {
        let store = NeocitiesStore::new(&config()).unwrap();
        let err = store.replace_all(&EntryCollection::new()).await.unwrap_err();
        assert!(matches!(err, StoreError::Auth(ref m) if m.contains("invalid_auth")));
    }

    #[tokio::test]
    async fn modify_without_credentials_never_runs_mutation() {
        let store = NeocitiesStore::new(&config()).unwrap();
        let mut ran = false;
        let result = store.modify(|_| ran = true).await;
        assert!(matches!(result, Err(StoreError::Auth(_))));
        assert!(!ran);
    }

    #[tokio::test]
    async fn staging_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/stage/entries.json");
        write_staging(&path, b"[]").await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"[]");
    }
}
