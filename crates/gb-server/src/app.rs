//! Request handling, independent of the socket layer.

use std::path::PathBuf;

use gb_config::ServerConfig;
use gb_core::{AppendResponse, CoreError, Scene, now_millis, parse_spots};
use gb_store::NeocitiesStore;
use tiny_http::Method;

use crate::assets;
use crate::response::ApiResponse;
use crate::routes::{self, Route};

const HEALTH_TEXT: &str = "whispering forest guestbook API is running.";

/// Request body as read off the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    Bytes(Vec<u8>),
    /// Declared or actual length exceeded the configured cap.
    TooLarge,
    /// The connection failed mid-body.
    Unreadable(String),
}

#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub body: RequestBody,
}

impl ApiRequest {
    pub fn new(method: Method, url: impl Into<String>, body: RequestBody) -> Self {
        Self {
            method,
            url: url.into(),
            body,
        }
    }
}

/// Shared state behind every request.
#[derive(Debug)]
pub struct App {
    store: NeocitiesStore,
    public_dir: Option<PathBuf>,
    max_body_bytes: usize,
}

impl App {
    #[must_use]
    pub fn new(store: NeocitiesStore, server: &ServerConfig) -> Self {
        Self {
            store,
            public_dir: server.public_dir(),
            max_body_bytes: server.max_body_bytes,
        }
    }

    #[must_use]
    pub const fn max_body_bytes(&self) -> usize {
        self.max_body_bytes
    }

    #[must_use]
    pub const fn store(&self) -> &NeocitiesStore {
        &self.store
    }

    pub async fn handle(&self, request: ApiRequest) -> ApiResponse {
        let route = routes::resolve(&request.method, &request.url);
        tracing::debug!(method = %request.method, url = %request.url, ?route, "request");

        match route {
            Route::Health => ApiResponse::text(200, HEALTH_TEXT),
            Route::Preflight => ApiResponse::preflight(),
            Route::ListEntries(scene) => self.list_entries(scene).await,
            Route::AppendEntry(scene) => self.append_entry(scene, request.body).await,
            Route::InvalidScene(err) => {
                tracing::debug!(url = %request.url, "rejected scene symbol");
                ApiResponse::bad_request(&err)
            }
            Route::Asset(path) => match &self.public_dir {
                Some(root) => assets::serve(root, &path).await,
                None => assets::not_found(&path),
            },
            Route::MethodNotAllowed => ApiResponse::error(
                405,
                "method_not_allowed",
                format!("{} is not allowed on {}", request.method, request.url),
            ),
            Route::NotFound => assets::not_found(&request.url),
        }
    }

    async fn list_entries(&self, scene: Scene) -> ApiResponse {
        match self.store.load_all().await {
            Ok(collection) => ApiResponse::json(200, &collection.scene_view(scene)),
            Err(err) => {
                tracing::error!(%scene, error = %err, "failed to load entries");
                ApiResponse::error(500, "failed_to_get_entries", err.to_string())
            }
        }
    }

    async fn append_entry(&self, scene: Scene, body: RequestBody) -> ApiResponse {
        let bytes = match body {
            RequestBody::Bytes(bytes) => bytes,
            RequestBody::TooLarge => {
                return ApiResponse::error(
                    413,
                    "payload_too_large",
                    format!("request body exceeds {} bytes", self.max_body_bytes),
                );
            }
            RequestBody::Unreadable(reason) => {
                return ApiResponse::bad_request(&CoreError::Validation(format!(
                    "request body could not be read: {reason}"
                )));
            }
        };
        let spots = match parse_spots(&bytes) {
            Ok(spots) => spots,
            Err(err) => return ApiResponse::bad_request(&err),
        };

        let created_at = now_millis();
        let outcome = self
            .store
            .modify(|entries| {
                let entry = entries.append(scene, spots, created_at);
                (entry, entries.len())
            })
            .await;

        match outcome {
            Ok((entry, total)) => {
                tracing::info!(%scene, id = %entry.id, total, "entry appended");
                ApiResponse::json(201, &AppendResponse::new(entry, total))
            }
            Err(err) => {
                tracing::error!(%scene, error = %err, "failed to append entry");
                ApiResponse::error(500, "failed_to_append_entry", err.to_string())
            }
        }
    }
}
