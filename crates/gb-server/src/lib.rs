//! # gb-server
//!
//! HTTP surface of the guestbook.
//!
//! - `GET /api/{s}-entries` lists one scene's entries, oldest first
//! - `POST /api/{s}-entry` validates and appends one entry
//! - `GET /` answers a liveness probe
//! - other `GET`s serve static pages from the configured public directory
//!
//! [`App`] holds the request logic and is usable without a socket;
//! [`Server`] binds a `tiny_http` listener and drives [`App`] from tokio.

mod app;
mod assets;
mod error;
mod listener;
mod response;
mod routes;

pub use app::{ApiRequest, App, RequestBody};
pub use error::ServerError;
pub use listener::Server;
pub use response::ApiResponse;
pub use routes::{Route, resolve};
