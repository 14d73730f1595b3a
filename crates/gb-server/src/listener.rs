//! The socket side: `tiny_http` accepts on a blocking thread and hands each
//! request to a tokio task running [`App::handle`].

use std::future::Future;
use std::io::Read;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::app::{ApiRequest, App, RequestBody};
use crate::error::ServerError;

/// Requests accepted but not yet picked up by the dispatcher.
const ACCEPT_BACKLOG: usize = 64;

pub struct Server {
    http: Arc<tiny_http::Server>,
    app: Arc<App>,
}

impl Server {
    /// Bind the listener. Port `0` picks a free port.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] if the address cannot be bound.
    pub fn bind(addr: &str, app: App) -> Result<Self, ServerError> {
        let http = tiny_http::Server::http(addr).map_err(|e| ServerError::Bind {
            addr: addr.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            http: Arc::new(http),
            app: Arc::new(app),
        })
    }

    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.http.server_addr().to_ip()
    }

    /// Serve until `shutdown` resolves, then finish in-flight requests.
    pub async fn run_until<F>(self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let (tx, mut rx) = mpsc::channel::<tiny_http::Request>(ACCEPT_BACKLOG);
        let acceptor = {
            let http = Arc::clone(&self.http);
            tokio::task::spawn_blocking(move || {
                for request in http.incoming_requests() {
                    if tx.blocking_send(request).is_err() {
                        break;
                    }
                }
            })
        };

        if let Some(addr) = self.local_addr() {
            tracing::info!(%addr, "guestbook listening");
        }

        let mut in_flight = JoinSet::new();
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                () = &mut shutdown => {
                    tracing::info!("shutdown requested");
                    break;
                }
                request = rx.recv() => match request {
                    Some(request) => {
                        in_flight.spawn(serve_one(Arc::clone(&self.app), request));
                    }
                    None => break,
                },
                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                    if let Err(err) = joined {
                        tracing::error!(error = %err, "request task failed");
                    }
                }
            }
        }

        self.http.unblock();
        drop(rx);
        if let Err(err) = acceptor.await {
            tracing::warn!(error = %err, "accept loop ended abnormally");
        }
        while let Some(joined) = in_flight.join_next().await {
            if let Err(err) = joined {
                tracing::error!(error = %err, "request task failed");
            }
        }
        tracing::info!("guestbook stopped");
    }
}

async fn serve_one(app: Arc<App>, request: tiny_http::Request) {
    let limit = app.max_body_bytes();
    let Ok((request, api_request)) =
        tokio::task::spawn_blocking(move || read_request(request, limit)).await
    else {
        tracing::error!("request reader panicked");
        return;
    };

    let response = app.handle(api_request).await;
    let status = response.status;
    match tokio::task::spawn_blocking(move || request.respond(response.into_tiny())).await {
        Ok(Ok(())) => tracing::trace!(status, "response sent"),
        Ok(Err(err)) => tracing::debug!(status, error = %err, "client went away before response"),
        Err(err) => tracing::error!(error = %err, "response writer panicked"),
    }
}

/// Read method, URL and at most `limit` body bytes off a request.
fn read_request(mut request: tiny_http::Request, limit: usize) -> (tiny_http::Request, ApiRequest) {
    let method = request.method().clone();
    let url = request.url().to_string();

    let body = if request.body_length().is_some_and(|len| len > limit) {
        RequestBody::TooLarge
    } else {
        let cap = u64::try_from(limit).unwrap_or(u64::MAX).saturating_add(1);
        let mut buf = Vec::new();
        match request.as_reader().take(cap).read_to_end(&mut buf) {
            Ok(_) if buf.len() > limit => RequestBody::TooLarge,
            Ok(_) => RequestBody::Bytes(buf),
            Err(err) => RequestBody::Unreadable(err.to_string()),
        }
    };

    (request, ApiRequest::new(method, url, body))
}
