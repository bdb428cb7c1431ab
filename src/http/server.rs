//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Wrap a service router with the shared middleware stack
//!   (request timeout, request ID, access tracing)
//! - Bind server to listener
//! - Stop accepting on shutdown and drain in-flight requests

use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::http::request::{UuidRequestId, X_REQUEST_ID};

/// HTTP server for one service.
pub struct HttpServer {
    name: &'static str,
    router: Router,
}

impl HttpServer {
    /// Create a server for `app` named `name` (used in logs).
    pub fn new(name: &'static str, app: Router, request_timeout: Duration) -> Self {
        Self {
            name,
            router: Self::build_router(app, request_timeout),
        }
    }

    /// Apply the middleware layers. The last layer added runs first.
    #[allow(deprecated)]
    fn build_router(app: Router, request_timeout: Duration) -> Router {
        app.layer(TimeoutLayer::new(request_timeout))
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, UuidRequestId))
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server until `shutdown` fires, then drain.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(service = self.name, address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!(service = self.name, "HTTP server stopped");
        Ok(())
    }
}
