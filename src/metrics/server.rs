//! HTTP server for the Prometheus metrics endpoint.

use crate::metrics::MetricsRegistry;
use crate::scraper::StatusScraper;
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;

/// Errors that can occur during metrics server operations.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("telemetry endpoint {0:?} must start with '/'")]
    InvalidEndpoint(String),

    #[error("failed to bind to address: {0}")]
    Bind(#[from] std::io::Error),

    #[error("server error: {0}")]
    Server(String),
}

/// Configuration for the metrics server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsServerConfig {
    /// Address to bind the server to.
    pub bind_addr: SocketAddr,
    /// Path under which to expose metrics.
    pub endpoint: String,
}

impl Default for MetricsServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: ([0, 0, 0, 0], 9117).into(),
            endpoint: "/metrics".to_string(),
        }
    }
}

impl MetricsServerConfig {
    /// Creates a config with a custom port.
    pub fn with_port(port: u16) -> Self {
        Self {
            bind_addr: ([0, 0, 0, 0], port).into(),
            ..Self::default()
        }
    }
}

/// Shared state behind the metrics endpoint.
///
/// The lock serializes scrapes, so at most one request to the origin
/// server is in flight no matter how many collectors poll the exporter.
struct ExporterState {
    scraper: StatusScraper,
    registry: MetricsRegistry,
    scrape_lock: Mutex<()>,
}

/// HTTP server exposing the scrape results.
///
/// Every request to the metrics endpoint triggers one scrape of the
/// status page, so the exposed values are always point-in-time.
pub struct MetricsServer {
    config: MetricsServerConfig,
    state: Arc<ExporterState>,
}

impl MetricsServer {
    /// Creates a new metrics server around a scraper and registry.
    pub fn new(
        config: MetricsServerConfig,
        scraper: StatusScraper,
        registry: MetricsRegistry,
    ) -> Self {
        Self {
            config,
            state: Arc::new(ExporterState {
                scraper,
                registry,
                scrape_lock: Mutex::new(()),
            }),
        }
    }

    /// Starts the HTTP server.
    ///
    /// This method runs the server until a shutdown signal arrives.
    pub async fn run(self) -> Result<(), ServerError> {
        if !self.config.endpoint.starts_with('/') {
            return Err(ServerError::InvalidEndpoint(self.config.endpoint));
        }

        let landing = landing_page(&self.config.endpoint);
        let app = Router::new()
            .route(&self.config.endpoint, get(metrics_handler))
            .route("/", get(move || async move { Html(landing) }))
            .route("/health", get(health_handler))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state);

        let listener = tokio::net::TcpListener::bind(self.config.bind_addr).await?;

        tracing::info!(
            addr = %self.config.bind_addr,
            endpoint = %self.config.endpoint,
            "Metrics server listening"
        );

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ServerError::Server(e.to_string()))?;

        Ok(())
    }
}

/// Handler for the metrics endpoint.
///
/// Scrape failures still answer 200 with the liveness families, so the
/// collecting side sees `apache_up 0` instead of an opaque HTTP error.
async fn metrics_handler(State(state): State<Arc<ExporterState>>) -> Response {
    let _guard = state.scrape_lock.lock().await;

    let rendered = match state.scraper.scrape().await {
        Ok(snapshot) => state.registry.render(&snapshot),
        Err(error) => {
            tracing::warn!(error = %error, uri = %state.scraper.uri(), "scrape failed");
            state.registry.render_failure(error.reachable())
        }
    };

    match rendered {
        Ok(output) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            output,
        )
            .into_response(),
        Err(error) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to encode metrics: {}", error),
        )
            .into_response(),
    }
}

/// Handler for the /health endpoint.
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

fn landing_page(endpoint: &str) -> String {
    format!(
        "<html>\n\
         <head><title>Apache Exporter</title></head>\n\
         <body>\n\
         <h1>Apache Exporter</h1>\n\
         <p><a href='{}'>Metrics</a></p>\n\
         </body>\n\
         </html>",
        endpoint
    )
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::error!(%error, "failed to install interrupt handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::error!(%error, "failed to install terminate handler");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    tracing::info!("shutdown signal received");
}
