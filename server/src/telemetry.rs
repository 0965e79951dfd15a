//! Logging and metrics exposition for the binaries.

use crate::shutdown::Shutdown;
use axum::Router;
use axum::extract::State;
use axum::routing::get;
use std::sync::Arc;
use stockcart_runtime::MetricsServer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info,stockcart=debug,sqlx=warn";

/// Install the global `tracing` subscriber.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Router exposing `GET /metrics` in Prometheus text format.
#[must_use]
pub fn metrics_router(metrics: Arc<MetricsServer>) -> Router {
    Router::new()
        .route("/metrics", get(render_metrics))
        .with_state(metrics)
}

#[allow(clippy::unused_async)]
async fn render_metrics(State(metrics): State<Arc<MetricsServer>>) -> String {
    metrics.render().unwrap_or_default()
}

/// Install the Prometheus recorder and serve it on its own port until shutdown.
///
/// # Errors
///
/// Returns an error if the recorder cannot be installed or the port cannot be bound.
pub async fn spawn_metrics(
    mut metrics: MetricsServer,
    shutdown: Shutdown,
) -> anyhow::Result<tokio::task::JoinHandle<()>> {
    metrics.start()?;
    let listener = tokio::net::TcpListener::bind(metrics.addr()).await?;
    let app = metrics_router(Arc::new(metrics));

    Ok(tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown.wait())
            .await
        {
            tracing::error!(error = %e, "Metrics server failed");
        }
    }))
}
