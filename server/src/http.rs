//! HTTP serving with emitter drain on shutdown.

use crate::shutdown::Shutdown;
use axum::Router;
use std::time::Duration;
use stockcart_runtime::EventEmitter;

/// Serve `app` on `addr` until `shutdown` fires, then close `emitter`.
///
/// In-flight requests finish before the emitter stops accepting events, so
/// every committed write still gets its publish attempt within `budget`.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails.
pub async fn serve(
    addr: &str,
    app: Router,
    shutdown: Shutdown,
    emitter: &EventEmitter,
    budget: Duration,
) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.wait())
        .await?;
    tracing::info!("HTTP server stopped, draining events");

    if let Err(e) = emitter.close(budget).await {
        tracing::warn!(error = %e, "Event emitter did not close cleanly");
    }
    Ok(())
}
