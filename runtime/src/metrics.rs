//! Prometheus metrics for the ledgers, the event emitter, and the audit consumer.
//!
//! # Example
//!
//! ```rust,no_run
//! use stockcart_runtime::metrics::MetricsServer;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut server = MetricsServer::new("0.0.0.0:9090".parse()?);
//! server.start()?;
//!
//! // Serve server.render() from GET /metrics
//! # Ok(())
//! # }
//! ```

use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::future::Future;
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use stockcart_core::LedgerError;
use thiserror::Error;

// Re-export metrics macros for use in other crates
pub use metrics::{counter, histogram};

/// Errors from metrics operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to build metrics exporter
    #[error("Failed to build metrics exporter: {0}")]
    Build(String),
    /// Failed to install metrics exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
}

/// Prometheus metrics server.
///
/// Installs the global recorder; the binaries expose [`MetricsServer::render`]
/// on `addr` for Prometheus scraping.
pub struct MetricsServer {
    addr: SocketAddr,
    handle: Option<PrometheusHandle>,
}

impl MetricsServer {
    /// Create a new metrics server.
    ///
    /// # Arguments
    ///
    /// * `addr` - Socket address the scrape endpoint binds to (e.g., `0.0.0.0:9090`)
    #[must_use]
    pub const fn new(addr: SocketAddr) -> Self {
        Self { addr, handle: None }
    }

    /// Address the scrape endpoint should bind to.
    #[must_use]
    pub const fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Register metric descriptions and install the Prometheus recorder.
    ///
    /// # Errors
    ///
    /// Returns error if the exporter cannot be built or installed.
    ///
    /// # Note
    ///
    /// If a metrics recorder is already installed (e.g., in tests), this logs a
    /// warning and leaves [`MetricsServer::handle`] empty.
    pub fn start(&mut self) -> Result<(), MetricsError> {
        register_metrics();

        let builder = PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                &[
                    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
                ],
            )
            .map_err(|e| MetricsError::Build(e.to_string()))?;

        match builder.install_recorder() {
            Ok(handle) => {
                self.handle = Some(handle);
                tracing::info!(
                    addr = %self.addr,
                    "Metrics recorder installed - available at http://{}/metrics",
                    self.addr
                );
                Ok(())
            }
            Err(e) => {
                let err_msg = e.to_string();
                if err_msg.contains("already initialized") {
                    tracing::warn!("Metrics recorder already initialized, skipping re-initialization");
                    Ok(())
                } else {
                    Err(MetricsError::Install(err_msg))
                }
            }
        }
    }

    /// Get the metrics handle for rendering.
    #[must_use]
    pub const fn handle(&self) -> Option<&PrometheusHandle> {
        self.handle.as_ref()
    }

    /// Render current metrics in Prometheus format.
    ///
    /// Returns `None` if the recorder was not installed by this server.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        self.handle.as_ref().map(PrometheusHandle::render)
    }
}

/// Register all metric descriptions.
fn register_metrics() {
    describe_counter!(
        "stock_operations_total",
        "Stock ledger operations by operation and outcome"
    );
    describe_histogram!(
        "stock_operation_duration_seconds",
        "Time taken by stock ledger operations"
    );
    describe_counter!(
        "cart_operations_total",
        "Cart ledger operations by operation and outcome"
    );
    describe_histogram!(
        "cart_operation_duration_seconds",
        "Time taken by cart ledger operations"
    );

    describe_counter!(
        "ledger_events_published_total",
        "Domain events delivered to the event bus"
    );
    describe_counter!(
        "ledger_events_publish_failed_total",
        "Domain events the event bus rejected"
    );
    describe_counter!(
        "ledger_events_dropped_total",
        "Domain events dropped before reaching the publisher"
    );

    describe_counter!(
        "ledger_audit_events_total",
        "Domain events consumed by the audit consumer"
    );
}

/// Ledger operation metrics recorder.
pub struct LedgerMetrics;

impl LedgerMetrics {
    /// Record one ledger operation.
    ///
    /// `service` is `"stock"` or `"cart"`; `outcome` is `"ok"` or an error kind.
    pub fn record_operation(
        service: &'static str,
        op: &'static str,
        outcome: &'static str,
        duration: Duration,
    ) {
        let (total, seconds) = match service {
            "stock" => ("stock_operations_total", "stock_operation_duration_seconds"),
            _ => ("cart_operations_total", "cart_operation_duration_seconds"),
        };
        counter!(total, "op" => op, "outcome" => outcome).increment(1);
        histogram!(seconds, "op" => op).record(duration.as_secs_f64());
    }
}

/// Run a ledger operation, then record its outcome and duration.
///
/// Domain outcomes log at `info`, every other error at `warn`.
///
/// # Errors
///
/// Returns whatever `operation` returns.
pub async fn observe<F, T>(
    service: &'static str,
    op: &'static str,
    operation: F,
) -> Result<T, LedgerError>
where
    F: Future<Output = Result<T, LedgerError>>,
{
    let start = Instant::now();
    let result = operation.await;
    let outcome = match &result {
        Ok(_) => "ok",
        Err(e) => e.kind(),
    };
    LedgerMetrics::record_operation(service, op, outcome, start.elapsed());

    match &result {
        Ok(_) => tracing::debug!(service, op, elapsed_ms = start.elapsed().as_millis(), "Operation completed"),
        Err(e) if e.is_domain_outcome() => tracing::info!(service, op, outcome, "Operation rejected"),
        Err(e) => tracing::warn!(service, op, error = %e, "Operation failed"),
    }
    result
}

/// Event emitter metrics recorder.
pub struct EmitterMetrics;

impl EmitterMetrics {
    /// Record a delivered event.
    pub fn record_published(event_type: &'static str) {
        counter!("ledger_events_published_total", "type" => event_type).increment(1);
    }

    /// Record a publish the bus rejected.
    pub fn record_publish_failed() {
        counter!("ledger_events_publish_failed_total").increment(1);
    }

    /// Record an event dropped before hand-off (buffer full, emitter closed, encode failure).
    pub fn record_dropped(reason: &'static str) {
        counter!("ledger_events_dropped_total", "reason" => reason).increment(1);
    }
}

/// Audit consumer metrics recorder.
pub struct AuditMetrics;

impl AuditMetrics {
    /// Record one consumed event.
    pub fn record_event(event_type: &'static str, service: &'static str) {
        counter!("ledger_audit_events_total", "type" => event_type, "service" => service)
            .increment(1);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_server_creation() {
        let addr = "127.0.0.1:0".parse().unwrap();
        let server = MetricsServer::new(addr);
        assert!(server.handle().is_none());
        assert_eq!(server.addr(), addr);
    }

    #[tokio::test]
    async fn observe_passes_result_through() {
        let ok = observe("stock", "get_item_by_sku", async { Ok::<_, LedgerError>(3) }).await;
        assert_eq!(ok, Ok(3));

        let rejected = observe("cart", "add_item_to_cart", async {
            Err::<(), _>(LedgerError::InsufficientStock)
        })
        .await;
        assert_eq!(rejected, Err(LedgerError::InsufficientStock));
    }

    #[test]
    fn test_metrics_server_render() {
        let addr = "127.0.0.1:0".parse().unwrap();
        let mut server = MetricsServer::new(addr);
        server.start().unwrap();

        LedgerMetrics::record_operation("stock", "add_item", "ok", Duration::from_millis(3));
        LedgerMetrics::record_operation("cart", "add_item_to_cart", "insufficient_stock", Duration::from_millis(5));
        EmitterMetrics::record_published("stock_item_created");
        AuditMetrics::record_event("cart_item_failed", "cart");

        // The recorder is process-global; another test may have installed it.
        if let Some(rendered) = server.render() {
            assert!(rendered.contains("stock_operations_total"));
            assert!(rendered.contains("cart_operations_total"));
            assert!(rendered.contains("ledger_events_published_total"));
            assert!(rendered.contains("ledger_audit_events_total"));
        }
    }
}
