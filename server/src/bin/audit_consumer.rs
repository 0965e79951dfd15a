//! Audit consumer.
//!
//! Subscribes to the ledger events topic, logs every event and counts it in
//! `ledger_audit_events_total`. Runs until Ctrl+C.

use stockcart_core::event_bus::EventBus;
use stockcart_runtime::MetricsServer;
use stockcart_server::audit::AuditConsumer;
use stockcart_server::shutdown::Shutdown;
use stockcart_server::{Config, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    telemetry::init_tracing();

    tracing::info!("Starting audit consumer");

    let config = Config::from_env();
    tracing::info!(
        redpanda = %config.redpanda.brokers,
        topic = %config.redpanda.topic,
        consumer_group = %config.redpanda.consumer_group,
        "Configuration loaded"
    );

    let shutdown = Shutdown::on_signal();
    let metrics_addr = config.server.addr(config.server.audit_metrics_port).parse()?;
    let metrics = telemetry::spawn_metrics(MetricsServer::new(metrics_addr), shutdown.clone()).await?;

    let bus = config.redpanda.event_bus("earliest")?;
    let stream = bus.subscribe(&[config.redpanda.topic.as_str()]).await?;

    let summary = AuditConsumer.run(stream, shutdown).await;
    tracing::info!(
        handled = summary.handled,
        skipped = summary.skipped,
        "Audit consumer stopped"
    );

    metrics.await?;
    Ok(())
}
