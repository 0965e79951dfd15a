//! Stock service.
//!
//! Serves the stock ledger over HTTP, backed by `PostgreSQL`, and publishes
//! `stock_item_*` events to Redpanda.
//!
//! # Usage
//!
//! ```bash
//! docker compose up -d
//! cargo run --bin stock-service
//! ```

use std::path::Path;
use std::sync::Arc;
use stockcart_core::environment::SystemClock;
use stockcart_core::event_bus::EventBus;
use stockcart_postgres::{PostgresStockStore, connect};
use stockcart_runtime::emitter::DEFAULT_CAPACITY;
use stockcart_runtime::{EventEmitter, MetricsServer};
use stockcart_server::shutdown::Shutdown;
use stockcart_server::{Config, catalog, http, telemetry};
use stockcart_stock::{InstrumentedStock, StockLedger};
use stockcart_web::stock_router;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    telemetry::init_tracing();

    tracing::info!("Starting stock service");

    let config = Config::from_env();
    tracing::info!(
        redpanda = %config.redpanda.brokers,
        topic = %config.redpanda.topic,
        port = config.server.stock_port,
        "Configuration loaded"
    );

    let shutdown = Shutdown::on_signal();
    let metrics_addr = config.server.addr(config.server.stock_metrics_port).parse()?;
    let metrics = telemetry::spawn_metrics(MetricsServer::new(metrics_addr), shutdown.clone()).await?;

    let pool = connect(&config.stock_db.pool_settings()).await?;
    let store = PostgresStockStore::new(pool);
    if config.run_migrations {
        store.migrate().await?;
        tracing::info!("Stock migrations applied");
    }
    let catalog = catalog::load(config.catalog_path.as_deref().map(Path::new)).await?;
    catalog::seed(&store, &catalog).await?;

    let bus: Arc<dyn EventBus> = Arc::new(config.redpanda.event_bus("latest")?);
    let emitter = Arc::new(EventEmitter::new(
        bus,
        config.redpanda.topic.clone(),
        DEFAULT_CAPACITY,
    ));

    let ledger = InstrumentedStock::new(StockLedger::new(
        Arc::new(store),
        Arc::clone(&emitter),
        Arc::new(SystemClock),
    ));

    http::serve(
        &config.server.addr(config.server.stock_port),
        stock_router(Arc::new(ledger)),
        shutdown,
        &emitter,
        config.server.shutdown_budget(),
    )
    .await?;

    metrics.await?;
    tracing::info!("Stock service stopped");
    Ok(())
}
