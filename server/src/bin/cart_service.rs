//! Cart service.
//!
//! Serves the cart ledger over HTTP, backed by its own `PostgreSQL` database.
//! Reservations are checked against the stock service over HTTP and publish
//! `cart_item_*` events to Redpanda.
//!
//! # Usage
//!
//! ```bash
//! docker compose up -d
//! cargo run --bin cart-service
//! ```

use std::sync::Arc;
use stockcart_cart::{CartLedger, HttpStockLookup, InstrumentedCart};
use stockcart_core::environment::SystemClock;
use stockcart_core::event_bus::EventBus;
use stockcart_postgres::{PostgresCartStore, connect};
use stockcart_runtime::emitter::DEFAULT_CAPACITY;
use stockcart_runtime::{EventEmitter, MetricsServer};
use stockcart_server::shutdown::Shutdown;
use stockcart_server::{Config, http, telemetry};
use stockcart_web::cart_router;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    telemetry::init_tracing();

    tracing::info!("Starting cart service");

    let config = Config::from_env();
    tracing::info!(
        redpanda = %config.redpanda.brokers,
        topic = %config.redpanda.topic,
        stock_service = %config.stock_client.base_url,
        read_timeout_ms = config.stock_client.read_timeout_ms,
        port = config.server.cart_port,
        "Configuration loaded"
    );

    let shutdown = Shutdown::on_signal();
    let metrics_addr = config.server.addr(config.server.cart_metrics_port).parse()?;
    let metrics = telemetry::spawn_metrics(MetricsServer::new(metrics_addr), shutdown.clone()).await?;

    let pool = connect(&config.cart_db.pool_settings()).await?;
    let store = PostgresCartStore::new(pool);
    if config.run_migrations {
        store.migrate().await?;
        tracing::info!("Cart migrations applied");
    }

    let bus: Arc<dyn EventBus> = Arc::new(config.redpanda.event_bus("latest")?);
    let emitter = Arc::new(EventEmitter::new(
        bus,
        config.redpanda.topic.clone(),
        DEFAULT_CAPACITY,
    ));

    let deadline = config.stock_client.deadline();
    let stock = HttpStockLookup::new(config.stock_client.base_url.clone(), deadline)?;
    let ledger = InstrumentedCart::new(
        CartLedger::new(
            Arc::new(store),
            Arc::new(stock),
            Arc::clone(&emitter),
            Arc::new(SystemClock),
        )
        .with_lookup_deadline(deadline),
    );

    http::serve(
        &config.server.addr(config.server.cart_port),
        cart_router(Arc::new(ledger)),
        shutdown,
        &emitter,
        config.server.shutdown_budget(),
    )
    .await?;

    metrics.await?;
    tracing::info!("Cart service stopped");
    Ok(())
}
