//! Axum routers for the stock and cart services.
//!
//! The routers are thin transport adapters: they parse the request, validate
//! the fields, call the ledger through its trait object and map the result to
//! an HTTP response.
//!
//! # Request Flow
//!
//! 1. **HTTP Request** arrives at an Axum handler
//! 2. **Validate** ids, counts and paging; failures answer 400 without touching the ledger
//! 3. **Call** [`StockOperations`] or [`CartOperations`]
//! 4. **Map** [`LedgerError`](stockcart_core::LedgerError) to a status through [`AppError`]
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use stockcart_web::stock_router;
//!
//! let app = stock_router(Arc::new(ledger));
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8081").await?;
//! axum::serve(listener, app).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod handlers;
pub mod validate;

pub use error::AppError;

use axum::Router;
use axum::routing::{delete, get, post};
use handlers::{cart, health, stock};
use std::sync::Arc;
use stockcart_core::ledger::{CartOperations, StockOperations};
use tower_http::trace::TraceLayer;

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;

/// Routes of the stock service.
///
/// ```text
/// POST   /api/stocks          add stock
/// GET    /api/stocks          list by location
/// GET    /api/stocks/:sku     get stock
/// DELETE /api/stocks/:sku     delete stock
/// GET    /health
/// ```
#[must_use]
pub fn stock_router(ledger: Arc<dyn StockOperations>) -> Router {
    Router::new()
        .route("/api/stocks", post(stock::add_stock).get(stock::list_stocks))
        .route(
            "/api/stocks/:sku",
            get(stock::get_stock).delete(stock::delete_stock),
        )
        .with_state(ledger)
        .route("/health", get(health::health_check))
        .layer(TraceLayer::new_for_http())
}

/// Routes of the cart service.
///
/// ```text
/// POST   /api/cart/items                  add item to cart
/// GET    /api/cart/:user_id               list cart
/// DELETE /api/cart/:user_id               clear cart
/// DELETE /api/cart/:user_id/items/:sku    delete item from cart
/// GET    /health
/// ```
#[must_use]
pub fn cart_router(ledger: Arc<dyn CartOperations>) -> Router {
    Router::new()
        .route("/api/cart/items", post(cart::add_item))
        .route(
            "/api/cart/:user_id",
            get(cart::list_items).delete(cart::clear_cart),
        )
        .route("/api/cart/:user_id/items/:sku", delete(cart::delete_item))
        .with_state(ledger)
        .route("/health", get(health::health_check))
        .layer(TraceLayer::new_for_http())
}
