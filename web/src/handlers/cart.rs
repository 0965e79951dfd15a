//! Cart service handlers.

use crate::WebResult;
use crate::validate;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::Deserialize;
use std::sync::Arc;
use stockcart_core::ledger::CartOperations;
use stockcart_core::{CartListing, Reservation, Sku, UserId};

/// Shared state of the cart router.
pub type CartState = Arc<dyn CartOperations>;

/// Body of `POST /api/cart/items`.
#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    /// Reserving user
    pub user_id: i64,
    /// SKU to reserve
    pub sku: u32,
    /// Units requested
    pub count: u32,
}

/// `POST /api/cart/items`
///
/// # Errors
///
/// 400 on validation failure or unknown SKU, 412 when stock is insufficient,
/// 504 when the stock service did not answer in time.
pub async fn add_item(
    State(ledger): State<CartState>,
    Json(request): Json<AddItemRequest>,
) -> WebResult<StatusCode> {
    let reservation = Reservation {
        user_id: validate::positive_user(UserId(request.user_id))?,
        sku: validate::sku(Sku(request.sku))?,
        count: validate::count(request.count)?,
    };

    ledger.add_item_to_cart(reservation).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /api/cart/:user_id/items/:sku`
///
/// # Errors
///
/// 400 on validation failure, 404 if the line did not exist.
pub async fn delete_item(
    State(ledger): State<CartState>,
    Path((user_id, sku)): Path<(i64, u32)>,
) -> WebResult<StatusCode> {
    let user_id = validate::positive_user(UserId(user_id))?;
    let sku = validate::sku(Sku(sku))?;

    ledger.delete_item_from_cart(user_id, sku).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/cart/:user_id`
///
/// # Errors
///
/// 400 on validation failure.
pub async fn list_items(
    State(ledger): State<CartState>,
    Path(user_id): Path<i64>,
) -> WebResult<Json<CartListing>> {
    let user_id = validate::positive_user(UserId(user_id))?;
    Ok(Json(ledger.list_cart_items(user_id).await?))
}

/// `DELETE /api/cart/:user_id`
///
/// # Errors
///
/// 400 on validation failure, 404 if the cart was already empty.
pub async fn clear_cart(
    State(ledger): State<CartState>,
    Path(user_id): Path<i64>,
) -> WebResult<StatusCode> {
    let user_id = validate::positive_user(UserId(user_id))?;
    ledger.clear_cart(user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
