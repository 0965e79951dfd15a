//! Stock service handlers.

use crate::WebResult;
use crate::validate;
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use stockcart_core::ledger::StockOperations;
use stockcart_core::{ClaimOutcome, LocationQuery, NewStockItem, Sku, StockItem, StockPage, UserId};

/// Shared state of the stock router.
pub type StockState = Arc<dyn StockOperations>;

/// Body of `POST /api/stocks`.
#[derive(Debug, Deserialize)]
pub struct AddStockRequest {
    /// Claiming user
    pub user_id: i64,
    /// SKU to claim
    pub sku: u32,
    /// Units to add
    pub count: u32,
    /// Unit price
    pub price: u32,
    /// Warehouse location
    pub location: String,
}

/// Response of `POST /api/stocks`.
#[derive(Debug, Serialize, Deserialize)]
pub struct AddStockResponse {
    /// `created` for a first claim, `changed` for an additive one
    pub outcome: String,
}

/// Owner passed to `DELETE /api/stocks/:sku`.
#[derive(Debug, Deserialize)]
pub struct DeleteStockParams {
    /// Requesting user
    pub user_id: i64,
}

/// Query of `GET /api/stocks`.
#[derive(Debug, Deserialize)]
pub struct ListStocksParams {
    /// Owner of the items
    pub user_id: i64,
    /// Warehouse location
    pub location: String,
    /// Items per page
    pub page_size: u32,
    /// 1-based page number
    pub current_page: u32,
}

/// `POST /api/stocks`
///
/// Returns 201 for a first claim and 200 for an additive one.
///
/// # Errors
///
/// 400 on validation failure or unknown SKU, 409 if another user owns the SKU.
pub async fn add_stock(
    State(ledger): State<StockState>,
    Json(request): Json<AddStockRequest>,
) -> WebResult<(StatusCode, Json<AddStockResponse>)> {
    let item = NewStockItem {
        owner: validate::non_zero_user(UserId(request.user_id))?,
        sku: validate::sku(Sku(request.sku))?,
        count: validate::count(request.count)?,
        price: request.price,
        location: validate::location(&request.location)?.to_string(),
    };

    let (status, outcome) = match ledger.add_item(&item).await? {
        ClaimOutcome::Created => (StatusCode::CREATED, "created"),
        ClaimOutcome::Changed => (StatusCode::OK, "changed"),
    };
    Ok((
        status,
        Json(AddStockResponse {
            outcome: outcome.to_string(),
        }),
    ))
}

/// `DELETE /api/stocks/:sku?user_id=`
///
/// # Errors
///
/// 400 on validation failure, 404 if there was nothing to delete.
pub async fn delete_stock(
    State(ledger): State<StockState>,
    Path(sku): Path<u32>,
    Query(params): Query<DeleteStockParams>,
) -> WebResult<StatusCode> {
    validate::non_zero_user(UserId(params.user_id))?;
    ledger.delete_item(validate::sku(Sku(sku))?).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/stocks/:sku`
///
/// # Errors
///
/// 400 for SKU zero, 404 if the SKU has no stock row.
pub async fn get_stock(
    State(ledger): State<StockState>,
    Path(sku): Path<u32>,
) -> WebResult<Json<StockItem>> {
    let item = ledger.get_item_by_sku(validate::sku(Sku(sku))?).await?;
    Ok(Json(item))
}

/// `GET /api/stocks?user_id=&location=&page_size=&current_page=`
///
/// # Errors
///
/// 400 on validation failure.
pub async fn list_stocks(
    State(ledger): State<StockState>,
    Query(params): Query<ListStocksParams>,
) -> WebResult<Json<StockPage>> {
    validate::page(params.page_size, params.current_page)?;
    let query = LocationQuery {
        user_id: validate::non_zero_user(UserId(params.user_id))?,
        location: validate::location(&params.location)?.to_string(),
        page_size: params.page_size,
        current_page: params.current_page,
    };

    Ok(Json(ledger.list_by_location(&query).await?))
}
