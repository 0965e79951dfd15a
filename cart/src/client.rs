//! HTTP client for the stock service.

use std::time::Duration;

use reqwest::StatusCode;
use stockcart_core::ledger::{LedgerFuture, StockLookup};
use stockcart_core::{LedgerError, Sku, StockItem};

/// [`StockLookup`] over `GET {base_url}/api/stocks/{sku}`.
///
/// Every request carries `deadline` as its total timeout. A timeout maps to
/// [`LedgerError::Timeout`], a 404 to [`LedgerError::NotFound`], anything else
/// unexpected to [`LedgerError::Internal`].
#[derive(Clone, Debug)]
pub struct HttpStockLookup {
    client: reqwest::Client,
    base_url: String,
}

impl HttpStockLookup {
    /// Build a client for the stock service at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Internal`] if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, deadline: Duration) -> Result<Self, LedgerError> {
        let client = reqwest::Client::builder()
            .timeout(deadline)
            .build()
            .map_err(|e| LedgerError::Internal(format!("failed to build stock client: {e}")))?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }
}

fn classify(err: &reqwest::Error) -> LedgerError {
    if err.is_timeout() {
        LedgerError::Timeout
    } else {
        LedgerError::Internal(format!("stock service request failed: {err}"))
    }
}

impl StockLookup for HttpStockLookup {
    fn get_stock(&self, sku: Sku) -> LedgerFuture<'_, StockItem> {
        Box::pin(async move {
            let url = format!("{}/api/stocks/{sku}", self.base_url);
            let response = self
                .client
                .get(&url)
                .send()
                .await
                .map_err(|e| classify(&e))?;

            match response.status() {
                StatusCode::NOT_FOUND => Err(LedgerError::NotFound),
                status if status.is_success() => {
                    response.json::<StockItem>().await.map_err(|e| classify(&e))
                }
                status => {
                    tracing::warn!(sku = %sku, status = %status, "Unexpected stock service status");
                    Err(LedgerError::Internal(format!(
                        "stock service returned {status}"
                    )))
                }
            }
        })
    }
}
