//! SKU catalog seeding.
//!
//! The stock ledger only accepts claims for catalogued SKUs. At startup the
//! stock service upserts the catalog from `SKU_CATALOG_PATH`, or from the
//! bundled default when that is unset. Re-seeding is idempotent.

use anyhow::{Context, bail};
use serde::Deserialize;
use std::path::Path;
use stockcart_core::Sku;
use stockcart_core::store::StockStore;

/// Catalog bundled with the binary.
pub const DEFAULT_CATALOG: &str = include_str!("../catalog/sku_catalog.json");

/// One catalog row.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CatalogEntry {
    /// SKU id, positive
    pub sku: u32,
    /// Display name
    pub name: String,
    /// Product type
    #[serde(rename = "type")]
    pub kind: String,
}

/// Parse a JSON array of catalog entries.
///
/// # Errors
///
/// Fails on malformed JSON or a zero SKU.
pub fn parse(json: &str) -> anyhow::Result<Vec<CatalogEntry>> {
    let entries: Vec<CatalogEntry> = serde_json::from_str(json).context("Invalid SKU catalog")?;
    if let Some(entry) = entries.iter().find(|e| e.sku == 0) {
        bail!("Invalid SKU catalog: sku must be positive (name {:?})", entry.name);
    }
    Ok(entries)
}

/// Read the catalog from `path`, or the bundled default.
///
/// # Errors
///
/// Fails if the file cannot be read or parsed.
pub async fn load(path: Option<&Path>) -> anyhow::Result<Vec<CatalogEntry>> {
    match path {
        Some(path) => {
            let json = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read SKU catalog {}", path.display()))?;
            parse(&json)
        }
        None => parse(DEFAULT_CATALOG),
    }
}

/// Upsert every entry into the store, returning how many were written.
///
/// # Errors
///
/// Fails on the first store error.
pub async fn seed(store: &dyn StockStore, entries: &[CatalogEntry]) -> anyhow::Result<usize> {
    for entry in entries {
        store
            .upsert_catalog_entry(Sku(entry.sku), &entry.name, &entry.kind)
            .await
            .with_context(|| format!("Failed to seed SKU {}", entry.sku))?;
    }
    tracing::info!(entries = entries.len(), "SKU catalog seeded");
    Ok(entries.len())
}
