//! HTTP handlers.

pub mod cart;
pub mod health;
pub mod stock;
