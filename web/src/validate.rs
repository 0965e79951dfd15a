//! Field validation applied before any ledger call.
//!
//! Stock requests only require a non-zero user id; cart requests require a
//! positive one.

use crate::error::AppError;
use stockcart_core::{LedgerError, Sku, UserId};

/// Reject a zero user id.
///
/// # Errors
///
/// [`LedgerError::InvalidUserId`] as a 400.
pub fn non_zero_user(user_id: UserId) -> Result<UserId, AppError> {
    if user_id.0 == 0 {
        return Err(LedgerError::InvalidUserId.into());
    }
    Ok(user_id)
}

/// Reject a zero or negative user id.
///
/// # Errors
///
/// [`LedgerError::InvalidUserId`] as a 400.
pub fn positive_user(user_id: UserId) -> Result<UserId, AppError> {
    if user_id.0 <= 0 {
        return Err(LedgerError::InvalidUserId.into());
    }
    Ok(user_id)
}

/// Reject SKU zero.
///
/// # Errors
///
/// [`LedgerError::InvalidSku`] as a 400.
pub fn sku(sku: Sku) -> Result<Sku, AppError> {
    if sku.0 == 0 {
        return Err(LedgerError::InvalidSku.into());
    }
    Ok(sku)
}

/// Reject a zero count.
///
/// # Errors
///
/// [`LedgerError::InvalidCount`] as a 400.
pub fn count(count: u32) -> Result<u32, AppError> {
    if count == 0 {
        return Err(LedgerError::InvalidCount.into());
    }
    Ok(count)
}

/// Reject an empty or blank location.
///
/// # Errors
///
/// 400 Bad Request.
pub fn location(location: &str) -> Result<&str, AppError> {
    if location.trim().is_empty() {
        return Err(AppError::bad_request("location must not be empty"));
    }
    Ok(location)
}

/// Reject a zero page size or page number.
///
/// # Errors
///
/// 400 Bad Request.
pub fn page(page_size: u32, current_page: u32) -> Result<(), AppError> {
    if page_size == 0 {
        return Err(AppError::bad_request("page_size must be positive"));
    }
    if current_page == 0 {
        return Err(AppError::bad_request("current_page must be positive"));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn stock_user_ids_may_be_negative() {
        assert!(non_zero_user(UserId(-3)).is_ok());
        assert!(non_zero_user(UserId(0)).is_err());
    }

    #[test]
    fn cart_user_ids_must_be_positive() {
        assert!(positive_user(UserId(1)).is_ok());
        assert_eq!(
            positive_user(UserId(-1)).unwrap_err().status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn zero_fields_are_rejected() {
        assert!(sku(Sku(0)).is_err());
        assert!(count(0).is_err());
        assert!(location("  ").is_err());
        assert!(page(0, 1).is_err());
        assert!(page(10, 0).is_err());
        assert!(page(10, 1).is_ok());
    }
}
