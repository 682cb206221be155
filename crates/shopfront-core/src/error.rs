//! # Error Types
//!
//! Domain-specific error types for shopfront-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  shopfront-core errors (this file)                                     │
//! │  ├── CoreError        - General domain errors                          │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  shopfront-db errors (separate crate)                                  │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  shopfront-server errors                                               │
//! │  ├── PaymentError     - Payment provider failures                      │
//! │  └── ApiError         - What the client sees (serialized)              │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ApiError → HTTP response          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Pricing itself never fails. Malformed coupons are caught by
//! [`crate::coupon::validate_coupon`] when they are created or loaded, and
//! coupons that merely stopped being redeemable surface as
//! [`crate::coupon::CouponRejection`].

use thiserror::Error;

use crate::coupon::CouponRejection;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations or domain logic failures.
/// They should be caught and translated to user-friendly messages.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product cannot be found.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// A cart operation referenced a product that isn't in the cart.
    ///
    /// ## When This Occurs
    /// - Updating the quantity of a line that was already removed
    /// - Two browser tabs editing the same session cart
    #[error("Product {0} not in cart")]
    NotInCart(String),

    /// Cart has exceeded maximum allowed lines.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// Item quantity exceeds maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// Checkout was attempted with nothing in the cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// A coupon exists but cannot be redeemed right now.
    ///
    /// ## User Workflow
    /// ```text
    /// Enter code "SPRING10"
    ///      │
    ///      ▼
    /// Coupon found, expires_at < now
    ///      │
    ///      ▼
    /// CouponNotRedeemable { code: "SPRING10", reason: Expired }
    ///      │
    ///      ▼
    /// UI shows: "Coupon SPRING10 cannot be used: coupon has expired"
    /// ```
    #[error("Coupon {code} cannot be used: {reason}")]
    CouponNotRedeemable {
        code: String,
        reason: CouponRejection,
    },

    /// The cart doesn't reach the coupon's minimum order amount.
    #[error("Coupon {code} requires a minimum order of {minimum}")]
    CouponMinimumNotMet { code: String, minimum: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., bad email, non-finite number).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Duplicate value (e.g., duplicate coupon code).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::NotInCart("p7".to_string());
        assert_eq!(err.to_string(), "Product p7 not in cart");

        let err = CoreError::CouponNotRedeemable {
            code: "SPRING10".to_string(),
            reason: CouponRejection::Expired,
        };
        assert_eq!(
            err.to_string(),
            "Coupon SPRING10 cannot be used: coupon has expired"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "code".to_string(),
        };
        assert_eq!(err.to_string(), "code is required");

        let err = ValidationError::NotAllowed {
            field: "discountType".to_string(),
            allowed: vec!["percentage".to_string(), "fixed".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "discountType must be one of: [\"percentage\", \"fixed\"]"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "email".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
