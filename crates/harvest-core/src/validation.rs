//! # Validation Module
//!
//! Checks applied at the edges of the core.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Loader (harvest-report)                                      │
//! │  ├── Deserialization of ERP rows (types, dates)                        │
//! │  └── validate_sale_record: rows failing here are skipped + logged      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Engine entry points (this crate)                             │
//! │  └── validate_entity_id: caller errors → CoreError::InvalidArgument    │
//! │                                                                         │
//! │  The engines themselves assume records are already valid.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::SaleRecord;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Base tolerance, in cents, between `total_amount` and `quantity × unit_price`.
pub const TOTAL_TOLERANCE_CENTS: i64 = 1;

/// Allowed gap between `total_amount` and `quantity × unit_price`, in cents.
///
/// `unit_price` is rounded to whole cents at load time, which can move it
/// by up to half a cent. That error is multiplied by the quantity, so the
/// tolerance grows by half a cent per unit on top of the base cent.
///
/// ```rust
/// use harvest_core::validation::total_tolerance_cents;
///
/// assert_eq!(total_tolerance_cents(1.0), 2);
/// assert_eq!(total_tolerance_cents(1000.0), 501);
/// ```
pub fn total_tolerance_cents(quantity: f64) -> i64 {
    TOTAL_TOLERANCE_CENTS + (quantity.abs() * 0.5).ceil() as i64
}

// =============================================================================
// Identifier Validators
// =============================================================================

/// Validates the entity identifier handed to a scoring operation.
///
/// Returns the trimmed identifier. An empty or whitespace-only id is the
/// Rust equivalent of a null reference and is rejected.
///
/// ```rust
/// use harvest_core::validation::validate_entity_id;
///
/// assert_eq!(validate_entity_id("customer_id", " C-042 ").unwrap(), "C-042");
/// assert!(validate_entity_id("customer_id", "   ").is_err());
/// ```
pub fn validate_entity_id<'a>(argument: &str, id: &'a str) -> CoreResult<&'a str> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        return Err(CoreError::invalid_argument(
            argument,
            id,
            "identifier must not be empty",
        ));
    }
    Ok(trimmed)
}

// =============================================================================
// Record Validators
// =============================================================================

/// Validates one sale record.
///
/// ## Rules
/// - `id`, `customer_id`, `product_id` and `category` are required
/// - `quantity` must be positive and finite
/// - `unit_price` and `cost` must not be negative
/// - `total_amount` must equal `quantity × unit_price` within
///   [`total_tolerance_cents`]
/// - `margin` must equal `total_amount − cost` exactly
pub fn validate_sale_record(record: &SaleRecord) -> ValidationResult<()> {
    for (field, value) in [
        ("id", &record.id),
        ("customer_id", &record.customer_id),
        ("product_id", &record.product_id),
        ("category", &record.category),
    ] {
        if value.trim().is_empty() {
            return Err(ValidationError::Required {
                field: field.to_string(),
            });
        }
    }

    if !record.quantity.is_finite() || record.quantity <= 0.0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if record.unit_price_cents < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "unit_price".to_string(),
        });
    }

    if record.cost_cents < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "cost".to_string(),
        });
    }

    let expected_total = record.unit_price().multiply_quantity(record.quantity);
    let gap = (expected_total - record.total_amount()).abs().cents();
    if gap > total_tolerance_cents(record.quantity) {
        return Err(ValidationError::Inconsistent {
            field: "total_amount".to_string(),
            expected: expected_total.to_string(),
            actual: record.total_amount().to_string(),
        });
    }

    let expected_margin = record.total_amount() - record.cost();
    if expected_margin != record.margin() {
        return Err(ValidationError::Inconsistent {
            field: "margin".to_string(),
            expected: expected_margin.to_string(),
            actual: record.margin().to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
