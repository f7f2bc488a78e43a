//! Validation utilities for the inventory platform
//!
//! Each check returns a static message so callers can attach the field name
//! when reporting it.

use rust_decimal::Decimal;

use crate::models::RequestedLine;

/// Upper bound for free-text names (items, categories, suppliers, customers)
pub const MAX_NAME_LEN: usize = 200;

// ============================================================================
// Account Validations
// ============================================================================

/// Validate email format
pub fn validate_email(email: &str) -> Result<(), &'static str> {
    if validator::validate_email(email) {
        Ok(())
    } else {
        Err("Invalid email format")
    }
}

/// Validate password strength
pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.chars().count() < 8 {
        return Err("Password must be at least 8 characters");
    }
    Ok(())
}

/// Validate username (3-50 characters, letters, digits, `_`, `-`, `.`)
pub fn validate_username(username: &str) -> Result<(), &'static str> {
    let len = username.chars().count();
    if len < 3 {
        return Err("Username must be at least 3 characters");
    }
    if len > 50 {
        return Err("Username must be at most 50 characters");
    }
    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
    {
        return Err("Username may only contain letters, digits, '_', '-' and '.'");
    }
    Ok(())
}

/// Validate an ISO 4217 style currency code (three uppercase letters)
pub fn validate_currency(code: &str) -> Result<(), &'static str> {
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_uppercase()) {
        return Err("Currency must be a three-letter uppercase code");
    }
    Ok(())
}

// ============================================================================
// Catalog Validations
// ============================================================================

/// Validate a required display name
pub fn validate_name(name: &str) -> Result<(), &'static str> {
    if name.trim().is_empty() {
        return Err("Name is required");
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err("Name is too long");
    }
    Ok(())
}

/// Validate a unit price: non-negative with at most two decimal places
pub fn validate_price(price: Decimal) -> Result<(), &'static str> {
    if price < Decimal::ZERO {
        return Err("Price cannot be negative");
    }
    if price.normalize().scale() > 2 {
        return Err("Price cannot have more than two decimal places");
    }
    Ok(())
}

/// Validate an on-hand stock quantity
pub fn validate_stock_quantity(quantity: i32) -> Result<(), &'static str> {
    if quantity < 0 {
        return Err("Quantity cannot be negative");
    }
    Ok(())
}

// ============================================================================
// Order Validations
// ============================================================================

/// Validate the requested lines of a new order
pub fn validate_order_lines(lines: &[RequestedLine]) -> Result<(), &'static str> {
    if lines.is_empty() {
        return Err("Order must contain at least one item");
    }
    if lines.iter().any(|l| l.quantity < 1) {
        return Err("Order quantities must be at least 1");
    }
    Ok(())
}
