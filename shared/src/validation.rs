//! Validation utilities for FreshControl inputs

use rust_decimal::Decimal;

/// Default cap applied to loss notes
pub const DEFAULT_MAX_NOTE_LENGTH: usize = 500;

/// Maximum SKU length
pub const MAX_SKU_LENGTH: usize = 32;

/// Largest quantity accepted by a single intake, sale, write-off or threshold (10^9)
pub const MAX_QUANTITY: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);

/// Largest unit price or unit cost accepted (10^12)
pub const MAX_UNIT_AMOUNT: Decimal = Decimal::from_parts(3_567_587_328, 232, 0, false, 0);

// ============================================================================
// Catalogue Validations
// ============================================================================

/// Normalize a SKU as typed at the counter (trimmed, uppercase)
pub fn normalize_sku(sku: &str) -> String {
    sku.trim().to_uppercase()
}

/// Validate SKU format (1-32 chars, uppercase alphanumeric, '-' or '_')
pub fn validate_sku(sku: &str) -> Result<(), &'static str> {
    if sku.is_empty() {
        return Err("SKU must not be empty");
    }
    if sku.len() > MAX_SKU_LENGTH {
        return Err("SKU must be at most 32 characters");
    }
    if !sku
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-' || c == '_')
    {
        return Err("SKU may only contain uppercase letters, digits, '-' and '_'");
    }
    Ok(())
}

pub fn validate_product_name(name: &str) -> Result<(), &'static str> {
    if name.trim().is_empty() {
        return Err("Product name must not be empty");
    }
    if name.chars().count() > 120 {
        return Err("Product name must be at most 120 characters");
    }
    Ok(())
}

/// Sale prices must be strictly positive
pub fn validate_sale_price(price: Decimal) -> Result<(), &'static str> {
    if price <= Decimal::ZERO {
        return Err("Sale price must be greater than zero");
    }
    if price > MAX_UNIT_AMOUNT {
        return Err("Sale price must not exceed 1000000000000");
    }
    Ok(())
}

/// Purchase cost may be zero (donated or sample stock) but never negative
pub fn validate_unit_cost(cost: Decimal) -> Result<(), &'static str> {
    if cost < Decimal::ZERO {
        return Err("Unit cost cannot be negative");
    }
    if cost > MAX_UNIT_AMOUNT {
        return Err("Unit cost must not exceed 1000000000000");
    }
    Ok(())
}

pub fn validate_min_stock(min_stock: Decimal) -> Result<(), &'static str> {
    if min_stock < Decimal::ZERO {
        return Err("Minimum stock cannot be negative");
    }
    if min_stock > MAX_QUANTITY {
        return Err("Minimum stock must not exceed 1000000000");
    }
    Ok(())
}

// ============================================================================
// Ledger Validations
// ============================================================================

/// Quantities must be positive and at most [`MAX_QUANTITY`]
pub fn validate_quantity(quantity: Decimal) -> Result<(), &'static str> {
    if quantity <= Decimal::ZERO {
        return Err("Quantity must be greater than zero");
    }
    if quantity > MAX_QUANTITY {
        return Err("Quantity must not exceed 1000000000");
    }
    Ok(())
}

/// Trim a free-text note, drop it when blank and cap it to `max_chars`
pub fn normalize_note(note: Option<&str>, max_chars: usize) -> Option<String> {
    let trimmed = note?.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.chars().take(max_chars).collect())
}
