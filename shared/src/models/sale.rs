//! Sale models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::LedgerError;

/// Sale header
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Sale {
    pub id: Uuid,
    pub total_amount: Decimal,
    pub sold_at: DateTime<Utc>,
}

/// One batch's contribution to a sale
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SaleItem {
    pub id: Uuid,
    pub sale_id: Uuid,
    pub line_no: i64,
    pub product_id: Uuid,
    pub batch_id: Uuid,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
}

/// Result of a completed sale
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleSummary {
    pub sale_id: Uuid,
    pub total_amount: Decimal,
    pub line_count: usize,
    pub quantity: Decimal,
    pub sold_at: DateTime<Utc>,
}

/// Sale header with its line items
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleWithItems {
    #[serde(flatten)]
    pub sale: Sale,
    pub items: Vec<SaleItem>,
}

/// Subtotal of a sale line
pub fn line_subtotal(quantity: Decimal, unit_price: Decimal) -> Result<Decimal, LedgerError> {
    quantity
        .checked_mul(unit_price)
        .ok_or_else(|| LedgerError::Overflow("sale line subtotal".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_line_subtotals_sum_to_total() {
        let price = dec!(1800);
        let lines = [dec!(3), dec!(2)];
        let total: Decimal = lines
            .iter()
            .map(|q| line_subtotal(*q, price).unwrap())
            .sum();
        assert_eq!(total, dec!(9000));
    }

    #[test]
    fn test_fractional_subtotal() {
        assert_eq!(line_subtotal(dec!(4.5), dec!(1990)).unwrap(), dec!(8955.0));
    }

    #[test]
    fn test_subtotal_overflow() {
        assert!(matches!(
            line_subtotal(Decimal::MAX, dec!(2)),
            Err(LedgerError::Overflow(_))
        ));
        assert!(line_subtotal(crate::MAX_QUANTITY, crate::MAX_UNIT_AMOUNT).is_ok());
    }
}
