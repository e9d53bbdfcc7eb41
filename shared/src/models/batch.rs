//! Batch (lot) models

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A discrete lot of a product's stock
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Batch {
    pub id: Uuid,
    pub product_id: Uuid,
    /// Insertion sequence assigned by the store
    pub seq: i64,
    pub intake_date: NaiveDate,
    pub expiry_date: NaiveDate,
    /// Purchase cost per unit
    pub unit_cost: Decimal,
    pub initial_quantity: Decimal,
    pub remaining: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Batch {
    pub fn is_active(&self) -> bool {
        self.remaining > Decimal::ZERO
    }

    pub fn is_expired(&self, on: NaiveDate) -> bool {
        self.expiry_date < on
    }

    /// Days until expiry; negative once the batch has expired
    pub fn days_to_expiry(&self, on: NaiveDate) -> i64 {
        (self.expiry_date - on).num_days()
    }

    /// Purchase value of the remaining stock
    pub fn stock_value(&self) -> Decimal {
        self.remaining * self.unit_cost
    }
}

/// Receipt returned by an intake
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntakeReceipt {
    pub batch_id: Uuid,
    pub product_id: Uuid,
    pub product_created: bool,
}

/// Quantity taken from a batch by a consumption
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Consumption {
    pub batch_id: Uuid,
    pub product_id: Uuid,
    pub taken: Decimal,
    pub remaining_after: Decimal,
}
