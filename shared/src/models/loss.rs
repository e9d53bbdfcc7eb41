//! Loss (write-off) models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Reason a quantity was written off
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LossReason {
    Expired,
    Damaged,
    Other,
}

impl LossReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            LossReason::Expired => "expired",
            LossReason::Damaged => "damaged",
            LossReason::Other => "other",
        }
    }

    /// Label shown on the shop's reports
    pub fn label_es(&self) -> &'static str {
        match self {
            LossReason::Expired => "Vencido",
            LossReason::Damaged => "Dañado",
            LossReason::Other => "Otro",
        }
    }
}

impl std::fmt::Display for LossReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LossReason::Expired => write!(f, "Expired"),
            LossReason::Damaged => write!(f, "Damaged"),
            LossReason::Other => write!(f, "Other"),
        }
    }
}

impl std::str::FromStr for LossReason {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "expired" => Ok(LossReason::Expired),
            "damaged" => Ok(LossReason::Damaged),
            "other" => Ok(LossReason::Other),
            other => Err(format!("unknown loss reason '{}'", other)),
        }
    }
}

/// A recorded write-off from one batch
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Loss {
    pub id: Uuid,
    pub batch_id: Uuid,
    pub product_id: Uuid,
    pub reason: LossReason,
    pub quantity: Decimal,
    pub note: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

/// Result of a FIFO write-off across batches
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriteOffSummary {
    pub loss_ids: Vec<Uuid>,
    pub total_removed: Decimal,
}
