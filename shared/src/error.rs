//! Rule violations raised by the pure ledger logic

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors produced while planning a consumption against batch levels
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    #[error("Insufficient stock: requested {requested}, available {available}")]
    InsufficientStock {
        requested: Decimal,
        available: Decimal,
    },

    #[error("Arithmetic overflow while computing {0}")]
    Overflow(String),
}

impl LedgerError {
    /// Amount missing to satisfy the request, for insufficient stock errors
    pub fn shortfall(&self) -> Option<Decimal> {
        match self {
            LedgerError::InsufficientStock {
                requested,
                available,
            } => Some(*requested - *available),
            LedgerError::InvalidQuantity(_) | LedgerError::Overflow(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_shortfall() {
        let err = LedgerError::InsufficientStock {
            requested: dec!(12.5),
            available: dec!(10),
        };
        assert_eq!(err.shortfall(), Some(dec!(2.5)));
        assert_eq!(LedgerError::InvalidQuantity("x".into()).shortfall(), None);
    }
}
