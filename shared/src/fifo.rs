//! FIFO allocation rules for the batch ledger
//!
//! Batches form a queue ordered by intake date, ties broken by insertion
//! sequence. Expiry date plays no part in the order: the oldest received stock
//! leaves first. Allocation is greedy and computed up front, so a request that
//! cannot be satisfied is rejected before anything is mutated.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::LedgerError;
use crate::models::Batch;
use crate::validation::validate_quantity;

/// Position and remaining quantity of one batch in the FIFO queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchLevel {
    pub batch_id: Uuid,
    pub intake_date: NaiveDate,
    /// Insertion sequence, used to order batches received on the same day
    pub seq: i64,
    pub remaining: Decimal,
}

impl From<&Batch> for BatchLevel {
    fn from(batch: &Batch) -> Self {
        Self {
            batch_id: batch.id,
            intake_date: batch.intake_date,
            seq: batch.seq,
            remaining: batch.remaining,
        }
    }
}

/// Quantity taken from a single batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    pub batch_id: Uuid,
    pub taken: Decimal,
    pub remaining_after: Decimal,
}

impl Allocation {
    /// Whether this allocation empties the batch
    pub fn exhausts_batch(&self) -> bool {
        self.remaining_after.is_zero()
    }
}

/// Sort batch levels into consumption order
pub fn fifo_sort(levels: &mut [BatchLevel]) {
    levels.sort_by(|a, b| {
        a.intake_date
            .cmp(&b.intake_date)
            .then_with(|| a.seq.cmp(&b.seq))
    });
}

/// Add two quantities or amounts, failing instead of overflowing
pub fn checked_add(a: Decimal, b: Decimal, what: &str) -> Result<Decimal, LedgerError> {
    a.checked_add(b)
        .ok_or_else(|| LedgerError::Overflow(what.to_string()))
}

/// Sum quantities or amounts, failing instead of overflowing
pub fn checked_total<I>(values: I, what: &str) -> Result<Decimal, LedgerError>
where
    I: IntoIterator<Item = Decimal>,
{
    values
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, v| checked_add(acc, v, what))
}

/// Total quantity available across active batches
pub fn available_stock(levels: &[BatchLevel]) -> Result<Decimal, LedgerError> {
    checked_total(
        levels
            .iter()
            .filter(|l| l.remaining > Decimal::ZERO)
            .map(|l| l.remaining),
        "available stock",
    )
}

/// Reject quantities that are not positive or exceed the accepted maximum
pub fn ensure_quantity(quantity: Decimal) -> Result<(), LedgerError> {
    validate_quantity(quantity)
        .map_err(|m| LedgerError::InvalidQuantity(format!("{}, got {}", m, quantity)))
}

/// Plan a FIFO consumption of `quantity` across `levels`.
///
/// The input does not need to be sorted. Batches with no remaining stock are
/// skipped. Fails with [`LedgerError::InsufficientStock`] when the active
/// stock cannot cover the request; in that case nothing was planned.
pub fn plan_fifo(levels: &[BatchLevel], quantity: Decimal) -> Result<Vec<Allocation>, LedgerError> {
    ensure_quantity(quantity)?;

    let available = available_stock(levels)?;
    if available < quantity {
        return Err(LedgerError::InsufficientStock {
            requested: quantity,
            available,
        });
    }

    let mut queue: Vec<BatchLevel> = levels
        .iter()
        .filter(|l| l.remaining > Decimal::ZERO)
        .cloned()
        .collect();
    fifo_sort(&mut queue);

    let mut still_needed = quantity;
    let mut plan = Vec::new();

    for level in queue {
        if still_needed.is_zero() {
            break;
        }
        let taken = level.remaining.min(still_needed);
        still_needed -= taken;
        plan.push(Allocation {
            batch_id: level.batch_id,
            taken,
            remaining_after: level.remaining - taken,
        });
    }

    Ok(plan)
}

/// Plan taking `quantity` out of one specific batch
pub fn plan_batch_take(level: &BatchLevel, quantity: Decimal) -> Result<Allocation, LedgerError> {
    ensure_quantity(quantity)?;

    if quantity > level.remaining {
        return Err(LedgerError::InvalidQuantity(format!(
            "cannot remove {} from batch {} holding {}",
            quantity, level.batch_id, level.remaining
        )));
    }

    Ok(Allocation {
        batch_id: level.batch_id,
        taken: quantity,
        remaining_after: level.remaining - quantity,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::MAX_QUANTITY;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn level(seq: i64, day: u32, remaining: Decimal) -> BatchLevel {
        BatchLevel {
            batch_id: Uuid::from_u128(seq as u128),
            intake_date: NaiveDate::from_ymd_opt(2025, 3, day).unwrap(),
            seq,
            remaining,
        }
    }

    #[test]
    fn test_oldest_batch_consumed_first() {
        let a = level(1, 1, dec!(10));
        let b = level(2, 2, dec!(10));

        let plan = plan_fifo(&[b.clone(), a.clone()], dec!(15)).unwrap();

        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].batch_id, a.batch_id);
        assert_eq!(plan[0].taken, dec!(10));
        assert!(plan[0].exhausts_batch());
        assert_eq!(plan[1].batch_id, b.batch_id);
        assert_eq!(plan[1].taken, dec!(5));
        assert_eq!(plan[1].remaining_after, dec!(5));
    }

    #[test]
    fn test_same_day_uses_insertion_order() {
        let first = level(7, 4, dec!(2));
        let second = level(9, 4, dec!(2));

        let plan = plan_fifo(&[second.clone(), first.clone()], dec!(3)).unwrap();

        assert_eq!(plan[0].batch_id, first.batch_id);
        assert_eq!(plan[1].batch_id, second.batch_id);
        assert_eq!(plan[1].taken, dec!(1));
    }

    #[test]
    fn test_single_batch_partial() {
        let plan = plan_fifo(&[level(1, 1, dec!(15.5))], dec!(4.25)).unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].remaining_after, dec!(11.25));
        assert!(!plan[0].exhausts_batch());
    }

    #[test]
    fn test_stops_once_satisfied() {
        let levels = [level(1, 1, dec!(5)), level(2, 2, dec!(5)), level(3, 3, dec!(5))];
        let plan = plan_fifo(&levels, dec!(5)).unwrap();
        assert_eq!(plan.len(), 1);
        assert!(plan[0].exhausts_batch());
    }

    #[test]
    fn test_empty_batches_are_skipped() {
        let levels = [level(1, 1, dec!(0)), level(2, 2, dec!(3))];
        let plan = plan_fifo(&levels, dec!(1)).unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].batch_id, levels[1].batch_id);
    }

    #[test]
    fn test_insufficient_stock() {
        let levels = [level(1, 1, dec!(3)), level(2, 2, dec!(2))];
        let err = plan_fifo(&levels, dec!(5.5)).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientStock {
                requested: dec!(5.5),
                available: dec!(5),
            }
        );
        assert_eq!(err.shortfall(), Some(dec!(0.5)));
    }

    #[test]
    fn test_no_batches() {
        let err = plan_fifo(&[], dec!(1)).unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientStock { .. }));
    }

    #[test]
    fn test_non_positive_quantity() {
        let levels = [level(1, 1, dec!(3))];
        assert!(matches!(
            plan_fifo(&levels, Decimal::ZERO),
            Err(LedgerError::InvalidQuantity(_))
        ));
        assert!(matches!(
            plan_fifo(&levels, dec!(-1)),
            Err(LedgerError::InvalidQuantity(_))
        ));
    }

    #[test]
    fn test_batch_take() {
        let batch = level(1, 1, dec!(4));

        let take = plan_batch_take(&batch, dec!(4)).unwrap();
        assert!(take.exhausts_batch());

        let take = plan_batch_take(&batch, dec!(1.5)).unwrap();
        assert_eq!(take.remaining_after, dec!(2.5));

        assert!(plan_batch_take(&batch, dec!(4.01)).is_err());
        assert!(plan_batch_take(&batch, Decimal::ZERO).is_err());
    }

    #[test]
    fn test_quantity_above_maximum() {
        let levels = [level(1, 1, MAX_QUANTITY), level(2, 2, MAX_QUANTITY)];
        assert!(plan_fifo(&levels, MAX_QUANTITY + dec!(1)).is_err());
        assert!(matches!(
            plan_fifo(&levels, Decimal::MAX),
            Err(LedgerError::InvalidQuantity(_))
        ));

        let plan = plan_fifo(&levels, MAX_QUANTITY).unwrap();
        assert_eq!(plan.len(), 1);
        assert!(plan[0].exhausts_batch());
    }

    #[test]
    fn test_overflowing_stock_is_an_error() {
        let levels = [level(1, 1, Decimal::MAX), level(2, 2, Decimal::MAX)];
        assert!(matches!(
            available_stock(&levels),
            Err(LedgerError::Overflow(_))
        ));
        assert!(matches!(
            plan_fifo(&levels, dec!(1)),
            Err(LedgerError::Overflow(_))
        ));
        assert!(checked_total([Decimal::MAX, Decimal::ONE], "test").is_err());
        assert_eq!(checked_total([dec!(1.5), dec!(2)], "test"), Ok(dec!(3.5)));
    }

    fn quantity_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=5000i64).prop_map(|n| Decimal::new(n, 1)) // 0.1 to 500.0
    }

    fn levels_strategy() -> impl Strategy<Value = Vec<BatchLevel>> {
        prop::collection::vec((quantity_strategy(), 1u32..=28u32), 1..12).prop_map(|raw| {
            raw.into_iter()
                .enumerate()
                .map(|(i, (qty, day))| level(i as i64, day, qty))
                .collect()
        })
    }

    /// Any 96-bit mantissa, including values far beyond what intake accepts
    fn huge_remaining_strategy() -> impl Strategy<Value = Decimal> {
        (any::<u32>(), any::<u32>(), any::<u32>(), 0u32..=4u32)
            .prop_map(|(lo, mid, hi, scale)| Decimal::from_parts(lo, mid, hi, false, scale))
    }

    fn large_quantity_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=1_000_000_000_000i64).prop_map(|n| Decimal::new(n, 3)) // up to MAX_QUANTITY
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Planning over huge stored levels fails cleanly instead of panicking
        #[test]
        fn prop_huge_levels_never_panic(
            remainings in prop::collection::vec(huge_remaining_strategy(), 1..6),
            request in large_quantity_strategy()
        ) {
            let levels: Vec<BatchLevel> = remainings
                .into_iter()
                .enumerate()
                .map(|(i, r)| level(i as i64, 1, r))
                .collect();
            match plan_fifo(&levels, request) {
                Ok(plan) => {
                    let taken = checked_total(plan.iter().map(|a| a.taken), "taken").unwrap();
                    prop_assert_eq!(taken, request);
                }
                Err(LedgerError::InsufficientStock { available, .. }) => {
                    prop_assert!(available < request);
                }
                Err(LedgerError::Overflow(_)) => {
                    prop_assert!(available_stock(&levels).is_err());
                }
                Err(other) => prop_assert!(false, "unexpected error {:?}", other),
            }
        }

        /// Requests near the maximum still conserve quantity across batches
        #[test]
        fn prop_large_requests_conserve_quantity(
            remainings in prop::collection::vec(large_quantity_strategy(), 1..8),
            request in large_quantity_strategy()
        ) {
            let levels: Vec<BatchLevel> = remainings
                .into_iter()
                .enumerate()
                .map(|(i, r)| level(i as i64, 1 + i as u32, r))
                .collect();
            let available = available_stock(&levels).unwrap();
            match plan_fifo(&levels, request) {
                Ok(plan) => {
                    let taken: Decimal = plan.iter().map(|a| a.taken).sum();
                    prop_assert_eq!(taken, request);
                }
                Err(LedgerError::InsufficientStock { available: reported, .. }) => {
                    prop_assert_eq!(reported, available);
                    prop_assert!(available < request);
                }
                Err(other) => prop_assert!(false, "unexpected error {:?}", other),
            }
        }

        /// Taken quantities always add up to the request and never exceed a batch
        #[test]
        fn prop_allocation_conserves_quantity(
            levels in levels_strategy(),
            request in quantity_strategy()
        ) {
            let available = available_stock(&levels).unwrap();
            match plan_fifo(&levels, request) {
                Ok(plan) => {
                    let taken: Decimal = plan.iter().map(|a| a.taken).sum();
                    prop_assert_eq!(taken, request);
                    for a in &plan {
                        prop_assert!(a.taken > Decimal::ZERO);
                        prop_assert!(a.remaining_after >= Decimal::ZERO);
                    }
                    let left: Decimal = available - taken;
                    prop_assert!(left >= Decimal::ZERO);
                }
                Err(LedgerError::InsufficientStock { available: reported, .. }) => {
                    prop_assert!(available < request);
                    prop_assert_eq!(reported, available);
                }
                Err(other) => prop_assert!(false, "unexpected error {:?}", other),
            }
        }

        /// Only the last batch touched may be left partially consumed
        #[test]
        fn prop_earlier_batches_exhausted(
            levels in levels_strategy(),
            request in quantity_strategy()
        ) {
            if let Ok(plan) = plan_fifo(&levels, request) {
                let (last, earlier) = plan.split_last().unwrap();
                for a in earlier {
                    prop_assert!(a.exhausts_batch());
                }
                prop_assert!(last.taken > Decimal::ZERO);
            }
        }

        /// Plan follows intake order regardless of input order
        #[test]
        fn prop_plan_follows_intake_order(
            levels in levels_strategy(),
            request in quantity_strategy()
        ) {
            let mut reversed = levels.clone();
            reversed.reverse();
            let forward = plan_fifo(&levels, request);
            let backward = plan_fifo(&reversed, request);
            prop_assert_eq!(forward.clone(), backward);

            if let Ok(plan) = forward {
                let mut sorted = levels.clone();
                fifo_sort(&mut sorted);
                let order: Vec<Uuid> = sorted.iter().map(|l| l.batch_id).collect();
                let positions: Vec<usize> = plan
                    .iter()
                    .map(|a| order.iter().position(|id| *id == a.batch_id).unwrap())
                    .collect();
                prop_assert!(positions.windows(2).all(|w| w[0] < w[1]));
                prop_assert_eq!(positions[0], 0);
            }
        }
    }
}
