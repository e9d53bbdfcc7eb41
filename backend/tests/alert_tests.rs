//! Stock alert tests
//!
//! Critical means positive stock strictly below the minimum.

mod common;

use common::{day, intake_input, receive, setup};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

#[tokio::test]
async fn test_threshold_boundaries() {
    let db = setup().await;
    let (at_min, _) = receive(&db, "AT-MIN", dec!(5), 1).await;
    let (below, _) = receive(&db, "BELOW", dec!(4.99), 1).await;
    let (emptied, _) = receive(&db, "EMPTY", dec!(2), 1).await;
    let (healthy, _) = receive(&db, "PLENTY", dec!(50), 1).await;
    db.sales().sell("EMPTY", dec!(2)).await.unwrap();

    let critical = db.alerts().critical_products().await.unwrap();
    let ids: Vec<_> = critical.iter().map(|c| c.product_id).collect();
    assert_eq!(ids, vec![below]);
    assert_eq!(critical[0].total_stock, dec!(4.99));
    assert_eq!(critical[0].min_stock, dec!(5));
    assert!(!ids.contains(&at_min));
    assert!(!ids.contains(&healthy));

    let out = db.alerts().out_of_stock_products().await.unwrap();
    let out_ids: Vec<_> = out.iter().map(|c| c.product_id).collect();
    assert_eq!(out_ids, vec![emptied]);
    assert_eq!(out[0].total_stock, Decimal::ZERO);
}

#[tokio::test]
async fn test_stock_summed_across_batches() {
    let db = setup().await;
    receive(&db, "SUMA", dec!(2), 1).await;
    receive(&db, "SUMA", dec!(2.5), 2).await;

    let critical = db.alerts().critical_products().await.unwrap();
    assert_eq!(critical.len(), 1);
    assert_eq!(critical[0].total_stock, dec!(4.5));

    // crossing the threshold clears the alert
    receive(&db, "SUMA", dec!(0.5), 3).await;
    assert!(db.alerts().critical_products().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_product_threshold_overrides_default() {
    let db = setup().await;
    let mut input = intake_input("PROPIO", dec!(8), day(1));
    input.min_stock = Some(dec!(10));
    db.ledger().intake(input).await.unwrap();

    let mut zero = intake_input("SIN-MIN", dec!(0.5), day(1));
    zero.min_stock = Some(Decimal::ZERO);
    db.ledger().intake(zero).await.unwrap();

    let critical = db.alerts().critical_products().await.unwrap();
    assert_eq!(critical.len(), 1);
    assert_eq!(critical[0].sku, "PROPIO");
    assert_eq!(critical[0].min_stock, dec!(10));
}

#[tokio::test]
async fn test_deleted_products_not_evaluated() {
    let db = setup().await;
    let (product_id, _) = receive(&db, "BORRADO", dec!(1), 1).await;
    assert_eq!(db.alerts().critical_products().await.unwrap().len(), 1);

    db.products().delete(product_id).await.unwrap();
    assert!(db.alerts().critical_products().await.unwrap().is_empty());
    assert!(db.alerts().out_of_stock_products().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_large_stock_does_not_disturb_alerts() {
    let db = setup().await;
    let (safe, _) = receive(&db, "SAFE-1", dec!(2), 1).await;
    let (big, _) = receive(&db, "GRANEL", shared::MAX_QUANTITY, 1).await;
    receive(&db, "GRANEL", shared::MAX_QUANTITY, 2).await;

    let critical = db.alerts().critical_products().await.unwrap();
    assert_eq!(critical.len(), 1);
    assert_eq!(critical[0].product_id, safe);

    db.sales().sell("GRANEL", shared::MAX_QUANTITY).await.unwrap();
    assert_eq!(db.stock_of(big).await, shared::MAX_QUANTITY);
    assert!(db.alerts().out_of_stock_products().await.unwrap().is_empty());
}
