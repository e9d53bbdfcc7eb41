//! Loss (write-off) tests

mod common;

use chrono::Utc;
use common::{receive, setup};
use freshcontrol_backend::AppError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use shared::LossReason;

#[tokio::test]
async fn test_partial_batch_write_off() {
    let db = setup().await;
    let (product_id, batch) = receive(&db, "TOMATE", dec!(12), 1).await;

    let loss = db
        .losses()
        .write_off_batch(batch, dec!(2.5), LossReason::Damaged, Some("golpeados"))
        .await
        .unwrap();
    assert_eq!(loss.batch_id, batch);
    assert_eq!(loss.product_id, product_id);
    assert_eq!(loss.quantity, dec!(2.5));
    assert_eq!(loss.reason, LossReason::Damaged);
    assert_eq!(loss.note.as_deref(), Some("golpeados"));

    assert_eq!(db.stock_of(product_id).await, dec!(9.5));
}

#[tokio::test]
async fn test_full_write_off_removes_batch() {
    let db = setup().await;
    let (product_id, batch) = receive(&db, "LECHUGA", dec!(6), 1).await;

    db.losses()
        .write_off_batch(batch, dec!(6), LossReason::Expired, None)
        .await
        .unwrap();
    assert!(db.ledger().active_batches(product_id).await.unwrap().is_empty());

    // the removed batch is no longer addressable
    let err = db
        .losses()
        .write_off_batch(batch, dec!(1), LossReason::Expired, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BatchNotFound(id) if id == batch));

    let losses = db.losses().losses_on(Utc::now().date_naive()).await.unwrap();
    assert_eq!(losses.len(), 1);
}

#[tokio::test]
async fn test_write_off_more_than_batch_rejected() {
    let db = setup().await;
    let (_, batch) = receive(&db, "LECHUGA", dec!(6), 1).await;
    receive(&db, "LECHUGA", dec!(6), 2).await;
    let before = db.snapshot().await;

    let err = db
        .losses()
        .write_off_batch(batch, dec!(6.01), LossReason::Damaged, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidQuantity(_)));

    let err = db
        .losses()
        .write_off_batch(batch, Decimal::ZERO, LossReason::Damaged, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidQuantity(_)));

    assert_eq!(db.snapshot().await, before);
}

#[tokio::test]
async fn test_fifo_write_off_records_loss_per_batch() {
    let db = setup().await;
    let (product_id, a) = receive(&db, "FRUT-01", dec!(3), 1).await;
    let (_, b) = receive(&db, "FRUT-01", dec!(4), 2).await;
    let (_, c) = receive(&db, "FRUT-01", dec!(5), 3).await;

    let summary = db
        .losses()
        .write_off_fifo("frut-01", dec!(8), LossReason::Expired, Some("fin de temporada"))
        .await
        .unwrap();
    assert_eq!(summary.loss_ids.len(), 3);
    assert_eq!(summary.total_removed, dec!(8));

    let losses = db.losses().losses_on(Utc::now().date_naive()).await.unwrap();
    let mut by_batch: Vec<_> = losses.iter().map(|l| (l.batch_id, l.quantity)).collect();
    by_batch.sort_by_key(|(id, _)| [a, b, c].iter().position(|x| x == id));
    assert_eq!(by_batch, vec![(a, dec!(3)), (b, dec!(4)), (c, dec!(1))]);
    assert!(losses.iter().all(|l| l.reason == LossReason::Expired));

    let batches = db.ledger().active_batches(product_id).await.unwrap();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].id, c);
    assert_eq!(batches[0].remaining, dec!(4));
}

#[tokio::test]
async fn test_fifo_write_off_insufficient_stock() {
    let db = setup().await;
    receive(&db, "FRUT-01", dec!(3), 1).await;
    let before = db.snapshot().await;

    let err = db
        .losses()
        .write_off_fifo("FRUT-01", dec!(3.5), LossReason::Other, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InsufficientStock { .. }));
    assert_eq!(db.snapshot().await, before);

    let err = db
        .losses()
        .write_off_fifo("NADA", dec!(1), LossReason::Other, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ProductNotFound(_)));
}

#[tokio::test]
async fn test_note_is_trimmed_and_capped() {
    let db = setup().await;
    let (_, batch) = receive(&db, "NOTA", dec!(10), 1).await;

    let blank = db
        .losses()
        .write_off_batch(batch, dec!(1), LossReason::Other, Some("   "))
        .await
        .unwrap();
    assert_eq!(blank.note, None);

    let long = "x".repeat(600);
    let capped = db
        .losses()
        .write_off_batch(batch, dec!(1), LossReason::Other, Some(&format!("  {}  ", long)))
        .await
        .unwrap();
    assert_eq!(capped.note.as_ref().map(|n| n.chars().count()), Some(500));

    let stored = db.losses().losses_on(Utc::now().date_naive()).await.unwrap();
    assert!(stored.iter().any(|l| l.note == capped.note));
}
