//! Shared fixtures for the ledger integration tests
#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
use freshcontrol_backend::config::DatabaseConfig;
use freshcontrol_backend::services::ledger::IntakeInput;
use freshcontrol_backend::services::{
    BatchLedger, LossService, ProductService, ReportingService, SaleService, StockAlertService,
};
use freshcontrol_backend::Store;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use shared::ProductCategory;
use tempfile::TempDir;
use uuid::Uuid;

pub const PRICE: Decimal = dec!(1800);
pub const MAX_NOTE: usize = 500;

/// A migrated database in a temporary directory
pub struct TestDb {
    pub store: Store,
    _dir: TempDir,
}

impl TestDb {
    pub fn ledger(&self) -> BatchLedger {
        BatchLedger::new(self.store.clone())
    }

    pub fn sales(&self) -> SaleService {
        SaleService::new(self.store.clone())
    }

    pub fn losses(&self) -> LossService {
        LossService::new(self.store.clone(), MAX_NOTE)
    }

    pub fn alerts(&self) -> StockAlertService {
        StockAlertService::new(self.store.clone(), dec!(5))
    }

    pub fn products(&self) -> ProductService {
        ProductService::new(self.store.clone())
    }

    pub fn reports(&self) -> ReportingService {
        ReportingService::new(self.store.clone(), dec!(5))
    }

    /// Total remaining over a product's active batches
    pub async fn stock_of(&self, product_id: Uuid) -> Decimal {
        self.ledger()
            .active_batches(product_id)
            .await
            .unwrap()
            .iter()
            .map(|b| b.remaining)
            .sum()
    }

    /// Row-level dump of the ledger tables, for before/after comparisons
    pub async fn snapshot(&self) -> Vec<String> {
        let queries = [
            "SELECT 'batch|' || hex(id) || '|' || remaining || '|' || coalesce(deleted_at, '-') || '|' || updated_at FROM batches ORDER BY seq",
            "SELECT 'sale|' || hex(id) || '|' || total_amount || '|' || sold_at FROM sales ORDER BY hex(id)",
            "SELECT 'loss|' || hex(id) || '|' || hex(batch_id) || '|' || quantity FROM losses ORDER BY hex(id)",
            "SELECT 'product|' || hex(id) || '|' || sku || '|' || coalesce(deleted_at, '-') FROM products ORDER BY hex(id)",
        ];
        let mut rows = Vec::new();
        for q in queries {
            let mut part: Vec<String> = sqlx::query_scalar(q)
                .fetch_all(self.store.pool())
                .await
                .unwrap();
            rows.append(&mut part);
        }
        // sale_items may be dropped by failure-injection tests
        let items: Result<Vec<String>, _> = sqlx::query_scalar(
            "SELECT 'item|' || hex(id) || '|' || quantity || '|' || subtotal FROM sale_items ORDER BY hex(id)",
        )
        .fetch_all(self.store.pool())
        .await;
        rows.extend(items.unwrap_or_default());
        rows
    }
}

pub async fn setup() -> TestDb {
    let dir = tempfile::tempdir().expect("temp dir");
    let url = format!("sqlite://{}", dir.path().join("ledger.db").display());
    let store = Store::connect(&DatabaseConfig {
        url,
        max_connections: 4,
    })
    .await
    .expect("open database");
    store.migrate().await.expect("migrate");

    TestDb { store, _dir: dir }
}

pub fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
}

/// Intake input with product details filled in for a new SKU
pub fn intake_input(sku: &str, quantity: Decimal, intake_date: NaiveDate) -> IntakeInput {
    IntakeInput {
        sku: sku.to_string(),
        quantity,
        unit_cost: dec!(1000),
        expiry_date: intake_date + Duration::days(14),
        intake_date: Some(intake_date),
        name: Some(format!("Producto {}", sku)),
        sale_price: Some(PRICE),
        min_stock: None,
        category: Some(ProductCategory::Fruits),
        unit_of_measure: None,
    }
}

/// Receive a batch and return `(product_id, batch_id)`
pub async fn receive(db: &TestDb, sku: &str, quantity: Decimal, d: u32) -> (Uuid, Uuid) {
    let receipt = db
        .ledger()
        .intake(intake_input(sku, quantity, day(d)))
        .await
        .expect("intake");
    (receipt.product_id, receipt.batch_id)
}
