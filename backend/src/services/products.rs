//! Product catalogue service

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use sqlx::{FromRow, SqliteConnection};
use uuid::Uuid;

use crate::db::{decimal_text, parse_decimal, parse_optional_decimal, Store};
use crate::error::{AppError, AppResult};
use shared::{
    checked_add, normalize_sku, validate_min_stock, validate_product_name, validate_sale_price,
    Product, ProductCategory, ProductStock,
};

pub(crate) const PRODUCT_COLUMNS: &str =
    "id, sku, name, unit_of_measure, sale_price, min_stock, category, created_at, updated_at";

/// Product row as stored
#[derive(Debug, FromRow)]
pub(crate) struct ProductRow {
    id: Uuid,
    sku: String,
    name: String,
    unit_of_measure: String,
    sale_price: String,
    min_stock: Option<String>,
    category: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = AppError;

    fn try_from(row: ProductRow) -> AppResult<Self> {
        let category = row
            .category
            .as_deref()
            .map(str::parse::<ProductCategory>)
            .transpose()
            .map_err(AppError::Internal)?;

        Ok(Product {
            id: row.id,
            sku: row.sku,
            name: row.name,
            unit_of_measure: row.unit_of_measure,
            sale_price: parse_decimal("sale_price", &row.sale_price)?,
            min_stock: parse_optional_decimal("min_stock", row.min_stock.as_deref())?,
            category,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Look up the live product holding `sku` (already normalized)
pub(crate) async fn find_live_by_sku(
    conn: &mut SqliteConnection,
    sku: &str,
) -> AppResult<Option<Product>> {
    let row = sqlx::query_as::<_, ProductRow>(&format!(
        "SELECT {} FROM products WHERE sku = ? AND deleted_at IS NULL",
        PRODUCT_COLUMNS
    ))
    .bind(sku)
    .fetch_optional(&mut *conn)
    .await?;

    row.map(Product::try_from).transpose()
}

pub(crate) async fn find_live_by_id(
    conn: &mut SqliteConnection,
    product_id: Uuid,
) -> AppResult<Option<Product>> {
    let row = sqlx::query_as::<_, ProductRow>(&format!(
        "SELECT {} FROM products WHERE id = ? AND deleted_at IS NULL",
        PRODUCT_COLUMNS
    ))
    .bind(product_id)
    .fetch_optional(&mut *conn)
    .await?;

    row.map(Product::try_from).transpose()
}

/// Insert a new product record
pub(crate) async fn insert_product(conn: &mut SqliteConnection, product: &Product) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO products (
            id, sku, name, unit_of_measure, sale_price, min_stock, category,
            created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(product.id)
    .bind(&product.sku)
    .bind(&product.name)
    .bind(&product.unit_of_measure)
    .bind(decimal_text(product.sale_price))
    .bind(product.min_stock.map(decimal_text))
    .bind(product.category.map(|c| c.as_str()))
    .bind(product.created_at)
    .bind(product.updated_at)
    .execute(&mut *conn)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db) if db.is_unique_violation() => {
            AppError::DuplicateEntry("sku".to_string())
        }
        other => AppError::DatabaseError(other),
    })?;

    Ok(())
}

/// Input for editing a product
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProductInput {
    pub name: Option<String>,
    pub sale_price: Option<Decimal>,
    /// Absent leaves it unchanged; `null` clears it back to the configured default
    #[serde(default, deserialize_with = "present_or_null")]
    pub min_stock: Option<Option<Decimal>>,
    pub category: Option<ProductCategory>,
}

/// Distinguish an explicit `null` from a missing field
fn present_or_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Row for the stock listing query
#[derive(Debug, FromRow)]
struct ProductStockRow {
    #[sqlx(flatten)]
    product: ProductRow,
    remaining: Option<String>,
}

/// Product service
#[derive(Clone)]
pub struct ProductService {
    store: Store,
}

impl ProductService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Find a live product by SKU
    pub async fn find_by_sku(&self, sku: &str) -> AppResult<Product> {
        let sku = normalize_sku(sku);
        let mut conn = self.store.pool().acquire().await?;
        find_live_by_sku(&mut conn, &sku)
            .await?
            .ok_or(AppError::ProductNotFound(sku))
    }

    pub async fn get(&self, product_id: Uuid) -> AppResult<Product> {
        let mut conn = self.store.pool().acquire().await?;
        find_live_by_id(&mut conn, product_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Product".to_string()))
    }

    /// Live products with their active stock, ordered by name
    pub async fn list(&self) -> AppResult<Vec<ProductStock>> {
        let rows = sqlx::query_as::<_, ProductStockRow>(
            r#"
            SELECT p.id, p.sku, p.name, p.unit_of_measure, p.sale_price, p.min_stock,
                   p.category, p.created_at, p.updated_at, b.remaining
            FROM products p
            LEFT JOIN batches b ON b.product_id = p.id AND b.deleted_at IS NULL
            WHERE p.deleted_at IS NULL
            ORDER BY p.name, p.id
            "#,
        )
        .fetch_all(self.store.pool())
        .await?;

        let mut listing: Vec<ProductStock> = Vec::new();
        for row in rows {
            let remaining = parse_optional_decimal("remaining", row.remaining.as_deref())?;
            let product = Product::try_from(row.product)?;

            let is_new = listing
                .last()
                .map_or(true, |last| last.product.id != product.id);
            if is_new {
                listing.push(ProductStock {
                    product,
                    total_stock: Decimal::ZERO,
                    active_batches: 0,
                });
            }

            if let (Some(qty), Some(entry)) = (
                remaining.filter(|q| *q > Decimal::ZERO),
                listing.last_mut(),
            ) {
                entry.total_stock = checked_add(entry.total_stock, qty, "product stock")?;
                entry.active_batches += 1;
            }
        }

        Ok(listing)
    }

    /// Edit the mutable fields of a product; the SKU never changes
    pub async fn update(&self, product_id: Uuid, input: UpdateProductInput) -> AppResult<Product> {
        if let Some(name) = &input.name {
            validate_product_name(name).map_err(|m| {
                AppError::validation("name", m, "El nombre del producto no es válido")
            })?;
        }
        if let Some(price) = input.sale_price {
            validate_sale_price(price).map_err(|m| {
                AppError::validation(
                    "sale_price",
                    m,
                    "El precio de venta debe ser mayor que cero y no superar 1000000000000",
                )
            })?;
        }
        if let Some(Some(min)) = input.min_stock {
            validate_min_stock(min).map_err(|m| {
                AppError::validation(
                    "min_stock",
                    m,
                    "El stock mínimo debe estar entre 0 y 1000000000",
                )
            })?;
        }

        let mut tx = self.store.begin_write().await?;
        let mut product = find_live_by_id(tx.conn(), product_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        if let Some(name) = input.name {
            product.name = name.trim().to_string();
        }
        if let Some(price) = input.sale_price {
            product.sale_price = price;
        }
        if let Some(min_stock) = input.min_stock {
            product.min_stock = min_stock;
        }
        if input.category.is_some() {
            product.category = input.category;
        }
        product.updated_at = Utc::now();

        sqlx::query(
            r#"
            UPDATE products
            SET name = ?, sale_price = ?, min_stock = ?, category = ?, updated_at = ?
            WHERE id = ? AND deleted_at IS NULL
            "#,
        )
        .bind(&product.name)
        .bind(decimal_text(product.sale_price))
        .bind(product.min_stock.map(decimal_text))
        .bind(product.category.map(|c| c.as_str()))
        .bind(product.updated_at)
        .bind(product.id)
        .execute(tx.conn())
        .await?;

        tx.commit().await?;
        tracing::info!(product_id = %product.id, sku = %product.sku, "Product updated");

        Ok(product)
    }

    /// Soft-delete a product together with all of its live batches
    pub async fn delete(&self, product_id: Uuid) -> AppResult<()> {
        let now = Utc::now();
        let mut tx = self.store.begin_write().await?;

        let product = find_live_by_id(tx.conn(), product_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        let batches = sqlx::query(
            "UPDATE batches SET deleted_at = ?, updated_at = ? WHERE product_id = ? AND deleted_at IS NULL",
        )
        .bind(now)
        .bind(now)
        .bind(product_id)
        .execute(tx.conn())
        .await?;

        sqlx::query("UPDATE products SET deleted_at = ?, updated_at = ? WHERE id = ?")
            .bind(now)
            .bind(now)
            .bind(product_id)
            .execute(tx.conn())
            .await?;

        tx.commit().await?;
        tracing::info!(
            product_id = %product_id,
            sku = %product.sku,
            batches = batches.rows_affected(),
            "Product deleted"
        );

        Ok(())
    }
}
