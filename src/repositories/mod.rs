// src/repositories/mod.rs
//! Read-side store contract consumed by the expiry estimator

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{Sqlite, SqlitePool, Transaction};
use tokio::sync::Mutex;
use crate::models::StockBatch;

/// Catalog attributes the report needs from `med_info`
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogInfo {
    pub med_id: i64,
    pub brand: String,
    pub med_type: String,
}

/// A stock batch with its catalog entry; `medicine` is `None` for orphaned batches.
#[derive(Debug, Clone, PartialEq)]
pub struct StockWithCatalog {
    pub batch: StockBatch,
    pub medicine: Option<CatalogInfo>,
}

#[async_trait]
pub trait InventoryRepository: Send + Sync {
    /// All stock batches in enumeration order (ascending `expiry_id`)
    async fn stock_with_catalog(&self) -> Result<Vec<StockWithCatalog>, sqlx::Error>;

    /// Sum of sold units for one batch with `sale_date` in `[from, to]`, 0 when none
    async fn units_sold_between(
        &self,
        expiry_id: i64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<i64, sqlx::Error>;
}

#[derive(sqlx::FromRow)]
struct StockCatalogRow {
    expiry_id: i64,
    med_id: i64,
    med_name: String,
    quantity: i64,
    expiry_date: NaiveDate,
    unit_buy_price: f64,
    catalog_med_id: Option<i64>,
    brand: Option<String>,
    med_type: Option<String>,
}

impl From<StockCatalogRow> for StockWithCatalog {
    fn from(row: StockCatalogRow) -> Self {
        let medicine = match (row.catalog_med_id, row.brand, row.med_type) {
            (Some(med_id), Some(brand), Some(med_type)) => Some(CatalogInfo { med_id, brand, med_type }),
            _ => None,
        };

        StockWithCatalog {
            batch: StockBatch {
                expiry_id: row.expiry_id,
                med_id: row.med_id,
                med_name: row.med_name,
                quantity: row.quantity,
                expiry_date: row.expiry_date,
                unit_buy_price: row.unit_buy_price,
            },
            medicine,
        }
    }
}

/// Reads the inventory inside one read transaction, so stock levels and sales
/// totals come from the same database state even while sales are committing.
pub struct SqliteInventoryRepository {
    tx: Mutex<Transaction<'static, Sqlite>>,
}

impl SqliteInventoryRepository {
    pub async fn snapshot(pool: &SqlitePool) -> Result<Self, sqlx::Error> {
        let tx = pool.begin().await?;
        Ok(Self { tx: Mutex::new(tx) })
    }

    /// Ends the read transaction and hands the connection back to the pool
    pub async fn release(self) -> Result<(), sqlx::Error> {
        self.tx.into_inner().rollback().await
    }
}

#[async_trait]
impl InventoryRepository for SqliteInventoryRepository {
    async fn stock_with_catalog(&self) -> Result<Vec<StockWithCatalog>, sqlx::Error> {
        let mut tx = self.tx.lock().await;
        let rows: Vec<StockCatalogRow> = sqlx::query_as(
            r#"SELECT
                s.expiry_id,
                s.med_id,
                s.med_name,
                s.quantity,
                s.expiry_date,
                s.unit_buy_price,
                i.med_id AS catalog_med_id,
                i.brand,
                i.type AS med_type
               FROM med_stock s
               LEFT JOIN med_info i ON s.med_id = i.med_id
               ORDER BY s.expiry_id ASC"#
        )
            .fetch_all(&mut **tx)
            .await?;

        Ok(rows.into_iter().map(StockWithCatalog::from).collect())
    }

    async fn units_sold_between(
        &self,
        expiry_id: i64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<i64, sqlx::Error> {
        let mut tx = self.tx.lock().await;
        let total: i64 = sqlx::query_scalar(
            r#"SELECT COALESCE(SUM(quantity), 0)
               FROM med_sales
               WHERE expiry_id = ? AND sale_date >= ? AND sale_date <= ?"#
        )
            .bind(expiry_id)
            .bind(from)
            .bind(to)
            .fetch_one(&mut **tx)
            .await?;

        Ok(total)
    }
}
