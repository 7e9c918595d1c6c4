// src/db.rs - Database migrations and pool setup

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{migrate::MigrateDatabase, Sqlite, SqlitePool};
use std::str::FromStr;
use std::time::Duration;
use anyhow::{Context, Result};

use crate::config::DatabaseConfig;

pub async fn setup_database(database_url: &str) -> Result<()> {
    if !Sqlite::database_exists(database_url).await.unwrap_or(false) {
        log::info!("Creating database: {}", database_url);
        Sqlite::create_database(database_url).await?;
    }
    Ok(())
}

pub async fn create_database_pool(db_config: &DatabaseConfig) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&db_config.url)
        .with_context(|| format!("Invalid database URL: {}", db_config.url))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(db_config.max_connections)
        .min_connections(db_config.min_connections)
        .acquire_timeout(Duration::from_secs(db_config.connect_timeout))
        .connect_with(options)
        .await?;

    Ok(pool)
}

pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(pool)
        .await?;

    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(pool)
        .await?;

    // Medicine catalog
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS med_info (
            med_id INTEGER PRIMARY KEY AUTOINCREMENT,
            med_name TEXT NOT NULL CHECK(length(med_name) > 0 AND length(med_name) <= 100),
            brand TEXT NOT NULL CHECK(length(brand) <= 100),
            category TEXT NOT NULL CHECK(length(category) <= 100),
            type TEXT NOT NULL CHECK(length(type) <= 100)
        )
        "#,
    )
        .execute(pool)
        .await?;

    // Stock batches, one row per (medicine, expiry date)
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS med_stock (
            expiry_id INTEGER PRIMARY KEY AUTOINCREMENT,
            med_id INTEGER NOT NULL,
            med_name TEXT NOT NULL CHECK(length(med_name) > 0 AND length(med_name) <= 100),
            quantity INTEGER NOT NULL CHECK(quantity >= 0),
            expiry_date DATE NOT NULL,
            unit_buy_price REAL NOT NULL CHECK(unit_buy_price >= 0),
            FOREIGN KEY (med_id) REFERENCES med_info (med_id)
        )
        "#,
    )
        .execute(pool)
        .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS med_sales (
            sale_id INTEGER PRIMARY KEY AUTOINCREMENT,
            expiry_id INTEGER NOT NULL,
            med_name TEXT NOT NULL CHECK(length(med_name) <= 100),
            customer_name TEXT NOT NULL CHECK(length(customer_name) > 0 AND length(customer_name) <= 100),
            customer_contact TEXT NOT NULL CHECK(length(customer_contact) <= 20),
            sale_date DATE NOT NULL,
            quantity INTEGER NOT NULL CHECK(quantity > 0),
            unit_sell_price REAL NOT NULL CHECK(unit_sell_price >= 0),
            FOREIGN KEY (expiry_id) REFERENCES med_stock (expiry_id)
        )
        "#,
    )
        .execute(pool)
        .await?;

    // Indexes
    let indexes = [
        "CREATE INDEX IF NOT EXISTS idx_med_stock_med_expiry ON med_stock(med_id, expiry_date)",
        "CREATE INDEX IF NOT EXISTS idx_med_sales_batch_date ON med_sales(expiry_id, sale_date)",
        "CREATE INDEX IF NOT EXISTS idx_med_sales_date ON med_sales(sale_date)",
    ];

    for index_sql in indexes.iter() {
        sqlx::query(index_sql)
            .execute(pool)
            .await?;
    }

    log::info!("Database migrations completed");
    Ok(())
}

/// Single-connection in-memory pool with the schema applied
#[cfg(test)]
pub async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory database");
    run_migrations(&pool).await.expect("migrations");
    pool
}

#[cfg(test)]
mod tests {
    use super::*;

    #[actix_rt::test]
    async fn test_migrations_are_idempotent() {
        let pool = test_pool().await;
        run_migrations(&pool).await.unwrap();

        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name LIKE 'med_%' ORDER BY name"
        )
            .fetch_all(&pool)
            .await
            .unwrap();

        assert_eq!(tables, vec!["med_info", "med_sales", "med_stock"]);
    }

    #[actix_rt::test]
    async fn test_negative_quantity_rejected_by_schema() {
        let pool = test_pool().await;
        sqlx::query("INSERT INTO med_info (med_name, brand, category, type) VALUES ('Paracetamol', 'Calpol', 'Analgesic', 'Tablet')")
            .execute(&pool)
            .await
            .unwrap();

        let result = sqlx::query(
            "INSERT INTO med_stock (med_id, med_name, quantity, expiry_date, unit_buy_price) VALUES (1, 'Paracetamol', -1, '2030-01-01', 1.0)"
        )
            .execute(&pool)
            .await;

        assert!(result.is_err());
    }
}
