// src/models/stock.rs
use serde::{Deserialize, Serialize};
use validator::Validate;
use chrono::NaiveDate;

// ==================== STOCK BATCH ====================

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone, PartialEq)]
pub struct StockBatch {
    pub expiry_id: i64,
    pub med_id: i64,
    pub med_name: String,
    pub quantity: i64,
    pub expiry_date: NaiveDate,
    pub unit_buy_price: f64,
}

#[derive(Debug, Deserialize, Validate, Clone)]
pub struct CreateStockRequest {
    #[validate(range(min = 1, message = "med_id must be a positive identifier"))]
    pub med_id: i64,
    #[validate(length(min = 1, max = 100, message = "med_name must be between 1 and 100 characters"))]
    pub med_name: String,
    #[validate(range(min = 1, message = "quantity must be at least 1"))]
    pub quantity: i64,
    pub expiry_date: NaiveDate,
    #[validate(range(min = 0.0, message = "unit_buy_price must be non-negative"))]
    pub unit_buy_price: f64,
}

/// Stock batch joined with its catalog entry
#[derive(Debug, Serialize, sqlx::FromRow, Clone)]
pub struct AvailableMedicine {
    pub expiry_id: i64,
    pub med_id: i64,
    pub med_name: String,
    pub quantity: i64,
    pub expiry_date: NaiveDate,
    pub brand: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub med_type: String,
}
