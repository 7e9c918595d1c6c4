// src/models/sale.rs
use serde::{Deserialize, Serialize};
use validator::Validate;
use chrono::NaiveDate;

// ==================== SALE RECORD ====================

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone, PartialEq)]
pub struct SaleRecord {
    pub sale_id: i64,
    pub expiry_id: i64,
    pub med_name: String,
    pub customer_name: String,
    pub customer_contact: String,
    pub sale_date: NaiveDate,
    pub quantity: i64,
    pub unit_sell_price: f64,
}

impl SaleRecord {
    pub fn total_amount(&self) -> f64 {
        self.quantity as f64 * self.unit_sell_price
    }
}

/// Sale record with its computed line total, as listed by the API
#[derive(Debug, Serialize)]
pub struct SaleView {
    #[serde(flatten)]
    pub sale: SaleRecord,
    pub total_amount: f64,
}

impl From<SaleRecord> for SaleView {
    fn from(sale: SaleRecord) -> Self {
        let total_amount = sale.total_amount();
        Self { sale, total_amount }
    }
}

// ==================== REQUESTS ====================

#[derive(Debug, Deserialize, Validate, Clone)]
pub struct CreateSaleRequest {
    #[validate(range(min = 1, message = "batch_id must be a positive identifier"))]
    pub batch_id: i64,
    #[validate(length(min = 1, max = 100, message = "med_name must be between 1 and 100 characters"))]
    pub med_name: String,
    #[validate(length(min = 1, max = 100, message = "customer_name must be between 1 and 100 characters"))]
    pub customer_name: String,
    #[validate(length(min = 1, max = 20, message = "customer_contact must be between 1 and 20 characters"))]
    pub customer_contact: String,
    #[validate(range(min = 1, message = "quantity must be at least 1"))]
    pub quantity: i64,
    #[validate(range(min = 0.0, message = "unit_sell_price must be non-negative"))]
    pub unit_sell_price: f64,
}

#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct BulkSaleItem {
    #[validate(range(min = 1, message = "batch_id must be a positive identifier"))]
    pub batch_id: i64,
    #[validate(length(min = 1, max = 100, message = "med_name must be between 1 and 100 characters"))]
    pub med_name: String,
    #[validate(range(min = 1, message = "quantity must be at least 1"))]
    pub quantity: i64,
    #[validate(range(min = 0.0, message = "unit_sell_price must be non-negative"))]
    pub unit_sell_price: f64,
}

#[derive(Debug, Deserialize, Validate, Clone)]
pub struct BulkSaleRequest {
    #[validate(length(min = 1, max = 100, message = "customer_name must be between 1 and 100 characters"))]
    pub customer_name: String,
    #[validate(length(min = 1, max = 20, message = "customer_contact must be between 1 and 20 characters"))]
    pub customer_contact: String,
    #[validate(length(min = 1, message = "sales must contain at least one line"), nested)]
    pub sales: Vec<BulkSaleItem>,
}

// ==================== APPLIER INPUTS ====================

#[derive(Debug, Clone, PartialEq)]
pub struct Customer {
    pub name: String,
    pub contact: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SaleLine {
    pub batch_id: i64,
    pub med_name: String,
    pub quantity: i64,
    pub unit_sell_price: f64,
}

impl SaleLine {
    pub fn line_total(&self) -> f64 {
        self.quantity as f64 * self.unit_sell_price
    }
}

impl CreateSaleRequest {
    pub fn into_parts(self) -> (Customer, SaleLine) {
        (
            Customer { name: self.customer_name, contact: self.customer_contact },
            SaleLine {
                batch_id: self.batch_id,
                med_name: self.med_name,
                quantity: self.quantity,
                unit_sell_price: self.unit_sell_price,
            },
        )
    }
}

impl BulkSaleRequest {
    pub fn into_parts(self) -> (Customer, Vec<SaleLine>) {
        let lines = self.sales
            .into_iter()
            .map(|item| SaleLine {
                batch_id: item.batch_id,
                med_name: item.med_name,
                quantity: item.quantity,
                unit_sell_price: item.unit_sell_price,
            })
            .collect();
        (Customer { name: self.customer_name, contact: self.customer_contact }, lines)
    }
}

// ==================== RESPONSES ====================

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct AppliedSale {
    pub sale_id: i64,
    pub line_total: f64,
}

#[derive(Debug, Serialize)]
pub struct CreateSaleResponse {
    pub message: String,
    pub sale_id: i64,
    pub total_amount: f64,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct BulkSaleOutcome {
    pub total_sales: usize,
    pub total_amount: f64,
    pub sale_ids: Vec<i64>,
}

#[derive(Debug, Serialize)]
pub struct BulkSaleResponse {
    pub message: String,
    #[serde(flatten)]
    pub outcome: BulkSaleOutcome,
}

#[derive(Debug, Serialize)]
pub struct TodaySalesSummary {
    pub date: NaiveDate,
    pub total_sales: usize,
    pub total_amount: f64,
    pub sales: Vec<SaleView>,
}
