// src/models/medicine.rs
use serde::{Deserialize, Serialize};
use validator::Validate;

// ==================== MEDICINE CATALOG ====================

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone, PartialEq)]
pub struct MedicineInfo {
    pub med_id: i64,
    pub med_name: String,
    pub brand: String,
    pub category: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub med_type: String,
}

/// Catalog entry as submitted by the API or read from an import CSV row
#[derive(Debug, Deserialize, Validate, Clone)]
pub struct CreateMedicineRequest {
    #[validate(length(min = 1, max = 100, message = "med_name must be between 1 and 100 characters"))]
    pub med_name: String,

    #[validate(length(min = 1, max = 100, message = "brand must be between 1 and 100 characters"))]
    pub brand: String,

    #[validate(length(min = 1, max = 100, message = "category must be between 1 and 100 characters"))]
    pub category: String,

    #[serde(rename = "type")]
    #[validate(length(min = 1, max = 100, message = "type must be between 1 and 100 characters"))]
    pub med_type: String,
}
