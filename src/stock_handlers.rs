// src/stock_handlers.rs
use actix_web::{web, HttpResponse};
use std::sync::Arc;
use crate::AppState;
use crate::models::*;
use crate::error::{ApiError, ApiResult};
use crate::handlers::ApiResponse;
use crate::validator::validate_request;

pub async fn get_medstock(
    app_state: web::Data<Arc<AppState>>,
) -> ApiResult<HttpResponse> {
    let stock: Vec<StockBatch> = sqlx::query_as(
        r#"SELECT expiry_id, med_id, med_name, quantity, expiry_date, unit_buy_price
           FROM med_stock
           ORDER BY expiry_date ASC, expiry_id ASC"#
    )
        .fetch_all(&app_state.db_pool)
        .await?;

    Ok(HttpResponse::Ok().json(stock))
}

/// Adds received stock. A delivery for a medicine and expiry date that already has a
/// batch is merged into that batch instead of creating a second one.
pub async fn add_medstock(
    app_state: web::Data<Arc<AppState>>,
    stock_data: web::Json<CreateStockRequest>,
) -> ApiResult<HttpResponse> {
    validate_request(&*stock_data)?;

    let mut tx = app_state.db_pool.begin().await?;

    let known: Option<i64> = sqlx::query_scalar("SELECT med_id FROM med_info WHERE med_id = ?")
        .bind(stock_data.med_id)
        .fetch_optional(&mut *tx)
        .await?;
    if known.is_none() {
        return Err(ApiError::medicine_not_found(stock_data.med_id));
    }

    let existing: Option<i64> = sqlx::query_scalar(
        "SELECT expiry_id FROM med_stock WHERE med_id = ? AND expiry_date = ? ORDER BY expiry_id LIMIT 1"
    )
        .bind(stock_data.med_id)
        .bind(stock_data.expiry_date)
        .fetch_optional(&mut *tx)
        .await?;

    let (expiry_id, merged) = match existing {
        Some(expiry_id) => {
            sqlx::query("UPDATE med_stock SET quantity = quantity + ? WHERE expiry_id = ?")
                .bind(stock_data.quantity)
                .bind(expiry_id)
                .execute(&mut *tx)
                .await?;
            (expiry_id, true)
        }
        None => {
            let result = sqlx::query(
                r#"INSERT INTO med_stock (med_id, med_name, quantity, expiry_date, unit_buy_price)
                   VALUES (?, ?, ?, ?, ?)"#
            )
                .bind(stock_data.med_id)
                .bind(stock_data.med_name.trim())
                .bind(stock_data.quantity)
                .bind(stock_data.expiry_date)
                .bind(stock_data.unit_buy_price)
                .execute(&mut *tx)
                .await?;
            (result.last_insert_rowid(), false)
        }
    };

    let batch: StockBatch = sqlx::query_as(
        "SELECT expiry_id, med_id, med_name, quantity, expiry_date, unit_buy_price FROM med_stock WHERE expiry_id = ?"
    )
        .bind(expiry_id)
        .fetch_one(&mut *tx)
        .await?;

    tx.commit().await?;

    if merged {
        log::info!("Merged {} units into batch {} (now {})", stock_data.quantity, expiry_id, batch.quantity);
        Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
            batch,
            "Quantity updated successfully!".to_string(),
        )))
    } else {
        log::info!("Created batch {} for medicine {}", expiry_id, batch.med_id);
        Ok(HttpResponse::Created().json(ApiResponse::success_with_message(
            batch,
            "Stock added successfully!".to_string(),
        )))
    }
}

/// In-stock batches with their catalog attributes, soonest expiry first
pub async fn get_available_meds(
    app_state: web::Data<Arc<AppState>>,
) -> ApiResult<HttpResponse> {
    let meds: Vec<AvailableMedicine> = sqlx::query_as(
        r#"SELECT s.expiry_id, s.med_id, s.med_name, s.quantity, s.expiry_date, i.brand, i.type
           FROM med_stock s
           JOIN med_info i ON s.med_id = i.med_id
           WHERE s.quantity > 0
           ORDER BY s.med_name ASC, s.expiry_date ASC"#
    )
        .fetch_all(&app_state.db_pool)
        .await?;

    Ok(HttpResponse::Ok().json(meds))
}
