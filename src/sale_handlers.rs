// src/sale_handlers.rs
//! Sales: transactional stock decrement plus sale records

use actix_web::{web, HttpResponse};
use chrono::NaiveDate;
use sqlx::{SqliteConnection, SqlitePool};
use std::sync::Arc;
use crate::AppState;
use crate::models::*;
use crate::error::{ApiError, ApiResult};
use crate::validator::validate_request;

/// Decrements one batch and records the sale on an open connection or transaction.
/// The decrement only happens when enough units remain, so stock never goes negative.
async fn apply_line(
    conn: &mut SqliteConnection,
    customer: &Customer,
    line: &SaleLine,
    today: NaiveDate,
) -> ApiResult<AppliedSale> {
    let updated = sqlx::query(
        "UPDATE med_stock SET quantity = quantity - ? WHERE expiry_id = ? AND quantity >= ?"
    )
        .bind(line.quantity)
        .bind(line.batch_id)
        .bind(line.quantity)
        .execute(&mut *conn)
        .await?;

    if updated.rows_affected() == 0 {
        let available: Option<i64> = sqlx::query_scalar(
            "SELECT quantity FROM med_stock WHERE expiry_id = ?"
        )
            .bind(line.batch_id)
            .fetch_optional(&mut *conn)
            .await?;

        return Err(match available {
            None => ApiError::batch_not_found(line.batch_id),
            Some(available) => ApiError::insufficient_stock(available, line.quantity),
        });
    }

    let result = sqlx::query(
        r#"INSERT INTO med_sales
           (expiry_id, med_name, customer_name, customer_contact, sale_date, quantity, unit_sell_price)
           VALUES (?, ?, ?, ?, ?, ?, ?)"#
    )
        .bind(line.batch_id)
        .bind(line.med_name.trim())
        .bind(customer.name.trim())
        .bind(customer.contact.trim())
        .bind(today)
        .bind(line.quantity)
        .bind(line.unit_sell_price)
        .execute(&mut *conn)
        .await?;

    Ok(AppliedSale {
        sale_id: result.last_insert_rowid(),
        line_total: line.line_total(),
    })
}

/// Records a single sale. Either both the decrement and the sale row land, or neither does.
pub async fn apply_sale(
    pool: &SqlitePool,
    customer: &Customer,
    line: &SaleLine,
    today: NaiveDate,
) -> ApiResult<AppliedSale> {
    let mut tx = pool.begin().await?;
    let applied = apply_line(&mut *tx, customer, line, today).await?;
    tx.commit().await?;

    log::info!(
        "Sale {} recorded: {} x{} from batch {}",
        applied.sale_id, line.med_name, line.quantity, line.batch_id
    );
    Ok(applied)
}

/// Records every line of a multi-item sale in one transaction.
/// The first failing line aborts the whole sale and no stock changes persist.
pub async fn apply_bulk_sale(
    pool: &SqlitePool,
    customer: &Customer,
    lines: &[SaleLine],
    today: NaiveDate,
) -> ApiResult<BulkSaleOutcome> {
    if lines.is_empty() {
        return Err(ApiError::ValidationError("sales must contain at least one line".to_string()));
    }

    let mut tx = pool.begin().await?;
    let mut sale_ids = Vec::with_capacity(lines.len());
    let mut total_amount = 0.0;

    for (idx, line) in lines.iter().enumerate() {
        // Dropping `tx` on error rolls back the lines already applied
        let applied = apply_line(&mut *tx, customer, line, today)
            .await
            .map_err(|e| {
                log::warn!("Bulk sale aborted at line {}: {}", idx, e);
                e
            })?;
        total_amount += applied.line_total;
        sale_ids.push(applied.sale_id);
    }

    tx.commit().await?;

    log::info!(
        "Bulk sale recorded for {}: {} lines, total {:.2}",
        customer.name, sale_ids.len(), total_amount
    );

    Ok(BulkSaleOutcome {
        total_sales: sale_ids.len(),
        total_amount,
        sale_ids,
    })
}

pub async fn create_sale(
    app_state: web::Data<Arc<AppState>>,
    sale_data: web::Json<CreateSaleRequest>,
) -> ApiResult<HttpResponse> {
    validate_request(&*sale_data)?;

    let today = chrono::Local::now().date_naive();
    let (customer, line) = sale_data.into_inner().into_parts();
    let applied = apply_sale(&app_state.db_pool, &customer, &line, today).await?;

    Ok(HttpResponse::Created().json(CreateSaleResponse {
        message: "Sale added successfully!".to_string(),
        sale_id: applied.sale_id,
        total_amount: applied.line_total,
    }))
}

pub async fn create_bulk_sale(
    app_state: web::Data<Arc<AppState>>,
    bulk_data: web::Json<BulkSaleRequest>,
) -> ApiResult<HttpResponse> {
    validate_request(&*bulk_data)?;

    let today = chrono::Local::now().date_naive();
    let (customer, lines) = bulk_data.into_inner().into_parts();
    let outcome = apply_bulk_sale(&app_state.db_pool, &customer, &lines, today).await?;

    Ok(HttpResponse::Created().json(BulkSaleResponse {
        message: "Bulk sale completed successfully!".to_string(),
        outcome,
    }))
}

pub async fn get_sales(
    app_state: web::Data<Arc<AppState>>,
) -> ApiResult<HttpResponse> {
    let sales: Vec<SaleRecord> = sqlx::query_as(
        r#"SELECT sale_id, expiry_id, med_name, customer_name, customer_contact,
                  sale_date, quantity, unit_sell_price
           FROM med_sales
           ORDER BY sale_date DESC, sale_id DESC"#
    )
        .fetch_all(&app_state.db_pool)
        .await?;

    let sales: Vec<SaleView> = sales.into_iter().map(SaleView::from).collect();
    Ok(HttpResponse::Ok().json(sales))
}

async fn sales_on(pool: &SqlitePool, date: NaiveDate) -> ApiResult<TodaySalesSummary> {
    let sales: Vec<SaleRecord> = sqlx::query_as(
        r#"SELECT sale_id, expiry_id, med_name, customer_name, customer_contact,
                  sale_date, quantity, unit_sell_price
           FROM med_sales
           WHERE sale_date = ?
           ORDER BY sale_id DESC"#
    )
        .bind(date)
        .fetch_all(pool)
        .await?;

    let sales: Vec<SaleView> = sales.into_iter().map(SaleView::from).collect();
    let total_amount = sales.iter().map(|s| s.total_amount).sum();

    Ok(TodaySalesSummary {
        date,
        total_sales: sales.len(),
        total_amount,
        sales,
    })
}

pub async fn get_today_sales(
    app_state: web::Data<Arc<AppState>>,
) -> ApiResult<HttpResponse> {
    let today = chrono::Local::now().date_naive();
    let summary = sales_on(&app_state.db_pool, today).await?;
    Ok(HttpResponse::Ok().json(summary))
}
