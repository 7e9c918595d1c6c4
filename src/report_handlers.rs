// src/report_handlers.rs
//! Expiry-risk report endpoint

use actix_web::{web, HttpResponse};
use std::sync::Arc;

use crate::AppState;
use crate::error::{ApiError, ApiResult};
use crate::expiry_tracker::build_expiry_report;
use crate::repositories::SqliteInventoryRepository;

pub async fn get_expiry_tracker(
    app_state: web::Data<Arc<AppState>>,
) -> ApiResult<HttpResponse> {
    // One as-of date for the whole run
    let as_of = chrono::Local::now().date_naive();
    let repo = SqliteInventoryRepository::snapshot(&app_state.db_pool)
        .await
        .map_err(|e| {
            log::error!("Failed to open inventory snapshot: {}", e);
            ApiError::data_unavailable(e)
        })?;

    let rows = build_expiry_report(&repo, as_of).await?;
    repo.release().await?;

    Ok(HttpResponse::Ok().json(rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use actix_web::{test, App};
    use chrono::{Duration, Local};

    #[actix_rt::test]
    async fn test_expiry_tracker_ranks_expired_first() {
        let pool = test_pool().await;
        let today = Local::now().date_naive();

        sqlx::query("INSERT INTO med_info (med_name, brand, category, type) VALUES ('Amoxicillin', 'Mox', 'Antibiotic', 'Capsule')")
            .execute(&pool)
            .await
            .unwrap();
        let batches = [
            (100, today + Duration::days(400)),
            (10, today - Duration::days(3)),
        ];
        for (quantity, expiry) in batches {
            sqlx::query("INSERT INTO med_stock (med_id, med_name, quantity, expiry_date, unit_buy_price) VALUES (1, 'Amoxicillin', ?, ?, 1.5)")
                .bind(quantity)
                .bind(expiry)
                .execute(&pool)
                .await
                .unwrap();
        }
        sqlx::query("INSERT INTO med_sales (expiry_id, med_name, customer_name, customer_contact, sale_date, quantity, unit_sell_price) VALUES (1, 'Amoxicillin', 'Meera', '9123456780', ?, 30, 2.0)")
            .bind(today)
            .execute(&pool)
            .await
            .unwrap();

        let state = Arc::new(AppState::for_tests(pool));
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state.clone()))
                .configure(crate::configure_api)
        ).await;

        let req = test::TestRequest::get().uri("/api/expiry_tracker").to_request();
        let rows: Vec<serde_json::Value> = test::call_and_read_body_json(&app, req).await;

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["expiry_id"], 2);
        assert_eq!(rows[0]["status"], "Expired");
        assert_eq!(rows[0]["remaining_days"], -3);
        assert_eq!(rows[1]["total_sold_30d"], 30);
        assert_eq!(rows[1]["avg_daily_sales"], 1.0);
        assert_eq!(rows[1]["days_to_sell"], 100.0);
        assert_eq!(rows[1]["type"], "Capsule");
        assert_eq!(rows[1]["status"], "Safe (300 days buffer)");
    }

    #[actix_rt::test]
    async fn test_empty_inventory_gives_empty_report() {
        let state = Arc::new(AppState::for_tests(test_pool().await));
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state.clone()))
                .configure(crate::configure_api)
        ).await;

        let req = test::TestRequest::get().uri("/api/expiry_tracker").to_request();
        let rows: Vec<serde_json::Value> = test::call_and_read_body_json(&app, req).await;
        assert!(rows.is_empty());
    }
}
