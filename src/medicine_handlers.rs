// src/medicine_handlers.rs
//! Medicine catalog: listing, single entry and CSV import

use actix_web::{web, HttpResponse};
use std::sync::Arc;
use sqlx::{Sqlite, Transaction};
use crate::AppState;
use crate::models::*;
use crate::error::{ApiError, ApiResult};
use crate::handlers::ApiResponse;
use crate::validator::validate_request;

const IMPORT_HEADERS: [&str; 4] = ["med_name", "brand", "category", "type"];

pub async fn get_medinfo(
    app_state: web::Data<Arc<AppState>>,
) -> ApiResult<HttpResponse> {
    let meds: Vec<MedicineInfo> = sqlx::query_as(
        "SELECT med_id, med_name, brand, category, type FROM med_info ORDER BY med_id"
    )
        .fetch_all(&app_state.db_pool)
        .await?;

    Ok(HttpResponse::Ok().json(meds))
}

async fn insert_medicine(
    tx: &mut Transaction<'_, Sqlite>,
    med: &CreateMedicineRequest,
) -> ApiResult<i64> {
    let result = sqlx::query(
        "INSERT INTO med_info (med_name, brand, category, type) VALUES (?, ?, ?, ?)"
    )
        .bind(med.med_name.trim())
        .bind(med.brand.trim())
        .bind(med.category.trim())
        .bind(med.med_type.trim())
        .execute(&mut **tx)
        .await?;

    Ok(result.last_insert_rowid())
}

pub async fn add_medinfo(
    app_state: web::Data<Arc<AppState>>,
    med_data: web::Json<CreateMedicineRequest>,
) -> ApiResult<HttpResponse> {
    validate_request(&*med_data)?;

    let mut tx = app_state.db_pool.begin().await?;
    let med_id = insert_medicine(&mut tx, &med_data).await?;
    tx.commit().await?;

    let med: MedicineInfo = sqlx::query_as(
        "SELECT med_id, med_name, brand, category, type FROM med_info WHERE med_id = ?"
    )
        .bind(med_id)
        .fetch_one(&app_state.db_pool)
        .await?;

    log::info!("Added medicine {} ({})", med.med_id, med.med_name);

    Ok(HttpResponse::Created().json(ApiResponse::success_with_message(
        med,
        "Medicine info added!".to_string(),
    )))
}

/// Parses a catalog CSV with header `med_name,brand,category,type`.
/// Every row must validate; the first bad row is reported with its line number.
pub fn parse_medinfo_csv(data: &[u8]) -> ApiResult<Vec<CreateMedicineRequest>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(data);

    let headers = reader.headers()?.clone();
    for required in IMPORT_HEADERS {
        if !headers.iter().any(|h| h == required) {
            return Err(ApiError::missing_field(required));
        }
    }

    let mut meds = Vec::new();
    for (idx, record) in reader.deserialize::<CreateMedicineRequest>().enumerate() {
        // Header occupies line 1
        let line = idx + 2;
        let med = record.map_err(|e| ApiError::ValidationError(format!("Row {}: {}", line, e)))?;
        validate_request(&med)
            .map_err(|e| ApiError::ValidationError(format!("Row {}: {}", line, e)))?;
        meds.push(med);
    }

    if meds.is_empty() {
        return Err(ApiError::ValidationError("CSV contains no medicine rows".to_string()));
    }

    Ok(meds)
}

pub async fn import_medinfo(
    app_state: web::Data<Arc<AppState>>,
    body: web::Bytes,
) -> ApiResult<HttpResponse> {
    let meds = parse_medinfo_csv(&body)?;

    let mut tx = app_state.db_pool.begin().await?;
    for med in &meds {
        insert_medicine(&mut tx, med).await?;
    }
    tx.commit().await?;

    log::info!("Imported {} medicines from CSV", meds.len());

    Ok(HttpResponse::Created().json(ApiResponse::success_with_message(
        serde_json::json!({ "imported": meds.len() }),
        "Data imported successfully!".to_string(),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use actix_web::{test as actix_test, App};

    const CSV: &str = "med_name,brand,category,type\n\
                       Paracetamol,Crocin,Analgesic,Tablet\n\
                       Amoxicillin , Mox , Antibiotic , Capsule\n";

    #[test]
    fn test_parse_csv_trims_fields() {
        let meds = parse_medinfo_csv(CSV.as_bytes()).unwrap();
        assert_eq!(meds.len(), 2);
        assert_eq!(meds[1].med_name, "Amoxicillin");
        assert_eq!(meds[1].med_type, "Capsule");
    }

    #[test]
    fn test_parse_csv_missing_header() {
        let err = parse_medinfo_csv(b"med_name,brand,category\nA,B,C\n").unwrap_err();
        assert!(matches!(err, ApiError::ValidationError(ref msg) if msg.contains("type")));
    }

    #[test]
    fn test_parse_csv_reports_bad_row() {
        let data = "med_name,brand,category,type\nA,B,C,D\n,Brand,Cat,Tablet\n";
        let err = parse_medinfo_csv(data.as_bytes()).unwrap_err();
        assert!(matches!(err, ApiError::ValidationError(ref msg) if msg.starts_with("Row 3")));
    }

    #[actix_rt::test]
    async fn test_add_and_list_medinfo() {
        let state = Arc::new(AppState::for_tests(test_pool().await));
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(state.clone()))
                .configure(crate::configure_api)
        ).await;

        let req = actix_test::TestRequest::post()
            .uri("/api/medinfo")
            .set_json(serde_json::json!({
                "med_name": "Metformin",
                "brand": "Glycomet",
                "category": "Antidiabetic",
                "type": "Tablet"
            }))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::CREATED);

        let req = actix_test::TestRequest::get().uri("/api/medinfo").to_request();
        let meds: Vec<serde_json::Value> = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(meds.len(), 1);
        assert_eq!(meds[0]["type"], "Tablet");
        assert_eq!(meds[0]["med_name"], "Metformin");
    }

    #[actix_rt::test]
    async fn test_missing_field_is_named() {
        let state = Arc::new(AppState::for_tests(test_pool().await));
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(state.clone()))
                .configure(crate::configure_api)
        ).await;

        let req = actix_test::TestRequest::post()
            .uri("/api/medinfo")
            .set_json(serde_json::json!({ "med_name": "Metformin", "brand": "Glycomet", "type": "Tablet" }))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::BAD_REQUEST);
        let body: serde_json::Value = actix_test::read_body_json(resp).await;
        assert_eq!(body["error"], "validation_error");
        assert!(body["message"].as_str().unwrap().contains("category"));
    }

    #[actix_rt::test]
    async fn test_import_is_all_or_nothing() {
        let pool = test_pool().await;
        let state = Arc::new(AppState::for_tests(pool.clone()));
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(state.clone()))
                .configure(crate::configure_api)
        ).await;

        let bad = "med_name,brand,category,type\nA,B,C,D\nE,F,G,\n";
        let req = actix_test::TestRequest::post()
            .uri("/api/medinfo/import")
            .insert_header(("Content-Type", "text/csv"))
            .set_payload(bad)
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::BAD_REQUEST);

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM med_info")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);

        let req = actix_test::TestRequest::post()
            .uri("/api/medinfo/import")
            .insert_header(("Content-Type", "text/csv"))
            .set_payload(CSV)
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::CREATED);

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM med_info")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 2);
    }
}
