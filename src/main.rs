// src/main.rs
use actix_web::{
    middleware::Logger,
    web, App, HttpServer,
};
use actix_web::http::header;
use actix_cors::Cors;
use anyhow::Context;
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// Module declarations
mod config;
mod db;
mod error;
mod handlers;
mod models;
mod monitoring;
mod repositories;
mod validator;
mod sales_aggregator;
mod expiry_tracker;
mod medicine_handlers;
mod stock_handlers;
mod sale_handlers;
mod report_handlers;

use config::{load_config, Config};
use monitoring::{Metrics, RequestLogger};

pub struct AppState {
    pub db_pool: SqlitePool,
    pub config: Config,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(db_pool: SqlitePool, config: Config) -> Self {
        Self {
            db_pool,
            config,
            metrics: Arc::new(Metrics::new()),
        }
    }

    #[cfg(test)]
    pub fn for_tests(db_pool: SqlitePool) -> Self {
        Self::new(db_pool, Config::default())
    }
}

// ==================== ROUTES ====================

fn json_config(limit: usize) -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(limit)
        .error_handler(handlers::json_error_handler)
}

/// All routes with the default JSON body limit
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    configure_api_with_limit(cfg, config::ServerConfig::default().max_json_payload);
}

pub fn configure_api_with_limit(cfg: &mut web::ServiceConfig, json_limit: usize) {
    cfg.app_data(json_config(json_limit))
        .route("/", web::get().to(handlers::home))

        // Health check and metrics
        .service(
            web::scope("/health")
                .route("", web::get().to(monitoring::health_check))
                .route("/ready", web::get().to(monitoring::readiness_check))
                .route("/metrics", web::get().to(monitoring::metrics_endpoint))
        )

        .service(
            web::scope("/api")
                // Expiry risk
                .route("/expiry_tracker", web::get().to(report_handlers::get_expiry_tracker))

                // Sales
                .service(
                    web::scope("/sales")
                        .route("", web::get().to(sale_handlers::get_sales))
                        .route("", web::post().to(sale_handlers::create_sale))
                        .route("/bulk", web::post().to(sale_handlers::create_bulk_sale))
                        .route("/today", web::get().to(sale_handlers::get_today_sales))
                )

                // Catalog
                .service(
                    web::scope("/medinfo")
                        .route("", web::get().to(medicine_handlers::get_medinfo))
                        .route("", web::post().to(medicine_handlers::add_medinfo))
                        .route("/import", web::post().to(medicine_handlers::import_medinfo))
                )

                // Stock
                .route("/medstock", web::get().to(stock_handlers::get_medstock))
                .route("/medstock", web::post().to(stock_handlers::add_medstock))
                .route("/available_meds", web::get().to(stock_handlers::get_available_meds))
        );
}

// ==================== MAIN ====================

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration (this calls load_env_file internally)
    let config = load_config()?;

    setup_logging(&config)?;
    config.print_startup_info();

    db::setup_database(&config.database.url).await?;
    let pool = db::create_database_pool(&config.database).await?;
    db::run_migrations(&pool).await?;

    let app_state = Arc::new(AppState::new(pool, config.clone()));

    let bind_address = format!("{}:{}", config.server.host, config.server.port);
    log::info!("Starting server at http://{}", bind_address);

    let json_limit = config.server.max_json_payload;
    let allowed_origins = config.security.allowed_origins.clone();
    let metrics = app_state.metrics.clone();
    let state = app_state.clone();

    let mut server = HttpServer::new(move || {
        App::new()
            .wrap(setup_cors(&allowed_origins))
            .wrap(Logger::default())
            .wrap(RequestLogger::new(metrics.clone()))
            .app_data(web::Data::new(state.clone()))
            .configure(|cfg| configure_api_with_limit(cfg, json_limit))
    })
        .keep_alive(std::time::Duration::from_secs(config.server.keep_alive));

    if let Some(workers) = config.server.workers {
        server = server.workers(workers);
    }

    server
        .bind(&bind_address)
        .with_context(|| format!("Failed to bind {}", bind_address))?
        .run()
        .await
        .context("Server failed to run")?;

    app_state.db_pool.close().await;
    log::info!("Server stopped");
    Ok(())
}

// ==================== HELPER FUNCTIONS ====================

pub fn setup_cors(allowed_origins: &[String]) -> Cors {
    let mut cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "OPTIONS"])
        .allowed_headers(vec![
            header::CONTENT_TYPE,
            header::ACCEPT,
        ])
        .expose_headers(vec![header::CONTENT_LENGTH])
        .max_age(3600);

    if allowed_origins.iter().any(|o| o == "*") {
        log::warn!("Using wildcard CORS (*)");
        cors = cors.allow_any_origin().allow_any_header().allow_any_method();
    } else {
        for origin in allowed_origins.iter().filter(|o| !o.is_empty()) {
            log::debug!("Adding CORS origin: {}", origin);
            cors = cors.allowed_origin(origin);
        }
    }

    cors
}

fn setup_logging(config: &Config) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| {
            let level = config.logging.level.as_str();
            tracing_subscriber::EnvFilter::new(level)
        });

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .context("Failed to initialise logging")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test};

    #[actix_rt::test]
    async fn test_home_and_health() {
        let state = Arc::new(AppState::for_tests(db::test_pool().await));
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state.clone()))
                .configure(configure_api)
        ).await;

        let req = test::TestRequest::get().uri("/").to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(body, "Medstock API is running!");

        let req = test::TestRequest::get().uri("/health").to_request();
        let health: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(health["status"], "healthy");
    }

    #[actix_rt::test]
    async fn test_malformed_json_is_validation_error() {
        let state = Arc::new(AppState::for_tests(db::test_pool().await));
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state.clone()))
                .configure(configure_api)
        ).await;

        let req = test::TestRequest::post()
            .uri("/api/sales/bulk")
            .insert_header(("Content-Type", "application/json"))
            .set_payload("{not json")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "validation_error");
    }
}
