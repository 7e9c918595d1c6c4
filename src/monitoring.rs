// src/monitoring.rs
use actix_web::{HttpResponse, web};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, atomic::{AtomicU64, Ordering}};
use std::time::Instant;
use chrono::{DateTime, Utc};
use crate::AppState;

const RESPONSE_TIME_SAMPLES: usize = 1000;

#[derive(Debug, Clone)]
pub struct Metrics {
    pub request_count: Arc<AtomicU64>,
    pub error_count: Arc<AtomicU64>,
    pub response_times: Arc<Mutex<VecDeque<u64>>>,
    started_at: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            request_count: Arc::new(AtomicU64::new(0)),
            error_count: Arc::new(AtomicU64::new(0)),
            response_times: Arc::new(Mutex::new(VecDeque::with_capacity(RESPONSE_TIME_SAMPLES))),
            started_at: Instant::now(),
        }
    }

    pub fn increment_requests(&self) {
        self.request_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_errors(&self) {
        self.error_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_response_time(&self, time_ms: u64) {
        if let Ok(mut times) = self.response_times.lock() {
            if times.len() == RESPONSE_TIME_SAMPLES {
                times.pop_front();
            }
            times.push_back(time_ms);
        }
    }

    pub fn avg_response_time_ms(&self) -> f64 {
        match self.response_times.lock() {
            Ok(times) if !times.is_empty() => times.iter().sum::<u64>() as f64 / times.len() as f64,
            _ => 0.0,
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
    pub uptime_seconds: u64,
}

#[derive(Serialize)]
pub struct MetricsResponse {
    pub requests_total: u64,
    pub errors_total: u64,
    pub avg_response_time_ms: f64,
    pub database_connections: u32,
    pub database_idle_connections: usize,
    pub database_max_connections: u32,
}

pub async fn health_check(app_state: web::Data<Arc<AppState>>) -> HttpResponse {
    let response = HealthResponse {
        status: "healthy".to_string(),
        timestamp: Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: app_state.metrics.uptime_seconds(),
    };

    HttpResponse::Ok().json(response)
}

pub async fn readiness_check(app_state: web::Data<Arc<AppState>>) -> HttpResponse {
    match sqlx::query("SELECT 1").fetch_one(&app_state.db_pool).await {
        Ok(_) => HttpResponse::Ok().json(serde_json::json!({
            "status": "ready",
            "database": "connected"
        })),
        Err(e) => {
            log::warn!("Readiness check failed: {}", e);
            HttpResponse::ServiceUnavailable().json(serde_json::json!({
                "status": "not ready",
                "database": "disconnected"
            }))
        }
    }
}

pub async fn metrics_endpoint(app_state: web::Data<Arc<AppState>>) -> HttpResponse {
    let metrics = &app_state.metrics;

    let response = MetricsResponse {
        requests_total: metrics.request_count.load(Ordering::Relaxed),
        errors_total: metrics.error_count.load(Ordering::Relaxed),
        avg_response_time_ms: metrics.avg_response_time_ms(),
        database_connections: app_state.db_pool.size(),
        database_idle_connections: app_state.db_pool.num_idle(),
        database_max_connections: app_state.config.database.max_connections,
    };

    HttpResponse::Ok().json(response)
}

/// Counts requests, error responses and latency into [`Metrics`]
pub struct RequestLogger {
    metrics: Arc<Metrics>,
}

impl RequestLogger {
    pub fn new(metrics: Arc<Metrics>) -> Self {
        Self { metrics }
    }
}

impl<S, B> actix_web::dev::Transform<S, actix_web::dev::ServiceRequest> for RequestLogger
where
    S: actix_web::dev::Service<
        actix_web::dev::ServiceRequest,
        Response = actix_web::dev::ServiceResponse<B>,
        Error = actix_web::Error,
    >,
    S::Future: 'static,
    B: 'static,
{
    type Response = actix_web::dev::ServiceResponse<B>;
    type Error = actix_web::Error;
    type InitError = ();
    type Transform = RequestLoggerMiddleware<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(RequestLoggerMiddleware {
            service,
            metrics: self.metrics.clone(),
        }))
    }
}

pub struct RequestLoggerMiddleware<S> {
    service: S,
    metrics: Arc<Metrics>,
}

impl<S, B> actix_web::dev::Service<actix_web::dev::ServiceRequest> for RequestLoggerMiddleware<S>
where
    S: actix_web::dev::Service<
        actix_web::dev::ServiceRequest,
        Response = actix_web::dev::ServiceResponse<B>,
        Error = actix_web::Error,
    >,
    S::Future: 'static,
    B: 'static,
{
    type Response = actix_web::dev::ServiceResponse<B>;
    type Error = actix_web::Error;
    type Future = std::pin::Pin<Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>>>>;

    fn poll_ready(&self, ctx: &mut std::task::Context<'_>) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: actix_web::dev::ServiceRequest) -> Self::Future {
        let start_time = Instant::now();
        let metrics = self.metrics.clone();
        let path = req.path().to_string();
        let fut = self.service.call(req);

        Box::pin(async move {
            metrics.increment_requests();
            let res = fut.await;
            let elapsed = start_time.elapsed().as_millis() as u64;
            metrics.record_response_time(elapsed);

            match &res {
                Ok(response) if response.status().is_server_error() => {
                    metrics.increment_errors();
                    log::warn!("{} answered {} in {}ms", path, response.status(), elapsed);
                }
                Ok(response) if response.status().is_client_error() => metrics.increment_errors(),
                Err(_) => metrics.increment_errors(),
                _ => {}
            }
            res
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use actix_web::{test as actix_test, App};

    #[test]
    fn test_response_time_window_is_bounded() {
        let metrics = Metrics::new();
        for i in 0..(RESPONSE_TIME_SAMPLES as u64 + 10) {
            metrics.record_response_time(i);
        }
        let times = metrics.response_times.lock().unwrap();
        assert_eq!(times.len(), RESPONSE_TIME_SAMPLES);
        assert_eq!(times.front().copied(), Some(10));
    }

    #[actix_rt::test]
    async fn test_middleware_counts_errors() {
        let state = Arc::new(AppState::for_tests(test_pool().await));
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(state.clone()))
                .wrap(RequestLogger::new(state.metrics.clone()))
                .configure(crate::configure_api)
        ).await;

        let req = actix_test::TestRequest::get().uri("/health/ready").to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert!(resp.status().is_success());

        let req = actix_test::TestRequest::post()
            .uri("/api/sales")
            .set_json(serde_json::json!({}))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert!(resp.status().is_client_error());

        assert_eq!(state.metrics.request_count.load(Ordering::Relaxed), 2);
        assert_eq!(state.metrics.error_count.load(Ordering::Relaxed), 1);

        let req = actix_test::TestRequest::get().uri("/health/metrics").to_request();
        let body: serde_json::Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["requests_total"], 3);
    }
}
