// src/expiry_tracker.rs
//! Expiry-risk estimation: joins stock, catalog and trailing sales into a
//! per-batch depletion forecast, classifies each batch and ranks the result.

use chrono::NaiveDate;
use serde::Serialize;
use strum::Display;

use crate::error::{ApiError, ApiResult};
use crate::repositories::InventoryRepository;
use crate::sales_aggregator::{SalesAggregator, SalesWindow, TRAILING_WINDOW_DAYS};

// ==================== STATUS ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum RiskLevel {
    Expired,
    NoSalesData,
    Safe,
    Risk,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskStatus {
    Expired,
    NoSalesData,
    /// Whole days of shelf life left after projected sell-out
    Safe { buffer_days: i64 },
    /// Whole days the batch is projected to expire before selling out
    Risk { overdue_days: i64 },
}

impl RiskStatus {
    pub fn level(&self) -> RiskLevel {
        match self {
            RiskStatus::Expired => RiskLevel::Expired,
            RiskStatus::NoSalesData => RiskLevel::NoSalesData,
            RiskStatus::Safe { .. } => RiskLevel::Safe,
            RiskStatus::Risk { .. } => RiskLevel::Risk,
        }
    }

    pub fn label(&self) -> String {
        match self {
            RiskStatus::Expired => "Expired".to_string(),
            RiskStatus::NoSalesData => "No Sales Data".to_string(),
            RiskStatus::Safe { buffer_days } => format!("Safe ({} days buffer)", buffer_days),
            RiskStatus::Risk { overdue_days } => {
                format!("Risk: Will expire {} days before sold", overdue_days)
            }
        }
    }

    pub fn color(&self) -> &'static str {
        match self.level() {
            RiskLevel::Expired => "#dc3545",
            RiskLevel::NoSalesData => "#6c757d",
            RiskLevel::Safe => "#28a745",
            RiskLevel::Risk => "#dc3545",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self.level() {
            RiskLevel::Expired => "❌",
            RiskLevel::NoSalesData => "📊",
            RiskLevel::Safe => "✅",
            RiskLevel::Risk => "⚠️",
        }
    }
}

// ==================== FORECAST ====================

/// Unrounded depletion forecast for one batch. `None` stands for an infinite
/// sell-out horizon (no sales in the window).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepletionForecast {
    pub remaining_days: i64,
    pub avg_daily_sales: f64,
    pub days_to_sell: Option<f64>,
    pub tracking_result: Option<f64>,
}

impl DepletionForecast {
    pub fn compute(
        quantity: i64,
        expiry_date: NaiveDate,
        total_sold: i64,
        window: SalesWindow,
    ) -> Self {
        let remaining_days = (expiry_date - window.as_of()).num_days();

        // Averaged over the whole window, not only the days that had sales
        let avg_daily_sales = if total_sold > 0 && window.days() > 0 {
            total_sold as f64 / window.days() as f64
        } else {
            0.0
        };

        let days_to_sell = if avg_daily_sales > 0.0 {
            Some(quantity as f64 / avg_daily_sales)
        } else {
            None
        };

        let tracking_result = days_to_sell.map(|d| remaining_days as f64 - d);

        Self {
            remaining_days,
            avg_daily_sales,
            days_to_sell,
            tracking_result,
        }
    }

    /// First match wins: expiry before sales velocity, velocity before margin.
    pub fn classify(&self) -> RiskStatus {
        if self.remaining_days < 0 {
            return RiskStatus::Expired;
        }

        if self.avg_daily_sales == 0.0 {
            return RiskStatus::NoSalesData;
        }

        match self.tracking_result {
            Some(t) if t > 0.0 => RiskStatus::Safe { buffer_days: t.floor() as i64 },
            Some(t) => RiskStatus::Risk { overdue_days: t.abs().floor() as i64 },
            None => RiskStatus::NoSalesData,
        }
    }

    /// Infinite horizon ranks as negative infinity
    pub fn rank_key(&self) -> f64 {
        self.tracking_result.unwrap_or(f64::NEG_INFINITY)
    }
}

// ==================== REPORT ROW ====================

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RiskReportRow {
    pub expiry_id: i64,
    pub med_id: i64,
    pub med_name: String,
    pub brand: String,
    #[serde(rename = "type")]
    pub med_type: String,
    pub quantity: i64,
    pub expiry_date: NaiveDate,
    pub remaining_days: i64,
    pub total_sold_30d: i64,
    pub avg_daily_sales: f64,
    pub days_to_sell: Option<f64>,
    pub tracking_result: Option<f64>,
    pub status: String,
    pub status_color: &'static str,
    pub status_icon: &'static str,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Sorts ascending by rank key. `sort_by` is stable, so ties keep input order.
pub fn rank_rows<T>(rows: &mut [(DepletionForecast, T)]) {
    rows.sort_by(|a, b| a.0.rank_key().total_cmp(&b.0.rank_key()));
}

/// Builds the ranked expiry-risk report as of `as_of`.
///
/// Batches without a catalog entry are skipped. Any store failure aborts the
/// whole run with `DataUnavailable`; no partial report is produced.
#[tracing::instrument(skip(repo))]
pub async fn build_expiry_report(
    repo: &dyn InventoryRepository,
    as_of: NaiveDate,
) -> ApiResult<Vec<RiskReportRow>> {
    let stock = repo.stock_with_catalog().await.map_err(|e| {
        log::error!("Failed to load stock for expiry report: {}", e);
        ApiError::data_unavailable(e)
    })?;

    let window = SalesWindow::trailing(as_of, TRAILING_WINDOW_DAYS);
    let aggregator = SalesAggregator::new(repo, window);

    let mut ranked = Vec::with_capacity(stock.len());
    for entry in stock {
        let medicine = match entry.medicine {
            Some(medicine) => medicine,
            None => {
                log::warn!(
                    "Skipping orphaned stock batch {} (med_id {} not in catalog)",
                    entry.batch.expiry_id, entry.batch.med_id
                );
                continue;
            }
        };

        let batch = entry.batch;
        let total_sold = aggregator.total_sold(batch.expiry_id).await?;
        let forecast = DepletionForecast::compute(batch.quantity, batch.expiry_date, total_sold, window);
        let status = forecast.classify();
        log::debug!("Batch {} classified as {}", batch.expiry_id, status.level());

        let row = RiskReportRow {
            expiry_id: batch.expiry_id,
            med_id: medicine.med_id,
            med_name: batch.med_name,
            brand: medicine.brand,
            med_type: medicine.med_type,
            quantity: batch.quantity,
            expiry_date: batch.expiry_date,
            remaining_days: forecast.remaining_days,
            total_sold_30d: total_sold,
            avg_daily_sales: round2(forecast.avg_daily_sales),
            days_to_sell: forecast.days_to_sell.map(round2),
            tracking_result: forecast.tracking_result.map(round2),
            status: status.label(),
            status_color: status.color(),
            status_icon: status.icon(),
        };
        ranked.push((forecast, row));
    }

    rank_rows(&mut ranked);

    log::info!("Expiry report as of {}: {} batches ranked", as_of, ranked.len());
    Ok(ranked.into_iter().map(|(_, row)| row).collect())
}
