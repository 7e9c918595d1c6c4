// src/sales_aggregator.rs
//! Trailing-window sales totals per stock batch

use chrono::{Duration, NaiveDate};
use crate::error::{ApiError, ApiResult};
use crate::repositories::InventoryRepository;

/// Lookback used to estimate sales velocity
pub const TRAILING_WINDOW_DAYS: i64 = 30;

/// `[as_of - days, as_of]`, both ends inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SalesWindow {
    as_of: NaiveDate,
    days: i64,
}

impl SalesWindow {
    pub fn trailing(as_of: NaiveDate, days: i64) -> Self {
        Self { as_of, days: days.max(0) }
    }

    pub fn as_of(&self) -> NaiveDate {
        self.as_of
    }

    pub fn days(&self) -> i64 {
        self.days
    }

    pub fn start(&self) -> NaiveDate {
        self.as_of - Duration::days(self.days)
    }

    #[cfg(test)]
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start() && date <= self.as_of
    }
}

/// Sums sold quantities over one fixed window. Every batch of a report run is
/// evaluated against the same window.
pub struct SalesAggregator<'a> {
    repo: &'a dyn InventoryRepository,
    window: SalesWindow,
}

impl<'a> SalesAggregator<'a> {
    pub fn new(repo: &'a dyn InventoryRepository, window: SalesWindow) -> Self {
        Self { repo, window }
    }

    pub async fn total_sold(&self, expiry_id: i64) -> ApiResult<i64> {
        let total = self.repo
            .units_sold_between(expiry_id, self.window.start(), self.window.as_of())
            .await
            .map_err(|e| {
                log::error!("Sales aggregation failed for batch {}: {}", expiry_id, e);
                ApiError::data_unavailable(e)
            })?;

        Ok(total.max(0))
    }
}
