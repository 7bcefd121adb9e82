//! Aggregate usage and revenue statistics.

use serde::{Deserialize, Serialize};

use crate::api::{ApiResult, HttpContentBackend};
use crate::notify::{Notice, Notifier};
use crate::wire::{WireCount, WireNumber};

pub const DASHBOARD_PATH: &str = "/api/admin/admin/dashboard";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    #[serde(default)]
    pub top_section: TopSection,
    #[serde(default)]
    pub bottom_section: Vec<CountryStats>,
}

/// Platform-wide totals
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopSection {
    pub users_today: WireCount,
    pub total_users: WireCount,
    pub premium_users: WireCount,
    pub non_premium_users: WireCount,
    pub total_exercises: WireCount,
    pub total_meals: WireCount,
    pub registered_last_7_days: WireCount,
    pub registered_last_month: WireCount,
    pub active_subscriptions: WireCount,
    pub inactive_subscriptions: WireCount,
    pub total_income: WireNumber,
}

impl TopSection {
    /// Exercise blocks and meals together
    #[must_use]
    pub fn total_content(&self) -> u32 {
        self.total_exercises.get().saturating_add(self.total_meals.get())
    }
}

/// One row of the per-country table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CountryStats {
    pub country: String,
    pub total_users: WireCount,
    pub subscribers: WireCount,
    pub non_subscribers: WireCount,
    pub active_users: WireCount,
    pub inactive_users: WireCount,
    pub active_subscriptions: WireCount,
    pub inactive_subscriptions: WireCount,
    pub income: WireNumber,
}

pub async fn fetch_dashboard(backend: &HttpContentBackend) -> ApiResult<DashboardStats> {
    backend.get_json(DASHBOARD_PATH).await
}

/// Fetch for display: a failure is reported and yields `None`.
pub async fn load_dashboard(
    backend: &HttpContentBackend,
    notifier: &dyn Notifier,
) -> Option<DashboardStats> {
    match fetch_dashboard(backend).await {
        Ok(stats) => {
            tracing::debug!(countries = stats.bottom_section.len(), "dashboard loaded");
            Some(stats)
        }
        Err(error) => {
            tracing::warn!("Failed to fetch dashboard data: {error}");
            notifier.notify(Notice::error(format!("Failed to fetch dashboard data: {error}")));
            None
        }
    }
}
