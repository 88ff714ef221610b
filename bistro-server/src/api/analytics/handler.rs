//! Analytics API Handlers

use axum::{Json, extract::State};
use chrono::Utc;
use shared::error::AppResult;
use shared::models::{DashboardSummary, MenuPopularity, WeeklySales};

use crate::analytics;
use crate::error::ServiceError;
use crate::state::AppState;

/// GET /api/analytics - month-to-date dashboard counters
pub async fn summary(State(state): State<AppState>) -> AppResult<Json<DashboardSummary>> {
    let summary = analytics::dashboard_summary(state.analytics.as_ref(), Utc::now())
        .await
        .map_err(ServiceError::from)?;
    Ok(Json(summary))
}

/// GET /api/analytics/weekly-sales
pub async fn weekly_sales(State(state): State<AppState>) -> AppResult<Json<WeeklySales>> {
    let sales = analytics::weekly_sales(state.analytics.as_ref(), Utc::now())
        .await
        .map_err(ServiceError::from)?;
    Ok(Json(sales))
}

/// GET /api/analytics/menu-popularity
pub async fn menu_popularity(State(state): State<AppState>) -> AppResult<Json<MenuPopularity>> {
    let popularity = analytics::menu_popularity(state.analytics.as_ref())
        .await
        .map_err(ServiceError::from)?;
    Ok(Json(popularity))
}
