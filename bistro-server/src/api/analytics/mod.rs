//! Analytics API (any authenticated staff)

mod handler;

use axum::{Router, routing::get};

use super::{STAFF, gated};
use crate::state::AppState;

pub fn router(state: &AppState) -> Router<AppState> {
    let routes = Router::new()
        .route("/api/analytics", get(handler::summary))
        .route("/api/analytics/weekly-sales", get(handler::weekly_sales))
        .route("/api/analytics/menu-popularity", get(handler::menu_popularity));

    gated(routes, state, STAFF)
}
