//! Menu API
//!
//! Reads are public; writes need the kitchen role; menu analytics is
//! admin-only.

mod handler;

use axum::{Router, routing::get};

use super::{ADMIN, KITCHEN, gated};
use crate::state::AppState;

pub fn router(state: &AppState) -> Router<AppState> {
    let read_routes = Router::new()
        .route("/api/menu/items", get(handler::list_items))
        .route("/api/menu/items/{id}", get(handler::get_item))
        .route("/api/menu/categories", get(handler::list_categories))
        .route("/api/menu/categories/{id}", get(handler::get_category));

    let manage_routes = Router::new()
        .route("/api/menu/items", axum::routing::post(handler::create_item))
        .route(
            "/api/menu/items/{id}",
            axum::routing::put(handler::replace_item)
                .patch(handler::patch_item)
                .delete(handler::delete_item),
        )
        .route(
            "/api/menu/categories",
            axum::routing::post(handler::create_category),
        )
        .route(
            "/api/menu/categories/{id}",
            axum::routing::put(handler::update_category).delete(handler::delete_category),
        );

    let admin_routes = Router::new().route("/api/menu/analytics", get(handler::analytics));

    read_routes
        .merge(gated(manage_routes, state, KITCHEN))
        .merge(gated(admin_routes, state, ADMIN))
}
