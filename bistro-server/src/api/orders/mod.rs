//! Order API
//!
//! | Path | Method | Role |
//! |------|--------|------|
//! | /api/orders/create | POST | public |
//! | /api/orders/get-order/{order_number} | GET | public |
//! | /api/orders/feedback | POST | public |
//! | /api/orders/average-rating | GET | public |
//! | /api/orders/update-status/{order_number} | PATCH | kitchen |
//! | /api/orders | GET | kitchen |
//! | /api/orders/put/{order_number} | PUT | kitchen |
//! | /api/orders/patch/{order_number} | PATCH | kitchen |
//! | /api/orders/delete/{order_number} | DELETE | admin |

mod handler;

use axum::{
    Router,
    routing::{delete, get, patch, post, put},
};

use super::{ADMIN, KITCHEN, gated};
use crate::state::AppState;

pub fn router(state: &AppState) -> Router<AppState> {
    let public_routes = Router::new()
        .route("/api/orders/create", post(handler::create))
        .route("/api/orders/get-order/{order_number}", get(handler::get_by_number))
        .route("/api/orders/feedback", post(handler::submit_feedback))
        .route("/api/orders/average-rating", get(handler::average_rating));

    let kitchen_routes = Router::new()
        .route("/api/orders", get(handler::list))
        .route(
            "/api/orders/update-status/{order_number}",
            patch(handler::update_status),
        )
        .route("/api/orders/put/{order_number}", put(handler::replace))
        .route("/api/orders/patch/{order_number}", patch(handler::patch));

    let admin_routes =
        Router::new().route("/api/orders/delete/{order_number}", delete(handler::delete));

    public_routes
        .merge(gated(kitchen_routes, state, KITCHEN))
        .merge(gated(admin_routes, state, ADMIN))
}
