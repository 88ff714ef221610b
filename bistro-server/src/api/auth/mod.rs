//! Auth API
//!
//! | Path | Method | Role |
//! |------|--------|------|
//! | /api/auth/login | POST | public |
//! | /api/auth/register | POST | admin |

mod handler;

use axum::{Router, routing::post};

use super::{ADMIN, gated};
use crate::state::AppState;

pub fn router(state: &AppState) -> Router<AppState> {
    let public_routes = Router::new().route("/api/auth/login", post(handler::login));
    let admin_routes = Router::new().route("/api/auth/register", post(handler::register));

    public_routes.merge(gated(admin_routes, state, ADMIN))
}
