//! API routes
//!
//! # Layout
//!
//! - [`health`] - liveness probe
//! - [`auth`] - staff login and admin registration
//! - [`orders`] - order creation, tracking, kitchen workflow, feedback
//! - [`menu`] - menu items and categories
//! - [`analytics`] - staff dashboard aggregates
//!
//! Role-gated routes carry `require_auth` + `require_role` as route layers,
//! so unknown paths still answer 404 rather than 401.

pub mod analytics;
pub mod auth;
pub mod health;
pub mod menu;
pub mod orders;

use axum::{
    Json, Router,
    extract::{FromRequest, Request},
    middleware,
};
use serde::de::DeserializeOwned;
use shared::error::AppError;
use shared::models::UserType;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::{require_auth, require_role};
use crate::state::AppState;

/// Kitchen staff (admins pass every gate)
pub(crate) const KITCHEN: &[UserType] = &[UserType::Kitchen];
/// Admin only
pub(crate) const ADMIN: &[UserType] = &[UserType::Admin];
/// Any authenticated staff member
pub(crate) const STAFF: &[UserType] = &[UserType::Kitchen, UserType::Admin];

/// Build the full application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(auth::router(&state))
        .merge(orders::router(&state))
        .merge(menu::router(&state))
        .merge(analytics::router(&state))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Wrap `routes` in the auth + role gate
pub(crate) fn gated(
    routes: Router<AppState>,
    state: &AppState,
    roles: &'static [UserType],
) -> Router<AppState> {
    routes
        .route_layer(middleware::from_fn(require_role(roles)))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
}

/// JSON body extractor answering malformed bodies with the API error shape
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(AppError::invalid_request(rejection.body_text())),
        }
    }
}
