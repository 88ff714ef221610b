//! Auth API Handlers

use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
};
use shared::error::AppResult;
use shared::models::{LoginRequest, LoginResponse, RegisterRequest, User};

use crate::api::ApiJson;
use crate::auth::CurrentUser;
use crate::state::AppState;

/// POST /api/auth/login - staff login
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let response = state
        .users
        .login(req.email.as_deref(), req.password.as_deref())
        .await?;
    Ok(Json(response))
}

/// POST /api/auth/register - admin creates an account
pub async fn register(
    State(state): State<AppState>,
    Extension(admin): Extension<CurrentUser>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<User>)> {
    let user = state.users.register(req).await?;
    tracing::info!(admin_id = admin.id, user_id = user.id, "Account registered by admin");
    Ok((StatusCode::CREATED, Json(user)))
}
