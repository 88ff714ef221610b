//! Authentication middleware
//!
//! `require_auth` validates `Authorization: Bearer <token>` and injects
//! [`CurrentUser`]; `require_role` gates on the caller's role. Admins pass
//! every role gate.

use std::future::Future;
use std::pin::Pin;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use shared::error::{AppError, ErrorCode};
use shared::models::UserType;

use super::{CurrentUser, JwtError, JwtService};
use crate::security_log;
use crate::state::AppState;

/// Require a valid access token
///
/// | Failure | Status |
/// |---------|--------|
/// | no Authorization header | 401 NotAuthenticated |
/// | expired token | 401 TokenExpired |
/// | bad token | 401 TokenInvalid |
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(header) = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
    else {
        security_log!("WARN", "auth_missing", uri = req.uri().to_string());
        return Err(AppError::not_authenticated());
    };

    let token = JwtService::extract_from_header(header)
        .ok_or_else(|| AppError::invalid_token("Invalid authorization header"))?;

    let user = state
        .jwt
        .validate_token(token)
        .and_then(CurrentUser::try_from)
        .map_err(|e| {
            security_log!(
                "WARN",
                "auth_failed",
                error = e.to_string(),
                uri = req.uri().to_string()
            );
            match e {
                JwtError::ExpiredToken => AppError::token_expired(),
                _ => AppError::invalid_token("Invalid token"),
            }
        })?;

    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

type MiddlewareFuture = Pin<Box<dyn Future<Output = Result<Response, AppError>> + Send>>;

/// Require one of `roles` (admins always pass)
///
/// Must run after [`require_auth`].
///
/// ```ignore
/// Router::new()
///     .route("/", get(handler::list))
///     .layer(middleware::from_fn(require_role(&[UserType::Kitchen])))
///     .layer(middleware::from_fn_with_state(state, require_auth));
/// ```
pub fn require_role(
    roles: &'static [UserType],
) -> impl Fn(Request, Next) -> MiddlewareFuture + Clone + Send + Sync + 'static {
    move |req: Request, next: Next| {
        Box::pin(async move {
            let user = req
                .extensions()
                .get::<CurrentUser>()
                .ok_or_else(AppError::not_authenticated)?;

            if !roles.iter().any(|role| user.role.satisfies(*role)) {
                security_log!(
                    "WARN",
                    "role_required",
                    user_id = user.id,
                    user_role = user.role.as_str(),
                    required = format!("{roles:?}")
                );
                return Err(AppError::with_message(
                    ErrorCode::RoleRequired,
                    "You do not have permission to perform this action.",
                ));
            }

            Ok(next.run(req).await)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_gate_matrix() {
        let kitchen_only: &[UserType] = &[UserType::Kitchen];
        let staff: &[UserType] = &[UserType::Kitchen, UserType::Admin];

        let passes =
            |role: UserType, roles: &[UserType]| roles.iter().any(|r| role.satisfies(*r));

        assert!(passes(UserType::Kitchen, kitchen_only));
        assert!(passes(UserType::Admin, kitchen_only));
        assert!(!passes(UserType::Customer, kitchen_only));
        assert!(passes(UserType::Kitchen, staff));
        assert!(!passes(UserType::Customer, staff));
    }
}
