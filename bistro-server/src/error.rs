//! Unified service-layer error type
//!
//! `ServiceError` bridges store errors (`RepoError`, `BoxError`) and the API
//! error (`AppError`), so handlers and services can use `?` throughout.

use axum::response::IntoResponse;
use shared::error::{AppError, ErrorCode};

use crate::db::RepoError;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Service-layer error
///
/// - `Db`: store or infrastructure failure (logged, mapped to InternalError)
/// - `App`: client-facing error, passed through unchanged
#[derive(Debug)]
pub enum ServiceError {
    Db(BoxError),
    App(AppError),
}

impl From<RepoError> for ServiceError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::NotFound(msg) => ServiceError::App(AppError::not_found(msg)),
            RepoError::Duplicate(msg) => ServiceError::App(AppError::already_exists(msg)),
            RepoError::Validation(msg) => ServiceError::App(AppError::validation(msg)),
            RepoError::Conflict(_) | RepoError::Database(_) => ServiceError::Db(e.into()),
        }
    }
}

impl From<BoxError> for ServiceError {
    fn from(e: BoxError) -> Self {
        ServiceError::Db(e)
    }
}

impl From<AppError> for ServiceError {
    fn from(e: AppError) -> Self {
        ServiceError::App(e)
    }
}

impl From<ServiceError> for AppError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::App(app_err) => app_err,
            ServiceError::Db(db_err) => {
                tracing::error!(error = %db_err, "Service store error");
                AppError::new(ErrorCode::InternalError)
            }
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> axum::response::Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

/// Convenience type alias for service-layer results
pub type ServiceResult<T> = Result<T, ServiceError>;
