//! Menu API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use serde::Deserialize;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{
    Category, CategoryCreate, CategoryUpdate, MenuAnalytics, MenuItem, MenuItemCreate,
    MenuItemDraft, MenuItemUpdate,
};

use crate::analytics::{Period, menu_analytics};
use crate::api::ApiJson;
use crate::error::ServiceError;
use crate::menu::{draft_from_create, validate_category_name, validate_draft};
use crate::state::AppState;

/// Non-numeric ids cannot name a row
fn parse_id(raw: &str, code: ErrorCode) -> Result<i64, AppError> {
    raw.parse()
        .map_err(|_| AppError::new(code).with_detail("id", raw))
}

fn item_not_found(id: i64) -> AppError {
    AppError::new(ErrorCode::MenuItemNotFound).with_detail("id", id)
}

fn category_not_found(id: i64) -> AppError {
    AppError::new(ErrorCode::CategoryNotFound).with_detail("id", id)
}

async fn ensure_category(state: &AppState, id: i64) -> AppResult<()> {
    let found = state
        .catalog
        .find_category(id)
        .await
        .map_err(ServiceError::from)?;
    match found {
        Some(_) => Ok(()),
        None => Err(AppError::validation(format!("Invalid category_id \"{id}\""))
            .with_detail("field", "category_id")),
    }
}

// ==================== Items ====================

/// GET /api/menu/items
pub async fn list_items(State(state): State<AppState>) -> AppResult<Json<Vec<MenuItem>>> {
    let items = state.catalog.list_items().await.map_err(ServiceError::from)?;
    Ok(Json(items))
}

/// GET /api/menu/items/{id}
pub async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<MenuItem>> {
    let id = parse_id(&id, ErrorCode::MenuItemNotFound)?;
    let item = state
        .catalog
        .find_item(id)
        .await
        .map_err(ServiceError::from)?
        .ok_or_else(|| item_not_found(id))?;
    Ok(Json(item))
}

/// POST /api/menu/items
pub async fn create_item(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<MenuItemCreate>,
) -> AppResult<(StatusCode, Json<MenuItem>)> {
    let draft = draft_from_create(payload)?;
    ensure_category(&state, draft.category_id).await?;

    let item = state
        .catalog
        .create_item(&draft)
        .await
        .map_err(ServiceError::from)?;
    tracing::info!(item_id = item.id, name = %item.name, "Menu item created");
    Ok((StatusCode::CREATED, Json(item)))
}

/// PUT /api/menu/items/{id} - full replace
pub async fn replace_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<MenuItemCreate>,
) -> AppResult<Json<MenuItem>> {
    let id = parse_id(&id, ErrorCode::MenuItemNotFound)?;
    let draft = draft_from_create(payload)?;
    save_item(&state, id, draft).await.map(Json)
}

/// PATCH /api/menu/items/{id} - partial update
pub async fn patch_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<MenuItemUpdate>,
) -> AppResult<Json<MenuItem>> {
    let id = parse_id(&id, ErrorCode::MenuItemNotFound)?;
    let current = state
        .catalog
        .find_item(id)
        .await
        .map_err(ServiceError::from)?
        .ok_or_else(|| item_not_found(id))?;

    let mut draft = MenuItemDraft::from_item(&current);
    draft.apply(payload);
    let draft = validate_draft(draft)?;
    save_item(&state, id, draft).await.map(Json)
}

async fn save_item(state: &AppState, id: i64, draft: MenuItemDraft) -> AppResult<MenuItem> {
    ensure_category(state, draft.category_id).await?;
    let item = state
        .catalog
        .update_item(id, &draft)
        .await
        .map_err(ServiceError::from)?
        .ok_or_else(|| item_not_found(id))?;
    tracing::info!(item_id = item.id, "Menu item updated");
    Ok(item)
}

/// DELETE /api/menu/items/{id}
pub async fn delete_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    let id = parse_id(&id, ErrorCode::MenuItemNotFound)?;
    let deleted = state
        .catalog
        .delete_item(id)
        .await
        .map_err(ServiceError::from)?;
    if !deleted {
        return Err(item_not_found(id));
    }
    tracing::info!(item_id = id, "Menu item deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ==================== Categories ====================

/// GET /api/menu/categories
pub async fn list_categories(State(state): State<AppState>) -> AppResult<Json<Vec<Category>>> {
    let categories = state
        .catalog
        .list_categories()
        .await
        .map_err(ServiceError::from)?;
    Ok(Json(categories))
}

/// GET /api/menu/categories/{id}
pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Category>> {
    let id = parse_id(&id, ErrorCode::CategoryNotFound)?;
    let category = state
        .catalog
        .find_category(id)
        .await
        .map_err(ServiceError::from)?
        .ok_or_else(|| category_not_found(id))?;
    Ok(Json(category))
}

/// POST /api/menu/categories
pub async fn create_category(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CategoryCreate>,
) -> AppResult<(StatusCode, Json<Category>)> {
    let name = validate_category_name(payload.name.as_deref())?;
    let category = state
        .catalog
        .create_category(&name)
        .await
        .map_err(ServiceError::from)?;
    tracing::info!(category_id = category.id, name = %category.name, "Category created");
    Ok((StatusCode::CREATED, Json(category)))
}

/// PUT /api/menu/categories/{id}
pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<CategoryUpdate>,
) -> AppResult<Json<Category>> {
    let id = parse_id(&id, ErrorCode::CategoryNotFound)?;
    let name = validate_category_name(payload.name.as_deref())?;
    let category = state
        .catalog
        .update_category(id, &name)
        .await
        .map_err(ServiceError::from)?
        .ok_or_else(|| category_not_found(id))?;
    Ok(Json(category))
}

/// DELETE /api/menu/categories/{id} - cascades to the category's items
pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    let id = parse_id(&id, ErrorCode::CategoryNotFound)?;
    let deleted = state
        .catalog
        .delete_category(id)
        .await
        .map_err(ServiceError::from)?;
    if !deleted {
        return Err(category_not_found(id));
    }
    tracing::info!(category_id = id, "Category deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ==================== Analytics ====================

#[derive(Debug, Deserialize)]
pub struct AnalyticsQuery {
    pub period: Option<String>,
}

/// GET /api/menu/analytics?period=day|week|month
pub async fn analytics(
    State(state): State<AppState>,
    Query(query): Query<AnalyticsQuery>,
) -> AppResult<Json<MenuAnalytics>> {
    let period = Period::parse(query.period.as_deref());
    let report = menu_analytics(state.analytics.as_ref(), period, Utc::now())
        .await
        .map_err(ServiceError::from)?;
    Ok(Json(report))
}
