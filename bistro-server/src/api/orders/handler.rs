//! Order API Handlers

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use shared::error::{AppError, AppResult};
use shared::models::{
    AverageRating, FeedbackSubmit, FeedbackSubmitted, Order, OrderCreate, OrderCreated,
    OrderPatch, OrderReplace, StatusUpdate, StatusUpdated,
};

use crate::api::ApiJson;
use crate::error::ServiceError;
use crate::orders::{
    changes_from_patch, changes_from_replace, parse_order_number, parse_star_rating,
};
use crate::state::AppState;

/// POST /api/orders/create - place an order
pub async fn create(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<OrderCreate>,
) -> AppResult<(StatusCode, Json<OrderCreated>)> {
    let order = state.orders.create_order(&payload.items).await?;
    Ok((
        StatusCode::CREATED,
        Json(OrderCreated {
            order_number: order.order_number,
            total_price: order.total_price,
        }),
    ))
}

/// GET /api/orders/get-order/{order_number}
pub async fn get_by_number(
    State(state): State<AppState>,
    Path(order_number): Path<String>,
) -> AppResult<Json<Order>> {
    let number = parse_order_number(&order_number)?;
    Ok(Json(state.orders.get_order(number).await?))
}

/// GET /api/orders - most recent first
pub async fn list(State(state): State<AppState>) -> AppResult<Json<Vec<Order>>> {
    Ok(Json(state.orders.list_orders().await?))
}

/// PATCH /api/orders/update-status/{order_number}
pub async fn update_status(
    State(state): State<AppState>,
    Path(order_number): Path<String>,
    ApiJson(payload): ApiJson<StatusUpdate>,
) -> AppResult<Json<StatusUpdated>> {
    let number = parse_order_number(&order_number)?;
    let order = state
        .orders
        .update_status(number, payload.status.as_deref())
        .await?;
    Ok(Json(StatusUpdated {
        order_number: order.order_number,
        status: order.status,
    }))
}

/// POST /api/orders/feedback
pub async fn submit_feedback(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<FeedbackSubmit>,
) -> AppResult<Json<FeedbackSubmitted>> {
    let raw_number = payload
        .order_number
        .as_deref()
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| AppError::required("order_number"))?;
    let raw_rating = payload
        .star_rating
        .ok_or_else(|| AppError::required("star_rating"))?;

    // rating is checked before the order is looked up
    let star_rating = parse_star_rating(raw_rating)?;
    let number = parse_order_number(raw_number.trim())?;

    let order = state
        .orders
        .submit_feedback(number, raw_rating, payload.feedback)
        .await?;
    Ok(Json(FeedbackSubmitted {
        order_number: order.order_number,
        star_rating: order.star_rating.unwrap_or(star_rating),
        feedback: order.feedback,
    }))
}

/// GET /api/orders/average-rating
pub async fn average_rating(State(state): State<AppState>) -> AppResult<Json<AverageRating>> {
    let average_rating = state
        .analytics
        .average_rating()
        .await
        .map_err(ServiceError::from)?;
    Ok(Json(AverageRating { average_rating }))
}

/// PUT /api/orders/put/{order_number} - replace the mutable fields
pub async fn replace(
    State(state): State<AppState>,
    Path(order_number): Path<String>,
    ApiJson(payload): ApiJson<OrderReplace>,
) -> AppResult<Json<Order>> {
    let changes = changes_from_replace(payload)?;
    let number = parse_order_number(&order_number)?;
    Ok(Json(state.orders.update_order(number, &changes).await?))
}

/// PATCH /api/orders/patch/{order_number} - update the supplied fields
pub async fn patch(
    State(state): State<AppState>,
    Path(order_number): Path<String>,
    ApiJson(payload): ApiJson<OrderPatch>,
) -> AppResult<Json<Order>> {
    let changes = changes_from_patch(payload)?;
    let number = parse_order_number(&order_number)?;
    Ok(Json(state.orders.update_order(number, &changes).await?))
}

/// DELETE /api/orders/delete/{order_number}
pub async fn delete(
    State(state): State<AppState>,
    Path(order_number): Path<String>,
) -> AppResult<StatusCode> {
    let number = parse_order_number(&order_number)?;
    state.orders.delete_order(number).await?;
    Ok(StatusCode::NO_CONTENT)
}
