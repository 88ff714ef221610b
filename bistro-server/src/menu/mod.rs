//! Menu payload validation
//!
//! Turns create/update payloads into [`MenuItemDraft`]s. Counters are never
//! part of a draft, so the menu API cannot write them.

use rust_decimal::Decimal;
use shared::error::{AppError, ErrorCode};
use shared::models::{MenuItemCreate, MenuItemDraft};

pub const CATEGORY_NAME_MAX: usize = 100;
pub const ITEM_NAME_MAX: usize = 200;

/// Upper bound (exclusive) of a menu price: NUMERIC(6, 2)
const PRICE_LIMIT: i64 = 10_000;
const PRICE_SCALE: u32 = 2;

fn validate_name(raw: Option<&str>, field: &str, max: usize) -> Result<String, AppError> {
    let name = raw.map(str::trim).unwrap_or_default();
    if name.is_empty() {
        return Err(AppError::required(field));
    }
    if name.chars().count() > max {
        return Err(AppError::validation(format!(
            "Ensure {field} has no more than {max} characters."
        ))
        .with_detail("field", field));
    }
    Ok(name.to_string())
}

pub fn validate_category_name(raw: Option<&str>) -> Result<String, AppError> {
    validate_name(raw, "name", CATEGORY_NAME_MAX)
}

/// Prices are non-negative, below 10000 and carry at most two decimals
pub fn validate_price(price: Decimal) -> Result<Decimal, AppError> {
    let price = price.normalize();
    if price.is_sign_negative() || price >= Decimal::from(PRICE_LIMIT) {
        return Err(AppError::with_message(
            ErrorCode::MenuItemInvalidPrice,
            "Price must be between 0 and 9999.99",
        )
        .with_detail("price", price.to_string()));
    }
    if price.scale() > PRICE_SCALE {
        return Err(AppError::with_message(
            ErrorCode::MenuItemInvalidPrice,
            "Price must have at most 2 decimal places",
        )
        .with_detail("price", price.to_string()));
    }
    let mut price = price;
    price.rescale(PRICE_SCALE);
    Ok(price)
}

/// Check every field of a draft, normalizing name and price
pub fn validate_draft(mut draft: MenuItemDraft) -> Result<MenuItemDraft, AppError> {
    draft.name = validate_name(Some(&draft.name), "name", ITEM_NAME_MAX)?;
    draft.price = validate_price(draft.price)?;
    Ok(draft)
}

/// Build a draft from a create / full-replace payload
pub fn draft_from_create(payload: MenuItemCreate) -> Result<MenuItemDraft, AppError> {
    let name = validate_name(payload.name.as_deref(), "name", ITEM_NAME_MAX)?;
    let price = payload.price.ok_or_else(|| AppError::required("price"))?;
    let category_id = payload
        .category_id
        .ok_or_else(|| AppError::required("category_id"))?;

    validate_draft(MenuItemDraft {
        name,
        price,
        is_available: payload.is_available,
        category_id,
        description: payload.description,
        image: payload.image,
    })
}
