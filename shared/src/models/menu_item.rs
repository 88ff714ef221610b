//! Menu Item Model

use super::serde_helpers::{bool_true, double_option};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Category summary embedded in a menu item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRef {
    pub id: i64,
    pub name: String,
}

/// Menu item entity
///
/// `order_count` and `cancelled_order_count` are maintained by the order
/// creation path and are never written through the menu API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: i64,
    pub name: String,
    /// Unit price, two decimal places, serialized as a string
    pub price: Decimal,
    pub is_available: bool,
    pub category: CategoryRef,
    pub description: Option<String>,
    pub image: Option<String>,
    pub order_count: i64,
    pub cancelled_order_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create (or full replace) menu item payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuItemCreate {
    pub name: Option<String>,
    pub price: Option<Decimal>,
    #[serde(default = "default_available", deserialize_with = "bool_true")]
    pub is_available: bool,
    pub category_id: Option<i64>,
    pub description: Option<String>,
    pub image: Option<String>,
}

fn default_available() -> bool {
    true
}

/// Partial update menu item payload
///
/// `description` and `image` accept an explicit `null` to clear the value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MenuItemUpdate {
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub is_available: Option<bool>,
    pub category_id: Option<i64>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub image: Option<Option<String>>,
}

/// Validated menu item fields ready for storage
#[derive(Debug, Clone, PartialEq)]
pub struct MenuItemDraft {
    pub name: String,
    pub price: Decimal,
    pub is_available: bool,
    pub category_id: i64,
    pub description: Option<String>,
    pub image: Option<String>,
}

impl MenuItemDraft {
    /// Start from an existing item so a partial update can be applied on top
    pub fn from_item(item: &MenuItem) -> Self {
        Self {
            name: item.name.clone(),
            price: item.price,
            is_available: item.is_available,
            category_id: item.category.id,
            description: item.description.clone(),
            image: item.image.clone(),
        }
    }

    /// Overlay the supplied fields of a partial update
    pub fn apply(&mut self, update: MenuItemUpdate) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(price) = update.price {
            self.price = price;
        }
        if let Some(is_available) = update.is_available {
            self.is_available = is_available;
        }
        if let Some(category_id) = update.category_id {
            self.category_id = category_id;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(image) = update.image {
            self.image = image;
        }
    }
}
