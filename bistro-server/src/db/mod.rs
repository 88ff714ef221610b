//! Store layer
//!
//! The service talks to persistence through the traits below. Two backends
//! implement them:
//!
//! - [`PgStore`]: PostgreSQL via sqlx (production)
//! - [`MemoryStore`]: a single mutex over in-process tables (development, tests)

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use shared::models::{
    Category, MenuItem, MenuItemDraft, NewUser, Order, OrderChanges, OrderItems, OrderNumber,
    OrderStatus, TopItem, User,
};
use thiserror::Error;

/// Store error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    /// Concurrent writers collided; the unit of work may be retried
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            match db_err.code().as_deref() {
                // unique_violation
                Some("23505") => return RepoError::Duplicate(db_err.message().to_string()),
                // serialization_failure, deadlock_detected
                Some("40001") | Some("40P01") => {
                    return RepoError::Conflict(db_err.message().to_string());
                }
                // foreign_key_violation
                Some("23503") => return RepoError::Validation(db_err.message().to_string()),
                _ => {}
            }
        }
        RepoError::Database(err.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for RepoError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        RepoError::Database(err.to_string())
    }
}

/// Result type for store operations
pub type RepoResult<T> = Result<T, RepoError>;

/// A fully priced order waiting for a number
///
/// `increments` holds `(item_id, occurrences)` for every resolved item; the
/// store adds each count to the item's `order_count` in the same unit of work
/// that allocates the number and inserts the row.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub total_price: Decimal,
    pub items: OrderItems,
    pub increments: Vec<(i64, i64)>,
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn list_categories(&self) -> RepoResult<Vec<Category>>;
    async fn find_category(&self, id: i64) -> RepoResult<Option<Category>>;
    async fn create_category(&self, name: &str) -> RepoResult<Category>;
    async fn update_category(&self, id: i64, name: &str) -> RepoResult<Option<Category>>;
    /// Deletes the category and every item in it
    async fn delete_category(&self, id: i64) -> RepoResult<bool>;

    async fn list_items(&self) -> RepoResult<Vec<MenuItem>>;
    async fn find_item(&self, id: i64) -> RepoResult<Option<MenuItem>>;
    /// Load every item whose id is in `ids` in one read; unknown ids are skipped
    async fn find_items_by_ids(&self, ids: &[i64]) -> RepoResult<Vec<MenuItem>>;
    async fn create_item(&self, draft: &MenuItemDraft) -> RepoResult<MenuItem>;
    async fn update_item(&self, id: i64, draft: &MenuItemDraft) -> RepoResult<Option<MenuItem>>;
    async fn delete_item(&self, id: i64) -> RepoResult<bool>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Allocate the next order number, insert the order and apply the counter
    /// increments as one all-or-nothing unit of work.
    ///
    /// Returns [`RepoError::Conflict`] or [`RepoError::Duplicate`] when a
    /// concurrent creator won the race; nothing is written in that case.
    async fn insert_order(&self, order: NewOrder) -> RepoResult<Order>;
    async fn find_order(&self, number: OrderNumber) -> RepoResult<Option<Order>>;
    /// All orders, most recent first
    async fn list_orders(&self) -> RepoResult<Vec<Order>>;
    async fn update_order(
        &self,
        number: OrderNumber,
        changes: &OrderChanges,
    ) -> RepoResult<Option<Order>>;
    async fn delete_order(&self, number: OrderNumber) -> RepoResult<bool>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>>;
    /// Fails with [`RepoError::Duplicate`] when the email is taken
    async fn create_user(&self, user: NewUser) -> RepoResult<User>;
}

#[async_trait]
pub trait AnalyticsStore: Send + Sync {
    async fn count_orders_since(&self, since: DateTime<Utc>) -> RepoResult<i64>;
    async fn count_orders_with_status(&self, status: OrderStatus) -> RepoResult<i64>;
    async fn count_menu_items(&self) -> RepoResult<i64>;
    /// Creation times of orders created at or after `since`
    async fn order_times_since(&self, since: DateTime<Utc>) -> RepoResult<Vec<DateTime<Utc>>>;
    /// Mean star rating over rated orders, `None` when nothing is rated
    async fn average_rating(&self) -> RepoResult<Option<f64>>;
    /// Sum of `order_count` over all items
    async fn total_items_ordered(&self) -> RepoResult<i64>;
    /// Items ranked by `order_count` descending, ties by id
    async fn top_items(&self, limit: i64) -> RepoResult<Vec<TopItem>>;
    /// Most ordered item among items created at or after `since` (all when `None`)
    async fn most_purchased_item(
        &self,
        since: Option<DateTime<Utc>>,
    ) -> RepoResult<Option<MenuItem>>;
    /// Sum of `cancelled_order_count` over items created at or after `since`
    async fn total_cancelled_orders(&self, since: Option<DateTime<Utc>>) -> RepoResult<i64>;
}

/// Everything the server needs from a backend
pub trait Store: CatalogStore + OrderStore + UserStore + AnalyticsStore {}

impl<T> Store for T where T: CatalogStore + OrderStore + UserStore + AnalyticsStore {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_error_display() {
        let err = RepoError::Conflict("order_sequence".to_string());
        assert_eq!(err.to_string(), "Conflict: order_sequence");
    }

    #[test]
    fn test_non_database_sqlx_error_maps_to_database() {
        let err: RepoError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, RepoError::Database(_)));
    }
}
