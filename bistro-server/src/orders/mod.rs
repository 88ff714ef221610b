//! Order numbering, creation and lifecycle updates
//!
//! # Creation
//!
//! ```text
//! item ids ──▶ price (one catalog read) ──▶ NewOrder ──▶ OrderStore::insert_order
//!                                                         │  allocate ORD-<n>
//!                                                         │  insert order row
//!                                                         │  order_count += k
//!                                                         ▼  commit (all or nothing)
//! ```
//!
//! A conflict reported by the store means nothing was written, so the whole
//! unit is retried with exponential backoff. Each successful call commits
//! exactly once; a caller repeating a request may still create a second order.

mod pricing;

pub use pricing::{PricedOrder, price_order};

use std::sync::Arc;

use shared::error::{AppError, ErrorCode};
use shared::models::{Order, OrderChanges, OrderNumber, OrderPatch, OrderReplace, OrderStatus};

use crate::config::{OrderConfig, UnknownItemPolicy};
use crate::db::{CatalogStore, OrderStore, RepoError};
use crate::error::{ServiceError, ServiceResult};

/// Most items one order may carry
///
/// At the highest menu price the total still fits `NUMERIC(10, 2)`.
pub const MAX_ORDER_ITEMS: usize = 1_000;

/// Parse a path segment into an order number
///
/// A malformed number cannot name an existing order, so it is reported as
/// not found.
pub fn parse_order_number(raw: &str) -> Result<OrderNumber, AppError> {
    raw.parse()
        .map_err(|_| AppError::new(ErrorCode::OrderNotFound).with_detail("order_number", raw))
}

/// Validate a status string
pub fn parse_status(raw: Option<&str>) -> Result<OrderStatus, AppError> {
    let raw = raw.ok_or_else(invalid_status)?;
    raw.parse().map_err(|_| invalid_status())
}

fn invalid_status() -> AppError {
    AppError::with_message(
        ErrorCode::InvalidOrderStatus,
        "Invalid status. Must be either 'in_progress' or 'completed'",
    )
}

/// Validate a star rating, which must lie in `1..=5`
pub fn parse_star_rating(raw: i64) -> Result<i16, AppError> {
    if (1..=5).contains(&raw) {
        Ok(raw as i16)
    } else {
        Err(AppError::new(ErrorCode::InvalidStarRating).with_detail("star_rating", raw))
    }
}

/// Full replacement (PUT): status is required, omitted optionals are cleared
pub fn changes_from_replace(body: OrderReplace) -> Result<OrderChanges, AppError> {
    Ok(OrderChanges {
        status: Some(parse_status(body.status.as_deref())?),
        star_rating: Some(body.star_rating.map(parse_star_rating).transpose()?),
        feedback: Some(body.feedback),
    })
}

/// Partial update (PATCH): only supplied fields change, `null` clears
pub fn changes_from_patch(body: OrderPatch) -> Result<OrderChanges, AppError> {
    let status = match body.status {
        Some(raw) => Some(parse_status(Some(&raw))?),
        None => None,
    };
    let star_rating = match body.star_rating {
        Some(Some(raw)) => Some(Some(parse_star_rating(raw)?)),
        Some(None) => Some(None),
        None => None,
    };
    Ok(OrderChanges {
        status,
        star_rating,
        feedback: body.feedback,
    })
}

fn not_found(number: OrderNumber) -> AppError {
    AppError::new(ErrorCode::OrderNotFound).with_detail("order_number", number.to_string())
}

/// Order operations over the catalog and order stores
#[derive(Clone)]
pub struct OrderService {
    catalog: Arc<dyn CatalogStore>,
    orders: Arc<dyn OrderStore>,
    config: OrderConfig,
}

impl OrderService {
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        orders: Arc<dyn OrderStore>,
        config: OrderConfig,
    ) -> Self {
        Self {
            catalog,
            orders,
            config,
        }
    }

    /// Price the requested items and commit a new numbered order
    pub async fn create_order(&self, item_ids: &[i64]) -> ServiceResult<Order> {
        if item_ids.is_empty() {
            return Err(AppError::new(ErrorCode::OrderEmpty).into());
        }
        if item_ids.len() > MAX_ORDER_ITEMS {
            return Err(AppError::validation(format!(
                "An order may contain at most {MAX_ORDER_ITEMS} items"
            ))
            .with_detail("field", "items")
            .with_detail("max", MAX_ORDER_ITEMS)
            .into());
        }

        let catalog_items = self.catalog.find_items_by_ids(item_ids).await?;
        let priced = price_order(item_ids, &catalog_items);

        if !priced.unknown_ids.is_empty() {
            match self.config.unknown_items {
                UnknownItemPolicy::Reject => {
                    return Err(AppError::new(ErrorCode::UnknownMenuItems)
                        .with_detail("item_ids", priced.unknown_ids)
                        .into());
                }
                UnknownItemPolicy::Ignore => {
                    tracing::debug!(unknown_ids = ?priced.unknown_ids, "Ignoring unknown menu items");
                }
            }
        }

        let new_order = priced.into_new_order();
        let mut attempt: u32 = 0;
        loop {
            match self.orders.insert_order(new_order.clone()).await {
                Ok(order) => {
                    tracing::info!(
                        order_number = %order.order_number,
                        total_price = %order.total_price,
                        items = order.items.item_ids.len(),
                        attempt,
                        "Order created"
                    );
                    return Ok(order);
                }
                Err(RepoError::Conflict(msg) | RepoError::Duplicate(msg)) => {
                    if attempt >= self.config.max_retries {
                        tracing::warn!(attempt, error = %msg, "Order numbering retries exhausted");
                        return Err(AppError::new(ErrorCode::OrderNumberConflict).into());
                    }
                    let delay = self
                        .config
                        .retry_base_delay
                        .saturating_mul(2u32.saturating_pow(attempt));
                    tracing::debug!(attempt, ?delay, error = %msg, "Order numbering conflict, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    pub async fn get_order(&self, number: OrderNumber) -> ServiceResult<Order> {
        self.orders
            .find_order(number)
            .await?
            .ok_or_else(|| not_found(number).into())
    }

    /// All orders, most recent first
    pub async fn list_orders(&self) -> ServiceResult<Vec<Order>> {
        Ok(self.orders.list_orders().await?)
    }

    /// Overwrite the status; any direction is accepted
    ///
    /// The status is validated before the order is looked up, so an invalid
    /// value never touches the store.
    pub async fn update_status(
        &self,
        number: OrderNumber,
        raw_status: Option<&str>,
    ) -> ServiceResult<Order> {
        let status = parse_status(raw_status)?;
        let current = self.get_order(number).await?;

        if current.status == OrderStatus::Completed && status == OrderStatus::InProgress {
            tracing::warn!(order_number = %number, "Order moved back to in_progress");
        }

        let order = self.apply(number, &OrderChanges::status(status)).await?;
        tracing::info!(order_number = %number, status = %order.status, "Order status updated");
        Ok(order)
    }

    /// Attach (or overwrite) the rating and feedback text
    pub async fn submit_feedback(
        &self,
        number: OrderNumber,
        star_rating: i64,
        feedback: Option<String>,
    ) -> ServiceResult<Order> {
        let star_rating = parse_star_rating(star_rating)?;
        let changes = OrderChanges {
            status: None,
            star_rating: Some(Some(star_rating)),
            feedback: Some(feedback),
        };
        let order = self.apply(number, &changes).await?;
        tracing::info!(order_number = %number, star_rating, "Feedback submitted");
        Ok(order)
    }

    /// Apply already-validated changes to the mutable fields (PUT / PATCH)
    pub async fn update_order(
        &self,
        number: OrderNumber,
        changes: &OrderChanges,
    ) -> ServiceResult<Order> {
        if changes.is_empty() {
            return self.get_order(number).await;
        }
        self.apply(number, changes).await
    }

    pub async fn delete_order(&self, number: OrderNumber) -> ServiceResult<()> {
        if self.orders.delete_order(number).await? {
            tracing::info!(order_number = %number, "Order deleted");
            Ok(())
        } else {
            Err(not_found(number).into())
        }
    }

    async fn apply(&self, number: OrderNumber, changes: &OrderChanges) -> ServiceResult<Order> {
        self.orders
            .update_order(number, changes)
            .await?
            .ok_or_else(|| ServiceError::App(not_found(number)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryStore, NewOrder, RepoResult};
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use shared::models::MenuItemDraft;
    use std::str::FromStr;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn test_config(unknown_items: UnknownItemPolicy) -> OrderConfig {
        OrderConfig {
            unknown_items,
            max_retries: 3,
            retry_base_delay: Duration::from_millis(1),
        }
    }

    /// Catalog with A = 10.50 and B = 4.25; returns (store, a_id, b_id)
    async fn seeded() -> (Arc<MemoryStore>, i64, i64) {
        let store = Arc::new(MemoryStore::new());
        let cat = store.create_category("Mains").await.unwrap();
        let mut ids = Vec::new();
        for (name, price) in [("A", "10.50"), ("B", "4.25")] {
            let item = store
                .create_item(&MenuItemDraft {
                    name: name.to_string(),
                    price: dec(price),
                    is_available: true,
                    category_id: cat.id,
                    description: None,
                    image: None,
                })
                .await
                .unwrap();
            ids.push(item.id);
        }
        (store, ids[0], ids[1])
    }

    fn service(store: &Arc<MemoryStore>, policy: UnknownItemPolicy) -> OrderService {
        OrderService::new(store.clone(), store.clone(), test_config(policy))
    }

    fn app_code(err: ServiceError) -> ErrorCode {
        match err {
            ServiceError::App(e) => e.code,
            ServiceError::Db(e) => panic!("unexpected store error: {e}"),
        }
    }

    /// Fails the first `failures` inserts with a conflict, then delegates
    struct FlakyOrders {
        inner: Arc<MemoryStore>,
        failures: u32,
        calls: AtomicU32,
    }

    #[async_trait]
    impl OrderStore for FlakyOrders {
        async fn insert_order(&self, order: NewOrder) -> RepoResult<Order> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                return Err(RepoError::Conflict("simulated".to_string()));
            }
            self.inner.insert_order(order).await
        }

        async fn find_order(&self, number: OrderNumber) -> RepoResult<Option<Order>> {
            self.inner.find_order(number).await
        }

        async fn list_orders(&self) -> RepoResult<Vec<Order>> {
            self.inner.list_orders().await
        }

        async fn update_order(
            &self,
            number: OrderNumber,
            changes: &OrderChanges,
        ) -> RepoResult<Option<Order>> {
            self.inner.update_order(number, changes).await
        }

        async fn delete_order(&self, number: OrderNumber) -> RepoResult<bool> {
            self.inner.delete_order(number).await
        }
    }

    #[tokio::test]
    async fn test_create_order_scenario() {
        let (store, a, b) = seeded().await;
        let svc = service(&store, UnknownItemPolicy::Ignore);

        let order = svc.create_order(&[a, b, a]).await.unwrap();

        assert_eq!(order.order_number.to_string(), "ORD-1");
        assert_eq!(order.total_price, dec("25.25"));
        assert_eq!(order.items.item_ids, vec![a, b, a]);
        assert_eq!(order.items.total(), order.total_price);
        assert_eq!(order.status, OrderStatus::InProgress);

        let a_item = store.find_item(a).await.unwrap().unwrap();
        let b_item = store.find_item(b).await.unwrap().unwrap();
        assert_eq!(a_item.order_count, 2);
        assert_eq!(b_item.order_count, 1);

        let next = svc.create_order(&[b]).await.unwrap();
        assert_eq!(next.order_number.value(), order.order_number.value() + 1);
    }

    #[tokio::test]
    async fn test_create_order_empty_rejected() {
        let (store, _, _) = seeded().await;
        let svc = service(&store, UnknownItemPolicy::Ignore);

        let err = svc.create_order(&[]).await.unwrap_err();
        assert_eq!(app_code(err), ErrorCode::OrderEmpty);
        assert!(store.list_orders().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_order_item_cap() {
        let (store, a, _) = seeded().await;
        let svc = service(&store, UnknownItemPolicy::Ignore);

        let err = svc
            .create_order(&vec![a; MAX_ORDER_ITEMS + 1])
            .await
            .unwrap_err();
        assert_eq!(app_code(err), ErrorCode::ValidationFailed);
        assert!(store.list_orders().await.unwrap().is_empty());

        let order = svc.create_order(&vec![a; MAX_ORDER_ITEMS]).await.unwrap();
        assert_eq!(order.total_price, dec("10500.00"));
    }

    #[tokio::test]
    async fn test_create_order_after_lagging_sequence() {
        let (store, a, _) = seeded().await;
        let svc = service(&store, UnknownItemPolicy::Ignore);
        svc.create_order(&[a]).await.unwrap();
        svc.create_order(&[a]).await.unwrap();
        store.set_order_sequence(0);

        let order = svc.create_order(&[a]).await.unwrap();
        assert_eq!(order.order_number.to_string(), "ORD-3");
    }

    #[tokio::test]
    async fn test_total_unaffected_by_later_price_change() {
        let (store, a, _) = seeded().await;
        let svc = service(&store, UnknownItemPolicy::Ignore);
        let order = svc.create_order(&[a]).await.unwrap();

        let mut draft = MenuItemDraft::from_item(&store.find_item(a).await.unwrap().unwrap());
        draft.price = dec("99.00");
        store.update_item(a, &draft).await.unwrap();

        let stored = svc.get_order(order.order_number).await.unwrap();
        assert_eq!(stored.total_price, dec("10.50"));
        assert_eq!(stored.items.item_details[0].price, dec("10.50"));
    }

    #[tokio::test]
    async fn test_unknown_items_ignored() {
        let (store, a, _) = seeded().await;
        let svc = service(&store, UnknownItemPolicy::Ignore);

        let order = svc.create_order(&[a, 404]).await.unwrap();
        assert_eq!(order.total_price, dec("10.50"));
        assert_eq!(order.items.item_ids, vec![a, 404]);
        assert_eq!(order.items.item_details.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_items_rejected_without_side_effects() {
        let (store, a, _) = seeded().await;
        let svc = service(&store, UnknownItemPolicy::Reject);

        let err = svc.create_order(&[a, 404]).await.unwrap_err();
        assert_eq!(app_code(err), ErrorCode::UnknownMenuItems);
        assert_eq!(store.find_item(a).await.unwrap().unwrap().order_count, 0);

        // Sequence untouched: the next order is still ORD-1
        let order = svc.create_order(&[a]).await.unwrap();
        assert_eq!(order.order_number.value(), 1);
    }

    #[tokio::test]
    async fn test_conflict_retried_then_succeeds() {
        let (store, a, _) = seeded().await;
        let flaky = Arc::new(FlakyOrders {
            inner: store.clone(),
            failures: 2,
            calls: AtomicU32::new(0),
        });
        let svc = OrderService::new(
            store.clone(),
            flaky.clone(),
            test_config(UnknownItemPolicy::Ignore),
        );

        let order = svc.create_order(&[a]).await.unwrap();
        assert_eq!(order.order_number.value(), 1);
        assert_eq!(flaky.calls.load(Ordering::SeqCst), 3);
        assert_eq!(store.find_item(a).await.unwrap().unwrap().order_count, 1);
    }

    #[tokio::test]
    async fn test_conflict_retries_exhausted() {
        let (store, a, _) = seeded().await;
        let flaky = Arc::new(FlakyOrders {
            inner: store.clone(),
            failures: u32::MAX,
            calls: AtomicU32::new(0),
        });
        let svc = OrderService::new(
            store.clone(),
            flaky.clone(),
            test_config(UnknownItemPolicy::Ignore),
        );

        let err = svc.create_order(&[a]).await.unwrap_err();
        assert_eq!(app_code(err), ErrorCode::OrderNumberConflict);
        // one first attempt plus max_retries
        assert_eq!(flaky.calls.load(Ordering::SeqCst), 4);
        assert!(store.list_orders().await.unwrap().is_empty());
        assert_eq!(store.find_item(a).await.unwrap().unwrap().order_count, 0);
    }

    #[tokio::test]
    async fn test_update_status_invalid_does_not_mutate() {
        let (store, a, _) = seeded().await;
        let svc = service(&store, UnknownItemPolicy::Ignore);
        let order = svc.create_order(&[a]).await.unwrap();

        let err = svc
            .update_status(order.order_number, Some("shipped"))
            .await
            .unwrap_err();
        assert_eq!(app_code(err), ErrorCode::InvalidOrderStatus);

        let err = svc.update_status(order.order_number, None).await.unwrap_err();
        assert_eq!(app_code(err), ErrorCode::InvalidOrderStatus);

        let stored = svc.get_order(order.order_number).await.unwrap();
        assert_eq!(stored.status, OrderStatus::InProgress);
    }

    #[tokio::test]
    async fn test_update_status_round_trip() {
        let (store, a, _) = seeded().await;
        let svc = service(&store, UnknownItemPolicy::Ignore);
        let order = svc.create_order(&[a]).await.unwrap();

        let done = svc
            .update_status(order.order_number, Some("completed"))
            .await
            .unwrap();
        assert_eq!(done.status, OrderStatus::Completed);

        // Backward moves are accepted
        let back = svc
            .update_status(order.order_number, Some("in_progress"))
            .await
            .unwrap();
        assert_eq!(back.status, OrderStatus::InProgress);
    }

    #[tokio::test]
    async fn test_update_status_unknown_order() {
        let (store, _, _) = seeded().await;
        let svc = service(&store, UnknownItemPolicy::Ignore);
        let missing = OrderNumber::new(77).unwrap();

        let err = svc.update_status(missing, Some("completed")).await.unwrap_err();
        assert_eq!(app_code(err), ErrorCode::OrderNotFound);
    }

    #[tokio::test]
    async fn test_submit_feedback() {
        let (store, a, _) = seeded().await;
        let svc = service(&store, UnknownItemPolicy::Ignore);
        let order = svc.create_order(&[a]).await.unwrap();

        for bad in [0, 6] {
            let err = svc
                .submit_feedback(order.order_number, bad, None)
                .await
                .unwrap_err();
            assert_eq!(app_code(err), ErrorCode::InvalidStarRating);
        }

        svc.submit_feedback(order.order_number, 3, Some("Good".to_string()))
            .await
            .unwrap();
        let stored = svc.get_order(order.order_number).await.unwrap();
        assert_eq!(stored.star_rating, Some(3));
        assert_eq!(stored.feedback.as_deref(), Some("Good"));

        let missing = OrderNumber::new(500).unwrap();
        let err = svc.submit_feedback(missing, 3, None).await.unwrap_err();
        assert_eq!(app_code(err), ErrorCode::OrderNotFound);
    }

    #[tokio::test]
    async fn test_delete_order() {
        let (store, a, _) = seeded().await;
        let svc = service(&store, UnknownItemPolicy::Ignore);
        let order = svc.create_order(&[a]).await.unwrap();

        svc.delete_order(order.order_number).await.unwrap();
        let err = svc.delete_order(order.order_number).await.unwrap_err();
        assert_eq!(app_code(err), ErrorCode::OrderNotFound);
    }

    #[tokio::test]
    async fn test_concurrent_creation_unique_numbers() {
        let (store, a, b) = seeded().await;
        let svc = service(&store, UnknownItemPolicy::Ignore);

        let handles: Vec<_> = (0..50)
            .map(|i| {
                let svc = svc.clone();
                let items = if i % 2 == 0 { vec![a] } else { vec![a, b] };
                tokio::spawn(async move { svc.create_order(&items).await })
            })
            .collect();

        let mut numbers = Vec::new();
        for handle in handles {
            let order = handle.await.unwrap().unwrap();
            numbers.push(order.order_number.value());
        }
        numbers.sort_unstable();
        assert_eq!(numbers, (1..=50).collect::<Vec<i64>>());
        assert_eq!(store.find_item(a).await.unwrap().unwrap().order_count, 50);
        assert_eq!(store.find_item(b).await.unwrap().unwrap().order_count, 25);
    }

    #[test]
    fn test_changes_from_replace() {
        let changes = changes_from_replace(OrderReplace {
            status: Some("completed".to_string()),
            star_rating: None,
            feedback: None,
        })
        .unwrap();
        assert_eq!(changes.status, Some(OrderStatus::Completed));
        assert_eq!(changes.star_rating, Some(None));
        assert_eq!(changes.feedback, Some(None));

        let err = changes_from_replace(OrderReplace {
            status: None,
            star_rating: Some(4),
            feedback: None,
        })
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidOrderStatus);

        let err = changes_from_replace(OrderReplace {
            status: Some("completed".to_string()),
            star_rating: Some(9),
            feedback: None,
        })
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidStarRating);
    }

    #[test]
    fn test_changes_from_patch() {
        let patch: OrderPatch =
            serde_json::from_str(r#"{"star_rating":null,"feedback":"late"}"#).unwrap();
        let changes = changes_from_patch(patch).unwrap();
        assert_eq!(changes.status, None);
        assert_eq!(changes.star_rating, Some(None));
        assert_eq!(changes.feedback, Some(Some("late".to_string())));

        let patch: OrderPatch = serde_json::from_str(r#"{"status":"done"}"#).unwrap();
        assert!(changes_from_patch(patch).is_err());

        let patch: OrderPatch = serde_json::from_str("{}").unwrap();
        assert!(changes_from_patch(patch).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_order_leaves_snapshot_untouched() {
        let (store, a, b) = seeded().await;
        let svc = service(&store, UnknownItemPolicy::Ignore);
        let order = svc.create_order(&[a, b]).await.unwrap();

        let changes = changes_from_replace(OrderReplace {
            status: Some("completed".to_string()),
            star_rating: Some(5),
            feedback: Some("Great".to_string()),
        })
        .unwrap();
        let updated = svc.update_order(order.order_number, &changes).await.unwrap();

        assert_eq!(updated.status, OrderStatus::Completed);
        assert_eq!(updated.star_rating, Some(5));
        assert_eq!(updated.total_price, order.total_price);
        assert_eq!(updated.items, order.items);
        assert_eq!(updated.created_at, order.created_at);
    }

    #[test]
    fn test_parse_order_number_maps_to_not_found() {
        let err = parse_order_number("ORD-01").unwrap_err();
        assert_eq!(err.code, ErrorCode::OrderNotFound);
        assert_eq!(parse_order_number("ORD-12").unwrap().value(), 12);
    }

    #[test]
    fn test_parse_star_rating_bounds() {
        assert!(parse_star_rating(0).is_err());
        assert_eq!(parse_star_rating(1).unwrap(), 1);
        assert_eq!(parse_star_rating(5).unwrap(), 5);
        assert!(parse_star_rating(6).is_err());
        assert!(parse_star_rating(-3).is_err());
    }
}
