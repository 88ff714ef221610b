//! In-memory store
//!
//! All tables sit behind one `parking_lot::Mutex`, so every store call,
//! including the whole order creation unit, is atomic. No call holds the lock
//! across an `.await`.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use shared::models::{
    Category, CategoryRef, MenuItem, MenuItemDraft, NewUser, Order, OrderChanges, OrderNumber,
    OrderStatus, TopItem, User,
};

use super::{
    AnalyticsStore, CatalogStore, NewOrder, OrderStore, RepoError, RepoResult, UserStore,
};

#[derive(Debug, Clone)]
struct ItemRow {
    draft: MenuItemDraft,
    order_count: i64,
    cancelled_order_count: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Tables {
    categories: BTreeMap<i64, Category>,
    items: BTreeMap<i64, ItemRow>,
    /// Keyed by the numeric part of the order number
    orders: BTreeMap<i64, Order>,
    users: BTreeMap<i64, User>,
    order_sequence: i64,
    next_category_id: i64,
    next_item_id: i64,
    next_user_id: i64,
}

impl Tables {
    fn item(&self, id: i64) -> Option<MenuItem> {
        let row = self.items.get(&id)?;
        let category = self.categories.get(&row.draft.category_id)?;
        Some(MenuItem {
            id,
            name: row.draft.name.clone(),
            price: row.draft.price,
            is_available: row.draft.is_available,
            category: CategoryRef {
                id: category.id,
                name: category.name.clone(),
            },
            description: row.draft.description.clone(),
            image: row.draft.image.clone(),
            order_count: row.order_count,
            cancelled_order_count: row.cancelled_order_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }

    fn require_category(&self, id: i64) -> RepoResult<()> {
        if self.categories.contains_key(&id) {
            Ok(())
        } else {
            Err(RepoError::Validation(format!("category {id} does not exist")))
        }
    }

    fn items_since(&self, since: Option<DateTime<Utc>>) -> impl Iterator<Item = (&i64, &ItemRow)> {
        self.items
            .iter()
            .filter(move |(_, row)| since.is_none_or(|s| row.created_at >= s))
    }
}

fn next_id(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

/// Ranking order: most ordered first, lower id wins ties
fn top_item_cmp(a: &TopItem, b: &TopItem) -> std::cmp::Ordering {
    b.order_count.cmp(&a.order_count).then(a.id.cmp(&b.id))
}

/// Process-local store for development and tests
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite an item's `created_at` (fixtures for time-windowed reports)
    pub fn set_item_created_at(&self, id: i64, created_at: DateTime<Utc>) -> bool {
        let mut tables = self.tables.lock();
        match tables.items.get_mut(&id) {
            Some(row) => {
                row.created_at = created_at;
                true
            }
            None => false,
        }
    }

    /// Overwrite an order's `created_at` (fixtures for time-windowed reports)
    pub fn set_order_created_at(&self, number: OrderNumber, created_at: DateTime<Utc>) -> bool {
        let mut tables = self.tables.lock();
        match tables.orders.get_mut(&number.value()) {
            Some(order) => {
                order.created_at = created_at;
                true
            }
            None => false,
        }
    }

    /// Overwrite the numbering ledger (fixtures for a ledger that lags the orders table)
    pub fn set_order_sequence(&self, value: i64) {
        self.tables.lock().order_sequence = value;
    }

    /// Add to an item's cancellation counter (administrative correction)
    pub fn add_cancellations(&self, id: i64, count: i64) -> bool {
        let mut tables = self.tables.lock();
        match tables.items.get_mut(&id) {
            Some(row) => {
                row.cancelled_order_count += count;
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn list_categories(&self) -> RepoResult<Vec<Category>> {
        Ok(self.tables.lock().categories.values().cloned().collect())
    }

    async fn find_category(&self, id: i64) -> RepoResult<Option<Category>> {
        Ok(self.tables.lock().categories.get(&id).cloned())
    }

    async fn create_category(&self, name: &str) -> RepoResult<Category> {
        let mut tables = self.tables.lock();
        let id = next_id(&mut tables.next_category_id);
        let category = Category {
            id,
            name: name.to_string(),
        };
        tables.categories.insert(id, category.clone());
        Ok(category)
    }

    async fn update_category(&self, id: i64, name: &str) -> RepoResult<Option<Category>> {
        let mut tables = self.tables.lock();
        Ok(tables.categories.get_mut(&id).map(|category| {
            category.name = name.to_string();
            category.clone()
        }))
    }

    async fn delete_category(&self, id: i64) -> RepoResult<bool> {
        let mut tables = self.tables.lock();
        if tables.categories.remove(&id).is_none() {
            return Ok(false);
        }
        tables.items.retain(|_, row| row.draft.category_id != id);
        Ok(true)
    }

    async fn list_items(&self) -> RepoResult<Vec<MenuItem>> {
        let tables = self.tables.lock();
        Ok(tables.items.keys().filter_map(|id| tables.item(*id)).collect())
    }

    async fn find_item(&self, id: i64) -> RepoResult<Option<MenuItem>> {
        Ok(self.tables.lock().item(id))
    }

    async fn find_items_by_ids(&self, ids: &[i64]) -> RepoResult<Vec<MenuItem>> {
        let tables = self.tables.lock();
        let mut found: Vec<MenuItem> = ids.iter().filter_map(|id| tables.item(*id)).collect();
        found.sort_by_key(|item| item.id);
        found.dedup_by_key(|item| item.id);
        Ok(found)
    }

    async fn create_item(&self, draft: &MenuItemDraft) -> RepoResult<MenuItem> {
        let mut tables = self.tables.lock();
        tables.require_category(draft.category_id)?;
        let id = next_id(&mut tables.next_item_id);
        let now = Utc::now();
        tables.items.insert(
            id,
            ItemRow {
                draft: draft.clone(),
                order_count: 0,
                cancelled_order_count: 0,
                created_at: now,
                updated_at: now,
            },
        );
        tables
            .item(id)
            .ok_or_else(|| RepoError::Database(format!("menu item {id} vanished")))
    }

    async fn update_item(&self, id: i64, draft: &MenuItemDraft) -> RepoResult<Option<MenuItem>> {
        let mut tables = self.tables.lock();
        tables.require_category(draft.category_id)?;
        let Some(row) = tables.items.get_mut(&id) else {
            return Ok(None);
        };
        row.draft = draft.clone();
        row.updated_at = Utc::now();
        Ok(tables.item(id))
    }

    async fn delete_item(&self, id: i64) -> RepoResult<bool> {
        Ok(self.tables.lock().items.remove(&id).is_some())
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn insert_order(&self, new: NewOrder) -> RepoResult<Order> {
        let mut tables = self.tables.lock();

        let highest = tables.orders.keys().next_back().copied().unwrap_or(0);
        let seq = tables.order_sequence.max(highest) + 1;
        let order_number = OrderNumber::new(seq)
            .ok_or_else(|| RepoError::Database(format!("sequence produced {seq}")))?;

        let order = Order {
            order_number,
            total_price: new.total_price,
            created_at: Utc::now(),
            items: new.items,
            status: OrderStatus::InProgress,
            star_rating: None,
            feedback: None,
        };

        tables.order_sequence = seq;
        tables.orders.insert(seq, order.clone());
        for (item_id, count) in new.increments {
            if let Some(row) = tables.items.get_mut(&item_id) {
                row.order_count += count;
            }
        }

        Ok(order)
    }

    async fn find_order(&self, number: OrderNumber) -> RepoResult<Option<Order>> {
        Ok(self.tables.lock().orders.get(&number.value()).cloned())
    }

    async fn list_orders(&self) -> RepoResult<Vec<Order>> {
        let tables = self.tables.lock();
        let mut orders: Vec<Order> = tables.orders.values().cloned().collect();
        orders.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then(b.order_number.cmp(&a.order_number))
        });
        Ok(orders)
    }

    async fn update_order(
        &self,
        number: OrderNumber,
        changes: &OrderChanges,
    ) -> RepoResult<Option<Order>> {
        let mut tables = self.tables.lock();
        Ok(tables.orders.get_mut(&number.value()).map(|order| {
            changes.apply_to(order);
            order.clone()
        }))
    }

    async fn delete_order(&self, number: OrderNumber) -> RepoResult<bool> {
        Ok(self.tables.lock().orders.remove(&number.value()).is_some())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let tables = self.tables.lock();
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn create_user(&self, user: NewUser) -> RepoResult<User> {
        let mut tables = self.tables.lock();
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(RepoError::Duplicate(format!("user {}", user.email)));
        }
        let id = next_id(&mut tables.next_user_id);
        let user = User {
            id,
            email: user.email,
            hashed_password: user.hashed_password,
            first_name: user.first_name,
            user_type: user.user_type,
            is_active: true,
            created_at: Utc::now(),
        };
        tables.users.insert(id, user.clone());
        Ok(user)
    }
}

#[async_trait]
impl AnalyticsStore for MemoryStore {
    async fn count_orders_since(&self, since: DateTime<Utc>) -> RepoResult<i64> {
        let tables = self.tables.lock();
        Ok(tables.orders.values().filter(|o| o.created_at >= since).count() as i64)
    }

    async fn count_orders_with_status(&self, status: OrderStatus) -> RepoResult<i64> {
        let tables = self.tables.lock();
        Ok(tables.orders.values().filter(|o| o.status == status).count() as i64)
    }

    async fn count_menu_items(&self) -> RepoResult<i64> {
        Ok(self.tables.lock().items.len() as i64)
    }

    async fn order_times_since(&self, since: DateTime<Utc>) -> RepoResult<Vec<DateTime<Utc>>> {
        let tables = self.tables.lock();
        Ok(tables
            .orders
            .values()
            .map(|o| o.created_at)
            .filter(|t| *t >= since)
            .collect())
    }

    async fn average_rating(&self) -> RepoResult<Option<f64>> {
        let tables = self.tables.lock();
        let ratings: Vec<f64> = tables
            .orders
            .values()
            .filter_map(|o| o.star_rating)
            .map(f64::from)
            .collect();
        if ratings.is_empty() {
            return Ok(None);
        }
        Ok(Some(ratings.iter().sum::<f64>() / ratings.len() as f64))
    }

    async fn total_items_ordered(&self) -> RepoResult<i64> {
        Ok(self.tables.lock().items.values().map(|r| r.order_count).sum())
    }

    async fn top_items(&self, limit: i64) -> RepoResult<Vec<TopItem>> {
        let tables = self.tables.lock();
        let mut ranked: Vec<TopItem> = tables
            .items
            .iter()
            .map(|(id, row)| TopItem {
                id: *id,
                name: row.draft.name.clone(),
                order_count: row.order_count,
            })
            .collect();
        ranked.sort_by(top_item_cmp);
        ranked.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(ranked)
    }

    async fn most_purchased_item(
        &self,
        since: Option<DateTime<Utc>>,
    ) -> RepoResult<Option<MenuItem>> {
        let tables = self.tables.lock();
        let top = tables
            .items_since(since)
            .map(|(id, row)| TopItem {
                id: *id,
                name: row.draft.name.clone(),
                order_count: row.order_count,
            })
            .min_by(top_item_cmp);
        Ok(top.and_then(|top| tables.item(top.id)))
    }

    async fn total_cancelled_orders(&self, since: Option<DateTime<Utc>>) -> RepoResult<i64> {
        let tables = self.tables.lock();
        Ok(tables
            .items_since(since)
            .map(|(_, row)| row.cancelled_order_count)
            .sum())
    }
}
