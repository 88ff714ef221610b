//! Read-only aggregate queries

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::models::{MenuItem, OrderStatus, TopItem};

use super::PgStore;
use super::catalog::{ITEM_COLUMNS, MenuItemRow};
use crate::db::{AnalyticsStore, RepoResult};

#[async_trait]
impl AnalyticsStore for PgStore {
    async fn count_orders_since(&self, since: DateTime<Utc>) -> RepoResult<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders WHERE created_at >= $1")
            .bind(since)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn count_orders_with_status(&self, status: OrderStatus) -> RepoResult<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders WHERE status = $1")
            .bind(status.as_str())
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn count_menu_items(&self) -> RepoResult<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM menu_items")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn order_times_since(&self, since: DateTime<Utc>) -> RepoResult<Vec<DateTime<Utc>>> {
        let rows: Vec<(DateTime<Utc>,)> =
            sqlx::query_as("SELECT created_at FROM orders WHERE created_at >= $1")
                .bind(since)
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(|(t,)| t).collect())
    }

    async fn average_rating(&self) -> RepoResult<Option<f64>> {
        let (avg,): (Option<f64>,) = sqlx::query_as(
            "SELECT AVG(star_rating)::float8 FROM orders WHERE star_rating IS NOT NULL",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(avg)
    }

    async fn total_items_ordered(&self) -> RepoResult<i64> {
        let (total,): (i64,) =
            sqlx::query_as("SELECT COALESCE(SUM(order_count), 0)::bigint FROM menu_items")
                .fetch_one(&self.pool)
                .await?;
        Ok(total)
    }

    async fn top_items(&self, limit: i64) -> RepoResult<Vec<TopItem>> {
        let rows = sqlx::query_as::<_, TopItem>(
            "SELECT id, name, order_count FROM menu_items \
             ORDER BY order_count DESC, id LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn most_purchased_item(
        &self,
        since: Option<DateTime<Utc>>,
    ) -> RepoResult<Option<MenuItem>> {
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM menu_items m \
             JOIN categories c ON c.id = m.category_id \
             WHERE $1::timestamptz IS NULL OR m.created_at >= $1 \
             ORDER BY m.order_count DESC, m.id LIMIT 1"
        );
        let row = sqlx::query_as::<_, MenuItemRow>(&sql)
            .bind(since)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(MenuItem::from))
    }

    async fn total_cancelled_orders(&self, since: Option<DateTime<Utc>>) -> RepoResult<i64> {
        let (total,): (i64,) = sqlx::query_as(
            "SELECT COALESCE(SUM(cancelled_order_count), 0)::bigint FROM menu_items \
             WHERE $1::timestamptz IS NULL OR created_at >= $1",
        )
        .bind(since)
        .fetch_one(&self.pool)
        .await?;
        Ok(total)
    }
}
