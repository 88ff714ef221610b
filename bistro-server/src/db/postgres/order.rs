//! Order queries and the creation transaction

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use shared::models::{Order, OrderChanges, OrderItems, OrderNumber};
use sqlx::types::Json;

use super::PgStore;
use crate::db::{NewOrder, OrderStore, RepoError, RepoResult};

#[derive(sqlx::FromRow)]
struct OrderRow {
    order_seq: i64,
    total_price: Decimal,
    created_at: DateTime<Utc>,
    items: Json<OrderItems>,
    status: String,
    star_rating: Option<i16>,
    feedback: Option<String>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepoError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let order_number = OrderNumber::new(row.order_seq)
            .ok_or_else(|| RepoError::Database(format!("invalid order_seq {}", row.order_seq)))?;
        let status = row
            .status
            .parse()
            .map_err(|e| RepoError::Database(format!("{order_number}: {e}")))?;
        Ok(Self {
            order_number,
            total_price: row.total_price,
            created_at: row.created_at,
            items: row.items.0,
            status,
            star_rating: row.star_rating,
            feedback: row.feedback,
        })
    }
}

const ORDER_COLUMNS: &str =
    "order_seq, total_price, created_at, items, status, star_rating, feedback";

#[async_trait]
impl OrderStore for PgStore {
    async fn insert_order(&self, new: NewOrder) -> RepoResult<Order> {
        let mut tx = self.pool.begin().await?;

        // The row lock on the ledger is held until commit, so creators are
        // serialized from here on. A rollback releases the value for reuse.
        // A ledger that lags the orders table is pulled forward past the
        // highest number ever stored.
        let (seq,): (i64,) = sqlx::query_as(
            "UPDATE order_sequence SET last_value = GREATEST(last_value, \
             (SELECT COALESCE(MAX(order_seq), 0) FROM orders)) + 1 \
             WHERE id = 1 RETURNING last_value",
        )
        .fetch_one(&mut *tx)
        .await?;

        let order_number = OrderNumber::new(seq)
            .ok_or_else(|| RepoError::Database(format!("sequence produced {seq}")))?;

        let sql = format!(
            "INSERT INTO orders (order_seq, order_number, total_price, items) \
             VALUES ($1, $2, $3, $4) RETURNING {ORDER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(seq)
            .bind(order_number.to_string())
            .bind(new.total_price)
            .bind(Json(&new.items))
            .fetch_one(&mut *tx)
            .await?;

        if !new.increments.is_empty() {
            let (ids, counts): (Vec<i64>, Vec<i64>) = new.increments.iter().copied().unzip();
            sqlx::query(
                "UPDATE menu_items m SET order_count = m.order_count + u.n \
                 FROM UNNEST($1::bigint[], $2::bigint[]) AS u(id, n) \
                 WHERE m.id = u.id",
            )
            .bind(&ids)
            .bind(&counts)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        row.try_into()
    }

    async fn find_order(&self, number: OrderNumber) -> RepoResult<Option<Order>> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE order_seq = $1");
        let row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(number.value())
            .fetch_optional(&self.pool)
            .await?;
        row.map(TryInto::try_into).transpose()
    }

    async fn list_orders(&self) -> RepoResult<Vec<Order>> {
        let sql =
            format!("SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC, order_seq DESC");
        let rows = sqlx::query_as::<_, OrderRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn update_order(
        &self,
        number: OrderNumber,
        changes: &OrderChanges,
    ) -> RepoResult<Option<Order>> {
        let sql = format!(
            "UPDATE orders SET \
                status = COALESCE($2, status), \
                star_rating = CASE WHEN $3 THEN $4 ELSE star_rating END, \
                feedback = CASE WHEN $5 THEN $6 ELSE feedback END \
             WHERE order_seq = $1 RETURNING {ORDER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(number.value())
            .bind(changes.status.map(|s| s.as_str()))
            .bind(changes.star_rating.is_some())
            .bind(changes.star_rating.flatten())
            .bind(changes.feedback.is_some())
            .bind(changes.feedback.clone().flatten())
            .fetch_optional(&self.pool)
            .await?;
        row.map(TryInto::try_into).transpose()
    }

    async fn delete_order(&self, number: OrderNumber) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM orders WHERE order_seq = $1")
            .bind(number.value())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
