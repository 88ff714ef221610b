//! Category and menu item queries

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use shared::models::{Category, CategoryRef, MenuItem, MenuItemDraft};

use super::PgStore;
use crate::db::{CatalogStore, RepoResult};

#[derive(sqlx::FromRow)]
pub(super) struct MenuItemRow {
    id: i64,
    name: String,
    price: Decimal,
    is_available: bool,
    category_id: i64,
    category_name: String,
    description: Option<String>,
    image: Option<String>,
    order_count: i64,
    cancelled_order_count: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<MenuItemRow> for MenuItem {
    fn from(row: MenuItemRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            price: row.price,
            is_available: row.is_available,
            category: CategoryRef {
                id: row.category_id,
                name: row.category_name,
            },
            description: row.description,
            image: row.image,
            order_count: row.order_count,
            cancelled_order_count: row.cancelled_order_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

pub(super) const ITEM_COLUMNS: &str = "m.id, m.name, m.price, m.is_available, m.category_id, \
    c.name AS category_name, m.description, m.image, m.order_count, \
    m.cancelled_order_count, m.created_at, m.updated_at";

#[async_trait]
impl CatalogStore for PgStore {
    async fn list_categories(&self) -> RepoResult<Vec<Category>> {
        let rows = sqlx::query_as::<_, Category>("SELECT id, name FROM categories ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn find_category(&self, id: i64) -> RepoResult<Option<Category>> {
        let row = sqlx::query_as::<_, Category>("SELECT id, name FROM categories WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn create_category(&self, name: &str) -> RepoResult<Category> {
        let row = sqlx::query_as::<_, Category>(
            "INSERT INTO categories (name) VALUES ($1) RETURNING id, name",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn update_category(&self, id: i64, name: &str) -> RepoResult<Option<Category>> {
        let row = sqlx::query_as::<_, Category>(
            "UPDATE categories SET name = $2 WHERE id = $1 RETURNING id, name",
        )
        .bind(id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn delete_category(&self, id: i64) -> RepoResult<bool> {
        // menu_items.category_id cascades
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_items(&self) -> RepoResult<Vec<MenuItem>> {
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM menu_items m \
             JOIN categories c ON c.id = m.category_id ORDER BY m.id"
        );
        let rows = sqlx::query_as::<_, MenuItemRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_item(&self, id: i64) -> RepoResult<Option<MenuItem>> {
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM menu_items m \
             JOIN categories c ON c.id = m.category_id WHERE m.id = $1"
        );
        let row = sqlx::query_as::<_, MenuItemRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    async fn find_items_by_ids(&self, ids: &[i64]) -> RepoResult<Vec<MenuItem>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM menu_items m \
             JOIN categories c ON c.id = m.category_id \
             WHERE m.id = ANY($1) ORDER BY m.id"
        );
        let rows = sqlx::query_as::<_, MenuItemRow>(&sql)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn create_item(&self, draft: &MenuItemDraft) -> RepoResult<MenuItem> {
        let sql = format!(
            "WITH m AS ( \
                INSERT INTO menu_items (name, price, is_available, category_id, description, image) \
                VALUES ($1, $2, $3, $4, $5, $6) RETURNING * \
             ) \
             SELECT {ITEM_COLUMNS} FROM m JOIN categories c ON c.id = m.category_id"
        );
        let row = sqlx::query_as::<_, MenuItemRow>(&sql)
            .bind(&draft.name)
            .bind(draft.price)
            .bind(draft.is_available)
            .bind(draft.category_id)
            .bind(&draft.description)
            .bind(&draft.image)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.into())
    }

    async fn update_item(&self, id: i64, draft: &MenuItemDraft) -> RepoResult<Option<MenuItem>> {
        let sql = format!(
            "WITH m AS ( \
                UPDATE menu_items SET name = $2, price = $3, is_available = $4, \
                    category_id = $5, description = $6, image = $7, updated_at = NOW() \
                WHERE id = $1 RETURNING * \
             ) \
             SELECT {ITEM_COLUMNS} FROM m JOIN categories c ON c.id = m.category_id"
        );
        let row = sqlx::query_as::<_, MenuItemRow>(&sql)
            .bind(id)
            .bind(&draft.name)
            .bind(draft.price)
            .bind(draft.is_available)
            .bind(draft.category_id)
            .bind(&draft.description)
            .bind(&draft.image)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    async fn delete_item(&self, id: i64) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM menu_items WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
