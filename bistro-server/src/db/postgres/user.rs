use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::models::{NewUser, User};

use super::PgStore;
use crate::db::{RepoError, RepoResult, UserStore};

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    email: String,
    hashed_password: String,
    first_name: Option<String>,
    user_type: String,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepoError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            email: row.email,
            hashed_password: row.hashed_password,
            first_name: row.first_name,
            user_type: row.user_type.parse().map_err(RepoError::Database)?,
            is_active: row.is_active,
            created_at: row.created_at,
        })
    }
}

const USER_COLUMNS: &str =
    "id, email, hashed_password, first_name, user_type, is_active, created_at";

#[async_trait]
impl UserStore for PgStore {
    async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        row.map(TryInto::try_into).transpose()
    }

    async fn create_user(&self, user: NewUser) -> RepoResult<User> {
        let sql = format!(
            "INSERT INTO users (email, hashed_password, first_name, user_type) \
             VALUES ($1, $2, $3, $4) RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(&user.email)
            .bind(&user.hashed_password)
            .bind(&user.first_name)
            .bind(user.user_type.as_str())
            .fetch_one(&self.pool)
            .await?;
        row.try_into()
    }
}
