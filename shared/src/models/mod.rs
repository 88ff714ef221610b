//! Data models
//!
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are `i64` (PostgreSQL BIGSERIAL).

pub mod analytics;
pub mod category;
pub mod menu_item;
pub mod order;
pub mod serde_helpers;
pub mod user;

// Re-exports
pub use analytics::*;
pub use category::*;
pub use menu_item::*;
pub use order::*;
pub use user::*;
