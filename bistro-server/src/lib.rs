//! Bistro server - restaurant food-ordering backend
//!
//! # Module layout
//!
//! ```text
//! bistro-server/src/
//! ├── api/         # HTTP routes and handlers
//! ├── auth/        # JWT issuing/validation, role gates
//! ├── db/          # store traits, PostgreSQL and in-memory stores
//! ├── orders/      # order numbering, pricing, status and feedback
//! ├── menu/        # menu payload validation
//! ├── analytics/   # dashboard aggregates
//! ├── users/       # login, registration, bootstrap admin
//! ├── mail/        # outbound mail queue
//! └── config.rs, state.rs, error.rs, logger.rs, util.rs
//! ```

pub mod analytics;
pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod logger;
pub mod mail;
pub mod menu;
pub mod orders;
pub mod state;
pub mod users;
pub mod util;

pub use api::build_router;
pub use config::Config;
pub use error::{BoxError, ServiceError, ServiceResult};
pub use state::AppState;

// Security logging macro, emitted under the `security` target
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),* $(,)?) => {
        tracing::warn!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}
