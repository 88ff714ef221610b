//! Authentication and authorization

mod jwt;
mod middleware;

pub use jwt::{Claims, CurrentUser, JwtError, JwtService};
pub use middleware::{require_auth, require_role};
