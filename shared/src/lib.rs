//! Shared types for the bistro service
//!
//! Domain models and the unified error system used by the server and its
//! API clients. This crate performs no I/O.

pub mod error;
pub mod models;

// Re-exports
pub use axum::Json;
pub use http;
pub use serde::{Deserialize, Serialize};
