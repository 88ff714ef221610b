//! Serde helpers for partial-update payloads

use serde::{Deserialize, Deserializer};

/// Distinguish an absent field from an explicit `null`
///
/// Use with `#[serde(default, deserialize_with = "double_option")]` on an
/// `Option<Option<T>>` field:
/// - field absent → `None` (leave unchanged)
/// - field `null` → `Some(None)` (clear)
/// - field value → `Some(Some(v))` (set)
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Deserialize bool that treats null as true
pub fn bool_true<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<bool>::deserialize(deserializer).map(|opt| opt.unwrap_or(true))
}
