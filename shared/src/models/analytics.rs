//! Analytics response models

use super::MenuItem;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Dashboard summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardSummary {
    /// Orders created since the first instant of the current month
    pub total_orders: i64,
    /// Orders currently `in_progress`
    pub active_orders: i64,
    /// Menu items in the catalog
    pub menu_items: i64,
}

/// Order counts per weekday for the current week
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklySales {
    /// `Monday` … `Sunday`, every key present
    #[serde(rename = "weekly_sales")]
    pub sales: BTreeMap<String, i64>,
    /// Monday of the current week
    pub week_start: NaiveDate,
    /// Today; days after it are still listed with zero
    pub week_end: NaiveDate,
}

/// One row of the popularity ranking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopularItem {
    pub id: i64,
    pub name: String,
    pub order_count: i64,
    pub percentage: Decimal,
}

/// Menu popularity ranking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuPopularity {
    pub total_items_ordered: i64,
    pub popular_items: Vec<PopularItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Ranked item row behind the popularity report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct TopItem {
    pub id: i64,
    pub name: String,
    pub order_count: i64,
}

/// Menu analytics for a period
///
/// `most_purchased_item` is the full menu item and serializes as `{}` when
/// there are no items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuAnalytics {
    #[serde(with = "empty_object")]
    pub most_purchased_item: Option<MenuItem>,
    pub total_cancelled_orders: i64,
}

mod empty_object {
    use super::MenuItem;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    struct Empty {}

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Either {
        Item(Box<MenuItem>),
        Empty(Empty),
    }

    pub fn serialize<S: Serializer>(item: &Option<MenuItem>, s: S) -> Result<S::Ok, S::Error> {
        match item {
            Some(item) => item.serialize(s),
            None => Empty {}.serialize(s),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<MenuItem>, D::Error> {
        Ok(match Either::deserialize(d)? {
            Either::Item(item) => Some(*item),
            Either::Empty(_) => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weekly_sales_wire_keys() {
        let sales = WeeklySales {
            sales: BTreeMap::from([("Monday".to_string(), 3)]),
            week_start: NaiveDate::from_ymd_opt(2024, 5, 13).unwrap(),
            week_end: NaiveDate::from_ymd_opt(2024, 5, 16).unwrap(),
        };
        let json = serde_json::to_value(&sales).unwrap();
        assert_eq!(json["weekly_sales"]["Monday"], 3);
        assert!(json.get("sales").is_none());
        assert_eq!(json["week_end"], "2024-05-16");
    }

    #[test]
    fn test_menu_analytics_empty_object() {
        let analytics = MenuAnalytics {
            most_purchased_item: None,
            total_cancelled_orders: 0,
        };
        let json = serde_json::to_value(&analytics).unwrap();
        assert_eq!(json["most_purchased_item"], serde_json::json!({}));

        let back: MenuAnalytics = serde_json::from_value(json).unwrap();
        assert_eq!(back.most_purchased_item, None);
    }

    #[test]
    fn test_menu_analytics_with_item() {
        let json = serde_json::json!({
            "most_purchased_item": {
                "id": 2,
                "name": "Soup",
                "price": "4.50",
                "is_available": true,
                "category": {"id": 1, "name": "Starters"},
                "description": null,
                "image": null,
                "order_count": 9,
                "cancelled_order_count": 0,
                "created_at": "2024-05-16T10:00:00Z",
                "updated_at": "2024-05-16T10:00:00Z"
            },
            "total_cancelled_orders": 1
        });
        let parsed: MenuAnalytics = serde_json::from_value(json).unwrap();
        let item = parsed.most_purchased_item.unwrap();
        assert_eq!(item.name, "Soup");
        assert_eq!(item.category.name, "Starters");
        assert_eq!(item.order_count, 9);
    }
}
