//! Resolve requested item ids against catalog rows

use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use shared::models::{MenuItem, OrderItemSnapshot, OrderItems};

use crate::db::NewOrder;

/// Result of pricing a request
#[derive(Debug, Clone, PartialEq)]
pub struct PricedOrder {
    pub items: OrderItems,
    pub total_price: Decimal,
    /// Occurrences per resolved item id
    pub counts: BTreeMap<i64, i64>,
    /// Requested ids with no catalog row, first occurrence order, no repeats
    pub unknown_ids: Vec<i64>,
}

impl PricedOrder {
    pub fn into_new_order(self) -> NewOrder {
        NewOrder {
            total_price: self.total_price,
            items: self.items,
            increments: self.counts.into_iter().collect(),
        }
    }
}

/// Price `item_ids` against `catalog`
///
/// Every occurrence of a resolved id adds its current price to the total and
/// one entry to the snapshot, so duplicates are charged and counted each time.
/// Unresolved ids are collected separately and contribute nothing.
pub fn price_order(item_ids: &[i64], catalog: &[MenuItem]) -> PricedOrder {
    let by_id: HashMap<i64, &MenuItem> = catalog.iter().map(|item| (item.id, item)).collect();

    let mut item_details = Vec::with_capacity(item_ids.len());
    let mut counts = BTreeMap::new();
    let mut unknown_ids = Vec::new();

    for &id in item_ids {
        match by_id.get(&id) {
            Some(item) => {
                item_details.push(OrderItemSnapshot {
                    id,
                    name: item.name.clone(),
                    price: item.price,
                });
                *counts.entry(id).or_insert(0) += 1;
            }
            None if !unknown_ids.contains(&id) => unknown_ids.push(id),
            None => {}
        }
    }

    let items = OrderItems {
        item_ids: item_ids.to_vec(),
        item_details,
    };

    PricedOrder {
        total_price: items.total(),
        items,
        counts,
        unknown_ids,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use shared::models::CategoryRef;
    use std::str::FromStr;

    fn item(id: i64, name: &str, price: &str) -> MenuItem {
        let now = Utc::now();
        MenuItem {
            id,
            name: name.to_string(),
            price: Decimal::from_str(price).unwrap(),
            is_available: true,
            category: CategoryRef {
                id: 1,
                name: "Mains".to_string(),
            },
            description: None,
            image: None,
            order_count: 0,
            cancelled_order_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_duplicates_charged_each_time() {
        let catalog = [item(1, "A", "10.50"), item(2, "B", "4.25")];
        let priced = price_order(&[1, 2, 1], &catalog);

        assert_eq!(priced.total_price, Decimal::from_str("25.25").unwrap());
        let names: Vec<&str> = priced
            .items
            .item_details
            .iter()
            .map(|d| d.name.as_str())
            .collect();
        assert_eq!(names, ["A", "B", "A"]);
        assert_eq!(priced.counts.get(&1), Some(&2));
        assert_eq!(priced.counts.get(&2), Some(&1));
        assert!(priced.unknown_ids.is_empty());
    }

    #[test]
    fn test_unknown_ids_contribute_nothing() {
        let catalog = [item(1, "A", "3.00")];
        let priced = price_order(&[9, 1, 9, 8], &catalog);

        assert_eq!(priced.total_price, Decimal::from_str("3.00").unwrap());
        assert_eq!(priced.items.item_ids, vec![9, 1, 9, 8]);
        assert_eq!(priced.items.item_details.len(), 1);
        assert_eq!(priced.unknown_ids, vec![9, 8]);
        assert!(!priced.counts.contains_key(&9));
    }

    #[test]
    fn test_into_new_order_increments() {
        let catalog = [item(4, "Soup", "5.00"), item(2, "Tea", "1.20")];
        let new_order = price_order(&[4, 2, 4, 4], &catalog).into_new_order();

        assert_eq!(new_order.increments, vec![(2, 1), (4, 3)]);
        assert_eq!(new_order.total_price, Decimal::from_str("16.20").unwrap());
    }

    #[test]
    fn test_all_unknown_totals_zero() {
        let priced = price_order(&[7], &[]);
        assert_eq!(priced.total_price, Decimal::ZERO);
        assert!(priced.items.item_details.is_empty());
    }
}
