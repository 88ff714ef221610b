//! Dashboard aggregates
//!
//! Read-only reports over the order and menu stores. All windows are in UTC.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc, Weekday};
use rust_decimal::Decimal;
use shared::models::{
    DashboardSummary, MenuAnalytics, MenuPopularity, OrderStatus, PopularItem, TopItem,
    WeeklySales,
};

use crate::db::{AnalyticsStore, RepoResult};

/// How many items the popularity ranking shows
pub const POPULAR_ITEMS_LIMIT: i64 = 4;

const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN))
}

/// First instant of the month containing `now`
pub fn month_start(now: DateTime<Utc>) -> DateTime<Utc> {
    start_of_day(now.date_naive().with_day(1).unwrap_or(now.date_naive()))
}

/// Monday of the week containing `now`
pub fn week_start(now: DateTime<Utc>) -> NaiveDate {
    let today = now.date_naive();
    today - Duration::days(i64::from(today.weekday().num_days_from_monday()))
}

/// Count timestamps per weekday, every weekday present
pub fn weekday_counts(times: &[DateTime<Utc>]) -> BTreeMap<String, i64> {
    let mut counts: BTreeMap<String, i64> = WEEKDAYS
        .iter()
        .map(|day| (weekday_name(*day).to_string(), 0))
        .collect();
    for time in times {
        *counts
            .entry(weekday_name(time.weekday()).to_string())
            .or_insert(0) += 1;
    }
    counts
}

/// Attach percentage shares to ranked items
///
/// `percentage = round(order_count / total * 100, 2)`. A zero total yields
/// an empty ranking with an explanatory message.
pub fn popularity(total_items_ordered: i64, ranked: Vec<TopItem>) -> MenuPopularity {
    if total_items_ordered <= 0 {
        return MenuPopularity {
            total_items_ordered: 0,
            popular_items: Vec::new(),
            message: Some("No orders have been placed yet.".to_string()),
        };
    }

    let total = Decimal::from(total_items_ordered);
    let popular_items = ranked
        .into_iter()
        .map(|item| PopularItem {
            percentage: (Decimal::from(item.order_count) * Decimal::ONE_HUNDRED / total)
                .round_dp(2),
            id: item.id,
            name: item.name,
            order_count: item.order_count,
        })
        .collect();

    MenuPopularity {
        total_items_ordered,
        popular_items,
        message: None,
    }
}

/// Time window for menu analytics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Day,
    Week,
    Month,
}

impl Period {
    /// Parse the `period` query value; unknown values mean "all time"
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        match raw? {
            "day" => Some(Self::Day),
            "week" => Some(Self::Week),
            "month" => Some(Self::Month),
            _ => None,
        }
    }

    pub fn duration(&self) -> Duration {
        match self {
            Self::Day => Duration::days(1),
            Self::Week => Duration::days(7),
            Self::Month => Duration::days(30),
        }
    }
}

pub async fn dashboard_summary(
    store: &dyn AnalyticsStore,
    now: DateTime<Utc>,
) -> RepoResult<DashboardSummary> {
    Ok(DashboardSummary {
        total_orders: store.count_orders_since(month_start(now)).await?,
        active_orders: store
            .count_orders_with_status(OrderStatus::InProgress)
            .await?,
        menu_items: store.count_menu_items().await?,
    })
}

pub async fn weekly_sales(
    store: &dyn AnalyticsStore,
    now: DateTime<Utc>,
) -> RepoResult<WeeklySales> {
    let monday = week_start(now);
    let times = store.order_times_since(start_of_day(monday)).await?;
    let times: Vec<DateTime<Utc>> = times.into_iter().filter(|t| *t <= now).collect();
    Ok(WeeklySales {
        sales: weekday_counts(&times),
        week_start: monday,
        week_end: now.date_naive(),
    })
}

pub async fn menu_popularity(store: &dyn AnalyticsStore) -> RepoResult<MenuPopularity> {
    let total = store.total_items_ordered().await?;
    if total <= 0 {
        return Ok(popularity(0, Vec::new()));
    }
    let ranked = store.top_items(POPULAR_ITEMS_LIMIT).await?;
    Ok(popularity(total, ranked))
}

pub async fn menu_analytics(
    store: &dyn AnalyticsStore,
    period: Option<Period>,
    now: DateTime<Utc>,
) -> RepoResult<MenuAnalytics> {
    let since = period.map(|p| now - p.duration());
    Ok(MenuAnalytics {
        most_purchased_item: store.most_purchased_item(since).await?,
        total_cancelled_orders: store.total_cancelled_orders(since).await?,
    })
}
