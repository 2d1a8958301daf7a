//! Behavioral feature and churn-label derivation.
//!
//! This is the single source of truth for how a customer's order history
//! becomes model input. Training-set export and live scoring both call
//! [`FeatureVector::derive`], so the two paths cannot drift apart.

use crate::models::{Customer, Order};
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeSet;

/// A customer whose most recent order is older than this is churned.
pub const CHURN_THRESHOLD_DAYS: f64 = 90.0;

/// Window for the "recent activity" aggregates, inclusive.
pub const RECENT_WINDOW_DAYS: i64 = 30;

/// Recency sentinel for customers with no orders. Large enough that the
/// churn threshold always classifies them as churned.
pub const NO_ORDER_RECENCY_DAYS: f64 = 36_500.0;

/// Prefix for one-hot country indicator columns, e.g. `country_Germany`.
pub const COUNTRY_PREFIX: &str = "country_";

/// Names of the numeric aggregate columns, in canonical order.
pub const NUMERIC_COLUMNS: [&str; 8] = [
    "total_orders",
    "total_spent",
    "avg_order_value",
    "days_since_last_order",
    "active_months",
    "unique_products_bought",
    "orders_last_30_days",
    "spent_last_30_days",
];

/// Fixed vector of behavioral aggregates for one customer at one instant.
///
/// All numeric fields default to 0 for a customer with no orders, except
/// `days_since_last_order` which takes [`NO_ORDER_RECENCY_DAYS`].
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    pub total_orders: f64,
    pub total_spent: f64,
    pub avg_order_value: f64,
    pub days_since_last_order: f64,
    pub active_months: f64,
    pub unique_products_bought: f64,
    pub orders_last_30_days: f64,
    pub spent_last_30_days: f64,
    /// Raw country label; expanded to indicator columns at encode time.
    pub country: String,
}

impl FeatureVector {
    /// Derive the feature vector for `customer` from its full order history
    /// at evaluation instant `now`.
    ///
    /// Pure function of its inputs: no clock access, no storage access.
    pub fn derive(customer: &Customer, orders: &[Order], now: NaiveDate) -> Self {
        let total_orders = orders.len() as f64;
        let total_spent: f64 = orders.iter().map(|o| o.amount).sum();
        let avg_order_value = if orders.is_empty() {
            0.0
        } else {
            total_spent / total_orders
        };

        let days_since_last_order = days_since_last_order(orders, now);

        // Distinct (year, month) buckets, not rolling 30-day windows
        let active_months = orders
            .iter()
            .map(|o| (o.order_date.year(), o.order_date.month()))
            .collect::<BTreeSet<_>>()
            .len() as f64;

        let unique_products_bought = orders
            .iter()
            .map(|o| o.product_id)
            .collect::<BTreeSet<_>>()
            .len() as f64;

        let recent: Vec<&Order> = orders
            .iter()
            .filter(|o| (now - o.order_date).num_days() <= RECENT_WINDOW_DAYS)
            .collect();
        let orders_last_30_days = recent.len() as f64;
        let spent_last_30_days: f64 = recent.iter().map(|o| o.amount).sum();

        Self {
            total_orders,
            total_spent,
            avg_order_value,
            days_since_last_order,
            active_months,
            unique_products_bought,
            orders_last_30_days,
            spent_last_30_days,
            country: customer.country.clone(),
        }
    }

    /// Look up a numeric aggregate by its column name.
    pub fn numeric_value(&self, column: &str) -> Option<f64> {
        match column {
            "total_orders" => Some(self.total_orders),
            "total_spent" => Some(self.total_spent),
            "avg_order_value" => Some(self.avg_order_value),
            "days_since_last_order" => Some(self.days_since_last_order),
            "active_months" => Some(self.active_months),
            "unique_products_bought" => Some(self.unique_products_bought),
            "orders_last_30_days" => Some(self.orders_last_30_days),
            "spent_last_30_days" => Some(self.spent_last_30_days),
            _ => None,
        }
    }

    /// Encode this vector against an ordered training column set.
    ///
    /// The output has exactly one value per column, in column order:
    /// numeric aggregates by name, country indicators by one-hot match,
    /// and zero for any training column this vector has no value for.
    /// A country never seen at training time contributes zero to every
    /// indicator column; it is never an error.
    pub fn encode(&self, columns: &[String]) -> Vec<f32> {
        let own_indicator = format!("{}{}", COUNTRY_PREFIX, self.country);
        columns
            .iter()
            .map(|col| {
                if let Some(v) = self.numeric_value(col) {
                    v as f32
                } else if *col == own_indicator {
                    1.0
                } else {
                    0.0
                }
            })
            .collect()
    }

    /// The indicator column name this vector's country maps to.
    pub fn country_column(&self) -> String {
        format!("{}{}", COUNTRY_PREFIX, self.country)
    }
}

/// Days elapsed since the most recent order, or the no-order sentinel.
pub fn days_since_last_order(orders: &[Order], now: NaiveDate) -> f64 {
    orders
        .iter()
        .map(|o| o.order_date)
        .max()
        .map(|last| (now - last).num_days() as f64)
        .unwrap_or(NO_ORDER_RECENCY_DAYS)
}

/// Training-time churn label: true iff the most recent order is more than
/// [`CHURN_THRESHOLD_DAYS`] old. A customer with zero orders is churned.
pub fn derive_label(orders: &[Order], now: NaiveDate) -> bool {
    days_since_last_order(orders, now) > CHURN_THRESHOLD_DAYS
}

#[cfg(test)]
mod tests {
    use super::*;

    fn customer(country: &str) -> Customer {
        Customer {
            user_id: 1,
            email: None,
            signup_date: None,
            country: country.to_string(),
        }
    }

    fn order(id: i64, product_id: i64, date: NaiveDate, quantity: i64, amount: f64) -> Order {
        Order {
            order_id: id,
            user_id: 1,
            product_id,
            order_date: date,
            quantity,
            amount,
            status: "completed".to_string(),
        }
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn zero_orders_defaults_to_zero_and_churned() {
        let now = d(2024, 6, 1);
        let fv = FeatureVector::derive(&customer("Germany"), &[], now);

        assert_eq!(fv.total_orders, 0.0);
        assert_eq!(fv.total_spent, 0.0);
        assert_eq!(fv.avg_order_value, 0.0);
        assert_eq!(fv.active_months, 0.0);
        assert_eq!(fv.unique_products_bought, 0.0);
        assert_eq!(fv.orders_last_30_days, 0.0);
        assert_eq!(fv.spent_last_30_days, 0.0);
        assert_eq!(fv.days_since_last_order, NO_ORDER_RECENCY_DAYS);
        assert!(derive_label(&[], now));
    }

    #[test]
    fn zero_quantity_orders_still_count() {
        let now = d(2024, 6, 1);
        let orders = vec![
            order(1, 10, d(2024, 5, 20), 0, 0.0),
            order(2, 10, d(2024, 5, 21), 2, 25.0),
        ];
        let fv = FeatureVector::derive(&customer("US"), &orders, now);
        assert_eq!(fv.total_orders, 2.0);
    }

    #[test]
    fn duplicate_date_orders_each_count_in_recent_window() {
        let now = d(2024, 6, 1);
        let orders = vec![
            order(1, 10, d(2024, 5, 30), 1, 10.0),
            order(2, 11, d(2024, 5, 30), 1, 15.0),
        ];
        let fv = FeatureVector::derive(&customer("US"), &orders, now);
        assert_eq!(fv.orders_last_30_days, 2.0);
        assert_eq!(fv.spent_last_30_days, 25.0);
    }

    #[test]
    fn recent_window_is_inclusive_at_thirty_days() {
        let now = d(2024, 6, 30);
        let orders = vec![
            order(1, 10, d(2024, 5, 31), 1, 10.0), // exactly 30 days
            order(2, 10, d(2024, 5, 30), 1, 20.0), // 31 days, outside
        ];
        let fv = FeatureVector::derive(&customer("US"), &orders, now);
        assert_eq!(fv.orders_last_30_days, 1.0);
        assert_eq!(fv.spent_last_30_days, 10.0);
    }

    #[test]
    fn active_months_buckets_by_calendar_month_not_windows() {
        let now = d(2024, 6, 1);
        // Jan 31 and Feb 1 are one day apart but two calendar months
        let orders = vec![
            order(1, 10, d(2024, 1, 31), 1, 10.0),
            order(2, 10, d(2024, 2, 1), 1, 10.0),
            order(3, 10, d(2024, 2, 28), 1, 10.0),
        ];
        let fv = FeatureVector::derive(&customer("US"), &orders, now);
        assert_eq!(fv.active_months, 2.0);
    }

    #[test]
    fn same_month_across_years_counts_twice() {
        let now = d(2024, 6, 1);
        let orders = vec![
            order(1, 10, d(2023, 3, 10), 1, 10.0),
            order(2, 10, d(2024, 3, 10), 1, 10.0),
        ];
        let fv = FeatureVector::derive(&customer("US"), &orders, now);
        assert_eq!(fv.active_months, 2.0);
    }

    #[test]
    fn churn_label_is_strict_at_ninety_days() {
        let now = d(2024, 6, 1);
        let at_threshold = vec![order(1, 10, now - chrono::Days::new(90), 1, 10.0)];
        let past_threshold = vec![order(1, 10, now - chrono::Days::new(91), 1, 10.0)];
        assert!(!derive_label(&at_threshold, now));
        assert!(derive_label(&past_threshold, now));
    }

    #[test]
    fn end_to_end_scenario_ten_and_onetwenty_days() {
        let now = d(2024, 6, 1);
        let orders = vec![
            order(1, 10, now - chrono::Days::new(10), 1, 50.0),
            order(2, 11, now - chrono::Days::new(120), 1, 30.0),
        ];
        let fv = FeatureVector::derive(&customer("Germany"), &orders, now);

        assert_eq!(fv.total_orders, 2.0);
        assert_eq!(fv.total_spent, 80.0);
        assert_eq!(fv.avg_order_value, 40.0);
        assert_eq!(fv.days_since_last_order, 10.0);
        assert!(!derive_label(&orders, now));
    }

    #[test]
    fn encode_follows_manifest_order_and_zero_fills() {
        let now = d(2024, 6, 1);
        let fv = FeatureVector::derive(&customer("Germany"), &[], now);
        let columns = vec![
            "total_orders".to_string(),
            "country_France".to_string(),
            "country_Germany".to_string(),
            "days_since_last_order".to_string(),
        ];
        let encoded = fv.encode(&columns);
        assert_eq!(encoded.len(), 4);
        assert_eq!(encoded[0], 0.0);
        assert_eq!(encoded[1], 0.0);
        assert_eq!(encoded[2], 1.0);
        assert_eq!(encoded[3], NO_ORDER_RECENCY_DAYS as f32);
    }

    #[test]
    fn unseen_country_contributes_zero_everywhere() {
        let now = d(2024, 6, 1);
        let columns = vec![
            "total_orders".to_string(),
            "country_France".to_string(),
            "country_Germany".to_string(),
        ];
        let seen = FeatureVector::derive(&customer("Atlantis"), &[], now);
        let omitted = FeatureVector::derive(&customer(""), &[], now);
        // A category unknown to the manifest encodes identically to no category
        assert_eq!(seen.encode(&columns), omitted.encode(&columns));
    }
}
