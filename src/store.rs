//! Read-only access to the e-commerce store.
//!
//! Rows come back raw; all aggregation happens in [`crate::features`], so
//! training export and serving share one derivation path instead of three
//! copies of the same SQL.

use crate::errors::AppError;
use crate::models::{Customer, Order};
use sqlx::SqlitePool;

/// Fetch one customer by id.
pub async fn fetch_customer(pool: &SqlitePool, user_id: i64) -> Result<Customer, AppError> {
    let customer = sqlx::query_as::<_, Customer>(
        "SELECT user_id, email, signup_date, country FROM users WHERE user_id = ?",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    customer.ok_or(AppError::CustomerNotFound(user_id))
}

/// Fetch a customer's full order history, oldest first.
pub async fn fetch_orders(pool: &SqlitePool, user_id: i64) -> Result<Vec<Order>, AppError> {
    let orders = sqlx::query_as::<_, Order>(
        "SELECT order_id, user_id, product_id, order_date, quantity, amount, status \
         FROM orders WHERE user_id = ? ORDER BY order_date, order_id",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(orders)
}

/// Fetch all customers, used by the training-data export tool.
pub async fn fetch_all_customers(pool: &SqlitePool) -> Result<Vec<Customer>, AppError> {
    let customers = sqlx::query_as::<_, Customer>(
        "SELECT user_id, email, signup_date, country FROM users ORDER BY user_id",
    )
    .fetch_all(pool)
    .await?;

    Ok(customers)
}
