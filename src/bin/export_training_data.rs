//! Exports the training table (features + churn label) for every customer.
//!
//! The offline training pipeline consumes this output, one-hot encodes the
//! country column, fits the classifier, and writes back the ONNX model and
//! the column manifest. Features and labels come from the exact same
//! derivation code the serving path uses.
//!
//! Usage: export_training_data [output.csv]  (defaults to stdout)

use chrono::Utc;
use churn_api::config::Config;
use churn_api::db::Database;
use churn_api::features::{self, FeatureVector};
use churn_api::store;
use std::io::Write;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = Config::from_env()?;
    let db = Database::new(&config.database_url).await?;
    let now = Utc::now().date_naive();

    let customers = store::fetch_all_customers(&db.pool).await?;
    tracing::info!(count = customers.len(), "Exporting training rows");

    let mut out: Box<dyn Write> = match std::env::args().nth(1) {
        Some(path) => Box::new(std::fs::File::create(path)?),
        None => Box::new(std::io::stdout()),
    };

    writeln!(
        out,
        "user_id,country,total_orders,total_spent,avg_order_value,days_since_last_order,\
         active_months,unique_products_bought,orders_last_30_days,spent_last_30_days,is_churned"
    )?;

    let mut churned = 0usize;
    for customer in &customers {
        let orders = store::fetch_orders(&db.pool, customer.user_id).await?;
        let fv = FeatureVector::derive(customer, &orders, now);
        let label = features::derive_label(&orders, now);
        if label {
            churned += 1;
        }

        writeln!(
            out,
            "{},{},{},{},{},{},{},{},{},{},{}",
            customer.user_id,
            customer.country,
            fv.total_orders,
            fv.total_spent,
            fv.avg_order_value,
            fv.days_since_last_order,
            fv.active_months,
            fv.unique_products_bought,
            fv.orders_last_30_days,
            fv.spent_last_30_days,
            label as u8,
        )?;
    }

    tracing::info!(
        total = customers.len(),
        churned,
        "Training export complete"
    );

    Ok(())
}
