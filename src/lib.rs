//! Customer Churn Prediction API Library
//!
//! This library provides the core functionality for the churn prediction
//! service: feature and label derivation from order history, the scoring
//! contract over a fitted classifier, read-only store access, and the HTTP
//! handlers that serve predictions.
//!
//! # Modules
//!
//! - `config`: Configuration management.
//! - `db`: Database connection and pool management.
//! - `errors`: Error handling types.
//! - `features`: Feature vector and churn label derivation.
//! - `handlers`: HTTP request handlers.
//! - `manifest`: Versioned training-column manifest.
//! - `model`: Fitted classifier loading and inference.
//! - `models`: Database row and API response types.
//! - `scorer`: Probability thresholding and risk bucketing.
//! - `services`: Prediction workflow and batch scoring.
//! - `store`: Read-only customer/order queries.

pub mod config;
pub mod db;
pub mod errors;
pub mod features;
pub mod handlers;
pub mod manifest;
pub mod model;
pub mod models;
pub mod scorer;
pub mod services;
pub mod store;
