//! Churn prediction service with drift-triggered retraining
//!
//! - [`training`]: model training, artifacts and the retraining quality guard
//! - [`api`]: HTTP scoring service writing the inference log
//! - [`monitoring`]: drift evaluation over the inference log and retrain orchestration

pub mod api;
pub mod config;
pub mod data;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod monitoring;
pub mod training;

pub use error::{AppError, Result};
