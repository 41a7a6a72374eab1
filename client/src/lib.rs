//! Harvest planner client
//!
//! Store contracts, the harvests screen orchestrator, configuration and the
//! error taxonomy shared by the binary and integration tests.

pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod store;

pub use config::Config;
pub use error::{AppError, AppResult, ErrorBanner};
