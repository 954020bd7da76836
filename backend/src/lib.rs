//! Stock assignment engine
//!
//! Reconciles demand lines with the stock units that supply them, repairs
//! units whose committed supply no longer covers their assigned demand, and
//! prices demand lines from the units they draw from.

pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod services;

pub use config::{Config, EngineSettings};
pub use engine::StockEngine;
pub use error::{AppError, AppResult};
