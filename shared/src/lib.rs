//! Shared domain types for the stock assignment engine
//!
//! This crate contains the stock units, stock assignments, demand lines and
//! cost values shared by the engine and by the collaborators that persist or
//! report on them.

pub mod ids;
pub mod models;
pub mod types;
pub mod validation;

pub use ids::*;
pub use models::*;
pub use types::*;
pub use validation::*;
