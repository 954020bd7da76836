//! Domain models for stock tracking

mod demand;
mod stock_assignment;
mod stock_unit;
mod subject;

pub use demand::*;
pub use stock_assignment::*;
pub use stock_unit::*;
pub use subject::*;
