//! Stock assignment services

pub mod assigner;
pub mod catalog;
pub mod cost;
pub mod dispatcher;
pub mod eligibility;
pub mod ledger;
pub mod overflow;
pub mod resolver;
pub mod updater;

pub use assigner::StockAssigner;
pub use catalog::{SubjectCatalog, SubjectResolver};
pub use cost::{CostCalculator, PurchaseCostGuesser, SubjectCostGuesser};
pub use dispatcher::{AssignmentDispatcher, DefaultAssignmentDispatcher};
pub use eligibility::supports_assignments;
pub use ledger::StockLedger;
pub use overflow::{OverflowHandler, RepairOutcome};
pub use resolver::{DefaultStockUnitResolver, StockUnitResolver};
pub use updater::StockUnitUpdater;
