//! Error handling for the stock assignment engine
//!
//! Logic errors mean an invariant could not be restored or a caller or
//! collaborator broke its contract. They are never retried; the surrounding
//! unit of work is expected to roll back.

use rust_decimal::Decimal;
use serde::Serialize;
use shared::{LineId, StockAssignmentId, StockUnitId, SubjectId};
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation error on {field}: {message}")]
    Validation { field: String, message: String },

    // Lookup errors
    #[error("Stock unit not found: {0}")]
    StockUnitNotFound(StockUnitId),

    #[error("Stock assignment not found: {0}")]
    AssignmentNotFound(StockAssignmentId),

    // Logic errors
    #[error("Line {0} does not support stock assignments")]
    IneligibleLine(LineId),

    #[error("Line {0} already has stock assignments")]
    AssignmentsAlreadyExist(LineId),

    #[error("Line {0} has no stock assignments")]
    NoAssignments(LineId),

    #[error("Line {line} demands {demanded} but assignments would total {assigned}")]
    QuantityMismatch {
        line: LineId,
        demanded: Decimal,
        assigned: Decimal,
    },

    #[error("Stock unit {unit} still overflows by {remaining} after redistribution")]
    UnresolvedOverflow { unit: StockUnitId, remaining: Decimal },

    #[error("Stock unit {unit} overflows by {overflow} but only {movable} is unshipped")]
    ShippedOverflow {
        unit: StockUnitId,
        overflow: Decimal,
        movable: Decimal,
    },

    #[error("Cannot withdraw {remaining} from line {line}: quantity already shipped")]
    ShippedQuantityLocked { line: LineId, remaining: Decimal },

    #[error("No warehouse can receive stock for subject {0}")]
    NoWarehouse(SubjectId),

    #[error("Creating a stock unit for subject {0} is not permitted")]
    UnitCreationDisabled(SubjectId),

    #[error("Cost of line {0} overflows the decimal range")]
    CostOverflow(LineId),

    #[error("Contract violation: {0}")]
    ContractViolation(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(#[from] config::ConfigError),
}

/// Error detail handed to the surface that triggered the mutation
#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    pub internal: bool,
}

impl AppError {
    /// Data or caller bugs, as opposed to rejected input
    pub fn is_logic_error(&self) -> bool {
        !matches!(
            self,
            AppError::Validation { .. } | AppError::Configuration(_)
        )
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation { .. } => "VALIDATION_ERROR",
            AppError::StockUnitNotFound(_) => "STOCK_UNIT_NOT_FOUND",
            AppError::AssignmentNotFound(_) => "STOCK_ASSIGNMENT_NOT_FOUND",
            AppError::IneligibleLine(_) => "INELIGIBLE_LINE",
            AppError::AssignmentsAlreadyExist(_) => "ASSIGNMENTS_ALREADY_EXIST",
            AppError::NoAssignments(_) => "NO_ASSIGNMENTS",
            AppError::QuantityMismatch { .. } => "QUANTITY_MISMATCH",
            AppError::UnresolvedOverflow { .. } => "UNRESOLVED_OVERFLOW",
            AppError::ShippedOverflow { .. } => "SHIPPED_OVERFLOW",
            AppError::ShippedQuantityLocked { .. } => "SHIPPED_QUANTITY_LOCKED",
            AppError::NoWarehouse(_) => "NO_WAREHOUSE",
            AppError::UnitCreationDisabled(_) => "UNIT_CREATION_DISABLED",
            AppError::CostOverflow(_) => "COST_OVERFLOW",
            AppError::ContractViolation(_) => "CONTRACT_VIOLATION",
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
        }
    }

    /// Builds the detail for an error response, logging the error.
    ///
    /// Logic errors are reported as internal errors without their message.
    pub fn detail(&self) -> ErrorDetail {
        tracing::error!(code = self.code(), "Error: {:?}", self);

        let internal = self.is_logic_error();
        let message = if internal {
            "An internal stock consistency error occurred".to_string()
        } else {
            self.to_string()
        };

        ErrorDetail {
            code: self.code().to_string(),
            message,
            internal,
        }
    }

    pub(crate) fn validation(field: &str, message: &str) -> Self {
        AppError::Validation {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

/// Result type alias for engine operations
pub type AppResult<T> = Result<T, AppError>;
