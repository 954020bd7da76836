//! Stock assignment models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ids::{LineId, StockAssignmentId, StockUnitId};

/// Link recording how much of a demand line is backed by one stock unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockAssignment {
    pub id: StockAssignmentId,
    pub unit_id: StockUnitId,
    pub line_id: LineId,
    pub sold_quantity: Decimal,
    pub shipped_quantity: Decimal,
    pub created_at: DateTime<Utc>,
}

impl StockAssignment {
    pub fn new(id: StockAssignmentId, unit_id: StockUnitId, line_id: LineId) -> Self {
        Self {
            id,
            unit_id,
            line_id,
            sold_quantity: Decimal::ZERO,
            shipped_quantity: Decimal::ZERO,
            created_at: Utc::now(),
        }
    }

    /// Sold quantity not yet shipped; the only part that may be moved or withdrawn.
    pub fn unshipped_quantity(&self) -> Decimal {
        (self.sold_quantity - self.shipped_quantity).max(Decimal::ZERO)
    }

    pub fn is_empty(&self) -> bool {
        self.sold_quantity.is_zero() && self.shipped_quantity.is_zero()
    }
}
