//! Common value types used across the engine

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A unit cost split into product and shipping parts.
///
/// `average` is set when at least one contributing source had no known
/// cost, so reporting can tell an approximate figure from an exact one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Cost {
    pub product: Decimal,
    pub shipping: Decimal,
    pub average: bool,
}

impl Cost {
    pub fn new(product: Decimal, shipping: Decimal) -> Self {
        Self {
            product,
            shipping,
            average: false,
        }
    }

    /// Zero cost flagged as approximate ("unknown", not "known zero").
    pub fn unknown() -> Self {
        Self {
            product: Decimal::ZERO,
            shipping: Decimal::ZERO,
            average: true,
        }
    }

    pub fn total(&self) -> Decimal {
        self.product + self.shipping
    }

    pub fn is_average(&self) -> bool {
        self.average
    }

    /// Returns the same figures flagged as approximate.
    pub fn as_average(self) -> Self {
        Self {
            average: true,
            ..self
        }
    }

    /// Sums both parts, `None` on overflow. The result is averaged if
    /// either side is.
    pub fn checked_add(&self, rhs: Cost) -> Option<Self> {
        Some(Self {
            product: self.product.checked_add(rhs.product)?,
            shipping: self.shipping.checked_add(rhs.shipping)?,
            average: self.average || rhs.average,
        })
    }

    /// Multiplies both parts by `quantity`, `None` on overflow.
    pub fn checked_mul(&self, quantity: Decimal) -> Option<Self> {
        Some(Self {
            product: self.product.checked_mul(quantity)?,
            shipping: self.shipping.checked_mul(quantity)?,
            average: self.average,
        })
    }

    /// Divides both parts by `quantity`, `None` when it is zero.
    pub fn checked_div(&self, quantity: Decimal) -> Option<Self> {
        Some(Self {
            product: self.product.checked_div(quantity)?,
            shipping: self.shipping.checked_div(quantity)?,
            average: self.average,
        })
    }
}

/// Order in which assignments are drawn from a stock unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    OldestFirst,
    #[default]
    NewestFirst,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::OldestFirst => "oldest_first",
            SortDirection::NewestFirst => "newest_first",
        }
    }
}
