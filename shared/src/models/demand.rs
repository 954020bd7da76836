//! Demand lines: sale items and production items

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ids::{LineId, ProductionOrderId, SubjectId};

/// Any line that records demand for a subject
pub trait DemandLine {
    fn line_id(&self) -> LineId;

    fn subject_id(&self) -> Option<SubjectId>;

    /// Compound lines delegate their demand to their children.
    fn has_children(&self) -> bool {
        false
    }

    /// The assignment capability of this line, if it has one.
    fn as_assignable(&self) -> Option<&dyn Assignable>;
}

/// Capability of a demand line to carry stock assignments
pub trait Assignable: DemandLine {
    /// Total quantity the line demands from stock.
    fn assignable_quantity(&self) -> Decimal;
}

/// Kind of sale a sale item belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaleKind {
    Cart,
    Quote,
    Order,
}

/// A line of a cart, quote or order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleItem {
    pub id: u64,
    pub kind: SaleKind,
    pub subject_id: Option<SubjectId>,
    pub designation: String,
    /// Total quantity, already multiplied by the parents' quantities
    pub quantity: Decimal,
    pub children: Vec<SaleItem>,
}

impl SaleItem {
    pub fn new(id: u64, kind: SaleKind, subject_id: Option<SubjectId>, quantity: Decimal) -> Self {
        Self {
            id,
            kind,
            subject_id,
            designation: String::new(),
            quantity,
            children: Vec::new(),
        }
    }

    pub fn with_child(mut self, child: SaleItem) -> Self {
        self.children.push(child);
        self
    }

    /// Items without children, depth first: the lines that actually carry stock.
    pub fn leaves(&self) -> Vec<&SaleItem> {
        if self.children.is_empty() {
            return vec![self];
        }
        self.children.iter().flat_map(SaleItem::leaves).collect()
    }
}

impl DemandLine for SaleItem {
    fn line_id(&self) -> LineId {
        LineId::SaleItem(self.id)
    }

    fn subject_id(&self) -> Option<SubjectId> {
        self.subject_id
    }

    fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    fn as_assignable(&self) -> Option<&dyn Assignable> {
        // Carts and quotes do not commit stock.
        match self.kind {
            SaleKind::Order => Some(self),
            SaleKind::Cart | SaleKind::Quote => None,
        }
    }
}

impl Assignable for SaleItem {
    fn assignable_quantity(&self) -> Decimal {
        self.quantity
    }
}

/// A component consumed by a production order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionItem {
    pub id: u64,
    pub production_order_id: ProductionOrderId,
    pub subject_id: Option<SubjectId>,
    pub quantity: Decimal,
}

impl DemandLine for ProductionItem {
    fn line_id(&self) -> LineId {
        LineId::ProductionItem(self.id)
    }

    fn subject_id(&self) -> Option<SubjectId> {
        self.subject_id
    }

    fn as_assignable(&self) -> Option<&dyn Assignable> {
        Some(self)
    }
}

impl Assignable for ProductionItem {
    fn assignable_quantity(&self) -> Decimal {
        self.quantity
    }
}
