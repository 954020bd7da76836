//! Catalog subject models

use serde::{Deserialize, Serialize};

use crate::ids::SubjectId;
use crate::types::Cost;

/// A stockable catalog item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subject {
    pub id: SubjectId,
    pub reference: String,
    pub designation: String,
    pub stock_mode: StockMode,
    /// Assembled from components; its components carry the stock, not itself
    pub compound: bool,
    /// Last known purchase cost, used to guess costs of unsourced stock
    pub purchase_cost: Option<Cost>,
}

impl Subject {
    pub fn new(id: SubjectId, reference: impl Into<String>, designation: impl Into<String>) -> Self {
        Self {
            id,
            reference: reference.into(),
            designation: designation.into(),
            stock_mode: StockMode::Auto,
            compound: false,
            purchase_cost: None,
        }
    }

    pub fn is_stock_tracked(&self) -> bool {
        self.stock_mode.is_tracked()
    }
}

/// Stock tracking mode of a subject
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockMode {
    Disabled,
    Manual,
    #[default]
    Auto,
}

impl StockMode {
    pub fn is_tracked(&self) -> bool {
        !matches!(self, StockMode::Disabled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StockMode::Disabled => "disabled",
            StockMode::Manual => "manual",
            StockMode::Auto => "auto",
        }
    }
}
