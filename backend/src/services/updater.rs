//! Applies supply changes to stock units and repairs what they break

use std::sync::Arc;

use rust_decimal::Decimal;
use shared::{
    validate_quantity, validate_shipment, validate_supply, ProductionOrderId, StockUnit,
    StockUnitId, StockUnitSource, SupplierOrderItemId,
};
use tracing::{info, instrument};

use super::dispatcher::AssignmentDispatcher;
use super::ledger::StockLedger;
use super::overflow::{OverflowHandler, RepairOutcome};
use super::resolver::StockUnitResolver;
use crate::error::{AppError, AppResult};

/// Stock unit supply updater
pub struct StockUnitUpdater<R, D> {
    overflow: Arc<OverflowHandler<R, D>>,
}

impl<R, D> StockUnitUpdater<R, D>
where
    R: StockUnitResolver,
    D: AssignmentDispatcher,
{
    pub fn new(overflow: Arc<OverflowHandler<R, D>>) -> Self {
        Self { overflow }
    }

    #[instrument(skip(self, ledger))]
    pub fn update_ordered(
        &self,
        ledger: &mut StockLedger,
        unit: StockUnitId,
        quantity: Decimal,
    ) -> AppResult<RepairOutcome> {
        validate_quantity(quantity).map_err(|m| AppError::validation("ordered_quantity", m))?;
        self.apply(ledger, unit, |u| u.ordered_quantity = quantity)
    }

    #[instrument(skip(self, ledger))]
    pub fn update_received(
        &self,
        ledger: &mut StockLedger,
        unit: StockUnitId,
        quantity: Decimal,
    ) -> AppResult<RepairOutcome> {
        validate_quantity(quantity).map_err(|m| AppError::validation("received_quantity", m))?;
        self.apply(ledger, unit, |u| u.received_quantity = quantity)
    }

    /// Sets the signed manual correction
    #[instrument(skip(self, ledger))]
    pub fn update_adjusted(
        &self,
        ledger: &mut StockLedger,
        unit: StockUnitId,
        quantity: Decimal,
    ) -> AppResult<RepairOutcome> {
        self.apply(ledger, unit, |u| u.adjusted_quantity = quantity)
    }

    /// Turns a linkable unit into one supplied by a supplier order item
    #[instrument(skip(self, ledger))]
    pub fn link_supplier_item(
        &self,
        ledger: &mut StockLedger,
        unit: StockUnitId,
        item: SupplierOrderItemId,
        ordered: Decimal,
    ) -> AppResult<RepairOutcome> {
        self.link(ledger, unit, StockUnitSource::SupplierOrderItem(item), ordered)
    }

    /// Turns a linkable unit into one supplied by a production order
    #[instrument(skip(self, ledger))]
    pub fn link_production_order(
        &self,
        ledger: &mut StockLedger,
        unit: StockUnitId,
        order: ProductionOrderId,
        ordered: Decimal,
    ) -> AppResult<RepairOutcome> {
        self.link(ledger, unit, StockUnitSource::ProductionOrder(order), ordered)
    }

    /// Prices do not affect quantities; no repair runs.
    pub fn update_prices(
        &self,
        ledger: &mut StockLedger,
        unit: StockUnitId,
        net_price: Option<Decimal>,
        shipping_price: Option<Decimal>,
    ) -> AppResult<()> {
        self.apply(ledger, unit, |u| {
            u.net_price = net_price;
            u.shipping_price = shipping_price;
        })?;
        Ok(())
    }

    fn link(
        &self,
        ledger: &mut StockLedger,
        unit: StockUnitId,
        source: StockUnitSource,
        ordered: Decimal,
    ) -> AppResult<RepairOutcome> {
        validate_quantity(ordered).map_err(|m| AppError::validation("ordered_quantity", m))?;
        if !ledger.unit(unit)?.is_linkable() {
            return Err(AppError::validation(
                "source",
                "Stock unit already has a supply source or is closed",
            ));
        }

        let outcome = self.apply(ledger, unit, |u| {
            u.source = source;
            u.ordered_quantity = ordered;
        })?;
        info!(%unit, ?source, %ordered, "Stock unit linked to supply");
        Ok(outcome)
    }

    /// Applies `change` to a copy of the unit, validates it, stores it and
    /// repairs the unit if its committed supply or source moved.
    fn apply<F>(&self, ledger: &mut StockLedger, unit: StockUnitId, change: F) -> AppResult<RepairOutcome>
    where
        F: FnOnce(&mut StockUnit),
    {
        let sold = ledger.sold_quantity(unit);
        let shipped = ledger.shipped_quantity(unit);
        let current = ledger.unit_mut(unit)?;

        let mut updated = current.clone();
        change(&mut updated);
        validate_supply(&updated).map_err(|m| AppError::validation("supply", m))?;
        validate_shipment(sold, shipped, updated.stock_quantity())
            .map_err(|m| AppError::validation("supply", m))?;

        let repair = updated.committed_quantity() != current.committed_quantity()
            || updated.source != current.source;
        *current = updated;
        ledger.refresh_state(unit)?;

        if repair {
            self.overflow.handle(ledger, unit)
        } else {
            Ok(RepairOutcome::Unchanged)
        }
    }
}
