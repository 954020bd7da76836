//! Fixtures shared by the integration tests

#![allow(dead_code)]

use std::sync::Arc;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use shared::{
    Cost, SaleItem, SaleKind, StockMode, StockUnit, StockUnitId, StockUnitSource, Subject,
    SubjectId, SupplierOrderItemId, WarehouseId,
};
use stock_backend::services::{
    DefaultAssignmentDispatcher, DefaultStockUnitResolver, StockLedger, SubjectCatalog,
};
use stock_backend::{EngineSettings, StockEngine};

pub const WIDGET: SubjectId = SubjectId::new(1);
pub const KIT: SubjectId = SubjectId::new(2);
pub const SERVICE: SubjectId = SubjectId::new(3);
pub const WAREHOUSE: WarehouseId = WarehouseId::new(1);

/// Widget's recorded purchase cost
pub fn widget_cost() -> Cost {
    Cost::new(dec!(5), Decimal::ZERO)
}

pub fn catalog() -> SubjectCatalog {
    let mut widget = Subject::new(WIDGET, "WDG-01", "Widget");
    widget.purchase_cost = Some(widget_cost());

    let mut kit = Subject::new(KIT, "KIT-01", "Widget kit");
    kit.compound = true;

    let mut service = Subject::new(SERVICE, "SRV-01", "Installation");
    service.stock_mode = StockMode::Disabled;

    SubjectCatalog::new().with(widget).with(kit).with(service)
}

pub fn engine() -> StockEngine {
    engine_with(EngineSettings::default(), Some(WAREHOUSE))
}

pub fn engine_with(settings: EngineSettings, warehouse: Option<WarehouseId>) -> StockEngine {
    stock_backend::logging::init_test();
    StockEngine::new(
        Arc::new(DefaultStockUnitResolver::new(warehouse)),
        Arc::new(DefaultAssignmentDispatcher),
        Arc::new(catalog()),
        settings,
    )
}

/// Persists a widget unit ordered from a supplier
pub fn supplied_unit(ledger: &mut StockLedger, ordered: Decimal) -> StockUnitId {
    priced_unit(ledger, ordered, None)
}

pub fn priced_unit(
    ledger: &mut StockLedger,
    ordered: Decimal,
    net_price: Option<Decimal>,
) -> StockUnitId {
    let mut unit = StockUnit::new(ledger.next_unit_id(), WIDGET);
    unit.source = StockUnitSource::SupplierOrderItem(SupplierOrderItemId::new(unit.id.as_u64()));
    unit.warehouse_id = Some(WAREHOUSE);
    unit.ordered_quantity = ordered;
    unit.net_price = net_price;
    ledger.persist_unit(unit).unwrap()
}

/// Persists an empty widget buffer unit
pub fn buffer_unit(ledger: &mut StockLedger) -> StockUnitId {
    let mut unit = StockUnit::new(ledger.next_unit_id(), WIDGET);
    unit.warehouse_id = Some(WAREHOUSE);
    ledger.persist_unit(unit).unwrap()
}

pub fn order_item(id: u64, quantity: Decimal) -> SaleItem {
    SaleItem::new(id, SaleKind::Order, Some(WIDGET), quantity)
}

/// Line quantities per unit, oldest assignment first
pub fn placement(ledger: &StockLedger, item: &SaleItem) -> Vec<(StockUnitId, Decimal)> {
    ledger
        .line_assignments(shared::LineId::SaleItem(item.id))
        .iter()
        .map(|a| (a.unit_id, a.sold_quantity))
        .collect()
}
