//! Stock unit lookup and creation

use shared::{StockUnit, StockUnitId, SubjectId, WarehouseId};
use tracing::info;

use super::ledger::StockLedger;
use crate::config::EngineSettings;
use crate::error::{AppError, AppResult};

/// Finds the units demand can be placed on, and creates new ones
pub trait StockUnitResolver {
    /// Pending or ready units of the subject in priority order, `exclude` left out
    fn find_pending_or_ready(
        &self,
        ledger: &StockLedger,
        subject: SubjectId,
        exclude: Option<StockUnitId>,
    ) -> Vec<StockUnitId>;

    /// A buffer unit with no supply source, if the subject has one
    fn find_linkable(&self, ledger: &StockLedger, subject: SubjectId) -> Option<StockUnitId>;

    /// Builds a new, not yet persisted, unit for the subject.
    ///
    /// `context` is the unit the new one is created alongside, if any.
    fn create_by_subject(
        &self,
        ledger: &StockLedger,
        subject: SubjectId,
        context: Option<&StockUnit>,
    ) -> AppResult<StockUnit>;
}

/// Oldest-first resolver over the ledger
#[derive(Debug, Clone, Default)]
pub struct DefaultStockUnitResolver {
    default_warehouse: Option<WarehouseId>,
}

impl DefaultStockUnitResolver {
    pub fn new(default_warehouse: Option<WarehouseId>) -> Self {
        Self { default_warehouse }
    }
}

impl StockUnitResolver for DefaultStockUnitResolver {
    fn find_pending_or_ready(
        &self,
        ledger: &StockLedger,
        subject: SubjectId,
        exclude: Option<StockUnitId>,
    ) -> Vec<StockUnitId> {
        ledger
            .units_by_subject(subject)
            .into_iter()
            .filter(|unit| unit.state.is_pending_or_ready())
            .filter(|unit| Some(unit.id) != exclude)
            .map(|unit| unit.id)
            .collect()
    }

    fn find_linkable(&self, ledger: &StockLedger, subject: SubjectId) -> Option<StockUnitId> {
        ledger
            .units_by_subject(subject)
            .into_iter()
            .find(|unit| unit.is_linkable())
            .map(|unit| unit.id)
    }

    fn create_by_subject(
        &self,
        ledger: &StockLedger,
        subject: SubjectId,
        context: Option<&StockUnit>,
    ) -> AppResult<StockUnit> {
        let warehouse = context
            .and_then(|unit| unit.warehouse_id)
            .or(self.default_warehouse)
            .ok_or(AppError::NoWarehouse(subject))?;

        let mut unit = StockUnit::new(ledger.next_unit_id(), subject);
        unit.warehouse_id = Some(warehouse);
        Ok(unit)
    }
}

/// Creates and persists a new unit for the subject through the resolver,
/// checking what the resolver hands back.
pub(crate) fn create_unit<R>(
    resolver: &R,
    settings: &EngineSettings,
    ledger: &mut StockLedger,
    subject: SubjectId,
    context: Option<StockUnitId>,
) -> AppResult<StockUnitId>
where
    R: StockUnitResolver + ?Sized,
{
    if !settings.allow_unit_creation {
        return Err(AppError::UnitCreationDisabled(subject));
    }

    let context = match context {
        Some(id) => Some(ledger.unit(id)?.clone()),
        None => None,
    };
    let unit = resolver.create_by_subject(ledger, subject, context.as_ref())?;
    if unit.subject_id != subject || !unit.is_unbounded() {
        return Err(AppError::ContractViolation(format!(
            "resolver created unit {} that is not an empty unit of subject {}",
            unit.id, subject
        )));
    }

    let id = ledger.persist_unit(unit)?;
    info!(unit = %id, %subject, "Stock unit created");
    Ok(id)
}

/// Checks that a unit handed out as linkable really is one
pub(crate) fn ensure_linkable(
    ledger: &StockLedger,
    unit: StockUnitId,
    subject: SubjectId,
) -> AppResult<()> {
    let found = ledger.unit(unit)?;
    if found.subject_id != subject || !found.is_linkable() {
        return Err(AppError::ContractViolation(format!(
            "unit {} is not a linkable unit of subject {}",
            unit, subject
        )));
    }
    Ok(())
}
