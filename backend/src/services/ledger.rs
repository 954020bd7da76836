//! In-memory unit of work holding stock units and their assignments
//!
//! Every quantity change goes through the ledger so that a unit's sold and
//! shipped quantities are always the sums of its assignments, and its state
//! always reflects them.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::Utc;
use rust_decimal::Decimal;
use shared::{
    validate_positive_quantity, LineId, StockAssignment, StockAssignmentId, StockUnit,
    StockUnitId, StockUnitState, SubjectId,
};
use tracing::debug;

use crate::error::{AppError, AppResult};

/// Stock units and assignments of one unit of work
#[derive(Debug, Default)]
pub struct StockLedger {
    units: BTreeMap<StockUnitId, StockUnit>,
    assignments: BTreeMap<StockAssignmentId, StockAssignment>,
    by_unit: HashMap<StockUnitId, BTreeSet<StockAssignmentId>>,
    by_line: HashMap<LineId, BTreeSet<StockAssignmentId>>,
    next_unit_id: u64,
    next_assignment_id: u64,
}

impl StockLedger {
    pub fn new() -> Self {
        Self {
            next_unit_id: 1,
            next_assignment_id: 1,
            ..Default::default()
        }
    }

    // ------------------------------------------------------------------
    // Stock units
    // ------------------------------------------------------------------

    /// Identifier the next persisted unit should carry
    pub fn next_unit_id(&self) -> StockUnitId {
        StockUnitId::new(self.next_unit_id.max(1))
    }

    /// Makes a unit visible to subsequent queries of this unit of work
    pub fn persist_unit(&mut self, unit: StockUnit) -> AppResult<StockUnitId> {
        let id = unit.id;
        if self.units.contains_key(&id) {
            return Err(AppError::ContractViolation(format!(
                "stock unit {} is already persisted",
                id
            )));
        }

        self.units.insert(id, unit);
        self.next_unit_id = self.next_unit_id.max(id.as_u64() + 1);
        self.refresh_state(id)?;

        debug!(unit = %id, "Stock unit persisted");
        Ok(id)
    }

    pub fn unit(&self, id: StockUnitId) -> AppResult<&StockUnit> {
        self.units.get(&id).ok_or(AppError::StockUnitNotFound(id))
    }

    pub(crate) fn unit_mut(&mut self, id: StockUnitId) -> AppResult<&mut StockUnit> {
        self.units.get_mut(&id).ok_or(AppError::StockUnitNotFound(id))
    }

    pub fn units(&self) -> impl Iterator<Item = &StockUnit> {
        self.units.values()
    }

    /// Units of a subject, oldest first
    pub fn units_by_subject(&self, subject: SubjectId) -> Vec<&StockUnit> {
        self.units
            .values()
            .filter(|unit| unit.subject_id == subject)
            .collect()
    }

    // ------------------------------------------------------------------
    // Aggregates
    // ------------------------------------------------------------------

    pub fn sold_quantity(&self, unit: StockUnitId) -> Decimal {
        self.unit_assignments(unit)
            .iter()
            .map(|a| a.sold_quantity)
            .sum()
    }

    pub fn shipped_quantity(&self, unit: StockUnitId) -> Decimal {
        self.unit_assignments(unit)
            .iter()
            .map(|a| a.shipped_quantity)
            .sum()
    }

    /// Assigned demand in excess of the unit's committed supply
    pub fn overflow(&self, unit: StockUnitId) -> AppResult<Decimal> {
        Ok(self.unit(unit)?.overflow(self.sold_quantity(unit)))
    }

    pub fn reservable_quantity(&self, unit: StockUnitId) -> AppResult<Decimal> {
        Ok(self.unit(unit)?.reservable_quantity(self.sold_quantity(unit)))
    }

    /// Total demand assigned to all units of a subject
    pub fn subject_sold_quantity(&self, subject: SubjectId) -> Decimal {
        self.units_by_subject(subject)
            .iter()
            .map(|unit| self.sold_quantity(unit.id))
            .sum()
    }

    // ------------------------------------------------------------------
    // Assignments
    // ------------------------------------------------------------------

    pub fn assignment(&self, id: StockAssignmentId) -> AppResult<&StockAssignment> {
        self.assignments
            .get(&id)
            .ok_or(AppError::AssignmentNotFound(id))
    }

    /// Assignments resting on a unit, oldest first
    pub fn unit_assignments(&self, unit: StockUnitId) -> Vec<&StockAssignment> {
        self.resolve_ids(self.by_unit.get(&unit))
    }

    /// Assignments of a demand line, oldest first
    pub fn line_assignments(&self, line: LineId) -> Vec<&StockAssignment> {
        self.resolve_ids(self.by_line.get(&line))
    }

    pub fn line_assigned_quantity(&self, line: LineId) -> Decimal {
        self.line_assignments(line)
            .iter()
            .map(|a| a.sold_quantity)
            .sum()
    }

    fn resolve_ids(&self, ids: Option<&BTreeSet<StockAssignmentId>>) -> Vec<&StockAssignment> {
        ids.into_iter()
            .flatten()
            .filter_map(|id| self.assignments.get(id))
            .collect()
    }

    fn find_assignment(&self, line: LineId, unit: StockUnitId) -> Option<StockAssignmentId> {
        self.line_assignments(line)
            .into_iter()
            .find(|a| a.unit_id == unit)
            .map(|a| a.id)
    }

    /// Adds `quantity` of the line's demand to the unit, reusing the line's
    /// existing assignment on that unit if there is one.
    pub fn assign(
        &mut self,
        line: LineId,
        unit: StockUnitId,
        quantity: Decimal,
    ) -> AppResult<StockAssignmentId> {
        validate_positive_quantity(quantity).map_err(|m| AppError::validation("quantity", m))?;
        if self.unit(unit)?.state == StockUnitState::Closed {
            return Err(AppError::ContractViolation(format!(
                "stock unit {} is closed",
                unit
            )));
        }

        let id = match self.find_assignment(line, unit) {
            Some(id) => id,
            None => {
                let id = StockAssignmentId::new(self.next_assignment_id.max(1));
                self.next_assignment_id = id.as_u64() + 1;
                self.assignments
                    .insert(id, StockAssignment::new(id, unit, line));
                self.by_unit.entry(unit).or_default().insert(id);
                self.by_line.entry(line).or_default().insert(id);
                id
            }
        };

        if let Some(assignment) = self.assignments.get_mut(&id) {
            assignment.sold_quantity += quantity;
        }
        self.refresh_state(unit)?;

        debug!(line = %line, unit = %unit, %quantity, "Assigned");
        Ok(id)
    }

    /// Removes `quantity` of unshipped demand from an assignment, dropping
    /// the assignment once nothing is left on it.
    pub fn withdraw(&mut self, id: StockAssignmentId, quantity: Decimal) -> AppResult<()> {
        validate_positive_quantity(quantity).map_err(|m| AppError::validation("quantity", m))?;
        let assignment = self.assignment(id)?;
        if quantity > assignment.unshipped_quantity() {
            return Err(AppError::ContractViolation(format!(
                "cannot withdraw {} from assignment {} holding {} unshipped",
                quantity,
                id,
                assignment.unshipped_quantity()
            )));
        }
        let unit = assignment.unit_id;

        let empty = match self.assignments.get_mut(&id) {
            Some(assignment) => {
                assignment.sold_quantity -= quantity;
                assignment.is_empty()
            }
            None => return Err(AppError::AssignmentNotFound(id)),
        };
        if empty {
            self.remove_assignment(id)?;
        }
        self.refresh_state(unit)?;

        debug!(assignment = %id, unit = %unit, %quantity, "Withdrawn");
        Ok(())
    }

    /// Moves unshipped demand from an assignment to the same line's
    /// assignment on `target`.
    ///
    /// Nothing is withdrawn unless the target can take the quantity.
    pub fn move_quantity(
        &mut self,
        id: StockAssignmentId,
        target: StockUnitId,
        quantity: Decimal,
    ) -> AppResult<StockAssignmentId> {
        validate_positive_quantity(quantity).map_err(|m| AppError::validation("quantity", m))?;
        let assignment = self.assignment(id)?;
        let line = assignment.line_id;
        let source = self.unit(assignment.unit_id)?;
        let target_unit = self.unit(target)?;

        if target_unit.id == source.id {
            return Err(AppError::ContractViolation(format!(
                "cannot move assignment {} onto its own unit {}",
                id, target
            )));
        }
        if target_unit.subject_id != source.subject_id {
            return Err(AppError::ContractViolation(format!(
                "units {} and {} hold different subjects",
                source.id, target
            )));
        }
        if target_unit.state == StockUnitState::Closed {
            return Err(AppError::ContractViolation(format!(
                "stock unit {} is closed",
                target
            )));
        }
        if quantity > assignment.unshipped_quantity() {
            return Err(AppError::ContractViolation(format!(
                "cannot move {} from assignment {} holding {} unshipped",
                quantity,
                id,
                assignment.unshipped_quantity()
            )));
        }

        self.withdraw(id, quantity)?;
        self.assign(line, target, quantity)
    }

    /// Drops an assignment regardless of its quantities.
    pub fn remove_assignment(&mut self, id: StockAssignmentId) -> AppResult<StockAssignment> {
        let assignment = self
            .assignments
            .remove(&id)
            .ok_or(AppError::AssignmentNotFound(id))?;

        if let Some(ids) = self.by_unit.get_mut(&assignment.unit_id) {
            ids.remove(&id);
        }
        if let Some(ids) = self.by_line.get_mut(&assignment.line_id) {
            ids.remove(&id);
            if ids.is_empty() {
                self.by_line.remove(&assignment.line_id);
            }
        }
        self.refresh_state(assignment.unit_id)?;

        Ok(assignment)
    }

    // ------------------------------------------------------------------
    // Shipping
    // ------------------------------------------------------------------

    /// Quantity currently available to ship from an assignment.
    ///
    /// The unit's remaining stock is claimed by its assignments in creation
    /// order; each one gets at most its unshipped sold quantity.
    pub fn shippable_quantity(&self, id: StockAssignmentId) -> AppResult<Decimal> {
        let assignment = self.assignment(id)?;
        let unit = self.unit(assignment.unit_id)?;

        let mut available = (unit.stock_quantity() - self.shipped_quantity(unit.id))
            .max(Decimal::ZERO);
        for other in self.unit_assignments(unit.id) {
            let claimed = other.unshipped_quantity().min(available);
            if other.id == id {
                return Ok(claimed);
            }
            available -= claimed;
        }

        Ok(Decimal::ZERO)
    }

    /// Records a shipment against an assignment
    pub fn ship(&mut self, id: StockAssignmentId, quantity: Decimal) -> AppResult<()> {
        validate_positive_quantity(quantity).map_err(|m| AppError::validation("quantity", m))?;
        let shippable = self.shippable_quantity(id)?;
        if quantity > shippable {
            return Err(AppError::validation(
                "quantity",
                "Quantity exceeds the shippable quantity",
            ));
        }

        let unit = match self.assignments.get_mut(&id) {
            Some(assignment) => {
                assignment.shipped_quantity += quantity;
                assignment.unit_id
            }
            None => return Err(AppError::AssignmentNotFound(id)),
        };
        self.refresh_state(unit)?;

        debug!(assignment = %id, unit = %unit, %quantity, "Shipped");
        Ok(())
    }

    // ------------------------------------------------------------------
    // State
    // ------------------------------------------------------------------

    /// Recomputes a unit's state from its quantities and assignments
    pub(crate) fn refresh_state(&mut self, id: StockUnitId) -> AppResult<()> {
        let sold = self.sold_quantity(id);
        let shipped = self.shipped_quantity(id);
        let unit = self.unit_mut(id)?;

        let state = unit.resolve_state(sold, shipped);
        if state != unit.state {
            debug!(unit = %id, from = %unit.state, to = %state, "Stock unit state changed");
            unit.closed_at = (state == StockUnitState::Closed).then(Utc::now);
            unit.state = state;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use shared::{StockUnitSource, SupplierOrderItemId};

    const LINE: LineId = LineId::SaleItem(1);

    fn ledger_with_unit(ordered: Decimal, received: Decimal) -> (StockLedger, StockUnitId) {
        let mut ledger = StockLedger::new();
        let mut unit = StockUnit::new(ledger.next_unit_id(), SubjectId::new(1));
        unit.source = StockUnitSource::SupplierOrderItem(SupplierOrderItemId::new(1));
        unit.ordered_quantity = ordered;
        unit.received_quantity = received;
        let id = ledger.persist_unit(unit).unwrap();
        (ledger, id)
    }

    #[test]
    fn test_persist_sets_state() {
        let (ledger, id) = ledger_with_unit(dec!(10), dec!(0));
        assert_eq!(ledger.unit(id).unwrap().state, StockUnitState::Pending);
        assert_eq!(ledger.next_unit_id(), StockUnitId::new(2));
    }

    #[test]
    fn test_persist_twice_is_contract_violation() {
        let (mut ledger, id) = ledger_with_unit(dec!(10), dec!(0));
        let duplicate = StockUnit::new(id, SubjectId::new(1));
        assert!(matches!(
            ledger.persist_unit(duplicate),
            Err(AppError::ContractViolation(_))
        ));
    }

    #[test]
    fn test_assign_merges_same_line_and_unit() {
        let (mut ledger, unit) = ledger_with_unit(dec!(10), dec!(0));
        let first = ledger.assign(LINE, unit, dec!(2)).unwrap();
        let second = ledger.assign(LINE, unit, dec!(3)).unwrap();

        assert_eq!(first, second);
        assert_eq!(ledger.sold_quantity(unit), dec!(5));
        assert_eq!(ledger.line_assignments(LINE).len(), 1);
    }

    #[test]
    fn test_withdraw_to_zero_removes_assignment() {
        let (mut ledger, unit) = ledger_with_unit(dec!(10), dec!(0));
        let id = ledger.assign(LINE, unit, dec!(2)).unwrap();
        ledger.withdraw(id, dec!(2)).unwrap();

        assert!(ledger.line_assignments(LINE).is_empty());
        assert!(ledger.assignment(id).is_err());
        assert_eq!(ledger.sold_quantity(unit), Decimal::ZERO);
    }

    #[test]
    fn test_withdraw_cannot_touch_shipped() {
        let (mut ledger, unit) = ledger_with_unit(dec!(10), dec!(10));
        let id = ledger.assign(LINE, unit, dec!(4)).unwrap();
        ledger.ship(id, dec!(3)).unwrap();

        assert!(ledger.withdraw(id, dec!(2)).is_err());
        ledger.withdraw(id, dec!(1)).unwrap();
        assert_eq!(ledger.assignment(id).unwrap().sold_quantity, dec!(3));
    }

    #[test]
    fn test_shippable_claimed_in_creation_order() {
        let (mut ledger, unit) = ledger_with_unit(dec!(10), dec!(5));
        let first = ledger.assign(LineId::SaleItem(1), unit, dec!(4)).unwrap();
        let second = ledger.assign(LineId::SaleItem(2), unit, dec!(4)).unwrap();

        assert_eq!(ledger.shippable_quantity(first).unwrap(), dec!(4));
        assert_eq!(ledger.shippable_quantity(second).unwrap(), dec!(1));

        ledger.ship(first, dec!(4)).unwrap();
        assert_eq!(ledger.shippable_quantity(first).unwrap(), Decimal::ZERO);
        assert_eq!(ledger.shippable_quantity(second).unwrap(), dec!(1));
        assert!(ledger.ship(second, dec!(2)).is_err());
    }

    #[test]
    fn test_unit_closes_when_everything_shipped() {
        let (mut ledger, unit) = ledger_with_unit(dec!(3), dec!(3));
        let id = ledger.assign(LINE, unit, dec!(3)).unwrap();
        ledger.ship(id, dec!(3)).unwrap();

        let unit = ledger.unit(unit).unwrap();
        assert_eq!(unit.state, StockUnitState::Closed);
        assert!(unit.closed_at.is_some());
    }

    #[test]
    fn test_move_quantity_keeps_line_total() {
        let (mut ledger, source) = ledger_with_unit(dec!(10), dec!(0));
        let target = ledger
            .persist_unit(StockUnit::new(ledger.next_unit_id(), SubjectId::new(1)))
            .unwrap();
        let id = ledger.assign(LINE, source, dec!(6)).unwrap();

        ledger.move_quantity(id, target, dec!(4)).unwrap();

        assert_eq!(ledger.sold_quantity(source), dec!(2));
        assert_eq!(ledger.sold_quantity(target), dec!(4));
        assert_eq!(ledger.line_assigned_quantity(LINE), dec!(6));
    }

    #[test]
    fn test_move_to_closed_unit_keeps_demand() {
        let (mut ledger, source) = ledger_with_unit(dec!(10), dec!(0));
        let mut closed = StockUnit::new(ledger.next_unit_id(), SubjectId::new(1));
        closed.source = StockUnitSource::SupplierOrderItem(SupplierOrderItemId::new(2));
        closed.ordered_quantity = dec!(2);
        closed.received_quantity = dec!(2);
        let closed = ledger.persist_unit(closed).unwrap();
        let shipped = ledger.assign(LineId::SaleItem(9), closed, dec!(2)).unwrap();
        ledger.ship(shipped, dec!(2)).unwrap();
        assert_eq!(ledger.unit(closed).unwrap().state, StockUnitState::Closed);

        let id = ledger.assign(LINE, source, dec!(5)).unwrap();
        let result = ledger.move_quantity(id, closed, dec!(3));

        assert!(matches!(result, Err(AppError::ContractViolation(_))));
        assert_eq!(ledger.line_assigned_quantity(LINE), dec!(5));
        assert_eq!(ledger.sold_quantity(source), dec!(5));
    }

    #[test]
    fn test_move_rejected_before_withdrawing() {
        let (mut ledger, source) = ledger_with_unit(dec!(10), dec!(0));
        let other_subject = ledger
            .persist_unit(StockUnit::new(ledger.next_unit_id(), SubjectId::new(2)))
            .unwrap();
        let target = ledger
            .persist_unit(StockUnit::new(ledger.next_unit_id(), SubjectId::new(1)))
            .unwrap();
        let id = ledger.assign(LINE, source, dec!(5)).unwrap();

        assert!(ledger.move_quantity(id, other_subject, dec!(1)).is_err());
        assert!(ledger.move_quantity(id, target, dec!(6)).is_err());
        assert!(ledger.move_quantity(id, source, dec!(1)).is_err());
        assert_eq!(ledger.line_assigned_quantity(LINE), dec!(5));
        assert_eq!(ledger.sold_quantity(target), Decimal::ZERO);
    }
}
