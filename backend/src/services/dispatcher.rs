//! Moves assigned demand from one stock unit to another

use rust_decimal::Decimal;
use shared::{validate_quantity, SortDirection, StockAssignmentId, StockUnitId, StockUnitState};
use tracing::debug;

use super::ledger::StockLedger;
use crate::error::{AppError, AppResult};

/// Moves a bounded quantity of demand between two units
pub trait AssignmentDispatcher {
    /// Moves up to `quantity` from `source` to `target`, drawing from the
    /// source's assignments in `direction` order. Shipped quantity never
    /// moves. Returns the quantity actually moved.
    fn move_assignments(
        &self,
        ledger: &mut StockLedger,
        source: StockUnitId,
        target: StockUnitId,
        quantity: Decimal,
        direction: SortDirection,
    ) -> AppResult<Decimal>;
}

/// Dispatcher bounded by the target's committed supply.
///
/// A target with no supply source and no committed quantity takes any amount.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultAssignmentDispatcher;

impl AssignmentDispatcher for DefaultAssignmentDispatcher {
    fn move_assignments(
        &self,
        ledger: &mut StockLedger,
        source: StockUnitId,
        target: StockUnitId,
        quantity: Decimal,
        direction: SortDirection,
    ) -> AppResult<Decimal> {
        validate_quantity(quantity).map_err(|m| AppError::validation("quantity", m))?;
        if source == target {
            return Err(AppError::ContractViolation(format!(
                "cannot move assignments of unit {} onto itself",
                source
            )));
        }

        let source_subject = ledger.unit(source)?.subject_id;
        let target_unit = ledger.unit(target)?;
        if target_unit.subject_id != source_subject {
            return Err(AppError::ContractViolation(format!(
                "units {} and {} hold different subjects",
                source, target
            )));
        }
        if target_unit.state == StockUnitState::Closed || quantity.is_zero() {
            return Ok(Decimal::ZERO);
        }

        let limit = if target_unit.is_unbounded() {
            quantity
        } else {
            quantity.min(ledger.reservable_quantity(target)?)
        };

        let mut candidates: Vec<(StockAssignmentId, Decimal)> = ledger
            .unit_assignments(source)
            .iter()
            .map(|a| (a.id, a.unshipped_quantity()))
            .filter(|(_, movable)| *movable > Decimal::ZERO)
            .collect();
        if direction == SortDirection::NewestFirst {
            candidates.reverse();
        }

        let mut remaining = limit;
        for (id, movable) in candidates {
            if remaining <= Decimal::ZERO {
                break;
            }
            let quantity = movable.min(remaining);
            ledger.move_quantity(id, target, quantity)?;
            remaining -= quantity;
        }

        let moved = limit - remaining;
        debug!(%source, %target, %moved, direction = direction.as_str(), "Assignments moved");
        Ok(moved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use shared::{LineId, StockUnit, StockUnitSource, SubjectId, SupplierOrderItemId};

    fn sourced(ledger: &mut StockLedger, ordered: Decimal) -> StockUnitId {
        let mut unit = StockUnit::new(ledger.next_unit_id(), SubjectId::new(1));
        unit.source = StockUnitSource::SupplierOrderItem(SupplierOrderItemId::new(1));
        unit.ordered_quantity = ordered;
        ledger.persist_unit(unit).unwrap()
    }

    #[test]
    fn test_move_newest_first() {
        let mut ledger = StockLedger::new();
        let source = sourced(&mut ledger, dec!(10));
        let target = sourced(&mut ledger, dec!(10));
        ledger.assign(LineId::SaleItem(1), source, dec!(4)).unwrap();
        ledger.assign(LineId::SaleItem(2), source, dec!(4)).unwrap();

        let moved = DefaultAssignmentDispatcher
            .move_assignments(&mut ledger, source, target, dec!(5), SortDirection::NewestFirst)
            .unwrap();

        assert_eq!(moved, dec!(5));
        assert_eq!(ledger.line_assignments(LineId::SaleItem(2))[0].unit_id, target);
        assert_eq!(ledger.line_assigned_quantity(LineId::SaleItem(2)), dec!(4));
        let line_one: Vec<_> = ledger
            .line_assignments(LineId::SaleItem(1))
            .iter()
            .map(|a| (a.unit_id, a.sold_quantity))
            .collect();
        assert_eq!(line_one, vec![(source, dec!(3)), (target, dec!(1))]);
    }

    #[test]
    fn test_move_oldest_first() {
        let mut ledger = StockLedger::new();
        let source = sourced(&mut ledger, dec!(10));
        let target = sourced(&mut ledger, dec!(10));
        ledger.assign(LineId::SaleItem(1), source, dec!(4)).unwrap();
        ledger.assign(LineId::SaleItem(2), source, dec!(4)).unwrap();

        DefaultAssignmentDispatcher
            .move_assignments(&mut ledger, source, target, dec!(4), SortDirection::OldestFirst)
            .unwrap();

        assert_eq!(ledger.line_assignments(LineId::SaleItem(1))[0].unit_id, target);
        assert_eq!(ledger.line_assignments(LineId::SaleItem(2))[0].unit_id, source);
    }

    #[test]
    fn test_move_capped_by_target_reservable() {
        let mut ledger = StockLedger::new();
        let source = sourced(&mut ledger, dec!(10));
        let target = sourced(&mut ledger, dec!(3));
        ledger.assign(LineId::SaleItem(1), source, dec!(8)).unwrap();

        let moved = DefaultAssignmentDispatcher
            .move_assignments(&mut ledger, source, target, dec!(8), SortDirection::NewestFirst)
            .unwrap();

        assert_eq!(moved, dec!(3));
        assert_eq!(ledger.sold_quantity(target), dec!(3));
    }

    #[test]
    fn test_move_to_buffer_is_unbounded() {
        let mut ledger = StockLedger::new();
        let source = sourced(&mut ledger, dec!(10));
        let buffer = ledger
            .persist_unit(StockUnit::new(ledger.next_unit_id(), SubjectId::new(1)))
            .unwrap();
        ledger.assign(LineId::SaleItem(1), source, dec!(8)).unwrap();

        let moved = DefaultAssignmentDispatcher
            .move_assignments(&mut ledger, source, buffer, dec!(8), SortDirection::NewestFirst)
            .unwrap();

        assert_eq!(moved, dec!(8));
    }

    #[test]
    fn test_shipped_quantity_never_moves() {
        let mut ledger = StockLedger::new();
        let source = sourced(&mut ledger, dec!(10));
        ledger.unit_mut(source).unwrap().received_quantity = dec!(10);
        let target = sourced(&mut ledger, dec!(10));
        let id = ledger.assign(LineId::SaleItem(1), source, dec!(6)).unwrap();
        ledger.ship(id, dec!(4)).unwrap();

        let moved = DefaultAssignmentDispatcher
            .move_assignments(&mut ledger, source, target, dec!(6), SortDirection::NewestFirst)
            .unwrap();

        assert_eq!(moved, dec!(2));
        assert_eq!(ledger.assignment(id).unwrap().sold_quantity, dec!(4));
    }

    #[test]
    fn test_move_onto_itself_is_rejected() {
        let mut ledger = StockLedger::new();
        let unit = sourced(&mut ledger, dec!(10));

        assert!(DefaultAssignmentDispatcher
            .move_assignments(&mut ledger, unit, unit, dec!(1), SortDirection::NewestFirst)
            .is_err());
    }
}
