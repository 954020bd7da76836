//! Keeps a demand line's stock assignments in line with its quantity

use std::sync::Arc;

use rust_decimal::Decimal;
use shared::{validate_quantity, Assignable, LineId, StockAssignmentId, StockUnitState, SubjectId};
use tracing::{info, instrument};

use super::catalog::SubjectResolver;
use super::eligibility::supports_assignments;
use super::ledger::StockLedger;
use super::resolver::{create_unit, ensure_linkable, StockUnitResolver};
use crate::config::EngineSettings;
use crate::error::{AppError, AppResult};

/// Creates, resizes and removes the stock assignments of demand lines
pub struct StockAssigner<R, S> {
    resolver: Arc<R>,
    subjects: Arc<S>,
    settings: EngineSettings,
}

impl<R, S> StockAssigner<R, S>
where
    R: StockUnitResolver,
    S: SubjectResolver,
{
    /// Create a new StockAssigner instance
    pub fn new(resolver: Arc<R>, subjects: Arc<S>, settings: EngineSettings) -> Self {
        Self {
            resolver,
            subjects,
            settings,
        }
    }

    /// Assigns the full quantity of a line that has no assignments yet.
    ///
    /// Units with spare committed supply are filled oldest first; whatever
    /// is left goes to a linkable unit, created if needed, even though that
    /// unit has no supply yet.
    #[instrument(skip(self, ledger, line), fields(line = %line.line_id()))]
    pub fn create_assignments<L>(&self, ledger: &mut StockLedger, line: &L) -> AppResult<()>
    where
        L: Assignable + ?Sized,
    {
        let id = line.line_id();
        let subject = self.eligible_subject(line)?;
        if !ledger.line_assignments(id).is_empty() {
            return Err(AppError::AssignmentsAlreadyExist(id));
        }

        let quantity = line.assignable_quantity();
        validate_quantity(quantity).map_err(|m| AppError::validation("quantity", m))?;
        if quantity.is_zero() {
            return Ok(());
        }

        let remaining = self.fill_pending_or_ready(ledger, id, subject, quantity)?;
        if remaining > Decimal::ZERO {
            self.assign_to_buffer(ledger, id, subject, remaining)?;
        }

        self.ensure_fully_assigned(ledger, line)?;
        info!(%quantity, assignments = ledger.line_assignments(id).len(), "Assignments created");
        Ok(())
    }

    /// Applies a change of `delta` to the quantity of a line that already
    /// has assignments. The line must already demand its new quantity.
    #[instrument(skip(self, ledger, line), fields(line = %line.line_id()))]
    pub fn dispatch_quantity_change<L>(
        &self,
        ledger: &mut StockLedger,
        line: &L,
        delta: Decimal,
    ) -> AppResult<()>
    where
        L: Assignable + ?Sized,
    {
        let id = line.line_id();
        let subject = self.eligible_subject(line)?;
        if delta.is_zero() {
            return Ok(());
        }
        if ledger.line_assignments(id).is_empty() {
            return Err(AppError::NoAssignments(id));
        }

        let demanded = line.assignable_quantity();
        let assigned = ledger.line_assigned_quantity(id) + delta;
        if assigned != demanded {
            return Err(AppError::QuantityMismatch {
                line: id,
                demanded,
                assigned,
            });
        }

        if delta < Decimal::ZERO {
            self.withdraw(ledger, id, -delta)?;
        } else {
            self.grow(ledger, id, subject, delta)?;
        }

        self.ensure_fully_assigned(ledger, line)?;
        info!(%delta, "Quantity change dispatched");
        Ok(())
    }

    /// Removes every assignment of the line. Units are kept.
    #[instrument(skip(self, ledger))]
    pub fn remove_assignments(&self, ledger: &mut StockLedger, line: LineId) -> AppResult<Decimal> {
        let assignments: Vec<(StockAssignmentId, Decimal)> = ledger
            .line_assignments(line)
            .iter()
            .map(|a| (a.id, a.shipped_quantity))
            .collect();

        let shipped: Decimal = assignments.iter().map(|(_, shipped)| *shipped).sum();
        if shipped > Decimal::ZERO {
            return Err(AppError::ShippedQuantityLocked {
                line,
                remaining: shipped,
            });
        }

        let mut removed = Decimal::ZERO;
        for (id, _) in assignments {
            removed += ledger.remove_assignment(id)?.sold_quantity;
        }

        info!(%removed, "Assignments removed");
        Ok(removed)
    }

    /// Brings the line's assignments to its current quantity, whichever
    /// operation that takes.
    pub fn sync_assignments<L>(&self, ledger: &mut StockLedger, line: &L) -> AppResult<()>
    where
        L: Assignable + ?Sized,
    {
        let id = line.line_id();
        if !supports_assignments(line, self.subjects.as_ref()) {
            if !ledger.line_assignments(id).is_empty() {
                self.remove_assignments(ledger, id)?;
            }
            return Ok(());
        }

        if ledger.line_assignments(id).is_empty() {
            return self.create_assignments(ledger, line);
        }
        let delta = line.assignable_quantity() - ledger.line_assigned_quantity(id);
        self.dispatch_quantity_change(ledger, line, delta)
    }

    fn eligible_subject<L>(&self, line: &L) -> AppResult<SubjectId>
    where
        L: Assignable + ?Sized,
    {
        let id = line.line_id();
        if !supports_assignments(line, self.subjects.as_ref()) {
            return Err(AppError::IneligibleLine(id));
        }
        line.subject_id().ok_or(AppError::IneligibleLine(id))
    }

    /// Takes spare committed supply from pending or ready units, oldest
    /// first. Returns what could not be placed.
    fn fill_pending_or_ready(
        &self,
        ledger: &mut StockLedger,
        line: LineId,
        subject: SubjectId,
        quantity: Decimal,
    ) -> AppResult<Decimal> {
        let mut remaining = quantity;
        for unit in self.resolver.find_pending_or_ready(ledger, subject, None) {
            if remaining <= Decimal::ZERO {
                break;
            }
            if ledger.unit(unit)?.is_unbounded() {
                continue;
            }
            let available = ledger.reservable_quantity(unit)?.min(remaining);
            if available > Decimal::ZERO {
                ledger.assign(line, unit, available)?;
                remaining -= available;
            }
        }
        Ok(remaining)
    }

    /// Places demand no supplied unit can take on the subject's linkable
    /// unit, creating one when there is none.
    fn assign_to_buffer(
        &self,
        ledger: &mut StockLedger,
        line: LineId,
        subject: SubjectId,
        quantity: Decimal,
    ) -> AppResult<()> {
        let unit = match self.resolver.find_linkable(ledger, subject) {
            Some(unit) => {
                ensure_linkable(ledger, unit, subject)?;
                unit
            }
            None => create_unit(
                self.resolver.as_ref(),
                &self.settings,
                ledger,
                subject,
                None,
            )?,
        };

        ledger.assign(line, unit, quantity)?;
        Ok(())
    }

    /// Withdraws demand from the newest assignments first.
    fn withdraw(&self, ledger: &mut StockLedger, line: LineId, quantity: Decimal) -> AppResult<()> {
        let assignments: Vec<(StockAssignmentId, Decimal)> = ledger
            .line_assignments(line)
            .iter()
            .rev()
            .map(|a| (a.id, a.unshipped_quantity()))
            .collect();

        let mut remaining = quantity;
        for (id, unshipped) in assignments {
            if remaining <= Decimal::ZERO {
                break;
            }
            let quantity = unshipped.min(remaining);
            if quantity > Decimal::ZERO {
                ledger.withdraw(id, quantity)?;
                remaining -= quantity;
            }
        }

        if remaining > Decimal::ZERO {
            return Err(AppError::ShippedQuantityLocked { line, remaining });
        }
        Ok(())
    }

    /// Grows the line's existing assignments within their units' spare
    /// supply, then falls back to the same search as a fresh line.
    fn grow(
        &self,
        ledger: &mut StockLedger,
        line: LineId,
        subject: SubjectId,
        quantity: Decimal,
    ) -> AppResult<()> {
        let units: Vec<_> = ledger
            .line_assignments(line)
            .iter()
            .map(|a| a.unit_id)
            .collect();

        let mut remaining = quantity;
        let mut buffer = None;
        for unit_id in units {
            let unit = ledger.unit(unit_id)?;
            if unit.is_unbounded() {
                if unit.is_linkable() {
                    buffer.get_or_insert(unit_id);
                }
                continue;
            }
            if unit.state == StockUnitState::Closed || remaining <= Decimal::ZERO {
                continue;
            }
            let available = ledger.reservable_quantity(unit_id)?.min(remaining);
            if available > Decimal::ZERO {
                ledger.assign(line, unit_id, available)?;
                remaining -= available;
            }
        }

        if remaining > Decimal::ZERO {
            remaining = self.fill_pending_or_ready(ledger, line, subject, remaining)?;
        }
        if remaining > Decimal::ZERO {
            match buffer {
                Some(unit) => {
                    ledger.assign(line, unit, remaining)?;
                }
                None => self.assign_to_buffer(ledger, line, subject, remaining)?,
            }
        }
        Ok(())
    }

    fn ensure_fully_assigned<L>(&self, ledger: &StockLedger, line: &L) -> AppResult<()>
    where
        L: Assignable + ?Sized,
    {
        let id = line.line_id();
        let assigned = ledger.line_assigned_quantity(id);
        let demanded = line.assignable_quantity();
        if assigned != demanded {
            return Err(AppError::QuantityMismatch {
                line: id,
                demanded,
                assigned,
            });
        }
        Ok(())
    }
}
