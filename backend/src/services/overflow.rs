//! Repairs stock units whose assigned demand no longer matches their
//! committed supply

use std::sync::Arc;

use rust_decimal::Decimal;
use shared::{SortDirection, StockUnitId, SubjectId};
use tracing::{debug, info, instrument, warn};

use super::dispatcher::AssignmentDispatcher;
use super::ledger::StockLedger;
use super::resolver::{create_unit, ensure_linkable, StockUnitResolver};
use crate::config::EngineSettings;
use crate::error::{AppError, AppResult};

/// Whether a repair moved any quantity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepairOutcome {
    Changed,
    Unchanged,
}

impl RepairOutcome {
    pub fn is_changed(&self) -> bool {
        matches!(self, RepairOutcome::Changed)
    }

    fn from_moved(moved: Decimal) -> Self {
        if moved > Decimal::ZERO {
            RepairOutcome::Changed
        } else {
            RepairOutcome::Unchanged
        }
    }
}

/// Restores `sold <= ordered + adjusted` on a unit after its supply changed
pub struct OverflowHandler<R, D> {
    resolver: Arc<R>,
    dispatcher: Arc<D>,
    settings: EngineSettings,
}

impl<R, D> OverflowHandler<R, D>
where
    R: StockUnitResolver,
    D: AssignmentDispatcher,
{
    /// Create a new OverflowHandler instance
    pub fn new(resolver: Arc<R>, dispatcher: Arc<D>, settings: EngineSettings) -> Self {
        Self {
            resolver,
            dispatcher,
            settings,
        }
    }

    /// Repairs one unit.
    ///
    /// Excess demand always finds a home: other pending or ready units
    /// first, then the subject's linkable unit, then a new unit. Slack is
    /// only filled from the linkable unit, and only when there is one.
    #[instrument(skip(self, ledger))]
    pub fn handle(&self, ledger: &mut StockLedger, unit: StockUnitId) -> AppResult<RepairOutcome> {
        let overflow = ledger.overflow(unit)?;

        let outcome = if overflow > Decimal::ZERO {
            self.resolve_excess(ledger, unit, overflow)?
        } else if overflow < Decimal::ZERO {
            self.fill_slack(ledger, unit, -overflow)?
        } else {
            RepairOutcome::Unchanged
        };

        debug!(%overflow, ?outcome, "Overflow handled");
        Ok(outcome)
    }

    /// Repairs every unit of the subject, supplied units first.
    pub fn handle_subject(
        &self,
        ledger: &mut StockLedger,
        subject: SubjectId,
    ) -> AppResult<RepairOutcome> {
        let mut units: Vec<(bool, StockUnitId)> = ledger
            .units_by_subject(subject)
            .iter()
            .map(|unit| (!unit.has_supply_source(), unit.id))
            .collect();
        units.sort();

        let mut outcome = RepairOutcome::Unchanged;
        for (_, unit) in units {
            if self.handle(ledger, unit)?.is_changed() {
                outcome = RepairOutcome::Changed;
            }
        }
        Ok(outcome)
    }

    fn resolve_excess(
        &self,
        ledger: &mut StockLedger,
        unit: StockUnitId,
        overflow: Decimal,
    ) -> AppResult<RepairOutcome> {
        let (subject, sourced) = {
            let found = ledger.unit(unit)?;
            (found.subject_id, found.has_supply_source())
        };

        // Shipped quantity stays where it is; if the excess is larger than
        // what is still unshipped, the supply chain upstream is broken.
        let movable = ledger.sold_quantity(unit) - ledger.shipped_quantity(unit);
        if overflow > movable {
            return Err(AppError::ShippedOverflow {
                unit,
                overflow,
                movable,
            });
        }

        let direction = self.settings.overflow_sort;
        let mut remaining = overflow;

        for target in self.resolver.find_pending_or_ready(ledger, subject, Some(unit)) {
            if remaining <= Decimal::ZERO {
                break;
            }
            if ledger.unit(target)?.is_unbounded() {
                continue;
            }
            remaining -= self
                .dispatcher
                .move_assignments(ledger, unit, target, remaining, direction)?;
        }

        // An unsupplied unit is itself where waiting demand belongs.
        if !sourced {
            if remaining > Decimal::ZERO {
                debug!(%unit, %remaining, "Demand left on unsupplied unit");
            }
            return Ok(RepairOutcome::from_moved(overflow - remaining));
        }

        if remaining > Decimal::ZERO {
            if let Some(linkable) = self.resolver.find_linkable(ledger, subject) {
                if linkable != unit {
                    ensure_linkable(ledger, linkable, subject)?;
                    remaining -= self
                        .dispatcher
                        .move_assignments(ledger, unit, linkable, remaining, direction)?;
                }
            }
        }

        if remaining > Decimal::ZERO {
            let created = create_unit(
                self.resolver.as_ref(),
                &self.settings,
                ledger,
                subject,
                Some(unit),
            )?;
            remaining -= self
                .dispatcher
                .move_assignments(ledger, unit, created, remaining, direction)?;
        }

        if remaining > Decimal::ZERO {
            warn!(%unit, %remaining, "Overflow could not be redistributed");
            return Err(AppError::UnresolvedOverflow { unit, remaining });
        }

        info!(%unit, %overflow, "Overflow redistributed");
        Ok(RepairOutcome::from_moved(overflow))
    }

    fn fill_slack(
        &self,
        ledger: &mut StockLedger,
        unit: StockUnitId,
        slack: Decimal,
    ) -> AppResult<RepairOutcome> {
        let subject = ledger.unit(unit)?.subject_id;
        let Some(linkable) = self.resolver.find_linkable(ledger, subject) else {
            return Ok(RepairOutcome::Unchanged);
        };
        if linkable == unit {
            return Ok(RepairOutcome::Unchanged);
        }
        ensure_linkable(ledger, linkable, subject)?;

        let moved = self.dispatcher.move_assignments(
            ledger,
            linkable,
            unit,
            slack,
            SortDirection::OldestFirst,
        )?;
        if moved > Decimal::ZERO {
            info!(%unit, from = %linkable, %moved, "Slack filled from linkable unit");
        }
        Ok(RepairOutcome::from_moved(moved))
    }
}
