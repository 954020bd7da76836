//! Unit costs of demand lines, weighted by the stock units they draw from

use std::collections::HashMap;
use std::sync::Arc;

use rust_decimal::Decimal;
use shared::{Assignable, Cost, LineId, Subject, SubjectId};
use tracing::{debug, instrument};

use super::catalog::SubjectResolver;
use super::ledger::StockLedger;
use crate::error::{AppError, AppResult};

/// Guesses a default unit cost for a subject
pub trait SubjectCostGuesser {
    fn guess(&self, subject: &Subject) -> Option<Cost>;
}

/// Guesses from the subject's last known purchase cost
#[derive(Debug, Clone, Copy, Default)]
pub struct PurchaseCostGuesser;

impl SubjectCostGuesser for PurchaseCostGuesser {
    fn guess(&self, subject: &Subject) -> Option<Cost> {
        subject.purchase_cost
    }
}

/// Computes line and subject costs for one reporting pass.
///
/// Results are cached until [`CostCalculator::clear`] is called; clear it
/// whenever assignments may have changed.
pub struct CostCalculator<S, G> {
    subjects: Arc<S>,
    guesser: Arc<G>,
    subject_costs: HashMap<SubjectId, Cost>,
    line_costs: HashMap<LineId, Cost>,
}

impl<S, G> CostCalculator<S, G>
where
    S: SubjectResolver,
    G: SubjectCostGuesser,
{
    pub fn new(subjects: Arc<S>, guesser: Arc<G>) -> Self {
        Self {
            subjects,
            guesser,
            subject_costs: HashMap::new(),
            line_costs: HashMap::new(),
        }
    }

    /// Drops every cached cost
    pub fn clear(&mut self) {
        self.subject_costs.clear();
        self.line_costs.clear();
    }

    /// Guessed unit cost of a subject, or an unknown zero cost
    pub fn subject_cost(&mut self, subject: Option<SubjectId>) -> Cost {
        let Some(id) = subject else {
            return Cost::unknown();
        };
        if let Some(cost) = self.subject_costs.get(&id) {
            return *cost;
        }

        let cost = self
            .subjects
            .resolve(id)
            .and_then(|subject| self.guesser.guess(subject))
            .unwrap_or_else(Cost::unknown);
        self.subject_costs.insert(id, cost);
        cost
    }

    /// Weighted average unit cost of a line over its assignments.
    ///
    /// Assignments on units without a known cost contribute the subject's
    /// guessed cost and flag the whole result as averaged.
    #[instrument(skip(self, ledger, line), fields(line = %line.line_id()))]
    pub fn assignable_cost<L>(&mut self, ledger: &StockLedger, line: &L) -> AppResult<Cost>
    where
        L: Assignable + ?Sized,
    {
        let id = line.line_id();
        if let Some(cost) = self.line_costs.get(&id) {
            return Ok(*cost);
        }

        let mut total = Cost::default();
        let mut quantity = Decimal::ZERO;
        for assignment in ledger.line_assignments(id) {
            let unit = ledger.unit(assignment.unit_id)?;
            let cost = match unit.unit_cost() {
                Some(cost) => cost,
                None => self.subject_cost(Some(unit.subject_id)).as_average(),
            };
            total = cost
                .checked_mul(assignment.sold_quantity)
                .and_then(|weighted| total.checked_add(weighted))
                .ok_or(AppError::CostOverflow(id))?;
            quantity = quantity
                .checked_add(assignment.sold_quantity)
                .ok_or(AppError::CostOverflow(id))?;
        }

        let cost = if quantity.is_zero() {
            self.subject_cost(line.subject_id())
        } else {
            match total.checked_div(quantity) {
                Some(cost) => cost,
                None => self.subject_cost(line.subject_id()),
            }
        };

        debug!(
            %quantity,
            product = %cost.product,
            shipping = %cost.shipping,
            average = cost.is_average(),
            "Line cost computed"
        );
        self.line_costs.insert(id, cost);
        Ok(cost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::catalog::SubjectCatalog;
    use rust_decimal_macros::dec;
    use shared::{SaleItem, SaleKind};

    fn calculator(purchase_cost: Option<Cost>) -> CostCalculator<SubjectCatalog, PurchaseCostGuesser> {
        let mut subject = Subject::new(SubjectId::new(1), "WDG", "Widget");
        subject.purchase_cost = purchase_cost;
        CostCalculator::new(
            Arc::new(SubjectCatalog::new().with(subject)),
            Arc::new(PurchaseCostGuesser),
        )
    }

    #[test]
    fn test_subject_cost_uses_guess() {
        let mut calculator = calculator(Some(Cost::new(dec!(4), dec!(1))));
        let cost = calculator.subject_cost(Some(SubjectId::new(1)));
        assert_eq!(cost, Cost::new(dec!(4), dec!(1)));
        assert!(!cost.is_average());
    }

    #[test]
    fn test_subject_cost_unknown_is_flagged() {
        let mut calculator = calculator(None);
        assert_eq!(calculator.subject_cost(Some(SubjectId::new(1))), Cost::unknown());
        assert_eq!(calculator.subject_cost(Some(SubjectId::new(9))), Cost::unknown());
        assert_eq!(calculator.subject_cost(None), Cost::unknown());
    }

    #[test]
    fn test_line_without_assignments_uses_subject_cost() {
        let mut calculator = calculator(Some(Cost::new(dec!(4), dec!(0))));
        let ledger = StockLedger::new();
        let item = SaleItem::new(1, SaleKind::Order, Some(SubjectId::new(1)), dec!(2));

        let cost = calculator.assignable_cost(&ledger, &item).unwrap();
        assert_eq!(cost.total(), dec!(4));
    }
}
