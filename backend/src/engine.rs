//! Wiring of the engine services around shared collaborators

use std::sync::Arc;

use shared::WarehouseId;

use crate::config::{Config, EngineSettings};
use crate::services::{
    AssignmentDispatcher, CostCalculator, DefaultAssignmentDispatcher, DefaultStockUnitResolver,
    OverflowHandler, StockAssigner, StockUnitResolver, StockUnitUpdater, SubjectCatalog,
    SubjectCostGuesser, SubjectResolver,
};

/// Engine services sharing one resolver, dispatcher and subject catalog
pub struct StockEngine<
    R = DefaultStockUnitResolver,
    D = DefaultAssignmentDispatcher,
    S = SubjectCatalog,
> {
    pub assigner: StockAssigner<R, S>,
    pub overflow: Arc<OverflowHandler<R, D>>,
    pub updater: StockUnitUpdater<R, D>,
    subjects: Arc<S>,
    settings: EngineSettings,
}

impl<R, D, S> StockEngine<R, D, S>
where
    R: StockUnitResolver,
    D: AssignmentDispatcher,
    S: SubjectResolver,
{
    pub fn new(resolver: Arc<R>, dispatcher: Arc<D>, subjects: Arc<S>, settings: EngineSettings) -> Self {
        let overflow = Arc::new(OverflowHandler::new(
            Arc::clone(&resolver),
            dispatcher,
            settings,
        ));

        Self {
            assigner: StockAssigner::new(resolver, Arc::clone(&subjects), settings),
            updater: StockUnitUpdater::new(Arc::clone(&overflow)),
            overflow,
            subjects,
            settings,
        }
    }

    pub fn settings(&self) -> EngineSettings {
        self.settings
    }

    /// A fresh cost calculator for one reporting pass
    pub fn cost_calculator<G>(&self, guesser: Arc<G>) -> CostCalculator<S, G>
    where
        G: SubjectCostGuesser,
    {
        CostCalculator::new(Arc::clone(&self.subjects), guesser)
    }
}

impl StockEngine {
    /// Builds the engine with the default collaborators
    pub fn from_config(
        config: &Config,
        subjects: SubjectCatalog,
        default_warehouse: Option<WarehouseId>,
    ) -> Self {
        tracing::info!(
            environment = %config.environment,
            allow_unit_creation = config.engine.allow_unit_creation,
            overflow_sort = config.engine.overflow_sort.as_str(),
            "Stock engine configured"
        );

        Self::new(
            Arc::new(DefaultStockUnitResolver::new(default_warehouse)),
            Arc::new(DefaultAssignmentDispatcher),
            Arc::new(subjects),
            config.engine,
        )
    }
}
