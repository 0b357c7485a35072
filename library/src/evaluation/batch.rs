//! Full re-evaluation of every scheduled node per row.

use std::sync::Arc;

use super::{Evaluator, compute_node};
use crate::config::EvaluationStrategy;
use crate::error::Result;
use crate::model::{ArenaGraph, Binding, NodeId, Schedule};

/// Reference evaluator: a pure function of the graph and the current row.
///
/// Cost per row is proportional to the schedule size regardless of how many
/// inputs changed.
pub struct BatchEvaluator {
    graph: Arc<ArenaGraph>,
    schedule: Schedule,
    values: Vec<f64>,
    scratch: Vec<f64>,
}

impl BatchEvaluator {
    /// Evaluator over the nodes reachable from the graph root.
    pub fn new(graph: Arc<ArenaGraph>) -> Self {
        let schedule = graph.schedule().clone();
        Self::with_schedule(graph, schedule)
    }

    /// Evaluator over the nodes reachable from the root or from `targets`.
    pub fn with_targets(graph: Arc<ArenaGraph>, targets: &[NodeId]) -> Result<Self> {
        let schedule = graph.schedule_for(targets)?;
        Ok(Self::with_schedule(graph, schedule))
    }

    fn with_schedule(graph: Arc<ArenaGraph>, schedule: Schedule) -> Self {
        let len = graph.len();
        Self {
            graph,
            schedule,
            values: vec![0.0; len],
            scratch: Vec::new(),
        }
    }

    /// Evaluate `binding` into a freshly allocated value array.
    ///
    /// Does not touch `self`; repeated calls with the same row return the
    /// same array.
    pub fn compute(&self, binding: &dyn Binding) -> Result<Vec<f64>> {
        let mut values = vec![0.0; self.graph.len()];
        run(&self.graph, &self.schedule, &mut values, &mut Vec::new(), binding)?;
        Ok(values)
    }
}

fn run(
    graph: &ArenaGraph,
    schedule: &Schedule,
    values: &mut [f64],
    scratch: &mut Vec<f64>,
    binding: &dyn Binding,
) -> Result<()> {
    let nodes = graph.nodes();
    for &id in schedule.order() {
        values[id] = compute_node(id, &nodes[id], values, scratch, binding)?;
    }
    Ok(())
}

impl Evaluator for BatchEvaluator {
    fn graph(&self) -> &Arc<ArenaGraph> {
        &self.graph
    }

    fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    fn strategy(&self) -> EvaluationStrategy {
        EvaluationStrategy::Batch
    }

    fn evaluate(&mut self, binding: &dyn Binding) -> Result<&[f64]> {
        // Every scheduled slot is overwritten, so nothing from the previous
        // row survives a successful call.
        run(
            &self.graph,
            &self.schedule,
            &mut self.values,
            &mut self.scratch,
            binding,
        )?;
        Ok(&self.values)
    }
}
