//! Evaluation strategies over an [`ArenaGraph`].
//!
//! Both evaluators walk a precomputed [`Schedule`] and call each node kind's
//! eval function with already-resolved operand values. The batch evaluator
//! recomputes every scheduled node per row; the incremental evaluator only
//! recomputes nodes downstream of inputs whose value changed. For the same
//! graph and row sequence the two return bit-identical value arrays.

pub mod batch;
pub mod incremental;

use std::sync::Arc;

pub use batch::BatchEvaluator;
pub use incremental::IncrementalEvaluator;

use crate::config::EvaluationStrategy;
use crate::error::Result;
use crate::kinds::EvalArgs;
use crate::model::{ArenaGraph, Binding, Node, NodeId, Schedule};

/// Common contract of the evaluation strategies.
///
/// `evaluate` returns one value per arena node, indexed by [`NodeId`].
/// Nodes outside [`Evaluator::schedule`] are never computed and read `0.0`.
pub trait Evaluator: Send {
    fn graph(&self) -> &Arc<ArenaGraph>;

    fn schedule(&self) -> &Schedule;

    fn strategy(&self) -> EvaluationStrategy;

    fn evaluate(&mut self, binding: &dyn Binding) -> Result<&[f64]>;

    /// Forget any state carried between rows.
    fn reset(&mut self) {}
}

impl<E: Evaluator + ?Sized> Evaluator for Box<E> {
    fn graph(&self) -> &Arc<ArenaGraph> {
        (**self).graph()
    }

    fn schedule(&self) -> &Schedule {
        (**self).schedule()
    }

    fn strategy(&self) -> EvaluationStrategy {
        (**self).strategy()
    }

    fn evaluate(&mut self, binding: &dyn Binding) -> Result<&[f64]> {
        (**self).evaluate(binding)
    }

    fn reset(&mut self) {
        (**self).reset()
    }
}

/// Build the evaluator for `strategy`, scheduled for the root plus `targets`.
pub fn evaluator_for(
    graph: Arc<ArenaGraph>,
    strategy: EvaluationStrategy,
    targets: &[NodeId],
) -> Result<Box<dyn Evaluator>> {
    let evaluator: Box<dyn Evaluator> = match strategy {
        EvaluationStrategy::Batch => Box::new(BatchEvaluator::with_targets(graph, targets)?),
        EvaluationStrategy::Incremental => {
            Box::new(IncrementalEvaluator::with_targets(graph, targets)?)
        }
    };
    log::debug!(
        "Created {} evaluator over {} scheduled nodes",
        strategy,
        evaluator.schedule().len()
    );
    Ok(evaluator)
}

/// Evaluate one node from the current `values`, using `scratch` to gather its
/// operands.
pub(crate) fn compute_node(
    id: NodeId,
    node: &Node,
    values: &[f64],
    scratch: &mut Vec<f64>,
    binding: &dyn Binding,
) -> Result<f64> {
    scratch.clear();
    scratch.extend(node.operands().iter().map(|&operand| values[operand]));
    (node.kind().eval)(&EvalArgs {
        id,
        node,
        operands: scratch,
        binding,
    })
}
