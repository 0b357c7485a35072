//! Dependency-driven re-evaluation.
//!
//! Per row:
//! 1. resolve every binding-reading leaf (Input) and compare it bit-for-bit
//!    with its cached value; changed leaves are dirty,
//! 2. walk the schedule in topological order; each dirty node is recomputed
//!    (leaves were resolved in step 1) and marks its dependents dirty,
//! 3. clean nodes keep their cached value and serve as operands unchanged.
//!
//! Dirtiness is structural: a recomputed node dirties its dependents even if
//! its new value equals the old one.

use std::sync::Arc;

use super::{Evaluator, compute_node};
use crate::config::EvaluationStrategy;
use crate::error::Result;
use crate::model::{ArenaGraph, Binding, NodeId, Schedule};

pub struct IncrementalEvaluator {
    graph: Arc<ArenaGraph>,
    schedule: Schedule,
    /// Scheduled binding-reading nodes without operands, resolved up front.
    leaves: Vec<NodeId>,
    is_leaf: Vec<bool>,
    /// Scheduled binding-reading nodes with operands; recomputed every row.
    volatile: Vec<NodeId>,
    values: Vec<f64>,
    dirty: Vec<bool>,
    /// Whether `values` holds a complete, consistent evaluation.
    primed: bool,
    changed: Vec<(NodeId, f64)>,
    scratch: Vec<f64>,
    recomputed: usize,
}

impl IncrementalEvaluator {
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
        let mut leaves = Vec::new();
        let mut volatile = Vec::new();
        let mut is_leaf = vec![false; len];
        for &id in schedule.order() {
            let node = &graph.nodes()[id];
            if !node.kind().reads_binding {
                continue;
            }
            if node.operands().is_empty() {
                leaves.push(id);
                is_leaf[id] = true;
            } else {
                volatile.push(id);
            }
        }

        Self {
            graph,
            schedule,
            leaves,
            is_leaf,
            volatile,
            values: vec![0.0; len],
            dirty: vec![false; len],
            primed: false,
            changed: Vec::new(),
            scratch: Vec::new(),
            recomputed: 0,
        }
    }

    /// Number of nodes marked dirty by the last successful `evaluate`.
    pub fn last_recomputed(&self) -> usize {
        self.recomputed
    }

    /// Values from the last successful `evaluate`.
    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

impl Evaluator for IncrementalEvaluator {
    fn graph(&self) -> &Arc<ArenaGraph> {
        &self.graph
    }

    fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    fn strategy(&self) -> EvaluationStrategy {
        EvaluationStrategy::Incremental
    }

    fn evaluate(&mut self, binding: &dyn Binding) -> Result<&[f64]> {
        let nodes = self.graph.nodes();

        // Resolve leaves before touching the cache so a missing input leaves
        // the previous state intact.
        self.changed.clear();
        for &id in &self.leaves {
            let value = compute_node(id, &nodes[id], &self.values, &mut self.scratch, binding)?;
            if !self.primed || value.to_bits() != self.values[id].to_bits() {
                self.changed.push((id, value));
            }
        }

        let full = !self.primed;
        // Cleared again only once every dirty node is recomputed.
        self.primed = false;

        self.dirty.fill(false);
        if full {
            for &id in self.schedule.order() {
                self.dirty[id] = true;
            }
        }
        for &id in &self.volatile {
            self.dirty[id] = true;
        }
        for i in 0..self.changed.len() {
            let (id, value) = self.changed[i];
            self.values[id] = value;
            self.dirty[id] = true;
        }

        let mut recomputed = 0;
        for &id in self.schedule.order() {
            if !self.dirty[id] {
                continue;
            }
            recomputed += 1;
            if !self.is_leaf[id] {
                self.values[id] =
                    compute_node(id, &nodes[id], &self.values, &mut self.scratch, binding)?;
            }
            for &dependent in self.graph.dependents(id) {
                if self.schedule.contains(dependent) {
                    self.dirty[dependent] = true;
                }
            }
        }

        log::trace!(
            "Incremental step recomputed {} of {} scheduled nodes",
            recomputed,
            self.schedule.len()
        );
        self.recomputed = recomputed;
        self.primed = true;
        Ok(&self.values)
    }

    fn reset(&mut self) {
        self.primed = false;
        self.recomputed = 0;
    }
}
