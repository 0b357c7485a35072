//! The immutable arena graph produced by the loader.

use crate::config::SamplerConfig;
use crate::error::{GraphError, Result};

use super::analysis::{self, Mark};
use super::node::{Node, NodeId};

/// Topological evaluation order over a subset of the arena.
///
/// Every node appears after all of its operands. Nodes outside the subset are
/// never evaluated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    order: Vec<NodeId>,
    member: Vec<bool>,
}

impl Schedule {
    fn from_order(order: Vec<NodeId>, len: usize) -> Self {
        let mut member = vec![false; len];
        for &id in &order {
            member[id] = true;
        }
        Self { order, member }
    }

    pub fn order(&self) -> &[NodeId] {
        &self.order
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.member.get(id).copied().unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Flat, index-addressed DAG of nodes with a designated root.
///
/// Built once by [`crate::loader::GraphLoader`] and never mutated afterwards;
/// share it between evaluators with an `Arc`.
#[derive(Debug, Clone)]
pub struct ArenaGraph {
    nodes: Vec<Node>,
    root: NodeId,
    dependents: Vec<Vec<NodeId>>,
    schedule: Schedule,
    sampler: Option<SamplerConfig>,
}

impl ArenaGraph {
    /// Validate `nodes` and build the derived indices.
    ///
    /// Fails on out-of-range references (including `root`) and on any cycle,
    /// even one confined to nodes unreachable from `root`.
    pub(crate) fn build(
        nodes: Vec<Node>,
        root: NodeId,
        sampler: Option<SamplerConfig>,
    ) -> Result<Self> {
        let len = nodes.len();
        analysis::check_references(&nodes)?;
        if root >= len {
            return Err(GraphError::UnknownNode { node: root, len });
        }

        let mut marks = vec![Mark::Unvisited; len];
        let mut order = Vec::with_capacity(len);
        analysis::visit(&nodes, root, &mut marks, &mut order)?;

        // Dead storage is never evaluated but must still be acyclic.
        let mut dead = Vec::new();
        for id in 0..len {
            analysis::visit(&nodes, id, &mut marks, &mut dead)?;
        }
        if !dead.is_empty() {
            log::warn!(
                "{} of {} nodes are unreachable from root {} and will not be evaluated",
                dead.len(),
                len,
                root
            );
        }

        if let Some(config) = &sampler {
            for node in config.targets() {
                if node >= len {
                    return Err(GraphError::UnknownNode { node, len });
                }
            }
        }

        let dependents = analysis::reverse_index(&nodes);
        Ok(Self {
            schedule: Schedule::from_order(order, len),
            nodes,
            root,
            dependents,
            sampler,
        })
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Nodes that reference `id` directly as an operand.
    pub fn dependents(&self, id: NodeId) -> &[NodeId] {
        self.dependents.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Evaluation order for everything reachable from the root.
    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    /// Evaluation order for everything reachable from the root or from any of
    /// `targets`.
    pub fn schedule_for(&self, targets: &[NodeId]) -> Result<Schedule> {
        let len = self.nodes.len();
        if let Some(&node) = targets.iter().find(|&&node| node >= len) {
            return Err(GraphError::UnknownNode { node, len });
        }
        if targets.iter().all(|&node| self.schedule.contains(node)) {
            return Ok(self.schedule.clone());
        }

        let mut marks = vec![Mark::Unvisited; len];
        let mut order = Vec::with_capacity(len);
        for &start in std::iter::once(&self.root).chain(targets) {
            analysis::visit(&self.nodes, start, &mut marks, &mut order)?;
        }
        Ok(Schedule::from_order(order, len))
    }

    /// Sampler settings carried by the graph document, if any.
    pub fn sampler_config(&self) -> Option<&SamplerConfig> {
        self.sampler.as_ref()
    }
}
