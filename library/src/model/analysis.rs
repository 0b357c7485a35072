//! Structural analysis of the arena: reference checks, cycle detection,
//! topological ordering and the reverse dependency index.

use crate::error::{GraphError, Result};

use super::node::{Node, NodeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// Check every operand of every node against the arena bounds.
pub(crate) fn check_references(nodes: &[Node]) -> Result<()> {
    let len = nodes.len();
    for (node, entry) in nodes.iter().enumerate() {
        if let Some(&target) = entry.operands().iter().find(|&&target| target >= len) {
            return Err(GraphError::ReferenceOutOfRange { node, target, len });
        }
    }
    Ok(())
}

/// Depth-first post-order walk from `start`, appending every newly finished
/// node to `order`. Nodes already marked `Done` are skipped, so repeated calls
/// over the same `marks` extend one topological order.
///
/// Operand indices must already be in range (see [`check_references`]).
pub(crate) fn visit(
    nodes: &[Node],
    start: NodeId,
    marks: &mut [Mark],
    order: &mut Vec<NodeId>,
) -> Result<()> {
    if marks[start] == Mark::Done {
        return Ok(());
    }
    marks[start] = Mark::InProgress;
    // (node, index of the next operand to descend into)
    let mut stack: Vec<(NodeId, usize)> = vec![(start, 0)];

    while let Some(frame) = stack.last_mut() {
        let (id, next) = *frame;
        match nodes[id].operands().get(next) {
            Some(&child) => {
                frame.1 += 1;
                match marks[child] {
                    Mark::Unvisited => {
                        marks[child] = Mark::InProgress;
                        stack.push((child, 0));
                    }
                    Mark::InProgress => return Err(GraphError::Cycle { node: child }),
                    Mark::Done => {}
                }
            }
            None => {
                marks[id] = Mark::Done;
                order.push(id);
                stack.pop();
            }
        }
    }
    Ok(())
}

/// For each node, the nodes that use it directly as an operand.
pub(crate) fn reverse_index(nodes: &[Node]) -> Vec<Vec<NodeId>> {
    let mut dependents: Vec<Vec<NodeId>> = vec![Vec::new(); nodes.len()];
    for (id, node) in nodes.iter().enumerate() {
        for &operand in node.operands() {
            // A node listing the same operand twice is recorded once; pushes for
            // one `id` are contiguous so checking the tail is enough.
            if dependents[operand].last() != Some(&id) {
                dependents[operand].push(id);
            }
        }
    }
    dependents
}
