use thiserror::Error;

use crate::model::NodeId;

pub type Result<T> = std::result::Result<T, GraphError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error(
        "Schema error{}: {message}",
        .node.map(|n| format!(" at node {}", n)).unwrap_or_default()
    )]
    Schema {
        node: Option<NodeId>,
        message: String,
    },
    #[error("Reference error: node {node} references node {target}, but the arena has {len} nodes")]
    ReferenceOutOfRange {
        node: NodeId,
        target: NodeId,
        len: usize,
    },
    #[error("Reference error: node {node} does not exist in an arena of {len} nodes")]
    UnknownNode { node: NodeId, len: usize },
    #[error("Reference error: cycle detected through node {node}")]
    Cycle { node: NodeId },
    #[error("Input error: {key} required by node {node} is missing from the binding")]
    MissingInput { node: NodeId, key: String },
    #[error("Node {node} is not scheduled by this evaluator")]
    NotScheduled { node: NodeId },
    #[error("Evaluation of node {node} failed: {message}")]
    Eval { node: NodeId, message: String },
}

impl GraphError {
    pub fn schema(node: Option<NodeId>, message: impl Into<String>) -> Self {
        GraphError::Schema {
            node,
            message: message.into(),
        }
    }

    pub fn eval(node: NodeId, message: impl Into<String>) -> Self {
        GraphError::Eval {
            node,
            message: message.into(),
        }
    }

    pub fn is_schema_error(&self) -> bool {
        matches!(self, GraphError::Schema { .. })
    }

    /// Out-of-range indices and cycles.
    pub fn is_reference_error(&self) -> bool {
        matches!(
            self,
            GraphError::ReferenceOutOfRange { .. }
                | GraphError::UnknownNode { .. }
                | GraphError::Cycle { .. }
        )
    }

    pub fn is_input_error(&self) -> bool {
        matches!(self, GraphError::MissingInput { .. })
    }
}

impl From<serde_yaml::Error> for GraphError {
    fn from(err: serde_yaml::Error) -> Self {
        GraphError::schema(None, err.to_string())
    }
}

impl From<serde_json::Error> for GraphError {
    fn from(err: serde_json::Error) -> Self {
        GraphError::schema(None, err.to_string())
    }
}
