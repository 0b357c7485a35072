//! Arena graph data model: nodes, operand fields, input bindings.

mod analysis;
pub mod binding;
pub mod graph;
pub mod node;

pub use binding::Binding;
pub use graph::{ArenaGraph, Schedule};
pub use node::{FieldValue, InputKey, Node, NodeId};
