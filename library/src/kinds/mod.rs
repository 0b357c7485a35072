//! Node kinds and the tag-keyed registry the loader decodes against.
//!
//! A kind pairs a field decoder with a pure evaluation function. Evaluators
//! never match on kinds; they call `eval` through the node, so registering a
//! new kind needs no change anywhere else.

pub mod builtin;
pub mod decode;

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;

use crate::error::{GraphError, Result};
use crate::model::{Binding, FieldValue, Node, NodeId};

pub use decode::{Field, RawFields, RawValue};

/// Decodes a node record's raw fields into the kind's typed fields.
pub type DecodeFn = fn(&mut RawFields) -> std::result::Result<Vec<Field>, String>;

/// Computes a node's value from its resolved operands.
pub type EvalFn = fn(&EvalArgs<'_>) -> Result<f64>;

/// Definition of a node kind.
///
/// Kinds are `'static` so that arena nodes can point at them directly.
pub struct NodeKind {
    /// Canonical type tag, e.g. `"Divide"`.
    pub tag: &'static str,
    /// Alternative spellings accepted in documents.
    pub aliases: &'static [&'static str],
    /// Whether `eval` reads the row binding. The incremental evaluator checks
    /// these nodes for changes on every row.
    pub reads_binding: bool,
    pub decode: DecodeFn,
    pub eval: EvalFn,
}

impl fmt::Debug for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeKind")
            .field("tag", &self.tag)
            .field("aliases", &self.aliases)
            .field("reads_binding", &self.reads_binding)
            .finish()
    }
}

/// Everything an eval function may look at.
pub struct EvalArgs<'a> {
    pub id: NodeId,
    pub node: &'a Node,
    /// Operand values, in the order of [`Node::operands`].
    pub operands: &'a [f64],
    pub binding: &'a dyn Binding,
}

impl EvalArgs<'_> {
    pub fn number(&self, name: &str) -> Result<f64> {
        self.node
            .field(name)
            .and_then(FieldValue::as_number)
            .ok_or_else(|| GraphError::eval(self.id, format!("missing number field '{}'", name)))
    }

    pub fn text(&self, name: &str) -> Result<&str> {
        self.node
            .field(name)
            .and_then(FieldValue::as_text)
            .ok_or_else(|| GraphError::eval(self.id, format!("missing text field '{}'", name)))
    }

    pub fn unary(&self) -> Result<f64> {
        match self.operands {
            [value] => Ok(*value),
            _ => Err(self.arity_error(1)),
        }
    }

    pub fn binary(&self) -> Result<(f64, f64)> {
        match self.operands {
            [left, right] => Ok((*left, *right)),
            _ => Err(self.arity_error(2)),
        }
    }

    fn arity_error(&self, expected: usize) -> GraphError {
        GraphError::eval(
            self.id,
            format!(
                "{} expects {} operand(s), got {}",
                self.node.tag(),
                expected,
                self.operands.len()
            ),
        )
    }
}

static BUILTIN_KINDS: Lazy<KindRegistry> = Lazy::new(|| {
    let mut registry = KindRegistry::new();
    builtin::register_all(&mut registry);
    registry
});

/// Lookup table from type tag (and aliases) to kind.
#[derive(Clone, Default)]
pub struct KindRegistry {
    kinds: HashMap<&'static str, &'static NodeKind>,
}

impl KindRegistry {
    pub fn new() -> Self {
        Self {
            kinds: HashMap::new(),
        }
    }

    /// The process-wide table of built-in kinds. Read-only.
    pub fn builtin() -> &'static KindRegistry {
        &BUILTIN_KINDS
    }

    /// An owned copy of the built-in table, ready for extension.
    pub fn with_builtin_kinds() -> Self {
        BUILTIN_KINDS.clone()
    }

    /// Register a kind under its tag and aliases. Later registrations win.
    pub fn register(&mut self, kind: &'static NodeKind) {
        for &tag in std::iter::once(&kind.tag).chain(kind.aliases) {
            if let Some(previous) = self.kinds.insert(tag, kind) {
                if !std::ptr::eq(previous, kind) {
                    log::warn!("Node type '{}' re-registered, replacing {}", tag, previous.tag);
                }
            }
        }
        log::debug!("Registered node type '{}'", kind.tag);
    }

    pub fn get(&self, tag: &str) -> Option<&'static NodeKind> {
        self.kinds.get(tag).copied()
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.kinds.contains_key(tag)
    }

    /// Canonical tags, sorted, without aliases.
    pub fn tags(&self) -> Vec<&'static str> {
        let mut tags: Vec<_> = self
            .kinds
            .iter()
            .filter(|(key, kind)| **key == kind.tag)
            .map(|(key, _)| *key)
            .collect();
        tags.sort_unstable();
        tags
    }
}

impl fmt::Debug for KindRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KindRegistry")
            .field("tags", &self.tags())
            .finish()
    }
}
