//! A single arena node: its kind plus the static operands it was declared with.

use std::fmt;

use serde::Serialize;

use crate::kinds::NodeKind;

/// Position of a node in its arena. Identity is positional.
pub type NodeId = usize;

/// Static operand stored on a node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    SingleRef(NodeId),
    ManyRefs(Vec<NodeId>),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Node references held by this field, empty for literals.
    pub fn refs(&self) -> &[NodeId] {
        match self {
            FieldValue::SingleRef(id) => std::slice::from_ref(id),
            FieldValue::ManyRefs(ids) => ids,
            FieldValue::Text(_) | FieldValue::Number(_) => &[],
        }
    }
}

/// Identifier an Input node uses to pull its value out of a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputKey<'a> {
    Name(&'a str),
    Slot(usize),
}

impl fmt::Display for InputKey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputKey::Name(name) => write!(f, "input '{}'", name),
            InputKey::Slot(slot) => write!(f, "input slot {}", slot),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    kind: &'static NodeKind,
    fields: Vec<(&'static str, FieldValue)>,
    /// Flattened references, in field declaration order.
    operands: Vec<NodeId>,
}

impl Node {
    pub fn new(kind: &'static NodeKind, fields: Vec<(&'static str, FieldValue)>) -> Self {
        let operands = fields
            .iter()
            .flat_map(|(_, value)| value.refs().iter().copied())
            .collect();
        Self {
            kind,
            fields,
            operands,
        }
    }

    pub fn kind(&self) -> &'static NodeKind {
        self.kind
    }

    pub fn tag(&self) -> &'static str {
        self.kind.tag
    }

    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, value)| value)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&'static str, &FieldValue)> {
        self.fields.iter().map(|(name, value)| (*name, value))
    }

    pub fn operands(&self) -> &[NodeId] {
        &self.operands
    }

    /// Binding key for nodes declared with a `name` or `slot` field.
    pub fn input_key(&self) -> Option<InputKey<'_>> {
        if let Some(name) = self.field("name").and_then(FieldValue::as_text) {
            return Some(InputKey::Name(name));
        }
        self.field("slot")
            .and_then(FieldValue::as_number)
            .map(|slot| InputKey::Slot(slot as usize))
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.kind, other.kind) && self.fields == other.fields
    }
}
