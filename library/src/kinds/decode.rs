//! Field decoding from raw document values into typed [`FieldValue`]s.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{FieldValue, NodeId};

/// A decoded field, keyed by the name the kind declares for it.
pub type Field = (&'static str, FieldValue);

/// Untyped field value as it appears in a YAML or JSON document.
///
/// Whether an integer is a node reference or a numeric literal is decided by
/// the kind's decoder, not here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Integer(i64),
    Float(f64),
    Bool(bool),
    Text(String),
    List(Vec<RawValue>),
    Map(BTreeMap<String, RawValue>),
}

impl RawValue {
    fn describe(&self) -> &'static str {
        match self {
            RawValue::Integer(_) => "an integer",
            RawValue::Float(_) => "a float",
            RawValue::Bool(_) => "a boolean",
            RawValue::Text(_) => "a string",
            RawValue::List(_) => "a sequence",
            RawValue::Map(_) => "a mapping",
        }
    }

    fn as_index(&self) -> Option<NodeId> {
        match self {
            RawValue::Integer(i) => usize::try_from(*i).ok(),
            _ => None,
        }
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Float(value)
    }
}

impl From<usize> for RawValue {
    fn from(value: usize) -> Self {
        RawValue::Integer(value as i64)
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        RawValue::Text(value)
    }
}

impl From<Vec<usize>> for RawValue {
    fn from(values: Vec<usize>) -> Self {
        RawValue::List(values.into_iter().map(RawValue::from).collect())
    }
}

/// The not-yet-consumed fields of one node record.
///
/// Decoders `take` the fields their kind declares; anything left over once
/// the decoder returns is rejected by the loader as unexpected.
#[derive(Debug, Default)]
pub struct RawFields {
    entries: BTreeMap<String, RawValue>,
}

impl RawFields {
    pub fn new(entries: BTreeMap<String, RawValue>) -> Self {
        Self { entries }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn take(&mut self, name: &str) -> Option<RawValue> {
        self.entries.remove(name)
    }

    /// Names of fields nobody consumed.
    pub fn remaining(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    fn required(&mut self, name: &'static str) -> Result<RawValue, String> {
        self.take(name)
            .ok_or_else(|| format!("missing required field '{}'", name))
    }

    pub fn text(&mut self, name: &'static str) -> Result<Field, String> {
        match self.required(name)? {
            RawValue::Text(s) => Ok((name, FieldValue::Text(s))),
            other => Err(mistyped(name, "a string", &other)),
        }
    }

    pub fn number(&mut self, name: &'static str) -> Result<Field, String> {
        match self.required(name)? {
            RawValue::Integer(i) => Ok((name, FieldValue::Number(i as f64))),
            RawValue::Float(f) => Ok((name, FieldValue::Number(f))),
            other => Err(mistyped(name, "a number", &other)),
        }
    }

    /// A non-negative integer stored as a number, e.g. an input slot.
    pub fn index(&mut self, name: &'static str) -> Result<Field, String> {
        let value = self.required(name)?;
        value
            .as_index()
            .map(|i| (name, FieldValue::Number(i as f64)))
            .ok_or_else(|| mistyped(name, "a non-negative integer", &value))
    }

    pub fn single_ref(&mut self, name: &'static str) -> Result<Field, String> {
        let value = self.required(name)?;
        value
            .as_index()
            .map(|id| (name, FieldValue::SingleRef(id)))
            .ok_or_else(|| mistyped(name, "a node index", &value))
    }

    /// A non-empty sequence of node indices.
    pub fn many_refs(&mut self, name: &'static str) -> Result<Field, String> {
        let value = self.required(name)?;
        let RawValue::List(items) = &value else {
            return Err(mistyped(name, "a sequence of node indices", &value));
        };
        if items.is_empty() {
            return Err(format!("field '{}' needs at least one node index", name));
        }
        let ids = items
            .iter()
            .map(|item| {
                item.as_index()
                    .ok_or_else(|| mistyped(name, "a sequence of node indices", item))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok((name, FieldValue::ManyRefs(ids)))
    }
}

fn mistyped(name: &str, expected: &str, found: &RawValue) -> String {
    format!(
        "field '{}' must be {}, found {}",
        name,
        expected,
        found.describe()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: Vec<(&str, RawValue)>) -> RawFields {
        RawFields::new(
            pairs
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        )
    }

    #[test]
    fn integers_decode_as_numbers_or_refs() {
        let mut raw = fields(vec![("value", 2usize.into()), ("left", 3usize.into())]);
        assert_eq!(raw.number("value"), Ok(("value", FieldValue::Number(2.0))));
        assert_eq!(raw.single_ref("left"), Ok(("left", FieldValue::SingleRef(3))));
        assert_eq!(raw.remaining().count(), 0);
    }

    #[test]
    fn negative_or_fractional_refs_are_rejected() {
        let mut raw = fields(vec![
            ("left", RawValue::Integer(-1)),
            ("right", RawValue::Float(1.5)),
        ]);
        assert!(raw.single_ref("left").unwrap_err().contains("node index"));
        assert!(raw.single_ref("right").unwrap_err().contains("found a float"));
    }

    #[test]
    fn empty_children_are_rejected() {
        let mut raw = fields(vec![("children", RawValue::List(vec![]))]);
        assert!(raw.many_refs("children").unwrap_err().contains("at least one"));
    }

    #[test]
    fn missing_field_is_named() {
        let mut raw = RawFields::default();
        assert_eq!(
            raw.text("name"),
            Err("missing required field 'name'".to_string())
        );
    }

    #[test]
    fn yaml_scalars_pick_the_right_variant() {
        let values: Vec<RawValue> = serde_yaml::from_str("[1, 1.5, x, true, [2, 3]]").unwrap();
        assert_eq!(
            values,
            vec![
                RawValue::Integer(1),
                RawValue::Float(1.5),
                RawValue::Text("x".into()),
                RawValue::Bool(true),
                RawValue::List(vec![RawValue::Integer(2), RawValue::Integer(3)]),
            ]
        );
    }
}
