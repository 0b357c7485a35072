//! Input bindings: the per-row values Input nodes read from.

use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

use super::node::InputKey;

/// A row of input values, looked up by name or by positional slot.
///
/// Named maps answer only [`InputKey::Name`]; slices and vectors answer only
/// [`InputKey::Slot`]. `None` means the row does not carry that input.
pub trait Binding {
    fn value(&self, key: InputKey<'_>) -> Option<f64>;
}

impl<S: BuildHasher> Binding for HashMap<String, f64, S> {
    fn value(&self, key: InputKey<'_>) -> Option<f64> {
        match key {
            InputKey::Name(name) => self.get(name).copied(),
            InputKey::Slot(_) => None,
        }
    }
}

impl Binding for BTreeMap<String, f64> {
    fn value(&self, key: InputKey<'_>) -> Option<f64> {
        match key {
            InputKey::Name(name) => self.get(name).copied(),
            InputKey::Slot(_) => None,
        }
    }
}

impl Binding for [f64] {
    fn value(&self, key: InputKey<'_>) -> Option<f64> {
        match key {
            InputKey::Slot(slot) => self.get(slot).copied(),
            InputKey::Name(_) => None,
        }
    }
}

impl<const N: usize> Binding for [f64; N] {
    fn value(&self, key: InputKey<'_>) -> Option<f64> {
        self.as_slice().value(key)
    }
}

impl Binding for Vec<f64> {
    fn value(&self, key: InputKey<'_>) -> Option<f64> {
        self.as_slice().value(key)
    }
}

impl<B: Binding + ?Sized> Binding for &B {
    fn value(&self, key: InputKey<'_>) -> Option<f64> {
        (**self).value(key)
    }
}
