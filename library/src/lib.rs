//! Streaming evaluation of small numeric signal graphs.
//!
//! A graph document is loaded into an immutable [`ArenaGraph`], evaluated per
//! input row by a [`BatchEvaluator`] or an [`IncrementalEvaluator`], and
//! downsampled by a [`TriggerSampler`] that emits a [`Record`] only when the
//! trigger node's value changes.

pub mod config;
pub mod error;
pub mod evaluation;
pub mod kinds;
pub mod loader;
pub mod model;
pub mod sampler;
pub mod util;

pub use config::{EvaluationStrategy, SamplerConfig};
pub use error::{GraphError, Result};
pub use evaluation::{BatchEvaluator, Evaluator, IncrementalEvaluator, evaluator_for};
pub use kinds::{KindRegistry, NodeKind};
pub use loader::{GraphLoader, GraphSpec, NodeSpec, load};
pub use model::{ArenaGraph, Binding, FieldValue, InputKey, Node, NodeId, Schedule};
pub use sampler::parallel::sample_streams;
pub use sampler::{Record, Samples, TriggerSampler};
