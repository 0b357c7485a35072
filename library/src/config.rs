//! Sampler configuration, deserialisable from the graph document or any
//! serde source.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::model::NodeId;

/// Which evaluator drives a sampler. Affects cost only, never results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvaluationStrategy {
    /// Recompute every scheduled node on every row.
    Batch,
    /// Recompute only nodes downstream of changed inputs.
    #[default]
    Incremental,
}

impl fmt::Display for EvaluationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EvaluationStrategy::Batch => "batch",
            EvaluationStrategy::Incremental => "incremental",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for EvaluationStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "batch" => Ok(EvaluationStrategy::Batch),
            "incremental" => Ok(EvaluationStrategy::Incremental),
            other => Err(format!("unknown evaluation strategy '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamplerConfig {
    pub trigger: NodeId,
    #[serde(default)]
    pub outputs: Vec<NodeId>,
    #[serde(default)]
    pub strategy: EvaluationStrategy,
}

impl SamplerConfig {
    pub fn new(trigger: NodeId, outputs: Vec<NodeId>) -> Self {
        Self {
            trigger,
            outputs,
            strategy: EvaluationStrategy::default(),
        }
    }

    pub fn with_strategy(mut self, strategy: EvaluationStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Trigger followed by the outputs.
    pub fn targets(&self) -> Vec<NodeId> {
        std::iter::once(self.trigger)
            .chain(self.outputs.iter().copied())
            .collect()
    }
}
