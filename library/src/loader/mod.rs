//! Graph document loading: YAML/JSON text → validated [`ArenaGraph`].
//!
//! Document shape:
//!
//! ```yaml
//! root: 4
//! nodes:
//!   - { type: Input, name: bid }
//!   - { type: Input, name: ask }
//!   - { type: Add, children: [0, 1] }
//!   - { type: Constant, value: 2.0 }
//!   - { type: Divide, left: 2, right: 3 }
//! # optional sampler settings
//! trigger: 4
//! outputs: [2]
//! strategy: incremental
//! ```
//!
//! Loading either returns a fully validated graph or an error; it never
//! partially succeeds.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::{EvaluationStrategy, SamplerConfig};
use crate::error::{GraphError, Result};
use crate::kinds::{KindRegistry, RawFields, RawValue};
use crate::model::{ArenaGraph, Node, NodeId};
use crate::util::timing::ScopedTimer;

/// Deserialised graph document, before kind decoding and validation.
///
/// This is also the hand-off format for code that builds graphs
/// programmatically: construct a `GraphSpec` and pass it to
/// [`GraphLoader::load_spec`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GraphSpec {
    pub root: NodeId,
    pub nodes: Vec<NodeSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger: Option<NodeId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<EvaluationStrategy>,
}

impl GraphSpec {
    pub fn new(root: NodeId, nodes: Vec<NodeSpec>) -> Self {
        Self {
            root,
            nodes,
            ..Default::default()
        }
    }

    fn sampler_config(&self) -> Result<Option<SamplerConfig>> {
        match self.trigger {
            Some(trigger) => Ok(Some(SamplerConfig {
                trigger,
                outputs: self.outputs.clone(),
                strategy: self.strategy.unwrap_or_default(),
            })),
            None if !self.outputs.is_empty() || self.strategy.is_some() => Err(
                GraphError::schema(None, "'outputs' and 'strategy' require a 'trigger'"),
            ),
            None => Ok(None),
        }
    }
}

/// One node record: a `type` tag plus kind-specific fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSpec {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(flatten)]
    pub fields: BTreeMap<String, RawValue>,
}

impl NodeSpec {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<RawValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }
}

/// Decodes and validates graph documents against a kind registry.
#[derive(Debug, Clone, Copy)]
pub struct GraphLoader<'r> {
    registry: &'r KindRegistry,
}

impl GraphLoader<'static> {
    /// A loader that knows only the built-in kinds.
    pub fn new() -> Self {
        Self {
            registry: KindRegistry::builtin(),
        }
    }
}

impl Default for GraphLoader<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'r> GraphLoader<'r> {
    pub fn with_registry(registry: &'r KindRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &'r KindRegistry {
        self.registry
    }

    pub fn load_yaml(&self, text: &str) -> Result<ArenaGraph> {
        let spec: GraphSpec = serde_yaml::from_str(text)?;
        self.load_spec(spec)
    }

    pub fn load_json(&self, text: &str) -> Result<ArenaGraph> {
        let spec: GraphSpec = serde_json::from_str(text)?;
        self.load_spec(spec)
    }

    pub fn load_spec(&self, spec: GraphSpec) -> Result<ArenaGraph> {
        let _timer =
            ScopedTimer::debug_lazy(|| format!("Loading graph of {} nodes", spec.nodes.len()));
        let sampler = spec.sampler_config()?;
        let nodes = spec
            .nodes
            .into_iter()
            .enumerate()
            .map(|(id, node)| self.decode_node(id, node))
            .collect::<Result<Vec<_>>>()?;

        let graph = ArenaGraph::build(nodes, spec.root, sampler)?;
        log::info!(
            "Loaded graph: {} nodes, {} reachable from root {}",
            graph.len(),
            graph.schedule().len(),
            graph.root()
        );
        Ok(graph)
    }

    fn decode_node(&self, id: NodeId, spec: NodeSpec) -> Result<Node> {
        let kind = self.registry.get(&spec.kind).ok_or_else(|| {
            GraphError::schema(Some(id), format!("unknown node type '{}'", spec.kind))
        })?;
        let mut raw = RawFields::new(spec.fields);
        let fields =
            (kind.decode)(&mut raw).map_err(|message| GraphError::schema(Some(id), message))?;
        if let Some(extra) = raw.remaining().next() {
            return Err(GraphError::schema(
                Some(id),
                format!("unexpected field '{}' for {} node", extra, kind.tag),
            ));
        }
        Ok(Node::new(kind, fields))
    }
}

/// Load a YAML graph document using the built-in kinds.
pub fn load(text: &str) -> Result<ArenaGraph> {
    GraphLoader::new().load_yaml(text)
}
