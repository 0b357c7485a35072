//! Sampling many independent row streams against one shared graph.

use std::sync::Arc;

use rayon::prelude::*;

use super::{Record, TriggerSampler};
use crate::config::SamplerConfig;
use crate::error::Result;
use crate::model::{ArenaGraph, Binding};
use crate::util::timing::ScopedTimer;

/// Run one sampler per stream on the rayon pool and collect every stream's
/// records, in stream order.
///
/// Each stream gets its own evaluator state; only the graph is shared. The
/// first failing row of any stream fails the whole call.
pub fn sample_streams<R>(
    graph: &Arc<ArenaGraph>,
    config: &SamplerConfig,
    streams: &[Vec<R>],
) -> Result<Vec<Vec<Record>>>
where
    R: Binding + Sync,
{
    let _timer = ScopedTimer::debug_lazy(|| format!("Sampling {} streams", streams.len()));
    streams
        .par_iter()
        .map(|rows| {
            let mut sampler = TriggerSampler::from_config(Arc::clone(graph), config)?;
            sampler.process(rows.iter()).collect::<Result<Vec<_>>>()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load;

    #[test]
    fn streams_match_sequential_sampling() {
        let graph = Arc::new(
            load(
                r#"
root: 2
nodes:
  - { type: Input, slot: 0 }
  - { type: Input, slot: 1 }
  - { type: Comparison, left: 0, right: 1, op: GreaterThan }
"#,
            )
            .unwrap(),
        );
        let config = SamplerConfig::new(2, vec![0, 1]);
        let streams: Vec<Vec<Vec<f64>>> = (0..8)
            .map(|s| {
                (0..50)
                    .map(|i| vec![((i * (s + 1)) % 7) as f64, 3.0])
                    .collect()
            })
            .collect();

        let parallel = sample_streams(&graph, &config, &streams).unwrap();

        for (stream, records) in streams.iter().zip(&parallel) {
            let mut sampler = TriggerSampler::from_config(Arc::clone(&graph), &config).unwrap();
            let sequential: Vec<Record> = sampler.process(stream).collect::<Result<_>>().unwrap();
            assert_eq!(records, &sequential);
        }
    }
}
