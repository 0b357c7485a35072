//! Trigger-gated sampling of an evaluator over a row stream.
//!
//! A record is emitted for the first row and then whenever the trigger
//! node's value differs (IEEE `!=`) from the last emitted trigger value. A run
//! of rows with an unchanged trigger yields one record, at the run's first
//! row. NaN never equals anything, so a NaN trigger always emits.

pub mod parallel;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::SamplerConfig;
use crate::error::{GraphError, Result};
use crate::evaluation::{Evaluator, evaluator_for};
use crate::model::{ArenaGraph, Binding, NodeId};

/// One emitted sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Zero-based index of the row that produced this record.
    pub row: usize,
    pub trigger: f64,
    /// One value per configured output node, in configuration order.
    pub outputs: Vec<f64>,
}

pub struct TriggerSampler<E = Box<dyn Evaluator>> {
    evaluator: E,
    trigger: NodeId,
    outputs: Vec<NodeId>,
    last_emitted: Option<f64>,
    rows_seen: usize,
    emitted: usize,
}

impl TriggerSampler<Box<dyn Evaluator>> {
    /// Build the evaluator named by `config.strategy`, scheduled so that the
    /// trigger and every output are computed.
    pub fn from_config(graph: Arc<ArenaGraph>, config: &SamplerConfig) -> Result<Self> {
        let evaluator = evaluator_for(graph, config.strategy, &config.targets())?;
        Self::new(evaluator, config.trigger, config.outputs.clone())
    }
}

impl<E: Evaluator> TriggerSampler<E> {
    /// Fails with [`GraphError::NotScheduled`] if the evaluator never computes
    /// the trigger or one of the outputs.
    pub fn new(evaluator: E, trigger: NodeId, outputs: Vec<NodeId>) -> Result<Self> {
        let schedule = evaluator.schedule();
        if let Some(&node) = std::iter::once(&trigger)
            .chain(&outputs)
            .find(|&&node| !schedule.contains(node))
        {
            return Err(GraphError::NotScheduled { node });
        }
        Ok(Self {
            evaluator,
            trigger,
            outputs,
            last_emitted: None,
            rows_seen: 0,
            emitted: 0,
        })
    }

    pub fn trigger(&self) -> NodeId {
        self.trigger
    }

    pub fn outputs(&self) -> &[NodeId] {
        &self.outputs
    }

    pub fn evaluator(&self) -> &E {
        &self.evaluator
    }

    pub fn last_emitted(&self) -> Option<f64> {
        self.last_emitted
    }

    /// Rows consumed in this session, including rows that failed.
    pub fn rows_seen(&self) -> usize {
        self.rows_seen
    }

    pub fn emitted(&self) -> usize {
        self.emitted
    }

    /// Feed one row. Returns the record if the trigger changed.
    ///
    /// A failed row is counted but leaves the emission baseline untouched.
    pub fn step<B: Binding>(&mut self, row: B) -> Result<Option<Record>> {
        let index = self.rows_seen;
        self.rows_seen += 1;

        let values = self.evaluator.evaluate(&row)?;
        let trigger = values[self.trigger];
        let changed = match self.last_emitted {
            None => true,
            Some(last) => trigger != last,
        };
        if !changed {
            log::trace!("Row {}: trigger unchanged at {}", index, trigger);
            return Ok(None);
        }

        let outputs = self.outputs.iter().map(|&id| values[id]).collect();
        self.last_emitted = Some(trigger);
        self.emitted += 1;
        log::trace!("Row {}: trigger changed to {}", index, trigger);
        Ok(Some(Record {
            row: index,
            trigger,
            outputs,
        }))
    }

    /// Lazily sample `rows`. Each pulled item is either the next emitted
    /// record or the error of the row that failed; the caller decides whether
    /// to keep pulling after an error.
    pub fn process<I>(&mut self, rows: I) -> Samples<'_, E, I::IntoIter>
    where
        I: IntoIterator,
        I::Item: Binding,
    {
        Samples {
            sampler: self,
            rows: rows.into_iter(),
        }
    }

    /// Start a new session: the next row always emits.
    pub fn reset(&mut self) {
        log::debug!(
            "Sampler session ended: {} rows, {} records",
            self.rows_seen,
            self.emitted
        );
        self.evaluator.reset();
        self.last_emitted = None;
        self.rows_seen = 0;
        self.emitted = 0;
    }
}

/// Iterator returned by [`TriggerSampler::process`].
pub struct Samples<'a, E, I> {
    sampler: &'a mut TriggerSampler<E>,
    rows: I,
}

impl<E, I> Iterator for Samples<'_, E, I>
where
    E: Evaluator,
    I: Iterator,
    I::Item: Binding,
{
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        for row in self.rows.by_ref() {
            match self.sampler.step(row) {
                Ok(Some(record)) => return Some(Ok(record)),
                Ok(None) => continue,
                Err(err) => return Some(Err(err)),
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::BatchEvaluator;
    use crate::loader::load;

    fn counter_graph() -> Arc<ArenaGraph> {
        Arc::new(
            load(
                r#"
root: 1
nodes:
  - { type: Input, slot: 0 }
  - { type: ConstantScale, operand: 0, factor: 10.0 }
"#,
            )
            .unwrap(),
        )
    }

    #[test]
    fn runs_collapse_to_their_first_row() {
        let evaluator = BatchEvaluator::new(counter_graph());
        let mut sampler = TriggerSampler::new(evaluator, 0, vec![1]).unwrap();
        let rows = vec![[1.0], [1.0], [2.0], [2.0], [2.0], [1.0]];
        let records: Vec<Record> = sampler.process(rows).collect::<Result<_>>().unwrap();
        let emitted: Vec<(usize, f64)> = records.iter().map(|r| (r.row, r.trigger)).collect();
        assert_eq!(emitted, vec![(0, 1.0), (2, 2.0), (5, 1.0)]);
        assert_eq!(records[1].outputs, vec![20.0]);
        assert_eq!(sampler.rows_seen(), 6);
        assert_eq!(sampler.emitted(), 3);
    }

    #[test]
    fn nan_trigger_always_emits() {
        let evaluator = BatchEvaluator::new(counter_graph());
        let mut sampler = TriggerSampler::new(evaluator, 0, vec![]).unwrap();
        let rows = vec![[f64::NAN], [f64::NAN], [f64::NAN]];
        assert_eq!(sampler.process(rows).count(), 3);
    }

    #[test]
    fn failed_row_does_not_move_the_baseline() {
        let evaluator = BatchEvaluator::new(counter_graph());
        let mut sampler = TriggerSampler::new(evaluator, 0, vec![1]).unwrap();
        let rows: Vec<Vec<f64>> = vec![vec![1.0], vec![], vec![1.0], vec![3.0]];
        let results: Vec<Result<Record>> = sampler.process(rows).collect();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().map(|r| r.row), Ok(0));
        assert!(results[1].as_ref().unwrap_err().is_input_error());
        assert_eq!(results[2].as_ref().map(|r| (r.row, r.trigger)), Ok((3, 3.0)));
    }

    #[test]
    fn unscheduled_output_is_rejected() {
        let graph = Arc::new(
            load(
                r#"
root: 0
nodes:
  - { type: Input, slot: 0 }
  - { type: Constant, value: 1.0 }
"#,
            )
            .unwrap(),
        );
        let evaluator = BatchEvaluator::new(Arc::clone(&graph));
        assert_eq!(
            TriggerSampler::new(evaluator, 0, vec![1]).err(),
            Some(GraphError::NotScheduled { node: 1 })
        );

        let config = SamplerConfig::new(0, vec![1]);
        let mut sampler = TriggerSampler::from_config(graph, &config).unwrap();
        let record = sampler.step([4.0]).unwrap().unwrap();
        assert_eq!(record.outputs, vec![1.0]);
    }

    #[test]
    fn reset_starts_a_new_session() {
        let evaluator = BatchEvaluator::new(counter_graph());
        let mut sampler = TriggerSampler::new(evaluator, 0, vec![]).unwrap();
        assert!(sampler.step([1.0]).unwrap().is_some());
        assert!(sampler.step([1.0]).unwrap().is_none());
        sampler.reset();
        let record = sampler.step([1.0]).unwrap().unwrap();
        assert_eq!(record.row, 0);
    }
}
