use std::collections::HashMap;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use signal_graph::{
    ArenaGraph, BatchEvaluator, EvaluationStrategy, GraphError, IncrementalEvaluator, Record,
    Result, SamplerConfig, TriggerSampler, load, sample_streams,
};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// 0-3: inputs, 6: simple midpoint (trigger), 11: size-weighted midpoint
const QUOTE_GRAPH: &str = r#"
root: 11
nodes:
  - { type: Input, name: bid }
  - { type: Input, name: ask }
  - { type: Input, name: bid_size }
  - { type: Input, name: ask_size }
  - { type: Add, children: [0, 1] }
  - { type: Constant, value: 2.0 }
  - { type: Divide, left: 4, right: 5 }
  - { type: Multiply, children: [0, 3] }
  - { type: Multiply, children: [1, 2] }
  - { type: Add, children: [7, 8] }
  - { type: Add, children: [2, 3] }
  - { type: Divide, left: 9, right: 10 }
trigger: 6
outputs: [11]
"#;

fn quote(bid: f64, ask: f64, bid_size: f64, ask_size: f64) -> HashMap<String, f64> {
    [
        ("bid", bid),
        ("ask", ask),
        ("bid_size", bid_size),
        ("ask_size", ask_size),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

fn quote_rows() -> Vec<HashMap<String, f64>> {
    vec![
        quote(100.0, 101.0, 10.0, 12.0),
        quote(100.5, 101.5, 11.0, 13.0),
        quote(100.5, 101.5, 11.0, 13.0),
        quote(101.0, 102.0, 12.0, 14.0),
    ]
}

fn weighted_mid(bid: f64, ask: f64, bid_size: f64, ask_size: f64) -> f64 {
    (bid * ask_size + ask * bid_size) / (bid_size + ask_size)
}

fn sample(graph: &Arc<ArenaGraph>, strategy: EvaluationStrategy) -> Vec<Record> {
    let config = graph
        .sampler_config()
        .expect("document carries sampler settings")
        .clone()
        .with_strategy(strategy);
    let mut sampler = TriggerSampler::from_config(Arc::clone(graph), &config).unwrap();
    sampler
        .process(quote_rows())
        .collect::<Result<Vec<_>>>()
        .unwrap()
}

#[test]
fn test_quote_stream_emits_on_midpoint_changes() {
    init_logger();
    let graph = Arc::new(load(QUOTE_GRAPH).unwrap());

    for strategy in [EvaluationStrategy::Batch, EvaluationStrategy::Incremental] {
        let records = sample(&graph, strategy);
        let rows: Vec<usize> = records.iter().map(|r| r.row).collect();
        assert_eq!(rows, vec![0, 1, 3], "{}", strategy);

        let triggers: Vec<f64> = records.iter().map(|r| r.trigger).collect();
        assert_eq!(triggers, vec![100.5, 101.0, 101.5]);

        let expected = [
            weighted_mid(100.0, 101.0, 10.0, 12.0),
            weighted_mid(100.5, 101.5, 11.0, 13.0),
            weighted_mid(101.0, 102.0, 12.0, 14.0),
        ];
        for (record, expected) in records.iter().zip(expected) {
            assert_eq!(record.outputs.len(), 1);
            assert!((record.outputs[0] - expected).abs() < 1e-9);
        }
    }
}

#[test]
fn test_strategies_emit_identical_records() {
    let graph = Arc::new(load(QUOTE_GRAPH).unwrap());
    assert_eq!(
        sample(&graph, EvaluationStrategy::Batch),
        sample(&graph, EvaluationStrategy::Incremental)
    );
}

#[test]
fn test_emitted_triggers_differ_from_their_predecessor() {
    let graph = Arc::new(
        load(
            r#"
root: 2
nodes:
  - { type: Input, slot: 0 }
  - { type: Constant, value: 2.0 }
  - { type: Comparison, left: 0, right: 1, op: ge }
"#,
        )
        .unwrap(),
    );
    let mut rng = StdRng::seed_from_u64(7);
    let rows: Vec<[f64; 1]> = (0..500).map(|_| [rng.gen_range(0..4) as f64]).collect();

    let evaluator = IncrementalEvaluator::new(Arc::clone(&graph));
    let mut sampler = TriggerSampler::new(evaluator, 2, vec![0]).unwrap();
    let records: Vec<Record> = sampler.process(&rows).collect::<Result<_>>().unwrap();

    assert_eq!(records.first().map(|r| r.row), Some(0));
    for pair in records.windows(2) {
        assert_ne!(pair[0].trigger, pair[1].trigger);
        assert!(pair[0].row < pair[1].row);
    }
    // Every suppressed row repeats the last emitted trigger.
    let mut next = records.iter().peekable();
    let mut last = None;
    for (i, row) in rows.iter().enumerate() {
        let trigger = if row[0] >= 2.0 { 1.0 } else { 0.0 };
        if next.peek().map(|r| r.row) == Some(i) {
            last = next.next().map(|r| r.trigger);
        } else {
            assert_eq!(last, Some(trigger));
        }
    }
}

#[test]
fn test_trigger_outside_root_subgraph() {
    let graph = Arc::new(
        load(
            r#"
root: 1
nodes:
  - { type: Input, slot: 0 }
  - { type: ConstantScale, operand: 0, factor: 2.0 }
  - { type: Input, slot: 1 }
"#,
        )
        .unwrap(),
    );

    let evaluator = BatchEvaluator::new(Arc::clone(&graph));
    assert_eq!(
        TriggerSampler::new(evaluator, 2, vec![1]).err(),
        Some(GraphError::NotScheduled { node: 2 })
    );

    let config = SamplerConfig::new(2, vec![1]);
    let mut sampler = TriggerSampler::from_config(graph, &config).unwrap();
    let rows = vec![[1.0, 0.0], [2.0, 0.0], [3.0, 1.0]];
    let records: Vec<Record> = sampler.process(rows).collect::<Result<_>>().unwrap();
    let summary: Vec<(usize, f64, f64)> = records
        .iter()
        .map(|r| (r.row, r.trigger, r.outputs[0]))
        .collect();
    assert_eq!(summary, vec![(0, 0.0, 2.0), (2, 1.0, 6.0)]);
}

#[test]
fn test_records_serialize_to_json() {
    let record = Record {
        row: 3,
        trigger: 101.5,
        outputs: vec![101.25],
    };
    let json = serde_json::to_string(&record).unwrap();
    assert_eq!(json, r#"{"row":3,"trigger":101.5,"outputs":[101.25]}"#);
    let back: Record = serde_json::from_str(&json).unwrap();
    assert_eq!(back, record);
}

#[test]
fn test_parallel_streams() {
    init_logger();
    let graph = Arc::new(load(QUOTE_GRAPH).unwrap());
    let config = graph.sampler_config().unwrap().clone();
    let streams = vec![quote_rows(), quote_rows()[..2].to_vec(), Vec::new()];

    let results = sample_streams(&graph, &config, &streams).unwrap();
    assert_eq!(results.len(), 3);
    assert_eq!(results[0].len(), 3);
    assert_eq!(results[1].len(), 2);
    assert!(results[2].is_empty());

    let broken = vec![quote_rows(), vec![HashMap::new()]];
    let err = sample_streams(&graph, &config, &broken).unwrap_err();
    assert!(err.is_input_error());
}
