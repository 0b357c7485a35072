use signal_graph::kinds::{EvalArgs, Field, KindRegistry, NodeKind, RawFields};
use signal_graph::{GraphError, Result};

type Decoded = std::result::Result<Vec<Field>, String>;

pub static SUBTRACT: NodeKind = NodeKind {
    tag: "Subtract",
    aliases: &["Sub", "sub"],
    reads_binding: false,
    decode: decode_left_right,
    eval: eval_subtract,
};

pub static POW: NodeKind = NodeKind {
    tag: "Pow",
    aliases: &["Power", "pow"],
    reads_binding: false,
    decode: decode_pow,
    eval: eval_pow,
};

pub static MIN: NodeKind = NodeKind {
    tag: "Min",
    aliases: &["min"],
    reads_binding: false,
    decode: decode_children,
    eval: eval_min,
};

pub static MAX: NodeKind = NodeKind {
    tag: "Max",
    aliases: &["max"],
    reads_binding: false,
    decode: decode_children,
    eval: eval_max,
};

/// Add the extra kinds to `registry`.
pub fn register(registry: &mut KindRegistry) {
    for kind in [&SUBTRACT, &POW, &MIN, &MAX] {
        registry.register(kind);
    }
    log::info!("Registered extra node kinds");
}

/// The built-in kinds plus the extra kinds.
pub fn registry() -> KindRegistry {
    let mut registry = KindRegistry::with_builtin_kinds();
    register(&mut registry);
    registry
}

fn decode_left_right(raw: &mut RawFields) -> Decoded {
    Ok(vec![raw.single_ref("left")?, raw.single_ref("right")?])
}

fn decode_pow(raw: &mut RawFields) -> Decoded {
    Ok(vec![raw.single_ref("base")?, raw.single_ref("exponent")?])
}

fn decode_children(raw: &mut RawFields) -> Decoded {
    Ok(vec![raw.many_refs("children")?])
}

fn eval_subtract(args: &EvalArgs<'_>) -> Result<f64> {
    let (left, right) = args.binary()?;
    Ok(left - right)
}

fn eval_pow(args: &EvalArgs<'_>) -> Result<f64> {
    let (base, exponent) = args.binary()?;
    Ok(base.powf(exponent))
}

// NaN propagates: a NaN child makes the whole reduction NaN.
fn eval_min(args: &EvalArgs<'_>) -> Result<f64> {
    reduce(args, "Min", |acc, v| if v < acc { v } else { acc })
}

fn eval_max(args: &EvalArgs<'_>) -> Result<f64> {
    reduce(args, "Max", |acc, v| if v > acc { v } else { acc })
}

fn reduce(args: &EvalArgs<'_>, tag: &str, pick: fn(f64, f64) -> f64) -> Result<f64> {
    let (first, rest) = args
        .operands
        .split_first()
        .ok_or_else(|| GraphError::eval(args.id, format!("{} needs at least one child", tag)))?;
    let mut acc = *first;
    for &value in rest {
        if acc.is_nan() {
            break;
        }
        acc = if value.is_nan() { value } else { pick(acc, value) };
    }
    Ok(acc)
}
