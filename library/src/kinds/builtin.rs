//! Baseline node kinds.

use std::str::FromStr;

use crate::error::{GraphError, Result};
use crate::model::{FieldValue, InputKey};

use super::decode::{Field, RawFields};
use super::{EvalArgs, KindRegistry, NodeKind};

type Decoded = std::result::Result<Vec<Field>, String>;

pub static INPUT: NodeKind = NodeKind {
    tag: "Input",
    aliases: &["input"],
    reads_binding: true,
    decode: decode_input,
    eval: eval_input,
};

pub static CONSTANT: NodeKind = NodeKind {
    tag: "Constant",
    aliases: &["Const", "const"],
    reads_binding: false,
    decode: decode_constant,
    eval: eval_constant,
};

pub static ADD: NodeKind = NodeKind {
    tag: "Add",
    aliases: &["Sum", "add", "sum"],
    reads_binding: false,
    decode: decode_children,
    eval: eval_add,
};

pub static MULTIPLY: NodeKind = NodeKind {
    tag: "Multiply",
    aliases: &["Mul", "mul"],
    reads_binding: false,
    decode: decode_children,
    eval: eval_multiply,
};

pub static DIVIDE: NodeKind = NodeKind {
    tag: "Divide",
    aliases: &["Div", "div"],
    reads_binding: false,
    decode: decode_left_right,
    eval: eval_divide,
};

pub static COMPARISON: NodeKind = NodeKind {
    tag: "Comparison",
    aliases: &["Compare"],
    reads_binding: false,
    decode: decode_comparison,
    eval: eval_comparison,
};

pub static CONSTANT_SCALE: NodeKind = NodeKind {
    tag: "ConstantScale",
    aliases: &["ConstantProduct"],
    reads_binding: false,
    decode: decode_constant_scale,
    eval: eval_constant_scale,
};

pub(super) fn register_all(registry: &mut KindRegistry) {
    for kind in [
        &INPUT,
        &CONSTANT,
        &ADD,
        &MULTIPLY,
        &DIVIDE,
        &COMPARISON,
        &CONSTANT_SCALE,
    ] {
        registry.register(kind);
    }
}

// ---------------------------------------------------------------------------
// Decoders
// ---------------------------------------------------------------------------

fn decode_input(raw: &mut RawFields) -> Decoded {
    // `input_index` is the older spelling of `slot`.
    if let Some(value) = raw.take("input_index") {
        if raw.contains("slot") {
            return Err("fields 'slot' and 'input_index' are mutually exclusive".to_string());
        }
        if raw.contains("name") {
            return Err("an input takes either 'name' or 'slot', not both".to_string());
        }
        let mut renamed = RawFields::new([("slot".to_string(), value)].into_iter().collect());
        return Ok(vec![renamed.index("slot")?]);
    }
    match (raw.contains("name"), raw.contains("slot")) {
        (true, false) => Ok(vec![raw.text("name")?]),
        (false, true) => Ok(vec![raw.index("slot")?]),
        (true, true) => Err("an input takes either 'name' or 'slot', not both".to_string()),
        (false, false) => Err("missing required field 'name' (or 'slot')".to_string()),
    }
}

fn decode_constant(raw: &mut RawFields) -> Decoded {
    Ok(vec![raw.number("value")?])
}

fn decode_children(raw: &mut RawFields) -> Decoded {
    Ok(vec![raw.many_refs("children")?])
}

fn decode_left_right(raw: &mut RawFields) -> Decoded {
    Ok(vec![raw.single_ref("left")?, raw.single_ref("right")?])
}

fn decode_comparison(raw: &mut RawFields) -> Decoded {
    let left = raw.single_ref("left")?;
    let right = raw.single_ref("right")?;
    let (name, op) = raw.text("op")?;
    let op: CompareOp = op.as_text().unwrap_or_default().parse()?;
    Ok(vec![left, right, (name, FieldValue::Text(op.name().to_string()))])
}

fn decode_constant_scale(raw: &mut RawFields) -> Decoded {
    Ok(vec![raw.single_ref("operand")?, raw.number("factor")?])
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

fn eval_input(args: &EvalArgs<'_>) -> Result<f64> {
    let key: InputKey<'_> = args
        .node
        .input_key()
        .ok_or_else(|| GraphError::eval(args.id, "input has neither a name nor a slot"))?;
    args.binding
        .value(key)
        .ok_or_else(|| GraphError::MissingInput {
            node: args.id,
            key: key.to_string(),
        })
}

fn eval_constant(args: &EvalArgs<'_>) -> Result<f64> {
    args.number("value")
}

fn eval_add(args: &EvalArgs<'_>) -> Result<f64> {
    match args.operands.split_first() {
        Some((first, rest)) => Ok(rest.iter().fold(*first, |acc, v| acc + v)),
        None => Err(GraphError::eval(args.id, "Add needs at least one child")),
    }
}

fn eval_multiply(args: &EvalArgs<'_>) -> Result<f64> {
    match args.operands.split_first() {
        Some((first, rest)) => Ok(rest.iter().fold(*first, |acc, v| acc * v)),
        None => Err(GraphError::eval(args.id, "Multiply needs at least one child")),
    }
}

/// IEEE-754 division; a zero divisor yields an infinity or NaN, never an error.
fn eval_divide(args: &EvalArgs<'_>) -> Result<f64> {
    let (left, right) = args.binary()?;
    Ok(left / right)
}

fn eval_comparison(args: &EvalArgs<'_>) -> Result<f64> {
    let (left, right) = args.binary()?;
    let op: CompareOp = args
        .text("op")?
        .parse()
        .map_err(|message: String| GraphError::eval(args.id, message))?;
    Ok(if op.holds(left, right) { 1.0 } else { 0.0 })
}

fn eval_constant_scale(args: &EvalArgs<'_>) -> Result<f64> {
    Ok(args.unary()? * args.number("factor")?)
}

/// Comparison operator of a `Comparison` node.
///
/// All comparisons are exact IEEE comparisons: anything involving NaN is
/// false, except `NotEqual`, which is true.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    GreaterThan,
    LessThan,
    Equal,
    GreaterOrEqual,
    LessOrEqual,
    NotEqual,
}

impl CompareOp {
    pub fn name(self) -> &'static str {
        match self {
            CompareOp::GreaterThan => "GreaterThan",
            CompareOp::LessThan => "LessThan",
            CompareOp::Equal => "Equal",
            CompareOp::GreaterOrEqual => "GreaterOrEqual",
            CompareOp::LessOrEqual => "LessOrEqual",
            CompareOp::NotEqual => "NotEqual",
        }
    }

    pub fn holds(self, left: f64, right: f64) -> bool {
        match self {
            CompareOp::GreaterThan => left > right,
            CompareOp::LessThan => left < right,
            CompareOp::Equal => left == right,
            CompareOp::GreaterOrEqual => left >= right,
            CompareOp::LessOrEqual => left <= right,
            CompareOp::NotEqual => left != right,
        }
    }
}

impl FromStr for CompareOp {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "GreaterThan" | "gt" | ">" => Ok(CompareOp::GreaterThan),
            "LessThan" | "lt" | "<" => Ok(CompareOp::LessThan),
            "Equal" | "eq" | "==" => Ok(CompareOp::Equal),
            "GreaterOrEqual" | "ge" | ">=" => Ok(CompareOp::GreaterOrEqual),
            "LessOrEqual" | "le" | "<=" => Ok(CompareOp::LessOrEqual),
            "NotEqual" | "ne" | "!=" => Ok(CompareOp::NotEqual),
            other => Err(format!("unknown comparison operator '{}'", other)),
        }
    }
}
