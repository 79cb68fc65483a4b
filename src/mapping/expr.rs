//! Bind expressions
//!
//! A binding is a small immutable tree combining raw signals, constants and the
//! action's own previous value. Trees are built with the free functions in this
//! module and checked once, at bind time, by [`BindExpr::infer`].
//!
//! ```text
//! join(
//!     add(input(TriggerRight), negate(input(TriggerLeft))),
//!     branch(xor(input(FaceUp), input(FaceDown)),
//!            branch(input(FaceUp), constant(1.0), constant(-1.0)),
//!            split(previous_state(), Axis::Y)))
//! ```

use serde::{Deserialize, Serialize};

use crate::controller::RawSignal;
use crate::mapping::{Axis, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BindExpr {
    /// Current reading of a raw signal, typed by the signal's category
    Input(RawSignal),
    Constant(Value),
    /// Scalar + Scalar or elementwise Vec2 + Vec2
    Add(Box<BindExpr>, Box<BindExpr>),
    /// Scalar * Scalar or elementwise Vec2 * Vec2
    Multiply(Box<BindExpr>, Box<BindExpr>),
    /// Only the selected branch is evaluated
    Branch {
        cond: Box<BindExpr>,
        then: Box<BindExpr>,
        otherwise: Box<BindExpr>,
    },
    Xor(Box<BindExpr>, Box<BindExpr>),
    Join {
        x: Box<BindExpr>,
        y: Box<BindExpr>,
    },
    Split(Box<BindExpr>, Axis),
    /// |value| > threshold
    Threshold(Box<BindExpr>, f32),
    /// The owning action's value from the previous tick
    PreviousState,
}

impl BindExpr {
    /// Short name used in error messages.
    pub fn node_name(&self) -> &'static str {
        match self {
            BindExpr::Input(_) => "input",
            BindExpr::Constant(_) => "constant",
            BindExpr::Add(..) => "add",
            BindExpr::Multiply(..) => "multiply",
            BindExpr::Branch { .. } => "branch",
            BindExpr::Xor(..) => "xor",
            BindExpr::Join { .. } => "join",
            BindExpr::Split(..) => "split",
            BindExpr::Threshold(..) => "threshold",
            BindExpr::PreviousState => "previous_state",
        }
    }

    /// Raw signals referenced anywhere in the tree, in visiting order.
    pub fn signals(&self) -> Vec<RawSignal> {
        let mut out = Vec::new();
        self.collect_signals(&mut out);
        out
    }

    fn collect_signals(&self, out: &mut Vec<RawSignal>) {
        match self {
            BindExpr::Input(signal) => out.push(*signal),
            BindExpr::Constant(_) | BindExpr::PreviousState => {}
            BindExpr::Add(a, b) | BindExpr::Multiply(a, b) | BindExpr::Xor(a, b) => {
                a.collect_signals(out);
                b.collect_signals(out);
            }
            BindExpr::Join { x, y } => {
                x.collect_signals(out);
                y.collect_signals(out);
            }
            BindExpr::Branch {
                cond,
                then,
                otherwise,
            } => {
                cond.collect_signals(out);
                then.collect_signals(out);
                otherwise.collect_signals(out);
            }
            BindExpr::Split(inner, _) | BindExpr::Threshold(inner, _) => inner.collect_signals(out),
        }
    }
}

pub fn input(signal: impl Into<RawSignal>) -> BindExpr {
    BindExpr::Input(signal.into())
}

pub fn constant(value: impl Into<Value>) -> BindExpr {
    BindExpr::Constant(value.into())
}

pub fn add(a: BindExpr, b: BindExpr) -> BindExpr {
    BindExpr::Add(Box::new(a), Box::new(b))
}

pub fn multiply(a: BindExpr, b: BindExpr) -> BindExpr {
    BindExpr::Multiply(Box::new(a), Box::new(b))
}

pub fn branch(cond: BindExpr, then: BindExpr, otherwise: BindExpr) -> BindExpr {
    BindExpr::Branch {
        cond: Box::new(cond),
        then: Box::new(then),
        otherwise: Box::new(otherwise),
    }
}

pub fn xor(a: BindExpr, b: BindExpr) -> BindExpr {
    BindExpr::Xor(Box::new(a), Box::new(b))
}

pub fn join(x: BindExpr, y: BindExpr) -> BindExpr {
    BindExpr::Join {
        x: Box::new(x),
        y: Box::new(y),
    }
}

pub fn split(vector: BindExpr, axis: Axis) -> BindExpr {
    BindExpr::Split(Box::new(vector), axis)
}

pub fn threshold(scalar: BindExpr, threshold: f32) -> BindExpr {
    BindExpr::Threshold(Box::new(scalar), threshold)
}

pub fn previous_state() -> BindExpr {
    BindExpr::PreviousState
}

/// Scalar multiplied by -1.
pub fn negate(scalar: BindExpr) -> BindExpr {
    multiply(scalar, constant(-1.0))
}

/// `active` while the button is held, `inactive` otherwise.
pub fn digital_to_axis(signal: impl Into<RawSignal>, active: f32, inactive: f32) -> BindExpr {
    branch(input(signal), constant(active), constant(inactive))
}
