//! Value types shared by raw signals, bind expressions and action state.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The three shapes an action (or a raw signal) can take.
///
/// The declaration order is the evaluation order of the tick pipeline:
/// every digital action is resolved before any one-axis analog action, and so on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Digital,
    Analog1,
    Analog2,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Digital, Category::Analog1, Category::Analog2];

    /// Resting value for this category: false, 0.0 or (0, 0).
    pub fn neutral(self) -> Value {
        match self {
            Category::Digital => Value::Bool(false),
            Category::Analog1 => Value::Scalar(0.0),
            Category::Analog2 => Value::Vec2(0.0, 0.0),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Digital => write!(f, "Digital"),
            Category::Analog1 => write!(f, "Analog1"),
            Category::Analog2 => write!(f, "Analog2"),
        }
    }
}

/// Component selector for [`Value::Vec2`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    X,
    Y,
}

/// A resolved action value or a raw reading.
///
/// Equality is exact per variant (no epsilon); change detection relies on it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    Bool(bool),
    Scalar(f32),
    Vec2(f32, f32),
}

impl Value {
    pub fn category(&self) -> Category {
        match self {
            Value::Bool(_) => Category::Digital,
            Value::Scalar(_) => Category::Analog1,
            Value::Vec2(..) => Category::Analog2,
        }
    }

    pub fn is_finite(&self) -> bool {
        match *self {
            Value::Bool(_) => true,
            Value::Scalar(v) => v.is_finite(),
            Value::Vec2(x, y) => x.is_finite() && y.is_finite(),
        }
    }

    /// Replaces NaN components with 0.0 and saturates infinities at the largest finite value.
    ///
    /// Exact change detection needs every stored value to compare equal to itself.
    pub fn sanitized(self) -> Value {
        match self {
            Value::Bool(_) => self,
            Value::Scalar(v) => Value::Scalar(finite_component(v)),
            Value::Vec2(x, y) => Value::Vec2(finite_component(x), finite_component(y)),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Value::Bool(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<f32> {
        match *self {
            Value::Scalar(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_vec2(&self) -> Option<(f32, f32)> {
        match *self {
            Value::Vec2(x, y) => Some((x, y)),
            _ => None,
        }
    }
}

fn finite_component(v: f32) -> f32 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(f32::MIN, f32::MAX)
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Bool(false)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Scalar(v)
    }
}

impl From<(f32, f32)> for Value {
    fn from((x, y): (f32, f32)) -> Self {
        Value::Vec2(x, y)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Scalar(v) => write!(f, "{:.3}", v),
            Value::Vec2(x, y) => write!(f, "({:.3}, {:.3})", x, y),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neutral_values_match_their_category() {
        for category in Category::ALL {
            assert_eq!(category.neutral().category(), category);
        }
        assert_eq!(Category::Analog2.neutral(), Value::Vec2(0.0, 0.0));
    }

    #[test]
    fn categories_order_digital_first() {
        let mut shuffled = vec![Category::Analog2, Category::Digital, Category::Analog1];
        shuffled.sort();
        assert_eq!(shuffled, Category::ALL.to_vec());
    }

    #[test]
    fn sanitized_values_equal_themselves() {
        assert_eq!(Value::Scalar(f32::NAN).sanitized(), Value::Scalar(0.0));
        assert_eq!(
            Value::Vec2(f32::INFINITY, f32::NEG_INFINITY).sanitized(),
            Value::Vec2(f32::MAX, f32::MIN)
        );
        assert_eq!(Value::Vec2(0.5, -0.25).sanitized(), Value::Vec2(0.5, -0.25));
        assert_eq!(Value::Bool(true).sanitized(), Value::Bool(true));
    }

    #[test]
    fn equality_is_exact() {
        assert_ne!(Value::Scalar(0.5), Value::Scalar(0.500_001));
        assert_ne!(Value::Vec2(0.0, 1.0), Value::Vec2(1.0, 0.0));
        assert_ne!(Value::Bool(false), Value::Scalar(0.0));
    }
}
