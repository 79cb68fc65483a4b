//! Bind-time errors

use thiserror::Error;

use crate::controller::RawSignal;
use crate::mapping::Category;

/// Reasons a binding, a configuration or an action declaration is rejected.
///
/// All of these surface before the first evaluation; a rejected bind leaves the
/// previously installed configuration untouched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// The expression's result does not fit the action's category
    #[error("Action {action} is {expected} but its binding produces {found}")]
    TypeMismatch {
        action: String,
        expected: Category,
        found: Category,
    },

    /// The two operands of a binary node disagree in shape
    #[error("{node} needs operands of the same shape, got {left} and {right}")]
    OperandMismatch {
        node: &'static str,
        left: Category,
        right: Category,
    },

    /// An operand has the wrong shape for its position
    #[error("{node} expects {expected}, got {found}")]
    UnexpectedKind {
        node: &'static str,
        expected: Category,
        found: Category,
    },

    #[error("Raw signal {0} is not provided by the backend")]
    UnknownSignal(RawSignal),

    #[error("Unknown action: {0}")]
    UnknownAction(String),

    #[error("Action {name} is already declared as {category}")]
    DuplicateAction { category: Category, name: String },

    #[error("Constants must be finite")]
    NonFiniteConstant,

    #[error("Configuration was built for a different action set")]
    ForeignActionSet,
}
