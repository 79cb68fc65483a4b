//! Type inference and evaluation of bind expressions
//!
//! Inference runs bottom-up once per bind and rejects any shape mismatch. Only trees that
//! passed it are wrapped in a [`Binding`], so evaluation of a binding cannot fail.

use tracing::trace;

use crate::controller::{RawSnapshot, SignalCatalog};
use crate::mapping::{Axis, BindExpr, Category, ConfigError, Value};

impl BindExpr {
    /// Infers the result category of the tree.
    ///
    /// `own` is the category of the action the tree is bound to, which is what
    /// `PreviousState` resolves to. Every `Input` must be in `catalog`.
    pub fn infer(&self, own: Category, catalog: &SignalCatalog) -> Result<Category, ConfigError> {
        match self {
            BindExpr::Input(signal) => {
                if catalog.contains(*signal) {
                    Ok(signal.category())
                } else {
                    Err(ConfigError::UnknownSignal(*signal))
                }
            }
            BindExpr::Constant(value) => {
                if value.is_finite() {
                    Ok(value.category())
                } else {
                    Err(ConfigError::NonFiniteConstant)
                }
            }
            BindExpr::Add(a, b) | BindExpr::Multiply(a, b) => {
                let left = a.infer(own, catalog)?;
                let right = b.infer(own, catalog)?;
                if left != right {
                    return Err(ConfigError::OperandMismatch {
                        node: self.node_name(),
                        left,
                        right,
                    });
                }
                if left == Category::Digital {
                    return Err(ConfigError::UnexpectedKind {
                        node: self.node_name(),
                        expected: Category::Analog1,
                        found: left,
                    });
                }
                Ok(left)
            }
            BindExpr::Branch {
                cond,
                then,
                otherwise,
            } => {
                expect_kind("branch", cond.infer(own, catalog)?, Category::Digital)?;
                let left = then.infer(own, catalog)?;
                let right = otherwise.infer(own, catalog)?;
                if left != right {
                    return Err(ConfigError::OperandMismatch {
                        node: "branch",
                        left,
                        right,
                    });
                }
                Ok(left)
            }
            BindExpr::Xor(a, b) => {
                expect_kind("xor", a.infer(own, catalog)?, Category::Digital)?;
                expect_kind("xor", b.infer(own, catalog)?, Category::Digital)?;
                Ok(Category::Digital)
            }
            BindExpr::Join { x, y } => {
                expect_kind("join", x.infer(own, catalog)?, Category::Analog1)?;
                expect_kind("join", y.infer(own, catalog)?, Category::Analog1)?;
                Ok(Category::Analog2)
            }
            BindExpr::Split(vector, _) => {
                expect_kind("split", vector.infer(own, catalog)?, Category::Analog2)?;
                Ok(Category::Analog1)
            }
            BindExpr::Threshold(scalar, threshold) => {
                if !threshold.is_finite() {
                    return Err(ConfigError::NonFiniteConstant);
                }
                expect_kind("threshold", scalar.infer(own, catalog)?, Category::Analog1)?;
                Ok(Category::Digital)
            }
            BindExpr::PreviousState => Ok(own),
        }
    }

    /// Evaluates the tree. `None` only for trees that would not pass [`BindExpr::infer`].
    pub(crate) fn try_evaluate(&self, snapshot: &RawSnapshot, previous: Value) -> Option<Value> {
        match self {
            BindExpr::Input(signal) => Some(snapshot.get(*signal)),
            BindExpr::Constant(value) => Some(*value),
            BindExpr::Add(a, b) => match (
                a.try_evaluate(snapshot, previous)?,
                b.try_evaluate(snapshot, previous)?,
            ) {
                (Value::Scalar(l), Value::Scalar(r)) => Some(Value::Scalar(l + r)),
                (Value::Vec2(lx, ly), Value::Vec2(rx, ry)) => Some(Value::Vec2(lx + rx, ly + ry)),
                _ => None,
            },
            BindExpr::Multiply(a, b) => match (
                a.try_evaluate(snapshot, previous)?,
                b.try_evaluate(snapshot, previous)?,
            ) {
                (Value::Scalar(l), Value::Scalar(r)) => Some(Value::Scalar(l * r)),
                (Value::Vec2(lx, ly), Value::Vec2(rx, ry)) => Some(Value::Vec2(lx * rx, ly * ry)),
                _ => None,
            },
            BindExpr::Branch {
                cond,
                then,
                otherwise,
            } => {
                if cond.try_evaluate(snapshot, previous)?.as_bool()? {
                    then.try_evaluate(snapshot, previous)
                } else {
                    otherwise.try_evaluate(snapshot, previous)
                }
            }
            BindExpr::Xor(a, b) => {
                let l = a.try_evaluate(snapshot, previous)?.as_bool()?;
                let r = b.try_evaluate(snapshot, previous)?.as_bool()?;
                Some(Value::Bool(l ^ r))
            }
            BindExpr::Join { x, y } => {
                let x = x.try_evaluate(snapshot, previous)?.as_scalar()?;
                let y = y.try_evaluate(snapshot, previous)?.as_scalar()?;
                Some(Value::Vec2(x, y))
            }
            BindExpr::Split(vector, axis) => {
                let (x, y) = vector.try_evaluate(snapshot, previous)?.as_vec2()?;
                Some(Value::Scalar(match axis {
                    Axis::X => x,
                    Axis::Y => y,
                }))
            }
            BindExpr::Threshold(scalar, threshold) => {
                let v = scalar.try_evaluate(snapshot, previous)?.as_scalar()?;
                Some(Value::Bool(v.abs() > *threshold))
            }
            BindExpr::PreviousState => Some(previous),
        }
    }
}

fn expect_kind(node: &'static str, found: Category, expected: Category) -> Result<(), ConfigError> {
    if found == expected {
        Ok(())
    } else {
        Err(ConfigError::UnexpectedKind {
            node,
            expected,
            found,
        })
    }
}

/// A type-checked expression bound to an action of a known category.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    expr: BindExpr,
    category: Category,
}

impl Binding {
    /// Checks `expr` for an action named `action` of `category`.
    pub fn check(
        action: &str,
        category: Category,
        expr: BindExpr,
        catalog: &SignalCatalog,
    ) -> Result<Self, ConfigError> {
        let found = expr.infer(category, catalog)?;
        if found != category {
            return Err(ConfigError::TypeMismatch {
                action: action.to_string(),
                expected: category,
                found,
            });
        }
        Ok(Self { expr, category })
    }

    /// The default binding: a constant neutral value.
    pub fn neutral(category: Category) -> Self {
        Self {
            expr: BindExpr::Constant(category.neutral()),
            category,
        }
    }

    pub fn expr(&self) -> &BindExpr {
        &self.expr
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn is_neutral(&self) -> bool {
        self.expr == BindExpr::Constant(self.category.neutral())
    }

    /// Resolves the binding against one tick's snapshot and the action's previous value.
    ///
    /// Arithmetic can overflow even on finite inputs, so the result is always
    /// [sanitized](Value::sanitized) before it is returned.
    pub fn evaluate(&self, snapshot: &RawSnapshot, previous: Value) -> Value {
        match self.expr.try_evaluate(snapshot, previous) {
            Some(value) => value.sanitized(),
            None => {
                // Unreachable for checked trees
                trace!("Binding for {} produced no value", self.category);
                self.category.neutral()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::{RawAnalog1, RawAnalog2, RawDigital, RawSignal};
    use crate::mapping::expr::*;
    use proptest::prelude::*;

    fn catalog() -> SignalCatalog {
        SignalCatalog::all()
    }

    fn eval(expr: &BindExpr, snapshot: &RawSnapshot, previous: Value) -> Value {
        expr.try_evaluate(snapshot, previous).unwrap()
    }

    #[test]
    fn xor_truth_table() {
        let empty = RawSnapshot::new();
        for (a, b, out) in [
            (true, true, false),
            (true, false, true),
            (false, true, true),
            (false, false, false),
        ] {
            let tree = xor(constant(a), constant(b));
            assert_eq!(eval(&tree, &empty, Value::Bool(false)), Value::Bool(out));
        }
    }

    #[test]
    fn add_and_multiply_are_elementwise_for_vectors() {
        let empty = RawSnapshot::new();
        let sum = add(constant((1.0, 2.0)), constant((0.5, -2.0)));
        let product = multiply(constant((1.0, 2.0)), constant((3.0, -1.0)));
        assert_eq!(eval(&sum, &empty, Value::default()), Value::Vec2(1.5, 0.0));
        assert_eq!(eval(&product, &empty, Value::default()), Value::Vec2(3.0, -2.0));
        assert_eq!(sum.infer(Category::Analog2, &catalog()), Ok(Category::Analog2));
    }

    #[test]
    fn input_reads_snapshot() {
        let snapshot = RawSnapshot::new()
            .with(RawAnalog2::StickRight, (0.25, -0.5))
            .with(RawAnalog1::TriggerLeft, 0.75);
        assert_eq!(
            eval(&input(RawAnalog2::StickRight), &snapshot, Value::default()),
            Value::Vec2(0.25, -0.5)
        );
        assert_eq!(
            eval(&negate(input(RawAnalog1::TriggerLeft)), &snapshot, Value::default()),
            Value::Scalar(-0.75)
        );
    }

    #[test]
    fn previous_state_is_passed_through() {
        let tree = split(previous_state(), Axis::Y);
        assert_eq!(
            eval(&tree, &RawSnapshot::new(), Value::Vec2(0.3, 0.9)),
            Value::Scalar(0.9)
        );
        assert_eq!(tree.infer(Category::Analog2, &catalog()), Ok(Category::Analog1));
        assert!(tree.infer(Category::Digital, &catalog()).is_err());
    }

    #[test]
    fn threshold_uses_magnitude() {
        let snapshot = RawSnapshot::new().with(RawAnalog1::TriggerRight, 0.8);
        let tree = threshold(negate(input(RawAnalog1::TriggerRight)), 0.75);
        assert_eq!(eval(&tree, &snapshot, Value::default()), Value::Bool(true));
        assert_eq!(tree.infer(Category::Digital, &catalog()), Ok(Category::Digital));
    }

    #[test]
    fn branch_evaluates_only_the_selected_side() {
        // The rejected side is ill-typed on purpose: evaluating it would yield no value
        let poisoned = add(constant(true), constant(1.0));
        let empty = RawSnapshot::new();

        let take_then = branch(constant(true), constant(2.0), poisoned.clone());
        assert_eq!(take_then.try_evaluate(&empty, Value::default()), Some(Value::Scalar(2.0)));

        let take_else = branch(constant(false), poisoned, constant(3.0));
        assert_eq!(take_else.try_evaluate(&empty, Value::default()), Some(Value::Scalar(3.0)));
    }

    #[test]
    fn branch_arms_must_agree() {
        let tree = branch(input(RawDigital::FaceUp), constant(1.0), constant(true));
        assert_eq!(
            tree.infer(Category::Analog1, &catalog()),
            Err(ConfigError::OperandMismatch {
                node: "branch",
                left: Category::Analog1,
                right: Category::Digital
            })
        );
        let tree = branch(constant(1.0), constant(1.0), constant(2.0));
        assert!(matches!(
            tree.infer(Category::Analog1, &catalog()),
            Err(ConfigError::UnexpectedKind { node: "branch", .. })
        ));
    }

    #[test]
    fn add_rejects_mixed_shapes_and_booleans() {
        let mixed = add(input(RawAnalog2::StickLeft), constant(1.0));
        assert_eq!(
            mixed.infer(Category::Analog1, &catalog()),
            Err(ConfigError::OperandMismatch {
                node: "add",
                left: Category::Analog2,
                right: Category::Analog1
            })
        );
        let bools = multiply(constant(true), constant(false));
        assert!(matches!(
            bools.infer(Category::Digital, &catalog()),
            Err(ConfigError::UnexpectedKind { node: "multiply", .. })
        ));
    }

    #[test]
    fn unknown_signal_and_non_finite_constant_rejected() {
        let only_buttons: SignalCatalog = RawDigital::ALL.into_iter().map(RawSignal::Digital).collect();
        assert_eq!(
            input(RawAnalog1::TriggerLeft).infer(Category::Analog1, &only_buttons),
            Err(ConfigError::UnknownSignal(RawSignal::Analog1(RawAnalog1::TriggerLeft)))
        );
        assert_eq!(
            constant(f32::INFINITY).infer(Category::Analog1, &catalog()),
            Err(ConfigError::NonFiniteConstant)
        );
    }

    #[test]
    fn binding_checks_result_against_action() {
        let err = Binding::check("fire", Category::Digital, input(RawAnalog2::StickLeft), &catalog())
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::TypeMismatch {
                action: "fire".to_string(),
                expected: Category::Digital,
                found: Category::Analog2
            }
        );
        let ok = Binding::check("fire", Category::Digital, input(RawDigital::FaceDown), &catalog()).unwrap();
        assert!(!ok.is_neutral());
        assert!(Binding::neutral(Category::Analog1).is_neutral());
    }

    #[test]
    fn overflowing_arithmetic_never_yields_nan() {
        // (MAX + MAX) * 0 is inf * 0
        let tree = multiply(
            add(constant(f32::MAX), constant(f32::MAX)),
            constant(0.0),
        );
        let binding = Binding::check("rotation", Category::Analog1, tree, &catalog()).unwrap();
        let value = binding.evaluate(&RawSnapshot::new(), Value::Scalar(0.0));
        assert_eq!(value, Value::Scalar(0.0));
        assert_eq!(binding.evaluate(&RawSnapshot::new(), value), value);

        let sum = Binding::check(
            "rotation",
            Category::Analog1,
            add(constant(f32::MAX), constant(f32::MAX)),
            &catalog(),
        )
        .unwrap();
        assert_eq!(sum.evaluate(&RawSnapshot::new(), Value::Scalar(0.0)), Value::Scalar(f32::MAX));
    }

    proptest! {
        #[test]
        fn split_inverts_join(a in -1000.0f32..1000.0, b in -1000.0f32..1000.0) {
            let empty = RawSnapshot::new();
            let joined = join(constant(a), constant(b));
            prop_assert_eq!(eval(&split(joined.clone(), Axis::X), &empty, Value::default()), Value::Scalar(a));
            prop_assert_eq!(eval(&split(joined, Axis::Y), &empty, Value::default()), Value::Scalar(b));
        }

        #[test]
        fn evaluation_is_deterministic(
            up in any::<bool>(),
            down in any::<bool>(),
            trigger in -1.0f32..1.0,
            prev_y in -1.0f32..1.0,
        ) {
            let snapshot = RawSnapshot::new()
                .with(RawDigital::FaceUp, up)
                .with(RawDigital::FaceDown, down)
                .with(RawAnalog1::TriggerRight, trigger);
            let tree = join(
                input(RawAnalog1::TriggerRight),
                branch(
                    xor(input(RawDigital::FaceUp), input(RawDigital::FaceDown)),
                    branch(input(RawDigital::FaceUp), constant(1.0), constant(-1.0)),
                    split(previous_state(), Axis::Y),
                ),
            );
            let binding = Binding::check("movement", Category::Analog2, tree, &catalog()).unwrap();
            let previous = Value::Vec2(0.0, prev_y);
            let first = binding.evaluate(&snapshot, previous);
            prop_assert_eq!(first, binding.evaluate(&snapshot, previous));

            let expected_y = if up ^ down { if up { 1.0 } else { -1.0 } } else { prev_y };
            prop_assert_eq!(first, Value::Vec2(trigger, expected_y));
        }
    }
}
