//! Evaluate filter expressions against a single record.
//!
//! Evaluation uses three-valued logic. `Value::Null` stands for both an absent value and
//! the `unknown` truth value: comparisons and functions with a null operand are unknown,
//! `and`/`or` follow Kleene's tables, and an unknown filter excludes the record.

use chrono::{Datelike, Timelike};

use query_engine_ir::ir::ast::{BinaryOperator, Expression, Function, Value};
use query_engine_metadata::metadata::SchemaProvider;

use super::binding::{Accessor, RecordBinding};
use super::Error;

/// An expression with every property resolved to its accessor.
pub(crate) enum Node<R> {
    Literal(Value),
    Property(Accessor<R>),
    Not(Box<Node<R>>),
    /// `eq null` or `ne null`, which are known even for absent values.
    NullTest {
        operand: Box<Node<R>>,
        negated: bool,
    },
    Binary {
        left: Box<Node<R>>,
        operator: BinaryOperator,
        right: Box<Node<R>>,
    },
    Call {
        function: Function,
        args: Vec<Node<R>>,
    },
}

/// Resolve the properties of `expression` against `binding`.
pub(crate) fn compile<R>(
    expression: &Expression,
    binding: &RecordBinding<R>,
) -> Result<Node<R>, Error> {
    match expression {
        Expression::Literal(value) => Ok(Node::Literal(value.clone())),
        Expression::Property(name) => resolve(name, binding).map(Node::Property),
        Expression::Not(operand) => Ok(Node::Not(Box::new(compile(operand, binding)?))),
        Expression::Binary {
            left,
            operator: operator @ (BinaryOperator::Eq | BinaryOperator::Ne),
            right,
        } if left.is_null_literal() || right.is_null_literal() => {
            let operand = if right.is_null_literal() { left } else { right };
            Ok(Node::NullTest {
                operand: Box::new(compile(operand, binding)?),
                negated: *operator == BinaryOperator::Ne,
            })
        }
        Expression::Binary {
            left,
            operator,
            right,
        } => Ok(Node::Binary {
            left: Box::new(compile(left, binding)?),
            operator: *operator,
            right: Box::new(compile(right, binding)?),
        }),
        Expression::Call { function, args } => Ok(Node::Call {
            function: *function,
            args: args
                .iter()
                .map(|arg| compile(arg, binding))
                .collect::<Result<_, _>>()?,
        }),
    }
}

/// Find the accessor of a property.
pub(crate) fn resolve<R>(name: &str, binding: &RecordBinding<R>) -> Result<Accessor<R>, Error> {
    binding
        .accessor(name)
        .ok_or_else(|| Error::UnknownProperty {
            property: name.to_string(),
            shape: binding.shape_name().to_string(),
        })
}

/// Does the filter hold for `record`. Unknown counts as false.
pub(crate) fn matches<R>(filter: &Node<R>, record: &R) -> bool {
    matches!(evaluate(filter, record), Value::Bool(true))
}

pub(crate) fn evaluate<R>(node: &Node<R>, record: &R) -> Value {
    match node {
        Node::Literal(value) => value.clone(),
        Node::Property(accessor) => accessor(record),
        Node::Not(operand) => match evaluate(operand, record) {
            Value::Bool(b) => Value::Bool(!b),
            _ => Value::Null,
        },
        Node::NullTest { operand, negated } => {
            Value::Bool(evaluate(operand, record).is_null() != *negated)
        }
        Node::Binary {
            left,
            operator: BinaryOperator::And,
            right,
        } => {
            let left = truth(&evaluate(left, record));
            if left == Some(false) {
                return Value::Bool(false);
            }
            match (left, truth(&evaluate(right, record))) {
                (_, Some(false)) => Value::Bool(false),
                (Some(true), Some(true)) => Value::Bool(true),
                _ => Value::Null,
            }
        }
        Node::Binary {
            left,
            operator: BinaryOperator::Or,
            right,
        } => {
            let left = truth(&evaluate(left, record));
            if left == Some(true) {
                return Value::Bool(true);
            }
            match (left, truth(&evaluate(right, record))) {
                (_, Some(true)) => Value::Bool(true),
                (Some(false), Some(false)) => Value::Bool(false),
                _ => Value::Null,
            }
        }
        Node::Binary {
            left,
            operator,
            right,
        } => {
            let left = evaluate(left, record);
            let right = evaluate(right, record);
            if operator.is_comparison() {
                compare(*operator, &left, &right)
            } else {
                arithmetic(*operator, &left, &right)
            }
        }
        Node::Call { function, args } => {
            let args: Vec<Value> = args.iter().map(|arg| evaluate(arg, record)).collect();
            call(*function, &args)
        }
    }
}

fn truth(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        _ => None,
    }
}

fn compare(operator: BinaryOperator, left: &Value, right: &Value) -> Value {
    if left.is_null() || right.is_null() {
        return Value::Null;
    }
    let Some(ordering) = left.compare(right) else {
        return Value::Null;
    };
    Value::Bool(match operator {
        BinaryOperator::Eq => ordering.is_eq(),
        BinaryOperator::Ne => ordering.is_ne(),
        BinaryOperator::Lt => ordering.is_lt(),
        BinaryOperator::Le => ordering.is_le(),
        BinaryOperator::Gt => ordering.is_gt(),
        BinaryOperator::Ge => ordering.is_ge(),
        _ => return Value::Null,
    })
}

#[allow(clippy::cast_precision_loss)]
fn arithmetic(operator: BinaryOperator, left: &Value, right: &Value) -> Value {
    if let (Value::Int(a), Value::Int(b)) = (left, right) {
        // overflow and division by zero are unknown.
        let result = match operator {
            BinaryOperator::Add => a.checked_add(*b),
            BinaryOperator::Sub => a.checked_sub(*b),
            BinaryOperator::Mul => a.checked_mul(*b),
            BinaryOperator::Div => a.checked_div(*b),
            BinaryOperator::Mod => a.checked_rem(*b),
            _ => None,
        };
        return result.map_or(Value::Null, Value::Int);
    }

    let as_float = |value: &Value| match value {
        Value::Int(i) => Some(*i as f64),
        Value::Float(x) => Some(*x),
        _ => None,
    };
    let (Some(a), Some(b)) = (as_float(left), as_float(right)) else {
        return Value::Null;
    };
    match operator {
        BinaryOperator::Add => Value::Float(a + b),
        BinaryOperator::Sub => Value::Float(a - b),
        BinaryOperator::Mul => Value::Float(a * b),
        BinaryOperator::Div => Value::Float(a / b),
        BinaryOperator::Mod => Value::Float(a % b),
        _ => Value::Null,
    }
}

/// String functions compare ordinally, by `char`.
fn call(function: Function, args: &[Value]) -> Value {
    match (function, args) {
        (Function::StartsWith, [Value::String(s), Value::String(prefix)]) => {
            Value::Bool(s.starts_with(prefix.as_str()))
        }
        (Function::EndsWith, [Value::String(s), Value::String(suffix)]) => {
            Value::Bool(s.ends_with(suffix.as_str()))
        }
        (Function::SubstringOf, [Value::String(needle), Value::String(s)]) => {
            Value::Bool(s.contains(needle.as_str()))
        }
        (Function::Length, [Value::String(s)]) => {
            Value::Int(i64::try_from(s.chars().count()).unwrap_or(i64::MAX))
        }
        (Function::ToLower, [Value::String(s)]) => Value::String(s.to_lowercase()),
        (Function::ToUpper, [Value::String(s)]) => Value::String(s.to_uppercase()),
        (Function::Trim, [Value::String(s)]) => Value::String(s.trim().to_string()),
        (Function::Year, [Value::DateTime(dt)]) => Value::Int(dt.year().into()),
        (Function::Month, [Value::DateTime(dt)]) => Value::Int(dt.month().into()),
        (Function::Day, [Value::DateTime(dt)]) => Value::Int(dt.day().into()),
        (Function::Hour, [Value::DateTime(dt)]) => Value::Int(dt.hour().into()),
        (Function::Minute, [Value::DateTime(dt)]) => Value::Int(dt.minute().into()),
        (Function::Second, [Value::DateTime(dt)]) => Value::Int(dt.second().into()),
        (Function::Round, [Value::Float(x)]) => Value::Float(x.round()),
        (Function::Floor, [Value::Float(x)]) => Value::Float(x.floor()),
        (Function::Ceiling, [Value::Float(x)]) => Value::Float(x.ceil()),
        (Function::Round | Function::Floor | Function::Ceiling, [Value::Int(i)]) => {
            Value::Int(*i)
        }
        _ => Value::Null,
    }
}
