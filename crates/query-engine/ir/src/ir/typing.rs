//! Typing rules for filter expressions.
//!
//! The parser applies these rules node by node as it builds the tree, so errors can point at
//! a token. Pipelines built in code are checked after the fact with [`infer`].

use std::fmt;

use query_engine_metadata::metadata::{self, SchemaProvider};
use thiserror::Error;

use super::ast::{BinaryOperator, Expression, Function, ScalarType};

/// The static type of an expression. `null` literals have their own type, which is
/// compatible with every operand position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExprType {
    Null,
    Scalar(ScalarType),
}

impl ExprType {
    pub const BOOLEAN: ExprType = ExprType::Scalar(ScalarType::Boolean);
}

impl fmt::Display for ExprType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ExprType::Null => write!(f, "null"),
            ExprType::Scalar(scalar_type) => write!(f, "{scalar_type}"),
        }
    }
}

/// An operator or function applied to operands of the wrong type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeError {
    #[error("operator '{operator}' cannot be applied to {left} and {right}")]
    Operator {
        operator: BinaryOperator,
        left: ExprType,
        right: ExprType,
    },
    #[error("'not' cannot be applied to {0}")]
    Not(ExprType),
    #[error("'{function}' takes {expected} argument(s), found {found}")]
    Arity {
        function: Function,
        expected: usize,
        found: usize,
    },
    #[error("argument {position} of '{function}' must be {expected}, found {found}")]
    Argument {
        function: Function,
        position: usize,
        expected: &'static str,
        found: ExprType,
    },
    #[error("a filter must be a boolean expression, found {0}")]
    NotAPredicate(ExprType),
}

/// Errors from inferring the type of a whole tree against a schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InferError {
    #[error(transparent)]
    UnknownProperty(#[from] metadata::Error),
    #[error(transparent)]
    Type(#[from] TypeError),
}

/// The type of a literal or property of scalar type `scalar_type`.
pub fn of_scalar(scalar_type: Option<ScalarType>) -> ExprType {
    scalar_type.map_or(ExprType::Null, ExprType::Scalar)
}

/// The result type of `left operator right`.
pub fn binary_result_type(
    operator: BinaryOperator,
    left: ExprType,
    right: ExprType,
) -> Result<ExprType, TypeError> {
    use ExprType::{Null, Scalar};

    let mismatch = || TypeError::Operator {
        operator,
        left,
        right,
    };

    if operator.is_logical() {
        return match (left, right) {
            (Scalar(ScalarType::Boolean), Scalar(ScalarType::Boolean)) => Ok(ExprType::BOOLEAN),
            _ => Err(mismatch()),
        };
    }

    if operator.is_arithmetic() {
        return match (left, right) {
            (Null, Null) => Ok(Null),
            (Null, Scalar(t)) | (Scalar(t), Null) if t.is_numeric() => Ok(Scalar(t)),
            (Scalar(ScalarType::Integer), Scalar(ScalarType::Integer)) => {
                Ok(Scalar(ScalarType::Integer))
            }
            (Scalar(a), Scalar(b)) if a.is_numeric() && b.is_numeric() => {
                Ok(Scalar(ScalarType::Double))
            }
            _ => Err(mismatch()),
        };
    }

    // comparisons. a null operand turns eq/ne into a null test and anything else into unknown.
    match (left, right) {
        (Null, _) | (_, Null) => Ok(ExprType::BOOLEAN),
        (Scalar(a), Scalar(b)) => {
            let compatible = a == b || (a.is_numeric() && b.is_numeric());
            let ordered = matches!(operator, BinaryOperator::Eq | BinaryOperator::Ne)
                || (a.is_ordered() && b.is_ordered());
            if compatible && ordered {
                Ok(ExprType::BOOLEAN)
            } else {
                Err(mismatch())
            }
        }
    }
}

/// The result type of `not operand`.
pub fn not_result_type(operand: ExprType) -> Result<ExprType, TypeError> {
    if operand == ExprType::BOOLEAN {
        Ok(ExprType::BOOLEAN)
    } else {
        Err(TypeError::Not(operand))
    }
}

/// The result type of calling `function` with arguments of the given types.
pub fn function_result_type(function: Function, args: &[ExprType]) -> Result<ExprType, TypeError> {
    if args.len() != function.arity() {
        return Err(TypeError::Arity {
            function,
            expected: function.arity(),
            found: args.len(),
        });
    }

    let expect = |position: usize,
                  accepts: fn(ScalarType) -> bool,
                  expected: &'static str|
     -> Result<ExprType, TypeError> {
        match args[position] {
            ExprType::Null => Ok(ExprType::Null),
            ExprType::Scalar(t) if accepts(t) => Ok(ExprType::Scalar(t)),
            found => Err(TypeError::Argument {
                function,
                position: position + 1,
                expected,
                found,
            }),
        }
    };
    let is_string = |t: ScalarType| t == ScalarType::String;
    let is_datetime = |t: ScalarType| t == ScalarType::DateTime;

    match function {
        Function::StartsWith | Function::EndsWith | Function::SubstringOf => {
            expect(0, is_string, "a string")?;
            expect(1, is_string, "a string")?;
            Ok(ExprType::BOOLEAN)
        }
        Function::Length => {
            expect(0, is_string, "a string")?;
            Ok(ExprType::Scalar(ScalarType::Integer))
        }
        Function::ToLower | Function::ToUpper | Function::Trim => {
            expect(0, is_string, "a string")?;
            Ok(ExprType::Scalar(ScalarType::String))
        }
        Function::Year
        | Function::Month
        | Function::Day
        | Function::Hour
        | Function::Minute
        | Function::Second => {
            expect(0, is_datetime, "a datetime")?;
            Ok(ExprType::Scalar(ScalarType::Integer))
        }
        Function::Round | Function::Floor | Function::Ceiling => {
            match expect(0, ScalarType::is_numeric, "a number")? {
                ExprType::Null => Ok(ExprType::Scalar(ScalarType::Double)),
                numeric => Ok(numeric),
            }
        }
    }
}

/// Infer the type of an expression, resolving property references against `schema`.
pub fn infer<S: SchemaProvider + ?Sized>(
    expression: &Expression,
    schema: &S,
) -> Result<ExprType, InferError> {
    match expression {
        Expression::Literal(value) => Ok(of_scalar(value.scalar_type())),
        Expression::Property(name) => {
            let info = schema.lookup_property(name)?;
            Ok(ExprType::Scalar(info.r#type))
        }
        Expression::Not(operand) => Ok(not_result_type(infer(operand, schema)?)?),
        Expression::Binary {
            left,
            operator,
            right,
        } => {
            let left = infer(left, schema)?;
            let right = infer(right, schema)?;
            Ok(binary_result_type(*operator, left, right)?)
        }
        Expression::Call { function, args } => {
            let arg_types = args
                .iter()
                .map(|arg| infer(arg, schema))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(function_result_type(*function, &arg_types)?)
        }
    }
}

/// Check that an expression is usable as a filter: every property resolves and the
/// whole expression is boolean.
pub fn check_predicate<S: SchemaProvider + ?Sized>(
    expression: &Expression,
    schema: &S,
) -> Result<(), InferError> {
    match infer(expression, schema)? {
        ExprType::Scalar(ScalarType::Boolean) => Ok(()),
        other => Err(TypeError::NotAPredicate(other).into()),
    }
}
