//! Helpers for building IR expressions in certain shapes and patterns.

use super::ast::*;

/// A reference to a record property.
pub fn property(name: impl Into<String>) -> Expression {
    Expression::Property(name.into())
}

/// A literal value.
pub fn literal(value: impl Into<Value>) -> Expression {
    Expression::Literal(value.into())
}

/// The `null` literal.
pub fn null() -> Expression {
    Expression::Literal(Value::Null)
}

/// A binary operation.
pub fn binary(left: Expression, operator: BinaryOperator, right: Expression) -> Expression {
    Expression::Binary {
        left: Box::new(left),
        operator,
        right: Box::new(right),
    }
}

pub fn eq(left: Expression, right: Expression) -> Expression {
    binary(left, BinaryOperator::Eq, right)
}

pub fn ne(left: Expression, right: Expression) -> Expression {
    binary(left, BinaryOperator::Ne, right)
}

pub fn and(left: Expression, right: Expression) -> Expression {
    binary(left, BinaryOperator::And, right)
}

pub fn or(left: Expression, right: Expression) -> Expression {
    binary(left, BinaryOperator::Or, right)
}

pub fn not(expression: Expression) -> Expression {
    Expression::Not(Box::new(expression))
}

/// A function call.
pub fn call(function: Function, args: Vec<Expression>) -> Expression {
    Expression::Call { function, args }
}

/// Combine an optional existing filter with a new one using `and`.
pub fn conjunction(existing: Option<Expression>, predicate: Expression) -> Expression {
    match existing {
        None => predicate,
        Some(existing) => and(existing, predicate),
    }
}

/// An ascending ordering element.
pub fn ascending(property: impl Into<String>) -> OrderByElement {
    OrderByElement {
        property: property.into(),
        direction: Direction::Asc,
    }
}

/// A descending ordering element.
pub fn descending(property: impl Into<String>) -> OrderByElement {
    OrderByElement {
        property: property.into(),
        direction: Direction::Desc,
    }
}
