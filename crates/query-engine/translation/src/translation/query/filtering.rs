//! Handle filtering/where clauses translation.
//!
//! Expressions are translated in one of two positions. In predicate position the result
//! is a SQL condition, in value position it is a scalar. Boolean properties may appear in
//! either, every other node belongs to exactly one of them.

use query_engine_ir::ir::ast as ir;
use query_engine_sql::sql;
use query_engine_sql::sql::string::ParamValue;

use super::values;
use crate::translation::error::Error;
use crate::translation::helpers::Env;

/// Translate a filter into a SQL condition.
pub fn translate_predicate(
    env: &Env,
    expression: &ir::Expression,
) -> Result<sql::ast::Expression, Error> {
    match expression {
        ir::Expression::Literal(ir::Value::Bool(b)) => Ok(sql::ast::Expression::Value(
            sql::ast::Value::Bool(*b),
        )),
        ir::Expression::Literal(_) => Err(Error::NotSupported(
            "non-boolean literals used as conditions".to_string(),
        )),
        // a boolean property used as a condition on its own.
        ir::Expression::Property(_) => Ok(sql::ast::Expression::BinaryOperation {
            left: Box::new(translate_value(env, expression)?),
            operator: sql::ast::BinaryOperator("=".to_string()),
            right: Box::new(parameter(ParamValue::Bool(true))),
        }),
        ir::Expression::Not(operand) => Ok(sql::ast::Expression::Not(Box::new(
            translate_predicate(env, operand)?,
        ))),
        ir::Expression::Binary {
            left,
            operator,
            right,
        } => match operator {
            ir::BinaryOperator::And => Ok(sql::ast::Expression::And {
                left: Box::new(translate_predicate(env, left)?),
                right: Box::new(translate_predicate(env, right)?),
            }),
            ir::BinaryOperator::Or => Ok(sql::ast::Expression::Or {
                left: Box::new(translate_predicate(env, left)?),
                right: Box::new(translate_predicate(env, right)?),
            }),
            operator if operator.is_comparison() => {
                translate_comparison(env, left, *operator, right)
            }
            _ => Err(Error::NotSupported(
                "arithmetic expressions used as conditions".to_string(),
            )),
        },
        ir::Expression::Call { function, args } => match function {
            ir::Function::StartsWith | ir::Function::EndsWith | ir::Function::SubstringOf => {
                translate_like(env, *function, args)
            }
            _ => Err(Error::NotSupported(format!(
                "'{function}' used as a condition"
            ))),
        },
    }
}

/// Comparisons against a `null` literal with `eq` or `ne` are null tests. Every other
/// comparison keeps SQL's own null semantics.
fn translate_comparison(
    env: &Env,
    left: &ir::Expression,
    operator: ir::BinaryOperator,
    right: &ir::Expression,
) -> Result<sql::ast::Expression, Error> {
    let null_test = match operator {
        ir::BinaryOperator::Eq => Some(sql::ast::UnaryOperator::IsNull),
        ir::BinaryOperator::Ne => Some(sql::ast::UnaryOperator::IsNotNull),
        _ => None,
    };
    if let Some(null_test) = null_test {
        let tested = if right.is_null_literal() {
            Some(left)
        } else if left.is_null_literal() {
            Some(right)
        } else {
            None
        };
        if let Some(tested) = tested {
            return Ok(sql::ast::Expression::UnaryOperation {
                expression: Box::new(translate_value(env, tested)?),
                operator: null_test,
            });
        }
    }

    let operator = match operator {
        ir::BinaryOperator::Eq => "=",
        ir::BinaryOperator::Ne => "<>",
        ir::BinaryOperator::Lt => "<",
        ir::BinaryOperator::Le => "<=",
        ir::BinaryOperator::Gt => ">",
        ir::BinaryOperator::Ge => ">=",
        other => {
            return Err(Error::NotSupported(format!(
                "'{other}' used as a comparison"
            )))
        }
    };
    Ok(sql::ast::Expression::BinaryOperation {
        left: Box::new(translate_value(env, left)?),
        operator: sql::ast::BinaryOperator(operator.to_string()),
        right: Box::new(translate_value(env, right)?),
    })
}

/// `startswith`, `endswith` and `substringof` become an escaped `LIKE`. The pattern side
/// must be a literal so we can escape it.
fn translate_like(
    env: &Env,
    function: ir::Function,
    args: &[ir::Expression],
) -> Result<sql::ast::Expression, Error> {
    let (subject, pattern) = match (function, args) {
        (ir::Function::SubstringOf, [pattern, subject]) => (subject, pattern),
        (_, [subject, pattern]) => (subject, pattern),
        _ => {
            return Err(Error::NotSupported(format!(
                "'{function}' with {} arguments",
                args.len()
            )))
        }
    };

    let pattern = match pattern {
        ir::Expression::Literal(ir::Value::String(text)) => {
            let escaped = values::escape_like(text, env.settings.dialect.like_wildcards());
            ParamValue::String(match function {
                ir::Function::StartsWith => format!("{escaped}%"),
                ir::Function::EndsWith => format!("%{escaped}"),
                _ => format!("%{escaped}%"),
            })
        }
        ir::Expression::Literal(ir::Value::Null) => ParamValue::Null,
        _ => {
            return Err(Error::NotSupported(format!(
                "'{function}' with a pattern that is not a string literal"
            )))
        }
    };

    Ok(sql::ast::Expression::Like {
        expression: Box::new(translate_value(env, subject)?),
        pattern: Box::new(parameter(pattern)),
        escape: values::LIKE_ESCAPE,
    })
}

/// Translate an expression producing a scalar.
pub fn translate_value(
    env: &Env,
    expression: &ir::Expression,
) -> Result<sql::ast::Expression, Error> {
    match expression {
        ir::Expression::Literal(value) => Ok(parameter(values::translate_literal(value))),
        ir::Expression::Property(name) => env.column(name),
        ir::Expression::Binary {
            left,
            operator,
            right,
        } if operator.is_arithmetic() => {
            let operator = match operator {
                ir::BinaryOperator::Add => "+",
                ir::BinaryOperator::Sub => "-",
                ir::BinaryOperator::Mul => "*",
                ir::BinaryOperator::Div => "/",
                _ => "%",
            };
            Ok(sql::ast::Expression::BinaryOperation {
                left: Box::new(translate_value(env, left)?),
                operator: sql::ast::BinaryOperator(operator.to_string()),
                right: Box::new(translate_value(env, right)?),
            })
        }
        ir::Expression::Call { function, args } => {
            let translated = args
                .iter()
                .map(|arg| translate_value(env, arg))
                .collect::<Result<Vec<_>, _>>()?;
            scalar_function(*function, translated)
        }
        ir::Expression::Not(_) | ir::Expression::Binary { .. } => Err(Error::NotSupported(
            "conditions used as values".to_string(),
        )),
    }
}

fn scalar_function(
    function: ir::Function,
    mut args: Vec<sql::ast::Expression>,
) -> Result<sql::ast::Expression, Error> {
    let sql_function = match function {
        ir::Function::Length => Some(sql::ast::Function::Length),
        ir::Function::ToLower => Some(sql::ast::Function::Lower),
        ir::Function::ToUpper => Some(sql::ast::Function::Upper),
        ir::Function::Trim => Some(sql::ast::Function::Trim),
        ir::Function::Round => Some(sql::ast::Function::Round),
        ir::Function::Floor => Some(sql::ast::Function::Floor),
        ir::Function::Ceiling => Some(sql::ast::Function::Ceiling),
        _ => None,
    };
    if let Some(sql_function) = sql_function {
        return Ok(sql::ast::Expression::FunctionCall {
            function: sql_function,
            args,
        });
    }

    let part = match function {
        ir::Function::Year => sql::ast::DatePart::Year,
        ir::Function::Month => sql::ast::DatePart::Month,
        ir::Function::Day => sql::ast::DatePart::Day,
        ir::Function::Hour => sql::ast::DatePart::Hour,
        ir::Function::Minute => sql::ast::DatePart::Minute,
        ir::Function::Second => sql::ast::DatePart::Second,
        _ => {
            return Err(Error::NotSupported(format!(
                "'{function}' used as a value"
            )))
        }
    };
    match args.pop() {
        Some(expression) => Ok(sql::ast::Expression::DatePart {
            part,
            expression: Box::new(expression),
        }),
        None => Err(Error::NotSupported(format!(
            "'{function}' without an argument"
        ))),
    }
}

fn parameter(value: ParamValue) -> sql::ast::Expression {
    sql::ast::Expression::Value(sql::ast::Value::Parameter(value))
}
