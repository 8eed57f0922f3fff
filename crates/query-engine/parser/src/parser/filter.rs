//! Recursive descent parser for `$filter` expressions.
//!
//! Precedence, lowest first: `or`, `and`, `not`, comparison, additive, multiplicative, primary.
//! Every node is type checked as soon as it is built, so type errors point at the operator
//! or argument that caused them.

use query_engine_ir::ir::ast::{BinaryOperator, Expression, Function, Value};
use query_engine_ir::ir::typing::{self, ExprType, TypeError};
use query_engine_metadata::metadata::SchemaProvider;

use super::error::{Failure, ParseErrorKind};
use super::lexer::{self, Token, TokenKind};

/// Words that can never name a property.
const RESERVED: [&str; 16] = [
    "and", "or", "not", "eq", "ne", "lt", "le", "gt", "ge", "add", "sub", "mul", "div", "mod",
    "asc", "desc",
];

/// How many parentheses, `not`s and function calls may enclose one another.
pub const MAX_NESTING: usize = 100;

/// The tallest expression tree we accept, counting long `and`/`or` chains.
pub const MAX_HEIGHT: usize = 1_000;

/// A parsed node, its static type, where it started, and the height of its tree.
struct Typed {
    expression: Expression,
    r#type: ExprType,
    position: usize,
    height: usize,
}

/// Parse a `$filter` value into a boolean expression, resolving properties against `schema`.
pub fn parse_filter<S: SchemaProvider + ?Sized>(
    text: &str,
    schema: &S,
) -> Result<Expression, Failure> {
    let tokens = lexer::tokenize(text)?;
    let mut parser = Parser {
        tokens,
        index: 0,
        nesting: 0,
        schema,
    };
    let typed = parser.or_expression()?;
    parser.expect_end()?;

    if typed.r#type == ExprType::BOOLEAN {
        Ok(typed.expression)
    } else {
        Err(type_mismatch(
            typed.position,
            &TypeError::NotAPredicate(typed.r#type),
        ))
    }
}

fn type_mismatch(position: usize, error: &TypeError) -> Failure {
    Failure::new(ParseErrorKind::TypeMismatch, position, error.to_string())
}

struct Parser<'a, S: ?Sized> {
    tokens: Vec<Token>,
    index: usize,
    nesting: usize,
    schema: &'a S,
}

impl<'a, S: SchemaProvider + ?Sized> Parser<'a, S> {
    fn peek(&self) -> &Token {
        // the token list always ends with `End`, and we never advance past it.
        &self.tokens[self.index.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if token.kind != TokenKind::End {
            self.index += 1;
        }
        token
    }

    fn peek_keyword(&self) -> Option<&str> {
        match &self.peek().kind {
            TokenKind::Identifier(word) => Some(word.as_str()),
            _ => None,
        }
    }

    /// Consume the next token if it is one of the given binary operator keywords.
    fn binary_operator(&mut self, operators: &[BinaryOperator]) -> Option<(BinaryOperator, usize)> {
        let keyword = self.peek_keyword()?;
        let operator = operators
            .iter()
            .copied()
            .find(|operator| operator.keyword() == keyword)?;
        let position = self.advance().position;
        Some((operator, position))
    }

    fn expect_end(&mut self) -> Result<(), Failure> {
        let token = self.peek();
        match token.kind {
            TokenKind::End => Ok(()),
            _ => Err(Failure::syntax(
                token.position,
                format!("expected end of expression, found {}", describe(token)),
            )),
        }
    }

    fn expect(&mut self, expected: &TokenKind, description: &str) -> Result<Token, Failure> {
        let token = self.advance();
        if token.kind == *expected {
            Ok(token)
        } else {
            Err(Failure::syntax(
                token.position,
                format!("expected {description}, found {}", describe(&token)),
            ))
        }
    }

    fn enter(&mut self, position: usize) -> Result<(), Failure> {
        self.nesting += 1;
        if self.nesting > MAX_NESTING {
            return Err(Failure::syntax(position, "expression nests too deeply"));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.nesting -= 1;
    }

    /// Parse a left-associative chain of `next` separated by any of `operators`.
    fn binary_chain(
        &mut self,
        operators: &[BinaryOperator],
        next: fn(&mut Self) -> Result<Typed, Failure>,
    ) -> Result<Typed, Failure> {
        let mut left = next(self)?;
        while let Some((operator, position)) = self.binary_operator(operators) {
            let right = next(self)?;
            left = self.combine(left, operator, position, right)?;
        }
        Ok(left)
    }

    fn combine(
        &self,
        left: Typed,
        operator: BinaryOperator,
        position: usize,
        right: Typed,
    ) -> Result<Typed, Failure> {
        let r#type = typing::binary_result_type(operator, left.r#type, right.r#type)
            .map_err(|error| type_mismatch(position, &error))?;
        let height = taller(position, left.height.max(right.height))?;
        Ok(Typed {
            expression: Expression::Binary {
                left: Box::new(left.expression),
                operator,
                right: Box::new(right.expression),
            },
            r#type,
            position: left.position,
            height,
        })
    }

    fn or_expression(&mut self) -> Result<Typed, Failure> {
        self.binary_chain(&[BinaryOperator::Or], Self::and_expression)
    }

    fn and_expression(&mut self) -> Result<Typed, Failure> {
        self.binary_chain(&[BinaryOperator::And], Self::not_expression)
    }

    fn not_expression(&mut self) -> Result<Typed, Failure> {
        if self.peek_keyword() == Some("not") {
            let position = self.advance().position;
            self.enter(position)?;
            let operand = self.not_expression()?;
            self.leave();
            let r#type = typing::not_result_type(operand.r#type)
                .map_err(|error| type_mismatch(position, &error))?;
            return Ok(Typed {
                expression: Expression::Not(Box::new(operand.expression)),
                r#type,
                position,
                height: taller(position, operand.height)?,
            });
        }
        self.comparison()
    }

    /// Comparisons do not chain: `a eq b eq c` is a syntax error.
    fn comparison(&mut self) -> Result<Typed, Failure> {
        let left = self.additive()?;
        let comparisons = [
            BinaryOperator::Eq,
            BinaryOperator::Ne,
            BinaryOperator::Lt,
            BinaryOperator::Le,
            BinaryOperator::Gt,
            BinaryOperator::Ge,
        ];
        match self.binary_operator(&comparisons) {
            None => Ok(left),
            Some((operator, position)) => {
                let right = self.additive()?;
                self.combine(left, operator, position, right)
            }
        }
    }

    fn additive(&mut self) -> Result<Typed, Failure> {
        self.binary_chain(
            &[BinaryOperator::Add, BinaryOperator::Sub],
            Self::multiplicative,
        )
    }

    fn multiplicative(&mut self) -> Result<Typed, Failure> {
        self.binary_chain(
            &[BinaryOperator::Mul, BinaryOperator::Div, BinaryOperator::Mod],
            Self::primary,
        )
    }

    fn primary(&mut self) -> Result<Typed, Failure> {
        let token = self.advance();
        let position = token.position;
        let literal = |value: Value| Typed {
            r#type: typing::of_scalar(value.scalar_type()),
            expression: Expression::Literal(value),
            position,
            height: 1,
        };

        match token.kind {
            TokenKind::OpenParen => {
                self.enter(position)?;
                let inner = self.or_expression()?;
                self.expect(&TokenKind::CloseParen, "')'")?;
                self.leave();
                Ok(Typed { position, ..inner })
            }
            TokenKind::Integer(i) => Ok(literal(Value::Int(i))),
            TokenKind::Decimal(x) => Ok(literal(Value::Float(x))),
            TokenKind::String(s) => Ok(literal(Value::String(s))),
            TokenKind::DateTime(dt) => Ok(literal(Value::DateTime(dt))),
            TokenKind::Identifier(word) => match word.as_str() {
                "true" => Ok(literal(Value::Bool(true))),
                "false" => Ok(literal(Value::Bool(false))),
                "null" => Ok(literal(Value::Null)),
                _ if self.peek().kind == TokenKind::OpenParen => self.call(&word, position),
                _ if RESERVED.contains(&word.as_str()) => Err(Failure::syntax(
                    position,
                    format!("expected an expression, found '{word}'"),
                )),
                _ => self.property(word, position),
            },
            TokenKind::End => Err(Failure::syntax(position, "unexpected end of expression")),
            TokenKind::CloseParen | TokenKind::Comma => Err(Failure::syntax(
                position,
                format!("expected an expression, found {}", describe(&token)),
            )),
        }
    }

    fn property(&self, name: String, position: usize) -> Result<Typed, Failure> {
        match self.schema.lookup_property(&name) {
            Ok(info) => Ok(Typed {
                r#type: ExprType::Scalar(info.r#type),
                expression: Expression::Property(name),
                position,
                height: 1,
            }),
            Err(error) => Err(Failure::new(
                ParseErrorKind::UnknownProperty,
                position,
                error.to_string(),
            )),
        }
    }

    fn call(&mut self, name: &str, position: usize) -> Result<Typed, Failure> {
        let function = Function::from_name(name)
            .ok_or_else(|| Failure::syntax(position, format!("unknown function '{name}'")))?;
        self.expect(&TokenKind::OpenParen, "'('")?;
        self.enter(position)?;

        let mut args = vec![];
        if self.peek().kind == TokenKind::CloseParen {
            self.advance();
        } else {
            loop {
                args.push(self.or_expression()?);
                let separator = self.advance();
                match separator.kind {
                    TokenKind::Comma => {}
                    TokenKind::CloseParen => break,
                    _ => {
                        return Err(Failure::syntax(
                            separator.position,
                            format!("expected ',' or ')', found {}", describe(&separator)),
                        ))
                    }
                }
            }
        }
        self.leave();

        if args.len() != function.arity() {
            return Err(Failure::syntax(
                position,
                format!(
                    "'{function}' takes {} argument(s), found {}",
                    function.arity(),
                    args.len()
                ),
            ));
        }

        let arg_types: Vec<ExprType> = args.iter().map(|arg| arg.r#type).collect();
        let r#type = typing::function_result_type(function, &arg_types).map_err(|error| {
            let at = match &error {
                TypeError::Argument { position: n, .. } => args[n - 1].position,
                _ => position,
            };
            type_mismatch(at, &error)
        })?;
        let height = taller(
            position,
            args.iter().map(|arg| arg.height).max().unwrap_or(0),
        )?;

        Ok(Typed {
            expression: Expression::Call {
                function,
                args: args.into_iter().map(|arg| arg.expression).collect(),
            },
            r#type,
            position,
            height,
        })
    }
}

/// The height of a node over children of height `height`.
fn taller(position: usize, height: usize) -> Result<usize, Failure> {
    if height >= MAX_HEIGHT {
        return Err(Failure::syntax(position, "expression is too long"));
    }
    Ok(height + 1)
}

fn describe(token: &Token) -> String {
    match &token.kind {
        TokenKind::Identifier(word) => format!("'{word}'"),
        TokenKind::Integer(i) => format!("'{i}'"),
        TokenKind::Decimal(x) => format!("'{x}'"),
        TokenKind::String(s) => format!("string '{s}'"),
        TokenKind::DateTime(dt) => format!("datetime '{dt}'"),
        TokenKind::OpenParen => "'('".to_string(),
        TokenKind::CloseParen => "')'".to_string(),
        TokenKind::Comma => "','".to_string(),
        TokenKind::End => "end of expression".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use query_engine_ir::ir::helpers::*;
    use query_engine_metadata::metadata::{Nullable, PropertyInfo, RecordSchema, ScalarType};
    use similar_asserts::assert_eq;

    use super::*;

    fn schema() -> RecordSchema {
        RecordSchema::new(
            "A",
            BTreeMap::from([
                (
                    "Id".to_string(),
                    PropertyInfo::new(ScalarType::Integer, Nullable::NonNullable),
                ),
                (
                    "Text".to_string(),
                    PropertyInfo::new(ScalarType::String, Nullable::Nullable),
                ),
                (
                    "Date".to_string(),
                    PropertyInfo::new(ScalarType::DateTime, Nullable::Nullable),
                ),
                (
                    "Active".to_string(),
                    PropertyInfo::new(ScalarType::Boolean, Nullable::NonNullable),
                ),
            ]),
        )
    }

    fn parse(text: &str) -> Result<Expression, Failure> {
        parse_filter(text, &schema())
    }

    #[test]
    fn and_binds_tighter_than_or() {
        assert_eq!(
            parse("Id eq 1 or Id eq 2 and Id eq 3").unwrap(),
            or(
                eq(property("Id"), literal(1)),
                and(eq(property("Id"), literal(2)), eq(property("Id"), literal(3)))
            )
        );
    }

    #[test]
    fn or_is_left_associative() {
        assert_eq!(
            parse("Id eq 1 or Id eq 2 or Id eq 3").unwrap().to_string(),
            "(((Id eq 1) or (Id eq 2)) or (Id eq 3))"
        );
    }

    #[test]
    fn not_binds_looser_than_comparison() {
        assert_eq!(
            parse("not Id eq 1 and Active").unwrap(),
            and(not(eq(property("Id"), literal(1))), property("Active"))
        );
    }

    #[test]
    fn arithmetic_binds_tighter_than_comparison() {
        assert_eq!(
            parse("Id add 2 mul 3 gt 10").unwrap().to_string(),
            "((Id add (2 mul 3)) gt 10)"
        );
        assert_eq!(
            parse("(Id sub 1) mod 2 eq 0").unwrap().to_string(),
            "(((Id sub 1) mod 2) eq 0)"
        );
    }

    #[test]
    fn functions_and_null_tests() {
        assert_eq!(
            parse("Date ne null and year(Date) eq 2013").unwrap(),
            and(
                ne(property("Date"), null()),
                eq(call(Function::Year, vec![property("Date")]), literal(2013))
            )
        );
        assert_eq!(
            parse("startswith(Text,'AB') and substringof('C',Text)").unwrap(),
            and(
                call(Function::StartsWith, vec![property("Text"), literal("AB")]),
                call(Function::SubstringOf, vec![literal("C"), property("Text")])
            )
        );
    }

    #[test]
    fn unknown_property_points_at_the_name() {
        let failure = parse("Id eq 1 and BId eq 2").unwrap_err();
        assert_eq!(failure.kind, ParseErrorKind::UnknownProperty);
        assert_eq!(failure.position, 12);
    }

    #[test]
    fn property_names_are_case_sensitive() {
        assert_eq!(
            parse("id eq 1").unwrap_err().kind,
            ParseErrorKind::UnknownProperty
        );
    }

    #[test]
    fn unknown_function_and_wrong_arity_are_syntax_errors() {
        let failure = parse("frobnicate(Text) eq 1").unwrap_err();
        assert_eq!(failure.kind, ParseErrorKind::SyntaxError);
        assert_eq!(failure.position, 0);

        let failure = parse("startswith(Text) eq true").unwrap_err();
        assert_eq!(failure.kind, ParseErrorKind::SyntaxError);
        assert_eq!(failure.position, 0);
    }

    #[test]
    fn type_mismatches_point_at_the_offending_token() {
        let failure = parse("length(Id) eq 0").unwrap_err();
        assert_eq!(failure.kind, ParseErrorKind::TypeMismatch);
        assert_eq!(failure.position, 7);

        let failure = parse("Text gt 1").unwrap_err();
        assert_eq!(failure.kind, ParseErrorKind::TypeMismatch);
        assert_eq!(failure.position, 5);

        let failure = parse("Id add 1").unwrap_err();
        assert_eq!(failure.kind, ParseErrorKind::TypeMismatch);
        assert_eq!(failure.position, 0);
    }

    #[test]
    fn deep_nesting_is_a_syntax_error() {
        let nested = |depth: usize| {
            format!("{}Id eq 1{}", "(".repeat(depth), ")".repeat(depth))
        };
        assert!(parse(&nested(MAX_NESTING)).is_ok());

        let failure = parse(&nested(5_000)).unwrap_err();
        assert_eq!(failure.kind, ParseErrorKind::SyntaxError);
        assert_eq!(failure.position, MAX_NESTING);

        let failure = parse(&format!("{}Id eq 1", "not ".repeat(20_000))).unwrap_err();
        assert_eq!(failure.kind, ParseErrorKind::SyntaxError);
        assert_eq!(failure.position, 4 * MAX_NESTING);

        let calls = format!("{}Text{} eq ''", "trim(".repeat(500), ")".repeat(500));
        assert_eq!(parse(&calls).unwrap_err().kind, ParseErrorKind::SyntaxError);
    }

    #[test]
    fn long_chains_are_bounded() {
        let chain = |terms: usize| vec!["Id eq 1"; terms].join(" or ");
        assert!(parse(&chain(100)).is_ok());
        assert_eq!(
            parse(&chain(5_000)).unwrap_err().kind,
            ParseErrorKind::SyntaxError
        );
    }

    #[test]
    fn malformed_expressions_are_syntax_errors() {
        for (text, position) in [
            ("Id eq", 5),
            ("(Id eq 1", 8),
            ("Id eq 1 Id", 8),
            ("Id eq 1 eq 2", 8),
            ("and eq 1", 0),
            ("", 0),
        ] {
            let failure = parse(text).unwrap_err();
            assert_eq!(failure.kind, ParseErrorKind::SyntaxError, "{text}");
            assert_eq!(failure.position, position, "{text}");
        }
    }
}
