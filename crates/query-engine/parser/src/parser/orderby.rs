//! Parse `$orderby` values: a comma separated list of `<property> [asc|desc]`.

use query_engine_ir::ir::ast::{Direction, OrderByElement};
use query_engine_metadata::metadata::SchemaProvider;

use super::error::{Failure, ParseErrorKind};
use super::lexer::{self, TokenKind};

pub fn parse_orderby<S: SchemaProvider + ?Sized>(
    text: &str,
    schema: &S,
) -> Result<Vec<OrderByElement>, Failure> {
    let mut tokens = lexer::tokenize(text)?.into_iter().peekable();
    let mut elements = vec![];

    loop {
        let Some(token) = tokens.next() else { break };
        let property = match token.kind {
            TokenKind::Identifier(name) => {
                schema.lookup_property(&name).map_err(|error| {
                    Failure::new(
                        ParseErrorKind::UnknownProperty,
                        token.position,
                        error.to_string(),
                    )
                })?;
                name
            }
            _ => return Err(Failure::syntax(token.position, "expected a property name")),
        };

        let direction = match tokens.peek().map(|token| &token.kind) {
            Some(TokenKind::Identifier(word)) if word == "asc" => Some(Direction::Asc),
            Some(TokenKind::Identifier(word)) if word == "desc" => Some(Direction::Desc),
            _ => None,
        };
        if direction.is_some() {
            tokens.next();
        }
        elements.push(OrderByElement {
            property,
            direction: direction.unwrap_or_default(),
        });

        match tokens.next() {
            Some(token) if token.kind == TokenKind::Comma => {}
            Some(token) if token.kind == TokenKind::End => break,
            Some(token) => {
                return Err(Failure::syntax(
                    token.position,
                    "expected ',', 'asc', 'desc' or end of ordering",
                ))
            }
            None => break,
        }
    }

    Ok(elements)
}
