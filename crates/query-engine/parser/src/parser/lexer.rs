//! Tokenize `$filter` and `$orderby` values.

use chrono::{NaiveDate, NaiveDateTime};

use super::error::Failure;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// A property name, function name, or keyword. Keywords are recognized by the parser.
    Identifier(String),
    Integer(i64),
    Decimal(f64),
    String(String),
    DateTime(NaiveDateTime),
    OpenParen,
    CloseParen,
    Comma,
    End,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Character offset of the first character of the token.
    pub position: usize,
}

const DATETIME_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

/// Split `text` into tokens. The last token is always [`TokenKind::End`].
pub fn tokenize(text: &str) -> Result<Vec<Token>, Failure> {
    let chars: Vec<char> = text.chars().collect();
    let mut tokens = vec![];
    let mut index = 0;

    while index < chars.len() {
        let c = chars[index];
        let start = index;

        if c.is_whitespace() {
            index += 1;
            continue;
        }

        let kind = match c {
            '(' => {
                index += 1;
                TokenKind::OpenParen
            }
            ')' => {
                index += 1;
                TokenKind::CloseParen
            }
            ',' => {
                index += 1;
                TokenKind::Comma
            }
            '\'' => {
                let (value, next) = string_literal(&chars, index)?;
                index = next;
                TokenKind::String(value)
            }
            '-' if chars.get(index + 1).is_some_and(char::is_ascii_digit) => {
                let (kind, next) = number(&chars, index)?;
                index = next;
                kind
            }
            c if c.is_ascii_digit() => {
                let (kind, next) = number(&chars, index)?;
                index = next;
                kind
            }
            c if is_identifier_start(c) => {
                while index < chars.len() && is_identifier_char(chars[index]) {
                    index += 1;
                }
                let word: String = chars[start..index].iter().collect();
                if word == "datetime" && chars.get(index) == Some(&'\'') {
                    let (value, next) = string_literal(&chars, index)?;
                    index = next;
                    TokenKind::DateTime(datetime(&value, start)?)
                } else {
                    TokenKind::Identifier(word)
                }
            }
            other => {
                return Err(Failure::syntax(
                    start,
                    format!("unexpected character '{other}'"),
                ))
            }
        };

        tokens.push(Token {
            kind,
            position: start,
        });
    }

    tokens.push(Token {
        kind: TokenKind::End,
        position: chars.len(),
    });
    Ok(tokens)
}

fn is_identifier_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// A single-quoted string starting at `start`, with `''` as an escaped quote.
/// Returns the unescaped value and the index just past the closing quote.
fn string_literal(chars: &[char], start: usize) -> Result<(String, usize), Failure> {
    let mut value = String::new();
    let mut index = start + 1;
    loop {
        match chars.get(index) {
            None => return Err(Failure::syntax(start, "unterminated string literal")),
            Some('\'') if chars.get(index + 1) == Some(&'\'') => {
                value.push('\'');
                index += 2;
            }
            Some('\'') => return Ok((value, index + 1)),
            Some(c) => {
                value.push(*c);
                index += 1;
            }
        }
    }
}

/// An integer or decimal literal, optionally negative, optionally suffixed with `L`
/// (integer) or `d`, `f`, `m` (decimal).
fn number(chars: &[char], start: usize) -> Result<(TokenKind, usize), Failure> {
    let mut index = start;
    if chars[index] == '-' {
        index += 1;
    }
    while index < chars.len() && chars[index].is_ascii_digit() {
        index += 1;
    }

    let mut decimal = false;
    if chars.get(index) == Some(&'.') && chars.get(index + 1).is_some_and(char::is_ascii_digit) {
        decimal = true;
        index += 1;
        while index < chars.len() && chars[index].is_ascii_digit() {
            index += 1;
        }
    }
    let digits: String = chars[start..index].iter().collect();

    match chars.get(index) {
        Some('L' | 'l') if !decimal => {
            index += 1;
        }
        Some('d' | 'D' | 'f' | 'F' | 'm' | 'M') => {
            decimal = true;
            index += 1;
        }
        _ => {}
    }
    if chars.get(index).is_some_and(|c| is_identifier_char(*c)) {
        return Err(Failure::syntax(start, format!("malformed number '{digits}'")));
    }

    let kind = if decimal {
        digits
            .parse()
            .map(TokenKind::Decimal)
            .map_err(|_| Failure::syntax(start, format!("malformed number '{digits}'")))?
    } else {
        digits
            .parse()
            .map(TokenKind::Integer)
            .map_err(|_| Failure::syntax(start, format!("integer '{digits}' is out of range")))?
    };
    Ok((kind, index))
}

fn datetime(text: &str, position: usize) -> Result<NaiveDateTime, Failure> {
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(|| Failure::syntax(position, format!("malformed datetime literal '{text}'")))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::parser::error::ParseErrorKind;

    fn kinds(text: &str) -> Vec<TokenKind> {
        tokenize(text)
            .unwrap()
            .into_iter()
            .map(|token| token.kind)
            .collect()
    }

    #[test]
    fn tokenizes_a_comparison() {
        assert_eq!(
            kinds("Id eq -12L"),
            vec![
                TokenKind::Identifier("Id".to_string()),
                TokenKind::Identifier("eq".to_string()),
                TokenKind::Integer(-12),
                TokenKind::End,
            ]
        );
    }

    #[test]
    fn tokenizes_literals() {
        assert_eq!(
            kinds("'O''Neil' 2.5m 3d datetime'2013-12-11'"),
            vec![
                TokenKind::String("O'Neil".to_string()),
                TokenKind::Decimal(2.5),
                TokenKind::Decimal(3.0),
                TokenKind::DateTime(
                    NaiveDate::from_ymd_opt(2013, 12, 11)
                        .unwrap()
                        .and_hms_opt(0, 0, 0)
                        .unwrap()
                ),
                TokenKind::End,
            ]
        );
        assert_eq!(
            kinds("datetime'2010-09-08T10:11:12.5'"),
            vec![
                TokenKind::DateTime(
                    NaiveDate::from_ymd_opt(2010, 9, 8)
                        .unwrap()
                        .and_hms_milli_opt(10, 11, 12, 500)
                        .unwrap()
                ),
                TokenKind::End,
            ]
        );
    }

    #[test]
    fn positions_are_character_offsets() {
        let tokens = tokenize("'é' eq Text").unwrap();
        let positions: Vec<usize> = tokens.iter().map(|token| token.position).collect();
        assert_eq!(positions, vec![0, 4, 7, 11]);
    }

    #[test]
    fn rejects_malformed_input() {
        let failure = tokenize("Text eq 'abc").unwrap_err();
        assert_eq!(failure.kind, ParseErrorKind::SyntaxError);
        assert_eq!(failure.position, 8);

        assert_eq!(tokenize("Id eq 12abc").unwrap_err().position, 6);
        assert_eq!(tokenize("Id eq 1 ; drop").unwrap_err().position, 8);
        assert_eq!(tokenize("Date eq datetime'yesterday'").unwrap_err().position, 8);
    }
}
