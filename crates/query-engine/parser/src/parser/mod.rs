//! Turn raw query parameters into a [`QueryDescriptor`].
//!
//! Properties are resolved against the record shape while parsing, so a descriptor that
//! parses successfully only names properties the shape exposes.

pub mod error;
mod filter;
mod lexer;
mod orderby;
pub mod params;

use std::fmt;

use enum_iterator::Sequence;
use query_engine_ir::ir::ast::{InlineCount, QueryDescriptor};
use query_engine_metadata::metadata::SchemaProvider;

pub use error::{ParseError, ParseErrorKind};
use error::Failure;

/// The query parameters we recognize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Sequence)]
pub enum QueryParameter {
    Filter,
    OrderBy,
    Skip,
    Top,
    InlineCount,
}

impl QueryParameter {
    /// The query string key.
    pub fn key(self) -> &'static str {
        match self {
            QueryParameter::Filter => "$filter",
            QueryParameter::OrderBy => "$orderby",
            QueryParameter::Skip => "$skip",
            QueryParameter::Top => "$top",
            QueryParameter::InlineCount => "$inlinecount",
        }
    }

    pub fn from_key(key: &str) -> Option<QueryParameter> {
        enum_iterator::all::<QueryParameter>().find(|parameter| parameter.key() == key)
    }
}

impl AsRef<str> for QueryParameter {
    fn as_ref(&self) -> &str {
        self.key()
    }
}

impl fmt::Display for QueryParameter {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Parse raw query parameters into a query descriptor.
///
/// `pairs` yields `(key, value)` pairs. Keys other than `$filter`, `$orderby`, `$skip`,
/// `$top` and `$inlinecount` are ignored, and an absent or blank parameter leaves the
/// corresponding part of the descriptor empty.
pub fn parse<S, I, K, V>(schema: &S, pairs: I) -> Result<QueryDescriptor, ParseError>
where
    S: SchemaProvider + ?Sized,
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let raw = params::collect(pairs)?;
    let text = |parameter: QueryParameter| raw.get(&parameter).map(String::as_str);

    let filter = text(QueryParameter::Filter)
        .map(|text| filter::parse_filter(text, schema))
        .transpose()
        .map_err(|failure| failure.within(QueryParameter::Filter))?;

    let order_by = text(QueryParameter::OrderBy)
        .map(|text| orderby::parse_orderby(text, schema))
        .transpose()
        .map_err(|failure| failure.within(QueryParameter::OrderBy))?
        .unwrap_or_default();

    let skip = text(QueryParameter::Skip)
        .map(parse_paging)
        .transpose()
        .map_err(|failure| failure.within(QueryParameter::Skip))?;

    let top = text(QueryParameter::Top)
        .map(parse_paging)
        .transpose()
        .map_err(|failure| failure.within(QueryParameter::Top))?;

    let inline_count = text(QueryParameter::InlineCount)
        .map(parse_inline_count)
        .transpose()
        .map_err(|failure| failure.within(QueryParameter::InlineCount))?
        .unwrap_or_default();

    let query = QueryDescriptor::new(filter, order_by, skip, top, inline_count);
    tracing::debug!(?query, schema = schema.shape_name(), "parsed query parameters");
    Ok(query)
}

/// Decode a raw query string and parse it.
pub fn parse_query_string<S: SchemaProvider + ?Sized>(
    schema: &S,
    query_string: &str,
) -> Result<QueryDescriptor, ParseError> {
    parse(schema, params::from_query_string(query_string)?)
}

fn parse_paging(text: &str) -> Result<u64, Failure> {
    let trimmed = text.trim();
    let offset = text.len() - text.trim_start().len();
    if !trimmed.chars().all(|c| c.is_ascii_digit()) {
        return Err(Failure::new(
            ParseErrorKind::InvalidPaging,
            text[..offset].chars().count(),
            format!("'{trimmed}' is not a non-negative integer"),
        ));
    }
    trimmed.parse().map_err(|_| {
        Failure::new(
            ParseErrorKind::InvalidPaging,
            text[..offset].chars().count(),
            format!("'{trimmed}' is out of range"),
        )
    })
}

fn parse_inline_count(text: &str) -> Result<InlineCount, Failure> {
    match text.trim() {
        "none" => Ok(InlineCount::None),
        "allpages" => Ok(InlineCount::AllPages),
        other => Err(Failure::syntax(
            0,
            format!("expected 'none' or 'allpages', found '{other}'"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paging_accepts_only_non_negative_integers() {
        assert_eq!(parse_paging("10"), Ok(10));
        assert_eq!(parse_paging(" 3 "), Ok(3));
        for text in ["-1", "1.5", "ten", "+2", "99999999999999999999999"] {
            assert_eq!(
                parse_paging(text).unwrap_err().kind,
                ParseErrorKind::InvalidPaging,
                "{text}"
            );
        }
    }

    #[test]
    fn query_parameters_round_trip_through_their_keys() {
        for parameter in enum_iterator::all::<QueryParameter>() {
            assert_eq!(QueryParameter::from_key(parameter.key()), Some(parameter));
        }
        assert_eq!(QueryParameter::from_key("$FILTER"), None);
    }
}
