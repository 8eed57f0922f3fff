//! Extract the recognized query parameters from a raw query string.

use std::collections::BTreeMap;

use super::error::{Failure, ParseError};
use super::QueryParameter;

/// Raw text of each recognized parameter that was present and non-empty.
pub type RawParameters = BTreeMap<QueryParameter, String>;

/// Collect recognized parameters from `(key, value)` pairs.
///
/// Unrecognized keys are ignored. Blank values count as absent. A recognized key given
/// twice is a syntax error.
pub fn collect<I, K, V>(pairs: I) -> Result<RawParameters, ParseError>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut parameters = RawParameters::new();
    for (key, value) in pairs {
        let Some(parameter) = QueryParameter::from_key(key.as_ref()) else {
            continue;
        };
        let value = value.as_ref();
        if value.trim().is_empty() {
            continue;
        }
        if parameters.insert(parameter, value.to_string()).is_some() {
            return Err(Failure::syntax(0, format!("{parameter} was given more than once"))
                .within(parameter));
        }
    }
    Ok(parameters)
}

/// Decode an `application/x-www-form-urlencoded` query string, with or without its
/// leading `?`.
pub fn from_query_string(query_string: &str) -> Result<RawParameters, ParseError> {
    let query_string = query_string.strip_prefix('?').unwrap_or(query_string);
    collect(url::form_urlencoded::parse(query_string.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::error::ParseErrorKind;

    #[test]
    fn decodes_recognized_parameters() {
        let parameters =
            from_query_string("?$filter=Id%20eq%201&$orderby=Id+desc&$top=2&format=json").unwrap();
        assert_eq!(
            parameters,
            BTreeMap::from([
                (QueryParameter::Filter, "Id eq 1".to_string()),
                (QueryParameter::OrderBy, "Id desc".to_string()),
                (QueryParameter::Top, "2".to_string()),
            ])
        );
    }

    #[test]
    fn empty_values_are_absent() {
        let parameters = from_query_string("$filter=&$skip=%20").unwrap();
        assert!(parameters.is_empty());
    }

    #[test]
    fn repeated_parameters_are_rejected() {
        let error = from_query_string("$top=1&$top=2").unwrap_err();
        assert_eq!(error.kind, ParseErrorKind::SyntaxError);
        assert_eq!(error.parameter, QueryParameter::Top);
    }
}
