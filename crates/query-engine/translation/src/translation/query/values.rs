//! Handle the translation of literal values.

use query_engine_ir::ir::ast as ir;
use query_engine_sql::sql::string::ParamValue;

/// The escape character used in every `LIKE` pattern we generate.
pub const LIKE_ESCAPE: char = '\\';

/// Convert an IR literal into a parameter value.
pub fn translate_literal(value: &ir::Value) -> ParamValue {
    match value {
        ir::Value::Null => ParamValue::Null,
        ir::Value::Bool(b) => ParamValue::Bool(*b),
        ir::Value::Int(i) => ParamValue::Int(*i),
        ir::Value::Float(x) => ParamValue::Float(*x),
        ir::Value::String(s) => ParamValue::String(s.clone()),
        ir::Value::DateTime(dt) => ParamValue::DateTime(*dt),
    }
}

/// Escape `text` so it matches itself literally inside a `LIKE` pattern.
pub fn escape_like(text: &str, wildcards: &[char]) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if c == LIKE_ESCAPE || wildcards.contains(&c) {
            escaped.push(LIKE_ESCAPE);
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcards_and_the_escape_character_are_escaped() {
        assert_eq!(escape_like(r"50%_off\", &['%', '_']), r"50\%\_off\\");
        assert_eq!(escape_like("[abc]", &['%', '_']), "[abc]");
        assert_eq!(escape_like("[abc]", &['%', '_', '[']), r"\[abc]");
    }
}
