use std::collections::BTreeMap;

use query_engine_metadata::metadata::{Nullable, PropertyInfo, RecordSchema, ScalarType};
use query_engine_sql::sql::dialect::SqlDialectProfile;
use query_engine_sql::sql::string::SQL;
use query_engine_translation::translation;
use query_engine_translation::translation::helpers::Settings;

/// An `Item` with `Id`, `Text` (stored in `text_value`), `Date` and `Flag`.
pub fn schema() -> RecordSchema {
    let mut text = PropertyInfo::new(ScalarType::String, Nullable::Nullable);
    text.column = Some("text_value".to_string());
    RecordSchema::new(
        "Item",
        BTreeMap::from([
            (
                "Id".to_string(),
                PropertyInfo::new(ScalarType::Integer, Nullable::NonNullable),
            ),
            ("Text".to_string(), text),
            (
                "Date".to_string(),
                PropertyInfo::new(ScalarType::DateTime, Nullable::Nullable),
            ),
            (
                "Flag".to_string(),
                PropertyInfo::new(ScalarType::Boolean, Nullable::NonNullable),
            ),
        ]),
    )
}

pub fn settings(dialect: SqlDialectProfile) -> Settings {
    Settings::for_schema(dialect, &schema())
}

/// Parse the query parameters and translate them over `base_sql`.
/// Returns the rendered rows and count queries.
pub fn translate(
    settings: &Settings,
    base_sql: &str,
    params: &[(&str, &str)],
) -> Result<(String, String), translation::error::Error> {
    let query = query_engine_parser::parser::parse(&schema(), params.iter().copied()).unwrap();
    let plan = translation::query::translate(settings, base_sql, &query)?;
    Ok((render(&plan.rows_sql()), render(&plan.count_sql())))
}

/// The SQL text followed by one `name = value` line per parameter.
pub fn render(sql: &SQL) -> String {
    let mut rendered = sql.sql.clone();
    for param in &sql.params {
        rendered.push_str(&format!("\n{} = {}", param.name, param.value));
    }
    rendered
}
