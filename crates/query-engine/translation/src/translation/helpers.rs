//! Settings and environment shared by every part of a translation.

use std::collections::BTreeMap;

use query_engine_metadata::metadata::RecordSchema;
use query_engine_sql::sql;
use query_engine_sql::sql::dialect::SqlDialectProfile;

use super::error::Error;

/// What to order by when a query asks for a page but names no ordering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FallbackOrdering {
    /// Refuse to page without an explicit ordering.
    #[default]
    Fail,
    /// Order by these properties, ascending.
    Properties(Vec<String>),
}

/// Everything translation needs to know about the target table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub dialect: SqlDialectProfile,
    pub fallback_ordering: FallbackOrdering,
    /// Property name to column name, for every property a query may reference.
    pub columns: BTreeMap<String, String>,
}

impl Settings {
    pub fn new(dialect: SqlDialectProfile, columns: BTreeMap<String, String>) -> Self {
        Settings {
            dialect,
            fallback_ordering: FallbackOrdering::default(),
            columns,
        }
    }

    /// Settings exposing every property of `schema` under its column name.
    pub fn for_schema(dialect: SqlDialectProfile, schema: &RecordSchema) -> Self {
        let columns = schema
            .properties()
            .iter()
            .map(|(name, info)| (name.clone(), info.column_name(name).to_string()))
            .collect();
        Self::new(dialect, columns)
    }

    #[must_use]
    pub fn with_fallback_ordering(mut self, fallback_ordering: FallbackOrdering) -> Self {
        self.fallback_ordering = fallback_ordering;
        self
    }
}

/// Static information for the translation of one SELECT.
#[derive(Debug)]
pub struct Env<'a> {
    pub settings: &'a Settings,
    /// The alias of the base table or subquery.
    pub table: sql::ast::TableAlias,
}

impl<'a> Env<'a> {
    pub fn new(settings: &'a Settings) -> Self {
        Env {
            settings,
            table: sql::helpers::make_table_alias("q"),
        }
    }

    /// A reference to the column backing `property`.
    pub fn column(&self, property: &str) -> Result<sql::ast::Expression, Error> {
        let column = self
            .settings
            .columns
            .get(property)
            .ok_or_else(|| Error::UnknownProperty(property.to_string()))?;
        Ok(sql::helpers::make_column(&self.table, column.as_str()))
    }
}
