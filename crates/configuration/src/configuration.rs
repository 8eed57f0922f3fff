//! Configuration for query translation.

use std::collections::BTreeMap;

use schemars::schema::RootSchema;

use query_engine_metadata::metadata::{self, RecordSchema};
use query_engine_sql::sql::dialect::SqlDialectProfile;
use query_engine_translation::translation::helpers::Settings;

use crate::version1::ParsedConfiguration;

/// The 'Configuration' type collects all the information necessary to translate queries at
/// runtime.
///
/// Values of this type are produced from a 'ParsedConfiguration' using
/// 'make_runtime_configuration', which resolves every record shape and table up front.
#[derive(Debug)]
pub struct Configuration {
    pub dialect: SqlDialectProfile,
    pub metadata: metadata::Metadata,
    pub tables: BTreeMap<String, Table>,
}

/// A table ready for translation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub base_sql: String,
    /// The table's record shape with inheritance flattened.
    pub schema: RecordSchema,
    pub settings: Settings,
}

impl Configuration {
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }
}

/// The JSON schema of the configuration file.
pub fn generate_configuration_schema() -> RootSchema {
    schemars::schema_for!(ParsedConfiguration)
}
