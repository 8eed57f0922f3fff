//! The SQL dialect a configuration targets.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use query_engine_sql::sql::dialect::SqlDialectProfile;

/// A dialect named by preset, or spelled out in full.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum Dialect {
    Preset(DialectPreset),
    Custom(SqlDialectProfile),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum DialectPreset {
    SqlServer,
    SqlServerLegacy,
    Postgres,
    Sqlite,
}

impl Default for Dialect {
    fn default() -> Self {
        Dialect::Preset(DialectPreset::SqlServer)
    }
}

impl Dialect {
    pub fn profile(&self) -> SqlDialectProfile {
        match self {
            Dialect::Preset(DialectPreset::SqlServer) => SqlDialectProfile::sql_server(),
            Dialect::Preset(DialectPreset::SqlServerLegacy) => {
                SqlDialectProfile::sql_server_legacy()
            }
            Dialect::Preset(DialectPreset::Postgres) => SqlDialectProfile::postgres(),
            Dialect::Preset(DialectPreset::Sqlite) => SqlDialectProfile::sqlite(),
            Dialect::Custom(profile) => profile.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use query_engine_sql::sql::dialect::{IdentifierQuoting, PagingSyntax};

    use super::*;

    #[test]
    fn presets_are_written_by_name() {
        let dialect: Dialect = serde_json::from_str(r#""sqlServerLegacy""#).unwrap();
        assert_eq!(dialect, Dialect::Preset(DialectPreset::SqlServerLegacy));
        assert_eq!(dialect.profile().paging, PagingSyntax::RowNumber);
    }

    #[test]
    fn custom_profiles_are_accepted() {
        let dialect: Dialect = serde_json::from_value(serde_json::json!({
            "identifierQuoting": "backticks",
            "placeholder": "questionMark",
            "paging": { "style": "limitOffset" },
            "functions": "sqlite"
        }))
        .unwrap();
        let profile = dialect.profile();
        assert_eq!(profile.identifier_quoting, IdentifierQuoting::Backticks);
        assert_eq!(
            profile.paging,
            PagingSyntax::LimitOffset {
                offset_requires_limit: false
            }
        );
    }
}
