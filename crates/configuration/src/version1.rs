//! Version 1 of the configuration format.

use std::collections::BTreeMap;
use std::path::Path;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio::fs;

use query_engine_metadata::metadata;

use crate::error::{ParseConfigurationError, WriteParsedConfigurationError};
use crate::values::Dialect;

pub const CONFIGURATION_FILENAME: &str = "configuration.json";
pub const CONFIGURATION_JSONSCHEMA_FILENAME: &str = "schema.json";

/// The configuration as written on disk: which dialect to generate, the record shapes
/// queries are parsed against, and the tables they run over.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ParsedConfiguration {
    /// Which version of the configuration format are we using
    pub version: Version,
    #[serde(default)]
    pub dialect: Dialect,
    #[serde(default)]
    pub metadata: metadata::Metadata,
    #[serde(default)]
    pub tables: BTreeMap<String, TableDefinition>,
}

#[derive(Clone, PartialEq, Eq, Debug, Deserialize, Serialize, JsonSchema)]
pub enum Version {
    #[serde(rename = "1")]
    This,
}

impl Version {
    pub fn tag(&self) -> &'static str {
        match self {
            Version::This => "1",
        }
    }
}

/// A queryable table: the SQL producing its rows and the shape of those rows.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TableDefinition {
    /// A table reference, or a `SELECT`/`WITH` query used as a derived table.
    pub sql: String,
    pub shape: String,
    /// Properties to order by, ascending, when a query asks for a page without an ordering.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fallback_ordering: Vec<String>,
}

impl ParsedConfiguration {
    pub fn initial() -> Self {
        ParsedConfiguration::empty()
    }

    pub fn empty() -> Self {
        ParsedConfiguration {
            version: Version::This,
            dialect: Dialect::default(),
            metadata: metadata::Metadata::empty(),
            tables: BTreeMap::new(),
        }
    }
}

/// Parse the configuration format from a directory.
pub async fn parse_configuration(
    configuration_dir: impl AsRef<Path>,
) -> Result<ParsedConfiguration, ParseConfigurationError> {
    let configuration_file = configuration_dir.as_ref().join(CONFIGURATION_FILENAME);

    let configuration_file_contents =
        fs::read_to_string(&configuration_file)
            .await
            .map_err(|err| {
                ParseConfigurationError::IoErrorButStringified(format!(
                    "{}: {}",
                    &configuration_file.display(),
                    err
                ))
            })?;

    let parse_error = |error: serde_json::Error| ParseConfigurationError::ParseError {
        file_path: configuration_file.clone(),
        line: error.line(),
        column: error.column(),
        message: error.to_string(),
    };

    // check the version first so an old or future file gets a useful error.
    let value: serde_json::Value =
        serde_json::from_str(&configuration_file_contents).map_err(parse_error)?;
    match value.get("version") {
        None => {
            return Err(ParseConfigurationError::DidNotFindExpectedVersionTag {
                file_path: configuration_file.clone(),
                message: "missing field `version`".to_string(),
            })
        }
        Some(serde_json::Value::String(version)) if version == Version::This.tag() => {}
        Some(version) => {
            return Err(ParseConfigurationError::UnsupportedVersion {
                file_path: configuration_file.clone(),
                version: version.to_string(),
            })
        }
    }

    let parsed_config: ParsedConfiguration =
        serde_json::from_str(&configuration_file_contents).map_err(parse_error)?;

    tracing::debug!(
        file_path = %configuration_file.display(),
        tables = parsed_config.tables.len(),
        "parsed configuration"
    );
    Ok(parsed_config)
}

/// Write the parsed configuration into a directory on disk, along with its JSON schema.
pub async fn write_parsed_configuration(
    parsed_config: ParsedConfiguration,
    out_dir: impl AsRef<Path>,
) -> Result<(), WriteParsedConfigurationError> {
    let configuration_file = out_dir.as_ref().to_owned().join(CONFIGURATION_FILENAME);
    fs::create_dir_all(out_dir.as_ref()).await?;

    // create the configuration file
    fs::write(
        configuration_file,
        serde_json::to_string_pretty(&parsed_config)
            .map_err(|e| WriteParsedConfigurationError::IoError(e.into()))?
            + "\n",
    )
    .await?;

    // create the jsonschema file
    let configuration_jsonschema_file_path = out_dir
        .as_ref()
        .to_owned()
        .join(CONFIGURATION_JSONSCHEMA_FILENAME);

    let output = crate::configuration::generate_configuration_schema();
    fs::write(
        &configuration_jsonschema_file_path,
        serde_json::to_string_pretty(&output)
            .map_err(|e| WriteParsedConfigurationError::IoError(e.into()))?
            + "\n",
    )
    .await?;

    Ok(())
}
