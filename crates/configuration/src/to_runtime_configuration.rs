//! Convert a parsed configuration into the runtime configuration.

use query_engine_metadata::metadata::{self, RecordSchema, SchemaProvider};
use query_engine_translation::translation::helpers::{FallbackOrdering, Settings};

use crate::configuration::{Configuration, Table};
use crate::error::MakeRuntimeConfigurationError;
use crate::version1::ParsedConfiguration;

/// Validate a parsed configuration and resolve everything translation needs.
pub fn make_runtime_configuration(
    parsed_config: ParsedConfiguration,
) -> Result<Configuration, MakeRuntimeConfigurationError> {
    let dialect = parsed_config.dialect.profile();
    let shapes = &parsed_config.metadata.record_shapes;

    // every shape must resolve, including those no table uses yet.
    for name in shapes.0.keys() {
        RecordSchema::resolve(shapes, name).map_err(shape_error)?;
    }

    let mut tables = std::collections::BTreeMap::new();
    for (table_name, table) in &parsed_config.tables {
        if table.sql.trim().is_empty() {
            return Err(MakeRuntimeConfigurationError::EmptyBaseSql(
                table_name.clone(),
            ));
        }
        let schema = RecordSchema::resolve(shapes, &table.shape).map_err(|error| match error {
            metadata::Error::ShapeNotFound(shape) => MakeRuntimeConfigurationError::UnknownShape {
                table: table_name.clone(),
                shape,
            },
            error => shape_error(error),
        })?;

        if let Some(property) = table
            .fallback_ordering
            .iter()
            .find(|property| schema.property(property).is_none())
        {
            return Err(MakeRuntimeConfigurationError::UnknownFallbackProperty {
                table: table_name.clone(),
                property: property.clone(),
            });
        }
        let fallback_ordering = if table.fallback_ordering.is_empty() {
            FallbackOrdering::Fail
        } else {
            FallbackOrdering::Properties(table.fallback_ordering.clone())
        };

        let settings =
            Settings::for_schema(dialect.clone(), &schema).with_fallback_ordering(fallback_ordering);
        tables.insert(
            table_name.clone(),
            Table {
                base_sql: table.sql.clone(),
                schema,
                settings,
            },
        );
    }

    tracing::debug!(tables = ?tables.keys().collect::<Vec<_>>(), "made runtime configuration");

    Ok(Configuration {
        dialect,
        metadata: parsed_config.metadata,
        tables,
    })
}

fn shape_error(error: metadata::Error) -> MakeRuntimeConfigurationError {
    match error {
        metadata::Error::BaseShapeNotFound { shape, base } => {
            MakeRuntimeConfigurationError::UnknownBaseShape { shape, base }
        }
        metadata::Error::InheritanceCycle(shape) => {
            MakeRuntimeConfigurationError::InheritanceCycle(shape)
        }
        error => MakeRuntimeConfigurationError::Metadata(error),
    }
}
