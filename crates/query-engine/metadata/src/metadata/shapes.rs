//! Record shapes and the scalar types of their properties.

use std::collections::BTreeMap;
use std::fmt;

use enum_iterator::Sequence;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// The scalar types a record property can have.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Sequence, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum ScalarType {
    Boolean,
    Integer,
    Double,
    String,
    #[serde(rename = "datetime")]
    DateTime,
}

impl ScalarType {
    /// Integers and doubles can be compared with and combined with each other.
    pub fn is_numeric(self) -> bool {
        matches!(self, ScalarType::Integer | ScalarType::Double)
    }

    /// Can values of this type appear on either side of `lt`, `le`, `gt` and `ge`,
    /// and in an ordering clause.
    pub fn is_ordered(self) -> bool {
        match self {
            ScalarType::Integer | ScalarType::Double | ScalarType::String | ScalarType::DateTime => {
                true
            }
            ScalarType::Boolean => false,
        }
    }

    /// The name of the type as it appears in configuration and error messages.
    pub fn name(self) -> &'static str {
        match self {
            ScalarType::Boolean => "boolean",
            ScalarType::Integer => "integer",
            ScalarType::Double => "double",
            ScalarType::String => "string",
            ScalarType::DateTime => "datetime",
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Can this property contain null values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub enum Nullable {
    #[default]
    Nullable,
    NonNullable,
}

/// Information about a single property of a record shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PropertyInfo {
    /// The column backing this property in SQL, if it differs from the property name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    pub r#type: ScalarType,
    #[serde(default)]
    pub nullable: Nullable,
}

impl PropertyInfo {
    pub fn new(r#type: ScalarType, nullable: Nullable) -> Self {
        PropertyInfo {
            column: None,
            r#type,
            nullable,
        }
    }

    /// The SQL column name for a property called `property_name`.
    pub fn column_name<'a>(&'a self, property_name: &'a str) -> &'a str {
        self.column.as_deref().unwrap_or(property_name)
    }
}

/// A named record shape. Shapes may derive from a base shape and inherit all of its properties.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordShape {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,
    pub properties: BTreeMap<String, PropertyInfo>,
}

/// Mapping from a record shape name to its information.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct RecordShapes(pub BTreeMap<String, RecordShape>);

impl RecordShapes {
    pub fn empty() -> Self {
        RecordShapes(BTreeMap::new())
    }
}
