//! Metadata information regarding record shapes and their properties.

pub mod schema;
pub mod shapes;

// re-export without modules
pub use schema::*;
pub use shapes::*;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Metadata information.
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    #[serde(default)]
    pub record_shapes: RecordShapes,
}

impl Metadata {
    pub fn empty() -> Self {
        Metadata {
            record_shapes: RecordShapes::empty(),
        }
    }

    /// Resolve a record shape, including every property inherited from its base shapes.
    pub fn resolve_shape(&self, shape_name: &str) -> Result<RecordSchema, Error> {
        RecordSchema::resolve(&self.record_shapes, shape_name)
    }
}
