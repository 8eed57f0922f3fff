//! Resolution of property names against a record shape.

use std::collections::BTreeMap;

use thiserror::Error;

use super::shapes::{PropertyInfo, RecordShapes};

/// Errors raised while resolving shapes and properties.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("Record shape '{0}' not found.")]
    ShapeNotFound(String),
    #[error("Record shape '{shape}' derives from unknown shape '{base}'.")]
    BaseShapeNotFound { shape: String, base: String },
    #[error("Record shape '{0}' derives from itself.")]
    InheritanceCycle(String),
    #[error("Property '{property}' not found in record shape '{shape}'.")]
    UnknownProperty { property: String, shape: String },
}

/// The capability of resolving a property name to its declared type.
///
/// Implementations must expose inherited properties. Lookups are case-sensitive.
pub trait SchemaProvider {
    /// The name of the record shape properties are resolved against.
    fn shape_name(&self) -> &str;

    /// Find a property by name.
    fn property(&self, name: &str) -> Option<&PropertyInfo>;

    /// Find a property by name, failing when it does not exist.
    fn lookup_property(&self, name: &str) -> Result<&PropertyInfo, Error> {
        self.property(name).ok_or_else(|| Error::UnknownProperty {
            property: name.to_string(),
            shape: self.shape_name().to_string(),
        })
    }
}

/// A record shape with its inheritance chain flattened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSchema {
    name: String,
    properties: BTreeMap<String, PropertyInfo>,
}

impl RecordSchema {
    /// Build a schema directly from a set of properties, without inheritance.
    pub fn new(name: impl Into<String>, properties: BTreeMap<String, PropertyInfo>) -> Self {
        RecordSchema {
            name: name.into(),
            properties,
        }
    }

    /// Flatten `shape_name` and all of its bases. Properties declared on a derived shape
    /// shadow properties of the same name declared on a base.
    pub fn resolve(shapes: &RecordShapes, shape_name: &str) -> Result<RecordSchema, Error> {
        // the shape itself first, then its base, then its base's base.
        let mut lineage: Vec<String> = vec![];
        let mut current = Some(shape_name.to_string());

        while let Some(name) = current {
            if lineage.contains(&name) {
                return Err(Error::InheritanceCycle(shape_name.to_string()));
            }
            let shape = shapes.0.get(&name).ok_or_else(|| match lineage.last() {
                None => Error::ShapeNotFound(name.clone()),
                Some(derived) => Error::BaseShapeNotFound {
                    shape: derived.clone(),
                    base: name.clone(),
                },
            })?;
            current = shape.base.clone();
            lineage.push(name);
        }

        // walk from the root base down so derived declarations win.
        let mut properties = BTreeMap::new();
        for name in lineage.iter().rev() {
            if let Some(shape) = shapes.0.get(name) {
                properties.extend(
                    shape
                        .properties
                        .iter()
                        .map(|(property, info)| (property.clone(), info.clone())),
                );
            }
        }

        Ok(RecordSchema {
            name: shape_name.to_string(),
            properties,
        })
    }

    pub fn properties(&self) -> &BTreeMap<String, PropertyInfo> {
        &self.properties
    }
}

impl SchemaProvider for RecordSchema {
    fn shape_name(&self) -> &str {
        &self.name
    }

    fn property(&self, name: &str) -> Option<&PropertyInfo> {
        self.properties.get(name)
    }
}
