//! Bind the properties of a record shape to accessors on a Rust type.

use std::collections::BTreeMap;

use query_engine_ir::ir::ast::Value;
use query_engine_metadata::metadata::{PropertyInfo, RecordSchema, SchemaProvider};

/// Read one property from a record.
pub type Accessor<R> = fn(&R) -> Value;

/// The properties a query may reference on records of type `R`, with their declared
/// types and accessors. Built once per record shape.
///
/// For sequences mixing base and derived records, bind the base shape on a type covering
/// every variant. Filters against the base shape then apply to derived records as well.
pub struct RecordBinding<R> {
    shape: String,
    properties: BTreeMap<String, PropertyInfo>,
    accessors: BTreeMap<String, Accessor<R>>,
}

impl<R> RecordBinding<R> {
    pub fn new(shape: impl Into<String>) -> Self {
        RecordBinding {
            shape: shape.into(),
            properties: BTreeMap::new(),
            accessors: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_property(
        mut self,
        name: impl Into<String>,
        info: PropertyInfo,
        accessor: Accessor<R>,
    ) -> Self {
        let name = name.into();
        self.properties.insert(name.clone(), info);
        self.accessors.insert(name, accessor);
        self
    }

    pub fn accessor(&self, name: &str) -> Option<Accessor<R>> {
        self.accessors.get(name).copied()
    }

    /// The schema of the bound shape, for parsing queries against it.
    pub fn schema(&self) -> RecordSchema {
        RecordSchema::new(self.shape.clone(), self.properties.clone())
    }
}

impl<R> SchemaProvider for RecordBinding<R> {
    fn shape_name(&self) -> &str {
        &self.shape
    }

    fn property(&self, name: &str) -> Option<&PropertyInfo> {
        self.properties.get(name)
    }
}
