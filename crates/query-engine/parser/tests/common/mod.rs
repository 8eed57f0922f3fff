use std::collections::BTreeMap;

use query_engine_metadata::metadata::{
    Nullable, PropertyInfo, RecordSchema, RecordShape, RecordShapes, ScalarType,
};

/// Shape `A` with `Id`, `Text` and `Date`, and shape `B` deriving from it with `BId`.
pub fn shapes() -> RecordShapes {
    let a = RecordShape {
        base: None,
        properties: BTreeMap::from([
            (
                "Id".to_string(),
                PropertyInfo::new(ScalarType::Integer, Nullable::NonNullable),
            ),
            (
                "Text".to_string(),
                PropertyInfo::new(ScalarType::String, Nullable::Nullable),
            ),
            (
                "Date".to_string(),
                PropertyInfo::new(ScalarType::DateTime, Nullable::Nullable),
            ),
        ]),
    };
    let b = RecordShape {
        base: Some("A".to_string()),
        properties: BTreeMap::from([(
            "BId".to_string(),
            PropertyInfo::new(ScalarType::Integer, Nullable::NonNullable),
        )]),
    };
    RecordShapes(BTreeMap::from([
        ("A".to_string(), a),
        ("B".to_string(), b),
    ]))
}

pub fn schema(shape: &str) -> RecordSchema {
    RecordSchema::resolve(&shapes(), shape).unwrap()
}
