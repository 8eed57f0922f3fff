//! Errors that can occur while parsing, elaborating or writing a configuration.

use std::path::PathBuf;

use thiserror::Error;

/// The errors that can be thrown when processing configuration.
#[derive(Debug, Error)]
pub enum ParseConfigurationError {
    #[error("parse error on {file_path}:{line}:{column}: {message}")]
    ParseError {
        file_path: PathBuf,
        line: usize,
        column: usize,
        message: String,
    },
    #[error("did not find expected version tag in {file_path}: {message}")]
    DidNotFindExpectedVersionTag { file_path: PathBuf, message: String },
    #[error("unsupported configuration version {version} in {file_path}")]
    UnsupportedVersion { file_path: PathBuf, version: String },

    #[error("I/O error: {0}")]
    IoErrorButStringified(String),
}

/// The errors that can be thrown when elaborating a parsed configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MakeRuntimeConfigurationError {
    #[error("table '{table}' refers to unknown record shape '{shape}'")]
    UnknownShape { table: String, shape: String },
    #[error("record shape '{shape}' derives from unknown shape '{base}'")]
    UnknownBaseShape { shape: String, base: String },
    #[error("record shape '{0}' derives from itself")]
    InheritanceCycle(String),
    #[error("fallback ordering of table '{table}' refers to unknown property '{property}'")]
    UnknownFallbackProperty { table: String, property: String },
    #[error("table '{0}' has no SQL")]
    EmptyBaseSql(String),
    #[error(transparent)]
    Metadata(query_engine_metadata::metadata::Error),
}

/// The errors that can be thrown when writing a configuration to disk.
#[derive(Debug, Error)]
pub enum WriteParsedConfigurationError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
