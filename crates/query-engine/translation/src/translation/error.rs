//! Errors for query translation.

use thiserror::Error;

/// A type for translation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("Paging requires an ordering, and no fallback ordering is configured.")]
    InvalidPaging,
    #[error("Property '{0}' is not mapped to a column.")]
    UnknownProperty(String),
    #[error("Queries containing {0} are not supported.")]
    NotSupported(String),
    #[error("The base SQL of a query cannot be empty.")]
    EmptyBaseSql,
}
