//! SQL AST, dialect profiles, and the low-level parameterized SQL string representation.

pub mod sql;
