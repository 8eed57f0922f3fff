//! Build SQL ASTs and render them as parameterized SQL text for a dialect.

pub mod ast;
pub mod convert;
pub mod dialect;
pub mod execution_plan;
pub mod helpers;
pub mod string;
