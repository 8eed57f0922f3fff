//! Lower the query IR to a SQL execution plan.

pub mod translation;
