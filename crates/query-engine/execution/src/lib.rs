//! Running query descriptors: directly over in-memory sequences, or as SQL through an
//! external executor.

pub mod memory;
pub mod query;
