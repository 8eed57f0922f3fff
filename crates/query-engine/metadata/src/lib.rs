//! Record shape metadata shared by the parser, the in-memory engine and the SQL translation.

pub mod metadata;
