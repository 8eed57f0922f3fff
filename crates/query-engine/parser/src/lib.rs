//! Parse textual query parameters (`$filter`, `$orderby`, `$skip`, `$top`, `$inlinecount`)
//! into the query IR.

pub mod parser;
