//! Describe the SQL execution plan of a query.

use super::ast;
use super::dialect::SqlDialectProfile;
use super::string::SQL;

/// The shape of result the executor is expected to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectedShape {
    /// Zero or more rows of the queried record shape.
    ///
    /// Dialects that page with `ROW_NUMBER()` append one trailing integer column named
    /// `row_number`, holding the row's 1-based position before paging. Executors should
    /// read columns by name and may ignore it.
    Rows,
    /// A single row with a single integer column named `count`.
    Count,
}

/// Definition of an execution plan to be run against the database.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionPlan {
    pub dialect: SqlDialectProfile,
    /// The rows of the requested page.
    pub rows: ast::Select,
    /// The number of matching rows with paging ignored.
    pub count: ast::Select,
}

impl ExecutionPlan {
    /// Extract the rows query as SQL.
    pub fn rows_sql(&self) -> SQL {
        select_to_sql(&self.dialect, &self.rows)
    }

    /// Extract the count query as SQL.
    pub fn count_sql(&self) -> SQL {
        select_to_sql(&self.dialect, &self.count)
    }

    /// Extract the query producing the given shape as SQL.
    pub fn query_sql(&self, shape: ExpectedShape) -> SQL {
        match shape {
            ExpectedShape::Rows => self.rows_sql(),
            ExpectedShape::Count => self.count_sql(),
        }
    }
}

pub fn select_to_sql(dialect: &SqlDialectProfile, select: &ast::Select) -> SQL {
    let mut sql = SQL::new(dialect);
    select.to_sql(&mut sql);
    sql
}
