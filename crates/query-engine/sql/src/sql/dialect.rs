//! SQL dialect profiles: how to quote identifiers, write placeholders, page results, and
//! spell the handful of functions that differ between databases.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Everything that varies between the SQL dialects we generate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SqlDialectProfile {
    pub identifier_quoting: IdentifierQuoting,
    pub placeholder: PlaceholderSyntax,
    pub paging: PagingSyntax,
    pub functions: FunctionStyle,
}

/// How identifiers are quoted. The closing quote is escaped by doubling it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum IdentifierQuoting {
    /// `"name"`
    DoubleQuotes,
    /// `[name]`
    Brackets,
    /// `` `name` ``
    Backticks,
}

impl IdentifierQuoting {
    pub fn open(self) -> char {
        match self {
            IdentifierQuoting::DoubleQuotes => '"',
            IdentifierQuoting::Brackets => '[',
            IdentifierQuoting::Backticks => '`',
        }
    }

    pub fn close(self) -> char {
        match self {
            IdentifierQuoting::DoubleQuotes => '"',
            IdentifierQuoting::Brackets => ']',
            IdentifierQuoting::Backticks => '`',
        }
    }
}

/// How a parameter placeholder is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum PlaceholderSyntax {
    /// `@p1`, `@p2`, ...
    AtNamed,
    /// `$1`, `$2`, ...
    DollarNumbered,
    /// `?` for every parameter, bound by position.
    QuestionMark,
}

/// How a page of results is selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", tag = "style")]
pub enum PagingSyntax {
    /// `LIMIT n OFFSET m`.
    #[serde(rename_all = "camelCase")]
    LimitOffset {
        /// Whether an `OFFSET` needs a `LIMIT` in front of it, written as `LIMIT -1`.
        #[serde(default)]
        offset_requires_limit: bool,
    },
    /// `OFFSET m ROWS FETCH NEXT n ROWS ONLY`.
    OffsetFetch,
    /// A `ROW_NUMBER() OVER (ORDER BY ...)` column filtered in an outer query.
    RowNumber,
}

/// Which family of function names to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum FunctionStyle {
    /// `LEN`, `DATEPART`, `LTRIM(RTRIM(..))`.
    TransactSql,
    /// `LENGTH`, `EXTRACT(.. FROM ..)`, `TRIM`.
    Postgres,
    /// `LENGTH`, `STRFTIME`, `TRIM`.
    Sqlite,
}

impl SqlDialectProfile {
    /// Microsoft SQL Server 2012 and later.
    pub fn sql_server() -> Self {
        SqlDialectProfile {
            identifier_quoting: IdentifierQuoting::Brackets,
            placeholder: PlaceholderSyntax::AtNamed,
            paging: PagingSyntax::OffsetFetch,
            functions: FunctionStyle::TransactSql,
        }
    }

    /// Microsoft SQL Server before 2012, which has no `OFFSET`.
    pub fn sql_server_legacy() -> Self {
        SqlDialectProfile {
            paging: PagingSyntax::RowNumber,
            ..Self::sql_server()
        }
    }

    pub fn postgres() -> Self {
        SqlDialectProfile {
            identifier_quoting: IdentifierQuoting::DoubleQuotes,
            placeholder: PlaceholderSyntax::DollarNumbered,
            paging: PagingSyntax::LimitOffset {
                offset_requires_limit: false,
            },
            functions: FunctionStyle::Postgres,
        }
    }

    pub fn sqlite() -> Self {
        SqlDialectProfile {
            identifier_quoting: IdentifierQuoting::DoubleQuotes,
            placeholder: PlaceholderSyntax::QuestionMark,
            paging: PagingSyntax::LimitOffset {
                offset_requires_limit: true,
            },
            functions: FunctionStyle::Sqlite,
        }
    }

    /// Characters that must be escaped inside a `LIKE` pattern, besides the escape
    /// character itself.
    pub fn like_wildcards(&self) -> &'static [char] {
        match self.functions {
            FunctionStyle::TransactSql => &['%', '_', '['],
            FunctionStyle::Postgres | FunctionStyle::Sqlite => &['%', '_'],
        }
    }
}
