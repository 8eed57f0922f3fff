//! Helpers for building sql::ast types in certain shapes and patterns.

use super::ast::*;

// Empty clauses //

/// An empty `WHERE` clause.
pub fn empty_where() -> Expression {
    true_expr()
}

/// An empty `ORDER BY` clause.
pub fn empty_order_by() -> OrderBy {
    OrderBy { elements: vec![] }
}

/// Empty `LIMIT` and `OFFSET` clauses.
pub fn empty_limit() -> Limit {
    Limit {
        limit: None,
        offset: None,
    }
}

/// A `true` expression.
pub fn true_expr() -> Expression {
    Expression::Value(Value::Bool(true))
}

/// A `false` expression.
pub fn false_expr() -> Expression {
    Expression::Value(Value::Bool(false))
}

// Aliasing //

/// Create table aliases using this function so we build everything in one place.
pub fn make_table_alias(name: impl Into<String>) -> TableAlias {
    TableAlias { name: name.into() }
}

/// Create column aliases using this function so we build everything in one place.
pub fn make_column_alias(name: impl Into<String>) -> ColumnAlias {
    ColumnAlias { name: name.into() }
}

/// A column of an aliased table.
pub fn make_column(table: &TableAlias, name: impl Into<String>) -> Expression {
    Expression::ColumnReference(ColumnReference::TableColumn {
        table: TableReference::AliasedTable(table.clone()),
        name: ColumnName(name.into()),
    })
}

/// A column alias we created on an aliased table.
pub fn make_aliased_column(table: &TableAlias, column: &ColumnAlias) -> Expression {
    Expression::ColumnReference(ColumnReference::AliasedColumn {
        table: TableReference::AliasedTable(table.clone()),
        column: column.clone(),
    })
}

// FROMs //

/// Select from configured base SQL. Text that is itself a query becomes a derived table,
/// anything else is treated as a table reference.
pub fn base_from(base_sql: &str, alias: TableAlias) -> From {
    if is_query(base_sql) {
        From::RawSelect {
            sql: RawSql(base_sql.trim().to_string()),
            alias,
        }
    } else {
        From::Table {
            reference: TableReference::DBTable(TableName(base_sql.trim().to_string())),
            alias,
        }
    }
}

fn is_query(sql: &str) -> bool {
    let first_word: String = sql
        .trim_start()
        .chars()
        .take_while(char::is_ascii_alphabetic)
        .collect();
    first_word.eq_ignore_ascii_case("select") || first_word.eq_ignore_ascii_case("with")
}

// SELECTs //

/// Build a simple select with a select list and the rest are empty.
pub fn simple_select(select_list: Vec<(ColumnAlias, Expression)>) -> Select {
    Select {
        select_list: SelectList::SelectList(select_list),
        from: None,
        where_: Where(empty_where()),
        order_by: empty_order_by(),
        limit: empty_limit(),
    }
}

/// Build a simple select *
pub fn star_select(from: From) -> Select {
    Select {
        select_list: SelectList::SelectStar,
        from: Some(from),
        where_: Where(empty_where()),
        order_by: empty_order_by(),
        limit: empty_limit(),
    }
}

/// Build `SELECT alias.* FROM ...`
pub fn star_from_select(table: &TableAlias, from: From) -> Select {
    Select {
        select_list: SelectList::SelectStarFrom(TableReference::AliasedTable(table.clone())),
        ..star_select(from)
    }
}

/// Wrap a select as `SELECT COUNT(*) AS "count" FROM (select) AS alias`.
pub fn count_select(select: Select, alias: TableAlias) -> Select {
    let mut count = simple_select(vec![(
        make_column_alias("count"),
        Expression::Count(CountType::Star),
    )]);
    count.from = Some(From::Select {
        select: Box::new(select),
        alias,
    });
    count
}
