//! Apply ordering and paging to a filtered select, in the paging syntax of the dialect.

use query_engine_ir::ir::ast as ir;
use query_engine_sql::sql;
use query_engine_sql::sql::dialect::PagingSyntax;

use super::sorting;
use crate::translation::error::Error;
use crate::translation::helpers::Env;

/// The alias of the row number column used by windowed paging.
const ROW_NUMBER: &str = "row_number";

/// Order `select` and cut out the requested page.
///
/// Paging without an ordering is ambiguous, so a paged query with no ordering gets the
/// fallback ordering of the table or fails.
pub fn apply(
    env: &Env,
    mut select: sql::ast::Select,
    query: &ir::QueryDescriptor,
) -> Result<sql::ast::Select, Error> {
    let order_by = sorting::translate_order_by(env, query.order_by())?;

    if !query.is_paged() {
        select.order_by = order_by;
        return Ok(select);
    }

    // an empty page. Not every dialect accepts a zero row count.
    if query.top() == Some(0) {
        select.where_ = sql::ast::Where(sql::helpers::false_expr());
        select.order_by = order_by;
        return Ok(select);
    }

    let order_by = if order_by.elements.is_empty() {
        sorting::fallback_order_by(env)?
    } else {
        order_by
    };
    let limit = sql::ast::Limit {
        limit: query.top(),
        offset: query.skip().filter(|skip| *skip > 0),
    };

    match env.settings.dialect.paging {
        PagingSyntax::LimitOffset { .. } | PagingSyntax::OffsetFetch => {
            select.order_by = order_by;
            select.limit = limit;
            Ok(select)
        }
        PagingSyntax::RowNumber => Ok(row_number_page(select, order_by, &limit)),
    }
}

/// Number the rows of `select` and keep those inside the page:
///
/// ```sql
/// SELECT q_paged.* FROM (SELECT q.*, ROW_NUMBER() OVER (ORDER BY ...) AS row_number ...) AS q_paged
/// WHERE q_paged.row_number > offset AND q_paged.row_number <= offset + limit
/// ORDER BY q_paged.row_number ASC
/// ```
///
/// The page keeps every column of `q` and adds the trailing `row_number` column.
fn row_number_page(
    mut select: sql::ast::Select,
    order_by: sql::ast::OrderBy,
    limit: &sql::ast::Limit,
) -> sql::ast::Select {
    let row_number = sql::helpers::make_column_alias(ROW_NUMBER);
    select.select_list = sql::ast::SelectList::SelectListComposite(
        Box::new(select.select_list),
        Box::new(sql::ast::SelectList::SelectList(vec![(
            row_number.clone(),
            sql::ast::Expression::RowNumber(order_by),
        )])),
    );

    let paged = sql::helpers::make_table_alias("q_paged");
    let row_number_column = sql::helpers::make_aliased_column(&paged, &row_number);
    let offset = limit.offset.unwrap_or(0);

    let after_offset = sql::ast::Expression::BinaryOperation {
        left: Box::new(row_number_column.clone()),
        operator: sql::ast::BinaryOperator(">".to_string()),
        right: Box::new(int_value(offset)),
    };
    let where_ = match limit.limit {
        None => after_offset,
        Some(top) => sql::ast::Expression::And {
            left: Box::new(after_offset),
            right: Box::new(sql::ast::Expression::BinaryOperation {
                left: Box::new(row_number_column.clone()),
                operator: sql::ast::BinaryOperator("<=".to_string()),
                right: Box::new(int_value(offset.saturating_add(top))),
            }),
        },
    };

    let mut outer = sql::helpers::star_from_select(
        &paged,
        sql::ast::From::Select {
            select: Box::new(select),
            alias: paged.clone(),
        },
    );
    outer.where_ = sql::ast::Where(where_);
    outer.order_by = sql::ast::OrderBy {
        elements: vec![sql::ast::OrderByElement {
            target: row_number_column,
            direction: sql::ast::OrderByDirection::Asc,
        }],
    };
    outer
}

fn int_value(value: u64) -> sql::ast::Expression {
    sql::ast::Expression::Value(sql::ast::Value::Int8(
        i64::try_from(value).unwrap_or(i64::MAX),
    ))
}
