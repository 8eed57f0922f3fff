//! Translate a query descriptor into SQL.

pub mod filtering;
pub mod paging;
pub mod sorting;
pub mod values;

use query_engine_ir::ir::ast as ir;
use query_engine_sql::sql;
use query_engine_sql::sql::execution_plan::ExecutionPlan;

use crate::translation::error::Error;
use crate::translation::helpers::{Env, Settings};

/// Translate a query descriptor over the table defined by `base_sql` into an execution
/// plan holding both the rows query and its count variant.
pub fn translate(
    settings: &Settings,
    base_sql: &str,
    query: &ir::QueryDescriptor,
) -> Result<ExecutionPlan, Error> {
    if base_sql.trim().is_empty() {
        return Err(Error::EmptyBaseSql);
    }
    let env = Env::new(settings);

    let rows = paging::apply(&env, filtered_select(&env, base_sql, query)?, query)?;
    // the count ignores paging, so it needs no ordering either.
    let count = sql::helpers::count_select(
        filtered_select(&env, base_sql, query)?,
        sql::helpers::make_table_alias("q_count"),
    );

    tracing::debug!(rows = ?rows, count = ?count, "translated query");

    Ok(ExecutionPlan {
        dialect: settings.dialect.clone(),
        rows,
        count,
    })
}

/// `SELECT q.* FROM base AS q WHERE filter`
fn filtered_select(
    env: &Env,
    base_sql: &str,
    query: &ir::QueryDescriptor,
) -> Result<sql::ast::Select, Error> {
    let mut select = sql::helpers::star_from_select(
        &env.table,
        sql::helpers::base_from(base_sql, env.table.clone()),
    );
    if let Some(filter) = query.filter() {
        select.where_ = sql::ast::Where(filtering::translate_predicate(env, filter)?);
    }
    Ok(select)
}
