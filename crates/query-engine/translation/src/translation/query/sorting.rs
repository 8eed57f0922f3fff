//! Translate the ordering of a query.

use query_engine_ir::ir::ast as ir;
use query_engine_sql::sql;

use crate::translation::error::Error;
use crate::translation::helpers::{Env, FallbackOrdering};

/// Translate ordering elements into an `ORDER BY` clause. An empty ordering yields an
/// empty clause.
pub fn translate_order_by(
    env: &Env,
    order_by: &[ir::OrderByElement],
) -> Result<sql::ast::OrderBy, Error> {
    let elements = order_by
        .iter()
        .map(|element| {
            Ok(sql::ast::OrderByElement {
                target: env.column(&element.property)?,
                direction: match element.direction {
                    ir::Direction::Asc => sql::ast::OrderByDirection::Asc,
                    ir::Direction::Desc => sql::ast::OrderByDirection::Desc,
                },
            })
        })
        .collect::<Result<Vec<_>, Error>>()?;
    Ok(sql::ast::OrderBy { elements })
}

/// The ordering to use when paging a query that names none.
pub fn fallback_order_by(env: &Env) -> Result<sql::ast::OrderBy, Error> {
    match &env.settings.fallback_ordering {
        FallbackOrdering::Fail => Err(Error::InvalidPaging),
        FallbackOrdering::Properties(properties)
            if properties.is_empty() =>
        {
            Err(Error::InvalidPaging)
        }
        FallbackOrdering::Properties(properties) => {
            let elements = properties
                .iter()
                .map(|property| {
                    Ok(sql::ast::OrderByElement {
                        target: env.column(property)?,
                        direction: sql::ast::OrderByDirection::Asc,
                    })
                })
                .collect::<Result<Vec<_>, Error>>()?;
            Ok(sql::ast::OrderBy { elements })
        }
    }
}
