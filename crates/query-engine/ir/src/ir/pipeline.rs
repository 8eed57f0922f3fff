//! Statically composed query pipelines and their translation to a [`QueryDescriptor`].
//!
//! A pipeline is an ordered list of operations applied to a root source, built by ordinary
//! code instead of parsed from text. Translation folds the operations into one descriptor,
//! remembers the root source and decides how backend results are projected back into the
//! shape the pipeline's terminal operation asks for.

use query_engine_metadata::metadata::{self, SchemaProvider};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::ast::{Direction, Expression, InlineCount, OrderByElement, QueryDescriptor};
use super::helpers;
use super::typing::{self, InferError, TypeError};

/// The data source a pipeline is built on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum Source {
    /// A SQL table reference or subquery.
    #[serde(rename_all = "camelCase")]
    Sql { base_sql: String },
    /// An in-memory sequence of records.
    InMemory,
}

/// A single step of a pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "operation")]
pub enum Operation {
    Filter { predicate: Expression },
    OrderBy { property: String, direction: Direction },
    ThenBy { property: String, direction: Direction },
    Skip { count: u64 },
    Take { count: u64 },
    /// Materialize every row.
    ToList,
    /// Count the matching rows.
    Count,
    /// The first row, if there is one.
    First,
    /// Whether there is any row at all.
    Any,
    Distinct,
    Select { properties: Vec<String> },
    GroupBy { property: String },
    Reverse,
}

impl Operation {
    /// The name of the operation, for error messages and logs.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Filter { .. } => "filter",
            Operation::OrderBy { .. } => "orderBy",
            Operation::ThenBy { .. } => "thenBy",
            Operation::Skip { .. } => "skip",
            Operation::Take { .. } => "take",
            Operation::ToList => "toList",
            Operation::Count => "count",
            Operation::First => "first",
            Operation::Any => "any",
            Operation::Distinct => "distinct",
            Operation::Select { .. } => "select",
            Operation::GroupBy { .. } => "groupBy",
            Operation::Reverse => "reverse",
        }
    }
}

/// A root source followed by the operations applied to it, in call order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pipeline {
    pub source: Source,
    pub operations: Vec<Operation>,
}

impl Pipeline {
    pub fn new(source: Source) -> Self {
        Pipeline {
            source,
            operations: vec![],
        }
    }

    /// A pipeline rooted on a SQL table or subquery.
    pub fn from_sql(base_sql: impl Into<String>) -> Self {
        Self::new(Source::Sql {
            base_sql: base_sql.into(),
        })
    }

    /// A pipeline rooted on an in-memory sequence.
    pub fn in_memory() -> Self {
        Self::new(Source::InMemory)
    }

    #[must_use]
    pub fn then(mut self, operation: Operation) -> Self {
        self.operations.push(operation);
        self
    }

    #[must_use]
    pub fn filter(self, predicate: Expression) -> Self {
        self.then(Operation::Filter { predicate })
    }

    #[must_use]
    pub fn order_by(self, property: impl Into<String>) -> Self {
        self.then(Operation::OrderBy {
            property: property.into(),
            direction: Direction::Asc,
        })
    }

    #[must_use]
    pub fn order_by_descending(self, property: impl Into<String>) -> Self {
        self.then(Operation::OrderBy {
            property: property.into(),
            direction: Direction::Desc,
        })
    }

    #[must_use]
    pub fn then_by(self, property: impl Into<String>) -> Self {
        self.then(Operation::ThenBy {
            property: property.into(),
            direction: Direction::Asc,
        })
    }

    #[must_use]
    pub fn then_by_descending(self, property: impl Into<String>) -> Self {
        self.then(Operation::ThenBy {
            property: property.into(),
            direction: Direction::Desc,
        })
    }

    #[must_use]
    pub fn skip(self, count: u64) -> Self {
        self.then(Operation::Skip { count })
    }

    #[must_use]
    pub fn take(self, count: u64) -> Self {
        self.then(Operation::Take { count })
    }

    #[must_use]
    pub fn count(self) -> Self {
        self.then(Operation::Count)
    }

    #[must_use]
    pub fn first(self) -> Self {
        self.then(Operation::First)
    }

    #[must_use]
    pub fn any(self) -> Self {
        self.then(Operation::Any)
    }
}

/// How raw backend results are turned into the result the pipeline asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultProjector {
    Rows,
    Count,
    First,
    Any,
}

/// The projected result of running a pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult<T> {
    Rows(Vec<T>),
    Count(u64),
    First(Option<T>),
    Any(bool),
}

impl ResultProjector {
    /// Does this projection need the count variant of the query instead of rows.
    pub fn expects_count(self) -> bool {
        self == ResultProjector::Count
    }

    /// Project materialized rows.
    pub fn project_rows<T>(self, rows: Vec<T>) -> QueryResult<T> {
        match self {
            ResultProjector::Rows => QueryResult::Rows(rows),
            ResultProjector::Count => QueryResult::Count(rows.len() as u64),
            ResultProjector::First => QueryResult::First(rows.into_iter().next()),
            ResultProjector::Any => QueryResult::Any(!rows.is_empty()),
        }
    }

    /// Project a scalar count.
    pub fn project_count<T>(self, count: u64) -> QueryResult<T> {
        match self {
            ResultProjector::Any => QueryResult::Any(count > 0),
            _ => QueryResult::Count(count),
        }
    }
}

/// The result of translating a pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Translated {
    pub query: QueryDescriptor,
    pub source: Source,
    pub projector: ResultProjector,
}

/// Errors from translating a pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error("Unsupported operation '{operation}' at position {index}: {reason}.")]
    UnsupportedOperation {
        index: usize,
        operation: &'static str,
        reason: String,
    },
    #[error(transparent)]
    UnknownProperty(#[from] metadata::Error),
    #[error(transparent)]
    TypeMismatch(#[from] TypeError),
}

impl From<InferError> for PipelineError {
    fn from(error: InferError) -> Self {
        match error {
            InferError::UnknownProperty(error) => PipelineError::UnknownProperty(error),
            InferError::Type(error) => PipelineError::TypeMismatch(error),
        }
    }
}

/// Accumulated state while folding operations.
#[derive(Default)]
struct Fold {
    filter: Option<Expression>,
    order_by: Vec<OrderByElement>,
    skip: Option<u64>,
    top: Option<u64>,
    /// Was the previous operation an ordering, so a `thenBy` may follow.
    ordered: bool,
    paged: bool,
    terminal: Option<ResultProjector>,
}

/// Fold a pipeline into a query descriptor, checking every operation against `schema`.
pub fn translate<S: SchemaProvider + ?Sized>(
    pipeline: &Pipeline,
    schema: &S,
) -> Result<Translated, PipelineError> {
    let mut fold = Fold::default();

    for (index, operation) in pipeline.operations.iter().enumerate() {
        let unsupported = |reason: &str| PipelineError::UnsupportedOperation {
            index,
            operation: operation.name(),
            reason: reason.to_string(),
        };

        if fold.terminal.is_some() {
            return Err(unsupported("the pipeline has already been materialized"));
        }

        let ordering = matches!(
            operation,
            Operation::OrderBy { .. } | Operation::ThenBy { .. }
        );
        if fold.paged
            && (ordering || matches!(operation, Operation::Filter { .. } | Operation::Count))
        {
            return Err(unsupported(
                "it cannot be expressed after paging has been applied",
            ));
        }

        match operation {
            Operation::Filter { predicate } => {
                typing::check_predicate(predicate, schema)?;
                fold.filter = Some(helpers::conjunction(fold.filter.take(), predicate.clone()));
            }
            Operation::OrderBy {
                property,
                direction,
            } => {
                schema.lookup_property(property)?;
                // a new primary key demotes the existing keys to tie breakers.
                fold.order_by.retain(|element| element.property != *property);
                fold.order_by.insert(
                    0,
                    OrderByElement {
                        property: property.clone(),
                        direction: *direction,
                    },
                );
            }
            Operation::ThenBy {
                property,
                direction,
            } => {
                if !fold.ordered {
                    return Err(unsupported("it must directly follow an ordering"));
                }
                schema.lookup_property(property)?;
                if !fold
                    .order_by
                    .iter()
                    .any(|element| element.property == *property)
                {
                    fold.order_by.push(OrderByElement {
                        property: property.clone(),
                        direction: *direction,
                    });
                }
            }
            Operation::Skip { count } => {
                let skip = fold
                    .skip
                    .unwrap_or(0)
                    .checked_add(*count)
                    .ok_or_else(|| unsupported("the accumulated skip overflows"))?;
                fold.skip = Some(skip);
                fold.top = fold.top.map(|top| top.saturating_sub(*count));
                fold.paged = true;
            }
            Operation::Take { count } => {
                fold.top = Some(fold.top.map_or(*count, |top| top.min(*count)));
                fold.paged = true;
            }
            Operation::ToList => fold.terminal = Some(ResultProjector::Rows),
            Operation::Count => fold.terminal = Some(ResultProjector::Count),
            Operation::First => {
                fold.top = Some(fold.top.map_or(1, |top| top.min(1)));
                fold.terminal = Some(ResultProjector::First);
            }
            Operation::Any => {
                fold.top = Some(fold.top.map_or(1, |top| top.min(1)));
                fold.terminal = Some(ResultProjector::Any);
            }
            Operation::Distinct
            | Operation::Select { .. }
            | Operation::GroupBy { .. }
            | Operation::Reverse => {
                return Err(unsupported("it has no query descriptor equivalent"));
            }
        }

        fold.ordered = ordering;
    }

    let projector = fold.terminal.unwrap_or(ResultProjector::Rows);
    let inline_count = if projector.expects_count() {
        InlineCount::AllPages
    } else {
        InlineCount::None
    };
    let query = QueryDescriptor::new(
        fold.filter,
        fold.order_by,
        fold.skip,
        fold.top,
        inline_count,
    );
    tracing::debug!(filter = %display_filter(&query), ?projector, "translated pipeline");

    Ok(Translated {
        query,
        source: pipeline.source.clone(),
        projector,
    })
}

fn display_filter(query: &QueryDescriptor) -> String {
    query
        .filter()
        .map_or_else(String::new, ToString::to_string)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use query_engine_metadata::metadata::{Nullable, PropertyInfo, RecordSchema, ScalarType};
    use similar_asserts::assert_eq;

    use super::*;
    use crate::ir::helpers::*;

    fn schema() -> RecordSchema {
        RecordSchema::new(
            "A",
            BTreeMap::from([
                (
                    "Id".to_string(),
                    PropertyInfo::new(ScalarType::Integer, Nullable::NonNullable),
                ),
                (
                    "Text".to_string(),
                    PropertyInfo::new(ScalarType::String, Nullable::Nullable),
                ),
            ]),
        )
    }

    #[test]
    fn filters_compose_with_and() {
        let pipeline = Pipeline::from_sql("items")
            .filter(eq(property("Id"), literal(1)))
            .filter(ne(property("Text"), null()));
        let translated = translate(&pipeline, &schema()).unwrap();
        assert_eq!(
            translated.query.filter(),
            Some(&and(
                eq(property("Id"), literal(1)),
                ne(property("Text"), null())
            ))
        );
        assert_eq!(translated.projector, ResultProjector::Rows);
        assert_eq!(
            translated.source,
            Source::Sql {
                base_sql: "items".to_string()
            }
        );
    }

    #[test]
    fn secondary_orderings_append_in_call_order() {
        let pipeline = Pipeline::from_sql("items")
            .order_by_descending("Id")
            .then_by("Text");
        let translated = translate(&pipeline, &schema()).unwrap();
        assert_eq!(
            translated.query.order_by(),
            &[descending("Id"), ascending("Text")]
        );
    }

    #[test]
    fn a_second_primary_ordering_demotes_the_first() {
        let pipeline = Pipeline::from_sql("items").order_by("Text").order_by("Id");
        let translated = translate(&pipeline, &schema()).unwrap();
        assert_eq!(
            translated.query.order_by(),
            &[ascending("Id"), ascending("Text")]
        );
    }

    #[test]
    fn paging_accumulates() {
        let pipeline = Pipeline::from_sql("items")
            .order_by("Id")
            .skip(1)
            .skip(2)
            .take(10)
            .take(5);
        let translated = translate(&pipeline, &schema()).unwrap();
        assert_eq!(translated.query.skip(), Some(3));
        assert_eq!(translated.query.top(), Some(5));

        let pipeline = Pipeline::from_sql("items").order_by("Id").take(5).skip(2);
        let translated = translate(&pipeline, &schema()).unwrap();
        assert_eq!(translated.query.skip(), Some(2));
        assert_eq!(translated.query.top(), Some(3));
    }

    #[test]
    fn count_requests_an_inline_count() {
        let pipeline = Pipeline::from_sql("items")
            .filter(eq(property("Id"), literal(1)))
            .count();
        let translated = translate(&pipeline, &schema()).unwrap();
        assert_eq!(translated.projector, ResultProjector::Count);
        assert_eq!(translated.query.inline_count(), InlineCount::AllPages);
    }

    #[test]
    fn first_limits_to_one_row() {
        let pipeline = Pipeline::from_sql("items").order_by("Id").take(5).first();
        let translated = translate(&pipeline, &schema()).unwrap();
        assert_eq!(translated.query.top(), Some(1));
        assert_eq!(translated.projector, ResultProjector::First);
    }

    #[test]
    fn unsupported_shapes_are_rejected() {
        let cases = vec![
            (Pipeline::from_sql("items").then(Operation::Distinct), 0),
            (Pipeline::from_sql("items").then_by("Id"), 0),
            (
                Pipeline::from_sql("items")
                    .take(2)
                    .filter(eq(property("Id"), literal(1))),
                1,
            ),
            (Pipeline::from_sql("items").skip(1).count(), 1),
            (Pipeline::from_sql("items").count().take(1), 1),
            (
                Pipeline::from_sql("items")
                    .order_by("Id")
                    .filter(eq(property("Id"), literal(1)))
                    .then_by("Text"),
                2,
            ),
        ];
        for (pipeline, expected_index) in cases {
            match translate(&pipeline, &schema()) {
                Err(PipelineError::UnsupportedOperation { index, .. }) => {
                    assert_eq!(index, expected_index, "{pipeline:?}");
                }
                other => panic!("expected an unsupported operation for {pipeline:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn unknown_properties_are_rejected() {
        let pipeline = Pipeline::from_sql("items").order_by("BId");
        assert!(matches!(
            translate(&pipeline, &schema()),
            Err(PipelineError::UnknownProperty(_))
        ));
    }

    #[test]
    fn pipelines_serialize_as_operation_lists() {
        let pipeline = Pipeline::from_sql("items").order_by("Id").take(2);
        let json = serde_json::to_value(&pipeline).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "source": { "type": "sql", "baseSql": "items" },
                "operations": [
                    { "operation": "orderBy", "property": "Id", "direction": "asc" },
                    { "operation": "take", "count": 2 }
                ]
            })
        );
        let parsed: Pipeline = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, pipeline);
    }
}
