//! Deferred queries: built like a pipeline, translated to SQL and run through an external
//! executor only when materialized.

use std::convert::Infallible;
use std::fmt;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{info_span, Instrument};

use query_engine_ir::ir::ast::{Direction, Expression, InlineCount, QueryDescriptor};
use query_engine_ir::ir::pipeline::{
    self, Operation, Pipeline, PipelineError, QueryResult, ResultProjector, Source,
};
use query_engine_metadata::metadata::RecordSchema;
use query_engine_sql::sql::execution_plan::{ExecutionPlan, ExpectedShape};
use query_engine_sql::sql::string::SQL;
use query_engine_translation::translation;
use query_engine_translation::translation::helpers::Settings;

/// What an executor produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Output<Row> {
    Rows(Vec<Row>),
    Count(u64),
}

impl<Row> Output<Row> {
    fn shape(&self) -> ExpectedShape {
        match self {
            Output::Rows(_) => ExpectedShape::Rows,
            Output::Count(_) => ExpectedShape::Count,
        }
    }
}

/// The capability of running parameterized SQL. Implemented outside the query engine.
#[async_trait]
pub trait SqlExecutor: Sync {
    type Row: Send;
    type Error: std::error::Error + Send + Sync + 'static;

    /// Run `sql` with its parameters, producing results of the given shape.
    async fn execute(
        &self,
        sql: &SQL,
        shape: ExpectedShape,
    ) -> Result<Output<Self::Row>, Self::Error>;
}

/// Errors from materializing a deferred query. Executor errors pass through unchanged.
#[derive(Debug, Error)]
pub enum Error<E> {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error(transparent)]
    Translation(#[from] translation::error::Error),
    #[error("The pipeline is not rooted on a SQL source.")]
    NotSqlSource,
    #[error("The executor returned {found:?} where {expected:?} was expected.")]
    UnexpectedShape {
        expected: ExpectedShape,
        found: ExpectedShape,
    },
    #[error(transparent)]
    Executor(E),
}

/// The states one materialization goes through. Every materialization starts afresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryState {
    Unmaterialized,
    Translating,
    Executing,
    Materialized,
}

impl fmt::Display for QueryState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            QueryState::Unmaterialized => "unmaterialized",
            QueryState::Translating => "translating",
            QueryState::Executing => "executing",
            QueryState::Materialized => "materialized",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Origin {
    Descriptor {
        base_sql: String,
        query: QueryDescriptor,
    },
    Pipeline(Pipeline),
}

/// A query over a SQL table that runs nothing until it is materialized.
///
/// Composition methods return new queries and leave the original untouched.
pub struct DeferredQuery<'a, X: ?Sized> {
    executor: &'a X,
    settings: &'a Settings,
    schema: &'a RecordSchema,
    origin: Origin,
}

impl<X: ?Sized> Clone for DeferredQuery<'_, X> {
    fn clone(&self) -> Self {
        DeferredQuery {
            origin: self.origin.clone(),
            ..*self
        }
    }
}

impl<'a, X: ?Sized> DeferredQuery<'a, X> {
    /// Every record of the table defined by `base_sql`.
    pub fn new(
        executor: &'a X,
        settings: &'a Settings,
        schema: &'a RecordSchema,
        base_sql: impl Into<String>,
    ) -> Self {
        Self::from_pipeline(executor, settings, schema, Pipeline::from_sql(base_sql))
    }

    /// A query built from a parsed descriptor. An `allpages` inline count materializes
    /// as the count of matching records.
    pub fn from_descriptor(
        executor: &'a X,
        settings: &'a Settings,
        schema: &'a RecordSchema,
        base_sql: impl Into<String>,
        query: QueryDescriptor,
    ) -> Self {
        DeferredQuery {
            executor,
            settings,
            schema,
            origin: Origin::Descriptor {
                base_sql: base_sql.into(),
                query,
            },
        }
    }

    pub fn from_pipeline(
        executor: &'a X,
        settings: &'a Settings,
        schema: &'a RecordSchema,
        pipeline: Pipeline,
    ) -> Self {
        DeferredQuery {
            executor,
            settings,
            schema,
            origin: Origin::Pipeline(pipeline),
        }
    }

    /// A new query with `operation` appended.
    ///
    /// A query built from a descriptor continues from the equivalent pipeline. Its inline
    /// count is dropped, use [`DeferredQuery::count`] to ask for one.
    #[must_use]
    pub fn then(&self, operation: Operation) -> Self {
        let pipeline = match &self.origin {
            Origin::Pipeline(pipeline) => pipeline.clone(),
            Origin::Descriptor { base_sql, query } => descriptor_pipeline(base_sql, query),
        };
        DeferredQuery {
            origin: Origin::Pipeline(pipeline.then(operation)),
            ..*self
        }
    }

    #[must_use]
    pub fn filter(&self, predicate: Expression) -> Self {
        self.then(Operation::Filter { predicate })
    }

    #[must_use]
    pub fn order_by(&self, property: impl Into<String>) -> Self {
        self.then(Operation::OrderBy {
            property: property.into(),
            direction: Direction::Asc,
        })
    }

    #[must_use]
    pub fn order_by_descending(&self, property: impl Into<String>) -> Self {
        self.then(Operation::OrderBy {
            property: property.into(),
            direction: Direction::Desc,
        })
    }

    #[must_use]
    pub fn then_by(&self, property: impl Into<String>) -> Self {
        self.then(Operation::ThenBy {
            property: property.into(),
            direction: Direction::Asc,
        })
    }

    #[must_use]
    pub fn then_by_descending(&self, property: impl Into<String>) -> Self {
        self.then(Operation::ThenBy {
            property: property.into(),
            direction: Direction::Desc,
        })
    }

    #[must_use]
    pub fn skip(&self, count: u64) -> Self {
        self.then(Operation::Skip { count })
    }

    #[must_use]
    pub fn take(&self, count: u64) -> Self {
        self.then(Operation::Take { count })
    }

    #[must_use]
    pub fn count(&self) -> Self {
        self.then(Operation::Count)
    }

    #[must_use]
    pub fn first(&self) -> Self {
        self.then(Operation::First)
    }

    #[must_use]
    pub fn any(&self) -> Self {
        self.then(Operation::Any)
    }

    /// Translate this query into SQL without running it.
    fn translate<E>(&self) -> Result<(ExecutionPlan, ResultProjector), Error<E>> {
        let (base_sql, query, projector) = match &self.origin {
            Origin::Descriptor { base_sql, query } => {
                let projector = match query.inline_count() {
                    InlineCount::AllPages => ResultProjector::Count,
                    InlineCount::None => ResultProjector::Rows,
                };
                (base_sql.as_str(), query.clone(), projector)
            }
            Origin::Pipeline(pipeline) => {
                let translated = pipeline::translate(pipeline, self.schema)?;
                let Source::Sql { base_sql } = &pipeline.source else {
                    return Err(Error::NotSqlSource);
                };
                (base_sql.as_str(), translated.query, translated.projector)
            }
        };
        let plan = translation::query::translate(self.settings, base_sql, &query)?;
        Ok((plan, projector))
    }

    /// Translate, execute and project. Nothing reaches the executor unless translation
    /// succeeds, and the executor is called exactly once otherwise.
    pub async fn execute(&self) -> Result<QueryResult<X::Row>, Error<X::Error>>
    where
        X: SqlExecutor,
    {
        enter(QueryState::Unmaterialized);

        enter(QueryState::Translating);
        let (plan, projector) = self.translate::<X::Error>()?;
        let shape = expected_shape(projector);
        let sql = plan.query_sql(shape);

        enter(QueryState::Executing);
        tracing::info!(
            generated_sql = %sql.sql,
            params = ?&sql.params,
            shape = ?shape,
        );
        let output = self
            .executor
            .execute(&sql, shape)
            .instrument(info_span!("Execute query"))
            .await
            .map_err(Error::Executor)?;

        let result = match output {
            Output::Rows(rows) if shape == ExpectedShape::Rows => projector.project_rows(rows),
            Output::Count(count) if shape == ExpectedShape::Count => {
                projector.project_count(count)
            }
            output => {
                return Err(Error::UnexpectedShape {
                    expected: shape,
                    found: output.shape(),
                })
            }
        };
        enter(QueryState::Materialized);
        Ok(result)
    }
}

fn enter(state: QueryState) {
    tracing::debug!(%state, "deferred query");
}

fn expected_shape(projector: ResultProjector) -> ExpectedShape {
    if projector.expects_count() {
        ExpectedShape::Count
    } else {
        ExpectedShape::Rows
    }
}

/// The pipeline producing the same rows as `query`.
fn descriptor_pipeline(base_sql: &str, query: &QueryDescriptor) -> Pipeline {
    let mut pipeline = Pipeline::from_sql(base_sql);
    if let Some(filter) = query.filter() {
        pipeline = pipeline.filter(filter.clone());
    }
    for (index, element) in query.order_by().iter().enumerate() {
        let property = element.property.clone();
        let direction = element.direction;
        pipeline = pipeline.then(if index == 0 {
            Operation::OrderBy {
                property,
                direction,
            }
        } else {
            Operation::ThenBy {
                property,
                direction,
            }
        });
    }
    if let Some(skip) = query.skip().filter(|skip| *skip > 0) {
        pipeline = pipeline.skip(skip);
    }
    if let Some(top) = query.top() {
        pipeline = pipeline.take(top);
    }
    pipeline
}

fn describe_projector(projector: ResultProjector) -> &'static str {
    match projector {
        ResultProjector::Rows => "rows",
        ResultProjector::Count => "a count",
        ResultProjector::First => "the first row",
        ResultProjector::Any => "whether any row exists",
    }
}

/// The SQL this query would run, headed by a comment naming what it materializes as and
/// the value of every parameter.
impl<X: ?Sized> fmt::Display for DeferredQuery<'_, X> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.translate::<Infallible>() {
            Ok((plan, projector)) => {
                let sql = plan.query_sql(expected_shape(projector));
                writeln!(f, "/*")?;
                writeln!(f, " * Materialize as {}", describe_projector(projector))?;
                for param in &sql.params {
                    writeln!(f, " * {} = {}", param.name, param.value)?;
                }
                writeln!(f, " */")?;
                write!(f, "{}", sql.sql)
            }
            Err(error) => write!(f, "Query could not be translated to SQL: {error}"),
        }
    }
}
