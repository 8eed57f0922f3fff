//! Apply query descriptors directly to in-memory sequences.

mod binding;
mod evaluate;

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::sync::Arc;

use thiserror::Error;

use query_engine_ir::ir::ast::{Direction, QueryDescriptor, Value};
use query_engine_ir::ir::pipeline::{self, Pipeline, PipelineError, QueryResult};

pub use binding::{Accessor, RecordBinding};
use evaluate::Node;

/// Errors from applying a query to records.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("Property '{property}' is not bound on record shape '{shape}'.")]
    UnknownProperty { property: String, shape: String },
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

/// A source of records that can be enumerated any number of times, each enumeration
/// starting afresh.
pub trait Sequence: Clone {
    type Item;
    type Iter: Iterator<Item = Self::Item>;

    /// Start a new enumeration.
    fn enumerate(&self) -> Self::Iter;
}

impl<S: IntoIterator + Clone> Sequence for S {
    type Item = S::Item;
    type Iter = S::IntoIter;

    fn enumerate(&self) -> Self::Iter {
        self.clone().into_iter()
    }
}

/// A query compiled against a record binding.
struct Plan<R> {
    filter: Option<Node<R>>,
    order_by: Vec<(Accessor<R>, Direction)>,
    skip: usize,
    top: Option<usize>,
}

impl<R> Plan<R> {
    fn compile(binding: &RecordBinding<R>, query: &QueryDescriptor) -> Result<Self, Error> {
        let filter = query
            .filter()
            .map(|filter| evaluate::compile(filter, binding))
            .transpose()?;
        let order_by = query
            .order_by()
            .iter()
            .map(|element| {
                evaluate::resolve(&element.property, binding)
                    .map(|accessor| (accessor, element.direction))
            })
            .collect::<Result<_, _>>()?;
        Ok(Plan {
            filter,
            order_by,
            skip: query
                .skip()
                .map_or(0, |skip| usize::try_from(skip).unwrap_or(usize::MAX)),
            top: query
                .top()
                .map(|top| usize::try_from(top).unwrap_or(usize::MAX)),
        })
    }

    fn matches(&self, record: &R) -> bool {
        self.filter
            .as_ref()
            .map_or(true, |filter| evaluate::matches(filter, record))
    }

    /// Stable sort on the ordering keys. Nulls come first in ascending order.
    fn sort<T: Borrow<R>>(&self, items: Vec<T>) -> Vec<T> {
        let mut keyed: Vec<(Vec<Value>, T)> = items
            .into_iter()
            .map(|item| {
                let keys = self
                    .order_by
                    .iter()
                    .map(|(accessor, _)| accessor(<T as Borrow<R>>::borrow(&item)))
                    .collect();
                (keys, item)
            })
            .collect();
        keyed.sort_by(|(left, _), (right, _)| self.compare_keys(left, right));
        keyed.into_iter().map(|(_, item)| item).collect()
    }

    fn compare_keys(&self, left: &[Value], right: &[Value]) -> Ordering {
        for ((left, right), (_, direction)) in left.iter().zip(right).zip(&self.order_by) {
            let ordering = left.compare(right).unwrap_or(Ordering::Equal);
            let ordering = match direction {
                Direction::Asc => ordering,
                Direction::Desc => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}

/// A lazily filtered, ordered and paged view of a sequence.
///
/// Nothing is evaluated until [`Filtered::iter`] is enumerated, and every call to it
/// runs the whole query again from the start of the source.
pub struct Filtered<R, S> {
    source: S,
    plan: Arc<Plan<R>>,
}

impl<R, S> Filtered<R, S>
where
    S: Sequence,
    S::Item: Borrow<R>,
{
    pub fn iter(&self) -> Box<dyn Iterator<Item = S::Item> + '_> {
        let plan = &*self.plan;
        let matching = self
            .source
            .enumerate()
            .filter(move |item| plan.matches(<S::Item as Borrow<R>>::borrow(item)));

        if plan.order_by.is_empty() {
            return Box::new(page(matching, plan));
        }

        // sorting needs every match, so wait for the first pull before collecting them.
        let mut pending = Some(matching);
        let mut sorted: Option<std::vec::IntoIter<S::Item>> = None;
        let ordered = std::iter::from_fn(move || {
            if let Some(matching) = pending.take() {
                sorted = Some(plan.sort(matching.collect()).into_iter());
            }
            sorted.as_mut()?.next()
        });
        Box::new(page(ordered, plan))
    }
}

fn page<I: Iterator, R>(items: I, plan: &Plan<R>) -> impl Iterator<Item = I::Item> {
    items
        .skip(plan.skip)
        .take(plan.top.unwrap_or(usize::MAX))
}

/// Apply `query` to `source`.
///
/// Returns the result and the inline count source: the same filtered and ordered records
/// with paging ignored.
pub fn apply<R, S>(
    binding: &RecordBinding<R>,
    source: S,
    query: &QueryDescriptor,
) -> Result<(Filtered<R, S>, Filtered<R, S>), Error>
where
    S: Sequence,
    S::Item: Borrow<R>,
{
    let result = Filtered {
        source: source.clone(),
        plan: Arc::new(Plan::compile(binding, query)?),
    };
    let count_source = Filtered {
        source,
        plan: Arc::new(Plan::compile(binding, &query.unpaged())?),
    };
    Ok((result, count_source))
}

/// Translate `pipeline` and run it over `source`, projecting the result the pipeline
/// asked for.
pub fn run_pipeline<R, S>(
    binding: &RecordBinding<R>,
    source: S,
    pipeline: &Pipeline,
) -> Result<QueryResult<S::Item>, Error>
where
    S: Sequence,
    S::Item: Borrow<R>,
{
    let translated = pipeline::translate(pipeline, binding)?;
    let (result, count_source) = apply(binding, source, &translated.query)?;
    Ok(if translated.projector.expects_count() {
        translated
            .projector
            .project_count(count_source.iter().count() as u64)
    } else {
        translated.projector.project_rows(result.iter().collect())
    })
}
