use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};

use query_engine_execution::memory::{self, RecordBinding};
use query_engine_execution::query::{Output, SqlExecutor};
use query_engine_ir::ir::ast::Value;
use query_engine_metadata::metadata::{Nullable, PropertyInfo, ScalarType};
use query_engine_sql::sql::execution_plan::ExpectedShape;
use query_engine_sql::sql::string::SQL;

/// The properties of shape `A`.
#[derive(Debug, Clone, PartialEq)]
pub struct A {
    pub id: i64,
    pub text: Option<String>,
    pub date: Option<NaiveDateTime>,
}

/// Records of shape `A` or of shape `B`, which derives from `A`.
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    A(A),
    B { base: A, b_id: i64 },
}

impl Item {
    pub fn base(&self) -> &A {
        match self {
            Item::A(a) | Item::B { base: a, .. } => a,
        }
    }
}

/// Shape `A`, bound on both kinds of item.
pub fn binding() -> RecordBinding<Item> {
    RecordBinding::new("A")
        .with_property(
            "Id",
            PropertyInfo::new(ScalarType::Integer, Nullable::NonNullable),
            |item: &Item| item.base().id.into(),
        )
        .with_property(
            "Text",
            PropertyInfo::new(ScalarType::String, Nullable::Nullable),
            |item: &Item| item.base().text.clone().into(),
        )
        .with_property(
            "Date",
            PropertyInfo::new(ScalarType::DateTime, Nullable::Nullable),
            |item: &Item| Value::from(item.base().date),
        )
}

fn date(year: i32, month: u32, day: u32) -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(year, month, day).and_then(|date| date.and_hms_opt(0, 0, 0))
}

fn a(id: i64, text: &str, date: Option<NaiveDateTime>) -> A {
    A {
        id,
        text: Some(text.to_string()),
        date,
    }
}

pub fn items() -> Vec<Item> {
    vec![
        Item::A(a(1, "ABA", None)),
        Item::A(a(2, "ABC", None)),
        Item::A(a(3, "Banana", None)),
        Item::A(a(4, "", date(2013, 12, 11))),
        Item::B {
            base: a(5, "BBB", date(2010, 9, 8)),
            b_id: 1,
        },
    ]
}

/// [`items`] plus a record with no text.
pub fn items_with_absent_text() -> Vec<Item> {
    let mut items = items();
    items.push(Item::A(A {
        id: 6,
        text: None,
        date: None,
    }));
    items
}

/// Parse the query parameters, apply them to [`items`] and return the matching ids.
///
/// Also checks that the inline count source equals the result of the same query with
/// paging removed.
pub fn run(params: &[(&str, &str)]) -> Vec<i64> {
    run_on(&items(), params)
}

/// Like [`run`], over the given records.
pub fn run_on(items: &[Item], params: &[(&str, &str)]) -> Vec<i64> {
    let binding = binding();
    let query =
        query_engine_parser::parser::parse(&binding.schema(), params.iter().copied()).unwrap();

    let (result, count_source) = memory::apply(&binding, items.to_vec(), &query).unwrap();
    let (unpaged, _) = memory::apply(&binding, items.to_vec(), &query.unpaged()).unwrap();
    similar_asserts::assert_eq!(
        count_source.iter().collect::<Vec<_>>(),
        unpaged.iter().collect::<Vec<_>>()
    );

    result.iter().map(|item| item.base().id).collect()
}

#[derive(Debug, thiserror::Error)]
#[error("the database is unavailable")]
pub struct Unavailable;

/// One call made to a [`FakeExecutor`].
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub sql: String,
    pub params: Vec<String>,
    pub shape: ExpectedShape,
}

/// What a [`FakeExecutor`] answers with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behaviour {
    Answer,
    /// Answer every request with rows.
    AlwaysRows,
    Fail,
}

/// An executor that records every call and answers with fixed results.
pub struct FakeExecutor {
    pub rows: Vec<i64>,
    pub count: u64,
    pub behaviour: Behaviour,
    pub calls: Mutex<Vec<Call>>,
}

impl FakeExecutor {
    pub fn new(rows: Vec<i64>, count: u64) -> Self {
        FakeExecutor {
            rows,
            count,
            behaviour: Behaviour::Answer,
            calls: Mutex::new(vec![]),
        }
    }

    pub fn with_behaviour(mut self, behaviour: Behaviour) -> Self {
        self.behaviour = behaviour;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SqlExecutor for FakeExecutor {
    type Row = i64;
    type Error = Unavailable;

    async fn execute(&self, sql: &SQL, shape: ExpectedShape) -> Result<Output<i64>, Unavailable> {
        self.calls.lock().unwrap().push(Call {
            sql: sql.sql.clone(),
            params: sql
                .params
                .iter()
                .map(|param| format!("{} = {}", param.name, param.value))
                .collect(),
            shape,
        });
        match (self.behaviour, shape) {
            (Behaviour::Fail, _) => Err(Unavailable),
            (Behaviour::AlwaysRows, _) | (Behaviour::Answer, ExpectedShape::Rows) => {
                Ok(Output::Rows(self.rows.clone()))
            }
            (Behaviour::Answer, ExpectedShape::Count) => Ok(Output::Count(self.count)),
        }
    }
}
