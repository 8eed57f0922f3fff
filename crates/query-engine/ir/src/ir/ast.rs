//! Type definitions of the query IR.

use std::cmp::Ordering;
use std::fmt;

use chrono::NaiveDateTime;
use enum_iterator::Sequence;
use serde::{Deserialize, Serialize};

pub use query_engine_metadata::metadata::ScalarType;

/// A literal in a filter, or a property value read from a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    DateTime(NaiveDateTime),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The scalar type of this value. `None` for null.
    pub fn scalar_type(&self) -> Option<ScalarType> {
        match self {
            Value::Null => None,
            Value::Bool(_) => Some(ScalarType::Boolean),
            Value::Int(_) => Some(ScalarType::Integer),
            Value::Float(_) => Some(ScalarType::Double),
            Value::String(_) => Some(ScalarType::String),
            Value::DateTime(_) => Some(ScalarType::DateTime),
        }
    }

    /// Total-ish ordering used for sorting and comparisons.
    ///
    /// Null sorts before every other value. Integers and doubles compare numerically.
    /// Strings compare ordinally. Values of unrelated types are incomparable.
    #[allow(clippy::cast_precision_loss)]
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Null, Value::Null) => Some(Ordering::Equal),
            (Value::Null, _) => Some(Ordering::Less),
            (_, Value::Null) => Some(Ordering::Greater),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Int(a), Value::Float(b)) => (*a as f64).partial_cmp(b),
            (Value::Float(a), Value::Int(b)) => a.partial_cmp(&(*b as f64)),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::DateTime(a), Value::DateTime(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

/// Values print as filter literals, so a printed value parses back to itself.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x:?}"),
            Value::String(s) => write!(f, "'{}'", s.replace('\'', "''")),
            Value::DateTime(dt) => write!(f, "datetime'{}'", dt.format("%Y-%m-%dT%H:%M:%S%.f")),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i.into())
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(dt: NaiveDateTime) -> Self {
        Value::DateTime(dt)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

/// A binary operator. Comparison, logical and arithmetic operators share one enum
/// because they share one position in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BinaryOperator {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl BinaryOperator {
    /// The keyword spelling of the operator in the filter grammar.
    pub fn keyword(self) -> &'static str {
        match self {
            BinaryOperator::Eq => "eq",
            BinaryOperator::Ne => "ne",
            BinaryOperator::Lt => "lt",
            BinaryOperator::Le => "le",
            BinaryOperator::Gt => "gt",
            BinaryOperator::Ge => "ge",
            BinaryOperator::And => "and",
            BinaryOperator::Or => "or",
            BinaryOperator::Add => "add",
            BinaryOperator::Sub => "sub",
            BinaryOperator::Mul => "mul",
            BinaryOperator::Div => "div",
            BinaryOperator::Mod => "mod",
        }
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOperator::Eq
                | BinaryOperator::Ne
                | BinaryOperator::Lt
                | BinaryOperator::Le
                | BinaryOperator::Gt
                | BinaryOperator::Ge
        )
    }

    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOperator::And | BinaryOperator::Or)
    }

    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            BinaryOperator::Add
                | BinaryOperator::Sub
                | BinaryOperator::Mul
                | BinaryOperator::Div
                | BinaryOperator::Mod
        )
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.keyword())
    }
}

/// The functions a filter may call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Sequence)]
#[serde(rename_all = "lowercase")]
pub enum Function {
    StartsWith,
    EndsWith,
    SubstringOf,
    Length,
    ToLower,
    ToUpper,
    Trim,
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
    Round,
    Floor,
    Ceiling,
}

impl Function {
    pub fn name(self) -> &'static str {
        match self {
            Function::StartsWith => "startswith",
            Function::EndsWith => "endswith",
            Function::SubstringOf => "substringof",
            Function::Length => "length",
            Function::ToLower => "tolower",
            Function::ToUpper => "toupper",
            Function::Trim => "trim",
            Function::Year => "year",
            Function::Month => "month",
            Function::Day => "day",
            Function::Hour => "hour",
            Function::Minute => "minute",
            Function::Second => "second",
            Function::Round => "round",
            Function::Floor => "floor",
            Function::Ceiling => "ceiling",
        }
    }

    /// Look a function up by its name in the filter grammar. Names are case-sensitive.
    pub fn from_name(name: &str) -> Option<Function> {
        enum_iterator::all::<Function>().find(|function| function.name() == name)
    }

    /// The number of arguments the function takes.
    pub fn arity(self) -> usize {
        match self {
            Function::StartsWith | Function::EndsWith | Function::SubstringOf => 2,
            _ => 1,
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A filter expression tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Expression {
    Literal(Value),
    /// A reference to a property of the record being filtered.
    Property(String),
    Not(Box<Expression>),
    Binary {
        left: Box<Expression>,
        operator: BinaryOperator,
        right: Box<Expression>,
    },
    Call {
        function: Function,
        args: Vec<Expression>,
    },
}

impl Expression {
    /// Is this a `null` literal.
    pub fn is_null_literal(&self) -> bool {
        matches!(self, Expression::Literal(Value::Null))
    }
}

/// Expressions print in the filter grammar, fully parenthesized.
impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expression::Literal(value) => write!(f, "{value}"),
            Expression::Property(name) => write!(f, "{name}"),
            Expression::Not(expression) => write!(f, "not {expression}"),
            Expression::Binary {
                left,
                operator,
                right,
            } => write!(f, "({left} {operator} {right})"),
            Expression::Call { function, args } => {
                write!(f, "{function}(")?;
                for (index, arg) in args.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
        }
    }
}

/// A direction for a single ordering element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

/// A single element of an ordering list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderByElement {
    pub property: String,
    pub direction: Direction,
}

/// Should the total number of matches be reported alongside a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InlineCount {
    #[default]
    None,
    AllPages,
}

/// The canonical description of a query: filter, ordering, paging and inline count.
///
/// Every field is independently optional and absence means "no constraint".
/// Descriptors are never modified; [`QueryDescriptor::update`] derives a new one.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryDescriptor {
    filter: Option<Expression>,
    order_by: Vec<OrderByElement>,
    skip: Option<u64>,
    top: Option<u64>,
    inline_count: InlineCount,
}

impl QueryDescriptor {
    pub fn new(
        filter: Option<Expression>,
        order_by: Vec<OrderByElement>,
        skip: Option<u64>,
        top: Option<u64>,
        inline_count: InlineCount,
    ) -> Self {
        QueryDescriptor {
            filter,
            order_by,
            skip,
            top,
            inline_count,
        }
    }

    pub fn filter(&self) -> Option<&Expression> {
        self.filter.as_ref()
    }

    pub fn order_by(&self) -> &[OrderByElement] {
        &self.order_by
    }

    pub fn skip(&self) -> Option<u64> {
        self.skip
    }

    pub fn top(&self) -> Option<u64> {
        self.top
    }

    pub fn inline_count(&self) -> InlineCount {
        self.inline_count
    }

    /// Does this descriptor drop or truncate any matching rows.
    pub fn is_paged(&self) -> bool {
        self.skip.is_some_and(|skip| skip > 0) || self.top.is_some()
    }

    /// Derive a new descriptor with the fields set in `update` replaced.
    pub fn update(&self, update: Update) -> QueryDescriptor {
        let Update {
            filter,
            order_by,
            skip,
            top,
            inline_count,
        } = update;
        QueryDescriptor {
            filter: filter.unwrap_or_else(|| self.filter.clone()),
            order_by: order_by.unwrap_or_else(|| self.order_by.clone()),
            skip: skip.unwrap_or(self.skip),
            top: top.unwrap_or(self.top),
            inline_count: inline_count.unwrap_or(self.inline_count),
        }
    }

    /// The same filter and ordering with paging removed. This is what inline counts count.
    pub fn unpaged(&self) -> QueryDescriptor {
        self.update(Update::new().skip(Some(0)).top(None))
    }
}

/// A set of field overrides for [`QueryDescriptor::update`]. Fields left unset are
/// copied from the original descriptor.
#[derive(Debug, Clone, Default)]
pub struct Update {
    filter: Option<Option<Expression>>,
    order_by: Option<Vec<OrderByElement>>,
    skip: Option<Option<u64>>,
    top: Option<Option<u64>>,
    inline_count: Option<InlineCount>,
}

impl Update {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn filter(mut self, filter: Option<Expression>) -> Self {
        self.filter = Some(filter);
        self
    }

    #[must_use]
    pub fn order_by(mut self, order_by: Vec<OrderByElement>) -> Self {
        self.order_by = Some(order_by);
        self
    }

    #[must_use]
    pub fn skip(mut self, skip: Option<u64>) -> Self {
        self.skip = Some(skip);
        self
    }

    #[must_use]
    pub fn top(mut self, top: Option<u64>) -> Self {
        self.top = Some(top);
        self
    }

    #[must_use]
    pub fn inline_count(mut self, inline_count: InlineCount) -> Self {
        self.inline_count = Some(inline_count);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::helpers;

    fn base() -> QueryDescriptor {
        QueryDescriptor::new(
            Some(helpers::eq(helpers::property("Id"), helpers::literal(1))),
            vec![helpers::descending("Id")],
            Some(1),
            Some(2),
            InlineCount::AllPages,
        )
    }

    #[test]
    fn update_replaces_only_the_given_fields() {
        let original = base();
        let updated = original.update(Update::new().top(None).skip(Some(0)));

        assert_eq!(updated.filter(), original.filter());
        assert_eq!(updated.order_by(), original.order_by());
        assert_eq!(updated.inline_count(), InlineCount::AllPages);
        assert_eq!(updated.skip(), Some(0));
        assert_eq!(updated.top(), None);

        // the original is untouched
        assert_eq!(original.skip(), Some(1));
        assert_eq!(original.top(), Some(2));
    }

    #[test]
    fn independent_updates_do_not_affect_each_other() {
        let original = base();
        let first = original.update(Update::new().top(Some(10)));
        let second = original.update(Update::new().filter(None).order_by(vec![]));

        assert_eq!(first.top(), Some(10));
        assert!(first.filter().is_some());
        assert_eq!(first.order_by().len(), 1);

        assert_eq!(second.top(), Some(2));
        assert!(second.filter().is_none());
        assert!(second.order_by().is_empty());

        assert_eq!(original, base());
    }

    #[test]
    fn unpaged_descriptor_is_not_paged() {
        let original = base();
        assert!(original.is_paged());
        assert!(!original.unpaged().is_paged());
        assert!(!QueryDescriptor::default().is_paged());
    }

    #[test]
    fn values_compare_across_numeric_types_and_nulls_sort_first() {
        assert_eq!(Value::Int(2).compare(&Value::Float(1.5)), Some(Ordering::Greater));
        assert_eq!(Value::Null.compare(&Value::Int(i64::MIN)), Some(Ordering::Less));
        assert_eq!(
            Value::from("ABA").compare(&Value::from("ABC")),
            Some(Ordering::Less)
        );
        assert_eq!(Value::from("A").compare(&Value::Int(1)), None);
    }

    #[test]
    fn expressions_print_in_the_filter_grammar() {
        let expression = helpers::and(
            helpers::call(
                Function::StartsWith,
                vec![helpers::property("Text"), helpers::literal("O'Neil")],
            ),
            helpers::not(helpers::eq(helpers::property("Value"), helpers::literal(2.0))),
        );
        assert_eq!(
            expression.to_string(),
            "(startswith(Text, 'O''Neil') and not (Value eq 2.0))"
        );
    }

    #[test]
    fn every_function_is_found_by_its_name() {
        for function in enum_iterator::all::<Function>() {
            assert_eq!(Function::from_name(function.name()), Some(function));
        }
        assert_eq!(enum_iterator::cardinality::<Function>(), 16);
        assert_eq!(Function::from_name("ToLower"), None);
    }
}
