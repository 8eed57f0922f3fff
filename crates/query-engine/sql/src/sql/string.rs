//! Type definitions of a low-level SQL string representation.

use std::fmt;

use chrono::NaiveDateTime;
use serde::Serialize;

use super::dialect::{PlaceholderSyntax, SqlDialectProfile};

/// SQL text with its parameters, in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct SQL {
    pub sql: String,
    pub params: Vec<Param>,
    /// for internal use and tests only
    pub param_index: u64,
    dialect: SqlDialectProfile,
}

/// A parameter of a parameterized query. Names are `p1`, `p2`, ... in placeholder order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Param {
    pub name: String,
    pub value: ParamValue,
}

/// The value bound to a parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    DateTime(NaiveDateTime),
}

/// Parameter values print like SQL literals, for descriptions and logs.
impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ParamValue::Null => write!(f, "NULL"),
            ParamValue::Bool(b) => write!(f, "{b}"),
            ParamValue::Int(i) => write!(f, "{i}"),
            ParamValue::Float(x) => write!(f, "{x:?}"),
            ParamValue::String(s) => write!(f, "'{}'", s.replace('\'', "''")),
            ParamValue::DateTime(dt) => write!(f, "'{}'", dt.format("%Y-%m-%dT%H:%M:%S%.f")),
        }
    }
}

impl SQL {
    pub fn new(dialect: &SqlDialectProfile) -> SQL {
        SQL {
            sql: String::new(),
            params: vec![],
            param_index: 0,
            dialect: dialect.clone(),
        }
    }

    pub fn dialect(&self) -> &SqlDialectProfile {
        &self.dialect
    }

    pub fn append_syntax(&mut self, sql: &str) {
        self.sql.push_str(sql);
    }

    /// Append a quoted identifier, escaping the closing quote character by doubling it.
    pub fn append_identifier(&mut self, name: &str) {
        let quoting = self.dialect.identifier_quoting;
        let close = quoting.close();
        self.sql.push(quoting.open());
        for c in name.chars() {
            if c == close {
                self.sql.push(close);
            }
            self.sql.push(c);
        }
        self.sql.push(close);
    }

    /// Append a placeholder and record the value bound to it.
    pub fn append_param(&mut self, value: ParamValue) {
        self.param_index += 1;
        let name = format!("p{}", self.param_index);
        match self.dialect.placeholder {
            PlaceholderSyntax::AtNamed => {
                self.sql.push('@');
                self.sql.push_str(&name);
            }
            PlaceholderSyntax::DollarNumbered => {
                self.sql.push_str(&format!("${}", self.param_index));
            }
            PlaceholderSyntax::QuestionMark => self.sql.push('?'),
        }
        self.params.push(Param { name, value });
    }
}
