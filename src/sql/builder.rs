//! Provenance-tracking SQL text builder.
//!
//! Text enters a statement only as keywords and punctuation (`&'static str`, never runtime
//! data), identifiers (escaped through [`quote_ident`]), literals (value-quoted through
//! [`SqlLiteral::render`]) or column types that passed [`SqlType::parse`]. There is no way to
//! push a raw runtime string.

use crate::config::is_valid_sql_type;
use crate::error::ConfigError;
use serde_json::Value;
use std::fmt;

/// Quote identifier for PostgreSQL. The only escaping function for names reaching SQL text.
pub fn quote_ident(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// A SQL identifier. Holds the raw name; renders escaped.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ident(String);

impl Ident {
    pub fn new(raw: impl Into<String>) -> Self {
        Ident(raw.into())
    }

    /// Raw name for lookups (row keys, catalog matching). Must not be spliced into SQL.
    pub fn raw(&self) -> &str {
        &self.0
    }

    pub fn escaped(&self) -> String {
        quote_ident(&self.0)
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.escaped())
    }
}

/// A literal value embedded inline with value quoting.
#[derive(Clone, Debug, PartialEq)]
pub enum SqlLiteral {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl SqlLiteral {
    pub fn from_json(v: &Value) -> Self {
        match v {
            Value::Null => SqlLiteral::Null,
            Value::Bool(b) => SqlLiteral::Bool(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    SqlLiteral::Int(i)
                } else if let Some(f) = n.as_f64() {
                    SqlLiteral::Float(f)
                } else {
                    SqlLiteral::Text(n.to_string())
                }
            }
            Value::String(s) => SqlLiteral::Text(s.clone()),
            Value::Array(_) | Value::Object(_) => SqlLiteral::Text(v.to_string()),
        }
    }

    pub fn render(&self) -> String {
        match self {
            SqlLiteral::Null => "NULL".to_string(),
            SqlLiteral::Bool(true) => "true".to_string(),
            SqlLiteral::Bool(false) => "false".to_string(),
            SqlLiteral::Int(i) => i.to_string(),
            SqlLiteral::Float(f) if f.is_finite() => f.to_string(),
            SqlLiteral::Float(f) if f.is_nan() => "'NaN'".to_string(),
            SqlLiteral::Float(f) if *f > 0.0 => "'Infinity'".to_string(),
            SqlLiteral::Float(_) => "'-Infinity'".to_string(),
            SqlLiteral::Text(s) => format!("'{}'", s.replace('\0', "").replace('\'', "''")),
        }
    }
}

impl From<&str> for SqlLiteral {
    fn from(s: &str) -> Self {
        SqlLiteral::Text(s.to_string())
    }
}

impl From<i64> for SqlLiteral {
    fn from(n: i64) -> Self {
        SqlLiteral::Int(n)
    }
}

/// A column type that passed the type grammar check. The only way type text reaches DDL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SqlType(String);

impl SqlType {
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        if is_valid_sql_type(s) {
            Ok(SqlType(s.trim().to_string()))
        } else {
            Err(ConfigError::InvalidIdentifier {
                kind: "column type",
                value: s.to_string(),
            })
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Statement text under construction.
#[derive(Clone, Debug, Default)]
pub struct SqlText {
    sql: String,
}

impl SqlText {
    pub fn new() -> Self {
        SqlText { sql: String::new() }
    }

    /// Keywords, operators and punctuation.
    pub fn kw(&mut self, s: &'static str) -> &mut Self {
        self.sql.push_str(s);
        self
    }

    pub fn ident(&mut self, id: &Ident) -> &mut Self {
        self.sql.push_str(&id.escaped());
        self
    }

    /// `"table"."column"`
    pub fn qualified(&mut self, table: &Ident, column: &Ident) -> &mut Self {
        self.ident(table).kw(".").ident(column)
    }

    pub fn sql_type(&mut self, ty: &SqlType) -> &mut Self {
        self.sql.push_str(&ty.0);
        self
    }

    pub fn literal(&mut self, lit: &SqlLiteral) -> &mut Self {
        self.sql.push_str(&lit.render());
        self
    }

    /// Positional bind placeholder (`$n`).
    pub fn param(&mut self, n: usize) -> &mut Self {
        self.sql.push('$');
        self.sql.push_str(&n.to_string());
        self
    }

    /// Append text produced by another builder; it carries the same guarantees.
    pub fn append(&mut self, other: &SqlText) -> &mut Self {
        self.sql.push_str(&other.sql);
        self
    }

    /// Append several builders separated by a keyword.
    pub fn join<'a, I>(&mut self, parts: I, sep: &'static str) -> &mut Self
    where
        I: IntoIterator<Item = &'a SqlText>,
    {
        for (i, p) in parts.into_iter().enumerate() {
            if i > 0 {
                self.kw(sep);
            }
            self.append(p);
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.sql
    }

    pub fn finish(self) -> String {
        self.sql
    }
}
