//! Column specifications: semantic type, nullability, and default.

use crate::error::CoreError;
use crate::names::ColumnName;
use crate::serde_helpers::{default_true, is_false};
use crate::sql_utils::{normalize_declared_type, quote_literal};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Semantic column type, rendered to a SQLite declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ColumnType {
    /// Whole numbers
    Integer,
    /// Fixed-point number with `precision` total digits and `scale` after the point
    Decimal { precision: u8, scale: u8 },
    /// Free text
    Text,
    /// Calendar date
    Date,
    /// Date and time of day
    Timestamp,
}

impl ColumnType {
    /// The declared type written into `CREATE TABLE` / `ADD COLUMN`.
    pub fn sql(&self) -> String {
        match self {
            ColumnType::Integer => "INTEGER".to_string(),
            ColumnType::Decimal { precision, scale } => format!("DECIMAL({precision},{scale})"),
            ColumnType::Text => "TEXT".to_string(),
            ColumnType::Date => "DATE".to_string(),
            ColumnType::Timestamp => "TIMESTAMP".to_string(),
        }
    }

    /// Whether a live declared type is this type.
    pub fn matches_declared(&self, declared: &str) -> bool {
        normalize_declared_type(declared) == self.sql()
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Integer => write!(f, "integer"),
            ColumnType::Decimal { precision, scale } => write!(f, "decimal({precision},{scale})"),
            ColumnType::Text => write!(f, "text"),
            ColumnType::Date => write!(f, "date"),
            ColumnType::Timestamp => write!(f, "timestamp"),
        }
    }
}

impl FromStr for ColumnType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize_declared_type(s);
        let invalid = |reason: &str| CoreError::ConfigInvalid {
            message: format!("column type '{s}': {reason}"),
        };
        match normalized.as_str() {
            "INTEGER" | "INT" => return Ok(ColumnType::Integer),
            "TEXT" => return Ok(ColumnType::Text),
            "DATE" => return Ok(ColumnType::Date),
            "TIMESTAMP" | "DATETIME" => return Ok(ColumnType::Timestamp),
            _ => {}
        }
        let args = normalized
            .strip_prefix("DECIMAL(")
            .or_else(|| normalized.strip_prefix("NUMERIC("))
            .and_then(|rest| rest.strip_suffix(')'))
            .ok_or_else(|| {
                invalid("expected integer, decimal(p,s), text, date, or timestamp")
            })?;
        let (p, s) = args
            .split_once(',')
            .ok_or_else(|| invalid("decimal needs both precision and scale"))?;
        let precision: u8 = p.parse().map_err(|_| invalid("precision is not a number"))?;
        let scale: u8 = s.parse().map_err(|_| invalid("scale is not a number"))?;
        if precision == 0 || scale > precision {
            return Err(invalid("scale must not exceed a non-zero precision"));
        }
        Ok(ColumnType::Decimal { precision, scale })
    }
}

impl TryFrom<String> for ColumnType {
    type Error = CoreError;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ColumnType> for String {
    fn from(t: ColumnType) -> Self {
        t.to_string()
    }
}

/// A constant default value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    Integer(i64),
    Real(f64),
    Text(String),
}

impl Literal {
    /// Render as SQL literal text.
    pub fn sql(&self) -> String {
        match self {
            Literal::Integer(n) => n.to_string(),
            Literal::Real(x) => x.to_string(),
            Literal::Text(s) => quote_literal(s),
        }
    }
}

/// Column default: a literal, or the insertion timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnDefault {
    Literal(Literal),
    CurrentTimestamp,
}

impl ColumnDefault {
    /// Render the expression following `DEFAULT`.
    pub fn sql(&self) -> String {
        match self {
            ColumnDefault::Literal(lit) => lit.sql(),
            ColumnDefault::CurrentTimestamp => "CURRENT_TIMESTAMP".to_string(),
        }
    }
}

/// Desired definition of one column.
///
/// Identity is `name`. A spec is immutable once part of an applied plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ColumnSpec {
    /// Column name, unique within the table
    pub name: ColumnName,

    /// Semantic type
    #[serde(rename = "type")]
    pub column_type: ColumnType,

    /// Whether NULL is allowed (default: true)
    #[serde(default = "default_true")]
    pub nullable: bool,

    /// Default value applied when a row omits this column
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<ColumnDefault>,

    /// Source column whose data a rebuild copies into this column
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub renamed_from: Option<ColumnName>,

    /// Part of the table's primary key
    #[serde(default, skip_serializing_if = "is_false")]
    pub primary_key: bool,

    /// Rowid alias that never reuses keys (requires a sole INTEGER primary key)
    #[serde(default, skip_serializing_if = "is_false")]
    pub autoincrement: bool,
}

impl ColumnSpec {
    /// Create a nullable column with no default.
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: ColumnName::new(name),
            column_type,
            nullable: true,
            default: None,
            renamed_from: None,
            primary_key: false,
            autoincrement: false,
        }
    }

    /// Make the column part of the table's primary key.
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Make the column an `AUTOINCREMENT` primary key.
    pub fn autoincrement(mut self) -> Self {
        self.primary_key = true;
        self.autoincrement = true;
        self
    }

    /// Mark the column `NOT NULL`.
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Set the default value.
    pub fn with_default(mut self, default: ColumnDefault) -> Self {
        self.default = Some(default);
        self
    }

    /// Copy data from `source` when the table is rebuilt.
    pub fn renamed_from(mut self, source: impl Into<String>) -> Self {
        self.renamed_from = Some(ColumnName::new(source));
        self
    }

    /// Column definition as it appears in `ADD COLUMN`.
    pub fn definition_sql(&self) -> String {
        self.render_definition(false)
    }

    /// Column definition inside `CREATE TABLE`.
    ///
    /// `inline_key` is set when this column is the table's only key column;
    /// composite keys are rendered as a table constraint instead.
    pub fn table_definition_sql(&self, inline_key: bool) -> String {
        self.render_definition(inline_key && self.primary_key)
    }

    fn render_definition(&self, inline_key: bool) -> String {
        let mut sql = format!("{} {}", self.name.quoted(), self.column_type.sql());
        if inline_key {
            sql.push_str(" PRIMARY KEY");
            if self.autoincrement {
                sql.push_str(" AUTOINCREMENT");
            }
        }
        if !self.nullable {
            sql.push_str(" NOT NULL");
        }
        if let Some(default) = &self.default {
            sql.push_str(" DEFAULT ");
            sql.push_str(&default.sql());
        }
        sql
    }

    /// Whether SQLite's `ALTER TABLE ... ADD COLUMN` can add this column.
    ///
    /// The store refuses a non-constant default, refuses `NOT NULL`
    /// unless a non-null default fills existing rows, and never adds a key
    /// column.
    pub fn can_add_natively(&self) -> bool {
        if self.primary_key {
            return false;
        }
        match &self.default {
            Some(ColumnDefault::CurrentTimestamp) => false,
            Some(ColumnDefault::Literal(_)) => true,
            None => self.nullable,
        }
    }

    /// Whether a live `dflt_value` is this column's default.
    pub fn default_matches(&self, live: Option<&str>) -> bool {
        match (&self.default, live.map(str::trim)) {
            (None, None) => true,
            (None, Some(v)) => v.eq_ignore_ascii_case("NULL"),
            (Some(_), None) => false,
            (Some(ColumnDefault::CurrentTimestamp), Some(v)) => {
                v.eq_ignore_ascii_case("CURRENT_TIMESTAMP")
            }
            (Some(d), Some(v)) => d.sql() == v,
        }
    }
}

#[cfg(test)]
#[path = "column_test.rs"]
mod tests;
