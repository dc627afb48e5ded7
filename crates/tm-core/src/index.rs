//! Index specifications.

use crate::names::{ColumnName, IndexName, TableName};
use serde::{Deserialize, Serialize};

/// Expression wrapped around an index key column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexExpression {
    /// `COALESCE(col, '')`, so NULLs participate in uniqueness
    CoalesceEmpty,
    /// Arbitrary expression text used verbatim as the key
    Sql(String),
}

/// One key of an index: a column, optionally wrapped in an expression.
///
/// Written in plan files either as a bare column name or as a map with
/// `column` and `expression`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "IndexColumnDef")]
pub struct IndexColumn {
    pub column: ColumnName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<IndexExpression>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IndexColumnDef {
    Bare(ColumnName),
    Full {
        column: ColumnName,
        #[serde(default)]
        expression: Option<IndexExpression>,
    },
}

impl From<IndexColumnDef> for IndexColumn {
    fn from(def: IndexColumnDef) -> Self {
        match def {
            IndexColumnDef::Bare(column) => IndexColumn {
                column,
                expression: None,
            },
            IndexColumnDef::Full { column, expression } => IndexColumn { column, expression },
        }
    }
}

impl IndexColumn {
    /// Key text inside the index's column list.
    pub fn key_sql(&self) -> String {
        match &self.expression {
            None => self.column.quoted(),
            Some(IndexExpression::CoalesceEmpty) => {
                format!("COALESCE({}, '')", self.column.quoted())
            }
            Some(IndexExpression::Sql(sql)) => sql.clone(),
        }
    }
}

/// Desired index on a plan's table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IndexSpec {
    /// Index name, unique across the store
    pub name: IndexName,

    /// Ordered key columns (at least one)
    pub columns: Vec<IndexColumn>,

    /// Whether the index enforces uniqueness
    #[serde(default)]
    pub unique: bool,
}

impl IndexSpec {
    /// Create a non-unique index over plain columns.
    pub fn new(name: impl Into<String>, columns: &[&str]) -> Self {
        Self {
            name: IndexName::new(name),
            columns: columns
                .iter()
                .map(|c| IndexColumn {
                    column: ColumnName::new(*c),
                    expression: None,
                })
                .collect(),
            unique: false,
        }
    }

    /// Make the index unique.
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// `CREATE INDEX` statement for this index on `table`.
    pub fn create_sql(&self, table: &TableName) -> String {
        let keys = self
            .columns
            .iter()
            .map(IndexColumn::key_sql)
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "CREATE {}INDEX {} ON {} ({})",
            if self.unique { "UNIQUE " } else { "" },
            self.name.quoted(),
            table.quoted(),
            keys
        )
    }
}
