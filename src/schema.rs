//! Typed table and column descriptors and their DDL rendering.

use crate::error::Result;
use crate::query::identifier;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Schema definition for the SQLite database
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(default)]
    pub tables: Vec<TableDefinition>,
}

impl Schema {
    pub fn new() -> Self {
        Self { tables: Vec::new() }
    }
    pub fn add_table(mut self, table: TableDefinition) -> Self {
        self.tables.push(table);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDefinition {
    pub name: String,
    pub columns: Vec<ColumnDefinition>,
    #[serde(default)]
    pub indexes: Vec<IndexDefinition>,
}

impl TableDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            indexes: Vec::new(),
        }
    }
    pub fn column(mut self, column: ColumnDefinition) -> Self {
        self.columns.push(column);
        self
    }
    pub fn index(mut self, index: IndexDefinition) -> Self {
        self.indexes.push(index);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    pub name: String,
    #[serde(default)]
    pub data_type: Option<DataType>,
    #[serde(default)]
    pub constraints: Vec<ColumnConstraint>,
    #[serde(default)]
    pub default_value: Option<DefaultValue>,
    #[serde(default)]
    pub references: Option<ForeignKey>,
}

impl ColumnDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: None,
            constraints: Vec::new(),
            default_value: None,
            references: None,
        }
    }

    pub fn with_type(mut self, data_type: DataType) -> Self {
        self.data_type = Some(data_type);
        self
    }

    pub fn primary_key(self) -> Self {
        self.constraint(ColumnConstraint::PrimaryKey)
    }

    pub fn unique(self) -> Self {
        self.constraint(ColumnConstraint::Unique)
    }

    pub fn not_null(self) -> Self {
        self.constraint(ColumnConstraint::NotNull)
    }

    pub fn default_value(mut self, value: DefaultValue) -> Self {
        self.default_value = Some(value);
        self
    }

    pub fn references(mut self, foreign_key: ForeignKey) -> Self {
        self.references = Some(foreign_key);
        self
    }

    fn constraint(mut self, constraint: ColumnConstraint) -> Self {
        if !self.constraints.contains(&constraint) {
            self.constraints.push(constraint);
        }
        self
    }

    fn has(&self, constraint: ColumnConstraint) -> bool {
        self.constraints.contains(&constraint)
    }

    /// Render the column definition.
    ///
    /// Clauses always come out as name, type, PRIMARY KEY, UNIQUE, NOT NULL,
    /// DEFAULT, REFERENCES, whatever order the builder methods were called in.
    pub fn to_sql(&self) -> Result<String> {
        let mut sql = identifier(&self.name)?.to_string();
        if let Some(data_type) = &self.data_type {
            sql.push(' ');
            sql.push_str(&data_type.to_string());
        }
        if self.has(ColumnConstraint::PrimaryKey) {
            sql.push_str(" PRIMARY KEY");
        }
        if self.has(ColumnConstraint::Unique) {
            sql.push_str(" UNIQUE");
        }
        if self.has(ColumnConstraint::NotNull) {
            sql.push_str(" NOT NULL");
        }
        if let Some(default) = &self.default_value {
            sql.push_str(" DEFAULT ");
            sql.push_str(&default.to_string());
        }
        if let Some(foreign_key) = &self.references {
            sql.push_str(" REFERENCES ");
            sql.push_str(&foreign_key.to_sql()?);
        }
        Ok(sql)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DataType {
    Integer,
    Text,
    Real,
    Blob,
    Numeric,
    /// Any other type name the engine accepts, e.g. `VARCHAR(64)`.
    Custom(String),
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Integer => f.write_str("INTEGER"),
            DataType::Text => f.write_str("TEXT"),
            DataType::Real => f.write_str("REAL"),
            DataType::Blob => f.write_str("BLOB"),
            DataType::Numeric => f.write_str("NUMERIC"),
            DataType::Custom(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnConstraint {
    PrimaryKey,
    NotNull,
    Unique,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefaultValue {
    Integer(i64),
    Text(String),
    Real(f64),
    Null,
    CurrentTimestamp,
    /// Inlined verbatim; never build one from user input.
    Expression(String),
}

impl fmt::Display for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::Integer(i) => write!(f, "{i}"),
            DefaultValue::Text(s) => write!(f, "'{}'", s.replace('\'', "''")),
            DefaultValue::Real(r) => write!(f, "{r:?}"),
            DefaultValue::Null => f.write_str("NULL"),
            DefaultValue::CurrentTimestamp => f.write_str("CURRENT_TIMESTAMP"),
            DefaultValue::Expression(expr) => f.write_str(expr),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForeignKey {
    pub foreign_table: String,
    #[serde(default)]
    pub foreign_column: Option<String>,
    #[serde(default)]
    pub on_delete: Option<ForeignKeyAction>,
    #[serde(default)]
    pub on_update: Option<ForeignKeyAction>,
}

impl ForeignKey {
    pub fn new(foreign_table: impl Into<String>) -> Self {
        Self {
            foreign_table: foreign_table.into(),
            foreign_column: None,
            on_delete: None,
            on_update: None,
        }
    }
    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.foreign_column = Some(column.into());
        self
    }
    pub fn on_delete(mut self, action: ForeignKeyAction) -> Self {
        self.on_delete = Some(action);
        self
    }
    pub fn on_update(mut self, action: ForeignKeyAction) -> Self {
        self.on_update = Some(action);
        self
    }

    fn to_sql(&self) -> Result<String> {
        let mut sql = identifier(&self.foreign_table)?.to_string();
        if let Some(column) = &self.foreign_column {
            sql.push_str(&format!("({})", identifier(column)?));
        }
        if let Some(action) = self.on_delete {
            sql.push_str(&format!(" ON DELETE {action}"));
        }
        if let Some(action) = self.on_update {
            sql.push_str(&format!(" ON UPDATE {action}"));
        }
        Ok(sql)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForeignKeyAction {
    NoAction,
    Cascade,
    SetNull,
    SetDefault,
    Restrict,
}

impl fmt::Display for ForeignKeyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ForeignKeyAction::NoAction => "NO ACTION",
            ForeignKeyAction::Cascade => "CASCADE",
            ForeignKeyAction::SetNull => "SET NULL",
            ForeignKeyAction::SetDefault => "SET DEFAULT",
            ForeignKeyAction::Restrict => "RESTRICT",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexDefinition {
    pub name: String,
    pub columns: Vec<String>,
    #[serde(default)]
    pub unique: bool,
}

impl IndexDefinition {
    pub fn new<I, S>(name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            unique: false,
        }
    }
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
}
