//! SQL statement assembly.
//!
//! Every builder here is pure: it turns descriptors into a [`SqlQuery`] and
//! never touches a connection. Row values and filter values always travel in
//! `params`; only names and caller-trusted fragments end up in the text.

use crate::error::{Error, Result};
use crate::row::Row;
use crate::schema::{IndexDefinition, TableDefinition};
use crate::value::Value;

/// SQL Query with positional parameters
#[derive(Debug, Clone, PartialEq)]
pub struct SqlQuery {
    pub statement: String,
    pub params: Vec<Value>,
}

impl SqlQuery {
    pub fn new(statement: &str) -> Self {
        Self {
            statement: statement.to_string(),
            params: Vec::new(),
        }
    }
    pub fn with_params(mut self, params: Vec<Value>) -> Self {
        self.params = params;
        self
    }

    /// Number of `?` characters in the statement.
    pub fn placeholder_count(&self) -> usize {
        self.statement.matches('?').count()
    }
}

/// A raw WHERE expression and the values for its placeholders.
///
/// The clause is inlined verbatim, so it must come from code, not input.
/// Nothing checks that the clause has as many `?` as there are values; a
/// mismatch is reported by the engine as [`Error::ParameterMismatch`].
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub clause: String,
    pub values: Vec<Value>,
}

impl Filter {
    pub fn new<I, V>(clause: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self {
            clause: clause.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn raw(clause: impl Into<String>) -> Self {
        Self {
            clause: clause.into(),
            values: Vec::new(),
        }
    }

    /// Matches every row.
    pub fn all() -> Self {
        Self::raw("1")
    }

    pub fn by_id(id: impl Into<Value>) -> Self {
        Self::new("id=?", [id.into()])
    }
}

impl Default for Filter {
    fn default() -> Self {
        Self::all()
    }
}

/// Query operators for building typed conditions
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOperator {
    Equal(Value),
    NotEqual(Value),
    GreaterThan(Value),
    GreaterThanOrEqual(Value),
    LessThan(Value),
    LessThanOrEqual(Value),
    Like(String),
    In(Vec<Value>),
    IsNull,
    IsNotNull,
}

/// Conditions joined with AND, rendered into a [`Filter`].
///
/// Unlike a raw filter, field names are checked, so a `Query` is safe to
/// assemble from caller-chosen field names.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Query {
    pub conditions: Vec<(String, QueryOperator)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn with_condition(mut self, field: &str, op: QueryOperator) -> Self {
        self.conditions.push((field.to_string(), op));
        self
    }

    pub fn to_filter(&self) -> Result<Filter> {
        if self.conditions.is_empty() {
            return Ok(Filter::all());
        }
        let mut parts = Vec::with_capacity(self.conditions.len());
        let mut values = Vec::new();
        for (field, op) in &self.conditions {
            let field = qualified_identifier(field)?;
            let part = match op {
                QueryOperator::Equal(v) => binary(field, "=", v, &mut values),
                QueryOperator::NotEqual(v) => binary(field, "<>", v, &mut values),
                QueryOperator::GreaterThan(v) => binary(field, ">", v, &mut values),
                QueryOperator::GreaterThanOrEqual(v) => binary(field, ">=", v, &mut values),
                QueryOperator::LessThan(v) => binary(field, "<", v, &mut values),
                QueryOperator::LessThanOrEqual(v) => binary(field, "<=", v, &mut values),
                QueryOperator::Like(pattern) => {
                    values.push(Value::Text(pattern.clone()));
                    format!("{field} LIKE ?")
                }
                // IN () is a syntax error in SQLite; nothing matches anyway.
                QueryOperator::In(list) if list.is_empty() => "0".to_string(),
                QueryOperator::In(list) => {
                    values.extend(list.iter().cloned());
                    format!("{field} IN ({})", placeholders(list.len()))
                }
                QueryOperator::IsNull => format!("{field} IS NULL"),
                QueryOperator::IsNotNull => format!("{field} IS NOT NULL"),
            };
            parts.push(part);
        }
        Ok(Filter {
            clause: parts.join(" AND "),
            values,
        })
    }
}

fn binary(field: &str, op: &str, value: &Value, values: &mut Vec<Value>) -> String {
    values.push(value.clone());
    format!("{field}{op}?")
}

/// Descriptor for `select` and `select_one`.
///
/// Joins are comma joins with an inline ON condition, in the order added.
#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    pub table: String,
    pub joins: Vec<(String, String)>,
    pub columns: Vec<(String, Option<String>)>,
    pub filter: Filter,
    pub order: Option<String>,
    pub limit: Option<u64>,
    pub distinct: bool,
}

impl Select {
    pub fn from(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            joins: Vec::new(),
            columns: Vec::new(),
            filter: Filter::all(),
            order: None,
            limit: None,
            distinct: false,
        }
    }

    pub fn join(mut self, table: impl Into<String>, on: impl Into<String>) -> Self {
        self.joins.push((table.into(), on.into()));
        self
    }

    pub fn column(mut self, expr: impl Into<String>) -> Self {
        self.columns.push((expr.into(), None));
        self
    }

    pub fn column_as(mut self, expr: impl Into<String>, alias: impl Into<String>) -> Self {
        self.columns.push((expr.into(), Some(alias.into())));
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    pub fn order_by(mut self, order: impl Into<String>) -> Self {
        self.order = Some(order.into());
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    fn head(&self, distinct: bool) -> Result<String> {
        let mut sql = String::from("SELECT ");
        if distinct {
            sql.push_str("DISTINCT ");
        }
        if self.columns.is_empty() {
            sql.push('*');
        } else {
            let columns: Vec<String> = self
                .columns
                .iter()
                .map(|(expr, alias)| match alias {
                    Some(alias) => format!("{expr} AS {alias}"),
                    None => expr.clone(),
                })
                .collect();
            sql.push_str(&columns.join(", "));
        }
        sql.push_str(" FROM ");
        sql.push_str(identifier(&self.table)?);
        for (table, on) in &self.joins {
            sql.push_str(&format!(", {} ON {}", identifier(table)?, on));
        }
        sql.push_str(" WHERE ");
        sql.push_str(&self.filter.clause);
        Ok(sql)
    }
}

/// Accept plain SQL identifiers only: `[A-Za-z_][A-Za-z0-9_]*`.
pub(crate) fn identifier(name: &str) -> Result<&str> {
    let mut chars = name.chars();
    let valid = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(name)
    } else {
        Err(Error::InvalidIdentifier(name.to_string()))
    }
}

/// Like [`identifier`], but allows a `table.column` qualifier.
fn qualified_identifier(name: &str) -> Result<&str> {
    for part in name.split('.') {
        identifier(part).map_err(|_| Error::InvalidIdentifier(name.to_string()))?;
    }
    Ok(name)
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(",")
}

fn column_list<'a>(columns: impl Iterator<Item = &'a str>) -> Result<String> {
    let columns = columns.map(identifier).collect::<Result<Vec<_>>>()?;
    Ok(columns.join(","))
}

pub fn create_table(table: &TableDefinition) -> Result<SqlQuery> {
    let columns = table
        .columns
        .iter()
        .map(|c| c.to_sql())
        .collect::<Result<Vec<_>>>()?;
    Ok(SqlQuery::new(&format!(
        "CREATE TABLE IF NOT EXISTS {} ({});",
        identifier(&table.name)?,
        columns.join(",")
    )))
}

pub fn create_index(table: &str, index: &IndexDefinition) -> Result<SqlQuery> {
    Ok(SqlQuery::new(&format!(
        "CREATE {}INDEX IF NOT EXISTS {} ON {} ({});",
        if index.unique { "UNIQUE " } else { "" },
        identifier(&index.name)?,
        identifier(table)?,
        column_list(index.columns.iter().map(String::as_str))?
    )))
}

pub fn insert(table: &str, row: &Row) -> Result<SqlQuery> {
    let table = identifier(table)?;
    if row.is_empty() {
        return Ok(SqlQuery::new(&format!(
            "INSERT INTO {table} DEFAULT VALUES;"
        )));
    }
    let statement = format!(
        "INSERT INTO {} ({}) VALUES ({});",
        table,
        column_list(row.columns())?,
        placeholders(row.len())
    );
    Ok(SqlQuery::new(&statement).with_params(row.values().cloned().collect()))
}

/// One INSERT ... SELECT for the whole batch.
///
/// Columns come from the first row; a row missing one of them binds NULL in
/// its place and extra keys are ignored. The first SELECT labels each
/// placeholder with its column, the rest are `UNION ALL SELECT ?,?,...` so
/// identical rows are all kept.
pub fn insert_all(table: &str, rows: &[Row]) -> Result<SqlQuery> {
    let first = rows.first().ok_or(Error::EmptyBatch)?;
    let table = identifier(table)?;
    let columns: Vec<&str> = first.columns().collect();
    if columns.is_empty() {
        return Err(Error::EmptyBatch);
    }

    let labelled = columns
        .iter()
        .map(|c| Ok(format!("? AS {}", identifier(c)?)))
        .collect::<Result<Vec<_>>>()?
        .join(", ");
    let mut statement = format!(
        "INSERT INTO {} ({}) SELECT {}",
        table,
        columns.join(","),
        labelled
    );
    let rest = format!(" UNION ALL SELECT {}", placeholders(columns.len()));
    for _ in 1..rows.len() {
        statement.push_str(&rest);
    }
    statement.push(';');

    let mut params = Vec::with_capacity(rows.len() * columns.len());
    for row in rows {
        for column in &columns {
            params.push(row.get(column).cloned().unwrap_or(Value::Null));
        }
    }
    Ok(SqlQuery::new(&statement).with_params(params))
}

/// `UPDATE .. SET .. WHERE ..`: row values bind first, then the filter's.
pub fn update(table: &str, filter: &Filter, row: &Row) -> Result<SqlQuery> {
    let table = identifier(table)?;
    if row.is_empty() {
        return Err(Error::EmptyUpdate);
    }
    let assignments = row
        .columns()
        .map(|c| Ok(format!("{}=?", identifier(c)?)))
        .collect::<Result<Vec<_>>>()?
        .join(",");
    let statement = format!("UPDATE {table} SET {assignments} WHERE {};", filter.clause);
    let params = row
        .values()
        .chain(filter.values.iter())
        .cloned()
        .collect();
    Ok(SqlQuery::new(&statement).with_params(params))
}

pub fn remove(table: &str, filter: &Filter) -> Result<SqlQuery> {
    let statement = format!("DELETE FROM {} WHERE {};", identifier(table)?, filter.clause);
    Ok(SqlQuery::new(&statement).with_params(filter.values.clone()))
}

pub fn select(select: &Select) -> Result<SqlQuery> {
    let mut statement = select.head(select.distinct)?;
    if let Some(order) = &select.order {
        statement.push_str(" ORDER BY ");
        statement.push_str(order);
    }
    if let Some(limit) = select.limit {
        statement.push_str(&format!(" LIMIT {limit}"));
    }
    statement.push(';');
    Ok(SqlQuery::new(&statement).with_params(select.filter.values.clone()))
}

/// Same as [`select`] minus DISTINCT, ORDER BY and LIMIT.
pub fn select_one(select: &Select) -> Result<SqlQuery> {
    let mut statement = select.head(false)?;
    statement.push(';');
    Ok(SqlQuery::new(&statement).with_params(select.filter.values.clone()))
}
