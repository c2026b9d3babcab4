//! The engine capability the facade delegates to.

use crate::error::{Error, Result};
use crate::query::SqlQuery;
use crate::row::Row;
use crate::value::Value;
use async_trait::async_trait;
use futures::lock::Mutex;
use rusqlite::{params_from_iter, Connection};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Outcome of a statement that returns no rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Execution {
    pub changes: usize,
    pub last_insert_id: i64,
}

/// Where the database lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    File(PathBuf),
    /// `:memory:`, gone when the handle is closed.
    Memory,
    /// A private temporary database SQLite deletes on close.
    Anonymous,
}

/// Executes statements against a relational engine.
///
/// `run` is for statements without a result set, `all` collects every row,
/// `get` yields the first row if any. Implementations decide how concurrent
/// calls are scheduled.
#[async_trait]
pub trait DatabaseHandle: Send + Sync {
    async fn run(&self, query: &SqlQuery) -> Result<Execution>;
    async fn all(&self, query: &SqlQuery) -> Result<Vec<Row>>;
    async fn get(&self, query: &SqlQuery) -> Result<Option<Row>>;
    async fn close(&self) -> Result<()>;
}

/// A single rusqlite connection.
///
/// Calls take turns on the connection lock and run on the caller's task.
pub struct SqliteHandle {
    connection: Mutex<Option<Connection>>,
}

impl SqliteHandle {
    pub fn open(location: &Location) -> Result<Self> {
        let connection = match location {
            Location::File(path) => Connection::open(path)?,
            Location::Memory => Connection::open_in_memory()?,
            Location::Anonymous => Connection::open("")?,
        };
        Ok(Self::from_connection(connection))
    }

    pub fn from_connection(connection: Connection) -> Self {
        Self {
            connection: Mutex::new(Some(connection)),
        }
    }
}

fn read_row(columns: &[String], row: &rusqlite::Row<'_>) -> Result<Row> {
    let mut out = Row::new();
    for (i, column) in columns.iter().enumerate() {
        out.set(column, Value::from(row.get_ref(i)?));
    }
    Ok(out)
}

#[async_trait]
impl DatabaseHandle for SqliteHandle {
    async fn run(&self, query: &SqlQuery) -> Result<Execution> {
        let guard = self.connection.lock().await;
        let conn = guard.as_ref().ok_or(Error::Closed)?;
        let mut stmt = conn.prepare(&query.statement)?;
        let changes = stmt.execute(params_from_iter(query.params.iter()))?;
        Ok(Execution {
            changes,
            last_insert_id: conn.last_insert_rowid(),
        })
    }

    async fn all(&self, query: &SqlQuery) -> Result<Vec<Row>> {
        let guard = self.connection.lock().await;
        let conn = guard.as_ref().ok_or(Error::Closed)?;
        let mut stmt = conn.prepare(&query.statement)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let mut rows = stmt.query(params_from_iter(query.params.iter()))?;
        let mut result = Vec::new();
        while let Some(row) = rows.next()? {
            result.push(read_row(&columns, row)?);
        }
        Ok(result)
    }

    async fn get(&self, query: &SqlQuery) -> Result<Option<Row>> {
        let guard = self.connection.lock().await;
        let conn = guard.as_ref().ok_or(Error::Closed)?;
        let mut stmt = conn.prepare(&query.statement)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let mut rows = stmt.query(params_from_iter(query.params.iter()))?;
        let first = match rows.next()? {
            Some(row) => Some(read_row(&columns, row)?),
            None => None,
        };
        Ok(first)
    }

    async fn close(&self) -> Result<()> {
        let connection = self.connection.lock().await.take();
        match connection {
            Some(conn) => conn.close().map_err(|(_, err)| Error::from(err)),
            None => Err(Error::Closed),
        }
    }
}
