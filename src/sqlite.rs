use crate::error::{Error, Result};
use crate::handle::{DatabaseHandle, Execution, Location, SqliteHandle};
use crate::query::{self, Filter, Select, SqlQuery};
use crate::row::Row;
use crate::schema::{IndexDefinition, Schema, TableDefinition};
use crate::value::Value;
use futures::future::join_all;
use futures::lock::Mutex;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;

/// Log target for generated statements.
pub const SQL_LOG_TARGET: &str = "sqlite_wrapper::sql";

/// SQLite wrapper configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SqliteConfig {
    /// Database file, `:memory:` or an anonymous temporary database
    pub location: Location,
    /// Tables and indexes created at open time if missing
    #[serde(default)]
    pub schema: Schema,
    /// Log every statement and its parameters at debug level
    #[serde(default)]
    pub log_statements: bool,
    /// Turn on `PRAGMA foreign_keys` for the connection
    #[serde(default)]
    pub foreign_keys: bool,
}

impl SqliteConfig {
    pub fn new(location: Location) -> Self {
        Self {
            location,
            schema: Schema::new(),
            log_statements: false,
            foreign_keys: false,
        }
    }
    pub fn file(path: impl Into<std::path::PathBuf>) -> Self {
        Self::new(Location::File(path.into()))
    }
    pub fn memory() -> Self {
        Self::new(Location::Memory)
    }
    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = schema;
        self
    }
    pub fn with_statement_logging(mut self, enabled: bool) -> Self {
        self.log_statements = enabled;
        self
    }
    pub fn with_foreign_keys(mut self, enabled: bool) -> Self {
        self.foreign_keys = enabled;
        self
    }
}

/// CRUD facade over a [`DatabaseHandle`].
///
/// Each operation builds exactly one statement, hands it to the handle and
/// returns whatever the handle reports. Errors are never retried.
pub struct SqliteWrapper {
    handle: Arc<dyn DatabaseHandle>,
    log_statements: bool,
    serial: Mutex<()>,
}

impl SqliteWrapper {
    /// Open the configured database and create its schema.
    pub async fn open(config: SqliteConfig) -> Result<Self> {
        info!("opening sqlite database at {:?}", config.location);
        let handle = SqliteHandle::open(&config.location)?;
        let wrapper = Self::with_handle(Arc::new(handle), &config);
        if config.foreign_keys {
            wrapper.run(SqlQuery::new("PRAGMA foreign_keys = ON;")).await?;
        }
        wrapper.initialize_schema(&config.schema).await?;
        Ok(wrapper)
    }

    /// Wrap an existing handle. The config's location and schema are ignored.
    pub fn with_handle(handle: Arc<dyn DatabaseHandle>, config: &SqliteConfig) -> Self {
        Self {
            handle,
            log_statements: config.log_statements,
            serial: Mutex::new(()),
        }
    }

    async fn initialize_schema(&self, schema: &Schema) -> Result<()> {
        for table in &schema.tables {
            self.create_table(table).await?;
        }
        for table in &schema.tables {
            for index in &table.indexes {
                self.create_index(&table.name, index).await?;
            }
        }
        Ok(())
    }

    fn trace(&self, query: &SqlQuery) {
        if self.log_statements {
            debug!(target: SQL_LOG_TARGET, "{} {:?}", query.statement, query.params);
        }
    }

    async fn run(&self, query: SqlQuery) -> Result<Execution> {
        self.trace(&query);
        self.handle.run(&query).await
    }

    /// `CREATE TABLE IF NOT EXISTS`; creating the same table twice is a no-op.
    pub async fn create_table(&self, table: &TableDefinition) -> Result<()> {
        self.run(query::create_table(table)?).await?;
        Ok(())
    }

    pub async fn create_index(&self, table: &str, index: &IndexDefinition) -> Result<()> {
        self.run(query::create_index(table, index)?).await?;
        Ok(())
    }

    /// Insert one row and return its rowid.
    pub async fn insert(&self, table: &str, row: &Row) -> Result<i64> {
        let execution = self.run(query::insert(table, row)?).await?;
        Ok(execution.last_insert_id)
    }

    /// Insert a batch in a single statement, all or nothing.
    ///
    /// Returns the number of rows inserted. SQLite limits a compound SELECT
    /// to 500 terms, so bigger batches fail as a whole.
    pub async fn insert_all(&self, table: &str, rows: &[Row]) -> Result<usize> {
        let execution = self.run(query::insert_all(table, rows)?).await?;
        Ok(execution.changes)
    }

    /// Update matching rows and return how many changed.
    pub async fn update(&self, table: &str, filter: &Filter, row: &Row) -> Result<usize> {
        let execution = self.run(query::update(table, filter, row)?).await?;
        Ok(execution.changes)
    }

    pub async fn remove(&self, table: &str, filter: &Filter) -> Result<usize> {
        let execution = self.run(query::remove(table, filter)?).await?;
        Ok(execution.changes)
    }

    pub async fn select(&self, select: &Select) -> Result<Vec<Row>> {
        let query = query::select(select)?;
        self.trace(&query);
        self.handle.all(&query).await
    }

    /// First row the engine yields. No ORDER BY or LIMIT is added, so with
    /// several matches the pick is up to SQLite.
    pub async fn select_one(&self, select: &Select) -> Result<Option<Row>> {
        let query = query::select_one(select)?;
        self.trace(&query);
        self.handle.get(&query).await
    }

    pub async fn find(&self, table: &str, id: impl Into<Value>) -> Result<Option<Row>> {
        self.select_one(&Select::from(table).filter(Filter::by_id(id)))
            .await
    }

    pub async fn list(&self, table: &str) -> Result<Vec<Row>> {
        self.select(&Select::from(table)).await
    }

    pub async fn update_by_id(&self, table: &str, id: impl Into<Value>, row: &Row) -> Result<usize> {
        self.update(table, &Filter::by_id(id), row).await
    }

    /// Update the row identified by the payload's own `id` column.
    pub async fn update_with_id(&self, table: &str, row: &Row) -> Result<usize> {
        let id = row.id().cloned().ok_or(Error::MissingId)?;
        self.update_by_id(table, id, row).await
    }

    pub async fn remove_by_id(&self, table: &str, id: impl Into<Value>) -> Result<usize> {
        self.remove(table, &Filter::by_id(id)).await
    }

    /// Run `f` while no other `serialize` block is running.
    ///
    /// Statements awaited one after another inside `f` execute strictly in
    /// that order; blocks submitted concurrently queue up behind each other.
    pub async fn serialize<'a, F, Fut, T>(&'a self, f: F) -> T
    where
        F: FnOnce(&'a Self) -> Fut,
        Fut: Future<Output = T> + 'a,
    {
        let _gate = self.serial.lock().await;
        f(self).await
    }

    /// Drive a batch of operations concurrently.
    ///
    /// Results come back in input order; the order statements reach the
    /// engine in is unspecified.
    pub async fn parallelize<I, Fut, T>(&self, operations: I) -> Vec<T>
    where
        I: IntoIterator<Item = Fut>,
        Fut: Future<Output = T>,
    {
        join_all(operations).await
    }

    /// Close the underlying connection. Later calls fail with [`Error::Closed`].
    pub async fn close(&self) -> Result<()> {
        self.handle.close().await?;
        info!("sqlite database closed");
        Ok(())
    }
}
