//! Typed CRUD and query-building facade over SQLite.
//!
//! # Intention
//!
//! - Turn table descriptors and row payloads into SQL text plus an ordered
//!   parameter list, and hand both to an injected [`DatabaseHandle`].
//! - Keep every row value and filter value bound, never interpolated.
//!
//! # Architectural Boundaries
//!
//! - Parsing, storage, transactions and locking belong to SQLite.
//! - Table names, column names and raw fragments (where clauses, join
//!   conditions, ORDER BY) come from code, never from end-user input.
//!
//! ```no_run
//! # async fn demo() -> sqlite_wrapper::Result<()> {
//! use sqlite_wrapper::{Filter, Row, SqliteConfig, SqliteWrapper};
//!
//! let db = SqliteWrapper::open(SqliteConfig::memory()).await?;
//! let id = db
//!     .insert("people", &Row::new().with_value("name", "Donald Knuth"))
//!     .await?;
//! db.update("people", &Filter::by_id(id), &Row::new().with_value("city_id", 378))
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod handle;
pub mod query;
pub mod row;
pub mod schema;
pub mod sqlite;
pub mod value;

pub use error::{Error, Result};
pub use handle::{DatabaseHandle, Execution, Location, SqliteHandle};
pub use query::{Filter, Query, QueryOperator, Select, SqlQuery};
pub use row::Row;
pub use schema::{
    ColumnConstraint, ColumnDefinition, DataType, DefaultValue, ForeignKey, ForeignKeyAction,
    IndexDefinition, Schema, TableDefinition,
};
pub use sqlite::{SqliteConfig, SqliteWrapper, SQL_LOG_TARGET};
pub use value::Value;
