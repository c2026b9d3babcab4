use rusqlite::ErrorCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the wrapper.
///
/// Engine failures are passed through unchanged apart from classification:
/// constraint failures and bind-count mismatches get their own variants so
/// callers can match on them without digging into SQLite result codes.
#[derive(Error, Debug)]
pub enum Error {
    #[error("sqlite error: {0}")]
    Engine(#[source] rusqlite::Error),
    #[error("constraint violation: {0}")]
    ConstraintViolation(#[source] rusqlite::Error),
    #[error("parameter mismatch: {given} bound, {expected} expected")]
    ParameterMismatch { given: usize, expected: usize },
    #[error("invalid identifier: {0:?}")]
    InvalidIdentifier(String),
    #[error("insert_all requires at least one row")]
    EmptyBatch,
    #[error("update requires at least one column")]
    EmptyUpdate,
    #[error("row has no id column")]
    MissingId,
    #[error("database is closed")]
    Closed,
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(failure, _) = &err {
            if failure.code == ErrorCode::ConstraintViolation {
                return Error::ConstraintViolation(err);
            }
        }
        match err {
            rusqlite::Error::InvalidParameterCount(given, expected) => {
                Error::ParameterMismatch { given, expected }
            }
            err => Error::Engine(err),
        }
    }
}
