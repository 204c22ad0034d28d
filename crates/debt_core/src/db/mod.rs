//! SQLite storage bootstrap, migrations and transaction scoping.
//!
//! # Responsibility
//! - Open and configure SQLite connections for the customer store.
//! - Apply schema migrations in deterministic order.
//! - Classify backend failures into a small storage-error taxonomy.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - Repository code must not read/write customer rows before migrations
//!   succeed.

use rusqlite::{ffi, ErrorCode};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;
mod transaction;

pub use open::{open_db, open_db_in_memory};
pub use transaction::run_in_transaction;

pub type DbResult<T> = Result<T, DbError>;

/// Storage failure surfaced to callers unchanged.
#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

/// Coarse classification of a storage failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageErrorKind {
    /// Backend busy, locked, unreachable or failing I/O.
    Unavailable,
    /// A schema constraint (unique, not-null, check) rejected the write.
    ConstraintViolation,
    /// Anything else, including schema version mismatches.
    Other,
}

impl DbError {
    /// Returns the storage-error category of this failure.
    pub fn kind(&self) -> StorageErrorKind {
        match self {
            Self::Sqlite(rusqlite::Error::SqliteFailure(err, _)) => match err.code {
                ErrorCode::ConstraintViolation => StorageErrorKind::ConstraintViolation,
                ErrorCode::DatabaseBusy
                | ErrorCode::DatabaseLocked
                | ErrorCode::CannotOpen
                | ErrorCode::SystemIoFailure
                | ErrorCode::DiskFull
                | ErrorCode::ReadOnly => StorageErrorKind::Unavailable,
                _ => StorageErrorKind::Other,
            },
            Self::Sqlite(_) | Self::UnsupportedSchemaVersion { .. } => StorageErrorKind::Other,
        }
    }

    pub fn is_constraint_violation(&self) -> bool {
        self.kind() == StorageErrorKind::ConstraintViolation
    }

    /// True only for UNIQUE / PRIMARY KEY collisions, not CHECK or NOT NULL.
    pub fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            Self::Sqlite(rusqlite::Error::SqliteFailure(err, _))
                if err.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
                    || err.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY
        )
    }
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database schema version {db_version} is newer than supported {latest_supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
