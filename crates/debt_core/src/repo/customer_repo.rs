//! Customer repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide generic repository operations keyed by the surrogate id.
//! - Provide lookup and delete by the `customer_id` business key.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Write paths call `Customer::validate()` before SQL mutations.
//! - Read paths reject invalid persisted rows instead of masking them.
//! - Absence is `Ok(None)` / a zero count, never an error.
//! - Storage failures are returned as `RepoError::Db` without retry.

use crate::db::migrations::{current_version, latest_version};
use crate::db::{run_in_transaction, DbError};
use crate::model::customer::{Customer, CustomerKey, CustomerValidationError};
use log::{debug, info};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const CUSTOMER_SELECT_SQL: &str = "SELECT
    id,
    customer_id,
    name,
    telephone,
    province
FROM customers";

const REQUIRED_COLUMNS: &[&str] = &["id", "customer_id", "name", "telephone", "province"];

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for customer persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(CustomerValidationError),
    /// Storage failure; see `DbError::kind()` for its category.
    Db(DbError),
    /// No customer carries this business key.
    NotFound(String),
    /// Another customer already carries this business key.
    DuplicateCustomerId(String),
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl RepoError {
    /// Whether this error came from the storage backend.
    pub fn is_storage_error(&self) -> bool {
        matches!(self, Self::Db(_))
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(customer_id) => write!(f, "customer not found: {customer_id}"),
            Self::DuplicateCustomerId(customer_id) => {
                write!(f, "customer id already in use: {customer_id}")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted customer data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}; open it with db::open_db"
            ),
            Self::MissingRequiredTable(table) => write!(f, "required table `{table}` is missing"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "required column `{table}.{column}` is missing")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<CustomerValidationError> for RepoError {
    fn from(value: CustomerValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Data access for customers.
pub trait CustomerRepository {
    /// Inserts (`id == None`) or upserts by surrogate key; returns the stored record.
    fn save(&self, customer: &Customer) -> RepoResult<Customer>;
    fn find_by_id(&self, id: CustomerKey) -> RepoResult<Option<Customer>>;
    /// All customers ordered by surrogate key.
    fn find_all(&self) -> RepoResult<Vec<Customer>>;
    /// Deletes by surrogate key and returns the number of rows removed.
    fn delete_by_id(&self, id: CustomerKey) -> RepoResult<usize>;
    fn count(&self) -> RepoResult<u64>;
    fn find_by_customer_id(&self, customer_id: &str) -> RepoResult<Option<Customer>>;
    fn exists_by_customer_id(&self, customer_id: &str) -> RepoResult<bool>;
    /// Deletes by business key in one transaction; returns rows removed (0 or 1).
    fn delete_by_customer_id(&self, customer_id: &str) -> RepoResult<usize>;
}

/// SQLite-backed customer repository.
///
/// Borrows one connection; give each thread its own connection.
pub struct SqliteCustomerRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCustomerRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    ///
    /// # Errors
    /// - `UninitializedConnection` when the schema version is not the latest.
    /// - `MissingRequiredTable` / `MissingRequiredColumn` when the
    ///   `customers` table does not have the expected shape.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }

    fn insert(&self, customer: &Customer) -> RepoResult<CustomerKey> {
        self.conn.execute(
            "INSERT INTO customers (customer_id, name, telephone, province)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                customer.customer_id.as_str(),
                customer.name.as_str(),
                customer.telephone.as_str(),
                customer.province.as_str(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn upsert(&self, key: CustomerKey, customer: &Customer) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO customers (id, customer_id, name, telephone, province)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET
                customer_id = excluded.customer_id,
                name = excluded.name,
                telephone = excluded.telephone,
                province = excluded.province,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![
                key,
                customer.customer_id.as_str(),
                customer.name.as_str(),
                customer.telephone.as_str(),
                customer.province.as_str(),
            ],
        )?;
        Ok(())
    }
}

impl CustomerRepository for SqliteCustomerRepository<'_> {
    fn save(&self, customer: &Customer) -> RepoResult<Customer> {
        customer.validate()?;

        let key = match customer.id {
            Some(key) => {
                self.upsert(key, customer)?;
                key
            }
            None => self.insert(customer)?,
        };

        Ok(customer.clone().with_key(key))
    }

    fn find_by_id(&self, id: CustomerKey) -> RepoResult<Option<Customer>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CUSTOMER_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_customer_row(row)?)),
            None => Ok(None),
        }
    }

    fn find_all(&self) -> RepoResult<Vec<Customer>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CUSTOMER_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut customers = Vec::new();
        while let Some(row) = rows.next()? {
            customers.push(parse_customer_row(row)?);
        }
        Ok(customers)
    }

    fn delete_by_id(&self, id: CustomerKey) -> RepoResult<usize> {
        let removed = self
            .conn
            .execute("DELETE FROM customers WHERE id = ?1;", [id])?;
        debug!("event=customer_delete module=repo status=ok by=id removed={removed}");
        Ok(removed)
    }

    fn count(&self) -> RepoResult<u64> {
        let total: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM customers;", [], |row| row.get(0))?;
        u64::try_from(total)
            .map_err(|_| RepoError::InvalidData(format!("negative customer count {total}")))
    }

    fn find_by_customer_id(&self, customer_id: &str) -> RepoResult<Option<Customer>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CUSTOMER_SELECT_SQL} WHERE customer_id = ?1;"))?;
        let mut rows = stmt.query([customer_id])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_customer_row(row)?)),
            None => Ok(None),
        }
    }

    fn exists_by_customer_id(&self, customer_id: &str) -> RepoResult<bool> {
        let found = self
            .conn
            .query_row(
                "SELECT 1 FROM customers WHERE customer_id = ?1;",
                [customer_id],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn delete_by_customer_id(&self, customer_id: &str) -> RepoResult<usize> {
        let removed = run_in_transaction(self.conn, |tx| -> RepoResult<usize> {
            let removed = tx.execute(
                "DELETE FROM customers WHERE customer_id = ?1;",
                [customer_id],
            )?;
            if removed > 1 {
                return Err(RepoError::InvalidData(format!(
                    "{removed} rows shared one customer_id"
                )));
            }
            Ok(removed)
        })?;

        info!(
            "event=customer_delete module=repo status=ok by=customer_id key_len={} removed={removed}",
            customer_id.chars().count()
        );
        Ok(removed)
    }
}

fn parse_customer_row(row: &Row<'_>) -> RepoResult<Customer> {
    let key: CustomerKey = row.get("id")?;
    let customer = Customer {
        id: Some(key),
        customer_id: row.get("customer_id")?,
        name: row.get("name")?,
        telephone: row.get("telephone")?,
        province: row.get("province")?,
    };
    customer
        .validate()
        .map_err(|err| RepoError::InvalidData(format!("customers row {key}: {err}")))?;
    Ok(customer)
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, "customers")? {
        return Err(RepoError::MissingRequiredTable("customers"));
    }
    for &column in REQUIRED_COLUMNS {
        if !table_has_column(conn, "customers", column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: "customers",
                column,
            });
        }
    }
    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
