//! Customer data access for the debt management application.
//! This crate is the single source of truth for customer invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, CoreConfig};
pub use db::{DbError, StorageErrorKind};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::customer::{Customer, CustomerKey, CustomerValidationError, CUSTOMER_ID_MAX_CHARS};
pub use repo::customer_repo::{CustomerRepository, RepoError, RepoResult, SqliteCustomerRepository};
pub use service::customer_service::CustomerService;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
