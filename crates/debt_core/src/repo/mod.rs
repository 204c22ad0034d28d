//! Repository layer: data access contracts and their SQLite implementation.
//!
//! # Invariants
//! - Repository writes enforce `Customer::validate()` before persistence.
//! - "Not found" is an empty result at this layer; semantic `NotFound`
//!   errors are raised by services.

pub mod customer_repo;
