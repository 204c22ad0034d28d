//! Domain model for the customer store.
//!
//! # Invariants
//! - Every customer has one surrogate key (storage-assigned) and one business
//!   key (caller-assigned); neither is reused while the record exists.
//! - Deletion is a hard delete; there are no tombstones.

pub mod customer;
