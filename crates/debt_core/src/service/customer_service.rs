//! Customer use-case service.
//!
//! # Responsibility
//! - Provide the create/update/get/list/delete entry points callers use.
//! - Turn repository absence into semantic `NotFound` where a record is
//!   required, and key collisions into `DuplicateCustomerId`.
//!
//! # Invariants
//! - Service APIs never bypass repository validation/persistence contracts.
//! - Callers cannot choose surrogate keys; they address customers by
//!   business key only.

use crate::model::customer::Customer;
use crate::repo::customer_repo::{CustomerRepository, RepoError, RepoResult};
use log::{info, warn};

/// Use-case service wrapper for customer operations.
pub struct CustomerService<R: CustomerRepository> {
    repo: R,
}

impl<R: CustomerRepository> CustomerService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Registers a new customer and returns it with its assigned key.
    ///
    /// # Errors
    /// - `Validation` for incomplete or malformed input.
    /// - `DuplicateCustomerId` when the business key is taken.
    pub fn create_customer(&self, customer: &Customer) -> RepoResult<Customer> {
        customer.validate()?;
        if self.repo.exists_by_customer_id(&customer.customer_id)? {
            return Err(RepoError::DuplicateCustomerId(customer.customer_id.clone()));
        }

        let fresh = Customer {
            id: None,
            ..customer.clone()
        };
        let saved = self
            .repo
            .save(&fresh)
            .map_err(|err| duplicate_on_conflict(err, &fresh.customer_id))?;

        info!(
            "event=customer_create module=service status=ok key={}",
            saved.id.unwrap_or_default()
        );
        Ok(saved)
    }

    /// Replaces the customer currently known as `customer_id`.
    ///
    /// The business key may change; the surrogate key is kept.
    ///
    /// # Errors
    /// - `NotFound` when no customer has `customer_id`.
    /// - `DuplicateCustomerId` when renaming onto another customer's key.
    pub fn update_customer(&self, customer_id: &str, changes: &Customer) -> RepoResult<Customer> {
        changes.validate()?;
        let existing = self
            .repo
            .find_by_customer_id(customer_id)?
            .ok_or_else(|| RepoError::NotFound(customer_id.to_string()))?;

        if changes.customer_id != existing.customer_id
            && self.repo.exists_by_customer_id(&changes.customer_id)?
        {
            warn!("event=customer_update module=service status=error error_code=duplicate_customer_id");
            return Err(RepoError::DuplicateCustomerId(changes.customer_id.clone()));
        }

        let updated = Customer {
            id: existing.id,
            ..changes.clone()
        };
        let saved = self
            .repo
            .save(&updated)
            .map_err(|err| duplicate_on_conflict(err, &updated.customer_id))?;

        info!(
            "event=customer_update module=service status=ok key={} renamed={}",
            saved.id.unwrap_or_default(),
            saved.customer_id != existing.customer_id
        );
        Ok(saved)
    }

    /// Gets one customer by business key.
    pub fn get_customer(&self, customer_id: &str) -> RepoResult<Option<Customer>> {
        self.repo.find_by_customer_id(customer_id)
    }

    /// Lists every customer in key order.
    pub fn list_customers(&self) -> RepoResult<Vec<Customer>> {
        self.repo.find_all()
    }

    /// Deletes a customer by business key; deleting a missing key is a no-op.
    pub fn delete_customer(&self, customer_id: &str) -> RepoResult<usize> {
        self.repo.delete_by_customer_id(customer_id)
    }
}

// Covers the race where another writer claims the key between check and save.
fn duplicate_on_conflict(err: RepoError, customer_id: &str) -> RepoError {
    match err {
        RepoError::Db(db) if db.is_unique_violation() => {
            RepoError::DuplicateCustomerId(customer_id.to_string())
        }
        other => other,
    }
}
