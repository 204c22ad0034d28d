//! Customer domain model.
//!
//! # Invariants
//! - `customer_id` is the business key: unique, non-empty, at most
//!   `CUSTOMER_ID_MAX_CHARS` characters, no ASCII whitespace or control
//!   characters.
//! - `id` is the surrogate key assigned by storage; `None` until first save.
//! - `name`, `telephone` and `province` are required and non-blank.
//! - The `customers` table CHECK constraints enforce the same rules, so every
//!   stored row passes `Customer::validate()`. Change both together.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Surrogate primary key assigned by the store.
pub type CustomerKey = i64;

/// Maximum length of a business key, in characters.
pub const CUSTOMER_ID_MAX_CHARS: usize = 64;

static CUSTOMER_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\x01-\x20\x7F]+$").expect("valid customer id regex"));

// Same set as `trim(x, char(9, 10, 11, 12, 13, 32))` in the schema.
const BLANK_CHARS: &[char] = &['\t', '\n', '\x0B', '\x0C', '\r', ' '];

/// Validation failure for customer fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CustomerValidationError {
    /// A required text field is empty after trimming ASCII whitespace.
    MissingField(&'static str),
    /// Business key is longer than `CUSTOMER_ID_MAX_CHARS`.
    CustomerIdTooLong { length: usize },
    /// Business key contains ASCII whitespace or control characters.
    InvalidCustomerId,
    /// Surrogate key is zero or negative.
    InvalidKey(CustomerKey),
}

impl Display for CustomerValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "customer field `{field}` is required"),
            Self::CustomerIdTooLong { length } => write!(
                f,
                "customer_id has {length} characters; at most {CUSTOMER_ID_MAX_CHARS} allowed"
            ),
            Self::InvalidCustomerId => {
                write!(f, "customer_id must not contain whitespace or control characters")
            }
            Self::InvalidKey(key) => write!(f, "customer key must be positive, got {key}"),
        }
    }
}

impl Error for CustomerValidationError {}

/// A debtor tracked by the application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    /// Surrogate key. Skipped on input so callers cannot pick it.
    #[serde(default, skip_deserializing)]
    pub id: Option<CustomerKey>,
    /// Business key shown to users and referenced by invoices.
    pub customer_id: String,
    pub name: String,
    pub telephone: String,
    pub province: String,
}

impl Customer {
    /// Creates an unsaved customer.
    ///
    /// Does not validate; writes through the repository do.
    pub fn new(
        customer_id: impl Into<String>,
        name: impl Into<String>,
        telephone: impl Into<String>,
        province: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            customer_id: customer_id.into(),
            name: name.into(),
            telephone: telephone.into(),
            province: province.into(),
        }
    }

    /// Returns a copy bound to the given surrogate key.
    pub fn with_key(mut self, key: CustomerKey) -> Self {
        self.id = Some(key);
        self
    }

    /// Checks every field invariant.
    ///
    /// # Errors
    /// - `InvalidKey` for a non-positive surrogate key.
    /// - `MissingField` for the first blank required field.
    /// - `CustomerIdTooLong` / `InvalidCustomerId` for a malformed business key.
    pub fn validate(&self) -> Result<(), CustomerValidationError> {
        if let Some(key) = self.id {
            if key <= 0 {
                return Err(CustomerValidationError::InvalidKey(key));
            }
        }

        validate_customer_id(&self.customer_id)?;

        for (field, value) in [
            ("name", &self.name),
            ("telephone", &self.telephone),
            ("province", &self.province),
        ] {
            if is_blank(value) {
                return Err(CustomerValidationError::MissingField(field));
            }
        }

        Ok(())
    }
}

fn validate_customer_id(customer_id: &str) -> Result<(), CustomerValidationError> {
    if customer_id.is_empty() {
        return Err(CustomerValidationError::MissingField("customer_id"));
    }
    let length = customer_id.chars().count();
    if length > CUSTOMER_ID_MAX_CHARS {
        return Err(CustomerValidationError::CustomerIdTooLong { length });
    }
    if !CUSTOMER_ID_RE.is_match(customer_id) {
        return Err(CustomerValidationError::InvalidCustomerId);
    }
    Ok(())
}

fn is_blank(value: &str) -> bool {
    value.trim_matches(BLANK_CHARS).is_empty()
}
