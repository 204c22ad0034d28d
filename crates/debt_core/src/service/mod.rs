//! Core use-case services.
//!
//! Keeps callers (CLI, future HTTP layer) decoupled from storage details.

pub mod customer_service;
