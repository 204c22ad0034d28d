//! Scoped write transactions.
//!
//! # Invariants
//! - The closure's writes become visible only when it returns `Ok`.
//! - Any other exit (error or unwinding) rolls the transaction back.
//! - Transactions begin IMMEDIATE so concurrent writers serialize on the
//!   database write lock instead of racing.

use log::{debug, warn};
use rusqlite::{Connection, Transaction, TransactionBehavior};

/// Runs `work` inside one IMMEDIATE transaction on `conn`.
///
/// Commits when `work` succeeds. On failure the transaction is rolled back
/// and the closure's error is returned unchanged.
///
/// # Errors
/// - Fails with the backend error when `BEGIN` or `COMMIT` fails, including
///   when `conn` already has an open transaction.
pub fn run_in_transaction<T, E, F>(conn: &Connection, work: F) -> Result<T, E>
where
    F: FnOnce(&Transaction<'_>) -> Result<T, E>,
    E: From<rusqlite::Error>,
{
    // Dropping an unfinished `Transaction` rolls back, which covers panics.
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;

    match work(&tx) {
        Ok(value) => {
            tx.commit()?;
            debug!("event=db_tx module=db status=ok outcome=commit");
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback() {
                warn!(
                    "event=db_tx module=db status=error outcome=rollback_failed error={rollback_err}"
                );
            } else {
                debug!("event=db_tx module=db status=ok outcome=rollback");
            }
            Err(err)
        }
    }
}
