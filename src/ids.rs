//! Run-identifier generation.
//!
//! Each analysis run owns a freshly generated identifier; record keys and
//! artifact names derive from it, which is what lets concurrent runs stay
//! fully independent without locking.

use uuid::Uuid;

/// Generate a collision-resistant identifier for a new run.
pub fn new_run_id() -> String {
    Uuid::new_v4().to_string()
}
