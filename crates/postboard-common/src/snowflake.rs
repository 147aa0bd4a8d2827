//! Time-sortable ID generation.
//!
//! Posts and users are keyed by UUID v7: globally unique, ordered by creation
//! time, generated without coordination.

use uuid::Uuid;

/// Generate a new time-sortable ID.
pub fn generate_id() -> Uuid {
    Uuid::now_v7()
}
