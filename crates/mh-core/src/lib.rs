//! mininghub/crates/mh-core/src/lib.rs
//!
//! The central domain logic and interface definitions for MiningHub.

pub mod community;
pub mod error;
pub mod events;
pub mod models;
pub mod projects;
pub mod traits;

// Re-exporting for easier access in other crates
pub use error::*;
pub use models::*;
pub use traits::*;

use uuid::Uuid;

/// Identifiers arrive as opaque path segments; one that is not a UUID cannot
/// match any row, so it is reported as not found.
pub fn parse_id(kind: &'static str, raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::not_found(kind, raw))
}
