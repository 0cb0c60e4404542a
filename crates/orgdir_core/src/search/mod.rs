//! Search entry points over directory data.
//!
//! # Responsibility
//! - Expose lookup APIs that do not fit the per-entity repositories.
//! - Keep result shaping inside core.
//!
//! # See also
//! - `crate::repo::organization_repo` for the full read model.

pub mod name;
