//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Enforce business invariants (tree level cap, association checks) above
//!   the persistence layer.
//!
//! # See also
//! - `crate::repo` for the traits these services are generic over.

pub mod activity_service;
pub mod building_service;
pub mod organization_service;
