//! Domain model for tag annotation.
//!
//! Models the per-company tag catalog and the set-membership association
//! between tags and applications, keeping all infrastructure concerns
//! outside of the domain boundary.

mod association;
mod error;
mod ids;
mod tag;

pub use association::{AppliedTag, PersistedAssociationData, TagAssociation};
pub use error::TagDomainError;
pub use ids::{AssociationId, TagId};
pub use tag::{PersistedTagData, Tag, TagColor, TagLabel};
