//! Shared tenant kernel.
//!
//! Every operation in this crate is scoped to exactly one company. The
//! surrounding system authenticates the caller and resolves a
//! [`TenantContext`] from their credentials; services accept that context
//! on every call and must never observe or mutate data belonging to
//! another company. Lookups that cross a tenant boundary report the same
//! error as lookups of absent records so that existence does not leak.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a company (tenant).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompanyId(Uuid);

impl CompanyId {
    /// Creates a new random company identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a company identifier from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the wrapped UUID.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for CompanyId {
    fn default() -> Self {
        Self::new()
    }
}

impl AsRef<Uuid> for CompanyId {
    fn as_ref(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for CompanyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a recruiter or administrator account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    /// Creates a new random user identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a user identifier from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the wrapped UUID.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl AsRef<Uuid> for UserId {
    fn as_ref(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Acting company and user resolved from the caller's credentials.
///
/// Constructed at the system boundary once authentication has succeeded;
/// the core treats it as proof that the caller is an authorised recruiter
/// of `company_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantContext {
    company_id: CompanyId,
    user_id: UserId,
}

impl TenantContext {
    /// Creates a tenant context for an authenticated caller.
    #[must_use]
    pub const fn new(company_id: CompanyId, user_id: UserId) -> Self {
        Self {
            company_id,
            user_id,
        }
    }

    /// Returns the acting company.
    #[must_use]
    pub const fn company_id(&self) -> CompanyId {
        self.company_id
    }

    /// Returns the acting user.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }
}
