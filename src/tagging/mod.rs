//! Tag annotation for Talentflow.
//!
//! Implements the company-scoped tag catalog and the set-membership
//! association between tags and applications: at most one association
//! per `(application, tag)` pair, idempotent attach and detach, and
//! label uniqueness per company. The module follows hexagonal
//! architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
