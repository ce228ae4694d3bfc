//! Application pipeline for Talentflow.
//!
//! Implements the board behind recruiting: jobs own an ordered list of
//! hiring stages, applications hold a live stage pointer, and every move
//! appends to an immutable transition ledger committed atomically with
//! the pointer update. The module follows hexagonal architecture:
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
