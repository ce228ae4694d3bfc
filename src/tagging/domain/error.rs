//! Error types for tagging domain validation.

use thiserror::Error;

/// Errors returned while constructing domain tagging values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TagDomainError {
    /// The tag label is empty after trimming.
    #[error("tag label must not be empty")]
    EmptyLabel,

    /// The tag label exceeds the persisted column width.
    #[error("tag label of {0} characters exceeds the 100 character limit")]
    LabelTooLong(usize),

    /// The colour is not a `#RRGGBB` hex value.
    #[error("invalid colour '{0}', expected #RRGGBB")]
    InvalidColor(String),
}
