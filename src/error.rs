//! Error taxonomy for the router.
//!
//! # Design Decisions
//! - A pattern that does not match is a value (`MatchResult::NoMatch`), not an error
//! - An unmatched navigation is reported through the `404` and `load` events
//! - Only structural misconfiguration is surfaced as `Err`

use thiserror::Error;

/// Errors raised by router construction and dispatch.
#[derive(Debug, Error)]
pub enum RouterError {
    /// The mount target does not exist on the surface.
    #[error("mount target '{selector}' does not exist")]
    MountTarget { selector: String },

    /// A route pattern was rejected.
    #[error("invalid pattern: {0}")]
    Pattern(#[from] PatternError),
}

impl RouterError {
    pub fn mount_target(selector: impl Into<String>) -> Self {
        Self::MountTarget {
            selector: selector.into(),
        }
    }
}

/// Pattern problems detected ahead of matching.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    /// Pattern text is empty.
    #[error("pattern is empty")]
    Empty,

    /// The same dynamic name appears more than once in one pattern.
    #[error("pattern '{pattern}' declares '[{name}]' more than once")]
    DuplicateParam { pattern: String, name: String },

    /// The compiled expression was refused by the regex engine.
    #[error("pattern '{pattern}' cannot be compiled: {reason}")]
    Invalid { pattern: String, reason: String },
}

/// Result type for router operations.
pub type RouterResult<T> = Result<T, RouterError>;
