//! Common types and utilities shared across ByteSize crates.
//!
//! This crate holds the shared error type and the observability helpers used by every
//! other crate in the workspace. It stays dependency-light so that the HTTP, config and
//! social crates can all depend on it without pulling in each other.
//!
//! # Overview
//!
//! - [`observability`]: Centralised tracing/logging initialisation
//! - [`BytesizeError`] and [`Result`]: Shared error handling
//!
//! # Examples
//!
//! ```rust
//! use bytesize_common::BytesizeError;
//!
//! let err = BytesizeError::Input("identifier is empty".into());
//! assert!(err.is_input());
//! assert_eq!(err.to_string(), "Input error: identifier is empty");
//! ```

pub mod observability;

/// Largest item count a single resolution may request.
pub const MAX_ITEMS_LIMIT: usize = 100;
/// Item count used when neither the caller nor the config picks one.
pub const DEFAULT_MAX_ITEMS: usize = 5;

/// Error types used across the ByteSize pipeline.
#[derive(thiserror::Error, Debug)]
pub enum BytesizeError {
    /// The caller supplied an unusable identifier or item count.
    #[error("Input error: {0}")]
    Input(String),

    /// An external collaborator (store, summarizer, notifier) failed.
    #[error("Collaborator error: {0}")]
    Collaborator(String),

    /// The caller cancelled the operation before it finished.
    #[error("Operation cancelled")]
    Cancelled,
}

impl BytesizeError {
    /// True for errors caused by caller input rather than by an upstream service.
    pub fn is_input(&self) -> bool {
        matches!(self, Self::Input(_))
    }
}

/// Convenient alias for results that use [`BytesizeError`].
pub type Result<T> = std::result::Result<T, BytesizeError>;
