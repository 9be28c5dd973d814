//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into [`ShioriError`]
//! via `#[from]` — no string-typed variants. Not-found conditions in plain
//! lookups are expressed as `None`/empty results; [`NotFoundError`] is
//! reserved for use-cases where the caller asked for a specific row.

/// Top-level error for the shiori workspace.
#[derive(Debug, thiserror::Error)]
pub enum ShioriError {
    /// A domain invariant was violated.
    #[error("validation error")]
    Validation(#[from] ValidationError),

    /// A specifically requested row does not exist.
    #[error("not found")]
    NotFound(#[from] NotFoundError),

    /// A failure propagated unchanged from the storage layer.
    #[error("storage error")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Violations of domain invariants, checked by builders and services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A book must carry a non-empty source key.
    #[error("book key must not be empty")]
    EmptyBookKey,

    /// A book must carry a non-empty title.
    #[error("book title must not be empty")]
    EmptyBookTitle,

    /// A chapter must carry a non-empty source key.
    #[error("chapter key must not be empty")]
    EmptyChapterKey,

    /// A chapter must carry a non-empty name.
    #[error("chapter name must not be empty")]
    EmptyChapterName,

    /// A chapter can only be persisted against a saved book.
    #[error("chapter must reference a saved book")]
    UnsavedBook,
}

/// A lookup for a specific row came back empty.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} with id {id} not found")]
pub struct NotFoundError {
    /// Human-readable entity name, e.g. `"Book"`.
    pub entity: &'static str,
    /// The id that was requested.
    pub id: String,
}
