//! Book — a library/catalog entry representing a literary work from a source.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::id::{BookId, SourceId};
use crate::time::{Timestamp, now};

/// Publication status reported by the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookStatus {
    #[default]
    Unknown,
    Ongoing,
    Completed,
    Licensed,
    Cancelled,
    OnHiatus,
}

impl std::fmt::Display for BookStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unknown => f.write_str("unknown"),
            Self::Ongoing => f.write_str("ongoing"),
            Self::Completed => f.write_str("completed"),
            Self::Licensed => f.write_str("licensed"),
            Self::Cancelled => f.write_str("cancelled"),
            Self::OnHiatus => f.write_str("on_hiatus"),
        }
    }
}

impl std::str::FromStr for BookStatus {
    type Err = UnknownStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unknown" => Ok(Self::Unknown),
            "ongoing" => Ok(Self::Ongoing),
            "completed" => Ok(Self::Completed),
            "licensed" => Ok(Self::Licensed),
            "cancelled" => Ok(Self::Cancelled),
            "on_hiatus" => Ok(Self::OnHiatus),
            other => Err(UnknownStatusError(other.to_string())),
        }
    }
}

/// A status string that none of the [`BookStatus`] variants match.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown book status: {0}")]
pub struct UnknownStatusError(pub String);

/// A catalog or library entry.
///
/// `(source_id, key)` uniquely identifies a book within a source; the
/// storage layer enforces this with a unique index and resolves duplicate
/// inserts by upserting onto the existing row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub source_id: SourceId,
    /// Canonical URL (or path) of the book within its source.
    pub key: String,
    pub title: String,
    pub author: String,
    pub description: String,
    pub genres: Vec<String>,
    pub status: BookStatus,
    pub cover: String,
    /// Whether the book is in the user's library.
    pub favorite: bool,
    /// Whether full details have been fetched from the source.
    pub initialized: bool,
    /// Per-book behaviour bitmask (chapter display/download flags).
    pub flags: i64,
    pub last_update: Timestamp,
    pub date_added: Timestamp,
}

impl Book {
    /// Start building a book with the mandatory fields left to the caller.
    #[must_use]
    pub fn builder() -> BookBuilder {
        BookBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if the key or title is empty.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.key.trim().is_empty() {
            return Err(ValidationError::EmptyBookKey);
        }
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyBookTitle);
        }
        Ok(())
    }
}

/// Builder for [`Book`].
#[derive(Debug, Default)]
pub struct BookBuilder {
    id: BookId,
    source_id: SourceId,
    key: String,
    title: String,
    author: String,
    description: String,
    genres: Vec<String>,
    status: BookStatus,
    cover: String,
    favorite: bool,
    initialized: bool,
    flags: i64,
}

impl BookBuilder {
    #[must_use]
    pub fn id(mut self, id: BookId) -> Self {
        self.id = id;
        self
    }

    #[must_use]
    pub fn source_id(mut self, source_id: SourceId) -> Self {
        self.source_id = source_id;
        self
    }

    #[must_use]
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    #[must_use]
    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn genre(mut self, genre: impl Into<String>) -> Self {
        self.genres.push(genre.into());
        self
    }

    #[must_use]
    pub fn status(mut self, status: BookStatus) -> Self {
        self.status = status;
        self
    }

    #[must_use]
    pub fn cover(mut self, cover: impl Into<String>) -> Self {
        self.cover = cover.into();
        self
    }

    #[must_use]
    pub fn favorite(mut self, favorite: bool) -> Self {
        self.favorite = favorite;
        self
    }

    #[must_use]
    pub fn initialized(mut self, initialized: bool) -> Self {
        self.initialized = initialized;
        self
    }

    #[must_use]
    pub fn flags(mut self, flags: i64) -> Self {
        self.flags = flags;
        self
    }

    /// Finish building, stamping both timestamps with the current time.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if the key or title is empty.
    pub fn build(self) -> Result<Book, ValidationError> {
        let ts = now();
        let book = Book {
            id: self.id,
            source_id: self.source_id,
            key: self.key,
            title: self.title,
            author: self.author,
            description: self.description,
            genres: self.genres,
            status: self.status,
            cover: self.cover,
            favorite: self.favorite,
            initialized: self.initialized,
            flags: self.flags,
            last_update: ts,
            date_added: ts,
        };
        book.validate()?;
        Ok(book)
    }
}
