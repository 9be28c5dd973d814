//! Library values — sort orderings for library list queries.

use serde::{Deserialize, Serialize};

/// Criterion used to order library queries.
///
/// This is a value object, not a persisted entity; the storage layer maps
/// each variant onto an ORDER BY expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    Title,
    DateAdded,
    LastUpdate,
    TotalChapters,
    Unread,
    LatestChapter,
}

/// Complete sort specification: a field plus a direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibrarySort {
    pub field: SortField,
    pub ascending: bool,
}

impl Default for LibrarySort {
    fn default() -> Self {
        Self {
            field: SortField::Title,
            ascending: true,
        }
    }
}

impl LibrarySort {
    /// Build a sort specification.
    #[must_use]
    pub fn new(field: SortField, ascending: bool) -> Self {
        Self { field, ascending }
    }

    /// The same field with the direction flipped.
    #[must_use]
    pub fn reversed(self) -> Self {
        Self {
            ascending: !self.ascending,
            ..self
        }
    }
}
