//! Change — a notification that a write touched the store.
//!
//! Every successful repository write publishes exactly one `Change` on the
//! in-process bus. Live queries use the filter helpers to decide whether a
//! change can affect their result set; bulk variants match conservatively
//! (table granularity), so over-notification is possible but a missed
//! re-emission is not.

use serde::{Deserialize, Serialize};

use crate::id::{BookId, ChapterId};

/// A write notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "change")]
pub enum Change {
    BookUpserted { id: BookId },
    BookDeleted { id: BookId },
    /// Bulk insert/update/delete of books; affects any book query.
    BooksInvalidated,
    ChapterUpserted { id: ChapterId, book_id: BookId },
    ChapterDeleted { id: ChapterId, book_id: BookId },
    /// Bulk chapter write, scoped to one book when known.
    ChaptersInvalidated { book_id: Option<BookId> },
}

impl Change {
    /// Whether this change can affect a query over the given book row.
    #[must_use]
    pub fn touches_book(&self, book_id: BookId) -> bool {
        match self {
            Self::BookUpserted { id } | Self::BookDeleted { id } => *id == book_id,
            Self::BooksInvalidated => true,
            Self::ChapterUpserted { .. }
            | Self::ChapterDeleted { .. }
            | Self::ChaptersInvalidated { .. } => false,
        }
    }

    /// Whether this change can affect any query over the books table.
    #[must_use]
    pub fn touches_books(&self) -> bool {
        matches!(
            self,
            Self::BookUpserted { .. } | Self::BookDeleted { .. } | Self::BooksInvalidated
        )
    }

    /// Whether this change can affect a chapter query scoped to one book.
    #[must_use]
    pub fn touches_chapters_of(&self, book: BookId) -> bool {
        match self {
            Self::ChapterUpserted { book_id, .. } | Self::ChapterDeleted { book_id, .. } => {
                *book_id == book
            }
            Self::ChaptersInvalidated { book_id } => book_id.is_none_or(|id| id == book),
            // Deleting a book cascades into its chapters.
            Self::BookDeleted { id } => *id == book,
            Self::BooksInvalidated => true,
            Self::BookUpserted { .. } => false,
        }
    }

    /// Whether this change can affect a query over a single chapter row.
    #[must_use]
    pub fn touches_chapter(&self, chapter_id: ChapterId) -> bool {
        match self {
            Self::ChapterUpserted { id, .. } | Self::ChapterDeleted { id, .. } => {
                *id == chapter_id
            }
            Self::ChaptersInvalidated { .. } | Self::BookDeleted { .. } | Self::BooksInvalidated => {
                true
            }
            Self::BookUpserted { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_match_book_change_by_id() {
        let change = Change::BookUpserted { id: BookId::new(1) };
        assert!(change.touches_book(BookId::new(1)));
        assert!(!change.touches_book(BookId::new(2)));
    }

    #[test]
    fn should_match_every_book_on_bulk_invalidation() {
        assert!(Change::BooksInvalidated.touches_book(BookId::new(99)));
        assert!(Change::BooksInvalidated.touches_books());
    }

    #[test]
    fn should_not_match_book_queries_on_chapter_changes() {
        let change = Change::ChapterUpserted {
            id: ChapterId::new(5),
            book_id: BookId::new(1),
        };
        assert!(!change.touches_book(BookId::new(1)));
        assert!(!change.touches_books());
    }

    #[test]
    fn should_scope_chapter_invalidation_to_book_when_known() {
        let scoped = Change::ChaptersInvalidated {
            book_id: Some(BookId::new(1)),
        };
        assert!(scoped.touches_chapters_of(BookId::new(1)));
        assert!(!scoped.touches_chapters_of(BookId::new(2)));

        let unscoped = Change::ChaptersInvalidated { book_id: None };
        assert!(unscoped.touches_chapters_of(BookId::new(2)));
    }

    #[test]
    fn should_treat_book_deletion_as_chapter_change() {
        let change = Change::BookDeleted { id: BookId::new(1) };
        assert!(change.touches_chapters_of(BookId::new(1)));
        assert!(!change.touches_chapters_of(BookId::new(2)));
    }

    #[test]
    fn should_match_single_chapter_by_id() {
        let change = Change::ChapterDeleted {
            id: ChapterId::new(7),
            book_id: BookId::new(1),
        };
        assert!(change.touches_chapter(ChapterId::new(7)));
        assert!(!change.touches_chapter(ChapterId::new(8)));
    }
}
