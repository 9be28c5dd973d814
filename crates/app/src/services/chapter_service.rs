//! Chapter service — use-cases for chapter lists and reading state.

use shiori_domain::chapter::Chapter;
use shiori_domain::error::{NotFoundError, ShioriError, ValidationError};
use shiori_domain::id::{BookId, ChapterId};

use crate::ports::ChapterRepository;

/// Application service for chapter syncing and reading state.
pub struct ChapterService<R> {
    repo: R,
}

impl<R: ChapterRepository> ChapterService<R> {
    /// Create a new service backed by the given repository.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Look up a chapter by id, returning an error if not found.
    ///
    /// # Errors
    ///
    /// Returns [`ShioriError::NotFound`] when no chapter with `id` exists,
    /// or a storage error from the repository.
    pub async fn get_chapter(&self, id: ChapterId) -> Result<Chapter, ShioriError> {
        self.repo.find_chapter_by_id(id).await?.ok_or_else(|| {
            NotFoundError {
                entity: "Chapter",
                id: id.to_string(),
            }
            .into()
        })
    }

    /// All chapters of one book, ordered by chapter number.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn chapters_of(&self, book_id: BookId) -> Result<Vec<Chapter>, ShioriError> {
        self.repo.find_chapters_by_book_id(book_id).await
    }

    /// Persist a freshly fetched chapter list for a book.
    ///
    /// Every chapter is stamped with `book_id` and upserted in one
    /// transaction; chapters already present (same key) are updated in
    /// place, which preserves their row ids and read/bookmark state lives
    /// on the incoming values.
    ///
    /// # Errors
    ///
    /// Returns [`ShioriError::Validation`] if `book_id` is unsaved or any
    /// chapter fails invariants, or a storage error from the repository.
    pub async fn sync_chapters(
        &self,
        book_id: BookId,
        chapters: Vec<Chapter>,
    ) -> Result<Vec<ChapterId>, ShioriError> {
        if !book_id.is_saved() {
            return Err(ValidationError::UnsavedBook.into());
        }
        let mut stamped = chapters;
        for chapter in &mut stamped {
            chapter.book_id = book_id;
            chapter.validate()?;
        }
        tracing::debug!(book_id = %book_id, count = stamped.len(), "syncing chapters");
        self.repo.insert_chapters(stamped).await
    }

    /// Mark a chapter read or unread, returning the updated chapter.
    ///
    /// # Errors
    ///
    /// Returns [`ShioriError::NotFound`] if the chapter does not exist,
    /// or a storage error from the repository.
    pub async fn set_read(&self, id: ChapterId, read: bool) -> Result<Chapter, ShioriError> {
        let mut chapter = self.get_chapter(id).await?;
        chapter.read = read;
        self.repo.update_chapter(chapter.clone()).await?;
        Ok(chapter)
    }

    /// Bookmark or un-bookmark a chapter, returning the updated chapter.
    ///
    /// # Errors
    ///
    /// Returns [`ShioriError::NotFound`] if the chapter does not exist,
    /// or a storage error from the repository.
    pub async fn set_bookmarked(
        &self,
        id: ChapterId,
        bookmark: bool,
    ) -> Result<Chapter, ShioriError> {
        let mut chapter = self.get_chapter(id).await?;
        chapter.bookmark = bookmark;
        self.repo.update_chapter(chapter.clone()).await?;
        Ok(chapter)
    }

    /// Delete all chapters of one book.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn delete_chapters_of(&self, book_id: BookId) -> Result<(), ShioriError> {
        self.repo.delete_chapters_by_book_id(book_id).await
    }
}
