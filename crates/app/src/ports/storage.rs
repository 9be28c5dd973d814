//! Storage port — repository traits for persistence.
//!
//! Plain lookups return `None`/empty for "not found" and only fail on
//! storage errors. Subscription methods return live streams: the current
//! result is emitted immediately and re-emitted after every write that can
//! affect it, until the stream is dropped.

use std::future::Future;

use tokio_stream::Stream;

use shiori_domain::book::Book;
use shiori_domain::chapter::Chapter;
use shiori_domain::error::ShioriError;
use shiori_domain::id::{BookId, ChapterId, SourceId};
use shiori_domain::library::LibrarySort;

/// Repository for [`Book`] rows.
pub trait BookRepository {
    /// All books, library and explored alike.
    fn find_all_books(&self) -> impl Future<Output = Result<Vec<Book>, ShioriError>> + Send;

    /// Look up one book by row id.
    fn find_book_by_id(
        &self,
        id: BookId,
    ) -> impl Future<Output = Result<Option<Book>, ShioriError>> + Send;

    /// Look up one book by `(key, source)` — the unique pair within a source.
    fn find_by_key(
        &self,
        key: &str,
        source_id: SourceId,
    ) -> impl Future<Output = Result<Option<Book>, ShioriError>> + Send;

    /// First book matching a key, across all sources.
    fn find_book_by_key(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<Option<Book>, ShioriError>> + Send;

    /// All books matching a key, across all sources.
    fn find_books_by_key(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<Vec<Book>, ShioriError>> + Send;

    /// Library (favorite) books in the requested order, optionally
    /// restricted to books with unread chapters.
    fn find_library_books(
        &self,
        sort: LibrarySort,
        unread_only: bool,
    ) -> impl Future<Output = Result<Vec<Book>, ShioriError>> + Send;

    /// Distinct source ids of library books.
    fn find_favorite_source_ids(
        &self,
    ) -> impl Future<Output = Result<Vec<SourceId>, ShioriError>> + Send;

    /// Insert or update on the `(source, key)` conflict key, returning the
    /// generated (or existing) row id.
    fn upsert(&self, book: Book) -> impl Future<Output = Result<BookId, ShioriError>> + Send;

    /// Bulk upsert inside one transaction; ids come back in input order.
    fn insert_books(
        &self,
        books: Vec<Book>,
    ) -> impl Future<Output = Result<Vec<BookId>, ShioriError>> + Send;

    /// Update an existing row by id.
    fn update_book(&self, book: Book) -> impl Future<Output = Result<(), ShioriError>> + Send;

    /// Update several existing rows inside one transaction.
    fn update_books(
        &self,
        books: Vec<Book>,
    ) -> impl Future<Output = Result<(), ShioriError>> + Send;

    fn delete_book_by_id(&self, id: BookId)
    -> impl Future<Output = Result<(), ShioriError>> + Send;

    /// Delete several rows inside one transaction.
    fn delete_books(
        &self,
        ids: &[BookId],
    ) -> impl Future<Output = Result<(), ShioriError>> + Send;

    fn delete_book_by_key(&self, key: &str)
    -> impl Future<Output = Result<(), ShioriError>> + Send;

    fn delete_all_books(&self) -> impl Future<Output = Result<(), ShioriError>> + Send;

    /// Remove every book that is not in the library (explore leftovers).
    fn delete_not_in_library_books(&self)
    -> impl Future<Output = Result<(), ShioriError>> + Send;

    /// Live view of one book row; emits `None` once the row is deleted.
    fn subscribe_book_by_id(
        &self,
        id: BookId,
    ) -> impl Stream<Item = Result<Option<Book>, ShioriError>> + Send + Unpin;

    /// Live view of every book matching a key.
    fn subscribe_books_by_key(
        &self,
        key: &str,
    ) -> impl Stream<Item = Result<Vec<Book>, ShioriError>> + Send + Unpin;
}

/// Repository for [`Chapter`] rows.
pub trait ChapterRepository {
    fn find_all_chapters(&self) -> impl Future<Output = Result<Vec<Chapter>, ShioriError>> + Send;

    fn find_chapter_by_id(
        &self,
        id: ChapterId,
    ) -> impl Future<Output = Result<Option<Chapter>, ShioriError>> + Send;

    /// Chapters of one book, ordered by chapter number.
    fn find_chapters_by_book_id(
        &self,
        book_id: BookId,
    ) -> impl Future<Output = Result<Vec<Chapter>, ShioriError>> + Send;

    /// Look up one chapter by `(book, key)` — the unique pair within a book.
    fn find_chapter_by_key(
        &self,
        book_id: BookId,
        key: &str,
    ) -> impl Future<Output = Result<Option<Chapter>, ShioriError>> + Send;

    /// Insert or update on the `(book, key)` conflict key, returning the
    /// generated (or existing) row id.
    fn upsert(&self, chapter: Chapter)
    -> impl Future<Output = Result<ChapterId, ShioriError>> + Send;

    /// Bulk upsert inside one transaction; ids come back in input order.
    fn insert_chapters(
        &self,
        chapters: Vec<Chapter>,
    ) -> impl Future<Output = Result<Vec<ChapterId>, ShioriError>> + Send;

    /// Update an existing row by id.
    fn update_chapter(
        &self,
        chapter: Chapter,
    ) -> impl Future<Output = Result<(), ShioriError>> + Send;

    /// Delete several rows inside one transaction.
    fn delete_chapters(
        &self,
        ids: &[ChapterId],
    ) -> impl Future<Output = Result<(), ShioriError>> + Send;

    fn delete_chapters_by_book_id(
        &self,
        book_id: BookId,
    ) -> impl Future<Output = Result<(), ShioriError>> + Send;

    fn delete_all_chapters(&self) -> impl Future<Output = Result<(), ShioriError>> + Send;

    /// Live view of one chapter row; emits `None` once the row is deleted.
    fn subscribe_chapter_by_id(
        &self,
        id: ChapterId,
    ) -> impl Stream<Item = Result<Option<Chapter>, ShioriError>> + Send + Unpin;

    /// Live view of one book's chapter list.
    fn subscribe_chapters_by_book_id(
        &self,
        book_id: BookId,
    ) -> impl Stream<Item = Result<Vec<Chapter>, ShioriError>> + Send + Unpin;
}
