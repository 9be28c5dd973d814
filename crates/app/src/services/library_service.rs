//! Library service — use-cases for managing the book library.

use shiori_domain::book::Book;
use shiori_domain::error::{NotFoundError, ShioriError};
use shiori_domain::id::{BookId, SourceId};
use shiori_domain::library::LibrarySort;
use shiori_domain::source::Source;

use crate::ports::BookRepository;

/// Application service for book CRUD and library management.
pub struct LibraryService<R> {
    repo: R,
}

impl<R: BookRepository> LibraryService<R> {
    /// Create a new service backed by the given repository.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Persist a book after validating domain invariants, returning it with
    /// its assigned row id.
    ///
    /// Duplicate `(source, key)` pairs update the existing row rather than
    /// creating a second one.
    ///
    /// # Errors
    ///
    /// Returns [`ShioriError::Validation`] if invariants fail, or a storage
    /// error propagated from the repository.
    pub async fn add_book(&self, mut book: Book) -> Result<Book, ShioriError> {
        book.validate()?;
        book.id = self.repo.upsert(book.clone()).await?;
        Ok(book)
    }

    /// Bulk-persist explored books inside one transaction.
    ///
    /// # Errors
    ///
    /// Returns [`ShioriError::Validation`] if any book fails invariants, or
    /// a storage error from the repository.
    pub async fn import_books(&self, books: Vec<Book>) -> Result<Vec<BookId>, ShioriError> {
        for book in &books {
            book.validate()?;
        }
        self.repo.insert_books(books).await
    }

    /// Look up a book by id, returning an error if not found.
    ///
    /// # Errors
    ///
    /// Returns [`ShioriError::NotFound`] when no book with `id` exists,
    /// or a storage error from the repository.
    pub async fn get_book(&self, id: BookId) -> Result<Book, ShioriError> {
        self.repo.find_book_by_id(id).await?.ok_or_else(|| {
            NotFoundError {
                entity: "Book",
                id: id.to_string(),
            }
            .into()
        })
    }

    /// Library books in the requested order.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn library_books(
        &self,
        sort: LibrarySort,
        unread_only: bool,
    ) -> Result<Vec<Book>, ShioriError> {
        self.repo.find_library_books(sort, unread_only).await
    }

    /// Add a book to the library or remove it, returning the updated book.
    ///
    /// # Errors
    ///
    /// Returns [`ShioriError::NotFound`] if the book does not exist,
    /// or a storage error from the repository.
    pub async fn set_favorite(&self, id: BookId, favorite: bool) -> Result<Book, ShioriError> {
        let mut book = self.get_book(id).await?;
        book.favorite = favorite;
        tracing::debug!(book_id = %id, favorite, "updating favorite flag");
        self.repo.update_book(book.clone()).await?;
        Ok(book)
    }

    /// Remove every explored book that never made it into the library.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn remove_not_in_library(&self) -> Result<(), ShioriError> {
        tracing::debug!("pruning books not in library");
        self.repo.delete_not_in_library_books().await
    }

    /// Delete a book by id (chapters cascade via the schema).
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn delete_book(&self, id: BookId) -> Result<(), ShioriError> {
        self.repo.delete_book_by_id(id).await
    }

    /// Sources worth refreshing: those with library books whose capability
    /// set includes chapter content fetching.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn refreshable_sources(
        &self,
        sources: &[Source],
    ) -> Result<Vec<SourceId>, ShioriError> {
        let favorites = self.repo.find_favorite_source_ids().await?;
        Ok(sources
            .iter()
            .filter(|source| {
                source.supports_content_fetch() && favorites.contains(&source.id)
            })
            .map(|source| source.id)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shiori_domain::error::ValidationError;
    use shiori_domain::source::SourceKind;
    use std::collections::HashMap;
    use std::future::Future;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicI64, Ordering};
    use tokio_stream::{Stream, once};

    #[derive(Default)]
    struct InMemoryBookRepo {
        store: Mutex<HashMap<BookId, Book>>,
        next_id: AtomicI64,
    }

    impl InMemoryBookRepo {
        fn upsert_sync(&self, mut book: Book) -> BookId {
            let mut store = self.store.lock().unwrap();
            let existing = store
                .values()
                .find(|row| row.source_id == book.source_id && row.key == book.key)
                .map(|row| row.id);
            let id = existing.or_else(|| book.id.to_db().map(BookId::new)).unwrap_or_else(|| {
                BookId::new(self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
            });
            book.id = id;
            store.insert(id, book);
            id
        }
    }

    impl BookRepository for InMemoryBookRepo {
        fn find_all_books(&self) -> impl Future<Output = Result<Vec<Book>, ShioriError>> + Send {
            let result: Vec<Book> = self.store.lock().unwrap().values().cloned().collect();
            async { Ok(result) }
        }

        fn find_book_by_id(
            &self,
            id: BookId,
        ) -> impl Future<Output = Result<Option<Book>, ShioriError>> + Send {
            let result = self.store.lock().unwrap().get(&id).cloned();
            async { Ok(result) }
        }

        fn find_by_key(
            &self,
            key: &str,
            source_id: SourceId,
        ) -> impl Future<Output = Result<Option<Book>, ShioriError>> + Send {
            let result = self
                .store
                .lock()
                .unwrap()
                .values()
                .find(|book| book.key == key && book.source_id == source_id)
                .cloned();
            async { Ok(result) }
        }

        fn find_book_by_key(
            &self,
            key: &str,
        ) -> impl Future<Output = Result<Option<Book>, ShioriError>> + Send {
            let result = self
                .store
                .lock()
                .unwrap()
                .values()
                .find(|book| book.key == key)
                .cloned();
            async { Ok(result) }
        }

        fn find_books_by_key(
            &self,
            key: &str,
        ) -> impl Future<Output = Result<Vec<Book>, ShioriError>> + Send {
            let result: Vec<Book> = self
                .store
                .lock()
                .unwrap()
                .values()
                .filter(|book| book.key == key)
                .cloned()
                .collect();
            async { Ok(result) }
        }

        fn find_library_books(
            &self,
            sort: LibrarySort,
            _unread_only: bool,
        ) -> impl Future<Output = Result<Vec<Book>, ShioriError>> + Send {
            let mut result: Vec<Book> = self
                .store
                .lock()
                .unwrap()
                .values()
                .filter(|book| book.favorite)
                .cloned()
                .collect();
            result.sort_by(|a, b| a.title.cmp(&b.title));
            if !sort.ascending {
                result.reverse();
            }
            async { Ok(result) }
        }

        fn find_favorite_source_ids(
            &self,
        ) -> impl Future<Output = Result<Vec<SourceId>, ShioriError>> + Send {
            let mut result: Vec<SourceId> = self
                .store
                .lock()
                .unwrap()
                .values()
                .filter(|book| book.favorite)
                .map(|book| book.source_id)
                .collect();
            result.sort_unstable();
            result.dedup();
            async { Ok(result) }
        }

        fn upsert(&self, book: Book) -> impl Future<Output = Result<BookId, ShioriError>> + Send {
            let id = self.upsert_sync(book);
            async move { Ok(id) }
        }

        fn insert_books(
            &self,
            books: Vec<Book>,
        ) -> impl Future<Output = Result<Vec<BookId>, ShioriError>> + Send {
            let ids: Vec<BookId> = books.into_iter().map(|book| self.upsert_sync(book)).collect();
            async move { Ok(ids) }
        }

        fn update_book(&self, book: Book) -> impl Future<Output = Result<(), ShioriError>> + Send {
            self.store.lock().unwrap().insert(book.id, book);
            async { Ok(()) }
        }

        fn update_books(
            &self,
            books: Vec<Book>,
        ) -> impl Future<Output = Result<(), ShioriError>> + Send {
            let mut store = self.store.lock().unwrap();
            for book in books {
                store.insert(book.id, book);
            }
            drop(store);
            async { Ok(()) }
        }

        fn delete_book_by_id(
            &self,
            id: BookId,
        ) -> impl Future<Output = Result<(), ShioriError>> + Send {
            self.store.lock().unwrap().remove(&id);
            async { Ok(()) }
        }

        fn delete_books(
            &self,
            ids: &[BookId],
        ) -> impl Future<Output = Result<(), ShioriError>> + Send {
            let mut store = self.store.lock().unwrap();
            for id in ids {
                store.remove(id);
            }
            drop(store);
            async { Ok(()) }
        }

        fn delete_book_by_key(
            &self,
            key: &str,
        ) -> impl Future<Output = Result<(), ShioriError>> + Send {
            self.store.lock().unwrap().retain(|_, book| book.key != key);
            async { Ok(()) }
        }

        fn delete_all_books(&self) -> impl Future<Output = Result<(), ShioriError>> + Send {
            self.store.lock().unwrap().clear();
            async { Ok(()) }
        }

        fn delete_not_in_library_books(
            &self,
        ) -> impl Future<Output = Result<(), ShioriError>> + Send {
            self.store.lock().unwrap().retain(|_, book| book.favorite);
            async { Ok(()) }
        }

        fn subscribe_book_by_id(
            &self,
            id: BookId,
        ) -> impl Stream<Item = Result<Option<Book>, ShioriError>> + Send + Unpin {
            once(Ok(self.store.lock().unwrap().get(&id).cloned()))
        }

        fn subscribe_books_by_key(
            &self,
            key: &str,
        ) -> impl Stream<Item = Result<Vec<Book>, ShioriError>> + Send + Unpin {
            let result: Vec<Book> = self
                .store
                .lock()
                .unwrap()
                .values()
                .filter(|book| book.key == key)
                .cloned()
                .collect();
            once(Ok(result))
        }
    }

    fn make_service() -> LibraryService<InMemoryBookRepo> {
        LibraryService::new(InMemoryBookRepo::default())
    }

    fn valid_book() -> Book {
        Book::builder()
            .source_id(SourceId::new(1))
            .key("/novel/long-night")
            .title("The Long Night")
            .build()
            .unwrap()
    }

    fn http_source(id: i64) -> Source {
        Source {
            id: SourceId::new(id),
            name: "novelhub".to_string(),
            lang: "en".to_string(),
            kind: SourceKind::Http {
                base_url: "https://novelhub.example".to_string(),
                supports_latest: true,
            },
        }
    }

    #[tokio::test]
    async fn should_add_book_and_assign_id() {
        let svc = make_service();
        let added = svc.add_book(valid_book()).await.unwrap();
        assert!(added.id.is_saved());

        let fetched = svc.get_book(added.id).await.unwrap();
        assert_eq!(fetched.title, "The Long Night");
    }

    #[tokio::test]
    async fn should_reject_add_when_title_is_empty() {
        let svc = make_service();
        let mut book = valid_book();
        book.title = String::new();

        let result = svc.add_book(book).await;
        assert!(matches!(
            result,
            Err(ShioriError::Validation(ValidationError::EmptyBookTitle))
        ));
    }

    #[tokio::test]
    async fn should_update_existing_row_when_adding_same_key_twice() {
        let svc = make_service();
        let first = svc.add_book(valid_book()).await.unwrap();

        let mut again = valid_book();
        again.title = "The Long Night (revised)".to_string();
        let second = svc.add_book(again).await.unwrap();

        assert_eq!(first.id, second.id);
        let fetched = svc.get_book(first.id).await.unwrap();
        assert_eq!(fetched.title, "The Long Night (revised)");
    }

    #[tokio::test]
    async fn should_return_not_found_when_book_missing() {
        let svc = make_service();
        let result = svc.get_book(BookId::new(404)).await;
        assert!(matches!(result, Err(ShioriError::NotFound(_))));
    }

    #[tokio::test]
    async fn should_import_books_in_bulk() {
        let svc = make_service();
        let mut other = valid_book();
        other.key = "/novel/other".to_string();

        let ids = svc.import_books(vec![valid_book(), other]).await.unwrap();
        assert_eq!(ids.len(), 2);
        assert_ne!(ids[0], ids[1]);
    }

    #[tokio::test]
    async fn should_toggle_favorite_flag() {
        let svc = make_service();
        let added = svc.add_book(valid_book()).await.unwrap();

        let updated = svc.set_favorite(added.id, true).await.unwrap();
        assert!(updated.favorite);

        let fetched = svc.get_book(added.id).await.unwrap();
        assert!(fetched.favorite);
    }

    #[tokio::test]
    async fn should_prune_books_not_in_library() {
        let svc = make_service();
        let kept = svc.add_book(valid_book()).await.unwrap();
        svc.set_favorite(kept.id, true).await.unwrap();

        let mut explored = valid_book();
        explored.key = "/novel/explored".to_string();
        let explored = svc.add_book(explored).await.unwrap();

        svc.remove_not_in_library().await.unwrap();

        assert!(svc.get_book(kept.id).await.is_ok());
        assert!(matches!(
            svc.get_book(explored.id).await,
            Err(ShioriError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn should_list_library_sorted_by_title() {
        let svc = make_service();
        for (key, title) in [("/b", "Beta"), ("/a", "Alpha")] {
            let book = Book::builder()
                .source_id(SourceId::new(1))
                .key(key)
                .title(title)
                .favorite(true)
                .build()
                .unwrap();
            svc.add_book(book).await.unwrap();
        }

        let books = svc
            .library_books(LibrarySort::default(), false)
            .await
            .unwrap();
        let titles: Vec<&str> = books.iter().map(|book| book.title.as_str()).collect();
        assert_eq!(titles, vec!["Alpha", "Beta"]);
    }

    #[tokio::test]
    async fn should_only_report_fetchable_favorite_sources_as_refreshable() {
        let svc = make_service();
        let mut book = valid_book();
        book.favorite = true;
        svc.add_book(book).await.unwrap();

        let local = Source {
            id: SourceId::new(1),
            name: "local".to_string(),
            lang: "en".to_string(),
            kind: SourceKind::Local,
        };

        // Same id as the favorite's source, but only the HTTP variant
        // supports content fetching.
        let refreshable = svc.refreshable_sources(&[http_source(1)]).await.unwrap();
        assert_eq!(refreshable, vec![SourceId::new(1)]);

        let none = svc.refreshable_sources(&[local]).await.unwrap();
        assert!(none.is_empty());

        let not_favorite = svc.refreshable_sources(&[http_source(9)]).await.unwrap();
        assert!(not_favorite.is_empty());
    }
}
