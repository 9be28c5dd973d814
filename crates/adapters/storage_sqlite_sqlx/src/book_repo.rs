//! `SQLite` implementation of [`BookRepository`].

use futures::FutureExt;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqliteConnection, SqlitePool};
use tokio_stream::{Stream, StreamExt};

use shiori_app::ports::BookRepository;
use shiori_domain::book::{Book, BookStatus};
use shiori_domain::change::Change;
use shiori_domain::error::ShioriError;
use shiori_domain::id::{BookId, SourceId};
use shiori_domain::library::{LibrarySort, SortField};

use crate::error::StorageError;
use crate::handler::DatabaseHandler;

/// Wrapper for converting database rows into domain types without polluting
/// domain structs with database concerns.
struct Wrapper(Book);

impl Wrapper {
    fn maybe(value: Option<Self>) -> Option<Book> {
        value.map(|w| w.0)
    }

    fn list(value: Vec<Self>) -> Vec<Book> {
        value.into_iter().map(|w| w.0).collect()
    }
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: i64 = row.try_get("id")?;
        let source: i64 = row.try_get("source")?;
        let url: String = row.try_get("url")?;
        let title: String = row.try_get("title")?;
        let author: String = row.try_get("author")?;
        let description: String = row.try_get("description")?;
        let genres_json: String = row.try_get("genres")?;
        let status_str: String = row.try_get("status")?;
        let cover: String = row.try_get("cover")?;
        let favorite: bool = row.try_get("favorite")?;
        let initialized: bool = row.try_get("initialized")?;
        let flags: i64 = row.try_get("flags")?;
        let last_update_str: String = row.try_get("last_update")?;
        let date_added_str: String = row.try_get("date_added")?;

        let genres: Vec<String> = serde_json::from_str(&genres_json)
            .map_err(|err| sqlx::Error::Decode(Box::new(err)))?;
        let status: BookStatus = status_str
            .parse()
            .map_err(|err| sqlx::Error::Decode(Box::new(err)))?;
        let last_update = chrono::DateTime::parse_from_rfc3339(&last_update_str)
            .map_err(|err| sqlx::Error::Decode(Box::new(err)))?
            .to_utc();
        let date_added = chrono::DateTime::parse_from_rfc3339(&date_added_str)
            .map_err(|err| sqlx::Error::Decode(Box::new(err)))?
            .to_utc();

        Ok(Self(Book {
            id: BookId::new(id),
            source_id: SourceId::new(source),
            key: url,
            title,
            author,
            description,
            genres,
            status,
            cover,
            favorite,
            initialized,
            flags,
            last_update,
            date_added,
        }))
    }
}

const UPSERT: &str = r"
    INSERT INTO books (id, source, url, title, author, description, genres, status, cover,
                       favorite, initialized, flags, last_update, date_added)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
    ON CONFLICT (source, url) DO UPDATE SET
        title = excluded.title,
        author = excluded.author,
        description = excluded.description,
        genres = excluded.genres,
        status = excluded.status,
        cover = excluded.cover,
        favorite = excluded.favorite,
        initialized = excluded.initialized,
        flags = excluded.flags,
        last_update = excluded.last_update
    RETURNING id
";

const UPDATE: &str = r"
    UPDATE books
    SET source = ?, url = ?, title = ?, author = ?, description = ?, genres = ?,
        status = ?, cover = ?, favorite = ?, initialized = ?, flags = ?, last_update = ?
    WHERE id = ?
";

const SELECT_ALL: &str = "SELECT * FROM books";
const SELECT_BY_ID: &str = "SELECT * FROM books WHERE id = ?";
const SELECT_BY_KEY_AND_SOURCE: &str = "SELECT * FROM books WHERE url = ? AND source = ?";
const SELECT_BY_KEY: &str = "SELECT * FROM books WHERE url = ?";
const SELECT_FAVORITE_SOURCES: &str = "SELECT DISTINCT source FROM books WHERE favorite = 1";

const DELETE_BY_ID: &str = "DELETE FROM books WHERE id = ?";
const DELETE_BY_KEY: &str = "DELETE FROM books WHERE url = ?";
const DELETE_ALL: &str = "DELETE FROM books";
const DELETE_NOT_IN_LIBRARY: &str = "DELETE FROM books WHERE favorite = 0";

/// Library listing with a per-sort ORDER BY expression.
///
/// All fragments are compile-time constants; nothing user-controlled is
/// interpolated.
fn library_query(sort: LibrarySort, unread_only: bool) -> String {
    let order = match sort.field {
        SortField::Title => "books.title COLLATE NOCASE",
        SortField::DateAdded => "books.date_added",
        SortField::LastUpdate => "books.last_update",
        SortField::TotalChapters => "COUNT(chapters.id)",
        SortField::Unread => "SUM(CASE WHEN chapters.read = 0 THEN 1 ELSE 0 END)",
        SortField::LatestChapter => "MAX(chapters.date_upload)",
    };
    let direction = if sort.ascending { "ASC" } else { "DESC" };
    let having = if unread_only {
        "HAVING COALESCE(SUM(CASE WHEN chapters.read = 0 THEN 1 ELSE 0 END), 0) > 0"
    } else {
        ""
    };
    format!(
        "SELECT books.* FROM books \
         LEFT JOIN chapters ON chapters.book_id = books.id \
         WHERE books.favorite = 1 \
         GROUP BY books.id {having} \
         ORDER BY {order} {direction}"
    )
}

/// `SQLite`-backed book repository.
#[derive(Clone)]
pub struct SqliteBookRepository {
    handler: DatabaseHandler,
}

impl SqliteBookRepository {
    /// Create a new repository using the given handler.
    #[must_use]
    pub fn new(handler: DatabaseHandler) -> Self {
        Self { handler }
    }
}

impl BookRepository for SqliteBookRepository {
    async fn find_all_books(&self) -> Result<Vec<Book>, ShioriError> {
        let rows = self
            .handler
            .fetch_all(|conn: &mut SqliteConnection| {
                sqlx::query_as::<_, Wrapper>(SELECT_ALL)
                    .fetch_all(conn)
                    .boxed()
            })
            .await?;
        Ok(Wrapper::list(rows))
    }

    async fn find_book_by_id(&self, id: BookId) -> Result<Option<Book>, ShioriError> {
        let row = self
            .handler
            .fetch_optional(move |conn: &mut SqliteConnection| {
                sqlx::query_as::<_, Wrapper>(SELECT_BY_ID)
                    .bind(id.as_i64())
                    .fetch_optional(conn)
                    .boxed()
            })
            .await?;
        Ok(Wrapper::maybe(row))
    }

    async fn find_by_key(
        &self,
        key: &str,
        source_id: SourceId,
    ) -> Result<Option<Book>, ShioriError> {
        let key = key.to_string();
        let row = self
            .handler
            .fetch_optional(move |conn: &mut SqliteConnection| {
                sqlx::query_as::<_, Wrapper>(SELECT_BY_KEY_AND_SOURCE)
                    .bind(key)
                    .bind(source_id.as_i64())
                    .fetch_optional(conn)
                    .boxed()
            })
            .await?;
        Ok(Wrapper::maybe(row))
    }

    async fn find_book_by_key(&self, key: &str) -> Result<Option<Book>, ShioriError> {
        let key = key.to_string();
        let row = self
            .handler
            .fetch_optional(move |conn: &mut SqliteConnection| {
                sqlx::query_as::<_, Wrapper>(SELECT_BY_KEY)
                    .bind(key)
                    .fetch_optional(conn)
                    .boxed()
            })
            .await?;
        Ok(Wrapper::maybe(row))
    }

    async fn find_books_by_key(&self, key: &str) -> Result<Vec<Book>, ShioriError> {
        let key = key.to_string();
        let rows = self
            .handler
            .fetch_all(move |conn: &mut SqliteConnection| {
                sqlx::query_as::<_, Wrapper>(SELECT_BY_KEY)
                    .bind(key)
                    .fetch_all(conn)
                    .boxed()
            })
            .await?;
        Ok(Wrapper::list(rows))
    }

    async fn find_library_books(
        &self,
        sort: LibrarySort,
        unread_only: bool,
    ) -> Result<Vec<Book>, ShioriError> {
        let sql = library_query(sort, unread_only);
        let rows = self
            .handler
            .fetch_all(move |conn: &mut SqliteConnection| {
                async move {
                    sqlx::query_as::<_, Wrapper>(&sql)
                        .fetch_all(&mut *conn)
                        .await
                }
                .boxed()
            })
            .await?;
        Ok(Wrapper::list(rows))
    }

    async fn find_favorite_source_ids(&self) -> Result<Vec<SourceId>, ShioriError> {
        let ids = self
            .handler
            .fetch_all(|conn: &mut SqliteConnection| {
                sqlx::query_scalar::<_, i64>(SELECT_FAVORITE_SOURCES)
                    .fetch_all(conn)
                    .boxed()
            })
            .await?;
        Ok(ids.into_iter().map(SourceId::new).collect())
    }

    async fn upsert(&self, book: Book) -> Result<BookId, ShioriError> {
        let genres = serde_json::to_string(&book.genres).map_err(StorageError::from)?;
        let id = self
            .handler
            .fetch_one(move |conn: &mut SqliteConnection| {
                sqlx::query_scalar::<_, i64>(UPSERT)
                    .bind(book.id.to_db())
                    .bind(book.source_id.as_i64())
                    .bind(book.key)
                    .bind(book.title)
                    .bind(book.author)
                    .bind(book.description)
                    .bind(genres)
                    .bind(book.status.to_string())
                    .bind(book.cover)
                    .bind(book.favorite)
                    .bind(book.initialized)
                    .bind(book.flags)
                    .bind(book.last_update.to_rfc3339())
                    .bind(book.date_added.to_rfc3339())
                    .fetch_one(conn)
                    .boxed()
            })
            .await?;

        let id = BookId::new(id);
        self.handler.notify(Change::BookUpserted { id });
        Ok(id)
    }

    async fn insert_books(&self, books: Vec<Book>) -> Result<Vec<BookId>, ShioriError> {
        let mut prepared = Vec::with_capacity(books.len());
        for book in books {
            let genres = serde_json::to_string(&book.genres).map_err(StorageError::from)?;
            prepared.push((book, genres));
        }

        let ids = self
            .handler
            .execute_in_transaction(move |conn: &mut SqliteConnection| {
                async move {
                    let mut ids = Vec::with_capacity(prepared.len());
                    for (book, genres) in prepared {
                        let id: i64 = sqlx::query_scalar(UPSERT)
                            .bind(book.id.to_db())
                            .bind(book.source_id.as_i64())
                            .bind(book.key)
                            .bind(book.title)
                            .bind(book.author)
                            .bind(book.description)
                            .bind(genres)
                            .bind(book.status.to_string())
                            .bind(book.cover)
                            .bind(book.favorite)
                            .bind(book.initialized)
                            .bind(book.flags)
                            .bind(book.last_update.to_rfc3339())
                            .bind(book.date_added.to_rfc3339())
                            .fetch_one(&mut *conn)
                            .await?;
                        ids.push(BookId::new(id));
                    }
                    Ok(ids)
                }
                .boxed()
            })
            .await?;

        self.handler.notify(Change::BooksInvalidated);
        Ok(ids)
    }

    async fn update_book(&self, book: Book) -> Result<(), ShioriError> {
        let genres = serde_json::to_string(&book.genres).map_err(StorageError::from)?;
        let id = book.id;
        self.handler
            .execute(move |conn: &mut SqliteConnection| {
                sqlx::query(UPDATE)
                    .bind(book.source_id.as_i64())
                    .bind(book.key)
                    .bind(book.title)
                    .bind(book.author)
                    .bind(book.description)
                    .bind(genres)
                    .bind(book.status.to_string())
                    .bind(book.cover)
                    .bind(book.favorite)
                    .bind(book.initialized)
                    .bind(book.flags)
                    .bind(book.last_update.to_rfc3339())
                    .bind(book.id.as_i64())
                    .execute(conn)
                    .map(|res| res.map(|_| ()))
                    .boxed()
            })
            .await?;

        self.handler.notify(Change::BookUpserted { id });
        Ok(())
    }

    async fn update_books(&self, books: Vec<Book>) -> Result<(), ShioriError> {
        let mut prepared = Vec::with_capacity(books.len());
        for book in books {
            let genres = serde_json::to_string(&book.genres).map_err(StorageError::from)?;
            prepared.push((book, genres));
        }

        self.handler
            .execute_in_transaction(move |conn: &mut SqliteConnection| {
                async move {
                    for (book, genres) in prepared {
                        sqlx::query(UPDATE)
                            .bind(book.source_id.as_i64())
                            .bind(book.key)
                            .bind(book.title)
                            .bind(book.author)
                            .bind(book.description)
                            .bind(genres)
                            .bind(book.status.to_string())
                            .bind(book.cover)
                            .bind(book.favorite)
                            .bind(book.initialized)
                            .bind(book.flags)
                            .bind(book.last_update.to_rfc3339())
                            .bind(book.id.as_i64())
                            .execute(&mut *conn)
                            .await?;
                    }
                    Ok(())
                }
                .boxed()
            })
            .await?;

        self.handler.notify(Change::BooksInvalidated);
        Ok(())
    }

    async fn delete_book_by_id(&self, id: BookId) -> Result<(), ShioriError> {
        self.handler
            .execute(move |conn: &mut SqliteConnection| {
                sqlx::query(DELETE_BY_ID)
                    .bind(id.as_i64())
                    .execute(conn)
                    .map(|res| res.map(|_| ()))
                    .boxed()
            })
            .await?;

        self.handler.notify(Change::BookDeleted { id });
        Ok(())
    }

    async fn delete_books(&self, ids: &[BookId]) -> Result<(), ShioriError> {
        let ids = ids.to_vec();
        self.handler
            .execute_in_transaction(move |conn: &mut SqliteConnection| {
                async move {
                    for id in ids {
                        sqlx::query(DELETE_BY_ID)
                            .bind(id.as_i64())
                            .execute(&mut *conn)
                            .await?;
                    }
                    Ok(())
                }
                .boxed()
            })
            .await?;

        self.handler.notify(Change::BooksInvalidated);
        Ok(())
    }

    async fn delete_book_by_key(&self, key: &str) -> Result<(), ShioriError> {
        let key = key.to_string();
        self.handler
            .execute(move |conn: &mut SqliteConnection| {
                sqlx::query(DELETE_BY_KEY)
                    .bind(key)
                    .execute(conn)
                    .map(|res| res.map(|_| ()))
                    .boxed()
            })
            .await?;

        self.handler.notify(Change::BooksInvalidated);
        Ok(())
    }

    async fn delete_all_books(&self) -> Result<(), ShioriError> {
        self.handler
            .execute(|conn: &mut SqliteConnection| {
                sqlx::query(DELETE_ALL)
                    .execute(conn)
                    .map(|res| res.map(|_| ()))
                    .boxed()
            })
            .await?;

        self.handler.notify(Change::BooksInvalidated);
        Ok(())
    }

    async fn delete_not_in_library_books(&self) -> Result<(), ShioriError> {
        self.handler
            .execute(|conn: &mut SqliteConnection| {
                sqlx::query(DELETE_NOT_IN_LIBRARY)
                    .execute(conn)
                    .map(|res| res.map(|_| ()))
                    .boxed()
            })
            .await?;

        self.handler.notify(Change::BooksInvalidated);
        Ok(())
    }

    fn subscribe_book_by_id(
        &self,
        id: BookId,
    ) -> impl Stream<Item = Result<Option<Book>, ShioriError>> + Send + Unpin {
        tracing::debug!(book_id = %id, "subscribing to book");
        self.handler
            .subscribe_optional(
                move |change| change.touches_book(id),
                move |pool: &SqlitePool| {
                    sqlx::query_as::<_, Wrapper>(SELECT_BY_ID)
                        .bind(id.as_i64())
                        .fetch_optional(pool)
                        .boxed()
                },
            )
            .map(|item| {
                item.map(Wrapper::maybe).map_err(ShioriError::from)
            })
    }

    fn subscribe_books_by_key(
        &self,
        key: &str,
    ) -> impl Stream<Item = Result<Vec<Book>, ShioriError>> + Send + Unpin {
        let key = key.to_string();
        self.handler
            .subscribe_list(
                Change::touches_books,
                move |pool: &SqlitePool| {
                    sqlx::query_as::<_, Wrapper>(SELECT_BY_KEY)
                        .bind(key.clone())
                        .fetch_all(pool)
                        .boxed()
                },
            )
            .map(|item| item.map(Wrapper::list).map_err(ShioriError::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::Config;
    use shiori_app::change_bus::InProcessChangeBus;
    use shiori_domain::book::BookStatus;
    use std::time::Duration;
    use tokio::time::timeout;

    async fn setup() -> SqliteBookRepository {
        let db = Config {
            database_url: "sqlite::memory:".to_string(),
        }
        .build()
        .await
        .unwrap();
        let handler = DatabaseHandler::new(db.pool().clone(), InProcessChangeBus::new(64));
        SqliteBookRepository::new(handler)
    }

    fn test_book() -> Book {
        Book::builder()
            .source_id(SourceId::new(1))
            .key("/novel/long-night")
            .title("The Long Night")
            .author("A. Writer")
            .description("A story.")
            .genre("fantasy")
            .genre("drama")
            .status(BookStatus::Ongoing)
            .cover("https://example.org/cover.png")
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn should_upsert_and_retrieve_book_with_all_fields() {
        let repo = setup().await;
        let book = test_book();

        let id = repo.upsert(book.clone()).await.unwrap();
        assert!(id.is_saved());

        let fetched = repo.find_book_by_id(id).await.unwrap().unwrap();
        assert_eq!(fetched.source_id, book.source_id);
        assert_eq!(fetched.key, book.key);
        assert_eq!(fetched.title, book.title);
        assert_eq!(fetched.author, book.author);
        assert_eq!(fetched.description, book.description);
        assert_eq!(fetched.genres, book.genres);
        assert_eq!(fetched.status, book.status);
        assert_eq!(fetched.cover, book.cover);
        assert_eq!(fetched.favorite, book.favorite);
        assert_eq!(fetched.initialized, book.initialized);
        assert_eq!(fetched.flags, book.flags);
    }

    #[tokio::test]
    async fn should_return_none_when_book_not_found() {
        let repo = setup().await;
        let result = repo.find_book_by_id(BookId::new(404)).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn should_update_existing_row_when_upserting_same_key() {
        let repo = setup().await;
        let first = repo.upsert(test_book()).await.unwrap();

        let mut revised = test_book();
        revised.title = "The Long Night (revised)".to_string();
        let second = repo.upsert(revised).await.unwrap();

        assert_eq!(first, second);

        let all = repo.find_all_books().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].title, "The Long Night (revised)");
    }

    #[tokio::test]
    async fn should_find_book_by_key_and_source() {
        let repo = setup().await;
        repo.upsert(test_book()).await.unwrap();

        let found = repo
            .find_by_key("/novel/long-night", SourceId::new(1))
            .await
            .unwrap();
        assert!(found.is_some());

        let wrong_source = repo
            .find_by_key("/novel/long-night", SourceId::new(2))
            .await
            .unwrap();
        assert!(wrong_source.is_none());
    }

    #[tokio::test]
    async fn should_insert_books_in_bulk_and_return_ids_in_order() {
        let repo = setup().await;
        let mut other = test_book();
        other.key = "/novel/other".to_string();
        other.title = "Other".to_string();

        let ids = repo.insert_books(vec![test_book(), other]).await.unwrap();
        assert_eq!(ids.len(), 2);

        let first = repo.find_book_by_id(ids[0]).await.unwrap().unwrap();
        assert_eq!(first.title, "The Long Night");
        let second = repo.find_book_by_id(ids[1]).await.unwrap().unwrap();
        assert_eq!(second.title, "Other");
    }

    #[tokio::test]
    async fn should_update_book_fields() {
        let repo = setup().await;
        let id = repo.upsert(test_book()).await.unwrap();

        let mut book = repo.find_book_by_id(id).await.unwrap().unwrap();
        book.favorite = true;
        book.status = BookStatus::Completed;
        repo.update_book(book).await.unwrap();

        let fetched = repo.find_book_by_id(id).await.unwrap().unwrap();
        assert!(fetched.favorite);
        assert_eq!(fetched.status, BookStatus::Completed);
    }

    #[tokio::test]
    async fn should_delete_book_by_id() {
        let repo = setup().await;
        let id = repo.upsert(test_book()).await.unwrap();

        repo.delete_book_by_id(id).await.unwrap();

        let result = repo.find_book_by_id(id).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn should_leave_no_books_after_delete_all() {
        let repo = setup().await;
        repo.upsert(test_book()).await.unwrap();

        repo.delete_all_books().await.unwrap();

        assert!(repo.find_all_books().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn should_delete_only_non_library_books() {
        let repo = setup().await;
        let kept_id = repo.upsert(test_book()).await.unwrap();
        let mut kept = repo.find_book_by_id(kept_id).await.unwrap().unwrap();
        kept.favorite = true;
        repo.update_book(kept).await.unwrap();

        let mut explored = test_book();
        explored.key = "/novel/explored".to_string();
        repo.upsert(explored).await.unwrap();

        repo.delete_not_in_library_books().await.unwrap();

        let remaining = repo.find_all_books().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, kept_id);
    }

    #[tokio::test]
    async fn should_list_library_sorted_by_title() {
        let repo = setup().await;
        for (key, title) in [("/b", "Beta"), ("/a", "Alpha"), ("/c", "gamma")] {
            let book = Book::builder()
                .source_id(SourceId::new(1))
                .key(key)
                .title(title)
                .favorite(true)
                .build()
                .unwrap();
            repo.upsert(book).await.unwrap();
        }

        let books = repo
            .find_library_books(LibrarySort::default(), false)
            .await
            .unwrap();
        let titles: Vec<&str> = books.iter().map(|b| b.title.as_str()).collect();
        // COLLATE NOCASE puts "gamma" after "Beta" despite its case.
        assert_eq!(titles, vec!["Alpha", "Beta", "gamma"]);

        let reversed = repo
            .find_library_books(LibrarySort::default().reversed(), false)
            .await
            .unwrap();
        assert_eq!(reversed[0].title, "gamma");
    }

    #[tokio::test]
    async fn should_exclude_non_favorites_from_library() {
        let repo = setup().await;
        repo.upsert(test_book()).await.unwrap();

        let books = repo
            .find_library_books(LibrarySort::default(), false)
            .await
            .unwrap();
        assert!(books.is_empty());
    }

    #[tokio::test]
    async fn should_list_distinct_favorite_source_ids() {
        let repo = setup().await;
        for (key, source) in [("/a", 1), ("/b", 1), ("/c", 3)] {
            let book = Book::builder()
                .source_id(SourceId::new(source))
                .key(key)
                .title(key)
                .favorite(true)
                .build()
                .unwrap();
            repo.upsert(book).await.unwrap();
        }

        let mut sources = repo.find_favorite_source_ids().await.unwrap();
        sources.sort_unstable();
        assert_eq!(sources, vec![SourceId::new(1), SourceId::new(3)]);
    }

    #[tokio::test]
    async fn should_emit_updated_book_on_subscription_after_write() {
        let repo = setup().await;
        let id = repo.upsert(test_book()).await.unwrap();

        let mut stream = repo.subscribe_book_by_id(id);

        let first = timeout(Duration::from_secs(5), stream.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(first.title, "The Long Night");

        let mut updated = first.clone();
        updated.title = "T2".to_string();
        repo.update_book(updated).await.unwrap();

        let second = timeout(Duration::from_secs(5), stream.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(second.title, "T2");
    }

    #[tokio::test]
    async fn should_emit_none_on_subscription_after_delete() {
        let repo = setup().await;
        let id = repo.upsert(test_book()).await.unwrap();

        let mut stream = repo.subscribe_book_by_id(id);
        let _ = timeout(Duration::from_secs(5), stream.next()).await.unwrap();

        repo.delete_book_by_id(id).await.unwrap();

        let gone = timeout(Duration::from_secs(5), stream.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert!(gone.is_none());
    }

    #[tokio::test]
    async fn should_emit_matching_books_on_key_subscription() {
        let repo = setup().await;

        let mut stream = repo.subscribe_books_by_key("/novel/long-night");
        let initial = timeout(Duration::from_secs(5), stream.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert!(initial.is_empty());

        repo.upsert(test_book()).await.unwrap();

        let after_insert = timeout(Duration::from_secs(5), stream.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(after_insert.len(), 1);
        assert_eq!(after_insert[0].key, "/novel/long-night");
    }
}
