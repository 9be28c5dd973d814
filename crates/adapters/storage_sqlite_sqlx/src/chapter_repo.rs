//! `SQLite` implementation of [`ChapterRepository`].

use futures::FutureExt;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqliteConnection, SqlitePool};
use tokio_stream::{Stream, StreamExt};

use shiori_app::ports::ChapterRepository;
use shiori_domain::change::Change;
use shiori_domain::chapter::Chapter;
use shiori_domain::error::ShioriError;
use shiori_domain::id::{BookId, ChapterId};

use crate::error::StorageError;
use crate::handler::DatabaseHandler;

struct Wrapper(Chapter);

impl Wrapper {
    fn maybe(value: Option<Self>) -> Option<Chapter> {
        value.map(|w| w.0)
    }

    fn list(value: Vec<Self>) -> Vec<Chapter> {
        value.into_iter().map(|w| w.0).collect()
    }
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: i64 = row.try_get("id")?;
        let book_id: i64 = row.try_get("book_id")?;
        let url: String = row.try_get("url")?;
        let name: String = row.try_get("name")?;
        let number: f32 = row.try_get("number")?;
        let read: bool = row.try_get("read")?;
        let bookmark: bool = row.try_get("bookmark")?;
        let date_upload_str: Option<String> = row.try_get("date_upload")?;
        let translator: Option<String> = row.try_get("translator")?;
        let content_json: String = row.try_get("content")?;

        let date_upload = date_upload_str
            .map(|value| {
                chrono::DateTime::parse_from_rfc3339(&value)
                    .map(|ts| ts.to_utc())
                    .map_err(|err| sqlx::Error::Decode(Box::new(err)))
            })
            .transpose()?;
        let content: Vec<String> = serde_json::from_str(&content_json)
            .map_err(|err| sqlx::Error::Decode(Box::new(err)))?;

        Ok(Self(Chapter {
            id: ChapterId::new(id),
            book_id: BookId::new(book_id),
            key: url,
            name,
            number,
            read,
            bookmark,
            date_upload,
            translator,
            content,
        }))
    }
}

const UPSERT: &str = r"
    INSERT INTO chapters (id, book_id, url, name, number, read, bookmark,
                          date_upload, translator, content)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
    ON CONFLICT (book_id, url) DO UPDATE SET
        name = excluded.name,
        number = excluded.number,
        read = excluded.read,
        bookmark = excluded.bookmark,
        date_upload = excluded.date_upload,
        translator = excluded.translator,
        content = excluded.content
    RETURNING id
";

const UPDATE: &str = r"
    UPDATE chapters
    SET book_id = ?, url = ?, name = ?, number = ?, read = ?, bookmark = ?,
        date_upload = ?, translator = ?, content = ?
    WHERE id = ?
";

const SELECT_ALL: &str = "SELECT * FROM chapters";
const SELECT_BY_ID: &str = "SELECT * FROM chapters WHERE id = ?";
const SELECT_BY_BOOK: &str = "SELECT * FROM chapters WHERE book_id = ? ORDER BY number ASC, id ASC";
const SELECT_BY_BOOK_AND_KEY: &str = "SELECT * FROM chapters WHERE book_id = ? AND url = ?";

const DELETE_BY_ID: &str = "DELETE FROM chapters WHERE id = ?";
const DELETE_BY_BOOK: &str = "DELETE FROM chapters WHERE book_id = ?";
const DELETE_ALL: &str = "DELETE FROM chapters";

/// `SQLite`-backed chapter repository.
#[derive(Clone)]
pub struct SqliteChapterRepository {
    handler: DatabaseHandler,
}

impl SqliteChapterRepository {
    /// Create a new repository using the given handler.
    #[must_use]
    pub fn new(handler: DatabaseHandler) -> Self {
        Self { handler }
    }
}

impl ChapterRepository for SqliteChapterRepository {
    async fn find_all_chapters(&self) -> Result<Vec<Chapter>, ShioriError> {
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

    async fn find_chapter_by_id(&self, id: ChapterId) -> Result<Option<Chapter>, ShioriError> {
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

    async fn find_chapters_by_book_id(
        &self,
        book_id: BookId,
    ) -> Result<Vec<Chapter>, ShioriError> {
        let rows = self
            .handler
            .fetch_all(move |conn: &mut SqliteConnection| {
                sqlx::query_as::<_, Wrapper>(SELECT_BY_BOOK)
                    .bind(book_id.as_i64())
                    .fetch_all(conn)
                    .boxed()
            })
            .await?;
        Ok(Wrapper::list(rows))
    }

    async fn find_chapter_by_key(
        &self,
        book_id: BookId,
        key: &str,
    ) -> Result<Option<Chapter>, ShioriError> {
        let key = key.to_string();
        let row = self
            .handler
            .fetch_optional(move |conn: &mut SqliteConnection| {
                sqlx::query_as::<_, Wrapper>(SELECT_BY_BOOK_AND_KEY)
                    .bind(book_id.as_i64())
                    .bind(key)
                    .fetch_optional(conn)
                    .boxed()
            })
            .await?;
        Ok(Wrapper::maybe(row))
    }

    async fn upsert(&self, chapter: Chapter) -> Result<ChapterId, ShioriError> {
        let content = serde_json::to_string(&chapter.content).map_err(StorageError::from)?;
        let book_id = chapter.book_id;
        let id = self
            .handler
            .fetch_one(move |conn: &mut SqliteConnection| {
                sqlx::query_scalar::<_, i64>(UPSERT)
                    .bind(chapter.id.to_db())
                    .bind(chapter.book_id.as_i64())
                    .bind(chapter.key)
                    .bind(chapter.name)
                    .bind(chapter.number)
                    .bind(chapter.read)
                    .bind(chapter.bookmark)
                    .bind(chapter.date_upload.map(|ts| ts.to_rfc3339()))
                    .bind(chapter.translator)
                    .bind(content)
                    .fetch_one(conn)
                    .boxed()
            })
            .await?;

        let id = ChapterId::new(id);
        self.handler.notify(Change::ChapterUpserted { id, book_id });
        Ok(id)
    }

    async fn insert_chapters(
        &self,
        chapters: Vec<Chapter>,
    ) -> Result<Vec<ChapterId>, ShioriError> {
        let mut prepared = Vec::with_capacity(chapters.len());
        for chapter in chapters {
            let content = serde_json::to_string(&chapter.content).map_err(StorageError::from)?;
            prepared.push((chapter, content));
        }

        let ids = self
            .handler
            .execute_in_transaction(move |conn: &mut SqliteConnection| {
                async move {
                    let mut ids = Vec::with_capacity(prepared.len());
                    for (chapter, content) in prepared {
                        let id: i64 = sqlx::query_scalar(UPSERT)
                            .bind(chapter.id.to_db())
                            .bind(chapter.book_id.as_i64())
                            .bind(chapter.key)
                            .bind(chapter.name)
                            .bind(chapter.number)
                            .bind(chapter.read)
                            .bind(chapter.bookmark)
                            .bind(chapter.date_upload.map(|ts| ts.to_rfc3339()))
                            .bind(chapter.translator)
                            .bind(content)
                            .fetch_one(&mut *conn)
                            .await?;
                        ids.push(ChapterId::new(id));
                    }
                    Ok(ids)
                }
                .boxed()
            })
            .await?;

        self.handler
            .notify(Change::ChaptersInvalidated { book_id: None });
        Ok(ids)
    }

    async fn update_chapter(&self, chapter: Chapter) -> Result<(), ShioriError> {
        let content = serde_json::to_string(&chapter.content).map_err(StorageError::from)?;
        let id = chapter.id;
        let book_id = chapter.book_id;
        self.handler
            .execute(move |conn: &mut SqliteConnection| {
                sqlx::query(UPDATE)
                    .bind(chapter.book_id.as_i64())
                    .bind(chapter.key)
                    .bind(chapter.name)
                    .bind(chapter.number)
                    .bind(chapter.read)
                    .bind(chapter.bookmark)
                    .bind(chapter.date_upload.map(|ts| ts.to_rfc3339()))
                    .bind(chapter.translator)
                    .bind(content)
                    .bind(chapter.id.as_i64())
                    .execute(conn)
                    .map(|res| res.map(|_| ()))
                    .boxed()
            })
            .await?;

        self.handler.notify(Change::ChapterUpserted { id, book_id });
        Ok(())
    }

    async fn delete_chapters(&self, ids: &[ChapterId]) -> Result<(), ShioriError> {
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

        self.handler
            .notify(Change::ChaptersInvalidated { book_id: None });
        Ok(())
    }

    async fn delete_chapters_by_book_id(&self, book_id: BookId) -> Result<(), ShioriError> {
        self.handler
            .execute(move |conn: &mut SqliteConnection| {
                sqlx::query(DELETE_BY_BOOK)
                    .bind(book_id.as_i64())
                    .execute(conn)
                    .map(|res| res.map(|_| ()))
                    .boxed()
            })
            .await?;

        self.handler.notify(Change::ChaptersInvalidated {
            book_id: Some(book_id),
        });
        Ok(())
    }

    async fn delete_all_chapters(&self) -> Result<(), ShioriError> {
        self.handler
            .execute(|conn: &mut SqliteConnection| {
                sqlx::query(DELETE_ALL)
                    .execute(conn)
                    .map(|res| res.map(|_| ()))
                    .boxed()
            })
            .await?;

        self.handler
            .notify(Change::ChaptersInvalidated { book_id: None });
        Ok(())
    }

    fn subscribe_chapter_by_id(
        &self,
        id: ChapterId,
    ) -> impl Stream<Item = Result<Option<Chapter>, ShioriError>> + Send + Unpin {
        tracing::debug!(chapter_id = %id, "subscribing to chapter");
        self.handler
            .subscribe_optional(
                move |change| change.touches_chapter(id),
                move |pool: &SqlitePool| {
                    sqlx::query_as::<_, Wrapper>(SELECT_BY_ID)
                        .bind(id.as_i64())
                        .fetch_optional(pool)
                        .boxed()
                },
            )
            .map(|item| item.map(Wrapper::maybe).map_err(ShioriError::from))
    }

    fn subscribe_chapters_by_book_id(
        &self,
        book_id: BookId,
    ) -> impl Stream<Item = Result<Vec<Chapter>, ShioriError>> + Send + Unpin {
        tracing::debug!(book_id = %book_id, "subscribing to chapter list");
        self.handler
            .subscribe_list(
                move |change| change.touches_chapters_of(book_id),
                move |pool: &SqlitePool| {
                    sqlx::query_as::<_, Wrapper>(SELECT_BY_BOOK)
                        .bind(book_id.as_i64())
                        .fetch_all(pool)
                        .boxed()
                },
            )
            .map(|item| item.map(Wrapper::list).map_err(ShioriError::from))
    }
}
