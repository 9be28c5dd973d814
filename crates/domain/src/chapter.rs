//! Chapter — a content unit owned by exactly one book.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::id::{BookId, ChapterId};
use crate::time::Timestamp;

/// A single chapter of a [`Book`](crate::book::Book).
///
/// Chapters have no independent lifecycle: the schema deletes them when
/// their owning book is deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    pub id: ChapterId,
    pub book_id: BookId,
    /// Canonical URL (or path) of the chapter within its source.
    pub key: String,
    pub name: String,
    /// Source-reported chapter number; `-1.0` when the source has none.
    pub number: f32,
    pub read: bool,
    pub bookmark: bool,
    pub date_upload: Option<Timestamp>,
    pub translator: Option<String>,
    /// Ordered text segments; empty until the chapter has been downloaded.
    pub content: Vec<String>,
}

impl Chapter {
    /// Start building a chapter with the mandatory fields left to the caller.
    #[must_use]
    pub fn builder() -> ChapterBuilder {
        ChapterBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if the key or name is empty.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.key.trim().is_empty() {
            return Err(ValidationError::EmptyChapterKey);
        }
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyChapterName);
        }
        Ok(())
    }

    /// Whether the chapter body has been downloaded.
    #[must_use]
    pub fn is_downloaded(&self) -> bool {
        !self.content.is_empty()
    }
}

/// Builder for [`Chapter`].
#[derive(Debug, Default)]
pub struct ChapterBuilder {
    id: ChapterId,
    book_id: BookId,
    key: String,
    name: String,
    number: Option<f32>,
    read: bool,
    bookmark: bool,
    date_upload: Option<Timestamp>,
    translator: Option<String>,
    content: Vec<String>,
}

impl ChapterBuilder {
    #[must_use]
    pub fn id(mut self, id: ChapterId) -> Self {
        self.id = id;
        self
    }

    #[must_use]
    pub fn book_id(mut self, book_id: BookId) -> Self {
        self.book_id = book_id;
        self
    }

    #[must_use]
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn number(mut self, number: f32) -> Self {
        self.number = Some(number);
        self
    }

    #[must_use]
    pub fn read(mut self, read: bool) -> Self {
        self.read = read;
        self
    }

    #[must_use]
    pub fn bookmark(mut self, bookmark: bool) -> Self {
        self.bookmark = bookmark;
        self
    }

    #[must_use]
    pub fn date_upload(mut self, ts: Timestamp) -> Self {
        self.date_upload = Some(ts);
        self
    }

    #[must_use]
    pub fn translator(mut self, translator: impl Into<String>) -> Self {
        self.translator = Some(translator.into());
        self
    }

    #[must_use]
    pub fn content(mut self, content: Vec<String>) -> Self {
        self.content = content;
        self
    }

    /// Finish building.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if the key or name is empty.
    pub fn build(self) -> Result<Chapter, ValidationError> {
        let chapter = Chapter {
            id: self.id,
            book_id: self.book_id,
            key: self.key,
            name: self.name,
            number: self.number.unwrap_or(-1.0),
            read: self.read,
            bookmark: self.bookmark,
            date_upload: self.date_upload,
            translator: self.translator,
            content: self.content,
        };
        chapter.validate()?;
        Ok(chapter)
    }
}
