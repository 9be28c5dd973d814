//! Application services — the use-case layer consumed by view models.

pub mod chapter_service;
pub mod library_service;

pub use chapter_service::ChapterService;
pub use library_service::LibraryService;
