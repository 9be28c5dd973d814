//! # shiori-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement the repository port traits defined in `shiori-app::ports::storage`
//! - Manage `SQLite` connection pool lifecycle
//! - Run database migrations (using sqlx embedded migrations)
//! - Map between domain types and database rows
//! - Drive live queries: every write publishes a change on the in-process
//!   bus and active subscriptions re-run themselves
//!
//! ## Dependency rule
//! Depends on `shiori-app` (for port traits and the change bus) and
//! `shiori-domain` (for domain types). The `app` and `domain` crates must
//! never reference this adapter.

pub mod book_repo;
pub mod chapter_repo;
pub mod error;
pub mod handler;
pub mod pool;

pub use book_repo::SqliteBookRepository;
pub use chapter_repo::SqliteChapterRepository;
pub use error::StorageError;
pub use handler::DatabaseHandler;
pub use pool::{Config, Database};
