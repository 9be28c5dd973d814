//! # shiori-app
//!
//! Application layer — use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `BookRepository` — CRUD, library queries, and live subscriptions for books
//!   - `ChapterRepository` — the same for chapters
//! - Define **driving/inbound ports** as use-case structs:
//!   - `LibraryService` — add, import, favorite, and query library books
//!   - `ChapterService` — sync, read/bookmark, and query chapters
//! - Provide **in-process infrastructure** that doesn't need IO:
//!   - the change bus (write notifications feeding live queries)
//!   - `Preference<T>` reactive settings values
//! - Orchestrate domain objects without knowing *how* persistence works
//!
//! ## Dependency rule
//! Depends on `shiori-domain` only (plus `tokio::sync` for channels).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod change_bus;
pub mod ports;
pub mod preferences;
pub mod services;
