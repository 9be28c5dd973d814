//! # shiori-domain
//!
//! Pure domain model for the shiori reading app.
//!
//! ## Responsibilities
//! - Foundational types: typed row identifiers, error conventions, timestamps
//! - Define **Books** (library/catalog entries fetched from a source)
//! - Define **Chapters** (content units owned by exactly one book)
//! - Define **library values** (sort orderings for library queries)
//! - Define **Sources** (a closed set of source capability variants)
//! - Define **Changes** (write notifications carried on the change bus)
//! - Contain all invariant enforcement and domain logic
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod book;
pub mod change;
pub mod chapter;
pub mod library;
pub mod source;
