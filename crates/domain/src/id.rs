//! Typed identifier newtypes backed by SQLite row ids.
//!
//! A value of `0` marks an entity that has not been persisted yet; the
//! storage layer binds it as NULL so the database assigns the next rowid.

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[doc = $doc:expr])* $name:ident) => {
        $(#[doc = $doc])*
        #[derive(
            Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash,
            Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Sentinel for an entity that has no database row yet.
            pub const UNSAVED: Self = Self(0);

            /// Wrap an existing row id.
            #[must_use]
            pub const fn new(raw: i64) -> Self {
                Self(raw)
            }

            /// Access the raw row id.
            #[must_use]
            pub const fn as_i64(self) -> i64 {
                self.0
            }

            /// Whether this id refers to a persisted row.
            #[must_use]
            pub const fn is_saved(self) -> bool {
                self.0 > 0
            }

            /// Value to bind in an insert: `None` lets the database
            /// assign the next rowid.
            #[must_use]
            pub fn to_db(self) -> Option<i64> {
                self.is_saved().then_some(self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.parse().map(Self)
            }
        }

        impl From<i64> for $name {
            fn from(raw: i64) -> Self {
                Self(raw)
            }
        }
    };
}

define_id!(
    /// Unique identifier for a [`Book`](crate::book::Book).
    BookId
);

define_id!(
    /// Unique identifier for a [`Chapter`](crate::chapter::Chapter).
    ChapterId
);

define_id!(
    /// Stable identifier for a [`Source`](crate::source::Source).
    SourceId
);
