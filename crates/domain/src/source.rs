//! Source — where books come from, as a closed set of capability variants.
//!
//! Instead of an open class hierarchy (base source, catalog source, HTTP
//! source) dispatched dynamically, the capability sets form a tagged enum
//! and every capability query is an explicit match.

use serde::{Deserialize, Serialize};

use crate::id::SourceId;

/// Capability variant of a source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum SourceKind {
    /// Books imported from local files; nothing can be fetched.
    Local,
    /// A remote catalog whose listing can be browsed, nothing more.
    Catalog { base_url: String },
    /// A full HTTP source: browse, search, and chapter content fetch.
    Http {
        base_url: String,
        supports_latest: bool,
    },
}

/// A catalog of books the app knows how to talk to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub id: SourceId,
    pub name: String,
    /// BCP-47 language tag of the source's content.
    pub lang: String,
    pub kind: SourceKind,
}

impl Source {
    /// Whether the source exposes a browsable listing.
    #[must_use]
    pub fn supports_browsing(&self) -> bool {
        !matches!(self.kind, SourceKind::Local)
    }

    /// Whether the source can be searched.
    #[must_use]
    pub fn supports_search(&self) -> bool {
        matches!(self.kind, SourceKind::Http { .. })
    }

    /// Whether chapter content can be fetched from the source.
    #[must_use]
    pub fn supports_content_fetch(&self) -> bool {
        matches!(self.kind, SourceKind::Http { .. })
    }

    /// Whether the source exposes a "latest updates" listing.
    #[must_use]
    pub fn supports_latest(&self) -> bool {
        matches!(
            self.kind,
            SourceKind::Http {
                supports_latest: true,
                ..
            }
        )
    }

    /// Base URL for remote sources, `None` for local imports.
    #[must_use]
    pub fn base_url(&self) -> Option<&str> {
        match &self.kind {
            SourceKind::Local => None,
            SourceKind::Catalog { base_url } | SourceKind::Http { base_url, .. } => Some(base_url),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn http_source(supports_latest: bool) -> Source {
        Source {
            id: SourceId::new(2),
            name: "novelhub".to_string(),
            lang: "en".to_string(),
            kind: SourceKind::Http {
                base_url: "https://novelhub.example".to_string(),
                supports_latest,
            },
        }
    }

    #[test]
    fn should_report_no_capabilities_for_local_source() {
        let source = Source {
            id: SourceId::new(1),
            name: "local".to_string(),
            lang: "en".to_string(),
            kind: SourceKind::Local,
        };
        assert!(!source.supports_browsing());
        assert!(!source.supports_search());
        assert!(!source.supports_content_fetch());
        assert_eq!(source.base_url(), None);
    }

    #[test]
    fn should_allow_browsing_but_not_fetch_for_catalog_source() {
        let source = Source {
            id: SourceId::new(3),
            name: "catalog".to_string(),
            lang: "en".to_string(),
            kind: SourceKind::Catalog {
                base_url: "https://catalog.example".to_string(),
            },
        };
        assert!(source.supports_browsing());
        assert!(!source.supports_content_fetch());
        assert_eq!(source.base_url(), Some("https://catalog.example"));
    }

    #[test]
    fn should_report_full_capabilities_for_http_source() {
        let source = http_source(true);
        assert!(source.supports_browsing());
        assert!(source.supports_search());
        assert!(source.supports_content_fetch());
        assert!(source.supports_latest());
    }

    #[test]
    fn should_respect_latest_flag_on_http_source() {
        assert!(!http_source(false).supports_latest());
    }

    #[test]
    fn should_roundtrip_kind_through_serde() {
        let source = http_source(true);
        let json = serde_json::to_string(&source).unwrap();
        let parsed: Source = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, source);
    }
}
