//! OPDS catalog models and client.

mod client;
mod feed;
mod registry;

pub use client::{CatalogClient, Choice, Chooser};
pub use feed::parse_feed;
pub use registry::{CatalogRegistry, CatalogSource, JsonRegistryStore, RegistryStore};

use url::Url;

/// How a catalog entry's link classifies it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Points to another feed (a sub-catalog).
    Navigable,
    /// Points to a retrievable book payload.
    Downloadable,
}

/// One entry of a catalog page, with its link already resolved against
/// the page URL.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub title: String,
    pub kind: EntryKind,
    pub target: Url,
}

/// A single fetched catalog page. Created per fetch and never cached.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogPage {
    /// Entries in feed order; no de-duplication across pages.
    pub entries: Vec<CatalogEntry>,
    /// The `rel="next"` link resolved against the page URL, if any.
    pub next_page: Option<Url>,
}

impl CatalogPage {
    pub fn downloadable(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries
            .iter()
            .filter(|e| e.kind == EntryKind::Downloadable)
    }

    pub fn navigable(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries
            .iter()
            .filter(|e| e.kind == EntryKind::Navigable)
    }
}
