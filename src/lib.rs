//! # kniga
//!
//! A FictionBook (FB2) extraction engine paired with an OPDS catalog
//! client.
//!
//! ## Features
//!
//! - Parse FB2 markup into a renderer-agnostic [`Document`] (title,
//!   cover image bytes, sections of headings and paragraphs)
//! - Walk paginated OPDS catalogs, distinguishing sub-catalogs from
//!   downloadable books, under a caller-supplied [`Chooser`]
//! - Download a book payload, unpacking zip-wrapped files on the way
//!
//! ## Quick Start
//!
//! ```no_run
//! use kniga::read_fb2;
//!
//! let doc = read_fb2("book.fb2").unwrap();
//! println!("{:?}: {} sections", doc.title, doc.sections.len());
//! ```
//!
//! ## Browsing a catalog
//!
//! ```no_run
//! use kniga::{browse_catalog, Choice, CatalogPage};
//!
//! let root = url::Url::parse("https://flibusta.is/opds").unwrap();
//! let mut take_first = |_page: &CatalogPage| Choice::Select(0);
//! let path = browse_catalog(root, &mut take_first, std::path::Path::new("/tmp")).unwrap();
//! let doc = kniga::read_fb2(path).unwrap();
//! println!("{:?}", doc.title);
//! ```

pub mod book;
pub mod error;
pub mod fb2;
pub mod opds;
pub mod retrieve;
pub(crate) mod util;

pub use book::{Document, Section};
pub use error::{BrowseError, FetchError, ParseError, RetrieveError};
pub use fb2::{parse_fb2, read_fb2};
pub use opds::{
    CatalogClient, CatalogEntry, CatalogPage, CatalogRegistry, CatalogSource, Choice, Chooser,
    EntryKind, JsonRegistryStore, RegistryStore,
};
pub use retrieve::retrieve;

use std::path::{Path, PathBuf};

use url::Url;

/// Parse a local FB2 file into a [`Document`].
pub fn open_local_book<P: AsRef<Path>>(path: P) -> Result<Document, ParseError> {
    fb2::read_fb2(path)
}

/// Walk the catalog rooted at `root` under `chooser` control, download
/// the selected book into `dest_dir`, and return its local path, ready
/// for [`read_fb2`].
pub fn browse_catalog<C: Chooser>(
    root: Url,
    chooser: &mut C,
    dest_dir: &Path,
) -> Result<PathBuf, BrowseError> {
    let client = CatalogClient::new();
    let link = client.navigate(root, chooser)?;
    let path = retrieve::retrieve_with(client.http(), &link, dest_dir)?;
    Ok(path)
}
