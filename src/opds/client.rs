//! Blocking OPDS catalog client.

use reqwest::blocking::Client;
use tracing::debug;
use url::Url;

use crate::error::{BrowseError, FetchError};

use super::{CatalogPage, EntryKind, feed::parse_feed};

/// Outcome of one [`Chooser`] invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    /// Select the entry at this index of the page's entry list.
    Select(usize),
    /// Fetch the page behind the `rel="next"` link.
    NextPage,
    /// Abandon the walk.
    Cancel,
}

/// Caller-supplied selection policy driving [`CatalogClient::navigate`].
///
/// Implemented for any `FnMut(&CatalogPage) -> Choice`, which covers the
/// common case; implement the trait directly to also observe recoverable
/// errors such as a next-page request on the last page.
pub trait Chooser {
    fn choose(&mut self, page: &CatalogPage) -> Choice;

    /// Called when a requested step could not be performed. The walk
    /// continues with another [`Chooser::choose`] on the same page.
    fn on_error(&mut self, _err: &FetchError) {}
}

impl<F: FnMut(&CatalogPage) -> Choice> Chooser for F {
    fn choose(&mut self, page: &CatalogPage) -> Choice {
        self(page)
    }
}

/// Synchronous catalog client. Holds only the HTTP client; page state
/// lives on the caller's stack for the duration of one walk.
#[derive(Debug, Default)]
pub struct CatalogClient {
    http: Client,
}

impl CatalogClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a client around a preconfigured HTTP client (custom
    /// timeouts, proxy, user agent).
    pub fn with_http(http: Client) -> Self {
        Self { http }
    }

    pub fn http(&self) -> &Client {
        &self.http
    }

    /// Fetch and parse a single catalog page.
    pub fn fetch_page(&self, url: &Url) -> Result<CatalogPage, FetchError> {
        debug!(%url, "fetching catalog page");
        let response = self.http.get(url.clone()).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus(status.as_u16()));
        }
        let body = response.bytes()?;
        parse_feed(&body, url)
    }

    /// Walk the catalog from `start` until the chooser selects a
    /// downloadable entry, returning that entry's download link.
    ///
    /// The walk is a loop with exactly one fetch in flight per step:
    ///
    /// * a page with no entries at all fails with [`FetchError::Empty`];
    /// * a page with only navigable entries is a pure sub-catalog page:
    ///   the chooser picks one (its pagination, if any, is discarded) or
    ///   cancels;
    /// * otherwise the chooser sees the full page and may select any
    ///   entry or request the next page; requesting a next page that does
    ///   not exist reports [`FetchError::NoNextPage`] through
    ///   [`Chooser::on_error`] and asks again;
    /// * selecting a downloadable entry terminates the walk.
    pub fn navigate<C: Chooser>(&self, start: Url, chooser: &mut C) -> Result<Url, BrowseError> {
        let mut url = start;

        loop {
            let mut page = self.fetch_page(&url)?;
            if page.entries.is_empty() {
                return Err(FetchError::Empty.into());
            }

            let pure_subcatalog = page.downloadable().next().is_none();
            if pure_subcatalog {
                // Sub-catalog pages are not paginated independently of
                // the navigation rule.
                page.next_page = None;
            }

            url = loop {
                match chooser.choose(&page) {
                    Choice::Cancel => return Err(BrowseError::Cancelled),
                    Choice::Select(index) => match page.entries.get(index) {
                        Some(entry) if entry.kind == EntryKind::Downloadable => {
                            debug!(title = %entry.title, "selected downloadable entry");
                            return Ok(entry.target.clone());
                        }
                        Some(entry) => {
                            debug!(title = %entry.title, "descending into sub-catalog");
                            break entry.target.clone();
                        }
                        None => debug!(index, "selection index out of range, asking again"),
                    },
                    Choice::NextPage => match page.next_page.clone() {
                        Some(next) => break next,
                        None => chooser.on_error(&FetchError::NoNextPage),
                    },
                }
            };
        }
    }
}
