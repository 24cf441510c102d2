//! Error types for kniga operations.

use thiserror::Error;

/// Errors that can occur while parsing an FB2 document.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("malformed FB2 document: {0}")]
    Malformed(String),

    #[error("document has no body element")]
    MissingBody,
}

impl From<quick_xml::Error> for ParseError {
    fn from(e: quick_xml::Error) -> Self {
        ParseError::Malformed(e.to_string())
    }
}

impl From<std::io::Error> for ParseError {
    fn from(e: std::io::Error) -> Self {
        ParseError::Malformed(format!("I/O error: {e}"))
    }
}

/// Errors that can occur while fetching or parsing a catalog feed.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server returned HTTP {0}")]
    HttpStatus(u16),

    #[error("malformed catalog feed: {0}")]
    Malformed(String),

    #[error("catalog page has no entries")]
    Empty,

    #[error("catalog page has no next page")]
    NoNextPage,
}

/// Errors that can occur while downloading and unpacking a book.
#[derive(Error, Debug)]
pub enum RetrieveError {
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server returned HTTP {0}")]
    HttpStatus(u16),

    #[error("archive contains no .fb2 member")]
    NoBookInArchive,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

/// Errors from a full catalog walk (navigation plus retrieval).
#[derive(Error, Debug)]
pub enum BrowseError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Retrieve(#[from] RetrieveError),

    #[error("catalog browsing cancelled")]
    Cancelled,
}
