//! FictionBook 2.0 document parsing.

mod parser;

pub use parser::parse_fb2;

use std::path::Path;

use crate::book::Document;
use crate::error::ParseError;

/// Read an FB2 file from disk into a [`Document`].
///
/// # Example
///
/// ```no_run
/// use kniga::read_fb2;
///
/// let doc = read_fb2("path/to/book.fb2")?;
/// println!("Title: {:?}", doc.title);
/// # Ok::<(), kniga::ParseError>(())
/// ```
pub fn read_fb2<P: AsRef<Path>>(path: P) -> Result<Document, ParseError> {
    let bytes = std::fs::read(path)?;
    parse_fb2(&bytes)
}
