//! Book retrieval: download a payload and unpack it if zip-wrapped.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use reqwest::blocking::Client;
use tracing::debug;
use url::Url;
use zip::ZipArchive;

use crate::error::RetrieveError;

const FB2_SUFFIX: &str = ".fb2";

/// Local-zip signatures: regular, empty, and spanned archives.
const ZIP_MAGICS: [&[u8; 4]; 3] = [b"PK\x03\x04", b"PK\x05\x06", b"PK\x07\x08"];

/// Download the book behind `url` into `dest_dir` and return the local
/// path of the FB2 payload.
///
/// Performs exactly one network fetch. If the response body is a zip
/// archive (detected by magic bytes, with the URL suffix as a fallback
/// when the body is too short to carry a signature), the first member
/// named `*.fb2` is extracted; an archive without one fails with
/// [`RetrieveError::NoBookInArchive`]. A bare payload is written verbatim
/// under its URL file name. Nested archives are never unpacked.
pub fn retrieve(url: &Url, dest_dir: &Path) -> Result<PathBuf, RetrieveError> {
    retrieve_with(&Client::new(), url, dest_dir)
}

/// [`retrieve`] with a caller-supplied HTTP client.
pub fn retrieve_with(http: &Client, url: &Url, dest_dir: &Path) -> Result<PathBuf, RetrieveError> {
    debug!(%url, "downloading book");
    let response = http.get(url.clone()).send()?;
    let status = response.status();
    if !status.is_success() {
        return Err(RetrieveError::HttpStatus(status.as_u16()));
    }
    let body = response.bytes()?;

    if looks_like_zip(&body, url) {
        unpack_book(&body, dest_dir)
    } else {
        let path = dest_dir.join(payload_file_name(url));
        std::fs::write(&path, &body)?;
        debug!(path = %path.display(), "saved book");
        Ok(path)
    }
}

/// Archive detection keys off the body's magic bytes, not the link name,
/// to be robust to misnamed links. The URL suffix is consulted only when
/// the body is too short for a signature.
fn looks_like_zip(body: &[u8], url: &Url) -> bool {
    match body.get(..4) {
        Some(head) => ZIP_MAGICS.iter().any(|magic| head == *magic),
        None => url.path().to_ascii_lowercase().ends_with(".zip"),
    }
}

fn unpack_book(body: &[u8], dest_dir: &Path) -> Result<PathBuf, RetrieveError> {
    let mut archive = ZipArchive::new(Cursor::new(body))?;

    let mut book_index = None;
    for i in 0..archive.len() {
        let member = archive.by_index(i)?;
        if member.name().to_ascii_lowercase().ends_with(FB2_SUFFIX) {
            book_index = Some(i);
            break;
        }
    }
    let Some(index) = book_index else {
        return Err(RetrieveError::NoBookInArchive);
    };

    let mut member = archive.by_index(index)?;
    // Directory components are dropped so a hostile member name cannot
    // escape dest_dir.
    let file_name = Path::new(member.name())
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "book.fb2".into());
    let path = dest_dir.join(file_name);

    let mut out = std::fs::File::create(&path)?;
    std::io::copy(&mut member, &mut out)?;
    debug!(path = %path.display(), "extracted book from archive");
    Ok(path)
}

/// Last non-empty URL path segment, or a fixed default when the URL has
/// no usable file name.
fn payload_file_name(url: &Url) -> String {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| "book.fb2".to_string())
}
