//! Atom feed parsing for OPDS catalog pages.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use url::Url;

use crate::error::FetchError;
use crate::util::{decode_document, local_name, resolve_entity};

use super::{CatalogEntry, CatalogPage, EntryKind};

/// A link `type` attribute containing this token marks the entry as a
/// downloadable FB2 book.
const BOOK_MIME_TOKEN: &str = "fb2";

#[derive(Default)]
struct FeedLink {
    href: Option<String>,
    rel: Option<String>,
    mime: Option<String>,
}

#[derive(Default)]
struct EntryState {
    title: Option<String>,
    links: Vec<FeedLink>,
}

/// Parse an Atom-style feed into a [`CatalogPage`], resolving every href
/// against `base` (the URL the page was fetched from).
///
/// Any link whose `type` contains the fb2 MIME token classifies its entry
/// as [`EntryKind::Downloadable`]; otherwise the entry's first link makes
/// it [`EntryKind::Navigable`]. Entries without a title or a resolvable
/// link are skipped.
pub fn parse_feed(bytes: &[u8], base: &Url) -> Result<CatalogPage, FetchError> {
    let content = decode_document(bytes);
    let mut reader = Reader::from_str(&content);
    reader.config_mut().trim_text(true);

    let mut entries: Vec<CatalogEntry> = Vec::new();
    let mut next_page: Option<Url> = None;

    let mut entry: Option<EntryState> = None;
    let mut in_title = false;
    let mut title_text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match local_name(e.name().as_ref()) {
                b"entry" => entry = Some(EntryState::default()),
                b"title" if entry.is_some() => {
                    in_title = true;
                    title_text.clear();
                }
                b"link" => handle_link(&e, entry.as_mut(), base, &mut next_page),
                _ => {}
            },
            Ok(Event::Empty(e)) => {
                if local_name(e.name().as_ref()) == b"link" {
                    handle_link(&e, entry.as_mut(), base, &mut next_page);
                }
            }
            Ok(Event::Text(e)) => {
                if in_title {
                    title_text.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Ok(Event::GeneralRef(e)) => {
                if in_title
                    && let Some(resolved) = resolve_entity(&String::from_utf8_lossy(e.as_ref()))
                {
                    title_text.push_str(&resolved);
                }
            }
            Ok(Event::End(e)) => match local_name(e.name().as_ref()) {
                b"title" => {
                    if in_title && let Some(state) = entry.as_mut() {
                        let text = title_text.trim();
                        if !text.is_empty() {
                            state.title = Some(text.to_string());
                        }
                    }
                    in_title = false;
                }
                b"entry" => {
                    if let Some(state) = entry.take()
                        && let Some(classified) = classify(state, base)
                    {
                        entries.push(classified);
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(FetchError::Malformed(e.to_string())),
            _ => {}
        }
    }

    Ok(CatalogPage { entries, next_page })
}

/// Record a `<link>` element: inside an entry it joins the entry's link
/// list, at feed level only `rel="next"` matters.
fn handle_link(
    e: &BytesStart<'_>,
    entry: Option<&mut EntryState>,
    base: &Url,
    next_page: &mut Option<Url>,
) {
    let mut link = FeedLink::default();
    for attr in e.attributes().flatten() {
        let value = || String::from_utf8_lossy(&attr.value).into_owned();
        match attr.key.as_ref() {
            b"href" => link.href = Some(value()),
            b"rel" => link.rel = Some(value()),
            b"type" => link.mime = Some(value()),
            _ => {}
        }
    }

    match entry {
        Some(state) => state.links.push(link),
        None => {
            if link.rel.as_deref() == Some("next")
                && let Some(href) = link.href
                && let Ok(url) = base.join(&href)
            {
                *next_page = Some(url);
            }
        }
    }
}

fn classify(state: EntryState, base: &Url) -> Option<CatalogEntry> {
    let title = state.title?;

    let book_link = state
        .links
        .iter()
        .find(|l| l.mime.as_deref().is_some_and(|t| t.contains(BOOK_MIME_TOKEN)));

    let (kind, link) = match book_link {
        Some(link) => (EntryKind::Downloadable, link),
        None => (EntryKind::Navigable, state.links.first()?),
    };

    let target = base.join(link.href.as_deref()?).ok()?;
    Some(CatalogEntry {
        title,
        kind,
        target,
    })
}
