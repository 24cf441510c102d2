//! Streaming FB2 parser built on quick-xml events.
//!
//! One pass over the document collects the embedded binary resources,
//! the cover-page reference, and the top-level body sections; the cover
//! reference is resolved against the binaries once the pass completes.

use std::collections::HashMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use quick_xml::Reader;
use quick_xml::events::Event;

use crate::book::{Document, Section};
use crate::error::ParseError;
use crate::util::{decode_document, local_name, resolve_entity};

/// Parse FB2 markup bytes into a [`Document`].
///
/// Fails only on malformed markup or a missing `<body>` element. A missing
/// or undecodable cover resource, an empty section, or a binary element
/// that fails base64 decoding all degrade gracefully instead of aborting
/// the parse. Pure function of its input.
pub fn parse_fb2(bytes: &[u8]) -> Result<Document, ParseError> {
    let content = decode_document(bytes);
    let mut reader = Reader::from_str(&content);
    reader.config_mut().trim_text(true);

    // Binary resources, decoded in the same pass and discarded once the
    // cover reference resolves.
    let mut binaries: HashMap<String, Vec<u8>> = HashMap::new();
    let mut binary_id: Option<String> = None;
    let mut binary_text = String::new();

    let mut in_coverpage = false;
    let mut cover_href: Option<String> = None;

    // Only the first body holds content sections; later bodies carry
    // footnotes and comments.
    let mut body_seen = false;
    let mut in_body = false;

    let mut section_depth = 0usize;
    // Element depth relative to the current top-level section, so that
    // only the section's own children count: 0 is the section itself,
    // 1 its direct children. Paragraphs inside <epigraph>, <annotation>
    // and the like sit deeper and are not section paragraphs.
    let mut elem_depth = 0usize;
    let mut sections: Vec<Section> = Vec::new();
    let mut current: Option<Section> = None;

    let mut in_title = false;
    let mut in_para = false;
    let mut para_text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = e.name();
                let local = local_name(name.as_ref());

                let parent_depth = elem_depth;
                if in_body && section_depth >= 1 && local != b"section" {
                    elem_depth += 1;
                }

                match local {
                    b"binary" => {
                        binary_id = None;
                        binary_text.clear();
                        for attr in e.attributes().flatten() {
                            if attr.key.as_ref() == b"id" {
                                binary_id = String::from_utf8(attr.value.to_vec()).ok();
                            }
                        }
                    }
                    b"coverpage" => in_coverpage = true,
                    b"image" if in_coverpage => {
                        if cover_href.is_none() {
                            cover_href = image_href(&e);
                        }
                    }
                    b"body" => {
                        if !body_seen {
                            in_body = true;
                        }
                        body_seen = true;
                    }
                    b"section" if in_body => {
                        section_depth += 1;
                        if section_depth == 1 {
                            current = Some(Section::new());
                            elem_depth = 0;
                        } else {
                            elem_depth += 1;
                        }
                    }
                    b"title" if in_body && section_depth == 1 && parent_depth == 0 => {
                        in_title = true;
                    }
                    // A section paragraph is a direct child of the section;
                    // a heading paragraph is a direct child of its title.
                    b"p" if in_body
                        && section_depth == 1
                        && ((in_title && parent_depth == 1)
                            || (!in_title && parent_depth == 0)) =>
                    {
                        in_para = true;
                        para_text.clear();
                    }
                    _ => {}
                }
            }
            Ok(Event::Empty(e)) => {
                if in_coverpage && local_name(e.name().as_ref()) == b"image" && cover_href.is_none()
                {
                    cover_href = image_href(&e);
                }
            }
            Ok(Event::Text(e)) => {
                let raw = String::from_utf8_lossy(e.as_ref());
                if binary_id.is_some() {
                    binary_text.push_str(&raw);
                } else if in_para {
                    para_text.push_str(&raw);
                }
            }
            Ok(Event::GeneralRef(e)) => {
                if in_para
                    && let Some(resolved) = resolve_entity(&String::from_utf8_lossy(e.as_ref()))
                {
                    para_text.push_str(&resolved);
                }
            }
            Ok(Event::End(e)) => {
                let name = e.name();
                let local = local_name(name.as_ref());

                if in_body && section_depth >= 1 && local != b"section" {
                    elem_depth = elem_depth.saturating_sub(1);
                }

                match local {
                    b"binary" => {
                        if let Some(id) = binary_id.take() {
                            store_binary(&mut binaries, id, &binary_text);
                        }
                        binary_text.clear();
                    }
                    b"coverpage" => in_coverpage = false,
                    b"body" => in_body = false,
                    b"section" if in_body => {
                        if section_depth == 1 {
                            if let Some(section) = current.take() {
                                sections.push(section);
                            }
                        } else {
                            elem_depth = elem_depth.saturating_sub(1);
                        }
                        section_depth = section_depth.saturating_sub(1);
                    }
                    b"title" => in_title = false,
                    b"p" if in_para => {
                        in_para = false;
                        let text = para_text.trim();
                        if !text.is_empty()
                            && let Some(section) = current.as_mut()
                        {
                            if in_title {
                                // Multi-paragraph titles keep only the first
                                // non-empty paragraph text.
                                if section.heading.is_none() {
                                    section.heading = Some(text.to_string());
                                }
                            } else {
                                section.paragraphs.push(text.to_string());
                            }
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ParseError::Malformed(e.to_string())),
            _ => {}
        }
    }

    if !body_seen {
        return Err(ParseError::MissingBody);
    }

    let cover_image = cover_href
        .as_deref()
        .and_then(|href| href.strip_prefix('#'))
        .and_then(|id| binaries.remove(id));

    let title = sections.iter().find_map(|s| s.heading.clone());

    Ok(Document {
        title,
        cover_image,
        sections,
    })
}

/// Extract the xlink href from a cover `<image>` element. The attribute is
/// namespaced (`l:href` / `xlink:href`) so matching is by local name.
fn image_href(e: &quick_xml::events::BytesStart<'_>) -> Option<String> {
    for attr in e.attributes().flatten() {
        if local_name(attr.key.as_ref()) == b"href" {
            return String::from_utf8(attr.value.to_vec()).ok();
        }
    }
    None
}

/// Decode one binary element's base64 payload into the resource map.
/// Payloads are line-wrapped, so whitespace is stripped before decoding.
/// Empty or undecodable payloads contribute no entry.
fn store_binary(binaries: &mut HashMap<String, Vec<u8>>, id: String, text: &str) {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return;
    }
    match BASE64.decode(compact.as_bytes()) {
        Ok(data) => {
            binaries.insert(id, data);
        }
        Err(_) => {
            // Fail soft: a single corrupt resource must not abort
            // extraction of the rest of the document.
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NS: &str = r#"xmlns="http://www.gribuser.ru/xml/fictionbook/2.0" xmlns:l="http://www.w3.org/1999/xlink""#;

    fn fb2(inner: &str) -> String {
        format!(r#"<?xml version="1.0" encoding="UTF-8"?><FictionBook {NS}>{inner}</FictionBook>"#)
    }

    #[test]
    fn test_empty_body() {
        let doc = parse_fb2(fb2("<body></body>").as_bytes()).unwrap();
        assert!(doc.sections.is_empty());
        assert!(doc.title.is_none());
        assert!(doc.cover_image.is_none());
    }

    #[test]
    fn test_missing_body() {
        let err = parse_fb2(fb2("<description></description>").as_bytes()).unwrap_err();
        assert!(matches!(err, ParseError::MissingBody));
    }

    #[test]
    fn test_malformed_markup() {
        let err = parse_fb2(b"<FictionBook><body></FictionBook>").unwrap_err();
        assert!(matches!(err, ParseError::Malformed(_)));
    }

    #[test]
    fn test_section_heading_and_paragraphs() {
        let doc = parse_fb2(
            fb2("<body><section><title><p>H</p></title><p>p1</p><p>p2</p></section></body>")
                .as_bytes(),
        )
        .unwrap();

        assert_eq!(doc.sections.len(), 1);
        assert_eq!(doc.sections[0].heading.as_deref(), Some("H"));
        assert_eq!(doc.sections[0].paragraphs, vec!["p1", "p2"]);
        assert_eq!(doc.title.as_deref(), Some("H"));
    }

    #[test]
    fn test_multi_paragraph_title_keeps_first() {
        let doc = parse_fb2(
            fb2("<body><section><title><p>First</p><p>Second</p></title><p>text</p></section></body>")
                .as_bytes(),
        )
        .unwrap();

        assert_eq!(doc.sections[0].heading.as_deref(), Some("First"));
        assert_eq!(doc.sections[0].paragraphs, vec!["text"]);
    }

    #[test]
    fn test_empty_paragraphs_omitted() {
        let doc = parse_fb2(
            fb2("<body><section><p>one</p><p></p><p>   </p><p>two</p></section></body>")
                .as_bytes(),
        )
        .unwrap();

        assert_eq!(doc.sections[0].paragraphs, vec!["one", "two"]);
    }

    #[test]
    fn test_nested_section_paragraphs_excluded() {
        let doc = parse_fb2(
            fb2(concat!(
                "<body><section><title><p>Part I</p></title><p>own</p>",
                "<section><title><p>Chapter 1</p></title><p>nested</p></section>",
                "</section></body>"
            ))
            .as_bytes(),
        )
        .unwrap();

        assert_eq!(doc.sections.len(), 1);
        assert_eq!(doc.sections[0].heading.as_deref(), Some("Part I"));
        assert_eq!(doc.sections[0].paragraphs, vec!["own"]);
    }

    #[test]
    fn test_epigraph_paragraphs_excluded() {
        let doc = parse_fb2(
            fb2(concat!(
                "<body><section><epigraph><p>motto</p></epigraph>",
                "<annotation><p>blurb</p></annotation>",
                "<cite><p>quoted</p></cite><p>own</p></section></body>"
            ))
            .as_bytes(),
        )
        .unwrap();

        assert_eq!(doc.sections[0].paragraphs, vec!["own"]);
    }

    #[test]
    fn test_nested_title_is_not_a_heading() {
        let doc = parse_fb2(
            fb2(concat!(
                "<body><section><epigraph><title><p>not a heading</p></title></epigraph>",
                "<p>text</p></section></body>"
            ))
            .as_bytes(),
        )
        .unwrap();

        assert!(doc.sections[0].heading.is_none());
        assert_eq!(doc.sections[0].paragraphs, vec!["text"]);
    }

    #[test]
    fn test_title_from_later_section() {
        let doc = parse_fb2(
            fb2(concat!(
                "<body><section><p>untitled</p></section>",
                "<section><title><p>Named</p></title></section></body>"
            ))
            .as_bytes(),
        )
        .unwrap();

        assert_eq!(doc.title.as_deref(), Some("Named"));
        assert!(doc.sections[0].heading.is_none());
    }

    #[test]
    fn test_cover_resolution() {
        // "hi" in base64 is aGk=
        let doc = parse_fb2(
            fb2(concat!(
                r##"<description><title-info><coverpage><image l:href="#cover.jpg"/></coverpage></title-info></description>"##,
                "<body><section><p>text</p></section></body>",
                r#"<binary id="cover.jpg" content-type="image/jpeg">aGk=</binary>"#
            ))
            .as_bytes(),
        )
        .unwrap();

        assert_eq!(doc.cover_image.as_deref(), Some(b"hi".as_slice()));
    }

    #[test]
    fn test_cover_missing_resource_is_soft() {
        let doc = parse_fb2(
            fb2(concat!(
                r##"<description><coverpage><image l:href="#nope.jpg"/></coverpage></description>"##,
                "<body></body>"
            ))
            .as_bytes(),
        )
        .unwrap();

        assert!(doc.cover_image.is_none());
    }

    #[test]
    fn test_cover_non_fragment_href_ignored() {
        let doc = parse_fb2(
            fb2(concat!(
                r#"<description><coverpage><image l:href="http://example.com/c.jpg"/></coverpage></description>"#,
                "<body></body>"
            ))
            .as_bytes(),
        )
        .unwrap();

        assert!(doc.cover_image.is_none());
    }

    #[test]
    fn test_corrupt_binary_is_soft() {
        let doc = parse_fb2(
            fb2(concat!(
                r##"<description><coverpage><image l:href="#cover.jpg"/></coverpage></description>"##,
                "<body><section><p>still here</p></section></body>",
                r#"<binary id="cover.jpg" content-type="image/jpeg">!!! not base64 !!!</binary>"#
            ))
            .as_bytes(),
        )
        .unwrap();

        assert!(doc.cover_image.is_none());
        assert_eq!(doc.sections[0].paragraphs, vec!["still here"]);
    }

    #[test]
    fn test_line_wrapped_base64() {
        let doc = parse_fb2(
            fb2(concat!(
                r##"<description><coverpage><image l:href="#c"/></coverpage></description>"##,
                "<body></body>",
                "<binary id=\"c\" content-type=\"image/jpeg\">aGVs\nbG8=</binary>"
            ))
            .as_bytes(),
        )
        .unwrap();

        assert_eq!(doc.cover_image.as_deref(), Some(b"hello".as_slice()));
    }

    #[test]
    fn test_second_body_ignored() {
        let doc = parse_fb2(
            fb2(concat!(
                "<body><section><p>content</p></section></body>",
                r#"<body name="notes"><section><p>footnote</p></section></body>"#
            ))
            .as_bytes(),
        )
        .unwrap();

        assert_eq!(doc.sections.len(), 1);
        assert_eq!(doc.sections[0].paragraphs, vec!["content"]);
    }

    #[test]
    fn test_entity_in_paragraph() {
        let doc = parse_fb2(
            fb2("<body><section><p>Don&apos;t stop</p></section></body>").as_bytes(),
        )
        .unwrap();

        assert_eq!(doc.sections[0].paragraphs, vec!["Don't stop"]);
    }

    #[test]
    fn test_windows_1251_input() {
        let mut bytes =
            br#"<?xml version="1.0" encoding="windows-1251"?><FictionBook><body><section><p>"#
                .to_vec();
        // "Тест" in windows-1251
        bytes.extend_from_slice(&[0xD2, 0xE5, 0xF1, 0xF2]);
        bytes.extend_from_slice(b"</p></section></body></FictionBook>");

        let doc = parse_fb2(&bytes).unwrap();
        assert_eq!(doc.sections[0].paragraphs, vec!["Тест"]);
    }

    #[test]
    fn test_parse_is_idempotent() {
        let input = fb2(concat!(
            r##"<description><coverpage><image l:href="#c"/></coverpage></description>"##,
            "<body><section><title><p>H</p></title><p>p1</p></section></body>",
            r#"<binary id="c" content-type="image/jpeg">aGk=</binary>"#
        ));

        let a = parse_fb2(input.as_bytes()).unwrap();
        let b = parse_fb2(input.as_bytes()).unwrap();
        assert_eq!(a, b);
    }
}
