//! Locates name-bearing fields in a score document.
//!
//! The scanner walks the document with a pull parser and records, for every
//! field configured in the [`FieldSchema`], the decoded value and the byte
//! span it occupies in the source. Nothing is rebuilt from the event stream,
//! so the caller can splice new text into the original bytes and leave the
//! rest of the document untouched.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use super::schema::{FieldKind, FieldSchema};
use crate::resolve::is_xml_char;
use crate::{Error, Result};

const CDATA_OPEN: &str = "<![CDATA[";
const CDATA_CLOSE: &str = "]]>";

/// Where a field's text lives in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum FieldSpan {
    /// Byte range of the content between the start and end tags.
    Content { start: usize, end: usize },
    /// Byte range of a self-closing element such as `<trackName/>`.
    Empty {
        start: usize,
        end: usize,
        tag: String,
    },
}

impl FieldSpan {
    pub(crate) fn range(&self) -> std::ops::Range<usize> {
        match self {
            FieldSpan::Content { start, end } | FieldSpan::Empty { start, end, .. } => {
                *start..*end
            }
        }
    }
}

/// One located field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ScannedField {
    pub value: String,
    pub span: FieldSpan,
}

/// One track element and the fields found inside it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ScannedPart {
    pub id: Option<String>,
    pub fields: [Option<ScannedField>; 3],
}

impl ScannedPart {
    pub(crate) fn field(&self, kind: FieldKind) -> Option<&ScannedField> {
        self.fields[kind.slot()].as_ref()
    }
}

/// A field whose start tag has been seen but not its end tag.
struct OpenField {
    kind: FieldKind,
    depth: usize,
    start: usize,
    escaped: String,
}

/// A track element currently being scanned.
struct OpenPart {
    depth: usize,
    part: ScannedPart,
}

/// Scans `text` and returns every track element in document order.
///
/// `entry` names the archive entry for error messages. Fails with
/// [`Error::MalformedXml`] if the document is not well-formed.
pub(crate) fn scan(entry: &str, text: &str, schema: &FieldSchema) -> Result<Vec<ScannedPart>> {
    let (offset, body) = match text.strip_prefix('\u{feff}') {
        Some(rest) => ('\u{feff}'.len_utf8(), rest),
        None => (0, text),
    };

    let mut reader = Reader::from_str(body);
    reader.config_mut().check_end_names = true;

    let mut stack: Vec<String> = Vec::new();
    let mut parts = Vec::new();
    let mut open_part: Option<OpenPart> = None;
    let mut open_field: Option<OpenField> = None;
    let mut saw_root = false;
    let mut root_closed = false;

    loop {
        let before = reader.buffer_position() as usize;
        let event = reader
            .read_event()
            .map_err(|e| Error::malformed_xml(entry, reader.error_position() as u64 + offset as u64, e))?;
        let after = reader.buffer_position() as usize;

        let misplaced = |what: &str| {
            Error::malformed_xml(entry, (offset + before) as u64, format!("{what} outside the root element"))
        };

        match event {
            Event::Start(_) | Event::Empty(_) if root_closed => {
                return Err(misplaced("element"));
            }
            Event::Start(e) => {
                saw_root = true;
                stack.push(element_name(&e));

                if open_field.is_some() {
                    continue;
                }
                if let Some(part) = &mut open_part {
                    let relative = &stack[part.depth..];
                    if let Some(kind) = schema.match_path(relative) {
                        if part.part.fields[kind.slot()].is_none() {
                            open_field = Some(OpenField {
                                kind,
                                depth: stack.len(),
                                start: offset + after,
                                escaped: String::new(),
                            });
                        }
                    }
                } else if stack.last().map(String::as_str) == Some(schema.part_element()) {
                    open_part = Some(OpenPart {
                        depth: stack.len(),
                        part: ScannedPart {
                            id: id_attribute(entry, &e, offset + before)?,
                            ..Default::default()
                        },
                    });
                }
            }
            Event::Empty(e) => {
                saw_root = true;
                root_closed = stack.is_empty();
                if open_field.is_some() {
                    continue;
                }
                let name = element_name(&e);
                if let Some(part) = &mut open_part {
                    let mut relative = stack[part.depth..].to_vec();
                    relative.push(name.clone());
                    if let Some(kind) = schema.match_path(&relative) {
                        let slot = &mut part.part.fields[kind.slot()];
                        if slot.is_none() {
                            *slot = Some(ScannedField {
                                value: String::new(),
                                span: FieldSpan::Empty {
                                    start: offset + before,
                                    end: offset + after,
                                    tag: name,
                                },
                            });
                        }
                    }
                } else if name == schema.part_element() {
                    parts.push(ScannedPart {
                        id: id_attribute(entry, &e, offset + before)?,
                        ..Default::default()
                    });
                }
            }
            Event::End(_) => {
                let depth = stack.len();
                if let Some(field) = open_field.take_if(|f| f.depth == depth) {
                    let value = quick_xml::escape::unescape(&field.escaped)
                        .map_err(|e| Error::malformed_xml(entry, (offset + before) as u64, e))?
                        .into_owned();
                    if let Some(part) = &mut open_part {
                        part.part.fields[field.kind.slot()] = Some(ScannedField {
                            value,
                            span: FieldSpan::Content {
                                start: field.start,
                                end: offset + before,
                            },
                        });
                    }
                }
                if let Some(part) = open_part.take_if(|p| p.depth == depth) {
                    parts.push(part.part);
                }
                stack.pop();
                root_closed = stack.is_empty();
            }
            Event::CData(_) if stack.is_empty() => return Err(misplaced("CDATA section")),
            Event::CData(_) => {
                if let Some(field) = &mut open_field {
                    let raw = &body[before..after];
                    let inner = raw
                        .strip_prefix(CDATA_OPEN)
                        .and_then(|r| r.strip_suffix(CDATA_CLOSE))
                        .unwrap_or_default();
                    field.escaped.push_str(&quick_xml::escape::escape(inner));
                }
            }
            Event::Eof => break,
            Event::Comment(_) | Event::Decl(_) | Event::PI(_) | Event::DocType(_) => {}
            Event::Text(_) => {
                let raw = &body[before..after];
                check_chars(entry, raw, offset + before)?;
                if stack.is_empty() {
                    if !raw.chars().all(|c| matches!(c, ' ' | '\t' | '\r' | '\n')) {
                        return Err(misplaced("text"));
                    }
                } else {
                    push_field_text(&mut open_field, stack.len(), raw);
                }
            }
            Event::GeneralRef(_) => {
                let raw = &body[before..after];
                if stack.is_empty() {
                    return Err(misplaced("reference"));
                }
                let decoded = quick_xml::escape::unescape(raw)
                    .map_err(|e| Error::malformed_xml(entry, (offset + before) as u64, e))?;
                check_chars(entry, &decoded, offset + before)?;
                push_field_text(&mut open_field, stack.len(), raw);
            }
        }
    }

    if let Some(unclosed) = stack.last() {
        return Err(Error::malformed_xml(
            entry,
            text.len() as u64,
            format!("element '{unclosed}' is never closed"),
        ));
    }
    if !saw_root {
        return Err(Error::malformed_xml(entry, 0, "document has no root element"));
    }

    log::debug!("Scanned '{}': {} track elements", entry, parts.len());
    Ok(parts)
}

/// Character data and entity references inside a field are kept in their
/// escaped source form and decoded once at the end tag.
fn push_field_text(open_field: &mut Option<OpenField>, depth: usize, raw: &str) {
    if let Some(field) = open_field {
        if field.depth == depth {
            field.escaped.push_str(raw);
        }
    }
}

fn check_chars(entry: &str, text: &str, position: usize) -> Result<()> {
    match text.chars().find(|&c| !is_xml_char(c)) {
        Some(c) => Err(Error::malformed_xml(
            entry,
            position as u64,
            format!("character {} is not allowed in XML", c.escape_unicode()),
        )),
        None => Ok(()),
    }
}

fn element_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.name().as_ref()).into_owned()
}

fn id_attribute(entry: &str, e: &BytesStart<'_>, position: usize) -> Result<Option<String>> {
    for attr in e.attributes() {
        let attr = attr.map_err(|err| Error::malformed_xml(entry, position as u64, err))?;
        if attr.key.as_ref() == b"id" {
            let raw = String::from_utf8_lossy(&attr.value);
            let value = quick_xml::escape::unescape(&raw)
                .map_err(|err| Error::malformed_xml(entry, position as u64, err))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}
