//! The XML score document and the tracks found in it.
//!
//! A [`ScoreDocument`] keeps the document exactly as it was read together
//! with the location of every name-bearing field. Renames are applied by
//! splicing escaped text into those locations, so attribute order,
//! whitespace, comments and every element outside the name fields come out
//! byte-for-byte identical.

mod scan;
mod schema;
mod track;

pub use schema::{FieldKind, FieldSchema};
pub use track::TrackEntry;

pub(crate) use scan::{FieldSpan, ScannedPart};

use crate::{Error, Result};

/// A parsed score document.
#[derive(Debug, Clone)]
pub struct ScoreDocument {
    entry: String,
    text: String,
    schema: FieldSchema,
    parts: Vec<ScannedPart>,
}

/// A name to write into one field of one track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldEdit {
    /// Track index.
    pub index: usize,
    /// Field to write.
    pub field: FieldKind,
    /// The new, unescaped name.
    pub name: String,
}

impl FieldEdit {
    /// Creates a field edit.
    pub fn new(index: usize, field: FieldKind, name: impl Into<String>) -> Self {
        Self {
            index,
            field,
            name: name.into(),
        }
    }
}

impl ScoreDocument {
    /// Parses a score document read from archive entry `entry`.
    ///
    /// Fails with [`Error::MalformedXml`] if the bytes are not UTF-8 or not
    /// well-formed XML.
    pub fn parse(entry: impl Into<String>, bytes: Vec<u8>, schema: &FieldSchema) -> Result<Self> {
        let entry = entry.into();
        let text = String::from_utf8(bytes).map_err(|e| {
            Error::malformed_xml(&entry, e.utf8_error().valid_up_to() as u64, "not valid UTF-8")
        })?;
        let parts = scan::scan(&entry, &text, schema)?;
        Ok(Self {
            entry,
            text,
            schema: schema.clone(),
            parts,
        })
    }

    /// Returns the archive entry this document was read from.
    pub fn entry_name(&self) -> &str {
        &self.entry
    }

    /// Returns the document text.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Returns the document bytes.
    pub fn as_bytes(&self) -> &[u8] {
        self.text.as_bytes()
    }

    /// Returns the schema the document was scanned with.
    pub fn schema(&self) -> &FieldSchema {
        &self.schema
    }

    /// Returns the number of track elements.
    pub fn track_count(&self) -> usize {
        self.parts.len()
    }

    /// Returns `true` if at least one name-bearing field was found.
    pub fn has_fields(&self) -> bool {
        self.parts
            .iter()
            .any(|p| p.fields.iter().any(Option::is_some))
    }

    /// Returns a snapshot of every track in document order.
    pub fn tracks(&self) -> Vec<TrackEntry> {
        self.parts
            .iter()
            .enumerate()
            .map(|(index, part)| TrackEntry::from_scanned(index, part))
            .collect()
    }

    pub(crate) fn parts(&self) -> &[ScannedPart] {
        &self.parts
    }

    /// Returns the index of the track whose `id` attribute equals `id`.
    pub fn find_by_id(&self, id: &str) -> Option<usize> {
        self.parts.iter().position(|p| p.id.as_deref() == Some(id))
    }

    /// Produces a new document with `edits` applied.
    ///
    /// Edits whose name equals the current value are skipped, and a name
    /// holding a character XML cannot represent is refused. The result is
    /// scanned again and every edited field is checked to read back as the
    /// requested name; a mismatch or a parse failure is reported as a format
    /// error and `self` is left untouched.
    pub fn with_edits(&self, edits: &[FieldEdit]) -> Result<Self> {
        let mut splices: Vec<(std::ops::Range<usize>, String)> = Vec::with_capacity(edits.len());

        for edit in edits {
            let part = self
                .parts
                .get(edit.index)
                .ok_or(Error::TrackOutOfRange {
                    index: edit.index,
                    count: self.parts.len(),
                })?;
            let field = part.field(edit.field).ok_or(Error::FieldMissing {
                index: edit.index,
                field: edit.field,
            })?;
            if field.value == edit.name {
                continue;
            }
            if let Some(c) = crate::resolve::invalid_character(&edit.name) {
                return Err(Error::verification(
                    &self.entry,
                    format!(
                        "track {} {} name contains {}, which XML does not allow",
                        edit.index,
                        edit.field,
                        c.escape_unicode()
                    ),
                ));
            }

            let escaped = quick_xml::escape::escape(edit.name.as_str());
            let replacement = match &field.span {
                FieldSpan::Content { .. } => escaped.into_owned(),
                FieldSpan::Empty { tag, .. } => format!("<{tag}>{escaped}</{tag}>"),
            };
            splices.push((field.span.range(), replacement));
        }

        if splices.is_empty() {
            return Ok(self.clone());
        }

        splices.sort_by_key(|(range, _)| range.start);
        if splices.windows(2).any(|w| w[0].0.end > w[1].0.start) {
            return Err(Error::verification(&self.entry, "overlapping field edits"));
        }

        let mut text = String::with_capacity(self.text.len() + 64);
        let mut cursor = 0;
        for (range, replacement) in &splices {
            text.push_str(&self.text[cursor..range.start]);
            text.push_str(replacement);
            cursor = range.end;
        }
        text.push_str(&self.text[cursor..]);

        let edited = Self::parse(self.entry.clone(), text.into_bytes(), &self.schema)?;
        edited.check_edits(self, edits)?;

        log::debug!(
            "Spliced {} field(s) into '{}'",
            splices.len(),
            self.entry
        );
        Ok(edited)
    }

    /// Checks that `self` is `original` with exactly `edits` applied.
    fn check_edits(&self, original: &Self, edits: &[FieldEdit]) -> Result<()> {
        if self.parts.len() != original.parts.len() {
            return Err(Error::verification(
                &self.entry,
                format!(
                    "track count changed from {} to {}",
                    original.parts.len(),
                    self.parts.len()
                ),
            ));
        }
        for edit in edits {
            let actual = self.parts[edit.index]
                .field(edit.field)
                .map(|f| f.value.as_str());
            if actual != Some(edit.name.as_str()) {
                return Err(Error::verification(
                    &self.entry,
                    format!(
                        "track {} {} name reads back as {:?}, expected {:?}",
                        edit.index, edit.field, actual, edit.name
                    ),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCORE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<museScore version="4.20">
  <Score>
    <!-- keep me -->
    <Part id="1">
      <trackName>Violin</trackName>
      <Instrument id="violin">
        <longName>Violin</longName>
        <trackName>Violin</trackName>
      </Instrument>
    </Part>
    <Part id="2">
      <trackName>Cello</trackName>
      <Instrument id="cello">
        <longName/>
        <trackName>Cello</trackName>
      </Instrument>
    </Part>
  </Score>
</museScore>
"#;

    fn parse(text: &str) -> ScoreDocument {
        ScoreDocument::parse("score.mscx", text.as_bytes().to_vec(), &FieldSchema::default())
            .unwrap()
    }

    #[test]
    fn test_parse_lists_tracks() {
        let doc = parse(SCORE);
        assert_eq!(doc.track_count(), 2);
        assert!(doc.has_fields());
        let tracks = doc.tracks();
        assert_eq!(tracks[0].name(FieldKind::Mixer), Some("Violin"));
        assert_eq!(tracks[1].name(FieldKind::Part), Some(""));
        assert_eq!(doc.find_by_id("2"), Some(1));
        assert_eq!(doc.find_by_id("9"), None);
    }

    #[test]
    fn test_no_edits_preserves_bytes() {
        let doc = parse(SCORE);
        let edited = doc.with_edits(&[]).unwrap();
        assert_eq!(edited.as_str(), SCORE);
    }

    #[test]
    fn test_edit_only_touches_the_field() {
        let doc = parse(SCORE);
        let edited = doc
            .with_edits(&[FieldEdit::new(0, FieldKind::Mixer, "Violin 1")])
            .unwrap();
        let expected = SCORE.replacen(
            "<trackName>Violin</trackName>",
            "<trackName>Violin 1</trackName>",
            1,
        );
        assert_eq!(edited.as_str(), expected);
        assert_eq!(edited.tracks()[0].name(FieldKind::Midi), Some("Violin"));
    }

    #[test]
    fn test_edit_escapes_markup() {
        let doc = parse(SCORE);
        let edited = doc
            .with_edits(&[FieldEdit::new(1, FieldKind::Mixer, "Cello <solo> & tutti")])
            .unwrap();
        assert!(edited.as_str().contains("Cello &lt;solo&gt; &amp; tutti"));
        assert_eq!(
            edited.tracks()[1].name(FieldKind::Mixer),
            Some("Cello <solo> & tutti")
        );
    }

    #[test]
    fn test_edit_expands_empty_element() {
        let doc = parse(SCORE);
        let edited = doc
            .with_edits(&[FieldEdit::new(1, FieldKind::Part, "Violoncello")])
            .unwrap();
        assert!(edited.as_str().contains("<longName>Violoncello</longName>"));
        assert!(!edited.as_str().contains("<longName/>"));
    }

    #[test]
    fn test_edit_of_missing_field_fails() {
        let doc = parse("<Score><Part><trackName>A</trackName></Part></Score>");
        let err = doc
            .with_edits(&[FieldEdit::new(0, FieldKind::Midi, "B")])
            .unwrap_err();
        assert!(matches!(err, Error::FieldMissing { index: 0, .. }));
    }

    #[test]
    fn test_edit_out_of_range_fails() {
        let doc = parse(SCORE);
        let err = doc
            .with_edits(&[FieldEdit::new(5, FieldKind::Mixer, "B")])
            .unwrap_err();
        assert!(matches!(err, Error::TrackOutOfRange { index: 5, count: 2 }));
    }

    #[test]
    fn test_edit_with_control_character_fails_verification() {
        let doc = parse(SCORE);
        let err = doc
            .with_edits(&[FieldEdit::new(0, FieldKind::Mixer, "Vln\u{1}I")])
            .unwrap_err();
        assert!(matches!(err, Error::VerificationFailed { .. }));
        assert_eq!(doc.as_str(), SCORE);
    }

    #[test]
    fn test_non_utf8_is_malformed() {
        let err = ScoreDocument::parse("score.mscx", vec![0x3c, 0xff, 0x3e], &FieldSchema::default())
            .unwrap_err();
        assert!(matches!(err, Error::MalformedXml { .. }));
    }
}
