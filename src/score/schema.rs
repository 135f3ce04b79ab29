//! Name-bearing fields and where they live inside a `Part` element.

use std::fmt;
use std::str::FromStr;

use crate::Error;

/// The three kinds of track name a score carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldKind {
    /// Name shown in the mixer.
    Mixer,
    /// Name written as the track name on MIDI export.
    Midi,
    /// Long name printed as the part label.
    Part,
}

impl FieldKind {
    /// All field kinds in display order.
    pub const ALL: [FieldKind; 3] = [FieldKind::Mixer, FieldKind::Midi, FieldKind::Part];

    /// Returns the lowercase name used in messages and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mixer => "mixer",
            Self::Midi => "midi",
            Self::Part => "part",
        }
    }

    pub(crate) fn slot(&self) -> usize {
        match self {
            Self::Mixer => 0,
            Self::Midi => 1,
            Self::Part => 2,
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mixer" => Ok(Self::Mixer),
            "midi" => Ok(Self::Midi),
            "part" | "long" | "longname" => Ok(Self::Part),
            _ => Err(Error::UnknownField(s.to_string())),
        }
    }
}

/// Maps each [`FieldKind`] to an element path relative to a `Part` element.
///
/// Paths match direct children only: `["Instrument", "trackName"]` means the
/// `trackName` child of the `Instrument` child of the part. A kind without a
/// path is never scanned.
///
/// The default schema follows MuseScore 3 and 4 files:
///
/// | Field | Path |
/// |-------|------|
/// | mixer | `Part/trackName` |
/// | midi | `Part/Instrument/trackName` |
/// | part | `Part/Instrument/longName` |
///
/// # Example
///
/// ```rust
/// use mscz_rename::{FieldKind, FieldSchema};
///
/// let schema = FieldSchema::new()
///     .with_path(FieldKind::Mixer, &["trackName"])
///     .with_path(FieldKind::Part, &["Instrument", "longName"]);
/// assert!(schema.path(FieldKind::Midi).is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSchema {
    part_element: String,
    paths: [Option<Vec<String>>; 3],
}

impl Default for FieldSchema {
    fn default() -> Self {
        Self::new()
            .with_path(FieldKind::Mixer, &["trackName"])
            .with_path(FieldKind::Midi, &["Instrument", "trackName"])
            .with_path(FieldKind::Part, &["Instrument", "longName"])
    }
}

impl FieldSchema {
    /// Creates an empty schema that scans `Part` elements for nothing.
    pub fn new() -> Self {
        Self {
            part_element: "Part".to_string(),
            paths: [None, None, None],
        }
    }

    /// Sets the element path for a field kind.
    ///
    /// An empty path removes the field from the schema.
    pub fn with_path(mut self, kind: FieldKind, path: &[&str]) -> Self {
        self.paths[kind.slot()] = if path.is_empty() {
            None
        } else {
            Some(path.iter().map(|s| s.to_string()).collect())
        };
        self
    }

    /// Sets the element name that delimits one track (`Part` by default).
    pub fn with_part_element(mut self, name: impl Into<String>) -> Self {
        self.part_element = name.into();
        self
    }

    /// Returns the element name that delimits one track.
    pub fn part_element(&self) -> &str {
        &self.part_element
    }

    /// Returns the path configured for a field kind.
    pub fn path(&self, kind: FieldKind) -> Option<&[String]> {
        self.paths[kind.slot()].as_deref()
    }

    /// Returns the field kind whose path equals `path`, if any.
    pub(crate) fn match_path(&self, path: &[String]) -> Option<FieldKind> {
        FieldKind::ALL
            .into_iter()
            .find(|kind| self.path(*kind) == Some(path))
    }
}
