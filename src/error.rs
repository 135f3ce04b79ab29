//! Error types for score archive operations.
//!
//! This module provides the [`Error`] enum which represents all possible
//! failure modes when opening, editing and saving `.mscz` archives, along
//! with a convenient [`Result<T>`] type alias.
//!
//! Every variant belongs to one of four coarse categories exposed through
//! [`Error::kind`], which is what a front end usually needs to pick a
//! message or an exit code:
//!
//! ```rust
//! use mscz_rename::{Error, ErrorKind};
//!
//! fn print_user_message(error: &Error) {
//!     match error.kind() {
//!         ErrorKind::Format => println!("The file is not a readable MuseScore archive: {error}"),
//!         ErrorKind::NotFound => println!("No track names were found: {error}"),
//!         ErrorKind::Validation => println!("Invalid edit: {error}"),
//!         ErrorKind::Io => println!("File error: {error}"),
//!     }
//! }
//! ```

use std::fmt;
use std::io;
use std::path::PathBuf;

use crate::score::FieldKind;

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The archive or the XML inside it is malformed or unreadable.
    Format,
    /// Expected structure is absent.
    NotFound,
    /// User input violates a field constraint.
    Validation,
    /// Filesystem failure on read, backup or write.
    Io,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Format => write!(f, "format error"),
            Self::NotFound => write!(f, "not found"),
            Self::Validation => write!(f, "validation error"),
            Self::Io => write!(f, "I/O error"),
        }
    }
}

/// The main error type for archive operations.
///
/// # Error Categories
///
/// | Category | Variants | Typical Cause |
/// |----------|----------|---------------|
/// | Format | [`InvalidArchive`][Self::InvalidArchive], [`MissingScoreEntry`][Self::MissingScoreEntry], [`MalformedXml`][Self::MalformedXml], [`VerificationFailed`][Self::VerificationFailed] | Damaged or foreign file |
/// | Not found | [`NoTracks`][Self::NoTracks] | Score without parts |
/// | Validation | [`EmptyName`][Self::EmptyName], [`InvalidCharacter`][Self::InvalidCharacter], [`TrackOutOfRange`][Self::TrackOutOfRange], [`FieldMissing`][Self::FieldMissing], [`UnknownField`][Self::UnknownField] | Bad edit request |
/// | I/O | [`Io`][Self::Io], [`Backup`][Self::Backup] | File system operations |
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// An I/O error occurred during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Writing the backup copy failed.
    ///
    /// Nothing else has been written when this is returned.
    #[error("Failed to write backup '{}': {}", .path.display(), .source)]
    Backup {
        /// The backup path that could not be written.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The file is not a readable zip container.
    #[error("Invalid .mscz archive: {0}")]
    InvalidArchive(String),

    /// The archive is a valid zip but holds no score document.
    #[error("No score document found in archive{}", .expected.as_deref().map(|e| format!(" (expected '{e}')")).unwrap_or_default())]
    MissingScoreEntry {
        /// The entry that was requested, if a specific one was.
        expected: Option<String>,
    },

    /// The score document is not well-formed XML.
    #[error("Malformed XML in '{entry}' at byte {position}: {reason}")]
    MalformedXml {
        /// Archive entry holding the document.
        entry: String,
        /// Byte offset reported by the parser.
        position: u64,
        /// Parser message.
        reason: String,
    },

    /// The archive written during save does not match what was expected.
    #[error("Verification of '{entry}' failed: {reason}")]
    VerificationFailed {
        /// The entry that failed verification.
        entry: String,
        /// What did not match.
        reason: String,
    },

    /// The score contains no name-bearing fields.
    #[error("No track names found in '{entry}'")]
    NoTracks {
        /// Archive entry that was scanned.
        entry: String,
    },

    /// A proposed name is empty or whitespace only.
    #[error("Name for track {index} ({field}) must not be empty")]
    EmptyName {
        /// Track index.
        index: usize,
        /// Field being renamed.
        field: FieldKind,
    },

    /// A proposed name contains a character XML 1.0 cannot represent.
    #[error("Name for track {index} ({field}) contains '{}', which XML does not allow", .character.escape_unicode())]
    InvalidCharacter {
        /// Track index.
        index: usize,
        /// Field being renamed.
        field: FieldKind,
        /// The first offending character.
        character: char,
    },

    /// A track index does not exist.
    #[error("Track {index} does not exist (document has {count} tracks)")]
    TrackOutOfRange {
        /// Requested index.
        index: usize,
        /// Number of tracks in the document.
        count: usize,
    },

    /// The track does not carry the requested field.
    #[error("Track {index} has no {field} name field")]
    FieldMissing {
        /// Track index.
        index: usize,
        /// Requested field.
        field: FieldKind,
    },

    /// A field name could not be parsed.
    #[error("Unknown field '{0}' (expected mixer, midi or part)")]
    UnknownField(String),
}

impl Error {
    /// Returns the coarse category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Io(_) | Error::Backup { .. } => ErrorKind::Io,
            Error::InvalidArchive(_)
            | Error::MissingScoreEntry { .. }
            | Error::MalformedXml { .. }
            | Error::VerificationFailed { .. } => ErrorKind::Format,
            Error::NoTracks { .. } => ErrorKind::NotFound,
            Error::EmptyName { .. }
            | Error::InvalidCharacter { .. }
            | Error::TrackOutOfRange { .. }
            | Error::FieldMissing { .. }
            | Error::UnknownField(_) => ErrorKind::Validation,
        }
    }

    /// Returns `true` if this error was caused by the edit request rather
    /// than by the file.
    pub fn is_validation(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }

    /// Returns the track index associated with this error, if any.
    pub fn track_index(&self) -> Option<usize> {
        match self {
            Error::EmptyName { index, .. }
            | Error::InvalidCharacter { index, .. }
            | Error::TrackOutOfRange { index, .. }
            | Error::FieldMissing { index, .. } => Some(*index),
            _ => None,
        }
    }

    /// Returns the field associated with this error, if any.
    pub fn field(&self) -> Option<FieldKind> {
        match self {
            Error::EmptyName { field, .. }
            | Error::InvalidCharacter { field, .. }
            | Error::FieldMissing { field, .. } => Some(*field),
            _ => None,
        }
    }

    /// Creates a MalformedXml error from a parser failure.
    pub fn malformed_xml(entry: impl Into<String>, position: u64, reason: impl fmt::Display) -> Self {
        Error::MalformedXml {
            entry: entry.into(),
            position,
            reason: reason.to_string(),
        }
    }

    /// Creates a VerificationFailed error.
    pub fn verification(entry: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::VerificationFailed {
            entry: entry.into(),
            reason: reason.into(),
        }
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(e) => Error::Io(e),
            other => Error::InvalidArchive(other.to_string()),
        }
    }
}

/// A specialized Result type for archive operations.
pub type Result<T> = std::result::Result<T, Error>;
