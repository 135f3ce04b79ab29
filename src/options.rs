//! Options for opening and saving documents.

use std::path::{Path, PathBuf};

use crate::score::FieldSchema;

/// Options controlling how an archive is opened.
///
/// # Example
///
/// ```rust
/// use mscz_rename::OpenOptions;
///
/// let options = OpenOptions::new()
///     .allow_empty(true)
///     .score_entry("MyScore.mscx");
/// assert!(options.allows_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct OpenOptions {
    pub(crate) schema: FieldSchema,
    pub(crate) allow_empty: bool,
    pub(crate) score_entry: Option<String>,
}

impl OpenOptions {
    /// Creates default options: MuseScore field schema, score entry detected
    /// automatically, documents without name fields rejected.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the field schema used to find names.
    pub fn schema(mut self, schema: FieldSchema) -> Self {
        self.schema = schema;
        self
    }

    /// Accepts documents without any name-bearing field.
    ///
    /// By default such documents fail to open with
    /// [`Error::NoTracks`](crate::Error::NoTracks).
    pub fn allow_empty(mut self, allow: bool) -> Self {
        self.allow_empty = allow;
        self
    }

    /// Forces the archive entry to read as the score document.
    pub fn score_entry(mut self, entry: impl Into<String>) -> Self {
        self.score_entry = Some(entry.into());
        self
    }

    /// Returns the configured schema.
    pub fn field_schema(&self) -> &FieldSchema {
        &self.schema
    }

    /// Returns whether empty documents are accepted.
    pub fn allows_empty(&self) -> bool {
        self.allow_empty
    }
}

/// Options controlling how a document is saved.
///
/// # Example
///
/// ```rust
/// use mscz_rename::SaveOptions;
///
/// let options = SaveOptions::new()
///     .backup_dir("/tmp/score-backups")
///     .sync_excerpts(true);
/// assert!(options.makes_backup());
/// ```
#[derive(Debug, Clone)]
pub struct SaveOptions {
    pub(crate) backup: bool,
    pub(crate) backup_dir: Option<PathBuf>,
    pub(crate) sync_excerpts: bool,
    pub(crate) verify: bool,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            backup: true,
            backup_dir: None,
            sync_excerpts: false,
            verify: true,
        }
    }
}

impl SaveOptions {
    /// Creates default options: backup next to the destination, only the
    /// score entry rewritten, output verified before it replaces the file.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables the backup copy.
    pub fn backup(mut self, enabled: bool) -> Self {
        self.backup = enabled;
        self
    }

    /// Writes backups into `dir` instead of next to the destination.
    pub fn backup_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.backup_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Also renames parts with matching ids inside excerpt documents.
    pub fn sync_excerpts(mut self, enabled: bool) -> Self {
        self.sync_excerpts = enabled;
        self
    }

    /// Enables or disables re-reading the new archive before it is moved
    /// into place.
    pub fn verify(mut self, enabled: bool) -> Self {
        self.verify = enabled;
        self
    }

    /// Returns whether a backup will be written.
    pub fn makes_backup(&self) -> bool {
        self.backup
    }
}
