//! The editable archive.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use crate::container;
use crate::options::{OpenOptions, SaveOptions};
use crate::persist;
use crate::resolve::{NameResolver, invalid_character, validate_name};
use crate::score::{FieldEdit, FieldKind, ScoreDocument, TrackEntry};
use crate::{Error, Result};

use super::staging::StagedEdits;

/// Lifecycle of an [`ArchiveDocument`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentState {
    /// Opened and not changed since.
    Opened,
    /// At least one name is staged and not yet saved.
    Modified,
    /// Saved, with nothing staged since.
    Saved,
}

/// Outcome of [`ArchiveDocument::save`].
#[must_use = "save report should be checked to see where the archive and its backup went"]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveReport {
    /// Where the archive was written.
    pub destination: PathBuf,
    /// The backup written before the destination was replaced, if any.
    pub backup: Option<PathBuf>,
    /// Number of name fields changed in the score document.
    pub fields_changed: usize,
    /// Number of excerpt documents that were rewritten.
    pub excerpts_updated: usize,
    /// Number of archive entries copied without change.
    pub entries_copied: usize,
}

/// An open `.mscz` archive with staged track-name edits.
///
/// Renames are validated and staged in memory; nothing touches the disk until
/// [`save`](Self::save). Every track is addressed by the index it was given
/// when the archive was opened.
///
/// # Example
///
/// ```rust,no_run
/// use mscz_rename::{ArchiveDocument, FieldKind, SaveOptions};
///
/// let mut doc = ArchiveDocument::open("Quartet.mscz")?;
/// for track in doc.list_tracks() {
///     println!("{}: {}", track.index, track.display_name());
/// }
///
/// doc.rename_track(0, FieldKind::Mixer, "Violin I")?;
/// doc.resolve_duplicates(FieldKind::Part);
///
/// let report = doc.save("Quartet.mscz", &SaveOptions::default())?;
/// println!("backup: {:?}", report.backup);
/// # Ok::<(), mscz_rename::Error>(())
/// ```
#[derive(Debug)]
pub struct ArchiveDocument {
    path: Option<PathBuf>,
    source: Vec<u8>,
    source_crc: u32,
    score: ScoreDocument,
    staged: StagedEdits,
    saved: bool,
    backed_up: HashSet<PathBuf>,
}

impl ArchiveDocument {
    /// Opens an archive with default options.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_options(path, OpenOptions::default())
    }

    /// Opens an archive.
    ///
    /// # Errors
    ///
    /// - [`Error::Io`] if the file cannot be read.
    /// - A format error if it is not a zip archive, has no score document,
    ///   or the document is not well-formed UTF-8 XML.
    /// - [`Error::NoTracks`] if no name field was found and
    ///   [`OpenOptions::allow_empty`] is not set.
    pub fn open_with_options(path: impl AsRef<Path>, options: OpenOptions) -> Result<Self> {
        let path = path.as_ref();
        log::debug!("Opening '{}'", path.display());
        let bytes = fs::read(path)?;
        let mut doc = Self::from_bytes(bytes, options)?;
        doc.path = Some(path.to_path_buf());
        Ok(doc)
    }

    /// Opens an archive held in memory.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>, options: OpenOptions) -> Result<Self> {
        let source = bytes.into();
        let score = {
            let mut archive = container::open(&source)?;
            let entry = container::locate_score_entry(&mut archive, options.score_entry.as_deref())?;
            let data = container::read_entry(&mut archive, &entry)?;
            ScoreDocument::parse(entry, data, &options.schema)?
        };

        if !score.has_fields() {
            if !options.allow_empty {
                return Err(Error::NoTracks {
                    entry: score.entry_name().to_string(),
                });
            }
            log::debug!("'{}' has no name fields", score.entry_name());
        }

        log::debug!(
            "Score entry '{}' has {} track(s)",
            score.entry_name(),
            score.track_count()
        );

        Ok(Self {
            path: None,
            source_crc: crc32fast::hash(&source),
            source,
            score,
            staged: StagedEdits::new(),
            saved: false,
            backed_up: HashSet::new(),
        })
    }

    /// Returns the path the document was opened from or last saved to.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Returns the score document as last opened or saved, without staged
    /// names.
    pub fn score(&self) -> &ScoreDocument {
        &self.score
    }

    /// Returns the number of tracks.
    pub fn track_count(&self) -> usize {
        self.score.track_count()
    }

    /// Returns every track in document order with staged names applied.
    pub fn list_tracks(&self) -> Vec<TrackEntry> {
        let mut tracks = self.score.tracks();
        for edit in self.staged.to_edits() {
            if let Some(track) = tracks.get_mut(edit.index) {
                track.set_name(edit.field, edit.name);
            }
        }
        tracks
    }

    /// Stages a new name for one field of one track.
    ///
    /// The name is trimmed before it is staged.
    ///
    /// # Errors
    ///
    /// Fails with a validation error, leaving the document unchanged, if the
    /// index is out of range, the track lacks the field, or the name is empty
    /// after trimming or holds a character XML cannot represent.
    pub fn rename_track(&mut self, index: usize, field: FieldKind, name: &str) -> Result<()> {
        self.check_field(index, field)?;
        let name = checked_name(index, field, name)?;
        self.stage(index, field, name.to_string());
        Ok(())
    }

    /// Stages a batch of names for one field after resolving duplicates.
    ///
    /// The whole batch is validated first; on any error nothing is staged.
    /// The names are then resolved against every current name of the field,
    /// so tracks outside the batch may be renumbered too.
    ///
    /// Returns the staged `(index, name)` pairs in document order.
    pub fn rename_tracks(
        &mut self,
        field: FieldKind,
        batch: &[(usize, String)],
    ) -> Result<Vec<(usize, String)>> {
        let mut proposed = Vec::with_capacity(batch.len());
        for (index, name) in batch {
            self.check_field(*index, field)?;
            let name = checked_name(*index, field, name)?;
            proposed.push((*index, name.to_string()));
        }

        let resolved = NameResolver::new().resolve(&self.current_names(field), &proposed);
        self.stage_all(field, &resolved);
        Ok(resolved)
    }

    /// Numbers duplicate names of a field so that every name is unique.
    ///
    /// The first occurrence keeps its name; later ones get ` 2`, ` 3`, …
    /// Returns the staged changes.
    pub fn resolve_duplicates(&mut self, field: FieldKind) -> Vec<(usize, String)> {
        let resolved = NameResolver::new().resolve(&self.current_names(field), &[]);
        self.stage_all(field, &resolved);
        resolved
    }

    /// Numbers every repeated name of a field from 1.
    ///
    /// Returns the staged changes.
    pub fn number_duplicates(&mut self, field: FieldKind) -> Vec<(usize, String)> {
        let numbered = NameResolver::new().number_duplicates(&self.current_names(field));
        self.stage_all(field, &numbered);
        numbered
    }

    /// Discards every staged name.
    pub fn reset(&mut self) {
        if !self.staged.is_empty() {
            log::debug!("Discarding {} staged name(s)", self.staged.len());
        }
        self.staged.clear();
    }

    /// Returns `true` if names are staged and not yet saved.
    pub fn is_modified(&self) -> bool {
        !self.staged.is_empty()
    }

    /// Returns the staged names in `(index, field)` order.
    pub fn pending_changes(&self) -> Vec<FieldEdit> {
        self.staged.to_edits()
    }

    /// Returns the lifecycle state.
    pub fn state(&self) -> DocumentState {
        if !self.staged.is_empty() {
            DocumentState::Modified
        } else if self.saved {
            DocumentState::Saved
        } else {
            DocumentState::Opened
        }
    }

    /// Writes the archive with every staged name applied to `path`.
    ///
    /// The first save to a destination in this session backs up whatever is
    /// currently there. The new archive is assembled in memory, verified,
    /// and then moved over `path` in one rename, so the destination is never
    /// left half-written.
    ///
    /// On success the document represents the saved file and nothing is
    /// staged. On failure the document and its staged names are unchanged.
    pub fn save(&mut self, path: impl AsRef<Path>, options: &SaveOptions) -> Result<SaveReport> {
        let path = path.as_ref();
        self.warn_if_stale(path);

        let edits = self.staged.to_edits();
        let edited = self.score.with_edits(&edits)?;

        let mut replacements = BTreeMap::new();
        if !edits.is_empty() {
            replacements.insert(
                edited.entry_name().to_string(),
                edited.as_bytes().to_vec(),
            );
        }
        let excerpts_updated = if options.sync_excerpts && !edits.is_empty() {
            self.sync_excerpts(&edits, &mut replacements)?
        } else {
            0
        };

        let (bytes, stats) = container::rewrite(&self.source, &replacements)?;
        if options.verify {
            container::verify(&self.source, &bytes, &replacements)?;
        }

        let key = destination_key(path);
        let backup = if options.backup && !self.backed_up.contains(&key) {
            let backup = persist::write_backup(path, options.backup_dir.as_deref())?;
            if backup.is_some() {
                self.backed_up.insert(key.clone());
            }
            backup
        } else {
            None
        };

        persist::write_atomic(path, &bytes)?;
        if options.backup {
            self.backed_up.insert(key);
        }

        log::info!(
            "Saved '{}': {} field(s) changed, {} excerpt(s) updated",
            path.display(),
            edits.len(),
            excerpts_updated
        );

        self.source_crc = crc32fast::hash(&bytes);
        self.source = bytes;
        self.score = edited;
        self.staged.clear();
        self.saved = true;
        self.path = Some(path.to_path_buf());

        Ok(SaveReport {
            destination: path.to_path_buf(),
            backup,
            fields_changed: edits.len(),
            excerpts_updated,
            entries_copied: stats.entries_copied,
        })
    }

    /// Returns the saved name of a field, checking that the track has it.
    fn check_field(&self, index: usize, field: FieldKind) -> Result<&str> {
        let part = self.score.parts().get(index).ok_or(Error::TrackOutOfRange {
            index,
            count: self.score.track_count(),
        })?;
        part.field(field)
            .map(|f| f.value.as_str())
            .ok_or(Error::FieldMissing { index, field })
    }

    /// Returns the effective name of `field` for every track.
    fn current_names(&self, field: FieldKind) -> Vec<Option<String>> {
        self.list_tracks()
            .iter()
            .map(|t| t.name(field).map(str::to_string))
            .collect()
    }

    fn stage_all(&mut self, field: FieldKind, names: &[(usize, String)]) {
        for (index, name) in names {
            self.stage(*index, field, name.clone());
        }
    }

    /// Stages `name`, or unstages the field if `name` is the saved value.
    fn stage(&mut self, index: usize, field: FieldKind, name: String) {
        let unchanged = self
            .check_field(index, field)
            .is_ok_and(|saved| saved == name);
        if unchanged {
            self.staged.unstage(index, field);
        } else {
            log::debug!("Staging track {index} {field} name {name:?}");
            self.staged.stage(index, field, name);
        }
    }

    /// Adds renamed excerpt documents to `replacements`.
    ///
    /// Parts are matched by their `id` attribute. Excerpts that cannot be
    /// parsed are skipped with a warning.
    fn sync_excerpts(
        &self,
        edits: &[FieldEdit],
        replacements: &mut BTreeMap<String, Vec<u8>>,
    ) -> Result<usize> {
        let mut archive = container::open(&self.source)?;
        let names = container::entry_names(&mut archive)?;
        let mut updated = 0;

        for entry in container::secondary_documents(&names, self.score.entry_name()) {
            let data = container::read_entry(&mut archive, &entry)?;
            let excerpt = match ScoreDocument::parse(entry.as_str(), data, self.score.schema()) {
                Ok(excerpt) => excerpt,
                Err(e) => {
                    log::warn!("Skipping excerpt '{}': {}", entry, e);
                    continue;
                }
            };

            let mapped: Vec<FieldEdit> = edits
                .iter()
                .filter_map(|edit| {
                    let id = self.score.parts()[edit.index].id.as_deref()?;
                    let index = excerpt.find_by_id(id)?;
                    excerpt.parts()[index].field(edit.field)?;
                    Some(FieldEdit::new(index, edit.field, edit.name.clone()))
                })
                .collect();
            if mapped.is_empty() {
                continue;
            }

            let renamed = excerpt.with_edits(&mapped)?;
            if renamed.as_str() != excerpt.as_str() {
                log::debug!("Excerpt '{}' gets {} name(s)", entry, mapped.len());
                replacements.insert(entry, renamed.as_bytes().to_vec());
                updated += 1;
            }
        }

        Ok(updated)
    }

    fn warn_if_stale(&self, destination: &Path) {
        let Some(source) = self.path.as_deref() else {
            return;
        };
        if destination_key(source) != destination_key(destination) {
            return;
        }
        match fs::read(destination) {
            Ok(current) if crc32fast::hash(&current) != self.source_crc => log::warn!(
                "'{}' changed on disk since it was opened; saving will overwrite those changes",
                destination.display()
            ),
            Ok(_) => {}
            Err(e) => log::debug!("Cannot re-read '{}': {}", destination.display(), e),
        }
    }
}

fn checked_name(index: usize, field: FieldKind, name: &str) -> Result<&str> {
    let name = validate_name(name).ok_or(Error::EmptyName { index, field })?;
    match invalid_character(name) {
        Some(character) => Err(Error::InvalidCharacter {
            index,
            field,
            character,
        }),
        None => Ok(name),
    }
}

/// Normalizes a destination so the same file is recognized under different
/// spellings of its path.
fn destination_key(path: &Path) -> PathBuf {
    let file_name = path.file_name();
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    match (fs::canonicalize(parent), file_name) {
        (Ok(parent), Some(name)) => parent.join(name),
        _ => path.to_path_buf(),
    }
}
