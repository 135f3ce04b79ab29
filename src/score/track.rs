//! Read-only track snapshots.

use super::scan::ScannedPart;
use super::schema::FieldKind;

/// One instrument/part of a score and its current names.
///
/// Snapshots are produced by
/// [`ArchiveDocument::list_tracks`](crate::ArchiveDocument::list_tracks) and
/// carry the stable index every edit call refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackEntry {
    /// Position of the track in document order, assigned at parse time.
    pub index: usize,
    /// The `id` attribute of the part element, if present.
    pub part_id: Option<String>,
    names: [Option<String>; 3],
}

impl TrackEntry {
    pub(crate) fn from_scanned(index: usize, part: &ScannedPart) -> Self {
        Self {
            index,
            part_id: part.id.clone(),
            names: part
                .fields
                .each_ref()
                .map(|f| f.as_ref().map(|f| f.value.clone())),
        }
    }

    /// Returns the current name of a field, or `None` if the track has no
    /// such field.
    pub fn name(&self, field: FieldKind) -> Option<&str> {
        self.names[field.slot()].as_deref()
    }

    /// Returns `true` if the track carries the field.
    pub fn has_field(&self, field: FieldKind) -> bool {
        self.names[field.slot()].is_some()
    }

    pub(crate) fn set_name(&mut self, field: FieldKind, name: String) {
        self.names[field.slot()] = Some(name);
    }

    /// Returns a label for display: the part name, then the mixer name,
    /// then the MIDI name, whichever is first non-empty.
    pub fn display_name(&self) -> &str {
        [FieldKind::Part, FieldKind::Mixer, FieldKind::Midi]
            .into_iter()
            .filter_map(|f| self.name(f))
            .find(|n| !n.is_empty())
            .unwrap_or("")
    }
}
