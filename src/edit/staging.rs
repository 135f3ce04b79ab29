//! Names staged for a save.

use std::collections::BTreeMap;

use crate::score::{FieldEdit, FieldKind};

/// Pending names keyed by track index and field.
///
/// A later name for the same field replaces the earlier one. Iteration is in
/// `(index, field)` order.
#[derive(Debug, Clone, Default)]
pub(crate) struct StagedEdits {
    names: BTreeMap<(usize, FieldKind), String>,
}

impl StagedEdits {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stages `name`; returns the previously staged name, if any.
    pub fn stage(&mut self, index: usize, field: FieldKind, name: String) -> Option<String> {
        self.names.insert((index, field), name)
    }

    /// Removes a staged name; returns it if there was one.
    pub fn unstage(&mut self, index: usize, field: FieldKind) -> Option<String> {
        self.names.remove(&(index, field))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn clear(&mut self) {
        self.names.clear();
    }

    /// Returns the staged names as edits in `(index, field)` order.
    pub fn to_edits(&self) -> Vec<FieldEdit> {
        self.names
            .iter()
            .map(|((index, field), name)| FieldEdit::new(*index, *field, name.clone()))
            .collect()
    }
}
