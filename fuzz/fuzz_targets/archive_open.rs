//! Fuzz target for ArchiveDocument::from_bytes with arbitrary byte input.
//!
//! This target exercises zip parsing, score entry detection and the XML
//! field scanner with malformed or adversarial input. Any document that
//! opens is also edited and re-assembled in memory.
//!
//! Run with: cargo +nightly fuzz run archive_open

#![no_main]

use libfuzzer_sys::fuzz_target;
use mscz_rename::{ArchiveDocument, FieldEdit, FieldKind, OpenOptions};

fuzz_target!(|data: &[u8]| {
    let options = OpenOptions::new().allow_empty(true);
    let Ok(mut doc) = ArchiveDocument::from_bytes(data, options) else {
        return;
    };

    let tracks = doc.list_tracks();
    for field in FieldKind::ALL {
        let _ = doc.resolve_duplicates(field);
        let _ = doc.number_duplicates(field);
    }

    // Splicing must either succeed or fail cleanly, never panic.
    let edits: Vec<_> = tracks
        .iter()
        .flat_map(|t| {
            FieldKind::ALL
                .into_iter()
                .filter(|f| t.has_field(*f))
                .map(|f| FieldEdit::new(t.index, f, "<&fuzz>"))
        })
        .collect();
    let _ = doc.score().with_edits(&edits);
});
