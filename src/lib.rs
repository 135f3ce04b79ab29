//! # mscz-rename
//!
//! Edit the track names stored inside MuseScore `.mscz` archives without
//! disturbing anything else in the file.
//!
//! A score carries up to three names per instrument: the name shown in the
//! mixer, the track name used on MIDI export, and the long name printed as
//! the part label. This crate reads them, stages renames in memory, resolves
//! duplicates, and writes the archive back with a backup and an atomic
//! replace.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mscz_rename::{ArchiveDocument, FieldKind, Result, SaveOptions};
//!
//! fn main() -> Result<()> {
//!     let mut doc = ArchiveDocument::open("Quartet.mscz")?;
//!
//!     for track in doc.list_tracks() {
//!         println!(
//!             "{} mixer={:?} part={:?}",
//!             track.index,
//!             track.name(FieldKind::Mixer),
//!             track.name(FieldKind::Part)
//!         );
//!     }
//!
//!     doc.rename_track(1, FieldKind::Mixer, "Violin II")?;
//!     doc.resolve_duplicates(FieldKind::Midi);
//!
//!     let report = doc.save("Quartet.mscz", &SaveOptions::default())?;
//!     println!("{} field(s) changed", report.fields_changed);
//!     Ok(())
//! }
//! ```
//!
//! ## What Is Preserved
//!
//! Every archive member other than the score document is copied with its
//! compressed bytes and CRC unchanged. Inside the score document only the
//! text of the renamed fields changes; attribute order, whitespace, comments
//! and unrelated elements are kept byte-for-byte.
//!
//! ## Error Handling
//!
//! All operations return [`Result<T>`]. [`Error::kind`] sorts every error
//! into one of four categories:
//!
//! ```rust,no_run
//! use mscz_rename::{ArchiveDocument, ErrorKind};
//!
//! match ArchiveDocument::open("score.mscz") {
//!     Ok(doc) => println!("{} tracks", doc.track_count()),
//!     Err(e) if e.kind() == ErrorKind::Format => eprintln!("not a score: {e}"),
//!     Err(e) => eprintln!("{e}"),
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli` | No | The `mscz-rename` command-line tool |
//!
//! ## Minimum Supported Rust Version (MSRV)
//!
//! This crate requires **Rust 1.85** or later.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod edit;
pub mod error;
pub mod options;
pub mod resolve;
pub mod score;

pub(crate) mod container;
pub(crate) mod persist;

pub use error::{Error, ErrorKind, Result};

// Re-export editing API at crate root for convenience
pub use edit::{ArchiveDocument, DocumentState, SaveReport};
pub use options::{OpenOptions, SaveOptions};
pub use resolve::{NameResolver, invalid_character, validate_name};
pub use score::{FieldEdit, FieldKind, FieldSchema, ScoreDocument, TrackEntry};

pub use container::{SCORE_EXTENSION, is_score_document};
pub use persist::{BACKUP_MARKER, backup_name};
