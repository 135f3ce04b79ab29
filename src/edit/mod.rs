//! Editing track names of an archive.
//!
//! An [`ArchiveDocument`] holds the archive bytes, the parsed score and a set
//! of staged names. Nothing is written until `save`:
//!
//! 1. staged names are spliced into the score text and checked,
//! 2. the zip is rebuilt with every other entry copied raw,
//! 3. the new archive is re-read and compared with the old one,
//! 4. the destination is backed up once per session and atomically replaced.
//!
//! A failure at any step leaves both the destination and the staged names
//! as they were.

mod document;
mod staging;

pub use document::{ArchiveDocument, DocumentState, SaveReport};
