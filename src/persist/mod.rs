//! Putting new archive bytes on disk.
//!
//! Saving is two steps: an optional backup of whatever currently lives at
//! the destination, then an atomic replace of the destination.

mod atomic;
mod backup;

pub use backup::{BACKUP_MARKER, backup_name};

pub(crate) use atomic::write_atomic;
pub(crate) use backup::write_backup;
