//! Backup copies of a file about to be replaced.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Marker inserted between the file stem and the extension.
pub const BACKUP_MARKER: &str = "_backup";

/// Returns the `attempt`-th candidate backup name for `target`.
///
/// Attempt 0 is `<stem>_backup.<ext>`, attempt `n` is
/// `<stem>_backup_<n>.<ext>`. A target without an extension gets none.
pub fn backup_name(target: &Path, attempt: usize) -> String {
    let stem = target
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let suffix = match attempt {
        0 => BACKUP_MARKER.to_string(),
        n => format!("{BACKUP_MARKER}_{n}"),
    };
    match target.extension() {
        Some(ext) => format!("{stem}{suffix}.{}", ext.to_string_lossy()),
        None => format!("{stem}{suffix}"),
    }
}

/// Copies `target` to the first free backup name.
///
/// The backup goes into `dir` if given, else next to `target`. Existing files
/// are never overwritten. The modification time of `target` is carried over
/// on a best-effort basis.
///
/// Returns `Ok(None)` if `target` does not exist.
pub(crate) fn write_backup(target: &Path, dir: Option<&Path>) -> Result<Option<PathBuf>> {
    let data = match fs::read(target) {
        Ok(data) => data,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(Error::Backup {
                path: target.to_path_buf(),
                source: e,
            });
        }
    };

    let dir = match dir {
        Some(dir) => dir.to_path_buf(),
        None => target
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")),
    };

    let mut attempt = 0;
    let (path, mut file) = loop {
        let candidate = dir.join(backup_name(target, attempt));
        match OpenOptions::new().write(true).create_new(true).open(&candidate) {
            Ok(file) => break (candidate, file),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => attempt += 1,
            Err(e) => {
                return Err(Error::Backup {
                    path: candidate,
                    source: e,
                });
            }
        }
    };

    let written = file.write_all(&data).and_then(|()| file.sync_all());
    drop(file);
    if let Err(e) = written {
        discard_partial(&path);
        return Err(Error::Backup { path, source: e });
    }

    match fs::metadata(target) {
        Ok(metadata) => {
            let mtime = filetime::FileTime::from_last_modification_time(&metadata);
            if let Err(e) = filetime::set_file_mtime(&path, mtime) {
                log::warn!(
                    "Failed to set modification time on '{}': {}",
                    path.display(),
                    e
                );
            }
        }
        Err(e) => log::warn!("Cannot read metadata of '{}': {}", target.display(), e),
    }

    log::info!("Backup written to '{}'", path.display());
    Ok(Some(path))
}

/// Removes a backup whose write failed, logging if that fails too.
fn discard_partial(path: &Path) -> bool {
    match fs::remove_file(path) {
        Ok(()) => true,
        Err(e) => {
            log::warn!(
                "Failed to remove incomplete backup '{}': {}",
                path.display(),
                e
            );
            false
        }
    }
}
