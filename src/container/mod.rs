//! Reading and rewriting the `.mscz` zip container.
//!
//! The container is treated as opaque except for the entries that hold
//! score documents. Every other member is copied with
//! [`ZipWriter::raw_copy_file`](zip::ZipWriter::raw_copy_file), so its
//! compressed bytes and CRC reach the output untouched.

mod manifest;
mod rewrite;

pub(crate) use rewrite::{rewrite, verify};

use std::io::{Cursor, Read};

use zip::ZipArchive;

use crate::{Error, Result};

/// File extension of MuseScore score documents.
pub const SCORE_EXTENSION: &str = ".mscx";

/// A zip archive read from memory.
pub(crate) type MemoryArchive<'a> = ZipArchive<Cursor<&'a [u8]>>;

/// Opens `bytes` as a zip archive.
pub(crate) fn open(bytes: &[u8]) -> Result<MemoryArchive<'_>> {
    ZipArchive::new(Cursor::new(bytes)).map_err(|e| match e {
        zip::result::ZipError::Io(io) => Error::InvalidArchive(io.to_string()),
        other => Error::from(other),
    })
}

/// Returns the names of all entries in central directory order.
pub(crate) fn entry_names(archive: &mut MemoryArchive<'_>) -> Result<Vec<String>> {
    (0..archive.len())
        .map(|i| Ok(archive.by_index_raw(i)?.name().to_string()))
        .collect()
}

/// Reads an entry completely.
pub(crate) fn read_entry(archive: &mut MemoryArchive<'_>, name: &str) -> Result<Vec<u8>> {
    let mut file = archive.by_name(name)?;
    let mut data = Vec::with_capacity(file.size() as usize);
    file.read_to_end(&mut data)?;
    Ok(data)
}

/// Picks the entry holding the main score document.
///
/// An explicitly requested entry must exist. Otherwise the first `.mscx`
/// rootfile listed in `META-INF/container.xml` wins, then the first
/// top-level `.mscx` entry, then the first `.mscx` entry anywhere.
pub(crate) fn locate_score_entry(
    archive: &mut MemoryArchive<'_>,
    requested: Option<&str>,
) -> Result<String> {
    let names = entry_names(archive)?;

    if let Some(requested) = requested {
        return names
            .iter()
            .find(|n| n.as_str() == requested)
            .cloned()
            .ok_or_else(|| Error::MissingScoreEntry {
                expected: Some(requested.to_string()),
            });
    }

    if names.iter().any(|n| n == manifest::MANIFEST_ENTRY) {
        let xml = read_entry(archive, manifest::MANIFEST_ENTRY)?;
        if let Some(rootfiles) = manifest::rootfiles(&xml) {
            let listed = rootfiles
                .into_iter()
                .find(|p| is_score_document(p) && names.contains(p));
            if let Some(entry) = listed {
                log::debug!("Score entry '{}' taken from {}", entry, manifest::MANIFEST_ENTRY);
                return Ok(entry);
            }
        }
    }

    names
        .iter()
        .find(|n| is_score_document(n) && !n.contains('/'))
        .or_else(|| names.iter().find(|n| is_score_document(n)))
        .cloned()
        .ok_or(Error::MissingScoreEntry { expected: None })
}

/// Returns the score documents other than `main`, such as excerpts.
pub(crate) fn secondary_documents(names: &[String], main: &str) -> Vec<String> {
    names
        .iter()
        .filter(|n| n.as_str() != main && is_score_document(n))
        .cloned()
        .collect()
}

/// Returns `true` if an entry name looks like a score document.
pub fn is_score_document(name: &str) -> bool {
    name.len() > SCORE_EXTENSION.len()
        && name
            .get(name.len() - SCORE_EXTENSION.len()..)
            .is_some_and(|ext| ext.eq_ignore_ascii_case(SCORE_EXTENSION))
}
