//! Re-assembling an archive with some entries replaced.

use std::collections::BTreeMap;
use std::io::{Cursor, Read, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::{Error, Result};

/// Statistics of a rewrite.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct RewriteStats {
    /// Entries copied without decompression.
    pub entries_copied: usize,
    /// Entries written from replacement data.
    pub entries_replaced: usize,
}

/// Builds a new archive from `source`, replacing the data of every entry
/// named in `replacements` and raw-copying the rest in original order.
///
/// Replaced entries keep their compression method and modification time.
/// Replacements naming entries that do not exist are an error.
pub(crate) fn rewrite(
    source: &[u8],
    replacements: &BTreeMap<String, Vec<u8>>,
) -> Result<(Vec<u8>, RewriteStats)> {
    let mut archive = super::open(source)?;
    let mut writer = ZipWriter::new(Cursor::new(Vec::with_capacity(source.len())));
    let mut stats = RewriteStats::default();

    for i in 0..archive.len() {
        let file = archive.by_index_raw(i)?;
        let name = file.name().to_string();

        match replacements.get(&name) {
            Some(data) => {
                let method = match file.compression() {
                    CompressionMethod::Stored => CompressionMethod::Stored,
                    _ => CompressionMethod::Deflated,
                };
                let mut options = SimpleFileOptions::default().compression_method(method);
                if let Some(modified) = file.last_modified() {
                    options = options.last_modified_time(modified);
                }
                drop(file);

                writer.start_file(name.as_str(), options)?;
                writer.write_all(data)?;
                stats.entries_replaced += 1;
            }
            None => {
                writer.raw_copy_file(file)?;
                stats.entries_copied += 1;
            }
        }
    }

    if stats.entries_replaced != replacements.len() {
        let missing = replacements
            .keys()
            .find(|name| archive.index_for_name(name).is_none())
            .cloned()
            .unwrap_or_default();
        return Err(Error::MissingScoreEntry {
            expected: Some(missing),
        });
    }

    if !archive.comment().is_empty() {
        writer.set_raw_comment(archive.comment().into());
    }

    let bytes = writer.finish()?.into_inner();
    log::debug!(
        "Rewrote archive: {} entries copied, {} replaced, {} bytes",
        stats.entries_copied,
        stats.entries_replaced,
        bytes.len()
    );
    Ok((bytes, stats))
}

/// Checks that `output` is `source` with exactly `replacements` applied.
///
/// Entry names and order must match. Copied entries must keep their CRC
/// and compressed size; replaced entries must decompress to the replacement
/// data and carry its CRC.
pub(crate) fn verify(
    source: &[u8],
    output: &[u8],
    replacements: &BTreeMap<String, Vec<u8>>,
) -> Result<()> {
    let mut original = super::open(source)?;
    let mut written = super::open(output)
        .map_err(|e| Error::verification("<archive>", format!("output does not open: {e}")))?;

    if original.len() != written.len() {
        return Err(Error::verification(
            "<archive>",
            format!("entry count {} != {}", written.len(), original.len()),
        ));
    }

    for i in 0..original.len() {
        let (name, crc, packed) = {
            let file = original.by_index_raw(i)?;
            (file.name().to_string(), file.crc32(), file.compressed_size())
        };

        match replacements.get(&name) {
            Some(expected) => {
                let mut file = written.by_index(i)?;
                if file.name() != name {
                    return Err(Error::verification(&name, format!("found '{}' instead", file.name())));
                }
                let mut data = Vec::with_capacity(expected.len());
                file.read_to_end(&mut data)?;
                if &data != expected {
                    return Err(Error::verification(&name, "replacement data differs"));
                }
                if file.crc32() != crc32fast::hash(expected) {
                    return Err(Error::verification(&name, "stored CRC does not match data"));
                }
            }
            None => {
                let file = written.by_index_raw(i)?;
                if file.name() != name {
                    return Err(Error::verification(&name, format!("found '{}' instead", file.name())));
                }
                if file.crc32() != crc || file.compressed_size() != packed {
                    return Err(Error::verification(&name, "copied entry changed"));
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn build(entries: &[(&str, &[u8], CompressionMethod)]) -> Vec<u8> {
        let mut buffer = Vec::new();
        {
            let mut zip = ZipWriter::new(Cursor::new(&mut buffer));
            for (name, data, method) in entries {
                let options = SimpleFileOptions::default().compression_method(*method);
                zip.start_file(*name, options).unwrap();
                zip.write_all(data).unwrap();
            }
            zip.finish().unwrap();
        }
        buffer
    }

    fn read_all(bytes: &[u8]) -> Vec<(String, Vec<u8>)> {
        let mut archive = super::super::open(bytes).unwrap();
        (0..archive.len())
            .map(|i| {
                let mut file = archive.by_index(i).unwrap();
                let mut data = Vec::new();
                file.read_to_end(&mut data).unwrap();
                (file.name().to_string(), data)
            })
            .collect()
    }

    fn sample() -> Vec<u8> {
        build(&[
            ("score.mscx", b"<museScore/>" as &[u8], CompressionMethod::Deflated),
            ("Thumbnails/thumbnail.png", b"\x89PNG\r\n", CompressionMethod::Stored),
            ("audiosettings.json", b"{}", CompressionMethod::Deflated),
        ])
    }

    #[test]
    fn test_rewrite_without_replacements_keeps_everything() {
        let source = sample();
        let (output, stats) = rewrite(&source, &BTreeMap::new()).unwrap();
        assert_eq!(stats.entries_copied, 3);
        assert_eq!(stats.entries_replaced, 0);
        assert_eq!(read_all(&output), read_all(&source));
        verify(&source, &output, &BTreeMap::new()).unwrap();
    }

    #[test]
    fn test_rewrite_replaces_one_entry() {
        let source = sample();
        let mut replacements = BTreeMap::new();
        replacements.insert("score.mscx".to_string(), b"<museScore version=\"4\"/>".to_vec());

        let (output, stats) = rewrite(&source, &replacements).unwrap();
        assert_eq!(stats.entries_copied, 2);
        assert_eq!(stats.entries_replaced, 1);

        let contents = read_all(&output);
        assert_eq!(contents[0].0, "score.mscx");
        assert_eq!(contents[0].1, b"<museScore version=\"4\"/>");
        assert_eq!(contents[1], read_all(&source)[1]);
        verify(&source, &output, &replacements).unwrap();
    }

    #[test]
    fn test_rewrite_keeps_non_utf8_comment() {
        let comment: &[u8] = b"Partitur \xe9dit\xe9e \xff";
        let mut source = Vec::new();
        {
            let mut zip = ZipWriter::new(Cursor::new(&mut source));
            zip.set_raw_comment(comment.into());
            zip.start_file("score.mscx", SimpleFileOptions::default()).unwrap();
            zip.write_all(b"<museScore/>").unwrap();
            zip.finish().unwrap();
        }

        let mut replacements = BTreeMap::new();
        replacements.insert("score.mscx".to_string(), b"<museScore version=\"4\"/>".to_vec());
        let (output, _) = rewrite(&source, &replacements).unwrap();

        let archive = super::super::open(&output).unwrap();
        assert_eq!(archive.comment(), comment);
    }

    #[test]
    fn test_rewrite_unknown_replacement_fails() {
        let source = sample();
        let mut replacements = BTreeMap::new();
        replacements.insert("other.mscx".to_string(), Vec::new());
        assert!(matches!(
            rewrite(&source, &replacements),
            Err(Error::MissingScoreEntry { .. })
        ));
    }

    #[test]
    fn test_verify_detects_changed_entry() {
        let source = sample();
        let tampered = build(&[
            ("score.mscx", b"<museScore/>" as &[u8], CompressionMethod::Deflated),
            ("Thumbnails/thumbnail.png", b"\x89PNG\r\n!", CompressionMethod::Stored),
            ("audiosettings.json", b"{}", CompressionMethod::Deflated),
        ]);
        assert!(matches!(
            verify(&source, &tampered, &BTreeMap::new()),
            Err(Error::VerificationFailed { .. })
        ));
    }
}
