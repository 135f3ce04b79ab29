//! Shared test utilities for integration tests.
//!
//! Score archives are built in memory with `zip` so every test controls the
//! exact entries, order and compression methods.
//!
//! Note: `#![allow(dead_code)]` is required because each integration test file
//! compiles as a separate crate and may only use a subset of these helpers.

#![allow(dead_code)]

use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Name of the score entry in archives built by [`create_score_archive`].
pub const SCORE_ENTRY: &str = "Quartet.mscx";

/// Bytes standing in for a thumbnail image.
pub const THUMBNAIL: &[u8] = b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDR fake thumbnail";

/// Builds a score document with one `Part` per `(mixer, midi, long)` triple.
///
/// Parts get ids `1`, `2`, … in order.
pub fn score_xml(parts: &[(&str, &str, &str)]) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<museScore version=\"4.20\">\n  <programVersion>4.2.1</programVersion>\n  <Score>\n    <Division>480</Division>\n    <!-- parts -->\n",
    );
    for (i, (mixer, midi, long)) in parts.iter().enumerate() {
        xml.push_str(&format!(
            "    <Part id=\"{}\">\n      <Staff id=\"{}\"/>\n      <trackName>{}</trackName>\n      <Instrument id=\"instrument{}\">\n        <longName>{}</longName>\n        <shortName>I{}</shortName>\n        <trackName>{}</trackName>\n        <Channel>\n          <program value=\"40\"/>\n        </Channel>\n      </Instrument>\n    </Part>\n",
            i + 1,
            i + 1,
            mixer,
            i + 1,
            long,
            i + 1,
            midi
        ));
    }
    xml.push_str("    <Staff id=\"1\"><VBox><height>10</height></VBox></Staff>\n  </Score>\n</museScore>\n");
    xml
}

/// Creates an in-memory zip archive with the given entries and methods.
pub fn create_archive_with_methods(entries: &[(&str, &[u8], CompressionMethod)]) -> Vec<u8> {
    let mut buffer = Vec::new();
    {
        let mut zip = ZipWriter::new(Cursor::new(&mut buffer));
        for (name, data, method) in entries {
            let options = SimpleFileOptions::default().compression_method(*method);
            zip.start_file(*name, options).expect("Failed to start entry");
            zip.write_all(data).expect("Failed to write entry");
        }
        zip.finish().expect("Failed to finish archive");
    }
    buffer
}

/// Creates an in-memory zip archive with every entry deflated.
pub fn create_archive(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let entries: Vec<_> = entries
        .iter()
        .map(|(name, data)| (*name, *data, CompressionMethod::Deflated))
        .collect();
    create_archive_with_methods(&entries)
}

/// Creates a MuseScore 4 style archive around a score with the given parts.
///
/// Besides the score it holds a manifest, a stored thumbnail and audio
/// settings, like archives saved by MuseScore.
pub fn create_score_archive(parts: &[(&str, &str, &str)]) -> Vec<u8> {
    let score = score_xml(parts);
    let manifest = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<container>\n  <rootfiles>\n    <rootfile full-path=\"{SCORE_ENTRY}\"/>\n  </rootfiles>\n</container>\n"
    );
    create_archive_with_methods(&[
        ("META-INF/container.xml", manifest.as_bytes(), CompressionMethod::Deflated),
        (SCORE_ENTRY, score.as_bytes(), CompressionMethod::Deflated),
        ("Thumbnails/thumbnail.png", THUMBNAIL, CompressionMethod::Stored),
        ("audiosettings.json", b"{\"activeSoundFont\":\"MS Basic\"}", CompressionMethod::Deflated),
    ])
}

/// The string quartet used throughout the tests.
pub fn quartet() -> Vec<u8> {
    create_score_archive(&[
        ("Violin", "Violin", "Violin"),
        ("Violin", "Violin", "Violin"),
        ("Viola", "Viola", "Viola"),
        ("Cello", "Cello", "Violoncello"),
    ])
}

/// Writes `bytes` into `dir` as `name` and returns the path.
pub fn write_file(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).expect("Failed to write archive");
    path
}

/// Reads one entry of an archive, decompressed.
pub fn read_entry(archive: &[u8], name: &str) -> Vec<u8> {
    let mut zip = ZipArchive::new(Cursor::new(archive)).expect("Failed to open archive");
    let mut file = zip
        .by_name(name)
        .unwrap_or_else(|e| panic!("Missing entry '{}': {}", name, e));
    let mut data = Vec::new();
    file.read_to_end(&mut data).expect("Failed to read entry");
    data
}

/// Reads one entry of an archive as text.
pub fn read_text(archive: &[u8], name: &str) -> String {
    String::from_utf8(read_entry(archive, name)).expect("Entry is not UTF-8")
}

/// Raw facts about an entry: name, CRC, compressed size and method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    pub name: String,
    pub crc32: u32,
    pub compressed_size: u64,
    pub method: CompressionMethod,
}

/// Lists the entries of an archive without decompressing them.
pub fn raw_entries(archive: &[u8]) -> Vec<RawEntry> {
    let mut zip = ZipArchive::new(Cursor::new(archive)).expect("Failed to open archive");
    (0..zip.len())
        .map(|i| {
            let file = zip.by_index_raw(i).expect("Failed to read entry");
            RawEntry {
                name: file.name().to_string(),
                crc32: file.crc32(),
                compressed_size: file.compressed_size(),
                method: file.compression(),
            }
        })
        .collect()
}

/// Extracts the error from a Result, panicking if it's Ok.
pub fn expect_err<T, E>(result: Result<T, E>) -> E {
    match result {
        Ok(_) => panic!("Expected error but got Ok"),
        Err(e) => e,
    }
}
