//! `META-INF/container.xml` handling.
//!
//! MuseScore 4 archives list their main document in a small manifest:
//!
//! ```xml
//! <container>
//!   <rootfiles>
//!     <rootfile full-path="MyScore.mscx"/>
//!   </rootfiles>
//! </container>
//! ```

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

/// Path of the manifest inside the archive.
pub(crate) const MANIFEST_ENTRY: &str = "META-INF/container.xml";

/// Returns every `rootfile/@full-path` in document order.
///
/// Returns `None` if the manifest cannot be parsed; callers fall back to
/// scanning entry names.
pub(crate) fn rootfiles(xml: &[u8]) -> Option<Vec<String>> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut paths = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                if e.local_name().as_ref() == b"rootfile" {
                    if let Some(path) = full_path(&e) {
                        paths.push(path);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                log::warn!(
                    "Ignoring unreadable {} at byte {}: {}",
                    MANIFEST_ENTRY,
                    reader.error_position(),
                    e
                );
                return None;
            }
        }
        buf.clear();
    }

    Some(paths)
}

fn full_path(e: &BytesStart<'_>) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == b"full-path")
        .map(|a| String::from_utf8_lossy(&a.value).into_owned())
}
