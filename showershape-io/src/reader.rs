//! Memory-mapped event file readers.
//!
//! Event files are JSON Lines: one event per line,
//! `{"run": {...}, "hits": [{"layer", "cell_type", "energy", "x", "y"}, ...]}`.
//! Blank lines are skipped.

use crate::{Error, Result};
use memmap2::Mmap;
use showershape_core::Event;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A memory-mapped file reader.
///
/// Uses memmap2 to efficiently access file contents without
/// loading the entire file into memory.
pub struct MappedFileReader {
    mmap: Option<Arc<Mmap>>,
    path: PathBuf,
}

impl MappedFileReader {
    /// Opens a file for memory-mapped reading.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or memory-mapped.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(&path)?;
        // Zero-length files cannot be mapped on every platform.
        let mmap = if file.metadata()?.len() == 0 {
            None
        } else {
            // SAFETY: The file is opened read-only and we assume it is not modified concurrently.
            // This is the standard safety contract for memory mapping.
            #[allow(unsafe_code)]
            let mmap = unsafe { Mmap::map(&file)? };
            Some(Arc::new(mmap))
        };
        Ok(Self {
            mmap,
            path: path.as_ref().to_path_buf(),
        })
    }

    /// Returns the file contents as a byte slice.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match &self.mmap {
            Some(mmap) => &mmap[..],
            None => &[],
        }
    }

    /// Returns the file size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    /// Returns true if the file is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Path the reader was opened from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Iterator over the events of a JSON Lines buffer.
///
/// Yields one `Result` per non-blank line; a malformed line does not stop
/// the iteration.
pub struct EventLines<'a> {
    data: &'a [u8],
    offset: usize,
    line: usize,
    source: &'a Path,
}

impl<'a> EventLines<'a> {
    /// Iterates over the events in `data`; `source` names the input in errors.
    #[must_use]
    pub fn new(data: &'a [u8], source: &'a Path) -> Self {
        Self {
            data,
            offset: 0,
            line: 0,
            source,
        }
    }
}

impl Iterator for EventLines<'_> {
    type Item = Result<Event>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.offset < self.data.len() {
            let rest = &self.data[self.offset..];
            let end = rest.iter().position(|&b| b == b'\n').unwrap_or(rest.len());
            let line = rest[..end].trim_ascii();
            self.offset += end + 1;
            self.line += 1;

            if line.is_empty() {
                continue;
            }
            return Some(serde_json::from_slice(line).map_err(|err| {
                Error::InvalidFormat(format!(
                    "{}:{}: {err}",
                    self.source.display(),
                    self.line
                ))
            }));
        }
        None
    }
}

/// A JSON Lines event file reader with memory-mapped I/O.
pub struct EventReader {
    reader: MappedFileReader,
}

impl EventReader {
    /// Opens an event file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or memory-mapped.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = MappedFileReader::open(path)?;
        log::debug!(
            "mapped {} ({} bytes)",
            reader.path().display(),
            reader.len()
        );
        Ok(Self { reader })
    }

    /// Returns the file size in bytes.
    #[must_use]
    pub fn file_size(&self) -> usize {
        self.reader.len()
    }

    /// Path of the event file.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.reader.path()
    }

    /// Iterates over the events in file order.
    #[must_use]
    pub fn events(&self) -> EventLines<'_> {
        EventLines::new(self.reader.as_bytes(), self.reader.path())
    }

    /// Reads every event of the file.
    ///
    /// # Errors
    /// Returns the error of the first malformed line.
    pub fn read_all(&self) -> Result<Vec<Event>> {
        self.events().collect()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const TWO_EVENTS: &str = concat!(
        r#"{"run":{"event":1,"run":512,"pdg_id":11,"energy":100.0,"configuration":2,"run_type":1},"#,
        r#""hits":[{"layer":1,"cell_type":0,"energy":12.5,"x":0.0,"y":0.0},"#,
        r#"{"layer":2,"energy":3.0,"x":1.1,"y":-0.5}]}"#,
        "\n\n",
        r#"{"run":{"event":2,"run":512},"hits":[]}"#,
        "\r\n"
    );

    #[test]
    fn test_mapped_reader() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"hello").unwrap();
        file.flush().unwrap();

        let reader = MappedFileReader::open(file.path()).unwrap();
        assert_eq!(reader.as_bytes(), b"hello");
        assert_eq!(reader.len(), 5);
        assert!(!reader.is_empty());
    }

    #[test]
    fn test_empty_file() {
        let file = NamedTempFile::new().unwrap();
        let reader = EventReader::open(file.path()).unwrap();
        assert_eq!(reader.file_size(), 0);
        assert!(reader.read_all().unwrap().is_empty());
    }

    #[test]
    fn test_read_events() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(TWO_EVENTS.as_bytes()).unwrap();
        file.flush().unwrap();

        let events = EventReader::open(file.path()).unwrap().read_all().unwrap();
        assert_eq!(events.len(), 2);

        let first = &events[0];
        assert_eq!(first.run.event, 1);
        assert_eq!(first.run.configuration, 2);
        assert_eq!(first.hits.len(), 2);
        assert_eq!(first.hits[1].cell_type, 0);
        assert_eq!(first.hits[1].energy, 3.0);

        let second = &events[1];
        assert_eq!(second.run.event, 2);
        assert_eq!(second.run.pdg_id, 0);
        assert!(second.is_empty());
    }

    #[test]
    fn test_malformed_line_reports_position() {
        let data = b"{\"run\":{},\"hits\":[]}\n{\"run\": 5}\n{\"run\":{}}";
        let source = Path::new("events.jsonl");
        let results: Vec<_> = EventLines::new(data, source).collect();
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(results[2].is_ok());

        let Err(Error::InvalidFormat(message)) = &results[1] else {
            panic!("expected a format error");
        };
        assert!(message.starts_with("events.jsonl:2:"), "{message}");
    }
}
