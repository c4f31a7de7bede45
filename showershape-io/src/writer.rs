//! Record sinks for per-event output.

use crate::Result;
use showershape_core::OutputRecord;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Destination for output records, one per processed event.
pub trait RecordSink {
    /// Writes one record.
    ///
    /// # Errors
    /// Returns an error if the record cannot be written.
    fn write_record(&mut self, record: &OutputRecord) -> Result<()>;

    /// Flushes buffered output.
    ///
    /// # Errors
    /// Returns an error if the flush fails.
    fn finish(&mut self) -> Result<()>;

    /// Number of records written so far.
    fn records_written(&self) -> usize;
}

/// Writes one JSON object per line.
///
/// Keys keep the record's insertion order; non-finite values become `null`.
pub struct JsonLinesWriter<W: Write> {
    writer: W,
    count: usize,
}

impl JsonLinesWriter<BufWriter<File>> {
    /// Creates a writer for a new file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be created.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> JsonLinesWriter<W> {
    /// Wraps an existing writer.
    pub fn new(writer: W) -> Self {
        Self { writer, count: 0 }
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> RecordSink for JsonLinesWriter<W> {
    fn write_record(&mut self, record: &OutputRecord) -> Result<()> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n")?;
        self.count += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    fn records_written(&self) -> usize {
        self.count
    }
}

/// Writes records as long-form CSV: `event_index,key,value`.
///
/// The layer-dependent keys differ between events, so a fixed column set
/// does not exist. Non-finite values are written as `NaN`, `inf` or `-inf`.
pub struct CsvRecordWriter<W: Write> {
    writer: W,
    count: usize,
    header_written: bool,
}

impl CsvRecordWriter<BufWriter<File>> {
    /// Creates a writer for a new file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be created.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> CsvRecordWriter<W> {
    /// Wraps an existing writer.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            count: 0,
            header_written: false,
        }
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_header(&mut self) -> Result<()> {
        if !self.header_written {
            writeln!(self.writer, "event_index,key,value")?;
            self.header_written = true;
        }
        Ok(())
    }
}

impl<W: Write> RecordSink for CsvRecordWriter<W> {
    fn write_record(&mut self, record: &OutputRecord) -> Result<()> {
        self.write_header()?;
        for (key, value) in record.iter() {
            writeln!(self.writer, "{},{},{}", self.count, key, value)?;
        }
        self.count += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.write_header()?;
        self.writer.flush()?;
        Ok(())
    }

    fn records_written(&self) -> usize {
        self.count
    }
}

/// Output file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// One JSON object per event.
    JsonLines,
    /// Long-form CSV.
    Csv,
}

impl OutputFormat {
    /// Picks the format from a file extension: `csv` selects CSV, anything
    /// else JSON Lines.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => Self::Csv,
            _ => Self::JsonLines,
        }
    }
}

/// Creates a file sink whose format follows the path extension.
///
/// # Errors
/// Returns an error if the file cannot be created.
pub fn create_sink<P: AsRef<Path>>(path: P) -> Result<Box<dyn RecordSink>> {
    let path = path.as_ref();
    Ok(match OutputFormat::from_path(path) {
        OutputFormat::Csv => Box::new(CsvRecordWriter::create(path)?),
        OutputFormat::JsonLines => Box::new(JsonLinesWriter::create(path)?),
    })
}
