//! showershape-io: File I/O for showershape.
//!
//! This crate provides the readers and writers around the analysis core:
//! the layer-position calibration table, JSON Lines event files accessed
//! through memmap2, and record sinks for the per-event output.
//!

mod error;
pub mod layer_positions;
mod reader;
mod writer;

pub use error::{Error, Result};
pub use layer_positions::{parse_layer_positions, read_layer_positions};
pub use reader::{EventLines, EventReader, MappedFileReader};
pub use writer::{create_sink, CsvRecordWriter, JsonLinesWriter, OutputFormat, RecordSink};
