//! showershape-core: Core types for calorimeter shower-shape analysis.
//!
//! This crate provides the per-event data model shared by the clustering
//! engine and the I/O layer: reconstructed hits, energy-tier
//! classification, layer z positions, run metadata and flat output records.
//!

pub mod classify;
pub mod error;
pub mod hit;
pub mod layer;
pub mod record;
pub mod run;

pub use classify::{classify, ClassifiedHits, ClassifierConfig, HitTier};
pub use error::{Error, Result};
pub use hit::{CellPosition, RecHit, NORMAL_CELL_TYPE};
pub use layer::LayerPositions;
pub use record::OutputRecord;
pub use run::{Event, RunData};
