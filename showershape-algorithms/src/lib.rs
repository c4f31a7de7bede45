//! showershape-algorithms: Ring clustering and event aggregation.
//!
//! This crate provides the analysis core:
//! - **Ring geometry** - hexagonal neighbourhoods of 1/7/19/37/61 cells
//! - **Sensor clusters** - per-layer seed finding, ring sums and centroids
//! - **Gaussian fit** - Levenberg-Marquardt fit of the lateral profile
//! - **Event aggregation** - global centroid, inertia tensor, quantiles,
//!   ring ratios and the EE/FH energy split
//!
#![warn(missing_docs)]

mod aggregate;
pub mod config;
mod error;
pub mod gaussian;
mod processing;
pub mod ring;
mod sensor;
pub mod stats;

pub use aggregate::{EventAggregator, EventSummary, LayerSummary, SectionEnergies, RING_MODES};
pub use config::{AnalysisConfig, ConfigurationSections, GeometryConfig, SectionBoundaries, SectionConfig};
pub use error::{Error, Result};
pub use gaussian::{fit_2d_gaussian, FitStatus, GaussianFit, GaussianFitConfig, GaussianSample};
pub use processing::{process_batch_records, process_stream};
pub use ring::{ClusterMode, HexGrid, RingSelection, Weighting};
pub use sensor::{LayerClusterResult, SensorCluster};
pub use stats::{GlobalStats, InertiaTensor, SpectrumQuantiles, SENTINEL};

// Re-export core types used in the public API
pub use showershape_core::{ClassifierConfig, Event, LayerPositions, OutputRecord, RecHit, RunData};
