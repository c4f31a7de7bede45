//! Run-scoped metadata and the per-event input bundle.

use crate::hit::RecHit;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Run and event identifiers delivered alongside the hits.
///
/// These values are passed through to the output record verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RunData {
    /// Event number within the run.
    pub event: u64,
    /// Run number.
    pub run: u32,
    /// PDG code of the beam particle.
    pub pdg_id: i32,
    /// Nominal beam energy.
    pub energy: f64,
    /// Detector configuration code (selects the EE/FH layer split).
    pub configuration: i32,
    /// Run type code.
    pub run_type: i32,
}

/// All inputs needed to process one event.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Event {
    /// Run metadata.
    pub run: RunData,
    /// Reconstructed hits of the event.
    #[cfg_attr(feature = "serde", serde(default))]
    pub hits: Vec<RecHit>,
}

impl Event {
    /// Creates an event from metadata and hits.
    #[must_use]
    pub fn new(run: RunData, hits: Vec<RecHit>) -> Self {
        Self { run, hits }
    }

    /// Number of hits in the event.
    #[must_use]
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    /// Returns true if the event has no hits.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}
