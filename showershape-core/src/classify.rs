//! Energy-tier classification of the hits of one event.

use std::collections::BTreeMap;

use crate::hit::{RecHit, NORMAL_CELL_TYPE};
use crate::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Energy tier of a hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HitTier {
    /// Above the MIP threshold; used for clustering and global statistics.
    Signal,
    /// Between the noise boundary and the MIP threshold.
    Marginal,
    /// At or below the noise boundary.
    Noise,
}

/// Thresholds and cell selection for hit classification.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ClassifierConfig {
    /// Hits strictly above this energy are signal hits.
    pub mip_threshold: f64,
    /// Hits strictly above this energy (and not signal) are marginal hits.
    pub noise_threshold: f64,
    /// Only hits of this cell type contribute positions to global statistics.
    pub position_cell_type: u8,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            mip_threshold: 4.0,
            noise_threshold: 0.5,
            position_cell_type: NORMAL_CELL_TYPE,
        }
    }
}

impl ClassifierConfig {
    /// Creates a configuration with default thresholds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the MIP (signal) threshold.
    #[must_use]
    pub fn with_mip_threshold(mut self, threshold: f64) -> Self {
        self.mip_threshold = threshold;
        self
    }

    /// Sets the noise boundary.
    #[must_use]
    pub fn with_noise_threshold(mut self, threshold: f64) -> Self {
        self.noise_threshold = threshold;
        self
    }

    /// Sets the position-bearing cell type.
    #[must_use]
    pub fn with_position_cell_type(mut self, cell_type: u8) -> Self {
        self.position_cell_type = cell_type;
        self
    }

    /// Checks that both thresholds are finite and ordered.
    ///
    /// # Errors
    /// Returns [`Error::ConfigError`] if a threshold is non-finite or the
    /// noise boundary lies above the MIP threshold.
    pub fn validate(&self) -> Result<()> {
        if !self.mip_threshold.is_finite() || !self.noise_threshold.is_finite() {
            return Err(Error::ConfigError(format!(
                "thresholds must be finite (mip={}, noise={})",
                self.mip_threshold, self.noise_threshold
            )));
        }
        if self.noise_threshold > self.mip_threshold {
            return Err(Error::ConfigError(format!(
                "noise threshold {} exceeds MIP threshold {}",
                self.noise_threshold, self.mip_threshold
            )));
        }
        Ok(())
    }

    /// Returns the tier an energy falls into.
    #[inline]
    #[must_use]
    pub fn tier(&self, energy: f64) -> HitTier {
        if energy > self.mip_threshold {
            HitTier::Signal
        } else if energy > self.noise_threshold {
            HitTier::Marginal
        } else {
            HitTier::Noise
        }
    }
}

/// The hits of one event split into three disjoint energy tiers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassifiedHits {
    /// Hits above the MIP threshold.
    pub signal: Vec<RecHit>,
    /// MIP-like hits.
    pub marginal: Vec<RecHit>,
    /// Noise hits.
    pub noise: Vec<RecHit>,
    position_cell_type: u8,
}

impl ClassifiedHits {
    /// Total number of classified hits.
    #[must_use]
    pub fn len(&self) -> usize {
        self.signal.len() + self.marginal.len() + self.noise.len()
    }

    /// Returns true if no hits were classified.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Signal hits whose cell type carries usable position information.
    pub fn positioned_signal(&self) -> impl Iterator<Item = &RecHit> + '_ {
        let cell_type = self.position_cell_type;
        self.signal.iter().filter(move |hit| hit.cell_type == cell_type)
    }

    /// Signal hits grouped by layer, ordered by layer index.
    ///
    /// Only layers with at least one signal hit appear. Hits keep their
    /// input order within a layer.
    #[must_use]
    pub fn signal_by_layer(&self) -> BTreeMap<u32, Vec<RecHit>> {
        let mut layers: BTreeMap<u32, Vec<RecHit>> = BTreeMap::new();
        for hit in &self.signal {
            layers.entry(hit.layer).or_default().push(*hit);
        }
        layers
    }
}

/// Partitions hits into signal, marginal and noise tiers.
///
/// Every hit lands in exactly one tier, decided by its energy alone.
#[must_use]
pub fn classify(hits: &[RecHit], config: &ClassifierConfig) -> ClassifiedHits {
    let mut classified = ClassifiedHits {
        position_cell_type: config.position_cell_type,
        ..ClassifiedHits::default()
    };
    for hit in hits {
        match config.tier(hit.energy) {
            HitTier::Signal => classified.signal.push(*hit),
            HitTier::Marginal => classified.marginal.push(*hit),
            HitTier::Noise => classified.noise.push(*hit),
        }
    }
    classified
}
