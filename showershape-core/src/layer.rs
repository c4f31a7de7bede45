//! Longitudinal positions of the detector layers.

use std::collections::BTreeMap;

use crate::{Error, Result};

/// Mapping from layer index to the z coordinate of that layer.
///
/// Loaded once before any event is processed and read-only afterwards,
/// so a single table can be shared by concurrently processed events.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayerPositions {
    z: BTreeMap<u32, f64>,
}

impl LayerPositions {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the z position of a layer, replacing any previous entry.
    pub fn insert(&mut self, layer: u32, z: f64) {
        self.z.insert(layer, z);
    }

    /// Looks up the z position of a layer.
    ///
    /// # Errors
    /// Returns [`Error::MissingLayerPosition`] if the layer is unknown.
    pub fn z(&self, layer: u32) -> Result<f64> {
        self.z
            .get(&layer)
            .copied()
            .ok_or(Error::MissingLayerPosition { layer })
    }

    /// Returns true if the layer has a known position.
    #[must_use]
    pub fn contains(&self, layer: u32) -> bool {
        self.z.contains_key(&layer)
    }

    /// Number of layers in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.z.len()
    }

    /// Returns true if the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.z.is_empty()
    }

    /// Iterates over `(layer, z)` pairs in layer order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.z.iter().map(|(&layer, &z)| (layer, z))
    }
}

impl FromIterator<(u32, f64)> for LayerPositions {
    fn from_iter<I: IntoIterator<Item = (u32, f64)>>(iter: I) -> Self {
        Self {
            z: iter.into_iter().collect(),
        }
    }
}
