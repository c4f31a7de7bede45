//! Reconstructed calorimeter hits.

use crate::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Cell type code of the regular full hexagonal cells of a sensor.
pub const NORMAL_CELL_TYPE: u8 = 0;

/// Cartesian position of a cell centre within its layer.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CellPosition {
    /// X coordinate of the cell centre.
    pub x: f64,
    /// Y coordinate of the cell centre.
    pub y: f64,
}

impl CellPosition {
    /// Creates a new cell position.
    #[inline]
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Computes the squared Euclidean distance to another position.
    #[inline]
    #[must_use]
    pub fn distance_squared(&self, other: &Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Computes the Euclidean distance to another position.
    #[inline]
    #[must_use]
    pub fn distance(&self, other: &Self) -> f64 {
        self.distance_squared(other).sqrt()
    }

    /// Returns the offset `self - origin`.
    #[inline]
    #[must_use]
    pub fn offset_from(&self, origin: &Self) -> (f64, f64) {
        (self.x - origin.x, self.y - origin.y)
    }
}

/// A single reconstructed energy deposit.
///
/// Hits arrive already reconstructed: the energy is calibrated (in MIP
/// units for the test-beam setups) and the position is the centre of the
/// cell that fired.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RecHit {
    /// Detector layer index (1-based).
    pub layer: u32,
    /// Cell geometry type code (see [`NORMAL_CELL_TYPE`]).
    #[cfg_attr(feature = "serde", serde(default))]
    pub cell_type: u8,
    /// Reconstructed energy.
    pub energy: f64,
    /// Cell centre X coordinate.
    pub x: f64,
    /// Cell centre Y coordinate.
    pub y: f64,
}

impl RecHit {
    /// Creates a new hit.
    #[inline]
    #[must_use]
    pub fn new(layer: u32, cell_type: u8, energy: f64, x: f64, y: f64) -> Self {
        Self {
            layer,
            cell_type,
            energy,
            x,
            y,
        }
    }

    /// Creates a hit on a normal cell.
    #[inline]
    #[must_use]
    pub fn normal(layer: u32, energy: f64, x: f64, y: f64) -> Self {
        Self::new(layer, NORMAL_CELL_TYPE, energy, x, y)
    }

    /// Returns the cell centre position.
    #[inline]
    #[must_use]
    pub fn position(&self) -> CellPosition {
        CellPosition::new(self.x, self.y)
    }

    /// Checks that energy is finite and non-negative and the position finite.
    ///
    /// # Errors
    /// Returns [`Error::InvalidHit`] describing the offending hit.
    pub fn validate(&self) -> Result<()> {
        let energy_ok = self.energy.is_finite() && self.energy >= 0.0;
        if energy_ok && self.x.is_finite() && self.y.is_finite() {
            Ok(())
        } else {
            Err(Error::InvalidHit {
                layer: self.layer,
                energy: self.energy,
                x: self.x,
                y: self.y,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_cell_position_distance() {
        let p1 = CellPosition::new(0.0, 0.0);
        let p2 = CellPosition::new(3.0, 4.0);
        assert_relative_eq!(p1.distance_squared(&p2), 25.0);
        assert_relative_eq!(p1.distance(&p2), 5.0);
        assert_eq!(p2.offset_from(&p1), (3.0, 4.0));
    }

    #[test]
    fn test_normal_hit() {
        let hit = RecHit::normal(3, 12.5, 1.0, -2.0);
        assert_eq!(hit.layer, 3);
        assert_eq!(hit.cell_type, NORMAL_CELL_TYPE);
        assert_eq!(hit.position(), CellPosition::new(1.0, -2.0));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(RecHit::normal(1, 5.0, 0.0, 0.0).validate().is_ok());
        assert!(RecHit::normal(1, 0.0, 0.0, 0.0).validate().is_ok());
        assert!(RecHit::normal(1, -1.0, 0.0, 0.0).validate().is_err());
        assert!(RecHit::normal(1, f64::NAN, 0.0, 0.0).validate().is_err());
        assert!(RecHit::normal(1, 5.0, f64::INFINITY, 0.0).validate().is_err());
    }
}
