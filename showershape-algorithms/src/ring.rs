//! Hexagonal ring neighbourhoods around a seed cell.
#![allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]

use crate::{Error, Result};
use showershape_core::CellPosition;

const SQRT_3: f64 = 1.732_050_807_568_877_2;

/// Neighbourhood of the seed cell used for a cluster sum.
///
/// Each variant is a superset of the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RingSelection {
    /// The seed cell alone.
    Seed,
    /// Seed plus the first ring (7 cells).
    Seven,
    /// Two rings (19 cells).
    Nineteen,
    /// Three rings (37 cells).
    ThirtySeven,
    /// Four rings (61 cells).
    SixtyOne,
    /// Every signal cell in the layer.
    All,
}

impl RingSelection {
    /// All selections, smallest first.
    pub const ALL: [RingSelection; 6] = [
        RingSelection::Seed,
        RingSelection::Seven,
        RingSelection::Nineteen,
        RingSelection::ThirtySeven,
        RingSelection::SixtyOne,
        RingSelection::All,
    ];

    /// Maximum ring distance from the seed, `None` for the whole layer.
    #[must_use]
    pub fn radius(self) -> Option<u32> {
        match self {
            RingSelection::Seed => Some(0),
            RingSelection::Seven => Some(1),
            RingSelection::Nineteen => Some(2),
            RingSelection::ThirtySeven => Some(3),
            RingSelection::SixtyOne => Some(4),
            RingSelection::All => None,
        }
    }

    /// Returns true if a cell at `ring_distance` from the seed is selected.
    #[inline]
    #[must_use]
    pub fn contains(self, ring_distance: u32) -> bool {
        self.radius().is_none_or(|radius| ring_distance <= radius)
    }

    /// Short name used in output keys ("E1", "E7", ..., "EAll").
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            RingSelection::Seed => "E1",
            RingSelection::Seven => "E7",
            RingSelection::Nineteen => "E19",
            RingSelection::ThirtySeven => "E37",
            RingSelection::SixtyOne => "E61",
            RingSelection::All => "EAll",
        }
    }
}

/// How hits inside a selection are weighted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Weighting {
    /// Only the seed cell counts, whatever the selection.
    MostIntensive,
    /// Every selected hit counts with its energy as weight.
    Linear,
}

/// A ring selection paired with a weighting scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClusterMode {
    /// Neighbourhood around the seed.
    pub ring: RingSelection,
    /// Weighting applied to the selected hits.
    pub weighting: Weighting,
}

impl ClusterMode {
    /// Creates a mode from its parts.
    #[must_use]
    pub const fn new(ring: RingSelection, weighting: Weighting) -> Self {
        Self { ring, weighting }
    }

    /// Energy-weighted sum over `ring`.
    #[must_use]
    pub const fn linear(ring: RingSelection) -> Self {
        Self::new(ring, Weighting::Linear)
    }

    /// Seed-only sum.
    #[must_use]
    pub const fn most_intensive() -> Self {
        Self::new(RingSelection::Seed, Weighting::MostIntensive)
    }
}

/// Hexagonal cell lattice of one sensor.
///
/// Neighbouring cell centres are `pitch` apart, with one lattice axis along x.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HexGrid {
    pitch: f64,
}

impl HexGrid {
    /// Creates a lattice with the given centre-to-centre distance.
    ///
    /// # Errors
    /// Returns a configuration error if `pitch` is not finite and positive.
    pub fn new(pitch: f64) -> Result<Self> {
        if pitch.is_finite() && pitch > 0.0 {
            Ok(Self { pitch })
        } else {
            Err(Error::Config(format!(
                "cell pitch must be finite and positive, got {pitch}"
            )))
        }
    }

    /// Centre-to-centre distance of neighbouring cells.
    #[must_use]
    pub fn pitch(&self) -> f64 {
        self.pitch
    }

    /// Lattice node nearest to an offset, in axial `(q, r)` coordinates.
    #[must_use]
    pub fn axial(&self, dx: f64, dy: f64) -> (i64, i64) {
        let r = 2.0 * dy / (SQRT_3 * self.pitch);
        let q = dx / self.pitch - r / 2.0;
        let s = -q - r;

        let (mut rq, mut rr, rs) = (q.round(), r.round(), s.round());
        let dq = (rq - q).abs();
        let dr = (rr - r).abs();
        let ds = (rs - s).abs();
        if dq > dr && dq > ds {
            rq = -rr - rs;
        } else if dr > ds {
            rr = -rq - rs;
        }
        (rq as i64, rr as i64)
    }

    /// Number of rings separating `cell` from `origin`.
    #[must_use]
    pub fn ring_distance(&self, origin: &CellPosition, cell: &CellPosition) -> u32 {
        let (dx, dy) = cell.offset_from(origin);
        let (q, r) = self.axial(dx, dy);
        let distance = q.abs().max(r.abs()).max((q + r).abs());
        u32::try_from(distance).unwrap_or(u32::MAX)
    }

    /// Cell centre of lattice node `(q, r)` relative to the origin cell.
    #[must_use]
    pub fn cell_center(&self, q: i64, r: i64) -> CellPosition {
        #[allow(clippy::cast_precision_loss)]
        let (q, r) = (q as f64, r as f64);
        CellPosition::new(
            self.pitch * (q + r / 2.0),
            self.pitch * r * SQRT_3 / 2.0,
        )
    }
}
