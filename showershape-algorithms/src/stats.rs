//! Whole-event statistics over the position-bearing signal hits.

use showershape_core::{ClassifiedHits, LayerPositions};

use crate::Result;

/// Value reported for statistics that are undefined for the event.
pub const SENTINEL: f64 = -1.0;

/// Minimum spectrum size for which quantiles are computed.
const MIN_QUANTILE_HITS: usize = 5;

/// An energy deposit placed in 3D.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightedPoint {
    /// Cell x position.
    pub x: f64,
    /// Cell y position.
    pub y: f64,
    /// Layer z position.
    pub z: f64,
    /// Deposited energy.
    pub weight: f64,
}

/// Energy-weighted 3D mean position.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Centroid3 {
    /// Weighted mean x.
    pub x: f64,
    /// Weighted mean y.
    pub y: f64,
    /// Weighted mean z.
    pub z: f64,
}

/// Symmetric second-moment tensor about the centroid, normalised by the total weight.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct InertiaTensor {
    /// Spread along x.
    pub xx: f64,
    /// Spread along y.
    pub yy: f64,
    /// Spread along z.
    pub zz: f64,
    /// x-y covariance.
    pub xy: f64,
    /// x-z covariance.
    pub xz: f64,
    /// y-z covariance.
    pub yz: f64,
}

/// 25/50/75 % quantiles of the hit-energy spectrum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectrumQuantiles {
    /// First quartile.
    pub q25: f64,
    /// Median.
    pub q50: f64,
    /// Third quartile.
    pub q75: f64,
}

impl Default for SpectrumQuantiles {
    fn default() -> Self {
        Self {
            q25: SENTINEL,
            q50: SENTINEL,
            q75: SENTINEL,
        }
    }
}

/// Quantiles of an ascending spectrum.
///
/// The p-quantile is the entry at 1-based rank `floor(N * p)`. With fewer
/// than five entries every quantile is [`SENTINEL`].
#[must_use]
pub fn spectrum_quantiles(sorted: &[f64]) -> SpectrumQuantiles {
    let n = sorted.len();
    if n < MIN_QUANTILE_HITS {
        return SpectrumQuantiles::default();
    }
    SpectrumQuantiles {
        q25: sorted[n / 4 - 1],
        q50: sorted[n / 2 - 1],
        q75: sorted[3 * n / 4 - 1],
    }
}

/// Weighted centroid and total weight.
///
/// A zero total weight yields a non-finite centroid.
#[must_use]
pub fn weighted_centroid(points: &[WeightedPoint]) -> (Centroid3, f64) {
    let mut total = 0.0;
    let mut sum = Centroid3::default();
    for p in points {
        total += p.weight;
        sum.x += p.weight * p.x;
        sum.y += p.weight * p.y;
        sum.z += p.weight * p.z;
    }
    (
        Centroid3 {
            x: sum.x / total,
            y: sum.y / total,
            z: sum.z / total,
        },
        total,
    )
}

/// Inertia tensor about `centroid`, each component divided by `total_weight`.
#[must_use]
pub fn inertia_tensor(points: &[WeightedPoint], centroid: &Centroid3, total_weight: f64) -> InertiaTensor {
    let mut tensor = InertiaTensor::default();
    for p in points {
        let dx = p.x - centroid.x;
        let dy = p.y - centroid.y;
        let dz = p.z - centroid.z;
        tensor.xx += p.weight * dx * dx;
        tensor.yy += p.weight * dy * dy;
        tensor.zz += p.weight * dz * dz;
        tensor.xy += p.weight * dx * dy;
        tensor.xz += p.weight * dx * dz;
        tensor.yz += p.weight * dy * dz;
    }
    InertiaTensor {
        xx: tensor.xx / total_weight,
        yy: tensor.yy / total_weight,
        zz: tensor.zz / total_weight,
        xy: tensor.xy / total_weight,
        xz: tensor.xz / total_weight,
        yz: tensor.yz / total_weight,
    }
}

/// Statistics over all position-bearing signal hits of an event.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalStats {
    /// Energy-weighted mean position.
    pub centroid: Centroid3,
    /// Sum of the contributing hit energies.
    pub total_energy: f64,
    /// Second moments about the centroid.
    pub inertia: InertiaTensor,
    /// Hit energies in ascending order.
    pub spectrum: Vec<f64>,
    /// Quantiles of `spectrum`.
    pub quantiles: SpectrumQuantiles,
}

impl GlobalStats {
    /// Computes centroid, inertia tensor and spectrum quantiles.
    ///
    /// # Errors
    /// Returns [`showershape_core::Error::MissingLayerPosition`] if a
    /// contributing hit lies in a layer without a z position.
    pub fn compute(hits: &ClassifiedHits, positions: &LayerPositions) -> Result<Self> {
        let points = hits
            .positioned_signal()
            .map(|hit| {
                Ok(WeightedPoint {
                    x: hit.x,
                    y: hit.y,
                    z: positions.z(hit.layer)?,
                    weight: hit.energy,
                })
            })
            .collect::<showershape_core::Result<Vec<_>>>()?;

        let (centroid, total_energy) = weighted_centroid(&points);
        let inertia = inertia_tensor(&points, &centroid, total_energy);

        let mut spectrum: Vec<f64> = points.iter().map(|p| p.weight).collect();
        spectrum.sort_by(f64::total_cmp);
        let quantiles = spectrum_quantiles(&spectrum);

        Ok(Self {
            centroid,
            total_energy,
            inertia,
            spectrum,
            quantiles,
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    use super::*;
    use approx::assert_relative_eq;
    use showershape_core::{classify, ClassifierConfig, RecHit};

    fn point(x: f64, y: f64, z: f64, weight: f64) -> WeightedPoint {
        WeightedPoint { x, y, z, weight }
    }

    #[test]
    fn test_two_hit_centroid_and_inertia() {
        let points = [point(0.0, 0.0, 0.0, 10.0), point(10.0, 0.0, 0.0, 20.0)];
        let (centroid, total) = weighted_centroid(&points);
        assert_relative_eq!(total, 30.0);
        assert_relative_eq!(centroid.x, 20.0 / 3.0, epsilon = 1e-12);
        let tensor = inertia_tensor(&points, &centroid, total);
        // (10 * (20/3)^2 + 20 * (10/3)^2) / 30
        assert_relative_eq!(tensor.xx, 200.0 / 9.0, epsilon = 1e-9);
        assert_eq!(tensor.yy, 0.0);
        assert_eq!(tensor.zz, 0.0);
    }

    #[test]
    fn test_zero_weight_propagates_nan() {
        let (centroid, total) = weighted_centroid(&[]);
        assert_eq!(total, 0.0);
        assert!(centroid.x.is_nan() && centroid.y.is_nan() && centroid.z.is_nan());
        let tensor = inertia_tensor(&[], &centroid, total);
        assert!(tensor.xx.is_nan());
        assert!(tensor.xy.is_nan() && tensor.yz.is_nan());
    }

    #[test]
    fn test_tensor_is_positive_semidefinite() {
        let points = [
            point(1.0, 2.0, 0.0, 12.0),
            point(-1.5, 0.5, 1.0, 40.0),
            point(0.3, -2.2, 2.0, 7.5),
            point(2.0, 1.1, 3.0, 19.0),
        ];
        let (centroid, total) = weighted_centroid(&points);
        let tensor = inertia_tensor(&points, &centroid, total);
        assert!(tensor.xx >= 0.0 && tensor.yy >= 0.0 && tensor.zz >= 0.0);
        assert!(tensor.xy * tensor.xy <= tensor.xx * tensor.yy + 1e-12);
        assert!(tensor.xz * tensor.xz <= tensor.xx * tensor.zz + 1e-12);
        assert!(tensor.yz * tensor.yz <= tensor.yy * tensor.zz + 1e-12);
    }

    #[test]
    fn test_quantile_sentinel() {
        for n in 0..5 {
            let spectrum: Vec<f64> = (0..n).map(f64::from).collect();
            assert_eq!(spectrum_quantiles(&spectrum), SpectrumQuantiles::default());
        }
    }

    #[test]
    fn test_quantile_ranks() {
        let spectrum: Vec<f64> = (1..=8).map(f64::from).collect();
        let q = spectrum_quantiles(&spectrum);
        assert_eq!((q.q25, q.q50, q.q75), (2.0, 4.0, 6.0));

        let spectrum: Vec<f64> = (1..=5).map(f64::from).collect();
        let q = spectrum_quantiles(&spectrum);
        assert_eq!((q.q25, q.q50, q.q75), (1.0, 2.0, 3.0));
    }

    #[test]
    fn test_missing_layer_position() {
        let hits = vec![RecHit::normal(1, 10.0, 0.0, 0.0), RecHit::normal(5, 10.0, 0.0, 0.0)];
        let classified = classify(&hits, &ClassifierConfig::default());
        let positions: LayerPositions = [(1, 0.0)].into_iter().collect();
        let err = GlobalStats::compute(&classified, &positions).unwrap_err();
        assert!(err.to_string().contains("layer 5"));
    }

    #[test]
    fn test_compute_ignores_other_cell_types() {
        let hits = vec![
            RecHit::normal(1, 10.0, 0.0, 0.0),
            RecHit::new(1, 2, 500.0, 50.0, 50.0),
            RecHit::new(9, 2, 500.0, 50.0, 50.0),
        ];
        let classified = classify(&hits, &ClassifierConfig::default());
        let positions: LayerPositions = [(1, 0.0)].into_iter().collect();
        let stats = GlobalStats::compute(&classified, &positions).unwrap();
        assert_eq!(stats.total_energy, 10.0);
        assert_eq!(stats.spectrum, vec![10.0]);
    }
}
