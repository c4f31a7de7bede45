//! Per-layer ring clustering around the most energetic cell.

use showershape_core::{CellPosition, RecHit};

use crate::gaussian::{fit_2d_gaussian, GaussianFit, GaussianFitConfig, GaussianSample};
use crate::ring::{ClusterMode, HexGrid, RingSelection, Weighting};
use crate::Result;

/// Weighted sum and centroid of one selection in one layer.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerClusterResult {
    /// Selection and weighting that produced this result.
    pub mode: ClusterMode,
    /// Sum of the weights of the selected hits.
    pub total_weight: f64,
    /// Weighted centroid of the selected hits.
    pub centroid: CellPosition,
    /// Positions of the selected hits.
    pub positions: Vec<CellPosition>,
}

impl LayerClusterResult {
    /// Number of selected hits.
    #[must_use]
    pub fn hit_count(&self) -> usize {
        self.positions.len()
    }
}

/// Signal hits of one sensor layer, anchored on their seed cell.
///
/// Built fresh for every event; it owns its hits and carries no state
/// between calls to [`SensorCluster::cluster`].
#[derive(Debug, Clone)]
pub struct SensorCluster {
    layer: u32,
    grid: HexGrid,
    hits: Vec<RecHit>,
    seed: usize,
    ring_distances: Vec<u32>,
}

impl SensorCluster {
    /// Builds the cluster for `layer` from its signal hits.
    ///
    /// The seed is the most energetic hit; ties keep the earliest hit.
    ///
    /// # Errors
    /// Returns [`showershape_core::Error::EmptyLayer`] if `hits` is empty.
    pub fn new(layer: u32, hits: Vec<RecHit>, grid: HexGrid) -> Result<Self> {
        let seed = hits
            .iter()
            .enumerate()
            .fold(None, |best: Option<(usize, f64)>, (idx, hit)| match best {
                Some((_, energy)) if energy >= hit.energy => best,
                _ => Some((idx, hit.energy)),
            })
            .map(|(idx, _)| idx)
            .ok_or(showershape_core::Error::EmptyLayer { layer })?;

        let origin = hits[seed].position();
        let ring_distances = hits
            .iter()
            .map(|hit| grid.ring_distance(&origin, &hit.position()))
            .collect();

        Ok(Self {
            layer,
            grid,
            hits,
            seed,
            ring_distances,
        })
    }

    /// Layer index.
    #[must_use]
    pub fn layer(&self) -> u32 {
        self.layer
    }

    /// The most energetic hit.
    #[must_use]
    pub fn seed(&self) -> &RecHit {
        &self.hits[self.seed]
    }

    /// Hits selected by `mode`, in input order.
    pub fn select(&self, mode: ClusterMode) -> impl Iterator<Item = &RecHit> + '_ {
        self.hits
            .iter()
            .zip(&self.ring_distances)
            .enumerate()
            .filter(move |&(idx, (_, &distance))| match mode.weighting {
                Weighting::MostIntensive => idx == self.seed,
                Weighting::Linear => mode.ring.contains(distance),
            })
            .map(|(_, (hit, _))| hit)
    }

    /// Computes the weighted energy sum and centroid for `mode`.
    #[must_use]
    pub fn cluster(&self, mode: ClusterMode) -> LayerClusterResult {
        let mut total_weight = 0.0;
        let mut sum_x = 0.0;
        let mut sum_y = 0.0;
        let mut positions = Vec::new();

        for hit in self.select(mode) {
            let weight = hit.energy;
            total_weight += weight;
            sum_x += weight * hit.x;
            sum_y += weight * hit.y;
            positions.push(hit.position());
        }

        LayerClusterResult {
            mode,
            total_weight,
            centroid: CellPosition::new(sum_x / total_weight, sum_y / total_weight),
            positions,
        }
    }

    /// Distance between the seed and the second most energetic hit.
    ///
    /// Returns `None` when the layer has a single signal hit.
    #[must_use]
    pub fn distance_between_most_intense_cells(&self) -> Option<f64> {
        let seed = self.seed();
        self.hits
            .iter()
            .enumerate()
            .filter(|&(idx, _)| idx != self.seed)
            .map(|(_, hit)| hit)
            .fold(None, |best: Option<&RecHit>, hit| match best {
                Some(current) if current.energy >= hit.energy => best,
                _ => Some(hit),
            })
            .map(|second| seed.position().distance(&second.position()))
    }

    /// Fits a 2D Gaussian to the energies of the 19-cell neighbourhood.
    #[must_use]
    pub fn fit_gaussian(&self, config: &GaussianFitConfig) -> GaussianFit {
        let samples: Vec<GaussianSample> = self
            .select(ClusterMode::linear(RingSelection::Nineteen))
            .map(|hit| GaussianSample::new(hit.x, hit.y, hit.energy))
            .collect();
        let fit = fit_2d_gaussian(&samples, 0.5 * self.grid.pitch(), config);
        if !fit.status.is_converged() {
            log::debug!(
                "layer {}: Gaussian fit on {} cells failed ({:?})",
                self.layer,
                samples.len(),
                fit.status
            );
        }
        fit
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    use super::*;
    use approx::assert_relative_eq;

    fn grid() -> HexGrid {
        HexGrid::new(1.0).unwrap()
    }

    /// Seed at the origin, one hit on each of rings 1..=5, plus a far hit.
    fn layer_hits(grid: &HexGrid) -> Vec<RecHit> {
        let mut hits = vec![RecHit::normal(3, 100.0, 0.0, 0.0)];
        for ring in 1..=5_i64 {
            let c = grid.cell_center(ring, 0);
            #[allow(clippy::cast_precision_loss)]
            hits.push(RecHit::normal(3, 50.0 / ring as f64, c.x, c.y));
        }
        let far = grid.cell_center(-9, 0);
        hits.push(RecHit::normal(3, 6.0, far.x, far.y));
        hits
    }

    #[test]
    fn test_empty_layer_is_error() {
        assert!(SensorCluster::new(4, Vec::new(), grid()).is_err());
    }

    #[test]
    fn test_seed_is_most_energetic() {
        let mut hits = layer_hits(&grid());
        hits.rotate_left(2);
        let cluster = SensorCluster::new(3, hits, grid()).unwrap();
        assert_eq!(cluster.seed().energy, 100.0);
        assert_eq!(cluster.layer(), 3);
    }

    #[test]
    fn test_ring_sums() {
        let cluster = SensorCluster::new(3, layer_hits(&grid()), grid()).unwrap();

        let e1 = cluster.cluster(ClusterMode::most_intensive());
        assert_eq!(e1.total_weight, 100.0);
        assert_eq!(e1.hit_count(), 1);
        assert_eq!(e1.centroid, CellPosition::new(0.0, 0.0));

        let expected = [(RingSelection::Seven, 150.0, 2), (RingSelection::Nineteen, 175.0, 3)];
        for (ring, energy, count) in expected {
            let result = cluster.cluster(ClusterMode::linear(ring));
            assert_relative_eq!(result.total_weight, energy);
            assert_eq!(result.hit_count(), count);
        }

        let all = cluster.cluster(ClusterMode::linear(RingSelection::All));
        assert_eq!(all.hit_count(), 7);
        assert_relative_eq!(
            all.total_weight,
            100.0 + 50.0 + 25.0 + 50.0 / 3.0 + 12.5 + 10.0 + 6.0
        );
    }

    #[test]
    fn test_most_intensive_ignores_ring() {
        let cluster = SensorCluster::new(3, layer_hits(&grid()), grid()).unwrap();
        let whole_layer =
            cluster.cluster(ClusterMode::new(RingSelection::All, Weighting::MostIntensive));
        let seed_only = cluster.cluster(ClusterMode::most_intensive());
        assert_eq!(whole_layer.total_weight, seed_only.total_weight);
        assert_eq!(whole_layer.positions, seed_only.positions);
    }

    #[test]
    fn test_weighted_centroid() {
        let hits = vec![
            RecHit::normal(1, 30.0, 0.0, 0.0),
            RecHit::normal(1, 10.0, 1.0, 0.0),
        ];
        let cluster = SensorCluster::new(1, hits, grid()).unwrap();
        let result = cluster.cluster(ClusterMode::linear(RingSelection::Seven));
        assert_relative_eq!(result.centroid.x, 0.25);
        assert_relative_eq!(result.centroid.y, 0.0);
    }

    #[test]
    fn test_distance_between_most_intense_cells() {
        let cluster = SensorCluster::new(3, layer_hits(&grid()), grid()).unwrap();
        assert_relative_eq!(cluster.distance_between_most_intense_cells().unwrap(), 1.0);

        let single = SensorCluster::new(1, vec![RecHit::normal(1, 9.0, 0.0, 0.0)], grid()).unwrap();
        assert_eq!(single.distance_between_most_intense_cells(), None);
    }

    #[test]
    fn test_gaussian_fit_on_sparse_layer_fails() {
        let hits = vec![
            RecHit::normal(1, 30.0, 0.0, 0.0),
            RecHit::normal(1, 10.0, 1.0, 0.0),
        ];
        let cluster = SensorCluster::new(1, hits, grid()).unwrap();
        let fit = cluster.fit_gaussian(&GaussianFitConfig::default());
        assert!(fit.width().is_none());
    }
}
