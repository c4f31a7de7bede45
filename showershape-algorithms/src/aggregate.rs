//! Per-event aggregation of layer clusters and global statistics.

use showershape_core::{classify, Event, LayerPositions, OutputRecord, RunData};

use crate::config::{AnalysisConfig, SectionBoundaries};
use crate::gaussian::GaussianFit;
use crate::ring::{ClusterMode, HexGrid, RingSelection};
use crate::sensor::{LayerClusterResult, SensorCluster};
use crate::stats::{GlobalStats, SENTINEL};
use crate::Result;

/// Cluster modes evaluated for every layer, in output order.
pub const RING_MODES: [ClusterMode; 6] = [
    ClusterMode::most_intensive(),
    ClusterMode::linear(RingSelection::Seven),
    ClusterMode::linear(RingSelection::Nineteen),
    ClusterMode::linear(RingSelection::ThirtySeven),
    ClusterMode::linear(RingSelection::SixtyOne),
    ClusterMode::linear(RingSelection::All),
];

/// Everything computed for one populated layer.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerSummary {
    /// Layer index.
    pub layer: u32,
    /// Results for [`RING_MODES`], in the same order.
    pub rings: Vec<LayerClusterResult>,
    /// Gaussian fit of the 19-cell neighbourhood.
    pub gaussian: GaussianFit,
    /// Distance between the two most energetic cells.
    pub max_cell_distance: Option<f64>,
}

impl LayerSummary {
    fn compute(cluster: &SensorCluster, config: &AnalysisConfig) -> Self {
        Self {
            layer: cluster.layer(),
            rings: RING_MODES.iter().map(|&mode| cluster.cluster(mode)).collect(),
            gaussian: cluster.fit_gaussian(&config.gaussian_fit),
            max_cell_distance: cluster.distance_between_most_intense_cells(),
        }
    }

    /// Energy sum for the i-th entry of [`RING_MODES`].
    #[must_use]
    pub fn energy(&self, index: usize) -> f64 {
        self.rings[index].total_weight
    }

    /// Hit count for the i-th entry of [`RING_MODES`].
    #[must_use]
    pub fn hit_count(&self, index: usize) -> usize {
        self.rings[index].hit_count()
    }

    /// Energy sum over every signal hit of the layer.
    #[must_use]
    pub fn total_energy(&self) -> f64 {
        self.energy(RING_MODES.len() - 1)
    }

    /// Ratios E1/E7, E7/E19, E19/E37 and E37/E61.
    ///
    /// A zero denominator gives a non-finite ratio.
    #[must_use]
    pub fn ratios(&self) -> [f64; 4] {
        [
            self.energy(0) / self.energy(1),
            self.energy(1) / self.energy(2),
            self.energy(2) / self.energy(3),
            self.energy(3) / self.energy(4),
        ]
    }

    /// Lateral width of the 19-cell Gaussian fit, `None` if the fit failed.
    #[must_use]
    pub fn width(&self) -> Option<f64> {
        self.gaussian.width()
    }
}

/// Energy integrated over the EE and FH sections.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SectionEnergies {
    /// Layer ranges used for this event.
    pub boundaries: SectionBoundaries,
    /// Energy in the EE section.
    pub ee: f64,
    /// Energy in the FH section.
    pub fh: f64,
}

impl SectionEnergies {
    fn compute(layers: &[LayerSummary], boundaries: SectionBoundaries) -> Self {
        let mut ee = 0.0;
        let mut fh = 0.0;
        for summary in layers {
            if boundaries.is_ee(summary.layer) {
                ee += summary.total_energy();
            } else if boundaries.is_fh(summary.layer) {
                fh += summary.total_energy();
            }
        }
        Self { boundaries, ee, fh }
    }

    /// `(E_EE, E_FH)` as fractions of their sum; non-finite if both are zero.
    #[must_use]
    pub fn fractions(&self) -> (f64, f64) {
        let total = self.ee + self.fh;
        (self.ee / total, self.fh / total)
    }
}

/// Typed result of processing one event.
#[derive(Debug, Clone, PartialEq)]
pub struct EventSummary {
    /// Run metadata, passed through.
    pub run: RunData,
    /// Number of signal hits (all cell types).
    pub n_signal: usize,
    /// Number of marginal hits.
    pub n_marginal: usize,
    /// Number of noise hits.
    pub n_noise: usize,
    /// Global centroid, inertia tensor and spectrum quantiles.
    pub global: GlobalStats,
    /// Populated layers in ascending layer order.
    pub layers: Vec<LayerSummary>,
    /// Per-mode energy sums over all layers, indexed like [`RING_MODES`].
    pub ring_totals: [f64; 6],
    /// EE/FH energy split.
    pub sections: SectionEnergies,
}

impl EventSummary {
    /// Flattens the summary into the named-value record.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn to_record(&self) -> OutputRecord {
        let mut record = OutputRecord::with_capacity(31 + 6 * self.layers.len());

        record.add("eventID", self.run.event as f64);
        record.add("run", f64::from(self.run.run));
        record.add("pdgID", f64::from(self.run.pdg_id));
        record.add("beamEnergy", self.run.energy);
        record.add("configuration", f64::from(self.run.configuration));
        record.add("runType", f64::from(self.run.run_type));

        let centroid = &self.global.centroid;
        record.add("xmean", centroid.x);
        record.add("ymean", centroid.y);
        record.add("zmean", centroid.z);

        record.add("NRechits", self.n_signal as f64);
        record.add("NMIPHits", self.n_marginal as f64);
        record.add("NNoisehits", self.n_noise as f64);
        let quantiles = &self.global.quantiles;
        record.add("25PercentQuantileRechitSpectrum", quantiles.q25);
        record.add("50PercentQuantileRechitSpectrum", quantiles.q50);
        record.add("75PercentQuantileRechitSpectrum", quantiles.q75);

        let inertia = &self.global.inertia;
        record.add("Ixx", inertia.xx);
        record.add("Iyy", inertia.yy);
        record.add("Izz", inertia.zz);
        record.add("Ixy", inertia.xy);
        record.add("Ixz", inertia.xz);
        record.add("Iyz", inertia.yz);

        for summary in &self.layers {
            let ratios = summary.ratios();
            for (pair, ratio) in RING_MODES.windows(2).zip(ratios) {
                record.add(
                    format!(
                        "{}Per{}_layer{}",
                        pair[0].ring.label(),
                        pair[1].ring.label(),
                        summary.layer
                    ),
                    ratio,
                );
            }
        }

        for (mode, total) in RING_MODES.iter().zip(self.ring_totals) {
            record.add(format!("{}_tot", mode.ring.label()), total);
        }

        let (ee_fraction, fh_fraction) = self.sections.fractions();
        record.add("E_EE", self.sections.ee);
        record.add("E_FH", self.sections.fh);
        record.add("E_EEperE_tot", ee_fraction);
        record.add("E_FHperE_tot", fh_fraction);

        for summary in &self.layers {
            record.add(
                format!("width_E19_layer{}", summary.layer),
                summary.width().unwrap_or(SENTINEL),
            );
            record.add(
                format!("d2_maxE_layer{}", summary.layer),
                summary.max_cell_distance.unwrap_or(SENTINEL),
            );
        }

        record
    }
}

/// Computes shower-shape variables event by event.
///
/// Holds only read-only inputs; every call to [`EventAggregator::process`]
/// builds its own layer clusters and accumulators, so one aggregator can
/// serve concurrent events.
#[derive(Debug, Clone)]
pub struct EventAggregator {
    config: AnalysisConfig,
    positions: LayerPositions,
    grid: HexGrid,
}

impl EventAggregator {
    /// Creates an aggregator from a validated configuration and the layer table.
    ///
    /// # Errors
    /// Returns an error if the configuration is inconsistent.
    pub fn new(config: AnalysisConfig, positions: LayerPositions) -> Result<Self> {
        config.validate()?;
        let grid = HexGrid::new(config.geometry.cell_pitch)?;
        Ok(Self {
            config,
            positions,
            grid,
        })
    }

    /// Analysis configuration in use.
    #[must_use]
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Layer z positions in use.
    #[must_use]
    pub fn positions(&self) -> &LayerPositions {
        &self.positions
    }

    /// Processes one event into a typed summary.
    ///
    /// # Errors
    /// Returns an error if a hit is malformed or a position-bearing signal
    /// hit lies in a layer without a z position; the event is then dropped.
    pub fn process(&self, event: &Event) -> Result<EventSummary> {
        for hit in &event.hits {
            hit.validate()?;
        }

        let classified = classify(&event.hits, &self.config.classifier);
        let global = GlobalStats::compute(&classified, &self.positions)?;

        let clusters = classified
            .signal_by_layer()
            .into_iter()
            .map(|(layer, hits)| {
                // Every populated layer needs a position, whatever its cell types.
                self.positions.z(layer)?;
                SensorCluster::new(layer, hits, self.grid)
            })
            .collect::<Result<Vec<_>>>()?;
        let layers: Vec<LayerSummary> = clusters
            .iter()
            .map(|cluster| LayerSummary::compute(cluster, &self.config))
            .collect();

        let mut ring_totals = [0.0; 6];
        for summary in &layers {
            for (total, ring) in ring_totals.iter_mut().zip(&summary.rings) {
                *total += ring.total_weight;
            }
        }

        let boundaries = self.config.sections.resolve(event.run.configuration);
        let sections = SectionEnergies::compute(&layers, boundaries);

        log::debug!(
            "event {} (run {}): {} signal / {} marginal / {} noise hits in {} layers",
            event.run.event,
            event.run.run,
            classified.signal.len(),
            classified.marginal.len(),
            classified.noise.len(),
            layers.len()
        );

        Ok(EventSummary {
            run: event.run,
            n_signal: classified.signal.len(),
            n_marginal: classified.marginal.len(),
            n_noise: classified.noise.len(),
            global,
            layers,
            ring_totals,
            sections,
        })
    }

    /// Processes one event straight into its output record.
    ///
    /// # Errors
    /// See [`EventAggregator::process`].
    pub fn process_record(&self, event: &Event) -> Result<OutputRecord> {
        self.process(event).map(|summary| summary.to_record())
    }
}
