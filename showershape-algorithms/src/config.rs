//! Analysis configuration.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};
use showershape_core::ClassifierConfig;

use crate::gaussian::GaussianFitConfig;
use crate::{Error, Result};

/// Last layers of the electromagnetic (EE) and hadronic (FH) sections.
///
/// EE spans layers `1..=last_layer_ee`, FH spans
/// `last_layer_ee + 1..=last_layer_fh`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionBoundaries {
    /// Last layer of the electromagnetic section.
    pub last_layer_ee: u32,
    /// Last layer of the hadronic section.
    pub last_layer_fh: u32,
}

impl SectionBoundaries {
    /// Creates boundaries from the two last-layer indices.
    #[must_use]
    pub const fn new(last_layer_ee: u32, last_layer_fh: u32) -> Self {
        Self {
            last_layer_ee,
            last_layer_fh,
        }
    }

    /// Returns true if `layer` belongs to the EE section.
    #[must_use]
    pub fn is_ee(&self, layer: u32) -> bool {
        (1..=self.last_layer_ee).contains(&layer)
    }

    /// Returns true if `layer` belongs to the FH section.
    #[must_use]
    pub fn is_fh(&self, layer: u32) -> bool {
        layer > self.last_layer_ee && layer <= self.last_layer_fh
    }
}

/// Section boundaries used by one detector configuration code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigurationSections {
    /// Run configuration code this entry applies to.
    pub configuration: i32,
    /// Last layer of the electromagnetic section.
    pub last_layer_ee: u32,
    /// Last layer of the hadronic section.
    pub last_layer_fh: u32,
}

impl ConfigurationSections {
    /// Boundaries of this entry.
    #[must_use]
    pub fn boundaries(&self) -> SectionBoundaries {
        SectionBoundaries::new(self.last_layer_ee, self.last_layer_fh)
    }
}

/// EE/FH split per run configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionConfig {
    /// Used for configuration codes without an explicit entry.
    pub default: SectionBoundaries,
    /// Known configuration codes.
    pub by_configuration: Vec<ConfigurationSections>,
}

impl Default for SectionConfig {
    fn default() -> Self {
        Self {
            default: SectionBoundaries::new(2, 6),
            by_configuration: vec![ConfigurationSections {
                configuration: 2,
                last_layer_ee: 7,
                last_layer_fh: 17,
            }],
        }
    }
}

impl SectionConfig {
    /// Boundaries registered for `configuration`, if any.
    #[must_use]
    pub fn lookup(&self, configuration: i32) -> Option<SectionBoundaries> {
        self.by_configuration
            .iter()
            .find(|entry| entry.configuration == configuration)
            .map(ConfigurationSections::boundaries)
    }

    /// Boundaries for `configuration`, falling back to the default.
    ///
    /// Unknown codes are logged since they may indicate a new setup.
    #[must_use]
    pub fn resolve(&self, configuration: i32) -> SectionBoundaries {
        self.lookup(configuration).unwrap_or_else(|| {
            log::warn!(
                "unknown run configuration {configuration}, using default EE/FH split {}/{}",
                self.default.last_layer_ee,
                self.default.last_layer_fh
            );
            self.default
        })
    }

    fn validate(&self) -> Result<()> {
        let entries = std::iter::once(self.default)
            .chain(self.by_configuration.iter().map(ConfigurationSections::boundaries));
        for boundaries in entries {
            if boundaries.last_layer_ee > boundaries.last_layer_fh {
                return Err(Error::Config(format!(
                    "last EE layer {} lies beyond last FH layer {}",
                    boundaries.last_layer_ee, boundaries.last_layer_fh
                )));
            }
        }
        Ok(())
    }
}

/// Sensor cell lattice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometryConfig {
    /// Centre-to-centre distance of neighbouring cells, in hit position units.
    pub cell_pitch: f64,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        // 6-inch, 133-cell sensor: cell side 0.6493 cm.
        Self { cell_pitch: 1.1246 }
    }
}

/// Complete configuration of the variable computation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Energy thresholds and position-bearing cell type.
    pub classifier: ClassifierConfig,
    /// Cell lattice.
    pub geometry: GeometryConfig,
    /// EE/FH split per run configuration.
    pub sections: SectionConfig,
    /// Lateral-width fit controls.
    pub gaussian_fit: GaussianFitConfig,
}

impl AnalysisConfig {
    /// Creates the default configuration (CERN June 2018 setup).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the classifier thresholds.
    #[must_use]
    pub fn with_classifier(mut self, classifier: ClassifierConfig) -> Self {
        self.classifier = classifier;
        self
    }

    /// Sets the cell pitch.
    #[must_use]
    pub fn with_cell_pitch(mut self, pitch: f64) -> Self {
        self.geometry.cell_pitch = pitch;
        self
    }

    /// Sets the section split table.
    #[must_use]
    pub fn with_sections(mut self, sections: SectionConfig) -> Self {
        self.sections = sections;
        self
    }

    /// Loads and validates a configuration from a JSON file.
    ///
    /// Missing fields take their default values.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or fails validation.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let config: Self = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a configuration from a JSON string.
    ///
    /// # Errors
    /// Returns an error if the string cannot be parsed or fails validation.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks thresholds, pitch and section boundaries.
    ///
    /// # Errors
    /// Returns the first inconsistency found.
    pub fn validate(&self) -> Result<()> {
        self.classifier.validate()?;
        if !(self.geometry.cell_pitch.is_finite() && self.geometry.cell_pitch > 0.0) {
            return Err(Error::Config(format!(
                "cell pitch must be finite and positive, got {}",
                self.geometry.cell_pitch
            )));
        }
        if !(self.gaussian_fit.tolerance.is_finite() && self.gaussian_fit.tolerance >= 0.0) {
            return Err(Error::Config(format!(
                "fit tolerance must be finite and non-negative, got {}",
                self.gaussian_fit.tolerance
            )));
        }
        if self.gaussian_fit.max_iterations == 0 {
            return Err(Error::Config("fit needs at least one iteration".to_string()));
        }
        self.sections.validate()
    }
}
