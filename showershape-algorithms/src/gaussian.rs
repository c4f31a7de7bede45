//! Least-squares fit of a 2D Gaussian to a lateral energy profile.
//!
//! Model: `A * exp(-(x - x0)^2 / (2 sx^2) - (y - y0)^2 / (2 sy^2))`, one
//! residual block per sample over a single 5-parameter block, minimised with
//! the `tiny_solver` Levenberg-Marquardt optimizer.

use std::collections::HashMap;

use nalgebra::{SMatrix, SVector};
use serde::{Deserialize, Serialize};
use tiny_solver::factors::na as ts_na;
use tiny_solver::Optimizer;

type Params = SVector<f64, 5>;
type Normal = SMatrix<f64, 5, 5>;

/// One free parameter per sample at least.
const MIN_SAMPLES: usize = 5;
const PARAMS_KEY: &str = "gaussian";

/// Outcome of a Gaussian fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FitStatus {
    /// The fit reached a minimum with well-defined parameters.
    Converged,
    /// Fewer samples than free parameters.
    InsufficientSamples,
    /// The normal equations are singular at the solution.
    Singular,
    /// The optimizer returned no solution.
    NotConverged,
    /// The fit ended on a non-physical point (non-positive amplitude, zero width).
    Invalid,
}

impl FitStatus {
    /// Numeric status code; zero means success.
    #[must_use]
    pub fn code(self) -> i32 {
        match self {
            FitStatus::Converged => 0,
            FitStatus::InsufficientSamples => 1,
            FitStatus::Singular => 2,
            FitStatus::NotConverged => 3,
            FitStatus::Invalid => 4,
        }
    }

    /// Returns true for [`FitStatus::Converged`].
    #[must_use]
    pub fn is_converged(self) -> bool {
        self == FitStatus::Converged
    }
}

/// A position with the energy deposited there.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussianSample {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
    /// Energy at `(x, y)`.
    pub value: f64,
}

impl GaussianSample {
    /// Creates a sample.
    #[must_use]
    pub fn new(x: f64, y: f64, value: f64) -> Self {
        Self { x, y, value }
    }
}

/// Iteration controls for the Gaussian fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GaussianFitConfig {
    /// Maximum number of Levenberg-Marquardt iterations.
    pub max_iterations: usize,
    /// Relative error decrease below which the optimizer stops.
    pub tolerance: f64,
}

impl Default for GaussianFitConfig {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            tolerance: 1e-9,
        }
    }
}

/// Result of [`fit_2d_gaussian`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussianFit {
    /// Fit outcome; the parameters are NaN unless converged.
    pub status: FitStatus,
    /// Peak height.
    pub amplitude: f64,
    /// Centre along x.
    pub x0: f64,
    /// Width along x.
    pub sigma_x: f64,
    /// Centre along y.
    pub y0: f64,
    /// Width along y.
    pub sigma_y: f64,
    /// Sum of squared residuals at the solution.
    pub chi2: f64,
}

impl GaussianFit {
    fn failed(status: FitStatus) -> Self {
        Self {
            status,
            amplitude: f64::NAN,
            x0: f64::NAN,
            sigma_x: f64::NAN,
            y0: f64::NAN,
            sigma_y: f64::NAN,
            chi2: f64::NAN,
        }
    }

    /// Flat parameter vector `[status, amplitude, x0, sigma_x, y0, sigma_y]`.
    ///
    /// A non-zero first entry signals a failed fit.
    #[must_use]
    pub fn parameters(&self) -> [f64; 6] {
        [
            f64::from(self.status.code()),
            self.amplitude,
            self.x0,
            self.sigma_x,
            self.y0,
            self.sigma_y,
        ]
    }

    /// Combined lateral width `sqrt(sigma_x^2 + sigma_y^2)` of a converged fit.
    #[must_use]
    pub fn width(&self) -> Option<f64> {
        self.status
            .is_converged()
            .then(|| self.sigma_x.hypot(self.sigma_y))
    }
}

/// Residual `model - value` of one sample.
#[derive(Debug, Clone)]
struct GaussianFactor {
    x: f64,
    y: f64,
    value: f64,
}

impl<T: ts_na::RealField> tiny_solver::factors::Factor<T> for GaussianFactor {
    fn residual_func(&self, params: &[ts_na::DVector<T>]) -> ts_na::DVector<T> {
        let p = &params[0];
        let x: T = ts_na::convert(self.x);
        let y: T = ts_na::convert(self.y);
        let value: T = ts_na::convert(self.value);
        let half: T = ts_na::convert(0.5);
        let u = (x - p[1].clone()) / p[2].clone();
        let v = (y - p[3].clone()) / p[4].clone();
        let model = p[0].clone() * (-(half * (u.clone() * u + v.clone() * v))).exp();
        ts_na::DVector::<T>::from_vec(vec![model - value])
    }
}

/// Model value and its gradient with respect to `[A, x0, sx, y0, sy]`.
fn evaluate(params: &Params, sample: &GaussianSample) -> (f64, Params) {
    let (amplitude, x0, sx, y0, sy) = (params[0], params[1], params[2], params[3], params[4]);
    let u = (sample.x - x0) / sx;
    let v = (sample.y - y0) / sy;
    let shape = (-0.5 * (u * u + v * v)).exp();
    let f = amplitude * shape;
    let gradient = Params::new(shape, f * u / sx, f * u * u / sx, f * v / sy, f * v * v / sy);
    (f, gradient)
}

/// `J^T J` and the residual sum of squares at `params`.
fn normal_matrix(params: &Params, samples: &[GaussianSample]) -> (Normal, f64) {
    let mut jtj = Normal::zeros();
    let mut chi2 = 0.0;
    for sample in samples {
        let (f, gradient) = evaluate(params, sample);
        let residual = sample.value - f;
        jtj += gradient * gradient.transpose();
        chi2 += residual * residual;
    }
    (jtj, chi2)
}

/// Starting point from the weighted moments of the samples.
fn initial_guess(samples: &[GaussianSample], fallback_sigma: f64) -> Params {
    let amplitude = samples
        .iter()
        .map(|s| s.value)
        .fold(f64::NEG_INFINITY, f64::max);
    let total: f64 = samples.iter().map(|s| s.value).sum();
    let x0 = samples.iter().map(|s| s.value * s.x).sum::<f64>() / total;
    let y0 = samples.iter().map(|s| s.value * s.y).sum::<f64>() / total;
    let var_x = samples
        .iter()
        .map(|s| s.value * (s.x - x0).powi(2))
        .sum::<f64>()
        / total;
    let var_y = samples
        .iter()
        .map(|s| s.value * (s.y - y0).powi(2))
        .sum::<f64>()
        / total;
    let sigma = |var: f64| {
        if var.is_finite() && var > 0.0 {
            var.sqrt()
        } else {
            fallback_sigma
        }
    };
    Params::new(amplitude, x0, sigma(var_x), y0, sigma(var_y))
}

/// Fits a 2D Gaussian surface to energy samples.
///
/// `fallback_sigma` seeds a width when the samples have no spread along an
/// axis. Failure never panics; it is reported through [`GaussianFit::status`].
#[must_use]
pub fn fit_2d_gaussian(
    samples: &[GaussianSample],
    fallback_sigma: f64,
    config: &GaussianFitConfig,
) -> GaussianFit {
    if samples.len() < MIN_SAMPLES {
        return GaussianFit::failed(FitStatus::InsufficientSamples);
    }
    let initial = initial_guess(samples, fallback_sigma);
    if !initial.iter().all(|p| p.is_finite()) {
        return GaussianFit::failed(FitStatus::Invalid);
    }
    fit_from(samples, &initial, config)
}

fn fit_from(
    samples: &[GaussianSample],
    initial: &Params,
    config: &GaussianFitConfig,
) -> GaussianFit {
    let mut problem = tiny_solver::Problem::new();
    for sample in samples {
        problem.add_residual_block(
            1,
            &[PARAMS_KEY],
            Box::new(GaussianFactor {
                x: sample.x,
                y: sample.y,
                value: sample.value,
            }),
            None,
        );
    }

    let mut initial_values = HashMap::<String, ts_na::DVector<f64>>::new();
    initial_values.insert(
        PARAMS_KEY.to_string(),
        ts_na::DVector::<f64>::from_column_slice(initial.as_slice()),
    );

    let optimizer = tiny_solver::LevenbergMarquardtOptimizer::default();
    let options = tiny_solver::OptimizerOptions {
        max_iteration: config.max_iterations,
        verbosity_level: 0,
        min_abs_error_decrease_threshold: 0.0,
        min_rel_error_decrease_threshold: config.tolerance,
        ..Default::default()
    };
    let solution = optimizer
        .optimize(&problem, &initial_values, Some(options))
        .and_then(|result| result.get(PARAMS_KEY).cloned())
        .filter(|p| p.len() == 5)
        .map(|p| Params::from_iterator(p.iter().copied()));
    let Some(params) = solution else {
        return GaussianFit::failed(FitStatus::NotConverged);
    };

    let (amplitude, x0, y0) = (params[0], params[1], params[3]);
    let (sigma_x, sigma_y) = (params[2].abs(), params[4].abs());
    let physical = params.iter().all(|p| p.is_finite())
        && amplitude > 0.0
        && sigma_x > 0.0
        && sigma_y > 0.0;
    if !physical {
        return GaussianFit::failed(FitStatus::Invalid);
    }

    let (jtj, chi2) = normal_matrix(&params, samples);
    if jtj.cholesky().is_none() {
        return GaussianFit::failed(FitStatus::Singular);
    }

    GaussianFit {
        status: FitStatus::Converged,
        amplitude,
        x0,
        sigma_x,
        y0,
        sigma_y,
        chi2,
    }
}
