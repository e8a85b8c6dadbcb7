//! Rayleigh damping calibration

use log::warn;
use nalgebra::{Matrix2, Vector2};
use serde::{Deserialize, Serialize};

use crate::math::Mat;

/// Lower reference frequency in Hz
pub const REFERENCE_FREQUENCY_LOW: f64 = 1.0;
/// Upper reference frequency in Hz
pub const REFERENCE_FREQUENCY_HIGH: f64 = 10.0;
/// Coefficient used for both α and β when calibration fails
pub const FALLBACK_COEFFICIENT: f64 = 0.02;

/// Rayleigh damping `C = α·M + β·K`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RayleighDamping {
    /// Mass-proportional coefficient
    pub alpha: f64,
    /// Stiffness-proportional coefficient
    pub beta: f64,
}

impl RayleighDamping {
    /// Calibrate α and β so that the modal damping ratio equals `ratio` at
    /// both reference frequencies.
    pub fn from_damping_ratio(ratio: f64) -> Self {
        Self::calibrate(ratio, REFERENCE_FREQUENCY_LOW, REFERENCE_FREQUENCY_HIGH)
    }

    /// Calibrate from ζ = α/(2ω) + βω/2 at frequencies `f1` and `f2` (Hz)
    pub fn calibrate(ratio: f64, f1: f64, f2: f64) -> Self {
        let w1 = 2.0 * std::f64::consts::PI * f1;
        let w2 = 2.0 * std::f64::consts::PI * f2;

        #[rustfmt::skip]
        let a = Matrix2::new(
            1.0 / (2.0 * w1), w1 / 2.0,
            1.0 / (2.0 * w2), w2 / 2.0,
        );
        let b = Vector2::new(ratio, ratio);

        match a.lu().solve(&b).filter(|c| c.iter().all(|v| v.is_finite())) {
            Some(c) => Self {
                alpha: c[0],
                beta: c[1],
            },
            None => {
                warn!("Rayleigh calibration failed for f1={f1} Hz, f2={f2} Hz; using fallback coefficients");
                Self {
                    alpha: FALLBACK_COEFFICIENT,
                    beta: FALLBACK_COEFFICIENT,
                }
            }
        }
    }

    /// Modal damping ratio at angular frequency `omega`
    pub fn ratio_at(&self, omega: f64) -> f64 {
        self.alpha / (2.0 * omega) + self.beta * omega / 2.0
    }

    /// Damping matrix for the given mass and stiffness
    pub fn matrix(&self, m: &Mat, k: &Mat) -> Mat {
        m * self.alpha + k * self.beta
    }
}
