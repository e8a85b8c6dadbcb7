//! Time functions scaling nodal loads during dynamic analysis

use serde::{Deserialize, Serialize};

/// Time dependence of a load's magnitude
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TimeFunction {
    /// Full load at all times
    #[default]
    Constant,
    /// Linear growth from zero at `start` to full load at `start + duration`
    Ramp { start: f64, duration: f64 },
    /// Full load during `[start, start + duration]`, zero otherwise
    Impulse { start: f64, duration: f64 },
    /// `sin(2π f (t - start))` from `start` onward, zero before
    Sinusoidal {
        start: f64,
        #[serde(default = "default_frequency")]
        frequency: f64,
    },
}

fn default_frequency() -> f64 {
    1.0
}

impl TimeFunction {
    /// Scale factor applied to the base load at time `t`
    pub fn factor(&self, t: f64) -> f64 {
        match *self {
            TimeFunction::Constant => 1.0,
            TimeFunction::Ramp { start, duration } => {
                if duration <= 0.0 {
                    // Degenerates to a step at `start`
                    if t >= start {
                        1.0
                    } else {
                        0.0
                    }
                } else {
                    ((t - start) / duration).clamp(0.0, 1.0)
                }
            }
            TimeFunction::Impulse { start, duration } => {
                if t >= start && t <= start + duration {
                    1.0
                } else {
                    0.0
                }
            }
            TimeFunction::Sinusoidal { start, frequency } => {
                if t >= start {
                    (2.0 * std::f64::consts::PI * frequency * (t - start)).sin()
                } else {
                    0.0
                }
            }
        }
    }

    /// Whether the load varies with time
    pub fn is_constant(&self) -> bool {
        matches!(self, TimeFunction::Constant)
    }
}
