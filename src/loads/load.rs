//! Nodal loads - forces and moments applied directly to points

use serde::{Deserialize, Serialize};

use super::TimeFunction;
use crate::elements::PointId;

/// Classification of a load
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadKind {
    /// Ordinary applied force/moment
    #[default]
    Nodal,
    /// Self-weight or other pure gravity loading
    Gravity,
}

/// A load applied directly to a point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Load {
    /// Loaded point
    pub point: PointId,
    /// Force in X direction (N)
    #[serde(default)]
    pub fx: f64,
    /// Force in Y direction (N)
    #[serde(default)]
    pub fy: f64,
    /// Force in Z direction (N)
    #[serde(default)]
    pub fz: f64,
    /// Moment about X axis (N·m)
    #[serde(default)]
    pub mx: f64,
    /// Moment about Y axis (N·m)
    #[serde(default)]
    pub my: f64,
    /// Moment about Z axis (N·m)
    #[serde(default)]
    pub mz: f64,
    /// Nominal magnitude as entered
    #[serde(default)]
    pub amount: f64,
    /// Time dependence
    #[serde(default)]
    pub time_function: TimeFunction,
    /// Load classification
    #[serde(default)]
    pub kind: LoadKind,
}

impl Load {
    /// Create a new constant load with all components
    pub fn new(point: PointId, fx: f64, fy: f64, fz: f64, mx: f64, my: f64, mz: f64) -> Self {
        Self {
            point,
            fx,
            fy,
            fz,
            mx,
            my,
            mz,
            amount: (fx * fx + fy * fy + fz * fz).sqrt(),
            time_function: TimeFunction::Constant,
            kind: LoadKind::Nodal,
        }
    }

    /// Create a force-only load
    pub fn force(point: PointId, fx: f64, fy: f64, fz: f64) -> Self {
        Self::new(point, fx, fy, fz, 0.0, 0.0, 0.0)
    }

    /// Create a moment-only load
    pub fn moment(point: PointId, mx: f64, my: f64, mz: f64) -> Self {
        let mut load = Self::new(point, 0.0, 0.0, 0.0, mx, my, mz);
        load.amount = (mx * mx + my * my + mz * mz).sqrt();
        load
    }

    /// Create a vertical weight load of `mass` kg under acceleration `g`
    pub fn gravity(point: PointId, mass: f64, g: f64) -> Self {
        Self::force(point, 0.0, -mass * g, 0.0).with_kind(LoadKind::Gravity)
    }

    /// Set the time function
    pub fn with_time_function(mut self, time_function: TimeFunction) -> Self {
        self.time_function = time_function;
        self
    }

    /// Set the load classification
    pub fn with_kind(mut self, kind: LoadKind) -> Self {
        self.kind = kind;
        self
    }

    /// Get the base load as an array [FX, FY, FZ, MX, MY, MZ]
    pub fn as_array(&self) -> [f64; 6] {
        [self.fx, self.fy, self.fz, self.mx, self.my, self.mz]
    }

    /// Load components at time `t`
    pub fn at_time(&self, t: f64) -> [f64; 6] {
        let factor = self.time_function.factor(t);
        self.as_array().map(|c| c * factor)
    }

    /// Difference between the load at time `t` and its base value
    pub fn delta_at_time(&self, t: f64) -> [f64; 6] {
        let base = self.as_array();
        let current = self.at_time(t);
        std::array::from_fn(|i| current[i] - base[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_constant_load_has_no_delta() {
        let load = Load::force(1, 10.0, -20.0, 0.0);
        assert_eq!(load.at_time(3.0), load.as_array());
        assert_eq!(load.delta_at_time(3.0), [0.0; 6]);
    }

    #[test]
    fn test_ramp_delta() {
        let load = Load::force(1, 0.0, -100.0, 0.0).with_time_function(TimeFunction::Ramp {
            start: 0.0,
            duration: 1.0,
        });
        assert_relative_eq!(load.at_time(0.25)[1], -25.0, epsilon = 1e-12);
        // Correction added on top of the base load already in the static vector
        assert_relative_eq!(load.delta_at_time(0.25)[1], 75.0, epsilon = 1e-12);
        assert_relative_eq!(load.delta_at_time(0.0)[1], 100.0, epsilon = 1e-12);
    }

    #[test]
    fn test_gravity_load() {
        let load = Load::gravity(2, 10.0, 9.81);
        assert_eq!(load.kind, LoadKind::Gravity);
        assert_relative_eq!(load.fy, -98.1, epsilon = 1e-12);
        assert_relative_eq!(load.amount, 98.1, epsilon = 1e-12);
    }

    #[test]
    fn test_defaults_from_json() {
        let load: Load = serde_json::from_str(r#"{"point": 5, "fy": -100.0}"#).unwrap();
        assert_eq!(load.point, 5);
        assert_eq!(load.fx, 0.0);
        assert_eq!(load.time_function, TimeFunction::Constant);
        assert_eq!(load.kind, LoadKind::Nodal);
    }
}
