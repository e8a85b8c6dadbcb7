//! Analysis types and options

pub mod assembly;
pub mod damping;
pub mod dynamic;
pub mod failure;
pub mod kinematics;
pub mod statics;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::elements::PointId;
use crate::error::{SolverError, SolverResult};
use crate::units::UnitSystem;

pub use dynamic::solve;
pub use kinematics::simulate_dynamics;
pub use statics::solve_with_diagnostics;

/// Standard gravitational acceleration in m/s²
pub const STANDARD_GRAVITY: f64 = 9.81;

/// Type of structural analysis to perform
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisType {
    /// One-shot linear static solve with diagnostics
    Static,
    /// Time-stepped response with damping and progressive failure
    #[default]
    Dynamic,
    /// Point trajectories only, with an analytic free-fall shortcut
    Kinematic,
}

/// Numerical safety limits applied during time integration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NumericalLimits {
    /// Velocity components are clipped to ± this value
    pub max_velocity: f64,
    /// Displacement components are clipped to ± this value
    pub max_displacement: f64,
    /// Unclipped displacement beyond which the run stops early
    pub runaway_displacement: f64,
    /// Stresses below this are not checked for failure
    pub stress_threshold: f64,
    /// Diagonal stiffness placed on constrained DOFs
    pub penalty_stiffness: f64,
    /// Shortest member for which forces are reported
    pub min_force_length: f64,
    /// Longest member for which forces are reported
    pub max_force_length: f64,
}

impl Default for NumericalLimits {
    fn default() -> Self {
        Self {
            max_velocity: 1e4,
            max_displacement: 1e3,
            runaway_displacement: 1e6,
            stress_threshold: 1e-12,
            penalty_stiffness: 1e12,
            min_force_length: 1e-6,
            max_force_length: 1e3,
        }
    }
}

/// Options for dynamic analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DynamicOptions {
    /// Time step in s
    pub step: f64,
    /// Total simulated time in s
    pub simulation_time: f64,
    /// Target modal damping ratio for Rayleigh calibration
    pub damping_ratio: f64,
    /// Gravitational acceleration in m/s² (None = standard gravity)
    pub gravity: Option<f64>,
    /// Initial displacement per point [DX, DY, DZ, RX, RY, RZ]
    pub initial_displacements: BTreeMap<PointId, [f64; 6]>,
    /// Unit system echoed back in the results
    pub unit_system: UnitSystem,
    /// Numerical safety limits
    pub limits: NumericalLimits,
}

impl Default for DynamicOptions {
    fn default() -> Self {
        Self {
            step: 0.01,
            simulation_time: 10.0,
            damping_ratio: 0.02,
            gravity: None,
            initial_displacements: BTreeMap::new(),
            unit_system: UnitSystem::Metric,
            limits: NumericalLimits::default(),
        }
    }
}

impl DynamicOptions {
    /// Create options for a run of `simulation_time` seconds at `step`
    pub fn new(step: f64, simulation_time: f64) -> Self {
        Self {
            step,
            simulation_time,
            ..Self::default()
        }
    }

    /// Set the damping ratio
    pub fn with_damping_ratio(mut self, ratio: f64) -> Self {
        self.damping_ratio = ratio;
        self
    }

    /// Set the gravitational acceleration (0 disables gravity)
    pub fn with_gravity(mut self, g: f64) -> Self {
        self.gravity = Some(g);
        self
    }

    /// Set the initial displacement of a point
    pub fn with_initial_displacement(mut self, point: PointId, displacement: [f64; 6]) -> Self {
        self.initial_displacements.insert(point, displacement);
        self
    }

    /// Set the unit system tag
    pub fn with_unit_system(mut self, unit_system: UnitSystem) -> Self {
        self.unit_system = unit_system;
        self
    }

    /// Set the numerical limits
    pub fn with_limits(mut self, limits: NumericalLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Effective gravitational acceleration
    pub fn gravity(&self) -> f64 {
        self.gravity.unwrap_or(STANDARD_GRAVITY)
    }

    /// Number of time steps, including t = 0
    pub fn num_steps(&self) -> usize {
        ((self.simulation_time + 1e-10) / self.step).floor() as usize + 1
    }

    /// Reject options the integrator cannot run with
    pub fn validate(&self) -> SolverResult<()> {
        if !self.step.is_finite() || self.step <= 0.0 {
            return Err(SolverError::InvalidInput(format!(
                "time step must be positive and finite (got {})",
                self.step
            )));
        }
        if !self.simulation_time.is_finite() || self.simulation_time < 0.0 {
            return Err(SolverError::InvalidInput(format!(
                "simulation time must be non-negative and finite (got {})",
                self.simulation_time
            )));
        }
        if !self.damping_ratio.is_finite() {
            return Err(SolverError::InvalidInput("damping ratio must be finite".into()));
        }
        if !self.gravity().is_finite() {
            return Err(SolverError::InvalidInput("gravity must be finite".into()));
        }
        Ok(())
    }
}
