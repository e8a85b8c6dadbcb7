//! Result types for static and dynamic analysis

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::elements::{MemberState, PointId};
use crate::units::UnitSystem;

/// Internal forces at the start end of a member
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MemberForces {
    /// Axial force (positive = tension)
    pub axial: f64,
    /// Resultant shear force in the local y-z plane
    pub shear: f64,
    /// Resultant bending moment about the local y and z axes
    pub moment: f64,
}

impl MemberForces {
    /// Create from local force array at the i-end
    pub fn from_i_node_forces(forces: &[f64; 12]) -> Self {
        Self {
            axial: -forces[0],
            shear: forces[1].hypot(forces[2]),
            moment: forces[4].hypot(forces[5]),
        }
    }
}

/// Stresses derived from member forces, all non-negative magnitudes
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MemberStresses {
    /// Tensile normal stress in Pa
    pub tensile: f64,
    /// Compressive normal stress in Pa
    pub compressive: f64,
    /// Average shear stress in Pa
    pub shear: f64,
    /// Extreme-fiber bending stress in Pa
    pub bending: f64,
}

impl MemberStresses {
    /// Largest stress component
    pub fn max(&self) -> f64 {
        self.tensile.max(self.compressive).max(self.shear).max(self.bending)
    }
}

/// Which equations of motion were integrated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SystemClass {
    /// No support records: the full system floats freely
    #[default]
    Unconstrained,
    /// At least one support record: free DOFs only
    Constrained,
}

/// Snapshot of the structure at one instant
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Frame {
    /// Simulation time in s
    pub time: f64,
    /// Current position of each point [X, Y, Z]
    pub positions: BTreeMap<PointId, [f64; 3]>,
    /// Displacement of each point [DX, DY, DZ, RX, RY, RZ]
    pub displacements: BTreeMap<PointId, [f64; 6]>,
    /// Velocity of each point
    pub velocities: BTreeMap<PointId, [f64; 6]>,
    /// Acceleration of each point
    pub accelerations: BTreeMap<PointId, [f64; 6]>,
    /// Support reactions, nonzero only on constrained DOFs
    pub reactions: BTreeMap<PointId, [f64; 6]>,
    /// Forces of intact members keyed by member index
    pub member_forces: BTreeMap<usize, MemberForces>,
    /// Stresses of intact members keyed by member index
    pub member_stresses: BTreeMap<usize, MemberStresses>,
    /// All members broken up to and including this frame
    pub broken_members: Vec<usize>,
    /// Numerical issues encountered while producing this frame
    pub issues: Vec<String>,
}

impl Frame {
    /// Largest translational displacement magnitude over all points
    pub fn max_displacement(&self) -> f64 {
        self.displacements
            .values()
            .map(|d| (d[0] * d[0] + d[1] * d[1] + d[2] * d[2]).sqrt())
            .fold(0.0, f64::max)
    }
}

/// Complete output of an analysis run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Results {
    /// Frames in time order
    pub frames: Vec<Frame>,
    /// Unit system tag of the request
    pub unit_system: UnitSystem,
    /// Time of the last frame in s
    pub final_time: f64,
    /// Number of frames
    pub total_frames: usize,
    /// Failure state of every member at the end of the run
    pub member_states: Vec<MemberState>,
    /// Integration path used
    pub system: SystemClass,
}

impl Results {
    /// Assemble results from collected frames
    pub fn new(
        frames: Vec<Frame>,
        unit_system: UnitSystem,
        member_states: Vec<MemberState>,
        system: SystemClass,
    ) -> Self {
        let final_time = frames.last().map_or(0.0, |f| f.time);
        Self {
            total_frames: frames.len(),
            frames,
            unit_system,
            final_time,
            member_states,
            system,
        }
    }

    /// Frame whose time is closest to `time`
    pub fn frame_at_time(&self, time: f64) -> Option<&Frame> {
        self.frames
            .iter()
            .min_by(|a, b| (a.time - time).abs().total_cmp(&(b.time - time).abs()))
    }

    /// Last frame of the run
    pub fn final_frame(&self) -> Option<&Frame> {
        self.frames.last()
    }

    /// Indices of members broken by the end of the run
    pub fn broken_members(&self) -> Vec<usize> {
        self.member_states
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.is_broken.then_some(i))
            .collect()
    }

    /// All distinct issues over the run, in order of first appearance
    pub fn issues(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for issue in self.frames.iter().flat_map(|f| f.issues.iter()) {
            if !seen.contains(&issue.as_str()) {
                seen.push(issue.as_str());
            }
        }
        seen
    }
}

/// Position and velocity of a point in a kinematic snapshot
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointSnapshot {
    pub id: PointId,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub vx: f64,
    pub vy: f64,
    pub vz: f64,
}

/// Lightweight per-step snapshot produced by kinematic simulation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KinematicFrame {
    /// Simulation time in s
    pub time: f64,
    /// Point states in model order
    pub points: Vec<PointSnapshot>,
}
