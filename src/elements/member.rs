//! Member element - 3D frame element (beam/column) and its failure state

use serde::{Deserialize, Serialize};

use super::{Material, PointId, Section};

/// A 3D frame member connecting two points
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Member {
    /// Start point (i-end)
    pub start: PointId,
    /// End point (j-end)
    pub end: PointId,
    /// Member material
    #[serde(default)]
    pub material: Material,
    /// Member cross-section
    #[serde(default)]
    pub section: Section,
}

impl Member {
    /// Create a new member with the default material and section
    pub fn new(start: PointId, end: PointId) -> Self {
        Self {
            start,
            end,
            material: Material::default(),
            section: Section::default(),
        }
    }

    /// Set the material
    pub fn with_material(mut self, material: Material) -> Self {
        self.material = material;
        self
    }

    /// Set the section
    pub fn with_section(mut self, section: Section) -> Self {
        self.section = section;
        self
    }
}

/// Governing failure mode of a broken member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureMode {
    Tensile,
    Compressive,
    Shear,
    Bending,
}

/// Failure state of a single member during one solve.
///
/// A member starts intact and may break exactly once; a broken member never
/// heals and contributes no stiffness or mass afterwards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MemberState {
    /// Whether the member has failed
    pub is_broken: bool,
    /// Simulation time at which the member failed
    pub break_time: Option<f64>,
    /// Governing failure mode
    pub failure_mode: Option<FailureMode>,
}

impl MemberState {
    /// Mark the member as broken. Has no effect on an already broken member.
    pub fn break_at(&mut self, time: f64, mode: FailureMode) -> bool {
        if self.is_broken {
            return false;
        }
        self.is_broken = true;
        self.break_time = Some(time);
        self.failure_mode = Some(mode);
        true
    }
}
