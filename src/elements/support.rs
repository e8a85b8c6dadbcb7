//! Support conditions

use serde::{Deserialize, Serialize};

use super::PointId;

/// Support conditions at a point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Support {
    /// Supported point
    pub point: PointId,
    /// Restrained in X translation
    #[serde(default)]
    pub ux: bool,
    /// Restrained in Y translation
    #[serde(default)]
    pub uy: bool,
    /// Restrained in Z translation
    #[serde(default)]
    pub uz: bool,
    /// Restrained in X rotation
    #[serde(default)]
    pub rx: bool,
    /// Restrained in Y rotation
    #[serde(default)]
    pub ry: bool,
    /// Restrained in Z rotation
    #[serde(default)]
    pub rz: bool,
}

impl Support {
    /// Create a support record with no restraints
    pub fn new(point: PointId) -> Self {
        Self::with_restraints(point, false, false, false, false, false, false)
    }

    /// Create a fully fixed support (all DOFs restrained)
    pub fn fixed(point: PointId) -> Self {
        Self::with_restraints(point, true, true, true, true, true, true)
    }

    /// Create a pinned support (translations restrained, rotations free)
    pub fn pinned(point: PointId) -> Self {
        Self::with_restraints(point, true, true, true, false, false, false)
    }

    /// Create a support with specific restraints
    pub fn with_restraints(
        point: PointId,
        ux: bool,
        uy: bool,
        uz: bool,
        rx: bool,
        ry: bool,
        rz: bool,
    ) -> Self {
        Self {
            point,
            ux,
            uy,
            uz,
            rx,
            ry,
            rz,
        }
    }

    /// Restraint flags as array [UX, UY, UZ, RX, RY, RZ]
    pub fn restraints(&self) -> [bool; 6] {
        [self.ux, self.uy, self.uz, self.rx, self.ry, self.rz]
    }

    /// Get list of restrained DOF indices (0-5)
    pub fn restrained_dofs(&self) -> Vec<usize> {
        self.restraints()
            .iter()
            .enumerate()
            .filter_map(|(i, &fixed)| fixed.then_some(i))
            .collect()
    }

    /// Check if any DOF is restrained
    pub fn is_supported(&self) -> bool {
        self.restraints().iter().any(|&r| r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_support() {
        let support = Support::fixed(1);
        assert_eq!(support.restrained_dofs(), vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_pinned_support() {
        let support = Support::pinned(3);
        assert_eq!(support.restrained_dofs(), vec![0, 1, 2]);
        assert!(support.is_supported());
    }

    #[test]
    fn test_unrestrained_record() {
        let support: Support = serde_json::from_str(r#"{"point": 4}"#).unwrap();
        assert_eq!(support, Support::new(4));
        assert!(!support.is_supported());
        assert!(support.restrained_dofs().is_empty());
    }
}
