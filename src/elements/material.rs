//! Material properties

use serde::{Deserialize, Serialize};

/// Linear-elastic, brittle material used by frame members
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// Modulus of elasticity (Young's modulus) in Pa
    pub e: f64,
    /// Shear modulus in Pa
    pub g: f64,
    /// Density in kg/m³
    pub density: f64,
    /// Ultimate tensile strength in Pa
    pub tensile_strength: f64,
    /// Ultimate compressive strength in Pa
    pub compressive_strength: f64,
    /// Ultimate shear strength in Pa
    pub shear_strength: f64,
    /// Modulus of rupture in Pa
    pub bending_strength: f64,
}

impl Material {
    /// Create a new material with given stiffness, density and strengths
    pub fn new(
        e: f64,
        g: f64,
        density: f64,
        tensile_strength: f64,
        compressive_strength: f64,
        shear_strength: f64,
        bending_strength: f64,
    ) -> Self {
        Self {
            e,
            g,
            density,
            tensile_strength,
            compressive_strength,
            shear_strength,
            bending_strength,
        }
    }

    /// Create an elastic material that never fails
    pub fn elastic(e: f64, g: f64, density: f64) -> Self {
        Self::new(e, g, density, 0.0, 0.0, 0.0, 0.0)
    }

    /// Create a generic softwood material
    pub fn wood() -> Self {
        Self {
            e: 12e9,                     // 12 GPa
            g: 4.5e9,                    // 4.5 GPa
            density: 500.0,              // kg/m³
            tensile_strength: 40e6,      // 40 MPa
            compressive_strength: 30e6,  // 30 MPa
            shear_strength: 5e6,         // 5 MPa
            bending_strength: 60e6,      // 60 MPa
        }
    }

    /// Create a standard structural steel material
    pub fn steel() -> Self {
        Self {
            e: 200e9,                    // 200 GPa
            g: 75e9,                     // 75 GPa
            density: 7850.0,             // kg/m³
            tensile_strength: 400e6,
            compressive_strength: 400e6,
            shear_strength: 240e6,
            bending_strength: 400e6,
        }
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::wood()
    }
}
