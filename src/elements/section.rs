//! Section properties for frame members

use serde::{Deserialize, Serialize};

/// Cross-section properties for frame members
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// Cross-sectional area in m²
    pub a: f64,
    /// Moment of inertia about local y-axis in m⁴
    pub iy: f64,
    /// Moment of inertia about local z-axis in m⁴
    pub iz: f64,
    /// Torsional constant in m⁴
    pub j: f64,
    /// Extreme fiber distance along local y in m
    pub y_max: f64,
    /// Extreme fiber distance along local z in m
    pub z_max: f64,
}

impl Section {
    /// Create a new section from its properties
    pub fn new(a: f64, iy: f64, iz: f64, j: f64, y_max: f64, z_max: f64) -> Self {
        Self {
            a,
            iy,
            iz,
            j,
            y_max,
            z_max,
        }
    }

    /// Create a solid rectangular section
    pub fn rectangular(width: f64, height: f64) -> Self {
        let iy = width * height.powi(3) / 12.0;
        let iz = height * width.powi(3) / 12.0;

        Self {
            a: width * height,
            iy,
            iz,
            // Coarse torsion estimate
            j: 0.3 * iy.min(iz),
            y_max: height / 2.0,
            z_max: width / 2.0,
        }
    }

    /// Create a solid circular section
    pub fn circular(diameter: f64) -> Self {
        let r = diameter / 2.0;
        let i = std::f64::consts::PI * r.powi(4) / 4.0;

        Self {
            a: std::f64::consts::PI * r.powi(2),
            iy: i,
            iz: i,
            j: 2.0 * i,
            y_max: r,
            z_max: r,
        }
    }

    /// Create a hollow circular (pipe) section
    pub fn pipe(outer_diameter: f64, wall_thickness: f64) -> Self {
        let r_o = outer_diameter / 2.0;
        let r_i = (r_o - wall_thickness).max(0.0);
        let i = std::f64::consts::PI * (r_o.powi(4) - r_i.powi(4)) / 4.0;

        Self {
            a: std::f64::consts::PI * (r_o.powi(2) - r_i.powi(2)),
            iy: i,
            iz: i,
            j: 2.0 * i,
            y_max: r_o,
            z_max: r_o,
        }
    }

    /// Create a box/tube section
    pub fn box_section(width: f64, height: f64, wall_thickness: f64) -> Self {
        let t = wall_thickness;
        let b = width;
        let d = height;
        let bi = (b - 2.0 * t).max(0.0);
        let di = (d - 2.0 * t).max(0.0);

        // Torsional constant for closed thin-walled section
        let am = (b - t) * (d - t);
        let s = 2.0 * (b + d) - 4.0 * t;

        Self {
            a: b * d - bi * di,
            iy: (b * d.powi(3) - bi * di.powi(3)) / 12.0,
            iz: (d * b.powi(3) - di * bi.powi(3)) / 12.0,
            j: 4.0 * am.powi(2) * t / s,
            y_max: d / 2.0,
            z_max: b / 2.0,
        }
    }

    /// Elastic section modulus about local z (bending in the local x-y plane)
    pub fn sz(&self) -> f64 {
        if self.y_max > 0.0 {
            self.iz / self.y_max
        } else {
            0.0
        }
    }

    /// Elastic section modulus about local y (bending in the local x-z plane)
    pub fn sy(&self) -> f64 {
        if self.z_max > 0.0 {
            self.iy / self.z_max
        } else {
            0.0
        }
    }
}

impl Default for Section {
    fn default() -> Self {
        Self::rectangular(0.1, 0.1)
    }
}
