//! Point (node) definition

use serde::{Deserialize, Serialize};

/// Identifier of a point, unique within a model
pub type PointId = u32;

/// A point in 3D space carrying six degrees of freedom
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Unique identifier
    pub id: PointId,
    /// X coordinate in m
    pub x: f64,
    /// Y coordinate in m (vertical)
    pub y: f64,
    /// Z coordinate in m
    pub z: f64,
    /// Explicit lumped mass in kg
    #[serde(default)]
    pub mass: f64,
}

impl Point {
    /// Create a new massless point
    pub fn new(id: PointId, x: f64, y: f64, z: f64) -> Self {
        Self { id, x, y, z, mass: 0.0 }
    }

    /// Attach an explicit lumped mass
    pub fn with_mass(mut self, mass: f64) -> Self {
        self.mass = mass;
        self
    }

    /// Get coordinates as array
    pub fn coords(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    /// Calculate distance to another point
    pub fn distance_to(&self, other: &Point) -> f64 {
        ((other.x - self.x).powi(2) + (other.y - self.y).powi(2) + (other.z - self.z).powi(2))
            .sqrt()
    }
}
