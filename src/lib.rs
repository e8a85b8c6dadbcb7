//! Timber Solver - 3D frame dynamics with progressive member failure
//!
//! This library models a structure as points joined by 12-DOF beam-column
//! members and supports:
//! - Linear static analysis with structural diagnostics
//! - Explicit dynamic analysis with Rayleigh damping and gravity
//! - Brittle member failure (tensile, compressive, shear, bending)
//! - Kinematic trajectories with an analytic free-fall shortcut
//!
//! ## Example
//! ```rust
//! use timber_solver::prelude::*;
//!
//! let mut model = Model::new();
//!
//! // Points in meters; global Y is vertical
//! model.add_point(Point::new(1, 0.0, 0.0, 0.0)).unwrap();
//! model.add_point(Point::new(2, 2.0, 0.0, 0.0).with_mass(100.0)).unwrap();
//!
//! // Wood member with the default 0.1 x 0.1 m section
//! model.add_member(Member::new(1, 2));
//!
//! // Fixed support and a downward tip load
//! model.add_support(Support::fixed(1));
//! model.add_load(Load::force(2, 0.0, -500.0, 0.0));
//!
//! // Static analysis
//! let (results, issues) = model.solve_with_diagnostics().unwrap();
//! assert!(issues.is_empty());
//! assert!(results.frames[0].displacements[&2][1] < 0.0);
//!
//! // Dynamic analysis
//! let results = model.solve(&DynamicOptions::new(0.001, 0.05)).unwrap();
//! assert_eq!(results.total_frames, 51);
//! ```

pub mod analysis;
pub mod elements;
pub mod error;
pub mod loads;
pub mod math;
pub mod model;
pub mod results;
pub mod units;

pub use analysis::{simulate_dynamics, solve, solve_with_diagnostics};

// Re-export common types
pub mod prelude {
    pub use crate::analysis::{
        simulate_dynamics, solve, solve_with_diagnostics, AnalysisType, DynamicOptions,
        NumericalLimits, STANDARD_GRAVITY,
    };
    pub use crate::elements::{
        FailureMode, Material, Member, MemberState, Point, PointId, Section, Support,
    };
    pub use crate::error::{SolverError, SolverResult};
    pub use crate::loads::{Load, LoadKind, TimeFunction};
    pub use crate::model::Model;
    pub use crate::results::{
        Frame, KinematicFrame, MemberForces, MemberStresses, PointSnapshot, Results, SystemClass,
    };
    pub use crate::units::UnitSystem;
}
