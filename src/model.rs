//! Frame model - container for points, members, loads and supports

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::analysis::{self, DynamicOptions};
use crate::elements::{Member, Point, PointId, Support};
use crate::error::{SolverError, SolverResult};
use crate::loads::Load;
use crate::results::{KinematicFrame, Results, SystemClass};

/// Degrees of freedom per point
pub const DOFS_PER_POINT: usize = 6;

/// A 3D frame model.
///
/// Solvers only borrow the model; member failure state lives in each run,
/// so the same model can be solved repeatedly or from several threads.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Model {
    /// Points in DOF order
    pub points: Vec<Point>,
    /// Members, identified by their index
    pub members: Vec<Member>,
    /// Nodal loads
    pub loads: Vec<Load>,
    /// Support records
    pub supports: Vec<Support>,
}

impl Model {
    /// Create a new empty model
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a model from JSON
    pub fn from_json(json: &str) -> SolverResult<Self> {
        let model: Model = serde_json::from_str(json)?;
        model.validate()?;
        Ok(model)
    }

    /// Serialize the model to JSON
    pub fn to_json(&self) -> SolverResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn check_point(point: &Point) -> SolverResult<()> {
        if !(point.x.is_finite() && point.y.is_finite() && point.z.is_finite()) {
            return Err(SolverError::InvalidInput(format!(
                "point {} has non-finite coordinates",
                point.id
            )));
        }
        if !point.mass.is_finite() || point.mass < 0.0 {
            return Err(SolverError::InvalidInput(format!(
                "point {} has invalid mass {}",
                point.id, point.mass
            )));
        }
        Ok(())
    }

    /// Check point ids are unique and point data is physical
    pub fn validate(&self) -> SolverResult<()> {
        let mut seen = HashSet::with_capacity(self.points.len());
        for point in &self.points {
            Self::check_point(point)?;
            if !seen.insert(point.id) {
                return Err(SolverError::DuplicatePoint(point.id));
            }
        }
        Ok(())
    }

    /// Add a point to the model
    pub fn add_point(&mut self, point: Point) -> SolverResult<()> {
        Self::check_point(&point)?;
        if self.point(point.id).is_some() {
            return Err(SolverError::DuplicatePoint(point.id));
        }
        self.points.push(point);
        Ok(())
    }

    /// Add a member, returning its index
    pub fn add_member(&mut self, member: Member) -> usize {
        self.members.push(member);
        self.members.len() - 1
    }

    /// Add a nodal load
    pub fn add_load(&mut self, load: Load) {
        self.loads.push(load);
    }

    /// Add a support record
    pub fn add_support(&mut self, support: Support) {
        self.supports.push(support);
    }

    /// Look up a point by id
    pub fn point(&self, id: PointId) -> Option<&Point> {
        self.points.iter().find(|p| p.id == id)
    }

    /// Map from point id to its position in the DOF ordering
    pub fn point_index(&self) -> HashMap<PointId, usize> {
        self.points
            .iter()
            .enumerate()
            .map(|(i, p)| (p.id, i))
            .collect()
    }

    /// Total number of degrees of freedom
    pub fn num_dofs(&self) -> usize {
        self.points.len() * DOFS_PER_POINT
    }

    /// A model is unconstrained when it has no support records at all
    pub fn is_unconstrained(&self) -> bool {
        self.supports.is_empty()
    }

    /// Integration path this model takes in dynamic analysis
    pub fn system_class(&self) -> SystemClass {
        if self.is_unconstrained() {
            SystemClass::Unconstrained
        } else {
            SystemClass::Constrained
        }
    }

    /// Run a dynamic analysis
    pub fn solve(&self, options: &DynamicOptions) -> SolverResult<Results> {
        analysis::solve(self, options)
    }

    /// Run a static analysis, returning the results and any diagnostics
    pub fn solve_with_diagnostics(&self) -> SolverResult<(Results, Vec<String>)> {
        analysis::solve_with_diagnostics(self)
    }

    /// Run a kinematic simulation
    pub fn simulate_dynamics(&self, step: f64, simulation_time: f64) -> SolverResult<Vec<KinematicFrame>> {
        analysis::simulate_dynamics(self, step, simulation_time)
    }
}
