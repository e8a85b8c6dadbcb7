//! Global matrix assembly and DOF partitioning

use std::collections::{BTreeSet, HashMap};

use crate::elements::{Member, MemberState, PointId};
use crate::error::SolverResult;
use crate::math::{self, Mat, Vec as FEVec, MIN_ROTATIONAL_INERTIA};
use crate::model::{Model, DOFS_PER_POINT};

/// Translational mass given to points that carry no mass at all
pub const FLOOR_TRANSLATIONAL_MASS: f64 = 1.0;

/// Current geometry of a member whose end points resolve
#[derive(Debug, Clone, Copy)]
pub struct MemberGeometry {
    /// Index of the start point in DOF order
    pub i: usize,
    /// Index of the end point in DOF order
    pub j: usize,
    /// Current start position
    pub start: [f64; 3],
    /// Current end position
    pub end: [f64; 3],
    /// Current length
    pub length: f64,
}

impl MemberGeometry {
    /// Resolve a member's end points at displacement state `x`.
    ///
    /// Returns `None` when either end is missing from the model or both
    /// ends refer to the same point.
    pub fn resolve(
        model: &Model,
        member: &Member,
        point_index: &HashMap<PointId, usize>,
        x: &FEVec,
    ) -> Option<Self> {
        let i = *point_index.get(&member.start)?;
        let j = *point_index.get(&member.end)?;
        if i == j {
            return None;
        }

        let start = current_position(model, i, x);
        let end = current_position(model, j, x);
        let length = ((end[0] - start[0]).powi(2)
            + (end[1] - start[1]).powi(2)
            + (end[2] - start[2]).powi(2))
        .sqrt();

        Some(Self {
            i,
            j,
            start,
            end,
            length,
        })
    }

    /// Global DOF indices of the member's 12 local DOFs
    pub fn dofs(&self) -> [usize; 12] {
        std::array::from_fn(|k| {
            let point = if k < 6 { self.i } else { self.j };
            point * DOFS_PER_POINT + k % 6
        })
    }

    /// Gather the member's global displacements
    pub fn gather(&self, x: &FEVec) -> math::Vec12 {
        let dofs = self.dofs();
        math::Vec12::from_fn(|k, _| x[dofs[k]])
    }

    /// End displacements with the start point's translation removed.
    ///
    /// A rigid translation of the member gives exactly zero.
    pub fn deformation(&self, x: &FEVec) -> math::Vec12 {
        let mut d = self.gather(x);
        for k in 0..3 {
            let rigid = d[k];
            d[k] = 0.0;
            d[k + 6] -= rigid;
        }
        d
    }
}

/// Original position plus translational displacement of point `idx`
pub fn current_position(model: &Model, idx: usize, x: &FEVec) -> [f64; 3] {
    let p = &model.points[idx];
    let base = idx * DOFS_PER_POINT;
    [p.x + x[base], p.y + x[base + 1], p.z + x[base + 2]]
}

/// Sorted, de-duplicated global DOFs restrained by support records
pub fn constrained_dofs(model: &Model, point_index: &HashMap<PointId, usize>) -> Vec<usize> {
    let mut dofs = BTreeSet::new();
    for support in &model.supports {
        if let Some(&idx) = point_index.get(&support.point) {
            for local in support.restrained_dofs() {
                dofs.insert(idx * DOFS_PER_POINT + local);
            }
        }
    }
    dofs.into_iter().collect()
}

/// Base (time-independent) load vector
pub fn external_forces(model: &Model, point_index: &HashMap<PointId, usize>) -> FEVec {
    let mut f = FEVec::zeros(model.num_dofs());
    for load in &model.loads {
        if let Some(&idx) = point_index.get(&load.point) {
            for (k, value) in load.as_array().iter().enumerate() {
                f[idx * DOFS_PER_POINT + k] += value;
            }
        }
    }
    f
}

/// Correction to the base load vector at time `t`
pub fn time_varying_forces(model: &Model, point_index: &HashMap<PointId, usize>, t: f64) -> FEVec {
    let mut f = FEVec::zeros(model.num_dofs());
    for load in model.loads.iter().filter(|l| !l.time_function.is_constant()) {
        if let Some(&idx) = point_index.get(&load.point) {
            for (k, value) in load.delta_at_time(t).iter().enumerate() {
                f[idx * DOFS_PER_POINT + k] += value;
            }
        }
    }
    f
}

/// Assemble the elastic stiffness and nodal masses at displacement state `x`.
///
/// Broken members, members with unresolved end points and members of zero
/// current length contribute nothing.
pub fn assemble_stiffness(
    model: &Model,
    states: &[MemberState],
    point_index: &HashMap<PointId, usize>,
    x: &FEVec,
) -> SolverResult<(Mat, Vec<f64>)> {
    let n = model.num_dofs();
    let mut k_global = Mat::zeros(n, n);
    let mut nodal_masses: Vec<f64> = model.points.iter().map(|p| p.mass).collect();

    for (idx, member) in model.members.iter().enumerate() {
        if states.get(idx).is_some_and(|s| s.is_broken) {
            continue;
        }
        let Some(geom) = MemberGeometry::resolve(model, member, point_index, x) else {
            continue;
        };
        if geom.length == 0.0 {
            continue;
        }

        let mat = &member.material;
        let sec = &member.section;
        let k_local = math::member_local_stiffness(
            mat.e,
            mat.g,
            sec.a,
            sec.iy,
            sec.iz,
            sec.j,
            geom.length,
        )?;
        let t = math::member_transformation_matrix(&geom.start, &geom.end)?;
        let k_member = t.transpose() * k_local * t;

        let dofs = geom.dofs();
        for (a, &row) in dofs.iter().enumerate() {
            for (b, &col) in dofs.iter().enumerate() {
                k_global[(row, col)] += k_member[(a, b)];
            }
        }

        let m_member = math::member_lumped_mass(mat.density, sec.a, geom.length);
        nodal_masses[geom.i] += m_member[(0, 0)];
        nodal_masses[geom.j] += m_member[(6, 6)];
    }

    Ok((k_global, nodal_masses))
}

/// Internal nodal forces `Σ Tᵀ k T d` of every intact member at displacement
/// state `x`, with `d` the member's deformation
pub fn internal_forces(
    model: &Model,
    states: &[MemberState],
    point_index: &HashMap<PointId, usize>,
    x: &FEVec,
) -> SolverResult<FEVec> {
    let mut f = FEVec::zeros(model.num_dofs());

    for (idx, member) in model.members.iter().enumerate() {
        if states.get(idx).is_some_and(|s| s.is_broken) {
            continue;
        }
        let Some(geom) = MemberGeometry::resolve(model, member, point_index, x) else {
            continue;
        };
        if geom.length == 0.0 {
            continue;
        }

        let mat = &member.material;
        let sec = &member.section;
        let k_local =
            math::member_local_stiffness(mat.e, mat.g, sec.a, sec.iy, sec.iz, sec.j, geom.length)?;
        let t = math::member_transformation_matrix(&geom.start, &geom.end)?;
        let f_member = t.transpose() * (k_local * (t * geom.deformation(x)));

        for (a, &dof) in geom.dofs().iter().enumerate() {
            f[dof] += f_member[a];
        }
    }

    Ok(f)
}

/// Diagonal lumped mass matrix from nodal masses.
///
/// Rotational inertia equals the nodal mass times a unit radius of gyration.
/// Points with no mass receive a conditioning floor so the matrix stays
/// invertible.
pub fn mass_matrix(nodal_masses: &[f64]) -> Mat {
    let diag = FEVec::from_fn(nodal_masses.len() * DOFS_PER_POINT, |dof, _| {
        let mass = nodal_masses[dof / DOFS_PER_POINT];
        let translational = dof % DOFS_PER_POINT < 3;
        match (mass > 0.0, translational) {
            (true, true) => mass,
            (true, false) => mass.max(MIN_ROTATIONAL_INERTIA),
            (false, true) => FLOOR_TRANSLATIONAL_MASS,
            (false, false) => MIN_ROTATIONAL_INERTIA,
        }
    });
    Mat::from_diagonal(&diag)
}

/// Zero the rows and columns of constrained DOFs and place `penalty` on the diagonal
pub fn apply_penalty(k: &mut Mat, constrained: &[usize], penalty: f64) {
    for &dof in constrained {
        k.row_mut(dof).fill(0.0);
        k.column_mut(dof).fill(0.0);
        k[(dof, dof)] = penalty;
    }
}

/// Copy of `values` that keeps only the entries at `dofs`
pub fn at_dofs(values: &FEVec, dofs: &[usize]) -> FEVec {
    let mut r = FEVec::zeros(values.len());
    for &dof in dofs {
        r[dof] = values[dof];
    }
    r
}

/// System matrices assembled at one displacement state
#[derive(Debug, Clone)]
pub struct AssembledSystem {
    /// Element stiffness before boundary conditions
    pub k_elastic: Mat,
    /// Stiffness with penalty boundary conditions
    pub k_penalty: Mat,
    /// Diagonal lumped mass matrix
    pub m_full: Mat,
    /// Base external load vector
    pub f_ext: FEVec,
    /// Unrestrained DOFs, ascending
    pub free_dofs: Vec<usize>,
    /// Restrained DOFs, ascending
    pub constrained_dofs: Vec<usize>,
    /// Mass lumped at each point in kg
    pub nodal_masses: Vec<f64>,
    /// Map from point id to DOF ordering
    pub point_index: HashMap<PointId, usize>,
}

impl AssembledSystem {
    /// Assemble the full system at displacement state `x`
    pub fn assemble(
        model: &Model,
        states: &[MemberState],
        x: &FEVec,
        penalty: f64,
    ) -> SolverResult<Self> {
        let point_index = model.point_index();
        let (k_elastic, nodal_masses) = assemble_stiffness(model, states, &point_index, x)?;

        let constrained_dofs = constrained_dofs(model, &point_index);
        let free_dofs = (0..model.num_dofs())
            .filter(|dof| constrained_dofs.binary_search(dof).is_err())
            .collect();

        let mut k_penalty = k_elastic.clone();
        apply_penalty(&mut k_penalty, &constrained_dofs, penalty);

        Ok(Self {
            k_elastic,
            k_penalty,
            m_full: mass_matrix(&nodal_masses),
            f_ext: external_forces(model, &point_index),
            free_dofs,
            constrained_dofs,
            nodal_masses,
            point_index,
        })
    }

    /// Whether a global DOF is restrained
    pub fn is_constrained(&self, dof: usize) -> bool {
        self.constrained_dofs.binary_search(&dof).is_ok()
    }

    /// Restrict the penalty system and a force vector to the free DOFs
    pub fn reduce(&self, f: &FEVec) -> ReducedSystem {
        let free = &self.free_dofs;
        ReducedSystem {
            k: self.k_penalty.select_rows(free).select_columns(free),
            m: self.m_full.select_rows(free).select_columns(free),
            f: f.select_rows(free),
            free_dofs: free.clone(),
        }
    }
}

/// Equations of motion restricted to the free DOFs
#[derive(Debug, Clone)]
pub struct ReducedSystem {
    pub k: Mat,
    pub m: Mat,
    pub f: FEVec,
    /// Global index of each reduced DOF
    pub free_dofs: Vec<usize>,
}

impl ReducedSystem {
    /// Number of reduced DOFs
    pub fn len(&self) -> usize {
        self.free_dofs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.free_dofs.is_empty()
    }

    /// Pick the free entries of a full vector
    pub fn restrict(&self, full: &FEVec) -> FEVec {
        full.select_rows(&self.free_dofs)
    }

    /// Scatter a reduced vector into a full vector; constrained entries are zero
    pub fn expand(&self, reduced: &FEVec, n: usize) -> FEVec {
        let mut full = FEVec::zeros(n);
        for (r, &dof) in self.free_dofs.iter().enumerate() {
            full[dof] = reduced[r];
        }
        full
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::{FailureMode, Point, Support};
    use crate::loads::{Load, TimeFunction};
    use approx::assert_relative_eq;

    fn cantilever() -> Model {
        let mut model = Model::new();
        model.add_point(Point::new(1, 0.0, 0.0, 0.0)).unwrap();
        model.add_point(Point::new(2, 2.0, 0.0, 0.0)).unwrap();
        model.add_member(Member::new(1, 2));
        model.add_support(Support::fixed(1));
        model.add_load(Load::force(2, 0.0, -100.0, 0.0));
        model
    }

    #[test]
    fn test_partitions_and_penalty() {
        let model = cantilever();
        let x = FEVec::zeros(12);
        let sys = AssembledSystem::assemble(&model, &[MemberState::default()], &x, 1e12).unwrap();

        assert_eq!(sys.constrained_dofs, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(sys.free_dofs, vec![6, 7, 8, 9, 10, 11]);

        for dof in 0..6 {
            assert_eq!(sys.k_penalty[(dof, dof)], 1e12);
            for other in 0..12 {
                if other != dof {
                    assert_eq!(sys.k_penalty[(dof, other)], 0.0);
                    assert_eq!(sys.k_penalty[(other, dof)], 0.0);
                }
            }
        }

        // Elastic stiffness keeps the coupling terms
        let ea_l = 12e9 * 0.01 / 2.0;
        assert_relative_eq!(sys.k_elastic[(0, 6)], -ea_l, max_relative = 1e-12);
        assert_relative_eq!(sys.k_elastic[(6, 6)], ea_l, max_relative = 1e-12);

        for i in 0..12 {
            for j in 0..12 {
                assert_relative_eq!(sys.k_penalty[(i, j)], sys.k_penalty[(j, i)], max_relative = 1e-12);
            }
        }

        assert_eq!(sys.f_ext[7], -100.0);
    }

    #[test]
    fn test_nodal_masses() {
        let mut model = cantilever();
        model.points[1].mass = 3.0;
        let sys = AssembledSystem::assemble(&model, &[], &FEVec::zeros(12), 1e12).unwrap();

        // 500 kg/m³ * 0.01 m² * 2 m = 10 kg, half per end
        assert_relative_eq!(sys.nodal_masses[0], 5.0, epsilon = 1e-12);
        assert_relative_eq!(sys.nodal_masses[1], 8.0, epsilon = 1e-12);
        assert_relative_eq!(sys.m_full[(7, 7)], 8.0, epsilon = 1e-12);
        assert_relative_eq!(sys.m_full[(10, 10)], 8.0, epsilon = 1e-12);
        assert_eq!(sys.m_full[(6, 7)], 0.0);
    }

    #[test]
    fn test_floor_mass_for_isolated_point() {
        let mut model = Model::new();
        model.add_point(Point::new(1, 0.0, 0.0, 0.0)).unwrap();
        let sys = AssembledSystem::assemble(&model, &[], &FEVec::zeros(6), 1e12).unwrap();
        assert_eq!(sys.m_full[(1, 1)], FLOOR_TRANSLATIONAL_MASS);
        assert_eq!(sys.m_full[(4, 4)], MIN_ROTATIONAL_INERTIA);
        assert_eq!(sys.k_elastic, Mat::zeros(6, 6));
    }

    #[test]
    fn test_broken_member_contributes_nothing() {
        let model = cantilever();
        let mut state = MemberState::default();
        state.break_at(0.1, FailureMode::Bending);

        let sys = AssembledSystem::assemble(&model, &[state], &FEVec::zeros(12), 1e12).unwrap();
        assert_eq!(sys.k_elastic, Mat::zeros(12, 12));
        assert_eq!(sys.nodal_masses, vec![0.0, 0.0]);
        assert_eq!(sys.m_full[(7, 7)], FLOOR_TRANSLATIONAL_MASS);
    }

    #[test]
    fn test_degenerate_members_skipped() {
        let mut model = cantilever();
        model.add_point(Point::new(3, 2.0, 0.0, 0.0)).unwrap();
        model.add_member(Member::new(2, 3)); // zero length
        model.add_member(Member::new(2, 99)); // missing point
        model.add_member(Member::new(1, 1)); // same point

        let reference = AssembledSystem::assemble(&cantilever(), &[], &FEVec::zeros(12), 1e12).unwrap();
        let sys = AssembledSystem::assemble(&model, &[], &FEVec::zeros(18), 1e12).unwrap();
        assert_eq!(sys.k_elastic.view((0, 0), (12, 12)), reference.k_elastic.view((0, 0), (12, 12)));
        assert_eq!(sys.nodal_masses[2], 0.0);
    }

    #[test]
    fn test_geometry_follows_displacement() {
        let model = cantilever();
        let mut x = FEVec::zeros(12);
        x[6] = 1.0; // stretch by 1 m along X
        let geom = MemberGeometry::resolve(&model, &model.members[0], &model.point_index(), &x).unwrap();
        assert_relative_eq!(geom.length, 3.0, epsilon = 1e-12);
        assert_eq!(geom.dofs()[6], 6);
    }

    #[test]
    fn test_internal_forces_at_constrained_dofs() {
        let model = cantilever();
        let sys = AssembledSystem::assemble(&model, &[], &FEVec::zeros(12), 1e12).unwrap();
        let mut x = FEVec::zeros(12);
        x[6] = 1e-6;

        let internal = internal_forces(&model, &[], &sys.point_index, &x).unwrap();
        let r = at_dofs(&internal, &sys.constrained_dofs);
        let ea_l = 12e9 * 0.01 / (2.0 + 1e-6);
        assert_relative_eq!(r[0], -ea_l * 1e-6, max_relative = 1e-9);
        assert_relative_eq!(internal[6], ea_l * 1e-6, max_relative = 1e-9);
        assert_eq!(r[6], 0.0);
    }

    #[test]
    fn test_internal_forces_match_stiffness_product() {
        let model = cantilever();
        let index = model.point_index();
        let mut x = FEVec::zeros(12);
        x[7] = -1e-9;
        x[11] = -5e-10;

        let (k, _) = assemble_stiffness(&model, &[], &index, &FEVec::zeros(12)).unwrap();
        // Small displacements: geometry barely moves, so K·x is a close match
        let expected = &k * &x;
        let internal = internal_forces(&model, &[], &index, &x).unwrap();
        for dof in 0..12 {
            assert_relative_eq!(internal[dof], expected[dof], epsilon = 1e-4 * expected.amax());
        }
    }

    #[test]
    fn test_rigid_translation_has_no_internal_force() {
        let mut model = Model::new();
        let h = 3f64.sqrt();
        model.add_point(Point::new(1, 0.0, 0.0, 0.0)).unwrap();
        model.add_point(Point::new(2, 2.0, 0.0, 0.0)).unwrap();
        model.add_point(Point::new(3, 1.0, h, 0.0)).unwrap();
        model.add_member(Member::new(1, 2));
        model.add_member(Member::new(2, 3));
        model.add_member(Member::new(3, 1));

        let x = FEVec::from_fn(18, |dof, _| match dof % 6 {
            0 => 0.123,
            1 => -0.4567,
            2 => 0.089,
            _ => 0.0,
        });
        let internal = internal_forces(&model, &[], &model.point_index(), &x).unwrap();
        assert_eq!(internal, FEVec::zeros(18));
    }

    #[test]
    fn test_reduce_and_expand() {
        let model = cantilever();
        let sys = AssembledSystem::assemble(&model, &[], &FEVec::zeros(12), 1e12).unwrap();
        let reduced = sys.reduce(&sys.f_ext);
        assert_eq!(reduced.len(), 6);
        assert_eq!(reduced.k.shape(), (6, 6));
        assert_eq!(reduced.f[1], -100.0);
        assert_eq!(reduced.k[(0, 0)], sys.k_penalty[(6, 6)]);

        let full = reduced.expand(&FEVec::from_element(6, 2.0), 12);
        assert_eq!(full[0], 0.0);
        assert_eq!(full[6], 2.0);
        assert_eq!(reduced.restrict(&full), FEVec::from_element(6, 2.0));
    }

    #[test]
    fn test_time_varying_forces() {
        let mut model = cantilever();
        model.loads[0] = Load::force(2, 0.0, -100.0, 0.0).with_time_function(TimeFunction::Ramp {
            start: 0.0,
            duration: 1.0,
        });
        let index = model.point_index();
        let base = external_forces(&model, &index);
        let delta = time_varying_forces(&model, &index, 0.5);
        assert_relative_eq!(base[7] + delta[7], -50.0, epsilon = 1e-12);
    }
}
