//! Member force recovery, stress evaluation and brittle failure

use std::collections::{BTreeMap, HashMap};

use log::debug;

use super::assembly::MemberGeometry;
use super::NumericalLimits;
use crate::elements::{FailureMode, Member, MemberState, PointId};
use crate::error::SolverResult;
use crate::math::{self, Vec as FEVec};
use crate::model::Model;
use crate::results::{MemberForces, MemberStresses};

/// Ratio of peak to average shear stress used for every section
pub const SHEAR_FACTOR: f64 = 1.5;

/// Local end forces `k · T · d` of a member at displacement state `x`, with
/// `d` its deformation
pub fn member_end_forces(member: &Member, geom: &MemberGeometry, x: &FEVec) -> SolverResult<[f64; 12]> {
    let mat = &member.material;
    let sec = &member.section;

    let t = math::member_transformation_matrix(&geom.start, &geom.end)?;
    let k_local = math::member_local_stiffness(mat.e, mat.g, sec.a, sec.iy, sec.iz, sec.j, geom.length)?;

    let d_local = t * geom.deformation(x);
    let f_local = k_local * d_local;

    Ok(std::array::from_fn(|i| f_local[i]))
}

/// Forces of every intact member whose length lies within the reporting
/// window of `limits`.
///
/// Member geometry is taken at displacement state `geometry`; the element
/// deformation comes from `d`. The dynamic solver passes the same vector
/// for both, the static solver recovers forces on the undeformed geometry.
pub fn member_forces(
    model: &Model,
    states: &[MemberState],
    point_index: &HashMap<PointId, usize>,
    geometry: &FEVec,
    d: &FEVec,
    limits: &NumericalLimits,
) -> SolverResult<BTreeMap<usize, MemberForces>> {
    let mut forces = BTreeMap::new();

    for (idx, member) in model.members.iter().enumerate() {
        if states.get(idx).is_some_and(|s| s.is_broken) {
            continue;
        }
        let Some(geom) = MemberGeometry::resolve(model, member, point_index, geometry) else {
            continue;
        };
        if !(limits.min_force_length..=limits.max_force_length).contains(&geom.length) {
            continue;
        }

        let f = member_end_forces(member, &geom, d)?;
        forces.insert(idx, MemberForces::from_i_node_forces(&f));
    }

    Ok(forces)
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

fn guarded_div(num: f64, den: f64) -> f64 {
    if den > 0.0 {
        finite_or_zero(num / den)
    } else {
        0.0
    }
}

/// Stresses in a member from its start-end forces
pub fn member_stresses(member: &Member, forces: &MemberForces) -> MemberStresses {
    let sec = &member.section;

    let axial = guarded_div(forces.axial, sec.a);
    let shear = guarded_div(forces.shear, SHEAR_FACTOR * sec.a);
    let bending = if sec.a > 0.0 {
        let about_z = guarded_div(forces.moment * sec.y_max, sec.iz).abs();
        let about_y = guarded_div(forces.moment * sec.z_max, sec.iy).abs();
        about_z.max(about_y)
    } else {
        0.0
    };

    MemberStresses {
        tensile: axial.max(0.0),
        compressive: (-axial).max(0.0),
        shear: shear.abs(),
        bending,
    }
}

/// Stresses for every member that has forces
pub fn all_member_stresses(
    model: &Model,
    forces: &BTreeMap<usize, MemberForces>,
) -> BTreeMap<usize, MemberStresses> {
    forces
        .iter()
        .map(|(&idx, f)| (idx, member_stresses(&model.members[idx], f)))
        .collect()
}

/// Governing failure mode, checked in the order tensile, compressive,
/// shear, bending. The first stress-to-strength ratio above 1 wins.
pub fn governing_failure(
    member: &Member,
    stresses: &MemberStresses,
    threshold: f64,
) -> Option<FailureMode> {
    if stresses.max() < threshold {
        return None;
    }

    let mat = &member.material;
    [
        (FailureMode::Tensile, stresses.tensile, mat.tensile_strength),
        (FailureMode::Compressive, stresses.compressive, mat.compressive_strength),
        (FailureMode::Shear, stresses.shear, mat.shear_strength),
        (FailureMode::Bending, stresses.bending, mat.bending_strength),
    ]
    .into_iter()
    .find(|&(_, stress, strength)| guarded_div(stress, strength) > 1.0)
    .map(|(mode, _, _)| mode)
}

/// Break every intact member whose stresses exceed its strengths.
///
/// Returns the indices of members that broke at `time`.
pub fn check_failures(
    model: &Model,
    states: &mut [MemberState],
    stresses: &BTreeMap<usize, MemberStresses>,
    time: f64,
    threshold: f64,
) -> Vec<usize> {
    let mut newly_broken = Vec::new();

    for (&idx, s) in stresses {
        let Some(state) = states.get_mut(idx) else {
            continue;
        };
        if state.is_broken {
            continue;
        }
        if let Some(mode) = governing_failure(&model.members[idx], s, threshold) {
            if state.break_at(time, mode) {
                debug!("member {idx} failed in {mode:?} at t={time:.4}");
                newly_broken.push(idx);
            }
        }
    }

    newly_broken
}
