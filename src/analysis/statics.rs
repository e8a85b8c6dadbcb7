//! Linear static analysis with structural diagnostics
//!
//! The stiffness is assembled once at the undeformed geometry. Supports are
//! applied by elimination and the rank of the reduced matrix is checked
//! before solving, so mechanisms are reported instead of producing garbage.

use log::{info, warn};

use super::assembly::{self, current_position};
use super::failure;
use super::NumericalLimits;
use crate::elements::MemberState;
use crate::error::SolverResult;
use crate::math::{self, LinearSolve, Mat, Vec as FEVec};
use crate::model::{Model, DOFS_PER_POINT};
use crate::results::{Frame, Results};
use crate::units::UnitSystem;

/// Displacement magnitude above which a static result is flagged
pub const LARGE_DISPLACEMENT: f64 = 1e6;

/// Zero the rows and columns of constrained DOFs, put 1 on the diagonal
/// and clear the matching load entries
pub fn apply_elimination(k: &mut Mat, f: &mut FEVec, constrained: &[usize]) {
    for &dof in constrained {
        k.row_mut(dof).fill(0.0);
        k.column_mut(dof).fill(0.0);
        k[(dof, dof)] = 1.0;
        f[dof] = 0.0;
    }
}

/// Geometry problems in the member list.
///
/// Every member with a missing end point is reported; zero-length checking
/// stops at the first offender.
fn member_diagnostics(model: &Model) -> Vec<String> {
    let mut issues = Vec::new();

    for (idx, member) in model.members.iter().enumerate() {
        let start = model.point(member.start);
        let end = model.point(member.end);
        if start.is_none() {
            issues.push(format!("Member {idx} references missing point {}", member.start));
        }
        if end.is_none() {
            issues.push(format!("Member {idx} references missing point {}", member.end));
        }

        if let (Some(a), Some(b)) = (start, end) {
            if a.distance_to(b) == 0.0 {
                issues.push(format!("Member {idx} has zero length"));
                break;
            }
        }
    }

    issues
}

/// Solve the elimination system, reporting rank deficiency
fn solve_displacements(k: &Mat, f: &FEVec, issues: &mut Vec<String>) -> FEVec {
    let n = k.nrows();
    let rank = math::numerical_rank(k);

    let solution = if rank < n {
        warn!("static solve: stiffness rank {rank} of {n}");
        issues.push(format!(
            "Structure is unstable or under-constrained (singular stiffness matrix, rank {rank} of {n})"
        ));
        math::solve_least_squares(k, f)
    } else {
        match math::solve_with_fallback(k, f) {
            LinearSolve::Exact(d) => Some(d),
            LinearSolve::LeastSquares(d) => {
                warn!("static solve: LU failed on a full-rank matrix, using least squares");
                issues.push(format!(
                    "Structure is unstable or under-constrained (singular stiffness matrix, rank {rank} of {n})"
                ));
                Some(d)
            }
            LinearSolve::Singular => None,
        }
    };

    solution
        .filter(|d| d.iter().all(|v| v.is_finite()))
        .unwrap_or_else(|| {
            issues.push("Static solution could not be computed".to_string());
            FEVec::zeros(n)
        })
}

/// Run a linear static analysis of `model`.
///
/// Returns results holding a single frame at `t = 0` together with the
/// diagnostics collected along the way. The same strings are attached to
/// the frame's `issues`.
pub fn solve_with_diagnostics(model: &Model) -> SolverResult<(Results, Vec<String>)> {
    model.validate()?;

    let intact = vec![MemberState::default(); model.members.len()];
    let class = model.system_class();
    let n = model.num_dofs();

    if n == 0 {
        info!("static solve: empty model");
        let results = Results::new(vec![Frame::default()], UnitSystem::default(), intact, class);
        return Ok((results, Vec::new()));
    }

    info!(
        "static solve: {} points, {} members, {} supports",
        model.points.len(),
        model.members.len(),
        model.supports.len()
    );

    let point_index = model.point_index();
    let undeformed = FEVec::zeros(n);
    let (k_elastic, _) = assembly::assemble_stiffness(model, &intact, &point_index, &undeformed)?;
    let f_ext = assembly::external_forces(model, &point_index);
    let constrained = assembly::constrained_dofs(model, &point_index);

    let mut k = k_elastic.clone();
    let mut f = f_ext.clone();
    apply_elimination(&mut k, &mut f, &constrained);

    let mut issues = Vec::new();
    let d = solve_displacements(&k, &f, &mut issues);

    let max_disp = d.amax();
    if max_disp > LARGE_DISPLACEMENT {
        issues.push(format!("Very large displacements detected: {max_disp:.3e}"));
    }
    if model.supports.is_empty() {
        issues.push("No supports defined".to_string());
    }
    issues.extend(member_diagnostics(model));

    let reactions = assembly::at_dofs(&(&k_elastic * &d - &f_ext), &constrained);

    let limits = NumericalLimits::default();
    let forces = failure::member_forces(model, &intact, &point_index, &undeformed, &d, &limits)?;
    let stresses = failure::all_member_stresses(model, &forces);

    let mut frame = Frame {
        time: 0.0,
        member_forces: forces,
        member_stresses: stresses,
        issues: issues.clone(),
        ..Default::default()
    };
    for (idx, point) in model.points.iter().enumerate() {
        let values = |v: &FEVec| -> [f64; 6] { std::array::from_fn(|c| v[idx * DOFS_PER_POINT + c]) };
        frame.positions.insert(point.id, current_position(model, idx, &d));
        frame.displacements.insert(point.id, values(&d));
        frame.velocities.insert(point.id, [0.0; 6]);
        frame.accelerations.insert(point.id, [0.0; 6]);
        if (0..DOFS_PER_POINT).any(|k| constrained.binary_search(&(idx * DOFS_PER_POINT + k)).is_ok()) {
            frame.reactions.insert(point.id, values(&reactions));
        }
    }

    info!("static solve finished: max displacement {max_disp:.3e}, {} issues", issues.len());
    let results = Results::new(vec![frame], UnitSystem::default(), intact, class);
    Ok((results, issues))
}
