//! Dynamic analysis with progressive member failure
//!
//! Equations of motion `M·a = F − K·x − C·v` are integrated with
//! semi-implicit Euler, `v' = v + a·dt` and `x' = x + v'·dt`. Elastic and
//! damping forces are taken at the end of the step, so each step solves
//!
//! ```text
//! (M + dt·C + dt²·K) · v' = M·v + dt·(F − f_int(x))
//! ```
//!
//! where `f_int` sums the member forces of the current deformation. A rigid
//! translation produces no internal force, and stiff axial modes stay
//! bounded for any step. Stiffness and mass are re-assembled at the current
//! geometry every step, so large rigid-body motion is followed.

use std::collections::{BTreeMap, HashMap};

use log::{debug, info, warn};

use super::assembly::{self, current_position, AssembledSystem};
use super::damping::RayleighDamping;
use super::failure;
use super::DynamicOptions;
use crate::elements::{MemberState, PointId};
use crate::error::SolverResult;
use crate::math::{self, Vec as FEVec};
use crate::model::{Model, DOFS_PER_POINT};
use crate::results::{Frame, MemberForces, MemberStresses, Results, SystemClass};

/// Run a dynamic analysis of `model`.
///
/// Every run starts with all members intact; the final member states are
/// returned in [`Results::member_states`]. The model itself is not modified.
pub fn solve(model: &Model, options: &DynamicOptions) -> SolverResult<Results> {
    options.validate()?;
    model.validate()?;

    let class = model.system_class();
    if model.points.is_empty() {
        info!("dynamic solve: empty model, nothing to integrate");
        return Ok(Results::new(
            Vec::new(),
            options.unit_system,
            vec![MemberState::default(); model.members.len()],
            class,
        ));
    }

    Integrator::new(model, options).run()
}

/// Per-step kinematic state produced by one integration update
struct StepState {
    x: FEVec,
    v: FEVec,
    a: FEVec,
}

/// Integration state for a single run
struct Integrator<'a> {
    model: &'a Model,
    options: &'a DynamicOptions,
    class: SystemClass,
    damping: RayleighDamping,
    point_index: HashMap<PointId, usize>,
    states: Vec<MemberState>,
    broken: Vec<usize>,
    x: FEVec,
    v: FEVec,
}

impl<'a> Integrator<'a> {
    fn new(model: &'a Model, options: &'a DynamicOptions) -> Self {
        let point_index = model.point_index();
        let n = model.num_dofs();

        let mut x = FEVec::zeros(n);
        for (id, disp) in &options.initial_displacements {
            match point_index.get(id) {
                Some(&idx) => {
                    for (k, value) in disp.iter().enumerate() {
                        x[idx * DOFS_PER_POINT + k] = *value;
                    }
                }
                None => warn!("initial displacement given for unknown point {id}; ignored"),
            }
        }

        let damping = RayleighDamping::from_damping_ratio(options.damping_ratio);
        debug!("Rayleigh damping: alpha={:.6}, beta={:.6e}", damping.alpha, damping.beta);

        Self {
            model,
            options,
            class: model.system_class(),
            damping,
            point_index,
            states: vec![MemberState::default(); model.members.len()],
            broken: Vec::new(),
            x,
            v: FEVec::zeros(n),
        }
    }

    fn run(mut self) -> SolverResult<Results> {
        let num_steps = self.options.num_steps();
        info!(
            "dynamic solve: {} points, {} members, {} steps of {} s, {:?} system",
            self.model.points.len(),
            self.model.members.len(),
            num_steps,
            self.options.step,
            self.class
        );

        let mut frames = Vec::new();
        for i in 0..num_steps {
            let t = i as f64 * self.options.step;
            let (frame, runaway) = self.step(i, t)?;
            frames.push(frame);
            if runaway {
                warn!("stopping at t={t:.4}: displacements exceeded the runaway limit");
                break;
            }
        }

        info!(
            "dynamic solve finished: {} frames, {} broken members",
            frames.len(),
            self.broken.len()
        );
        Ok(Results::new(frames, self.options.unit_system, self.states, self.class))
    }

    fn step(&mut self, i: usize, t: f64) -> SolverResult<(Frame, bool)> {
        let mut issues = Vec::new();
        let limits = &self.options.limits;

        let system = AssembledSystem::assemble(self.model, &self.states, &self.x, limits.penalty_stiffness)?;
        let f_int = assembly::internal_forces(self.model, &self.states, &self.point_index, &self.x)?;
        let f = &system.f_ext
            + assembly::time_varying_forces(self.model, &self.point_index, t)
            + self.gravity_forces(&system)
            - f_int;

        let next = match self.class {
            SystemClass::Unconstrained => self.advance_full(&system, &f, t, &mut issues),
            SystemClass::Constrained => self.advance_reduced(&system, &f, t, &mut issues),
        };
        let (next, runaway) = self.enforce_limits(next, t, &mut issues);

        let reactions = self.reactions(&system.constrained_dofs, &next.x, t, &mut issues);

        let forces = failure::member_forces(self.model, &self.states, &self.point_index, &next.x, &next.x, limits)?;
        let stresses = failure::all_member_stresses(self.model, &forces);
        let newly_broken =
            failure::check_failures(self.model, &mut self.states, &stresses, t, limits.stress_threshold);
        self.broken.extend(newly_broken);

        let frame = self.frame(i, t, &next, &reactions, &system.constrained_dofs, forces, stresses, issues);

        self.x = next.x;
        self.v = next.v;
        Ok((frame, runaway))
    }

    /// Weight of every point on its unconstrained vertical DOF
    fn gravity_forces(&self, system: &AssembledSystem) -> FEVec {
        let g = self.options.gravity();
        let mut f = FEVec::zeros(self.model.num_dofs());
        if g == 0.0 {
            return f;
        }
        for idx in 0..self.model.points.len() {
            let dof = idx * DOFS_PER_POINT + 1;
            if !system.is_constrained(dof) {
                f[dof] = -system.m_full[(dof, dof)] * g;
            }
        }
        f
    }

    /// Velocity at the end of a step from the effective system
    /// `(M + dt·C + dt²·K)·v' = M·v + dt·r`, where `r` is the out-of-balance
    /// force. A singular system leaves the velocity unchanged.
    fn end_velocity(
        &self,
        m: &math::Mat,
        k: &math::Mat,
        v: &FEVec,
        r: &FEVec,
        t: f64,
        issues: &mut Vec<String>,
    ) -> FEVec {
        let dt = self.options.step;
        let c = self.damping.matrix(m, k);
        let effective = m + c * dt + k * (dt * dt);
        let rhs = m * v + r * dt;

        match math::solve_linear_system(&effective, &rhs) {
            Some(v_new) => v_new,
            None => {
                warn!("singular system matrix at t={t:.4}");
                issues.push(format!("Singular system matrix at time {t:.4}"));
                v.clone()
            }
        }
    }

    /// Integrate the full system (no support records).
    ///
    /// `r` is the out-of-balance force `F − f_int(x)`.
    fn advance_full(&self, system: &AssembledSystem, r: &FEVec, t: f64, issues: &mut Vec<String>) -> StepState {
        let dt = self.options.step;
        let v = self.end_velocity(&system.m_full, &system.k_penalty, &self.v, r, t, issues);
        let a = (&v - &self.v) / dt;
        let x = &self.x + &v * dt;

        StepState { x, v, a }
    }

    /// Integrate only the free DOFs and scatter back; constrained DOFs stay zero
    fn advance_reduced(&self, system: &AssembledSystem, r: &FEVec, t: f64, issues: &mut Vec<String>) -> StepState {
        let n = self.model.num_dofs();
        let reduced = system.reduce(r);
        if reduced.is_empty() {
            return StepState {
                x: FEVec::zeros(n),
                v: FEVec::zeros(n),
                a: FEVec::zeros(n),
            };
        }

        let dt = self.options.step;
        let x_r = reduced.restrict(&self.x);
        let v_r = reduced.restrict(&self.v);

        let v_new = self.end_velocity(&reduced.m, &reduced.k, &v_r, &reduced.f, t, issues);
        let a_r = (&v_new - &v_r) / dt;
        let x_r = x_r + &v_new * dt;

        StepState {
            x: reduced.expand(&x_r, n),
            v: reduced.expand(&v_new, n),
            a: reduced.expand(&a_r, n),
        }
    }

    /// Scrub non-finite values, clip to the configured ceilings and detect
    /// runaway motion. Runaway is judged on the unclipped displacement.
    fn enforce_limits(&self, mut next: StepState, t: f64, issues: &mut Vec<String>) -> (StepState, bool) {
        let limits = &self.options.limits;

        if scrub_non_finite(&mut next.v) {
            issues.push(format!("Numerical instability in velocity at time {t:.4}"));
        }
        if scrub_non_finite(&mut next.x) {
            issues.push(format!("Numerical instability in displacement at time {t:.4}"));
        }
        scrub_non_finite(&mut next.a);

        let max_disp = next.x.amax();

        if next.v.amax() > limits.max_velocity {
            issues.push(format!("Velocity limited at time {t:.4}"));
            clamp_abs(&mut next.v, limits.max_velocity);
        }
        if max_disp > limits.max_displacement {
            issues.push(format!("Displacement limited at time {t:.4}"));
            clamp_abs(&mut next.x, limits.max_displacement);
        }

        let runaway = max_disp > limits.runaway_displacement;
        if runaway {
            issues.push(format!(
                "Very large displacements detected at time {t:.4}: {max_disp:.3e}"
            ));
        }

        (next, runaway)
    }

    /// Support reactions: internal member forces at the new geometry, read
    /// at the constrained DOFs
    fn reactions(&self, constrained: &[usize], x: &FEVec, t: f64, issues: &mut Vec<String>) -> FEVec {
        if constrained.is_empty() {
            return FEVec::zeros(x.len());
        }
        match assembly::internal_forces(self.model, &self.states, &self.point_index, x) {
            Ok(internal) => {
                let r = assembly::at_dofs(&internal, constrained);
                if r.iter().all(|c| c.is_finite()) {
                    r
                } else {
                    issues.push(format!("Numerical instability in reactions at time {t:.4}"));
                    FEVec::zeros(x.len())
                }
            }
            Err(e) => {
                warn!("reaction evaluation failed at t={t:.4}: {e}");
                issues.push(format!("Error calculating reactions at time {t:.4}: {e}"));
                FEVec::zeros(x.len())
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn frame(
        &self,
        i: usize,
        t: f64,
        next: &StepState,
        reactions: &FEVec,
        constrained: &[usize],
        member_forces: BTreeMap<usize, MemberForces>,
        member_stresses: BTreeMap<usize, MemberStresses>,
        issues: Vec<String>,
    ) -> Frame {
        let mut frame = Frame {
            time: t,
            member_forces,
            member_stresses,
            broken_members: self.broken.clone(),
            issues,
            ..Default::default()
        };

        for (idx, point) in self.model.points.iter().enumerate() {
            frame.positions.insert(point.id, current_position(self.model, idx, &next.x));
            frame.displacements.insert(point.id, point_values(&next.x, idx));
            // The first frame reports the structure at rest
            let velocity = if i == 0 { [0.0; 6] } else { point_values(&next.v, idx) };
            frame.velocities.insert(point.id, velocity);
            frame.accelerations.insert(point.id, point_values(&next.a, idx));

            let supported = (0..DOFS_PER_POINT)
                .any(|k| constrained.binary_search(&(idx * DOFS_PER_POINT + k)).is_ok());
            if supported {
                frame.reactions.insert(point.id, point_values(reactions, idx));
            }
        }

        frame
    }
}

/// Six DOF values of point `idx`
fn point_values(v: &FEVec, idx: usize) -> [f64; 6] {
    std::array::from_fn(|k| v[idx * DOFS_PER_POINT + k])
}

/// Replace NaN/Inf entries with zero, reporting whether any were found
fn scrub_non_finite(v: &mut FEVec) -> bool {
    let mut found = false;
    v.apply(|c| {
        if !c.is_finite() {
            *c = 0.0;
            found = true;
        }
    });
    found
}

fn clamp_abs(v: &mut FEVec, limit: f64) {
    v.apply(|c| *c = c.clamp(-limit, limit));
}
