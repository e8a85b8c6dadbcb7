//! Lightweight trajectory simulation

use log::{debug, info};

use super::{dynamic, DynamicOptions, STANDARD_GRAVITY};
use crate::error::SolverResult;
use crate::loads::LoadKind;
use crate::model::Model;
use crate::results::{KinematicFrame, PointSnapshot};

/// Whether the model falls freely: no supports and nothing but gravity loads
pub fn is_free_fall(model: &Model) -> bool {
    model.supports.is_empty() && model.loads.iter().all(|l| l.kind == LoadKind::Gravity)
}

/// Simulate point trajectories over `simulation_time` seconds.
///
/// A freely falling model is evaluated analytically; anything else runs the
/// full dynamic solver with default damping and gravity and keeps only the
/// point positions and velocities.
pub fn simulate_dynamics(model: &Model, step: f64, simulation_time: f64) -> SolverResult<Vec<KinematicFrame>> {
    let options = DynamicOptions::new(step, simulation_time);
    options.validate()?;
    model.validate()?;

    if is_free_fall(model) {
        debug!("kinematic simulation: analytic free fall");
        return Ok(free_fall(model, &options));
    }

    info!("kinematic simulation: running dynamic solve");
    let results = dynamic::solve(model, &options)?;

    let frames = results
        .frames
        .iter()
        .map(|frame| KinematicFrame {
            time: frame.time,
            points: model
                .points
                .iter()
                .filter_map(|p| {
                    let pos = frame.positions.get(&p.id)?;
                    let vel = frame.velocities.get(&p.id)?;
                    Some(PointSnapshot {
                        id: p.id,
                        x: pos[0],
                        y: pos[1],
                        z: pos[2],
                        vx: vel[0],
                        vy: vel[1],
                        vz: vel[2],
                    })
                })
                .collect(),
        })
        .collect();

    Ok(frames)
}

fn free_fall(model: &Model, options: &DynamicOptions) -> Vec<KinematicFrame> {
    let g = STANDARD_GRAVITY;
    (0..options.num_steps())
        .map(|i| {
            let t = i as f64 * options.step;
            KinematicFrame {
                time: t,
                points: model
                    .points
                    .iter()
                    .map(|p| PointSnapshot {
                        id: p.id,
                        x: p.x,
                        y: p.y - 0.5 * g * t * t,
                        z: p.z,
                        vx: 0.0,
                        vy: -g * t,
                        vz: 0.0,
                    })
                    .collect(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::{Point, Support};
    use crate::loads::Load;
    use approx::assert_relative_eq;

    fn dropped_pair() -> Model {
        let mut model = Model::new();
        model.add_point(Point::new(1, 0.0, 5.0, 0.0).with_mass(2.0)).unwrap();
        model.add_point(Point::new(2, 1.0, 5.0, 0.0).with_mass(2.0)).unwrap();
        model
    }

    #[test]
    fn test_free_fall_is_analytic() {
        let mut model = dropped_pair();
        model.add_load(Load::gravity(1, 2.0, STANDARD_GRAVITY));
        assert!(is_free_fall(&model));

        let frames = simulate_dynamics(&model, 0.1, 1.0).unwrap();
        assert_eq!(frames.len(), 11);

        let last = frames.last().unwrap();
        assert_relative_eq!(last.time, 1.0, epsilon = 1e-12);
        for p in &last.points {
            assert_relative_eq!(p.y, 5.0 - 0.5 * STANDARD_GRAVITY, epsilon = 1e-12);
            assert_relative_eq!(p.vy, -STANDARD_GRAVITY, epsilon = 1e-12);
        }
        assert_eq!(last.points[1].x, 1.0);
    }

    #[test]
    fn test_supported_model_uses_dynamic_solver() {
        let mut model = dropped_pair();
        model.add_support(Support::fixed(1));
        assert!(!is_free_fall(&model));

        let frames = simulate_dynamics(&model, 0.01, 0.1).unwrap();
        assert_eq!(frames.len(), 11);
        let last = frames.last().unwrap();
        let fixed = last.points.iter().find(|p| p.id == 1).unwrap();
        assert_eq!((fixed.x, fixed.y, fixed.vy), (0.0, 5.0, 0.0));
        let free = last.points.iter().find(|p| p.id == 2).unwrap();
        assert!(free.y < 5.0);
    }

    #[test]
    fn test_nodal_load_disables_shortcut() {
        let mut model = dropped_pair();
        model.add_load(Load::force(2, 10.0, 0.0, 0.0));
        assert!(!is_free_fall(&model));

        let frames = simulate_dynamics(&model, 0.01, 0.05).unwrap();
        let last = frames.last().unwrap();
        assert!(last.points[1].x > 1.0);
    }

    #[test]
    fn test_invalid_step_rejected() {
        assert!(simulate_dynamics(&dropped_pair(), 0.0, 1.0).is_err());
    }
}
