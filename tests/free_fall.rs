use approx::assert_relative_eq;
use timber_solver::prelude::*;

fn dropped_point() -> Model {
    let mut model = Model::new();
    model.add_point(Point::new(1, 0.0, 0.0, 0.0)).unwrap();
    model
}

/// Error of the final vertical displacement against ½gt²
fn fall_error(step: f64) -> f64 {
    let options = DynamicOptions::new(step, 0.5).with_damping_ratio(0.0);
    let results = solve(&dropped_point(), &options).unwrap();
    let last = results.final_frame().unwrap();
    let exact = -0.5 * STANDARD_GRAVITY * last.time * last.time;
    (last.displacements[&1][1] - exact).abs()
}

#[test]
fn free_fall_matches_analytic_solution() {
    let options = DynamicOptions::new(0.001, 0.5).with_damping_ratio(0.0);
    let results = solve(&dropped_point(), &options).unwrap();

    for frame in results.frames.iter().skip(1) {
        let t = frame.time;
        assert_relative_eq!(frame.velocities[&1][1], -STANDARD_GRAVITY * t, epsilon = 0.02);
        assert_relative_eq!(frame.displacements[&1][1], -0.5 * STANDARD_GRAVITY * t * t, epsilon = 0.01);
    }
}

#[test]
fn free_fall_error_shrinks_with_step() {
    let coarse = fall_error(0.01);
    let fine = fall_error(0.001);
    assert!(fine < coarse, "coarse {coarse}, fine {fine}");
    assert!(fine < 0.01);
}

#[test]
fn classification_follows_support_records() {
    let model = dropped_point();
    let options = DynamicOptions::new(0.01, 0.05);
    assert_eq!(solve(&model, &options).unwrap().system, SystemClass::Unconstrained);

    let mut supported = model.clone();
    supported.add_support(Support::new(1));
    let results = solve(&supported, &options).unwrap();
    assert_eq!(results.system, SystemClass::Constrained);
    assert!(results.final_frame().unwrap().displacements[&1][1] < 0.0);
}

#[test]
fn kinematic_shortcut_is_exact() {
    let mut model = dropped_point();
    model.add_load(Load::gravity(1, 1.0, STANDARD_GRAVITY));

    let frames = simulate_dynamics(&model, 0.05, 0.5).unwrap();
    assert_eq!(frames.len(), 11);
    for frame in &frames {
        let p = &frame.points[0];
        let t = frame.time;
        assert_relative_eq!(p.y, -0.5 * STANDARD_GRAVITY * t * t, epsilon = 1e-12);
        assert_relative_eq!(p.vy, -STANDARD_GRAVITY * t, epsilon = 1e-12);
    }
}

#[test]
fn model_from_json_runs_dynamic_analysis() {
    let json = r#"{
        "points": [
            {"id": 1, "x": 0.0, "y": 0.0, "z": 0.0},
            {"id": 2, "x": 0.0, "y": 2.0, "z": 0.0, "mass": 300.0}
        ],
        "members": [{"start": 1, "end": 2}],
        "supports": [{"point": 1, "ux": true, "uy": true, "uz": true,
                      "rx": true, "ry": true, "rz": true}],
        "loads": [{"point": 2, "fx": 200.0,
                   "time_function": {"type": "ramp", "start": 0.0, "duration": 0.05}}]
    }"#;
    let model = Model::from_json(json).unwrap();

    let options = DynamicOptions::new(0.001, 0.1).with_unit_system(UnitSystem::Imperial);
    let results = model.solve(&options).unwrap();

    assert_eq!(results.unit_system, UnitSystem::Imperial);
    assert_relative_eq!(results.final_time, 0.1, epsilon = 1e-9);
    let last = results.final_frame().unwrap();
    assert!(last.displacements[&2][0] > 0.0);
    assert!(last.reactions.contains_key(&1));
    assert!(!last.reactions.contains_key(&2));
    assert!(last.member_forces.contains_key(&0));

    let encoded = serde_json::to_string(&results).unwrap();
    let decoded: Results = serde_json::from_str(&encoded).unwrap();
    assert_eq!(decoded.total_frames, results.total_frames);
}
