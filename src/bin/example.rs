//! Timber solver example - cantilever and falling frame

use anyhow::{Context, Result};

use timber_solver::prelude::*;

fn cantilever(length: f64, tip_load: f64) -> Result<Model> {
    let mut model = Model::new();
    model.add_point(Point::new(1, 0.0, 0.0, 0.0))?;
    model.add_point(Point::new(2, length, 0.0, 0.0))?;
    model.add_member(Member::new(1, 2).with_section(Section::rectangular(0.1, 0.2)));
    model.add_support(Support::fixed(1));
    model.add_load(Load::force(2, 0.0, tip_load, 0.0));
    Ok(model)
}

//     3
//    / \
//   /   \
//  1-----2     dropped from 5 m, no supports
fn falling_triangle() -> Result<Model> {
    let mut model = Model::new();
    let h = 3f64.sqrt();
    model.add_point(Point::new(1, 0.0, 5.0, 0.0))?;
    model.add_point(Point::new(2, 2.0, 5.0, 0.0))?;
    model.add_point(Point::new(3, 1.0, 5.0 + h, 0.0))?;
    model.add_member(Member::new(1, 2));
    model.add_member(Member::new(2, 3));
    model.add_member(Member::new(3, 1));
    Ok(model)
}

fn main() -> Result<()> {
    env_logger::init();

    println!("=== Timber Solver Example ===\n");

    // Static: 2 m wood cantilever with a 1 kN tip load
    let model = cantilever(2.0, -1000.0)?;
    let (results, issues) = model.solve_with_diagnostics()?;
    let frame = results.final_frame().context("static solve returned no frame")?;

    println!("Cantilever (static)");
    let tip = frame.displacements[&2];
    println!("  Tip: DY={:.3}mm, RZ={:.6}rad", tip[1] * 1000.0, tip[5]);
    let root = frame.reactions[&1];
    println!("  Root reaction: FY={:.3}kN, MZ={:.3}kN·m", root[1] / 1000.0, root[5] / 1000.0);
    if let Some(stress) = frame.member_stresses.get(&0) {
        let strength = Material::wood().bending_strength;
        println!(
            "  Bending stress: {:.2}MPa ({:.0}% of strength)",
            stress.bending / 1e6,
            stress.bending / strength * 100.0
        );
    }
    for issue in &issues {
        println!("  Issue: {issue}");
    }

    // Dynamic: unsupported triangle under gravity
    println!("\nFalling triangle (dynamic)");
    let model = falling_triangle()?;
    let options = DynamicOptions::new(0.001, 0.5);
    let results = model.solve(&options)?;

    println!("  System: {:?}, frames: {}", results.system, results.total_frames);
    for t in [0.1, 0.25, 0.5] {
        if let Some(frame) = results.frame_at_time(t) {
            let y = frame.positions[&1][1];
            let vy = frame.velocities[&1][1];
            println!(
                "  t={:.2}s: point 1 at y={:.4}m, vy={:.4}m/s, max displacement {:.4}m",
                frame.time,
                y,
                vy,
                frame.max_displacement()
            );
        }
    }
    println!("  Broken members: {:?}", results.broken_members());
    for issue in results.issues() {
        println!("  Issue: {issue}");
    }

    // Kinematic shortcut: same points, nothing but gravity
    let frames = model.simulate_dynamics(0.1, 0.5)?;
    if let Some(last) = frames.last() {
        println!("\nAnalytic free fall after {:.1}s:", last.time);
        for p in &last.points {
            println!("  point {}: y={:.4}m, vy={:.4}m/s", p.id, p.y, p.vy);
        }
    }

    println!("\n=== Example Complete ===");
    Ok(())
}
