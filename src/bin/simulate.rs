//! Command line driver: reads an analysis request as JSON and prints the results
//!
//! ```text
//! timber-sim request.json > results.json
//! ```
//!
//! The request has the form
//! `{"model": {...}, "analysis": {"type": "dynamic", "step": 0.01, ...}}`.
//! Set `RUST_LOG=info` to see solver progress on stderr.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};

use timber_solver::prelude::*;

const ABOUT: &str = "Run a static, dynamic or kinematic analysis of a timber frame.";

#[derive(Parser, Debug)]
#[clap(author, about = ABOUT, name = "timber-sim")]
struct Opt {
    /// JSON file holding the model and the analysis settings
    #[clap(name = "REQUEST", parse(from_os_str))]
    request: PathBuf,
}

#[derive(Debug, Deserialize)]
struct AnalysisRequest {
    model: Model,
    #[serde(default)]
    analysis: AnalysisSettings,
}

#[derive(Debug, Default, Deserialize)]
struct AnalysisSettings {
    #[serde(rename = "type", default)]
    analysis_type: AnalysisType,
    #[serde(flatten)]
    options: DynamicOptions,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum AnalysisResponse {
    Static { results: Results, issues: Vec<String> },
    Dynamic { results: Results },
    Kinematic { frames: Vec<KinematicFrame> },
}

fn run(request: AnalysisRequest) -> Result<AnalysisResponse> {
    let AnalysisRequest { model, analysis } = request;
    let options = analysis.options;

    let response = match analysis.analysis_type {
        AnalysisType::Static => {
            let (mut results, issues) = solve_with_diagnostics(&model)?;
            results.unit_system = options.unit_system;
            AnalysisResponse::Static { results, issues }
        }
        AnalysisType::Dynamic => AnalysisResponse::Dynamic {
            results: solve(&model, &options)?,
        },
        AnalysisType::Kinematic => AnalysisResponse::Kinematic {
            frames: simulate_dynamics(&model, options.step, options.simulation_time)?,
        },
    };
    Ok(response)
}

fn try_main() -> Result<()> {
    env_logger::init();

    let opt = Opt::parse();
    let path = opt.request;

    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read request file {}", path.display()))?;
    let request: AnalysisRequest = serde_json::from_str(&json)
        .with_context(|| format!("failed to parse request file {}", path.display()))?;
    request.model.validate()?;

    let response = run(request)?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

fn main() {
    if let Err(err) = try_main() {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REQUEST: &str = r#"{
        "model": {
            "points": [{"id": 1, "x": 0.0, "y": 0.0, "z": 0.0}]
        },
        "analysis": {"type": "kinematic", "step": 0.1, "simulation_time": 0.5}
    }"#;

    #[test]
    fn test_request_path_is_positional() {
        let opt = Opt::try_parse_from(["timber-sim", "request.json"]).unwrap();
        assert_eq!(opt.request, PathBuf::from("request.json"));
    }

    #[test]
    fn test_missing_request_is_rejected() {
        assert!(Opt::try_parse_from(["timber-sim"]).is_err());
    }

    #[test]
    fn test_kinematic_request_runs() {
        let request: AnalysisRequest = serde_json::from_str(REQUEST).unwrap();
        match run(request).unwrap() {
            AnalysisResponse::Kinematic { frames } => assert_eq!(frames.len(), 6),
            other => panic!("unexpected response {other:?}"),
        }
    }
}
