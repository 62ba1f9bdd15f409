use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};

use risk_mc::api::{ScenarioRequest, ScenarioResponse, SimulationRequest, SimulationResponse};
use risk_mc::io::{
    ensure_outdir, write_json, write_manifest_json, write_samples_csv, Manifest,
    OUTPUT_SCHEMA_VERSION,
};
use risk_mc::runner::run_simulation;
use risk_mc::scenario::run_scenario_set;
use risk_mc::settings::EngineSettings;

#[derive(Debug, Parser)]
#[command(name = "risk-mc")]
#[command(about = "Correlation-aware Monte Carlo risk simulation for project contingency analysis")]
struct Cli {
    /// JSON request document (a risk register, or a scenario set with --scenarios).
    #[arg(long)]
    request: PathBuf,

    #[arg(long, default_value = "output-risk-mc")]
    outdir: PathBuf,

    /// Engine tuning TOML; defaults to configs/engine.toml when present.
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Overrides the request's random seed.
    #[arg(long)]
    seed: Option<u64>,

    /// Overrides the request's iteration count.
    #[arg(long)]
    iterations: Option<usize>,

    /// Treat the request as a named scenario set and compare the runs.
    #[arg(long, default_value_t = false)]
    scenarios: bool,
}

fn resolve_settings(cli_settings: Option<&Path>) -> Result<EngineSettings> {
    if let Some(path) = cli_settings {
        return EngineSettings::from_toml_file(path);
    }

    let local = PathBuf::from("configs").join("engine.toml");
    if local.exists() {
        return EngineSettings::from_toml_file(&local);
    }

    let bundled = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("configs")
        .join("engine.toml");
    if bundled.exists() {
        return EngineSettings::from_toml_file(&bundled);
    }

    Ok(EngineSettings::default())
}

fn resolve_run_output_dir(base_outdir: &Path) -> Result<PathBuf> {
    ensure_outdir(base_outdir)?;

    let stamp = Utc::now().format("%Y%m%d_%H%M%S").to_string();
    let mut candidate = base_outdir.join(&stamp);
    let mut suffix = 1usize;
    while candidate.exists() {
        if suffix > 999 {
            bail!(
                "failed to allocate unique run output directory under {}",
                base_outdir.display()
            );
        }
        candidate = base_outdir.join(format!("{stamp}_{suffix:03}"));
        suffix += 1;
    }

    ensure_outdir(&candidate)?;
    Ok(candidate)
}

fn run_simulate(cli: &Cli, settings: &EngineSettings, raw: &str, outdir: &Path) -> Result<()> {
    let mut request: SimulationRequest =
        serde_json::from_str(raw).context("failed to parse simulation request")?;
    if let Some(seed) = cli.seed {
        request.random_seed = Some(seed);
    }
    if let Some(iterations) = cli.iterations {
        request.iterations = iterations;
    }

    let config = request.into_config()?;
    let result = run_simulation(&config, settings)?;

    write_json(&outdir.join("response.json"), &SimulationResponse::from(&result))?;
    write_samples_csv(&outdir.join("samples.csv"), &result.samples)?;
    write_manifest_json(
        outdir,
        &Manifest {
            schema_version: OUTPUT_SCHEMA_VERSION.to_string(),
            mode: "simulate".to_string(),
            seed: Some(result.seed),
            iterations: Some(result.iterations),
            note: "Monte Carlo risk register outcome distribution".to_string(),
        },
    )?;

    if !result.convergence.achieved {
        println!(
            "warning: estimate has not converged (final relative change {:.6})",
            result.convergence.final_relative_change
        );
    }
    Ok(())
}

fn run_scenarios(cli: &Cli, settings: &EngineSettings, raw: &str, outdir: &Path) -> Result<()> {
    let mut request: ScenarioRequest =
        serde_json::from_str(raw).context("failed to parse scenario request")?;
    if let Some(seed) = cli.seed {
        request.random_seed = Some(seed);
    }

    let set = request.into_set()?;
    let analysis = run_scenario_set(&set, settings)?;

    write_json(&outdir.join("response.json"), &ScenarioResponse::from(&analysis))?;
    for outcome in &analysis.outcomes {
        let file = format!("samples-{}.csv", outcome.name);
        write_samples_csv(&outdir.join(file), &outcome.result.samples)?;
    }
    write_manifest_json(
        outdir,
        &Manifest {
            schema_version: OUTPUT_SCHEMA_VERSION.to_string(),
            mode: "scenarios".to_string(),
            seed: analysis.outcomes.first().map(|o| o.result.seed),
            iterations: analysis.outcomes.first().map(|o| o.result.iterations),
            note: "Named scenario comparison with pairwise effect sizes".to_string(),
        },
    )?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = resolve_settings(cli.settings.as_deref())?;
    let raw = fs::read_to_string(&cli.request)
        .with_context(|| format!("failed to read request file: {}", cli.request.display()))?;
    let outdir = resolve_run_output_dir(&cli.outdir)?;

    if cli.scenarios {
        run_scenarios(&cli, &settings, &raw, &outdir)?;
    } else {
        run_simulate(&cli, &settings, &raw, &outdir)?;
    }

    println!("wrote outputs to {}", outdir.display());
    Ok(())
}
