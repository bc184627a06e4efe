//! Headless colony economy runner.
//!
//! Runs scenarios without any front end and reports the results as JSON.
//! Designed for balance testing and CI verification.
//!
//! # Usage
//!
//! ```bash
//! # Run a scenario for ten in-game days and print the report
//! cargo run -p colony_headless -- run --scenario scenarios/frontier.ron --days 10
//!
//! # Verify determinism across allocation pool sizes
//! cargo run -p colony_headless -- verify --scenario scenarios/frontier.ron --days 3 --runs 5
//!
//! # Check the data files
//! cargo run -p colony_headless -- validate --scenario scenarios/frontier.ron
//!
//! # Save after five days, then continue from the save
//! cargo run -p colony_headless -- save --scenario scenarios/frontier.ron --days 5 --out frontier.sav
//! cargo run -p colony_headless -- load --file frontier.sav --scenario scenarios/frontier.ron --days 5
//! ```
//!
//! Reports go to stdout, logs to stderr.

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use colony_core::persistence::WorldSave;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use colony_headless::{
    batch::verify_scenario,
    runner::{run_scenario, run_world, RunReport},
    scenario::{Scenario, ScenarioError},
};

#[derive(Parser)]
#[command(name = "colony_headless")]
#[command(about = "Headless colony economy runner for balance testing and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scenario and print a JSON report
    Run {
        /// Scenario file to load
        #[arg(short, long)]
        scenario: PathBuf,

        /// In-game days to simulate
        #[arg(short, long, default_value = "1")]
        days: u64,

        /// Write the report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Verify determinism by running the same scenario several times
    Verify {
        /// Scenario file to load
        #[arg(short, long)]
        scenario: PathBuf,

        /// In-game days per run
        #[arg(short, long, default_value = "1")]
        days: u64,

        /// Number of verification runs
        #[arg(short, long, default_value = "5")]
        runs: u32,
    },

    /// Check a scenario's data for mistakes
    Validate {
        /// Scenario file to load
        #[arg(short, long)]
        scenario: PathBuf,
    },

    /// Run a scenario and save the end state
    Save {
        /// Scenario file to load
        #[arg(short, long)]
        scenario: PathBuf,

        /// In-game days to simulate before saving
        #[arg(short, long, default_value = "1")]
        days: u64,

        /// Save file; `.ron` writes text, anything else binary
        #[arg(short, long)]
        out: PathBuf,
    },

    /// Load a save and continue running it
    Load {
        /// Save file
        #[arg(short, long)]
        file: PathBuf,

        /// Scenario providing the catalog and engine configuration
        #[arg(short, long)]
        scenario: PathBuf,

        /// In-game days to simulate after loading
        #[arg(short, long, default_value = "0")]
        days: u64,
    },
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging to stderr (stdout is for reports)
    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            log_level,
        ))
        .init();

    let result = match cli.command {
        Commands::Run {
            scenario,
            days,
            output,
        } => cmd_run(&scenario, days, output.as_deref()),
        Commands::Verify {
            scenario,
            days,
            runs,
        } => cmd_verify(&scenario, days, runs),
        Commands::Validate { scenario } => cmd_validate(&scenario),
        Commands::Save {
            scenario,
            days,
            out,
        } => cmd_save(&scenario, days, &out),
        Commands::Load {
            file,
            scenario,
            days,
        } => cmd_load(&file, &scenario, days),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn print_report(report: &RunReport, output: Option<&Path>) -> Result<(), ScenarioError> {
    match output {
        Some(path) => {
            report.save(path)?;
            tracing::info!("Report written to {}", path.display());
        }
        None => println!("{}", serde_json::to_string_pretty(report)?),
    }
    Ok(())
}

/// Run a scenario and report on it
fn cmd_run(scenario: &Path, days: u64, output: Option<&Path>) -> Result<(), ScenarioError> {
    let scenario = Scenario::load(scenario)?;
    let report = run_scenario(&scenario, days)?;
    print_report(&report, output)
}

/// Verify determinism across runs
fn cmd_verify(scenario: &Path, days: u64, runs: u32) -> Result<(), ScenarioError> {
    let scenario = Scenario::load(scenario)?;
    let report = verify_scenario(&scenario, runs, days)?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    if report.deterministic {
        println!("✓ {} runs produced identical state", report.runs.len());
        Ok(())
    } else {
        eprintln!(
            "✗ Determinism check failed: run {} diverged",
            report.first_divergence().unwrap_or_default()
        );
        process::exit(1);
    }
}

/// Check data files
fn cmd_validate(scenario: &Path) -> Result<(), ScenarioError> {
    let scenario = Scenario::load(scenario)?;
    let issues = scenario.validate();
    if issues.is_empty() {
        println!(
            "✓ {}: {} building types, {} research types, {} players, {} planets",
            scenario.name,
            scenario.catalog.buildings.len(),
            scenario.catalog.research.len(),
            scenario.players.len(),
            scenario.planets.len()
        );
        return Ok(());
    }
    for issue in &issues {
        eprintln!("  - {issue}");
    }
    Err(ScenarioError::InvalidData(issues))
}

/// Run then save
fn cmd_save(scenario: &Path, days: u64, out: &Path) -> Result<(), ScenarioError> {
    let scenario = Scenario::load(scenario)?;
    let world = scenario.build_world()?;
    let (report, engine) = run_world(&scenario.name, world, &scenario.config, days)?;
    engine.save().save(out)?;
    println!(
        "Saved {} after {} day(s) to {} (state hash {:016x})",
        scenario.name,
        days,
        out.display(),
        report.state_hash
    );
    Ok(())
}

/// Load then continue
fn cmd_load(file: &Path, scenario: &Path, days: u64) -> Result<(), ScenarioError> {
    let scenario = Scenario::load(scenario)?;
    let world = WorldSave::load(file)?.restore(scenario.catalog())?;
    tracing::info!(
        day = world.time.day(),
        planets = world.planets.len(),
        "Loaded save from {}",
        file.display()
    );
    let (report, _) = run_world(&scenario.name, world, &scenario.config, days)?;
    print_report(&report, None)
}
