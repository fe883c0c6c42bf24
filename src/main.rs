//! Command-line entry point of the camp-placement optimization driver.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;

use campopt::moo::config::{MooSettings, SETTINGS_FILE};
use campopt::sim::encoder::{CampLocationTable, RouteDistanceTable};
use campopt::sim::executor::{DirectExecutor, PilotJobExecutor, ScenarioExecutor};
use campopt::{CampPlacementProblem, ExecutionMode, RunContext};

/// Candidate camp coordinate table, expected in the working directory.
const CAMP_LOCATIONS_FILE: &str = "camp_locations_refined.csv";

/// Candidate-to-network distance table, expected in the working directory.
const CAMP_ROUTES_FILE: &str = "camp_routes_refined.csv";

#[derive(Debug, Parser)]
#[command(name = "campopt", about = "Multi-objective camp placement over simulated migration")]
struct Cli {
    /// How the simulator is launched inside each scenario: serial or parallel.
    #[arg(long, default_value = "serial")]
    execution_mode: String,

    /// Number of simulated days; negative means the simulator's full period.
    #[arg(long, default_value_t = -1)]
    simulation_period: i64,

    /// Execution log file, created in the working directory.
    #[arg(long, default_value = "log_MOO.txt")]
    exec_log_file: String,

    /// Core count for parallel launches and pilot-job declarations.
    #[arg(long, default_value_t = 1)]
    cores: usize,

    /// Submit each generation as one concurrent pilot-job batch instead of
    /// running scenarios sequentially.
    #[arg(long)]
    use_pj: bool,

    /// Working directory holding the shared inputs and configuration.
    #[arg(long, default_value = ".")]
    work_dir: PathBuf,

    /// Interpreter used to launch the simulator's run script.
    #[arg(long, default_value = "python3")]
    interpreter: String,

    /// Seed for the search's random number generator; omit for a fresh one.
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let execution_mode: ExecutionMode = cli.execution_mode.parse()?;
    let mut ctx = RunContext::new(
        cli.work_dir.clone(),
        execution_mode,
        cli.simulation_period,
        cli.cores,
        cli.interpreter,
        &cli.work_dir.join(&cli.exec_log_file),
    )?;
    ctx.log.append(format!(
        "run starting: mode={:?} period={} cores={} use_pj={}",
        execution_mode, cli.simulation_period, cli.cores, cli.use_pj
    ))?;

    let settings_path = cli.work_dir.join(SETTINGS_FILE);
    let settings = MooSettings::load(&settings_path)
        .with_context(|| format!("reading {}", settings_path.display()))?;
    let (algorithm, termination) = settings.build_algorithm(CampPlacementProblem::N_OBJ)?;
    ctx.log.append(format!(
        "algorithm = {} (pop_size {}), termination after {} generations",
        algorithm.name(),
        algorithm.pop_size(),
        termination.generations()
    ))?;

    let camps = CampLocationTable::load(&cli.work_dir.join(CAMP_LOCATIONS_FILE))
        .with_context(|| format!("reading {CAMP_LOCATIONS_FILE}"))?;
    let routes = RouteDistanceTable::load(&cli.work_dir.join(CAMP_ROUTES_FILE))
        .with_context(|| format!("reading {CAMP_ROUTES_FILE}"))?;
    info!(
        "loaded {} candidate camp locations ({} route rows)",
        camps.len(),
        routes.len()
    );

    let executor: Box<dyn ScenarioExecutor> = if cli.use_pj {
        Box::new(PilotJobExecutor { cores: cli.cores })
    } else {
        Box::new(DirectExecutor)
    };

    let mut problem = CampPlacementProblem::new(ctx, executor, camps, routes);
    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let result = algorithm.minimize(&mut problem, termination, &mut rng)?;
    info!(
        "search finished after {} generations, {} non-dominated candidates",
        result.generations,
        result.x.len()
    );

    let path = problem.write_population_csv(&result)?;
    info!("final population written to {}", path.display());
    Ok(())
}
