//! The command line interface for the router.
use crate::input::{LoadOptions, load_scenario};
use crate::log;
use crate::report::log_outcome;
use crate::routing::{RoutingOutcome, optimise_routes};
use crate::settings::Settings;
use crate::solver::HighsSolver;
use ::log::info;
use anyhow::{Context, Result, bail};
use clap::{Args, CommandFactory, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// Serialises logger initialisation when commands run concurrently (e.g. in tests)
static LOGGER_LOCK: Mutex<()> = Mutex::new(());

/// The command line interface for the router.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// The available commands.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Options for the run command
#[derive(Args, Debug, Default, Clone, Copy)]
pub struct RunOpts {
    /// Redraw every edge capacity from the capacity bounds
    #[arg(long)]
    pub regenerate_capacities: bool,
    /// Seed for generated capacities and flows (overrides the model file)
    #[arg(long)]
    pub seed: Option<u64>,
}

impl From<&RunOpts> for LoadOptions {
    fn from(opts: &RunOpts) -> Self {
        Self {
            regenerate_capacities: opts.regenerate_capacities,
            seed: opts.seed,
        }
    }
}

/// The available commands.
#[derive(Subcommand)]
enum Commands {
    /// Optimise the routes for a scenario.
    Run {
        /// Path to the scenario directory.
        scenario_dir: PathBuf,
        /// Other run options
        #[command(flatten)]
        opts: RunOpts,
    },
    /// Validate a scenario.
    Validate {
        /// The path to the scenario directory.
        scenario_dir: PathBuf,
    },
}

impl Commands {
    /// Execute the supplied CLI command
    fn execute(self) -> Result<()> {
        match self {
            Self::Run { scenario_dir, opts } => {
                handle_run_command(&scenario_dir, &opts, None).map(|_| ())
            }
            Self::Validate { scenario_dir } => handle_validate_command(&scenario_dir, None),
        }
    }
}

/// Parse CLI arguments and start emroute
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        // Output program help
        let help_str = Cli::command().render_long_help().to_string();
        println!("{help_str}");
        return Ok(());
    };

    command.execute()
}

/// Load program settings, if not provided, and initialise the logger
fn init_logging(settings: Option<Settings>) -> Result<()> {
    let settings = if let Some(settings) = settings {
        settings
    } else {
        Settings::load().context("Failed to load settings.")?
    };

    // The logger may already have been set up if we are called more than once
    let _guard = LOGGER_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
    if !log::is_logger_initialised() {
        log::init(Some(&settings.log_level)).context("Failed to initialise logging.")?;
    }

    Ok(())
}

/// Handle the `run` command.
///
/// An infeasible routing is reported but is not an error. An unbounded problem is.
pub fn handle_run_command(
    scenario_path: &Path,
    opts: &RunOpts,
    settings: Option<Settings>,
) -> Result<RoutingOutcome> {
    init_logging(settings)?;

    // Load the scenario to run
    let scenario =
        load_scenario(scenario_path, &opts.into()).context("Failed to load scenario.")?;
    info!("Loaded scenario from {}", scenario_path.display());

    // Run the optimisation
    let outcome = optimise_routes(
        &scenario.graph,
        &scenario.commodities,
        &scenario.parameters,
        &HighsSolver::new(scenario.parameters.time_limit),
    )?;
    log_outcome(&outcome, &scenario.graph, &scenario.commodities);

    if outcome == RoutingOutcome::Unbounded {
        bail!("Routing problem is unbounded");
    }
    info!("Routing complete!");

    Ok(outcome)
}

/// Handle the `validate` command.
pub fn handle_validate_command(scenario_path: &Path, settings: Option<Settings>) -> Result<()> {
    init_logging(settings)?;

    // Load/validate the scenario
    load_scenario(scenario_path, &LoadOptions::default())
        .context("Failed to validate scenario.")?;
    info!("Scenario validation successful!");

    Ok(())
}
