use clap::{ArgEnum, Parser};
use hub_median::models::hub_median::{
    HubMedianResult, ModelConfig, ModelStats, Parameters, Sets,
};
use hub_median::models::HubMedianSolver;
use hub_median::parse::Instance;
use hub_median::solver::recorder::ModelRecorder;
use hub_median::solver::SolverEngine;
use hub_median::HubError;
use log::{info, warn};
use std::error::Error;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, ArgEnum)]
enum Backend {
    Gurobi,
    Highs,
    /// Build the model in memory and report its size without solving it
    DryRun,
}

/// Builds and solves a single allocation p-hub median model
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// JSON instance with `coordinates`, `flows` and `fixed_costs`
    #[clap(long)]
    instance: Option<PathBuf>,
    /// Text matrix with one `x y` row per node
    #[clap(long)]
    coordinates: Option<PathBuf>,
    /// Text matrix with the flow from every node to every node
    #[clap(long)]
    flows: Option<PathBuf>,
    /// Text matrix whose first column holds the fixed hub cost of every node
    #[clap(long)]
    fixed_costs: Option<PathBuf>,
    /// Number of hubs to open
    #[clap(short = 'p', long, default_value = "3")]
    hubs: usize,
    /// Discount factor on hub-to-hub transport
    #[clap(long, default_value = "0.2")]
    alpha: f64,
    /// Require integral hub variables instead of relaxing them to [0, 1]
    #[clap(long)]
    binary_hubs: bool,
    #[clap(long, arg_enum, default_value = "dry-run")]
    backend: Backend,
    /// Log file of the gurobi environment
    #[clap(long, default_value = "hub_median.log")]
    log_file: String,
    /// Write the built model to this file after solving (gurobi only)
    #[clap(long)]
    write_model: Option<PathBuf>,
    /// Print the result as JSON
    #[clap(long)]
    json: bool,
    #[clap(short, long, parse(from_occurrences))]
    verbose: usize,
}

fn load(args: &Args) -> Result<Instance, Box<dyn Error>> {
    match (
        &args.instance,
        &args.coordinates,
        &args.flows,
        &args.fixed_costs,
    ) {
        (Some(path), None, None, None) => Ok(Instance::read_json(path)?),
        (None, Some(coordinates), Some(flows), Some(fixed_costs)) => {
            Ok(Instance::read_text(coordinates, flows, fixed_costs)?)
        }
        _ => Err(
            "give either --instance or all of --coordinates, --flows and --fixed-costs".into(),
        ),
    }
}

/// Solves the model, then writes it out if asked to and the engine can
fn solve_with<E: SolverEngine>(
    engine: &mut E,
    sets: &Sets,
    parameters: &Parameters,
    write_model: Option<&Path>,
) -> Result<HubMedianResult, HubError> {
    let write_model = write_model.filter(|_| {
        let supported = engine.can_write_model();
        if !supported {
            warn!("--write-model is ignored, this backend cannot write models");
        }
        supported
    });

    let result = HubMedianSolver::solve(engine, sets, parameters)?;
    if let Some(path) = write_model {
        engine.write_model(path).map_err(HubError::Solve)?;
        info!("wrote model to {}", path.display());
    }
    Ok(result)
}

#[cfg(feature = "gurobi")]
fn solve_gurobi(
    sets: &Sets,
    parameters: &Parameters,
    args: &Args,
) -> Result<HubMedianResult, HubError> {
    use hub_median::solver::gurobi::GurobiEngine;

    let mut engine = GurobiEngine::new("classical_hub_median", &args.log_file)
        .and_then(|engine| if args.json { engine.quiet() } else { Ok(engine) })
        .map_err(|err| HubError::ModelBuild(err.into()))?;
    solve_with(&mut engine, sets, parameters, args.write_model.as_deref())
}

#[cfg(not(feature = "gurobi"))]
fn solve_gurobi(_: &Sets, _: &Parameters, _: &Args) -> Result<HubMedianResult, HubError> {
    Err(HubError::BackendUnavailable("gurobi"))
}

#[cfg(feature = "highs")]
fn solve_highs(
    sets: &Sets,
    parameters: &Parameters,
    args: &Args,
) -> Result<HubMedianResult, HubError> {
    use hub_median::solver::highs::HighsEngine;

    let mut engine = HighsEngine::new();
    solve_with(&mut engine, sets, parameters, args.write_model.as_deref())
}

#[cfg(not(feature = "highs"))]
fn solve_highs(_: &Sets, _: &Parameters, _: &Args) -> Result<HubMedianResult, HubError> {
    Err(HubError::BackendUnavailable("highs"))
}

fn dry_run(sets: &Sets, parameters: &Parameters, args: &Args) -> Result<(), Box<dyn Error>> {
    let mut recorder = ModelRecorder::new();
    HubMedianSolver::build(&mut recorder, sets, parameters)?;
    if args.write_model.is_some() {
        warn!("--write-model is ignored without a solver backend");
    }

    let stats = ModelStats::recorded(&recorder);
    if stats != ModelStats::expected(sets.N.len()) {
        warn!("recorded model size differs from the expected size");
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!(
            "{} variables ({} routing, {} hub)",
            stats.variables(),
            stats.routing_vars,
            stats.hub_vars
        );
        println!(
            "{} constraints ({} hub count, {} assignment, {} entry linking, {} exit linking)",
            stats.constraints(),
            stats.hub_count,
            stats.assignment,
            stats.entry_linking,
            stats.exit_linking
        );
    }
    Ok(())
}

fn print_result(result: &HubMedianResult, json: bool) -> Result<(), Box<dyn Error>> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }

    for entry in &result.entries {
        println!("{}", entry);
    }
    println!("objective: {}", result.objective);
    println!("hubs: {:?}", result.hubs);
    if !result.has_integral_hubs() {
        println!("hub levels: {:?}", result.hub_levels);
    }
    Ok(())
}

fn run(args: &Args) -> Result<(), Box<dyn Error>> {
    let instance = load(args)?;
    let problem = instance.problem().map_err(HubError::from)?;
    info!("loaded instance with {} nodes", problem.nodes());

    let config = ModelConfig {
        hubs: args.hubs,
        alpha: args.alpha,
        binary_hubs: args.binary_hubs,
    };
    let sets = Sets::new(&problem);
    let parameters = Parameters::new(&problem, &config).map_err(HubError::from)?;

    let result = match args.backend {
        Backend::DryRun => return dry_run(&sets, &parameters, args),
        Backend::Gurobi => solve_gurobi(&sets, &parameters, args)?,
        Backend::Highs => solve_highs(&sets, &parameters, args)?,
    };

    print_result(&result, args.json)
}

pub fn main() {
    let args = Args::parse();

    let level = match args.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if let Err(err) = run(&args) {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}
