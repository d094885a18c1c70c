use std::{
    fs::File,
    io::{BufWriter, Write},
    path::PathBuf,
    sync::Arc,
};

use clap::{ArgEnum, Parser};
use log::{error, info};

use rclsp::{
    budget::DEFAULT_FLOOR,
    heuristics::{
        exact::{self, ExactConfig},
        fix_and_optimize::{self, FixAndOptimizeConfig},
        relax_and_fix::{self, RelaxAndFixConfig},
        sequential::{self, SequentialConfig},
        RunOutcome, RunReport, Strategy,
    },
    oracle::MilpOracle,
    parse::read_problem,
    report,
    solution::Ledger,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ArgEnum)]
enum Heuristic {
    Sequential,
    RelaxAndFix,
    FixAndOptimize,
    Exact,
    All,
}

/// Decomposition heuristics for capacitated lot-sizing with multiple storage locations.
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Path to the instance file
    input: PathBuf,
    /// Path of the report to write
    output: PathBuf,
    /// Which heuristic to run. Fix-and-optimize runs relax-and-fix first.
    #[clap(long, arg_enum, default_value = "fix-and-optimize")]
    heuristic: Heuristic,
    /// Total time limit of each heuristic, in seconds
    #[clap(long, default_value_t = 1800.0)]
    time_limit: f64,
    /// Smallest time limit handed to the solver, in seconds
    #[clap(long, default_value_t = DEFAULT_FLOOR)]
    floor: f64,
    /// Periods committed after each fix-and-optimize window
    #[clap(long, default_value_t = 1)]
    fix: usize,
    /// Periods shared by consecutive fix-and-optimize windows
    #[clap(long, default_value_t = 2)]
    overlap: usize,
    /// Iteration cap of the sequential heuristic
    #[clap(long, default_value_t = 100)]
    max_iterations: u64,
    /// The sequential heuristic stops when the objective moves less than this
    #[clap(long, default_value_t = 0.001)]
    tolerance: f64,
    /// Fraction of the handling cost used as the initial estimate
    #[clap(long, default_value_t = 0.25)]
    seed_epsilon: f64,
    /// Fraction of the observed handling cost per unit used as the next estimate
    #[clap(long, default_value_t = 0.25)]
    epsilon: f64,
    /// Also write a JSON summary of every run to this path
    #[clap(long)]
    summary: Option<PathBuf>,
}

#[cfg(feature = "gurobi")]
fn oracle() -> impl MilpOracle {
    rclsp::models::gurobi::GurobiOracle::new()
}

#[cfg(not(feature = "gurobi"))]
fn oracle() -> impl MilpOracle {
    rclsp::oracle::Unavailable
}

fn run(args: &Args) -> rclsp::Result<()> {
    let problem = Arc::new(read_problem(&args.input)?);
    info!(
        "Read {:?}: T = {}, I = {}, L = {}",
        args.input,
        problem.timesteps(),
        problem.items().len(),
        problem.locations().len()
    );

    let mut oracle = oracle();
    let mut ledger = Ledger::new();
    let mut runs = Vec::new();
    let heuristic = args.heuristic;
    let all = heuristic == Heuristic::All;

    let exact_config = ExactConfig {
        time_limit: args.time_limit,
    };
    runs.push(exact::relaxation(
        &problem,
        &mut oracle,
        &exact_config,
        &mut ledger,
    )?);

    if all || heuristic == Heuristic::Exact {
        runs.push(exact::run(&problem, &mut oracle, &exact_config, &mut ledger)?);
    }

    if all || heuristic == Heuristic::Sequential {
        let config = SequentialConfig {
            time_limit: args.time_limit,
            seed: args.seed_epsilon,
            epsilon: args.epsilon,
            max_iterations: args.max_iterations,
            tolerance: args.tolerance,
            floor: args.floor,
        };
        runs.push(sequential::run(&problem, &mut oracle, &config, &mut ledger)?);
    }

    if all || matches!(heuristic, Heuristic::RelaxAndFix | Heuristic::FixAndOptimize) {
        let config = RelaxAndFixConfig {
            time_limit: args.time_limit,
            floor: args.floor,
            ..Default::default()
        };
        let rf = relax_and_fix::run(&problem, &mut oracle, &config, &mut ledger)?;

        let fo = if all || heuristic == Heuristic::FixAndOptimize {
            let remaining = args.time_limit - rf.time;
            let config = FixAndOptimizeConfig {
                time_limit: remaining,
                floor: args.floor,
                fix: args.fix,
                overlap: args.overlap,
            };
            match (&rf.solution, rf.outcome) {
                (Some(start), RunOutcome::Solved) if remaining > args.floor => Some(
                    fix_and_optimize::run(&problem, &mut oracle, &config, start, &mut ledger)?,
                ),
                _ => {
                    info!("{} skipped", Strategy::FixAndOptimize);
                    Some(RunReport::new(Strategy::FixAndOptimize))
                }
            }
        } else {
            None
        };

        runs.push(rf);
        runs.extend(fo);
    }

    let mut out = BufWriter::new(File::create(&args.output)?);
    report::write_report(&mut out, &problem, &runs, &ledger)?;
    out.flush()?;
    info!("Wrote report to {:?}", args.output);

    if let Some(path) = &args.summary {
        report::write_summary(BufWriter::new(File::create(path)?), &runs, &ledger)?;
        info!("Wrote summary to {:?}", path);
    }

    Ok(())
}

pub fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    if let Err(e) = run(&args) {
        error!("{e}");
        std::process::exit(1);
    }
}
