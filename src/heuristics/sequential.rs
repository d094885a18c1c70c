//! Alternates between a production model, which decides setups, production and the total
//! inventory of each item, and the full model with those decisions pinned, which decides
//! where the inventory is stored. The handling cost the full model pays per unit of inventory
//! is fed back to the production model until the plan settles.

use std::time::Instant;

use log::{debug, info};
use ndarray::Array2;

use crate::{
    budget::DEFAULT_FLOOR,
    fixing::{DomainPolicy, FixingState},
    models::{build_sub_model, ModelScope, VarGroup},
    oracle::{MilpOracle, OracleError, SolveStatus},
    problem::{Cost, Problem},
    solution::{metrics::total_inventory, Ledger, Metrics, Solution},
    termination::{Progress, Termination},
    utils::{all_close, EPSILON},
};

use super::{solve_timed, RunReport, Strategy};

#[derive(Debug, Clone)]
pub struct SequentialConfig {
    /// Seconds
    pub time_limit: f64,
    /// Fraction of the handling cost used as the initial estimate
    pub seed: f64,
    /// Fraction of the observed handling cost per unit of inventory used as the next estimate
    pub epsilon: f64,
    pub max_iterations: u64,
    /// Stop when the objective moves less than this between iterations
    pub tolerance: f64,
    /// Smallest time limit handed to the solver
    pub floor: f64,
}

impl Default for SequentialConfig {
    fn default() -> Self {
        SequentialConfig {
            time_limit: 1800.0,
            seed: 0.25,
            epsilon: 0.25,
            max_iterations: 100,
            tolerance: 0.001,
            floor: DEFAULT_FLOOR,
        }
    }
}

impl SequentialConfig {
    pub fn termination(&self) -> Termination {
        Termination::any(
            Termination::Iterations(self.max_iterations),
            Termination::any(
                Termination::OutOfTime(0.0),
                Termination::any(Termination::Stall(self.tolerance), Termination::FixedPoint),
            ),
        )
    }
}

fn seed_estimate(problem: &Problem, seed: f64) -> Array2<Cost> {
    let n = problem.items().len();
    let m = problem.locations().len();
    Array2::from_shape_fn((n, m), |(i, l)| seed * problem.handling_cost(i, l))
}

/// The handling cost per unit of inventory observed in a pair of solutions
fn next_estimate(
    problem: &Problem,
    config: &SequentialConfig,
    production: &Solution,
    storage: &Solution,
) -> Array2<Cost> {
    let inventory = total_inventory(production);
    if inventory <= EPSILON {
        return seed_estimate(problem, config.seed);
    }

    let handling = Metrics::of(problem, storage).handling_cost;
    let per_unit = config.epsilon * handling / inventory;
    let n = problem.items().len();
    let m = problem.locations().len();
    Array2::from_elem((n, m), per_unit)
}

pub fn run<O: MilpOracle>(
    problem: &Problem,
    oracle: &mut O,
    config: &SequentialConfig,
    ledger: &mut Ledger,
) -> Result<RunReport, OracleError> {
    let start = Instant::now();
    let termination = config.termination();
    let policy = DomainPolicy::declared();
    let mut report = RunReport::new(Strategy::Sequential);

    let mut estimate = seed_estimate(problem, config.seed);
    let mut remaining = config.time_limit;
    let mut previous = None;
    let mut best: Option<(SolveStatus, f64, Solution)> = None;

    info!("{}: stopping on {}", Strategy::Sequential, termination);

    for iteration in 1.. {
        report.iterations = iteration as usize;

        // Production: setups, production quantities and total inventory
        let scope = ModelScope::Production {
            estimated_handling: estimate.clone(),
        };
        let model = build_sub_model(problem, &FixingState::new(), &policy, &scope);
        let limit = (remaining / 2.0).max(config.floor);
        let (outcome, production_time) = solve_timed(oracle, &model, limit)?;
        let status = outcome.status;
        let production = match outcome.into_usable() {
            Some((_, solution)) => solution,
            None => return Ok(report.failed(status, start.elapsed().as_secs_f64())),
        };

        // Storage: the full model with production pinned
        let mut fixing = FixingState::new();
        fixing.fix_all(
            production
                .iter()
                .filter(|(k, _)| matches!(k.group(), VarGroup::Setup | VarGroup::Alloc)),
        );
        let scope = ModelScope::PinnedInventory(production.aggregate_inventory(problem));
        let model = build_sub_model(problem, &fixing, &policy, &scope);
        let limit = (remaining - production_time).max(config.floor);
        let (outcome, storage_time) = solve_timed(oracle, &model, limit)?;
        let status = outcome.status;
        let (objective, storage) = match outcome.into_usable() {
            Some(usable) => usable,
            None => return Ok(report.failed(status, start.elapsed().as_secs_f64())),
        };

        debug!(
            "iteration {iteration}: objective {objective:.4}, production {production_time:.2}s, storage {storage_time:.2}s"
        );

        remaining -= production_time + storage_time;
        let next = next_estimate(problem, config, &production, &storage);
        let progress = Progress {
            iteration,
            remaining,
            previous,
            objective,
            estimate_changed: !all_close(next.iter(), estimate.iter()),
        };

        let improves = best
            .as_ref()
            .map(|(_, incumbent, _)| objective <= *incumbent)
            .unwrap_or(true);
        if improves {
            best = Some((status, objective, storage));
        }

        if let Some(reason) = termination.reason(&progress) {
            info!("{}: stopped after {iteration} iterations ({reason})", Strategy::Sequential);
            break;
        }

        estimate = next;
        previous = Some(objective);
    }

    let time = start.elapsed().as_secs_f64();
    match best {
        Some((status, objective, solution)) => {
            Ok(report.solved(problem, status, objective, solution, time, ledger))
        }
        None => Ok(report.failed(SolveStatus::Unknown, time)),
    }
}
