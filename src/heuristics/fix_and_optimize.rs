use std::time::Instant;

use log::{debug, info};

use crate::{
    budget::{TimeBudget, DEFAULT_FLOOR},
    fixing::{DomainPolicy, FixingState},
    models::{build_sub_model, ModelScope, VarKey},
    oracle::{MilpOracle, OracleError, SolveStatus},
    problem::Problem,
    rolling_horizon::RollingHorizon,
    solution::{Ledger, Solution},
};

use super::{solve_timed, RunReport, Strategy};

#[derive(Debug, Clone)]
pub struct FixAndOptimizeConfig {
    /// Seconds
    pub time_limit: f64,
    pub floor: f64,
    /// Periods committed after each window
    pub fix: usize,
    /// Periods shared by consecutive windows
    pub overlap: usize,
}

impl Default for FixAndOptimizeConfig {
    fn default() -> Self {
        FixAndOptimizeConfig {
            time_limit: 1800.0,
            floor: DEFAULT_FLOOR,
            fix: 1,
            overlap: 2,
        }
    }
}

/// Improves `start`, a complete plan, by re-optimising the binary decisions of a window of
/// periods at a time while the binary decisions outside the window stay pinned. Every window
/// is solved; once the budget runs low each one still gets the floor.
pub fn run<O: MilpOracle>(
    problem: &Problem,
    oracle: &mut O,
    config: &FixAndOptimizeConfig,
    start: &Solution,
    ledger: &mut Ledger,
) -> Result<RunReport, OracleError> {
    let clock = Instant::now();
    let mut report = RunReport::new(Strategy::FixAndOptimize);

    let horizon = RollingHorizon::new(problem.timesteps(), config.fix, config.overlap);
    let windows: Vec<_> = horizon.windows().collect();
    let mut budget = TimeBudget::new(config.time_limit, windows.len(), config.floor);
    let policy = DomainPolicy::declared();

    let first_end = windows.first().map(|w| w.free.end).unwrap_or(0);
    let mut fixing = FixingState::new();
    fixing.fix_all(
        start
            .iter()
            .filter(|(key, _)| key.is_binary() && key.period() >= first_end),
    );

    let mut best: Option<(SolveStatus, f64, Solution)> = None;

    for (w, window) in windows.iter().enumerate() {
        report.iterations = w + 1;

        let model = build_sub_model(problem, &fixing, &policy, &ModelScope::Full);
        let limit = budget.allocation();
        let (outcome, used) = solve_timed(oracle, &model, limit)?;
        budget.rollover(used);

        let status = outcome.status;
        let (objective, solution) = match outcome.into_usable() {
            Some(usable) => usable,
            None => return Ok(report.failed(status, clock.elapsed().as_secs_f64())),
        };
        debug!(
            "window {} (periods {:?}): {objective:.4} ({status}) in {used:.2}s of {limit:.2}s",
            w + 1,
            window.free
        );

        if window.last {
            best = Some((status, objective, solution));
            break;
        }

        let committed = window.committed.clone();
        fixing.fix_all(
            solution
                .iter()
                .filter(|(key, _)| key.is_binary() && committed.contains(&key.period())),
        );

        let next = windows[w + 1].free.clone();
        fixing.unfix_where(|key: &VarKey| key.is_binary() && next.contains(&key.period()));
        best = Some((status, objective, solution));
    }

    let time = clock.elapsed().as_secs_f64();
    match best {
        Some((status, objective, solution)) => {
            info!("{}: {objective:.4} in {time:.2}s", Strategy::FixAndOptimize);
            Ok(report.solved(problem, status, objective, solution, time, ledger))
        }
        None => Ok(report),
    }
}
