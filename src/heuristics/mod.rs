//! The decomposition strategies. Each one drives a `MilpOracle` through a sequence of
//! sub-models, records what it finds in a `Ledger`, and summarises the run in a `RunReport`.

pub mod exact;
pub mod fix_and_optimize;
pub mod relax_and_fix;
pub mod sequential;

use derive_more::Display;
use log::warn;
use serde::Serialize;

use crate::{
    models::SubModel,
    oracle::{MilpOracle, OracleError, OracleOutcome, SolveStatus},
    problem::Problem,
    solution::{ledger, Ledger, Metrics, Solution},
    utils::timed,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
pub enum Strategy {
    #[display(fmt = "Linear Relaxation")]
    Relaxation,
    #[display(fmt = "Exact")]
    Exact,
    #[display(fmt = "Sequential Heuristic")]
    Sequential,
    #[display(fmt = "Relax-and-Fix Heuristic")]
    RelaxAndFix,
    #[display(fmt = "Fix-and-Optimize Heuristic")]
    FixAndOptimize,
}

impl Strategy {
    /// Name used as the ledger source
    pub fn source(&self) -> &'static str {
        match self {
            Strategy::Relaxation => "relaxation",
            Strategy::Exact => "exact",
            Strategy::Sequential => "sequential",
            Strategy::RelaxAndFix => "relax-and-fix",
            Strategy::FixAndOptimize => "fix-and-optimize",
        }
    }
}

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
pub enum RunOutcome {
    /// The run produced a complete plan
    Solved,
    /// A sub-model was proven infeasible
    Infeasible,
    /// A sub-model was neither solved nor proven infeasible
    Unknown,
    /// The run did not start
    Skipped,
}

impl From<SolveStatus> for RunOutcome {
    fn from(status: SolveStatus) -> Self {
        match status {
            SolveStatus::Optimal | SolveStatus::Feasible => RunOutcome::Solved,
            SolveStatus::Infeasible => RunOutcome::Infeasible,
            SolveStatus::Unknown => RunOutcome::Unknown,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub strategy: Strategy,
    pub outcome: RunOutcome,
    /// Status of the last sub-model solved
    pub status: Option<SolveStatus>,
    pub objective: Option<f64>,
    /// The lower bound the run itself produced, if any
    pub lower_bound: Option<f64>,
    /// Gap of the objective to the best bound known when the run finished, in percent
    pub gap: Option<f64>,
    /// Wall-clock seconds
    pub time: f64,
    /// Iterations for the sequential heuristic, windows for the others
    pub iterations: usize,
    pub metrics: Option<Metrics>,
    #[serde(skip)]
    pub solution: Option<Solution>,
}

impl RunReport {
    pub fn new(strategy: Strategy) -> Self {
        RunReport {
            strategy,
            outcome: RunOutcome::Skipped,
            status: None,
            objective: None,
            lower_bound: None,
            gap: None,
            time: 0.0,
            iterations: 0,
            metrics: None,
            solution: None,
        }
    }

    /// A run that stopped on a failed sub-model. Carries no solution.
    fn failed(mut self, status: SolveStatus, time: f64) -> Self {
        warn!("{}: stopped, sub-model {status}", self.strategy);
        self.outcome = status.into();
        self.status = Some(status);
        self.objective = None;
        self.solution = None;
        self.time = time;
        self
    }

    /// A run that ended with a complete plan. The plan is offered to the ledger.
    fn solved(
        mut self,
        problem: &Problem,
        status: SolveStatus,
        objective: f64,
        solution: Solution,
        time: f64,
        ledger: &mut Ledger,
    ) -> Self {
        ledger.offer(objective, solution.clone(), self.strategy.source());
        self.outcome = RunOutcome::Solved;
        self.status = Some(status);
        self.objective = Some(objective);
        self.gap = ledger
            .bound()
            .or(self.lower_bound)
            .map(|bound| ledger::gap(objective, bound));
        self.metrics = Some(Metrics::of(problem, &solution));
        self.solution = Some(solution);
        self.time = time;
        self
    }
}

/// Solve `model`, measuring the wall-clock time the oracle took
pub(crate) fn solve_timed<O: MilpOracle>(
    oracle: &mut O,
    model: &SubModel,
    time_limit: f64,
) -> Result<(OracleOutcome, f64), OracleError> {
    let (outcome, used) = timed(|| oracle.solve(model, time_limit));
    Ok((outcome?, used))
}
