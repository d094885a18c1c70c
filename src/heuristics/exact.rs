use log::info;

use crate::{
    fixing::{DomainPolicy, FixingState},
    models::{build_sub_model, ModelScope},
    oracle::{MilpOracle, OracleError, SolveStatus},
    problem::Problem,
    solution::Ledger,
};

use super::{solve_timed, RunOutcome, RunReport, Strategy};

#[derive(Debug, Clone)]
pub struct ExactConfig {
    /// Seconds
    pub time_limit: f64,
}

impl Default for ExactConfig {
    fn default() -> Self {
        ExactConfig { time_limit: 1800.0 }
    }
}

/// Solve the linear relaxation of the full model. Its optimum is a valid lower bound and is
/// recorded in the ledger; the fractional plan itself is not.
pub fn relaxation<O: MilpOracle>(
    problem: &Problem,
    oracle: &mut O,
    config: &ExactConfig,
    ledger: &mut Ledger,
) -> Result<RunReport, OracleError> {
    let model = build_sub_model(
        problem,
        &FixingState::new(),
        &DomainPolicy::relaxed(),
        &ModelScope::Full,
    );
    let (outcome, used) = solve_timed(oracle, &model, config.time_limit)?;
    let mut report = RunReport::new(Strategy::Relaxation);
    report.iterations = 1;

    let status = outcome.status;
    let objective = match outcome.into_usable() {
        Some((objective, _)) => objective,
        None => return Ok(report.failed(status, used)),
    };

    // Only a proven optimum of the relaxation bounds the exact problem.
    if status == SolveStatus::Optimal {
        ledger.offer_bound(objective);
        report.lower_bound = Some(objective);
    }

    info!("linear relaxation: {objective:.4} ({status}) in {used:.2}s");
    report.outcome = RunOutcome::Solved;
    report.status = Some(status);
    report.objective = Some(objective);
    report.time = used;
    Ok(report)
}

/// Solve the full model in one go.
pub fn run<O: MilpOracle>(
    problem: &Problem,
    oracle: &mut O,
    config: &ExactConfig,
    ledger: &mut Ledger,
) -> Result<RunReport, OracleError> {
    let model = build_sub_model(
        problem,
        &FixingState::new(),
        &DomainPolicy::declared(),
        &ModelScope::Full,
    );
    let (outcome, used) = solve_timed(oracle, &model, config.time_limit)?;
    let mut report = RunReport::new(Strategy::Exact);
    report.iterations = 1;

    if let Some(bound) = outcome.bound {
        ledger.offer_bound(bound);
        report.lower_bound = Some(bound);
    }

    let status = outcome.status;
    match outcome.into_usable() {
        Some((objective, solution)) => {
            info!("exact: {objective:.4} ({status}) in {used:.2}s");
            Ok(report.solved(problem, status, objective, solution, used, ledger))
        }
        None => Ok(report.failed(status, used)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::builder::tests::tiny_plan,
        oracle::testing::ReferenceOracle,
        problem::tests::tiny,
    };

    #[test]
    fn relaxation_bounds_the_ledger() {
        let problem = tiny();
        let mut oracle = ReferenceOracle::new(tiny_plan());
        let mut ledger = Ledger::new();
        let report = relaxation(&problem, &mut oracle, &ExactConfig::default(), &mut ledger).unwrap();
        assert_eq!(report.outcome, RunOutcome::Solved);
        assert_eq!(report.lower_bound, Some(135.0));
        assert_eq!(ledger.bound(), Some(135.0));
        assert!(ledger.incumbent().is_none());
    }

    #[test]
    fn exact_offers_its_plan() {
        let problem = tiny();
        let mut oracle = ReferenceOracle::new(tiny_plan());
        let mut ledger = Ledger::new();
        let report = run(&problem, &mut oracle, &ExactConfig::default(), &mut ledger).unwrap();
        assert_eq!(report.objective, Some(135.0));
        assert_eq!(report.gap, Some(0.0));
        assert_eq!(ledger.objective(), Some(135.0));
        assert_eq!(oracle.calls, vec![("full".to_string(), 1800.0)]);
    }

    #[test]
    fn infeasible_model_reports_no_solution() {
        let problem = tiny();
        let mut oracle = ReferenceOracle::scripted(tiny_plan(), &[SolveStatus::Infeasible]);
        let mut ledger = Ledger::new();
        let report = run(&problem, &mut oracle, &ExactConfig::default(), &mut ledger).unwrap();
        assert_eq!(report.outcome, RunOutcome::Infeasible);
        assert!(report.solution.is_none());
        assert!(ledger.incumbent().is_none());
    }
}
