use std::time::Instant;

use log::{debug, info};

use crate::{
    budget::{TimeBudget, DEFAULT_FLOOR},
    fixing::{DomainPolicy, FixingState},
    models::{build_sub_model, Domain, ModelScope, VarGroup},
    oracle::{MilpOracle, OracleError},
    problem::Problem,
    solution::Ledger,
};

use super::{solve_timed, RunReport, Strategy};

#[derive(Debug, Clone)]
pub struct RelaxAndFixConfig {
    /// Seconds
    pub time_limit: f64,
    pub floor: f64,
    /// The binary groups made integral in each window, in order. Groups not listed in any
    /// stage stay continuous.
    pub stages: Vec<Vec<VarGroup>>,
}

impl Default for RelaxAndFixConfig {
    fn default() -> Self {
        RelaxAndFixConfig {
            time_limit: 1800.0,
            floor: DEFAULT_FLOOR,
            stages: vec![
                vec![VarGroup::Setup],
                vec![VarGroup::LocationUse, VarGroup::Assign],
            ],
        }
    }
}

/// Solve with only the first stage's groups integral, pin them, make the next stage integral,
/// and repeat. The last window yields the plan.
pub fn run<O: MilpOracle>(
    problem: &Problem,
    oracle: &mut O,
    config: &RelaxAndFixConfig,
    ledger: &mut Ledger,
) -> Result<RunReport, OracleError> {
    let start = Instant::now();
    let mut report = RunReport::new(Strategy::RelaxAndFix);

    let mut policy = DomainPolicy::declared();
    for group in VarGroup::BINARY {
        policy.promote(group, Domain::Continuous);
    }

    let mut fixing = FixingState::new();
    let mut budget = TimeBudget::new(config.time_limit, config.stages.len(), config.floor);

    for (k, stage) in config.stages.iter().enumerate() {
        let last = k + 1 == config.stages.len();
        report.iterations = k + 1;

        for group in stage {
            policy.promote(*group, Domain::Binary);
        }

        let model = build_sub_model(problem, &fixing, &policy, &ModelScope::Full);
        let limit = budget.allocation();
        let (outcome, used) = solve_timed(oracle, &model, limit)?;
        budget.rollover(used);

        if k == 0 {
            // The first window relaxes every later stage, so its bound holds for the full model.
            if let Some(bound) = outcome.bound {
                ledger.offer_bound(bound);
            }
        }

        let status = outcome.status;
        let (objective, solution) = match outcome.into_usable() {
            Some(usable) => usable,
            None => return Ok(report.failed(status, start.elapsed().as_secs_f64())),
        };

        debug!("window {}: {objective:.4} ({status}) in {used:.2}s of {limit:.2}s", k + 1);
        if k == 0 {
            report.lower_bound = Some(objective);
        }

        if last {
            let time = start.elapsed().as_secs_f64();
            info!("{}: {objective:.4} in {time:.2}s", Strategy::RelaxAndFix);
            return Ok(report.solved(problem, status, objective, solution, time, ledger));
        }

        fixing.fix_all(solution.iter().filter(|(key, _)| stage.contains(&key.group())));
    }

    // Only reached without stages
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        heuristics::{exact, RunOutcome},
        models::builder::tests::tiny_plan,
        oracle::{testing::ReferenceOracle, SolveStatus},
        problem::tests::tiny,
    };

    #[test]
    fn two_stages_reach_the_reference_plan() {
        let problem = tiny();
        let mut oracle = ReferenceOracle::new(tiny_plan());
        let mut ledger = Ledger::new();
        let report = run(&problem, &mut oracle, &RelaxAndFixConfig::default(), &mut ledger).unwrap();

        assert_eq!(report.outcome, RunOutcome::Solved);
        assert_eq!(report.iterations, 2);
        assert_eq!(report.objective, Some(135.0));
        assert_eq!(report.lower_bound, Some(135.0));
        // the second window gets the first's share plus what it left unused
        assert_eq!(oracle.calls[0].1, 900.0);
        assert!(oracle.calls[1].1 > 1799.0);
    }

    #[test]
    fn single_stage_is_the_exact_model() {
        let problem = tiny();
        let config = RelaxAndFixConfig {
            stages: vec![VarGroup::BINARY.to_vec()],
            ..Default::default()
        };

        let mut oracle = ReferenceOracle::new(tiny_plan());
        let rf = run(&problem, &mut oracle, &config, &mut Ledger::new()).unwrap();
        let mut oracle = ReferenceOracle::new(tiny_plan());
        let exact = exact::run(&problem, &mut oracle, &Default::default(), &mut Ledger::new()).unwrap();
        assert_eq!(rf.objective, exact.objective);

        // and it is built from the same sub-model
        let mut policy = DomainPolicy::declared();
        for group in VarGroup::BINARY {
            policy.promote(group, Domain::Continuous);
        }
        for group in VarGroup::BINARY {
            policy.promote(group, Domain::Binary);
        }
        let fixing = FixingState::new();
        let staged = build_sub_model(&problem, &fixing, &policy, &ModelScope::Full);
        let full = build_sub_model(&problem, &fixing, &DomainPolicy::declared(), &ModelScope::Full);
        assert_eq!(staged.vars(), full.vars());
        assert_eq!(staged.constraints(), full.constraints());
    }

    #[test]
    fn infeasible_first_window_stops() {
        let problem = tiny();
        let mut oracle = ReferenceOracle::scripted(tiny_plan(), &[SolveStatus::Infeasible]);
        let mut ledger = Ledger::new();
        let report = run(&problem, &mut oracle, &RelaxAndFixConfig::default(), &mut ledger).unwrap();
        assert_eq!(report.outcome, RunOutcome::Infeasible);
        assert_eq!(report.iterations, 1);
        assert_eq!(oracle.calls.len(), 1);
        assert!(ledger.incumbent().is_none());
    }

    #[test]
    fn second_window_keeps_first_window_setups() {
        let problem = tiny();
        let mut oracle = ReferenceOracle::new(tiny_plan());
        let report = run(&problem, &mut oracle, &RelaxAndFixConfig::default(), &mut Ledger::new()).unwrap();
        let solution = report.solution.unwrap();
        assert_eq!(
            solution.value(&crate::models::VarKey::Setup { item: 0, period: 0 }),
            1.0
        );
    }
}
