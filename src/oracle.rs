use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::{models::SubModel, solution::Solution};

/// Termination status of a single solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
pub enum SolveStatus {
    /// Proven optimal
    Optimal,
    /// A feasible solution was found, but optimality was not proven within the time limit
    Feasible,
    /// Proven infeasible
    Infeasible,
    /// Neither a solution nor a proof of infeasibility within the time limit
    Unknown,
}

impl SolveStatus {
    /// Whether the outcome carries a solution
    pub fn is_usable(&self) -> bool {
        matches!(self, SolveStatus::Optimal | SolveStatus::Feasible)
    }
}

/// The result of handing a sub-model to a solver.
#[derive(Debug, Clone)]
pub struct OracleOutcome {
    pub status: SolveStatus,
    /// Objective of the returned solution. Present iff the status is usable.
    pub objective: Option<f64>,
    /// A valid lower bound on the optimum of the sub-model, if the solver has one
    pub bound: Option<f64>,
    /// Values for every variable of the sub-model. Present iff the status is usable.
    pub solution: Option<Solution>,
}

impl OracleOutcome {
    pub fn failed(status: SolveStatus) -> Self {
        OracleOutcome {
            status,
            objective: None,
            bound: None,
            solution: None,
        }
    }

    /// The objective and solution, if the solve produced one
    pub fn into_usable(self) -> Option<(f64, Solution)> {
        if !self.status.is_usable() {
            return None;
        }
        self.objective.zip(self.solution)
    }
}

/// An unexpected failure of the solver itself, as opposed to an infeasible or unsolved model.
#[derive(Debug, Display)]
pub enum OracleError {
    /// The crate was built without a MILP backend
    #[display(fmt = "no MILP backend available; rebuild with `--features gurobi`")]
    NoBackend,
    #[display(fmt = "solver error: {}", _0)]
    Backend(String),
}

impl std::error::Error for OracleError {}

/// A MILP solver. Solves `model` (minimisation) within `time_limit` seconds.
pub trait MilpOracle {
    fn solve(&mut self, model: &SubModel, time_limit: f64) -> Result<OracleOutcome, OracleError>;
}

impl<O: MilpOracle + ?Sized> MilpOracle for &mut O {
    fn solve(&mut self, model: &SubModel, time_limit: f64) -> Result<OracleOutcome, OracleError> {
        (**self).solve(model, time_limit)
    }
}

/// Stands in for a solver when none was compiled in. Every solve fails with `NoBackend`.
#[derive(Debug, Default, Clone, Copy)]
pub struct Unavailable;

impl MilpOracle for Unavailable {
    fn solve(&mut self, _: &SubModel, _: f64) -> Result<OracleOutcome, OracleError> {
        Err(OracleError::NoBackend)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;

    use super::*;

    /// Answers every sub-model with a fixed reference plan: optimal if the plan satisfies the
    /// sub-model, infeasible otherwise. Scripted statuses, if any, are returned first. Queued
    /// answers replace the reference plan for one call each, in call order.
    #[derive(Debug, Clone)]
    pub struct ReferenceOracle {
        pub reference: Solution,
        pub script: VecDeque<SolveStatus>,
        pub answers: VecDeque<Solution>,
        /// (model name, time limit) of every call
        pub calls: Vec<(String, f64)>,
        /// Every sub-model handed over
        pub models: Vec<SubModel>,
    }

    impl ReferenceOracle {
        pub fn new(reference: Solution) -> Self {
            ReferenceOracle {
                reference,
                script: VecDeque::new(),
                answers: VecDeque::new(),
                calls: Vec::new(),
                models: Vec::new(),
            }
        }

        pub fn scripted(reference: Solution, script: &[SolveStatus]) -> Self {
            ReferenceOracle {
                script: script.iter().copied().collect(),
                ..Self::new(reference)
            }
        }

        pub fn answering<I>(reference: Solution, answers: I) -> Self
        where
            I: IntoIterator<Item = Solution>,
        {
            ReferenceOracle {
                answers: answers.into_iter().collect(),
                ..Self::new(reference)
            }
        }

        /// Names of the `fix_` constraints of the `call`-th sub-model
        pub fn pins(&self, call: usize) -> Vec<&str> {
            self.models[call]
                .constraints()
                .iter()
                .map(|c| c.name.as_str())
                .filter(|name| name.starts_with("fix_"))
                .collect()
        }
    }

    impl MilpOracle for ReferenceOracle {
        fn solve(
            &mut self,
            model: &SubModel,
            time_limit: f64,
        ) -> Result<OracleOutcome, OracleError> {
            self.calls.push((model.name().to_string(), time_limit));
            self.models.push(model.clone());
            let plan = self.answers.pop_front();

            if let Some(status) = self.script.pop_front() {
                if !status.is_usable() {
                    return Ok(OracleOutcome::failed(status));
                }
            }

            let plan = plan.as_ref().unwrap_or(&self.reference);
            let candidate: Solution = model
                .vars()
                .iter()
                .map(|v| (v.key, plan.value(&v.key)))
                .collect();

            if !model.is_satisfied_by(&candidate, 1e-6) {
                return Ok(OracleOutcome::failed(SolveStatus::Infeasible));
            }

            let objective = model.evaluate(&candidate);
            Ok(OracleOutcome {
                status: SolveStatus::Optimal,
                objective: Some(objective),
                bound: Some(objective),
                solution: Some(candidate),
            })
        }
    }

    #[test]
    fn reference_answers_only_models_it_satisfies() {
        use crate::{
            fixing::{DomainPolicy, FixingState},
            models::{build_sub_model, builder::tests::tiny_plan, ModelScope, VarKey},
            problem::tests::tiny,
        };

        let problem = tiny();
        let mut oracle = ReferenceOracle::new(tiny_plan());
        let mut fixing = FixingState::new();
        let policy = DomainPolicy::declared();

        let model = build_sub_model(&problem, &fixing, &policy, &ModelScope::Full);
        let outcome = oracle.solve(&model, 10.0).unwrap();
        assert_eq!(outcome.status, SolveStatus::Optimal);
        assert_eq!(outcome.objective, Some(135.0));

        fixing.fix(VarKey::Setup { item: 0, period: 0 }, 0.0);
        let model = build_sub_model(&problem, &fixing, &policy, &ModelScope::Full);
        let outcome = oracle.solve(&model, 10.0).unwrap();
        assert_eq!(outcome.status, SolveStatus::Infeasible);
        assert!(outcome.into_usable().is_none());
        assert_eq!(oracle.calls.len(), 2);
    }
}
