use log::trace;
use ndarray::Array2;

use crate::{
    fixing::{DomainPolicy, FixingState},
    problem::{Cost, Problem, Quantity},
};

use super::{
    families,
    submodel::{LinExpr, Sense, SubModel},
    variables::{self, VarGroup},
};

/// Which of the two models a sub-model is cut from.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelScope {
    /// The complete model
    Full,
    /// The complete model where the total inventory of every item in every period, summed
    /// over locations, is pinned. Indexed by `[item, period]`.
    PinnedInventory(Array2<Quantity>),
    /// Production and aggregate inventory only. Location usage is replaced by a per-unit proxy
    /// and handling by an estimated per-unit cost, indexed by `[item, location]`.
    Production { estimated_handling: Array2<Cost> },
}

impl ModelScope {
    pub fn name(&self) -> &'static str {
        match self {
            ModelScope::Full => "full",
            ModelScope::PinnedInventory(_) => "pinned-inventory",
            ModelScope::Production { .. } => "production",
        }
    }

    /// The variable groups present in the scope
    pub fn groups(&self) -> &'static [VarGroup] {
        match self {
            ModelScope::Full | ModelScope::PinnedInventory(_) => &VarGroup::ALL,
            ModelScope::Production { .. } => {
                &[VarGroup::Setup, VarGroup::Alloc, VarGroup::Inventory]
            }
        }
    }
}

/// Build the sub-model for `scope`, with domains from `policy` and `fixing`, and an equality
/// constraint `fix_<var>` for every pinned variable that exists in the scope.
pub fn build_sub_model(
    problem: &Problem,
    fixing: &FixingState,
    policy: &DomainPolicy,
    scope: &ModelScope,
) -> SubModel {
    let mut model = SubModel::new(scope.name());

    for group in scope.groups() {
        for key in variables::keys(problem, *group) {
            model.add_var(key, fixing.domain(&key, policy), 0.0, group.upper_bound());
        }
    }

    match scope {
        ModelScope::Full => {
            families::full(&mut model, problem);
            model.set_objective(families::full_objective(problem));
        }
        ModelScope::PinnedInventory(target) => {
            families::full(&mut model, problem);
            families::aggregate_inventory(&mut model, problem, target);
            model.set_objective(families::full_objective(problem));
        }
        ModelScope::Production { estimated_handling } => {
            families::production(&mut model, problem);
            model.set_objective(families::production_objective(problem, estimated_handling));
        }
    }

    let mut pins = 0;
    for (key, value) in fixing.pinned() {
        if model.contains(key) {
            let mut lhs = LinExpr::new();
            lhs.add_term(1.0, *key);
            model.add_constr(format!("fix_{key}"), lhs, Sense::Eq, value);
            pins += 1;
        }
    }

    trace!(
        "built {} model (fixing v{}): {} variables, {} constraints, {} pinned",
        model.name(),
        fixing.version(),
        model.vars().len(),
        model.constraints().len(),
        pins
    );

    model
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::{
        models::variables::{Domain, VarKey},
        problem::tests::{small, tiny},
        solution::Solution,
    };

    /// A feasible plan for `tiny`: produce everything in the first period and store the
    /// second period's demand in the only location.
    pub fn tiny_plan() -> Solution {
        [
            (VarKey::Setup { item: 0, period: 0 }, 1.0),
            (
                VarKey::Alloc {
                    item: 0,
                    period: 0,
                    target: 0,
                },
                10.0,
            ),
            (
                VarKey::Alloc {
                    item: 0,
                    period: 0,
                    target: 1,
                },
                5.0,
            ),
            (
                VarKey::Inventory {
                    item: 0,
                    location: 0,
                    period: 0,
                },
                5.0,
            ),
            (
                VarKey::Inflow {
                    item: 0,
                    location: 0,
                    period: 0,
                },
                5.0,
            ),
            (
                VarKey::Outflow {
                    item: 0,
                    location: 0,
                    period: 1,
                },
                5.0,
            ),
            (
                VarKey::LocationUse {
                    location: 0,
                    period: 0,
                },
                1.0,
            ),
            (
                VarKey::Assign {
                    item: 0,
                    location: 0,
                    period: 0,
                },
                1.0,
            ),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn plan_is_feasible_for_full_model() {
        let problem = tiny();
        let model = build_sub_model(
            &problem,
            &FixingState::new(),
            &DomainPolicy::declared(),
            &ModelScope::Full,
        );
        let plan = tiny_plan();
        assert!(model.is_satisfied_by(&plan, 1e-9));
        // setup 100 + production 15 + holding 2 * 5 + location 10
        assert_eq!(model.evaluate(&plan), 135.0);
    }

    #[test]
    fn plan_is_feasible_for_production_model() {
        let problem = tiny();
        let scope = ModelScope::Production {
            estimated_handling: Array2::zeros((1, 1)),
        };
        let model = build_sub_model(
            &problem,
            &FixingState::new(),
            &DomainPolicy::declared(),
            &scope,
        );
        let plan = tiny_plan();
        assert!(model.is_satisfied_by(&plan, 1e-9));
        // setup 100 + production 15 + (holding 2 + proxy 10 / 50) * 5
        assert!((model.evaluate(&plan) - 126.0).abs() < 1e-9);
        assert!(!model.contains(&VarKey::LocationUse {
            location: 0,
            period: 0
        }));
    }

    #[test]
    fn pins_become_equalities() {
        let problem = tiny();
        let mut fixing = FixingState::new();
        let y = VarKey::Setup { item: 0, period: 1 };
        fixing.fix(y, 1.0);
        let model = build_sub_model(&problem, &fixing, &DomainPolicy::declared(), &ModelScope::Full);
        let constr = model.constraint("fix_Y_1_2").unwrap();
        assert_eq!(constr.sense, Sense::Eq);
        assert_eq!(constr.rhs, 1.0);
        assert!(!model.is_satisfied_by(&tiny_plan(), 1e-9));
    }

    #[test]
    fn policy_decides_domains() {
        let problem = small();
        let model = build_sub_model(
            &problem,
            &FixingState::new(),
            &DomainPolicy::relaxed(),
            &ModelScope::Full,
        );
        assert!(!model.is_mip());
        let y = model.var(&VarKey::Setup { item: 0, period: 0 }).unwrap();
        assert_eq!(y.domain, Domain::Continuous);
        assert_eq!(y.ub, 1.0);
    }

    #[test]
    fn aggregate_inventory_is_pinned() {
        let problem = tiny();
        let target = tiny_plan().aggregate_inventory(&problem);
        let scope = ModelScope::PinnedInventory(target);
        let model = build_sub_model(
            &problem,
            &FixingState::new(),
            &DomainPolicy::declared(),
            &scope,
        );
        assert!(model.is_satisfied_by(&tiny_plan(), 1e-9));
        assert_eq!(model.constraint("aggregate_inventory_0_0").unwrap().rhs, 5.0);
    }
}
