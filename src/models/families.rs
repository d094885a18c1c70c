//! The constraint families and objectives of the lot-sizing model. Each function adds one
//! family to a `SubModel` whose variables have already been declared.

use itertools::iproduct;
use log::trace;
use ndarray::Array2;

use crate::problem::{Cost, Problem, Quantity};

use super::{
    submodel::{LinExpr, Sense, SubModel},
    variables::VarKey,
};

/// `Σ_{τ ≤ t} Alloc(i, τ, t) = d(i, t)`
pub fn demand(model: &mut SubModel, problem: &Problem) {
    let t = problem.timesteps();
    let n = problem.items().len();

    for (i, t) in iproduct!(0..n, 0..t) {
        let lhs = (0..=t)
            .map(|tau| {
                let key = VarKey::Alloc {
                    item: i,
                    period: tau,
                    target: t,
                };
                (1.0, key)
            })
            .collect();
        model.add_constr(format!("demand_{i}_{t}"), lhs, Sense::Eq, problem.demand(i, t));
    }
}

/// Production not consumed in its own period enters storage:
/// `Σ_{τ ≥ t} Alloc(i, t, τ) - Σ_l Inflow(i, l, t) + Σ_l Outflow(i, l, t) = d(i, t)`
pub fn production_flow(model: &mut SubModel, problem: &Problem) {
    let t = problem.timesteps();
    let n = problem.items().len();
    let m = problem.locations().len();

    for (i, t0) in iproduct!(0..n, 0..t) {
        let mut lhs = produced(i, t0, t);
        for l in 0..m {
            lhs.add_term(-1.0, inflow(i, l, t0));
            lhs.add_term(1.0, outflow(i, l, t0));
        }
        model.add_constr(
            format!("production_flow_{i}_{t0}"),
            lhs,
            Sense::Eq,
            problem.demand(i, t0),
        );
    }
}

/// Inventory balance per location, including relocations. No carry-in at the first period.
pub fn location_balance(model: &mut SubModel, problem: &Problem) {
    let t = problem.timesteps();
    let n = problem.items().len();
    let m = problem.locations().len();

    for (i, l, t) in iproduct!(0..n, 0..m, 0..t) {
        let mut lhs = LinExpr::new();
        if t > 0 {
            lhs.add_term(1.0, inventory(i, l, t - 1));
        }
        lhs.add_term(1.0, inflow(i, l, t))
            .add_term(-1.0, inventory(i, l, t))
            .add_term(-1.0, outflow(i, l, t));

        for k in (0..m).filter(|&k| k != l) {
            lhs.add_term(1.0, reloc(i, k, l, t));
            lhs.add_term(-1.0, reloc(i, l, k, t));
        }

        model.add_constr(format!("location_balance_{i}_{l}_{t}"), lhs, Sense::Eq, 0.0);
    }
}

/// `Alloc(i, t, τ) ≤ d(i, τ) · Setup(i, t)`
pub fn setup(model: &mut SubModel, problem: &Problem) {
    let t = problem.timesteps();
    let n = problem.items().len();

    for (i, t, tau) in iproduct!(0..n, 0..t, 0..t).filter(|(_, t, tau)| tau >= t) {
        let mut lhs = LinExpr::new();
        lhs.add_term(1.0, alloc(i, t, tau))
            .add_term(-problem.demand(i, tau), VarKey::Setup { item: i, period: t });
        model.add_constr(format!("setup_{i}_{t}_{tau}"), lhs, Sense::Le, 0.0);
    }
}

/// `Σ_i vt_i · Σ_{τ ≥ t} Alloc(i, t, τ) ≤ Cap_t`
pub fn production_capacity(model: &mut SubModel, problem: &Problem) {
    let t = problem.timesteps();
    let n = problem.items().len();

    for t0 in 0..t {
        let lhs = iproduct!(0..n, t0..t)
            .map(|(i, tau)| (problem.item(i).capacity_usage(), alloc(i, t0, tau)))
            .collect();
        model.add_constr(
            format!("capacity_{t0}"),
            lhs,
            Sense::Le,
            problem.production_capacity(t0),
        );
    }
}

/// `Inventory(i, l, t) ≤ BigM(i, l, t) · Assign(i, l, t)`
pub fn storage_allocation(model: &mut SubModel, problem: &Problem) {
    let t = problem.timesteps();
    let n = problem.items().len();
    let m = problem.locations().len();

    for (i, l, t) in iproduct!(0..n, 0..m, 0..t) {
        let mut lhs = LinExpr::new();
        lhs.add_term(1.0, inventory(i, l, t))
            .add_term(-problem.big_m(i, l, t), assign(i, l, t));
        model.add_constr(format!("storage_allocation_{i}_{l}_{t}"), lhs, Sense::Le, 0.0);
    }
}

/// `Σ_i cs_i · Inventory(i, l, t) ≤ H_l · LocationUse(l, t)`
pub fn storage_capacity(model: &mut SubModel, problem: &Problem) {
    let t = problem.timesteps();
    let n = problem.items().len();
    let m = problem.locations().len();

    for (l, t) in iproduct!(0..m, 0..t) {
        let mut lhs: LinExpr = (0..n)
            .map(|i| (problem.item(i).storage_usage(), inventory(i, l, t)))
            .collect();
        lhs.add_term(
            -problem.location(l).capacity(),
            VarKey::LocationUse {
                location: l,
                period: t,
            },
        );
        model.add_constr(format!("storage_capacity_{l}_{t}"), lhs, Sense::Le, 0.0);
    }
}

/// `Assign(i, l, t) ≤ alpha(i, l)`
pub fn location_compatibility(model: &mut SubModel, problem: &Problem) {
    let t = problem.timesteps();
    let n = problem.items().len();
    let m = problem.locations().len();

    for (i, l, t) in iproduct!(0..n, 0..m, 0..t) {
        let rhs = if problem.location_compatible(i, l) { 1.0 } else { 0.0 };
        let lhs = [(1.0, assign(i, l, t))].into_iter().collect();
        model.add_constr(format!("location_compat_{i}_{l}_{t}"), lhs, Sense::Le, rhs);
    }
}

/// `Assign(i, l, t) + Assign(j, l, t) ≤ beta(i, j) + 1` for `i ≤ j`
pub fn item_compatibility(model: &mut SubModel, problem: &Problem) {
    let t = problem.timesteps();
    let n = problem.items().len();
    let m = problem.locations().len();

    for (i, j, l, t) in iproduct!(0..n, 0..n, 0..m, 0..t).filter(|(i, j, _, _)| j >= i) {
        let beta = if problem.items_compatible(i, j) { 1.0 } else { 0.0 };
        let mut lhs = LinExpr::new();
        lhs.add_term(1.0, assign(i, l, t)).add_term(1.0, assign(j, l, t));
        model.add_constr(format!("item_compat_{i}_{j}_{l}_{t}"), lhs, Sense::Le, beta + 1.0);
    }
}

/// Production flow of the production-only model, with storage aggregated over locations
/// and no relocations:
/// `Σ_{τ ≥ t} Alloc(i, t, τ) - d(i, t) - Σ_l Inventory(i, l, t) + Σ_l Inventory(i, l, t - 1) = 0`
pub fn aggregate_flow(model: &mut SubModel, problem: &Problem) {
    let t = problem.timesteps();
    let n = problem.items().len();
    let m = problem.locations().len();

    for (i, t0) in iproduct!(0..n, 0..t) {
        let mut lhs = produced(i, t0, t);
        for l in 0..m {
            lhs.add_term(-1.0, inventory(i, l, t0));
            if t0 > 0 {
                lhs.add_term(1.0, inventory(i, l, t0 - 1));
            }
        }
        model.add_constr(
            format!("aggregate_flow_{i}_{t0}"),
            lhs,
            Sense::Eq,
            problem.demand(i, t0),
        );
    }
}

/// Storage capacity with every location assumed open: `Σ_i cs_i · Inventory(i, l, t) ≤ H_l`
pub fn open_storage_capacity(model: &mut SubModel, problem: &Problem) {
    let t = problem.timesteps();
    let n = problem.items().len();
    let m = problem.locations().len();

    for (l, t) in iproduct!(0..m, 0..t) {
        let lhs = (0..n)
            .map(|i| (problem.item(i).storage_usage(), inventory(i, l, t)))
            .collect();
        model.add_constr(
            format!("open_storage_capacity_{l}_{t}"),
            lhs,
            Sense::Le,
            problem.location(l).capacity(),
        );
    }
}

/// `Σ_l Inventory(i, l, t) = target[i, t]`
pub fn aggregate_inventory(model: &mut SubModel, problem: &Problem, target: &Array2<Quantity>) {
    let t = problem.timesteps();
    let n = problem.items().len();
    let m = problem.locations().len();

    for (i, t) in iproduct!(0..n, 0..t) {
        let lhs = (0..m).map(|l| (1.0, inventory(i, l, t))).collect();
        model.add_constr(
            format!("aggregate_inventory_{i}_{t}"),
            lhs,
            Sense::Eq,
            target[[i, t]],
        );
    }
}

/// Every family of the exact model
pub fn full(model: &mut SubModel, problem: &Problem) {
    demand(model, problem);
    production_flow(model, problem);
    location_balance(model, problem);
    setup(model, problem);
    production_capacity(model, problem);
    storage_allocation(model, problem);
    storage_capacity(model, problem);
    location_compatibility(model, problem);
    item_compatibility(model, problem);
    trace!(
        "{}: {} constraints over {} variables",
        model.name(),
        model.constraints().len(),
        model.vars().len()
    );
}

/// The families of the production-only model
pub fn production(model: &mut SubModel, problem: &Problem) {
    demand(model, problem);
    setup(model, problem);
    production_capacity(model, problem);
    aggregate_flow(model, problem);
    open_storage_capacity(model, problem);
    trace!(
        "{}: {} constraints over {} variables",
        model.name(),
        model.constraints().len(),
        model.vars().len()
    );
}

/// setup + production + holding + handling + location usage + relocation
pub fn full_objective(problem: &Problem) -> LinExpr {
    let t = problem.timesteps();
    let n = problem.items().len();
    let m = problem.locations().len();
    let mut obj = production_costs(problem);

    for (i, l, t) in iproduct!(0..n, 0..m, 0..t) {
        obj.add_term(problem.item(i).holding_cost(), inventory(i, l, t));
        obj.add_term(problem.handling_cost(i, l), inflow(i, l, t));
    }
    for (l, t) in iproduct!(0..m, 0..t) {
        let key = VarKey::LocationUse {
            location: l,
            period: t,
        };
        obj.add_term(problem.location(l).usage_cost(), key);
    }
    for (i, l, k, t) in iproduct!(0..n, 0..m, 0..m, 0..t).filter(|(_, l, k, _)| l != k) {
        obj.add_term(problem.relocation_cost(i, l, k), reloc(i, l, k, t));
    }

    obj
}

/// setup + production + holding, plus a proxy for location usage, `g_l · cs_i / H_l`, and the
/// estimated handling cost per unit of inventory.
pub fn production_objective(problem: &Problem, estimated_handling: &Array2<Cost>) -> LinExpr {
    let t = problem.timesteps();
    let n = problem.items().len();
    let m = problem.locations().len();
    let mut obj = production_costs(problem);

    for (i, l, t) in iproduct!(0..n, 0..m, 0..t) {
        let item = problem.item(i);
        let location = problem.location(l);
        let proxy = if location.capacity() > 0.0 {
            location.usage_cost() * item.storage_usage() / location.capacity()
        } else {
            0.0
        };
        let unit = item.holding_cost() + proxy + estimated_handling[[i, l]];
        obj.add_term(unit, inventory(i, l, t));
    }

    obj
}

fn production_costs(problem: &Problem) -> LinExpr {
    let t = problem.timesteps();
    let n = problem.items().len();
    let mut obj = LinExpr::new();

    for (i, t0) in iproduct!(0..n, 0..t) {
        let item = problem.item(i);
        obj.add_term(item.setup_cost(), VarKey::Setup { item: i, period: t0 });
        for tau in t0..t {
            obj.add_term(item.production_cost(), alloc(i, t0, tau));
        }
    }

    obj
}

/// `Σ_{τ ≥ t} Alloc(i, t, τ)` over a horizon of `t_max` periods
fn produced(i: usize, t: usize, t_max: usize) -> LinExpr {
    (t..t_max).map(|tau| (1.0, alloc(i, t, tau))).collect()
}

fn alloc(item: usize, period: usize, target: usize) -> VarKey {
    VarKey::Alloc {
        item,
        period,
        target,
    }
}

fn inventory(item: usize, location: usize, period: usize) -> VarKey {
    VarKey::Inventory {
        item,
        location,
        period,
    }
}

fn inflow(item: usize, location: usize, period: usize) -> VarKey {
    VarKey::Inflow {
        item,
        location,
        period,
    }
}

fn outflow(item: usize, location: usize, period: usize) -> VarKey {
    VarKey::Outflow {
        item,
        location,
        period,
    }
}

fn assign(item: usize, location: usize, period: usize) -> VarKey {
    VarKey::Assign {
        item,
        location,
        period,
    }
}

fn reloc(item: usize, from: usize, to: usize, period: usize) -> VarKey {
    VarKey::Reloc {
        item,
        from,
        to,
        period,
    }
}
