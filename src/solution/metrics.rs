use serde::Serialize;

use crate::{
    models::variables::{VarGroup, VarKey},
    problem::{Cost, Problem, Quantity},
    utils::EPSILON,
};

use super::Solution;

/// Cost breakdown and storage utilisation of a complete plan. Values at or below
/// `utils::EPSILON` are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Metrics {
    pub setup_cost: Cost,
    pub setup_count: usize,
    pub production_cost: Cost,
    pub inventory_cost: Cost,
    pub inventory_count: usize,
    pub handling_cost: Cost,
    pub handling_count: usize,
    pub location_cost: Cost,
    pub location_count: usize,
    pub relocation_cost: Cost,
    pub relocation_count: usize,
    /// Storage capacity of the locations in use, summed over periods
    pub open_space: Quantity,
    /// Storage capacity consumed by inventory, summed over periods
    pub used_space: Quantity,
    /// `100 · used_space / open_space`
    pub used_percentage: f64,
}

impl Metrics {
    pub fn of(problem: &Problem, solution: &Solution) -> Self {
        let mut m = Metrics::default();

        for (key, value) in solution.iter().filter(|(_, v)| *v > EPSILON) {
            match *key {
                VarKey::Setup { item, .. } => {
                    m.setup_cost += problem.item(item).setup_cost() * value;
                    m.setup_count += 1;
                }
                VarKey::Alloc { item, .. } => {
                    m.production_cost += problem.item(item).production_cost() * value;
                }
                VarKey::Inventory { item, .. } => {
                    let it = problem.item(item);
                    m.inventory_cost += it.holding_cost() * value;
                    m.inventory_count += 1;
                    m.used_space += it.storage_usage() * value;
                }
                VarKey::Inflow { item, location, .. } => {
                    m.handling_cost += problem.handling_cost(item, location) * value;
                    m.handling_count += 1;
                }
                VarKey::LocationUse { location, .. } => {
                    let loc = problem.location(location);
                    m.location_cost += loc.usage_cost() * value;
                    m.location_count += 1;
                    m.open_space += loc.capacity() * value;
                }
                VarKey::Reloc { item, from, to, .. } => {
                    m.relocation_cost += problem.relocation_cost(item, from, to) * value;
                    m.relocation_count += 1;
                }
                VarKey::Outflow { .. } | VarKey::Assign { .. } => (),
            }
        }

        m.used_percentage = if m.open_space > 0.0 {
            100.0 * m.used_space / m.open_space
        } else {
            0.0
        };

        m
    }

    pub fn total_cost(&self) -> Cost {
        self.setup_cost
            + self.production_cost
            + self.inventory_cost
            + self.handling_cost
            + self.location_cost
            + self.relocation_cost
    }
}

/// Total quantity held in inventory by `solution`
pub fn total_inventory(solution: &Solution) -> Quantity {
    solution.nonzero(VarGroup::Inventory).map(|(_, v)| v).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{models::builder::tests::tiny_plan, problem::tests::tiny};

    #[test]
    fn breakdown_of_tiny_plan() {
        let problem = tiny();
        let metrics = Metrics::of(&problem, &tiny_plan());
        assert_eq!(metrics.setup_cost, 100.0);
        assert_eq!(metrics.setup_count, 1);
        assert_eq!(metrics.production_cost, 15.0);
        assert_eq!(metrics.inventory_cost, 10.0);
        assert_eq!(metrics.location_cost, 10.0);
        assert_eq!(metrics.location_count, 1);
        assert_eq!(metrics.handling_cost, 0.0);
        assert_eq!(metrics.handling_count, 1);
        assert_eq!(metrics.open_space, 50.0);
        assert_eq!(metrics.used_space, 5.0);
        assert_eq!(metrics.used_percentage, 10.0);
        assert_eq!(metrics.total_cost(), 135.0);
        assert_eq!(total_inventory(&tiny_plan()), 5.0);
    }
}
