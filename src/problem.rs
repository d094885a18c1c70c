use derive_more::Display;
use ndarray::{s, Array2, Array3};
use serde::{Deserialize, Serialize};

/// The type used for quantities (demand, inventory, capacity)
pub type Quantity = f64;
/// The type used for cost.
pub type Cost = f64;

pub type ItemIndex = usize;
pub type LocationIndex = usize;
pub type TimeIndex = usize;

/// An item that is produced and stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Item {
    /// Unit production cost
    production_cost: Cost,
    /// Cost of a setup in a period
    setup_cost: Cost,
    /// Unit holding cost per period
    holding_cost: Cost,
    /// Production capacity consumed per unit produced
    capacity_usage: Quantity,
    /// Storage capacity consumed per unit stored
    storage_usage: Quantity,
}

impl Item {
    pub fn new(
        production_cost: Cost,
        setup_cost: Cost,
        holding_cost: Cost,
        capacity_usage: Quantity,
        storage_usage: Quantity,
    ) -> Self {
        Item {
            production_cost,
            setup_cost,
            holding_cost,
            capacity_usage,
            storage_usage,
        }
    }

    pub fn production_cost(&self) -> Cost {
        self.production_cost
    }

    pub fn setup_cost(&self) -> Cost {
        self.setup_cost
    }

    pub fn holding_cost(&self) -> Cost {
        self.holding_cost
    }

    pub fn capacity_usage(&self) -> Quantity {
        self.capacity_usage
    }

    pub fn storage_usage(&self) -> Quantity {
        self.storage_usage
    }
}

/// A storage location
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Location {
    /// Storage capacity
    capacity: Quantity,
    /// Cost of using the location in a period
    usage_cost: Cost,
}

impl Location {
    pub fn new(capacity: Quantity, usage_cost: Cost) -> Self {
        Location {
            capacity,
            usage_cost,
        }
    }

    pub fn capacity(&self) -> Quantity {
        self.capacity
    }

    pub fn usage_cost(&self) -> Cost {
        self.usage_cost
    }
}

/// An instance of the lot-sizing problem with multiple storage locations.
/// Immutable for the duration of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Problem {
    /// The items, ordered by index
    items: Vec<Item>,
    /// The storage locations, ordered by index
    locations: Vec<Location>,
    /// Production capacity per period
    production_capacity: Vec<Quantity>,
    /// Demand, indexed by `[item, period]`
    demand: Array2<Quantity>,
    /// Handling cost when moving an item into a location, indexed by `[item, location]`
    handling_cost: Array2<Cost>,
    /// Whether an item may be stored in a location, indexed by `[item, location]`
    location_compatible: Array2<bool>,
    /// Whether two items may share a location, indexed by `[item, item]`
    item_compatible: Array2<bool>,
    /// Cost of moving an item between locations, indexed by `[item, from, to]`
    relocation_cost: Array3<Cost>,
}

#[derive(Debug, Display)]
pub enum ProblemConstructionError {
    /// The number of time steps must be strictly positive
    NoTimeSteps,
    /// There must be at least one item
    NoItems,
    /// There must be at least one location
    NoLocations,
    /// A parameter table does not have the expected shape
    #[display(
        fmt = "{} has shape {:?}, expected {:?}",
        table,
        actual,
        expected
    )]
    ShapeMismatch {
        table: &'static str,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },
    /// A parameter that must be non-negative is negative
    #[display(fmt = "{} is negative at {:?}", table, index)]
    Negative {
        table: &'static str,
        index: Vec<usize>,
    },
}

impl std::error::Error for ProblemConstructionError {}

impl Problem {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        items: Vec<Item>,
        locations: Vec<Location>,
        production_capacity: Vec<Quantity>,
        demand: Array2<Quantity>,
        handling_cost: Array2<Cost>,
        location_compatible: Array2<bool>,
        item_compatible: Array2<bool>,
        relocation_cost: Array3<Cost>,
    ) -> Result<Problem, ProblemConstructionError> {
        use ProblemConstructionError::*;
        let t = production_capacity.len();
        let i = items.len();
        let l = locations.len();

        if t == 0 {
            return Err(NoTimeSteps);
        }
        if i == 0 {
            return Err(NoItems);
        }
        if l == 0 {
            return Err(NoLocations);
        }

        let check = |table: &'static str, actual: &[usize], expected: &[usize]| {
            if actual != expected {
                Err(ShapeMismatch {
                    table,
                    expected: expected.to_vec(),
                    actual: actual.to_vec(),
                })
            } else {
                Ok(())
            }
        };

        check("demand", demand.shape(), &[i, t])?;
        check("handling_cost", handling_cost.shape(), &[i, l])?;
        check("location_compatible", location_compatible.shape(), &[i, l])?;
        check("item_compatible", item_compatible.shape(), &[i, i])?;
        check("relocation_cost", relocation_cost.shape(), &[i, l, l])?;

        if let Some(((i, t), _)) = demand.indexed_iter().find(|(_, d)| **d < 0.0) {
            return Err(Negative {
                table: "demand",
                index: vec![i, t],
            });
        }
        if let Some(t) = production_capacity.iter().position(|c| *c < 0.0) {
            return Err(Negative {
                table: "production_capacity",
                index: vec![t],
            });
        }
        if let Some(l) = locations.iter().position(|loc| loc.capacity() < 0.0) {
            return Err(Negative {
                table: "storage_capacity",
                index: vec![l],
            });
        }

        Ok(Problem {
            items,
            locations,
            production_capacity,
            demand,
            handling_cost,
            location_compatible,
            item_compatible,
            relocation_cost,
        })
    }

    /// The items of this problem. Ordered by index (continuous, starting at 0)
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// The storage locations of this problem. Ordered by index (continuous, starting at 0)
    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    /// The number of time steps in the problem
    pub fn timesteps(&self) -> usize {
        self.production_capacity.len()
    }

    pub fn item(&self, i: ItemIndex) -> &Item {
        &self.items[i]
    }

    pub fn location(&self, l: LocationIndex) -> &Location {
        &self.locations[l]
    }

    /// Production capacity in period `t`
    pub fn production_capacity(&self, t: TimeIndex) -> Quantity {
        self.production_capacity[t]
    }

    pub fn demand(&self, i: ItemIndex, t: TimeIndex) -> Quantity {
        self.demand[[i, t]]
    }

    pub fn handling_cost(&self, i: ItemIndex, l: LocationIndex) -> Cost {
        self.handling_cost[[i, l]]
    }

    pub fn location_compatible(&self, i: ItemIndex, l: LocationIndex) -> bool {
        self.location_compatible[[i, l]]
    }

    pub fn items_compatible(&self, i: ItemIndex, j: ItemIndex) -> bool {
        self.item_compatible[[i, j]]
    }

    pub fn relocation_cost(&self, i: ItemIndex, from: LocationIndex, to: LocationIndex) -> Cost {
        self.relocation_cost[[i, from, to]]
    }

    /// Demand of item `i` from period `t` to the end of the horizon.
    pub fn remaining_demand(&self, i: ItemIndex, t: TimeIndex) -> Quantity {
        self.demand.slice(s![i, t..]).sum()
    }

    /// The tightest valid upper bound on the inventory of item `i` in location `l` at period `t`:
    /// the smaller of the remaining demand and the number of units that fit in the location.
    pub fn big_m(&self, i: ItemIndex, l: LocationIndex, t: TimeIndex) -> Quantity {
        let remaining = self.remaining_demand(i, t);
        let usage = self.items[i].storage_usage();
        if usage > 0.0 {
            remaining.min(self.locations[l].capacity() / usage)
        } else {
            remaining
        }
    }
}
