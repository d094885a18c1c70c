use std::fmt::Display;

use itertools::iproduct;
use serde::{Deserialize, Serialize};

use crate::problem::{ItemIndex, LocationIndex, Problem, TimeIndex};

/// The domain of a decision variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Domain {
    /// Continuous and non-negative. Binary groups keep their upper bound of one when relaxed.
    Continuous,
    /// Zero or one
    Binary,
}

/// A family of decision variables sharing a meaning and a declared domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum VarGroup {
    /// Whether an item is set up in a period (Y)
    Setup,
    /// Amount of an item produced in one period to meet the demand of a later one (FL)
    Alloc,
    /// Inventory of an item held in a location at the end of a period (S)
    Inventory,
    /// Whether a location is used in a period (Z)
    LocationUse,
    /// Amount of an item moved into a location from production (Dp)
    Inflow,
    /// Amount of an item taken out of a location to meet demand (Dm)
    Outflow,
    /// Whether an item is assigned to a location in a period (W)
    Assign,
    /// Amount of an item moved between two locations (V)
    Reloc,
}

impl VarGroup {
    pub const ALL: [VarGroup; 8] = [
        VarGroup::Setup,
        VarGroup::Alloc,
        VarGroup::Inventory,
        VarGroup::LocationUse,
        VarGroup::Inflow,
        VarGroup::Outflow,
        VarGroup::Assign,
        VarGroup::Reloc,
    ];

    /// The groups whose declared domain is binary
    pub const BINARY: [VarGroup; 3] = [VarGroup::Setup, VarGroup::LocationUse, VarGroup::Assign];

    /// The domain the group has in the exact model
    pub fn declared_domain(&self) -> Domain {
        match self {
            VarGroup::Setup | VarGroup::LocationUse | VarGroup::Assign => Domain::Binary,
            _ => Domain::Continuous,
        }
    }

    /// Upper bound of every variable in the group
    pub fn upper_bound(&self) -> f64 {
        match self.declared_domain() {
            Domain::Binary => 1.0,
            Domain::Continuous => f64::INFINITY,
        }
    }

    /// The short name used when listing solutions
    pub fn label(&self) -> &'static str {
        match self {
            VarGroup::Setup => "Y",
            VarGroup::Alloc => "FL",
            VarGroup::Inventory => "S",
            VarGroup::LocationUse => "Z",
            VarGroup::Inflow => "Dp",
            VarGroup::Outflow => "Dm",
            VarGroup::Assign => "W",
            VarGroup::Reloc => "V",
        }
    }
}

/// Identifies a single decision variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum VarKey {
    Setup {
        item: ItemIndex,
        period: TimeIndex,
    },
    /// Produced in `period` to meet the demand of `target >= period`
    Alloc {
        item: ItemIndex,
        period: TimeIndex,
        target: TimeIndex,
    },
    Inventory {
        item: ItemIndex,
        location: LocationIndex,
        period: TimeIndex,
    },
    LocationUse {
        location: LocationIndex,
        period: TimeIndex,
    },
    Inflow {
        item: ItemIndex,
        location: LocationIndex,
        period: TimeIndex,
    },
    Outflow {
        item: ItemIndex,
        location: LocationIndex,
        period: TimeIndex,
    },
    Assign {
        item: ItemIndex,
        location: LocationIndex,
        period: TimeIndex,
    },
    /// Moved from `from` to `to != from`
    Reloc {
        item: ItemIndex,
        from: LocationIndex,
        to: LocationIndex,
        period: TimeIndex,
    },
}

impl VarKey {
    pub fn group(&self) -> VarGroup {
        match self {
            VarKey::Setup { .. } => VarGroup::Setup,
            VarKey::Alloc { .. } => VarGroup::Alloc,
            VarKey::Inventory { .. } => VarGroup::Inventory,
            VarKey::LocationUse { .. } => VarGroup::LocationUse,
            VarKey::Inflow { .. } => VarGroup::Inflow,
            VarKey::Outflow { .. } => VarGroup::Outflow,
            VarKey::Assign { .. } => VarGroup::Assign,
            VarKey::Reloc { .. } => VarGroup::Reloc,
        }
    }

    /// The period the variable belongs to. For allocations this is the production period.
    pub fn period(&self) -> TimeIndex {
        match *self {
            VarKey::Setup { period, .. }
            | VarKey::Alloc { period, .. }
            | VarKey::Inventory { period, .. }
            | VarKey::LocationUse { period, .. }
            | VarKey::Inflow { period, .. }
            | VarKey::Outflow { period, .. }
            | VarKey::Assign { period, .. }
            | VarKey::Reloc { period, .. } => period,
        }
    }

    pub fn is_binary(&self) -> bool {
        self.group().declared_domain() == Domain::Binary
    }
}

/// Formats with 1-based indices, e.g. `S_1_2_3`
impl Display for VarKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = self.group().label();
        match *self {
            VarKey::Setup { item, period } => write!(f, "{label}_{}_{}", item + 1, period + 1),
            VarKey::Alloc {
                item,
                period,
                target,
            } => write!(f, "{label}_{}_{}_{}", item + 1, period + 1, target + 1),
            VarKey::LocationUse { location, period } => {
                write!(f, "{label}_{}_{}", location + 1, period + 1)
            }
            VarKey::Inventory {
                item,
                location,
                period,
            }
            | VarKey::Inflow {
                item,
                location,
                period,
            }
            | VarKey::Outflow {
                item,
                location,
                period,
            }
            | VarKey::Assign {
                item,
                location,
                period,
            } => write!(f, "{label}_{}_{}_{}", item + 1, location + 1, period + 1),
            VarKey::Reloc {
                item,
                from,
                to,
                period,
            } => write!(
                f,
                "{label}_{}_{}_{}_{}",
                item + 1,
                from + 1,
                to + 1,
                period + 1
            ),
        }
    }
}

/// Every variable of `group` that exists for `problem`.
pub fn keys(problem: &Problem, group: VarGroup) -> Vec<VarKey> {
    let t = problem.timesteps();
    let n = problem.items().len();
    let m = problem.locations().len();

    match group {
        VarGroup::Setup => iproduct!(0..n, 0..t)
            .map(|(item, period)| VarKey::Setup { item, period })
            .collect(),
        VarGroup::Alloc => iproduct!(0..n, 0..t, 0..t)
            .filter(|(_, period, target)| target >= period)
            .map(|(item, period, target)| VarKey::Alloc {
                item,
                period,
                target,
            })
            .collect(),
        VarGroup::LocationUse => iproduct!(0..m, 0..t)
            .map(|(location, period)| VarKey::LocationUse { location, period })
            .collect(),
        VarGroup::Reloc => iproduct!(0..n, 0..m, 0..m, 0..t)
            .filter(|(_, from, to, _)| from != to)
            .map(|(item, from, to, period)| VarKey::Reloc {
                item,
                from,
                to,
                period,
            })
            .collect(),
        VarGroup::Inventory | VarGroup::Inflow | VarGroup::Outflow | VarGroup::Assign => {
            iproduct!(0..n, 0..m, 0..t)
                .map(|(item, location, period)| match group {
                    VarGroup::Inventory => VarKey::Inventory {
                        item,
                        location,
                        period,
                    },
                    VarGroup::Inflow => VarKey::Inflow {
                        item,
                        location,
                        period,
                    },
                    VarGroup::Outflow => VarKey::Outflow {
                        item,
                        location,
                        period,
                    },
                    _ => VarKey::Assign {
                        item,
                        location,
                        period,
                    },
                })
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::tests::small;

    #[test]
    fn allocations_only_look_forward() {
        let problem = small();
        let alloc = keys(&problem, VarGroup::Alloc);
        // 2 items, 3 + 2 + 1 (period, target) pairs each
        assert_eq!(alloc.len(), 12);
        assert!(alloc.iter().all(|k| match k {
            VarKey::Alloc { period, target, .. } => target >= period,
            _ => false,
        }));
    }

    #[test]
    fn no_relocation_to_same_location() {
        let problem = small();
        let reloc = keys(&problem, VarGroup::Reloc);
        assert_eq!(reloc.len(), 2 * 2 * 3);
    }

    #[test]
    fn labels_are_one_based() {
        let key = VarKey::Reloc {
            item: 0,
            from: 1,
            to: 0,
            period: 2,
        };
        assert_eq!(key.to_string(), "V_1_2_1_3");
        assert_eq!(VarKey::Setup { item: 1, period: 0 }.to_string(), "Y_2_1");
    }
}
