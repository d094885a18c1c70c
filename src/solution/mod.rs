pub mod ledger;
pub mod metrics;

pub use ledger::Ledger;
pub use metrics::Metrics;

use std::collections::BTreeMap;

use ndarray::Array2;

use crate::{
    models::variables::{VarGroup, VarKey},
    problem::{Problem, Quantity},
    utils::EPSILON,
};

/// Values of the decision variables of a (sub-)model. Variables that are absent are zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Solution {
    values: BTreeMap<VarKey, f64>,
}

impl Solution {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(&self, key: &VarKey) -> f64 {
        self.values.get(key).copied().unwrap_or(0.0)
    }

    pub fn set(&mut self, key: VarKey, value: f64) {
        self.values.insert(key, value);
    }

    pub fn contains(&self, key: &VarKey) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&VarKey, f64)> + '_ {
        self.values.iter().map(|(k, v)| (k, *v))
    }

    /// The variables of `group`, in index order
    pub fn group(&self, group: VarGroup) -> impl Iterator<Item = (&VarKey, f64)> + '_ {
        self.iter().filter(move |(k, _)| k.group() == group)
    }

    /// The variables of `group` whose value is above `EPSILON`
    pub fn nonzero(&self, group: VarGroup) -> impl Iterator<Item = (&VarKey, f64)> + '_ {
        self.group(group).filter(|(_, v)| *v > EPSILON)
    }

    /// Total inventory of each item in each period summed over locations, indexed by `[item, period]`
    pub fn aggregate_inventory(&self, problem: &Problem) -> Array2<Quantity> {
        let mut out = Array2::zeros((problem.items().len(), problem.timesteps()));
        for (key, value) in self.group(VarGroup::Inventory) {
            if let VarKey::Inventory { item, period, .. } = *key {
                out[[item, period]] += value;
            }
        }
        out
    }
}

impl FromIterator<(VarKey, f64)> for Solution {
    fn from_iter<T: IntoIterator<Item = (VarKey, f64)>>(iter: T) -> Self {
        Solution {
            values: iter.into_iter().collect(),
        }
    }
}

impl Extend<(VarKey, f64)> for Solution {
    fn extend<T: IntoIterator<Item = (VarKey, f64)>>(&mut self, iter: T) {
        self.values.extend(iter)
    }
}
