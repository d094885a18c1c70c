use float_ord::FloatOrd;
use log::{debug, info};

use crate::utils::EPSILON;

use super::Solution;

/// The best plan found so far
#[derive(Debug, Clone)]
pub struct Incumbent {
    pub objective: f64,
    pub solution: Solution,
    /// Which run produced it
    pub source: String,
}

/// Tracks the incumbent, the best valid lower bound, and every objective offered.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    incumbent: Option<Incumbent>,
    bound: Option<f64>,
    history: Vec<(String, f64)>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer a complete, feasible plan. It replaces the incumbent if it is at least as good;
    /// ties go to the most recent offer. Returns whether it was accepted.
    pub fn offer(&mut self, objective: f64, solution: Solution, source: &str) -> bool {
        self.history.push((source.to_string(), objective));

        let accept = match &self.incumbent {
            Some(inc) => FloatOrd(objective) <= FloatOrd(inc.objective),
            None => true,
        };

        if accept {
            info!("new incumbent {objective:.4} from {source}");
            self.incumbent = Some(Incumbent {
                objective,
                solution,
                source: source.to_string(),
            });
        } else {
            debug!("{source} offered {objective:.4}, incumbent stays");
        }

        accept
    }

    /// Offer a valid lower bound on the optimum. The best (largest) bound is kept.
    pub fn offer_bound(&mut self, bound: f64) {
        let better = self.bound.map(|b| bound > b).unwrap_or(true);
        if better {
            debug!("lower bound {bound:.4}");
            self.bound = Some(bound);
        }
    }

    pub fn incumbent(&self) -> Option<&Incumbent> {
        self.incumbent.as_ref()
    }

    pub fn objective(&self) -> Option<f64> {
        self.incumbent.as_ref().map(|inc| inc.objective)
    }

    pub fn bound(&self) -> Option<f64> {
        self.bound
    }

    /// Relative gap of the incumbent to the bound, in percent
    pub fn gap(&self) -> Option<f64> {
        self.objective()
            .zip(self.bound)
            .map(|(objective, bound)| gap(objective, bound))
    }

    /// Every offered objective in order, with its source
    pub fn history(&self) -> &[(String, f64)] {
        &self.history
    }

    /// The best objective offered by `source`
    pub fn best_of(&self, source: &str) -> Option<f64> {
        self.history
            .iter()
            .filter(|(s, _)| s == source)
            .map(|(_, obj)| FloatOrd(*obj))
            .min()
            .map(|FloatOrd(obj)| obj)
    }
}

/// `100 · (objective - bound) / objective`
pub fn gap(objective: f64, bound: f64) -> f64 {
    if objective.abs() < EPSILON {
        0.0
    } else {
        100.0 * (objective - bound) / objective
    }
}
