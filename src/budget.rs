use log::debug;

/// The smallest time limit ever handed to the solver, in seconds
pub const DEFAULT_FLOOR: f64 = 1.0;

/// Splits a wall-clock budget over a number of windows. Time a window leaves unused rolls over
/// to the next one; time a window overruns is taken from it.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeBudget {
    total: f64,
    /// The equal share of each window
    base: f64,
    /// The limit of the current window
    allocation: f64,
    spent: f64,
    floor: f64,
}

impl TimeBudget {
    pub fn new(total: f64, windows: usize, floor: f64) -> Self {
        let total = total.max(0.0);
        let base = Self::split(total, windows);
        let mut budget = TimeBudget {
            total,
            base,
            allocation: 0.0,
            spent: 0.0,
            floor,
        };
        budget.allocation = budget.clamp(base);
        budget
    }

    /// An equal share of `total_remaining` for each of `windows_remaining` windows
    pub fn split(total_remaining: f64, windows_remaining: usize) -> f64 {
        total_remaining / windows_remaining.max(1) as f64
    }

    fn clamp(&self, allocation: f64) -> f64 {
        allocation.min(self.remaining()).max(self.floor)
    }

    /// The time limit of the current window
    pub fn allocation(&self) -> f64 {
        self.allocation
    }

    /// Record that the current window took `used` seconds, and move on to the next window.
    /// Returns the allocation of the next window: the equal share plus whatever the current
    /// window left unused (or minus what it overran).
    pub fn rollover(&mut self, used: f64) -> f64 {
        let leftover = self.allocation - used;
        self.spent += used;
        self.allocation = self.clamp(self.base + leftover);
        debug!(
            "used {:.2}s, leftover {:.2}s, next window {:.2}s ({:.2}s remaining)",
            used,
            leftover,
            self.allocation,
            self.remaining()
        );
        self.allocation
    }

    pub fn spent(&self) -> f64 {
        self.spent
    }

    pub fn total(&self) -> f64 {
        self.total
    }

    pub fn remaining(&self) -> f64 {
        (self.total - self.spent).max(0.0)
    }
}
