/// What the sequential heuristic knows after an iteration
#[derive(Debug, Clone, PartialEq)]
pub struct Progress {
    /// Number of completed iterations, starting at 1
    pub iteration: u64,
    /// Time left of the budget after this iteration, in seconds
    pub remaining: f64,
    /// Objective of the previous iteration, if any
    pub previous: Option<f64>,
    /// Objective of this iteration
    pub objective: f64,
    /// Whether the estimated costs changed when re-estimated after this iteration
    pub estimate_changed: bool,
}

#[derive(Clone, Debug)]
pub enum Termination {
    /// Terminate after a given number of iterations
    Iterations(u64),
    /// Terminate when less than the given number of seconds remains
    OutOfTime(f64),
    /// Terminate if the objective moved less than the given tolerance
    Stall(f64),
    /// Terminate if the next iteration would solve the same sub-models
    FixedPoint,
    /// Run forever
    Never,
    /// Terminate if either of the two termination criteria
    /// tells it to terminate
    Any(Box<Termination>, Box<Termination>),
    /// Terminate when both of the criteria tells it to terminate
    All(Box<Termination>, Box<Termination>),
}

impl Termination {
    pub fn any(one: Termination, two: Termination) -> Termination {
        Termination::Any(Box::new(one), Box::new(two))
    }

    pub fn should_terminate(&self, progress: &Progress) -> bool {
        match self {
            Termination::Iterations(n) => progress.iteration >= *n,
            Termination::OutOfTime(floor) => progress.remaining < *floor,
            Termination::Stall(tolerance) => progress
                .previous
                .map(|prev| (progress.objective - prev).abs() < *tolerance)
                .unwrap_or(false),
            Termination::FixedPoint => !progress.estimate_changed,
            Termination::Never => false,
            Termination::Any(one, two) => {
                one.should_terminate(progress) || two.should_terminate(progress)
            }
            Termination::All(one, two) => {
                one.should_terminate(progress) && two.should_terminate(progress)
            }
        }
    }

    /// The first leaf criterion that fires, for logging
    pub fn reason(&self, progress: &Progress) -> Option<&Termination> {
        match self {
            Termination::Any(one, two) => one.reason(progress).or_else(|| two.reason(progress)),
            Termination::All(..) => self.should_terminate(progress).then(|| self),
            _ => self.should_terminate(progress).then(|| self),
        }
    }
}

impl std::fmt::Display for Termination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Termination::Iterations(n) => write!(f, "{n} iterations"),
            Termination::OutOfTime(floor) => write!(f, "{floor}s left"),
            Termination::Stall(tolerance) => write!(f, "stall below {tolerance}"),
            Termination::FixedPoint => write!(f, "fixed-point"),
            Termination::Never => write!(f, "never"),
            Termination::Any(lhs, rhs) => write!(f, "({lhs}) | ({rhs})"),
            Termination::All(lhs, rhs) => write!(f, "({lhs}) & ({rhs})"),
        }
    }
}
