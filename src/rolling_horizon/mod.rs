#[allow(clippy::module_inception)]
pub mod rolling_horizon;

pub use rolling_horizon::{RollingHorizon, Window};
