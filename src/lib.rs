pub mod budget;
pub mod fixing;
pub mod heuristics;
pub mod models;
pub mod oracle;
pub mod parse;
pub mod problem;
pub mod report;
pub mod rolling_horizon;
pub mod solution;
pub mod termination;
pub mod utils;

use derive_more::{Display, From};

/// Everything that can abort a run
#[derive(Debug, Display, From)]
pub enum Error {
    Input(parse::InputUnavailable),
    Oracle(oracle::OracleError),
    Io(std::io::Error),
    Summary(serde_json::Error),
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;
