use std::{path::Path, str::SplitAsciiWhitespace};

use derive_more::{Display, From};
use log::debug;
use ndarray::{Array2, Array3};

use crate::problem::{Item, Location, Problem, ProblemConstructionError};

/// The instance could not be read. Fatal: nothing is solved.
#[derive(Debug, Display, From)]
pub enum InputUnavailable {
    #[display(fmt = "could not read instance: {}", _0)]
    Io(std::io::Error),
    /// The stream ended before `_0` was read
    #[display(fmt = "instance ended before {}", _0)]
    #[from(ignore)]
    Truncated(&'static str),
    /// The token could not be parsed as a number
    #[display(fmt = "expected {}, found {:?}", expected, token)]
    #[from(ignore)]
    Malformed {
        expected: &'static str,
        token: String,
    },
    #[display(fmt = "invalid instance: {}", _0)]
    Invalid(ProblemConstructionError),
}

impl std::error::Error for InputUnavailable {}

struct Tokens<'s> {
    inner: SplitAsciiWhitespace<'s>,
}

impl<'s> Tokens<'s> {
    fn next(&mut self, what: &'static str) -> Result<&'s str, InputUnavailable> {
        self.inner.next().ok_or(InputUnavailable::Truncated(what))
    }

    fn float(&mut self, what: &'static str) -> Result<f64, InputUnavailable> {
        let token = self.next(what)?;
        token.parse().map_err(|_| InputUnavailable::Malformed {
            expected: what,
            token: token.to_string(),
        })
    }

    fn count(&mut self, what: &'static str) -> Result<usize, InputUnavailable> {
        let token = self.next(what)?;
        token.parse().map_err(|_| InputUnavailable::Malformed {
            expected: what,
            token: token.to_string(),
        })
    }

    /// A 0/1 compatibility flag
    fn flag(&mut self, what: &'static str) -> Result<bool, InputUnavailable> {
        let value = self.float(what)?;
        if value == 0.0 || value == 1.0 {
            Ok(value == 1.0)
        } else {
            Err(InputUnavailable::Malformed {
                expected: what,
                token: value.to_string(),
            })
        }
    }
}

/// Parse an instance from a whitespace separated stream of numbers, in the order
/// `T I L`, `Cap[t]`, `vc sc hc vt cs` per item, `d[i][t]`, `H g` per location,
/// `ha[i][l]`, `alpha[i][l]`, `beta[i][j]` and `r[i][l][k]`.
pub fn parse_problem(text: &str) -> Result<Problem, InputUnavailable> {
    let mut tokens = Tokens {
        inner: text.split_ascii_whitespace(),
    };

    let t = tokens.count("number of periods")?;
    let i = tokens.count("number of items")?;
    let l = tokens.count("number of locations")?;
    debug!("Reading instance with T = {t}, I = {i}, L = {l}");

    let capacity = (0..t)
        .map(|_| tokens.float("production capacity"))
        .collect::<Result<Vec<_>, _>>()?;

    let mut items = Vec::with_capacity(i);
    for _ in 0..i {
        let vc = tokens.float("production cost")?;
        let sc = tokens.float("setup cost")?;
        let hc = tokens.float("holding cost")?;
        let vt = tokens.float("capacity usage")?;
        let cs = tokens.float("storage usage")?;
        items.push(Item::new(vc, sc, hc, vt, cs));
    }

    let mut demand = Array2::zeros((i, t));
    for d in demand.iter_mut() {
        *d = tokens.float("demand")?;
    }

    let mut locations = Vec::with_capacity(l);
    for _ in 0..l {
        let h = tokens.float("storage capacity")?;
        let g = tokens.float("location cost")?;
        locations.push(Location::new(h, g));
    }

    let mut handling = Array2::zeros((i, l));
    for ha in handling.iter_mut() {
        *ha = tokens.float("handling cost")?;
    }

    let mut alpha = Array2::from_elem((i, l), false);
    for a in alpha.iter_mut() {
        *a = tokens.flag("item-location compatibility")?;
    }

    let mut beta = Array2::from_elem((i, i), false);
    for b in beta.iter_mut() {
        *b = tokens.flag("item-item compatibility")?;
    }

    let mut relocation = Array3::zeros((i, l, l));
    for r in relocation.iter_mut() {
        *r = tokens.float("relocation cost")?;
    }

    Ok(Problem::new(
        items, locations, capacity, demand, handling, alpha, beta, relocation,
    )?)
}

/// Read and parse an instance file.
pub fn read_problem<P: AsRef<Path>>(path: P) -> Result<Problem, InputUnavailable> {
    let text = std::fs::read_to_string(path)?;
    parse_problem(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TINY: &str = "2 1 1
        100 100
        1 100 2 1 1
        10 5
        50 10
        0
        1
        1
        0";

    #[test]
    fn parses_in_positional_order() {
        let problem = parse_problem(TINY).unwrap();
        assert_eq!(problem.timesteps(), 2);
        assert_eq!(problem.items().len(), 1);
        assert_eq!(problem.locations().len(), 1);
        assert_eq!(problem.demand(0, 0), 10.0);
        assert_eq!(problem.demand(0, 1), 5.0);
        assert_eq!(problem.item(0).setup_cost(), 100.0);
        assert_eq!(problem.item(0).holding_cost(), 2.0);
        assert_eq!(problem.location(0).capacity(), 50.0);
        assert_eq!(problem.location(0).usage_cost(), 10.0);
        assert!(problem.location_compatible(0, 0));
        assert!(problem.items_compatible(0, 0));
    }

    #[test]
    fn row_major_tables() {
        let text = "1 2 2
            10
            1 1 1 1 1
            1 1 1 1 1
            3
            4
            5 1
            6 1
            1 2
            3 4
            1 0
            0 1
            1 0
            0 1
            0 1 2 0
            0 3 4 0";
        let problem = parse_problem(text).unwrap();
        assert_eq!(problem.demand(1, 0), 4.0);
        assert_eq!(problem.handling_cost(0, 1), 2.0);
        assert_eq!(problem.handling_cost(1, 0), 3.0);
        assert!(!problem.location_compatible(0, 1));
        assert!(!problem.items_compatible(1, 0));
        assert_eq!(problem.relocation_cost(0, 0, 1), 1.0);
        assert_eq!(problem.relocation_cost(0, 1, 0), 2.0);
        assert_eq!(problem.relocation_cost(1, 1, 0), 4.0);
    }

    #[test]
    fn truncated_stream_is_unavailable() {
        let truncated = &TINY[..TINY.len() - 1];
        assert!(matches!(
            parse_problem(truncated),
            Err(InputUnavailable::Truncated("relocation cost"))
        ));
    }

    #[test]
    fn garbage_is_malformed() {
        assert!(matches!(
            parse_problem("2 x 1"),
            Err(InputUnavailable::Malformed { .. })
        ));
    }

    #[test]
    fn missing_file_is_unavailable() {
        assert!(matches!(
            read_problem("/nonexistent/instance.dat"),
            Err(InputUnavailable::Io(_))
        ));
    }
}
