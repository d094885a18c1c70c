use std::{
    collections::BTreeMap,
    io::{self, Write},
};

use serde::Serialize;

use crate::{
    heuristics::{RunOutcome, RunReport},
    models::VarGroup,
    problem::Problem,
    solution::{Ledger, Metrics, Solution},
};

const RULE: &str =
    "*************************************************************************************";

/// The order in which variable families are listed
const LISTING: [VarGroup; 8] = [
    VarGroup::Setup,
    VarGroup::Inventory,
    VarGroup::LocationUse,
    VarGroup::Assign,
    VarGroup::Inflow,
    VarGroup::Outflow,
    VarGroup::Reloc,
    VarGroup::Alloc,
];

fn optional(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

/// Write a human readable report of every run, followed by the overall best plan.
pub fn write_report<W: Write>(
    out: &mut W,
    problem: &Problem,
    runs: &[RunReport],
    ledger: &Ledger,
) -> io::Result<()> {
    writeln!(out, "{RULE}")?;
    writeln!(
        out,
        "Lot-sizing with multiple storage locations: T = {}, I = {}, L = {}",
        problem.timesteps(),
        problem.items().len(),
        problem.locations().len()
    )?;
    writeln!(out, "{RULE}")?;
    writeln!(out)?;

    for run in runs {
        write_run(out, run)?;
    }

    writeln!(out, "{RULE}")?;
    writeln!(out, "Best Objective Function Value = {}", optional(ledger.objective()))?;
    writeln!(out, "Best Lower Bound Value = {}", optional(ledger.bound()))?;
    writeln!(out, "Gap = {}", optional(ledger.gap()))?;
    if let Some(inc) = ledger.incumbent() {
        writeln!(out, "Found by = {}", inc.source)?;
    }
    writeln!(out, "{RULE}")?;
    Ok(())
}

fn write_run<W: Write>(out: &mut W, run: &RunReport) -> io::Result<()> {
    writeln!(out, "*********** {} ***********", run.strategy)?;
    writeln!(out)?;

    let status = run
        .status
        .map(|s| s.to_string())
        .unwrap_or_else(|| run.outcome.to_string());
    writeln!(out, "Solution Status = {status}")?;

    match run.outcome {
        RunOutcome::Skipped => {
            writeln!(out, "Not run")?;
            writeln!(out)?;
            return Ok(());
        }
        RunOutcome::Infeasible | RunOutcome::Unknown => {
            writeln!(out, "NO Solution")?;
            writeln!(out, "Time = {}", run.time)?;
            writeln!(out)?;
            return Ok(());
        }
        RunOutcome::Solved => (),
    }

    writeln!(out, "Objective Function Value = {}", optional(run.objective))?;
    writeln!(out, "Lower Bound = {}", optional(run.lower_bound))?;
    writeln!(out, "Gap = {}", optional(run.gap))?;
    writeln!(out, "Time = {}", run.time)?;
    writeln!(out, "Iterations = {}", run.iterations)?;
    writeln!(out)?;

    if let Some(metrics) = &run.metrics {
        write_metrics(out, metrics)?;
    }
    if let Some(solution) = &run.solution {
        write_listing(out, solution)?;
    }
    Ok(())
}

fn write_metrics<W: Write>(out: &mut W, m: &Metrics) -> io::Result<()> {
    writeln!(out, "Setup Cost Item = {}", m.setup_cost)?;
    writeln!(out, "Production Cost Item = {}", m.production_cost)?;
    writeln!(out, "Inventory Cost Item = {}", m.inventory_cost)?;
    writeln!(out, "Handling Cost Item = {}", m.handling_cost)?;
    writeln!(out, "Setup Cost Location = {}", m.location_cost)?;
    writeln!(out, "Relocation Cost Item = {}", m.relocation_cost)?;
    writeln!(out)?;
    writeln!(out, "Number Setup Item = {}", m.setup_count)?;
    writeln!(out, "Number Inventoried Item = {}", m.inventory_count)?;
    writeln!(out, "Number Handled Item = {}", m.handling_count)?;
    writeln!(out, "Number Used Location = {}", m.location_count)?;
    writeln!(out, "Number Relocated Item = {}", m.relocation_count)?;
    writeln!(out)?;
    writeln!(out, "Total Opened Space = {}", m.open_space)?;
    writeln!(out, "Total Used Space = {}", m.used_space)?;
    writeln!(out, "Percentage Used Space = {}", m.used_percentage)?;
    writeln!(out)?;
    Ok(())
}

/// Every value above `EPSILON`, one per line, grouped by family
fn write_listing<W: Write>(out: &mut W, solution: &Solution) -> io::Result<()> {
    for group in LISTING {
        for (key, value) in solution.nonzero(group) {
            writeln!(out, "{key} = {value}")?;
        }
        writeln!(out)?;
    }
    Ok(())
}

#[derive(Serialize)]
struct Offer<'a> {
    source: &'a str,
    objective: f64,
}

#[derive(Serialize)]
struct Summary<'a> {
    runs: &'a [RunReport],
    best_objective: Option<f64>,
    best_bound: Option<f64>,
    gap: Option<f64>,
    best_source: Option<&'a str>,
    /// The best objective each run offered
    best_by_source: BTreeMap<&'a str, f64>,
    /// Every objective offered, in order
    offers: Vec<Offer<'a>>,
}

/// Write a JSON summary of every run
pub fn write_summary<W: Write>(out: W, runs: &[RunReport], ledger: &Ledger) -> serde_json::Result<()> {
    let best_by_source = runs
        .iter()
        .map(|run| run.strategy.source())
        .filter_map(|source| ledger.best_of(source).map(|best| (source, best)))
        .collect();
    let offers = ledger
        .history()
        .iter()
        .map(|(source, objective)| Offer {
            source,
            objective: *objective,
        })
        .collect();

    let summary = Summary {
        runs,
        best_objective: ledger.objective(),
        best_bound: ledger.bound(),
        gap: ledger.gap(),
        best_source: ledger.incumbent().map(|inc| inc.source.as_str()),
        best_by_source,
        offers,
    };
    serde_json::to_writer_pretty(out, &summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        heuristics::{exact, relax_and_fix, Strategy},
        models::builder::tests::tiny_plan,
        oracle::{testing::ReferenceOracle, SolveStatus},
        problem::tests::tiny,
    };

    fn runs() -> (Vec<RunReport>, Ledger) {
        let problem = tiny();
        let mut oracle = ReferenceOracle::new(tiny_plan());
        let mut ledger = Ledger::new();
        let lp = exact::relaxation(&problem, &mut oracle, &Default::default(), &mut ledger).unwrap();
        let rf = relax_and_fix::run(&problem, &mut oracle, &Default::default(), &mut ledger).unwrap();
        let mut failed = RunReport::new(Strategy::Sequential);
        failed.outcome = RunOutcome::Infeasible;
        failed.status = Some(SolveStatus::Infeasible);
        (vec![lp, rf, failed], ledger)
    }

    #[test]
    fn report_lists_sections_and_sparse_values() {
        let (runs, ledger) = runs();
        let mut out = Vec::new();
        write_report(&mut out, &tiny(), &runs, &ledger).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("*********** Relax-and-Fix Heuristic ***********"));
        assert!(text.contains("Objective Function Value = 135"));
        assert!(text.contains("Y_1_1 = 1\n"));
        assert!(text.contains("S_1_1_1 = 5\n"));
        assert!(text.contains("FL_1_1_2 = 5\n"));
        assert!(!text.contains("Y_1_2 ="));
        assert!(text.contains("Total Opened Space = 50"));
        assert!(text.contains("Solution Status = Infeasible\nNO Solution"));
        assert!(text.contains("Best Objective Function Value = 135"));
        assert!(text.contains("Found by = relax-and-fix"));
    }

    #[test]
    fn summary_is_json() {
        let (runs, ledger) = runs();
        let mut out = Vec::new();
        write_summary(&mut out, &runs, &ledger).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["best_objective"], 135.0);
        assert_eq!(value["runs"].as_array().map(|r| r.len()), Some(3));
        assert_eq!(value["runs"][1]["strategy"], "RelaxAndFix");
        assert_eq!(value["best_by_source"]["relax-and-fix"], 135.0);
        assert!(value["best_by_source"].get("sequential").is_none());
        assert_eq!(value["offers"].as_array().map(|o| o.len()), Some(1));
        assert_eq!(value["offers"][0]["source"], "relax-and-fix");
    }
}
