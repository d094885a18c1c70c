use std::collections::HashMap;

use grb::{attr, c, param, Model, ModelSense, Status, Var, VarType};
use log::{debug, trace};

use crate::{
    oracle::{MilpOracle, OracleError, OracleOutcome, SolveStatus},
    solution::Solution,
};

use super::{
    submodel::{LinExpr, Sense, SubModel},
    variables::{Domain, VarKey},
};

impl From<grb::Error> for OracleError {
    fn from(e: grb::Error) -> Self {
        OracleError::Backend(e.to_string())
    }
}

/// Solves sub-models with Gurobi, single-threaded and with console output disabled.
#[derive(Debug, Default)]
pub struct GurobiOracle {
    threads: i32,
}

impl GurobiOracle {
    pub fn new() -> Self {
        GurobiOracle { threads: 1 }
    }

    fn build(&self, sub: &SubModel, time_limit: f64) -> grb::Result<(Model, Vec<(VarKey, Var)>)> {
        let mut model = Model::new(sub.name())?;
        // Disable output logging.
        model.set_param(param::OutputFlag, 0)?;
        model.set_param(param::Threads, self.threads.max(1))?;
        model.set_param(param::TimeLimit, time_limit.max(0.0))?;

        let mut vars = Vec::with_capacity(sub.vars().len());
        for decl in sub.vars() {
            let vtype = match decl.domain {
                Domain::Binary => VarType::Binary,
                Domain::Continuous => VarType::Continuous,
            };
            let var = model.add_var(
                &decl.key.to_string(),
                vtype,
                0.0,
                decl.lb,
                decl.ub,
                std::iter::empty(),
            )?;
            vars.push((decl.key, var));
        }

        let lookup: HashMap<VarKey, Var> = vars.iter().copied().collect();
        let convert = |expr: &LinExpr| {
            let mut out = grb::expr::LinExpr::new();
            for (key, coeff) in expr.terms() {
                if let Some(var) = lookup.get(key) {
                    out.add_term(*coeff, *var);
                }
            }
            out.add_constant(expr.constant());
            out
        };

        model.set_objective(convert(sub.objective()), ModelSense::Minimize)?;

        for constr in sub.constraints() {
            let lhs = convert(&constr.expr);
            let rhs = constr.rhs;
            let ineq = match constr.sense {
                Sense::Le => c!(lhs <= rhs),
                Sense::Eq => c!(lhs == rhs),
                Sense::Ge => c!(lhs >= rhs),
            };
            model.add_constr(&constr.name, ineq)?;
        }

        trace!(
            "gurobi model {}: {} vars, {} constraints",
            sub.name(),
            vars.len(),
            sub.constraints().len()
        );

        Ok((model, vars))
    }
}

impl MilpOracle for GurobiOracle {
    fn solve(&mut self, sub: &SubModel, time_limit: f64) -> Result<OracleOutcome, OracleError> {
        let (mut model, vars) = self.build(sub, time_limit)?;
        model.optimize()?;

        let status = model.status()?;
        let solutions = model.get_attr(attr::SolCount)?;
        debug!("{}: gurobi status {:?} with {} solutions", sub.name(), status, solutions);

        let status = match status {
            Status::Optimal => SolveStatus::Optimal,
            Status::Infeasible | Status::InfOrUnbd => SolveStatus::Infeasible,
            _ if solutions > 0 => SolveStatus::Feasible,
            _ => SolveStatus::Unknown,
        };

        if !status.is_usable() {
            return Ok(OracleOutcome::failed(status));
        }

        let objective = model.get_attr(attr::ObjVal)?;
        let bound = if sub.is_mip() {
            model.get_attr(attr::ObjBound)?
        } else {
            objective
        };

        let handles: Vec<Var> = vars.iter().map(|(_, v)| *v).collect();
        let values = model.get_obj_attr_batch(attr::X, handles)?;
        let solution: Solution = vars
            .iter()
            .map(|(k, _)| *k)
            .zip(values.into_iter())
            .collect();

        Ok(OracleOutcome {
            status,
            objective: Some(objective),
            bound: Some(bound),
            solution: Some(solution),
        })
    }
}
