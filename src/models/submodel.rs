use std::collections::HashMap;

use crate::solution::Solution;

use super::variables::{Domain, VarKey};

/// A linear expression over decision variables
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinExpr {
    terms: Vec<(VarKey, f64)>,
    constant: f64,
}

impl LinExpr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_term(&mut self, coeff: f64, key: VarKey) -> &mut Self {
        if coeff != 0.0 {
            self.terms.push((key, coeff));
        }
        self
    }

    pub fn add_constant(&mut self, constant: f64) -> &mut Self {
        self.constant += constant;
        self
    }

    pub fn terms(&self) -> &[(VarKey, f64)] {
        &self.terms
    }

    pub fn constant(&self) -> f64 {
        self.constant
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn evaluate(&self, solution: &Solution) -> f64 {
        self.constant
            + self
                .terms
                .iter()
                .map(|(key, coeff)| coeff * solution.value(key))
                .sum::<f64>()
    }
}

impl FromIterator<(f64, VarKey)> for LinExpr {
    fn from_iter<T: IntoIterator<Item = (f64, VarKey)>>(iter: T) -> Self {
        let mut expr = LinExpr::new();
        for (coeff, key) in iter {
            expr.add_term(coeff, key);
        }
        expr
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    Le,
    Eq,
    Ge,
}

/// `expr <sense> rhs`
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub name: String,
    pub expr: LinExpr,
    pub sense: Sense,
    pub rhs: f64,
}

impl Constraint {
    /// How much the constraint is violated by `solution`. Zero if satisfied.
    pub fn violation(&self, solution: &Solution) -> f64 {
        let lhs = self.expr.evaluate(solution);
        match self.sense {
            Sense::Le => (lhs - self.rhs).max(0.0),
            Sense::Ge => (self.rhs - lhs).max(0.0),
            Sense::Eq => (lhs - self.rhs).abs(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VarDecl {
    pub key: VarKey,
    pub domain: Domain,
    pub lb: f64,
    pub ub: f64,
}

/// A solver-independent MILP: variables with domains and bounds, a linear objective to
/// minimise and linear constraints.
#[derive(Debug, Clone, Default)]
pub struct SubModel {
    name: String,
    vars: Vec<VarDecl>,
    index: HashMap<VarKey, usize>,
    objective: LinExpr,
    constraints: Vec<Constraint>,
}

impl SubModel {
    pub fn new(name: &str) -> Self {
        SubModel {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declares a variable. Declaring the same key twice keeps the first declaration.
    pub fn add_var(&mut self, key: VarKey, domain: Domain, lb: f64, ub: f64) {
        if self.index.contains_key(&key) {
            return;
        }
        self.index.insert(key, self.vars.len());
        self.vars.push(VarDecl {
            key,
            domain,
            lb,
            ub,
        });
    }

    pub fn add_constr(&mut self, name: String, expr: LinExpr, sense: Sense, rhs: f64) {
        debug_assert!(
            expr.terms().iter().all(|(k, _)| self.index.contains_key(k)),
            "constraint {name} refers to an undeclared variable"
        );
        self.constraints.push(Constraint {
            name,
            expr,
            sense,
            rhs,
        });
    }

    pub fn set_objective(&mut self, objective: LinExpr) {
        self.objective = objective;
    }

    pub fn vars(&self) -> &[VarDecl] {
        &self.vars
    }

    pub fn var(&self, key: &VarKey) -> Option<&VarDecl> {
        self.index.get(key).map(|&i| &self.vars[i])
    }

    pub fn contains(&self, key: &VarKey) -> bool {
        self.index.contains_key(key)
    }

    pub fn objective(&self) -> &LinExpr {
        &self.objective
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn constraint(&self, name: &str) -> Option<&Constraint> {
        self.constraints.iter().find(|c| c.name == name)
    }

    /// Whether any variable is integral
    pub fn is_mip(&self) -> bool {
        self.vars.iter().any(|v| v.domain == Domain::Binary)
    }

    /// Objective value of `solution`
    pub fn evaluate(&self, solution: &Solution) -> f64 {
        self.objective.evaluate(solution)
    }

    /// The constraints violated by more than `tol`
    pub fn violations<'a>(
        &'a self,
        solution: &'a Solution,
        tol: f64,
    ) -> impl Iterator<Item = &'a Constraint> + 'a {
        self.constraints
            .iter()
            .filter(move |c| c.violation(solution) > tol)
    }

    /// Whether `solution` respects every bound, domain and constraint of the model
    pub fn is_satisfied_by(&self, solution: &Solution, tol: f64) -> bool {
        let bounds = self.vars.iter().all(|v| {
            let x = solution.value(&v.key);
            let integral = match v.domain {
                Domain::Binary => (x - x.round()).abs() <= tol,
                Domain::Continuous => true,
            };
            x >= v.lb - tol && x <= v.ub + tol && integral
        });

        bounds && self.violations(solution, tol).next().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn violation_respects_sense() {
        let y = VarKey::Setup { item: 0, period: 0 };
        let mut model = SubModel::new("test");
        model.add_var(y, Domain::Binary, 0.0, 1.0);
        let expr: LinExpr = [(2.0, y)].into_iter().collect();
        model.add_constr("le".to_string(), expr.clone(), Sense::Le, 1.0);
        model.add_constr("ge".to_string(), expr, Sense::Ge, 1.0);

        let one: Solution = [(y, 1.0)].into_iter().collect();
        let zero = Solution::new();

        assert_eq!(model.violations(&one, 1e-9).count(), 1);
        assert_eq!(model.violations(&zero, 1e-9).count(), 1);
        assert!(!model.is_satisfied_by(&one, 1e-9));
    }

    #[test]
    fn binary_domain_requires_integrality() {
        let y = VarKey::Setup { item: 0, period: 0 };
        let mut model = SubModel::new("test");
        model.add_var(y, Domain::Binary, 0.0, 1.0);
        let half: Solution = [(y, 0.5)].into_iter().collect();
        assert!(!model.is_satisfied_by(&half, 1e-6));
    }
}
