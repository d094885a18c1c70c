pub mod builder;
pub mod families;
#[cfg(feature = "gurobi")]
pub mod gurobi;
pub mod submodel;
pub mod variables;

pub use builder::{build_sub_model, ModelScope};
pub use submodel::{Constraint, LinExpr, Sense, SubModel, VarDecl};
pub use variables::{Domain, VarGroup, VarKey};
