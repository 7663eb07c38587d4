//! The boundary between the model builders and whatever LP/MIP solver sits underneath.
//!
//! Builders only ever talk to a [`SolverEngine`]. Concrete engines are Gurobi (feature `gurobi`),
//! HiGHS (feature `highs`) and the in-memory [`recorder::ModelRecorder`], which never solves
//! anything but records the model for inspection.

#[cfg(feature = "gurobi")]
pub mod gurobi;
#[cfg(feature = "highs")]
pub mod highs;
pub mod recorder;

use derive_more::Display;
use std::fmt::Debug;
use std::path::Path;

/// The type of a decision variable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    Continuous,
    Binary,
}

/// Relation between the left hand side and the right hand side of a linear constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Relation {
    #[display(fmt = "=")]
    Equal,
    #[display(fmt = "<=")]
    LessEqual,
    #[display(fmt = ">=")]
    GreaterEqual,
}

impl Relation {
    /// Whether `lhs <relation> rhs` holds, allowing for an absolute error of `tolerance`
    pub fn holds(&self, lhs: f64, rhs: f64, tolerance: f64) -> bool {
        match self {
            Relation::Equal => (lhs - rhs).abs() <= tolerance,
            Relation::LessEqual => lhs <= rhs + tolerance,
            Relation::GreaterEqual => lhs + tolerance >= rhs,
        }
    }
}

/// Index of a variable in engines that keep their own column bookkeeping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(pub usize);

#[derive(Debug, Display, PartialEq)]
pub enum SolverError {
    /// An error reported by the underlying solver library
    #[display(fmt = "solver backend error: {}", _0)]
    Backend(String),
    /// A variable or constraint with the same name already exists
    #[display(fmt = "duplicate name: {}", _0)]
    DuplicateName(String),
    /// The lower bound of a variable exceeds its upper bound
    #[display(fmt = "invalid bounds [{}, {}] for variable {}", lower, upper, name)]
    InvalidBounds { name: String, lower: f64, upper: f64 },
    /// A constraint refers to a variable that has not been integrated into the model yet
    #[display(fmt = "constraint {} refers to a pending variable", _0)]
    PendingVariable(String),
    /// The handle does not belong to this model
    #[display(fmt = "unknown variable {:?}", _0)]
    UnknownVariable(VarId),
    Infeasible,
    Unbounded,
    InfeasibleOrUnbounded,
    /// Solution values were requested before a successful optimization
    NotSolved,
    /// The engine does not support the operation
    #[display(fmt = "operation not supported by this engine: {}", _0)]
    Unsupported(&'static str),
}

impl std::error::Error for SolverError {}

/// The operations a model builder needs from a solver.
///
/// Variables must be integrated with [`SolverEngine::finalize_pending_changes`] before any
/// constraint refers to them.
pub trait SolverEngine {
    /// Handle to a variable in the engine's model
    type Var: Copy + Debug;

    /// Adds a variable with the given bounds and objective coefficient
    fn create_variable(
        &mut self,
        lower: f64,
        upper: f64,
        objective: f64,
        kind: VarKind,
        name: &str,
    ) -> Result<Self::Var, SolverError>;

    /// Adds the constraint `sum(coef * var) <relation> rhs`
    fn add_linear_constraint(
        &mut self,
        terms: &[(f64, Self::Var)],
        relation: Relation,
        rhs: f64,
        name: &str,
    ) -> Result<(), SolverError>;

    /// Integrates all variables created since the last call
    fn finalize_pending_changes(&mut self) -> Result<(), SolverError>;

    /// Minimizes the objective. Blocks until the solver is done.
    fn optimize(&mut self) -> Result<(), SolverError>;

    fn solution_value(&self, var: Self::Var) -> Result<f64, SolverError>;

    fn objective_coefficient(&self, var: Self::Var) -> Result<f64, SolverError>;

    fn name(&self, var: Self::Var) -> Result<String, SolverError>;

    /// All variables, in the order the engine reports them
    fn variables(&self) -> Result<Vec<Self::Var>, SolverError>;

    /// Whether [`SolverEngine::write_model`] is implemented
    fn can_write_model(&self) -> bool {
        false
    }

    /// Writes the model to `path`, in whatever format the engine infers from the extension
    fn write_model(&mut self, _path: &Path) -> Result<(), SolverError> {
        Err(SolverError::Unsupported("write_model"))
    }
}
