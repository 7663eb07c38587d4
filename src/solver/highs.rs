//! HiGHS backend.
//!
//! The `highs` crate builds a row-wise problem in memory and only hands it to the solver when
//! optimizing, so names and objective coefficients are kept on this side.

use super::{Relation, SolverEngine, SolverError, VarId, VarKind};
use highs::{Col, HighsModelStatus, RowProblem, Sense};
use log::{info, warn};
use std::collections::HashSet;

pub struct HighsEngine {
    problem: RowProblem,
    cols: Vec<Col>,
    names: Vec<String>,
    /// variable and constraint names, which HiGHS itself never sees
    taken: HashSet<String>,
    objective: Vec<f64>,
    solution: Option<Vec<f64>>,
}

impl Default for HighsEngine {
    fn default() -> Self {
        HighsEngine::new()
    }
}

impl HighsEngine {
    pub fn new() -> HighsEngine {
        HighsEngine {
            problem: RowProblem::new(),
            cols: Vec::new(),
            names: Vec::new(),
            taken: HashSet::new(),
            objective: Vec::new(),
            solution: None,
        }
    }

    fn index(&self, var: VarId) -> Result<usize, SolverError> {
        if var.0 < self.cols.len() {
            Ok(var.0)
        } else {
            Err(SolverError::UnknownVariable(var))
        }
    }

    fn claim(&mut self, name: &str) -> Result<(), SolverError> {
        if !self.taken.insert(name.to_string()) {
            return Err(SolverError::DuplicateName(name.to_string()));
        }
        Ok(())
    }
}

impl SolverEngine for HighsEngine {
    type Var = VarId;

    fn create_variable(
        &mut self,
        lower: f64,
        upper: f64,
        objective: f64,
        kind: VarKind,
        name: &str,
    ) -> Result<VarId, SolverError> {
        if lower > upper || lower.is_nan() || upper.is_nan() {
            return Err(SolverError::InvalidBounds {
                name: name.to_string(),
                lower,
                upper,
            });
        }
        self.claim(name)?;
        let integer = kind == VarKind::Binary;
        let col = self
            .problem
            .add_column_with_integrality(objective, lower..=upper, integer);
        self.cols.push(col);
        self.names.push(name.to_string());
        self.objective.push(objective);
        Ok(VarId(self.cols.len() - 1))
    }

    fn add_linear_constraint(
        &mut self,
        terms: &[(f64, VarId)],
        relation: Relation,
        rhs: f64,
        name: &str,
    ) -> Result<(), SolverError> {
        let row = terms
            .iter()
            .map(|(coef, var)| Ok((self.cols[self.index(*var)?], *coef)))
            .collect::<Result<Vec<(Col, f64)>, SolverError>>()?;
        self.claim(name)?;

        match relation {
            Relation::Equal => {
                self.problem.add_row(rhs..=rhs, row);
            }
            Relation::LessEqual => {
                self.problem.add_row(..=rhs, row);
            }
            Relation::GreaterEqual => {
                self.problem.add_row(rhs.., row);
            }
        }
        Ok(())
    }

    fn finalize_pending_changes(&mut self) -> Result<(), SolverError> {
        // columns are usable as soon as they are added
        Ok(())
    }

    fn optimize(&mut self) -> Result<(), SolverError> {
        if self.solution.is_some() {
            warn!("the HiGHS problem has already been handed to the solver");
            return Err(SolverError::Unsupported("optimizing the same problem twice"));
        }

        let problem = std::mem::replace(&mut self.problem, RowProblem::new());
        let solved = problem.optimise(Sense::Minimise).solve();
        let status = solved.status();
        info!("HiGHS finished with status {:?}", status);

        match status {
            HighsModelStatus::Optimal | HighsModelStatus::ModelEmpty => {
                let solution = solved.get_solution();
                self.solution = Some(solution.columns().to_vec());
                Ok(())
            }
            HighsModelStatus::Infeasible => Err(SolverError::Infeasible),
            HighsModelStatus::Unbounded => Err(SolverError::Unbounded),
            HighsModelStatus::UnboundedOrInfeasible => Err(SolverError::InfeasibleOrUnbounded),
            other => Err(SolverError::Backend(format!(
                "optimization ended with status {:?}",
                other
            ))),
        }
    }

    fn solution_value(&self, var: VarId) -> Result<f64, SolverError> {
        let index = self.index(var)?;
        let solution = self.solution.as_ref().ok_or(SolverError::NotSolved)?;
        Ok(solution[index])
    }

    fn objective_coefficient(&self, var: VarId) -> Result<f64, SolverError> {
        Ok(self.objective[self.index(var)?])
    }

    fn name(&self, var: VarId) -> Result<String, SolverError> {
        Ok(self.names[self.index(var)?].clone())
    }

    fn variables(&self) -> Result<Vec<VarId>, SolverError> {
        Ok((0..self.cols.len()).map(VarId).collect())
    }
}
