use super::{Relation, SolverEngine, SolverError, VarId, VarKind};
use log::trace;
use std::collections::HashSet;

/// Absolute error allowed when checking a solution against the recorded constraints
pub const FEASIBILITY_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone)]
pub struct RecordedVar {
    pub name: String,
    pub lower: f64,
    pub upper: f64,
    pub objective: f64,
    pub kind: VarKind,
}

#[derive(Debug, Clone)]
pub struct RecordedConstraint {
    pub name: String,
    pub terms: Vec<(f64, VarId)>,
    pub relation: Relation,
    pub rhs: f64,
}

impl RecordedConstraint {
    /// The value of the left hand side for the given variable values
    pub fn lhs(&self, values: &[f64]) -> f64 {
        self.terms.iter().map(|(coef, var)| coef * values[var.0]).sum()
    }

    pub fn is_satisfied(&self, values: &[f64]) -> bool {
        self.relation
            .holds(self.lhs(values), self.rhs, FEASIBILITY_TOLERANCE)
    }
}

/// An engine that keeps the whole model in memory and never solves it.
///
/// "Optimizing" installs a preset solution, provided it satisfies every bound and constraint.
/// Used for dry runs (model statistics without a solver) and for checking builders.
#[derive(Debug, Default)]
pub struct ModelRecorder {
    vars: Vec<RecordedVar>,
    constraints: Vec<RecordedConstraint>,
    names: HashSet<String>,
    /// number of variables that constraints may refer to
    integrated: usize,
    preset: Option<Vec<f64>>,
    solution: Option<Vec<f64>>,
}

impl ModelRecorder {
    pub fn new() -> ModelRecorder {
        ModelRecorder::default()
    }

    /// A recorder whose `optimize` reports `values` as the solution
    pub fn with_solution(values: Vec<f64>) -> ModelRecorder {
        ModelRecorder {
            preset: Some(values),
            ..ModelRecorder::default()
        }
    }

    pub fn vars(&self) -> &[RecordedVar] {
        &self.vars
    }

    pub fn constraints(&self) -> &[RecordedConstraint] {
        &self.constraints
    }

    /// Looks up a variable by name
    pub fn find(&self, name: &str) -> Option<VarId> {
        self.vars.iter().position(|v| v.name == name).map(VarId)
    }

    /// The objective value of an assignment
    pub fn objective_value(&self, values: &[f64]) -> f64 {
        self.vars
            .iter()
            .zip(values)
            .map(|(var, value)| var.objective * value)
            .sum()
    }

    /// Every constraint violated by `values`
    pub fn violations<'a>(&'a self, values: &[f64]) -> Vec<&'a RecordedConstraint> {
        self.constraints
            .iter()
            .filter(|c| !c.is_satisfied(values))
            .collect()
    }

    /// Every variable whose value lies outside its bounds
    pub fn bound_violations<'a>(&'a self, values: &[f64]) -> Vec<&'a RecordedVar> {
        self.vars
            .iter()
            .zip(values)
            .filter(|(var, value)| {
                **value < var.lower - FEASIBILITY_TOLERANCE
                    || **value > var.upper + FEASIBILITY_TOLERANCE
            })
            .map(|(var, _)| var)
            .collect()
    }

    fn get(&self, var: VarId) -> Result<&RecordedVar, SolverError> {
        self.vars.get(var.0).ok_or(SolverError::UnknownVariable(var))
    }

    fn claim(&mut self, name: &str) -> Result<(), SolverError> {
        if !self.names.insert(name.to_string()) {
            return Err(SolverError::DuplicateName(name.to_string()));
        }
        Ok(())
    }
}

impl SolverEngine for ModelRecorder {
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
        self.vars.push(RecordedVar {
            name: name.to_string(),
            lower,
            upper,
            objective,
            kind,
        });
        Ok(VarId(self.vars.len() - 1))
    }

    fn add_linear_constraint(
        &mut self,
        terms: &[(f64, VarId)],
        relation: Relation,
        rhs: f64,
        name: &str,
    ) -> Result<(), SolverError> {
        for (_, var) in terms {
            if var.0 >= self.vars.len() {
                return Err(SolverError::UnknownVariable(*var));
            }
            if var.0 >= self.integrated {
                return Err(SolverError::PendingVariable(name.to_string()));
            }
        }
        self.claim(name)?;
        self.constraints.push(RecordedConstraint {
            name: name.to_string(),
            terms: terms.to_vec(),
            relation,
            rhs,
        });
        Ok(())
    }

    fn finalize_pending_changes(&mut self) -> Result<(), SolverError> {
        trace!(
            "integrating {} pending variables",
            self.vars.len() - self.integrated
        );
        self.integrated = self.vars.len();
        Ok(())
    }

    fn optimize(&mut self) -> Result<(), SolverError> {
        let values = self
            .preset
            .as_ref()
            .ok_or(SolverError::Unsupported("optimize without a preset solution"))?;

        if values.len() != self.vars.len() {
            return Err(SolverError::Backend(format!(
                "preset solution has {} values, model has {} variables",
                values.len(),
                self.vars.len()
            )));
        }

        if !self.bound_violations(values).is_empty() || !self.violations(values).is_empty() {
            return Err(SolverError::Infeasible);
        }

        self.solution = Some(values.clone());
        Ok(())
    }

    fn solution_value(&self, var: VarId) -> Result<f64, SolverError> {
        self.get(var)?;
        let solution = self.solution.as_ref().ok_or(SolverError::NotSolved)?;
        Ok(solution[var.0])
    }

    fn objective_coefficient(&self, var: VarId) -> Result<f64, SolverError> {
        Ok(self.get(var)?.objective)
    }

    fn name(&self, var: VarId) -> Result<String, SolverError> {
        Ok(self.get(var)?.name.clone())
    }

    fn variables(&self) -> Result<Vec<VarId>, SolverError> {
        Ok((0..self.vars.len()).map(VarId).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_vars(recorder: &mut ModelRecorder) -> (VarId, VarId) {
        let a = recorder
            .create_variable(0.0, 1.0, 2.0, VarKind::Continuous, "a")
            .unwrap();
        let b = recorder
            .create_variable(0.0, 1.0, 3.0, VarKind::Binary, "b")
            .unwrap();
        (a, b)
    }

    #[test]
    fn rejects_duplicate_names_and_bad_bounds() {
        let mut recorder = ModelRecorder::new();
        two_vars(&mut recorder);
        assert!(matches!(
            recorder.create_variable(0.0, 1.0, 0.0, VarKind::Continuous, "a"),
            Err(SolverError::DuplicateName(_))
        ));
        assert!(matches!(
            recorder.create_variable(2.0, 1.0, 0.0, VarKind::Continuous, "c"),
            Err(SolverError::InvalidBounds { .. })
        ));
    }

    #[test]
    fn constraints_need_integrated_variables() {
        let mut recorder = ModelRecorder::new();
        let (a, b) = two_vars(&mut recorder);
        let terms = [(1.0, a), (1.0, b)];
        assert!(matches!(
            recorder.add_linear_constraint(&terms, Relation::Equal, 1.0, "sum"),
            Err(SolverError::PendingVariable(_))
        ));
        recorder.finalize_pending_changes().unwrap();
        recorder
            .add_linear_constraint(&terms, Relation::Equal, 1.0, "sum")
            .unwrap();
        assert_eq!(recorder.constraints().len(), 1);
    }

    #[test]
    fn optimize_checks_the_preset_solution() {
        let mut recorder = ModelRecorder::with_solution(vec![1.0, 1.0]);
        let (a, b) = two_vars(&mut recorder);
        recorder.finalize_pending_changes().unwrap();
        recorder
            .add_linear_constraint(&[(1.0, a), (1.0, b)], Relation::LessEqual, 1.0, "cap")
            .unwrap();
        assert!(matches!(recorder.optimize(), Err(SolverError::Infeasible)));
        assert!(matches!(
            recorder.solution_value(a),
            Err(SolverError::NotSolved)
        ));

        let mut recorder = ModelRecorder::with_solution(vec![0.0, 1.0]);
        let (a, b) = two_vars(&mut recorder);
        recorder.finalize_pending_changes().unwrap();
        recorder
            .add_linear_constraint(&[(1.0, a), (1.0, b)], Relation::LessEqual, 1.0, "cap")
            .unwrap();
        recorder.optimize().unwrap();
        assert_eq!(recorder.solution_value(b).unwrap(), 1.0);
        assert_eq!(recorder.objective_value(&[0.0, 1.0]), 3.0);
        assert_eq!(recorder.find("b"), Some(b));
    }

    #[test]
    fn optimize_without_preset_is_unsupported() {
        let mut recorder = ModelRecorder::new();
        assert!(matches!(
            recorder.optimize(),
            Err(SolverError::Unsupported(_))
        ));
    }
}
