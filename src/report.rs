use crate::solver::{SolverEngine, SolverError};
use serde::Serialize;
use std::fmt::Display;

/// A variable with a strictly positive value in the solution
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SolutionEntry {
    pub name: String,
    pub value: f64,
    /// The objective coefficient of the variable
    pub objective: f64,
}

impl Display for SolutionEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} : {} - {}", self.name, self.value, self.objective)
    }
}

/// Every variable with a value strictly above zero, in the order the engine reports them
pub fn nonzero_entries<E: SolverEngine>(engine: &E) -> Result<Vec<SolutionEntry>, SolverError> {
    let mut entries = Vec::new();
    for var in engine.variables()? {
        let value = engine.solution_value(var)?;
        if value > 0.0 {
            entries.push(SolutionEntry {
                name: engine.name(var)?,
                value,
                objective: engine.objective_coefficient(var)?,
            });
        }
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::recorder::ModelRecorder;
    use crate::solver::VarKind;

    #[test]
    fn keeps_positive_values_in_engine_order() {
        let mut recorder = ModelRecorder::with_solution(vec![0.0, 0.5, 1e-12, 1.0]);
        for (name, cost) in [("a", 1.0), ("b", 2.0), ("c", 3.0), ("d", 4.0)] {
            recorder
                .create_variable(0.0, 1.0, cost, VarKind::Continuous, name)
                .unwrap();
        }
        recorder.finalize_pending_changes().unwrap();
        recorder.optimize().unwrap();

        let entries = nonzero_entries(&recorder).unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["b", "c", "d"]);
        assert_eq!(format!("{}", entries[0]), "b : 0.5 - 2");
    }

    #[test]
    fn needs_a_solution() {
        let mut recorder = ModelRecorder::new();
        recorder
            .create_variable(0.0, 1.0, 1.0, VarKind::Continuous, "a")
            .unwrap();
        assert!(matches!(
            nonzero_entries(&recorder),
            Err(SolverError::NotSolved)
        ));
    }
}
