use super::{Relation, SolverEngine, SolverError, VarKind};
use grb::prelude::*;
use log::info;
use std::path::Path;

impl From<grb::Error> for SolverError {
    fn from(err: grb::Error) -> Self {
        SolverError::Backend(format!("{}", err))
    }
}

/// A gurobi model behind the [`SolverEngine`] interface
pub struct GurobiEngine {
    model: Model,
}

impl GurobiEngine {
    /// Creates an empty model in a fresh environment that logs to `log_file`
    pub fn new(name: &str, log_file: &str) -> grb::Result<GurobiEngine> {
        let env = Env::new(log_file)?;
        let model = Model::with_env(name, &env)?;
        Ok(GurobiEngine { model })
    }

    /// Silences the solver output on the console
    pub fn quiet(mut self) -> grb::Result<GurobiEngine> {
        self.model.set_param(param::OutputFlag, 0)?;
        Ok(self)
    }
}

impl SolverEngine for GurobiEngine {
    type Var = Var;

    fn create_variable(
        &mut self,
        lower: f64,
        upper: f64,
        objective: f64,
        kind: VarKind,
        name: &str,
    ) -> Result<Var, SolverError> {
        let vtype = match kind {
            VarKind::Continuous => VarType::Continuous,
            VarKind::Binary => VarType::Binary,
        };
        Ok(self
            .model
            .add_var(name, vtype, objective, lower, upper, std::iter::empty())?)
    }

    fn add_linear_constraint(
        &mut self,
        terms: &[(f64, Var)],
        relation: Relation,
        rhs: f64,
        name: &str,
    ) -> Result<(), SolverError> {
        let lhs = terms.iter().map(|(coef, var)| *coef * *var).grb_sum();
        let constraint = match relation {
            Relation::Equal => c!(lhs == rhs),
            Relation::LessEqual => c!(lhs <= rhs),
            Relation::GreaterEqual => c!(lhs >= rhs),
        };
        self.model.add_constr(name, constraint)?;
        Ok(())
    }

    fn finalize_pending_changes(&mut self) -> Result<(), SolverError> {
        Ok(self.model.update()?)
    }

    fn optimize(&mut self) -> Result<(), SolverError> {
        // gurobi minimizes unless told otherwise
        self.model.optimize()?;
        let status = self.model.status()?;
        info!("gurobi finished with status {:?}", status);
        match status {
            Status::Optimal => Ok(()),
            Status::Infeasible => Err(SolverError::Infeasible),
            Status::Unbounded => Err(SolverError::Unbounded),
            Status::InfOrUnbd => Err(SolverError::InfeasibleOrUnbounded),
            other => Err(SolverError::Backend(format!(
                "optimization ended with status {:?}",
                other
            ))),
        }
    }

    fn solution_value(&self, var: Var) -> Result<f64, SolverError> {
        Ok(self.model.get_obj_attr(attr::X, &var)?)
    }

    fn objective_coefficient(&self, var: Var) -> Result<f64, SolverError> {
        Ok(self.model.get_obj_attr(attr::Obj, &var)?)
    }

    fn name(&self, var: Var) -> Result<String, SolverError> {
        Ok(self.model.get_obj_attr(attr::VarName, &var)?)
    }

    fn variables(&self) -> Result<Vec<Var>, SolverError> {
        Ok(self.model.get_vars()?.to_vec())
    }

    fn can_write_model(&self) -> bool {
        true
    }

    fn write_model(&mut self, path: &Path) -> Result<(), SolverError> {
        let path = path
            .to_str()
            .ok_or_else(|| SolverError::Backend(format!("{:?} is not valid utf-8", path)))?;
        Ok(self.model.write(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::GurobiEngine;
    use crate::models::hub_median::{HubMedianSolver, ModelConfig, Parameters, Sets};
    use crate::problem::Problem;
    use crate::solver::SolverEngine;

    #[test]
    fn solves_the_triangle_with_one_hub() {
        let problem = Problem::new(
            &[vec![0.0, 0.0], vec![1.0, 0.0], vec![0.0, 1.0]],
            &[
                vec![0.0, 5.0, 0.0],
                vec![5.0, 0.0, 0.0],
                vec![0.0, 0.0, 0.0],
            ],
            &[1.0, 1.0, 1.0],
        )
        .unwrap();
        let config = ModelConfig {
            hubs: 1,
            alpha: 0.2,
            binary_hubs: true,
        };
        let sets = Sets::new(&problem);
        let parameters = Parameters::new(&problem, &config).unwrap();

        let mut engine = GurobiEngine::new("triangle", "").unwrap().quiet().unwrap();
        let result = HubMedianSolver::solve(&mut engine, &sets, &parameters).unwrap();
        assert_eq!(engine.model.status().unwrap(), grb::Status::Optimal);

        assert!((result.objective - 11.0).abs() < 1e-6);
        assert_eq!(result.hubs.len(), 1);
        let hub = result.hubs[0];
        assert!(hub == 0 || hub == 1);
        assert_eq!((result.routes[0].entry, result.routes[0].exit), (hub, hub));
        assert!(engine.can_write_model());
    }
}
