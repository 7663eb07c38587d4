use super::sets_and_parameters::{Parameters, Sets};
use crate::error::HubError;
use crate::models::utils::AddVars;
use crate::problem::NodeIndex;
use crate::report::{self, SolutionEntry};
use crate::solver::recorder::{ModelRecorder, FEASIBILITY_TOLERANCE};
use crate::solver::{Relation, SolverEngine, SolverError, VarKind};
use derive_more::Constructor;
use float_ord::FloatOrd;
use itertools::iproduct;
use log::{debug, info};
use serde::Serialize;
use std::iter::once;

/// Name of the constraint fixing the number of hubs
pub const HUB_COUNT: &str = "u2";
/// Name prefix of the constraints routing each pair exactly once
pub const ASSIGNMENT: &str = "u3_";
/// Name prefix of the constraints tying entry hubs to open hubs
pub const ENTRY_LINKING: &str = "u4_";
/// Name prefix of the constraints tying exit hubs to open hubs
pub const EXIT_LINKING: &str = "u5_";

#[derive(Constructor)]
pub struct Variables<V> {
    /// x[p][k][m]: share of the flow of pair `IJ[p]` routed via entry hub k and exit hub m
    pub x: Vec<Vec<Vec<V>>>,
    /// y[k]: 1 if node k is a hub
    pub y: Vec<V>,
}

pub struct HubMedianSolver {}

#[allow(non_snake_case)]
impl HubMedianSolver {
    /// Streams the variables and constraints of the single allocation p-hub median model into `engine`
    pub fn build<E: SolverEngine>(
        engine: &mut E,
        sets: &Sets,
        parameters: &Parameters,
    ) -> Result<Variables<E::Var>, HubError> {
        info!(
            "Building hub median model with {} nodes, {} hubs and alpha = {}",
            sets.N.len(),
            parameters.P,
            parameters.alpha
        );

        let vars = Self::create_vars(engine, sets, parameters).map_err(HubError::ModelBuild)?;

        // integrate all the variables into the model
        engine
            .finalize_pending_changes()
            .map_err(HubError::ModelBuild)?;

        Self::hub_count_constraint(engine, parameters, &vars).map_err(HubError::ModelBuild)?;
        Self::assignment_constraints(engine, sets, &vars).map_err(HubError::ModelBuild)?;
        Self::entry_linking_constraints(engine, sets, &vars).map_err(HubError::ModelBuild)?;
        Self::exit_linking_constraints(engine, sets, &vars).map_err(HubError::ModelBuild)?;

        info!("Successfully built hub median model");
        Ok(vars)
    }

    /// Builds the model, optimizes it and reads back the solution
    pub fn solve<E: SolverEngine>(
        engine: &mut E,
        sets: &Sets,
        parameters: &Parameters,
    ) -> Result<HubMedianResult, HubError> {
        let vars = Self::build(engine, sets, parameters)?;

        engine.optimize().map_err(HubError::from_optimize)?;

        HubMedianResult::new(engine, sets, &vars).map_err(HubError::Solve)
    }

    fn create_vars<E: SolverEngine>(
        engine: &mut E,
        sets: &Sets,
        parameters: &Parameters,
    ) -> Result<Variables<E::Var>, SolverError> {
        let N = sets.N.len();
        let IJ = &sets.IJ;

        // routing of pair (i, j) through entry hub k and exit hub m, weighted by the pair's flow
        let x = (IJ.len(), N, N).vars_with(|(p, k, m)| {
            let (i, j) = IJ[p];
            engine.create_variable(
                0.0,
                1.0,
                parameters.W(i, j) * parameters.cost(i, k, m, j),
                VarKind::Continuous,
                &format!("x{i}_{k}_{m}_{j}"),
            )
        })?;

        // 1 if node k is opened as a hub, paying its fixed cost
        let y = N.vars_with(|k| {
            engine.create_variable(
                0.0,
                1.0,
                parameters.F(k),
                parameters.hub_kind,
                &format!("y{k}"),
            )
        })?;

        debug!("created {} routing and {} hub variables", IJ.len() * N * N, N);
        Ok(Variables::new(x, y))
    }

    /// Exactly P hubs are opened
    fn hub_count_constraint<E: SolverEngine>(
        engine: &mut E,
        parameters: &Parameters,
        vars: &Variables<E::Var>,
    ) -> Result<(), SolverError> {
        let lhs: Vec<(f64, E::Var)> = vars.y.iter().map(|y| (1.0, *y)).collect();
        engine.add_linear_constraint(&lhs, Relation::Equal, parameters.P as f64, HUB_COUNT)
    }

    /// The flow of every pair is routed through exactly one (entry, exit) combination
    fn assignment_constraints<E: SolverEngine>(
        engine: &mut E,
        sets: &Sets,
        vars: &Variables<E::Var>,
    ) -> Result<(), SolverError> {
        let x = &vars.x;
        for (p, (i, j)) in sets.IJ.iter().enumerate() {
            let lhs: Vec<(f64, E::Var)> = iproduct!(&sets.N, &sets.N)
                .map(|(k, m)| (1.0, x[p][*k][*m]))
                .collect();
            engine.add_linear_constraint(
                &lhs,
                Relation::Equal,
                1.0,
                &format!("{ASSIGNMENT}{i}_{j}"),
            )?;
        }

        debug!("added {} assignment constraints", sets.IJ.len());
        Ok(())
    }

    /// Flow may only enter the hub network at k if k is a hub
    fn entry_linking_constraints<E: SolverEngine>(
        engine: &mut E,
        sets: &Sets,
        vars: &Variables<E::Var>,
    ) -> Result<(), SolverError> {
        let (x, y) = (&vars.x, &vars.y);
        for ((p, (i, j)), k) in iproduct!(sets.IJ.iter().enumerate(), &sets.N) {
            let lhs: Vec<(f64, E::Var)> = sets
                .N
                .iter()
                .map(|m| (1.0, x[p][*k][*m]))
                .chain(once((-1.0, y[*k])))
                .collect();
            engine.add_linear_constraint(
                &lhs,
                Relation::LessEqual,
                0.0,
                &format!("{ENTRY_LINKING}{i}_{j}_{k}"),
            )?;
        }

        debug!(
            "added {} entry linking constraints",
            sets.IJ.len() * sets.N.len()
        );
        Ok(())
    }

    /// Flow may only leave the hub network at m if m is a hub
    fn exit_linking_constraints<E: SolverEngine>(
        engine: &mut E,
        sets: &Sets,
        vars: &Variables<E::Var>,
    ) -> Result<(), SolverError> {
        let (x, y) = (&vars.x, &vars.y);
        for ((p, (i, j)), m) in iproduct!(sets.IJ.iter().enumerate(), &sets.N) {
            let lhs: Vec<(f64, E::Var)> = sets
                .N
                .iter()
                .map(|k| (1.0, x[p][*k][*m]))
                .chain(once((-1.0, y[*m])))
                .collect();
            engine.add_linear_constraint(
                &lhs,
                Relation::LessEqual,
                0.0,
                &format!("{EXIT_LINKING}{i}_{j}_{m}"),
            )?;
        }

        debug!(
            "added {} exit linking constraints",
            sets.IJ.len() * sets.N.len()
        );
        Ok(())
    }
}

/// The route with the largest share of a pair's flow
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Route {
    pub from: NodeIndex,
    pub to: NodeIndex,
    /// hub where the flow enters the hub network
    pub entry: NodeIndex,
    /// hub where the flow leaves the hub network
    pub exit: NodeIndex,
    /// share of the pair's flow on this route
    pub share: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct HubMedianResult {
    /// total transportation and fixed cost
    pub objective: f64,
    /// nodes whose hub variable is above one half. With relaxed hub variables this rounds a
    /// fractional solution, see `hub_levels` for the actual values.
    pub hubs: Vec<NodeIndex>,
    /// every node with a positive hub variable, and its value
    pub hub_levels: Vec<(NodeIndex, f64)>,
    /// the dominant route of every pair (i, j) with i < j
    pub routes: Vec<Route>,
    /// every variable with a positive value
    pub entries: Vec<SolutionEntry>,
}

impl HubMedianResult {
    pub fn new<E: SolverEngine>(
        engine: &E,
        sets: &Sets,
        variables: &Variables<E::Var>,
    ) -> Result<HubMedianResult, SolverError> {
        let entries = report::nonzero_entries(engine)?;
        let objective = entries.iter().map(|e| e.value * e.objective).sum();

        let mut hub_levels = Vec::new();
        for k in &sets.N {
            let level = engine.solution_value(variables.y[*k])?;
            if level > 0.0 {
                hub_levels.push((*k, level));
            }
        }
        let hubs = hub_levels
            .iter()
            .filter(|(_, level)| *level > 0.5)
            .map(|(k, _)| *k)
            .collect();

        let mut routes = Vec::with_capacity(sets.IJ.len());
        for (p, (i, j)) in sets.IJ.iter().enumerate() {
            let mut shares = Vec::with_capacity(sets.N.len() * sets.N.len());
            for (k, m) in iproduct!(&sets.N, &sets.N) {
                shares.push((*k, *m, engine.solution_value(variables.x[p][*k][*m])?));
            }
            if let Some((entry, exit, share)) =
                shares.into_iter().max_by_key(|(_, _, share)| FloatOrd(*share))
            {
                routes.push(Route {
                    from: *i,
                    to: *j,
                    entry,
                    exit,
                    share,
                });
            }
        }

        Ok(HubMedianResult {
            objective,
            hubs,
            hub_levels,
            routes,
            entries,
        })
    }
}

impl HubMedianResult {
    /// Whether every hub is either fully open or closed
    pub fn has_integral_hubs(&self) -> bool {
        self.hub_levels
            .iter()
            .all(|(_, level)| (level - 1.0).abs() <= FEASIBILITY_TOLERANCE)
    }
}

/// The size of a hub median model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModelStats {
    pub routing_vars: usize,
    pub hub_vars: usize,
    pub hub_count: usize,
    pub assignment: usize,
    pub entry_linking: usize,
    pub exit_linking: usize,
}

impl ModelStats {
    /// The size of the model for `nodes` nodes
    pub fn expected(nodes: usize) -> ModelStats {
        let pairs = nodes * nodes.saturating_sub(1) / 2;
        ModelStats {
            routing_vars: pairs * nodes * nodes,
            hub_vars: nodes,
            hub_count: 1,
            assignment: pairs,
            entry_linking: pairs * nodes,
            exit_linking: pairs * nodes,
        }
    }

    /// Counts what was actually recorded, by variable and constraint names
    pub fn recorded(recorder: &ModelRecorder) -> ModelStats {
        let vars = |prefix: &str| {
            recorder
                .vars()
                .iter()
                .filter(|v| v.name.starts_with(prefix))
                .count()
        };
        let constraints = |prefix: &str| {
            recorder
                .constraints()
                .iter()
                .filter(|c| c.name.starts_with(prefix))
                .count()
        };

        ModelStats {
            routing_vars: vars("x"),
            hub_vars: vars("y"),
            hub_count: constraints(HUB_COUNT),
            assignment: constraints(ASSIGNMENT),
            entry_linking: constraints(ENTRY_LINKING),
            exit_linking: constraints(EXIT_LINKING),
        }
    }

    pub fn variables(&self) -> usize {
        self.routing_vars + self.hub_vars
    }

    pub fn constraints(&self) -> usize {
        self.hub_count + self.assignment + self.entry_linking + self.exit_linking
    }
}
