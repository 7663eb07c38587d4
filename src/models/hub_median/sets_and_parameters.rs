use crate::problem::{Cost, NodeIndex, Problem};
use crate::solver::VarKind;
use derive_more::Display;
use itertools::Itertools;
use log::trace;

/// Settings of a single model build. Read once, never changed.
#[derive(Debug, Clone, Copy)]
pub struct ModelConfig {
    /// The number of hubs to open
    pub hubs: usize,
    /// Discount on the hub-to-hub leg of a route
    pub alpha: f64,
    /// Create the hub variables as binaries instead of relaxing them to [0, 1]
    pub binary_hubs: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig {
            hubs: 3,
            alpha: 0.2,
            binary_hubs: false,
        }
    }
}

#[derive(Debug, Display, PartialEq)]
pub enum ParameterError {
    /// The number of hubs must lie in 1..=nodes
    #[display(fmt = "cannot open {} hubs among {} nodes", hubs, nodes)]
    HubCount { hubs: usize, nodes: usize },
    /// The discount factor must lie in [0, 1]
    #[display(fmt = "alpha must lie in [0, 1], got {}", _0)]
    Alpha(f64),
}

impl std::error::Error for ParameterError {}

/// sets for the hub median model
#[derive(Debug)]
#[allow(non_snake_case)]
pub struct Sets {
    /// Set of nodes, every node is a candidate hub
    pub N: Vec<NodeIndex>,
    /// Unordered node pairs (i, j) with i < j, in lexicographic order
    pub IJ: Vec<(NodeIndex, NodeIndex)>,
}

#[allow(non_snake_case)]
impl Sets {
    pub fn new(problem: &Problem) -> Sets {
        let N: Vec<NodeIndex> = (0..problem.nodes()).collect();
        let IJ: Vec<(NodeIndex, NodeIndex)> = N.iter().copied().tuple_combinations().collect();
        trace!("{} nodes, {} node pairs", N.len(), IJ.len());
        Sets { N, IJ }
    }
}

/// parameters for the hub median model
#[allow(non_snake_case)]
pub struct Parameters<'a> {
    /// Number of hubs to open
    pub P: usize,
    /// Discount factor on the inter-hub leg
    pub alpha: f64,
    /// Type of the hub variables
    pub hub_kind: VarKind,
    problem: &'a Problem,
}

#[allow(non_snake_case)]
impl<'a> Parameters<'a> {
    pub fn new(
        problem: &'a Problem,
        config: &ModelConfig,
    ) -> Result<Parameters<'a>, ParameterError> {
        let nodes = problem.nodes();
        if config.hubs == 0 || config.hubs > nodes {
            return Err(ParameterError::HubCount {
                hubs: config.hubs,
                nodes,
            });
        }
        if !(0.0..=1.0).contains(&config.alpha) {
            return Err(ParameterError::Alpha(config.alpha));
        }

        Ok(Parameters {
            P: config.hubs,
            alpha: config.alpha,
            hub_kind: if config.binary_hubs {
                VarKind::Binary
            } else {
                VarKind::Continuous
            },
            problem,
        })
    }

    /// Flow between node i and node j, both directions combined
    pub fn W(&self, i: NodeIndex, j: NodeIndex) -> f64 {
        self.problem.flow(i, j)
    }

    /// Fixed cost of opening node k as a hub
    pub fn F(&self, k: NodeIndex) -> Cost {
        self.problem.fixed_cost(k)
    }

    /// Cost per unit of flow from i to j, entering the hub network at k and leaving it at m.
    ///
    /// The hub-to-hub leg is discounted by `alpha`. When `k == m` that leg has length zero,
    /// so routing through a single hub needs no special treatment.
    pub fn cost(&self, i: NodeIndex, k: NodeIndex, m: NodeIndex, j: NodeIndex) -> Cost {
        let d = |a, b| self.problem.distance(a, b);
        d(i, k) + (1.0 - self.alpha) * d(k, m) + d(m, j)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use itertools::iproduct;

    fn square() -> Problem {
        let coordinates = vec![
            vec![0.0, 0.0],
            vec![3.0, 0.0],
            vec![3.0, 4.0],
            vec![0.0, 4.0],
        ];
        let flows = vec![vec![1.0; 4]; 4];
        Problem::new(&coordinates, &flows, &[1.0; 4]).unwrap()
    }

    #[test]
    fn pairs_are_ordered() {
        let sets = Sets::new(&square());
        assert_eq!(sets.N, vec![0, 1, 2, 3]);
        assert_eq!(
            sets.IJ,
            vec![(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)]
        );
    }

    #[test]
    fn cost_discounts_the_hub_leg() {
        let problem = square();
        let config = ModelConfig {
            hubs: 2,
            alpha: 0.25,
            binary_hubs: false,
        };
        let params = Parameters::new(&problem, &config).unwrap();
        let d = |a, b| problem.distance(a, b);

        for (i, k, m, j) in iproduct!(0..4, 0..4, 0..4, 0..4) {
            let expected = d(i, k) + 0.75 * d(k, m) + d(m, j);
            assert!((params.cost(i, k, m, j) - expected).abs() < 1e-12);
        }
        // 0 -> 1 -> 2 -> 3: 3 + 0.75 * 4 + 3
        assert!((params.cost(0, 1, 2, 3) - 9.0).abs() < 1e-12);
    }

    #[test]
    fn single_hub_routes_ignore_alpha() {
        let problem = square();
        for alpha in [0.0, 0.2, 1.0] {
            let config = ModelConfig {
                hubs: 1,
                alpha,
                binary_hubs: false,
            };
            let params = Parameters::new(&problem, &config).unwrap();
            for (i, k, j) in iproduct!(0..4, 0..4, 0..4) {
                let expected = problem.distance(i, k) + problem.distance(k, j);
                assert!((params.cost(i, k, k, j) - expected).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn rejects_bad_parameters() {
        let problem = square();
        let config = |hubs, alpha| ModelConfig {
            hubs,
            alpha,
            binary_hubs: true,
        };
        assert_eq!(
            Parameters::new(&problem, &config(0, 0.2)).err(),
            Some(ParameterError::HubCount { hubs: 0, nodes: 4 })
        );
        assert_eq!(
            Parameters::new(&problem, &config(5, 0.2)).err(),
            Some(ParameterError::HubCount { hubs: 5, nodes: 4 })
        );
        assert_eq!(
            Parameters::new(&problem, &config(2, 1.5)).err(),
            Some(ParameterError::Alpha(1.5))
        );
        let params = Parameters::new(&problem, &config(4, 1.0)).unwrap();
        assert_eq!(params.hub_kind, VarKind::Binary);
        assert_eq!(params.W(0, 1), 2.0);
        assert_eq!(params.F(3), 1.0);
    }
}
