use derive_more::Display;
use ndarray::Array2;
use std::ops::Index;

/// A point in Euclidean 2d-space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point(pub f64, pub f64);

impl Point {
    /// The Euclidean distance to `other`
    pub fn distance(&self, other: &Point) -> Distance {
        (self.0 - other.0).hypot(self.1 - other.1)
    }
}

/// The type used for flow volumes
pub type Flow = f64;
/// The type used for distance
pub type Distance = f64;
/// The typs used for cost.
pub type Cost = f64;

pub type NodeIndex = usize;

/// A square matrix of reals. The shape is checked once, when the matrix is created.
#[derive(Debug, Clone, PartialEq)]
pub struct SquareMatrix(Array2<f64>);

impl SquareMatrix {
    /// Builds an `n x n` matrix from its rows. Returns `None` if the rows do not form a square.
    pub fn from_rows(rows: &[Vec<f64>]) -> Option<SquareMatrix> {
        let n = rows.len();
        if rows.iter().any(|row| row.len() != n) {
            return None;
        }
        Some(SquareMatrix(Array2::from_shape_fn((n, n), |(i, j)| {
            rows[i][j]
        })))
    }

    pub fn from_fn<F: FnMut(usize, usize) -> f64>(n: usize, mut f: F) -> SquareMatrix {
        SquareMatrix(Array2::from_shape_fn((n, n), |(i, j)| f(i, j)))
    }

    /// The number of rows (and columns)
    pub fn len(&self) -> usize {
        self.0.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_symmetric(&self) -> bool {
        let n = self.len();
        (0..n).all(|i| (0..i).all(|j| self[(i, j)] == self[(j, i)]))
    }
}

impl Index<(usize, usize)> for SquareMatrix {
    type Output = f64;

    fn index(&self, (i, j): (usize, usize)) -> &Self::Output {
        &self.0[[i, j]]
    }
}

#[derive(Debug, Display, PartialEq)]
pub enum ProblemError {
    /// Every coordinate must consist of exactly two values
    #[display(fmt = "coordinate of node {} has {} values, expected 2", node, actual)]
    CoordinateShape { node: NodeIndex, actual: usize },
    /// The flow matrix is not square
    #[display(fmt = "the flow matrix is not square")]
    FlowShape,
    /// The coordinates and the flow matrix imply a different number of nodes
    #[display(fmt = "{} coordinates but a {}x{} flow matrix", coordinates, flows, flows)]
    SizeMismatch { coordinates: usize, flows: usize },
    /// There must be exactly one fixed cost per node
    #[display(fmt = "{} fixed costs given for {} nodes", actual, expected)]
    FixedCostLength { expected: usize, actual: usize },
    #[display(fmt = "negative flow {} from node {} to node {}", flow, from, to)]
    NegativeFlow {
        from: NodeIndex,
        to: NodeIndex,
        flow: Flow,
    },
    #[display(fmt = "the input contains a value that is not finite")]
    NonFinite,
    #[display(fmt = "the problem has no nodes")]
    EmptyProblem,
}

impl std::error::Error for ProblemError {}

/// A p-hub median instance after preprocessing.
#[derive(Debug, Clone)]
pub struct Problem {
    /// The location of each node
    coordinates: Vec<Point>,
    /// The cost of opening each node as a hub
    fixed_costs: Vec<Cost>,
    /// Flow between each pair of nodes, in both directions combined. Symmetric.
    flows: SquareMatrix,
    /// Euclidean distances between the nodes
    distances: SquareMatrix,
}

impl Problem {
    /// Validates the raw input and derives the symmetric flow and distance matrices.
    ///
    /// `coordinates` is an `n x 2` matrix, `raw_flows` an `n x n` matrix that need not be
    /// symmetric, and `fixed_costs` holds one cost per node.
    pub fn new(
        coordinates: &[Vec<f64>],
        raw_flows: &[Vec<Flow>],
        fixed_costs: &[Cost],
    ) -> Result<Problem, ProblemError> {
        let points = coordinates
            .iter()
            .enumerate()
            .map(|(node, row)| match row.as_slice() {
                [x, y] => Ok(Point(*x, *y)),
                _ => Err(ProblemError::CoordinateShape {
                    node,
                    actual: row.len(),
                }),
            })
            .collect::<Result<Vec<Point>, ProblemError>>()?;

        let raw = SquareMatrix::from_rows(raw_flows).ok_or(ProblemError::FlowShape)?;

        if points.len() != raw.len() {
            return Err(ProblemError::SizeMismatch {
                coordinates: points.len(),
                flows: raw.len(),
            });
        }
        if points.is_empty() {
            return Err(ProblemError::EmptyProblem);
        }
        if fixed_costs.len() != points.len() {
            return Err(ProblemError::FixedCostLength {
                expected: points.len(),
                actual: fixed_costs.len(),
            });
        }

        let finite = points.iter().all(|p| p.0.is_finite() && p.1.is_finite())
            && raw_flows.iter().flatten().all(|f| f.is_finite())
            && fixed_costs.iter().all(|c| c.is_finite());
        if !finite {
            return Err(ProblemError::NonFinite);
        }

        for (from, row) in raw_flows.iter().enumerate() {
            for (to, flow) in row.iter().enumerate() {
                if *flow < 0.0 {
                    return Err(ProblemError::NegativeFlow {
                        from,
                        to,
                        flow: *flow,
                    });
                }
            }
        }

        Ok(Problem {
            flows: symmetrize(&raw),
            distances: euclidean_distances(&points),
            coordinates: points,
            fixed_costs: fixed_costs.to_vec(),
        })
    }

    /// The number of nodes
    pub fn nodes(&self) -> usize {
        self.coordinates.len()
    }

    /// The cost of opening `node` as a hub
    pub fn fixed_cost(&self, node: NodeIndex) -> Cost {
        self.fixed_costs[node]
    }

    /// The combined flow between two nodes, in both directions
    pub fn flow(&self, i: NodeIndex, j: NodeIndex) -> Flow {
        self.flows[(i, j)]
    }

    /// The distance between two nodes
    pub fn distance(&self, from: NodeIndex, to: NodeIndex) -> Distance {
        self.distances[(from, to)]
    }

    pub fn distances(&self) -> &SquareMatrix {
        &self.distances
    }
}

/// `flow[i][j] = raw[i][j] + raw[j][i]`
pub fn symmetrize(raw: &SquareMatrix) -> SquareMatrix {
    SquareMatrix::from_fn(raw.len(), |i, j| raw[(i, j)] + raw[(j, i)])
}

/// Pairwise Euclidean distances between `points`
pub fn euclidean_distances(points: &[Point]) -> SquareMatrix {
    SquareMatrix::from_fn(points.len(), |i, j| points[i].distance(&points[j]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> Problem {
        let coordinates = vec![vec![0.0, 0.0], vec![1.0, 0.0], vec![0.0, 1.0]];
        let flows = vec![
            vec![0.0, 5.0, 0.0],
            vec![5.0, 0.0, 0.0],
            vec![0.0, 0.0, 0.0],
        ];
        Problem::new(&coordinates, &flows, &[1.0, 1.0, 1.0]).unwrap()
    }

    #[test]
    fn symmetrizes_flows() {
        let problem = triangle();
        assert_eq!(problem.flow(0, 1), 10.0);
        assert_eq!(problem.flow(1, 0), 10.0);
        for (i, j) in [(0, 0), (0, 2), (2, 0), (1, 2), (2, 2)] {
            assert_eq!(problem.flow(i, j), 0.0);
        }
    }

    #[test]
    fn asymmetric_flows_become_symmetric() {
        let raw = SquareMatrix::from_rows(&[
            vec![1.0, 2.0, 3.0],
            vec![0.0, 4.0, 7.0],
            vec![9.0, 0.5, 0.0],
        ])
        .unwrap();
        assert!(!raw.is_symmetric());
        let flows = symmetrize(&raw);
        assert!(flows.is_symmetric());
        assert_eq!(flows[(0, 2)], 12.0);
        assert_eq!(flows[(1, 1)], 8.0);
    }

    #[test]
    fn distances_are_euclidean() {
        let problem = triangle();
        assert_eq!(problem.distance(0, 1), 1.0);
        assert_eq!(problem.distance(0, 2), 1.0);
        assert!((problem.distance(1, 2) - 2f64.sqrt()).abs() < 1e-12);
        assert!(problem.distances().is_symmetric());
        assert!((0..3).all(|i| problem.distance(i, i) == 0.0));
    }

    #[test]
    fn rejects_malformed_input() {
        let square = vec![vec![0.0, 1.0], vec![1.0, 0.0]];
        let coordinates = vec![vec![0.0, 0.0], vec![1.0, 1.0]];

        assert_eq!(
            Problem::new(&coordinates, &[vec![0.0, 1.0]], &[1.0, 1.0]).unwrap_err(),
            ProblemError::FlowShape
        );
        assert_eq!(
            Problem::new(&coordinates[..1], &square, &[1.0]).unwrap_err(),
            ProblemError::SizeMismatch {
                coordinates: 1,
                flows: 2
            }
        );
        assert_eq!(
            Problem::new(&[vec![0.0], vec![1.0, 1.0]], &square, &[1.0, 1.0]).unwrap_err(),
            ProblemError::CoordinateShape { node: 0, actual: 1 }
        );
        assert_eq!(
            Problem::new(&coordinates, &square, &[1.0]).unwrap_err(),
            ProblemError::FixedCostLength {
                expected: 2,
                actual: 1
            }
        );
        assert!(matches!(
            Problem::new(&coordinates, &[vec![0.0, -1.0], vec![1.0, 0.0]], &[1.0, 1.0]),
            Err(ProblemError::NegativeFlow { from: 0, to: 1, .. })
        ));
        assert_eq!(
            Problem::new(&coordinates, &square, &[f64::NAN, 1.0]).unwrap_err(),
            ProblemError::NonFinite
        );
        assert_eq!(
            Problem::new(&[], &[], &[]).unwrap_err(),
            ProblemError::EmptyProblem
        );
    }
}
