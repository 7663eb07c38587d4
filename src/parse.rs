//! Reading instances from disk.
//!
//! Two layouts are accepted: three plain text matrices (coordinates, flows and fixed costs,
//! one row per line, values separated by whitespace or commas) or a single JSON document.

use crate::problem::{Problem, ProblemError};
use derive_more::Display;
use log::debug;
use serde::Deserialize;
use std::io::Read;
use std::num::ParseFloatError;
use std::path::Path;

#[derive(Debug, Display)]
pub enum ParseError {
    #[display(fmt = "{}: {}", path, source)]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[display(fmt = "line {}: {:?} is not a number ({})", line, token, source)]
    Float {
        line: usize,
        token: String,
        source: ParseFloatError,
    },
    #[display(fmt = "{}", _0)]
    Json(serde_json::Error),
    /// The parsed matrices do not form a valid instance
    #[display(fmt = "{}", _0)]
    Problem(ProblemError),
}

impl std::error::Error for ParseError {}

impl From<serde_json::Error> for ParseError {
    fn from(err: serde_json::Error) -> Self {
        ParseError::Json(err)
    }
}

impl From<ProblemError> for ParseError {
    fn from(err: ProblemError) -> Self {
        ParseError::Problem(err)
    }
}

/// Parses a whitespace or comma separated matrix. Blank lines are skipped.
pub fn parse_matrix(text: &str) -> Result<Vec<Vec<f64>>, ParseError> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            line.split(|c: char| c.is_whitespace() || c == ',')
                .filter(|token| !token.is_empty())
                .map(|token| {
                    token.parse::<f64>().map_err(|source| ParseError::Float {
                        line: index + 1,
                        token: token.to_string(),
                        source,
                    })
                })
                .collect::<Result<Vec<f64>, ParseError>>()
        })
        .collect()
}

/// Reads a matrix from a text file, see [`parse_matrix`]
pub fn read_matrix(path: impl AsRef<Path>) -> Result<Vec<Vec<f64>>, ParseError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| ParseError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let matrix = parse_matrix(&text)?;
    debug!("read {} rows from {}", matrix.len(), path.display());
    Ok(matrix)
}

/// The raw input of a p-hub median instance
#[derive(Debug, Clone, Deserialize)]
pub struct Instance {
    /// One `[x, y]` pair per node
    pub coordinates: Vec<Vec<f64>>,
    /// Flow from each node to each other node, need not be symmetric
    pub flows: Vec<Vec<f64>>,
    /// The cost of opening each node as a hub
    pub fixed_costs: Vec<f64>,
}

impl Instance {
    pub fn from_json<R: Read>(reader: R) -> Result<Instance, ParseError> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn read_json(path: impl AsRef<Path>) -> Result<Instance, ParseError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|source| ParseError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Instance::from_json(std::io::BufReader::new(file))
    }

    /// Reads the three text matrices. Fixed costs are taken from the first column of their file.
    pub fn read_text(
        coordinates: impl AsRef<Path>,
        flows: impl AsRef<Path>,
        fixed_costs: impl AsRef<Path>,
    ) -> Result<Instance, ParseError> {
        let coordinates = read_matrix(coordinates)?;
        let flows = read_matrix(flows)?;
        let fixed_costs = read_matrix(fixed_costs)?
            .into_iter()
            .filter_map(|row| row.first().copied())
            .collect();

        Ok(Instance {
            coordinates,
            flows,
            fixed_costs,
        })
    }

    /// Validates and preprocesses the instance
    pub fn problem(&self) -> Result<Problem, ParseError> {
        Ok(Problem::new(
            &self.coordinates,
            &self.flows,
            &self.fixed_costs,
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_mixed_separators() {
        let matrix = parse_matrix("1 2.5\t3\n\n4,5 , 6\n").unwrap();
        assert_eq!(matrix, vec![vec![1.0, 2.5, 3.0], vec![4.0, 5.0, 6.0]]);
    }

    #[test]
    fn reports_the_offending_line() {
        match parse_matrix("1 2\n3 x\n") {
            Err(ParseError::Float { line, token, .. }) => {
                assert_eq!(line, 2);
                assert_eq!(token, "x");
            }
            other => panic!("expected a float error, got {:?}", other),
        }
    }

    #[test]
    fn json_instance() {
        let json = r#"{
            "coordinates": [[0, 0], [1, 0], [0, 1]],
            "flows": [[0, 5, 0], [5, 0, 0], [0, 0, 0]],
            "fixed_costs": [1, 1, 1]
        }"#;
        let instance = Instance::from_json(json.as_bytes()).unwrap();
        let problem = instance.problem().unwrap();
        assert_eq!(problem.nodes(), 3);
        assert_eq!(problem.flow(1, 0), 10.0);
    }

    #[test]
    fn malformed_instance_is_a_problem_error() {
        let json = r#"{
            "coordinates": [[0, 0], [1, 0]],
            "flows": [[0, 5, 0], [5, 0, 0], [0, 0, 0]],
            "fixed_costs": [1, 1]
        }"#;
        let instance = Instance::from_json(json.as_bytes()).unwrap();
        assert!(matches!(
            instance.problem(),
            Err(ParseError::Problem(ProblemError::SizeMismatch { .. }))
        ));
    }

    #[test]
    fn reads_text_files() {
        let dir = std::env::temp_dir().join(format!("hub_median_parse_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("coordinates.txt"), "0 0\n1 0\n0 1\n").unwrap();
        std::fs::write(dir.join("w.txt"), "0 5 0\n5 0 0\n0 0 0\n").unwrap();
        std::fs::write(dir.join("fixedcharge.txt"), "1 9\n2 9\n3 9\n").unwrap();

        let instance = Instance::read_text(
            dir.join("coordinates.txt"),
            dir.join("w.txt"),
            dir.join("fixedcharge.txt"),
        )
        .unwrap();
        assert_eq!(instance.fixed_costs, vec![1.0, 2.0, 3.0]);
        assert_eq!(instance.problem().unwrap().flow(0, 1), 10.0);

        assert!(matches!(
            read_matrix(dir.join("missing.txt")),
            Err(ParseError::Io { .. })
        ));
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
