//! Builds and solves the single allocation p-hub median problem.
//!
//! Raw coordinates and flows are preprocessed into a [`problem::Problem`], the model is
//! streamed into any [`solver::SolverEngine`] by [`models::HubMedianSolver`], and the solved
//! variables are read back as [`report::SolutionEntry`] values.

pub mod error;
pub mod models;
pub mod parse;
pub mod problem;
pub mod report;
pub mod solver;

pub use error::HubError;
