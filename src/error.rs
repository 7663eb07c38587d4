use crate::models::hub_median::ParameterError;
use crate::parse::ParseError;
use crate::problem::ProblemError;
use crate::solver::SolverError;
use derive_more::Display;

/// Everything that can end a run. None of these are recovered from.
#[derive(Debug, Display)]
pub enum HubError {
    /// The input matrices do not describe a valid instance
    #[display(fmt = "malformed input: {}", _0)]
    MalformedInput(ProblemError),
    #[display(fmt = "invalid parameters: {}", _0)]
    InvalidParameters(ParameterError),
    /// The solver refused a variable or a constraint
    #[display(fmt = "failed to build the model: {}", _0)]
    ModelBuild(SolverError),
    #[display(fmt = "the model is infeasible")]
    Infeasible,
    #[display(fmt = "the model is unbounded")]
    Unbounded,
    /// Any other failure while optimizing or reading the solution
    #[display(fmt = "failed to solve the model: {}", _0)]
    Solve(SolverError),
    #[display(fmt = "failed to read input: {}", _0)]
    Parse(ParseError),
    /// The solver backend was not compiled into this binary
    #[display(fmt = "the {} backend is not available, rebuild with `--features {}`", _0, _0)]
    BackendUnavailable(&'static str),
}

impl std::error::Error for HubError {}

impl HubError {
    /// Lifts an error raised by `optimize`
    pub fn from_optimize(err: SolverError) -> HubError {
        match err {
            SolverError::Infeasible => HubError::Infeasible,
            SolverError::Unbounded => HubError::Unbounded,
            other => HubError::Solve(other),
        }
    }
}

impl From<ProblemError> for HubError {
    fn from(err: ProblemError) -> Self {
        HubError::MalformedInput(err)
    }
}

impl From<ParameterError> for HubError {
    fn from(err: ParameterError) -> Self {
        HubError::InvalidParameters(err)
    }
}

impl From<ParseError> for HubError {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::Problem(err) => HubError::MalformedInput(err),
            other => HubError::Parse(other),
        }
    }
}
