//! The single allocation p-hub median model.
//!
//! Every unordered node pair (i, j) sends its combined flow through an entry hub k and an exit
//! hub m (possibly k == m, possibly i or j themselves). Exactly P hubs are opened, and the
//! hub-to-hub leg of every route is discounted by alpha.

pub mod model;
pub mod sets_and_parameters;

pub use model::{HubMedianResult, HubMedianSolver, ModelStats, Route, Variables};
pub use sets_and_parameters::{ModelConfig, ParameterError, Parameters, Sets};
