pub mod hub_median;
pub mod utils;

pub use hub_median::HubMedianSolver;
