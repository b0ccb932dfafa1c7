//! Arbitrary-precision solver for the generalized birthday problem.

pub mod context;
pub mod decimal;
pub mod error;
pub mod factorial;
pub mod input;
pub mod solver;

pub use context::PrecisionCtx;
pub use decimal::Consts;
pub use error::SolverError;
pub use input::{normalize_population, normalize_samples, Population, Samples};
pub use solver::{
    probability, sample_count, solve_for_n, solve_for_p, CalcMethod, Solution,
};
