//! Yearly gift-partner assignment.
//!
//! Everyone gives to exactly one person outside their own family, nobody is
//! given to twice, and no two people swap gifts in the same year. Among all
//! such assignments the solver returns the one with the lowest penalty for
//! repeating past recipients, found by exhaustive branch-and-bound.

pub mod error;
pub mod roster;
pub mod runtime;
pub mod solver;

pub use error::SolveError;
pub use roster::{DataStore, Family, History, Person};
pub use solver::{Solver, SolverConfig, SolveOutcome};
