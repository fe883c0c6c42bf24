//! Multi-objective optimization core.
//!
//! A small, self-contained generational toolkit: Pareto utilities,
//! integer variation operators, Das-Dennis reference directions, and
//! three algorithms (NSGA-II, NSGA-III, MOEA/D) behind a common runner.
//! All algorithms evaluate exactly one population batch per generation,
//! which is what lets the scenario pipeline submit each generation as a
//! single job batch.

pub mod config;
pub mod moead;
pub mod nsga2;
pub mod nsga3;
pub mod operators;
pub mod pareto;
pub mod ref_dirs;
pub mod runner;
pub mod types;

pub use config::MooSettings;
pub use moead::Moead;
pub use nsga2::Nsga2;
pub use nsga3::Nsga3;
pub use runner::MooAlgorithm;
pub use types::{Individual, MooProblem, MooResult, Termination};
