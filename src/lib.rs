//! Multi-objective refugee-camp placement driver.
//!
//! Searches a fixed table of geocoded candidate locations for placements of
//! one new camp that trade off three objectives, each evaluated by running
//! an external agent-based migration simulator:
//!
//! - **Objective 1**: mean distance travelled by agents that reach the camp
//!   (minimize).
//! - **Objective 2**: camp population on the final simulated day (maximize;
//!   carried negated inside the optimizer).
//! - **Objective 3**: mean absolute gap between scaled camp capacity and
//!   the simulated population (minimize).
//!
//! # Architecture
//!
//! The [`moo`] module is a self-contained generational optimization
//! toolkit (NSGA-II, NSGA-III, MOEA/D). The [`sim`] module owns everything
//! that touches disk or subprocesses: candidate decoding, scenario
//! materialization under `SWEEP/`, batch execution, and objective scoring.
//! [`problem::CampPlacementProblem`] bridges the two: one optimizer
//! generation becomes one batch of simulations.

pub mod context;
pub mod error;
pub mod moo;
pub mod problem;
pub mod sim;

pub use context::{ExecutionMode, RunContext};
pub use error::{CampOptError, Result};
pub use problem::CampPlacementProblem;
