//! Algorithm dispatch.
//!
//! A run configuration resolves to exactly one of the supported
//! algorithms; the runner hides which one behind a single `minimize`
//! entry point.

use rand::Rng;

use crate::error::Result;
use crate::moo::moead::Moead;
use crate::moo::nsga2::Nsga2;
use crate::moo::nsga3::Nsga3;
use crate::moo::types::{MooProblem, MooResult, Termination};

/// A fully configured multi-objective algorithm.
#[derive(Debug, Clone)]
pub enum MooAlgorithm {
    Nsga2(Nsga2),
    Nsga3(Nsga3),
    Moead(Moead),
}

impl MooAlgorithm {
    /// Canonical name, as it appears in run configurations.
    pub fn name(&self) -> &'static str {
        match self {
            MooAlgorithm::Nsga2(_) => "NSGA2",
            MooAlgorithm::Nsga3(_) => "NSGA3",
            MooAlgorithm::Moead(_) => "MOEAD",
        }
    }

    /// Population size per generation.
    pub fn pop_size(&self) -> usize {
        match self {
            MooAlgorithm::Nsga2(alg) => alg.pop_size,
            MooAlgorithm::Nsga3(alg) => alg.pop_size,
            MooAlgorithm::Moead(alg) => alg.pop_size(),
        }
    }

    /// Runs the configured algorithm until `termination` is reached.
    pub fn minimize<R: Rng>(
        &self,
        problem: &mut dyn MooProblem,
        termination: Termination,
        rng: &mut R,
    ) -> Result<MooResult> {
        let n_gen = termination.generations();
        match self {
            MooAlgorithm::Nsga2(alg) => alg.minimize(problem, n_gen, rng),
            MooAlgorithm::Nsga3(alg) => alg.minimize(problem, n_gen, rng),
            MooAlgorithm::Moead(alg) => alg.minimize(problem, n_gen, rng),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
