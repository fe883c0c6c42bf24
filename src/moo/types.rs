//! Core contracts between the search algorithms and the evaluation side.
//!
//! [`MooProblem`] is the single seam the search loop is written against:
//! the algorithms only ever hand over a whole candidate population and get
//! back a minimize-oriented objective matrix in the same order.

use crate::error::Result;

/// A multi-objective optimization problem with batch evaluation.
///
/// All objectives are **minimized**: implementations negate any
/// maximization target before returning it.
///
/// Evaluation is not idempotent — re-evaluating the same genes may allocate
/// fresh external resources — so implementations are driven through
/// `&mut self` and algorithms never deduplicate candidates by value.
pub trait MooProblem {
    /// Number of decision variables per candidate.
    fn n_var(&self) -> usize;

    /// Number of objective values per candidate.
    fn n_obj(&self) -> usize;

    /// Inclusive lower bound of every decision variable.
    fn lower_bound(&self) -> f64;

    /// Inclusive upper bound of every decision variable.
    fn upper_bound(&self) -> f64;

    /// Evaluates a whole candidate population in one batch.
    ///
    /// Returns exactly one objective row per candidate, aligned with the
    /// input order. Any failure aborts the search.
    fn evaluate(&mut self, population: &[Vec<f64>]) -> Result<Vec<Vec<f64>>>;
}

/// One candidate solution carried through the evolutionary loop.
#[derive(Debug, Clone)]
pub struct Individual {
    /// Decision variables.
    pub genes: Vec<f64>,
    /// Objective values; empty until evaluated.
    pub objectives: Vec<f64>,
}

impl Individual {
    /// An unevaluated individual.
    pub fn new(genes: Vec<f64>) -> Individual {
        Individual {
            genes,
            objectives: Vec::new(),
        }
    }
}

/// Stopping rule for a search. Owned by the optimizer, not the search loop:
/// the problem is called until the rule says stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Stop after this many generations, counting the initial population.
    MaxGenerations(usize),
}

impl Termination {
    /// Number of generations to run.
    pub fn generations(&self) -> usize {
        match *self {
            Termination::MaxGenerations(n) => n,
        }
    }
}

/// Final outcome of a search: the non-dominated set of the last population.
#[derive(Debug, Clone)]
pub struct MooResult {
    /// Decision variables of the non-dominated solutions.
    pub x: Vec<Vec<f64>>,
    /// Minimize-oriented objective rows, aligned with `x`.
    pub f: Vec<Vec<f64>>,
    /// Generations executed, including the initial one.
    pub generations: usize,
}

/// Evaluates `individuals` through the problem in one batch and stores the
/// returned objective rows in place.
pub(crate) fn evaluate_into(
    problem: &mut dyn MooProblem,
    individuals: &mut [Individual],
) -> Result<()> {
    let genes: Vec<Vec<f64>> = individuals.iter().map(|i| i.genes.clone()).collect();
    let objectives = problem.evaluate(&genes)?;
    assert_eq!(
        objectives.len(),
        individuals.len(),
        "problem returned {} objective rows for {} candidates",
        objectives.len(),
        individuals.len()
    );
    for (individual, row) in individuals.iter_mut().zip(objectives) {
        individual.objectives = row;
    }
    Ok(())
}
