//! MOEA/D (Zhang & Li, 2007).
//!
//! Decomposes the multi-objective problem into one Tchebycheff subproblem
//! per weight vector. This variant is generational: every subproblem
//! produces one offspring, the whole set is evaluated as a single batch
//! (preserving the one-batch-per-generation evaluation contract), and
//! neighborhood replacement runs afterwards.

use rand::Rng;

use crate::error::Result;
use crate::moo::nsga2::front_result;
use crate::moo::operators::{Crossover, Mutation, Sampling};
use crate::moo::types::{evaluate_into, Individual, MooProblem, MooResult};

/// MOEA/D configuration and entry point.
#[derive(Debug, Clone)]
pub struct Moead {
    /// Decomposition weight vectors; one subproblem (and one population
    /// slot) per vector.
    pub weights: Vec<Vec<f64>>,
    /// Neighborhood size per subproblem.
    pub n_neighbors: usize,
    /// Probability of mating within the neighborhood instead of the whole
    /// population.
    pub prob_neighbor_mating: f64,
    /// Initial-population sampling operator.
    pub sampling: Sampling,
    /// Crossover operator.
    pub crossover: Crossover,
    /// Mutation operator.
    pub mutation: Mutation,
}

impl Moead {
    /// Population size equals the number of weight vectors.
    pub fn pop_size(&self) -> usize {
        self.weights.len()
    }

    /// Runs the search for `n_gen` generations and returns the final
    /// non-dominated set.
    pub fn minimize<R: Rng>(
        &self,
        problem: &mut dyn MooProblem,
        n_gen: usize,
        rng: &mut R,
    ) -> Result<MooResult> {
        let (lo, hi) = (problem.lower_bound(), problem.upper_bound());
        let n = self.pop_size();
        let neighbors = self.neighborhoods();

        let mut population: Vec<Individual> = self
            .sampling
            .sample(n, problem.n_var(), lo, hi, rng)
            .into_iter()
            .map(Individual::new)
            .collect();
        evaluate_into(problem, &mut population)?;
        let mut ideal = ideal_point(&population);

        for _ in 1..n_gen {
            let mut offspring = Vec::with_capacity(n);
            for i in 0..n {
                let pool: &[usize] = if rng.random_range(0.0..1.0)
                    < self.prob_neighbor_mating
                {
                    &neighbors[i]
                } else {
                    &[]
                };
                let (p1, p2) = pick_parents(pool, n, rng);
                let (mut genes, _) = self.crossover.apply(
                    &population[p1].genes,
                    &population[p2].genes,
                    lo,
                    hi,
                    rng,
                );
                self.mutation.apply(&mut genes, lo, hi, rng);
                offspring.push(Individual::new(genes));
            }
            evaluate_into(problem, &mut offspring)?;

            for (i, child) in offspring.into_iter().enumerate() {
                update_ideal(&mut ideal, &child.objectives);
                for &j in &neighbors[i] {
                    let child_agg = tchebycheff(&child.objectives, &self.weights[j], &ideal);
                    let incumbent_agg =
                        tchebycheff(&population[j].objectives, &self.weights[j], &ideal);
                    if child_agg <= incumbent_agg {
                        population[j] = child.clone();
                    }
                }
            }
        }

        Ok(front_result(population, n_gen))
    }

    /// For each subproblem, the indices of the `n_neighbors` closest weight
    /// vectors (by Euclidean distance, self included).
    fn neighborhoods(&self) -> Vec<Vec<usize>> {
        let n = self.pop_size();
        (0..n)
            .map(|i| {
                let mut order: Vec<usize> = (0..n).collect();
                order.sort_by(|&a, &b| {
                    let da = euclidean(&self.weights[i], &self.weights[a]);
                    let db = euclidean(&self.weights[i], &self.weights[b]);
                    da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
                });
                order.truncate(self.n_neighbors.min(n));
                order
            })
            .collect()
    }
}

/// Two distinct parent indices, drawn from `pool` when it is non-empty and
/// from the whole population otherwise.
fn pick_parents<R: Rng>(pool: &[usize], n: usize, rng: &mut R) -> (usize, usize) {
    let draw = |rng: &mut R| {
        if pool.is_empty() {
            rng.random_range(0..n)
        } else {
            pool[rng.random_range(0..pool.len())]
        }
    };
    let p1 = draw(rng);
    let mut p2 = draw(rng);
    for _ in 0..16 {
        if p2 != p1 {
            break;
        }
        p2 = draw(rng);
    }
    (p1, p2)
}

/// Weighted Tchebycheff aggregation toward the ideal point.
fn tchebycheff(objectives: &[f64], weight: &[f64], ideal: &[f64]) -> f64 {
    objectives
        .iter()
        .zip(weight)
        .zip(ideal)
        .map(|((&f, &w), &z)| w.max(1e-6) * (f - z).abs())
        .fold(f64::NEG_INFINITY, f64::max)
}

fn ideal_point(population: &[Individual]) -> Vec<f64> {
    let m = population[0].objectives.len();
    let mut ideal = vec![f64::INFINITY; m];
    for individual in population {
        update_ideal(&mut ideal, &individual.objectives);
    }
    ideal
}

fn update_ideal(ideal: &mut [f64], objectives: &[f64]) {
    for (z, &f) in ideal.iter_mut().zip(objectives) {
        *z = z.min(f);
    }
}

fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

// ============================================================================
// Tests
// ============================================================================
