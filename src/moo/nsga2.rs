//! NSGA-II (Deb et al., 2002).
//!
//! Elitist multi-objective search: binary tournament on (Pareto rank,
//! crowding distance), SBX + polynomial mutation, and environmental
//! selection that fills the next population front by front, splitting the
//! last front by crowding distance.

use rand::Rng;

use crate::error::Result;
use crate::moo::operators::{breed, Crossover, Mutation, Sampling};
use crate::moo::pareto::{crowding_distance, non_dominated_sort, ranks};
use crate::moo::types::{evaluate_into, Individual, MooProblem, MooResult};

/// NSGA-II configuration and entry point.
#[derive(Debug, Clone)]
pub struct Nsga2 {
    /// Number of individuals per generation.
    pub pop_size: usize,
    /// Initial-population sampling operator.
    pub sampling: Sampling,
    /// Crossover operator.
    pub crossover: Crossover,
    /// Mutation operator.
    pub mutation: Mutation,
}

impl Nsga2 {
    /// Runs the search for `n_gen` generations (the initial population
    /// counts as generation one) and returns the final non-dominated set.
    pub fn minimize<R: Rng>(
        &self,
        problem: &mut dyn MooProblem,
        n_gen: usize,
        rng: &mut R,
    ) -> Result<MooResult> {
        let (lo, hi) = (problem.lower_bound(), problem.upper_bound());
        let n_var = problem.n_var();

        let mut population: Vec<Individual> = self
            .sampling
            .sample(self.pop_size, n_var, lo, hi, rng)
            .into_iter()
            .map(Individual::new)
            .collect();
        evaluate_into(problem, &mut population)?;

        for _ in 1..n_gen {
            let objectives: Vec<Vec<f64>> =
                population.iter().map(|i| i.objectives.clone()).collect();
            let fronts = non_dominated_sort(&objectives);
            let rank = ranks(&fronts, population.len());
            let crowding = crowding_by_front(&objectives, &fronts);

            let mut offspring = breed(
                &population,
                self.pop_size,
                self.crossover,
                self.mutation,
                lo,
                hi,
                rng,
                |rng| tournament(&rank, &crowding, rng),
            );
            evaluate_into(problem, &mut offspring)?;

            population.extend(offspring);
            population = environmental_selection(population, self.pop_size);
        }

        Ok(front_result(population, n_gen))
    }
}

/// Binary tournament: lower rank wins; ties go to the larger crowding
/// distance.
fn tournament<R: Rng>(rank: &[usize], crowding: &[f64], rng: &mut R) -> usize {
    let a = rng.random_range(0..rank.len());
    let b = rng.random_range(0..rank.len());
    if rank[a] < rank[b] || (rank[a] == rank[b] && crowding[a] > crowding[b]) {
        a
    } else {
        b
    }
}

/// Crowding distances computed within each front separately.
fn crowding_by_front(objectives: &[Vec<f64>], fronts: &[Vec<usize>]) -> Vec<f64> {
    let mut out = vec![0.0; objectives.len()];
    for front in fronts {
        let front_objs: Vec<Vec<f64>> =
            front.iter().map(|&i| objectives[i].clone()).collect();
        for (&i, d) in front.iter().zip(crowding_distance(&front_objs)) {
            out[i] = d;
        }
    }
    out
}

/// Keeps the best `target` individuals of a merged parent+offspring
/// population: whole fronts first, then the most isolated members of the
/// splitting front.
fn environmental_selection(population: Vec<Individual>, target: usize) -> Vec<Individual> {
    let objectives: Vec<Vec<f64>> =
        population.iter().map(|i| i.objectives.clone()).collect();
    let fronts = non_dominated_sort(&objectives);

    let mut keep: Vec<usize> = Vec::with_capacity(target);
    for front in &fronts {
        if keep.len() + front.len() <= target {
            keep.extend(front);
            if keep.len() == target {
                break;
            }
            continue;
        }
        let front_objs: Vec<Vec<f64>> =
            front.iter().map(|&i| objectives[i].clone()).collect();
        let distance = crowding_distance(&front_objs);
        let mut order: Vec<usize> = (0..front.len()).collect();
        order.sort_by(|&a, &b| {
            distance[b]
                .partial_cmp(&distance[a])
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        keep.extend(order.into_iter().take(target - keep.len()).map(|i| front[i]));
        break;
    }

    let mut chosen = vec![false; population.len()];
    for &i in &keep {
        chosen[i] = true;
    }
    population
        .into_iter()
        .zip(chosen)
        .filter_map(|(ind, c)| c.then_some(ind))
        .collect()
}

/// Extracts the non-dominated front of the final population.
pub(crate) fn front_result(population: Vec<Individual>, generations: usize) -> MooResult {
    let objectives: Vec<Vec<f64>> =
        population.iter().map(|i| i.objectives.clone()).collect();
    let fronts = non_dominated_sort(&objectives);
    let mut x = Vec::new();
    let mut f = Vec::new();
    for &i in &fronts[0] {
        x.push(population[i].genes.clone());
        f.push(population[i].objectives.clone());
    }
    MooResult { x, f, generations }
}

// ============================================================================
// Tests
// ============================================================================
