//! NSGA-III (Deb & Jain, 2014).
//!
//! Same generational skeleton as NSGA-II, but the splitting front is
//! resolved by reference-direction niching instead of crowding distance:
//! normalized objectives are associated with the nearest Das-Dennis
//! direction and underrepresented directions are filled first.

use rand::Rng;

use crate::error::Result;
use crate::moo::nsga2::front_result;
use crate::moo::operators::{breed, Crossover, Mutation, Sampling};
use crate::moo::pareto::{non_dominated_sort, ranks};
use crate::moo::types::{evaluate_into, Individual, MooProblem, MooResult};

/// NSGA-III configuration and entry point.
#[derive(Debug, Clone)]
pub struct Nsga3 {
    /// Number of individuals per generation.
    pub pop_size: usize,
    /// Reference directions spanning objective space.
    pub ref_dirs: Vec<Vec<f64>>,
    /// Initial-population sampling operator.
    pub sampling: Sampling,
    /// Crossover operator.
    pub crossover: Crossover,
    /// Mutation operator.
    pub mutation: Mutation,
}

impl Nsga3 {
    /// Runs the search for `n_gen` generations and returns the final
    /// non-dominated set.
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
            let rank = ranks(&non_dominated_sort(&objectives), population.len());

            let mut offspring = breed(
                &population,
                self.pop_size,
                self.crossover,
                self.mutation,
                lo,
                hi,
                rng,
                |rng| rank_tournament(&rank, rng),
            );
            evaluate_into(problem, &mut offspring)?;

            population.extend(offspring);
            population = self.niching_selection(population, rng);
        }

        Ok(front_result(population, n_gen))
    }

    /// Environmental selection by reference-direction niching.
    fn niching_selection<R: Rng>(
        &self,
        population: Vec<Individual>,
        rng: &mut R,
    ) -> Vec<Individual> {
        let target = self.pop_size;
        let objectives: Vec<Vec<f64>> =
            population.iter().map(|i| i.objectives.clone()).collect();
        let fronts = non_dominated_sort(&objectives);

        let mut keep: Vec<usize> = Vec::with_capacity(target);
        let mut splitting: Vec<usize> = Vec::new();
        for front in &fronts {
            if keep.len() + front.len() <= target {
                keep.extend(front);
                if keep.len() == target {
                    break;
                }
            } else {
                splitting = front.clone();
                break;
            }
        }
        if splitting.is_empty() {
            return materialize(population, keep);
        }

        // Normalize over the members under consideration, then associate
        // each with its nearest reference direction.
        let considered: Vec<usize> =
            keep.iter().chain(splitting.iter()).copied().collect();
        let normalized = normalize(&objectives, &considered);
        let assoc: Vec<(usize, f64)> = considered
            .iter()
            .map(|&i| nearest_direction(&normalized[&i], &self.ref_dirs))
            .collect();
        let dir_of: std::collections::HashMap<usize, (usize, f64)> =
            considered.iter().copied().zip(assoc).collect();

        let mut niche_count = vec![0usize; self.ref_dirs.len()];
        for &i in &keep {
            niche_count[dir_of[&i].0] += 1;
        }

        let mut remaining = splitting;
        while keep.len() < target {
            // Least-crowded direction that still has unassigned members.
            let candidate_dirs: Vec<usize> = remaining
                .iter()
                .map(|&i| dir_of[&i].0)
                .collect();
            let &dir = candidate_dirs
                .iter()
                .min_by_key(|&&d| niche_count[d])
                .expect("splitting front is non-empty");

            let mut members: Vec<usize> = remaining
                .iter()
                .copied()
                .filter(|&i| dir_of[&i].0 == dir)
                .collect();
            let pick = if niche_count[dir] == 0 {
                // An empty niche takes its closest member.
                members
                    .iter()
                    .copied()
                    .min_by(|&a, &b| {
                        dir_of[&a]
                            .1
                            .partial_cmp(&dir_of[&b].1)
                            .unwrap_or(std::cmp::Ordering::Equal)
                    })
                    .expect("members is non-empty")
            } else {
                members.swap_remove(rng.random_range(0..members.len()))
            };

            keep.push(pick);
            niche_count[dir] += 1;
            remaining.retain(|&i| i != pick);
        }
        materialize(population, keep)
    }
}

/// Binary tournament on Pareto rank alone; ties resolve randomly.
fn rank_tournament<R: Rng>(rank: &[usize], rng: &mut R) -> usize {
    let a = rng.random_range(0..rank.len());
    let b = rng.random_range(0..rank.len());
    match rank[a].cmp(&rank[b]) {
        std::cmp::Ordering::Less => a,
        std::cmp::Ordering::Greater => b,
        std::cmp::Ordering::Equal => {
            if rng.random_range(0.0..1.0) < 0.5 {
                a
            } else {
                b
            }
        }
    }
}

/// Min-max normalization of the considered rows, keyed by original index.
fn normalize(
    objectives: &[Vec<f64>],
    considered: &[usize],
) -> std::collections::HashMap<usize, Vec<f64>> {
    let m = objectives[considered[0]].len();
    let mut lo = vec![f64::INFINITY; m];
    let mut hi = vec![f64::NEG_INFINITY; m];
    for &i in considered {
        for k in 0..m {
            lo[k] = lo[k].min(objectives[i][k]);
            hi[k] = hi[k].max(objectives[i][k]);
        }
    }
    considered
        .iter()
        .map(|&i| {
            let row = (0..m)
                .map(|k| {
                    let range = hi[k] - lo[k];
                    if range > 0.0 {
                        (objectives[i][k] - lo[k]) / range
                    } else {
                        0.0
                    }
                })
                .collect();
            (i, row)
        })
        .collect()
}

/// Index of the reference direction with the smallest perpendicular
/// distance to `point`, plus that distance.
fn nearest_direction(point: &[f64], ref_dirs: &[Vec<f64>]) -> (usize, f64) {
    let mut best = (0, f64::INFINITY);
    for (d, dir) in ref_dirs.iter().enumerate() {
        let dist = perpendicular_distance(point, dir);
        if dist < best.1 {
            best = (d, dist);
        }
    }
    best
}

fn perpendicular_distance(point: &[f64], dir: &[f64]) -> f64 {
    let norm_sq: f64 = dir.iter().map(|v| v * v).sum();
    if norm_sq <= 0.0 {
        return f64::INFINITY;
    }
    let dot: f64 = point.iter().zip(dir).map(|(p, d)| p * d).sum();
    let scale = dot / norm_sq;
    point
        .iter()
        .zip(dir)
        .map(|(p, d)| {
            let diff = p - scale * d;
            diff * diff
        })
        .sum::<f64>()
        .sqrt()
}

fn materialize(population: Vec<Individual>, keep: Vec<usize>) -> Vec<Individual> {
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

// ============================================================================
// Tests
// ============================================================================
