//! Genetic variation operators for the bounded integer search space.
//!
//! The closed operator set mirrors the run configuration surface:
//! `int_random` sampling, `int_sbx` crossover (simulated binary crossover,
//! Deb & Agrawal 1995), and `int_pm` mutation (polynomial mutation,
//! Deb & Goyal 1996). Genes are carried as `f64` and snapped back to the
//! integer domain after every operator application.

use rand::Rng;
use serde::Deserialize;

/// Parameters of the simulated binary crossover.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SbxArgs {
    /// Probability of applying the crossover at all.
    pub prob: f64,
    /// Distribution index; larger values keep children closer to parents.
    pub eta: f64,
}

/// Parameters of the polynomial mutation.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PmArgs {
    /// Distribution index; larger values produce smaller perturbations.
    pub eta: f64,
}

/// Initial-population sampling operator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sampling {
    /// Uniform random integers across the domain.
    IntRandom,
}

impl Sampling {
    /// Draws `n` candidates of `n_var` genes each from `[lo, hi]`.
    pub fn sample<R: Rng>(
        &self,
        n: usize,
        n_var: usize,
        lo: f64,
        hi: f64,
        rng: &mut R,
    ) -> Vec<Vec<f64>> {
        match self {
            Sampling::IntRandom => (0..n)
                .map(|_| {
                    (0..n_var)
                        .map(|_| rng.random_range(lo as i64..=hi as i64) as f64)
                        .collect()
                })
                .collect(),
        }
    }
}

/// Crossover operator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Crossover {
    /// Integer simulated binary crossover.
    IntSbx(SbxArgs),
}

impl Crossover {
    /// Recombines two parents into two children inside `[lo, hi]`.
    pub fn apply<R: Rng>(
        &self,
        parent1: &[f64],
        parent2: &[f64],
        lo: f64,
        hi: f64,
        rng: &mut R,
    ) -> (Vec<f64>, Vec<f64>) {
        match self {
            Crossover::IntSbx(args) => {
                let mut c1 = parent1.to_vec();
                let mut c2 = parent2.to_vec();
                if rng.random_range(0.0..1.0) < args.prob {
                    for gene in 0..c1.len() {
                        if rng.random_range(0.0..1.0) > 0.5 {
                            continue;
                        }
                        let (a, b) = (parent1[gene], parent2[gene]);
                        if (a - b).abs() < 1e-12 {
                            continue;
                        }
                        let beta = sbx_beta(args.eta, rng);
                        c1[gene] = 0.5 * ((1.0 + beta) * a + (1.0 - beta) * b);
                        c2[gene] = 0.5 * ((1.0 - beta) * a + (1.0 + beta) * b);
                    }
                }
                snap_to_domain(&mut c1, lo, hi);
                snap_to_domain(&mut c2, lo, hi);
                (c1, c2)
            }
        }
    }
}

fn sbx_beta<R: Rng>(eta: f64, rng: &mut R) -> f64 {
    let u: f64 = rng.random_range(0.0..1.0);
    if u <= 0.5 {
        (2.0 * u).powf(1.0 / (eta + 1.0))
    } else {
        (1.0 / (2.0 * (1.0 - u))).powf(1.0 / (eta + 1.0))
    }
}

/// Mutation operator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Mutation {
    /// Integer polynomial mutation.
    IntPm(PmArgs),
}

impl Mutation {
    /// Perturbs genes in place, keeping them inside `[lo, hi]`.
    ///
    /// Each gene mutates with probability `1 / n_var`.
    pub fn apply<R: Rng>(&self, genes: &mut [f64], lo: f64, hi: f64, rng: &mut R) {
        match self {
            Mutation::IntPm(args) => {
                let per_gene = 1.0 / genes.len() as f64;
                let span = hi - lo;
                if span <= 0.0 {
                    return;
                }
                for gene in genes.iter_mut() {
                    if rng.random_range(0.0..1.0) >= per_gene {
                        continue;
                    }
                    let u: f64 = rng.random_range(0.0..1.0);
                    let delta = if u < 0.5 {
                        let d = (*gene - lo) / span;
                        (2.0 * u + (1.0 - 2.0 * u) * (1.0 - d).powf(args.eta + 1.0))
                            .powf(1.0 / (args.eta + 1.0))
                            - 1.0
                    } else {
                        let d = (hi - *gene) / span;
                        1.0 - (2.0 * (1.0 - u)
                            + 2.0 * (u - 0.5) * (1.0 - d).powf(args.eta + 1.0))
                        .powf(1.0 / (args.eta + 1.0))
                    };
                    *gene += delta * span;
                }
                snap_to_domain(genes, lo, hi);
            }
        }
    }
}

/// Rounds every gene to the nearest integer and clamps it into the
/// integral part of `[lo, hi]`, so the result is always both in-domain and
/// integral even when the bounds themselves are not.
pub fn snap_to_domain(genes: &mut [f64], lo: f64, hi: f64) {
    let (lo, hi) = (lo.ceil(), hi.floor());
    for gene in genes.iter_mut() {
        *gene = gene.round().clamp(lo, hi);
    }
}

/// Produces `n_offspring` unevaluated children from `parents`, selecting
/// parent indices through `select`.
pub(crate) fn breed<R: Rng>(
    parents: &[crate::moo::types::Individual],
    n_offspring: usize,
    crossover: Crossover,
    mutation: Mutation,
    lo: f64,
    hi: f64,
    rng: &mut R,
    mut select: impl FnMut(&mut R) -> usize,
) -> Vec<crate::moo::types::Individual> {
    let mut offspring = Vec::with_capacity(n_offspring);
    while offspring.len() < n_offspring {
        let p1 = select(rng);
        let p2 = select(rng);
        let (c1, c2) = crossover.apply(
            &parents[p1].genes,
            &parents[p2].genes,
            lo,
            hi,
            rng,
        );
        for mut genes in [c1, c2] {
            if offspring.len() >= n_offspring {
                break;
            }
            mutation.apply(&mut genes, lo, hi, rng);
            offspring.push(crate::moo::types::Individual::new(genes));
        }
    }
    offspring
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng(seed: u64) -> StdRng {
        StdRng::seed_from_u64(seed)
    }

    #[test]
    fn test_sampling_stays_in_domain_and_integral() {
        let mut rng = rng(7);
        let pop = Sampling::IntRandom.sample(50, 1, 0.0, 26841.0, &mut rng);
        assert_eq!(pop.len(), 50);
        for genes in &pop {
            assert_eq!(genes.len(), 1);
            assert!(genes[0] >= 0.0 && genes[0] <= 26841.0);
            assert_eq!(genes[0], genes[0].round());
        }
    }

    #[test]
    fn test_sbx_children_are_integral_and_bounded() {
        let mut rng = rng(11);
        let op = Crossover::IntSbx(SbxArgs { prob: 1.0, eta: 15.0 });
        for _ in 0..200 {
            let (c1, c2) = op.apply(&[3.0], &[90.0], 0.0, 100.0, &mut rng);
            for c in [&c1, &c2] {
                assert!(c[0] >= 0.0 && c[0] <= 100.0);
                assert_eq!(c[0], c[0].round());
            }
        }
    }

    #[test]
    fn test_sbx_zero_probability_copies_parents() {
        let mut rng = rng(13);
        let op = Crossover::IntSbx(SbxArgs { prob: 0.0, eta: 15.0 });
        let (c1, c2) = op.apply(&[3.0], &[90.0], 0.0, 100.0, &mut rng);
        assert_eq!(c1, vec![3.0]);
        assert_eq!(c2, vec![90.0]);
    }

    #[test]
    fn test_pm_output_is_integral_and_bounded() {
        let mut rng = rng(17);
        let op = Mutation::IntPm(PmArgs { eta: 20.0 });
        for start in [0.0, 50.0, 100.0] {
            for _ in 0..200 {
                let mut genes = vec![start];
                op.apply(&mut genes, 0.0, 100.0, &mut rng);
                assert!(genes[0] >= 0.0 && genes[0] <= 100.0);
                assert_eq!(genes[0], genes[0].round());
            }
        }
    }

    #[test]
    fn test_pm_eventually_moves_a_gene() {
        let mut rng = rng(19);
        let op = Mutation::IntPm(PmArgs { eta: 20.0 });
        let mut moved = false;
        for _ in 0..500 {
            let mut genes = vec![50.0];
            op.apply(&mut genes, 0.0, 100.0, &mut rng);
            if genes[0] != 50.0 {
                moved = true;
                break;
            }
        }
        assert!(moved, "polynomial mutation never perturbed the gene");
    }

    #[test]
    fn test_snap_with_fractional_bounds_stays_integral() {
        let mut genes = vec![-1e6, 3.9, 1e6];
        snap_to_domain(&mut genes, 3.7, 103.2);
        assert_eq!(genes, vec![4.0, 4.0, 103.0]);
    }

    proptest! {
        #[test]
        fn prop_sbx_respects_bounds(
            seed in 0u64..1000,
            a in 0i64..=500,
            b in 0i64..=500,
        ) {
            let mut rng = StdRng::seed_from_u64(seed);
            let op = Crossover::IntSbx(SbxArgs { prob: 1.0, eta: 5.0 });
            let (c1, c2) = op.apply(&[a as f64], &[b as f64], 0.0, 500.0, &mut rng);
            prop_assert!(c1[0] >= 0.0 && c1[0] <= 500.0);
            prop_assert!(c2[0] >= 0.0 && c2[0] <= 500.0);
        }

        #[test]
        fn prop_snap_is_idempotent(x in -1e6f64..1e6, lo in 0f64..10.0) {
            let hi = lo + 100.0;
            let mut genes = vec![x];
            snap_to_domain(&mut genes, lo, hi);
            let once = genes[0];
            snap_to_domain(&mut genes, lo, hi);
            prop_assert_eq!(once, genes[0]);
        }
    }
}
