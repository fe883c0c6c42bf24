//! Reference-direction generation.
//!
//! Das-Dennis structured points on the unit simplex (Das & Dennis, 1998),
//! used by NSGA-III for niching and by MOEA/D as decomposition weights.

/// Generates the Das-Dennis reference directions for `n_dim` objectives
/// with `n_partitions` divisions per axis.
///
/// Every direction sums to 1. The number of directions is
/// `C(n_partitions + n_dim - 1, n_dim - 1)`.
///
/// # Panics
/// Panics if `n_dim` is zero or `n_partitions` is zero.
pub fn das_dennis(n_dim: usize, n_partitions: usize) -> Vec<Vec<f64>> {
    assert!(n_dim > 0, "n_dim must be positive");
    assert!(n_partitions > 0, "n_partitions must be positive");

    let mut directions = Vec::new();
    let mut current = vec![0usize; n_dim];
    fill(&mut directions, &mut current, 0, n_partitions, n_partitions);
    directions
}

fn fill(
    out: &mut Vec<Vec<f64>>,
    current: &mut [usize],
    dim: usize,
    remaining: usize,
    total: usize,
) {
    if dim == current.len() - 1 {
        current[dim] = remaining;
        out.push(current.iter().map(|&c| c as f64 / total as f64).collect());
        return;
    }
    for take in 0..=remaining {
        current[dim] = take;
        fill(out, current, dim + 1, remaining - take, total);
    }
}

// ============================================================================
// Tests
// ============================================================================
