//! Pareto dominance utilities shared by the search algorithms.
//!
//! Fast non-dominated sorting and crowding distance as introduced for
//! NSGA-II (Deb et al., 2002). All objectives are minimized.

use std::cmp::Ordering;

/// True when `a` Pareto-dominates `b`: no objective worse, at least one
/// strictly better.
pub fn dominates(a: &[f64], b: &[f64]) -> bool {
    let mut strictly_better = false;
    for (&va, &vb) in a.iter().zip(b.iter()) {
        if va > vb {
            return false;
        }
        if va < vb {
            strictly_better = true;
        }
    }
    strictly_better
}

/// Fast non-dominated sort.
///
/// Returns the fronts as index sets: `fronts[0]` holds the non-dominated
/// solutions, `fronts[1]` the solutions dominated only by front 0, and so
/// on. O(m·n²) for n solutions with m objectives.
///
/// # Panics
/// Panics if `objectives` is empty.
pub fn non_dominated_sort(objectives: &[Vec<f64>]) -> Vec<Vec<usize>> {
    let n = objectives.len();
    assert!(n > 0, "objectives must not be empty");

    let mut dominated_by: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut domination_count = vec![0usize; n];

    for i in 0..n {
        for j in (i + 1)..n {
            if dominates(&objectives[i], &objectives[j]) {
                dominated_by[i].push(j);
                domination_count[j] += 1;
            } else if dominates(&objectives[j], &objectives[i]) {
                dominated_by[j].push(i);
                domination_count[i] += 1;
            }
        }
    }

    let mut fronts = vec![(0..n)
        .filter(|&i| domination_count[i] == 0)
        .collect::<Vec<_>>()];
    loop {
        let mut next = Vec::new();
        for &i in fronts.last().expect("at least one front") {
            for &j in &dominated_by[i] {
                domination_count[j] -= 1;
                if domination_count[j] == 0 {
                    next.push(j);
                }
            }
        }
        if next.is_empty() {
            break;
        }
        fronts.push(next);
    }
    fronts
}

/// Pareto rank per solution (0 = non-dominated front).
pub fn ranks(fronts: &[Vec<usize>], n: usize) -> Vec<usize> {
    let mut out = vec![0usize; n];
    for (rank, front) in fronts.iter().enumerate() {
        for &i in front {
            out[i] = rank;
        }
    }
    out
}

/// Crowding distance per solution: how isolated each solution is in
/// objective space. Boundary solutions get `f64::INFINITY`; larger is more
/// diverse.
pub fn crowding_distance(objectives: &[Vec<f64>]) -> Vec<f64> {
    let n = objectives.len();
    if n <= 2 {
        return vec![f64::INFINITY; n];
    }

    let m = objectives[0].len();
    let mut distances = vec![0.0f64; n];

    for obj in 0..m {
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| {
            objectives[a][obj]
                .partial_cmp(&objectives[b][obj])
                .unwrap_or(Ordering::Equal)
        });

        distances[order[0]] = f64::INFINITY;
        distances[order[n - 1]] = f64::INFINITY;

        let range = objectives[order[n - 1]][obj] - objectives[order[0]][obj];
        if range <= 0.0 {
            continue;
        }
        for w in order.windows(3) {
            distances[w[1]] += (objectives[w[2]][obj] - objectives[w[0]][obj]) / range;
        }
    }
    distances
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dominates() {
        assert!(dominates(&[1.0, 1.0], &[2.0, 2.0]));
        assert!(dominates(&[1.0, 2.0], &[1.0, 3.0]));
        assert!(!dominates(&[1.0, 3.0], &[2.0, 2.0]));
        assert!(!dominates(&[1.0, 1.0], &[1.0, 1.0]));
    }

    #[test]
    fn test_sort_single_front() {
        let objs = vec![vec![1.0, 3.0], vec![3.0, 1.0]];
        let fronts = non_dominated_sort(&objs);
        assert_eq!(fronts, vec![vec![0, 1]]);
    }

    #[test]
    fn test_sort_chain() {
        let objs = vec![vec![1.0, 1.0], vec![2.0, 2.0], vec![3.0, 3.0]];
        let fronts = non_dominated_sort(&objs);
        assert_eq!(fronts, vec![vec![0], vec![1], vec![2]]);
        assert_eq!(ranks(&fronts, 3), vec![0, 1, 2]);
    }

    #[test]
    fn test_sort_mixed() {
        let objs = vec![
            vec![1.0, 5.0],
            vec![3.0, 3.0],
            vec![5.0, 1.0],
            vec![4.0, 4.0], // dominated by (3,3)
        ];
        let fronts = non_dominated_sort(&objs);
        assert_eq!(fronts[0], vec![0, 1, 2]);
        assert_eq!(fronts[1], vec![3]);
    }

    #[test]
    fn test_identical_rows_share_a_front() {
        let objs = vec![vec![2.0, 2.0]; 3];
        let fronts = non_dominated_sort(&objs);
        assert_eq!(fronts.len(), 1);
        assert_eq!(fronts[0].len(), 3);
    }

    #[test]
    fn test_crowding_boundaries_are_infinite() {
        let objs = vec![vec![1.0, 5.0], vec![3.0, 3.0], vec![5.0, 1.0]];
        let d = crowding_distance(&objs);
        assert!(d[0].is_infinite());
        assert!(d[2].is_infinite());
        assert!(d[1].is_finite());
        assert!(d[1] > 0.0);
    }

    #[test]
    fn test_crowding_evenly_spaced_interior() {
        let objs = vec![
            vec![0.0, 4.0],
            vec![1.0, 3.0],
            vec![2.0, 2.0],
            vec![3.0, 1.0],
            vec![4.0, 0.0],
        ];
        let d = crowding_distance(&objs);
        assert!((d[1] - d[2]).abs() < 1e-12);
        assert!((d[2] - d[3]).abs() < 1e-12);
    }

    #[test]
    fn test_crowding_constant_objective_no_nan() {
        let objs = vec![vec![1.0, 7.0], vec![2.0, 7.0], vec![3.0, 7.0]];
        let d = crowding_distance(&objs);
        assert!(d.iter().all(|v| !v.is_nan()));
    }
}
