//! Brute-force nearest neighbor search over feature rows.

use crate::data::FeatureMatrix;
use rayon::prelude::*;
use std::cmp::Ordering;

/// Squared Euclidean distance.
#[inline]
pub fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Neighbor index and distance.
pub type Neighbor = (usize, f64);

/// For every row, the `k` nearest other rows sorted by ascending Euclidean
/// distance. Ties are broken by row index so the result is deterministic.
pub fn k_nearest(features: &FeatureMatrix, k: usize) -> Vec<Vec<Neighbor>> {
    let n = features.n_rows();
    let k = k.min(n.saturating_sub(1));

    (0..n)
        .into_par_iter()
        .map(|i| {
            let row = features.row(i);
            let mut candidates: Vec<Neighbor> = (0..n)
                .filter(|&j| j != i)
                .map(|j| (j, squared_distance(row, features.row(j))))
                .collect();
            if k < candidates.len() {
                candidates.select_nth_unstable_by(k, by_distance);
                candidates.truncate(k);
            }
            candidates.sort_by(by_distance);
            candidates
                .into_iter()
                .map(|(j, d2)| (j, d2.sqrt()))
                .collect()
        })
        .collect()
}

fn by_distance(a: &Neighbor, b: &Neighbor) -> Ordering {
    a.1.partial_cmp(&b.1)
        .unwrap_or(Ordering::Equal)
        .then(a.0.cmp(&b.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(points: &[f64]) -> FeatureMatrix {
        let rows: Vec<Vec<f64>> = points.iter().map(|&x| vec![x]).collect();
        FeatureMatrix::from_rows(vec!["x".to_string()], &rows).unwrap()
    }

    #[test]
    fn finds_sorted_neighbors_excluding_self() {
        let features = line(&[0.0, 1.0, 3.0, 10.0]);

        let knn = k_nearest(&features, 2);

        assert_eq!(knn[0], vec![(1, 1.0), (2, 3.0)]);
        assert_eq!(knn[3], vec![(2, 7.0), (1, 9.0)]);
    }

    #[test]
    fn k_is_capped_by_sample_count() {
        let features = line(&[0.0, 1.0, 2.0]);

        let knn = k_nearest(&features, 10);

        assert!(knn.iter().all(|row| row.len() == 2));
    }

    #[test]
    fn ties_break_by_index() {
        let features = line(&[0.0, -1.0, 1.0]);

        let knn = k_nearest(&features, 2);

        assert_eq!(knn[0], vec![(1, 1.0), (2, 1.0)]);
    }
}
