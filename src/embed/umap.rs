//! UMAP (Uniform Manifold Approximation and Projection).
//!
//! 1. k-nearest-neighbor graph in feature space
//! 2. local bandwidths (rho, sigma) so each point sees log2(k) neighbors
//! 3. fuzzy union of the directed memberships
//! 4. SGD on the low-dimensional layout with negative sampling

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::collections::BTreeMap;

use super::neighbors::{k_nearest, squared_distance, Neighbor};
use super::params::layout_len;
use super::{EmbedError, Embedding, Reducer, UmapParams};
use crate::data::FeatureMatrix;

const SMOOTH_K_TOLERANCE: f64 = 1e-5;
const MIN_K_DIST_SCALE: f64 = 1e-3;
/// Gradient components are clipped to this magnitude
const GRAD_CLIP: f64 = 4.0;
/// Half-width of the uniform random initialization
const INIT_RANGE: f64 = 10.0;

pub struct Umap {
    params: UmapParams,
}

impl Umap {
    pub fn new(params: UmapParams) -> Self {
        Self { params }
    }
}

impl Reducer for Umap {
    fn fit_transform(&self, features: &FeatureMatrix) -> Result<Embedding, EmbedError> {
        let n = features.n_rows();
        if n < 2 {
            return Err(EmbedError::InsufficientData { min: 2, got: n });
        }
        let p = &self.params;
        let size = layout_len(n, p.n_components)?;
        let k = p.n_neighbors.min(n - 1);
        if k < p.n_neighbors {
            log::warn!(
                "n_neighbors = {} is larger than the dataset; using {}",
                p.n_neighbors,
                k
            );
        }

        let knn = k_nearest(features, k);
        let graph = fuzzy_simplicial_set(&knn, k);
        let (a, b) = find_ab_params(p.spread, p.min_dist);
        let n_epochs = p.epochs_for(n);
        log::debug!(
            "UMAP graph: {} edges, a = {:.4}, b = {:.4}, {} epochs",
            graph.len(),
            a,
            b,
            n_epochs
        );

        let mut rng = StdRng::seed_from_u64(p.random_state);
        let dim = p.n_components;
        let mut layout: Vec<f64> = (0..size)
            .map(|_| rng.gen_range(-INIT_RANGE..INIT_RANGE))
            .collect();

        optimize_layout(&mut layout, dim, n, &graph, n_epochs, a, b, p, &mut rng);

        Ok(Embedding::new(dim, layout))
    }
}

/// Local connectivity radius `rho` and bandwidth `sigma` for one point.
fn smooth_knn_dist(distances: &[f64], target: f64, mean_distance: f64) -> (f64, f64) {
    let rho = distances
        .iter()
        .copied()
        .find(|&d| d > 0.0)
        .unwrap_or(0.0);

    let mut lo = 0.0;
    let mut hi = f64::INFINITY;
    let mut mid = 1.0;

    for _ in 0..64 {
        let psum: f64 = distances
            .iter()
            .map(|&d| {
                let gap = d - rho;
                if gap > 0.0 {
                    (-gap / mid).exp()
                } else {
                    1.0
                }
            })
            .sum();

        if (psum - target).abs() < SMOOTH_K_TOLERANCE {
            break;
        }
        if psum > target {
            hi = mid;
            mid = (lo + hi) / 2.0;
        } else {
            lo = mid;
            mid = if hi.is_infinite() {
                mid * 2.0
            } else {
                (lo + hi) / 2.0
            };
        }
    }

    let floor = if rho > 0.0 {
        let mean_ith = distances.iter().sum::<f64>() / distances.len() as f64;
        MIN_K_DIST_SCALE * mean_ith
    } else {
        MIN_K_DIST_SCALE * mean_distance
    };
    (rho, mid.max(floor))
}

/// Symmetric weighted graph as directed edges `(head, tail, weight)`,
/// sorted by `(head, tail)`.
fn fuzzy_simplicial_set(knn: &[Vec<Neighbor>], k: usize) -> Vec<(usize, usize, f64)> {
    let target = (k as f64).log2();
    let total: f64 = knn.iter().flatten().map(|&(_, d)| d).sum();
    let count = knn.iter().map(|row| row.len()).sum::<usize>().max(1);
    let mean_distance = total / count as f64;

    let memberships: Vec<Vec<(usize, f64)>> = knn
        .par_iter()
        .map(|row| {
            let distances: Vec<f64> = row.iter().map(|&(_, d)| d).collect();
            let (rho, sigma) = smooth_knn_dist(&distances, target, mean_distance);
            row.iter()
                .map(|&(j, d)| {
                    let w = if d - rho <= 0.0 {
                        1.0
                    } else {
                        (-(d - rho) / sigma).exp()
                    };
                    (j, w)
                })
                .collect()
        })
        .collect();

    // (min, max) -> (w[min][max], w[max][min])
    let mut pairs: BTreeMap<(usize, usize), (f64, f64)> = BTreeMap::new();
    for (i, row) in memberships.iter().enumerate() {
        for &(j, w) in row {
            let entry = pairs.entry((i.min(j), i.max(j))).or_insert((0.0, 0.0));
            if i < j {
                entry.0 = w;
            } else {
                entry.1 = w;
            }
        }
    }

    let mut edges: Vec<(usize, usize, f64)> = pairs
        .into_iter()
        .map(|((i, j), (w_ij, w_ji))| (i, j, w_ij + w_ji - w_ij * w_ji))
        .filter(|&(_, _, w)| w > 0.0)
        .flat_map(|(i, j, w)| [(i, j, w), (j, i, w)])
        .collect();
    edges.sort_by(|x, y| (x.0, x.1).cmp(&(y.0, y.1)));
    edges
}

/// Fit `1 / (1 + a * x^(2b))` to the offset exponential defined by
/// `spread` and `min_dist` with Levenberg-Marquardt least squares.
pub(crate) fn find_ab_params(spread: f64, min_dist: f64) -> (f64, f64) {
    const SAMPLES: usize = 300;
    let xs: Vec<f64> = (0..SAMPLES)
        .map(|i| 3.0 * spread * i as f64 / (SAMPLES - 1) as f64)
        .collect();
    let ys: Vec<f64> = xs
        .iter()
        .map(|&x| {
            if x < min_dist {
                1.0
            } else {
                (-(x - min_dist) / spread).exp()
            }
        })
        .collect();

    let sse = |a: f64, b: f64| -> f64 {
        xs.iter()
            .zip(&ys)
            .map(|(&x, &y)| {
                let f = 1.0 / (1.0 + a * x.powf(2.0 * b));
                (y - f).powi(2)
            })
            .sum()
    };

    let (mut a, mut b) = (1.0, 1.0);
    let mut cost = sse(a, b);
    let mut lambda = 1e-3;

    for _ in 0..500 {
        let mut jtj = [[0.0; 2]; 2];
        let mut jtr = [0.0; 2];
        for (&x, &y) in xs.iter().zip(&ys) {
            if x <= 0.0 {
                continue;
            }
            let u = x.powf(2.0 * b);
            let denom = 1.0 + a * u;
            let r = y - 1.0 / denom;
            let da = -u / (denom * denom);
            let db = -a * u * 2.0 * x.ln() / (denom * denom);
            jtj[0][0] += da * da;
            jtj[0][1] += da * db;
            jtj[1][1] += db * db;
            jtr[0] += da * r;
            jtr[1] += db * r;
        }

        let m00 = jtj[0][0] * (1.0 + lambda);
        let m11 = jtj[1][1] * (1.0 + lambda);
        let m01 = jtj[0][1];
        let det = m00 * m11 - m01 * m01;
        if det.abs() < f64::MIN_POSITIVE {
            break;
        }
        let step_a = (jtr[0] * m11 - m01 * jtr[1]) / det;
        let step_b = (m00 * jtr[1] - m01 * jtr[0]) / det;

        let (na, nb) = (a + step_a, b + step_b);
        if na <= 0.0 || nb <= 0.0 {
            lambda *= 10.0;
            continue;
        }
        let new_cost = sse(na, nb);
        if new_cost < cost {
            let converged = (cost - new_cost) <= 1e-15 * cost.max(1e-300)
                || (step_a.abs() < 1e-12 && step_b.abs() < 1e-12);
            a = na;
            b = nb;
            cost = new_cost;
            lambda = (lambda / 10.0).max(1e-12);
            if converged {
                break;
            }
        } else {
            lambda *= 10.0;
            if lambda > 1e12 {
                break;
            }
        }
    }

    (a, b)
}

#[inline]
fn clip(value: f64) -> f64 {
    value.clamp(-GRAD_CLIP, GRAD_CLIP)
}

#[allow(clippy::too_many_arguments)]
fn optimize_layout(
    layout: &mut [f64],
    dim: usize,
    n_vertices: usize,
    graph: &[(usize, usize, f64)],
    n_epochs: usize,
    a: f64,
    b: f64,
    params: &UmapParams,
    rng: &mut StdRng,
) {
    let max_weight = graph.iter().map(|e| e.2).fold(0.0, f64::max);
    if max_weight <= 0.0 {
        return;
    }

    // Edges too weak to be sampled even once are dropped.
    let edges: Vec<(usize, usize, f64)> = graph
        .iter()
        .copied()
        .filter(|&(_, _, w)| w >= max_weight / n_epochs as f64)
        .collect();

    let epochs_per_sample: Vec<f64> = edges.iter().map(|&(_, _, w)| max_weight / w).collect();
    let negative_rate = params.negative_sample_rate as f64;
    let epochs_per_negative: Vec<f64> = epochs_per_sample
        .iter()
        .map(|&e| e / negative_rate)
        .collect();
    let mut next_sample = epochs_per_sample.clone();
    let mut next_negative = epochs_per_negative.clone();

    let gamma = params.repulsion_strength;
    let initial_alpha = params.learning_rate;
    let mut alpha = initial_alpha;
    let mut current = vec![0.0; dim];

    for epoch in 0..n_epochs {
        let epoch_f = epoch as f64;
        for (e, &(j, k, _)) in edges.iter().enumerate() {
            if next_sample[e] > epoch_f {
                continue;
            }

            let dist_sq = squared_distance(&layout[j * dim..(j + 1) * dim], &layout[k * dim..(k + 1) * dim]);
            let grad_coeff = if dist_sq > 0.0 {
                -2.0 * a * b * dist_sq.powf(b - 1.0) / (a * dist_sq.powf(b) + 1.0)
            } else {
                0.0
            };
            for d in 0..dim {
                let grad = clip(grad_coeff * (layout[j * dim + d] - layout[k * dim + d]));
                layout[j * dim + d] += grad * alpha;
                layout[k * dim + d] -= grad * alpha;
            }
            next_sample[e] += epochs_per_sample[e];

            if params.negative_sample_rate == 0 {
                continue;
            }
            let n_neg = ((epoch_f - next_negative[e]) / epochs_per_negative[e]).max(0.0) as usize;
            current.copy_from_slice(&layout[j * dim..(j + 1) * dim]);
            for _ in 0..n_neg {
                let other = rng.gen_range(0..n_vertices);
                if other == j {
                    continue;
                }
                let other_point = &layout[other * dim..(other + 1) * dim];
                let dist_sq = squared_distance(&current, other_point);
                let grad_coeff = if dist_sq > 0.0 {
                    2.0 * gamma * b / ((0.001 + dist_sq) * (a * dist_sq.powf(b) + 1.0))
                } else {
                    0.0
                };
                for d in 0..dim {
                    let grad = if grad_coeff > 0.0 {
                        clip(grad_coeff * (current[d] - other_point[d]))
                    } else {
                        GRAD_CLIP
                    };
                    current[d] += grad * alpha;
                }
            }
            layout[j * dim..(j + 1) * dim].copy_from_slice(&current);
            next_negative[e] += n_neg as f64 * epochs_per_negative[e];
        }

        alpha = initial_alpha * (1.0 - epoch_f / n_epochs as f64);
        if epoch % 100 == 0 {
            log::debug!("UMAP epoch {}/{}", epoch, n_epochs);
        }
    }
}
