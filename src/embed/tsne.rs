//! t-SNE (t-distributed Stochastic Neighbor Embedding).
//!
//! Input affinities are calibrated per point to the requested perplexity
//! over its `3 * perplexity` nearest neighbors. The output gradient is exact:
//! every iteration visits all pairs, memory stays linear in the sample count.

use rand::distributions::Distribution;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use statrs::distribution::Normal;
use std::collections::BTreeMap;

use super::neighbors::{k_nearest, squared_distance, Neighbor};
use super::params::layout_len;
use super::{EmbedError, Embedding, Reducer, TsneParams};
use crate::data::FeatureMatrix;

const PERPLEXITY_TOLERANCE: f64 = 1e-5;
const PERPLEXITY_STEPS: usize = 100;
const MACHINE_EPSILON: f64 = f64::EPSILON;
/// Iterations run with exaggerated affinities and low momentum
const EXPLORATION_N_ITER: usize = 250;
/// Convergence is checked every this many iterations
const N_ITER_CHECK: usize = 50;
const MIN_GAIN: f64 = 0.01;
const INIT_STD: f64 = 1e-4;

/// Sparse symmetric joint probabilities, one row per sample.
type Affinities = Vec<Vec<(usize, f64)>>;

pub struct Tsne {
    params: TsneParams,
}

impl Tsne {
    pub fn new(params: TsneParams) -> Self {
        Self { params }
    }
}

impl Reducer for Tsne {
    fn fit_transform(&self, features: &FeatureMatrix) -> Result<Embedding, EmbedError> {
        let p = &self.params;
        let n = features.n_rows();
        if n < 2 {
            return Err(EmbedError::InsufficientData { min: 2, got: n });
        }
        if p.perplexity >= n as f64 {
            return Err(EmbedError::InvalidParameter(format!(
                "perplexity ({}) must be less than n_samples ({})",
                p.perplexity, n
            )));
        }
        let size = layout_len(n, p.n_components)?;

        let k = ((3.0 * p.perplexity + 1.0) as usize).min(n - 1);
        let knn = k_nearest(features, k);
        let affinities = joint_probabilities(&knn, p.perplexity);

        let mut rng = StdRng::seed_from_u64(p.random_state);
        let normal = Normal::new(0.0, INIT_STD)
            .map_err(|e| EmbedError::InvalidParameter(e.to_string()))?;
        let dim = p.n_components;
        let mut layout: Vec<f64> = (0..size)
            .map(|_| normal.sample(&mut rng))
            .collect();

        let learning_rate = p.learning_rate_for(n);
        log::debug!(
            "t-SNE: {} neighbors per point, learning rate {:.1}",
            k,
            learning_rate
        );

        let mut optimizer = GradientDescent::new(size, learning_rate, p.min_grad_norm);
        let exploration = EXPLORATION_N_ITER.min(p.n_iter);
        optimizer.run(
            &mut layout,
            &Objective::new(&affinities, dim, p.degrees_of_freedom(), p.early_exaggeration),
            0..exploration,
            0.5,
            EXPLORATION_N_ITER,
        );
        let kl = optimizer.run(
            &mut layout,
            &Objective::new(&affinities, dim, p.degrees_of_freedom(), 1.0),
            exploration..p.n_iter,
            0.8,
            p.n_iter_without_progress,
        );
        log::info!("t-SNE finished, KL divergence {:.4}", kl);

        Ok(Embedding::new(dim, layout))
    }
}

/// Binary search the Gaussian precision so that the conditional
/// distribution over `sq_distances` has the given perplexity.
fn conditional_row(sq_distances: &[f64], perplexity: f64) -> Vec<f64> {
    let desired_entropy = perplexity.ln();
    let mut beta = 1.0;
    let mut beta_min = f64::NEG_INFINITY;
    let mut beta_max = f64::INFINITY;
    let mut probs = vec![0.0; sq_distances.len()];

    for _ in 0..PERPLEXITY_STEPS {
        for (p, &d) in probs.iter_mut().zip(sq_distances) {
            *p = (-d * beta).exp();
        }
        let mut sum: f64 = probs.iter().sum();
        if sum == 0.0 {
            sum = 1e-8;
        }
        let mut weighted = 0.0;
        for (p, &d) in probs.iter_mut().zip(sq_distances) {
            *p /= sum;
            weighted += d * *p;
        }
        let entropy = sum.ln() + beta * weighted;
        let diff = entropy - desired_entropy;
        if diff.abs() <= PERPLEXITY_TOLERANCE {
            break;
        }

        if diff > 0.0 {
            beta_min = beta;
            beta = if beta_max.is_infinite() {
                beta * 2.0
            } else {
                (beta + beta_max) / 2.0
            };
        } else {
            beta_max = beta;
            beta = if beta_min.is_infinite() {
                beta / 2.0
            } else {
                (beta + beta_min) / 2.0
            };
        }
    }
    probs
}

/// Symmetrized, normalized neighbor affinities `P`.
fn joint_probabilities(knn: &[Vec<Neighbor>], perplexity: f64) -> Affinities {
    let conditional: Vec<Vec<(usize, f64)>> = knn
        .par_iter()
        .map(|row| {
            let sq: Vec<f64> = row.iter().map(|&(_, d)| d * d).collect();
            let probs = conditional_row(&sq, perplexity);
            row.iter().map(|&(j, _)| j).zip(probs).collect()
        })
        .collect();

    let mut pairs: BTreeMap<(usize, usize), f64> = BTreeMap::new();
    for (i, row) in conditional.iter().enumerate() {
        for &(j, p) in row {
            *pairs.entry((i.min(j), i.max(j))).or_insert(0.0) += p;
        }
    }
    let total = (2.0 * pairs.values().sum::<f64>()).max(MACHINE_EPSILON);

    let mut rows: Affinities = vec![Vec::new(); knn.len()];
    for ((i, j), p) in pairs {
        let p = (p / total).max(MACHINE_EPSILON);
        rows[i].push((j, p));
        rows[j].push((i, p));
    }
    rows
}

/// KL(P || Q) objective with a Student-t output kernel.
struct Objective<'a> {
    affinities: &'a Affinities,
    dim: usize,
    dof: f64,
    exaggeration: f64,
}

impl<'a> Objective<'a> {
    fn new(affinities: &'a Affinities, dim: usize, dof: f64, exaggeration: f64) -> Self {
        Self {
            affinities,
            dim,
            dof,
            exaggeration,
        }
    }

    #[inline]
    fn kernel(&self, dist_sq: f64) -> f64 {
        (1.0 + dist_sq / self.dof).powf(-(self.dof + 1.0) / 2.0)
    }

    /// Gradient of the objective into `grad`; returns the KL divergence
    /// when `with_error` is set.
    fn gradient(&self, layout: &[f64], grad: &mut [f64], with_error: bool) -> f64 {
        let dim = self.dim;
        let n = layout.len() / dim;
        let point = move |i: usize| &layout[i * dim..(i + 1) * dim];

        // Per row: unnormalized kernel sum and repulsive term.
        let repulsion: Vec<(f64, Vec<f64>)> = (0..n)
            .into_par_iter()
            .map(|i| {
                let yi = point(i);
                let mut z = 0.0;
                let mut rep = vec![0.0; dim];
                for j in (0..n).filter(|&j| j != i) {
                    let yj = point(j);
                    let w = self.kernel(squared_distance(yi, yj));
                    z += w;
                    for d in 0..dim {
                        rep[d] += w * w * (yi[d] - yj[d]);
                    }
                }
                (z, rep)
            })
            .collect();
        let z = repulsion.iter().map(|(zi, _)| zi).sum::<f64>().max(MACHINE_EPSILON);

        let c = 2.0 * (self.dof + 1.0) / self.dof;
        let rows: Vec<(Vec<f64>, f64)> = (0..n)
            .into_par_iter()
            .map(|i| {
                let yi = point(i);
                let mut attr = vec![0.0; dim];
                let mut kl = 0.0;
                for &(j, p) in &self.affinities[i] {
                    let yj = point(j);
                    let w = self.kernel(squared_distance(yi, yj));
                    let p = p * self.exaggeration;
                    for d in 0..dim {
                        attr[d] += p * w * (yi[d] - yj[d]);
                    }
                    if with_error {
                        let q = (w / z).max(MACHINE_EPSILON);
                        kl += p * (p.max(MACHINE_EPSILON) / q).ln();
                    }
                }
                let g = attr
                    .iter()
                    .zip(&repulsion[i].1)
                    .map(|(a, r)| c * (a - r / z))
                    .collect();
                (g, kl)
            })
            .collect();

        let mut kl = 0.0;
        for (i, (g, row_kl)) in rows.into_iter().enumerate() {
            grad[i * dim..(i + 1) * dim].copy_from_slice(&g);
            kl += row_kl;
        }
        kl
    }
}

/// Gradient descent with momentum and per-parameter adaptive gains.
struct GradientDescent {
    update: Vec<f64>,
    gains: Vec<f64>,
    grad: Vec<f64>,
    learning_rate: f64,
    min_grad_norm: f64,
}

impl GradientDescent {
    fn new(size: usize, learning_rate: f64, min_grad_norm: f64) -> Self {
        Self {
            update: vec![0.0; size],
            gains: vec![1.0; size],
            grad: vec![0.0; size],
            learning_rate,
            min_grad_norm,
        }
    }

    /// Run the iterations in `iters`, returning the last KL divergence seen.
    fn run(
        &mut self,
        layout: &mut [f64],
        objective: &Objective<'_>,
        iters: std::ops::Range<usize>,
        momentum: f64,
        n_iter_without_progress: usize,
    ) -> f64 {
        let mut best_error = f64::INFINITY;
        let mut best_iter = iters.start;
        let mut error = f64::NAN;

        for it in iters.clone() {
            let check = (it + 1) % N_ITER_CHECK == 0 || it + 1 == iters.end;
            let kl = objective.gradient(layout, &mut self.grad, check);

            for ((g, u), gain) in self
                .grad
                .iter_mut()
                .zip(self.update.iter_mut())
                .zip(self.gains.iter_mut())
            {
                if *u * *g < 0.0 {
                    *gain += 0.2;
                } else {
                    *gain *= 0.8;
                }
                *gain = gain.max(MIN_GAIN);
                *g *= *gain;
                *u = momentum * *u - self.learning_rate * *g;
            }
            for (y, u) in layout.iter_mut().zip(&self.update) {
                *y += *u;
            }

            if !check {
                continue;
            }
            error = kl;
            let grad_norm = self.grad.iter().map(|g| g * g).sum::<f64>().sqrt();
            log::debug!(
                "t-SNE iteration {}: KL divergence {:.4}, gradient norm {:.7}",
                it + 1,
                error,
                grad_norm
            );

            if error < best_error {
                best_error = error;
                best_iter = it;
            } else if it - best_iter > n_iter_without_progress {
                log::debug!("t-SNE stopped after {} iterations without progress", n_iter_without_progress);
                break;
            }
            if grad_norm <= self.min_grad_norm {
                log::debug!("t-SNE gradient norm {:.7} below threshold", grad_norm);
                break;
            }
        }
        error
    }
}
