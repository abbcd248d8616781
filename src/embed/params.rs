//! Keyword parameters for the embedding algorithms.

use std::collections::BTreeMap;

use super::EmbedError;

/// Algorithm-specific keyword parameters, e.g. `n_neighbors = 20`.
pub type Params = BTreeMap<String, f64>;

/// Seed used when `random_state` is not given.
pub const DEFAULT_RANDOM_STATE: u64 = 42;

/// Largest accepted value for integer parameters other than `random_state`
const MAX_COUNT: usize = u32::MAX as usize;

/// UMAP hyper-parameters. Defaults follow umap-learn.
#[derive(Debug, Clone, PartialEq)]
pub struct UmapParams {
    pub n_components: usize,
    pub n_neighbors: usize,
    pub min_dist: f64,
    pub spread: f64,
    /// `None` selects 500 epochs for up to 10 000 samples, 200 above
    pub n_epochs: Option<usize>,
    pub learning_rate: f64,
    pub negative_sample_rate: usize,
    pub repulsion_strength: f64,
    pub random_state: u64,
}

impl Default for UmapParams {
    fn default() -> Self {
        Self {
            n_components: 2,
            n_neighbors: 15,
            min_dist: 0.1,
            spread: 1.0,
            n_epochs: None,
            learning_rate: 1.0,
            negative_sample_rate: 5,
            repulsion_strength: 1.0,
            random_state: DEFAULT_RANDOM_STATE,
        }
    }
}

impl UmapParams {
    pub const KEYS: [&'static str; 9] = [
        "n_components",
        "n_neighbors",
        "min_dist",
        "spread",
        "n_epochs",
        "learning_rate",
        "negative_sample_rate",
        "repulsion_strength",
        "random_state",
    ];

    pub fn from_params(params: &Params) -> Result<Self, EmbedError> {
        let mut p = Self::default();
        for (key, &value) in params {
            match key.as_str() {
                "n_components" => p.n_components = count(key, value, 1)?,
                "n_neighbors" => p.n_neighbors = count(key, value, 2)?,
                "min_dist" => p.min_dist = non_negative(key, value)?,
                "spread" => p.spread = positive(key, value)?,
                "n_epochs" => p.n_epochs = Some(count(key, value, 1)?),
                "learning_rate" => p.learning_rate = positive(key, value)?,
                "negative_sample_rate" => p.negative_sample_rate = count(key, value, 0)?,
                "repulsion_strength" => p.repulsion_strength = non_negative(key, value)?,
                "random_state" => p.random_state = seed(key, value)?,
                _ => return Err(unknown_key("UMAP", key, &Self::KEYS)),
            }
        }
        if p.min_dist > p.spread {
            return Err(EmbedError::InvalidParameter(format!(
                "min_dist ({}) must be less than or equal to spread ({})",
                p.min_dist, p.spread
            )));
        }
        Ok(p)
    }

    pub fn epochs_for(&self, n_samples: usize) -> usize {
        self.n_epochs
            .unwrap_or(if n_samples <= 10_000 { 500 } else { 200 })
    }
}

/// t-SNE hyper-parameters. Defaults follow scikit-learn.
#[derive(Debug, Clone, PartialEq)]
pub struct TsneParams {
    pub n_components: usize,
    pub perplexity: f64,
    pub early_exaggeration: f64,
    /// `None` selects `max(n / early_exaggeration / 4, 50)`
    pub learning_rate: Option<f64>,
    pub n_iter: usize,
    pub n_iter_without_progress: usize,
    pub min_grad_norm: f64,
    pub random_state: u64,
}

impl Default for TsneParams {
    fn default() -> Self {
        Self {
            n_components: 2,
            perplexity: 30.0,
            early_exaggeration: 12.0,
            learning_rate: None,
            n_iter: 1000,
            n_iter_without_progress: 300,
            min_grad_norm: 1e-7,
            random_state: DEFAULT_RANDOM_STATE,
        }
    }
}

impl TsneParams {
    pub const KEYS: [&'static str; 8] = [
        "n_components",
        "perplexity",
        "early_exaggeration",
        "learning_rate",
        "n_iter",
        "n_iter_without_progress",
        "min_grad_norm",
        "random_state",
    ];

    pub fn from_params(params: &Params) -> Result<Self, EmbedError> {
        let mut p = Self::default();
        for (key, &value) in params {
            match key.as_str() {
                "n_components" => p.n_components = count(key, value, 1)?,
                "perplexity" => p.perplexity = positive(key, value)?,
                "early_exaggeration" => {
                    if value < 1.0 {
                        return Err(EmbedError::InvalidParameter(format!(
                            "early_exaggeration must be at least 1, got {value}"
                        )));
                    }
                    p.early_exaggeration = value;
                }
                "learning_rate" => p.learning_rate = Some(positive(key, value)?),
                "n_iter" | "max_iter" => p.n_iter = count(key, value, 250)?,
                "n_iter_without_progress" => p.n_iter_without_progress = count(key, value, 1)?,
                "min_grad_norm" => p.min_grad_norm = non_negative(key, value)?,
                "random_state" => p.random_state = seed(key, value)?,
                _ => return Err(unknown_key("t-SNE", key, &Self::KEYS)),
            }
        }
        Ok(p)
    }

    pub fn learning_rate_for(&self, n_samples: usize) -> f64 {
        self.learning_rate
            .unwrap_or_else(|| (n_samples as f64 / self.early_exaggeration / 4.0).max(50.0))
    }

    /// Student-t degrees of freedom of the output kernel.
    pub fn degrees_of_freedom(&self) -> f64 {
        (self.n_components as f64 - 1.0).max(1.0)
    }
}

fn unknown_key(algorithm: &str, key: &str, keys: &[&str]) -> EmbedError {
    EmbedError::InvalidParameter(format!(
        "unknown {algorithm} parameter '{key}'. Expected one of: {}",
        keys.join(", ")
    ))
}

fn integer(key: &str, value: f64, min: f64, max: f64) -> Result<f64, EmbedError> {
    if value.fract() != 0.0 || !value.is_finite() || value < min || value > max {
        return Err(EmbedError::InvalidParameter(format!(
            "{key} must be an integer in [{min}, {max}], got {value}"
        )));
    }
    Ok(value)
}

fn count(key: &str, value: f64, min: usize) -> Result<usize, EmbedError> {
    integer(key, value, min as f64, MAX_COUNT as f64).map(|v| v as usize)
}

fn positive(key: &str, value: f64) -> Result<f64, EmbedError> {
    if value > 0.0 && value.is_finite() {
        Ok(value)
    } else {
        Err(EmbedError::InvalidParameter(format!(
            "{key} must be positive, got {value}"
        )))
    }
}

fn non_negative(key: &str, value: f64) -> Result<f64, EmbedError> {
    if value >= 0.0 && value.is_finite() {
        Ok(value)
    } else {
        Err(EmbedError::InvalidParameter(format!(
            "{key} must be non-negative, got {value}"
        )))
    }
}

fn seed(key: &str, value: f64) -> Result<u64, EmbedError> {
    integer(key, value, 0.0, u64::MAX as f64).map(|v| v as u64)
}

/// Length of an `n_samples` x `n_components` layout.
///
/// An embedding may not have more components than samples.
pub(crate) fn layout_len(n_samples: usize, n_components: usize) -> Result<usize, EmbedError> {
    if n_components > n_samples {
        return Err(EmbedError::InvalidParameter(format!(
            "n_components ({n_components}) must not exceed n_samples ({n_samples})"
        )));
    }
    n_samples.checked_mul(n_components).ok_or_else(|| {
        EmbedError::InvalidParameter(format!(
            "layout of {n_samples} x {n_components} is too large"
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, f64)]) -> Params {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn umap_overrides_defaults() {
        let p = UmapParams::from_params(&params(&[("n_neighbors", 20.0), ("min_dist", 0.2)])).unwrap();

        assert_eq!(p.n_neighbors, 20);
        assert_eq!(p.min_dist, 0.2);
        assert_eq!(p.n_components, 2);
        assert_eq!(p.epochs_for(100), 500);
        assert_eq!(p.epochs_for(20_000), 200);
    }

    #[test]
    fn unknown_key_is_invalid() {
        let err = UmapParams::from_params(&params(&[("perplexity", 30.0)])).unwrap_err();
        assert!(matches!(err, EmbedError::InvalidParameter(ref m) if m.contains("perplexity")));

        let err = TsneParams::from_params(&params(&[("n_neighbors", 5.0)])).unwrap_err();
        assert!(matches!(err, EmbedError::InvalidParameter(_)));
    }

    #[test]
    fn counts_must_be_integral() {
        assert!(UmapParams::from_params(&params(&[("n_neighbors", 2.5)])).is_err());
        assert!(UmapParams::from_params(&params(&[("n_neighbors", 1.0)])).is_err());
        assert!(TsneParams::from_params(&params(&[("n_iter", 100.0)])).is_err());
    }

    #[test]
    fn counts_have_an_upper_bound() {
        let err = UmapParams::from_params(&params(&[("n_components", 1e19)])).unwrap_err();
        assert!(matches!(err, EmbedError::InvalidParameter(ref m) if m.contains("n_components")));
        assert!(TsneParams::from_params(&params(&[("n_iter", 1e12)])).is_err());

        let p = UmapParams::from_params(&params(&[("random_state", 1e12)])).unwrap();
        assert_eq!(p.random_state, 1_000_000_000_000);
    }

    #[test]
    fn layout_cannot_outgrow_samples() {
        assert_eq!(layout_len(10, 3).unwrap(), 30);
        assert_eq!(layout_len(3, 3).unwrap(), 9);
        let err = layout_len(3, 4).unwrap_err();
        assert!(matches!(err, EmbedError::InvalidParameter(ref m) if m.contains("n_components")));
        assert!(layout_len(usize::MAX, usize::MAX).is_err());
    }

    #[test]
    fn min_dist_cannot_exceed_spread() {
        let err = UmapParams::from_params(&params(&[("min_dist", 2.0)])).unwrap_err();
        assert!(matches!(err, EmbedError::InvalidParameter(_)));
        assert!(UmapParams::from_params(&params(&[("min_dist", 2.0), ("spread", 3.0)])).is_ok());
    }

    #[test]
    fn tsne_auto_learning_rate() {
        let p = TsneParams::default();
        assert_eq!(p.learning_rate_for(100), 50.0);
        assert_eq!(p.learning_rate_for(4800), 100.0);

        let fixed = TsneParams::from_params(&params(&[("learning_rate", 200.0)])).unwrap();
        assert_eq!(fixed.learning_rate_for(100), 200.0);
        assert_eq!(fixed.degrees_of_freedom(), 1.0);
    }
}
