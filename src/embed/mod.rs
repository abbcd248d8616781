//! Embed module - UMAP and t-SNE dimensionality reduction
//!
//! Both reducers work on a dense [`FeatureMatrix`] and return an
//! [`Embedding`] whose rows follow the input row order.

mod neighbors;
mod params;
mod tsne;
mod umap;

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::data::{FeatureError, FeatureMatrix};
use crate::stats::scale_data;

pub use params::{Params, TsneParams, UmapParams, DEFAULT_RANDOM_STATE};
pub use tsne::Tsne;
pub use umap::Umap;

#[derive(Error, Debug)]
pub enum EmbedError {
    #[error("invalid algorithm '{0}'. Expected one of: umap, tsne")]
    UnsupportedAlgorithm(String),
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("Insufficient data: need at least {min} samples, got {got}")]
    InsufficientData { min: usize, got: usize },
    #[error("No numeric feature columns to embed")]
    NoFeatures,
    #[error(transparent)]
    Features(#[from] FeatureError),
}

/// Supported dimensionality reduction algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Algorithm {
    Umap,
    Tsne,
}

impl FromStr for Algorithm {
    type Err = EmbedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "umap" => Ok(Algorithm::Umap),
            "tsne" | "t-sne" => Ok(Algorithm::Tsne),
            _ => Err(EmbedError::UnsupportedAlgorithm(s.to_string())),
        }
    }
}

impl TryFrom<String> for Algorithm {
    type Error = EmbedError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Algorithm> for String {
    fn from(algorithm: Algorithm) -> Self {
        algorithm.to_string()
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Algorithm::Umap => write!(f, "umap"),
            Algorithm::Tsne => write!(f, "tsne"),
        }
    }
}

/// Low-dimensional coordinates, one row per input sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding {
    n_components: usize,
    coords: Vec<f64>,
}

impl Embedding {
    pub(crate) fn new(n_components: usize, coords: Vec<f64>) -> Self {
        debug_assert!(n_components > 0 && coords.len() % n_components == 0);
        Self {
            n_components,
            coords,
        }
    }

    /// Build an embedding from rows of equal length.
    pub fn from_rows(rows: &[Vec<f64>]) -> Option<Self> {
        let n_components = rows.first().map(|r| r.len())?;
        if n_components == 0 || rows.iter().any(|r| r.len() != n_components) {
            return None;
        }
        Some(Self::new(
            n_components,
            rows.iter().flatten().copied().collect(),
        ))
    }

    pub fn n_samples(&self) -> usize {
        self.coords.len() / self.n_components
    }

    pub fn n_components(&self) -> usize {
        self.n_components
    }

    pub fn point(&self, i: usize) -> &[f64] {
        &self.coords[i * self.n_components..(i + 1) * self.n_components]
    }

    pub fn points(&self) -> impl Iterator<Item = &[f64]> {
        self.coords.chunks_exact(self.n_components)
    }

    /// Copy out component `j` for all samples.
    pub fn component(&self, j: usize) -> Vec<f64> {
        self.points().map(|p| p[j]).collect()
    }

    /// Table with one `dim_{j}` column per component.
    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let columns = (0..self.n_components)
            .map(|j| Column::new(format!("dim_{j}").into(), self.component(j)))
            .collect();
        DataFrame::new(columns)
    }
}

/// A fitted-from-scratch dimensionality reduction.
pub trait Reducer {
    /// Fit on `features` and return their embedding.
    fn fit_transform(&self, features: &FeatureMatrix) -> Result<Embedding, EmbedError>;
}

/// Build the reducer for `algorithm` from keyword parameters.
pub fn build_reducer(algorithm: Algorithm, params: &Params) -> Result<Box<dyn Reducer>, EmbedError> {
    Ok(match algorithm {
        Algorithm::Umap => Box::new(Umap::new(UmapParams::from_params(params)?)),
        Algorithm::Tsne => Box::new(Tsne::new(TsneParams::from_params(params)?)),
    })
}

/// Embed a feature matrix, optionally standardizing it first.
pub fn embed_features(
    features: &FeatureMatrix,
    algorithm: Algorithm,
    scale: bool,
    params: &Params,
) -> Result<Embedding, EmbedError> {
    let reducer = build_reducer(algorithm, params)?;

    if features.n_cols() == 0 {
        return Err(EmbedError::NoFeatures);
    }
    if features.n_rows() < 2 {
        return Err(EmbedError::InsufficientData {
            min: 2,
            got: features.n_rows(),
        });
    }

    log::info!(
        "Embedding {} samples x {} features with {} (scale = {})",
        features.n_rows(),
        features.n_cols(),
        algorithm,
        scale
    );

    let embedding = if scale {
        reducer.fit_transform(&scale_data(features))?
    } else {
        reducer.fit_transform(features)?
    };

    log::info!(
        "Embedding done: {} x {}",
        embedding.n_samples(),
        embedding.n_components()
    );
    Ok(embedding)
}

/// Embed the numeric columns of a cleaned table.
pub fn embed_data(
    df: &DataFrame,
    algorithm: Algorithm,
    scale: bool,
    params: &Params,
) -> Result<Embedding, EmbedError> {
    let features = FeatureMatrix::from_dataframe(df)?;
    embed_features(&features, algorithm, scale, params)
}
