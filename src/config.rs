//! Run configuration for the `dimred` binary.
//!
//! Every field is optional in the JSON file; missing fields fall back to
//! [`RunConfig::default`].

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::{CleanSchema, Domain};
use crate::embed::{Algorithm, Params};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// How the scatter is colored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorConfig {
    /// Column of the cleaned table; `None` draws uniform points
    pub column: Option<String>,
    /// Fixed `[min, max]`; `None` spans the column's values
    pub range: Option<Vec<f64>>,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            column: Some("Phi".to_string()),
            range: Some(vec![0.0, 5.0]),
        }
    }
}

/// Where results go besides the interactive window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub show_window: bool,
    pub save_png: Option<PathBuf>,
    pub png_size: (u32, u32),
    /// Open the saved PNG with the system viewer
    pub open_png: bool,
    pub save_embedding: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            show_window: true,
            save_png: None,
            png_size: (1200, 1000),
            open_png: false,
            save_embedding: None,
        }
    }
}

/// Full pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub input: Option<PathBuf>,
    pub dim: Domain,
    pub algorithm: Algorithm,
    pub scale: bool,
    /// `None` uses [`RunConfig::default_params`] for the chosen algorithm
    pub params: Option<Params>,
    pub color: ColorConfig,
    pub schema: CleanSchema,
    pub output: OutputConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            input: None,
            dim: Domain::Plane,
            algorithm: Algorithm::Umap,
            scale: true,
            params: None,
            color: ColorConfig::default(),
            schema: CleanSchema::default(),
            output: OutputConfig::default(),
        }
    }
}

impl RunConfig {
    /// Load configuration from a JSON file.
    pub fn from_json<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parameters tuned for flow-field snapshots.
    pub fn default_params(algorithm: Algorithm) -> Params {
        match algorithm {
            Algorithm::Umap => [("n_neighbors", 20.0), ("min_dist", 0.2)]
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            Algorithm::Tsne => Params::new(),
        }
    }

    /// Configured parameters, or the defaults for the configured algorithm.
    pub fn effective_params(&self) -> Params {
        self.params
            .clone()
            .unwrap_or_else(|| Self::default_params(self.algorithm))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_run_config() {
        let config = RunConfig::default();

        assert_eq!(config.dim, Domain::Plane);
        assert_eq!(config.algorithm, Algorithm::Umap);
        assert!(config.scale);
        assert_eq!(config.color.column.as_deref(), Some("Phi"));
        assert_eq!(config.color.range, Some(vec![0.0, 5.0]));
        assert_eq!(config.effective_params().get("n_neighbors"), Some(&20.0));
        assert_eq!(config.effective_params().get("min_dist"), Some(&0.2));
    }

    #[test]
    fn test_tsne_defaults_have_no_umap_keys() {
        let config = RunConfig {
            algorithm: Algorithm::Tsne,
            ..Default::default()
        };
        assert!(config.effective_params().is_empty());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"dim": 3, "algorithm": "t-SNE", "params": {{"perplexity": 10}},
                "color": {{"column": null}}, "schema": {{"time": "Time"}}}}"#
        )
        .unwrap();

        let config = RunConfig::from_json(file.path()).unwrap();

        assert_eq!(config.dim, Domain::Volume);
        assert_eq!(config.algorithm, Algorithm::Tsne);
        assert_eq!(config.effective_params().get("perplexity"), Some(&10.0));
        assert_eq!(config.color.column, None);
        assert_eq!(config.color.range, Some(vec![0.0, 5.0]));
        assert_eq!(config.schema.time, "Time");
        assert_eq!(config.schema.ghost_marker, "vtkGhostType");
        assert!(config.output.show_window);
    }

    #[test]
    fn test_invalid_dim_in_json_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"dim": 4}}"#).unwrap();

        let err = RunConfig::from_json(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_missing_file() {
        let err = RunConfig::from_json("/nonexistent/dimred.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
