//! dimred - Dimensionality reduction for CSV simulation output
//!
//! Pipeline: [`import_csv_data`] → [`clean_data`] → [`embed_data`]
//! (optionally via [`scale_data`]) → [`plot_embedding`].

pub mod charts;
pub mod config;
pub mod data;
pub mod embed;
pub mod gui;
pub mod pipeline;
pub mod stats;

pub use charts::{plot_embedding, PlotError};
pub use data::{clean_data, import_csv_data, CleanError, FeatureMatrix, LoaderError};
pub use embed::{embed_data, Algorithm, EmbedError, Embedding, Params};
pub use stats::scale_data;
