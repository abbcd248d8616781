//! Charts module - Embedding scatter plots
//!
//! [`ScatterSpec`] holds the validated plot; [`ScatterPlotter`] draws it
//! in a window and [`StaticChartRenderer`] writes it to a PNG.

mod colormap;
mod plotter;
mod renderer;
mod scatter;

use polars::prelude::*;

use crate::embed::Embedding;

pub use colormap::{inferno, ColorScale, MISSING_COLOR};
pub use plotter::ScatterPlotter;
pub use renderer::{StaticChartRenderer, UNIFORM_COLOR};
pub use scatter::{ColorBar, PlotError, ScatterSpec};

/// Show the first two embedding components as a scatter in a window.
///
/// Points are colored by `cmap_var` (a column of `df`) over `cmap_minmax`
/// when given. Arguments are validated before any window opens; the call
/// blocks until the window is closed.
pub fn plot_embedding(
    embedding: &Embedding,
    df: Option<&DataFrame>,
    cmap_var: Option<&str>,
    cmap_minmax: Option<&[f64]>,
) -> Result<(), PlotError> {
    let spec = ScatterSpec::build(embedding, df, cmap_var, cmap_minmax)?;
    log::info!("Plotting {} points", spec.points.len());
    crate::gui::show_window(spec, "dimred")
}
