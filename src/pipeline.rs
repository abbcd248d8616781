//! End-to-end driver: load, clean, embed, export and plot.

use std::fs::File;
use std::path::Path;

use anyhow::{bail, Context, Result};
use polars::prelude::*;

use crate::charts::{ScatterSpec, StaticChartRenderer};
use crate::config::RunConfig;
use crate::data::{import_csv_data, DataCleaner, DataLoader};
use crate::embed::{embed_data, Embedding};

/// Run the whole pipeline described by `config`.
pub fn run(config: &RunConfig) -> Result<Embedding> {
    let Some(input) = config.input.as_deref() else {
        bail!("no input file");
    };

    let mut df = import_csv_data(input).with_context(|| format!("loading {}", input.display()))?;

    DataCleaner::clean(&mut df, config.dim, &config.schema)
        .with_context(|| format!("cleaning {} data", config.dim))?;
    log::info!(
        "Cleaned table: {} rows x {} columns {:?}",
        df.height(),
        df.width(),
        DataLoader::get_columns(&df)
    );

    // Fail before the expensive embedding step on bad color arguments.
    let color_column = config.color.column.as_deref();
    let color_range = config.color.range.as_deref();
    ScatterSpec::check_color_args(Some(&df), color_column, color_range)?;

    let params = config.effective_params();
    let embedding = embed_data(&df, config.algorithm, config.scale, &params)
        .with_context(|| format!("embedding with {}", config.algorithm))?;

    let spec = ScatterSpec::build(&embedding, Some(&df), color_column, color_range)?;

    let output = &config.output;
    if let Some(path) = output.save_embedding.as_deref() {
        save_embedding(&embedding, &df, color_column.filter(|c| !c.is_empty()), path)?;
    }

    if let Some(path) = output.save_png.as_deref() {
        let (width, height) = output.png_size;
        StaticChartRenderer::render_png(&spec, path, width, height)?;
        if output.open_png {
            open::that(path).with_context(|| format!("opening {}", path.display()))?;
        }
    }

    if output.show_window {
        crate::gui::show_window(spec, "dimred")?;
    }

    Ok(embedding)
}

/// Write the embedding components, plus the color column if any, as CSV.
pub fn save_embedding(
    embedding: &Embedding,
    df: &DataFrame,
    color_column: Option<&str>,
    path: &Path,
) -> Result<()> {
    let mut out = embedding.to_dataframe()?;
    if let Some(column) = color_column {
        out.with_column(df.column(column)?.clone())?;
    }

    let mut file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut out)
        .with_context(|| format!("writing {}", path.display()))?;

    log::info!("Saved embedding ({} rows) to {}", out.height(), path.display());
    Ok(())
}
