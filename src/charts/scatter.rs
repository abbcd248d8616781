//! Scatter plot description shared by the interactive and static renderers.
//!
//! All argument validation happens in [`ScatterSpec::build`], before any
//! window is opened or file written.

use polars::prelude::*;
use thiserror::Error;

use super::colormap::ColorScale;
use crate::data::DataLoader;
use crate::embed::Embedding;

#[derive(Error, Debug)]
pub enum PlotError {
    #[error("invalid variable for the color map '{column}'. Expected one of: {available:?}")]
    UnknownColorColumn {
        column: String,
        available: Vec<String>,
    },
    #[error("color range must have exactly 2 values (min, max), got {0}")]
    InvalidColorRange(usize),
    #[error("color range minimum {min} is greater than maximum {max}")]
    ReversedColorRange { min: f64, max: f64 },
    #[error("embedding has {0} component(s); a scatter plot needs at least 2")]
    TooFewComponents(usize),
    #[error("embedding has {embedding} rows but the table has {table}")]
    LengthMismatch { embedding: usize, table: usize },
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Failed to render chart: {0}")]
    Render(String),
    #[error("Failed to open plot window: {0}")]
    Window(String),
}

/// Values and scale of the color channel.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorBar {
    /// Source column name, shown next to the bar
    pub label: String,
    /// One value per point; NaN marks a null
    pub values: Vec<f64>,
    pub scale: ColorScale,
}

impl ColorBar {
    pub fn color_of(&self, i: usize) -> (u8, u8, u8) {
        self.scale.color(self.values[i])
    }
}

/// Validated scatter of the first two embedding components.
#[derive(Debug, Clone, PartialEq)]
pub struct ScatterSpec {
    pub points: Vec<[f64; 2]>,
    pub color: Option<ColorBar>,
}

impl ScatterSpec {
    /// Check the color arguments against `data` without an embedding.
    ///
    /// An empty `cmap_var` or `cmap_minmax` counts as not given. Returns the
    /// fixed color scale, if any.
    pub fn check_color_args(
        data: Option<&DataFrame>,
        cmap_var: Option<&str>,
        cmap_minmax: Option<&[f64]>,
    ) -> Result<Option<ColorScale>, PlotError> {
        if let Some(column) = cmap_var.filter(|c| !c.is_empty()) {
            let has_column = data.is_some_and(|df| DataLoader::has_column(df, column));
            if !has_column {
                return Err(PlotError::UnknownColorColumn {
                    column: column.to_string(),
                    available: data.map(DataLoader::get_columns).unwrap_or_default(),
                });
            }
        }

        match cmap_minmax.filter(|r| !r.is_empty()) {
            Some(&[min, max]) if min > max => Err(PlotError::ReversedColorRange { min, max }),
            Some(&[min, max]) => Ok(Some(ColorScale::new(min, max))),
            Some(other) => Err(PlotError::InvalidColorRange(other.len())),
            None => Ok(None),
        }
    }

    /// Validate the plot arguments and collect everything needed to draw.
    ///
    /// - `cmap_var` must name a column of `data`
    /// - `cmap_minmax`, when given, must hold exactly `[min, max]`
    pub fn build(
        embedding: &Embedding,
        data: Option<&DataFrame>,
        cmap_var: Option<&str>,
        cmap_minmax: Option<&[f64]>,
    ) -> Result<Self, PlotError> {
        let range = Self::check_color_args(data, cmap_var, cmap_minmax)?;
        let cmap_var = cmap_var.filter(|c| !c.is_empty());

        if embedding.n_components() < 2 {
            return Err(PlotError::TooFewComponents(embedding.n_components()));
        }

        let points: Vec<[f64; 2]> = embedding.points().map(|p| [p[0], p[1]]).collect();

        let color = match (cmap_var, data) {
            (Some(column), Some(df)) => {
                if df.height() != points.len() {
                    return Err(PlotError::LengthMismatch {
                        embedding: points.len(),
                        table: df.height(),
                    });
                }
                let values: Vec<f64> = DataLoader::get_f64_values(df, column)?
                    .into_iter()
                    .map(|v| v.unwrap_or(f64::NAN))
                    .collect();
                let scale = range.unwrap_or_else(|| ColorScale::from_values(&values));
                Some(ColorBar {
                    label: column.to_string(),
                    values,
                    scale,
                })
            }
            _ => {
                if range.is_some() {
                    log::warn!("Color range given without a color variable; ignoring it");
                }
                None
            }
        };

        Ok(Self { points, color })
    }

    /// Padded axis ranges with equal data units per pixel on both axes.
    pub fn equal_aspect_ranges(&self, width_px: f64, height_px: f64) -> ((f64, f64), (f64, f64)) {
        let (mut x0, mut x1, mut y0, mut y1) = self.points.iter().filter(|p| p[0].is_finite() && p[1].is_finite()).fold(
            (f64::INFINITY, f64::NEG_INFINITY, f64::INFINITY, f64::NEG_INFINITY),
            |(x0, x1, y0, y1), p| (x0.min(p[0]), x1.max(p[0]), y0.min(p[1]), y1.max(p[1])),
        );
        if !x0.is_finite() {
            (x0, x1, y0, y1) = (-1.0, 1.0, -1.0, 1.0);
        }

        let pad = 0.05;
        let mut half_w = ((x1 - x0) / 2.0 * (1.0 + pad)).max(1e-9);
        let mut half_h = ((y1 - y0) / 2.0 * (1.0 + pad)).max(1e-9);
        let (cx, cy) = ((x0 + x1) / 2.0, (y0 + y1) / 2.0);

        // Widen whichever axis has fewer units per pixel.
        let aspect = width_px.max(1.0) / height_px.max(1.0);
        if half_w / half_h < aspect {
            half_w = half_h * aspect;
        } else {
            half_h = half_w / aspect;
        }
        ((cx - half_w, cx + half_w), (cy - half_h, cy + half_h))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn embedding() -> Embedding {
        Embedding::from_rows(&[vec![0.0, 0.0], vec![1.0, 2.0], vec![2.0, 1.0]]).unwrap()
    }

    fn table() -> DataFrame {
        df!("U:0" => [1.0, 2.0, 3.0], "Phi" => [Some(0.0), None, Some(10.0)]).unwrap()
    }

    #[test]
    fn unknown_color_column_is_rejected() {
        let df = table();

        let err = ScatterSpec::build(&embedding(), Some(&df), Some("rho"), None).unwrap_err();

        match err {
            PlotError::UnknownColorColumn { column, available } => {
                assert_eq!(column, "rho");
                assert_eq!(available, vec!["U:0", "Phi"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn color_column_without_table_is_rejected() {
        let err = ScatterSpec::build(&embedding(), None, Some("Phi"), None).unwrap_err();
        assert!(matches!(err, PlotError::UnknownColorColumn { .. }));
    }

    #[test]
    fn color_range_needs_two_values() {
        let df = table();
        for range in [&[1.0][..], &[0.0, 1.0, 2.0][..]] {
            let err = ScatterSpec::build(&embedding(), Some(&df), Some("Phi"), Some(range)).unwrap_err();
            assert!(matches!(err, PlotError::InvalidColorRange(n) if n == range.len()));
        }
        let err = ScatterSpec::build(&embedding(), Some(&df), Some("Phi"), Some(&[5.0, 0.0])).unwrap_err();
        assert!(matches!(err, PlotError::ReversedColorRange { .. }));
    }

    #[test]
    fn color_range_is_checked_even_without_column() {
        let err = ScatterSpec::build(&embedding(), None, None, Some(&[1.0, 2.0, 3.0])).unwrap_err();
        assert!(matches!(err, PlotError::InvalidColorRange(3)));
    }

    #[test]
    fn empty_color_arguments_count_as_absent() {
        let df = table();

        let spec = ScatterSpec::build(&embedding(), Some(&df), Some(""), Some(&[])).unwrap();
        assert!(spec.color.is_none());

        let spec = ScatterSpec::build(&embedding(), Some(&df), Some("Phi"), Some(&[])).unwrap();
        assert_eq!(spec.color.unwrap().scale, ColorScale::new(0.0, 10.0));
    }

    #[test]
    fn color_args_checked_without_embedding() {
        let df = table();

        let scale = ScatterSpec::check_color_args(Some(&df), Some("Phi"), Some(&[1.0, 2.0])).unwrap();
        assert_eq!(scale, Some(ColorScale::new(1.0, 2.0)));
        assert_eq!(ScatterSpec::check_color_args(None, None, None).unwrap(), None);
        assert!(ScatterSpec::check_color_args(Some(&df), None, Some(&[2.0, 1.0])).is_err());
    }

    #[test]
    fn uniform_scatter_without_color() {
        let spec = ScatterSpec::build(&embedding(), None, None, None).unwrap();

        assert_eq!(spec.points, vec![[0.0, 0.0], [1.0, 2.0], [2.0, 1.0]]);
        assert!(spec.color.is_none());
    }

    #[test]
    fn colors_follow_column_and_fixed_range() {
        let df = table();

        let spec = ScatterSpec::build(&embedding(), Some(&df), Some("Phi"), Some(&[0.0, 5.0])).unwrap();

        let bar = spec.color.unwrap();
        assert_eq!(bar.label, "Phi");
        assert_eq!(bar.scale, ColorScale::new(0.0, 5.0));
        assert_eq!(bar.values[0], 0.0);
        assert!(bar.values[1].is_nan());
        assert_eq!(bar.color_of(2), bar.scale.color(5.0));
    }

    #[test]
    fn color_scale_defaults_to_data_range() {
        let df = table();

        let spec = ScatterSpec::build(&embedding(), Some(&df), Some("Phi"), None).unwrap();

        assert_eq!(spec.color.unwrap().scale, ColorScale::new(0.0, 10.0));
    }

    #[test]
    fn single_component_embedding_is_rejected() {
        let emb = Embedding::from_rows(&[vec![0.0], vec![1.0]]).unwrap();
        let err = ScatterSpec::build(&emb, None, None, None).unwrap_err();
        assert!(matches!(err, PlotError::TooFewComponents(1)));
    }

    #[test]
    fn row_count_must_match_table() {
        let df = df!("Phi" => [1.0, 2.0]).unwrap();
        let err = ScatterSpec::build(&embedding(), Some(&df), Some("Phi"), None).unwrap_err();
        assert!(matches!(err, PlotError::LengthMismatch { embedding: 3, table: 2 }));
    }

    #[test]
    fn equal_aspect_ranges_match_pixel_ratio() {
        let spec = ScatterSpec::build(&embedding(), None, None, None).unwrap();

        let ((x0, x1), (y0, y1)) = spec.equal_aspect_ranges(600.0, 300.0);

        assert!(((x1 - x0) / (y1 - y0) - 2.0).abs() < 1e-9);
        assert!(x0 < 0.0 && x1 > 2.0 && y0 < 0.0 && y1 > 2.0);
    }
}
