//! Static Chart Renderer
//! Writes the embedding scatter to a PNG file.
//!
//! Layout:
//! 1. Scatter of the first two components with equal axis scaling
//! 2. Color bar on the right, labelled with the color variable (when colored)

use std::path::Path;

use plotters::prelude::*;

use super::colormap::ColorScale;
use super::scatter::{PlotError, ScatterSpec};

/// Default marker color when no color variable is given
pub const UNIFORM_COLOR: (u8, u8, u8) = (31, 119, 180);

const POINT_RADIUS: i32 = 3;
const COLOR_BAR_WIDTH: u32 = 120;
const COLOR_BAR_STEPS: usize = 64;
const MARGIN: u32 = 20;
const LABEL_AREA: u32 = 40;

fn render_err<E: std::fmt::Display>(e: E) -> PlotError {
    PlotError::Render(e.to_string())
}

fn rgb((r, g, b): (u8, u8, u8)) -> RGBColor {
    RGBColor(r, g, b)
}

/// Value bands `(lo, hi, color)` stacked from `scale.min` to `scale.max`.
pub fn color_bar_bands(scale: &ColorScale, steps: usize) -> Vec<(f64, f64, (u8, u8, u8))> {
    let steps = steps.max(1);
    let step = (scale.max - scale.min) / steps as f64;
    (0..steps)
        .map(|i| {
            let lo = scale.min + step * i as f64;
            let hi = lo + step;
            (lo, hi, scale.color((lo + hi) / 2.0))
        })
        .collect()
}

pub struct StaticChartRenderer;

impl StaticChartRenderer {
    /// Render `spec` as a `width` x `height` PNG at `path`.
    pub fn render_png(spec: &ScatterSpec, path: &Path, width: u32, height: u32) -> Result<(), PlotError> {
        let root = BitMapBackend::new(path, (width, height)).into_drawing_area();
        root.fill(&WHITE).map_err(render_err)?;

        let (plot_area, bar_area) = if spec.color.is_some() {
            let split = width.saturating_sub(COLOR_BAR_WIDTH) as i32;
            let (left, right) = root.split_horizontally(split);
            (left, Some(right))
        } else {
            (root.clone(), None)
        };

        let (area_w, area_h) = plot_area.dim_in_pixel();
        let inner_w = area_w.saturating_sub(2 * MARGIN + LABEL_AREA) as f64;
        let inner_h = area_h.saturating_sub(2 * MARGIN + LABEL_AREA) as f64;
        let ((x0, x1), (y0, y1)) = spec.equal_aspect_ranges(inner_w, inner_h);

        let mut chart = ChartBuilder::on(&plot_area)
            .margin(MARGIN)
            .x_label_area_size(LABEL_AREA)
            .y_label_area_size(LABEL_AREA)
            .build_cartesian_2d(x0..x1, y0..y1)
            .map_err(render_err)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .disable_y_mesh()
            .draw()
            .map_err(render_err)?;

        chart
            .draw_series(spec.points.iter().enumerate().map(|(i, p)| {
                let color = spec.color.as_ref().map_or(UNIFORM_COLOR, |bar| bar.color_of(i));
                Circle::new((p[0], p[1]), POINT_RADIUS, rgb(color).filled())
            }))
            .map_err(render_err)?;

        if let (Some(bar), Some(area)) = (spec.color.as_ref(), bar_area) {
            let mut legend = ChartBuilder::on(&area)
                .margin(MARGIN)
                .caption(&bar.label, ("sans-serif", 16))
                .x_label_area_size(0)
                .y_label_area_size(LABEL_AREA)
                .build_cartesian_2d(0.0..1.0, bar.scale.min..bar.scale.max)
                .map_err(render_err)?;

            legend
                .configure_mesh()
                .disable_mesh()
                .disable_x_axis()
                .draw()
                .map_err(render_err)?;

            legend
                .draw_series(
                    color_bar_bands(&bar.scale, COLOR_BAR_STEPS)
                        .into_iter()
                        .map(|(lo, hi, color)| Rectangle::new([(0.0, lo), (1.0, hi)], rgb(color).filled())),
                )
                .map_err(render_err)?;
        }

        root.present().map_err(render_err)?;
        log::info!("Saved scatter plot to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bands_cover_the_scale() {
        let scale = ColorScale::new(0.0, 5.0);

        let bands = color_bar_bands(&scale, 10);

        assert_eq!(bands.len(), 10);
        assert_eq!(bands[0].0, 0.0);
        assert!((bands[9].1 - 5.0).abs() < 1e-12);
        for pair in bands.windows(2) {
            assert!((pair[0].1 - pair[1].0).abs() < 1e-12);
        }
    }

    #[test]
    fn bands_follow_colormap_order() {
        let scale = ColorScale::new(-1.0, 1.0);

        let bands = color_bar_bands(&scale, 4);

        assert_eq!(bands[0].2, scale.color(-0.75));
        assert_eq!(bands[3].2, scale.color(0.75));
        assert_eq!(color_bar_bands(&scale, 0).len(), 1);
    }
}
