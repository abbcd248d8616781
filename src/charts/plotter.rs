//! Chart Plotter Module
//! Draws the interactive embedding scatter using egui_plot.

use egui::{Color32, RichText};
use egui_plot::{Plot, PlotPoints, Points};

use super::colormap::{ColorScale, MISSING_COLOR};
use super::renderer::{color_bar_bands, UNIFORM_COLOR};
use super::scatter::{ColorBar, ScatterSpec};

/// Number of color groups drawn per scatter; egui_plot colors per series.
const COLOR_BINS: usize = 64;
const POINT_RADIUS: f32 = 2.5;

fn color32((r, g, b): (u8, u8, u8)) -> Color32 {
    Color32::from_rgb(r, g, b)
}

/// Bin index of each point, or `None` for nulls.
pub fn color_bins(bar: &ColorBar, bins: usize) -> Vec<Option<usize>> {
    let last = bins.max(1) - 1;
    bar.values
        .iter()
        .map(|&v| {
            let t = bar.scale.normalize(v);
            (!t.is_nan()).then(|| ((t * bins as f64) as usize).min(last))
        })
        .collect()
}

/// Representative color of bin `i`.
fn bin_color(scale: &ColorScale, i: usize, bins: usize) -> Color32 {
    let mid = (i as f64 + 0.5) / bins as f64;
    color32(scale.color(scale.min + mid * (scale.max - scale.min)))
}

/// Creates the embedding views using egui_plot.
pub struct ScatterPlotter;

impl ScatterPlotter {
    /// Draw the scatter, filling the available space with equal axis scaling.
    pub fn draw_scatter(ui: &mut egui::Ui, spec: &ScatterSpec) {
        let mut groups: Vec<Vec<[f64; 2]>> = vec![Vec::new(); COLOR_BINS];
        let mut missing: Vec<[f64; 2]> = Vec::new();

        if let Some(bar) = &spec.color {
            for (point, bin) in spec.points.iter().zip(color_bins(bar, COLOR_BINS)) {
                match bin {
                    Some(i) => groups[i].push(*point),
                    None => missing.push(*point),
                }
            }
        }

        Plot::new("embedding_scatter")
            .data_aspect(1.0)
            .x_axis_label("dim 0")
            .y_axis_label("dim 1")
            .show(ui, |plot_ui| match &spec.color {
                Some(bar) => {
                    for (i, points) in groups.into_iter().enumerate() {
                        if points.is_empty() {
                            continue;
                        }
                        plot_ui.points(
                            Points::new(PlotPoints::from(points))
                                .radius(POINT_RADIUS)
                                .color(bin_color(&bar.scale, i, COLOR_BINS)),
                        );
                    }
                    if !missing.is_empty() {
                        plot_ui.points(
                            Points::new(PlotPoints::from(missing))
                                .radius(POINT_RADIUS)
                                .color(color32(MISSING_COLOR))
                                .name("missing"),
                        );
                    }
                }
                None => {
                    plot_ui.points(
                        Points::new(PlotPoints::from(spec.points.clone()))
                            .radius(POINT_RADIUS)
                            .color(color32(UNIFORM_COLOR)),
                    );
                }
            });
    }

    /// Vertical gradient bar with the variable name and range limits.
    pub fn draw_color_bar(ui: &mut egui::Ui, bar: &ColorBar) {
        ui.vertical_centered(|ui| {
            ui.label(RichText::new(&bar.label).size(16.0).strong());
            ui.label(format!("{:.3}", bar.scale.max));

            let height = (ui.available_height() - 30.0).max(50.0);
            let (rect, _) = ui.allocate_exact_size(egui::vec2(28.0, height), egui::Sense::hover());
            let painter = ui.painter();

            let bands = color_bar_bands(&bar.scale, COLOR_BINS);
            let band_h = rect.height() / bands.len() as f32;
            // Lowest value at the bottom.
            for (i, (_, _, color)) in bands.into_iter().enumerate() {
                let bottom = rect.bottom() - band_h * i as f32;
                let band = egui::Rect::from_min_max(
                    egui::pos2(rect.left(), bottom - band_h),
                    egui::pos2(rect.right(), bottom),
                );
                painter.rect_filled(band, 0.0, color32(color));
            }
            painter.rect_stroke(rect, 0.0, egui::Stroke::new(1.0, Color32::GRAY));

            ui.label(format!("{:.3}", bar.scale.min));
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bins_span_range_and_skip_nulls() {
        let bar = ColorBar {
            label: "Phi".into(),
            values: vec![0.0, 2.5, 5.0, 9.0, f64::NAN],
            scale: ColorScale::new(0.0, 5.0),
        };

        let bins = color_bins(&bar, 10);

        assert_eq!(bins, vec![Some(0), Some(5), Some(9), Some(9), None]);
    }

    #[test]
    fn bin_colors_run_dark_to_light() {
        let scale = ColorScale::new(0.0, 1.0);
        let first = bin_color(&scale, 0, COLOR_BINS);
        let last = bin_color(&scale, COLOR_BINS - 1, COLOR_BINS);

        let brightness = |c: Color32| c.r() as u32 + c.g() as u32 + c.b() as u32;
        assert!(brightness(first) < brightness(last));
    }
}
