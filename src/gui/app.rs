//! Embedding viewer application
//! Main window with the scatter and an optional color bar.

use egui::{CentralPanel, SidePanel};

use crate::charts::{ScatterPlotter, ScatterSpec};

/// Main application window.
pub struct EmbeddingApp {
    spec: ScatterSpec,
}

impl EmbeddingApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, spec: ScatterSpec) -> Self {
        Self { spec }
    }
}

impl eframe::App for EmbeddingApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if let Some(bar) = &self.spec.color {
            SidePanel::right("color_bar")
                .resizable(false)
                .exact_width(90.0)
                .show(ctx, |ui| {
                    ScatterPlotter::draw_color_bar(ui, bar);
                });
        }

        CentralPanel::default().show(ctx, |ui| {
            ScatterPlotter::draw_scatter(ui, &self.spec);
        });
    }
}
