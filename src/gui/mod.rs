//! GUI module - Interactive plot window

mod app;

pub use app::EmbeddingApp;

use crate::charts::{PlotError, ScatterSpec};

/// Open a window showing `spec` and block until it is closed.
pub fn show_window(spec: ScatterSpec, title: &str) -> Result<(), PlotError> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([900.0, 750.0])
            .with_min_inner_size([400.0, 300.0])
            .with_title(title),
        ..Default::default()
    };

    eframe::run_native(
        title,
        options,
        Box::new(|cc| Ok(Box::new(EmbeddingApp::new(cc, spec)))),
    )
    .map_err(|e| PlotError::Window(e.to_string()))
}
