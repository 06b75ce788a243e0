use anyhow::anyhow;

mod annotation;
mod app;
mod canvas;
mod clipboard;
mod compose;
mod error;
mod flatten;
mod geometry;
mod logging;
mod raster;
mod state;
mod store;
mod toolbar;

fn main() -> anyhow::Result<()> {
    logging::init(cfg!(debug_assertions));

    let app = app::SnapMixApp::new()?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("SnapMix")
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([900.0, 600.0]),
        ..Default::default()
    };

    eframe::run_native("snapmix", options, Box::new(move |_cc| Box::new(app)))
        .map_err(|err| anyhow!("cannot start the ui: {err}"))
}
