mod app;
mod color;
mod state;
mod ui;

use app::Co2App;
use co2_predictor::PipelineConfig;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    let mut config = PipelineConfig::from_env();
    if let Some(path) = std::env::args_os().nth(1) {
        config = config.with_dataset_path(path);
    }
    log::info!(
        "Dataset {}, model artifact {}",
        config.dataset_path.display(),
        config.model_path.display()
    );

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Vehicle CO2 Predictor",
        options,
        Box::new(|cc| {
            // Install image loaders so egui can render the home page picture.
            egui_extras::install_image_loaders(&cc.egui_ctx);
            Ok(Box::new(Co2App::new(config)))
        }),
    )
}
