use eframe::egui;

use co2_predictor::PipelineConfig;

use crate::state::AppState;
use crate::ui::{pages, panels};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct Co2App {
    pub state: AppState,
}

impl Co2App {
    /// Loads the dataset and trains (or reloads) the model before the first frame.
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            state: AppState::new(config),
        }
    }
}

impl eframe::App for Co2App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: navigation ----
        egui::SidePanel::left("nav_panel")
            .default_width(220.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: selected page ----
        egui::CentralPanel::default().show(ctx, |ui| {
            pages::central(ui, &mut self.state);
        });
    }
}
