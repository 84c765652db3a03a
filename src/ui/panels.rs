use eframe::egui::{self, Color32, RichText, Ui};

use co2_predictor::data::model::FuelType;

use crate::state::{AppState, Page};

// ---------------------------------------------------------------------------
// Left side panel – navigation and plot filters
// ---------------------------------------------------------------------------

/// Render the left navigation panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("🚗 Project Menu");
    ui.separator();

    ui.label("Select an option:");
    for page in Page::ALL {
        ui.radio_value(&mut state.page, page, page.label());
    }

    if state.page == Page::DataAnalysis {
        ui.add_space(12.0);
        fuel_filter(ui, state);
    }
}

/// Fuel-type checkboxes controlling which records the plots show.
fn fuel_filter(ui: &mut Ui, state: &mut AppState) {
    ui.strong("Fuel types");
    ui.separator();

    let Some(dataset) = state.dataset.clone() else {
        ui.label("No dataset loaded.");
        return;
    };

    ui.horizontal(|ui: &mut Ui| {
        if ui.small_button("All").clicked() {
            state.select_all();
        }
        if ui.small_button("None").clicked() {
            state.select_none();
        }
    });

    let mut toggled: Option<FuelType> = None;
    for (&fuel_type, &count) in &dataset.fuel_counts {
        let text = RichText::new(format!("{fuel_type}  ({count})"))
            .color(state.color_map.color_for(fuel_type));
        let mut checked = state.fuel_filter.contains(&fuel_type);
        if ui.checkbox(&mut checked, text).changed() {
            toggled = Some(fuel_type);
        }
    }
    if let Some(fuel_type) = toggled {
        state.toggle_fuel(fuel_type);
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open dataset…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            let has_report = state.last_report.is_some();
            if ui
                .add_enabled(has_report, egui::Button::new("Save report…"))
                .clicked()
            {
                save_report_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(ds) = &state.dataset {
            ui.label(format!(
                "{} records loaded, {} used for training",
                ds.len(),
                state.cleaned_rows
            ));
        }

        if let Some(model) = &state.model {
            ui.separator();
            ui.label(format!("Model R² {:.3}", model.train_r2));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open vehicle emissions data")
        .add_filter("Supported files", &["csv", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        log::info!("Opening dataset {}", path.display());
        state.open_dataset(&path);
    }
}

pub fn save_report_dialog(state: &mut AppState) {
    let Some(report) = &state.last_report else {
        return;
    };

    let file = rfd::FileDialog::new()
        .set_title("Download prediction report")
        .set_file_name(report.suggested_file_name())
        .add_filter("Text", &["txt"])
        .save_file();

    if let Some(path) = file {
        if let Err(e) = report.save(&path) {
            log::error!("Failed to save report: {e}");
            state.status_message = Some(format!("Error: {e}"));
        }
    }
}
