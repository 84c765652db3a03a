use std::path::Path;

use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use co2_predictor::config::{
    CYLINDERS_RANGE, ENGINE_SIZE_RANGE, HOME_IMAGE_PATH, MILEAGE_RANGE,
};
use co2_predictor::model::FEATURE_NAMES;
use co2_predictor::predict::{EmissionStatus, fuel_consumption_l100};

use crate::state::{AppState, Page};
use crate::ui::{panels, plot};

const LOW_COLOR: Color32 = Color32::from_rgb(46, 160, 67);
const HIGH_COLOR: Color32 = Color32::from_rgb(230, 140, 20);

/// Render the page selected in the side panel.
pub fn central(ui: &mut Ui, state: &mut AppState) {
    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| match state.page {
            Page::Home => home(ui),
            Page::DataAnalysis => analysis(ui, state),
            Page::Prediction => prediction(ui, state),
            Page::About => about(ui),
        });
}

// ---------------------------------------------------------------------------
// Home
// ---------------------------------------------------------------------------

fn home(ui: &mut Ui) {
    ui.heading("🌱 CO2 Emission Prediction System");
    ui.add_space(8.0);

    ui.strong("📝 Project Overview");
    ui.label(
        "This system uses Machine Learning (Random Forest) to predict the Carbon Dioxide \
         (CO2) emissions of cars based on their engine parameters.",
    );
    ui.label(
        "With rising concerns about global warming and stricter emission norms, \
         understanding vehicle emissions is crucial for a sustainable future.",
    );
    ui.add_space(8.0);

    ui.strong("🎯 Objectives");
    ui.label("• Analyze: study how engine size, cylinders and mileage affect pollution.");
    ui.label("• Predict: estimate CO2 output (g/km) for any car.");
    ui.label("• Awareness: differentiate between eco-friendly and high-emission vehicles.");
    ui.add_space(8.0);

    if Path::new(HOME_IMAGE_PATH).exists() {
        ui.add(
            egui::Image::new(format!("file://{HOME_IMAGE_PATH}"))
                .max_width(ui.available_width())
                .corner_radius(4.0),
        );
        ui.label(RichText::new("Sustainable Transport").weak());
    }
}

// ---------------------------------------------------------------------------
// Data analysis
// ---------------------------------------------------------------------------

fn analysis(ui: &mut Ui, state: &mut AppState) {
    ui.heading("📊 Data Analysis & Visualization");
    ui.add_space(4.0);

    let Some(dataset) = state.dataset.clone() else {
        ui.label("No dataset loaded. Use File → Open dataset…");
        return;
    };

    ui.checkbox(&mut state.show_raw, "Show Raw Dataset");
    if state.show_raw {
        egui::Grid::new("raw_dataset")
            .striped(true)
            .show(ui, |ui: &mut Ui| {
                for header in ["Make", "Model", "Class", "Engine (L)", "Cyl", "Fuel", "L/100km", "CO2 (g/km)"] {
                    ui.strong(header);
                }
                ui.end_row();
                for rec in dataset.head(10) {
                    ui.label(rec.make.as_deref().unwrap_or("-"));
                    ui.label(rec.model.as_deref().unwrap_or("-"));
                    ui.label(rec.vehicle_class.as_deref().unwrap_or("-"));
                    ui.label(format!("{}", rec.engine_size_l));
                    ui.label(rec.cylinders.to_string());
                    ui.label(rec.fuel_type.label());
                    ui.label(format!("{}", rec.fuel_consumption_comb));
                    ui.label(format!("{}", rec.co2_g_per_km));
                    ui.end_row();
                }
            });
        ui.label(RichText::new(format!("Total Records: {}", dataset.len())).strong());
    }

    ui.separator();
    ui.strong("1. Which Fuel Type is most common?");
    plot::fuel_type_counts(ui, state);

    ui.add_space(8.0);
    ui.strong("2. Engine Size vs. CO2 Emission");
    plot::engine_vs_co2(ui, state);
}

// ---------------------------------------------------------------------------
// Prediction
// ---------------------------------------------------------------------------

fn prediction(ui: &mut Ui, state: &mut AppState) {
    ui.heading("🚀 Predict Emission");
    ui.label("Enter the vehicle details below to estimate the CO2 output.");
    ui.add_space(8.0);

    ui.strong("1. Car Identity (Optional)");
    ui.columns(2, |cols| {
        cols[0].label("Car Brand");
        cols[0].add(
            egui::TextEdit::singleline(&mut state.form.identity.brand).hint_text("e.g. Maruti, Tata"),
        );
        cols[1].label("Car Model Name");
        cols[1].add(
            egui::TextEdit::singleline(&mut state.form.identity.model).hint_text("e.g. Swift, Nexon"),
        );
    });

    ui.separator();
    ui.strong("2. Technical Specifications");
    let input = &mut state.form.input;
    ui.columns(2, |cols| {
        cols[0].label("Engine Size (Litres)");
        cols[0].add(
            egui::DragValue::new(&mut input.engine_size_l)
                .range(ENGINE_SIZE_RANGE.0..=ENGINE_SIZE_RANGE.1)
                .speed(0.1)
                .fixed_decimals(1),
        );
        cols[0].add(
            egui::Slider::new(&mut input.cylinders, CYLINDERS_RANGE.0..=CYLINDERS_RANGE.1)
                .text("Number of Cylinders"),
        );

        cols[1].label("Mileage (km per Litre)");
        cols[1].add(
            egui::DragValue::new(&mut input.mileage_kmpl)
                .range(MILEAGE_RANGE.0..=MILEAGE_RANGE.1)
                .speed(0.5)
                .fixed_decimals(1),
        );
        if let Ok(cons) = fuel_consumption_l100(input.mileage_kmpl) {
            cols[1].label(
                RichText::new(format!("Calculated Fuel Consumption: {cons:.2} L/100km")).weak(),
            );
        }
    });

    ui.add_space(8.0);
    let predict = egui::Button::new(RichText::new("Predict CO2 Emission").strong())
        .fill(Color32::from_rgb(200, 60, 60));
    if ui.add_enabled(state.model.is_some(), predict).clicked() {
        state.run_prediction();
    }
    if state.model.is_none() {
        ui.label(RichText::new("Model unavailable: load a valid dataset first.").color(Color32::RED));
    }

    if let Some(report) = &state.last_report {
        ui.add_space(8.0);
        ui.strong("📝 Prediction Report");

        let result = report.result;
        let name = report.identity.display_name();
        ui.label(
            RichText::new(format!(
                "{name} Estimated Emission: {:.2} g/km",
                result.predicted_co2
            ))
            .color(LOW_COLOR)
            .strong(),
        );
        let (icon, color) = match result.status {
            EmissionStatus::LowModerate => ("✅", LOW_COLOR),
            EmissionStatus::High => ("⚠", HIGH_COLOR),
        };
        ui.colored_label(color, format!("{icon} This is a {} Vehicle.", result.status));

        if ui.button("📄 Download Prediction Report").clicked() {
            panels::save_report_dialog(state);
        }
    }

    if let Some(model) = &state.model {
        ui.add_space(12.0);
        ui.collapsing("Model details", |ui: &mut Ui| {
            ui.label(format!(
                "Random forest, {} trees, seed {}, trained on {} rows ({})",
                model.forest.n_estimators(),
                model.forest.random_state(),
                model.n_samples,
                model.trained_at
            ));
            ui.label(format!("Training R²: {:.4}", model.train_r2));
            if let Some(importances) = model.forest.feature_importances() {
                for (name, imp) in FEATURE_NAMES.iter().zip(importances) {
                    ui.label(format!("{name}: {:.1}% importance", imp * 100.0));
                }
            }
        });
    }
}

// ---------------------------------------------------------------------------
// About
// ---------------------------------------------------------------------------

fn about(ui: &mut Ui) {
    ui.heading("ℹ About");
    ui.add_space(8.0);
    ui.strong("College Project Details");
    ui.label("Project Title: CO2 Emission Prediction by Vehicle");
    ui.label("Dataset Source: Government of Canada - Open Data Portal.");
    ui.add_space(8.0);
    ui.strong("Description");
    ui.label(
        "This tool helps users understand the environmental impact of vehicles \
         based on technical specifications.",
    );
}
