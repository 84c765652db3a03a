use eframe::egui::Ui;
use egui_plot::{Bar, BarChart, Legend, Plot, PlotPoints, Points};

use co2_predictor::data::model::FuelType;

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Fuel type counts (bar chart)
// ---------------------------------------------------------------------------

/// One bar per fuel type present in the dataset, coloured like the scatter plot.
pub fn fuel_type_counts(ui: &mut Ui, state: &AppState) {
    let Some(dataset) = &state.dataset else {
        return;
    };

    Plot::new("fuel_type_counts")
        .legend(Legend::default())
        .height(260.0)
        .y_axis_label("Count")
        .show_x(false)
        .allow_drag(false)
        .allow_scroll(false)
        .allow_zoom(false)
        .show(ui, |plot_ui| {
            for (i, (&fuel_type, &count)) in dataset.fuel_counts.iter().enumerate() {
                let color = state.color_map.color_for(fuel_type);
                let bar = Bar::new(i as f64, count as f64)
                    .width(0.6)
                    .name(fuel_type.label())
                    .fill(color);
                plot_ui.bar_chart(BarChart::new(vec![bar]).name(fuel_type.label()).color(color));
            }
        });
}

// ---------------------------------------------------------------------------
// Engine size vs CO2 (scatter)
// ---------------------------------------------------------------------------

/// Scatter of engine size against CO2, one series per visible fuel type.
pub fn engine_vs_co2(ui: &mut Ui, state: &AppState) {
    let Some(dataset) = &state.dataset else {
        return;
    };

    let mut series: Vec<(FuelType, Vec<[f64; 2]>)> = FuelType::ALL
        .into_iter()
        .filter(|ft| state.fuel_filter.contains(ft))
        .map(|ft| (ft, Vec::new()))
        .collect();

    for &idx in &state.visible_indices {
        let rec = &dataset.records[idx];
        if let Some((_, pts)) = series.iter_mut().find(|(ft, _)| *ft == rec.fuel_type) {
            pts.push([rec.engine_size_l, rec.co2_g_per_km]);
        }
    }

    Plot::new("engine_vs_co2")
        .legend(Legend::default())
        .height(360.0)
        .x_axis_label("Engine Size (L)")
        .y_axis_label("CO2 Emissions (g/km)")
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for (fuel_type, pts) in series {
                if pts.is_empty() {
                    continue;
                }
                let points = Points::new(PlotPoints::from(pts))
                    .name(fuel_type.label())
                    .color(state.color_map.color_for(fuel_type))
                    .radius(2.5);
                plot_ui.points(points);
            }
        });
}
