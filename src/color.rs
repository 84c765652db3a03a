use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

use co2_predictor::data::model::FuelType;

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Color mapping: fuel type → Color32
// ---------------------------------------------------------------------------

/// Maps every fuel type to a distinct colour.
///
/// Colours are assigned over the full label set rather than the types present
/// in the current dataset, so a fuel type keeps its colour across files.
#[derive(Debug, Clone)]
pub struct ColorMap {
    mapping: BTreeMap<FuelType, Color32>,
    default_color: Color32,
}

impl Default for ColorMap {
    fn default() -> Self {
        let palette = generate_palette(FuelType::ALL.len());
        let mapping = FuelType::ALL.into_iter().zip(palette).collect();
        ColorMap {
            mapping,
            default_color: Color32::GRAY,
        }
    }
}

impl ColorMap {
    /// Look up the colour for a given fuel type.
    pub fn color_for(&self, fuel_type: FuelType) -> Color32 {
        self.mapping
            .get(&fuel_type)
            .copied()
            .unwrap_or(self.default_color)
    }
}
