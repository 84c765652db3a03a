use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::{CYLINDERS_RANGE, ENGINE_SIZE_RANGE, HIGH_EMISSION_THRESHOLD, MILEAGE_RANGE};
use crate::error::{EmissionError, Result, ValidationError};
use crate::model::TrainedModel;

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// Vehicle specification entered at request time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionInput {
    pub engine_size_l: f64,
    pub cylinders: u32,
    /// Mileage in km per litre.
    pub mileage_kmpl: f64,
}

impl Default for PredictionInput {
    fn default() -> Self {
        Self {
            engine_size_l: crate::config::DEFAULT_ENGINE_SIZE,
            cylinders: crate::config::DEFAULT_CYLINDERS,
            mileage_kmpl: crate::config::DEFAULT_MILEAGE,
        }
    }
}

impl PredictionInput {
    /// Check every field against its accepted range.
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        check_range("engine size", self.engine_size_l, ENGINE_SIZE_RANGE)?;
        check_range(
            "cylinders",
            self.cylinders as f64,
            (CYLINDERS_RANGE.0 as f64, CYLINDERS_RANGE.1 as f64),
        )?;
        check_range("mileage", self.mileage_kmpl, MILEAGE_RANGE)?;
        Ok(())
    }

    /// Model feature vector `[engine size, cylinders, fuel consumption]`.
    pub fn features(&self) -> Result<[f64; 3]> {
        Ok([
            self.engine_size_l,
            self.cylinders as f64,
            fuel_consumption_l100(self.mileage_kmpl)?,
        ])
    }
}

fn check_range(
    field: &'static str,
    value: f64,
    (min, max): (f64, f64),
) -> std::result::Result<(), ValidationError> {
    // NaN fails both comparisons, so reject it explicitly.
    if value.is_nan() || value < min || value > max {
        return Err(ValidationError {
            field,
            value,
            min,
            max,
        });
    }
    Ok(())
}

/// Convert mileage (km/L) to fuel consumption (L/100km).
pub fn fuel_consumption_l100(mileage_kmpl: f64) -> Result<f64> {
    if mileage_kmpl == 0.0 || !mileage_kmpl.is_finite() {
        return Err(EmissionError::Division {
            mileage: mileage_kmpl,
        });
    }
    Ok(100.0 / mileage_kmpl)
}

// ---------------------------------------------------------------------------
// Response
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmissionStatus {
    LowModerate,
    High,
}

impl EmissionStatus {
    /// `High` at or above 200 g/km.
    pub fn classify(co2_g_per_km: f64) -> Self {
        if co2_g_per_km >= HIGH_EMISSION_THRESHOLD {
            EmissionStatus::High
        } else {
            EmissionStatus::LowModerate
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EmissionStatus::LowModerate => "Low/Moderate Emission",
            EmissionStatus::High => "High Emission",
        }
    }
}

impl fmt::Display for EmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub predicted_co2: f64,
    /// Fuel consumption derived from the input mileage, L/100km.
    pub fuel_consumption_l100: f64,
    pub status: EmissionStatus,
}

/// Validate `input`, run the model on it and classify the prediction.
pub fn predict(model: &TrainedModel, input: &PredictionInput) -> Result<PredictionResult> {
    input.validate()?;
    let features = input.features()?;
    let predicted_co2 = model.predict(&features);
    log::debug!("Prediction for {input:?}: {predicted_co2:.2} g/km");
    Ok(PredictionResult {
        predicted_co2,
        fuel_consumption_l100: features[2],
        status: EmissionStatus::classify(predicted_co2),
    })
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn mileage_100_is_one_litre_per_100km() {
        assert_eq!(fuel_consumption_l100(100.0).unwrap(), 1.0);
    }

    #[test]
    fn mileage_15_converts_to_6_67() {
        let cons = fuel_consumption_l100(15.0).unwrap();
        assert_relative_eq!(cons, 6.666_666_666_666_667);
        assert_eq!(format!("{cons:.2}"), "6.67");
    }

    #[test]
    fn zero_mileage_is_division_error() {
        assert!(matches!(
            fuel_consumption_l100(0.0),
            Err(EmissionError::Division { .. })
        ));
        assert!(fuel_consumption_l100(f64::NAN).is_err());
    }

    #[test]
    fn zero_mileage_is_rejected_by_bounds_first() {
        let input = PredictionInput {
            mileage_kmpl: 0.0,
            ..PredictionInput::default()
        };
        let err = input.validate().unwrap_err();
        assert_eq!(err.field, "mileage");
        assert_eq!(err.min, 1.0);
    }

    #[test]
    fn bounds_are_inclusive() {
        for input in [
            PredictionInput { engine_size_l: 0.5, cylinders: 2, mileage_kmpl: 1.0 },
            PredictionInput { engine_size_l: 10.0, cylinders: 16, mileage_kmpl: 50.0 },
        ] {
            assert!(input.validate().is_ok(), "{input:?}");
        }
    }

    #[test]
    fn out_of_range_fields_are_named() {
        let cases = [
            (PredictionInput { engine_size_l: 0.4, ..Default::default() }, "engine size"),
            (PredictionInput { engine_size_l: f64::NAN, ..Default::default() }, "engine size"),
            (PredictionInput { cylinders: 1, ..Default::default() }, "cylinders"),
            (PredictionInput { cylinders: 17, ..Default::default() }, "cylinders"),
            (PredictionInput { mileage_kmpl: 50.5, ..Default::default() }, "mileage"),
        ];
        for (input, field) in cases {
            assert_eq!(input.validate().unwrap_err().field, field);
        }
    }

    #[test]
    fn threshold_is_inclusive_for_high() {
        assert_eq!(EmissionStatus::classify(200.0), EmissionStatus::High);
        assert_eq!(EmissionStatus::classify(199.999), EmissionStatus::LowModerate);
        assert_eq!(EmissionStatus::classify(350.0), EmissionStatus::High);
        assert_eq!(EmissionStatus::High.to_string(), "High Emission");
        assert_eq!(EmissionStatus::LowModerate.to_string(), "Low/Moderate Emission");
    }

    #[test]
    fn features_use_converted_consumption() {
        let input = PredictionInput::default();
        let f = input.features().unwrap();
        assert_eq!(f[0], 2.0);
        assert_eq!(f[1], 4.0);
        assert_relative_eq!(f[2], 100.0 / 15.0);
    }
}
