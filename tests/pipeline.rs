use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;

use approx::assert_relative_eq;

use co2_predictor::data::model::FuelType;
use co2_predictor::model::{ModelCache, ModelStore};
use co2_predictor::{
    EmissionError, EmissionStatus, Pipeline, PipelineConfig, PredictionInput, Report,
    VehicleIdentity,
};

const HEADER: &str = "Make,Model,Vehicle Class,Engine Size(L),Cylinders,Fuel Type,\
                      Fuel Consumption Comb (L/100 km),CO2 Emissions(g/km)";

/// 60 ordinary vehicles, 3 natural gas rows and one extreme outlier.
fn write_dataset(path: &Path) {
    let mut text = String::from(HEADER);
    text.push('\n');
    let codes = ["X", "Z", "D", "E"];
    for i in 0..60 {
        let engine = 1.2 + (i % 8) as f64 * 0.4;
        let cylinders = if engine < 2.5 {
            4
        } else if engine < 3.5 {
            6
        } else {
            8
        };
        let consumption = 5.0 + engine * 1.8 + (i % 3) as f64 * 0.2;
        let co2 = (consumption * 23.0).round();
        writeln!(
            text,
            "MAKE{i},MODEL{i},COMPACT,{engine:.1},{cylinders},{},{consumption:.1},{co2}",
            codes[i % codes.len()]
        )
        .unwrap();
    }
    for i in 0..3 {
        writeln!(text, "GAS{i},CNG,MID-SIZE,2.0,4,N,8.6,198").unwrap();
    }
    writeln!(text, "HYPER,CAR,TWO-SEATER,9.0,16,Z,30.0,700").unwrap();
    std::fs::write(path, text).unwrap();
}

fn config(dir: &Path, model_file: &str) -> PipelineConfig {
    let mut config = PipelineConfig::default()
        .with_dataset_path(dir.join("co2 Emissions.csv"))
        .with_model_path(dir.join(model_file));
    config.n_estimators = 12;
    config
}

fn pipeline(config: PipelineConfig) -> Pipeline {
    Pipeline::with_cache(config, Arc::new(ModelCache::new()))
}

#[test]
fn natural_gas_rows_never_reach_the_dataset() {
    let dir = tempfile::tempdir().unwrap();
    write_dataset(&dir.path().join("co2 Emissions.csv"));
    let pipeline = pipeline(config(dir.path(), "model.bin"));

    let dataset = pipeline.dataset().unwrap();
    assert_eq!(dataset.len(), 61);
    assert!(dataset.records.iter().all(|r| r.fuel_type != FuelType::NaturalGas));
    assert!(!dataset.fuel_counts.contains_key(&FuelType::NaturalGas));
}

#[test]
fn cleaned_rows_all_fall_inside_the_threshold() {
    let dir = tempfile::tempdir().unwrap();
    write_dataset(&dir.path().join("co2 Emissions.csv"));
    let pipeline = pipeline(config(dir.path(), "model.bin"));

    let dataset = pipeline.dataset().unwrap();
    let cleaned = pipeline.cleaned().unwrap();
    assert!(!cleaned.is_empty());
    assert!(cleaned.len() < dataset.len());
    for row in &cleaned.rows {
        assert!(cleaned.stats.within(row, 1.9));
    }
    // The 9.0 L sixteen-cylinder row is the last record.
    assert!(!cleaned.source_indices.contains(&(dataset.len() - 1)));
}

#[test]
fn reference_scenario_predicts_with_derived_consumption() {
    let dir = tempfile::tempdir().unwrap();
    write_dataset(&dir.path().join("co2 Emissions.csv"));
    let pipeline = pipeline(config(dir.path(), "model.bin"));

    let input = PredictionInput {
        engine_size_l: 2.0,
        cylinders: 4,
        mileage_kmpl: 15.0,
    };
    let result = pipeline.predict(&input).unwrap();
    assert_relative_eq!(result.fuel_consumption_l100, 100.0 / 15.0);
    assert_eq!(format!("{:.2}", result.fuel_consumption_l100), "6.67");
    assert!(result.predicted_co2.is_finite() && result.predicted_co2 > 0.0);
    assert_eq!(result.status, EmissionStatus::classify(result.predicted_co2));

    let report = Report::new(VehicleIdentity::new("Maruti", "Swift"), input, result);
    let text = report.render();
    assert!(text.contains("Maruti"));
    assert!(text.contains("6.67"));
}

#[test]
fn out_of_range_input_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    write_dataset(&dir.path().join("co2 Emissions.csv"));
    let pipeline = pipeline(config(dir.path(), "model.bin"));

    let input = PredictionInput {
        cylinders: 20,
        ..PredictionInput::default()
    };
    assert!(matches!(pipeline.predict(&input), Err(EmissionError::Validation(_))));
}

#[test]
fn high_emission_boundary_is_inclusive() {
    assert_eq!(EmissionStatus::classify(200.0), EmissionStatus::High);
    assert_eq!(EmissionStatus::classify(199.99), EmissionStatus::LowModerate);
}

#[test]
fn training_is_reproducible_across_runs() {
    let dir = tempfile::tempdir().unwrap();
    write_dataset(&dir.path().join("co2 Emissions.csv"));

    let first = pipeline(config(dir.path(), "first.bin"));
    let second = pipeline(config(dir.path(), "second.bin"));

    let a = first.model().unwrap();
    let b = second.model().unwrap();
    assert_eq!(a.forest, b.forest);

    for engine in [1.4, 2.0, 3.2, 4.0] {
        let input = PredictionInput {
            engine_size_l: engine,
            ..PredictionInput::default()
        };
        assert_eq!(
            first.predict(&input).unwrap().predicted_co2,
            second.predict(&input).unwrap().predicted_co2
        );
    }
}

#[test]
fn persisted_model_is_reused_by_a_new_session() {
    let dir = tempfile::tempdir().unwrap();
    write_dataset(&dir.path().join("co2 Emissions.csv"));

    let trained = pipeline(config(dir.path(), "model.bin")).model().unwrap();
    let store = ModelStore::new(dir.path().join("model.bin"));
    assert!(store.path().exists());
    assert!(store.metadata_path().exists());

    let reloaded = pipeline(config(dir.path(), "model.bin")).model().unwrap();
    assert_eq!(reloaded.trained_at, trained.trained_at);
    assert_eq!(*reloaded, *trained);

    let input = PredictionInput::default();
    assert_eq!(
        co2_predictor::predict::predict(&trained, &input).unwrap(),
        co2_predictor::predict::predict(&reloaded, &input).unwrap()
    );
}

#[test]
fn sessions_sharing_a_cache_share_the_model() {
    let dir = tempfile::tempdir().unwrap();
    write_dataset(&dir.path().join("co2 Emissions.csv"));
    let cache = Arc::new(ModelCache::new());

    let a = Pipeline::with_cache(config(dir.path(), "model.bin"), Arc::clone(&cache));
    let b = Pipeline::with_cache(config(dir.path(), "model.bin"), Arc::clone(&cache));
    assert!(Arc::ptr_eq(&a.model().unwrap(), &b.model().unwrap()));
    assert_eq!(cache.len(), 1);
}
