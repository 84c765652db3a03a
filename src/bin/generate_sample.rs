use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

/// One CSV row, using the column names the loader expects.
#[derive(Debug, Clone, Serialize)]
struct SampleRow {
    #[serde(rename = "Make")]
    make: String,
    #[serde(rename = "Model")]
    model: String,
    #[serde(rename = "Vehicle Class")]
    vehicle_class: String,
    #[serde(rename = "Engine Size(L)")]
    engine_size_l: f64,
    #[serde(rename = "Cylinders")]
    cylinders: i64,
    #[serde(rename = "Fuel Type")]
    fuel_type: String,
    #[serde(rename = "Fuel Consumption Comb (L/100 km)")]
    fuel_consumption_comb: f64,
    #[serde(rename = "CO2 Emissions(g/km)")]
    co2_g_per_km: f64,
}

const MAKES: [(&str, [&str; 3]); 5] = [
    ("ACURA", ["ILX", "MDX", "RDX"]),
    ("FORD", ["FOCUS", "F-150", "MUSTANG"]),
    ("TOYOTA", ["COROLLA", "CAMRY", "TUNDRA"]),
    ("BMW", ["320i", "X5", "M4"]),
    ("CHEVROLET", ["SPARK", "SILVERADO", "CAMARO"]),
];

const CLASSES: [&str; 5] = ["COMPACT", "MID-SIZE", "SUV - SMALL", "PICKUP TRUCK - STANDARD", "TWO-SEATER"];

/// Fuel code with its approximate CO2 g per litre burned.
const FUELS: [(&str, f64); 5] = [("X", 23.2), ("Z", 23.4), ("D", 26.8), ("E", 16.5), ("N", 19.0)];

/// Approximate normal sample via Box-Muller.
fn gauss(rng: &mut StdRng, mean: f64, std_dev: f64) -> f64 {
    let u1: f64 = rng.gen_range(1e-15..1.0);
    let u2: f64 = rng.gen();
    let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    mean + std_dev * z
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

fn generate_row(rng: &mut StdRng, outlier: bool) -> SampleRow {
    let (make, models) = MAKES[rng.gen_range(0..MAKES.len())];
    let model = models[rng.gen_range(0..models.len())];
    let vehicle_class = CLASSES[rng.gen_range(0..CLASSES.len())];

    const CYLINDER_MIX: [i64; 6] = [4, 4, 4, 6, 6, 8];
    let cylinders = CYLINDER_MIX[rng.gen_range(0..CYLINDER_MIX.len())];
    let mut engine_size_l = round_to((cylinders as f64 * 0.45 + gauss(rng, 0.0, 0.3)).clamp(1.0, 6.8), 1);

    // Natural Gas is rare in the real data too.
    let fuel_idx = if rng.gen_bool(0.01) { 4 } else { rng.gen_range(0..4) };
    let (fuel_code, co2_per_litre) = FUELS[fuel_idx];

    let mut fuel_consumption_comb =
        round_to((4.0 + engine_size_l * 1.9 + gauss(rng, 0.0, 0.8)).max(4.0), 1);
    if outlier {
        engine_size_l = 8.4;
        fuel_consumption_comb = round_to(fuel_consumption_comb * 2.2, 1);
    }
    let co2_g_per_km = (fuel_consumption_comb * co2_per_litre + gauss(rng, 0.0, 4.0)).round();

    SampleRow {
        make: make.to_string(),
        model: model.to_string(),
        vehicle_class: vehicle_class.to_string(),
        engine_size_l,
        cylinders: if outlier { 16 } else { cylinders },
        fuel_type: fuel_code.to_string(),
        fuel_consumption_comb,
        co2_g_per_km,
    }
}

fn write_csv(path: &str, rows: &[SampleRow]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("creating {path}"))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(path: &str, rows: &[SampleRow]) -> Result<()> {
    fn strings(rows: &[SampleRow], f: fn(&SampleRow) -> &str) -> StringArray {
        StringArray::from(rows.iter().map(f).collect::<Vec<_>>())
    }
    fn floats(rows: &[SampleRow], f: fn(&SampleRow) -> f64) -> Float64Array {
        Float64Array::from(rows.iter().map(f).collect::<Vec<_>>())
    }

    let schema = Arc::new(Schema::new(vec![
        Field::new("Make", DataType::Utf8, false),
        Field::new("Model", DataType::Utf8, false),
        Field::new("Vehicle Class", DataType::Utf8, false),
        Field::new("Engine Size(L)", DataType::Float64, false),
        Field::new("Cylinders", DataType::Int64, false),
        Field::new("Fuel Type", DataType::Utf8, false),
        Field::new("Fuel Consumption Comb (L/100 km)", DataType::Float64, false),
        Field::new("CO2 Emissions(g/km)", DataType::Float64, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(strings(rows, |r| &r.make)),
            Arc::new(strings(rows, |r| &r.model)),
            Arc::new(strings(rows, |r| &r.vehicle_class)),
            Arc::new(floats(rows, |r| r.engine_size_l)),
            Arc::new(Int64Array::from(rows.iter().map(|r| r.cylinders).collect::<Vec<_>>())),
            Arc::new(strings(rows, |r| &r.fuel_type)),
            Arc::new(floats(rows, |r| r.fuel_consumption_comb)),
            Arc::new(floats(rows, |r| r.co2_g_per_km)),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path).with_context(|| format!("creating {path}"))?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn main() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(42);

    // Every 50th row is an implausible outlier for the z-score filter to catch.
    let rows: Vec<SampleRow> = (0..1000)
        .map(|i| generate_row(&mut rng, i % 50 == 49))
        .collect();

    let csv_path = "co2 Emissions.csv";
    let parquet_path = "co2_emissions.parquet";
    write_csv(csv_path, &rows)?;
    write_parquet(parquet_path, &rows)?;

    let natural_gas = rows.iter().filter(|r| r.fuel_type == "N").count();
    println!(
        "Wrote {} vehicles ({natural_gas} natural gas) to {csv_path} and {parquet_path}",
        rows.len()
    );
    Ok(())
}
