use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, AsArray};
use arrow::datatypes::{DataType, Float32Type, Float64Type, Int32Type, Int64Type};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{Dataset, FuelType, Record};
use crate::config::{
    COL_CO2, COL_CYLINDERS, COL_ENGINE_SIZE, COL_FUEL_CONSUMPTION, COL_FUEL_TYPE, COL_MAKE,
    COL_MODEL, COL_VEHICLE_CLASS,
};
use crate::error::EmissionError;

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a vehicle dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row with the fixed column names (primary format)
/// * `.json`    – `[{ "Engine Size(L)": 2.0, "Fuel Type": "X", ... }, ...]`
/// * `.parquet` – flat table with the same column names
///
/// Fuel codes are decoded into [`FuelType`] labels and Natural Gas rows are
/// dropped. Any failure is reported as [`EmissionError::DataLoad`].
pub fn load_file(path: &Path) -> Result<Dataset, EmissionError> {
    load_any(path).map_err(|e| {
        log::error!("Failed to load {}: {e:#}", path.display());
        EmissionError::DataLoad {
            path: path.to_path_buf(),
            reason: format!("{e:#}"),
        }
    })
}

fn load_any(path: &Path) -> Result<Dataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let rows = match ext.as_str() {
        "csv" => load_csv(path)?,
        "json" => load_json(path)?,
        "parquet" | "pq" => load_parquet(path)?,
        other => bail!("Unsupported file extension: .{other}"),
    };

    finalize(rows)
}

// ---------------------------------------------------------------------------
// Raw rows shared by every format
// ---------------------------------------------------------------------------

/// A row as read from the source, before fuel codes are decoded.
#[derive(Debug, Clone)]
struct RawRow {
    make: Option<String>,
    model: Option<String>,
    vehicle_class: Option<String>,
    engine_size_l: f64,
    cylinders: f64,
    fuel_code: String,
    fuel_consumption_comb: f64,
    co2_g_per_km: f64,
}

/// Decode fuel codes, check numeric ranges and drop Natural Gas rows.
fn finalize(rows: Vec<RawRow>) -> Result<Dataset> {
    let total = rows.len();
    let mut records = Vec::with_capacity(total);

    for (row_no, raw) in rows.into_iter().enumerate() {
        let fuel_type = FuelType::from_code(&raw.fuel_code).with_context(|| {
            format!("Row {row_no}: unknown fuel type code '{}'", raw.fuel_code)
        })?;

        require_positive(raw.engine_size_l, row_no, COL_ENGINE_SIZE)?;
        require_positive(raw.fuel_consumption_comb, row_no, COL_FUEL_CONSUMPTION)?;
        require_positive(raw.co2_g_per_km, row_no, COL_CO2)?;
        let cylinders = whole_number(raw.cylinders, row_no)?;

        if fuel_type == FuelType::NaturalGas {
            continue;
        }

        records.push(Record {
            make: raw.make,
            model: raw.model,
            vehicle_class: raw.vehicle_class,
            engine_size_l: raw.engine_size_l,
            cylinders,
            fuel_consumption_comb: raw.fuel_consumption_comb,
            fuel_type,
            co2_g_per_km: raw.co2_g_per_km,
        });
    }

    log::info!(
        "Loaded {} vehicle records ({} Natural Gas rows dropped)",
        records.len(),
        total - records.len()
    );
    Ok(Dataset::from_records(records))
}

fn require_positive(value: f64, row: usize, col: &str) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        bail!("Row {row}, '{col}': expected a positive number, got {value}");
    }
    Ok(())
}

fn whole_number(value: f64, row: usize) -> Result<u32> {
    if !value.is_finite() || value < 1.0 || value.fract() != 0.0 || value > u32::MAX as f64 {
        bail!("Row {row}, '{COL_CYLINDERS}': expected a positive whole number, got {value}");
    }
    Ok(value as u32)
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, one vehicle per line.
/// Unknown columns (transmission, city/highway consumption, ...) are ignored.
fn load_csv(path: &Path) -> Result<Vec<RawRow>> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let position = |name: &str| headers.iter().position(|h| h == name);
    let required = |name: &str| position(name).with_context(|| format!("CSV missing '{name}' column"));

    let engine_idx = required(COL_ENGINE_SIZE)?;
    let cyl_idx = required(COL_CYLINDERS)?;
    let fuel_idx = required(COL_FUEL_TYPE)?;
    let cons_idx = required(COL_FUEL_CONSUMPTION)?;
    let co2_idx = required(COL_CO2)?;
    let make_idx = position(COL_MAKE);
    let model_idx = position(COL_MODEL);
    let class_idx = position(COL_VEHICLE_CLASS);

    let mut rows = Vec::new();

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        let cell = |idx: usize| record.get(idx).unwrap_or("");
        let text = |idx: Option<usize>| idx.and_then(|i| non_empty(cell(i)));

        rows.push(RawRow {
            make: text(make_idx),
            model: text(model_idx),
            vehicle_class: text(class_idx),
            engine_size_l: parse_number(cell(engine_idx), row_no, COL_ENGINE_SIZE)?,
            cylinders: parse_number(cell(cyl_idx), row_no, COL_CYLINDERS)?,
            fuel_code: cell(fuel_idx).trim().to_string(),
            fuel_consumption_comb: parse_number(cell(cons_idx), row_no, COL_FUEL_CONSUMPTION)?,
            co2_g_per_km: parse_number(cell(co2_idx), row_no, COL_CO2)?,
        });
    }

    Ok(rows)
}

fn parse_number(s: &str, row: usize, col: &str) -> Result<f64> {
    s.trim()
        .parse::<f64>()
        .with_context(|| format!("Row {row}, '{col}': '{s}' is not a number"))
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   {
///     "Make": "ACURA",
///     "Engine Size(L)": 2.0,
///     "Cylinders": 4,
///     "Fuel Type": "Z",
///     "Fuel Consumption Comb (L/100 km)": 8.5,
///     "CO2 Emissions(g/km)": 196
///   },
///   ...
/// ]
/// ```
fn load_json(path: &Path) -> Result<Vec<RawRow>> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root
        .as_array()
        .context("Expected top-level JSON array")?;

    let mut rows = Vec::with_capacity(records.len());

    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;

        let number = |col: &str| -> Result<f64> {
            let val = obj
                .get(col)
                .with_context(|| format!("Row {i}: missing '{col}'"))?;
            match val {
                JsonValue::Number(n) => n.as_f64(),
                JsonValue::String(s) => s.trim().parse::<f64>().ok(),
                _ => None,
            }
            .with_context(|| format!("Row {i}, '{col}': not a number"))
        };
        let text = |col: &str| obj.get(col).and_then(JsonValue::as_str).and_then(non_empty);

        let fuel_code = obj
            .get(COL_FUEL_TYPE)
            .and_then(JsonValue::as_str)
            .with_context(|| format!("Row {i}: missing or invalid '{COL_FUEL_TYPE}'"))?
            .trim()
            .to_string();

        rows.push(RawRow {
            make: text(COL_MAKE),
            model: text(COL_MODEL),
            vehicle_class: text(COL_VEHICLE_CLASS),
            engine_size_l: number(COL_ENGINE_SIZE)?,
            cylinders: number(COL_CYLINDERS)?,
            fuel_code,
            fuel_consumption_comb: number(COL_FUEL_CONSUMPTION)?,
            co2_g_per_km: number(COL_CO2)?,
        });
    }

    Ok(rows)
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with one vehicle per row.
///
/// Numeric columns may be Float64, Float32, Int64 or Int32 (Pandas writes
/// integer-valued columns such as `Cylinders` as Int64). Text columns are
/// Utf8 or LargeUtf8.
fn load_parquet(path: &Path) -> Result<Vec<RawRow>> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();
    let mut offset = 0;

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        let required = |name: &str| {
            schema
                .index_of(name)
                .map(|i| batch.column(i).clone())
                .map_err(|_| anyhow::anyhow!("Parquet file missing '{name}' column"))
        };
        let optional = |name: &str| schema.index_of(name).ok().map(|i| batch.column(i).clone());

        let engine = required(COL_ENGINE_SIZE)?;
        let cylinders = required(COL_CYLINDERS)?;
        let fuel = required(COL_FUEL_TYPE)?;
        let consumption = required(COL_FUEL_CONSUMPTION)?;
        let co2 = required(COL_CO2)?;
        let make = optional(COL_MAKE);
        let model = optional(COL_MODEL);
        let class = optional(COL_VEHICLE_CLASS);

        for row in 0..batch.num_rows() {
            let row_no = offset + row;
            let text = |col: &Option<Arc<dyn Array>>| {
                col.as_ref().and_then(|c| extract_string(c, row)).and_then(|s| non_empty(&s))
            };

            rows.push(RawRow {
                make: text(&make),
                model: text(&model),
                vehicle_class: text(&class),
                engine_size_l: extract_f64(&engine, row)
                    .with_context(|| format!("Row {row_no}, '{COL_ENGINE_SIZE}'"))?,
                cylinders: extract_f64(&cylinders, row)
                    .with_context(|| format!("Row {row_no}, '{COL_CYLINDERS}'"))?,
                fuel_code: extract_string(&fuel, row)
                    .with_context(|| format!("Row {row_no}: missing '{COL_FUEL_TYPE}'"))?,
                fuel_consumption_comb: extract_f64(&consumption, row)
                    .with_context(|| format!("Row {row_no}, '{COL_FUEL_CONSUMPTION}'"))?,
                co2_g_per_km: extract_f64(&co2, row)
                    .with_context(|| format!("Row {row_no}, '{COL_CO2}'"))?,
            });
        }

        offset += batch.num_rows();
    }

    Ok(rows)
}

// -- Parquet / Arrow helpers --

/// Extract a numeric cell as `f64`.
fn extract_f64(col: &Arc<dyn Array>, row: usize) -> Result<f64> {
    if col.is_null(row) {
        bail!("null value in numeric column");
    }
    let value = match col.data_type() {
        DataType::Float64 => col.as_primitive_opt::<Float64Type>().map(|a| a.value(row)),
        DataType::Float32 => col
            .as_primitive_opt::<Float32Type>()
            .map(|a| a.value(row) as f64),
        DataType::Int64 => col.as_primitive_opt::<Int64Type>().map(|a| a.value(row) as f64),
        DataType::Int32 => col.as_primitive_opt::<Int32Type>().map(|a| a.value(row) as f64),
        other => bail!("Expected a numeric column, got {other:?}"),
    };
    value.context("column does not match its declared type")
}

/// Extract a text cell. Nulls and non-text columns yield `None`.
fn extract_string(col: &Arc<dyn Array>, row: usize) -> Option<String> {
    if col.is_null(row) {
        return None;
    }
    match col.data_type() {
        DataType::Utf8 => col.as_string_opt::<i32>().map(|s| s.value(row).to_string()),
        DataType::LargeUtf8 => col.as_string_opt::<i64>().map(|s| s.value(row).to_string()),
        _ => None,
    }
}
