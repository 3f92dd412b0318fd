use std::io::Read;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{DataType, Float64Type};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{CoreDataset, CoreSchema, SampleRecord, normalize_column_name};

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load a core dataset from a URL or a local path.
///
/// `http://` and `https://` sources are fetched and parsed as CSV; anything
/// else is treated as a file path (see [`load_file`]).
pub fn load_source(source: &str, schema: &CoreSchema, timeout: Duration) -> Result<CoreDataset> {
    if is_remote(source) {
        let text = fetch_remote(source, timeout)?;
        parse_csv(text.as_bytes(), schema).with_context(|| format!("parsing CSV from {source}"))
    } else {
        load_file(Path::new(source), schema)
    }
}

pub fn is_remote(source: &str) -> bool {
    let lower = source.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Load a core dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row, one sample per row (recommended)
/// * `.json`    – `[{ "testemunho": "KF-16", "amostra": 12, ...species }, ...]`
/// * `.parquet` – flat table with the same columns as the CSV layout
pub fn load_file(path: &Path, schema: &CoreSchema) -> Result<CoreDataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" => {
            let file = std::fs::File::open(path)
                .with_context(|| format!("opening CSV {}", path.display()))?;
            parse_csv(file, schema)
        }
        "json" => {
            let text = std::fs::read_to_string(path).context("reading JSON file")?;
            parse_json(&text, schema)
        }
        "parquet" | "pq" => load_parquet(path, schema),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

// ---------------------------------------------------------------------------
// HTTP fetch
// ---------------------------------------------------------------------------

fn fetch_remote(url: &str, timeout: Duration) -> Result<String> {
    log::info!("Fetching {url}");
    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()
        .context("building HTTP client")?;
    let response = client
        .get(url)
        .send()
        .with_context(|| format!("requesting {url}"))?
        .error_for_status()
        .with_context(|| format!("fetching {url}"))?;
    response
        .text()
        .with_context(|| format!("reading response body from {url}"))
}

// ---------------------------------------------------------------------------
// Row assembly shared by all formats
// ---------------------------------------------------------------------------

/// A raw cell as it comes out of a file format, before schema typing.
#[derive(Debug, Clone, PartialEq)]
enum Cell {
    Text(String),
    Number(f64),
    Missing,
}

static MISSING: Cell = Cell::Missing;

/// Maps raw rows onto the declared schema and collects [`SampleRecord`]s.
struct SampleAssembler {
    schema: CoreSchema,
    species: Vec<String>,
    core_idx: usize,
    depth_idx: usize,
    species_idx: Vec<usize>,
    samples: Vec<SampleRecord>,
    dropped: usize,
}

impl SampleAssembler {
    fn new(schema: &CoreSchema, raw_headers: &[String]) -> Result<Self> {
        let headers: Vec<String> = raw_headers.iter().map(|h| normalize_column_name(h)).collect();
        let position = |name: &str| headers.iter().position(|h| h == name);

        let core_idx = position(&schema.core_column)
            .with_context(|| format!("missing core column '{}'", schema.core_column))?;
        let depth_idx = position(&schema.depth_column)
            .with_context(|| format!("missing depth column '{}'", schema.depth_column))?;

        let (species, missing) = schema.resolve_species(&headers);
        if !missing.is_empty() {
            bail!("missing species columns: {}", missing.join(", "));
        }
        let species_idx = species
            .iter()
            .filter_map(|name| position(name))
            .collect();

        Ok(SampleAssembler {
            schema: schema.clone(),
            species,
            core_idx,
            depth_idx,
            species_idx,
            samples: Vec::new(),
            dropped: 0,
        })
    }

    /// Add one row. Rows without a core id or a numeric depth are dropped.
    fn push(&mut self, row_no: usize, cells: &[Cell]) -> Result<()> {
        let cell = |idx: usize| cells.get(idx).unwrap_or(&MISSING);

        let core_id = core_value(cell(self.core_idx));
        let depth = depth_value(cell(self.depth_idx));
        let (Some(core_id), Some(depth)) = (core_id, depth) else {
            self.dropped += 1;
            return Ok(());
        };

        let abundances = self
            .species_idx
            .iter()
            .zip(&self.species)
            .map(|(&idx, name)| {
                abundance_value(cell(idx))
                    .with_context(|| format!("row {row_no}, column '{name}'"))
            })
            .collect::<Result<Vec<f64>>>()?;

        self.samples.push(SampleRecord {
            core_id,
            depth,
            abundances,
        });
        Ok(())
    }

    fn finish(self) -> CoreDataset {
        if self.dropped > 0 {
            log::warn!(
                "Dropped {} rows without a core id or numeric depth",
                self.dropped
            );
        }
        CoreDataset::new(self.schema, self.species, self.samples)
    }
}

fn core_value(cell: &Cell) -> Option<String> {
    match cell {
        Cell::Text(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Cell::Number(n) if n.is_finite() => {
            if n.fract() == 0.0 {
                Some(format!("{n:.0}"))
            } else {
                Some(n.to_string())
            }
        }
        _ => None,
    }
}

fn depth_value(cell: &Cell) -> Option<f64> {
    let depth = match cell {
        Cell::Number(n) => *n,
        Cell::Text(s) => s.trim().parse::<f64>().ok()?,
        Cell::Missing => return None,
    };
    depth.is_finite().then_some(depth)
}

/// Empty cells count as zero; text that is not a number is an error.
fn abundance_value(cell: &Cell) -> Result<f64> {
    match cell {
        Cell::Missing => Ok(0.0),
        Cell::Number(n) if n.is_nan() => Ok(0.0),
        Cell::Number(n) => Ok(*n),
        Cell::Text(s) => {
            let s = s.trim();
            if s.is_empty() || s.eq_ignore_ascii_case("nan") {
                return Ok(0.0);
            }
            s.parse::<f64>()
                .with_context(|| format!("'{s}' is not a number"))
        }
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, one sample per row.
/// Header names are normalized before they are matched against the schema.
pub fn parse_csv<R: Read>(input: R, schema: &CoreSchema) -> Result<CoreDataset> {
    let mut reader = csv::Reader::from_reader(input);
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut assembler = SampleAssembler::new(schema, &headers)?;

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        let cells: Vec<Cell> = record
            .iter()
            .map(|value| {
                if value.trim().is_empty() {
                    Cell::Missing
                } else {
                    Cell::Text(value.to_string())
                }
            })
            .collect();
        assembler.push(row_no, &cells)?;
    }

    Ok(assembler.finish())
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "testemunho": "KF-16", "amostra": 10, "e. huxleyi": 4.2, ... },
///   ...
/// ]
/// ```
pub fn parse_json(text: &str, schema: &CoreSchema) -> Result<CoreDataset> {
    let root: JsonValue = serde_json::from_str(text).context("parsing JSON")?;

    let records = root
        .as_array()
        .context("Expected top-level JSON array")?;

    let mut headers: Vec<String> = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        for key in obj.keys() {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
        }
    }

    let mut assembler = SampleAssembler::new(schema, &headers)?;

    for (i, rec) in records.iter().enumerate() {
        let Some(obj) = rec.as_object() else {
            continue;
        };
        let cells: Vec<Cell> = headers
            .iter()
            .map(|key| obj.get(key).map(json_to_cell).unwrap_or(Cell::Missing))
            .collect();
        assembler.push(i, &cells)?;
    }

    Ok(assembler.finish())
}

fn json_to_cell(val: &JsonValue) -> Cell {
    match val {
        JsonValue::String(s) if s.trim().is_empty() => Cell::Missing,
        JsonValue::String(s) => Cell::Text(s.clone()),
        JsonValue::Number(n) => n.as_f64().map(Cell::Number).unwrap_or(Cell::Missing),
        JsonValue::Bool(b) => Cell::Text(b.to_string()),
        JsonValue::Null => Cell::Missing,
        other => Cell::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file holding one sample per row.
///
/// String columns are read as text; every numeric column is cast to Float64.
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path, schema: &CoreSchema) -> Result<CoreDataset> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let headers: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut assembler = SampleAssembler::new(schema, &headers)?;
    let mut row_offset = 0;

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let columns = batch
            .columns()
            .iter()
            .zip(&headers)
            .map(|(col, name)| {
                column_cells(col).with_context(|| format!("reading column '{name}'"))
            })
            .collect::<Result<Vec<Vec<Cell>>>>()?;

        for row in 0..batch.num_rows() {
            let cells: Vec<Cell> = columns.iter().map(|col| col[row].clone()).collect();
            assembler.push(row_offset + row, &cells)?;
        }
        row_offset += batch.num_rows();
    }

    Ok(assembler.finish())
}

// -- Parquet / Arrow helpers --

/// Turn an Arrow column into raw cells.
fn column_cells(col: &ArrayRef) -> Result<Vec<Cell>> {
    let cells = match col.data_type() {
        DataType::Utf8 => col
            .as_string::<i32>()
            .iter()
            .map(|v| v.map(|s| Cell::Text(s.to_string())).unwrap_or(Cell::Missing))
            .collect(),
        DataType::LargeUtf8 => col
            .as_string::<i64>()
            .iter()
            .map(|v| v.map(|s| Cell::Text(s.to_string())).unwrap_or(Cell::Missing))
            .collect(),
        dt if dt.is_numeric() => {
            let floats = arrow::compute::cast(col, &DataType::Float64)
                .context("casting numeric column to Float64")?;
            floats
                .as_primitive::<Float64Type>()
                .iter()
                .map(|v| v.map(Cell::Number).unwrap_or(Cell::Missing))
                .collect()
        }
        DataType::Null => vec![Cell::Missing; col.len()],
        other => bail!("unsupported column type {other:?}"),
    };
    Ok(cells)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
 Testemunho ,Amostra,E. Huxleyi,Total
KF-16,10,3,3
KF-16,20,,0
,30,1,1
KF-18,abc,2,2
KF-18,15,0.5,0.5
";

    #[test]
    fn csv_headers_are_normalized_and_bad_rows_dropped() {
        let ds = parse_csv(CSV.as_bytes(), &CoreSchema::default()).unwrap();
        assert_eq!(ds.species, vec!["e. huxleyi".to_string(), "total".to_string()]);
        assert_eq!(ds.len(), 3);
        assert_eq!(
            ds.cores.iter().cloned().collect::<Vec<_>>(),
            vec!["KF-16".to_string(), "KF-18".to_string()]
        );
        // Empty abundance cells read as zero.
        assert_eq!(ds.samples[1].abundances, vec![0.0, 0.0]);
        assert_eq!(ds.samples[2].depth, 15.0);
    }

    #[test]
    fn missing_depth_column_is_a_load_error() {
        let err = parse_csv("testemunho,x\nA,1\n".as_bytes(), &CoreSchema::default()).unwrap_err();
        assert!(format!("{err:#}").contains("amostra"));
    }

    #[test]
    fn non_numeric_abundance_is_a_load_error() {
        let err = parse_csv(
            "testemunho,amostra,x\nA,1,lots\n".as_bytes(),
            &CoreSchema::default(),
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("'x'"));
    }

    #[test]
    fn json_records_keep_column_order() {
        let text = r#"[
            {"testemunho": "KF-16", "amostra": 5, "b": 1, "a": 0},
            {"testemunho": 18, "amostra": 6.5, "b": null, "a": 2}
        ]"#;
        let ds = parse_json(text, &CoreSchema::default()).unwrap();
        assert_eq!(ds.species, vec!["b".to_string(), "a".to_string()]);
        assert_eq!(ds.samples[1].core_id, "18");
        assert_eq!(ds.samples[1].abundances, vec![0.0, 2.0]);
    }

    #[test]
    fn remote_sources_are_recognized() {
        assert!(is_remote("https://example.org/data.csv"));
        assert!(is_remote("HTTP://example.org/data.csv"));
        assert!(!is_remote("data/cores.csv"));
    }
}
