use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

/// Species with the depth interval (cm) they occur in, per core:
/// `(name, [(top, base) for KF-16, (top, base) for KF-18], peak abundance)`.
const SPECIES: [(&str, [(f64, f64); 2], f64); 5] = [
    ("e. huxleyi", [(0.0, 120.0), (0.0, 95.0)], 45.0),
    ("g. oceanica", [(40.0, 260.0), (30.0, 210.0)], 30.0),
    ("c. pelagicus", [(0.0, 400.0), (0.0, 360.0)], 12.0),
    ("h. carteri", [(150.0, 330.0), (120.0, 300.0)], 8.0),
    ("p. lacunosa", [(280.0, 400.0), (250.0, 360.0)], 6.0),
];

/// `(core id, base depth, sampling step)` in cm.
const CORES: [(&str, f64, f64); 2] = [("KF-16", 400.0, 10.0), ("KF-18", 360.0, 8.0)];

/// Bell-shaped abundance inside `[top, base]`, zero outside.
fn abundance(depth: f64, top: f64, base: f64, peak: f64) -> f64 {
    if depth < top || depth > base {
        return 0.0;
    }
    let mid = (top + base) / 2.0;
    let half = ((base - top) / 2.0).max(1.0);
    let z = (depth - mid) / half;
    peak * (-2.0 * z * z).exp()
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in s.iter_mut() {
            // splitmix64
            x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
            let mut z = x;
            z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
            z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
            *slot = z ^ (z >> 31);
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }
}

struct Table {
    cores: Vec<String>,
    depths: Vec<f64>,
    /// One column per species, then `total nanno` and `pmp`.
    columns: Vec<Vec<f64>>,
    names: Vec<String>,
}

fn generate(rng: &mut SimpleRng) -> Table {
    let mut names: Vec<String> = SPECIES.iter().map(|(n, _, _)| n.to_string()).collect();
    names.push("total nanno".to_string());
    names.push("pmp".to_string());

    let mut table = Table {
        cores: Vec::new(),
        depths: Vec::new(),
        columns: vec![Vec::new(); names.len()],
        names,
    };

    for (core_no, &(core, base, step)) in CORES.iter().enumerate() {
        let mut depth = 0.0;
        while depth <= base {
            let mut total = 0.0;
            for (col, &(_, ranges, peak)) in SPECIES.iter().enumerate() {
                let (top, bottom) = ranges[core_no];
                let mut value = abundance(depth, top, bottom, peak);
                // Rare species are sometimes missed in a count.
                if value > 0.0 && rng.next_f64() < 0.15 {
                    value = 0.0;
                }
                let value = (value * (0.8 + 0.4 * rng.next_f64()) * 10.0).round() / 10.0;
                total += value;
                table.columns[col].push(value);
            }
            let n = SPECIES.len();
            table.columns[n].push((total * 10.0).round() / 10.0);
            table.columns[n + 1].push((rng.next_f64() * 40.0).round());

            table.cores.push(core.to_string());
            table.depths.push(depth);
            depth += step;
        }
    }
    table
}

fn write_csv(table: &Table, path: &str) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("creating {path}"))?;
    let mut header = vec!["Testemunho".to_string(), "Amostra".to_string()];
    header.extend(table.names.iter().cloned());
    writer.write_record(&header)?;

    for row in 0..table.depths.len() {
        let mut record = vec![table.cores[row].clone(), table.depths[row].to_string()];
        record.extend(table.columns.iter().map(|col| col[row].to_string()));
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(table: &Table, path: &str) -> Result<()> {
    let mut fields = vec![
        Field::new("testemunho", DataType::Utf8, false),
        Field::new("amostra", DataType::Float64, false),
    ];
    fields.extend(
        table
            .names
            .iter()
            .map(|name| Field::new(name, DataType::Float64, false)),
    );
    let schema = Arc::new(Schema::new(fields));

    let mut arrays: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from(
            table.cores.iter().map(|s| s.as_str()).collect::<Vec<_>>(),
        )),
        Arc::new(Float64Array::from(table.depths.clone())),
    ];
    arrays.extend(
        table
            .columns
            .iter()
            .map(|col| Arc::new(Float64Array::from(col.clone())) as ArrayRef),
    );

    let batch = RecordBatch::try_new(schema.clone(), arrays).context("building record batch")?;

    let file = std::fs::File::create(path).with_context(|| format!("creating {path}"))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let table = generate(&mut rng);

    write_csv(&table, "sample_cores.csv")?;
    write_parquet(&table, "sample_cores.parquet")?;

    println!(
        "Wrote {} samples from {} cores ({} species columns) to sample_cores.csv / .parquet",
        table.depths.len(),
        CORES.len(),
        table.names.len()
    );
    Ok(())
}
