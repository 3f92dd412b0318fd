/// Data layer: core types, loading, and filtering.
///
/// Architecture:
/// ```text
///  URL / .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  fetch / parse → CoreDataset (declared CoreSchema)
///   └──────────┘
///        │
///        ▼
///   ┌─────────────┐
///   │ CoreDataset  │  Vec<SampleRecord>, species catalog, core set
///   └─────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  core set + depth interval → filtered indices
///   └──────────┘
/// ```

pub mod loader;
pub mod model;
pub mod filter;

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::BTreeSet;

    use super::model::{CoreDataset, CoreSchema, SampleRecord};

    pub fn cores(ids: &[&str]) -> BTreeSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    /// Cores A and B, depths 1..=5 each, species `x`, `y` and an aggregate
    /// `total` column. `x` occurs only in core A, at depths 2 and 4.
    pub fn example_dataset() -> CoreDataset {
        let x_a = [0.0, 5.0, 0.0, 3.0, 0.0];
        let y_a = [1.0, 0.0, 0.0, 0.0, 2.0];
        let y_b = [0.0, 1.0, 1.0, 0.0, 0.0];

        let mut samples = Vec::new();
        for (core, xs, ys) in [("A", x_a, y_a), ("B", [0.0; 5], y_b)] {
            for depth in 1..=5 {
                let x = xs[depth - 1];
                let y = ys[depth - 1];
                samples.push(SampleRecord {
                    core_id: core.to_string(),
                    depth: depth as f64,
                    abundances: vec![x, y, x + y],
                });
            }
        }
        CoreDataset::new(
            CoreSchema::default(),
            vec!["x".to_string(), "y".to_string(), "total".to_string()],
            samples,
        )
    }
}
