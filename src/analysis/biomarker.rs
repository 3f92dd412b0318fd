use std::collections::BTreeMap;
use std::io::Write;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::data::model::CoreDataset;

// ---------------------------------------------------------------------------
// Biomarker (FAD / LAD) records
// ---------------------------------------------------------------------------

/// First and last appearance of one species in one core, within the
/// currently filtered window.
///
/// Depth grows downward, so the first appearance (oldest) is the deepest
/// occurrence and the last appearance (youngest) is the shallowest.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BiomarkerRecord {
    pub species: String,
    #[serde(rename = "core")]
    pub core_id: String,
    /// First Appearance Datum: maximum depth with abundance > 0.
    pub fad: f64,
    /// Last Appearance Datum: minimum depth with abundance > 0.
    pub lad: f64,
}

/// Derive FAD/LAD for every (species, core) pair that occurs in `rows`.
///
/// Records come out species-major, core-minor (cores sorted by id). Pairs
/// without a positive abundance produce no record, and unknown species
/// produce nothing.
pub fn compute_biomarkers(
    dataset: &CoreDataset,
    rows: &[usize],
    species: &[String],
) -> Vec<BiomarkerRecord> {
    let mut records = Vec::new();

    for name in species {
        let Some(col) = dataset.species_position(name) else {
            continue;
        };

        // core id → (lad, fad)
        let mut extents: BTreeMap<&str, (f64, f64)> = BTreeMap::new();
        for &i in rows {
            let sample = &dataset.samples[i];
            if sample.abundances[col] <= 0.0 {
                continue;
            }
            extents
                .entry(sample.core_id.as_str())
                .and_modify(|(lad, fad)| {
                    *lad = lad.min(sample.depth);
                    *fad = fad.max(sample.depth);
                })
                .or_insert((sample.depth, sample.depth));
        }

        records.extend(extents.into_iter().map(|(core, (lad, fad))| BiomarkerRecord {
            species: name.clone(),
            core_id: core.to_string(),
            fad,
            lad,
        }));
    }

    records
}

/// Write records as CSV with a `species,core,fad,lad` header.
pub fn write_biomarkers_csv<W: Write>(records: &[BiomarkerRecord], out: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    for record in records {
        writer.serialize(record).context("writing biomarker row")?;
    }
    writer.flush().context("flushing biomarker CSV")?;
    Ok(())
}
