use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// CoreSchema – declared column layout
// ---------------------------------------------------------------------------

/// Declared column layout of a core dataset.
///
/// Column names are compared after [`normalize_column_name`], so the schema
/// itself is kept in normalized form (see [`CoreSchema::normalize`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoreSchema {
    /// Column holding the core identifier.
    pub core_column: String,
    /// Column holding the sample depth in cm.
    pub depth_column: String,
    /// Explicit species columns. `None` means every non-identity column.
    pub species: Option<Vec<String>>,
    /// Substrings marking aggregate columns (totals, per-mille sums, …)
    /// that are not real species and never count toward richness.
    pub excluded_tokens: Vec<String>,
}

impl Default for CoreSchema {
    fn default() -> Self {
        Self {
            core_column: "testemunho".to_string(),
            depth_column: "amostra".to_string(),
            species: None,
            excluded_tokens: vec!["total".to_string(), "pmp".to_string()],
        }
    }
}

impl CoreSchema {
    /// Bring every declared name into the normalized column-name form.
    pub fn normalize(&mut self) {
        self.core_column = normalize_column_name(&self.core_column);
        self.depth_column = normalize_column_name(&self.depth_column);
        if let Some(species) = &mut self.species {
            for name in species.iter_mut() {
                *name = normalize_column_name(name);
            }
        }
        for token in self.excluded_tokens.iter_mut() {
            *token = normalize_column_name(token);
        }
    }

    /// Whether a species column is an aggregate rather than a real species.
    pub fn is_excluded(&self, species: &str) -> bool {
        let lower = species.to_lowercase();
        self.excluded_tokens
            .iter()
            .any(|token| !token.is_empty() && lower.contains(token.as_str()))
    }

    /// Resolve the species catalog from a normalized header row.
    ///
    /// Returns `(catalog, missing)`, where `missing` lists declared species
    /// absent from the header.
    pub fn resolve_species(&self, headers: &[String]) -> (Vec<String>, Vec<String>) {
        match &self.species {
            Some(declared) => {
                let (present, missing): (Vec<String>, Vec<String>) =
                    declared.iter().cloned().partition(|s| headers.contains(s));
                (present, missing)
            }
            None => {
                let catalog = headers
                    .iter()
                    .filter(|h| **h != self.core_column && **h != self.depth_column)
                    .cloned()
                    .collect();
                (catalog, Vec::new())
            }
        }
    }
}

/// Lowercase and trim a column header.
pub fn normalize_column_name(name: &str) -> String {
    name.trim().to_lowercase()
}

// ---------------------------------------------------------------------------
// SampleRecord – one row of the source table
// ---------------------------------------------------------------------------

/// A single sample: one (core, depth) pair with its abundance counts.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleRecord {
    pub core_id: String,
    /// Depth in cm.
    pub depth: f64,
    /// One value per catalog species, same order as [`CoreDataset::species`].
    pub abundances: Vec<f64>,
}

// ---------------------------------------------------------------------------
// CoreDataset – the complete loaded dataset
// ---------------------------------------------------------------------------

/// The full parsed dataset with pre-computed indices.
#[derive(Debug, Clone)]
pub struct CoreDataset {
    pub schema: CoreSchema,
    /// All samples in source order.
    pub samples: Vec<SampleRecord>,
    /// Species catalog in header order.
    pub species: Vec<String>,
    /// Sorted set of core identifiers.
    pub cores: BTreeSet<String>,
    species_index: BTreeMap<String, usize>,
}

impl CoreDataset {
    /// Build indices from parsed samples.
    ///
    /// Every sample must carry exactly `species.len()` abundances.
    pub fn new(schema: CoreSchema, species: Vec<String>, samples: Vec<SampleRecord>) -> Self {
        let cores = samples.iter().map(|s| s.core_id.clone()).collect();
        let species_index = species
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();
        CoreDataset {
            schema,
            samples,
            species,
            cores,
            species_index,
        }
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Column position of a species in the catalog.
    pub fn species_position(&self, species: &str) -> Option<usize> {
        self.species_index.get(species).copied()
    }

    pub fn has_species(&self, species: &str) -> bool {
        self.species_index.contains_key(species)
    }

    /// Catalog species that count toward richness.
    pub fn richness_species(&self) -> Vec<usize> {
        self.species
            .iter()
            .enumerate()
            .filter(|(_, name)| !self.schema.is_excluded(name))
            .map(|(i, _)| i)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn catalog_defaults_to_non_identity_columns() {
        let schema = CoreSchema::default();
        let (catalog, missing) =
            schema.resolve_species(&headers(&["testemunho", "amostra", "c. pelagicus", "total"]));
        assert_eq!(catalog, headers(&["c. pelagicus", "total"]));
        assert!(missing.is_empty());
    }

    #[test]
    fn declared_species_report_missing_columns() {
        let schema = CoreSchema {
            species: Some(headers(&["a", "zz"])),
            ..CoreSchema::default()
        };
        let (catalog, missing) = schema.resolve_species(&headers(&["testemunho", "amostra", "a", "b"]));
        assert_eq!(catalog, headers(&["a"]));
        assert_eq!(missing, headers(&["zz"]));
    }

    #[test]
    fn aggregate_columns_are_excluded_from_richness() {
        let schema = CoreSchema::default();
        assert!(schema.is_excluded("total nanno"));
        assert!(schema.is_excluded("PMP"));
        assert!(!schema.is_excluded("e. huxleyi"));

        let ds = CoreDataset::new(
            schema,
            headers(&["e. huxleyi", "total", "g. oceanica"]),
            Vec::new(),
        );
        assert_eq!(ds.richness_species(), vec![0, 2]);
    }

    #[test]
    fn normalize_column_name_trims_and_lowercases() {
        assert_eq!(normalize_column_name("  Amostra "), "amostra");
    }
}
