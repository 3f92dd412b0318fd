use std::collections::BTreeSet;

use thiserror::Error;

use super::model::CoreDataset;

// ---------------------------------------------------------------------------
// Depth interval
// ---------------------------------------------------------------------------

/// Closed depth interval `[min, max]` in cm.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthRange {
    pub min: f64,
    pub max: f64,
}

impl DepthRange {
    pub fn new(min: f64, max: f64) -> Self {
        DepthRange { min, max }
    }

    pub fn contains(&self, depth: f64) -> bool {
        depth >= self.min && depth <= self.max
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    /// Widen to whole centimetres, the resolution of the depth slider.
    pub fn rounded_outward(&self) -> Self {
        DepthRange::new(self.min.floor(), self.max.ceil())
    }

    /// Clamp into `bounds`, keeping `min <= max`.
    pub fn clamped_to(&self, bounds: DepthRange) -> Self {
        let min = self.min.clamp(bounds.min, bounds.max);
        let max = self.max.clamp(min, bounds.max);
        DepthRange::new(min, max)
    }
}

// ---------------------------------------------------------------------------
// Filter predicates
// ---------------------------------------------------------------------------

/// Indices of samples whose core is in `cores`.
///
/// An empty core set selects nothing.
pub fn core_filtered_indices(dataset: &CoreDataset, cores: &BTreeSet<String>) -> Vec<usize> {
    dataset
        .samples
        .iter()
        .enumerate()
        .filter(|(_, s)| cores.contains(&s.core_id))
        .map(|(i, _)| i)
        .collect()
}

/// Indices of samples that pass both the core and the depth predicate.
pub fn filtered_indices(
    dataset: &CoreDataset,
    cores: &BTreeSet<String>,
    range: DepthRange,
) -> Vec<usize> {
    dataset
        .samples
        .iter()
        .enumerate()
        .filter(|(_, s)| cores.contains(&s.core_id) && range.contains(s.depth))
        .map(|(i, _)| i)
        .collect()
}

/// Min/max depth over `rows`, or `None` when there are no rows.
pub fn depth_bounds(dataset: &CoreDataset, rows: &[usize]) -> Option<DepthRange> {
    rows.iter()
        .map(|&i| dataset.samples[i].depth)
        .fold(None, |acc: Option<DepthRange>, d| match acc {
            None => Some(DepthRange::new(d, d)),
            Some(r) => Some(DepthRange::new(r.min.min(d), r.max.max(d))),
        })
}

/// Species whose summed abundance over `rows` is strictly positive,
/// in catalog order.
pub fn available_species(dataset: &CoreDataset, rows: &[usize]) -> Vec<String> {
    dataset
        .species
        .iter()
        .enumerate()
        .filter(|(col, _)| column_sum(dataset, rows, *col) > 0.0)
        .map(|(_, name)| name.clone())
        .collect()
}

pub(crate) fn column_sum(dataset: &CoreDataset, rows: &[usize], col: usize) -> f64 {
    rows.iter()
        .map(|&i| dataset.samples[i].abundances[col])
        .sum()
}

// ---------------------------------------------------------------------------
// Selection – the user's current filter choices
// ---------------------------------------------------------------------------

/// A selection rejected before it reaches the computation pipeline.
#[derive(Debug, Error, PartialEq)]
pub enum SelectionError {
    #[error("unknown species: {0}")]
    UnknownSpecies(String),

    #[error("unknown core: {0}")]
    UnknownCore(String),

    #[error("depth range is inverted: {min} > {max}")]
    InvertedDepthRange { min: f64, max: f64 },
}

/// Filter choices driving one pass of the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub cores: BTreeSet<String>,
    pub depth: DepthRange,
    /// Species drawn as profile panels, in panel order.
    pub display_species: Vec<String>,
    /// Species whose FAD/LAD are drawn as marker lines.
    pub horizon_species: Vec<String>,
}

/// Number of species displayed by default.
const DEFAULT_DISPLAY_COUNT: usize = 3;

impl Selection {
    /// Everything selected: all cores, the full depth range, the first few
    /// available species displayed and no marker lines.
    pub fn initial(dataset: &CoreDataset) -> Self {
        let cores = dataset.cores.clone();
        let rows = core_filtered_indices(dataset, &cores);
        let depth = depth_bounds(dataset, &rows)
            .map(|r| r.rounded_outward())
            .unwrap_or(DepthRange::new(0.0, 0.0));
        let display_species = available_species(dataset, &rows)
            .into_iter()
            .take(DEFAULT_DISPLAY_COUNT)
            .collect();

        Selection {
            cores,
            depth,
            display_species,
            horizon_species: Vec::new(),
        }
    }

    /// Rows inside the selected cores, ignoring the depth interval.
    pub fn core_rows(&self, dataset: &CoreDataset) -> Vec<usize> {
        core_filtered_indices(dataset, &self.cores)
    }

    /// Slider bounds for the current core set.
    pub fn depth_limits(&self, dataset: &CoreDataset) -> Option<DepthRange> {
        depth_bounds(dataset, &self.core_rows(dataset)).map(|r| r.rounded_outward())
    }

    /// Species offered in the species pickers for the current core set.
    ///
    /// Availability is judged on the core window, before the depth filter.
    pub fn species_choices(&self, dataset: &CoreDataset) -> Vec<String> {
        available_species(dataset, &self.core_rows(dataset))
    }

    /// Re-fit the selection after the core set changed: clamp the depth range
    /// into the new bounds and drop species that are no longer offered.
    pub fn clamp_to(&mut self, dataset: &CoreDataset) {
        if let Some(limits) = self.depth_limits(dataset) {
            self.depth = self.depth.clamped_to(limits);
        }
        let choices = self.species_choices(dataset);
        self.display_species.retain(|s| choices.contains(s));
        self.horizon_species.retain(|s| choices.contains(s));
    }

    /// Reject selections that name things the dataset does not have.
    pub fn validate(&self, dataset: &CoreDataset) -> Result<(), SelectionError> {
        if self.depth.min > self.depth.max {
            return Err(SelectionError::InvertedDepthRange {
                min: self.depth.min,
                max: self.depth.max,
            });
        }
        if let Some(core) = self.cores.iter().find(|c| !dataset.cores.contains(*c)) {
            return Err(SelectionError::UnknownCore(core.clone()));
        }
        if let Some(species) = self
            .display_species
            .iter()
            .chain(&self.horizon_species)
            .find(|s| !dataset.has_species(s))
        {
            return Err(SelectionError::UnknownSpecies(species.clone()));
        }
        Ok(())
    }

    /// Toggle one species in a species list, keeping catalog order on insert.
    pub fn toggle_species(list: &mut Vec<String>, species: &str, dataset: &CoreDataset) {
        if let Some(pos) = list.iter().position(|s| s == species) {
            list.remove(pos);
            return;
        }
        let rank = |name: &str| dataset.species_position(name).unwrap_or(usize::MAX);
        let at = list
            .iter()
            .position(|s| rank(s) > rank(species))
            .unwrap_or(list.len());
        list.insert(at, species.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::test_support::{cores, example_dataset};

    #[test]
    fn filter_is_sound_and_complete() {
        let ds = example_dataset();
        let selected = cores(&["A"]);
        let range = DepthRange::new(2.0, 4.0);
        let rows = filtered_indices(&ds, &selected, range);

        for (i, s) in ds.samples.iter().enumerate() {
            let passes = selected.contains(&s.core_id) && range.contains(s.depth);
            assert_eq!(rows.contains(&i), passes, "row {i}");
        }
        assert_eq!(rows.len(), 3);
    }

    #[test]
    fn empty_core_set_selects_nothing() {
        let ds = example_dataset();
        let rows = filtered_indices(&ds, &BTreeSet::new(), DepthRange::new(0.0, 100.0));
        assert!(rows.is_empty());
        assert_eq!(depth_bounds(&ds, &rows), None);
    }

    #[test]
    fn initial_selection_covers_everything() {
        let ds = example_dataset();
        let sel = Selection::initial(&ds);
        assert_eq!(sel.cores, cores(&["A", "B"]));
        assert_eq!(sel.depth, DepthRange::new(1.0, 5.0));
        assert_eq!(sel.display_species, ["x", "y", "total"]);
        assert!(sel.horizon_species.is_empty());
    }

    #[test]
    fn species_availability_follows_core_window() {
        let ds = example_dataset();
        let mut sel = Selection::initial(&ds);
        // Species x only occurs in core A.
        sel.cores = cores(&["B"]);
        assert_eq!(sel.species_choices(&ds), ["y", "total"]);

        sel.horizon_species = vec!["x".to_string()];
        sel.clamp_to(&ds);
        assert_eq!(sel.display_species, ["y", "total"]);
        assert!(sel.horizon_species.is_empty());
    }

    #[test]
    fn clamp_keeps_range_inside_new_bounds() {
        let r = DepthRange::new(-3.0, 12.0).clamped_to(DepthRange::new(1.0, 5.0));
        assert_eq!(r, DepthRange::new(1.0, 5.0));
        let r = DepthRange::new(7.0, 9.0).clamped_to(DepthRange::new(1.0, 5.0));
        assert_eq!(r, DepthRange::new(5.0, 5.0));
    }

    #[test]
    fn validate_rejects_unknown_names_and_inverted_range() {
        let ds = example_dataset();
        let mut sel = Selection::initial(&ds);
        assert_eq!(sel.validate(&ds), Ok(()));

        sel.horizon_species.push("zz".to_string());
        assert_eq!(
            sel.validate(&ds),
            Err(SelectionError::UnknownSpecies("zz".to_string()))
        );

        let mut sel = Selection::initial(&ds);
        sel.cores.insert("C".to_string());
        assert_eq!(sel.validate(&ds), Err(SelectionError::UnknownCore("C".to_string())));

        let mut sel = Selection::initial(&ds);
        sel.depth = DepthRange::new(4.0, 2.0);
        assert!(matches!(
            sel.validate(&ds),
            Err(SelectionError::InvertedDepthRange { .. })
        ));
    }

    #[test]
    fn toggle_species_keeps_catalog_order() {
        let ds = example_dataset();
        let mut list = vec!["total".to_string()];
        Selection::toggle_species(&mut list, "x", &ds);
        assert_eq!(list, vec!["x".to_string(), "total".to_string()]);
        Selection::toggle_species(&mut list, "total", &ds);
        assert_eq!(list, vec!["x".to_string()]);
    }
}
