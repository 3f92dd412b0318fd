use super::biomarker::{BiomarkerRecord, compute_biomarkers};
use super::summary::{SummaryMetrics, compute_summary};
use crate::data::filter::{Selection, filtered_indices};
use crate::data::model::CoreDataset;
use crate::render::plan::RenderPlan;

/// Everything derived from one (dataset, selection) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct PassOutput {
    /// Indices of the samples in the filtered window.
    pub rows: Vec<usize>,
    pub summary: SummaryMetrics,
    /// FAD/LAD of the horizon species within the window.
    pub biomarkers: Vec<BiomarkerRecord>,
    pub plan: RenderPlan,
}

/// Filter, aggregate, derive biomarkers and lay out the charts.
///
/// Only species offered for the current core set are drawn or used for
/// marker lines, so an empty core set yields no panels.
pub fn run_pass(dataset: &CoreDataset, selection: &Selection) -> PassOutput {
    let rows = filtered_indices(dataset, &selection.cores, selection.depth);
    let choices = selection.species_choices(dataset);
    let offered = |list: &[String]| -> Vec<String> {
        list.iter().filter(|s| choices.contains(s)).cloned().collect()
    };
    let display = offered(&selection.display_species);
    let horizons = offered(&selection.horizon_species);

    let summary = compute_summary(dataset, &rows);
    let biomarkers = compute_biomarkers(dataset, &rows, &horizons);
    let plan = RenderPlan::build(dataset, &rows, &display, &biomarkers);

    log::debug!(
        "pass: {} rows, {} panels, {} biomarker records",
        rows.len(),
        plan.panels.len(),
        biomarkers.len()
    );

    PassOutput {
        rows,
        summary,
        biomarkers,
        plan,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::data::filter::DepthRange;
    use crate::data::test_support::{cores, example_dataset};

    #[test]
    fn empty_core_selection_is_degenerate_not_an_error() {
        let ds = example_dataset();
        let mut selection = Selection::initial(&ds);
        selection.cores = BTreeSet::new();
        selection.horizon_species = vec!["x".to_string()];

        let out = run_pass(&ds, &selection);
        assert!(out.rows.is_empty());
        assert_eq!(out.summary, SummaryMetrics::default());
        assert!(out.biomarkers.is_empty());
        assert!(out.plan.is_empty());
    }

    #[test]
    fn repeated_passes_are_identical() {
        let ds = example_dataset();
        let mut selection = Selection::initial(&ds);
        selection.horizon_species = vec!["x".to_string(), "y".to_string()];
        selection.depth = DepthRange::new(2.0, 5.0);

        let first = run_pass(&ds, &selection);
        let second = run_pass(&ds, &selection);
        assert_eq!(first, second);
    }

    #[test]
    fn depth_window_narrows_markers() {
        let ds = example_dataset();
        let selection = Selection {
            cores: cores(&["A", "B"]),
            depth: DepthRange::new(2.0, 3.0),
            display_species: vec!["y".to_string()],
            horizon_species: vec!["x".to_string()],
        };
        let out = run_pass(&ds, &selection);
        assert_eq!(out.rows.len(), 4);
        assert_eq!(out.biomarkers.len(), 1);
        assert_eq!((out.biomarkers[0].fad, out.biomarkers[0].lad), (2.0, 2.0));

        let markers = &out.plan.panels[0].markers;
        assert_eq!(markers.len(), 2);
        assert!(markers.iter().all(|m| m.depth == 2.0));
    }
}
