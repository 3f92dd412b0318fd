use crate::data::filter::{column_sum, depth_bounds};
use crate::data::model::CoreDataset;

// ---------------------------------------------------------------------------
// Summary metrics (KPI strip)
// ---------------------------------------------------------------------------

/// Scalar KPIs over the filtered rows. All zero for an empty window.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SummaryMetrics {
    /// Real species (aggregate columns excluded) present in the window.
    pub species_found: usize,
    /// max(depth) − min(depth), in cm.
    pub depth_span: f64,
    pub sample_count: usize,
    /// Mean number of real species present per sample.
    pub mean_richness: f64,
}

pub fn compute_summary(dataset: &CoreDataset, rows: &[usize]) -> SummaryMetrics {
    if rows.is_empty() {
        return SummaryMetrics::default();
    }

    let real_species = dataset.richness_species();

    let species_found = real_species
        .iter()
        .filter(|&&col| column_sum(dataset, rows, col) > 0.0)
        .count();

    let depth_span = depth_bounds(dataset, rows)
        .map(|r| r.span())
        .unwrap_or(0.0);

    let richness_total: usize = rows
        .iter()
        .map(|&i| {
            let sample = &dataset.samples[i];
            real_species
                .iter()
                .filter(|&&col| sample.abundances[col] > 0.0)
                .count()
        })
        .sum();

    SummaryMetrics {
        species_found,
        depth_span,
        sample_count: rows.len(),
        mean_richness: richness_total as f64 / rows.len() as f64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::{DepthRange, filtered_indices};
    use crate::data::test_support::{cores, example_dataset};

    #[test]
    fn summary_over_full_window() {
        let ds = example_dataset();
        let rows = filtered_indices(&ds, &cores(&["A", "B"]), DepthRange::new(1.0, 5.0));
        let summary = compute_summary(&ds, &rows);

        // `total` is an aggregate column and is not counted.
        assert_eq!(summary.species_found, 2);
        assert_eq!(summary.depth_span, 4.0);
        assert_eq!(summary.sample_count, 10);
        assert!((summary.mean_richness - 0.6).abs() < 1e-12);
    }

    #[test]
    fn summary_of_core_b_only() {
        let ds = example_dataset();
        let rows = filtered_indices(&ds, &cores(&["B"]), DepthRange::new(2.0, 5.0));
        let summary = compute_summary(&ds, &rows);
        assert_eq!(summary.species_found, 1);
        assert_eq!(summary.depth_span, 3.0);
        assert_eq!(summary.sample_count, 4);
        assert!((summary.mean_richness - 0.5).abs() < 1e-12);
    }

    #[test]
    fn empty_window_is_all_zero() {
        let ds = example_dataset();
        let summary = compute_summary(&ds, &[]);
        assert_eq!(summary, SummaryMetrics::default());
        assert!(!summary.mean_richness.is_nan());
    }
}
