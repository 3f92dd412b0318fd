use std::collections::BTreeSet;

use crate::analysis::biomarker::BiomarkerRecord;
use crate::color::{CoreColors, Rgb};
use crate::data::filter::{DepthRange, depth_bounds};
use crate::data::model::CoreDataset;

// ---------------------------------------------------------------------------
// Depth axis policy
// ---------------------------------------------------------------------------

// Depth increases downward: both back-ends plot `-depth` so shallow samples
// sit at the top, and format tick labels back to positive depth.

pub fn screen_y(depth: f64) -> f64 {
    -depth
}

pub fn depth_from_screen(y: f64) -> f64 {
    -y
}

// ---------------------------------------------------------------------------
// Marker styling
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    Fad,
    Lad,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrokePattern {
    Dashed,
    Dotted,
}

/// Where a marker label sits relative to its line, on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelPlacement {
    AboveLine,
    BelowLine,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerStyle {
    pub color: Rgb,
    pub stroke: StrokePattern,
    pub opacity: f32,
    pub placement: LabelPlacement,
}

impl MarkerKind {
    pub fn tag(self) -> &'static str {
        match self {
            MarkerKind::Fad => "FAD",
            MarkerKind::Lad => "LAD",
        }
    }

    /// FAD: red dashed, label above. LAD: blue dotted, label below.
    pub fn style(self) -> MarkerStyle {
        match self {
            MarkerKind::Fad => MarkerStyle {
                color: Rgb::new(220, 20, 20),
                stroke: StrokePattern::Dashed,
                opacity: 0.5,
                placement: LabelPlacement::AboveLine,
            },
            MarkerKind::Lad => MarkerStyle {
                color: Rgb::new(20, 40, 220),
                stroke: StrokePattern::Dotted,
                opacity: 0.5,
                placement: LabelPlacement::BelowLine,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Plan types
// ---------------------------------------------------------------------------

/// A horizontal biostratigraphic marker line with its label.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub kind: MarkerKind,
    pub depth: f64,
    /// Abundance range the line spans: `0` to the panel maximum.
    pub x_span: (f64, f64),
    pub label: String,
}

/// One core's profile in one panel: `[abundance, depth]` points in
/// source row order.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub core_id: String,
    pub color: Rgb,
    pub points: Vec<[f64; 2]>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    pub species: String,
    pub series: Vec<Series>,
    pub markers: Vec<Marker>,
    /// Largest abundance of this species in the window (0 when absent).
    pub x_max: f64,
    /// Only the first panel carries the depth-axis label.
    pub show_depth_label: bool,
}

/// Everything a renderer needs to draw one pass, independent of the
/// drawing technology.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderPlan {
    pub panels: Vec<Panel>,
    /// Legend entries for the cores drawn, sorted by core id.
    pub legend: Vec<(String, Rgb)>,
    /// Depth range shared by all panels; `None` for an empty window.
    pub depth_range: Option<DepthRange>,
    pub x_label: String,
    pub depth_label: String,
}

impl RenderPlan {
    /// Lay out one panel per display species over the filtered `rows`.
    ///
    /// Every panel carries the FAD and LAD markers of every record in
    /// `biomarkers`, so the horizons of one species can be read against the
    /// profiles of the others.
    pub fn build(
        dataset: &CoreDataset,
        rows: &[usize],
        display_species: &[String],
        biomarkers: &[BiomarkerRecord],
    ) -> Self {
        let colors = CoreColors::new(&dataset.cores);
        let present: BTreeSet<&str> = rows
            .iter()
            .map(|&i| dataset.samples[i].core_id.as_str())
            .collect();

        let panels: Vec<Panel> = display_species
            .iter()
            .filter_map(|name| {
                let col = dataset.species_position(name)?;
                Some((name, col))
            })
            .enumerate()
            .map(|(n, (name, col))| {
                let series = present
                    .iter()
                    .map(|&core| Series {
                        core_id: core.to_string(),
                        color: colors.color_for(core),
                        points: rows
                            .iter()
                            .map(|&i| &dataset.samples[i])
                            .filter(|s| s.core_id == core)
                            .map(|s| [s.abundances[col], s.depth])
                            .collect(),
                    })
                    .collect();

                let x_max = rows
                    .iter()
                    .map(|&i| dataset.samples[i].abundances[col])
                    .fold(0.0, f64::max);

                let markers = biomarkers
                    .iter()
                    .flat_map(|rec| {
                        [(MarkerKind::Fad, rec.fad), (MarkerKind::Lad, rec.lad)]
                            .map(|(kind, depth)| Marker {
                                kind,
                                depth,
                                x_span: (0.0, x_max),
                                label: format!("{} {} ({})", kind.tag(), rec.species, rec.core_id),
                            })
                    })
                    .collect();

                Panel {
                    species: name.clone(),
                    series,
                    markers,
                    x_max,
                    show_depth_label: n == 0,
                }
            })
            .collect();

        let legend = present
            .iter()
            .map(|&core| (core.to_string(), colors.color_for(core)))
            .collect();

        RenderPlan {
            panels,
            legend,
            depth_range: depth_bounds(dataset, rows),
            x_label: "Abundance (%)".to_string(),
            depth_label: "Depth (cm)".to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.panels.is_empty()
    }

    /// Shared depth range with a small margin, never zero-width.
    pub fn padded_depth_range(&self) -> DepthRange {
        match self.depth_range {
            None => DepthRange::new(0.0, 1.0),
            Some(r) if r.span() <= 0.0 => DepthRange::new(r.min - 1.0, r.max + 1.0),
            Some(r) => {
                let pad = r.span() * 0.02;
                DepthRange::new(r.min - pad, r.max + pad)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::biomarker::compute_biomarkers;
    use crate::data::filter::filtered_indices;
    use crate::data::test_support::{cores, example_dataset};

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn one_panel_per_species_and_one_series_per_core() {
        let ds = example_dataset();
        let rows = filtered_indices(&ds, &cores(&["A", "B"]), DepthRange::new(1.0, 5.0));
        let plan = RenderPlan::build(&ds, &rows, &names(&["y", "x"]), &[]);

        assert_eq!(plan.panels.len(), 2);
        assert_eq!(plan.panels[0].species, "y");
        assert!(plan.panels[0].show_depth_label);
        assert!(!plan.panels[1].show_depth_label);

        let x_panel = &plan.panels[1];
        assert_eq!(x_panel.series.len(), 2);
        assert_eq!(x_panel.series[0].core_id, "A");
        assert_eq!(
            x_panel.series[0].points,
            vec![[0.0, 1.0], [5.0, 2.0], [0.0, 3.0], [3.0, 4.0], [0.0, 5.0]]
        );
        assert_eq!(x_panel.x_max, 5.0);
        assert_eq!(plan.depth_range, Some(DepthRange::new(1.0, 5.0)));
    }

    #[test]
    fn core_colours_are_shared_across_panels() {
        let ds = example_dataset();
        let rows: Vec<usize> = (0..ds.len()).collect();
        let plan = RenderPlan::build(&ds, &rows, &names(&["x", "y", "total"]), &[]);
        for panel in &plan.panels {
            for (series, (core, color)) in panel.series.iter().zip(&plan.legend) {
                assert_eq!(&series.core_id, core);
                assert_eq!(&series.color, color);
            }
        }
    }

    #[test]
    fn markers_come_in_distinguishable_pairs() {
        let ds = example_dataset();
        let rows: Vec<usize> = (0..ds.len()).collect();
        let records = compute_biomarkers(&ds, &rows, &names(&["x"]));
        let plan = RenderPlan::build(&ds, &rows, &names(&["x", "y"]), &records);

        for panel in &plan.panels {
            assert_eq!(panel.markers.len(), 2);
            let fad = &panel.markers[0];
            let lad = &panel.markers[1];
            assert_eq!((fad.kind, fad.depth), (MarkerKind::Fad, 4.0));
            assert_eq!((lad.kind, lad.depth), (MarkerKind::Lad, 2.0));
            assert_eq!(fad.label, "FAD x (A)");
            assert_eq!(lad.label, "LAD x (A)");
            assert_eq!(fad.x_span, (0.0, panel.x_max));
        }
        let (fad, lad) = (MarkerKind::Fad.style(), MarkerKind::Lad.style());
        assert_ne!(fad.color, lad.color);
        assert_ne!(fad.stroke, lad.stroke);
    }

    #[test]
    fn empty_selection_has_no_panels() {
        let ds = example_dataset();
        let rows: Vec<usize> = (0..ds.len()).collect();
        let plan = RenderPlan::build(&ds, &rows, &[], &[]);
        assert!(plan.is_empty());

        let plan = RenderPlan::build(&ds, &[], &names(&["x"]), &[]);
        assert_eq!(plan.panels.len(), 1);
        assert!(plan.panels[0].series.is_empty());
        assert_eq!(plan.depth_range, None);
        assert_eq!(plan.padded_depth_range(), DepthRange::new(0.0, 1.0));
    }

    #[test]
    fn depth_axis_is_inverted() {
        assert!(screen_y(10.0) < screen_y(2.0));
        assert_eq!(depth_from_screen(screen_y(37.5)), 37.5);
    }
}
