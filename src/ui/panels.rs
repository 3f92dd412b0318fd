use std::path::Path;

use anyhow::{Context, Result};
use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::analysis::biomarker::write_biomarkers_csv;
use crate::data::filter::Selection;
use crate::data::model::CoreDataset;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("🔍 Filters");
    ui.separator();

    let (Some(dataset), Some(selection)) = (&state.dataset, &mut state.selection) else {
        ui.label("No dataset loaded.");
        return;
    };

    let mut changed = false;

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            changed |= core_filter(ui, dataset, selection);
            ui.separator();
            changed |= depth_filter(ui, dataset, selection);
            ui.separator();

            let choices = selection.species_choices(dataset);
            changed |= species_checklist(
                ui,
                "Species",
                "display_species",
                &choices,
                &mut selection.display_species,
                dataset,
                true,
            );

            ui.separator();
            ui.heading("📊 Chart options");
            changed |= species_checklist(
                ui,
                "Draw FAD/LAD lines",
                "horizon_species",
                &choices,
                &mut selection.horizon_species,
                dataset,
                false,
            );
        });

    if changed {
        state.touch();
    }
}

fn core_filter(ui: &mut Ui, dataset: &CoreDataset, selection: &mut Selection) -> bool {
    let mut changed = false;
    let header = format!("Cores  ({}/{})", selection.cores.len(), dataset.cores.len());

    egui::CollapsingHeader::new(RichText::new(header).strong())
        .id_salt("cores")
        .default_open(true)
        .show(ui, |ui: &mut Ui| {
            ui.horizontal(|ui: &mut Ui| {
                if ui.small_button("All").clicked() {
                    selection.cores = dataset.cores.clone();
                    changed = true;
                }
                if ui.small_button("None").clicked() {
                    selection.cores.clear();
                    changed = true;
                }
            });

            for core in &dataset.cores {
                let mut checked = selection.cores.contains(core);
                if ui.checkbox(&mut checked, core.as_str()).changed() {
                    if checked {
                        selection.cores.insert(core.clone());
                    } else {
                        selection.cores.remove(core);
                    }
                    changed = true;
                }
            }
        });

    changed
}

fn depth_filter(ui: &mut Ui, dataset: &CoreDataset, selection: &mut Selection) -> bool {
    ui.strong("Depth interval (cm)");

    let Some(limits) = selection.depth_limits(dataset) else {
        ui.label(
            RichText::new("No samples found for the selected cores.")
                .color(Color32::YELLOW),
        );
        return false;
    };

    let mut range = selection.depth.clamped_to(limits);
    let min_changed = ui
        .add(
            egui::Slider::new(&mut range.min, limits.min..=limits.max)
                .step_by(1.0)
                .text("from"),
        )
        .changed();
    let max_changed = ui
        .add(
            egui::Slider::new(&mut range.max, limits.min..=limits.max)
                .step_by(1.0)
                .text("to"),
        )
        .changed();

    // Dragging one bound past the other moves both.
    if min_changed && range.min > range.max {
        range.max = range.min;
    }
    if max_changed && range.max < range.min {
        range.min = range.max;
    }

    if range != selection.depth {
        selection.depth = range;
        true
    } else {
        false
    }
}

fn species_checklist(
    ui: &mut Ui,
    title: &str,
    id: &str,
    choices: &[String],
    selected: &mut Vec<String>,
    dataset: &CoreDataset,
    default_open: bool,
) -> bool {
    let mut changed = false;
    let header = format!("{title}  ({}/{})", selected.len(), choices.len());

    egui::CollapsingHeader::new(RichText::new(header).strong())
        .id_salt(id)
        .default_open(default_open)
        .show(ui, |ui: &mut Ui| {
            if ui.small_button("Clear").clicked() && !selected.is_empty() {
                selected.clear();
                changed = true;
            }
            ScrollArea::vertical()
                .id_salt(id)
                .max_height(260.0)
                .show(ui, |ui: &mut Ui| {
                    for species in choices {
                        let mut checked = selected.contains(species);
                        let mut text = RichText::new(species.as_str());
                        if dataset.schema.is_excluded(species) {
                            text = text.italics().weak();
                        }
                        if ui.checkbox(&mut checked, text).changed() {
                            Selection::toggle_species(selected, species, dataset);
                            changed = true;
                        }
                    }
                });
        });

    changed
}

// ---------------------------------------------------------------------------
// KPI strip
// ---------------------------------------------------------------------------

/// Render the four summary metrics above the charts.
pub fn summary_strip(ui: &mut Ui, state: &AppState) {
    let summary = state
        .output
        .as_ref()
        .map(|o| o.summary)
        .unwrap_or_default();

    let metrics = [
        ("Species found", summary.species_found.to_string()),
        ("Depth span", format!("{} cm", summary.depth_span)),
        ("Samples", summary.sample_count.to_string()),
        ("Mean richness / sample", format!("{:.1}", summary.mean_richness)),
    ];

    ui.columns(metrics.len(), |columns: &mut [Ui]| {
        for (ui, (label, value)) in columns.iter_mut().zip(metrics) {
            ui.label(RichText::new(label).weak());
            ui.label(RichText::new(value).size(24.0).strong());
        }
    });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            if ui.button("Reload source").clicked() {
                state.reload();
                ui.close_menu();
            }
        });

        ui.menu_button("Export", |ui: &mut Ui| {
            let ready = state.output.is_some();
            if ui.add_enabled(ready, egui::Button::new("Static chart (PNG)…")).clicked() {
                if let Some(path) = save_dialog("Export static chart", "profiles.png", "PNG", "png") {
                    let result = export_png(state, &path);
                    report(state, result, &path);
                }
                ui.close_menu();
            }
            if ui.add_enabled(ready, egui::Button::new("Static chart (SVG)…")).clicked() {
                if let Some(path) = save_dialog("Export static chart", "profiles.svg", "SVG", "svg") {
                    let result = export_svg(state, &path);
                    report(state, result, &path);
                }
                ui.close_menu();
            }
            if ui.add_enabled(ready, egui::Button::new("Biomarkers (CSV)…")).clicked() {
                if let Some(path) = save_dialog("Export biomarkers", "biomarkers.csv", "CSV", "csv") {
                    let result = export_biomarkers(state, &path);
                    report(state, result, &path);
                }
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(ds) = &state.dataset {
            let in_window = state.output.as_ref().map_or(0, |o| o.rows.len());
            ui.label(format!("{} samples loaded, {in_window} in window", ds.len()));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs and exports
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open core data")
        .add_filter("Supported files", &["csv", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        state.load_path(&path);
    }
}

fn save_dialog(title: &str, file_name: &str, kind: &str, ext: &str) -> Option<std::path::PathBuf> {
    rfd::FileDialog::new()
        .set_title(title)
        .set_file_name(file_name)
        .add_filter(kind, &[ext])
        .save_file()
}

fn export_png(state: &mut AppState, path: &Path) -> Result<()> {
    let image = state
        .static_image()?
        .context("nothing to export")?;
    image.save_png(path)
}

fn export_svg(state: &AppState, path: &Path) -> Result<()> {
    let output = state.output.as_ref().context("nothing to export")?;
    state.static_renderer().render_svg(&output.plan, path)
}

fn export_biomarkers(state: &AppState, path: &Path) -> Result<()> {
    let output = state.output.as_ref().context("nothing to export")?;
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    write_biomarkers_csv(&output.biomarkers, file)
}

fn report(state: &mut AppState, result: Result<()>, path: &Path) {
    match result {
        Ok(()) => {
            log::info!("Exported {}", path.display());
            state.status_message = None;
        }
        Err(e) => {
            log::error!("Export to {} failed: {e:#}", path.display());
            state.status_message = Some(format!("Error: {e:#}"));
        }
    }
}
