use eframe::egui::{ColorImage, ScrollArea, TextureOptions, Ui, load::SizedTexture};
use egui_extras::{Column, TableBuilder};

use crate::render::ProfileRenderer;
use crate::render::interactive::InteractiveRenderer;
use crate::state::{AppState, ChartTab};

// ---------------------------------------------------------------------------
// Central panel: chart tabs
// ---------------------------------------------------------------------------

pub fn central_panel(ui: &mut Ui, state: &mut AppState) {
    if state.dataset.is_none() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a file to view core profiles  (File → Open…)");
        });
        return;
    }

    ui.heading("Nannofossil core correlation");
    ui.label("Explore species abundance down the cores. Use the filters on the left.");
    ui.separator();

    ui.strong("📊 Selected interval");
    super::panels::summary_strip(ui, state);
    ui.separator();

    ui.horizontal(|ui: &mut Ui| {
        ui.selectable_value(&mut state.tab, ChartTab::Interactive, "Interactive");
        ui.selectable_value(&mut state.tab, ChartTab::Static, "Static");
        ui.selectable_value(&mut state.tab, ChartTab::Biomarkers, "Biomarkers");
    });
    ui.separator();

    match state.tab {
        ChartTab::Interactive => interactive_view(ui, state),
        ChartTab::Static => static_view(ui, state),
        ChartTab::Biomarkers => biomarker_table(ui, state),
    }
}

fn interactive_view(ui: &mut Ui, state: &AppState) {
    let Some(output) = &state.output else {
        return;
    };
    InteractiveRenderer::new(ui).render(&output.plan);
}

fn static_view(ui: &mut Ui, state: &mut AppState) {
    if state.static_texture.is_none() {
        let prepared = state.static_image().map(|image| {
            image.map(|img| {
                ColorImage::from_rgb([img.width as usize, img.height as usize], &img.rgb)
            })
        });
        match prepared {
            Ok(Some(color_image)) => {
                let texture =
                    ui.ctx()
                        .load_texture("static_chart", color_image, TextureOptions::LINEAR);
                state.static_texture = Some(texture);
            }
            Ok(None) => return,
            Err(e) => {
                log::error!("Static render failed: {e:#}");
                state.status_message = Some(format!("Error: {e:#}"));
                state.tab = ChartTab::Interactive;
                return;
            }
        }
    }

    if let Some(texture) = &state.static_texture {
        ScrollArea::both()
            .auto_shrink([false, false])
            .show(ui, |ui: &mut Ui| {
                ui.image(SizedTexture::from_handle(texture));
            });
    }
}

fn biomarker_table(ui: &mut Ui, state: &AppState) {
    let Some(output) = &state.output else {
        return;
    };
    if output.biomarkers.is_empty() {
        ui.label("Pick species under “Draw FAD/LAD lines” to list their datums.");
        return;
    }

    TableBuilder::new(ui)
        .striped(true)
        .column(Column::auto().at_least(180.0))
        .column(Column::auto().at_least(80.0))
        .column(Column::auto().at_least(80.0))
        .column(Column::remainder())
        .header(20.0, |mut header| {
            for title in ["Species", "Core", "FAD (cm)", "LAD (cm)"] {
                header.col(|ui: &mut Ui| {
                    ui.strong(title);
                });
            }
        })
        .body(|mut body| {
            for record in &output.biomarkers {
                body.row(18.0, |mut row| {
                    row.col(|ui: &mut Ui| {
                        ui.label(record.species.as_str());
                    });
                    row.col(|ui: &mut Ui| {
                        ui.label(record.core_id.as_str());
                    });
                    row.col(|ui: &mut Ui| {
                        ui.label(record.fad.to_string());
                    });
                    row.col(|ui: &mut Ui| {
                        ui.label(record.lad.to_string());
                    });
                });
            }
        });
}
