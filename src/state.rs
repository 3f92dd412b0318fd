use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use eframe::egui::TextureHandle;

use crate::analysis::pipeline::{PassOutput, run_pass};
use crate::config::DashboardConfig;
use crate::data::filter::Selection;
use crate::data::loader;
use crate::data::model::CoreDataset;
use crate::render::ProfileRenderer;
use crate::render::static_chart::{StaticImage, StaticRenderer};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// Which chart view fills the central panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartTab {
    Interactive,
    Static,
    Biomarkers,
}

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: DashboardConfig,

    /// Loaded dataset (None until a load succeeds).
    pub dataset: Option<CoreDataset>,

    /// Where the current dataset came from.
    pub source: Option<String>,

    /// Current filter choices.
    pub selection: Option<Selection>,

    /// Result of the last pass over `selection` (cached).
    pub output: Option<PassOutput>,

    /// Bitmap of the static chart for `output`, rendered on demand.
    pub static_image: Option<StaticImage>,

    /// GPU copy of `static_image` for the Static tab.
    pub static_texture: Option<TextureHandle>,

    pub tab: ChartTab,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,

    /// Set when the selection changed and the pass must be rerun.
    dirty: bool,
}

impl AppState {
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            config,
            dataset: None,
            source: None,
            selection: None,
            output: None,
            static_image: None,
            static_texture: None,
            tab: ChartTab::Interactive,
            status_message: None,
            dirty: false,
        }
    }

    /// Load `source` (URL or path) with the configured schema.
    ///
    /// Failures are fatal for the load: the previous dataset is kept and the
    /// error is shown in the status area.
    pub fn load(&mut self, source: &str) {
        let timeout = Duration::from_secs(self.config.fetch_timeout_secs);
        match loader::load_source(source, &self.config.schema, timeout) {
            Ok(dataset) => {
                log::info!(
                    "Loaded {} samples from {source}: cores {:?}, {} species",
                    dataset.len(),
                    dataset.cores,
                    dataset.species.len()
                );
                self.source = Some(source.to_string());
                self.set_dataset(dataset);
            }
            Err(e) => {
                log::error!("Failed to load {source}: {e:#}");
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }

    pub fn load_path(&mut self, path: &Path) {
        self.load(&path.to_string_lossy());
    }

    /// Reload the current source, or the configured one if nothing loaded yet.
    pub fn reload(&mut self) {
        let source = self
            .source
            .clone()
            .unwrap_or_else(|| self.config.source.clone());
        self.load(&source);
    }

    /// Ingest a newly loaded dataset and reset the selection.
    pub fn set_dataset(&mut self, dataset: CoreDataset) {
        self.selection = Some(Selection::initial(&dataset));
        self.dataset = Some(dataset);
        self.status_message = None;
        self.dirty = true;
        self.refresh();
    }

    /// Mark the selection as changed; the next [`refresh`](Self::refresh)
    /// reruns the pass.
    pub fn touch(&mut self) {
        self.dirty = true;
    }

    /// Rerun the pass if the selection changed since the last run.
    pub fn refresh(&mut self) {
        if !self.dirty {
            return;
        }
        self.dirty = false;
        self.static_image = None;
        self.static_texture = None;

        let (Some(dataset), Some(selection)) = (&self.dataset, &mut self.selection) else {
            self.output = None;
            return;
        };

        selection.clamp_to(dataset);
        match selection.validate(dataset) {
            Ok(()) => {
                self.output = Some(run_pass(dataset, selection));
                if self
                    .status_message
                    .as_deref()
                    .is_some_and(|m| m.starts_with("Invalid selection"))
                {
                    self.status_message = None;
                }
            }
            Err(e) => {
                log::warn!("Rejected selection: {e}");
                self.status_message = Some(format!("Invalid selection: {e}"));
                self.output = None;
            }
        }
    }

    pub fn static_renderer(&self) -> StaticRenderer {
        StaticRenderer::new(self.config.static_panel_width, self.config.static_height)
    }

    /// The static chart for the current pass, rendering it if needed.
    pub fn static_image(&mut self) -> Result<Option<&StaticImage>> {
        let Some(output) = &self.output else {
            return Ok(None);
        };
        if self.static_image.is_none() {
            let mut renderer = self.static_renderer();
            self.static_image = Some(renderer.render(&output.plan)?);
        }
        Ok(self.static_image.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::test_support::example_dataset;

    fn loaded_state() -> AppState {
        let mut state = AppState::new(DashboardConfig::default());
        state.set_dataset(example_dataset());
        state
    }

    #[test]
    fn new_dataset_runs_a_pass() {
        let state = loaded_state();
        let output = state.output.as_ref().unwrap();
        assert_eq!(output.summary.sample_count, 10);
        assert_eq!(output.plan.panels.len(), 3);
    }

    #[test]
    fn selection_change_reruns_only_when_touched() {
        let mut state = loaded_state();
        if let Some(sel) = state.selection.as_mut() {
            sel.cores.remove("A");
        }
        state.refresh();
        assert_eq!(state.output.as_ref().unwrap().summary.sample_count, 10);

        state.touch();
        state.refresh();
        let output = state.output.as_ref().unwrap();
        assert_eq!(output.summary.sample_count, 5);
        // x is not offered for core B alone and was dropped from the selection.
        assert_eq!(
            state.selection.as_ref().unwrap().display_species,
            ["y", "total"]
        );
    }

    #[test]
    fn invalid_selection_is_reported_not_run() {
        let mut state = loaded_state();
        if let Some(sel) = state.selection.as_mut() {
            sel.cores.insert("Z".to_string());
        }
        state.touch();
        state.refresh();
        assert!(state.output.is_none());
        assert!(state
            .status_message
            .as_deref()
            .is_some_and(|m| m.contains("unknown core: Z")));
    }

    #[test]
    fn static_bitmap_is_cached_until_the_next_pass() {
        let mut state = loaded_state();
        if let Some(sel) = state.selection.as_mut() {
            sel.display_species.clear();
        }
        state.touch();
        state.refresh();

        let (width, height) = {
            let image = state.static_image().unwrap().unwrap();
            (image.width, image.height)
        };
        assert_eq!((width, height), (300, 1000));
        assert!(state.static_image.is_some());

        state.touch();
        state.refresh();
        assert!(state.static_image.is_none());
    }

    #[test]
    fn failed_load_keeps_previous_dataset() {
        let mut state = loaded_state();
        state.load("does/not/exist.csv");
        assert!(state.dataset.is_some());
        assert!(state.status_message.as_deref().is_some_and(|m| m.starts_with("Error")));
    }
}
