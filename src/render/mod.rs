/// Rendering layer: one back-end independent plan, two renderers.
///
/// ```text
///   filtered rows + display species + biomarkers
///        │
///        ▼
///   ┌──────────┐
///   │   plan    │  panels, per-core series, FAD/LAD markers, shared depth range
///   └──────────┘
///        │
///        ├──────────────────────┐
///        ▼                      ▼
///   ┌─────────────┐      ┌──────────────┐
///   │ interactive  │      │ static_chart  │
///   │  (egui_plot) │      │  (plotters)   │
///   └─────────────┘      └──────────────┘
/// ```

pub mod interactive;
pub mod plan;
pub mod static_chart;

use plan::RenderPlan;

/// A drawing technology that can present a [`RenderPlan`].
pub trait ProfileRenderer {
    type Output;

    fn render(&mut self, plan: &RenderPlan) -> Self::Output;
}
