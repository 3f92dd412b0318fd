use eframe::egui::{self, Align2, Color32, RichText, Ui, Vec2b};
use egui_plot::{Line, LineStyle, Plot, PlotPoint, PlotPoints, Points, Text};

use super::ProfileRenderer;
use super::plan::{
    LabelPlacement, Panel, RenderPlan, StrokePattern, depth_from_screen, screen_y,
};
use crate::color::Rgb;
use crate::data::filter::DepthRange;

// ---------------------------------------------------------------------------
// Interactive profile plots (central panel)
// ---------------------------------------------------------------------------

pub fn to_color32(c: Rgb) -> Color32 {
    Color32::from_rgb(c.red, c.green, c.blue)
}

/// Draws a plan as side-by-side egui plots with pan, zoom and hover.
/// The depth axes of all panels are linked.
pub struct InteractiveRenderer<'u> {
    ui: &'u mut Ui,
}

impl<'u> InteractiveRenderer<'u> {
    pub fn new(ui: &'u mut Ui) -> Self {
        InteractiveRenderer { ui }
    }
}

impl ProfileRenderer for InteractiveRenderer<'_> {
    type Output = ();

    fn render(&mut self, plan: &RenderPlan) {
        if plan.is_empty() {
            self.ui.centered_and_justified(|ui: &mut Ui| {
                ui.heading("Select species to plot");
            });
            return;
        }

        // One legend for all panels, above them.
        self.ui.horizontal(|ui: &mut Ui| {
            for (core, color) in &plan.legend {
                ui.colored_label(to_color32(*color), format!("━● {core}"));
            }
        });

        let depth = plan.padded_depth_range();
        let link = egui::Id::new("depth_axis");

        self.ui.columns(plan.panels.len(), |columns: &mut [Ui]| {
            for (ui, panel) in columns.iter_mut().zip(&plan.panels) {
                profile_plot(ui, plan, panel, depth, link);
            }
        });
    }
}

fn profile_plot(ui: &mut Ui, plan: &RenderPlan, panel: &Panel, depth: DepthRange, link: egui::Id) {
    ui.vertical_centered(|ui: &mut Ui| {
        ui.strong(panel.species.as_str());
    });

    let mut plot = Plot::new(("profile", panel.species.as_str()))
        .x_axis_label(plan.x_label.as_str())
        .y_axis_formatter(|mark, _range| format!("{:.0}", depth_from_screen(mark.value)))
        .label_formatter(|name, value| {
            let depth = depth_from_screen(value.y);
            if name.is_empty() {
                format!("depth {depth:.1} cm\nabundance {:.2}", value.x)
            } else {
                format!("{name}\ndepth {depth:.1} cm\nabundance {:.2}", value.x)
            }
        })
        .include_x(0.0)
        .include_x(panel.x_max)
        .include_y(screen_y(depth.min))
        .include_y(screen_y(depth.max))
        .link_axis(link, Vec2b::new(false, true))
        .link_cursor(link, Vec2b::new(false, true))
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true);

    if panel.show_depth_label {
        plot = plot.y_axis_label(plan.depth_label.as_str());
    }

    plot.show(ui, |plot_ui| {
        for series in &panel.series {
            let color = to_color32(series.color);
            let points: Vec<[f64; 2]> = series
                .points
                .iter()
                .map(|&[abundance, depth]| [abundance, screen_y(depth)])
                .collect();

            plot_ui.line(
                Line::new(PlotPoints::from(points.clone()))
                    .name(&series.core_id)
                    .color(color)
                    .width(1.5),
            );
            plot_ui.points(
                Points::new(PlotPoints::from(points))
                    .name(&series.core_id)
                    .color(color)
                    .radius(3.0),
            );
        }

        for marker in &panel.markers {
            let style = marker.kind.style();
            let color = to_color32(style.color);
            let y = screen_y(marker.depth);
            let line_style = match style.stroke {
                StrokePattern::Dashed => LineStyle::dashed_loose(),
                StrokePattern::Dotted => LineStyle::dotted_dense(),
            };
            let anchor = match style.placement {
                LabelPlacement::AboveLine => Align2::LEFT_BOTTOM,
                LabelPlacement::BelowLine => Align2::LEFT_TOP,
            };

            plot_ui.line(
                Line::new(PlotPoints::from(vec![
                    [marker.x_span.0, y],
                    [marker.x_span.1, y],
                ]))
                .color(color.gamma_multiply(style.opacity))
                .style(line_style)
                .width(1.0),
            );
            plot_ui.text(
                Text::new(
                    PlotPoint::new(marker.x_span.0, y),
                    RichText::new(&marker.label).size(10.0).color(color),
                )
                .anchor(anchor),
            );
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colour_conversion_keeps_channels() {
        assert_eq!(to_color32(Rgb::new(1, 2, 3)), Color32::from_rgb(1, 2, 3));
    }
}
