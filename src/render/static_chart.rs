use std::path::Path;

use anyhow::{Context, Result};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::series::DashedLineSeries;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use super::ProfileRenderer;
use super::plan::{LabelPlacement, RenderPlan, StrokePattern, depth_from_screen, screen_y};
use crate::color::Rgb;

// ---------------------------------------------------------------------------
// Static profile chart (export / print)
// ---------------------------------------------------------------------------

pub fn to_plotters(c: Rgb) -> RGBColor {
    RGBColor(c.red, c.green, c.blue)
}

/// An RGB8 bitmap of a rendered plan.
#[derive(Debug, Clone)]
pub struct StaticImage {
    pub width: u32,
    pub height: u32,
    /// Row-major RGB triples, `width * height * 3` bytes.
    pub rgb: Vec<u8>,
}

impl StaticImage {
    pub fn save_png(&self, path: &Path) -> Result<()> {
        let image = image::RgbImage::from_raw(self.width, self.height, self.rgb.clone())
            .context("bitmap size does not match its dimensions")?;
        image
            .save_with_format(path, image::ImageFormat::Png)
            .with_context(|| format!("writing {}", path.display()))
    }
}

/// Draws a plan with plotters: one panel per species, side by side.
#[derive(Debug, Clone, Copy)]
pub struct StaticRenderer {
    pub panel_width: u32,
    pub height: u32,
}

impl StaticRenderer {
    pub fn new(panel_width: u32, height: u32) -> Self {
        StaticRenderer { panel_width, height }
    }

    /// Figure size grows with the number of panels.
    pub fn size_for(&self, plan: &RenderPlan) -> (u32, u32) {
        let panels = plan.panels.len().max(1) as u32;
        (self.panel_width * panels, self.height)
    }

    pub fn render_bitmap(&self, plan: &RenderPlan) -> Result<StaticImage> {
        let (width, height) = self.size_for(plan);
        let mut rgb = vec![255u8; width as usize * height as usize * 3];
        {
            let root = BitMapBackend::with_buffer(&mut rgb, (width, height)).into_drawing_area();
            draw_plan(&root, plan)?;
        }
        Ok(StaticImage { width, height, rgb })
    }

    pub fn render_svg(&self, plan: &RenderPlan, path: &Path) -> Result<()> {
        let root = SVGBackend::new(path, self.size_for(plan)).into_drawing_area();
        draw_plan(&root, plan).with_context(|| format!("writing {}", path.display()))
    }
}

impl ProfileRenderer for StaticRenderer {
    type Output = Result<StaticImage>;

    fn render(&mut self, plan: &RenderPlan) -> Result<StaticImage> {
        self.render_bitmap(plan)
    }
}

fn draw_plan<DB>(root: &DrawingArea<DB, Shift>, plan: &RenderPlan) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;
    if plan.is_empty() {
        root.present()?;
        return Ok(());
    }

    let depth = plan.padded_depth_range();
    let y_range = screen_y(depth.max)..screen_y(depth.min);
    let depth_ticks = |y: &f64| format!("{:.0}", depth_from_screen(*y));

    let areas = root.split_evenly((1, plan.panels.len()));

    for (area, panel) in areas.iter().zip(&plan.panels) {
        let x_max = if panel.x_max > 0.0 { panel.x_max * 1.05 } else { 1.0 };

        let mut chart = ChartBuilder::on(area)
            .caption(&panel.species, ("sans-serif", 18))
            .margin(8)
            .x_label_area_size(40)
            .y_label_area_size(if panel.show_depth_label { 60 } else { 40 })
            .build_cartesian_2d(0.0..x_max, y_range.clone())?;

        let mut mesh = chart.configure_mesh();
        mesh.x_desc(plan.x_label.as_str())
            .y_label_formatter(&depth_ticks)
            .bold_line_style(BLACK.mix(0.15))
            .light_line_style(WHITE);
        if panel.show_depth_label {
            mesh.y_desc(plan.depth_label.as_str());
        }
        mesh.draw()?;

        for series in &panel.series {
            let color = to_plotters(series.color);
            let points: Vec<(f64, f64)> = series
                .points
                .iter()
                .map(|&[abundance, depth]| (abundance, screen_y(depth)))
                .collect();

            let drawn = chart.draw_series(LineSeries::new(points.clone(), color.stroke_width(2)))?;
            if panel.show_depth_label {
                drawn
                    .label(series.core_id.as_str())
                    .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
            }
            chart.draw_series(points.iter().map(|&p| Circle::new(p, 3, color.filled())))?;
        }

        for marker in &panel.markers {
            let style = marker.kind.style();
            let color = to_plotters(style.color);
            let y = screen_y(marker.depth);
            let (dash, gap) = match style.stroke {
                StrokePattern::Dashed => (8, 5),
                StrokePattern::Dotted => (2, 4),
            };
            chart.draw_series(DashedLineSeries::new(
                vec![(marker.x_span.0, y), (marker.x_span.1, y)],
                dash,
                gap,
                color.mix(style.opacity as f64).stroke_width(1),
            ))?;

            let vpos = match style.placement {
                LabelPlacement::AboveLine => VPos::Bottom,
                LabelPlacement::BelowLine => VPos::Top,
            };
            let font = ("sans-serif", 11)
                .into_font()
                .color(&color)
                .pos(Pos::new(HPos::Left, vpos));
            chart.draw_series(std::iter::once(Text::new(
                marker.label.clone(),
                (marker.x_span.0, y),
                font,
            )))?;
        }

        if panel.show_depth_label && !panel.series.is_empty() {
            chart
                .configure_series_labels()
                .position(SeriesLabelPosition::LowerRight)
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .draw()?;
        }
    }

    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::test_support::example_dataset;

    #[test]
    fn figure_width_grows_with_panels() {
        let ds = example_dataset();
        let rows: Vec<usize> = (0..ds.len()).collect();
        let species = vec!["x".to_string(), "y".to_string()];
        let plan = RenderPlan::build(&ds, &rows, &species, &[]);
        let renderer = StaticRenderer::new(300, 900);
        assert_eq!(renderer.size_for(&plan), (600, 900));

        let empty = RenderPlan::build(&ds, &rows, &[], &[]);
        assert_eq!(renderer.size_for(&empty), (300, 900));
    }

    #[test]
    fn empty_plan_renders_a_blank_white_bitmap() {
        let ds = example_dataset();
        let plan = RenderPlan::build(&ds, &[], &[], &[]);
        let image = StaticRenderer::new(40, 30).render_bitmap(&plan).unwrap();
        assert_eq!((image.width, image.height), (40, 30));
        assert_eq!(image.rgb.len(), 40 * 30 * 3);
        assert!(image.rgb.iter().all(|&b| b == 255));
    }
}
