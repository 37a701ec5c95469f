//! Reading history chart
//!
//! Renders the history snapshot as a connected line with markers. The chart
//! only ever sees a snapshot, never the live sequence, so it can run in the
//! same tick as a background completion without coordination.

use egui::{Color32, RichText};
use egui_plot::{Line, MarkerShape, Plot, PlotPoints, Points};

use crate::shared::Reading;

const LINE_COLOR: Color32 = Color32::from_rgb(0, 255, 255);

/// Show the history chart in the given UI region.
///
/// Fewer than 2 points renders a "collecting data" placeholder with no
/// axes. Otherwise the x-axis is seconds elapsed since the first reading
/// (most recent on the right) and the y-axis carries the most recently
/// observed unit.
pub fn show_chart(ui: &mut egui::Ui, snapshot: &[Reading]) {
    if snapshot.len() < 2 {
        ui.centered_and_justified(|ui| {
            ui.label(RichText::new("Collecting data...").size(16.0).weak());
        });
        return;
    }

    let start = snapshot[0].timestamp;
    let points: Vec<[f64; 2]> = snapshot
        .iter()
        .map(|r| {
            let elapsed = (r.timestamp - start).num_milliseconds() as f64 / 1000.0;
            [elapsed, r.value]
        })
        .collect();

    let unit = snapshot
        .iter()
        .rev()
        .find_map(|r| r.unit)
        .unwrap_or('C');

    Plot::new("reading_history")
        .x_axis_label("Time (seconds)")
        .y_axis_label(format!("Reading ({unit})"))
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.line(
                Line::new(PlotPoints::from(points.clone()))
                    .color(LINE_COLOR)
                    .width(2.0),
            );
            plot_ui.points(
                Points::new(PlotPoints::from(points))
                    .color(LINE_COLOR)
                    .shape(MarkerShape::Circle)
                    .radius(3.0),
            );
        });
}
