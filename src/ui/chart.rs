//! # Live Telemetry Chart
//!
//! Plots the three channel series of the active session against the sample index.
//! The plot is rebuilt from a history snapshot every frame; nothing is cached here.

use eframe::egui;
use egui::Color32;
use egui_plot::{Legend, Line, Plot, PlotPoints};

use crate::telemetry::{Channel, SharedHistory};

const CHART_HEIGHT: f32 = 320.0;

pub fn color_for_channel(channel: Channel) -> Color32 {
    match channel {
        Channel::Current => Color32::from_rgb(66, 165, 245),
        Channel::Voltage => Color32::from_rgb(255, 167, 38),
        Channel::Power => Color32::from_rgb(102, 187, 106),
    }
}

/// `(index, value)` points as plot coordinates, x being the sample index.
pub fn plot_points(series: &[(u64, f64)]) -> Vec<[f64; 2]> {
    series.iter().map(|&(index, value)| [index as f64, value]).collect()
}

/// Render the chart for `history` into the remaining width of `ui`.
pub fn render(ui: &mut egui::Ui, history: &SharedHistory) {
    let snapshots = history.snapshot_all();

    ui.label(egui::RichText::new("Live Telemetry").strong());
    if snapshots.iter().all(|s| s.is_empty()) {
        ui.weak("Waiting for data");
    }

    Plot::new("telemetry")
        .legend(Legend::default())
        .height(CHART_HEIGHT)
        .allow_scroll(false)
        .x_axis_label("Samples")
        .show(ui, |plot_ui| {
            for (channel, series) in Channel::ALL.iter().zip(&snapshots) {
                let points: PlotPoints = plot_points(series).into();
                plot_ui.line(Line::new(channel.to_string(), points).color(color_for_channel(*channel)));
            }
        });
}
