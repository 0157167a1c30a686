//! # Navigation Screens
//!
//! Welcome, device selection and latency selection. Each render function only reports
//! what the operator chose; [`super::AppState`] performs the transition.

use eframe::egui;

use crate::telemetry::LatencyMode;

const BUTTON_SIZE: egui::Vec2 = egui::vec2(200.0, 36.0);

/// Screen currently shown in the central panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    Welcome,
    DeviceSelection,
    LatencySelection { device: String },
    Telemetry,
}

/// Operator intent collected during a frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Navigate(Screen),
    OpenSession { device: String, mode: LatencyMode },
    CloseSession,
    PreviewLimit(i32),
    CommitLimit(i32),
}

pub fn welcome(ctx: &egui::Context) -> Option<Action> {
    let mut action = None;
    egui::CentralPanel::default().show(ctx, |ui| {
        ui.vertical_centered(|ui| {
            ui.add_space(ui.available_height() / 3.0);
            ui.heading(egui::RichText::new("Welcome!").size(28.0));
            ui.add_space(30.0);
            if ui.add_sized(BUTTON_SIZE, egui::Button::new("Start")).clicked() {
                action = Some(Action::Navigate(Screen::DeviceSelection));
            }
        });
    });
    action
}

pub fn device_selection(ctx: &egui::Context, devices: &[String]) -> Option<Action> {
    let mut action = None;
    egui::CentralPanel::default().show(ctx, |ui| {
        ui.vertical_centered(|ui| {
            ui.add_space(ui.available_height() / 4.0);
            ui.heading(egui::RichText::new("Select your Device:").size(22.0));
            ui.add_space(20.0);
            for device in devices {
                if ui.add_sized(BUTTON_SIZE, egui::Button::new(device.as_str())).clicked() {
                    action = Some(Action::Navigate(Screen::LatencySelection { device: device.clone() }));
                }
                ui.add_space(8.0);
            }
            ui.add_space(20.0);
            if ui.button("Back").clicked() {
                action = Some(Action::Navigate(Screen::Welcome));
            }
        });
    });
    action
}

pub fn latency_selection(ctx: &egui::Context, device: &str) -> Option<Action> {
    let mut action = None;
    egui::CentralPanel::default().show(ctx, |ui| {
        ui.vertical_centered(|ui| {
            ui.add_space(ui.available_height() / 4.0);
            ui.heading(egui::RichText::new(format!("{}: Choose latency mode", device)).size(22.0));
            ui.add_space(20.0);
            ui.horizontal(|ui| {
                let total = BUTTON_SIZE.x * 2.0 + 15.0;
                ui.add_space(((ui.available_width() - total) / 2.0).max(0.0));
                for mode in [LatencyMode::High, LatencyMode::Low] {
                    if ui.add_sized(BUTTON_SIZE, egui::Button::new(format!("{} Latency", mode))).clicked() {
                        action = Some(Action::OpenSession {
                            device: device.to_string(),
                            mode,
                        });
                    }
                    ui.add_space(15.0);
                }
            });
            ui.add_space(20.0);
            if ui.button("Back").clicked() {
                action = Some(Action::Navigate(Screen::DeviceSelection));
            }
        });
    });
    action
}
