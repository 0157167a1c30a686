//! # Application State Management
//!
//! This module implements the central `AppState` struct which owns the active poll
//! session and the power-limit controller, and implements `eframe::App`.
//!
//! ## Responsibilities
//!
//! - Drains updates posted by poller and power-limit threads via `ui_refresh_rx`
//! - Routes between the navigation screens and the live telemetry screen
//! - Opens, switches and closes poll sessions on operator request
//! - Previews power limits while the slider moves and commits them on release
//! - Persists the last slider position across application runs
//!
//! Background threads never touch this struct; everything they report arrives through
//! the refresh queue and is applied at the start of a frame.

use chrono::Local;
use eframe::egui;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use super::readout::Readout;
use super::screens::{self, Action, Screen};
use super::{QueueObserver, UIRefreshQueueReceiver, UIRefreshQueueSender, UIRefreshState, chart};
use crate::config::AppConfig;
use crate::control::{PowerLimitController, TelemetryBackend};
use crate::telemetry::{Clock, LatencyMode, PollSession, SessionContext, TelemetryObserver};

/// Session id used for updates that do not belong to a poll session.
const NO_SESSION: u64 = 0;

pub struct AppState {
    /// Optional alert message to display in a modal dialog.
    pub alert: Option<String>,
    pub ui_refresh_rx: UIRefreshQueueReceiver,
    pub ui_refresh_tx: UIRefreshQueueSender,

    pub screen: Screen,
    pub devices: Vec<String>,
    context: SessionContext,
    limit: PowerLimitController,
    session: Option<PollSession>,
    /// Id of the current session; bumped every time one is opened.
    session_id: u64,

    pub readout: Readout,
    /// Description of the last failed tick, cleared by the next sample.
    pub last_error: Option<String>,
    pub slider_percent: i32,
    pub slider_label: String,
}

#[derive(Default, Serialize, Deserialize)]
struct PersistedSettings {
    slider_percent: Option<i32>,
}

impl AppState {
    pub fn new(
        config: &AppConfig,
        backend: Arc<dyn TelemetryBackend>,
        clock: Arc<dyn Clock>,
        tx: UIRefreshQueueSender,
        rx: UIRefreshQueueReceiver,
        storage: Option<&dyn eframe::Storage>,
    ) -> Self {
        let persisted: PersistedSettings = storage.and_then(|s| eframe::get_value(s, "app_settings")).unwrap_or_default();
        let limits = config.power_limit.clone();
        let slider_percent = persisted
            .slider_percent
            .unwrap_or(limits.max_percent)
            .clamp(limits.min_percent, limits.max_percent);

        let limit_observer: Arc<dyn TelemetryObserver> = Arc::new(QueueObserver::new(tx, NO_SESSION));

        Self {
            alert: None,
            ui_refresh_rx: rx,
            ui_refresh_tx: tx,
            screen: Screen::Welcome,
            devices: config.devices.clone(),
            context: SessionContext::new(backend.clone(), clock, config.polling.clone()),
            limit: PowerLimitController::new(backend, limit_observer, limits),
            session: None,
            session_id: NO_SESSION,
            readout: Readout::blank(),
            last_error: None,
            slider_percent,
            slider_label: String::new(),
        }
    }

    pub fn session(&self) -> Option<&PollSession> {
        self.session.as_ref()
    }

    /// Apply one update drained from the refresh queue.
    pub fn apply_refresh(&mut self, msg: UIRefreshState) {
        match msg {
            UIRefreshState::SampleReceived { session, index, sample } => {
                let Some(active) = self.active_session(session) else {
                    log::debug!("Dropping sample #{} from closed session {}", index, session);
                    return;
                };
                self.readout = Readout::from_sample(&sample, active.mode(), Local::now());
                self.last_error = None;
            }
            UIRefreshState::FetchFailed { session, kind, message } => {
                if self.active_session(session).is_none() {
                    return;
                }
                log::debug!("Tick failed ({}), clearing readout", kind);
                self.readout = Readout::blank();
                self.last_error = Some(message);
            }
            UIRefreshState::LimitApplied(text) | UIRefreshState::LimitFailed(text) => {
                self.slider_label = text;
            }
        }
    }

    fn active_session(&self, id: u64) -> Option<&PollSession> {
        self.session.as_ref().filter(|_| id == self.session_id)
    }

    /// Carry out an operator action collected while rendering.
    pub fn perform(&mut self, action: Action) {
        match action {
            Action::Navigate(screen) => {
                self.screen = screen;
            }
            Action::OpenSession { device, mode } => self.open_session(&device, mode),
            Action::CloseSession => {
                if let Some(session) = self.session.take() {
                    let device = session.device().to_string();
                    session.close();
                    self.readout = Readout::blank();
                    self.last_error = None;
                    self.screen = Screen::LatencySelection { device };
                } else {
                    self.screen = Screen::DeviceSelection;
                }
            }
            Action::PreviewLimit(percent) => {
                self.slider_label = self.limit.preview(percent);
            }
            Action::CommitLimit(percent) => {
                self.slider_label = self.limit.preview(percent);
                // The result comes back through the refresh queue; the handle is not needed.
                if let Err(e) = self.limit.commit(percent) {
                    log::warn!("Power limit {}% not sent: {}", percent, e);
                }
            }
        }
    }

    /// Open a session for `device` in `mode`, replacing the current one if any.
    fn open_session(&mut self, device: &str, mode: LatencyMode) {
        self.session_id += 1;
        let observer: Arc<dyn TelemetryObserver> = Arc::new(QueueObserver::new(self.ui_refresh_tx, self.session_id));
        let result = match self.session.take() {
            Some(current) => current.switch(&self.context, device, mode, observer),
            None => self.context.open(device, mode, observer),
        };

        self.readout = Readout::blank();
        self.last_error = None;
        match result {
            Ok(session) => {
                log::info!("Polling {} in {} latency mode every {:?}", device, mode, session.interval());
                self.session = Some(session);
                self.screen = Screen::Telemetry;
            }
            Err(e) => {
                log::error!("Failed to start polling {}: {}", device, e);
                self.alert = Some(format!("Could not start polling {}: {}", device, e));
                self.screen = Screen::LatencySelection { device: device.to_string() };
            }
        }
    }

    fn render_telemetry(&mut self, ctx: &egui::Context) -> Option<Action> {
        let Some(session) = &self.session else {
            return Some(Action::Navigate(Screen::DeviceSelection));
        };
        let mut action = None;

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button("Back").clicked() {
                    action = Some(Action::CloseSession);
                }
                ui.add_space(10.0);
                ui.heading(format!("{}: {} Latency", session.device(), session.mode()));
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let other = match session.mode() {
                        LatencyMode::High => LatencyMode::Low,
                        LatencyMode::Low => LatencyMode::High,
                    };
                    if ui.button(format!("Switch to {} Latency", other)).clicked() {
                        action = Some(Action::OpenSession {
                            device: session.device().to_string(),
                            mode: other,
                        });
                    }
                });
            });
            ui.separator();

            ui.columns(2, |cols| {
                cols[0].vertical(|ui| {
                    ui.label(egui::RichText::new(self.readout.current.as_str()).size(18.0));
                    ui.label(egui::RichText::new(self.readout.voltage.as_str()).size(18.0));
                    ui.label(egui::RichText::new(self.readout.power.as_str()).size(18.0));
                    ui.add_space(6.0);
                    ui.label(self.readout.updated_text());
                    if let Some(err) = &self.last_error {
                        ui.colored_label(egui::Color32::from_rgb(229, 57, 53), err.as_str());
                    }
                });

                cols[1].vertical(|ui| {
                    ui.label(egui::RichText::new("Power limit").strong());
                    let limits = self.limit.config();
                    let response = ui.add(
                        egui::Slider::new(&mut self.slider_percent, limits.min_percent..=limits.max_percent).suffix("%"),
                    );
                    if response.changed() {
                        action = Some(Action::PreviewLimit(self.slider_percent));
                    }
                    // Commit on release; keyboard and click changes have no release, commit them directly.
                    if response.drag_stopped() || (response.changed() && !response.dragged()) {
                        action = Some(Action::CommitLimit(self.slider_percent));
                    }
                    ui.label(self.slider_label.as_str());
                });
            });
            ui.separator();

            chart::render(ui, session.history());
        });
        action
    }
}

impl eframe::App for AppState {
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        let settings = PersistedSettings {
            slider_percent: Some(self.slider_percent),
        };
        eframe::set_value(storage, "app_settings", &settings);
    }

    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Repaint periodically so background updates are visible without input
        ctx.request_repaint_after(Duration::from_millis(50));

        while let Ok(msg) = self.ui_refresh_rx.try_receive() {
            self.apply_refresh(msg);
        }

        if self.alert.is_some() {
            egui::Window::new("Alert")
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
                .show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(20.0);
                        if let Some(alert) = &self.alert {
                            ui.label(alert.as_str());
                        }
                        ui.add_space(20.0);

                        if ui.button("OK").clicked() {
                            self.alert = None;
                        }
                        ui.add_space(10.0);
                    });
                });
        }

        let screen = self.screen.clone();
        let action = match &screen {
            Screen::Welcome => screens::welcome(ctx),
            Screen::DeviceSelection => screens::device_selection(ctx, &self.devices),
            Screen::LatencySelection { device } => screens::latency_selection(ctx, device),
            Screen::Telemetry => self.render_telemetry(ctx),
        };
        if let Some(action) = action {
            self.perform(action);
        }
    }
}
