//! Slide 2: the live voice-agent demo
//!
//! `DemoPanel` owns the UI side of a call. Starting a call resolves a model
//! over the network, so `VoiceConnector::start` runs on a short-lived thread
//! and the panel only polls shared state while rendering. A start requested
//! while an earlier, already cancelled attempt is still connecting is queued
//! and run by that same thread.

use crate::config::{AgentPersona, DeckConfig, HeroCopy};
use crate::session::{SessionState, VoiceConnector};
use crate::ui::components::{card_frame, pill, AudioVisualizer};
use crate::ui::theme::Theme;
use crate::PitchError;
use egui::{Color32, RichText, Vec2};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Repaint interval while a call is running
const LIVE_REPAINT: Duration = Duration::from_millis(33);

pub const START_LABEL: &str = "Start Live Demo";
pub const END_LABEL: &str = "End Call";

/// Bookkeeping for the start thread
#[derive(Default)]
struct Launch {
    /// A start thread is running
    starting: bool,
    /// Start again if the running attempt leaves no call up
    queued: bool,
}

pub struct DemoPanel {
    connector: Option<Arc<VoiceConnector>>,
    /// Why no connector could be built (missing key, bad runtime)
    setup_error: Option<PitchError>,
    error: Arc<Mutex<Option<String>>>,
    launch: Arc<Mutex<Launch>>,
    persona: AgentPersona,
    hero: HeroCopy,
}

impl DemoPanel {
    pub fn new(config: &DeckConfig, connector: Arc<VoiceConnector>) -> Self {
        Self::build(config, Some(connector), None)
    }

    /// Panel whose start button only reports why the demo cannot run
    pub fn unavailable(config: &DeckConfig, reason: PitchError) -> Self {
        Self::build(config, None, Some(reason))
    }

    fn build(
        config: &DeckConfig,
        connector: Option<Arc<VoiceConnector>>,
        setup_error: Option<PitchError>,
    ) -> Self {
        Self {
            connector,
            setup_error,
            error: Arc::new(Mutex::new(None)),
            launch: Arc::new(Mutex::new(Launch::default())),
            persona: config.agent.clone(),
            hero: config.hero.clone(),
        }
    }

    /// A call is connecting or running
    pub fn is_live(&self) -> bool {
        self.is_starting()
            || self
                .connector
                .as_ref()
                .is_some_and(|c| c.state().is_active())
    }

    fn is_starting(&self) -> bool {
        self.launch.lock().starting
    }

    pub fn state(&self) -> SessionState {
        self.connector
            .as_ref()
            .map(|c| c.state())
            .unwrap_or_default()
    }

    /// Error line under the call button
    pub fn error(&self) -> Option<String> {
        if let Some(message) = self.error.lock().clone() {
            return Some(message);
        }
        self.connector.as_ref().and_then(|c| c.last_error())
    }

    pub fn status_text(&self) -> &'static str {
        match &self.connector {
            Some(_) if self.is_starting() => "Connecting...",
            Some(connector) => connector.status_text(),
            None => "Ready to take the call...",
        }
    }

    pub fn start(&mut self, ctx: &egui::Context) {
        *self.error.lock() = None;

        let connector = match (&self.connector, &self.setup_error) {
            (Some(connector), _) => Arc::clone(connector),
            (None, Some(reason)) => {
                *self.error.lock() = Some(reason.user_message());
                return;
            }
            (None, None) => return,
        };

        {
            let mut launch = self.launch.lock();
            if launch.starting {
                launch.queued = true;
                return;
            }
            launch.starting = true;
        }

        let error = Arc::clone(&self.error);
        let launch = Arc::clone(&self.launch);
        let ctx = ctx.clone();

        let spawned = thread::Builder::new()
            .name("demo-start".to_string())
            .spawn(move || loop {
                let repaint = ctx.clone();
                match connector.start(move |_| repaint.request_repaint()) {
                    Ok(()) => info!("Live demo connected"),
                    Err(PitchError::CallCancelled(e)) => debug!("Demo start cancelled: {}", e),
                    Err(e) => {
                        warn!("Live demo failed to start: {}", e);
                        *error.lock() = Some(e.user_message());
                    }
                }

                let mut pending = launch.lock();
                if pending.queued && !connector.state().is_active() {
                    pending.queued = false;
                    debug!("Starting the queued demo call");
                    continue;
                }
                *pending = Launch::default();
                drop(pending);
                ctx.request_repaint();
                break;
            });

        if let Err(e) = spawned {
            *self.launch.lock() = Launch::default();
            *self.error.lock() = Some(PitchError::from(e).user_message());
        }
    }

    /// End the call, or cancel one that is still connecting
    pub fn stop(&mut self) {
        if let Some(connector) = &self.connector {
            connector.stop();
        }
        // the start thread clears `starting` once its attempt returns
        self.launch.lock().queued = false;
    }

    /// End the call if one is up; an idle panel keeps its status line
    pub fn hang_up(&mut self) {
        if self.is_live() {
            info!("Ending live demo");
            self.stop();
        }
    }

    pub fn show(&mut self, ui: &mut egui::Ui, theme: &Theme) {
        ui.vertical_centered(|ui| {
            pill(ui, theme, "The Solution");
            ui.add_space(theme.spacing);
            ui.label(
                RichText::new(&self.hero.headline)
                    .heading()
                    .strong()
                    .color(theme.text_primary),
            );
            ui.label(
                RichText::new(&self.hero.highlight)
                    .heading()
                    .strong()
                    .color(theme.accent),
            );
            ui.add_space(theme.spacing_sm);
            ui.label(
                RichText::new(&self.hero.subtitle)
                    .size(20.0)
                    .color(theme.text_muted),
            );
            ui.add_space(theme.spacing_lg);

            ui.allocate_ui(Vec2::new(360.0, 0.0), |ui| {
                card_frame(theme)
                    .fill(Color32::from_rgb(24, 24, 27))
                    .show(ui, |ui| self.show_card(ui, theme));
            });
        });

        if self.is_live() {
            ui.ctx().request_repaint_after(LIVE_REPAINT);
        }
    }

    fn show_card(&mut self, ui: &mut egui::Ui, theme: &Theme) {
        ui.vertical_centered(|ui| {
            let live = self.is_live();

            match (&self.connector, live) {
                (Some(connector), true) => {
                    let snapshot = connector.level_meter().snapshot();
                    AudioVisualizer::new(theme).bins(&snapshot.bins).show(ui);
                }
                _ => idle_badge(ui, theme),
            }

            ui.add_space(theme.spacing);
            ui.label(
                RichText::new(self.status_text().to_uppercase())
                    .size(13.0)
                    .color(theme.text_muted),
            );
            ui.label(
                RichText::new(&self.persona.name)
                    .size(26.0)
                    .strong()
                    .color(theme.text_primary),
            );
            ui.label(RichText::new(&self.persona.title).size(14.0).color(theme.text_muted));
            ui.add_space(theme.spacing);

            let button = if live {
                egui::Button::new(RichText::new(END_LABEL).strong().color(theme.error))
                    .fill(theme.error.gamma_multiply(0.12))
                    .stroke(egui::Stroke::new(1.0, theme.error.gamma_multiply(0.3)))
            } else {
                egui::Button::new(RichText::new(START_LABEL).strong().color(Color32::BLACK))
                    .fill(theme.accent)
            };
            let clicked = ui
                .add_sized(
                    Vec2::new(ui.available_width(), 52.0),
                    button.rounding(theme.button_rounding),
                )
                .clicked();

            if clicked {
                if live {
                    self.stop();
                } else {
                    self.start(ui.ctx());
                }
            }

            if let Some(error) = self.error() {
                ui.add_space(theme.spacing_sm);
                ui.label(RichText::new(error).size(12.0).color(theme.error));
            }

            ui.add_space(theme.spacing_sm);
            ui.label(
                RichText::new("*Note: Production agents are custom-tuned for stunning realism.")
                    .size(10.0)
                    .italics()
                    .color(theme.text_muted.gamma_multiply(0.5)),
            );
        });
    }
}

/// Phone disc shown before a call starts
fn idle_badge(ui: &mut egui::Ui, theme: &Theme) {
    let (rect, _) = ui.allocate_exact_size(Vec2::splat(128.0), egui::Sense::hover());
    let painter = ui.painter();
    let center = rect.center();
    painter.circle_filled(center, 48.0, theme.accent_tint());
    painter.circle_stroke(center, 48.0, theme.accent_stroke());
    painter.text(
        center,
        egui::Align2::CENTER_CENTER,
        "📞",
        egui::FontId::proportional(36.0),
        theme.accent,
    );
}
