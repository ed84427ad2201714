//! Main application struct and eframe integration
//!
//! This module contains the `PitchDeckApp` that implements `eframe::App`.

use crate::config::DeckConfig;
use crate::deck::{Slide, SlideNavigator};
use crate::llm::{GeminiClient, LoggingGenerator, TextGenerator};
use crate::session::VoiceConnector;
use crate::speech::default_backends;
use crate::ui::components::{Direction, NavButton, ProgressDots};
use crate::ui::slides::{self, DemoPanel, RoiPanel};
use crate::ui::theme::Theme;
use crate::Result;
use egui::{self, CentralPanel, RichText, TopBottomPanel};
use std::sync::Arc;
use tracing::{info, warn};

/// Header shown when no company name is configured
const AGENCY_NAME: (&str, &str) = ("NDO", "VENTURES");

pub const HEADER_TAGLINE: &str = "AI Automation Proposal";

/// Main pitch deck application
pub struct PitchDeckApp {
    config: DeckConfig,
    theme: Theme,
    navigator: SlideNavigator,
    roi: RoiPanel,
    demo: DemoPanel,
    /// Whether the theme has been applied to the context
    initialized: bool,
}

impl PitchDeckApp {
    /// Create the application for eframe
    pub fn new(cc: &eframe::CreationContext<'_>, config: DeckConfig) -> Self {
        let mut app = Self::from_config(config);
        app.theme.apply(&cc.egui_ctx);
        app.initialized = true;
        app
    }

    /// Build the deck without a window; the theme is applied on the first frame
    pub fn from_config(config: DeckConfig) -> Self {
        let demo = match build_connector(&config) {
            Ok(connector) => DemoPanel::new(&config, Arc::new(connector)),
            Err(e) => {
                warn!("Live demo disabled: {}", e);
                DemoPanel::unavailable(&config, e)
            }
        };
        Self::with_demo(config, demo)
    }

    /// Build the deck around an existing demo panel
    pub fn with_demo(config: DeckConfig, demo: DemoPanel) -> Self {
        Self {
            theme: Theme::from_hex(&config.client.theme_color),
            navigator: SlideNavigator::new(),
            roi: RoiPanel::new(&config.metrics),
            demo,
            config,
            initialized: false,
        }
    }

    pub fn current_slide(&self) -> Slide {
        self.navigator.current()
    }

    pub fn demo(&self) -> &DemoPanel {
        &self.demo
    }

    pub fn roi(&self) -> &RoiPanel {
        &self.roi
    }

    pub fn next_slide(&mut self) {
        self.navigate(|nav| {
            nav.next();
        });
    }

    pub fn previous_slide(&mut self) {
        self.navigate(|nav| {
            nav.previous();
        });
    }

    /// Move through the deck; leaving the Solution slide ends any call
    fn navigate(&mut self, step: impl FnOnce(&mut SlideNavigator)) {
        let before = self.navigator.current();
        step(&mut self.navigator);
        let after = self.navigator.current();

        if before != after {
            info!(from = before.title(), to = after.title(), "Slide changed");
        }
        if before == Slide::Solution && after != Slide::Solution {
            self.demo.hang_up();
        }
    }

    /// Render one frame; `update` delegates here so tests can drive it directly
    pub fn show(&mut self, ctx: &egui::Context) {
        if !self.initialized {
            self.theme.apply(ctx);
            self.initialized = true;
        }

        self.handle_keyboard(ctx);
        self.show_header(ctx);
        self.show_navigation(ctx);
        self.show_slide(ctx);
    }

    fn handle_keyboard(&mut self, ctx: &egui::Context) {
        // sliders keep their own arrow-key handling
        if ctx.memory(|m| m.focused().is_some()) {
            return;
        }
        let (next, previous) = ctx.input(|i| {
            (
                i.key_pressed(egui::Key::ArrowRight),
                i.key_pressed(egui::Key::ArrowLeft),
            )
        });
        if next {
            self.next_slide();
        } else if previous {
            self.previous_slide();
        }
    }

    fn show_header(&self, ctx: &egui::Context) {
        TopBottomPanel::top("header")
            .frame(
                egui::Frame::none()
                    .fill(self.theme.bg_primary)
                    .inner_margin(self.theme.spacing_lg),
            )
            .show_separator_line(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    let (first, rest) = header_lines(&self.config.client.name);
                    ui.vertical(|ui| {
                        ui.spacing_mut().item_spacing.y = 0.0;
                        for line in [first, rest] {
                            ui.label(
                                RichText::new(line)
                                    .size(24.0)
                                    .strong()
                                    .color(self.theme.text_primary),
                            );
                        }
                    });

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Min), |ui| {
                        ui.label(
                            RichText::new(HEADER_TAGLINE.to_uppercase())
                                .monospace()
                                .color(self.theme.accent),
                        );
                    });
                });
            });
    }

    fn show_navigation(&mut self, ctx: &egui::Context) {
        let mut step = None;

        TopBottomPanel::bottom("navigation")
            .frame(
                egui::Frame::none()
                    .fill(self.theme.bg_primary)
                    .inner_margin(self.theme.spacing_lg),
            )
            .show_separator_line(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ProgressDots::new(self.navigator.current_index(), Slide::COUNT, &self.theme)
                        .show(ui);

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if NavButton::new(Direction::Next, &self.theme).show(ui).clicked() {
                            step = Some(Direction::Next);
                        }
                        if NavButton::new(Direction::Previous, &self.theme)
                            .show(ui)
                            .clicked()
                        {
                            step = Some(Direction::Previous);
                        }
                    });
                });
            });

        match step {
            Some(Direction::Next) => self.next_slide(),
            Some(Direction::Previous) => self.previous_slide(),
            None => {}
        }
    }

    fn show_slide(&mut self, ctx: &egui::Context) {
        let theme = &self.theme;
        let slide = self.navigator.current();

        CentralPanel::default()
            .frame(
                egui::Frame::none()
                    .fill(theme.bg_primary)
                    .inner_margin(egui::Margin::symmetric(theme.spacing_lg, theme.spacing)),
            )
            .show(ctx, |ui| {
                egui::ScrollArea::vertical()
                    .id_salt(("slide", slide.index()))
                    .auto_shrink([false, false])
                    .show(ui, |ui| {
                        ui.set_max_width(1100.0);
                        match slide {
                            Slide::Problem => slides::problem::show(ui, theme),
                            Slide::Solution => self.demo.show(ui, theme),
                            Slide::Roi => self.roi.show(ui, theme),
                            Slide::Possibilities => {
                                slides::possibilities::show(ui, &self.config, theme)
                            }
                            Slide::Offer => slides::offer::show(ui, &self.config, theme),
                        }
                    });
            });
    }
}

impl eframe::App for PitchDeckApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.show(ctx);
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.demo.hang_up();
    }
}

/// Generator and speech backends for the live demo
fn build_connector(config: &DeckConfig) -> Result<VoiceConnector> {
    let client = GeminiClient::from_config(&config.generation)?;
    let generator: Arc<dyn TextGenerator> = Arc::new(LoggingGenerator::new(Arc::new(client)));
    VoiceConnector::new(config, default_backends(config), generator)
}

/// Company name split into the two header lines: first word, then the rest
pub fn header_lines(company: &str) -> (String, String) {
    let mut words = company.split_whitespace();
    match words.next() {
        Some(first) => {
            let rest = words.collect::<Vec<_>>().join(" ");
            if rest.is_empty() {
                (first.to_string(), AGENCY_NAME.1.to_string())
            } else {
                (first.to_string(), rest)
            }
        }
        None => (AGENCY_NAME.0.to_string(), AGENCY_NAME.1.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_lines() {
        assert_eq!(
            header_lines("Kerr Design Build"),
            ("Kerr".to_string(), "Design Build".to_string())
        );
        assert_eq!(
            header_lines("  Bright   Smile Dental "),
            ("Bright".to_string(), "Smile Dental".to_string())
        );
    }

    #[test]
    fn test_header_falls_back_to_agency() {
        assert_eq!(
            header_lines(""),
            ("NDO".to_string(), "VENTURES".to_string())
        );
        assert_eq!(
            header_lines("Acme"),
            ("Acme".to_string(), "VENTURES".to_string())
        );
    }
}
