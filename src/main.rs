//! Pitchdeck - reskinnable sales deck with a live voice-agent demo
//!
//! Main entry point for the desktop application.

use anyhow::Result;
use eframe::egui;
use pitchdeck::config::{DeckConfig, Niche};
use pitchdeck::ui::PitchDeckApp;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Selects a built-in persona and copy set, e.g. `dentist`
const NICHE_ENV: &str = "PITCHDECK_NICHE";

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pitchdeck=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting pitch deck");

    let config = load_config();
    info!(client = %config.client.name, agent = %config.agent.name, "Deck configured");

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([800.0, 600.0])
            .with_title(format!("{} - AI Automation Proposal", config.client.name)),
        ..Default::default()
    };

    eframe::run_native(
        "Pitchdeck",
        options,
        Box::new(|cc| Ok(Box::new(PitchDeckApp::new(cc, config)))),
    )
    .map_err(|e| anyhow::anyhow!("Failed to run the deck: {}", e))
}

fn load_config() -> DeckConfig {
    let config = DeckConfig::load_or_default().unwrap_or_else(|e| {
        warn!("Falling back to default config: {}", e);
        DeckConfig::default()
    });

    match std::env::var(NICHE_ENV) {
        Ok(name) => match name.parse::<Niche>() {
            Ok(niche) => {
                info!(niche = ?niche, "Applying niche preset");
                niche.apply(config)
            }
            Err(e) => {
                warn!("Ignoring {}: {}", NICHE_ENV, e);
                config
            }
        },
        Err(_) => config,
    }
}
