//! Slide 5: the offer and the booking calendar

use crate::config::DeckConfig;
use crate::scheduling::BookingLink;
use crate::ui::components::{bullet, card_frame, pill};
use crate::ui::theme::Theme;
use egui::{Color32, RichText, Vec2};
use tracing::{debug, info};

pub const BOOK_LABEL: &str = "Book Your Strategy Call";

pub fn benefits(config: &DeckConfig) -> [String; 3] {
    [
        "First AI Agent Built Free".to_string(),
        "Zero Setup Fees".to_string(),
        format!("Tailored for {} Workflows", config.client.industry),
    ]
}

pub fn show(ui: &mut egui::Ui, config: &DeckConfig, theme: &Theme) {
    ui.columns(2, |columns| {
        let ui = &mut columns[0];
        pill(ui, theme, "Next Steps");
        ui.add_space(theme.spacing_sm);
        ui.label(
            RichText::new("Let's Build The Future of")
                .heading()
                .strong()
                .color(theme.text_primary),
        );
        ui.label(
            RichText::new(&config.client.name)
                .heading()
                .strong()
                .color(theme.accent),
        );
        ui.add_space(theme.spacing);

        for benefit in benefits(config) {
            bullet(
                ui,
                "✔",
                theme.accent,
                RichText::new(benefit).size(20.0).color(theme.text_secondary),
            );
        }
        ui.add_space(theme.spacing);

        card_frame(theme)
            .fill(Color32::from_white_alpha(13))
            .rounding(theme.button_rounding)
            .show(ui, |ui| {
                ui.label(
                    RichText::new(
                        "\"We don't just build homes, we build legacies.\"\n\
                         Let AI handle the noise so you can focus on the craft.",
                    )
                    .italics()
                    .size(14.0)
                    .color(theme.text_muted),
                );
            });

        booking_card(&mut columns[1], config, theme);
    });
}

fn booking_card(ui: &mut egui::Ui, config: &DeckConfig, theme: &Theme) {
    card_frame(theme).show(ui, |ui| {
        ui.vertical_centered(|ui| {
            ui.label(
                RichText::new("Pick a time that works for you")
                    .size(22.0)
                    .strong()
                    .color(theme.text_primary),
            );
            ui.label(
                RichText::new("A 30-minute walkthrough of your custom agent.")
                    .color(theme.text_muted),
            );
            ui.add_space(theme.spacing_lg);

            match BookingLink::from_config(config).url() {
                Ok(url) => {
                    let button = egui::Button::new(
                        RichText::new(BOOK_LABEL).strong().color(Color32::BLACK),
                    )
                    .fill(theme.accent)
                    .rounding(theme.button_rounding);

                    if ui.add_sized(Vec2::new(280.0, 52.0), button).clicked() {
                        info!(url = %url, "Opening booking calendar");
                        ui.ctx().open_url(egui::OpenUrl::new_tab(url.as_str()));
                    }
                    ui.add_space(theme.spacing_sm);
                    ui.label(
                        RichText::new(url.host_str().unwrap_or_default())
                            .small()
                            .color(theme.text_muted),
                    );
                }
                Err(e) => {
                    debug!("Booking link unavailable: {}", e);
                    ui.label(
                        RichText::new("Booking calendar unavailable")
                            .color(theme.error),
                    );
                }
            }
        });
    });
}
