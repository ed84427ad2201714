//! Slide 4: what a production agent adds beyond the demo

use crate::config::DeckConfig;
use crate::ui::components::{bullet, card_frame, highlight_frame, pill};
use crate::ui::theme::Theme;
use egui::{Color32, RichText};

const CAPABILITIES: [(&str, &str); 4] = [
    ("24/7 Receptionist", "Intelligent call routing & FAQ handling."),
    ("Lead Nurture", "Long-term follow-up to convert cold leads."),
    ("Multi-Channel", "Seamless SMS & Email integration."),
    (
        "Support & Dispatch",
        "Ticket creation and field team coordination.",
    ),
];

const ADVANTAGES: [&str; 4] = [
    "Trained on your historical best sales calls.",
    "Deep integration with your CRM & Calendar.",
    "Hyper-realistic voice cloning & latency optimization.",
    "Universal Capture: No matter where leads come from (Phone, Forms, SEO), we contact them instantly.",
];

pub fn show(ui: &mut egui::Ui, config: &DeckConfig, theme: &Theme) {
    ui.vertical_centered(|ui| {
        pill(ui, theme, "Beyond The Demo");
        ui.add_space(theme.spacing);
        ui.label(
            RichText::new("Precision Tailored to")
                .heading()
                .strong()
                .color(theme.text_primary),
        );
        ui.label(
            RichText::new("Your Business DNA")
                .heading()
                .strong()
                .color(theme.accent),
        );
        ui.add_space(theme.spacing_sm);
        ui.label(
            RichText::new(
                "This demo is just a sketch of what's possible. Your production agent will be \
                 trained on your specific calls, pricing models, and objection handlers, \
                 delivering a level of realism and quality far beyond standard capabilities.",
            )
            .size(19.0)
            .color(theme.text_muted),
        );
        ui.add_space(theme.spacing_lg);
    });

    ui.columns(2, |columns| {
        highlight_frame(theme)
            .fill(theme.bg_card.gamma_multiply(0.5))
            .show(&mut columns[0], |ui| {
                ui.label(
                    RichText::new("The Custom Advantage")
                        .size(24.0)
                        .strong()
                        .color(theme.text_primary),
                );
                ui.label(
                    RichText::new(format!(
                        "We don't do \"one-size-fits-all.\" We build a bespoke neural architecture for {}.",
                        config.client.name
                    ))
                    .color(theme.text_muted),
                );
                ui.add_space(theme.spacing);
                for advantage in ADVANTAGES {
                    bullet(
                        ui,
                        "✔",
                        theme.accent,
                        RichText::new(advantage).color(theme.text_secondary),
                    );
                }
            });

        let ui = &mut columns[1];
        for pair in CAPABILITIES.chunks(2) {
            ui.columns(2, |cards| {
                for (card, (title, description)) in cards.iter_mut().zip(pair) {
                    capability_card(card, theme, title, description);
                }
            });
            ui.add_space(theme.spacing);
        }
    });
}

fn capability_card(ui: &mut egui::Ui, theme: &Theme, title: &str, description: &str) {
    card_frame(theme)
        .fill(Color32::from_white_alpha(13))
        .inner_margin(egui::Margin::same(theme.spacing + 8.0))
        .show(ui, |ui| {
            ui.set_min_height(110.0);
            ui.label(RichText::new(title).size(18.0).strong().color(theme.text_primary));
            ui.label(RichText::new(description).size(14.0).color(theme.text_muted));
        });
}
