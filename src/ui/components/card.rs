//! Small building blocks shared by the slides

use crate::ui::theme::Theme;
use egui::{Color32, RichText};

/// Rounded accent pill, e.g. "THE SOLUTION"
pub fn pill(ui: &mut egui::Ui, theme: &Theme, text: &str) -> egui::Response {
    egui::Frame::none()
        .fill(theme.accent_tint())
        .stroke(theme.accent_stroke())
        .rounding(egui::Rounding::same(999.0))
        .inner_margin(egui::Margin::symmetric(14.0, 4.0))
        .show(ui, |ui| {
            ui.label(
                RichText::new(text.to_uppercase())
                    .size(12.0)
                    .strong()
                    .color(theme.accent),
            )
        })
        .inner
}

/// Dark card with a hairline border
pub fn card_frame(theme: &Theme) -> egui::Frame {
    egui::Frame::none()
        .fill(theme.bg_card)
        .stroke(theme.subtle_stroke())
        .rounding(theme.card_rounding)
        .inner_margin(egui::Margin::same(theme.spacing_lg))
}

/// Card with the accent border, for the slide's key figure
pub fn highlight_frame(theme: &Theme) -> egui::Frame {
    card_frame(theme).stroke(theme.accent_stroke())
}

/// Leading mark followed by wrapped text
pub fn bullet(ui: &mut egui::Ui, mark: &str, mark_color: Color32, text: RichText) {
    ui.horizontal_wrapped(|ui| {
        ui.label(RichText::new(mark).color(mark_color).strong());
        ui.label(text);
    });
}
