//! Slide 1: speed to lead

use crate::ui::components::{bullet, highlight_frame};
use crate::ui::theme::Theme;
use egui::text::{LayoutJob, TextFormat};
use egui::{FontFamily, FontId, RichText};

const REALITY_CHECK: [&str; 3] = [
    "Overwhelmed front desk staff",
    "Leads calling while you're on site",
    "The After-hours voicemail graveyard",
];

pub fn show(ui: &mut egui::Ui, theme: &Theme) {
    ui.vertical_centered(|ui| {
        ui.label(title(theme));
        ui.add_space(theme.spacing_sm);
        ui.label(
            RichText::new("Speed to lead isn't just a metric. It's survival.")
                .size(22.0)
                .color(theme.text_muted),
        );
        ui.add_space(theme.spacing_lg * 1.5);
    });

    ui.columns(2, |columns| {
        highlight_frame(theme).show(&mut columns[0], |ui| {
            ui.label(RichText::new("21x").size(96.0).strong().color(theme.accent));
            ui.label(
                RichText::new("Leads contacted within 5 minutes are 21x more likely to qualify.")
                    .size(18.0)
                    .color(theme.text_secondary),
            );
        });

        let ui = &mut columns[1];
        ui.label(
            RichText::new("The Reality Check")
                .size(24.0)
                .strong()
                .color(theme.text_primary),
        );
        ui.separator();
        ui.add_space(theme.spacing_sm);
        for item in REALITY_CHECK {
            bullet(
                ui,
                "×",
                theme.error,
                RichText::new(item).size(20.0).color(theme.text_muted),
            );
            ui.add_space(theme.spacing_sm);
        }
    });
}

/// "The 5-Minute Rule" with the deadline in red
fn title(theme: &Theme) -> LayoutJob {
    let font = FontId::new(56.0, FontFamily::Proportional);
    let plain = TextFormat::simple(font.clone(), theme.text_primary);
    let mut job = LayoutJob::default();
    job.append("The ", 0.0, plain.clone());
    job.append("5-Minute", 0.0, TextFormat::simple(font, theme.error));
    job.append(" Rule", 0.0, plain);
    job
}
