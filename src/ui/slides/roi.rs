//! Slide 3: the cost of missed calls
//!
//! Four sliders feed `RoiEstimate`; the result is drawn as a two-bar chart
//! and a monthly lift figure.

use crate::config::MetricsConfig;
use crate::roi::{
    format_usd, RoiEstimate, RoiInputs, SliderBounds, CLOSE_RATE_BOUNDS, JOB_VALUE_BOUNDS,
    LEADS_BOUNDS, MISSED_RATE_BOUNDS,
};
use crate::ui::components::{card_frame, pill};
use crate::ui::theme::Theme;
use egui::{Align2, Color32, FontId, Pos2, Rect, RichText, Rounding, Sense, Vec2};

const BAR_HEIGHT: f32 = 40.0;
const LABEL_WIDTH: f32 = 110.0;

pub struct RoiPanel {
    inputs: RoiInputs,
}

impl RoiPanel {
    pub fn new(metrics: &MetricsConfig) -> Self {
        Self {
            inputs: RoiInputs::from_metrics(metrics),
        }
    }

    pub fn inputs(&self) -> &RoiInputs {
        &self.inputs
    }

    pub fn estimate(&self) -> RoiEstimate {
        self.inputs.estimate()
    }

    pub fn show(&mut self, ui: &mut egui::Ui, theme: &Theme) {
        pill(ui, theme, "The Economics");
        ui.label(
            RichText::new("The Cost of Missed Calls")
                .size(34.0)
                .strong()
                .color(theme.text_primary),
        );
        ui.add_space(theme.spacing_lg);

        ui.columns(2, |columns| {
            card_frame(theme).show(&mut columns[0], |ui| self.show_controls(ui, theme));
            show_results(&mut columns[1], theme, &self.estimate());
        });
    }

    fn show_controls(&mut self, ui: &mut egui::Ui, theme: &Theme) {
        let inputs = &mut self.inputs;
        let plain = theme.text_primary;

        let leads = inputs.monthly_leads.to_string();
        slider(
            ui,
            theme,
            ("Monthly Leads", &leads, plain),
            &mut inputs.monthly_leads,
            &LEADS_BOUNDS,
        );
        ui.add_space(theme.spacing);

        let missed = format!("{}%", inputs.missed_rate_pct);
        slider(
            ui,
            theme,
            ("Missed Call Rate (%)", &missed, theme.error),
            &mut inputs.missed_rate_pct,
            &MISSED_RATE_BOUNDS,
        );
        ui.label(
            RichText::new("Industry Average: 30-40%")
                .small()
                .color(theme.text_muted),
        );
        ui.add_space(theme.spacing);

        let job_value = format_usd(inputs.avg_job_value as f64);
        slider(
            ui,
            theme,
            ("Avg Job Value", &job_value, plain),
            &mut inputs.avg_job_value,
            &JOB_VALUE_BOUNDS,
        );
        ui.add_space(theme.spacing);

        let close = format!("{}%", inputs.close_rate_pct);
        slider(
            ui,
            theme,
            ("Close Rate (%)", &close, plain),
            &mut inputs.close_rate_pct,
            &CLOSE_RATE_BOUNDS,
        );
    }
}

/// Label row plus a bounded slider without its own value text
fn slider(
    ui: &mut egui::Ui,
    theme: &Theme,
    (label, value_text, value_color): (&str, &str, Color32),
    value: &mut u32,
    bounds: &SliderBounds,
) {
    ui.horizontal(|ui| {
        ui.label(RichText::new(label.to_uppercase()).size(13.0).color(theme.text_muted));
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            ui.label(RichText::new(value_text).strong().color(value_color));
        });
    });
    let width = ui.available_width();
    ui.spacing_mut().slider_width = width;
    ui.add(
        egui::Slider::new(value, bounds.range.clone())
            .step_by(bounds.step as f64)
            .show_value(false),
    );
    *value = bounds.clamp(*value);
}

fn show_results(ui: &mut egui::Ui, theme: &Theme, estimate: &RoiEstimate) {
    bar_chart(ui, theme, estimate);
    ui.add_space(theme.spacing_lg);

    egui::Frame::none()
        .fill(theme.bg_card)
        .rounding(Rounding {
            nw: 0.0,
            sw: 0.0,
            ne: 12.0,
            se: 12.0,
        })
        .inner_margin(egui::Margin::same(theme.spacing_lg))
        .show(ui, |ui| {
            // accent rule on the left edge
            let rect = ui.max_rect().expand(theme.spacing_lg);
            ui.painter().rect_filled(
                Rect::from_min_size(rect.min, Vec2::new(4.0, rect.height())),
                0.0,
                theme.accent,
            );

            ui.label(
                RichText::new("The Opportunity")
                    .size(20.0)
                    .strong()
                    .color(theme.text_primary),
            );
            ui.label(
                RichText::new(
                    "By answering instantly, you stop leakage. By following the \"5-Minute Rule\", qualification rates skyrocket 21x.",
                )
                .color(theme.text_muted),
            );
            ui.add_space(theme.spacing_sm);
            ui.horizontal(|ui| {
                ui.label(
                    RichText::new(format_usd(estimate.recovered_revenue))
                        .size(32.0)
                        .strong()
                        .color(theme.success),
                );
                ui.label(
                    RichText::new("/mo Potential Lift")
                        .size(14.0)
                        .color(theme.text_muted),
                );
            });
        });
}

/// Horizontal bars for lost and recovered revenue
fn bar_chart(ui: &mut egui::Ui, theme: &Theme, estimate: &RoiEstimate) {
    let rows = [
        ("Revenue Lost", estimate.lost_revenue, theme.error),
        ("AI Recovery", estimate.recovered_revenue, theme.success),
    ];
    let max = estimate.lost_revenue.max(estimate.recovered_revenue);

    let height = rows.len() as f32 * (BAR_HEIGHT + theme.spacing_lg);
    let (rect, _) = ui.allocate_exact_size(Vec2::new(ui.available_width(), height), Sense::hover());
    let painter = ui.painter_at(rect);
    let track = (rect.width() - LABEL_WIDTH - 90.0).max(0.0);

    for (i, (label, value, color)) in rows.into_iter().enumerate() {
        let top = rect.top() + i as f32 * (BAR_HEIGHT + theme.spacing_lg);
        let mid = top + BAR_HEIGHT / 2.0;

        painter.text(
            Pos2::new(rect.left() + LABEL_WIDTH - 8.0, mid),
            Align2::RIGHT_CENTER,
            label,
            FontId::proportional(12.0),
            theme.text_muted,
        );

        let width = track * bar_fraction(value, max);
        let bar = Rect::from_min_size(
            Pos2::new(rect.left() + LABEL_WIDTH, top),
            Vec2::new(width, BAR_HEIGHT),
        );
        painter.rect_filled(
            bar,
            Rounding {
                nw: 0.0,
                sw: 0.0,
                ne: 4.0,
                se: 4.0,
            },
            color,
        );
        painter.text(
            Pos2::new(bar.right() + 8.0, mid),
            Align2::LEFT_CENTER,
            format_usd(value),
            FontId::proportional(13.0),
            theme.text_primary,
        );
    }
}

/// Share of the track a bar fills
pub fn bar_fraction(value: f64, max: f64) -> f32 {
    if max <= 0.0 || !value.is_finite() {
        return 0.0;
    }
    (value / max).clamp(0.0, 1.0) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bar_fraction() {
        assert_eq!(bar_fraction(0.0, 0.0), 0.0);
        assert_eq!(bar_fraction(216_000.0, 216_000.0), 1.0);
        assert!((bar_fraction(172_800.0, 216_000.0) - 0.8).abs() < 1e-6);
        assert_eq!(bar_fraction(f64::NAN, 10.0), 0.0);
    }

    #[test]
    fn test_panel_starts_from_metrics() {
        let panel = RoiPanel::new(&MetricsConfig::default());
        assert_eq!(panel.inputs().monthly_leads, 40);
        assert_eq!(panel.inputs().missed_rate_pct, 30);
        assert_eq!(panel.estimate().recovered_revenue, 172_800.0);
    }
}
