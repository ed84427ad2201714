//! Theme and styling for the pitch deck
//!
//! Every deck is dark with a single brand accent. The accent comes from the
//! deployment config, so re-skinning for a new prospect is one hex string.

use crate::config::parse_hex_color;
use egui::{Color32, FontFamily, FontId, Rounding, Stroke, Vec2, Visuals};

/// Fallback accent when the configured color does not parse
const DEFAULT_ACCENT: Color32 = Color32::from_rgb(212, 175, 55);

/// Application theme configuration
#[derive(Clone, Debug)]
pub struct Theme {
    /// Brand accent (gold by default)
    pub accent: Color32,
    /// Hover variant of the accent
    pub accent_light: Color32,
    /// Revenue recovered, positive figures
    pub success: Color32,
    /// Revenue lost, errors, "End Call"
    pub error: Color32,

    /// Background colors
    pub bg_primary: Color32,
    pub bg_card: Color32,
    pub bg_subtle: Color32,

    /// Text colors
    pub text_primary: Color32,
    pub text_secondary: Color32,
    pub text_muted: Color32,

    /// Border radius for buttons
    pub button_rounding: Rounding,
    /// Border radius for cards/panels
    pub card_rounding: Rounding,

    /// Standard spacing
    pub spacing: f32,
    /// Large spacing
    pub spacing_lg: f32,
    /// Small spacing
    pub spacing_sm: f32,
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark(DEFAULT_ACCENT)
    }
}

impl Theme {
    /// Dark theme around an accent color
    pub fn dark(accent: Color32) -> Self {
        Self {
            accent,
            accent_light: lighten(accent, 0.25),
            success: Color32::from_rgb(34, 197, 94),
            error: Color32::from_rgb(239, 68, 68),

            bg_primary: Color32::from_rgb(0, 0, 0),
            bg_card: Color32::from_rgb(26, 26, 26),
            bg_subtle: Color32::from_rgb(39, 39, 42),

            text_primary: Color32::from_rgb(250, 250, 250),
            text_secondary: Color32::from_rgb(209, 213, 219),
            text_muted: Color32::from_rgb(161, 161, 170),

            button_rounding: Rounding::same(12.0),
            card_rounding: Rounding::same(24.0),

            spacing: 16.0,
            spacing_lg: 32.0,
            spacing_sm: 8.0,
        }
    }

    /// Theme for a `#RRGGBB` accent; invalid colors fall back to gold
    pub fn from_hex(hex: &str) -> Self {
        let accent = parse_hex_color(hex)
            .map(|[r, g, b]| Color32::from_rgb(r, g, b))
            .unwrap_or_else(|| {
                tracing::warn!(color = %hex, "Invalid theme color, using default accent");
                DEFAULT_ACCENT
            });
        Self::dark(accent)
    }

    /// Apply this theme to egui
    pub fn apply(&self, ctx: &egui::Context) {
        let mut visuals = Visuals::dark();

        visuals.panel_fill = self.bg_primary;
        visuals.window_fill = self.bg_card;
        visuals.extreme_bg_color = self.bg_subtle;

        visuals.widgets.noninteractive.bg_fill = self.bg_card;
        visuals.widgets.noninteractive.fg_stroke = Stroke::new(1.0, self.text_muted);

        visuals.widgets.inactive.bg_fill = self.bg_subtle;
        visuals.widgets.inactive.fg_stroke = Stroke::new(1.0, self.text_secondary);

        visuals.widgets.hovered.bg_fill = self.accent.gamma_multiply(0.8);
        visuals.widgets.hovered.fg_stroke = Stroke::new(1.0, self.text_primary);

        visuals.widgets.active.bg_fill = self.accent;
        visuals.widgets.active.fg_stroke = Stroke::new(1.0, self.text_primary);

        // slider rails and handles pick up the accent
        visuals.selection.bg_fill = self.accent;
        visuals.selection.stroke = Stroke::new(1.0, self.accent);

        visuals.hyperlink_color = self.accent;

        visuals.window_rounding = self.card_rounding;
        visuals.window_stroke = Stroke::new(1.0, self.bg_subtle);

        ctx.set_visuals(visuals);
        ctx.set_fonts(egui::FontDefinitions::default());

        let mut style = (*ctx.style()).clone();
        style.spacing.item_spacing = Vec2::splat(self.spacing_sm);
        style.spacing.window_margin = egui::Margin::same(self.spacing);
        style.spacing.button_padding = Vec2::new(self.spacing, self.spacing_sm);
        style.spacing.slider_width = 280.0;

        style.text_styles.insert(
            egui::TextStyle::Heading,
            FontId::new(40.0, FontFamily::Proportional),
        );
        style.text_styles.insert(
            egui::TextStyle::Body,
            FontId::new(16.0, FontFamily::Proportional),
        );
        style.text_styles.insert(
            egui::TextStyle::Monospace,
            FontId::new(12.0, FontFamily::Monospace),
        );
        style.text_styles.insert(
            egui::TextStyle::Button,
            FontId::new(16.0, FontFamily::Proportional),
        );
        style.text_styles.insert(
            egui::TextStyle::Small,
            FontId::new(12.0, FontFamily::Proportional),
        );

        ctx.set_style(style);
    }

    /// Translucent accent for pills and icon discs
    pub fn accent_tint(&self) -> Color32 {
        self.accent.gamma_multiply(0.12)
    }

    /// Thin accent border used on highlighted cards
    pub fn accent_stroke(&self) -> Stroke {
        Stroke::new(1.0, self.accent.gamma_multiply(0.3))
    }

    /// Hairline border on neutral cards
    pub fn subtle_stroke(&self) -> Stroke {
        Stroke::new(1.0, Color32::from_white_alpha(25))
    }
}

fn lighten(color: Color32, amount: f32) -> Color32 {
    let mix = |c: u8| (c as f32 + (255.0 - c as f32) * amount).round() as u8;
    Color32::from_rgb(mix(color.r()), mix(color.g()), mix(color.b()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accent_from_config_color() {
        let theme = Theme::from_hex("#1E90FF");
        assert_eq!(theme.accent, Color32::from_rgb(0x1e, 0x90, 0xff));
    }

    #[test]
    fn test_invalid_color_falls_back_to_gold() {
        assert_eq!(Theme::from_hex("gold").accent, DEFAULT_ACCENT);
        assert_eq!(Theme::from_hex("").accent, DEFAULT_ACCENT);
    }

    #[test]
    fn test_accent_light_is_lighter() {
        let theme = Theme::default();
        assert!(theme.accent_light.r() >= theme.accent.r());
        assert!(theme.accent_light.b() > theme.accent.b());
    }
}
