//! Circular audio visualizer for the live demo card
//!
//! Draws a closed outline whose radius swells with the microphone spectrum:
//! each degree of the circle maps onto the lower half of the analyser bins and
//! pushes the outline out by a quarter of the bin value.

use crate::audio::BIN_COUNT;
use crate::ui::theme::Theme;
use egui::{self, Color32, Pos2, Shape, Stroke, Vec2};

/// Outline radius with silent input, in canvas units
pub const BASE_RADIUS: f32 = 50.0;

/// Side of the square canvas the geometry is defined on
const CANVAS: f32 = 300.0;

/// Circular spectrum outline
pub struct AudioVisualizer<'a> {
    theme: &'a Theme,
    bins: Option<&'a [u8; BIN_COUNT]>,
    size: f32,
}

impl<'a> AudioVisualizer<'a> {
    pub fn new(theme: &'a Theme) -> Self {
        Self {
            theme,
            bins: None,
            size: 128.0,
        }
    }

    /// Spectrum to draw; without one the outline stays at rest
    pub fn bins(mut self, bins: &'a [u8; BIN_COUNT]) -> Self {
        self.bins = Some(bins);
        self
    }

    pub fn size(mut self, size: f32) -> Self {
        self.size = size;
        self
    }

    pub fn show(self, ui: &mut egui::Ui) -> egui::Response {
        let (rect, response) = ui.allocate_exact_size(Vec2::splat(self.size), egui::Sense::hover());
        let scale = self.size / CANVAS;

        let silent = [0u8; BIN_COUNT];
        let bins = self.bins.unwrap_or(&silent);
        let points = outline_points(rect.center(), bins, scale);

        let painter = ui.painter_at(rect);
        // soft glow inside, gold outline on top
        painter.add(Shape::convex_polygon(
            points.clone(),
            glow(self.theme.accent),
            Stroke::NONE,
        ));
        painter.add(Shape::closed_line(points, Stroke::new(3.0 * scale.max(0.5), self.theme.accent)));

        response
    }
}

/// Outline vertices, one per degree, around `center`
pub fn outline_points(center: Pos2, bins: &[u8; BIN_COUNT], scale: f32) -> Vec<Pos2> {
    (0..360)
        .map(|degree| {
            let radians = (degree as f32).to_radians();
            let index = degree * (BIN_COUNT / 2) / 360;
            let radius = BASE_RADIUS + bins[index] as f32 / 4.0;
            center + Vec2::angled(radians) * radius * scale
        })
        .collect()
}

fn glow(accent: Color32) -> Color32 {
    Color32::from_rgba_unmultiplied(accent.r(), accent.g(), accent.b(), 26)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silence_draws_base_circle() {
        let center = Pos2::new(150.0, 150.0);
        let points = outline_points(center, &[0; BIN_COUNT], 1.0);
        assert_eq!(points.len(), 360);
        for p in points {
            assert!((p.distance(center) - BASE_RADIUS).abs() < 1e-3);
        }
    }

    #[test]
    fn test_loud_bins_push_outline_out() {
        let center = Pos2::ZERO;
        let points = outline_points(center, &[255; BIN_COUNT], 1.0);
        let expected = BASE_RADIUS + 255.0 / 4.0;
        assert!(points.iter().all(|p| (p.distance(center) - expected).abs() < 1e-3));
    }

    #[test]
    fn test_only_lower_half_of_spectrum_is_used() {
        let mut bins = [0u8; BIN_COUNT];
        for b in bins.iter_mut().skip(BIN_COUNT / 2) {
            *b = 255;
        }
        let points = outline_points(Pos2::ZERO, &bins, 0.5);
        assert!(points
            .iter()
            .all(|p| (p.distance(Pos2::ZERO) - BASE_RADIUS * 0.5).abs() < 1e-3));
    }
}
