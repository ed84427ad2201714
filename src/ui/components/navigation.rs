//! Deck navigation chrome: round chevron buttons and progress dots

use crate::ui::theme::Theme;
use egui::{Color32, Id, Pos2, Rect, Sense, Stroke, Vec2};

/// Width of the current slide's progress dot
pub const ACTIVE_DOT_WIDTH: f32 = 32.0;
/// Width of every other progress dot
pub const DOT_WIDTH: f32 = 8.0;
const DOT_HEIGHT: f32 = 4.0;
const DOT_TRANSITION_SECS: f32 = 0.3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Previous,
    Next,
}

impl Direction {
    pub fn label(&self) -> &'static str {
        match self {
            Direction::Previous => "Previous slide",
            Direction::Next => "Next slide",
        }
    }
}

/// Round button with a painted chevron
pub struct NavButton<'a> {
    direction: Direction,
    theme: &'a Theme,
}

impl<'a> NavButton<'a> {
    pub fn new(direction: Direction, theme: &'a Theme) -> Self {
        Self { direction, theme }
    }

    pub fn show(self, ui: &mut egui::Ui) -> egui::Response {
        let (rect, response) = ui.allocate_exact_size(Vec2::splat(56.0), Sense::click());
        response.widget_info(|| {
            egui::WidgetInfo::labeled(egui::WidgetType::Button, true, self.direction.label())
        });

        if ui.is_rect_visible(rect) {
            self.paint(ui, rect, &response);
        }

        response.on_hover_cursor(egui::CursorIcon::PointingHand)
    }

    fn paint(&self, ui: &egui::Ui, rect: Rect, response: &egui::Response) {
        let painter = ui.painter();
        let center = rect.center();
        let radius = if response.is_pointer_button_down_on() { 26.0 } else { 28.0 };

        let (fill, ink) = match self.direction {
            Direction::Previous => {
                let alpha = if response.hovered() { 51 } else { 26 };
                (Color32::from_white_alpha(alpha), self.theme.text_primary)
            }
            Direction::Next => {
                let fill = if response.hovered() {
                    self.theme.accent_light
                } else {
                    self.theme.accent
                };
                (fill, Color32::BLACK)
            }
        };

        painter.circle_filled(center, radius, fill);
        if self.direction == Direction::Previous {
            painter.circle_stroke(center, radius, self.theme.subtle_stroke());
        }

        let dx = match self.direction {
            Direction::Previous => -4.0,
            Direction::Next => 4.0,
        };
        let tip = Pos2::new(center.x + dx, center.y);
        let tail_x = center.x - dx;
        painter.line_segment([Pos2::new(tail_x, center.y - 8.0), tip], Stroke::new(2.5, ink));
        painter.line_segment([Pos2::new(tail_x, center.y + 8.0), tip], Stroke::new(2.5, ink));
    }
}

/// Row of progress dots; the current one is stretched
pub struct ProgressDots<'a> {
    current: usize,
    count: usize,
    theme: &'a Theme,
}

impl<'a> ProgressDots<'a> {
    pub fn new(current: usize, count: usize, theme: &'a Theme) -> Self {
        Self {
            current,
            count,
            theme,
        }
    }

    pub fn show(self, ui: &mut egui::Ui) -> egui::Response {
        ui.horizontal(|ui| {
            ui.spacing_mut().item_spacing.x = self.theme.spacing_sm;
            for i in 0..self.count {
                let active = i == self.current;
                let target = dot_width(active);
                let width = ui.ctx().animate_value_with_time(
                    Id::new(("progress_dot", i)),
                    target,
                    DOT_TRANSITION_SECS,
                );
                let (rect, _) =
                    ui.allocate_exact_size(Vec2::new(width, DOT_HEIGHT), Sense::hover());
                let color = if active {
                    self.theme.accent
                } else {
                    Color32::from_white_alpha(51)
                };
                ui.painter().rect_filled(rect, DOT_HEIGHT / 2.0, color);
            }
        })
        .response
    }
}

pub fn dot_width(active: bool) -> f32 {
    if active {
        ACTIVE_DOT_WIDTH
    } else {
        DOT_WIDTH
    }
}
