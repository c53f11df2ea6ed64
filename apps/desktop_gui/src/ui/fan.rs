//! Maps layout coordinates onto the table area and paints cards.

use eframe::egui;
use egui::{emath::Rot2, Align2, Color32, FontId, Pos2, Rect, Shape, Stroke, Vec2};

pub const CARD_WIDTH: f32 = 80.0;
pub const CARD_HEIGHT: f32 = 120.0;

/// Layout space spans roughly this much around its origin: fan width plus a
/// card on each side, and from the raised fan edges down past the selection row.
const CONTENT_WIDTH: f32 = 1060.0;
const CONTENT_TOP: f32 = -160.0;
const CONTENT_HEIGHT: f32 = 460.0;

const CARD_BACK: Color32 = Color32::from_rgb(58, 36, 92);
const CARD_BACK_SELECTED: Color32 = Color32::from_rgb(112, 68, 160);
const CARD_FACE: Color32 = Color32::from_rgb(244, 236, 214);
const CARD_EDGE: Color32 = Color32::from_rgb(212, 175, 55);
const FACE_TEXT: Color32 = Color32::from_rgb(48, 32, 24);

/// Screen transform for one frame: layout `(0, 0)` lands on `origin` and
/// every layout unit is `scale` points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableView {
    pub origin: Pos2,
    pub scale: f32,
}

impl TableView {
    pub fn fit(rect: Rect) -> Self {
        let scale = (rect.width() / CONTENT_WIDTH)
            .min(rect.height() / CONTENT_HEIGHT)
            .clamp(0.3, 1.0);
        let top = rect.top() + (rect.height() - CONTENT_HEIGHT * scale).max(0.0) / 2.0;
        Self {
            origin: Pos2::new(rect.center().x, top - CONTENT_TOP * scale),
            scale,
        }
    }

    pub fn to_screen(&self, x: f32, y: f32) -> Pos2 {
        self.origin + Vec2::new(x, y) * self.scale
    }

    pub fn to_layout(&self, pos: Pos2) -> (f32, f32) {
        let offset = (pos - self.origin) / self.scale;
        (offset.x, offset.y)
    }

    pub fn card_size(&self, card_scale: f32) -> Vec2 {
        Vec2::new(CARD_WIDTH, CARD_HEIGHT) * card_scale * self.scale
    }
}

/// Corners of a card rectangle rotated about its centre, clockwise from the
/// top-left. Positive rotation turns clockwise on screen.
pub fn card_corners(center: Pos2, size: Vec2, rotation: f32) -> Vec<Pos2> {
    let rot = Rot2::from_angle(rotation);
    let half = size / 2.0;
    [
        Vec2::new(-half.x, -half.y),
        Vec2::new(half.x, -half.y),
        Vec2::new(half.x, half.y),
        Vec2::new(-half.x, half.y),
    ]
    .into_iter()
    .map(|corner| center + rot * corner)
    .collect()
}

pub fn paint_card_back(
    painter: &egui::Painter,
    center: Pos2,
    size: Vec2,
    rotation: f32,
    selected: bool,
    opacity: f32,
) {
    let fill = if selected { CARD_BACK_SELECTED } else { CARD_BACK };
    let stroke = Stroke::new(1.5, CARD_EDGE.gamma_multiply(opacity));
    painter.add(Shape::convex_polygon(
        card_corners(center, size, rotation),
        fill.gamma_multiply(opacity),
        stroke,
    ));
    painter.add(Shape::convex_polygon(
        card_corners(center, size * 0.55, rotation),
        Color32::TRANSPARENT,
        Stroke::new(1.0, CARD_EDGE.gamma_multiply(0.6 * opacity)),
    ));
}

pub fn paint_card_face(
    painter: &egui::Painter,
    center: Pos2,
    size: Vec2,
    name: &str,
    position: Option<&str>,
    opacity: f32,
) {
    painter.add(Shape::convex_polygon(
        card_corners(center, size, 0.0),
        CARD_FACE.gamma_multiply(opacity),
        Stroke::new(1.5, CARD_EDGE.gamma_multiply(opacity)),
    ));
    if size.x < 24.0 {
        return;
    }
    let text_size = (size.x / 7.0).clamp(8.0, 14.0);
    painter.text(
        center,
        Align2::CENTER_CENTER,
        wrap_name(name),
        FontId::proportional(text_size),
        FACE_TEXT.gamma_multiply(opacity),
    );
    if let Some(position) = position {
        painter.text(
            center + Vec2::new(0.0, size.y / 2.0 + text_size),
            Align2::CENTER_CENTER,
            position,
            FontId::proportional(text_size),
            CARD_EDGE.gamma_multiply(opacity),
        );
    }
}

/// Card names are short phrases; break them onto two lines at the middle space.
fn wrap_name(name: &str) -> String {
    let spaces: Vec<usize> = name.match_indices(' ').map(|(index, _)| index).collect();
    match spaces.get(spaces.len() / 2) {
        Some(&index) if name.len() > 12 => format!("{}\n{}", &name[..index], &name[index + 1..]),
        _ => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quarter_turn_swaps_card_extent() {
        let corners = card_corners(Pos2::ZERO, Vec2::new(20.0, 100.0), std::f32::consts::FRAC_PI_2);
        let max_x = corners.iter().map(|p| p.x).fold(f32::MIN, f32::max);
        let max_y = corners.iter().map(|p| p.y).fold(f32::MIN, f32::max);
        assert!((max_x - 50.0).abs() < 1e-3);
        assert!((max_y - 10.0).abs() < 1e-3);
    }

    #[test]
    fn view_fits_small_windows_by_scaling_down() {
        let rect = Rect::from_min_size(Pos2::ZERO, Vec2::new(530.0, 460.0));
        let view = TableView::fit(rect);
        assert!((view.scale - 0.5).abs() < 1e-3);
        assert_eq!(view.to_screen(0.0, 0.0).x, 265.0);
        let (x, y) = view.to_layout(view.to_screen(-450.0, 200.0));
        assert!((x + 450.0).abs() < 1e-3);
        assert!((y - 200.0).abs() < 1e-3);
    }

    #[test]
    fn long_names_wrap_once() {
        assert_eq!(wrap_name("The Fool"), "The Fool");
        assert_eq!(wrap_name("Queen of Pentacles"), "Queen of\nPentacles");
    }
}
