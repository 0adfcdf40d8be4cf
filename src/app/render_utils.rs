use eframe::egui::{Color32, Painter, Pos2, Rect, Stroke, Vec2, vec2};

const MIN_ZOOM: f32 = 0.05;
const MAX_ZOOM: f32 = 8.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) struct ViewTransform {
    pub(super) pan: Vec2,
    pub(super) zoom: f32,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            pan: Vec2::ZERO,
            zoom: 1.0,
        }
    }
}

impl ViewTransform {
    pub(super) fn to_screen(self, rect: Rect, world: Vec2) -> Pos2 {
        rect.center() + self.pan + world * self.zoom
    }

    pub(super) fn to_world(self, rect: Rect, screen: Pos2) -> Vec2 {
        (screen - rect.center() - self.pan) / self.zoom
    }

    /// Scales by `factor` while the world point under `anchor` stays put.
    pub(super) fn zoom_at(&mut self, rect: Rect, anchor: Pos2, factor: f32) {
        let world = self.to_world(rect, anchor);
        self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        self.pan = anchor - rect.center() - world * self.zoom;
    }
}

pub(super) fn draw_background(painter: &Painter, rect: Rect, view: ViewTransform) {
    painter.rect_filled(rect, 0.0, Color32::from_rgb(250, 250, 250));

    let step = (64.0 * view.zoom.clamp(0.5, 2.0)).max(24.0);
    let origin = rect.center() + view.pan;
    let stroke = Stroke::new(1.0, Color32::from_rgba_unmultiplied(0, 0, 0, 14));

    let mut x = rect.left() + (origin.x - rect.left()).rem_euclid(step);
    while x < rect.right() {
        painter.line_segment([Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())], stroke);
        x += step;
    }

    let mut y = rect.top() + (origin.y - rect.top()).rem_euclid(step);
    while y < rect.bottom() {
        painter.line_segment([Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)], stroke);
        y += step;
    }
}

pub(super) fn circle_visible(rect: Rect, position: Pos2, radius: f32) -> bool {
    !(position.x + radius < rect.left()
        || position.x - radius > rect.right()
        || position.y + radius < rect.top()
        || position.y - radius > rect.bottom())
}

pub(super) fn segment_visible(rect: Rect, start: Pos2, end: Pos2, padding: f32) -> bool {
    Rect::from_two_pos(start, end)
        .expand(padding)
        .intersects(rect)
}

pub(super) fn arrowhead(tip: Pos2, direction: Vec2, size: f32) -> [Pos2; 3] {
    let along = direction.normalized();
    let across = along.rot90();
    let base = tip - along * size;
    [tip, base + across * (size * 0.5), base - across * (size * 0.5)]
}

pub(super) fn circle_outline(center: Pos2, radius: f32) -> Vec<Pos2> {
    let segments = ((radius * 0.8) as usize).clamp(16, 96);
    (0..=segments)
        .map(|step| {
            let angle = step as f32 / segments as f32 * std::f32::consts::TAU;
            center + vec2(angle.cos(), angle.sin()) * radius
        })
        .collect()
}
