use eframe::egui::{Color32, Painter, Pos2, Rect, Stroke, Vec2};

use super::graph::GraphNode;

pub(super) const MAX_DOCUMENT_RADIUS: f32 = 25.0;
pub(super) const MAX_FOLDER_RADIUS: f32 = 30.0;
/// Extra world-space slack around a node that still counts as a hit.
pub(super) const HIT_SLOP: f32 = 8.0;

const FOLDER_PALETTE: [(f32, f32, f32); 10] = [
    (210.0, 0.50, 0.60),
    (350.0, 0.45, 0.62),
    (160.0, 0.40, 0.50),
    (270.0, 0.40, 0.60),
    (30.0, 0.55, 0.58),
    (185.0, 0.40, 0.52),
    (50.0, 0.50, 0.55),
    (320.0, 0.40, 0.58),
    (95.0, 0.35, 0.52),
    (225.0, 0.45, 0.62),
];

pub(super) const ACCENT: Color32 = Color32::from_rgb(124, 108, 245);
pub(super) const MUTED: Color32 = Color32::from_rgb(138, 143, 152);
pub(super) const FOREGROUND: Color32 = Color32::from_rgb(232, 234, 238);
pub(super) const BACKGROUND: Color32 = Color32::from_rgb(19, 23, 29);
pub(super) const SEARCH_TINT: Color32 = Color32::from_rgb(103, 196, 255);

pub(super) fn hsl_color(hue: f32, saturation: f32, lightness: f32) -> Color32 {
    let chroma = (1.0 - (2.0 * lightness - 1.0).abs()) * saturation;
    let sector = (hue.rem_euclid(360.0)) / 60.0;
    let second = chroma * (1.0 - ((sector % 2.0) - 1.0).abs());
    let (r, g, b) = match sector as u32 {
        0 => (chroma, second, 0.0),
        1 => (second, chroma, 0.0),
        2 => (0.0, chroma, second),
        3 => (0.0, second, chroma),
        4 => (second, 0.0, chroma),
        _ => (chroma, 0.0, second),
    };
    let offset = lightness - chroma / 2.0;
    let channel = |value: f32| ((value + offset).clamp(0.0, 1.0) * 255.0).round() as u8;
    Color32::from_rgb(channel(r), channel(g), channel(b))
}

pub(super) fn folder_color(index: usize) -> Color32 {
    let (hue, saturation, lightness) = FOLDER_PALETTE[index % FOLDER_PALETTE.len()];
    hsl_color(hue, saturation, lightness)
}

pub(super) fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let inverse = 1.0 - amount;

    Color32::from_rgba_unmultiplied(
        ((base.r() as f32 * inverse) + (overlay.r() as f32 * amount)) as u8,
        ((base.g() as f32 * inverse) + (overlay.g() as f32 * amount)) as u8,
        ((base.b() as f32 * inverse) + (overlay.b() as f32 * amount)) as u8,
        ((base.a() as f32 * inverse) + (overlay.a() as f32 * amount)) as u8,
    )
}

pub(super) fn with_alpha(color: Color32, alpha: f32) -> Color32 {
    Color32::from_rgba_unmultiplied(
        color.r(),
        color.g(),
        color.b(),
        (alpha.clamp(0.0, 1.0) * 255.0).round() as u8,
    )
}

pub(super) fn draw_background(painter: &Painter, rect: Rect, pan: Vec2, zoom: f32) {
    painter.rect_filled(rect, 0.0, BACKGROUND);

    let step = (56.0 * zoom.clamp(0.6, 1.8)).max(20.0);
    let origin = rect.center() + pan;
    let stroke = Stroke::new(1.0, Color32::from_rgba_unmultiplied(60, 70, 80, 50));

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

/// Logarithmic so hubs do not swamp the canvas.
pub(super) fn node_radius(connections: usize, size_multiplier: f32) -> f32 {
    let base = (5.0 + ((connections + 1) as f32).ln() * 4.0).max(4.0);
    (base * size_multiplier).min(MAX_DOCUMENT_RADIUS)
}

pub(super) fn folder_radius(connections: usize, size_multiplier: f32) -> f32 {
    let base = (10.0 + ((connections.max(1) + 1) as f32).ln() * 3.0).max(8.0);
    (base * size_multiplier).min(MAX_FOLDER_RADIUS)
}

pub(super) fn visual_radius(node: &GraphNode, size_multiplier: f32) -> f32 {
    if node.is_folder() {
        folder_radius(node.connections, size_multiplier)
    } else {
        node_radius(node.connections, size_multiplier)
    }
}

pub(super) fn hit_radius(node: &GraphNode, size_multiplier: f32) -> f32 {
    visual_radius(node, size_multiplier) + HIT_SLOP
}

/// Outline of an eight-spike star, alternating outer and inner vertices.
pub(super) fn star_points(center: Pos2, outer: f32, inner: f32) -> Vec<Pos2> {
    const SPIKES: usize = 8;
    (0..SPIKES * 2)
        .map(|index| {
            let radius = if index % 2 == 0 { outer } else { inner };
            let angle = (index as f32 * std::f32::consts::PI / SPIKES as f32)
                - std::f32::consts::FRAC_PI_2;
            center + Vec2::angled(angle) * radius
        })
        .collect()
}
