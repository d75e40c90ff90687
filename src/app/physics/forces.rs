use eframe::egui::{Vec2, vec2};

use crate::settings::{BoundaryPolicy, ForceParams};

const MIN_DISTANCE_SQ: f32 = 0.01;
const REPULSION_CUTOFF: f32 = 500.0;
const REPULSION_SOFTENING: f32 = 100.0;
const BOUNDARY_MARGIN: f32 = 30.0;
const BOUNDARY_PUSH: f32 = 50.0;
const BOUNDARY_RADIUS_FACTOR: f32 = 0.45;
const BOUNDARY_PULL: f32 = 0.05;

/// Stable direction for a pair of coincident nodes.
fn fallback_direction(from: usize, to: usize) -> Vec2 {
    let angle = ((from as f32) * 0.618_034 + (to as f32) * 0.414_214) * std::f32::consts::TAU;
    vec2(angle.cos(), angle.sin())
}

/// Force pushing `point_a` away from `point_b`; zero beyond the cutoff.
pub(super) fn repulsion_between(
    point_a: Vec2,
    point_b: Vec2,
    indices: (usize, usize),
    repulsion: f32,
) -> Vec2 {
    let delta = point_a - point_b;
    let distance_sq = delta.length_sq().max(MIN_DISTANCE_SQ);
    let distance = distance_sq.sqrt();
    if distance >= REPULSION_CUTOFF {
        return Vec2::ZERO;
    }

    let length = delta.length();
    let direction = if length > 0.0001 {
        delta / length
    } else {
        fallback_direction(indices.0, indices.1)
    };
    direction * (repulsion / (distance_sq + REPULSION_SOFTENING))
}

/// Hooke force on `from`, pulling it toward `to` when stretched.
pub(super) fn spring_between(from: Vec2, to: Vec2, params: &ForceParams) -> Vec2 {
    let delta = to - from;
    let distance = delta.length();
    if distance <= 0.0 {
        return Vec2::ZERO;
    }
    (delta / distance) * ((distance - params.spring_length) * params.spring_strength)
}

pub(super) fn center_pull(position: Vec2, center: Vec2, strength: f32) -> Vec2 {
    (center - position) * strength
}

/// Velocity correction that keeps nodes inside the viewport.
///
/// The rectangular margin is checked against the integrated position; the
/// circular boundary measures the position the step started from.
pub(super) fn boundary_correction(
    policy: BoundaryPolicy,
    start: Vec2,
    end: Vec2,
    viewport: Vec2,
    dt: f32,
) -> Vec2 {
    match policy {
        BoundaryPolicy::Rectangular => {
            let push = BOUNDARY_PUSH * dt;
            let mut correction = Vec2::ZERO;
            if end.x < BOUNDARY_MARGIN {
                correction.x += push;
            }
            if end.x > viewport.x - BOUNDARY_MARGIN {
                correction.x -= push;
            }
            if end.y < BOUNDARY_MARGIN {
                correction.y += push;
            }
            if end.y > viewport.y - BOUNDARY_MARGIN {
                correction.y -= push;
            }
            correction
        }
        BoundaryPolicy::Circular => {
            let inward = viewport * 0.5 - start;
            let distance = inward.length();
            let radius = viewport.x.min(viewport.y) * BOUNDARY_RADIUS_FACTOR;
            if distance <= radius {
                return Vec2::ZERO;
            }
            (inward / distance) * ((distance - radius) * BOUNDARY_PULL * dt)
        }
    }
}
