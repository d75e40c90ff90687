use eframe::egui::{Pos2, Vec2};

pub const MIN_ZOOM: f32 = 0.3;
pub const MAX_ZOOM: f32 = 3.0;
const WHEEL_ZOOM_IN: f32 = 1.1;
const WHEEL_ZOOM_OUT: f32 = 0.9;
const BUTTON_ZOOM_IN: f32 = 1.2;
const BUTTON_ZOOM_OUT: f32 = 0.8;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScrollDirection {
    Up,
    Down,
}

impl ScrollDirection {
    /// egui reports wheel-up as a positive delta.
    pub fn from_delta(delta_y: f32) -> Option<Self> {
        if delta_y > f32::EPSILON {
            Some(Self::Up)
        } else if delta_y < -f32::EPSILON {
            Some(Self::Down)
        } else {
            None
        }
    }
}

/// Pan/zoom mapping between canvas-local screen points and world space.
///
/// Zoom is applied around the viewport center, so an untransformed view
/// maps world coordinates 1:1 onto canvas coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
    pub pan: Vec2,
    zoom: f32,
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
    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn set_zoom(&mut self, zoom: f32) {
        self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
    }

    pub fn apply_wheel(&mut self, direction: ScrollDirection) {
        let factor = match direction {
            ScrollDirection::Up => WHEEL_ZOOM_IN,
            ScrollDirection::Down => WHEEL_ZOOM_OUT,
        };
        self.set_zoom(self.zoom * factor);
    }

    /// One zoom factor per wheel event, whatever each event's magnitude.
    pub fn apply_wheel_events(&mut self, deltas: impl IntoIterator<Item = f32>) {
        for direction in deltas.into_iter().filter_map(ScrollDirection::from_delta) {
            self.apply_wheel(direction);
        }
    }

    pub fn zoom_in(&mut self) {
        self.set_zoom(self.zoom * BUTTON_ZOOM_IN);
    }

    pub fn zoom_out(&mut self) {
        self.set_zoom(self.zoom * BUTTON_ZOOM_OUT);
    }

    pub fn pan_by(&mut self, delta: Vec2) {
        self.pan += delta;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn screen_to_world(&self, screen: Pos2, viewport: Vec2) -> Vec2 {
        let center = viewport * 0.5;
        (screen.to_vec2() - center - self.pan) / self.zoom + center
    }

    pub fn world_to_screen(&self, world: Vec2, viewport: Vec2) -> Pos2 {
        let center = viewport * 0.5;
        ((world - center) * self.zoom + center + self.pan).to_pos2()
    }
}
