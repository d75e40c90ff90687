use std::ops::RangeInclusive;

use eframe::egui::{self, Key, Response, Ui};
use tracing::debug;

use crate::settings::{
    BoundaryPolicy, CENTER_PULL_RANGE, FRICTION_RANGE, NODE_SIZE_RANGE, REPULSION_RANGE,
    SPRING_LENGTH_RANGE, SPRING_STRENGTH_RANGE, TIME_STEP_RANGE,
};

use super::super::ViewModel;

const SLIDER_KEY_BASE_RATE: f32 = 10.0;
const SLIDER_KEY_ACCEL_PER_SEC: f32 = 9.0;
const SLIDER_KEY_ACCEL_MAX: f32 = 40.0;

#[derive(Clone, Copy, Default)]
struct SliderKeyHoldState {
    positive_secs: f32,
    negative_secs: f32,
}

fn slider_key_accel_multiplier(hold_secs: f32) -> f32 {
    let ramp = hold_secs * SLIDER_KEY_ACCEL_PER_SEC;
    (1.0 + ramp + ramp * ramp * 0.15).min(SLIDER_KEY_ACCEL_MAX)
}

fn slider_key_step(range: &RangeInclusive<f32>) -> f32 {
    ((range.end() - range.start()) / 200.0).max(0.0005)
}

/// Holding an arrow key on a focused slider moves it faster the longer it is held.
fn apply_slider_arrow_acceleration(
    ui: &Ui,
    response: &Response,
    value: &mut f32,
    range: &RangeInclusive<f32>,
) -> bool {
    let state_id = response.id.with("arrow_key_hold_state");
    let mut hold_state = ui.ctx().data(|data| {
        data.get_temp::<SliderKeyHoldState>(state_id)
            .unwrap_or_default()
    });

    if !response.has_focus() {
        ui.ctx()
            .data_mut(|data| data.insert_temp(state_id, SliderKeyHoldState::default()));
        return false;
    }

    let (delta_time, increase_down, decrease_down) = ui.input(|input| {
        (
            input.stable_dt.min(0.1),
            input.key_down(Key::ArrowRight) || input.key_down(Key::ArrowUp),
            input.key_down(Key::ArrowLeft) || input.key_down(Key::ArrowDown),
        )
    });

    hold_state.positive_secs = if increase_down {
        hold_state.positive_secs + delta_time
    } else {
        0.0
    };
    hold_state.negative_secs = if decrease_down {
        hold_state.negative_secs + delta_time
    } else {
        0.0
    };
    ui.ctx()
        .data_mut(|data| data.insert_temp(state_id, hold_state));

    let direction = (increase_down as i8) - (decrease_down as i8);
    if direction == 0 {
        return false;
    }

    let hold_secs = if direction > 0 {
        hold_state.positive_secs
    } else {
        hold_state.negative_secs
    };
    let speed = SLIDER_KEY_BASE_RATE * slider_key_accel_multiplier(hold_secs);
    let delta = direction as f32 * slider_key_step(range) * speed * delta_time;

    let old_value = *value;
    *value = (*value + delta).clamp(*range.start(), *range.end());
    ui.ctx().request_repaint();
    (*value - old_value).abs() > f32::EPSILON
}

/// Widens `range` to include `value`, so a loaded setting the slider does not
/// normally offer survives being shown.
fn slider_range(value: f32, range: &RangeInclusive<f32>) -> RangeInclusive<f32> {
    range.start().min(value)..=range.end().max(value)
}

fn tuning_slider(
    ui: &mut Ui,
    value: &mut f32,
    range: RangeInclusive<f32>,
    text: &str,
    hover: &str,
) -> bool {
    let range = slider_range(*value, &range);
    let response = ui
        .add(
            egui::Slider::new(value, range.clone())
                .text(text)
                .clamping(egui::SliderClamping::Always),
        )
        .on_hover_text(hover);
    if response.hovered() {
        response.request_focus();
    }
    let accelerated = apply_slider_arrow_acceleration(ui, &response, value, &range);
    response.changed() || accelerated
}

impl ViewModel {
    /// Returns true when a change needs the graph to be rebuilt.
    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) -> bool {
        ui.heading("Graph Settings");
        ui.separator();
        ui.add_space(4.0);

        ui.label("Search")
            .on_hover_text("Fuzzy-highlight matching notes without changing the graph.");
        ui.text_edit_singleline(&mut self.search);

        ui.separator();

        ui.checkbox(&mut self.settings.display.show_labels, "Show labels")
            .on_hover_text("Labels appear for highlighted nodes or when zoomed in.");
        tuning_slider(
            ui,
            &mut self.settings.display.node_size,
            NODE_SIZE_RANGE,
            "Node size",
            "Scale applied to every node radius.",
        );

        let hierarchy_changed = ui
            .checkbox(&mut self.settings.hierarchy, "Show folder hierarchy")
            .on_hover_text("Add folder nodes and parent/child edges to the link graph.")
            .changed();
        if hierarchy_changed {
            debug!(hierarchy = self.settings.hierarchy, "hierarchy overlay toggled");
        }

        ui.separator();

        ui.checkbox(&mut self.driver.live_physics, "Live physics simulation")
            .on_hover_text("Continuously simulate layout forces while viewing the graph.");

        ui.horizontal_wrapped(|ui| {
            ui.label("Boundary");
            for policy in [BoundaryPolicy::Rectangular, BoundaryPolicy::Circular] {
                ui.selectable_value(&mut self.settings.boundary, policy, policy.label());
            }
        });

        ui.collapsing("Physics tuning", |ui| {
            let forces = &mut self.settings.forces;
            tuning_slider(
                ui,
                &mut forces.repulsion,
                REPULSION_RANGE,
                "Repulsion",
                "How strongly nodes push away from each other.",
            );
            tuning_slider(
                ui,
                &mut forces.spring_length,
                SPRING_LENGTH_RANGE,
                "Link distance",
                "Rest length of every edge.",
            );
            tuning_slider(
                ui,
                &mut forces.spring_strength,
                SPRING_STRENGTH_RANGE,
                "Link strength",
                "How strongly linked nodes pull toward the rest length.",
            );
            tuning_slider(
                ui,
                &mut forces.center_pull,
                CENTER_PULL_RANGE,
                "Center force",
                "Pull toward the middle of the canvas.",
            );
            tuning_slider(
                ui,
                &mut forces.friction,
                FRICTION_RANGE,
                "Friction",
                "Fraction of velocity kept after each step.",
            );
            tuning_slider(
                ui,
                &mut forces.dt,
                TIME_STEP_RANGE,
                "Time step",
                "Simulation time advanced per frame.",
            );
            if ui.button("Restore defaults").clicked() {
                *forces = Default::default();
            }
        });

        hierarchy_changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acceleration_ramps_up_and_caps() {
        assert_eq!(slider_key_accel_multiplier(0.0), 1.0);
        assert!(slider_key_accel_multiplier(0.5) > slider_key_accel_multiplier(0.1));
        assert_eq!(slider_key_accel_multiplier(60.0), SLIDER_KEY_ACCEL_MAX);
    }

    #[test]
    fn loaded_values_outside_the_slider_range_are_kept() {
        let friction = 0.3_f32;
        let range = slider_range(friction, &FRICTION_RANGE);
        assert_eq!(range, 0.3..=0.99);
        assert_eq!(friction.clamp(*range.start(), *range.end()), friction);

        assert_eq!(slider_range(0.9, &FRICTION_RANGE), FRICTION_RANGE);
        assert_eq!(slider_range(12_000.0, &REPULSION_RANGE), 500.0..=12_000.0);
    }

    #[test]
    fn key_step_is_a_fraction_of_the_range() {
        assert_eq!(slider_key_step(&SPRING_LENGTH_RANGE), 1.35);
        assert_eq!(slider_key_step(&(0.0..=0.01)), 0.0005);
    }
}
