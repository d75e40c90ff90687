use eframe::egui::Vec2;
use tracing::debug;

use super::graph::GraphModel;
use super::physics::{PhysicsConfig, step_physics};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(in crate::app) enum FrameOutcome {
    Stopped,
    /// `moving` asks for another frame even without input.
    Drawn { moving: bool },
}

/// Runs physics then drawing once per frame until stopped.
#[derive(Debug)]
pub(in crate::app) struct AnimationDriver {
    stopped: bool,
    pub(in crate::app) live_physics: bool,
    frames: u64,
    forces: Vec<Vec2>,
}

impl Default for AnimationDriver {
    fn default() -> Self {
        Self {
            stopped: false,
            live_physics: true,
            frames: 0,
            forces: Vec::new(),
        }
    }
}

impl AnimationDriver {
    pub(in crate::app) fn is_running(&self) -> bool {
        !self.stopped
    }

    pub(in crate::app) fn frame(
        &mut self,
        model: &mut GraphModel,
        config: &PhysicsConfig,
        draw: impl FnOnce(&GraphModel),
    ) -> FrameOutcome {
        if self.stopped {
            return FrameOutcome::Stopped;
        }

        let moving = self.live_physics && step_physics(model, config, &mut self.forces);
        draw(model);
        self.frames += 1;
        FrameOutcome::Drawn { moving }
    }

    /// Once stopped, no further frame steps or draws.
    pub(in crate::app) fn stop(&mut self) {
        if !self.stopped {
            debug!(frames = self.frames, "stopping animation driver");
            self.stopped = true;
        }
    }
}
