use std::fs;
use std::ops::RangeInclusive;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const REPULSION_RANGE: RangeInclusive<f32> = 500.0..=10_000.0;
pub const SPRING_LENGTH_RANGE: RangeInclusive<f32> = 30.0..=300.0;
pub const SPRING_STRENGTH_RANGE: RangeInclusive<f32> = 0.01..=0.5;
pub const CENTER_PULL_RANGE: RangeInclusive<f32> = 0.0..=0.05;
/// Slider range; validation additionally requires the open interval (0, 1).
pub const FRICTION_RANGE: RangeInclusive<f32> = 0.5..=0.99;
pub const TIME_STEP_RANGE: RangeInclusive<f32> = 0.01..=1.0;
pub const NODE_SIZE_RANGE: RangeInclusive<f32> = 0.5..=2.5;

#[derive(Debug, Error, PartialEq)]
pub enum SettingsError {
    #[error("{name} must be within {min}..={max}, got {value}")]
    OutOfRange {
        name: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },
    #[error("friction must be strictly between 0 and 1, got {0}")]
    Friction(f32),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundaryPolicy {
    /// Velocity nudged inward near the viewport edges.
    #[default]
    Rectangular,
    /// Inward pull that grows with the overshoot past a centered circle.
    Circular,
}

impl BoundaryPolicy {
    pub fn label(self) -> &'static str {
        match self {
            Self::Rectangular => "Rectangular",
            Self::Circular => "Circular",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForceParams {
    pub repulsion: f32,
    pub spring_length: f32,
    pub spring_strength: f32,
    pub center_pull: f32,
    pub friction: f32,
    pub dt: f32,
}

impl Default for ForceParams {
    fn default() -> Self {
        Self {
            repulsion: 3000.0,
            spring_length: 100.0,
            spring_strength: 0.08,
            center_pull: 0.015,
            friction: 0.88,
            dt: 0.15,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    pub node_size: f32,
    pub show_labels: bool,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            node_size: 1.0,
            show_labels: true,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphSettings {
    pub forces: ForceParams,
    pub display: DisplaySettings,
    pub boundary: BoundaryPolicy,
    /// Adds folder nodes and parent/child edges on top of the link graph.
    pub hierarchy: bool,
}

fn check_range(
    name: &'static str,
    value: f32,
    range: &RangeInclusive<f32>,
) -> Result<(), SettingsError> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(SettingsError::OutOfRange {
            name,
            value,
            min: *range.start(),
            max: *range.end(),
        })
    }
}

impl GraphSettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        let forces = &self.forces;
        check_range("repulsion", forces.repulsion, &REPULSION_RANGE)?;
        check_range("spring_length", forces.spring_length, &SPRING_LENGTH_RANGE)?;
        check_range(
            "spring_strength",
            forces.spring_strength,
            &SPRING_STRENGTH_RANGE,
        )?;
        check_range("center_pull", forces.center_pull, &CENTER_PULL_RANGE)?;
        if !(forces.friction > 0.0 && forces.friction < 1.0) {
            return Err(SettingsError::Friction(forces.friction));
        }
        check_range("dt", forces.dt, &TIME_STEP_RANGE)?;
        check_range("node_size", self.display.node_size, &NODE_SIZE_RANGE)?;
        Ok(())
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(raw).context("invalid settings JSON")?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file {}", path.display()))?;
        Self::from_json(&raw)
            .with_context(|| format!("failed to load settings from {}", path.display()))
    }
}
