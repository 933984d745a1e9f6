// ECS components for the scene's animated entities.
// Star glows and dust motes live in a bevy_ecs World owned by the scene;
// the entity store stays the source of truth for star data itself.

use bevy_ecs::prelude::*;
use glam::Vec3;

use super::star::StarId;

/// Position of an entity in 3D space
#[derive(Component, Debug, Clone, Copy)]
pub struct Transform {
    pub position: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
        }
    }
}

impl Transform {
    pub fn from_position(position: Vec3) -> Self {
        Self { position }
    }
}

/// Velocity of an entity in 3D space (units per second)
#[derive(Component, Debug, Clone, Copy)]
pub struct Velocity {
    pub linear: Vec3,
}

impl Velocity {
    pub fn new(linear: Vec3) -> Self {
        Self { linear }
    }
}

/// Billboard sprite parameters consumed by the renderer.
#[derive(Component, Debug, Clone, Copy)]
pub struct Sprite {
    pub size: f32,
    pub color: [f32; 4],
}

/// Intermittent brightness burst state for an idle star.
///
/// `countdown` runs between bursts; once it hits zero, `progress` sweeps
/// 0..PI and the half-sine adds up to 0.8 to the star's scale.
#[derive(Debug, Clone, Copy)]
pub struct Twinkle {
    pub countdown: f32,
    pub progress: f32,
    pub bursting: bool,
}

/// Per-star animation state. `base` is the star's fixed position from the
/// entity store; the rendered transform bobs and scales around it.
#[derive(Component, Debug, Clone, Copy)]
pub struct StarGlow {
    pub id: StarId,
    pub base: Vec3,
    /// Random phase so stars never bob in unison.
    pub phase: f32,
    /// Eased scale, pulled toward 1.2 while emphasized and 1.0 otherwise.
    pub scale: f32,
    pub twinkle: Twinkle,
}

/// A drifting dust mote. Sways sinusoidally around its slowly moving
/// transform position.
#[derive(Component, Debug, Clone, Copy)]
pub struct Mote {
    pub phase: f32,
    /// Sway frequency, also scales the pulse of the mote's size.
    pub sway_speed: f32,
}
