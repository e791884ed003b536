//! Controller configuration and the per-body state hub.

use bevy::prelude::*;

use crate::collision::CollisionData;

/// Core character controller component.
///
/// This is the central hub for per-body controller state. Backend sensor
/// systems write raw probe results into it, the orientation system caches
/// the frame it solved against, and the ground-state system derives the
/// grounded/fall results every other consumer reads.
#[derive(Component, Reflect, Debug, Clone)]
#[reflect(Component)]
pub struct CharacterController {
    /// Ground probe result for this tick. `None` when nothing was hit
    /// within the probe clearance.
    #[reflect(ignore)]
    pub ground: Option<CollisionData>,
    /// Whether the body is currently supported by ground.
    pub is_grounded: bool,
    /// Seconds spent airborne since the last grounded tick.
    pub fall_duration: f32,
    /// Surface up (`-gravity`) the orientation solver used this tick.
    ///
    /// Velocity decomposition must use this frame, not a stale one, so the
    /// orientation system always refreshes it before the motion systems run.
    pub surface_up: Vec3,
    /// Desired forward the orientation solver produced this tick.
    pub desired_forward: Vec3,
}

impl Default for CharacterController {
    fn default() -> Self {
        Self {
            ground: None,
            is_grounded: false,
            fall_duration: 0.0,
            surface_up: Vec3::Y,
            desired_forward: Vec3::NEG_Z,
        }
    }
}

impl CharacterController {
    /// Create a controller with default state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ground surface normal, falling back to the current surface up.
    pub fn ground_normal(&self) -> Vec3 {
        self.ground.map(|g| g.normal).unwrap_or(self.surface_up)
    }

    /// Distance reported by the last ground probe hit.
    pub fn ground_distance(&self) -> f32 {
        self.ground.map(|g| g.distance).unwrap_or(f32::MAX)
    }

    /// Whether the last ground probe hit anything at all.
    pub fn ground_detected(&self) -> bool {
        self.ground.is_some()
    }

    /// Entity the ground probe hit, if any.
    pub fn ground_entity(&self) -> Option<Entity> {
        self.ground.and_then(|g| g.entity)
    }
}

/// Configuration parameters for the character controller.
///
/// All values are plain numbers injected at spawn time; nothing is looked
/// up dynamically.
#[derive(Component, Reflect, Debug, Clone, Copy)]
#[reflect(Component)]
pub struct ControllerConfig {
    // === Movement ===
    /// Horizontal movement speed (units/second). Active input replaces the
    /// horizontal velocity component with exactly this speed.
    pub move_speed: f32,

    /// Exponential damping rate for horizontal velocity when idle
    /// (per second). Higher stops faster.
    pub stop_damping: f32,

    // === Orientation ===
    /// Rotation convergence rate toward the solved target orientation,
    /// as a fraction-per-second exponential rate.
    pub rotation_rate: f32,

    // === Jump ===
    /// Jump impulse magnitude along surface up (momentum units, so the
    /// resulting velocity change is `jump_impulse / mass`).
    pub jump_impulse: f32,

    // === Ground probe ===
    /// Probe distance along current down from the probe origin. A hit
    /// within this distance means grounded.
    pub ground_clearance: f32,

    /// Probe radius for backends that sweep a shape instead of a ray.
    pub probe_radius: f32,

    /// Offset of the probe origin from the body position, along surface up.
    /// Lets the probe start at the collider's foot point.
    pub probe_offset: f32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            move_speed: 5.0,
            stop_damping: 10.0,
            rotation_rate: 10.0,
            jump_impulse: 5.0,
            ground_clearance: 0.3,
            probe_radius: 0.2,
            probe_offset: 0.0,
        }
    }
}

impl ControllerConfig {
    /// Create a config tuned for responsive player control.
    pub fn player() -> Self {
        Self {
            move_speed: 6.0,
            rotation_rate: 14.0,
            jump_impulse: 6.5,
            ..default()
        }
    }

    /// Builder: set movement speed.
    pub fn with_move_speed(mut self, speed: f32) -> Self {
        self.move_speed = speed;
        self
    }

    /// Builder: set jump impulse magnitude.
    pub fn with_jump_impulse(mut self, impulse: f32) -> Self {
        self.jump_impulse = impulse;
        self
    }

    /// Builder: set the rotation convergence rate.
    pub fn with_rotation_rate(mut self, rate: f32) -> Self {
        self.rotation_rate = rate;
        self
    }

    /// Builder: set ground probe clearance and radius.
    pub fn with_ground_probe(mut self, clearance: f32, radius: f32) -> Self {
        self.ground_clearance = clearance;
        self.probe_radius = radius;
        self
    }

    /// Builder: set the probe origin offset along surface up.
    pub fn with_probe_offset(mut self, offset: f32) -> Self {
        self.probe_offset = offset;
        self
    }

    /// Builder: set the idle horizontal damping rate.
    pub fn with_stop_damping(mut self, rate: f32) -> Self {
        self.stop_damping = rate;
        self
    }
}
