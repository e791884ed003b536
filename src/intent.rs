//! Movement intent components.
//!
//! Intents carry the desired movement from player input or AI. You handle
//! input detection (keyboard, gamepad, network, AI); the controller systems
//! read the resulting values each fixed tick.

use bevy::prelude::*;

/// Movement intent for a gravity-relative character.
///
/// # Example
///
/// ```rust
/// use bevy::prelude::*;
/// use gravity_shift_controller::prelude::*;
///
/// let mut intent = MovementIntent::new();
/// intent.set_move(Vec2::new(0.0, 1.0)); // forward
/// assert!(intent.is_moving());
///
/// intent.set_jump_pressed(true);
/// assert!(intent.is_jump_pressed());
/// ```
#[derive(Component, Reflect, Debug, Clone, Copy)]
#[reflect(Component)]
pub struct MovementIntent {
    /// Raw 2D movement axis: `x` lateral (camera right), `y` longitudinal
    /// (camera forward). Clamped to unit length.
    pub move_axis: Vec2,
    /// Whether the jump action is currently held.
    ///
    /// Set this every frame; the jump system reacts to the rising edge.
    pub jump_pressed: bool,
    /// Previous tick's `jump_pressed`, managed by the jump system for edge
    /// detection.
    pub(crate) jump_pressed_prev: bool,
}

impl Default for MovementIntent {
    fn default() -> Self {
        Self {
            move_axis: Vec2::ZERO,
            jump_pressed: false,
            jump_pressed_prev: false,
        }
    }
}

impl MovementIntent {
    /// Create a new empty intent.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the movement axis, clamped to unit length.
    pub fn set_move(&mut self, axis: Vec2) {
        self.move_axis = axis.clamp_length_max(1.0);
    }

    /// Clear the movement axis.
    pub fn clear_move(&mut self) {
        self.move_axis = Vec2::ZERO;
    }

    /// Whether movement input exceeds the deadzone.
    pub fn is_moving(&self) -> bool {
        self.move_axis.length() >= crate::orientation::INPUT_DEADZONE
    }

    /// Set the current jump-held state.
    pub fn set_jump_pressed(&mut self, pressed: bool) {
        self.jump_pressed = pressed;
    }

    /// Whether jump is currently held.
    pub fn is_jump_pressed(&self) -> bool {
        self.jump_pressed
    }

    /// Rising-edge check used by the jump system.
    pub(crate) fn jump_edge(&self) -> bool {
        self.jump_pressed && !self.jump_pressed_prev
    }
}
