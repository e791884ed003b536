//! State marker components.
//!
//! These are added and removed by the ground-state system based on probe
//! results. They carry no data; use them in query filters.

use bevy::prelude::*;

/// Marker component indicating the character is supported by ground.
///
/// Added when the ground probe hits within the configured clearance.
/// Mutually exclusive with [`Airborne`].
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct Grounded;

/// Marker component indicating the character has no ground support.
///
/// Mutually exclusive with [`Grounded`]. While this is present the
/// controller accumulates `fall_duration`.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct Airborne;
