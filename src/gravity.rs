//! Process-wide gravity state and edge-triggered redirection.
//!
//! [`GravityField`] is the single authoritative gravity vector read by every
//! other system each simulation step. It only changes through
//! [`GravityField::set_direction`], and during normal play that call is made
//! exclusively by [`apply_gravity_requests`], which runs first in the fixed
//! tick so no system ever observes a half-applied change.
//!
//! [`GravityRequest`] holds the transient candidate a player is aiming:
//! proposals snap to the dominant world axis, and nothing happens until a
//! discrete confirm event arrives.

use bevy::log::info;
use bevy::prelude::*;

/// The current global gravity vector.
///
/// `direction` is always unit length; `magnitude` is always non-negative.
/// Created once at startup and persists for the whole simulation.
#[derive(Resource, Reflect, Debug, Clone)]
#[reflect(Resource)]
pub struct GravityField {
    direction: Vec3,
    magnitude: f32,
}

impl Default for GravityField {
    fn default() -> Self {
        Self {
            direction: Vec3::NEG_Y,
            magnitude: 9.81,
        }
    }
}

impl GravityField {
    /// Create a gravity field with the given direction and magnitude.
    ///
    /// The direction is normalized; a zero vector falls back to world down.
    /// The magnitude is clamped to be non-negative.
    pub fn new(direction: Vec3, magnitude: f32) -> Self {
        let mut field = Self {
            direction: Vec3::NEG_Y,
            magnitude: magnitude.max(0.0),
        };
        field.set_direction(direction);
        field
    }

    /// Set the gravity direction.
    ///
    /// The vector is normalized before storing. A zero-length vector is a
    /// silent no-op so a single bad input frame cannot corrupt the field.
    pub fn set_direction(&mut self, direction: Vec3) {
        let normalized = direction.normalize_or_zero();
        if normalized != Vec3::ZERO {
            self.direction = normalized;
        }
    }

    /// Set the gravity magnitude (clamped to be non-negative).
    pub fn set_magnitude(&mut self, magnitude: f32) {
        self.magnitude = magnitude.max(0.0);
    }

    /// Current gravity direction (unit length).
    #[inline]
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    /// Current gravity magnitude.
    #[inline]
    pub fn magnitude(&self) -> f32 {
        self.magnitude
    }

    /// The "up" direction of the current surface frame (`-direction`).
    #[inline]
    pub fn up(&self) -> Vec3 {
        -self.direction
    }

    /// Continuous gravity force for a body of the given mass.
    #[inline]
    pub fn force_on(&self, mass: f32) -> Vec3 {
        self.direction * self.magnitude * mass
    }
}

/// Snap a vector to the closest signed world axis.
///
/// Returns `None` for the zero vector. Ties prefer X over Y over Z, which
/// is stable for the axis-aligned inputs this is used with.
pub fn snap_to_axis(v: Vec3) -> Option<Vec3> {
    if v == Vec3::ZERO {
        return None;
    }
    let abs = v.abs();
    let axis = if abs.x >= abs.y && abs.x >= abs.z {
        Vec3::X * v.x.signum()
    } else if abs.y >= abs.z {
        Vec3::Y * v.y.signum()
    } else {
        Vec3::Z * v.z.signum()
    };
    Some(axis)
}

/// A pending gravity redirection awaiting confirmation.
///
/// Proposals can change freely while the player aims; only an explicit
/// [`GravityRequest::confirm`] arms the candidate. The armed candidate is
/// consumed by [`apply_gravity_requests`] at the start of the next fixed
/// tick, so the change is atomic with respect to the rest of the step.
#[derive(Resource, Reflect, Debug, Clone, Default)]
#[reflect(Resource)]
pub struct GravityRequest {
    candidate: Option<Vec3>,
    confirmed: bool,
}

impl GravityRequest {
    /// Propose a new gravity direction, snapped to the dominant world axis.
    ///
    /// A zero vector proposes nothing. Proposing replaces any earlier
    /// candidate and clears a pending confirmation.
    pub fn propose(&mut self, direction: Vec3) {
        if let Some(axis) = snap_to_axis(direction) {
            self.candidate = Some(axis);
            self.confirmed = false;
        }
    }

    /// Confirm the current candidate, if any.
    pub fn confirm(&mut self) {
        if self.candidate.is_some() {
            self.confirmed = true;
        }
    }

    /// Discard the current candidate and any pending confirmation.
    pub fn cancel(&mut self) {
        self.candidate = None;
        self.confirmed = false;
    }

    /// The currently proposed direction, if any.
    pub fn candidate(&self) -> Option<Vec3> {
        self.candidate
    }

    /// Whether a confirmed candidate is waiting to be applied.
    pub fn is_confirmed(&self) -> bool {
        self.confirmed
    }

    /// Take the confirmed candidate, leaving the request empty.
    pub(crate) fn take_confirmed(&mut self) -> Option<Vec3> {
        if self.confirmed {
            self.confirmed = false;
            self.candidate.take()
        } else {
            None
        }
    }
}

/// Event sent whenever the gravity field direction actually changes.
#[derive(Event, Debug, Clone, Copy)]
pub struct GravityChanged {
    /// The new gravity direction (unit length).
    pub direction: Vec3,
}

/// Apply a confirmed gravity request to the field.
///
/// Runs first in the fixed-tick chain so every downstream system sees a
/// consistent gravity vector for the whole step.
pub fn apply_gravity_requests(
    mut request: ResMut<GravityRequest>,
    mut gravity: ResMut<GravityField>,
    mut changed: EventWriter<GravityChanged>,
) {
    if let Some(direction) = request.take_confirmed() {
        gravity.set_direction(direction);
        info!("gravity redirected to {:?}", gravity.direction());
        changed.write(GravityChanged {
            direction: gravity.direction(),
        });
    }
}
