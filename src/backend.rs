//! Physics backend abstraction.
//!
//! The controller never talks to a physics engine directly. A backend
//! implements this trait for body access (velocity, forces, rotation) and
//! registers its own sensor systems (ground probe, camera occlusion) into
//! the labeled system sets via [`CharacterPhysicsBackend::plugin`]. That is
//! how raycast queries stay engine-specific while the core systems remain
//! pure per-tick computation.
//!
//! The crate ships a Rapier3D backend behind the `rapier3d` feature; tests
//! use a deterministic scripted backend.

use bevy::prelude::*;

/// Trait for physics backend implementations.
///
/// All methods take the ECS `World` so backends can store their state in
/// whatever components the underlying engine uses.
pub trait CharacterPhysicsBackend: 'static + Send + Sync {
    /// The plugin that sets up this backend, including its sensor systems
    /// in [`crate::ControllerSet::Sensors`] and
    /// [`crate::CameraSet::Occlusion`].
    fn plugin() -> impl Plugin;

    /// Get the current linear velocity of an entity.
    fn get_velocity(world: &World, entity: Entity) -> Vec3;

    /// Set the linear velocity of an entity.
    fn set_velocity(world: &mut World, entity: Entity, velocity: Vec3);

    /// Apply an impulse (instantaneous momentum change, not scaled by the
    /// step duration).
    fn apply_impulse(world: &mut World, entity: Entity, impulse: Vec3);

    /// Apply a continuous force, integrated over the physics timestep.
    fn apply_force(world: &mut World, entity: Entity, force: Vec3);

    /// Get the current world position of an entity.
    fn get_position(world: &World, entity: Entity) -> Vec3;

    /// Get the current rotation of an entity.
    fn get_rotation(world: &World, entity: Entity) -> Quat;

    /// Set the rotation of an entity.
    ///
    /// The orientation system drives rotation kinematically, so backends
    /// should lock their solver's angular degrees of freedom for
    /// controller bodies.
    fn set_rotation(world: &mut World, entity: Entity, rotation: Quat);

    /// Get the mass of an entity. Defaults to 1.0 for backends without
    /// mass properties.
    fn get_mass(_world: &World, _entity: Entity) -> f32 {
        1.0
    }

    /// Get the fixed timestep delta time.
    fn get_fixed_timestep(world: &World) -> f32 {
        world
            .get_resource::<Time<Fixed>>()
            .map(|t| t.delta_secs())
            .filter(|&d| d > 0.0)
            .unwrap_or(1.0 / 60.0)
    }
}

/// Empty plugin for backends that don't need additional setup.
pub struct NoOpBackendPlugin;

impl Plugin for NoOpBackendPlugin {
    fn build(&self, _app: &mut App) {}
}
