//! Rapier3D physics backend implementation.
//!
//! This module provides the physics backend for Bevy Rapier3D.
//! Enable with the `rapier3d` feature.

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use crate::backend::CharacterPhysicsBackend;
use crate::camera::{occlusion_ray, CameraRigConfig, FollowCamera};
use crate::collision::CollisionData;
use crate::config::{CharacterController, ControllerConfig};
use crate::gravity::GravityField;
use crate::rules::{Pickup, PickupOverlap};

/// Rapier3D physics backend for the character controller.
///
/// Body access (velocity, forces, rotation) goes through the components
/// Rapier integrates. Scene queries (ground probe, camera occlusion) are
/// handled by dedicated Rapier systems that receive `RapierContext` as a
/// system parameter, registered by [`Rapier3dBackendPlugin`].
pub struct Rapier3dBackend;

impl CharacterPhysicsBackend for Rapier3dBackend {
    fn plugin() -> impl Plugin {
        Rapier3dBackendPlugin
    }

    fn get_velocity(world: &World, entity: Entity) -> Vec3 {
        world
            .get::<Velocity>(entity)
            .map(|v| v.linvel)
            .unwrap_or(Vec3::ZERO)
    }

    fn set_velocity(world: &mut World, entity: Entity, velocity: Vec3) {
        if let Some(mut vel) = world.get_mut::<Velocity>(entity) {
            vel.linvel = velocity;
        }
    }

    fn apply_impulse(world: &mut World, entity: Entity, impulse: Vec3) {
        if let Some(mut ext_impulse) = world.get_mut::<ExternalImpulse>(entity) {
            ext_impulse.impulse += impulse;
        } else if let Some(mut vel) = world.get_mut::<Velocity>(entity) {
            // Fallback: apply as velocity change if no ExternalImpulse component
            vel.linvel += impulse;
        }
    }

    fn apply_force(world: &mut World, entity: Entity, force: Vec3) {
        if let Some(mut ext_force) = world.get_mut::<ExternalForce>(entity) {
            ext_force.force += force;
        }
    }

    fn get_position(world: &World, entity: Entity) -> Vec3 {
        world
            .get::<Transform>(entity)
            .map(|t| t.translation)
            .or_else(|| {
                world
                    .get::<GlobalTransform>(entity)
                    .map(|t| t.translation())
            })
            .unwrap_or(Vec3::ZERO)
    }

    fn get_rotation(world: &World, entity: Entity) -> Quat {
        world
            .get::<Transform>(entity)
            .map(|t| t.rotation)
            .or_else(|| {
                world
                    .get::<GlobalTransform>(entity)
                    .map(|t| t.to_scale_rotation_translation().1)
            })
            .unwrap_or(Quat::IDENTITY)
    }

    fn set_rotation(world: &mut World, entity: Entity, rotation: Quat) {
        // Rotation is driven kinematically; bodies use LockedAxes so the
        // solver never fights this write.
        if let Some(mut transform) = world.get_mut::<Transform>(entity) {
            transform.rotation = rotation;
        }
    }

    fn get_mass(world: &World, entity: Entity) -> f32 {
        // Rapier fills ReadMassProperties in after the first physics step;
        // until then fall back to unit mass.
        world
            .get::<ReadMassProperties>(entity)
            .map(|props| props.mass)
            .filter(|&mass| mass > 0.0 && mass.is_finite())
            .unwrap_or(1.0)
    }
}

/// Plugin that sets up Rapier3D-specific systems for the character
/// controller.
pub struct Rapier3dBackendPlugin;

impl Plugin for Rapier3dBackendPlugin {
    fn build(&self, app: &mut App) {
        use crate::{CameraSet, ControllerSet};

        // Forces persist across frames in Rapier, so the controller's
        // contribution is cleared before anything accumulates this tick.
        app.add_systems(
            FixedUpdate,
            clear_controller_forces.in_set(ControllerSet::GravityShift),
        );

        app.add_systems(
            FixedUpdate,
            (rapier_ground_probe, rapier_pickup_overlap).in_set(ControllerSet::Sensors),
        );

        app.add_systems(
            Update,
            rapier_camera_occlusion.in_set(CameraSet::Occlusion),
        );
    }
}

/// Clear controller-applied forces at the start of each tick.
///
/// Hosts that want to push a controller body externally should use
/// impulses; continuous `ExternalForce` on controller bodies is owned by
/// the controller.
pub fn clear_controller_forces(
    mut q_forces: Query<&mut ExternalForce, With<CharacterController>>,
) {
    for mut ext_force in &mut q_forces {
        ext_force.force = Vec3::ZERO;
    }
}

/// Cast down along the current surface frame to find ground.
///
/// The cast starts at the body position offset along surface up by
/// `probe_offset` and extends `ground_clearance` along surface down, as a
/// sphere sweep of `probe_radius` (a plain ray when the radius is zero).
/// The surface frame comes from the cached orientation state, not the
/// body's `Transform`, so the probe stays correct mid-rotation after a
/// gravity shift.
pub fn rapier_ground_probe(
    rapier_context: ReadRapierContext,
    mut q_controllers: Query<(
        Entity,
        &GlobalTransform,
        &ControllerConfig,
        &mut CharacterController,
    )>,
) {
    let Ok(context) = rapier_context.single() else {
        return;
    };

    for (entity, transform, config, mut controller) in &mut q_controllers {
        let up = controller.surface_up;
        let origin = transform.translation() + up * config.probe_offset;

        let filter = QueryFilter::default()
            .exclude_rigid_body(entity)
            .exclude_sensors();

        controller.ground = if config.probe_radius > 0.0 {
            let shape = Collider::ball(config.probe_radius);
            context
                .cast_shape(
                    origin,
                    Quat::IDENTITY,
                    -up,
                    &shape,
                    ShapeCastOptions {
                        max_time_of_impact: config.ground_clearance,
                        stop_at_penetration: false,
                        ..default()
                    },
                    filter,
                )
                .map(|(hit_entity, hit)| {
                    let normal = hit.details.map(|d| d.normal1).unwrap_or(up);
                    let point = hit
                        .details
                        .map(|d| d.witness1)
                        .unwrap_or(origin - up * hit.time_of_impact);
                    CollisionData::new(hit.time_of_impact, normal, point, Some(hit_entity))
                })
        } else {
            context
                .cast_ray_and_get_normal(origin, -up, config.ground_clearance, true, filter)
                .map(|(hit_entity, hit)| {
                    CollisionData::new(hit.time_of_impact, hit.normal, hit.point, Some(hit_entity))
                })
        };
    }
}

/// Raycast from the camera focus toward the desired camera position.
///
/// A hit means geometry occludes the target; the rig update contracts the
/// orbit distance to just in front of it.
pub fn rapier_camera_occlusion(
    rapier_context: ReadRapierContext,
    gravity: Res<GravityField>,
    mut q_cameras: Query<(&mut FollowCamera, &CameraRigConfig)>,
    q_targets: Query<&GlobalTransform, With<CharacterController>>,
) {
    let Ok(context) = rapier_context.single() else {
        return;
    };
    let up = gravity.up();

    for (mut camera, config) in &mut q_cameras {
        let Some(target) = camera.target else {
            camera.occlusion = None;
            continue;
        };
        let Ok(target_transform) = q_targets.get(target) else {
            camera.occlusion = None;
            continue;
        };

        let (origin, direction, max_distance) =
            occlusion_ray(&camera, config, target_transform.translation(), up);

        let filter = QueryFilter::default()
            .exclude_rigid_body(target)
            .exclude_sensors();

        camera.occlusion = context
            .cast_ray_and_get_normal(origin, direction, max_distance, true, filter)
            .map(|(hit_entity, hit)| {
                CollisionData::new(hit.time_of_impact, hit.normal, hit.point, Some(hit_entity))
            });
    }
}

/// Translate Rapier collision events on pickup sensors into
/// [`PickupOverlap`] notifications.
///
/// Pickups are expected to carry a sensor collider; the host decides when
/// to despawn a collected pickup.
pub fn rapier_pickup_overlap(
    mut collision_events: EventReader<CollisionEvent>,
    q_pickups: Query<&Pickup>,
    q_controllers: Query<(), With<CharacterController>>,
    mut overlaps: EventWriter<PickupOverlap>,
) {
    for event in collision_events.read() {
        let CollisionEvent::Started(a, b, _) = event else {
            continue;
        };

        let hit = if q_pickups.contains(*a) && q_controllers.contains(*b) {
            Some(*a)
        } else if q_pickups.contains(*b) && q_controllers.contains(*a) {
            Some(*b)
        } else {
            None
        };

        if let Some(pickup) = hit {
            if let Ok(marker) = q_pickups.get(pickup) {
                overlaps.write(PickupOverlap {
                    pickup,
                    id: marker.id,
                });
            }
        }
    }
}

/// Bundle for creating a character with Rapier3D physics.
///
/// Provides the Rapier components a controller body needs: a dynamic
/// rigid body, velocity tracking, force/impulse accumulators, locked
/// rotation (the orientation system drives rotation kinematically), mass
/// properties, and zero gravity scale since the controller applies its own
/// gravity force.
///
/// # Example
///
/// ```ignore
/// use bevy::prelude::*;
/// use bevy_rapier3d::prelude::*;
/// use gravity_shift_controller::prelude::*;
/// use gravity_shift_controller::rapier::Rapier3dCharacterBundle;
///
/// fn spawn_player(mut commands: Commands) {
///     commands.spawn((
///         Transform::from_xyz(0.0, 2.0, 0.0),
///         CharacterController::new(),
///         ControllerConfig::player(),
///         MovementIntent::default(),
///         Rapier3dCharacterBundle::default(),
///         Collider::capsule_y(0.5, 0.3),
///     ));
/// }
/// ```
#[derive(Bundle)]
pub struct Rapier3dCharacterBundle {
    /// The rigid body type. Should typically be [`RigidBody::Dynamic`].
    pub rigid_body: RigidBody,
    /// Current linear and angular velocity. Updated by Rapier each step.
    pub velocity: Velocity,
    /// Accumulated forces applied this tick. Controller systems write to
    /// this; [`clear_controller_forces`] resets it each tick.
    pub external_force: ExternalForce,
    /// Accumulated impulses applied this tick. Used for jumps.
    pub external_impulse: ExternalImpulse,
    /// Rotation is locked; the orientation system sets it directly.
    pub locked_axes: LockedAxes,
    /// Damping coefficients. Horizontal control replaces velocity outright,
    /// so only light damping is needed.
    pub damping: Damping,
    /// Computed mass properties, filled in by Rapier from the collider.
    pub mass_properties: ReadMassProperties,
    /// Rapier's own gravity is disabled; the controller applies gravity as
    /// a force from [`GravityField`].
    pub gravity_scale: GravityScale,
}

impl Default for Rapier3dCharacterBundle {
    fn default() -> Self {
        Self {
            rigid_body: RigidBody::Dynamic,
            velocity: Velocity::default(),
            external_force: ExternalForce::default(),
            external_impulse: ExternalImpulse::default(),
            locked_axes: LockedAxes::ROTATION_LOCKED,
            damping: Damping {
                linear_damping: 0.0,
                angular_damping: 1.0,
            },
            mass_properties: ReadMassProperties::default(),
            gravity_scale: GravityScale(0.0),
        }
    }
}

impl Rapier3dCharacterBundle {
    /// Create the bundle with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the rigid body type.
    pub fn with_body(mut self, body: RigidBody) -> Self {
        self.rigid_body = body;
        self
    }

    /// Set the damping coefficients.
    pub fn with_damping(mut self, linear: f32, angular: f32) -> Self {
        self.damping = Damping {
            linear_damping: linear,
            angular_damping: angular,
        };
        self
    }

    /// Set which axes are locked.
    pub fn with_locked_axes(mut self, axes: LockedAxes) -> Self {
        self.locked_axes = axes;
        self
    }
}
