//! Core controller systems.
//!
//! These implement the per-tick pipeline: orientation toward the current
//! gravity frame, continuous gravity force, surface-relative movement,
//! edge-triggered jumps, and ground-state bookkeeping. They are generic
//! over the physics backend so different engines can be used.
//!
//! Ordering matters and is enforced by [`crate::ControllerSet`]: the
//! orientation system refreshes the surface frame before any velocity is
//! decomposed against it, and ground state is interpreted only after the
//! backend sensors have probed.

use bevy::prelude::*;

use crate::backend::CharacterPhysicsBackend;
use crate::camera::FollowCamera;
use crate::config::{CharacterController, ControllerConfig};
use crate::gravity::GravityField;
use crate::intent::MovementIntent;
use crate::orientation::{self, smoothing_step, OrientationContext};
use crate::rules::GroundStateChanged;
use crate::state::{Airborne, Grounded};

/// Rotate each body toward the orientation solved for the current gravity
/// frame.
///
/// Runs before any velocity work so that decomposition always uses the
/// *new* surface frame; the solved frame is cached on the controller for
/// the systems downstream.
pub fn update_orientation<B: CharacterPhysicsBackend>(world: &mut World) {
    let surface_up = match world.get_resource::<GravityField>() {
        Some(gravity) => gravity.up(),
        None => return,
    };
    let dt = B::get_fixed_timestep(world);

    let cameras: Vec<(Option<Entity>, Quat)> = world
        .query::<(&FollowCamera, &Transform)>()
        .iter(world)
        .map(|(camera, transform)| (camera.target, transform.rotation))
        .collect();

    let entities: Vec<(Entity, ControllerConfig, MovementIntent)> = world
        .query::<(
            Entity,
            &ControllerConfig,
            &MovementIntent,
            &CharacterController,
        )>()
        .iter(world)
        .map(|(entity, config, intent, _)| (entity, *config, *intent))
        .collect();

    for (entity, config, intent) in entities {
        let body_rotation = B::get_rotation(world, entity);
        let body_forward = body_rotation * Vec3::NEG_Z;

        // Camera targeting this body, if one exists. Without a camera the
        // body's own heading stands in, which degrades camera-relative
        // blending to heading-relative instead of failing the tick.
        let camera_rotation = cameras
            .iter()
            .find(|(target, _)| *target == Some(entity))
            .map(|(_, rotation)| *rotation)
            .unwrap_or(body_rotation);

        let ctx = OrientationContext {
            surface_up,
            camera_forward: camera_rotation * Vec3::NEG_Z,
            camera_right: camera_rotation * Vec3::X,
            body_forward,
            move_axis: intent.move_axis,
        };
        let (target, desired_forward) = orientation::solve(&ctx);

        let step = smoothing_step(config.rotation_rate, dt);
        let new_rotation = body_rotation.slerp(target, step).normalize();
        B::set_rotation(world, entity, new_rotation);

        if let Some(mut controller) = world.get_mut::<CharacterController>(entity) {
            controller.surface_up = surface_up;
            controller.desired_forward = desired_forward;
        }
    }
}

/// Apply continuous gravity acceleration as a force.
///
/// A force, not a velocity write, so it integrates naturally with whatever
/// solver the backend runs.
pub fn apply_gravity_force<B: CharacterPhysicsBackend>(world: &mut World) {
    let gravity = match world.get_resource::<GravityField>() {
        Some(gravity) => gravity.clone(),
        None => return,
    };

    let entities: Vec<Entity> = world
        .query_filtered::<Entity, With<CharacterController>>()
        .iter(world)
        .collect();

    for entity in entities {
        let mass = B::get_mass(world, entity);
        B::apply_force(world, entity, gravity.force_on(mass));
    }
}

/// Apply surface-relative movement.
///
/// Velocity is decomposed against the tick's surface up. Active input
/// replaces the horizontal component outright with `desired_forward *
/// move_speed`; idle input damps it exponentially so the body does not
/// slide. The vertical component is always preserved, which keeps falling
/// and rising natural.
pub fn apply_movement<B: CharacterPhysicsBackend>(world: &mut World) {
    let dt = B::get_fixed_timestep(world);

    let entities: Vec<(Entity, ControllerConfig, MovementIntent, Vec3, Vec3)> = world
        .query::<(
            Entity,
            &ControllerConfig,
            &MovementIntent,
            &CharacterController,
        )>()
        .iter(world)
        .map(|(entity, config, intent, controller)| {
            (
                entity,
                *config,
                *intent,
                controller.surface_up,
                controller.desired_forward,
            )
        })
        .collect();

    for (entity, config, intent, up, desired_forward) in entities {
        let velocity = B::get_velocity(world, entity);
        let vertical = up * velocity.dot(up);
        let horizontal = velocity - vertical;

        let new_horizontal = if intent.is_moving() {
            desired_forward * config.move_speed
        } else {
            horizontal * (-config.stop_damping * dt).exp()
        };

        B::set_velocity(world, entity, new_horizontal + vertical);
    }
}

/// Apply a jump impulse on the rising edge of the jump input.
///
/// Only permitted while grounded; the impulse is along surface up and is
/// not scaled by the step duration.
pub fn apply_jump<B: CharacterPhysicsBackend>(world: &mut World) {
    let entities: Vec<(Entity, ControllerConfig, bool, bool, Vec3)> = world
        .query::<(
            Entity,
            &ControllerConfig,
            &MovementIntent,
            &CharacterController,
        )>()
        .iter(world)
        .map(|(entity, config, intent, controller)| {
            (
                entity,
                *config,
                intent.jump_edge(),
                controller.is_grounded,
                controller.surface_up,
            )
        })
        .collect();

    for (entity, config, edge, grounded, up) in entities {
        if edge && grounded {
            B::apply_impulse(world, entity, up * config.jump_impulse);
        }
        // Record the held state for next tick's edge detection.
        if let Some(mut intent) = world.get_mut::<MovementIntent>(entity) {
            intent.jump_pressed_prev = intent.jump_pressed;
        }
    }
}

/// Interpret probe results into grounded state and fall duration, and
/// notify the game-rule collaborator.
///
/// Runs after the backend sensor systems have written
/// `CharacterController::ground` for this tick. The notification is sent
/// every tick, grounded or not; the collaborator owns any timeout policy.
pub fn update_ground_state(
    time: Res<Time<Fixed>>,
    mut q_controllers: Query<(Entity, &ControllerConfig, &mut CharacterController)>,
    mut notifications: EventWriter<GroundStateChanged>,
) {
    let dt = time.delta_secs();
    for (entity, config, mut controller) in &mut q_controllers {
        let grounded = controller
            .ground
            .map(|hit| hit.distance < config.ground_clearance)
            .unwrap_or(false);

        controller.is_grounded = grounded;
        if grounded {
            controller.fall_duration = 0.0;
        } else {
            controller.fall_duration += dt;
        }

        notifications.write(GroundStateChanged {
            entity,
            is_grounded: grounded,
            fall_duration: controller.fall_duration,
        });
    }
}

/// Sync [`Grounded`]/[`Airborne`] marker components from controller state.
pub fn sync_state_markers(
    mut commands: Commands,
    q_controllers: Query<(Entity, &CharacterController, Has<Grounded>, Has<Airborne>)>,
) {
    for (entity, controller, has_grounded, has_airborne) in &q_controllers {
        if controller.is_grounded {
            if !has_grounded {
                commands.entity(entity).insert(Grounded).remove::<Airborne>();
            }
        } else if has_grounded || !has_airborne {
            commands.entity(entity).remove::<Grounded>().insert(Airborne);
        }
    }
}
