//! Occlusion-aware third-person follow camera.
//!
//! The rig orbits a focus point above its target with yaw/pitch expressed
//! in the current gravity frame. A backend occlusion system raycasts from
//! the focus toward the desired camera position each render tick; on a hit
//! the rig contracts its distance to just in front of the obstruction, and
//! when the path clears it relaxes back toward the configured maximum at a
//! fixed rate independent of the follow smoothing.
//!
//! This runs on the render tick (`Update`): it reads body and gravity
//! state but never writes either.

use bevy::prelude::*;

use crate::collision::CollisionData;
use crate::gravity::GravityField;
use crate::orientation::{look_rotation, smoothing_step};

/// Follow camera state.
///
/// Attach to a camera entity together with [`CameraRigConfig`]. The host
/// feeds `rotate_input` every frame (mouse delta, right stick, etc.); the
/// rig systems own everything else.
#[derive(Component, Reflect, Debug, Clone)]
#[reflect(Component)]
pub struct FollowCamera {
    /// Entity the camera follows. The rig skips its update while this is
    /// `None` or the target is missing.
    pub target: Option<Entity>,
    /// Orbit yaw around surface up, radians.
    pub yaw: f32,
    /// Orbit pitch, radians; positive looks down from above. Clamped to
    /// the config's bounds every update.
    pub pitch: f32,
    /// Current orbit distance, re-derived every frame from occlusion.
    /// Always within `[min_distance, distance]`.
    pub current_distance: f32,
    /// Raw 2D rotation input for this frame: `x` yaw, `y` pitch.
    pub rotate_input: Vec2,
    /// Occlusion probe result for this frame, written by the backend
    /// sensor system before the rig update.
    #[reflect(ignore)]
    pub occlusion: Option<CollisionData>,
}

impl Default for FollowCamera {
    fn default() -> Self {
        Self {
            target: None,
            yaw: 0.0,
            pitch: 15.0_f32.to_radians(),
            current_distance: 4.0,
            rotate_input: Vec2::ZERO,
            occlusion: None,
        }
    }
}

impl FollowCamera {
    /// Create a follow camera tracking the given entity.
    pub fn new(target: Entity) -> Self {
        Self {
            target: Some(target),
            ..default()
        }
    }

    /// Set this frame's rotation input.
    pub fn set_rotate_input(&mut self, input: Vec2) {
        self.rotate_input = input;
    }
}

/// Follow camera configuration.
#[derive(Component, Reflect, Debug, Clone, Copy)]
#[reflect(Component)]
pub struct CameraRigConfig {
    /// Maximum (and preferred) orbit distance.
    pub distance: f32,
    /// Hard floor for the orbit distance so occlusion never pushes the
    /// camera into the target.
    pub min_distance: f32,
    /// Pull-in distance in front of an occluding surface.
    pub buffer: f32,
    /// Pitch clamp bounds, radians.
    pub min_pitch: f32,
    /// Pitch clamp bounds, radians.
    pub max_pitch: f32,
    /// Yaw input sensitivity, radians/second per unit input.
    pub yaw_sensitivity: f32,
    /// Pitch input sensitivity, radians/second per unit input.
    pub pitch_sensitivity: f32,
    /// Position smoothing rate, fraction-per-second.
    pub follow_speed: f32,
    /// Rotation smoothing rate, fraction-per-second.
    pub rotation_speed: f32,
    /// Distance relaxation rate back toward `distance`, units/second.
    /// Deliberately independent of `follow_speed`.
    pub relax_speed: f32,
    /// Focus point height above the target along surface up.
    pub focus_height: f32,
}

impl Default for CameraRigConfig {
    fn default() -> Self {
        Self {
            distance: 4.0,
            min_distance: 0.5,
            buffer: 0.2,
            min_pitch: (-20.0_f32).to_radians(),
            max_pitch: 60.0_f32.to_radians(),
            yaw_sensitivity: 2.5,
            pitch_sensitivity: 2.5,
            follow_speed: 10.0,
            rotation_speed: 15.0,
            relax_speed: 8.0,
            focus_height: 1.5,
        }
    }
}

impl CameraRigConfig {
    /// Builder: set the orbit distance bounds.
    pub fn with_distance(mut self, max: f32, min: f32) -> Self {
        self.distance = max;
        self.min_distance = min;
        self
    }

    /// Builder: set the occlusion buffer.
    pub fn with_buffer(mut self, buffer: f32) -> Self {
        self.buffer = buffer;
        self
    }

    /// Builder: set the pitch clamp bounds, radians.
    pub fn with_pitch_bounds(mut self, min: f32, max: f32) -> Self {
        self.min_pitch = min;
        self.max_pitch = max;
        self
    }

    /// Builder: set the position and rotation smoothing rates.
    pub fn with_smoothing(mut self, follow_speed: f32, rotation_speed: f32) -> Self {
        self.follow_speed = follow_speed;
        self.rotation_speed = rotation_speed;
        self
    }

    /// Builder: set the focus height above the target.
    pub fn with_focus_height(mut self, height: f32) -> Self {
        self.focus_height = height;
        self
    }
}

/// Orbit rotation for the given gravity frame and yaw/pitch.
///
/// Yaw spins around surface up, pitch tilts around the local right axis;
/// positive pitch looks down from above.
pub fn rig_rotation(surface_up: Vec3, yaw: f32, pitch: f32) -> Quat {
    let frame = Quat::from_rotation_arc(Vec3::Y, surface_up);
    frame * Quat::from_axis_angle(Vec3::Y, yaw) * Quat::from_axis_angle(Vec3::X, -pitch)
}

/// Occluded orbit distance: just in front of the hit, floored at the
/// configured minimum.
pub fn contracted_distance(hit_distance: f32, buffer: f32, min_distance: f32) -> f32 {
    (hit_distance - buffer).max(min_distance)
}

/// Relax the orbit distance toward the maximum at a fixed rate.
pub fn relaxed_distance(current: f32, max: f32, rate: f32, dt: f32) -> f32 {
    (current + rate * dt).min(max)
}

/// The ray the occlusion probe should cast this frame.
///
/// Shared between the rig update and backend occlusion systems so both
/// always agree on the rig geometry: origin is the focus point, direction
/// points toward the desired camera position, length is the full
/// configured distance.
pub fn occlusion_ray(
    camera: &FollowCamera,
    config: &CameraRigConfig,
    target_position: Vec3,
    surface_up: Vec3,
) -> (Vec3, Vec3, f32) {
    let focus = target_position + surface_up * config.focus_height;
    let back = rig_rotation(surface_up, camera.yaw, camera.pitch) * Vec3::Z;
    (focus, back, config.distance)
}

/// Advance yaw/pitch from input, derive the orbit distance from this
/// frame's occlusion result, and smooth the camera toward the rig pose.
pub fn update_camera_rig(
    time: Res<Time>,
    gravity: Res<GravityField>,
    mut q_cameras: Query<(&mut FollowCamera, &CameraRigConfig, &mut Transform)>,
    q_targets: Query<&Transform, Without<FollowCamera>>,
) {
    let dt = time.delta_secs();
    let up = gravity.up();

    for (mut camera, config, mut transform) in &mut q_cameras {
        let Some(target) = camera.target else {
            continue;
        };
        let Ok(target_transform) = q_targets.get(target) else {
            continue;
        };

        camera.yaw += camera.rotate_input.x * config.yaw_sensitivity * dt;
        camera.pitch = (camera.pitch + camera.rotate_input.y * config.pitch_sensitivity * dt)
            .clamp(config.min_pitch, config.max_pitch);

        camera.current_distance = match camera.occlusion {
            Some(hit) => contracted_distance(hit.distance, config.buffer, config.min_distance),
            None => relaxed_distance(camera.current_distance, config.distance, config.relax_speed, dt),
        }
        .clamp(config.min_distance, config.distance);

        let (focus, back, _) = occlusion_ray(&camera, config, target_transform.translation, up);
        let desired_position = focus + back * camera.current_distance;

        let position_step = smoothing_step(config.follow_speed, dt);
        transform.translation = transform.translation.lerp(desired_position, position_step);

        let to_focus = focus - transform.translation;
        if to_focus.length_squared() > 1e-6 {
            let rotation_step = smoothing_step(config.rotation_speed, dt);
            let look = look_rotation(to_focus, up);
            transform.rotation = transform.rotation.slerp(look, rotation_step).normalize();
        }
    }
}
