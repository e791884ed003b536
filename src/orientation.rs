//! Orientation solving for gravity-relative movement.
//!
//! All functions here are pure math over the current surface frame (the
//! plane perpendicular to `-gravity`). The motion systems call [`solve`]
//! once per fixed tick and spherically interpolate the body toward the
//! returned target, so a single degenerate frame can never destabilize
//! motion: every fallback substitutes a usable direction instead of
//! propagating an error.
//!
//! Conventions follow Bevy: a rotation's forward axis is `-Z`, its up axis
//! is `+Y`.

use bevy::prelude::*;

/// Movement input below this magnitude is treated as idle.
pub const INPUT_DEADZONE: f32 = 0.1;

/// Squared length under which a projected vector counts as degenerate.
const DEGENERATE_EPSILON: f32 = 1e-6;

/// Inputs for one orientation solve.
#[derive(Debug, Clone, Copy)]
pub struct OrientationContext {
    /// Surface up, i.e. `-gravity.direction`. Must be unit length.
    pub surface_up: Vec3,
    /// Camera forward axis in world space.
    pub camera_forward: Vec3,
    /// Camera right axis in world space.
    pub camera_right: Vec3,
    /// Body forward axis from the previous tick.
    pub body_forward: Vec3,
    /// Raw 2D movement input: `x` lateral, `y` longitudinal.
    pub move_axis: Vec2,
}

/// Project `v` onto the plane with unit normal `n` and normalize.
///
/// Returns `None` when `v` is (near) parallel to `n` and the projection
/// collapses.
pub fn project_onto_plane(v: Vec3, n: Vec3) -> Option<Vec3> {
    let flat = v.reject_from_normalized(n);
    if flat.length_squared() < DEGENERATE_EPSILON {
        None
    } else {
        Some(flat.normalize())
    }
}

/// Build the rotation whose forward axis is `forward` and whose up axis is
/// (orthonormalized) `up`.
///
/// `forward` and `up` must not be parallel; callers guard that with
/// [`project_onto_plane`]. As a last line of defense a degenerate basis
/// falls back to an arbitrary orthonormal right axis rather than producing
/// NaNs.
pub fn look_rotation(forward: Vec3, up: Vec3) -> Quat {
    let back = -forward.normalize_or_zero();
    if back == Vec3::ZERO {
        return Quat::IDENTITY;
    }
    let mut right = up.cross(back);
    if right.length_squared() < DEGENERATE_EPSILON {
        right = back.any_orthonormal_vector();
    } else {
        right = right.normalize();
    }
    let up = back.cross(right);
    Quat::from_mat3(&Mat3::from_cols(right, up, back))
}

/// Exponential smoothing fraction for a frame-rate independent step.
///
/// `rate` is expressed as convergence-per-second; the returned fraction is
/// in `[0, 1]` and satisfies `step(rate, a) + step(rate, b)`-style
/// composition, so varying `dt` does not change convergence time.
pub fn smoothing_step(rate: f32, dt: f32) -> f32 {
    (1.0 - (-rate.max(0.0) * dt.max(0.0)).exp()).clamp(0.0, 1.0)
}

/// Compute the desired forward direction on the current surface plane.
///
/// Active input blends the projected camera axes by the input components.
/// Idle input reprojects the body's previous forward, which keeps facing
/// stable across gravity changes.
pub fn desired_forward(ctx: &OrientationContext) -> Vec3 {
    let up = ctx.surface_up;

    // Camera basis on the surface plane. A camera looking straight along
    // gravity degenerates to the body's previous heading.
    let flat_forward = project_onto_plane(ctx.camera_forward, up)
        .or_else(|| project_onto_plane(ctx.body_forward, up))
        .unwrap_or_else(|| up.any_orthonormal_vector());
    let flat_right =
        project_onto_plane(ctx.camera_right, up).unwrap_or_else(|| flat_forward.cross(up));

    if ctx.move_axis.length() >= INPUT_DEADZONE {
        let blended = flat_right * ctx.move_axis.x + flat_forward * ctx.move_axis.y;
        match project_onto_plane(blended, up) {
            Some(dir) => dir,
            None => flat_forward,
        }
    } else {
        project_onto_plane(ctx.body_forward, up).unwrap_or(flat_forward)
    }
}

/// Solve the target orientation for the current tick.
///
/// Returns the target rotation and the desired forward it was built from;
/// the integrator reuses the forward for velocity replacement so both are
/// always consistent.
pub fn solve(ctx: &OrientationContext) -> (Quat, Vec3) {
    let up = ctx.surface_up;
    let mut forward = desired_forward(ctx);

    // Nearly parallel forward/up would make the look rotation degenerate;
    // substitute the raw camera forward before building it.
    if forward.cross(up).length_squared() < DEGENERATE_EPSILON {
        forward = project_onto_plane(ctx.camera_forward, up)
            .unwrap_or_else(|| up.any_orthonormal_vector());
    }

    (look_rotation(forward, up), forward)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn ctx(up: Vec3, cam_forward: Vec3, body_forward: Vec3, input: Vec2) -> OrientationContext {
        let cam_right = cam_forward.cross(up).normalize_or_zero();
        OrientationContext {
            surface_up: up,
            camera_forward: cam_forward,
            camera_right: cam_right,
            body_forward,
            move_axis: input,
        }
    }

    #[test]
    fn project_removes_normal_component() {
        let projected = project_onto_plane(Vec3::new(1.0, 5.0, 0.0), Vec3::Y).unwrap();
        assert_relative_eq!(projected.x, 1.0, epsilon = 1e-6);
        assert_relative_eq!(projected.y, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn project_parallel_is_none() {
        assert!(project_onto_plane(Vec3::Y * 3.0, Vec3::Y).is_none());
        assert!(project_onto_plane(Vec3::ZERO, Vec3::Y).is_none());
    }

    #[test]
    fn look_rotation_identity() {
        let rot = look_rotation(Vec3::NEG_Z, Vec3::Y);
        assert!(rot.angle_between(Quat::IDENTITY) < 1e-5);
    }

    #[test]
    fn look_rotation_axes_match_inputs() {
        let forward = Vec3::new(1.0, 0.0, -1.0).normalize();
        let rot = look_rotation(forward, Vec3::Y);
        let actual_forward = rot * Vec3::NEG_Z;
        let actual_up = rot * Vec3::Y;
        assert!((actual_forward - forward).length() < 1e-5);
        assert!((actual_up - Vec3::Y).length() < 1e-5);
    }

    #[test]
    fn look_rotation_sideways_up() {
        // Up along +X, forward along -Z: body standing on a wall.
        let rot = look_rotation(Vec3::NEG_Z, Vec3::X);
        assert!((rot * Vec3::Y - Vec3::X).length() < 1e-5);
        assert!((rot * Vec3::NEG_Z - Vec3::NEG_Z).length() < 1e-5);
    }

    #[test]
    fn look_rotation_parallel_inputs_stay_finite() {
        let rot = look_rotation(Vec3::Y, Vec3::Y);
        assert!(rot.is_finite());
        assert!((rot * Vec3::NEG_Z - Vec3::Y).length() < 1e-4);
    }

    #[test]
    fn smoothing_step_bounds() {
        assert_eq!(smoothing_step(0.0, 1.0), 0.0);
        assert!(smoothing_step(10.0, 1.0 / 60.0) > 0.0);
        assert!(smoothing_step(1000.0, 1.0) <= 1.0);
    }

    #[test]
    fn smoothing_step_composes_over_dt() {
        // Two half steps converge exactly as much as one full step.
        let full = smoothing_step(4.0, 0.5);
        let half = smoothing_step(4.0, 0.25);
        let composed = half + (1.0 - half) * half;
        assert_relative_eq!(full, composed, epsilon = 1e-6);
    }

    #[test]
    fn active_input_blends_camera_axes() {
        let c = ctx(Vec3::Y, Vec3::NEG_Z, Vec3::NEG_Z, Vec2::new(1.0, 0.0));
        let forward = desired_forward(&c);
        // Pure lateral input faces along camera right.
        assert!((forward - c.camera_right).length() < 1e-5);
    }

    #[test]
    fn idle_input_keeps_previous_heading() {
        let body_forward = Vec3::new(1.0, 0.0, -1.0).normalize();
        let c = ctx(Vec3::Y, Vec3::NEG_Z, body_forward, Vec2::ZERO);
        let forward = desired_forward(&c);
        assert!((forward - body_forward).length() < 1e-5);
    }

    #[test]
    fn idle_input_reprojects_after_gravity_change() {
        // Body was walking along -Z with Y up; gravity flips so up is +X.
        let c = ctx(Vec3::X, Vec3::NEG_Z, Vec3::NEG_Z, Vec2::ZERO);
        let forward = desired_forward(&c);
        // -Z is already in the new plane, heading is preserved exactly.
        assert!((forward - Vec3::NEG_Z).length() < 1e-5);
    }

    #[test]
    fn camera_parallel_to_up_falls_back_to_body_forward() {
        let c = OrientationContext {
            surface_up: Vec3::Y,
            camera_forward: Vec3::NEG_Y, // looking straight down
            camera_right: Vec3::X,
            body_forward: Vec3::NEG_Z,
            move_axis: Vec2::new(0.0, 1.0),
        };
        let forward = desired_forward(&c);
        assert!((forward - Vec3::NEG_Z).length() < 1e-5);
    }

    #[test]
    fn solve_target_up_opposes_gravity() {
        for up in [Vec3::Y, Vec3::X, Vec3::NEG_Z, Vec3::new(0.0, -1.0, 0.0)] {
            let c = ctx(up, Vec3::NEG_Z, Vec3::NEG_Z, Vec2::ZERO);
            let (rot, _) = solve(&c);
            let actual_up = rot * Vec3::Y;
            assert!(
                (actual_up - up).length() < 1e-4,
                "up {up:?} produced {actual_up:?}"
            );
        }
    }

    #[test]
    fn solve_forward_matches_returned_forward() {
        let c = ctx(Vec3::Y, Vec3::NEG_Z, Vec3::NEG_Z, Vec2::new(0.5, 0.5));
        let (rot, forward) = solve(&c);
        assert!((rot * Vec3::NEG_Z - forward).length() < 1e-5);
    }
}
