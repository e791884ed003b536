//! Raw collision query results shared between backends and core systems.

use bevy::prelude::*;

/// Result of a physics query (raycast) performed by a backend sensor system.
///
/// Backends fill this in; core systems only read it.
#[derive(Debug, Clone, Copy)]
pub struct CollisionData {
    /// Distance from the query origin to the hit point.
    pub distance: f32,
    /// Surface normal at the hit point (points away from the surface).
    pub normal: Vec3,
    /// Hit point in world space.
    pub point: Vec3,
    /// Entity that was hit, if the backend can report one.
    pub entity: Option<Entity>,
}

impl CollisionData {
    /// Create a new collision result.
    pub fn new(distance: f32, normal: Vec3, point: Vec3, entity: Option<Entity>) -> Self {
        Self {
            distance,
            normal,
            point,
            entity,
        }
    }
}
