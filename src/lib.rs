//! # `gravity_shift_controller`
//!
//! A 3D gravity-shifting character controller with physics backend
//! abstraction.
//!
//! This crate provides a controller for games where gravity itself is a
//! mechanic:
//! - A global [`gravity::GravityField`] that can be redirected at runtime,
//!   with player-driven redirection staged through an edge-triggered
//!   [`gravity::GravityRequest`] and applied atomically between ticks
//! - Orientation solving that keeps the body's feet toward gravity and its
//!   heading camera-relative, converging exponentially
//! - Surface-relative movement: instant horizontal speed on input,
//!   exponential stop when idle, jumps along surface up
//! - A downward probe driving grounded state and a fall timer
//! - An occlusion-aware third-person follow camera expressed in the
//!   current gravity frame
//! - A game-rule collaborator fed by ground and pickup notifications
//! - Physics backend abstraction (Rapier3D included)
//!
//! ## Architecture
//!
//! All simulation runs on the fixed tick in a strict order: a confirmed
//! gravity request is applied first, then orientation, forces and
//! movement, then the backend's sensors, then ground-state bookkeeping and
//! the game rules. The camera rig runs on the render tick and only reads
//! simulation state.
//!
//! ## Usage
//!
//! ```rust
//! use bevy::prelude::*;
//! use gravity_shift_controller::prelude::*;
//!
//! // Components for a controller body
//! let controller = CharacterController::new();
//! let config = ControllerConfig::player();
//! let intent = MovementIntent::default();
//!
//! // These can be spawned as a bundle with physics components
//! ```

use bevy::prelude::*;

pub mod backend;
pub mod camera;
pub mod collision;
pub mod config;
pub mod gravity;
pub mod intent;
pub mod orientation;
pub mod rules;
pub mod state;
pub mod systems;

#[cfg(feature = "rapier3d")]
pub mod rapier;

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::backend::CharacterPhysicsBackend;
    pub use crate::camera::{CameraRigConfig, FollowCamera};
    pub use crate::collision::CollisionData;
    pub use crate::config::{CharacterController, ControllerConfig};
    pub use crate::gravity::{GravityChanged, GravityField, GravityRequest};
    pub use crate::intent::MovementIntent;
    pub use crate::rules::{GameOutcome, GameOver, GameRules, GroundStateChanged, Pickup, PickupOverlap};
    pub use crate::state::{Airborne, Grounded};
    pub use crate::{CameraSet, ControllerSet, GravityControllerPlugin};

    #[cfg(feature = "rapier3d")]
    pub use crate::rapier::{Rapier3dBackend, Rapier3dCharacterBundle};
}

/// Fixed-tick phases of the controller, executed in declaration order.
///
/// Backend plugins hook their sensor systems into [`ControllerSet::Sensors`].
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControllerSet {
    /// Apply a confirmed gravity redirection before anything reads gravity.
    GravityShift,
    /// Solve and step body orientation for the current gravity frame.
    Orientation,
    /// Gravity force, movement velocity and jump impulses.
    Forces,
    /// Backend scene queries (ground probe).
    Sensors,
    /// Interpret probe results into grounded state and markers.
    GroundState,
    /// Fold the tick's notifications into the game rules.
    Rules,
}

/// Render-tick phases of the follow camera.
///
/// Backend plugins hook their occlusion probe into [`CameraSet::Occlusion`].
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CameraSet {
    /// Backend occlusion probe for the camera ray.
    Occlusion,
    /// Advance the rig from input and the occlusion result.
    Rig,
}

/// Main plugin for the gravity-shifting character controller.
///
/// Generic over a physics backend `B` which provides the actual physics
/// operations (body access, scene queries).
///
/// # Examples
///
/// With the Rapier3D backend:
/// ```rust,no_run
/// use bevy::prelude::*;
/// use bevy_rapier3d::prelude::*;
/// use gravity_shift_controller::prelude::*;
///
/// App::new()
///     .add_plugins(DefaultPlugins)
///     .add_plugins(RapierPhysicsPlugin::<NoUserData>::default())
///     .add_plugins(GravityControllerPlugin::<Rapier3dBackend>::default())
///     .run();
/// ```
pub struct GravityControllerPlugin<B: backend::CharacterPhysicsBackend> {
    _marker: std::marker::PhantomData<B>,
}

impl<B: backend::CharacterPhysicsBackend> Default for GravityControllerPlugin<B> {
    fn default() -> Self {
        Self {
            _marker: std::marker::PhantomData,
        }
    }
}

impl<B: backend::CharacterPhysicsBackend> Plugin for GravityControllerPlugin<B> {
    fn build(&self, app: &mut App) {
        // Register core types
        app.register_type::<config::CharacterController>();
        app.register_type::<config::ControllerConfig>();
        app.register_type::<gravity::GravityField>();
        app.register_type::<gravity::GravityRequest>();
        app.register_type::<intent::MovementIntent>();
        app.register_type::<state::Grounded>();
        app.register_type::<state::Airborne>();
        app.register_type::<camera::FollowCamera>();
        app.register_type::<camera::CameraRigConfig>();
        app.register_type::<rules::Pickup>();

        // Global state
        app.init_resource::<gravity::GravityField>();
        app.init_resource::<gravity::GravityRequest>();
        app.init_resource::<rules::GameRules>();

        // Events
        app.add_event::<gravity::GravityChanged>();
        app.add_event::<rules::GroundStateChanged>();
        app.add_event::<rules::PickupOverlap>();
        app.add_event::<rules::GameOver>();

        // Add the physics backend plugin
        app.add_plugins(B::plugin());

        app.configure_sets(
            FixedUpdate,
            (
                ControllerSet::GravityShift,
                ControllerSet::Orientation,
                ControllerSet::Forces,
                ControllerSet::Sensors,
                ControllerSet::GroundState,
                ControllerSet::Rules,
            )
                .chain(),
        );
        app.configure_sets(Update, (CameraSet::Occlusion, CameraSet::Rig).chain());

        app.add_systems(
            FixedUpdate,
            (
                gravity::apply_gravity_requests.in_set(ControllerSet::GravityShift),
                systems::update_orientation::<B>.in_set(ControllerSet::Orientation),
                (
                    systems::apply_gravity_force::<B>,
                    systems::apply_movement::<B>,
                    systems::apply_jump::<B>,
                )
                    .chain()
                    .in_set(ControllerSet::Forces),
                (systems::update_ground_state, systems::sync_state_markers)
                    .chain()
                    .in_set(ControllerSet::GroundState),
                rules::evaluate_game_rules.in_set(ControllerSet::Rules),
            ),
        );

        app.add_systems(Update, camera::update_camera_rig.in_set(CameraSet::Rig));
    }
}
