//! Game-rule collaborator.
//!
//! The controller core reports what happened (ground contact, pickup
//! overlap) and this module decides what it means: win on collecting every
//! pickup, lose on the countdown expiring or on falling for too long.
//! Everything here is policy over notifications; the core never reads it
//! back.

use bevy::log::info;
use bevy::prelude::*;

/// Per-tick ground contact notification from the ground probe.
#[derive(Event, Debug, Clone, Copy)]
pub struct GroundStateChanged {
    /// The controller body this notification is about.
    pub entity: Entity,
    /// Whether the body is currently supported.
    pub is_grounded: bool,
    /// Seconds spent airborne since last ground contact.
    pub fall_duration: f32,
}

/// Notification that a body overlapped a pickup.
#[derive(Event, Debug, Clone, Copy)]
pub struct PickupOverlap {
    /// The pickup entity. The host decides whether to despawn it.
    pub pickup: Entity,
    /// The pickup's stable identifier.
    pub id: u32,
}

/// Marker for collectible pickups, carrying a stable identifier.
#[derive(Component, Reflect, Debug, Clone, Copy)]
#[reflect(Component)]
pub struct Pickup {
    /// Stable identifier reported in [`PickupOverlap`].
    pub id: u32,
}

/// How a round ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOutcome {
    /// Every pickup was collected before the timer ran out.
    Won,
    /// The countdown reached zero.
    TimedOut,
    /// The body fell without ground contact past the fall limit.
    FellTooLong,
}

impl GameOutcome {
    /// Whether this outcome is a win.
    pub fn is_win(&self) -> bool {
        matches!(self, Self::Won)
    }

    /// Human-readable end-screen message.
    pub fn message(&self) -> &'static str {
        match self {
            Self::Won => "All pickups collected!",
            Self::TimedOut => "Time's up!",
            Self::FellTooLong => "Lost in space!",
        }
    }
}

/// Event emitted exactly once when the round ends.
#[derive(Event, Debug, Clone, Copy)]
pub struct GameOver {
    /// The final outcome.
    pub outcome: GameOutcome,
}

/// Round state and the win/lose policy.
///
/// Once an outcome is reached all further notifications are ignored until
/// [`GameRules::reset`].
#[derive(Resource, Debug, Clone)]
pub struct GameRules {
    time_limit: f32,
    time_remaining: f32,
    max_fall_time: f32,
    total_pickups: u32,
    collected: u32,
    outcome: Option<GameOutcome>,
}

impl Default for GameRules {
    fn default() -> Self {
        Self::new(120.0, 5.0)
    }
}

impl GameRules {
    /// Create rules with the given countdown and fall limit, in seconds.
    pub fn new(time_limit: f32, max_fall_time: f32) -> Self {
        Self {
            time_limit,
            time_remaining: time_limit,
            max_fall_time,
            total_pickups: 0,
            collected: 0,
            outcome: None,
        }
    }

    /// Builder: set how many pickups exist. Zero disables the win
    /// condition.
    pub fn with_total_pickups(mut self, total: u32) -> Self {
        self.total_pickups = total;
        self
    }

    /// Set how many pickups exist (e.g. counted at scene spawn).
    pub fn set_total_pickups(&mut self, total: u32) {
        self.total_pickups = total;
    }

    /// Seconds left on the countdown.
    pub fn time_remaining(&self) -> f32 {
        self.time_remaining
    }

    /// Pickups collected so far.
    pub fn collected(&self) -> u32 {
        self.collected
    }

    /// Total pickups registered.
    pub fn total_pickups(&self) -> u32 {
        self.total_pickups
    }

    /// The final outcome, once the round has ended.
    pub fn outcome(&self) -> Option<GameOutcome> {
        self.outcome
    }

    /// Whether the round has ended.
    pub fn is_over(&self) -> bool {
        self.outcome.is_some()
    }

    /// Restart the round, keeping the configured limits and pickup total.
    pub fn reset(&mut self) {
        self.time_remaining = self.time_limit;
        self.collected = 0;
        self.outcome = None;
    }

    /// Advance the countdown. Returns the outcome if this ended the round.
    pub fn tick(&mut self, dt: f32) -> Option<GameOutcome> {
        if self.is_over() {
            return None;
        }
        self.time_remaining -= dt;
        if self.time_remaining <= 0.0 {
            self.time_remaining = 0.0;
            return self.end(GameOutcome::TimedOut);
        }
        None
    }

    /// Consume a ground-state notification. Returns the outcome if the
    /// fall limit was exceeded.
    pub fn notify_ground_state(&mut self, is_grounded: bool, fall_duration: f32) -> Option<GameOutcome> {
        if self.is_over() {
            return None;
        }
        if !is_grounded && fall_duration > self.max_fall_time {
            return self.end(GameOutcome::FellTooLong);
        }
        None
    }

    /// Consume a pickup notification. Returns the outcome if this was the
    /// last pickup.
    pub fn notify_pickup_collected(&mut self) -> Option<GameOutcome> {
        if self.is_over() {
            return None;
        }
        self.collected += 1;
        if self.total_pickups > 0 && self.collected >= self.total_pickups {
            return self.end(GameOutcome::Won);
        }
        None
    }

    fn end(&mut self, outcome: GameOutcome) -> Option<GameOutcome> {
        self.outcome = Some(outcome);
        Some(outcome)
    }
}

/// Fold this tick's notifications into the round state.
///
/// Runs last in the fixed tick so it sees the ground state the probe just
/// published.
pub fn evaluate_game_rules(
    time: Res<Time<Fixed>>,
    mut rules: ResMut<GameRules>,
    mut ground_events: EventReader<GroundStateChanged>,
    mut pickup_events: EventReader<PickupOverlap>,
    mut game_over: EventWriter<GameOver>,
) {
    if rules.is_over() {
        ground_events.clear();
        pickup_events.clear();
        return;
    }

    let mut ended = rules.tick(time.delta_secs());

    for _overlap in pickup_events.read() {
        if ended.is_none() {
            ended = rules.notify_pickup_collected();
        }
    }

    for notification in ground_events.read() {
        if ended.is_none() {
            ended = rules.notify_ground_state(notification.is_grounded, notification.fall_duration);
        }
    }

    if let Some(outcome) = ended {
        info!("round over: {}", outcome.message());
        game_over.write(GameOver { outcome });
    }
}
