//! Up front configuration values

use std::time::Duration;

/// Displacement of the Tank per tick in pixels
pub const TANK_SPEED: f64 = 5.0;
/// Degrees added to or removed from the Tank angle per rotate command
pub const TANK_ANGLE_SPEED: f64 = 3.0;
/// Width of the Tank sprite in pixels
pub const TANK_WIDTH: f64 = 75.0;
/// Height of the Tank sprite in pixels
pub const TANK_HEIGHT: f64 = 150.0;

/// Speed of the Bullet in pixels per second
pub const BULLET_SPEED: f64 = 800.0;
/// Shortest distance a Bullet travels in pixels
pub const BULLET_LENGTH: f64 = 250.0;
/// Upper bound of the random distance added to [`BULLET_LENGTH`]
pub const BULLET_LENGTH_JITTER: f64 = 50.0;
/// Upper bound of the random deviation on each axis of the Bullet target
pub const BULLET_POSITION_JITTER: f64 = 10.0;
pub const BULLET_WIDTH: f64 = 16.0;
pub const BULLET_HEIGHT: f64 = 16.0;

/// Minimum time between two shots of the same Tank
pub const SHOT_COOLDOWN: Duration = Duration::from_millis(300);
/// How long the Tank shows its shooting state
pub const SHOOTING_FLAG_DURATION: Duration = Duration::from_millis(200);
/// Delay between a Bullet exploding and leaving its hole behind
pub const BULLET_EXPLODE_TIME: Duration = Duration::from_millis(500);
/// Duration of the fade applied to whatever a Bullet lands on
pub const IMPACT_FADE_DURATION: Duration = Duration::from_millis(500);
/// How long a Bullet hole stays on the surface before fading
pub const HOLE_LIFETIME: Duration = Duration::from_secs(3);
/// Duration of the fade that clears a Bullet hole
pub const HOLE_FADE_DURATION: Duration = Duration::from_millis(500);

/// Frame period used when the host has no display refresh callback
pub const FRAME_FALLBACK: Duration = Duration::from_micros(16_667);
