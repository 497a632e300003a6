//! Definitions for the projectile fired by a Tank

use nanorand::WyRand;

use crate::utils::{signed_uniform, uniform, Size, Vector2};

use super::constants::{
    BULLET_HEIGHT, BULLET_LENGTH, BULLET_LENGTH_JITTER, BULLET_POSITION_JITTER, BULLET_SPEED,
    BULLET_WIDTH,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BulletTuning {
    /// Pixels per second
    pub speed: f64,
    /// Shortest travel distance in pixels
    pub length: f64,
    /// Upper bound of the random extra distance
    pub length_jitter: f64,
    /// Upper bound of the random deviation on each axis
    pub position_jitter: f64,
    pub width: f64,
    pub height: f64,
}

impl Default for BulletTuning {
    fn default() -> Self {
        Self {
            speed: BULLET_SPEED,
            length: BULLET_LENGTH,
            length_jitter: BULLET_LENGTH_JITTER,
            position_jitter: BULLET_POSITION_JITTER,
            width: BULLET_WIDTH,
            height: BULLET_HEIGHT,
        }
    }
}

/// Constants of a single Bullet
///
/// Range and deviation are not stored: they are drawn every time a trajectory is
/// computed so that each shot lands somewhere slightly different.
#[derive(Debug, Clone, PartialEq)]
pub struct BulletState {
    speed: f64,
    length: f64,
    length_jitter: f64,
    position_jitter: f64,
    size: Size,
}

impl BulletState {
    pub fn new(tuning: BulletTuning) -> Self {
        Self {
            speed: tuning.speed,
            length: tuning.length,
            length_jitter: tuning.length_jitter,
            position_jitter: tuning.position_jitter,
            size: Size::new(tuning.width, tuning.height),
        }
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Base travel distance without jitter
    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn size(&self) -> Size {
        self.size
    }

    /// Draw a travel distance from [length, length + length_jitter)
    pub fn travel_length(&self, rng: &mut WyRand) -> f64 {
        self.length + uniform(rng, self.length_jitter)
    }

    /// Draw an independent signed deviation for each axis
    pub fn spread(&self, rng: &mut WyRand) -> Vector2 {
        Vector2 {
            x: signed_uniform(rng, self.position_jitter),
            y: signed_uniform(rng, self.position_jitter),
        }
    }
}

impl Default for BulletState {
    fn default() -> Self {
        Self::new(BulletTuning::default())
    }
}
