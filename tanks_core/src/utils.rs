use nanorand::{Rng, WyRand};
use serde::{Deserialize, Serialize};
use tanks_events::Position;

#[derive(Serialize, Deserialize, Default, Debug, Clone, Copy, PartialEq)]
pub struct Vector2 {
    pub x: f64,
    pub y: f64,
}

impl Vector2 {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn zero() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    /// Unit vector pointing along `radians`
    pub fn from_angle(radians: f64) -> Self {
        Self {
            x: radians.cos(),
            y: radians.sin(),
        }
    }

    pub fn plus(&self, coord: &Vector2) -> Self {
        Self {
            x: self.x + coord.x,
            y: self.y + coord.y,
        }
    }

    pub fn minus(&self, coord: &Vector2) -> Self {
        Self {
            x: self.x - coord.x,
            y: self.y - coord.y,
        }
    }

    pub fn scale(&self, factor: f64) -> Self {
        Self {
            x: self.x * factor,
            y: self.y * factor,
        }
    }

    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn distance(&self, other: &Vector2) -> f64 {
        self.minus(other).magnitude()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<Position> for Vector2 {
    fn from(position: Position) -> Self {
        Self {
            x: position.left,
            y: position.top,
        }
    }
}

impl From<Vector2> for Position {
    fn from(coord: Vector2) -> Self {
        Position {
            left: coord.x,
            top: coord.y,
        }
    }
}

/// Width and height of an element or of the viewport
#[derive(Serialize, Deserialize, Default, Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn half(&self) -> Vector2 {
        Vector2 {
            x: self.width / 2.0,
            y: self.height / 2.0,
        }
    }

    /// Whether a point lies inside the rectangle [0, width] x [0, height]
    pub fn contains(&self, point: &Vector2) -> bool {
        (0.0..=self.width).contains(&point.x) && (0.0..=self.height).contains(&point.y)
    }

    /// Nearest point of the rectangle [0, width] x [0, height]
    pub fn clamp(&self, point: &Vector2) -> Vector2 {
        Vector2 {
            x: point.x.clamp(0.0, self.width.max(0.0)),
            y: point.y.clamp(0.0, self.height.max(0.0)),
        }
    }
}

/// Whether `point` falls inside the rectangle placed at `origin` with the given size
pub fn rect_contains(origin: &Vector2, size: &Size, point: &Vector2) -> bool {
    point.x >= origin.x
        && point.x <= origin.x + size.width
        && point.y >= origin.y
        && point.y <= origin.y + size.height
}

/// Uniform sample from [0, 1)
pub fn unit_sample(rng: &mut WyRand) -> f64 {
    // 53 random bits fill the mantissa exactly, so 1.0 is never produced
    (rng.generate::<u64>() >> 11) as f64 / (1u64 << 53) as f64
}

/// Uniform sample from [0, max)
pub fn uniform(rng: &mut WyRand, max: f64) -> f64 {
    unit_sample(rng) * max
}

/// Uniform magnitude from [0, max) with a random sign
pub fn signed_uniform(rng: &mut WyRand, max: f64) -> f64 {
    let magnitude = uniform(rng, max);
    match rng.generate::<u64>() & 1 {
        0 => magnitude,
        _ => -magnitude,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_samples_stay_below_one() {
        let mut rng = WyRand::new_seed(7);
        for _ in 0..10_000 {
            let sample = unit_sample(&mut rng);
            assert!((0.0..1.0).contains(&sample));
        }
    }

    #[test]
    fn signed_samples_take_both_signs() {
        let mut rng = WyRand::new_seed(11);
        let samples: Vec<f64> = (0..200).map(|_| signed_uniform(&mut rng, 5.0)).collect();
        assert!(samples.iter().all(|s| s.abs() < 5.0));
        assert!(samples.iter().any(|s| *s < 0.0));
        assert!(samples.iter().any(|s| *s > 0.0));
    }

    #[test]
    fn viewport_bounds_are_inclusive() {
        let viewport = Size::new(100.0, 50.0);
        assert!(viewport.contains(&Vector2::new(0.0, 0.0)));
        assert!(viewport.contains(&Vector2::new(100.0, 50.0)));
        assert!(!viewport.contains(&Vector2::new(100.1, 10.0)));
        assert!(!viewport.contains(&Vector2::new(10.0, -0.1)));
        assert_eq!(
            viewport.clamp(&Vector2::new(-5.0, 70.0)),
            Vector2::new(0.0, 50.0)
        );
    }

    #[test]
    fn position_round_trips_through_vector() {
        let coord: Vector2 = Position::new(3.0, 4.0).into();
        assert_eq!(coord, Vector2::new(3.0, 4.0));
        assert_eq!(coord.magnitude(), 5.0);
    }
}
