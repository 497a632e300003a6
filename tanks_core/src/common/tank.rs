//! State owned by a single Tank

use std::{cell::RefCell, rc::Rc};

use crate::{
    error::TankError,
    observer::EventBus,
    utils::{Size, Vector2},
};

use super::constants::{TANK_ANGLE_SPEED, TANK_HEIGHT, TANK_SPEED, TANK_WIDTH};

/// Published with the new angle in degrees after every rotation
pub const ANGLE_CHANGE: &str = "angleChange";

/// Starting values for a Tank
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TankTuning {
    /// Displacement per tick in pixels
    pub speed: f64,
    /// Degrees turned per rotate command
    pub angle_speed: f64,
    pub width: f64,
    pub height: f64,
    /// Top-left corner the Tank spawns at
    pub position: Vector2,
    /// Whether input is honored right after spawning
    pub enabled: bool,
}

impl Default for TankTuning {
    fn default() -> Self {
        Self {
            speed: TANK_SPEED,
            angle_speed: TANK_ANGLE_SPEED,
            width: TANK_WIDTH,
            height: TANK_HEIGHT,
            position: Vector2::zero(),
            enabled: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    Left,
    Right,
}

impl Rotation {
    /// Anything other than `left` or `right` is not a rotation
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "left" => Some(Rotation::Left),
            "right" => Some(Rotation::Right),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    Forward,
    Back,
}

impl MoveDirection {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "forward" => Some(MoveDirection::Forward),
            "back" => Some(MoveDirection::Back),
            _ => None,
        }
    }

    /// Factor applied to the offset vector of [`TankState::angle`]
    pub fn sign(self) -> f64 {
        match self {
            MoveDirection::Forward => -1.0,
            MoveDirection::Back => 1.0,
        }
    }
}

/// Axis aligned facing of the Tank
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Top,
    Right,
    Bottom,
    Left,
}

/// Data a Tank tracks about itself
#[derive(Debug)]
pub struct TankState {
    id: String,
    /// Unbounded angle in degrees, 0 faces the top of the screen
    angle: f64,
    angle_speed: f64,
    speed: f64,
    size: Size,
    /// Top-left corner of the Tank
    position: Vector2,
    enabled: bool,
    destroyed: bool,
    bus: Rc<EventBus<f64>>,
}

impl TankState {
    pub fn new(tuning: TankTuning) -> Self {
        Self::with_id(nanoid::nanoid!(), tuning)
    }

    pub fn with_id(id: impl Into<String>, tuning: TankTuning) -> Self {
        Self {
            id: id.into(),
            angle: 0.0,
            angle_speed: tuning.angle_speed,
            speed: tuning.speed,
            size: Size::new(tuning.width, tuning.height),
            position: tuning.position,
            enabled: tuning.enabled,
            destroyed: false,
            bus: Rc::new(EventBus::new()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Turn by one angle increment and publish [`ANGLE_CHANGE`]
    ///
    /// Subscribers run while `self` is mutably borrowed. A state shared behind a
    /// `RefCell` should be turned with [`TankState::rotate_shared`] instead.
    pub fn rotate(&mut self, rotation: Rotation) {
        let degrees = self.turn(rotation);
        let _ = self.bus.publish(ANGLE_CHANGE, &degrees);
    }

    /// [`TankState::rotate`] on a shared state, [`ANGLE_CHANGE`] goes out once the
    /// borrow is released so subscribers may read the state again
    pub fn rotate_shared(state: &RefCell<TankState>, rotation: Rotation) {
        let (bus, degrees) = {
            let mut state = state.borrow_mut();
            let degrees = state.turn(rotation);
            (state.bus.clone(), degrees)
        };

        let _ = bus.publish(ANGLE_CHANGE, &degrees);
    }

    fn turn(&mut self, rotation: Rotation) -> f64 {
        match rotation {
            Rotation::Left => self.angle -= self.angle_speed,
            Rotation::Right => self.angle += self.angle_speed,
        }
        self.angle
    }

    /// [`TankState::rotate`] from a direction name, unknown names are ignored
    pub fn rotate_named(&mut self, direction: &str) {
        if let Some(rotation) = Rotation::parse(direction) {
            self.rotate(rotation);
        }
    }

    pub fn set_speed(&mut self, speed: f64) -> Result<(), TankError> {
        if !speed.is_finite() {
            return Err(TankError::invalid(format!(
                "incorrect speed {} in TankState::set_speed",
                speed
            )));
        }

        self.speed = speed;
        Ok(())
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Angle in radians, shifted by 90 degrees so that the offset vector
    /// `(cos, sin)` points from the front of the sprite to its back
    pub fn angle(&self) -> f64 {
        (self.angle + 90.0).to_radians()
    }

    /// Raw angle in degrees
    pub fn degrees(&self) -> f64 {
        self.angle
    }

    /// Angle in degrees wrapped to [0, 360)
    pub fn heading(&self) -> f64 {
        self.angle.rem_euclid(360.0)
    }

    /// Unit vector the front of the Tank points along
    pub fn facing(&self) -> Vector2 {
        Vector2::from_angle(self.angle() + std::f64::consts::PI)
    }

    /// Axis aligned direction, `None` while the Tank sits at an in-between angle
    pub fn direction(&self) -> Option<Direction> {
        match self.heading() {
            h if h == 0.0 => Some(Direction::Top),
            h if h == 90.0 => Some(Direction::Right),
            h if h == 180.0 => Some(Direction::Bottom),
            h if h == 270.0 => Some(Direction::Left),
            _ => None,
        }
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn position(&self) -> Vector2 {
        self.position
    }

    pub(crate) fn place(&mut self, position: Vector2) {
        self.position = position;
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    pub fn disable(&mut self) {
        self.enabled = false;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Release the state, safe to call more than once
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }

        self.destroyed = true;
        self.enabled = false;
        let _ = self.bus.off(ANGLE_CHANGE, None);
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn events(&self) -> &EventBus<f64> {
        &self.bus
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::callback;

    fn tank() -> TankState {
        TankState::with_id("tank", TankTuning::default())
    }

    #[test]
    fn left_then_right_restores_the_angle() {
        for start in [-725.0, -90.0, 0.0, 3.0, 181.5, 1080.0] {
            let mut state = tank();
            state.angle = start;

            state.rotate(Rotation::Left);
            assert_ne!(state.degrees(), start);
            state.rotate(Rotation::Right);

            assert_eq!(state.degrees(), start);
        }
    }

    #[test]
    fn rotation_publishes_the_new_angle() {
        let mut state = tank();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        state
            .events()
            .on(ANGLE_CHANGE, callback(move |angle: &f64| sink.borrow_mut().push(*angle)))
            .unwrap();

        state.rotate(Rotation::Right);
        state.rotate(Rotation::Right);
        state.rotate(Rotation::Left);

        assert_eq!(*seen.borrow(), vec![3.0, 6.0, 3.0]);
    }

    #[test]
    fn shared_rotation_publishes_after_the_borrow() {
        let state = Rc::new(RefCell::new(tank()));
        let seen = Rc::new(RefCell::new(Vec::new()));
        let (sink, reader) = (seen.clone(), Rc::downgrade(&state));
        state
            .borrow()
            .events()
            .on(
                ANGLE_CHANGE,
                callback(move |_: &f64| {
                    if let Some(state) = reader.upgrade() {
                        sink.borrow_mut().push(state.borrow().heading());
                    }
                }),
            )
            .unwrap();

        TankState::rotate_shared(&state, Rotation::Left);

        assert_eq!(*seen.borrow(), vec![357.0]);
        assert_eq!(state.borrow().degrees(), -3.0);
    }

    #[test]
    fn unknown_rotation_names_are_ignored() {
        let mut state = tank();
        state.rotate_named("up");
        state.rotate_named("LEFT");
        assert_eq!(state.degrees(), 0.0);

        state.rotate_named("left");
        assert_eq!(state.degrees(), -TANK_ANGLE_SPEED);
    }

    #[test]
    fn angle_is_offset_by_a_quarter_turn() {
        let state = tank();
        assert!((state.angle() - std::f64::consts::FRAC_PI_2).abs() < 1e-12);

        let facing = state.facing();
        assert!(facing.x.abs() < 1e-12);
        assert!((facing.y + 1.0).abs() < 1e-12);
    }

    #[test]
    fn heading_wraps_only_when_read() {
        let mut state = tank();
        state.angle = -90.0;
        assert_eq!(state.degrees(), -90.0);
        assert_eq!(state.heading(), 270.0);
        assert_eq!(state.direction(), Some(Direction::Left));

        state.angle = 450.0;
        assert_eq!(state.direction(), Some(Direction::Right));

        state.angle = 45.0;
        assert_eq!(state.direction(), None);
    }

    #[test]
    fn speed_rejects_non_numbers() {
        let mut state = tank();
        assert!(state.set_speed(f64::NAN).is_err());
        assert!(state.set_speed(f64::INFINITY).is_err());
        assert_eq!(state.speed(), TANK_SPEED);

        state.set_speed(12.5).unwrap();
        assert_eq!(state.speed(), 12.5);
    }

    #[test]
    fn enable_and_destroy_are_idempotent() {
        let mut state = tank();
        assert!(!state.is_enabled());

        state.enable();
        state.enable();
        assert!(state.is_enabled());

        state.disable();
        state.disable();
        assert!(!state.is_enabled());

        state.enable();
        state.destroy();
        state.destroy();
        assert!(state.is_destroyed());
        assert!(!state.is_enabled());
    }

    #[test]
    fn generated_identities_are_distinct() {
        let a = TankState::new(TankTuning::default());
        let b = TankState::new(TankTuning::default());
        assert!(!a.id().is_empty());
        assert_ne!(a.id(), b.id());
    }
}
