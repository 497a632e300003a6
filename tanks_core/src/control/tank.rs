//! Input handling and the per-frame update loop of a Tank

use std::{
    cell::RefCell,
    collections::BTreeSet,
    rc::{Rc, Weak},
    time::Duration,
};

use tanks_events::TankTelemetry;

use crate::{
    common::{
        bullet::{BulletState, BulletTuning},
        constants::{SHOOTING_FLAG_DURATION, SHOT_COOLDOWN},
        tank::{MoveDirection, TankState},
    },
    input::{Key, KEY_DOWN, KEY_UP},
    observer::{callback, Callback, EventBus},
    runtime::Runtime,
    schedule::Liveness,
    surface::{ElementId, ElementKind, Mark},
    utils::Vector2,
};

use super::bullet::{BulletController, FiringSnapshot, EXPLODE};

pub const LEFT_KEY_DOWN: &str = "leftKeyDown";
pub const RIGHT_KEY_DOWN: &str = "rightKeyDown";
pub const TOP_KEY_DOWN: &str = "topKeyDown";
pub const BOTTOM_KEY_DOWN: &str = "bottomKeyDown";
/// Published with the element of every Bullet fired
pub const SHOT: &str = "shot";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEvent {
    KeyDown(Key),
    Shot(ElementId),
}

#[derive(Debug, Default)]
struct ControllerInner {
    held: BTreeSet<Key>,
    last_shot: Option<Duration>,
    moving: bool,
    moved_once: bool,
    shot_once: bool,
}

struct ControllerShared {
    state: Rc<RefCell<TankState>>,
    runtime: Runtime,
    bullet: BulletState,
    element: ElementId,
    bus: EventBus<ControlEvent>,
    inner: RefCell<ControllerInner>,
    bullets: Rc<RefCell<Vec<BulletController>>>,
    bindings: RefCell<Vec<(&'static str, Callback<u32>)>>,
    alive: Liveness,
}

/// Binds keyboard input to a [`TankState`] and runs its update loop
///
/// Rotation is not applied here: the controller only publishes
/// [`LEFT_KEY_DOWN`] / [`RIGHT_KEY_DOWN`] and leaves it to the owner to turn the state.
#[derive(Clone)]
pub struct TankController {
    shared: Rc<ControllerShared>,
}

impl TankController {
    /// Place the Tank on the surface, bind the keyboard and start ticking
    pub fn new(state: Rc<RefCell<TankState>>, runtime: Runtime, bullet: BulletTuning) -> Self {
        let (position, size, degrees) = {
            let state = state.borrow();
            (state.position(), state.size(), state.degrees())
        };

        let element = runtime
            .surface
            .place(ElementKind::Tank, position, size, None);
        runtime.surface.set_rotation(element, degrees);

        let controller = Self {
            shared: Rc::new(ControllerShared {
                state,
                runtime,
                bullet: BulletState::new(bullet),
                element,
                bus: EventBus::new(),
                inner: RefCell::new(ControllerInner::default()),
                bullets: Rc::new(RefCell::new(Vec::new())),
                bindings: RefCell::new(Vec::new()),
                alive: Liveness::new(),
            }),
        };

        controller.bind_input();
        controller.schedule_tick();
        controller
    }

    fn from_weak(weak: &Weak<ControllerShared>) -> Option<Self> {
        weak.upgrade().map(|shared| Self { shared })
    }

    /// Handle for callbacks stored inside the state, which the controller owns
    pub fn downgrade(&self) -> WeakTankController {
        WeakTankController(Rc::downgrade(&self.shared))
    }

    fn bind_input(&self) {
        let weak = Rc::downgrade(&self.shared);
        let on_down = callback(move |code: &u32| {
            if let Some(controller) = Self::from_weak(&weak) {
                controller.key_down(*code);
            }
        });

        let weak = Rc::downgrade(&self.shared);
        let on_up = callback(move |code: &u32| {
            if let Some(controller) = Self::from_weak(&weak) {
                controller.key_up(*code);
            }
        });

        let keyboard = self.shared.runtime.keyboard.events();
        let mut bindings = self.shared.bindings.borrow_mut();
        for (name, handler) in [(KEY_DOWN, on_down), (KEY_UP, on_up)] {
            if keyboard.on(name, handler.clone()).is_ok() {
                bindings.push((name, handler));
            }
        }
    }

    fn unbind_input(&self) {
        let keyboard = self.shared.runtime.keyboard.events();
        for (name, handler) in self.shared.bindings.borrow_mut().drain(..) {
            let _ = keyboard.off(name, Some(&handler));
        }
    }

    /// Mark a key as held, ignored while the Tank is disabled
    pub fn key_down(&self, code: u32) {
        let Some(key) = Key::from_code(code) else {
            return;
        };
        if !self.shared.alive.is_alive() || !self.shared.state.borrow().is_enabled() {
            return;
        }

        self.shared.inner.borrow_mut().held.insert(key);
    }

    /// Release a held key, ignored while the Tank is disabled
    pub fn key_up(&self, code: u32) {
        let Some(key) = Key::from_code(code) else {
            return;
        };
        if !self.shared.alive.is_alive() || !self.shared.state.borrow().is_enabled() {
            return;
        }

        self.shared.inner.borrow_mut().held.remove(&key);
    }

    pub fn held_keys(&self) -> Vec<Key> {
        self.shared.inner.borrow().held.iter().copied().collect()
    }

    fn schedule_tick(&self) {
        let weak = Rc::downgrade(&self.shared);
        self.shared.runtime.scheduler.request_frame(Box::new(move || {
            if let Some(controller) = Self::from_weak(&weak) {
                if controller.is_alive() {
                    controller.tick();
                    controller.schedule_tick();
                }
            }
        }));
    }

    /// One pass of the update loop: act on every held key in key code order
    pub fn tick(&self) {
        if !self.is_alive() {
            return;
        }

        let keys = match self.shared.state.borrow().is_enabled() {
            true => self.held_keys(),
            false => Vec::new(),
        };

        self.set_moving(!keys.is_empty());
        for key in keys {
            self.dispatch(key);
        }
    }

    fn dispatch(&self, key: Key) {
        match key {
            Key::Left => self.publish(LEFT_KEY_DOWN, ControlEvent::KeyDown(key)),
            Key::Right => self.publish(RIGHT_KEY_DOWN, ControlEvent::KeyDown(key)),
            Key::Forward => {
                self.move_tank(MoveDirection::Forward);
                self.publish(TOP_KEY_DOWN, ControlEvent::KeyDown(key));
            }
            Key::Back => {
                self.move_tank(MoveDirection::Back);
                self.publish(BOTTOM_KEY_DOWN, ControlEvent::KeyDown(key));
            }
            Key::Fire => {
                self.fire();
                // holding fire does not repeat, the key has to be pressed again
                self.shared.inner.borrow_mut().held.remove(&Key::Fire);
            }
        }
    }

    fn publish(&self, name: &str, event: ControlEvent) {
        let _ = self.shared.bus.publish(name, &event);
    }

    fn set_moving(&self, moving: bool) {
        let changed = {
            let mut inner = self.shared.inner.borrow_mut();
            let changed = inner.moving != moving;
            inner.moving = moving;
            changed
        };

        if changed {
            self.shared
                .runtime
                .surface
                .set_mark(self.shared.element, Mark::Moving, moving);
        }
    }

    /// Translate along the current angle, refusing to leave the viewport
    ///
    /// Returns whether the Tank moved.
    pub fn move_tank(&self, direction: MoveDirection) -> bool {
        let (next, id) = {
            let state = self.shared.state.borrow();
            let offset = Vector2::from_angle(state.angle()).scale(direction.sign() * state.speed());
            (state.position().plus(&offset), state.id().to_string())
        };

        let viewport = self.shared.runtime.surface.viewport();
        if !viewport.contains(&next) {
            tracing::trace!(tank = %id, x = next.x, y = next.y, "move rejected at the viewport edge");
            return false;
        }

        self.apply_position(next);

        let first = !std::mem::replace(&mut self.shared.inner.borrow_mut().moved_once, true);
        let session = &self.shared.runtime.session;
        if first {
            session.report(TankTelemetry::FirstMove { id: id.clone() });
        }
        session.report(TankTelemetry::Move {
            id: id.clone(),
            position: next.into(),
        });
        self.shared.runtime.network.send_move(&id, next);

        true
    }

    /// Put the Tank at `position`, clamped into the viewport
    pub fn set_position(&self, position: Vector2) {
        if !position.is_finite() {
            tracing::warn!(?position, "ignoring non-finite position");
            return;
        }

        let clamped = self.shared.runtime.surface.viewport().clamp(&position);
        self.apply_position(clamped);
    }

    fn apply_position(&self, position: Vector2) {
        self.shared.state.borrow_mut().place(position);
        self.shared
            .runtime
            .surface
            .set_position(self.shared.element, position);
    }

    /// Point bullets are fired from, nudged one unit along the facing
    pub fn center(&self) -> Vector2 {
        center_of(&self.shared.state.borrow())
    }

    /// Reflect a new angle (in degrees) on the surface
    pub fn show_rotation(&self, degrees: f64) {
        self.shared
            .runtime
            .surface
            .set_rotation(self.shared.element, degrees);
    }

    /// Spawn a Bullet unless the Tank is disabled or the previous shot is too recent
    pub fn fire(&self) -> Option<ElementId> {
        if !self.is_alive() || !self.shared.state.borrow().is_enabled() {
            return None;
        }

        let now = self.shared.runtime.scheduler.now();
        if let Some(last) = self.shared.inner.borrow().last_shot {
            if now.saturating_sub(last) < SHOT_COOLDOWN {
                return None;
            }
        }

        let (snapshot, id) = {
            let state = self.shared.state.borrow();
            let snapshot = FiringSnapshot {
                angle: state.angle(),
                origin: center_of(&state),
                tank_size: state.size(),
            };
            (snapshot, state.id().to_string())
        };

        let bullet = BulletController::spawn(
            self.shared.bullet.clone(),
            snapshot,
            self.shared.runtime.surface.clone(),
            self.shared.runtime.scheduler.clone(),
            self.shared.alive.clone(),
        );
        let element = bullet.element();

        // the owner drops the Bullet as soon as it reports its explosion
        let bullets = Rc::downgrade(&self.shared.bullets);
        let _ = bullet.events().on(
            EXPLODE,
            callback(move |_: &Vector2| {
                if let Some(bullets) = bullets.upgrade() {
                    bullets.borrow_mut().retain(|b| b.element() != element);
                }
            }),
        );
        self.shared.bullets.borrow_mut().push(bullet.clone());
        bullet.travel(snapshot.angle, &mut self.shared.runtime.rng.borrow_mut());

        self.show_shooting();

        let first = {
            let mut inner = self.shared.inner.borrow_mut();
            inner.last_shot = Some(now);
            !std::mem::replace(&mut inner.shot_once, true)
        };
        if first {
            self.shared
                .runtime
                .session
                .report(TankTelemetry::FirstShot { id: id.clone() });
        }

        tracing::debug!(tank = %id, ?element, "shot fired");
        self.publish(SHOT, ControlEvent::Shot(element));
        Some(element)
    }

    fn show_shooting(&self) {
        let surface = self.shared.runtime.surface.clone();
        let element = self.shared.element;
        surface.set_mark(element, Mark::Shooting, true);

        let alive = self.shared.alive.clone();
        self.shared.runtime.scheduler.defer(
            SHOOTING_FLAG_DURATION,
            Box::new(move || {
                if alive.is_alive() {
                    surface.set_mark(element, Mark::Shooting, false);
                }
            }),
        );
    }

    /// Bullets fired by this Tank that have not exploded yet
    pub fn bullets(&self) -> Vec<BulletController> {
        self.shared.bullets.borrow().clone()
    }

    pub fn element(&self) -> ElementId {
        self.shared.element
    }

    pub fn is_alive(&self) -> bool {
        self.shared.alive.is_alive()
    }

    pub fn events(&self) -> &EventBus<ControlEvent> {
        &self.shared.bus
    }

    /// Stop ticking, unbind input and release every outstanding Bullet
    pub fn destroy(&self) {
        if !self.is_alive() {
            return;
        }

        self.shared.alive.kill();
        self.unbind_input();
        self.shared.inner.borrow_mut().held.clear();

        let bullets: Vec<BulletController> = self.shared.bullets.borrow_mut().drain(..).collect();
        for bullet in bullets {
            bullet.destroy();
        }

        self.shared.runtime.surface.remove(self.shared.element);
    }
}

fn center_of(state: &TankState) -> Vector2 {
    state
        .position()
        .plus(&state.size().half())
        .plus(&state.facing())
}

/// Non-owning [`TankController`] handle
#[derive(Clone)]
pub struct WeakTankController(Weak<ControllerShared>);

impl WeakTankController {
    pub fn upgrade(&self) -> Option<TankController> {
        TankController::from_weak(&self.0)
    }
}
