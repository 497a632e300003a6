//! A playable Tank: state and controller wired together and to the session

use std::{
    cell::{Cell, Ref, RefCell},
    rc::{Rc, Weak},
};

use tanks_events::{TankCommand, TankTelemetry, TANK_DESTROY, TANK_ENABLE, TANK_SET_POSITION};

use crate::{
    common::{
        bullet::BulletTuning,
        tank::{Rotation, TankState, TankTuning, ANGLE_CHANGE},
    },
    control::tank::{ControlEvent, TankController, LEFT_KEY_DOWN, RIGHT_KEY_DOWN},
    error::TankError,
    observer::{callback, Callback},
    runtime::Runtime,
    utils::Vector2,
};

struct TankShared {
    state: Rc<RefCell<TankState>>,
    controller: TankController,
    runtime: Runtime,
    commands: RefCell<Vec<(&'static str, Callback<TankCommand>)>>,
    destroyed: Cell<bool>,
}

/// Owns one [`TankState`] and one [`TankController`] for its whole life
#[derive(Clone)]
pub struct Tank {
    shared: Rc<TankShared>,
}

impl Tank {
    /// Create the Tank, put it on the surface and subscribe it to the session commands
    pub fn spawn(runtime: Runtime, tuning: TankTuning, bullet: BulletTuning) -> Result<Self, TankError> {
        if !tuning.position.is_finite() {
            return Err(TankError::invalid(format!(
                "incorrect spawn position {:?} in Tank::spawn",
                tuning.position
            )));
        }

        let mut state = TankState::new(tuning);
        state.set_speed(tuning.speed)?;
        let state = Rc::new(RefCell::new(state));

        let controller = TankController::new(state.clone(), runtime.clone(), bullet);

        let tank = Self {
            shared: Rc::new(TankShared {
                state,
                controller,
                runtime,
                commands: RefCell::new(Vec::new()),
                destroyed: Cell::new(false),
            }),
        };

        tank.wire_rotation()?;
        tank.subscribe_commands()?;

        tracing::debug!(tank = %tank.id(), "tank spawned");
        Ok(tank)
    }

    fn wire_rotation(&self) -> Result<(), TankError> {
        let controls = self.shared.controller.events();
        for (name, rotation) in [(LEFT_KEY_DOWN, Rotation::Left), (RIGHT_KEY_DOWN, Rotation::Right)] {
            let state = Rc::downgrade(&self.shared.state);
            controls.on(
                name,
                callback(move |_: &ControlEvent| {
                    if let Some(state) = state.upgrade() {
                        TankState::rotate_shared(&state, rotation);
                    }
                }),
            )?;
        }

        let controller = self.shared.controller.downgrade();
        let session = Rc::downgrade(&self.shared.runtime.session);
        let id = self.id();
        self.shared.state.borrow().events().on(
            ANGLE_CHANGE,
            callback(move |degrees: &f64| {
                if let Some(controller) = controller.upgrade() {
                    controller.show_rotation(*degrees);
                }
                if let Some(session) = session.upgrade() {
                    session.report(TankTelemetry::Rotate {
                        id: id.clone(),
                        angle: *degrees,
                    });
                }
            }),
        )?;

        Ok(())
    }

    fn subscribe_commands(&self) -> Result<(), TankError> {
        let handlers: [(&'static str, fn(&Tank, &TankCommand)); 3] = [
            (TANK_ENABLE, |tank, _| tank.enable()),
            (TANK_DESTROY, |tank, command| {
                if let TankCommand::Destroy { id } = command {
                    if *id == tank.id() {
                        tank.destroy();
                    }
                }
            }),
            (TANK_SET_POSITION, |tank, command| {
                if let TankCommand::SetPosition(position) = command {
                    tank.set_position(Vector2::from(*position));
                }
            }),
        ];

        let bus = self.shared.runtime.session.commands();
        let mut commands = self.shared.commands.borrow_mut();
        for (name, handler) in handlers {
            let weak: Weak<TankShared> = Rc::downgrade(&self.shared);
            let subscriber = callback(move |command: &TankCommand| {
                if let Some(shared) = weak.upgrade() {
                    handler(&Tank { shared }, command);
                }
            });
            bus.on(name, subscriber.clone())?;
            commands.push((name, subscriber));
        }

        Ok(())
    }

    pub fn id(&self) -> String {
        self.shared.state.borrow().id().to_string()
    }

    pub fn state(&self) -> Ref<'_, TankState> {
        self.shared.state.borrow()
    }

    pub fn controller(&self) -> &TankController {
        &self.shared.controller
    }

    pub fn position(&self) -> Vector2 {
        self.shared.state.borrow().position()
    }

    pub fn enable(&self) {
        if self.is_destroyed() {
            return;
        }
        self.shared.state.borrow_mut().enable();
        tracing::debug!(tank = %self.id(), "tank enabled");
    }

    pub fn disable(&self) {
        self.shared.state.borrow_mut().disable();
    }

    pub fn is_enabled(&self) -> bool {
        self.shared.state.borrow().is_enabled()
    }

    /// Move to `position`, clamped into the viewport
    pub fn set_position(&self, position: Vector2) {
        if self.is_destroyed() {
            return;
        }
        self.shared.controller.set_position(position);
    }

    pub fn is_destroyed(&self) -> bool {
        self.shared.destroyed.get()
    }

    /// Tear the Tank down: bullets, input bindings and command subscriptions
    pub fn destroy(&self) {
        if self.shared.destroyed.replace(true) {
            return;
        }

        let bus = self.shared.runtime.session.commands();
        for (name, subscriber) in self.shared.commands.borrow_mut().drain(..) {
            let _ = bus.off(name, Some(&subscriber));
        }

        self.shared.controller.destroy();
        for name in [LEFT_KEY_DOWN, RIGHT_KEY_DOWN] {
            let _ = self.shared.controller.events().off(name, None);
        }
        self.shared.state.borrow_mut().destroy();

        tracing::debug!(tank = %self.id(), "tank destroyed");
    }
}

impl std::fmt::Debug for Tank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tank")
            .field("state", &self.shared.state)
            .field("destroyed", &self.shared.destroyed.get())
            .finish()
    }
}
