//! Session-wide buses shared by every Tank

use tanks_events::{TankCommand, TankTelemetry};

use crate::observer::EventBus;

/// Global command and telemetry buses of one game session
///
/// Commands are typed but still routed by name, so a Tank only subscribes to the
/// command kinds it reacts to.
#[derive(Debug, Default)]
pub struct Session {
    commands: EventBus<TankCommand>,
    telemetry: EventBus<TankTelemetry>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a command to every tank of the session, returns how many handlers ran
    pub fn command(&self, command: TankCommand) -> usize {
        self.commands
            .publish(command.event_name(), &command)
            .unwrap_or_default()
    }

    pub fn report(&self, event: TankTelemetry) {
        let _ = self.telemetry.publish(event.event_name(), &event);
    }

    pub fn commands(&self) -> &EventBus<TankCommand> {
        &self.commands
    }

    pub fn telemetry(&self) -> &EventBus<TankTelemetry> {
        &self.telemetry
    }
}
