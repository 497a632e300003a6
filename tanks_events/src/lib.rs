//! This file contains the event contract a running tank shares with the rest of the world:
//! commands other systems publish to control a tank, telemetry a tank reports back,
//! and the messages relayed to a network peer.

use serde::{Deserialize, Serialize};

pub const TANK_ENABLE: &str = "tank.enable";
pub const TANK_DESTROY: &str = "tank.destroy";
pub const TANK_SET_POSITION: &str = "tank.setPosition";

pub const TANK_MOVE: &str = "tank.move";
pub const TANK_FIRST_MOVE: &str = "tank.firstMove";
pub const TANK_ROTATE: &str = "tank.rotate";
pub const TANK_FIRST_SHOT: &str = "tank.firstShot";

/// Screen point in the viewport, `left` grows to the right and `top` grows downwards
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub left: f64,
    pub top: f64,
}

impl Position {
    pub fn new(left: f64, top: f64) -> Self {
        Self { left, top }
    }
}

/// Commands published on the session bus to control a live tank without a direct reference
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum TankCommand {
    /// Start honoring input
    Enable,
    /// Tear down the tank carrying this identity
    Destroy { id: String },
    /// Place the tank at a point of the viewport
    SetPosition(Position),
}

impl TankCommand {
    /// The name this command is published under
    pub fn event_name(&self) -> &'static str {
        match self {
            TankCommand::Enable => TANK_ENABLE,
            TankCommand::Destroy { .. } => TANK_DESTROY,
            TankCommand::SetPosition(_) => TANK_SET_POSITION,
        }
    }
}

/// Telemetry a tank reports for UI hooks
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum TankTelemetry {
    Move { id: String, position: Position },
    FirstMove { id: String },
    Rotate { id: String, angle: f64 },
    FirstShot { id: String },
}

impl TankTelemetry {
    pub fn event_name(&self) -> &'static str {
        match self {
            TankTelemetry::Move { .. } => TANK_MOVE,
            TankTelemetry::FirstMove { .. } => TANK_FIRST_MOVE,
            TankTelemetry::Rotate { .. } => TANK_ROTATE,
            TankTelemetry::FirstShot { .. } => TANK_FIRST_SHOT,
        }
    }

    /// Identity of the tank that produced the event
    pub fn tank_id(&self) -> &str {
        match self {
            TankTelemetry::Move { id, .. }
            | TankTelemetry::FirstMove { id }
            | TankTelemetry::Rotate { id, .. }
            | TankTelemetry::FirstShot { id } => id,
        }
    }
}

/// Messages exchanged with a network peer
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum NetMessage {
    /// Outbound position of a tank after a move
    Move { id: String, position: Position },
    /// Inbound identity assigned by the peer
    Init { id: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_resolve_to_their_event_names() {
        assert_eq!(TankCommand::Enable.event_name(), "tank.enable");
        assert_eq!(
            TankCommand::Destroy { id: "abc".into() }.event_name(),
            "tank.destroy"
        );
        assert_eq!(
            TankCommand::SetPosition(Position::new(1.0, 2.0)).event_name(),
            "tank.setPosition"
        );
    }

    #[test]
    fn set_position_reads_left_and_top() {
        let command: TankCommand =
            serde_json::from_str(r#"{"type":"setPosition","data":{"left":10.0,"top":20.5}}"#)
                .unwrap();
        assert_eq!(command, TankCommand::SetPosition(Position::new(10.0, 20.5)));
    }

    #[test]
    fn move_message_is_tagged() {
        let message = NetMessage::Move {
            id: "t1".into(),
            position: Position::new(3.0, 4.0),
        };
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["type"], "move");
        assert_eq!(json["data"]["position"]["left"], 3.0);
    }

    #[test]
    fn telemetry_carries_its_tank() {
        let event = TankTelemetry::Rotate {
            id: "t9".into(),
            angle: 90.0,
        };
        assert_eq!(event.tank_id(), "t9");
        assert_eq!(event.event_name(), TANK_ROTATE);
    }
}
