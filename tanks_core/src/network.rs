//! Optional relay of tank events to a remote peer

use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

use tanks_events::NetMessage;

use crate::{observer::EventBus, utils::Vector2};

/// Published on [`NetworkLink::events`] with the peer-assigned identity
pub const NET_INIT: &str = "init";

/// Whatever carries messages to the peer
pub trait Transport {
    fn send(&self, message: &NetMessage);
}

/// Togglable link to a network peer, every operation is a no-op while disabled
#[derive(Default)]
pub struct NetworkLink {
    enabled: Cell<bool>,
    transport: Option<Rc<dyn Transport>>,
    peer_id: RefCell<Option<String>>,
    bus: EventBus<String>,
}

impl NetworkLink {
    /// A link with no peer behind it
    pub fn disabled() -> Self {
        Self::default()
    }

    /// A link over `transport`, disabled until [`NetworkLink::enable`] is called
    pub fn new(transport: Rc<dyn Transport>) -> Self {
        Self {
            transport: Some(transport),
            ..Self::default()
        }
    }

    pub fn enable(&self) {
        self.enabled.set(true);
    }

    pub fn disable(&self) {
        self.enabled.set(false);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.get()
    }

    /// Relay the new position of tank `id`
    pub fn send_move(&self, id: &str, position: Vector2) {
        if !self.is_enabled() {
            return;
        }

        if let Some(transport) = &self.transport {
            transport.send(&NetMessage::Move {
                id: id.to_string(),
                position: position.into(),
            });
        }
    }

    /// Accept a message coming from the peer
    pub fn receive(&self, message: NetMessage) {
        if !self.is_enabled() {
            return;
        }

        match message {
            NetMessage::Init { id } => {
                tracing::debug!(peer_id = %id, "network peer assigned identity");
                *self.peer_id.borrow_mut() = Some(id.clone());
                let _ = self.bus.publish(NET_INIT, &id);
            }
            NetMessage::Move { id, .. } => {
                tracing::trace!(tank = %id, "ignoring remote move");
            }
        }
    }

    /// Identity handed out by the peer, once it sent its init data
    pub fn peer_id(&self) -> Option<String> {
        self.peer_id.borrow().clone()
    }

    pub fn events(&self) -> &EventBus<String> {
        &self.bus
    }
}

impl std::fmt::Debug for NetworkLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkLink")
            .field("enabled", &self.enabled.get())
            .field("has_transport", &self.transport.is_some())
            .field("peer_id", &self.peer_id.borrow())
            .finish()
    }
}
