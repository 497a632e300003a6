//! Keyboard input as seen by the simulation

use crate::observer::EventBus;

pub const KEY_DOWN: &str = "keydown";
pub const KEY_UP: &str = "keyup";

/// The keys a Tank responds to, ordered by key code
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Key {
    Fire = 32,
    Left = 37,
    Forward = 38,
    Right = 39,
    Back = 40,
}

impl Key {
    /// Map a key code, anything unmapped is `None`
    pub fn from_code(code: u32) -> Option<Key> {
        match code {
            32 => Some(Key::Fire),
            37 => Some(Key::Left),
            38 => Some(Key::Forward),
            39 => Some(Key::Right),
            40 => Some(Key::Back),
            _ => None,
        }
    }

    pub fn code(self) -> u32 {
        self as u32
    }
}

/// Source of raw key-down / key-up signals carrying key codes
#[derive(Debug, Default)]
pub struct Keyboard {
    bus: EventBus<u32>,
}

impl Keyboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&self, code: u32) {
        // names are constant, publishing cannot fail
        let _ = self.bus.publish(KEY_DOWN, &code);
    }

    pub fn release(&self, code: u32) {
        let _ = self.bus.publish(KEY_UP, &code);
    }

    /// Bus the key signals are published on, subscribe to [`KEY_DOWN`] and [`KEY_UP`]
    pub fn events(&self) -> &EventBus<u32> {
        &self.bus
    }
}
