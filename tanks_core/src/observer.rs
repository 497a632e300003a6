//! Named-event publish/subscribe used by every component for decoupled notification

use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
    panic::{self, AssertUnwindSafe},
    rc::Rc,
};

use crate::error::TankError;

/// Handle to a subscribed function, compared by identity when unsubscribing
pub type Callback<T> = Rc<dyn Fn(&T)>;

/// Wrap a closure into a [`Callback`]
pub fn callback<T>(f: impl Fn(&T) + 'static) -> Callback<T> {
    Rc::new(f)
}

struct Subscriber<T> {
    key: u64,
    callback: Callback<T>,
}

/// Event bus keyed by event name
///
/// Every method takes `&self`, so subscribers are free to subscribe, unsubscribe
/// or publish again while they are being dispatched to. A publish works on a
/// snapshot of the subscriber list: callbacks added during dispatch wait for the
/// next round, callbacks removed during dispatch are skipped if they have not run yet.
pub struct EventBus<T> {
    subscribers: RefCell<HashMap<String, Vec<Subscriber<T>>>>,
    next_key: Cell<u64>,
}

impl<T> Default for EventBus<T> {
    fn default() -> Self {
        Self {
            subscribers: RefCell::new(HashMap::new()),
            next_key: Cell::new(0),
        }
    }
}

impl<T> std::fmt::Debug for EventBus<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let subscribers = self.subscribers.borrow();
        let mut counts: Vec<(&String, usize)> =
            subscribers.iter().map(|(name, list)| (name, list.len())).collect();
        counts.sort();
        f.debug_struct("EventBus").field("subscribers", &counts).finish()
    }
}

fn event_name<'a>(name: &'a str, operation: &str) -> Result<&'a str, TankError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(TankError::invalid(format!(
            "incorrect event name in EventBus::{}",
            operation
        )));
    }
    Ok(name)
}

impl<T> EventBus<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe `callback` to `name`, keeping insertion order for dispatch
    pub fn on(&self, name: &str, callback: Callback<T>) -> Result<&Self, TankError> {
        let name = event_name(name, "on")?;

        let key = self.next_key.get();
        self.next_key.set(key + 1);

        self.subscribers
            .borrow_mut()
            .entry(name.to_string())
            .or_default()
            .push(Subscriber { key, callback });

        Ok(self)
    }

    /// Unsubscribe the first registration of `callback` from `name`,
    /// or every subscriber of `name` when no callback is given
    pub fn off(&self, name: &str, callback: Option<&Callback<T>>) -> Result<&Self, TankError> {
        let name = event_name(name, "off")?;
        let mut subscribers = self.subscribers.borrow_mut();

        match callback {
            None => {
                subscribers.remove(name);
            }
            Some(callback) => {
                if let Some(list) = subscribers.get_mut(name) {
                    if let Some(index) = list
                        .iter()
                        .position(|subscriber| Rc::ptr_eq(&subscriber.callback, callback))
                    {
                        list.remove(index);
                    }
                }
            }
        }

        Ok(self)
    }

    /// Synchronously call every subscriber of `name` in subscription order
    ///
    /// Returns how many subscribers were invoked. A subscriber that panics is
    /// logged and does not stop the ones after it.
    pub fn publish(&self, name: &str, args: &T) -> Result<usize, TankError> {
        let name = event_name(name, "publish")?;

        let snapshot: Vec<(u64, Callback<T>)> = match self.subscribers.borrow().get(name) {
            Some(list) => list
                .iter()
                .map(|subscriber| (subscriber.key, subscriber.callback.clone()))
                .collect(),
            None => return Ok(0),
        };

        let mut invoked = 0;
        for (key, callback) in snapshot {
            if !self.is_subscribed(name, key) {
                continue;
            }

            invoked += 1;
            if panic::catch_unwind(AssertUnwindSafe(|| callback(args))).is_err() {
                tracing::error!(event = name, "subscriber panicked during dispatch");
            }
        }

        Ok(invoked)
    }

    /// Number of live subscribers for `name`
    pub fn subscriber_count(&self, name: &str) -> usize {
        self.subscribers
            .borrow()
            .get(name.trim())
            .map_or(0, |list| list.len())
    }

    fn is_subscribed(&self, name: &str, key: u64) -> bool {
        self.subscribers
            .borrow()
            .get(name)
            .map_or(false, |list| list.iter().any(|subscriber| subscriber.key == key))
    }
}
