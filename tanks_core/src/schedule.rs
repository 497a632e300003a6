//! Time source and deferred one-shot callbacks
//!
//! The simulation never sleeps or reads the wall clock itself: ticks, cooldowns and
//! bullet flights are all expressed as tasks handed to a [`Scheduler`]. The host decides
//! how virtual time advances.

use std::{
    cell::{Cell, RefCell},
    collections::BTreeMap,
    fmt,
    rc::Rc,
    time::Duration,
};

use crate::common::constants::FRAME_FALLBACK;

/// A deferred one-shot callback
pub type Task = Box<dyn FnOnce()>;

pub trait Scheduler {
    /// Time elapsed since the scheduler started
    fn now(&self) -> Duration;

    /// Run `task` once, `delay` from now. Scheduled tasks cannot be retracted.
    fn defer(&self, delay: Duration, task: Task);

    /// Run `task` on the next display frame
    ///
    /// Hosts without a frame source fall back to a ~60 Hz timer.
    fn request_frame(&self, task: Task) {
        self.defer(FRAME_FALLBACK, task);
    }
}

/// Flag shared between an owner and the callbacks it defers
///
/// Deferred work checks the flag before touching anything, so callbacks that fire
/// after their owner was destroyed turn into no-ops.
#[derive(Clone)]
pub struct Liveness(Rc<Cell<bool>>);

impl Liveness {
    pub fn new() -> Self {
        Self(Rc::new(Cell::new(true)))
    }

    pub fn is_alive(&self) -> bool {
        self.0.get()
    }

    pub fn kill(&self) {
        self.0.set(false);
    }
}

impl Default for Liveness {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Liveness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Liveness").field(&self.is_alive()).finish()
    }
}

/// Scheduler over a virtual clock that only moves when told to
///
/// Tasks run in due order; tasks due at the same instant run in the order they were
/// scheduled. Tasks scheduled while advancing run in the same advance if they fall due
/// before its end.
#[derive(Default)]
pub struct ManualScheduler {
    now: Cell<Duration>,
    sequence: Cell<u64>,
    queue: RefCell<BTreeMap<(Duration, u64), Task>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock forward by `delta`, running every task that falls due
    pub fn advance(&self, delta: Duration) -> usize {
        self.advance_to(self.now.get() + delta)
    }

    /// Move the clock to `target`, running every task that falls due. The clock never
    /// moves backwards.
    pub fn advance_to(&self, target: Duration) -> usize {
        let mut ran = 0;

        loop {
            // release the queue before running so tasks can schedule more work
            let next = {
                let mut queue = self.queue.borrow_mut();
                match queue.first_key_value() {
                    Some((&(due, _), _)) if due <= target => queue.pop_first(),
                    _ => None,
                }
            };

            let Some(((due, _), task)) = next else {
                break;
            };

            if due > self.now.get() {
                self.now.set(due);
            }
            task();
            ran += 1;
        }

        if target > self.now.get() {
            self.now.set(target);
        }

        ran
    }

    /// Number of tasks waiting to run
    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }
}

impl Scheduler for ManualScheduler {
    fn now(&self) -> Duration {
        self.now.get()
    }

    fn defer(&self, delay: Duration, task: Task) {
        let sequence = self.sequence.get();
        self.sequence.set(sequence + 1);
        self.queue
            .borrow_mut()
            .insert((self.now.get() + delay, sequence), task);
    }
}
