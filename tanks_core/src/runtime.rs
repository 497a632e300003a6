//! Environment services shared by every entity of a session

use std::{cell::RefCell, rc::Rc};

use nanorand::WyRand;

use crate::{
    input::Keyboard,
    network::NetworkLink,
    schedule::{ManualScheduler, Scheduler},
    session::Session,
    surface::{HeadlessSurface, Surface},
    utils::Size,
};

/// Handles to the clock, the drawing surface, input and the session buses
#[derive(Clone)]
pub struct Runtime {
    pub scheduler: Rc<dyn Scheduler>,
    pub surface: Rc<dyn Surface>,
    pub keyboard: Rc<Keyboard>,
    pub session: Rc<Session>,
    pub network: Rc<NetworkLink>,
    pub rng: Rc<RefCell<WyRand>>,
}

impl Runtime {
    pub fn new(
        scheduler: Rc<dyn Scheduler>,
        surface: Rc<dyn Surface>,
        network: Rc<NetworkLink>,
        rng: WyRand,
    ) -> Self {
        Self {
            scheduler,
            surface,
            keyboard: Rc::new(Keyboard::new()),
            session: Rc::new(Session::new()),
            network,
            rng: Rc::new(RefCell::new(rng)),
        }
    }
}

/// A [`Runtime`] over a [`ManualScheduler`] and a [`HeadlessSurface`], keeping the
/// concrete handles around so the caller can drive the clock and inspect the scene
pub struct Headless {
    pub scheduler: Rc<ManualScheduler>,
    pub surface: Rc<HeadlessSurface>,
    pub runtime: Runtime,
}

impl Headless {
    pub fn new(viewport: Size) -> Self {
        Self::build(viewport, WyRand::new(), Rc::new(NetworkLink::disabled()))
    }

    /// Same as [`Headless::new`] with a reproducible random sequence
    pub fn seeded(viewport: Size, seed: u64) -> Self {
        Self::build(
            viewport,
            WyRand::new_seed(seed),
            Rc::new(NetworkLink::disabled()),
        )
    }

    pub fn build(viewport: Size, rng: WyRand, network: Rc<NetworkLink>) -> Self {
        let scheduler = Rc::new(ManualScheduler::new());
        let surface = Rc::new(HeadlessSurface::with_clock(viewport, scheduler.clone()));
        let runtime = Runtime::new(scheduler.clone(), surface.clone(), network, rng);

        Self {
            scheduler,
            surface,
            runtime,
        }
    }
}
