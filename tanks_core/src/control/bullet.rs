//! Flight and impact of a single Bullet

use std::{cell::RefCell, f64::consts::PI, rc::Rc, time::Duration};

use nanorand::WyRand;

use crate::{
    common::{
        bullet::BulletState,
        constants::{BULLET_EXPLODE_TIME, HOLE_FADE_DURATION, HOLE_LIFETIME, IMPACT_FADE_DURATION},
    },
    observer::EventBus,
    schedule::{Liveness, Scheduler},
    surface::{ElementId, ElementKind, Hit, Mark, Surface},
    utils::{Size, Vector2},
};

/// Published with the final position once the Bullet reaches its target
pub const EXPLODE: &str = "explode";

/// Angle and spawn origin of the firing Tank, frozen at the moment of the shot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FiringSnapshot {
    /// Radians, as returned by [`crate::common::tank::TankState::angle`]
    pub angle: f64,
    /// Center of the Tank nudged towards its front
    pub origin: Vector2,
    pub tank_size: Size,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulletPhase {
    Traveling,
    Exploding,
    /// Explosion is over, only the hole is left
    Hole,
    Destroyed,
}

#[derive(Debug)]
struct BulletInner {
    position: Vector2,
    target: Vector2,
    phase: BulletPhase,
}

struct BulletShared {
    state: BulletState,
    snapshot: FiringSnapshot,
    element: ElementId,
    bus: EventBus<Vector2>,
    inner: RefCell<BulletInner>,
    surface: Rc<dyn Surface>,
    scheduler: Rc<dyn Scheduler>,
    alive: Liveness,
    /// Liveness of the Tank that fired the Bullet
    owner: Liveness,
}

/// Handle driving one Bullet from the muzzle to its hole
///
/// The Bullet keeps no reference to the Tank that fired it, only the snapshot
/// taken when it was spawned.
#[derive(Clone)]
pub struct BulletController {
    shared: Rc<BulletShared>,
}

impl BulletController {
    /// Place a Bullet just ahead of the front edge of the firing Tank
    pub fn spawn(
        state: BulletState,
        snapshot: FiringSnapshot,
        surface: Rc<dyn Surface>,
        scheduler: Rc<dyn Scheduler>,
        owner: Liveness,
    ) -> Self {
        let facing = Vector2::from_angle(snapshot.angle + PI);
        let start = snapshot
            .origin
            .plus(&facing.scale(snapshot.tank_size.height / 2.0))
            .minus(&state.size().half());

        let element = surface.place(ElementKind::Bullet, start, state.size(), None);
        tracing::trace!(?element, x = start.x, y = start.y, "bullet spawned");

        Self {
            shared: Rc::new(BulletShared {
                state,
                snapshot,
                element,
                bus: EventBus::new(),
                inner: RefCell::new(BulletInner {
                    position: start,
                    target: start,
                    phase: BulletPhase::Traveling,
                }),
                surface,
                scheduler,
                alive: Liveness::new(),
                owner,
            }),
        }
    }

    /// Send the Bullet along `angle` over a freshly drawn range and deviation,
    /// it explodes once the flight time is over
    pub fn travel(&self, angle: f64, rng: &mut WyRand) {
        let shared = &self.shared;
        if !shared.alive.is_alive() {
            return;
        }

        let length = shared.state.travel_length(rng);
        let spread = shared.state.spread(rng);

        let (start, target) = {
            let mut inner = shared.inner.borrow_mut();
            let target = inner
                .position
                .plus(&Vector2::from_angle(angle + PI).scale(length))
                .plus(&spread);
            inner.target = target;
            inner.phase = BulletPhase::Traveling;
            (inner.position, target)
        };

        let flight = flight_time(start.distance(&target), shared.state.speed());
        shared.surface.animate_to(shared.element, target, flight);

        let weak = Rc::downgrade(shared);
        shared.scheduler.defer(
            flight,
            Box::new(move || {
                if let Some(shared) = weak.upgrade() {
                    BulletController { shared }.explode();
                }
            }),
        );
    }

    /// Land on the target, damage whatever lies under it and report completion
    pub fn explode(&self) {
        let shared = &self.shared;
        if !shared.alive.is_alive() {
            return;
        }

        let target = {
            let mut inner = shared.inner.borrow_mut();
            if inner.phase != BulletPhase::Traveling {
                return;
            }
            inner.phase = BulletPhase::Exploding;
            inner.position = inner.target;
            inner.target
        };

        tracing::debug!(element = ?shared.element, x = target.x, y = target.y, "bullet exploded");
        shared
            .surface
            .set_mark(shared.element, Mark::Exploding, true);
        self.resolve_impact(target);

        let hole = self.shared.clone();
        shared.scheduler.defer(
            BULLET_EXPLODE_TIME,
            Box::new(move || BulletController { shared: hole }.leave_hole()),
        );

        let _ = shared.bus.publish(EXPLODE, &target);
    }

    /// Turn the explosion into a hole that fades away after [`HOLE_LIFETIME`]. A
    /// Bullet whose Tank is gone leaves no hole at all.
    fn leave_hole(self) {
        let shared = &self.shared;
        if !shared.alive.is_alive() {
            return;
        }
        if !shared.owner.is_alive() {
            self.destroy();
            return;
        }

        shared.inner.borrow_mut().phase = BulletPhase::Hole;
        shared.surface.set_mark(shared.element, Mark::Hole, true);

        let expiring = shared.clone();
        shared.scheduler.defer(
            HOLE_LIFETIME,
            Box::new(move || {
                let shared = expiring;
                if !shared.alive.is_alive() {
                    return;
                }
                shared.surface.fade_out(shared.element, HOLE_FADE_DURATION);

                let faded = shared.clone();
                shared.scheduler.defer(
                    HOLE_FADE_DURATION,
                    Box::new(move || BulletController { shared: faded }.destroy()),
                );
            }),
        );
    }

    /// Point test at the resting coordinate, nothing along the path is considered
    fn resolve_impact(&self, point: Vector2) {
        let shared = &self.shared;
        if let Hit::Scene = shared.surface.topmost_at(point, Some(shared.element)) {
            return;
        }

        if let Some(hit) = shared.surface.deepest_at(point, Some(shared.element)) {
            tracing::debug!(?hit, "bullet hit an element");
            shared.surface.fade_out(hit, IMPACT_FADE_DURATION);
        }
    }

    /// Remove the Bullet right away, pending timers turn into no-ops
    pub fn destroy(&self) {
        let shared = &self.shared;
        if !shared.alive.is_alive() {
            return;
        }

        shared.alive.kill();
        shared.inner.borrow_mut().phase = BulletPhase::Destroyed;
        shared.surface.remove(shared.element);
        let _ = shared.bus.off(EXPLODE, None);
    }

    pub fn element(&self) -> ElementId {
        self.shared.element
    }

    pub fn phase(&self) -> BulletPhase {
        self.shared.inner.borrow().phase
    }

    pub fn position(&self) -> Vector2 {
        self.shared.inner.borrow().position
    }

    pub fn target(&self) -> Vector2 {
        self.shared.inner.borrow().target
    }

    pub fn snapshot(&self) -> FiringSnapshot {
        self.shared.snapshot
    }

    pub fn events(&self) -> &EventBus<Vector2> {
        &self.shared.bus
    }
}

impl std::fmt::Debug for BulletController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BulletController")
            .field("element", &self.shared.element)
            .field("inner", &self.shared.inner.borrow())
            .finish()
    }
}

/// Time needed to cover `distance` at `speed` pixels per second
fn flight_time(distance: f64, speed: f64) -> Duration {
    if speed > 0.0 && distance.is_finite() {
        Duration::from_secs_f64(distance / speed)
    } else {
        Duration::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        common::bullet::BulletTuning,
        observer::callback,
        schedule::ManualScheduler,
        surface::HeadlessSurface,
    };
    use std::cell::Cell;

    struct Rig {
        scheduler: Rc<ManualScheduler>,
        surface: Rc<HeadlessSurface>,
        owner: Liveness,
    }

    fn rig() -> Rig {
        Rig {
            scheduler: Rc::new(ManualScheduler::new()),
            surface: Rc::new(HeadlessSurface::new(Size::new(1000.0, 1000.0))),
            owner: Liveness::new(),
        }
    }

    fn exact() -> BulletState {
        BulletState::new(BulletTuning {
            speed: 1000.0,
            length: 200.0,
            length_jitter: 0.0,
            position_jitter: 0.0,
            width: 10.0,
            height: 10.0,
        })
    }

    /// Tank facing up, its center at (500, 500)
    fn upwards(size: Size) -> FiringSnapshot {
        FiringSnapshot {
            angle: std::f64::consts::FRAC_PI_2,
            origin: Vector2::new(500.0, 500.0),
            tank_size: size,
        }
    }

    fn spawn(rig: &Rig, state: BulletState) -> BulletController {
        BulletController::spawn(
            state,
            upwards(Size::new(50.0, 100.0)),
            rig.surface.clone(),
            rig.scheduler.clone(),
            rig.owner.clone(),
        )
    }

    fn close(a: Vector2, b: Vector2) -> bool {
        a.distance(&b) < 1e-9
    }

    #[test]
    fn spawns_ahead_of_the_front_edge() {
        let rig = rig();
        let bullet = spawn(&rig, exact());

        // half the tank height above the origin, centered on the bullet
        assert!(close(bullet.position(), Vector2::new(495.0, 445.0)));
        let record = rig.surface.element(bullet.element()).unwrap();
        assert_eq!(record.kind, ElementKind::Bullet);
    }

    #[test]
    fn travels_forward_then_explodes() {
        let rig = rig();
        let bullet = spawn(&rig, exact());
        let mut rng = WyRand::new_seed(5);

        bullet.travel(bullet.snapshot().angle, &mut rng);
        assert!(close(bullet.target(), Vector2::new(495.0, 245.0)));
        assert_eq!(bullet.phase(), BulletPhase::Traveling);

        // 200px at 1000px/s
        rig.scheduler.advance(Duration::from_millis(199));
        assert_eq!(bullet.phase(), BulletPhase::Traveling);
        rig.scheduler.advance(Duration::from_millis(2));
        assert_eq!(bullet.phase(), BulletPhase::Exploding);
        assert!(rig.surface.has_mark(bullet.element(), Mark::Exploding));

        rig.scheduler.advance(BULLET_EXPLODE_TIME);
        assert_eq!(bullet.phase(), BulletPhase::Hole);
        assert!(rig.surface.has_mark(bullet.element(), Mark::Hole));
    }

    #[test]
    fn flight_time_follows_distance() {
        let rig = rig();
        let bullet = spawn(&rig, exact());
        let mut rng = WyRand::new_seed(5);
        bullet.travel(bullet.snapshot().angle, &mut rng);

        let record = rig.surface.element(bullet.element()).unwrap();
        assert_eq!(record.animation, Some(Duration::from_millis(200)));
    }

    #[test]
    fn explode_reports_the_final_position() {
        let rig = rig();
        let bullet = spawn(&rig, exact());
        let landed = Rc::new(Cell::new(None));
        let sink = landed.clone();
        bullet
            .events()
            .on(EXPLODE, callback(move |at: &Vector2| sink.set(Some(*at))))
            .unwrap();

        bullet.travel(bullet.snapshot().angle, &mut WyRand::new_seed(1));
        rig.scheduler.advance(Duration::from_secs(1));

        assert!(close(landed.get().unwrap(), Vector2::new(495.0, 245.0)));
    }

    #[test]
    fn impact_fades_the_deepest_element_under_the_bullet() {
        let rig = rig();
        let wall = rig.surface.place(
            ElementKind::Block,
            Vector2::new(450.0, 200.0),
            Size::new(100.0, 100.0),
            None,
        );
        let brick = rig.surface.place(
            ElementKind::Block,
            Vector2::new(480.0, 230.0),
            Size::new(30.0, 30.0),
            Some(wall),
        );

        let bullet = spawn(&rig, exact());
        bullet.travel(bullet.snapshot().angle, &mut WyRand::new_seed(1));
        rig.scheduler.advance(Duration::from_secs(1));

        let faded = |id| rig.surface.element(id).and_then(|record| record.fading);
        assert_eq!(faded(brick), Some(IMPACT_FADE_DURATION));
        assert_eq!(faded(wall), None);
    }

    #[test]
    fn landing_on_the_scene_damages_nothing() {
        let rig = rig();
        let far = rig.surface.place(
            ElementKind::Block,
            Vector2::new(0.0, 0.0),
            Size::new(20.0, 20.0),
            None,
        );

        let bullet = spawn(&rig, exact());
        bullet.travel(bullet.snapshot().angle, &mut WyRand::new_seed(1));
        rig.scheduler.advance(Duration::from_secs(1));

        assert_eq!(rig.surface.element(far).unwrap().fading, None);
    }

    #[test]
    fn destroyed_bullets_ignore_their_timers() {
        let rig = rig();
        let bullet = spawn(&rig, exact());
        let exploded = Rc::new(Cell::new(false));
        let flag = exploded.clone();
        bullet
            .events()
            .on(EXPLODE, callback(move |_: &Vector2| flag.set(true)))
            .unwrap();

        bullet.travel(bullet.snapshot().angle, &mut WyRand::new_seed(1));
        bullet.destroy();
        bullet.destroy();
        rig.scheduler.advance(Duration::from_secs(2));

        assert!(!exploded.get());
        assert_eq!(bullet.phase(), BulletPhase::Destroyed);
        assert!(rig.surface.element(bullet.element()).is_none());
    }

    #[test]
    fn no_hole_once_the_owner_is_gone() {
        let rig = rig();
        let bullet = spawn(&rig, exact());
        bullet.travel(bullet.snapshot().angle, &mut WyRand::new_seed(1));

        rig.scheduler.advance(Duration::from_millis(250));
        assert_eq!(bullet.phase(), BulletPhase::Exploding);

        rig.owner.kill();
        rig.scheduler.advance(BULLET_EXPLODE_TIME);
        assert_eq!(bullet.phase(), BulletPhase::Destroyed);
        assert!(rig.surface.element(bullet.element()).is_none());
    }

    #[test]
    fn holes_fade_then_leave_the_surface() {
        let rig = rig();
        let bullet = spawn(&rig, exact());
        bullet.travel(bullet.snapshot().angle, &mut WyRand::new_seed(1));

        // 200ms of flight, then the explosion
        rig.scheduler.advance(Duration::from_millis(200) + BULLET_EXPLODE_TIME);
        assert_eq!(bullet.phase(), BulletPhase::Hole);

        rig.scheduler.advance(HOLE_LIFETIME);
        let record = rig.surface.element(bullet.element()).unwrap();
        assert_eq!(record.fading, Some(HOLE_FADE_DURATION));
        assert_eq!(bullet.phase(), BulletPhase::Hole);

        rig.scheduler.advance(HOLE_FADE_DURATION);
        assert_eq!(bullet.phase(), BulletPhase::Destroyed);
        assert!(rig.surface.element(bullet.element()).is_none());
        assert_eq!(rig.scheduler.pending(), 0);
    }

    #[test]
    fn jitter_keeps_the_range_in_its_window() {
        let rig = rig();
        let state = BulletState::new(BulletTuning {
            length: 250.0,
            length_jitter: 50.0,
            position_jitter: 0.0,
            ..BulletTuning::default()
        });
        let mut rng = WyRand::new_seed(77);

        for _ in 0..50 {
            let bullet = spawn(&rig, state.clone());
            let start = bullet.position();
            bullet.travel(bullet.snapshot().angle, &mut rng);
            let range = start.distance(&bullet.target());
            assert!((250.0 - 1e-9..300.0).contains(&range), "range {}", range);
        }
    }
}
