//! Presentation surface the simulation draws on
//!
//! The core only issues fire-and-forget commands to the surface. The single query it
//! depends on is the point lookup used to resolve where a bullet lands.

use std::{
    cell::{Cell, RefCell},
    collections::{BTreeMap, BTreeSet},
    rc::Rc,
    time::Duration,
};

use serde::{Deserialize, Serialize};

use crate::{
    schedule::Scheduler,
    utils::{rect_contains, Size, Vector2},
};

/// Handle of an element placed on the surface
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ElementId(pub u64);

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Tank,
    Bullet,
    /// Scenery bullets can hit
    Block,
}

/// Presentation states toggled on an element
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Mark {
    Moving,
    Shooting,
    Exploding,
    Hole,
}

/// Result of a point lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hit {
    /// Nothing but the root scene container at that point
    Scene,
    Element(ElementId),
}

pub trait Surface {
    /// Size of the visible area, the bounds of tank movement
    fn viewport(&self) -> Size;

    /// Place a new element at `at`, optionally nested inside `parent`
    fn place(
        &self,
        kind: ElementKind,
        at: Vector2,
        size: Size,
        parent: Option<ElementId>,
    ) -> ElementId;

    fn set_position(&self, element: ElementId, at: Vector2);

    /// Rotation in degrees
    fn set_rotation(&self, element: ElementId, degrees: f64);

    fn set_mark(&self, element: ElementId, mark: Mark, on: bool);

    /// Move `element` linearly to `to` over `duration`
    fn animate_to(&self, element: ElementId, to: Vector2, duration: Duration);

    fn remove(&self, element: ElementId);

    /// Fade `element` out over `duration`, then remove it
    fn fade_out(&self, element: ElementId, duration: Duration);

    /// Topmost element covering `point`, ignoring `exclude`
    fn topmost_at(&self, point: Vector2, exclude: Option<ElementId>) -> Hit;

    /// Most deeply nested element covering `point`, ignoring `exclude`
    fn deepest_at(&self, point: Vector2, exclude: Option<ElementId>) -> Option<ElementId>;
}

/// Recorded state of an element on a [`HeadlessSurface`]
#[derive(Debug, Clone, PartialEq)]
pub struct ElementRecord {
    pub kind: ElementKind,
    pub position: Vector2,
    pub size: Size,
    pub rotation: f64,
    pub marks: BTreeSet<Mark>,
    pub parent: Option<ElementId>,
    /// Set once a fade has been requested, faded elements no longer take hits
    pub fading: Option<Duration>,
    /// Duration of the last requested animation
    pub animation: Option<Duration>,
}

type Elements = RefCell<BTreeMap<ElementId, ElementRecord>>;

/// Surface that keeps every element in memory
///
/// Animations complete instantly. A fade flags the element right away and, when the
/// surface has a clock, removes it once the fade duration has elapsed. Without a
/// clock faded elements stay flagged until removed explicitly.
pub struct HeadlessSurface {
    viewport: Size,
    next_id: Cell<u64>,
    elements: Rc<Elements>,
    clock: Option<Rc<dyn Scheduler>>,
}

impl HeadlessSurface {
    pub fn new(viewport: Size) -> Self {
        Self {
            viewport,
            next_id: Cell::new(1),
            elements: Rc::new(RefCell::new(BTreeMap::new())),
            clock: None,
        }
    }

    /// Surface whose fades complete on `clock`
    pub fn with_clock(viewport: Size, clock: Rc<dyn Scheduler>) -> Self {
        Self {
            clock: Some(clock),
            ..Self::new(viewport)
        }
    }

    /// Number of elements currently on the surface
    pub fn len(&self) -> usize {
        self.elements.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.borrow().is_empty()
    }

    pub fn element(&self, element: ElementId) -> Option<ElementRecord> {
        self.elements.borrow().get(&element).cloned()
    }

    pub fn has_mark(&self, element: ElementId, mark: Mark) -> bool {
        self.elements
            .borrow()
            .get(&element)
            .map_or(false, |record| record.marks.contains(&mark))
    }

    /// Identifiers of every live element of `kind`, in placement order
    pub fn elements_of(&self, kind: ElementKind) -> Vec<ElementId> {
        self.elements
            .borrow()
            .iter()
            .filter(|(_, record)| record.kind == kind)
            .map(|(id, _)| *id)
            .collect()
    }

    fn depth(elements: &BTreeMap<ElementId, ElementRecord>, element: ElementId) -> usize {
        let mut depth = 0;
        let mut current = elements.get(&element).and_then(|record| record.parent);
        while let Some(parent) = current {
            depth += 1;
            current = elements.get(&parent).and_then(|record| record.parent);
        }
        depth
    }

    /// Elements under `point`, bottom to top
    fn covering(&self, point: Vector2, exclude: Option<ElementId>) -> Vec<ElementId> {
        self.elements
            .borrow()
            .iter()
            .filter(|(id, record)| {
                Some(**id) != exclude
                    && record.fading.is_none()
                    && rect_contains(&record.position, &record.size, &point)
            })
            .map(|(id, _)| *id)
            .collect()
    }

    fn update(&self, element: ElementId, apply: impl FnOnce(&mut ElementRecord)) {
        match self.elements.borrow_mut().get_mut(&element) {
            Some(record) => apply(record),
            None => tracing::trace!(?element, "ignoring update of a removed element"),
        }
    }
}

impl std::fmt::Debug for HeadlessSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeadlessSurface")
            .field("viewport", &self.viewport)
            .field("elements", &self.elements.borrow().len())
            .field("clocked", &self.clock.is_some())
            .finish()
    }
}

impl Surface for HeadlessSurface {
    fn viewport(&self) -> Size {
        self.viewport
    }

    fn place(
        &self,
        kind: ElementKind,
        at: Vector2,
        size: Size,
        parent: Option<ElementId>,
    ) -> ElementId {
        let id = ElementId(self.next_id.get());
        self.next_id.set(id.0 + 1);

        self.elements.borrow_mut().insert(
            id,
            ElementRecord {
                kind,
                position: at,
                size,
                rotation: 0.0,
                marks: BTreeSet::new(),
                parent,
                fading: None,
                animation: None,
            },
        );

        id
    }

    fn set_position(&self, element: ElementId, at: Vector2) {
        self.update(element, |record| record.position = at);
    }

    fn set_rotation(&self, element: ElementId, degrees: f64) {
        self.update(element, |record| record.rotation = degrees);
    }

    fn set_mark(&self, element: ElementId, mark: Mark, on: bool) {
        self.update(element, |record| {
            if on {
                record.marks.insert(mark);
            } else {
                record.marks.remove(&mark);
            }
        });
    }

    fn animate_to(&self, element: ElementId, to: Vector2, duration: Duration) {
        self.update(element, |record| {
            record.position = to;
            record.animation = Some(duration);
        });
    }

    fn remove(&self, element: ElementId) {
        self.elements.borrow_mut().remove(&element);
    }

    fn fade_out(&self, element: ElementId, duration: Duration) {
        let mut fresh = false;
        self.update(element, |record| {
            fresh = record.fading.is_none();
            record.fading = Some(duration);
        });

        if let (true, Some(clock)) = (fresh, &self.clock) {
            let elements = Rc::downgrade(&self.elements);
            clock.defer(
                duration,
                Box::new(move || {
                    if let Some(elements) = elements.upgrade() {
                        elements.borrow_mut().remove(&element);
                    }
                }),
            );
        }
    }

    fn topmost_at(&self, point: Vector2, exclude: Option<ElementId>) -> Hit {
        match self.covering(point, exclude).last() {
            Some(id) => Hit::Element(*id),
            None => Hit::Scene,
        }
    }

    fn deepest_at(&self, point: Vector2, exclude: Option<ElementId>) -> Option<ElementId> {
        let covering = self.covering(point, exclude);
        let elements = self.elements.borrow();
        // max_by_key keeps the last maximum, so the topmost element wins ties
        covering
            .into_iter()
            .max_by_key(|id| Self::depth(&elements, *id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::ManualScheduler;

    fn surface() -> HeadlessSurface {
        HeadlessSurface::new(Size::new(800.0, 600.0))
    }

    #[test]
    fn empty_points_hit_the_scene() {
        let surface = surface();
        surface.place(
            ElementKind::Block,
            Vector2::new(100.0, 100.0),
            Size::new(10.0, 10.0),
            None,
        );

        assert_eq!(surface.topmost_at(Vector2::new(50.0, 50.0), None), Hit::Scene);
        assert_eq!(surface.deepest_at(Vector2::new(50.0, 50.0), None), None);
    }

    #[test]
    fn later_elements_are_on_top() {
        let surface = surface();
        let size = Size::new(50.0, 50.0);
        let below = surface.place(ElementKind::Block, Vector2::zero(), size, None);
        let above = surface.place(ElementKind::Block, Vector2::new(10.0, 10.0), size, None);

        let point = Vector2::new(20.0, 20.0);
        assert_eq!(surface.topmost_at(point, None), Hit::Element(above));
        assert_eq!(surface.topmost_at(point, Some(above)), Hit::Element(below));
    }

    #[test]
    fn nested_elements_are_deeper() {
        let surface = surface();
        let wall = surface.place(
            ElementKind::Block,
            Vector2::zero(),
            Size::new(100.0, 100.0),
            None,
        );
        let brick = surface.place(
            ElementKind::Block,
            Vector2::new(10.0, 10.0),
            Size::new(20.0, 20.0),
            Some(wall),
        );
        // drawn later but not nested
        surface.place(
            ElementKind::Block,
            Vector2::new(0.0, 0.0),
            Size::new(40.0, 40.0),
            None,
        );

        assert_eq!(surface.deepest_at(Vector2::new(15.0, 15.0), None), Some(brick));
    }

    #[test]
    fn faded_elements_stop_taking_hits() {
        let surface = surface();
        let block = surface.place(
            ElementKind::Block,
            Vector2::zero(),
            Size::new(10.0, 10.0),
            None,
        );

        surface.fade_out(block, Duration::from_millis(500));
        assert_eq!(surface.topmost_at(Vector2::new(5.0, 5.0), None), Hit::Scene);
        assert_eq!(
            surface.element(block).and_then(|record| record.fading),
            Some(Duration::from_millis(500))
        );
    }

    #[test]
    fn clocked_fades_remove_the_element() {
        let clock = Rc::new(ManualScheduler::new());
        let surface = HeadlessSurface::with_clock(Size::new(800.0, 600.0), clock.clone());
        let block = surface.place(
            ElementKind::Block,
            Vector2::zero(),
            Size::new(10.0, 10.0),
            None,
        );

        surface.fade_out(block, Duration::from_millis(500));
        surface.fade_out(block, Duration::from_millis(500));
        clock.advance(Duration::from_millis(499));
        assert!(surface.element(block).is_some());

        clock.advance(Duration::from_millis(1));
        assert!(surface.element(block).is_none());
        assert!(surface.is_empty());
        assert_eq!(clock.pending(), 0);
    }

    #[test]
    fn updates_to_removed_elements_are_ignored() {
        let surface = surface();
        let bullet = surface.place(
            ElementKind::Bullet,
            Vector2::zero(),
            Size::new(16.0, 16.0),
            None,
        );
        surface.remove(bullet);
        surface.set_mark(bullet, Mark::Hole, true);

        assert!(surface.element(bullet).is_none());
        assert!(!surface.has_mark(bullet, Mark::Hole));
    }
}
