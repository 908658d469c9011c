//! Minimal publish/subscribe hub
//!
//! Every stateful component owns an `EventHub`. Handlers are reference-counted
//! closures so the same handler can be registered, compared and removed later.
//! Dispatch is synchronous and in registration order; a panicking handler
//! propagates to whoever called `fire`.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use glam::Vec2;

use crate::scoreboard::ScoreSnapshot;
use crate::sim::state::{Direction, GameState, GlobeId};
use crate::task::{TaskId, TaskQueue};
use crate::ui::menu::MenuAction;

/// Event type names used across the crate
pub mod kinds {
    /// A kinetic entity changed position
    pub const MOVED: &str = "moved";
    /// Pointer click (surface raw click, or a click routed to an entity)
    pub const CLICK: &str = "click";
    /// Render surface changed size
    pub const RESIZED: &str = "resized";
    /// Readiness / animation / aggregate completion
    pub const FINISH: &str = "finish";
    pub const ERROR: &str = "error";
    /// A single asset finished loading
    pub const LOAD: &str = "load";
    /// Game state propagated from the facade
    pub const CHANGE: &str = "change";
    /// A globe was clicked
    pub const GOAL: &str = "goal";
    /// A globe left the operational area
    pub const MISS: &str = "miss";
    /// A menu entry was chosen
    pub const CHOOSE: &str = "choose";
    /// Score counters changed
    pub const SCORE: &str = "score";
}

/// Data carried by an event
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    None,
    Moved { from: Vec2, to: Vec2 },
    Point(Vec2),
    Size { width: f32, height: f32 },
    Finished { start_time: f64, direction: Direction },
    State(GameState),
    Message(String),
    Asset { name: String, url: String },
    Globe(GlobeId),
    Choose(MenuAction),
    Score(ScoreSnapshot),
}

/// A fired event: its type plus the payload it was fired with
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub kind: String,
    pub payload: Payload,
}

pub type Handler = Rc<dyn Fn(&Event)>;

/// Wrap a closure as a registrable handler
pub fn handler(f: impl Fn(&Event) + 'static) -> Handler {
    Rc::new(f)
}

fn same_handler(a: &Handler, b: &Handler) -> bool {
    std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
}

struct Registration {
    handler: Handler,
    once: bool,
}

#[derive(Default)]
struct HubInner {
    registry: RefCell<HashMap<String, Vec<Registration>>>,
    postponed: RefCell<Vec<(TaskQueue, TaskId)>>,
}

/// Event hub handle (clones share the same registry)
#[derive(Clone, Default)]
pub struct EventHub {
    inner: Rc<HubInner>,
}

impl std::fmt::Debug for EventHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registry = self.inner.registry.borrow();
        let counts: HashMap<&str, usize> = registry
            .iter()
            .map(|(kind, list)| (kind.as_str(), list.len()))
            .collect();
        f.debug_struct("EventHub").field("handlers", &counts).finish()
    }
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    fn register(&self, kind: &str, handler: Handler, once: bool) -> &Self {
        let mut registry = self.inner.registry.borrow_mut();
        let list = registry.entry(kind.to_owned()).or_default();
        let exists = list
            .iter()
            .any(|r| r.once == once && same_handler(&r.handler, &handler));
        if !exists {
            list.push(Registration { handler, once });
        }
        self
    }

    /// Register a persistent handler (no-op if already registered for `kind`)
    pub fn on(&self, kind: &str, handler: Handler) -> &Self {
        self.register(kind, handler, false)
    }

    /// Register a handler removed after its first invocation
    pub fn once(&self, kind: &str, handler: Handler) -> &Self {
        self.register(kind, handler, true)
    }

    /// Remove one handler, or every handler for `kind` when `handler` is None
    pub fn off(&self, kind: &str, handler: Option<&Handler>) -> &Self {
        let mut registry = self.inner.registry.borrow_mut();
        match handler {
            Some(h) => {
                if let Some(list) = registry.get_mut(kind) {
                    list.retain(|r| !same_handler(&r.handler, h));
                }
            }
            None => {
                registry.remove(kind);
            }
        }
        self
    }

    /// Invoke every handler registered for `kind`, in registration order
    pub fn fire(&self, kind: &str, payload: Payload) -> &Self {
        // Snapshot first: handlers are free to subscribe/unsubscribe while running
        let handlers: Vec<Handler> = {
            let mut registry = self.inner.registry.borrow_mut();
            match registry.get_mut(kind) {
                Some(list) => {
                    let handlers = list.iter().map(|r| r.handler.clone()).collect();
                    list.retain(|r| !r.once);
                    handlers
                }
                None => return self,
            }
        };

        let event = Event {
            kind: kind.to_owned(),
            payload,
        };
        for h in handlers {
            h(&event);
        }
        self
    }

    /// Fire `kind` once `delay_ms` has elapsed on `queue`
    pub fn postpone_fire(
        &self,
        queue: &TaskQueue,
        kind: &str,
        payload: Payload,
        delay_ms: f64,
    ) -> TaskId {
        let weak: Weak<HubInner> = Rc::downgrade(&self.inner);
        let kind = kind.to_owned();
        let id = queue.schedule(delay_ms, move || {
            if let Some(inner) = weak.upgrade() {
                EventHub { inner }.fire(&kind, payload);
            }
        });

        let mut postponed = self.inner.postponed.borrow_mut();
        postponed.retain(|(q, task)| q.is_pending(*task));
        postponed.push((queue.clone(), id));
        id
    }

    /// Number of postponed fires not yet run
    pub fn pending_fires(&self) -> usize {
        self.inner
            .postponed
            .borrow()
            .iter()
            .filter(|(q, task)| q.is_pending(*task))
            .count()
    }

    pub fn listener_count(&self, kind: &str) -> usize {
        self.inner
            .registry
            .borrow()
            .get(kind)
            .map(|list| list.len())
            .unwrap_or(0)
    }

    /// Cancel pending postponed fires and drop every handler. Safe to call twice.
    pub fn destroy(&self) {
        let postponed = std::mem::take(&mut *self.inner.postponed.borrow_mut());
        for (queue, id) in postponed {
            queue.cancel(id);
        }
        self.inner.registry.borrow_mut().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn counter() -> (Rc<Cell<u32>>, Handler) {
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        (count, handler(move |_| c.set(c.get() + 1)))
    }

    #[test]
    fn test_on_is_idempotent() {
        let hub = EventHub::new();
        let (count, h) = counter();
        hub.on("ping", h.clone());
        hub.on("ping", h.clone());
        hub.fire("ping", Payload::None);
        assert_eq!(count.get(), 1);
        assert_eq!(hub.listener_count("ping"), 1);
    }

    #[test]
    fn test_once_runs_a_single_time() {
        let hub = EventHub::new();
        let (count, h) = counter();
        hub.once("ping", h);
        hub.fire("ping", Payload::None);
        hub.fire("ping", Payload::None);
        assert_eq!(count.get(), 1);
        assert_eq!(hub.listener_count("ping"), 0);
    }

    #[test]
    fn test_registration_order_and_payload() {
        let hub = EventHub::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        for tag in ["first", "second"] {
            let seen = seen.clone();
            hub.on(
                "moved",
                handler(move |e| seen.borrow_mut().push((tag, e.kind.clone(), e.payload.clone()))),
            );
        }
        let payload = Payload::Point(Vec2::new(1.0, 2.0));
        hub.fire("moved", payload.clone());

        let seen = seen.borrow();
        assert_eq!(seen[0], ("first", "moved".to_string(), payload.clone()));
        assert_eq!(seen[1].0, "second");
    }

    #[test]
    fn test_off_single_and_all() {
        let hub = EventHub::new();
        let (a_count, a) = counter();
        let (b_count, b) = counter();
        hub.on("ping", a.clone());
        hub.on("ping", b.clone());

        hub.off("ping", Some(&a));
        hub.fire("ping", Payload::None);
        assert_eq!((a_count.get(), b_count.get()), (0, 1));

        hub.off("ping", None);
        hub.fire("ping", Payload::None);
        assert_eq!(b_count.get(), 1);
    }

    #[test]
    fn test_handler_may_unsubscribe_during_fire() {
        let hub = EventHub::new();
        let count = Rc::new(Cell::new(0));
        let slot: Rc<RefCell<Option<Handler>>> = Rc::new(RefCell::new(None));
        let (hub2, c, s) = (hub.clone(), count.clone(), slot.clone());
        let h = handler(move |_| {
            c.set(c.get() + 1);
            if let Some(me) = s.borrow().as_ref() {
                hub2.off("ping", Some(me));
            }
        });
        *slot.borrow_mut() = Some(h.clone());
        hub.on("ping", h);

        hub.fire("ping", Payload::None);
        hub.fire("ping", Payload::None);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_postpone_fire_and_destroy() {
        let queue = TaskQueue::new();
        let hub = EventHub::new();
        let (count, h) = counter();
        hub.on("late", h.clone());

        hub.postpone_fire(&queue, "late", Payload::None, 0.0);
        assert_eq!(count.get(), 0, "postponed fire must not be synchronous");
        queue.run_due(0.0);
        assert_eq!(count.get(), 1);

        hub.postpone_fire(&queue, "late", Payload::None, 10.0);
        assert_eq!(hub.pending_fires(), 1);
        hub.destroy();
        hub.destroy();
        assert_eq!(hub.pending_fires(), 0);
        assert!(queue.is_empty());

        hub.on("late", h);
        queue.run_due(100.0);
        assert_eq!(count.get(), 1);
    }

    #[test]
    #[should_panic(expected = "boom")]
    fn test_handler_panic_propagates() {
        let hub = EventHub::new();
        hub.on("ping", handler(|_| panic!("boom")));
        hub.fire("ping", Payload::None);
    }
}
