//! Host task queue and readiness joins
//!
//! The browser gives us `setTimeout` and promises; here both are explicit:
//! - `TaskQueue`: deferred callbacks keyed by a monotonic millisecond clock,
//!   individually cancelable, run when the host pumps `run_due`
//! - `ReadinessJoin`: a counter of outstanding completion signals that settles
//!   to ready when all succeed, or failed on the first failure

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

/// Handle of a scheduled task
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(u64);

struct Task {
    due: f64,
    callback: Box<dyn FnOnce()>,
}

#[derive(Default)]
struct QueueInner {
    now: f64,
    next_id: u64,
    tasks: BTreeMap<TaskId, Task>,
}

/// Single-threaded deferred task queue (cheap to clone, clones share state)
#[derive(Clone, Default)]
pub struct TaskQueue {
    inner: Rc<RefCell<QueueInner>>,
}

impl std::fmt::Debug for TaskQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("TaskQueue")
            .field("now", &inner.now)
            .field("pending", &inner.tasks.len())
            .finish()
    }
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last clock value seen by `run_due` (ms)
    pub fn now(&self) -> f64 {
        self.inner.borrow().now
    }

    /// Schedule `callback` to run once the clock reaches now + `delay_ms`
    pub fn schedule(&self, delay_ms: f64, callback: impl FnOnce() + 'static) -> TaskId {
        let mut inner = self.inner.borrow_mut();
        let id = TaskId(inner.next_id);
        inner.next_id += 1;
        let due = inner.now + delay_ms.max(0.0);
        inner.tasks.insert(
            id,
            Task {
                due,
                callback: Box::new(callback),
            },
        );
        id
    }

    /// Cancel a pending task. Returns false if it already ran or was cancelled.
    pub fn cancel(&self, id: TaskId) -> bool {
        self.inner.borrow_mut().tasks.remove(&id).is_some()
    }

    pub fn is_pending(&self, id: TaskId) -> bool {
        self.inner.borrow().tasks.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().tasks.is_empty()
    }

    /// Advance the clock to `now` and run every task that is due, earliest first.
    ///
    /// Tasks scheduled by a running task wait for the next pump, like a
    /// `setTimeout(fn, 0)` issued from inside a timer callback.
    /// Returns the number of tasks run.
    pub fn run_due(&self, now: f64) -> usize {
        let horizon = {
            let mut inner = self.inner.borrow_mut();
            inner.now = inner.now.max(now);
            TaskId(inner.next_id)
        };

        let mut ran = 0;
        loop {
            let next = {
                let mut inner = self.inner.borrow_mut();
                let clock = inner.now;
                let due_id = inner
                    .tasks
                    .iter()
                    .filter(|(id, task)| **id < horizon && task.due <= clock)
                    .min_by(|(a_id, a), (b_id, b)| {
                        a.due
                            .partial_cmp(&b.due)
                            .unwrap_or(std::cmp::Ordering::Equal)
                            .then(a_id.cmp(b_id))
                    })
                    .map(|(id, _)| *id);
                due_id.and_then(|id| inner.tasks.remove(&id))
            };
            // Borrow released before the callback runs: it may schedule or cancel
            match next {
                Some(task) => {
                    (task.callback)();
                    ran += 1;
                }
                None => break,
            }
        }
        ran
    }
}

/// Settled state of a readiness join
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    Pending,
    Ready,
    Failed(String),
}

/// Logical AND across named completion signals
#[derive(Debug, Clone)]
pub struct ReadinessJoin {
    pending: BTreeSet<String>,
    settled: BTreeSet<String>,
    state: Readiness,
}

impl Default for ReadinessJoin {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadinessJoin {
    pub fn new() -> Self {
        Self {
            pending: BTreeSet::new(),
            settled: BTreeSet::new(),
            state: Readiness::Pending,
        }
    }

    /// Register a signal that must succeed before the join is ready
    pub fn expect(&mut self, name: &str) {
        if !self.settled.contains(name) {
            self.pending.insert(name.to_owned());
        }
    }

    /// Report success of a signal. Unknown or repeated signals are ignored.
    pub fn succeed(&mut self, name: &str) -> &Readiness {
        if self.pending.remove(name) {
            self.settled.insert(name.to_owned());
            if self.pending.is_empty() && self.state == Readiness::Pending {
                self.state = Readiness::Ready;
            }
        }
        &self.state
    }

    /// Report failure of a signal; the join fails immediately
    pub fn fail(&mut self, name: &str, message: impl Into<String>) -> &Readiness {
        if self.pending.remove(name) {
            self.settled.insert(name.to_owned());
            if self.state == Readiness::Pending {
                self.state = Readiness::Failed(message.into());
            }
        }
        &self.state
    }

    pub fn state(&self) -> &Readiness {
        &self.state
    }

    pub fn outstanding(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_tasks_run_in_due_order() {
        let queue = TaskQueue::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        for (delay, tag) in [(30.0, "c"), (10.0, "a"), (20.0, "b")] {
            let log = log.clone();
            queue.schedule(delay, move || log.borrow_mut().push(tag));
        }

        assert_eq!(queue.run_due(5.0), 0);
        assert_eq!(queue.run_due(25.0), 2);
        assert_eq!(*log.borrow(), vec!["a", "b"]);
        assert_eq!(queue.run_due(100.0), 1);
        assert_eq!(*log.borrow(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_cancel() {
        let queue = TaskQueue::new();
        let hit = Rc::new(Cell::new(false));
        let flag = hit.clone();
        let id = queue.schedule(0.0, move || flag.set(true));

        assert!(queue.is_pending(id));
        assert!(queue.cancel(id));
        assert!(!queue.cancel(id));
        queue.run_due(1.0);
        assert!(!hit.get());
    }

    #[test]
    fn test_task_scheduled_from_task_waits_for_next_pump() {
        let queue = TaskQueue::new();
        let count = Rc::new(Cell::new(0));
        let inner_queue = queue.clone();
        let c = count.clone();
        queue.schedule(0.0, move || {
            c.set(c.get() + 1);
            let c = c.clone();
            inner_queue.schedule(0.0, move || c.set(c.get() + 1));
        });

        assert_eq!(queue.run_due(0.0), 1);
        assert_eq!(count.get(), 1);
        assert_eq!(queue.run_due(0.0), 1);
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn test_join_ready_when_all_succeed() {
        let mut join = ReadinessJoin::new();
        join.expect("surface");
        join.expect("assets");

        assert_eq!(join.succeed("surface"), &Readiness::Pending);
        // Repeats are ignored
        assert_eq!(join.succeed("surface"), &Readiness::Pending);
        assert_eq!(join.succeed("assets"), &Readiness::Ready);
        assert_eq!(join.outstanding(), 0);
    }

    #[test]
    fn test_join_fails_on_first_failure() {
        let mut join = ReadinessJoin::new();
        join.expect("surface");
        join.expect("assets");

        assert_eq!(
            join.fail("surface", "no container"),
            &Readiness::Failed("no container".into())
        );
        // Later success cannot resurrect it
        assert_eq!(
            join.succeed("assets"),
            &Readiness::Failed("no container".into())
        );
    }
}
