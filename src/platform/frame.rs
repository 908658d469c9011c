//! Frame scheduling
//!
//! A `FrameScheduler` runs a one-shot callback with the host time (ms) of the
//! next frame. `GameLoop` chains those callbacks into a loop driving
//! `Game::frame`; only one chain is ever scheduled, and starting again
//! cancels the pending frame first.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::game::Game;

/// Handle of a requested frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FrameHandle(pub u64);

pub type FrameCallback = Box<dyn FnOnce(f64)>;

pub trait FrameScheduler {
    fn request(&self, callback: FrameCallback) -> FrameHandle;
    fn cancel(&self, handle: FrameHandle);
}

#[derive(Default)]
struct ManualInner {
    next: u64,
    pending: BTreeMap<FrameHandle, FrameCallback>,
}

/// Scheduler stepped explicitly by the host (tests, native demo)
#[derive(Clone, Default)]
pub struct ManualScheduler {
    inner: Rc<RefCell<ManualInner>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run every callback requested before this call. Returns how many ran.
    pub fn step(&self, now: f64) -> usize {
        let due = std::mem::take(&mut self.inner.borrow_mut().pending);
        let ran = due.len();
        for (_, callback) in due {
            callback(now);
        }
        ran
    }

    pub fn pending(&self) -> usize {
        self.inner.borrow().pending.len()
    }
}

impl FrameScheduler for ManualScheduler {
    fn request(&self, callback: FrameCallback) -> FrameHandle {
        let mut inner = self.inner.borrow_mut();
        inner.next += 1;
        let handle = FrameHandle(inner.next);
        inner.pending.insert(handle, callback);
        handle
    }

    fn cancel(&self, handle: FrameHandle) {
        self.inner.borrow_mut().pending.remove(&handle);
    }
}

/// Repeating frame loop around a shared game
pub struct GameLoop {
    game: Rc<RefCell<Game>>,
    scheduler: Rc<dyn FrameScheduler>,
    pending: Rc<Cell<Option<FrameHandle>>>,
}

impl GameLoop {
    pub fn new(game: Rc<RefCell<Game>>, scheduler: Rc<dyn FrameScheduler>) -> Self {
        Self {
            game,
            scheduler,
            pending: Rc::new(Cell::new(None)),
        }
    }

    /// (Re)start the loop, cancelling any frame still pending
    pub fn start(&self) {
        self.stop();
        schedule_next(
            self.game.clone(),
            self.scheduler.clone(),
            self.pending.clone(),
        );
        log::debug!("Frame loop started");
    }

    pub fn stop(&self) {
        if let Some(handle) = self.pending.take() {
            self.scheduler.cancel(handle);
            log::debug!("Frame loop stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.pending.get().is_some()
    }
}

impl Drop for GameLoop {
    fn drop(&mut self) {
        self.stop();
    }
}

fn schedule_next(
    game: Rc<RefCell<Game>>,
    scheduler: Rc<dyn FrameScheduler>,
    pending: Rc<Cell<Option<FrameHandle>>>,
) {
    let (next_scheduler, next_pending) = (scheduler.clone(), pending.clone());
    let handle = scheduler.request(Box::new(move |now| {
        next_pending.set(None);
        game.borrow_mut().frame(now);
        if game.borrow().is_destroyed() {
            log::debug!("Frame loop ended with the game");
            return;
        }
        schedule_next(game, next_scheduler, next_pending);
    }));
    pending.set(Some(handle));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{AssetLoader, QueuedImageBackend};
    use crate::settings::GameOptions;
    use crate::sim::state::GameState;
    use crate::surface::RecordingSurface;
    use crate::task::TaskQueue;

    fn game() -> Rc<RefCell<Game>> {
        let queue = TaskQueue::new();
        let surface = RecordingSurface::new(400.0, 300.0).shared();
        surface.borrow().mount(&queue);
        let loader = AssetLoader::new(QueuedImageBackend::new(&queue));
        Rc::new(RefCell::new(Game::new(
            GameOptions::new("#container"),
            surface,
            loader,
            queue,
        )))
    }

    #[test]
    fn test_manual_scheduler_cancel() {
        let scheduler = ManualScheduler::new();
        let ran = Rc::new(Cell::new(0));
        let r = ran.clone();
        let handle = scheduler.request(Box::new(move |_| r.set(r.get() + 1)));
        let r = ran.clone();
        scheduler.request(Box::new(move |_| r.set(r.get() + 10)));
        scheduler.cancel(handle);
        assert_eq!(scheduler.step(0.0), 1);
        assert_eq!(ran.get(), 10);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn test_loop_drives_game() {
        let game = game();
        let scheduler = ManualScheduler::new();
        let frame_loop = GameLoop::new(game.clone(), Rc::new(scheduler.clone()));
        frame_loop.start();
        assert!(frame_loop.is_running());

        scheduler.step(0.0);
        assert_eq!(game.borrow().state(), GameState::Selecting);
        assert_eq!(scheduler.pending(), 1, "loop reschedules itself");
    }

    #[test]
    fn test_restart_keeps_single_chain() {
        let game = game();
        let scheduler = ManualScheduler::new();
        let frame_loop = GameLoop::new(game, Rc::new(scheduler.clone()));
        frame_loop.start();
        frame_loop.start();
        frame_loop.start();
        assert_eq!(scheduler.pending(), 1);

        frame_loop.stop();
        assert!(!frame_loop.is_running());
        assert_eq!(scheduler.step(16.0), 0);
    }

    #[test]
    fn test_loop_ends_with_game() {
        let game = game();
        let scheduler = ManualScheduler::new();
        let frame_loop = GameLoop::new(game.clone(), Rc::new(scheduler.clone()));
        frame_loop.start();
        game.borrow_mut().destroy();
        scheduler.step(0.0);
        assert_eq!(scheduler.pending(), 0);
        assert!(!frame_loop.is_running());
    }
}
