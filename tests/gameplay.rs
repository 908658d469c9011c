//! End-to-end runs of the facade on a headless surface

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec2;

use collect_energy::assets::{AssetLoader, QueuedImageBackend};
use collect_energy::event::{Payload, handler, kinds};
use collect_energy::sim::GameState;
use collect_energy::surface::{DrawCommand, RecordingSurface};
use collect_energy::task::TaskQueue;
use collect_energy::{Game, GameOptions};

const FRAME_MS: f64 = 16.0;

struct Harness {
    surface: Rc<RefCell<RecordingSurface>>,
    game: Game,
    now: f64,
}

impl Harness {
    fn new() -> Self {
        let queue = TaskQueue::new();
        let surface = RecordingSurface::new(400.0, 300.0).shared();
        surface.borrow().mount(&queue);
        let assets = AssetLoader::new(QueuedImageBackend::new(&queue));
        let mut options = GameOptions::new("#container");
        options.tuning.seed = Some(1);
        let mut game = Game::new(options, surface.clone(), assets, queue);
        game.frame(0.0);
        Self {
            surface,
            game,
            now: 0.0,
        }
    }

    fn step(&mut self) {
        self.now += FRAME_MS;
        self.game.frame(self.now);
    }

    /// Step until `done` holds; panics after `max_frames`
    fn run_until(&mut self, max_frames: u32, done: impl Fn(&Game) -> bool) {
        for _ in 0..max_frames {
            if done(&self.game) {
                return;
            }
            self.step();
        }
        assert!(done(&self.game), "condition not reached, state {:?}", self.game.state());
    }

    fn click(&mut self, point: Vec2) {
        self.surface.borrow().click(point.x, point.y);
        self.step();
    }

    fn click_menu_entry(&mut self, index: usize) {
        let bounds = self.game.interface().menu()[index]
            .bounds()
            .expect("menu rendered");
        self.click(bounds.center());
    }

    /// Center of the first globe that is fully inside the area
    fn visible_globe(&self) -> Option<Vec2> {
        let controller = self.game.controller();
        let population = controller.population();
        population
            .ids()
            .into_iter()
            .filter_map(|id| population.globe(id))
            .find(|g| g.top().is_some_and(|t| t >= 0.0))
            .and_then(|g| g.coordinate())
    }
}

#[test]
fn menu_opens_once_ready() {
    let harness = Harness::new();
    assert_eq!(harness.game.state(), GameState::Selecting);
    let labels: Vec<_> = harness
        .game
        .interface()
        .menu()
        .iter()
        .map(|e| e.label.clone())
        .collect();
    assert_eq!(labels, vec!["start", "High score: 0"]);
    assert!(
        harness
            .surface
            .borrow()
            .commands()
            .iter()
            .any(|c| matches!(c, DrawCommand::FillText { text, .. } if text == "start"))
    );
}

#[test]
fn choosing_start_runs_after_wipe() {
    let mut harness = Harness::new();
    harness.click_menu_entry(0);
    assert_eq!(harness.game.state(), GameState::Changing);

    // Clicks during the wipe go nowhere
    harness.click(Vec2::new(200.0, 100.0));
    assert_eq!(harness.game.state(), GameState::Changing);

    harness.run_until(100, |g| g.state() == GameState::Running);
    harness.run_until(100, |g| g.controller().population().live_count() > 0);
}

#[test]
fn three_misses_end_the_run() {
    let mut harness = Harness::new();
    let scores = Rc::new(RefCell::new(Vec::new()));
    let s = scores.clone();
    harness.game.on(
        kinds::SCORE,
        handler(move |e| {
            if let Payload::Score(snapshot) = &e.payload {
                s.borrow_mut().push(*snapshot);
            }
        }),
    );

    harness.game.start();
    harness.run_until(100, |g| g.state() == GameState::Running);

    // Collect one globe so the run beats the high score
    harness.run_until(200, |g| {
        let population = g.controller().population();
        population
            .ids()
            .into_iter()
            .filter_map(|id| population.globe(id))
            .any(|globe| globe.top().is_some_and(|t| t >= 0.0))
    });
    let target = harness.visible_globe().expect("a globe in the area");
    harness.click(target);
    assert_eq!(harness.game.score().score, 1);

    // Let everything else fall through
    harness.run_until(2000, |g| g.state() != GameState::Running);
    assert_eq!(harness.game.state(), GameState::Changing);
    let score = harness.game.score();
    assert_eq!(score.misses, 3);
    assert_eq!(score.high_score, 1);
    assert!(harness.game.controller().population().is_empty());
    assert_eq!(scores.borrow().last().map(|s| s.high_score), Some(1));

    harness.run_until(100, |g| g.state() == GameState::Selecting);
    assert_eq!(harness.game.interface().menu()[1].label, "High score: 1");

    // A new run clears the counters but keeps the best score
    harness.click_menu_entry(0);
    let score = harness.game.score();
    assert_eq!((score.score, score.misses, score.high_score), (0, 0, 1));
}

#[test]
fn paused_globes_stay_put() {
    let mut harness = Harness::new();
    harness.game.start();
    harness.run_until(100, |g| g.state() == GameState::Running);
    harness.run_until(100, |g| g.controller().population().live_count() > 0);

    let before = harness.game.controller().population().ids();
    let position = |h: &Harness| {
        let population = h.game.controller().population();
        population.globe(before[0]).and_then(|g| g.coordinate())
    };
    let at_pause = position(&harness);

    harness.game.pause();
    for _ in 0..30 {
        harness.step();
    }
    assert_eq!(position(&harness), at_pause);
    assert_eq!(harness.game.controller().population().ids(), before);

    harness.game.resume();
    harness.step();
    assert_ne!(position(&harness), at_pause);
}

#[test]
fn resize_recomputes_area() {
    let mut harness = Harness::new();
    assert_eq!(harness.game.controller().area().map(|a| a.width()), Some(400.0));
    harness.surface.borrow_mut().resize(800.0, 600.0);
    harness.step();
    assert_eq!(harness.game.controller().area().map(|a| a.height()), Some(600.0));
}
