//! Top-level facade
//!
//! Wires the render surface, the asset loader, the controller and the menu
//! together and owns the single authoritative `GameState`. Readiness of the
//! surface (and of the background image, when one is configured) is joined
//! before the menu opens.
//!
//! Every cross-component subscription pushes a `Signal` into one inbox; the
//! inbox is drained from `frame` and from the public operations, so no handler
//! ever re-enters the facade.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use glam::Vec2;

use crate::assets::AssetLoader;
use crate::consts::BACKGROUND_IMAGE;
use crate::event::{EventHub, Handler, Payload, handler, kinds};
use crate::scoreboard::{ScoreSnapshot, Scoreboard};
use crate::settings::GameOptions;
use crate::sim::controller::Controller;
use crate::sim::state::{Direction, GameState};
use crate::surface::SharedSurface;
use crate::task::{Readiness, ReadinessJoin, TaskQueue};
use crate::ui::menu::{Interface, MenuAction, MenuEntry};

const SURFACE_SIGNAL: &str = "surface";
const ASSETS_SIGNAL: &str = "assets";

#[derive(Debug, Clone, PartialEq)]
enum Signal {
    SurfaceReady,
    SurfaceFailed(String),
    AssetsSettled,
    AssetFailed(String),
    Click(Vec2),
    Resized,
    Goal,
    Miss,
    Transition(Direction),
    Choose(MenuAction),
}

type Inbox = Rc<RefCell<VecDeque<Signal>>>;

/// A handler installed on another component's hub, removed on teardown
struct Subscription {
    hub: EventHub,
    kind: &'static str,
    handler: Handler,
}

pub struct Game {
    surface: SharedSurface,
    assets: AssetLoader,
    queue: TaskQueue,
    controller: Controller,
    interface: Interface,
    scoreboard: Scoreboard,
    transition_duration: f32,
    max_frame_span: f32,
    state: GameState,
    join: ReadinessJoin,
    /// Readiness already acted upon (ready or failed)
    settled: bool,
    destroyed: bool,
    /// Host time of the current and previous frame (ms)
    now: f64,
    last_frame: Option<f64>,
    inbox: Inbox,
    subscriptions: Vec<Subscription>,
    events: EventHub,
}

impl std::fmt::Debug for Game {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Game")
            .field("state", &self.state)
            .field("score", &self.scoreboard.snapshot())
            .field("readiness", self.join.state())
            .field("destroyed", &self.destroyed)
            .finish()
    }
}

impl Game {
    /// Build a game on `surface`. Nothing is shown until the surface reports
    /// `finish` (and the background image, if any, has settled); a surface
    /// `error` is re-fired on the facade hub and leaves the game inert.
    pub fn new(
        options: GameOptions,
        surface: SharedSurface,
        assets: AssetLoader,
        queue: TaskQueue,
    ) -> Self {
        let tuning = &options.tuning;
        let seed = tuning.seed.unwrap_or_else(rand::random);
        let controller = Controller::new(surface.clone(), Some(assets.clone()), &options, seed);
        let interface = Interface::new(surface.clone(), tuning);

        let mut game = Self {
            surface: surface.clone(),
            assets: assets.clone(),
            queue,
            controller,
            interface,
            scoreboard: Scoreboard::new(tuning.effective_loss_threshold()),
            transition_duration: tuning.transition_duration,
            max_frame_span: tuning.max_frame_span,
            state: GameState::Waiting,
            join: ReadinessJoin::new(),
            settled: false,
            destroyed: false,
            now: 0.0,
            last_frame: None,
            inbox: Rc::new(RefCell::new(VecDeque::new())),
            subscriptions: Vec::new(),
            events: EventHub::new(),
        };

        let surface_hub = surface.borrow().events().clone();
        game.subscribe(&surface_hub, kinds::FINISH, |_| Some(Signal::SurfaceReady));
        game.subscribe(&surface_hub, kinds::ERROR, |p| {
            Some(Signal::SurfaceFailed(message_of(p)))
        });
        game.subscribe(&surface_hub, kinds::CLICK, |p| match p {
            Payload::Point(point) => Some(Signal::Click(*point)),
            _ => None,
        });
        game.subscribe(&surface_hub, kinds::RESIZED, |_| Some(Signal::Resized));

        let asset_hub = assets.events().clone();
        game.subscribe(&asset_hub, kinds::FINISH, |_| Some(Signal::AssetsSettled));
        game.subscribe(&asset_hub, kinds::ERROR, |p| {
            Some(Signal::AssetFailed(message_of(p)))
        });

        let controller_hub = game.controller.events().clone();
        game.subscribe(&controller_hub, kinds::GOAL, |_| Some(Signal::Goal));
        game.subscribe(&controller_hub, kinds::MISS, |_| Some(Signal::Miss));

        let interface_hub = game.interface.events().clone();
        game.subscribe(&interface_hub, kinds::FINISH, |p| match p {
            Payload::Finished { direction, .. } => Some(Signal::Transition(*direction)),
            _ => None,
        });
        game.subscribe(&interface_hub, kinds::CHOOSE, |p| match p {
            Payload::Choose(action) => Some(Signal::Choose(*action)),
            _ => None,
        });

        game.join.expect(SURFACE_SIGNAL);
        if let Some(url) = options.tuning.background_image.as_deref() {
            game.join.expect(ASSETS_SIGNAL);
            assets.load(BACKGROUND_IMAGE, url);
        }
        log::info!("Game created for container '{}'", options.container);
        game
    }

    fn subscribe(
        &mut self,
        hub: &EventHub,
        kind: &'static str,
        translate: impl Fn(&Payload) -> Option<Signal> + 'static,
    ) {
        let inbox = self.inbox.clone();
        let h = handler(move |e| {
            if let Some(signal) = translate(&e.payload) {
                inbox.borrow_mut().push_back(signal);
            }
        });
        hub.on(kind, h.clone());
        self.subscriptions.push(Subscription {
            hub: hub.clone(),
            kind,
            handler: h,
        });
    }

    /// Facade hub: `finish`, `error`, `change` and `score`
    pub fn events(&self) -> &EventHub {
        &self.events
    }

    pub fn on(&self, kind: &str, handler: Handler) -> &Self {
        self.events.on(kind, handler);
        self
    }

    pub fn off(&self, kind: &str, handler: Option<&Handler>) -> &Self {
        self.events.off(kind, handler);
        self
    }

    pub fn fire(&self, kind: &str, payload: Payload) -> &Self {
        self.events.fire(kind, payload);
        self
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn readiness(&self) -> &Readiness {
        self.join.state()
    }

    pub fn score(&self) -> ScoreSnapshot {
        self.scoreboard.snapshot()
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    pub fn interface(&self) -> &Interface {
        &self.interface
    }

    pub fn queue(&self) -> &TaskQueue {
        &self.queue
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    fn is_ready(&self) -> bool {
        !self.destroyed && *self.join.state() == Readiness::Ready
    }

    /// Reset the run and wipe the menu away; gameplay starts when the wipe ends
    pub fn start(&mut self) {
        if !self.is_ready() {
            log::warn!("start() ignored: game is not ready");
            return;
        }
        self.scoreboard.reset_run();
        self.controller.reset();
        self.publish_score();
        self.set_state(GameState::Changing);
        self.interface
            .start_evolution(self.now, self.transition_duration, Direction::Close);
        self.process_signals();
    }

    /// Freeze the simulation; the scene keeps being drawn
    pub fn pause(&mut self) {
        if self.state == GameState::Running {
            self.set_state(GameState::Pausing);
        }
    }

    pub fn resume(&mut self) {
        if self.state == GameState::Pausing {
            self.set_state(GameState::Running);
        }
    }

    /// Open the menu. The first opening is instant, later ones wipe in.
    pub fn select(&mut self, is_first_open: bool) {
        if !self.is_ready() {
            log::warn!("select() ignored: game is not ready");
            return;
        }
        let during = if is_first_open {
            0.0
        } else {
            self.transition_duration
        };
        let menu = self.main_menu();
        self.interface.set_menu(menu);
        self.set_state(GameState::Changing);
        self.interface
            .start_evolution(self.now, during, Direction::Open);
        self.process_signals();
    }

    /// Advance to host time `now` (ms): run due tasks, settle input, step
    /// and draw the scene
    pub fn frame(&mut self, now: f64) {
        if self.destroyed {
            return;
        }
        self.queue.run_due(now);
        self.now = now;
        let span = self
            .last_frame
            .map(|previous| ((now - previous) / 1000.0) as f32)
            .unwrap_or(0.0)
            .clamp(0.0, self.max_frame_span.max(0.0));
        self.last_frame = Some(now);

        self.process_signals();
        if self.state == GameState::Waiting || self.destroyed {
            return;
        }

        self.controller
            .frame(span, self.state == GameState::Running);
        if matches!(self.state, GameState::Changing | GameState::Selecting) {
            self.interface.frame(now);
        }
        self.process_signals();
    }

    /// Tear everything down. Safe to call twice.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        for sub in self.subscriptions.drain(..) {
            sub.hub.off(sub.kind, Some(&sub.handler));
        }
        self.controller.destroy();
        self.interface.destroy();
        self.assets.destroy();
        self.surface.borrow_mut().destroy();
        self.inbox.borrow_mut().clear();
        self.events.destroy();
        log::info!("Game destroyed");
    }

    fn main_menu(&self) -> Vec<MenuEntry> {
        vec![
            MenuEntry::new("start", Some(MenuAction::Start)),
            MenuEntry::new(
                format!("High score: {}", self.scoreboard.high_score()),
                Some(MenuAction::HighScore),
            ),
        ]
    }

    fn set_state(&mut self, state: GameState) {
        if self.state == state {
            return;
        }
        log::debug!("State {} -> {}", self.state.as_str(), state.as_str());
        self.state = state;
        self.controller
            .events()
            .fire(kinds::CHANGE, Payload::State(state));
        self.interface
            .events()
            .fire(kinds::CHANGE, Payload::State(state));
        self.events.fire(kinds::CHANGE, Payload::State(state));
    }

    fn publish_score(&self) {
        self.events
            .fire(kinds::SCORE, Payload::Score(self.scoreboard.snapshot()));
    }

    fn process_signals(&mut self) {
        loop {
            let next = self.inbox.borrow_mut().pop_front();
            let Some(signal) = next else {
                break;
            };
            if self.destroyed {
                break;
            }
            self.handle(signal);
        }
    }

    fn handle(&mut self, signal: Signal) {
        match signal {
            Signal::SurfaceReady => {
                self.join.succeed(SURFACE_SIGNAL);
                self.check_ready();
            }
            Signal::SurfaceFailed(message) => {
                self.join.fail(SURFACE_SIGNAL, message);
                self.check_ready();
            }
            Signal::AssetsSettled => {
                self.join.succeed(ASSETS_SIGNAL);
                self.check_ready();
            }
            Signal::AssetFailed(message) => {
                log::warn!("Continuing without asset: {}", message);
            }
            Signal::Click(point) => match self.state {
                GameState::Running => {
                    self.controller.trigger_canvas_event(point);
                }
                GameState::Selecting => {
                    self.interface.handle_click(point);
                }
                _ => {}
            },
            Signal::Resized => {
                self.controller.set_operation_area_info();
            }
            Signal::Goal if self.state == GameState::Running => {
                self.scoreboard.record_goal();
                self.publish_score();
            }
            Signal::Miss if self.state == GameState::Running => {
                let lost = self.scoreboard.record_miss();
                self.publish_score();
                if lost {
                    self.lose();
                }
            }
            Signal::Goal | Signal::Miss => {}
            Signal::Transition(Direction::Close) => {
                if self.state == GameState::Changing {
                    self.set_state(GameState::Running);
                }
            }
            Signal::Transition(Direction::Open) => {
                if self.state == GameState::Changing {
                    self.set_state(GameState::Selecting);
                }
            }
            Signal::Choose(MenuAction::Start) => self.start(),
            Signal::Choose(MenuAction::HighScore) => {
                log::info!("High score: {}", self.scoreboard.high_score());
                self.publish_score();
            }
        }
    }

    fn check_ready(&mut self) {
        if self.settled {
            return;
        }
        match self.join.state().clone() {
            Readiness::Pending => {}
            Readiness::Ready => {
                self.settled = true;
                self.controller.set_operation_area_info();
                log::info!("Surface and assets ready");
                self.events.fire(kinds::FINISH, Payload::None);
                self.select(true);
            }
            Readiness::Failed(message) => {
                self.settled = true;
                log::error!("Game failed to start: {}", message);
                self.events.fire(kinds::ERROR, Payload::Message(message));
            }
        }
    }

    /// The run is over: keep the best score and wipe the menu in
    fn lose(&mut self) {
        let promoted = self.scoreboard.settle();
        log::info!(
            "Run over with score {} (high score {}{})",
            self.scoreboard.score(),
            self.scoreboard.high_score(),
            if promoted { ", new" } else { "" }
        );
        if promoted {
            self.publish_score();
        }
        self.controller.reset();
        let menu = self.main_menu();
        self.interface.set_menu(menu);
        self.set_state(GameState::Changing);
        self.interface
            .start_evolution(self.now, self.transition_duration, Direction::Open);
    }
}

fn message_of(payload: &Payload) -> String {
    match payload {
        Payload::Message(message) => message.clone(),
        other => format!("{:?}", other),
    }
}
