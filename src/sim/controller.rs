//! Game loop controller
//!
//! Owns the operational area and the globe population. Each frame it draws
//! the background, decides whether a new globe is due, advances and draws
//! every tracked globe or burst, then settles whatever the entities reported
//! while they were being updated (misses, clicks, finished bursts).
//!
//! Entity handlers never touch the controller directly: they push a `Signal`
//! into a shared inbox which is drained after the pass.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::area::AreaSpec;
use super::globe::{Globe, random_color};
use super::kinetic::KineticConfig;
use super::pop::{Pop, PopOptions};
use super::population::{GlobeSlot, Population};
use super::rect::{Coordinate, Rect};
use super::state::{GameState, GlobeId};
use crate::assets::AssetLoader;
use crate::consts::BACKGROUND_IMAGE;
use crate::event::{EventHub, Payload, handler, kinds};
use crate::settings::{GameOptions, Tuning};
use crate::surface::{RenderSurface, SharedSurface};

/// Something an entity reported during a pass
#[derive(Debug, Clone, Copy, PartialEq)]
enum Signal {
    Moved { id: GlobeId, to: Vec2 },
    Clicked(GlobeId),
    PopFinished(GlobeId),
}

type Inbox = Rc<RefCell<VecDeque<Signal>>>;

pub struct Controller {
    surface: Option<SharedSurface>,
    assets: Option<AssetLoader>,
    tuning: Tuning,
    area_spec: AreaSpec,
    area: Option<Rect>,
    population: Population,
    rng: Pcg32,
    /// Seconds of active play since the last reset
    run_time: f32,
    state: Rc<Cell<GameState>>,
    inbox: Inbox,
    events: EventHub,
}

impl std::fmt::Debug for Controller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("area", &self.area)
            .field("population", &self.population)
            .field("run_time", &self.run_time)
            .field("state", &self.state.get())
            .finish()
    }
}

impl Controller {
    pub fn new(
        surface: SharedSurface,
        assets: Option<AssetLoader>,
        options: &GameOptions,
        seed: u64,
    ) -> Self {
        let state = Rc::new(Cell::new(GameState::default()));
        let events = EventHub::new();
        {
            let state = state.clone();
            events.on(
                kinds::CHANGE,
                handler(move |e| {
                    if let Payload::State(next) = e.payload {
                        state.set(next);
                    }
                }),
            );
        }

        Self {
            surface: Some(surface),
            assets,
            tuning: options.tuning.clone(),
            area_spec: AreaSpec::from_options(options),
            area: None,
            population: Population::new(),
            rng: Pcg32::seed_from_u64(seed),
            run_time: 0.0,
            state,
            inbox: Rc::new(RefCell::new(VecDeque::new())),
            events,
        }
    }

    /// Hub carrying `goal` and `miss` out, `change` in
    pub fn events(&self) -> &EventHub {
        &self.events
    }

    pub fn state(&self) -> GameState {
        self.state.get()
    }

    pub fn area(&self) -> Option<Rect> {
        self.area
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    pub fn run_time(&self) -> f32 {
        self.run_time
    }

    /// Recompute the operational area from the current surface size
    pub fn set_operation_area_info(&mut self) -> Option<Rect> {
        let size = self.surface.as_ref()?.borrow().size();
        let area = self.area_spec.resolve(size);
        log::debug!(
            "Operational area {:?} -> {:?} inside {}x{}",
            area.min,
            area.max,
            size.x,
            size.y
        );
        self.area = Some(area);
        self.area
    }

    /// Track a new globe when every tracked one has cleared the top edge
    pub fn update_globes_info(&mut self) -> Option<GlobeId> {
        let area = self.area?;
        if !self.population.spawn_due(area.top()) {
            return None;
        }
        let id = self.population.allocate();
        log::debug!("Globe {} due", id);
        Some(id)
    }

    /// Draw one frame and, when `is_update_globes`, advance the simulation by `span` seconds
    pub fn frame(&mut self, span: f32, is_update_globes: bool) {
        let Some(surface) = self.surface.clone() else {
            return;
        };
        let area = match self.area {
            Some(area) => area,
            None => match self.set_operation_area_info() {
                Some(area) => area,
                None => return,
            },
        };

        let mut canvas = surface.borrow_mut();
        self.draw_background(&mut *canvas, area);

        if is_update_globes {
            self.run_time += span.max(0.0);
            self.update_globes_info();
        }

        for id in self.population.ids() {
            if is_update_globes && self.population.is_prepared(id) {
                self.instantiate(id, area);
            }
            match self.population.get_mut(id) {
                Some(GlobeSlot::Exist(globe)) => {
                    if is_update_globes {
                        globe.update(span);
                    }
                    globe.display(&mut *canvas);
                }
                Some(GlobeSlot::Destroyed { pop: Some(pop) }) => {
                    if is_update_globes {
                        pop.update(span);
                    }
                    pop.display(&mut *canvas);
                }
                _ => {}
            }
        }
        drop(canvas);

        self.process_signals();
    }

    /// Route a raw click to the topmost touched globe
    pub fn trigger_canvas_event(&mut self, point: Vec2) -> Option<GlobeId> {
        let id = self.population.topmost_hit(point, self.tuning.touch_buffer)?;
        if let Some(globe) = self.population.globe(id) {
            globe.events().fire(kinds::CLICK, Payload::Point(point));
        }
        self.process_signals();
        Some(id)
    }

    /// Spawn a globe at `coordinate` right away, bypassing the spawn policy
    pub fn spawn_at(&mut self, coordinate: Coordinate) -> GlobeId {
        let id = self.population.allocate();
        self.place(id, coordinate);
        id
    }

    /// Destroy every globe and burst. Score counters are not touched.
    pub fn reset(&mut self) {
        self.population.clear();
        self.inbox.borrow_mut().clear();
        self.run_time = 0.0;
        log::debug!("Controller reset");
    }

    pub fn is_destroyed(&self) -> bool {
        self.surface.is_none()
    }

    /// Release the population, the surface and every handler. Safe to call twice.
    pub fn destroy(&mut self) {
        if self.surface.is_none() {
            return;
        }
        self.reset();
        self.events.destroy();
        self.surface = None;
        self.assets = None;
        self.area = None;
    }

    fn draw_background(&self, canvas: &mut dyn RenderSurface, area: Rect) {
        let size = canvas.size();
        canvas.clear();
        canvas.draw_fill_rect(
            Rect::from_origin_size(Vec2::ZERO, size.x, size.y),
            &self.tuning.background_color,
        );
        let has_image = self
            .assets
            .as_ref()
            .map(|a| a.is_loaded(BACKGROUND_IMAGE))
            .unwrap_or(false);
        if has_image {
            canvas.draw_image(area, BACKGROUND_IMAGE);
        } else {
            canvas.draw_fill_rect(area, &self.tuning.area_color);
        }
    }

    /// Build a prepared globe just above the top edge at a random x
    fn instantiate(&mut self, id: GlobeId, area: Rect) {
        let radius = self.tuning.globe_radius;
        let (low, high) = (area.left() + radius, area.right() - radius);
        let x = if high > low {
            self.rng.random_range(low..=high)
        } else {
            area.center().x
        };
        self.place(id, Vec2::new(x, area.top() - radius));
    }

    fn place(&mut self, id: GlobeId, coordinate: Coordinate) {
        let config = KineticConfig {
            y_speed: self.tuning.spawn_speed(self.run_time),
            y_max_speed: self.tuning.globe_max_speed,
            ..Default::default()
        };
        let color = random_color(&mut self.rng);
        let globe = Globe::new(id, coordinate, self.tuning.globe_radius, color, config);

        let inbox = self.inbox.clone();
        globe.events().on(
            kinds::MOVED,
            handler(move |e| {
                if let Payload::Moved { to, .. } = e.payload {
                    inbox.borrow_mut().push_back(Signal::Moved { id, to });
                }
            }),
        );
        let (inbox, state) = (self.inbox.clone(), self.state.clone());
        globe.events().on(
            kinds::CLICK,
            handler(move |_| {
                if state.get() == GameState::Running {
                    inbox.borrow_mut().push_back(Signal::Clicked(id));
                }
            }),
        );

        log::trace!("Globe {} spawned at {:?}", id, coordinate);
        self.population.set(id, GlobeSlot::Exist(globe));
        self.population.register_clickable(id);
    }

    fn process_signals(&mut self) {
        loop {
            let next = self.inbox.borrow_mut().pop_front();
            let Some(signal) = next else {
                break;
            };
            match signal {
                Signal::Moved { id, to } => self.check_miss(id, to),
                Signal::Clicked(id) => self.goal(id),
                Signal::PopFinished(id) => {
                    if matches!(self.population.get(id), Some(GlobeSlot::Destroyed { .. })) {
                        self.population.remove(id);
                    }
                }
            }
        }
    }

    fn check_miss(&mut self, id: GlobeId, to: Vec2) {
        let Some(area) = self.area else {
            return;
        };
        let Some(globe) = self.population.globe(id) else {
            return;
        };
        if to.y - globe.radius() <= area.bottom() {
            return;
        }
        if let Some(GlobeSlot::Exist(mut globe)) = self.population.remove(id) {
            globe.destroy();
        }
        log::debug!("Globe {} missed", id);
        self.events.fire(kinds::MISS, Payload::Globe(id));
    }

    fn goal(&mut self, id: GlobeId) {
        let Some(globe) = self.population.globe(id) else {
            return;
        };
        let Some(at) = globe.coordinate() else {
            return;
        };
        let pop = Pop::new(
            at,
            PopOptions {
                color: globe.color().to_owned(),
                ..self.tuning.pop.clone()
            },
        );
        let inbox = self.inbox.clone();
        pop.events().once(
            kinds::FINISH,
            handler(move |_| inbox.borrow_mut().push_back(Signal::PopFinished(id))),
        );

        self.population.unregister_clickable(id);
        if let Some(GlobeSlot::Exist(globe)) = self.population.get_mut(id) {
            globe.destroy();
        }
        self.population
            .set(id, GlobeSlot::Destroyed { pop: Some(pop) });
        log::debug!("Globe {} collected", id);
        self.events.fire(kinds::GOAL, Payload::Globe(id));
    }
}
