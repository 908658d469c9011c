//! Menu interface
//!
//! One timed evolution drives two visual phases. Until the target time a grid
//! of square tiles is drawn with a stroke that grows (`Open`) or shrinks
//! (`Close`); once an opening wipe is over the static menu is drawn. `finish` is
//! fired once, on the first frame that reaches the target time, or right away
//! when the duration is not positive.
//!
//! Times are milliseconds on the host clock, durations are seconds.

use std::cell::Cell;
use std::rc::Rc;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::event::{EventHub, Payload, handler, kinds};
use crate::settings::Tuning;
use crate::sim::rect::Rect;
use crate::sim::state::{Direction, GameState};
use crate::surface::{StrokeStyle, TextStyle, SharedSurface};

/// What choosing a menu entry asks the facade to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MenuAction {
    Start,
    HighScore,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MenuEntry {
    pub label: String,
    pub action: Option<MenuAction>,
    /// Text box measured on the last menu render
    bounds: Option<Rect>,
}

impl MenuEntry {
    pub fn new(label: impl Into<String>, action: Option<MenuAction>) -> Self {
        Self {
            label: label.into(),
            action,
            bounds: None,
        }
    }

    pub fn bounds(&self) -> Option<Rect> {
        self.bounds
    }
}

#[derive(Debug, Clone, PartialEq)]
struct MenuStyle {
    horizontal_count: u32,
    background_color: String,
    text: TextStyle,
}

impl MenuStyle {
    fn from_tuning(tuning: &Tuning) -> Self {
        Self {
            horizontal_count: tuning.horizontal_count.max(1),
            background_color: tuning.menu_background_color.clone(),
            text: TextStyle {
                font: tuning.font_family.clone(),
                size: tuning.menu_font_size,
                color: tuning.menu_font_color.clone(),
            },
        }
    }
}

pub struct Interface {
    surface: Option<SharedSurface>,
    style: MenuStyle,
    start_time: f64,
    /// Host time of the previous frame
    frame_time: f64,
    /// Seconds
    during: f32,
    direction: Direction,
    menu: Vec<MenuEntry>,
    state: Rc<Cell<GameState>>,
    events: EventHub,
}

impl std::fmt::Debug for Interface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interface")
            .field("start_time", &self.start_time)
            .field("during", &self.during)
            .field("direction", &self.direction)
            .field("menu", &self.menu)
            .field("state", &self.state.get())
            .finish()
    }
}

impl Interface {
    pub fn new(surface: SharedSurface, tuning: &Tuning) -> Self {
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
            style: MenuStyle::from_tuning(tuning),
            start_time: 0.0,
            frame_time: 0.0,
            during: 0.0,
            direction: Direction::default(),
            menu: Vec::new(),
            state,
            events,
        }
    }

    /// Hub carrying `finish` and `choose` out, `change` in
    pub fn events(&self) -> &EventHub {
        &self.events
    }

    pub fn state(&self) -> GameState {
        self.state.get()
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Host time at which the running evolution ends
    pub fn target_time(&self) -> f64 {
        self.start_time + f64::from(self.during.max(0.0)) * 1000.0
    }

    /// Begin a tile-wipe at `start_time` lasting `during` seconds
    pub fn start_evolution(&mut self, start_time: f64, during: f32, direction: Direction) -> &mut Self {
        self.start_time = start_time;
        self.frame_time = start_time;
        self.during = during;
        self.direction = direction;
        log::debug!(
            "Tile-wipe {:?} from {} for {}s",
            direction,
            start_time,
            during
        );
        if !(during > 0.0) {
            self.events.fire(
                kinds::FINISH,
                Payload::Finished {
                    start_time,
                    direction,
                },
            );
        }
        self
    }

    pub fn set_menu(&mut self, menu: Vec<MenuEntry>) -> &mut Self {
        self.menu = menu;
        self
    }

    pub fn menu(&self) -> &[MenuEntry] {
        &self.menu
    }

    pub fn frame(&mut self, now: f64) -> &mut Self {
        if self.surface.is_none() {
            return self;
        }
        let target = self.target_time();
        if self.frame_time < target && now >= target {
            self.events.fire(
                kinds::FINISH,
                Payload::Finished {
                    start_time: self.start_time,
                    direction: self.direction,
                },
            );
        }
        if now < target {
            self.frame_animation(now);
        } else if self.direction == Direction::Open {
            // A finished close wipe leaves the scene uncovered
            self.frame_menu();
        }
        self.frame_time = now;
        self
    }

    /// Fire `choose` for the entry under `point`, only while selecting
    pub fn handle_click(&self, point: Vec2) -> Option<MenuAction> {
        if self.state.get() != GameState::Selecting {
            return None;
        }
        let action = self.menu.iter().find_map(|entry| {
            entry
                .bounds
                .filter(|b| b.contains(point))
                .and(entry.action)
        })?;
        log::debug!("Menu choice {:?}", action);
        self.events.fire(kinds::CHOOSE, Payload::Choose(action));
        Some(action)
    }

    pub fn is_destroyed(&self) -> bool {
        self.surface.is_none()
    }

    /// Drop the menu, the surface and every handler. Safe to call twice.
    pub fn destroy(&mut self) {
        self.surface = None;
        self.menu.clear();
        self.events.destroy();
    }

    fn frame_animation(&mut self, now: f64) {
        let Some(surface) = self.surface.as_ref() else {
            return;
        };
        if now <= self.start_time {
            return;
        }
        let mut canvas = surface.borrow_mut();
        let size = canvas.size();
        let columns = self.style.horizontal_count;
        let cell = (size.x / columns as f32).ceil();
        if !(cell > 0.0) {
            return;
        }
        let rows = (size.y / cell).ceil() as u32;

        let remaining = ((self.target_time() - now) / (f64::from(self.during) * 1000.0)) as f32;
        let coverage = match self.direction {
            Direction::Close => remaining,
            Direction::Open => 1.0 - remaining,
        };
        let stroke = StrokeStyle {
            color: self.style.background_color.clone(),
            width: coverage.clamp(0.0, 1.0) * cell / 2.0,
        };

        for row in 0..rows {
            for column in 0..columns {
                let origin = Vec2::new(column as f32 * cell, row as f32 * cell);
                canvas.draw_stroke_rect(Rect::from_origin_size(origin, cell, cell), &stroke);
            }
        }
    }

    fn frame_menu(&mut self) {
        let Some(surface) = self.surface.as_ref() else {
            return;
        };
        let mut canvas = surface.borrow_mut();
        let size = canvas.size();
        canvas.draw_fill_rect(
            Rect::from_origin_size(Vec2::ZERO, size.x, size.y),
            &self.style.background_color,
        );

        let total = self.menu.len() as f32;
        let font_size = self.style.text.size;
        for (index, entry) in self.menu.iter_mut().enumerate() {
            let text_width = canvas.measure_text(&entry.label, &self.style.text);
            let origin = Vec2::new(
                size.x / 2.0 - text_width / 2.0,
                size.y / (total + 1.0) * (index as f32 + 1.0) - font_size / 2.0,
            );
            entry.bounds = Some(Rect::from_origin_size(origin, text_width, font_size));
            canvas.draw_fill_text(origin, &entry.label, &self.style.text);
        }
    }
}
