//! Render surface contract
//!
//! The game loop and the menu only ever talk to a `RenderSurface`: a handful
//! of 2D drawing primitives, a size query and an event hub carrying
//! `resized`, `click`, and the one-shot readiness signals `finish` / `error`
//! (fired asynchronously after construction).
//!
//! `RecordingSurface` is the headless implementation used by tests and the
//! native demo; the browser canvas lives in `platform::web`.

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec2;

use crate::event::{EventHub, Payload, kinds};
use crate::sim::rect::Rect;
use crate::task::TaskQueue;

/// Outline style for `draw_stroke_rect`
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeStyle {
    pub color: String,
    pub width: f32,
}

/// Font style for text drawing and measuring
#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub font: String,
    pub size: f32,
    pub color: String,
}

impl TextStyle {
    /// CSS font shorthand, e.g. `32px sans-serif`
    pub fn css_font(&self) -> String {
        format!("{}px {}", self.size, self.font)
    }
}

/// Drawing primitives + size, consumed by the controller and the menu
pub trait RenderSurface {
    /// Current (width, height) in pixels
    fn size(&self) -> Vec2;
    fn clear(&mut self);
    fn draw_fill_rect(&mut self, rect: Rect, color: &str);
    fn draw_stroke_rect(&mut self, rect: Rect, style: &StrokeStyle);
    fn draw_fill_circle(&mut self, center: Vec2, radius: f32, color: &str);
    /// Draw a loaded image (by asset name) stretched over `rect`
    fn draw_image(&mut self, rect: Rect, image: &str);
    /// Draw text with its top-left corner at `origin`
    fn draw_fill_text(&mut self, origin: Vec2, text: &str, style: &TextStyle);
    /// Rendered width of `text`
    fn measure_text(&self, text: &str, style: &TextStyle) -> f32;
    /// Hub for `resized`, `click`, `finish` and `error`
    fn events(&self) -> &EventHub;
    /// Release the underlying surface. Safe to call twice.
    fn destroy(&mut self) {}
}

pub type SharedSurface = Rc<RefCell<dyn RenderSurface>>;

/// One recorded draw call
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear,
    FillRect { rect: Rect, color: String },
    StrokeRect { rect: Rect, color: String, width: f32 },
    FillCircle { center: Vec2, radius: f32, color: String },
    Image { rect: Rect, name: String },
    FillText { origin: Vec2, text: String, size: f32 },
}

/// Headless surface that records draw calls
#[derive(Debug)]
pub struct RecordingSurface {
    size: Vec2,
    commands: Vec<DrawCommand>,
    events: EventHub,
    destroyed: bool,
}

impl RecordingSurface {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            size: Vec2::new(width, height),
            commands: Vec::new(),
            events: EventHub::new(),
            destroyed: false,
        }
    }

    /// Report readiness on the next pump of `queue`, like a mounted canvas would
    pub fn mount(&self, queue: &TaskQueue) {
        self.events
            .postpone_fire(queue, kinds::FINISH, Payload::None, 0.0);
    }

    /// Report a mount failure on the next pump of `queue`
    pub fn fail_mount(&self, queue: &TaskQueue, message: &str) {
        self.events.postpone_fire(
            queue,
            kinds::ERROR,
            Payload::Message(message.to_owned()),
            0.0,
        );
    }

    pub fn shared(self) -> Rc<RefCell<RecordingSurface>> {
        Rc::new(RefCell::new(self))
    }

    /// Change size and fire `resized`
    pub fn resize(&mut self, width: f32, height: f32) {
        self.size = Vec2::new(width, height);
        self.events
            .fire(kinds::RESIZED, Payload::Size { width, height });
    }

    /// Simulate a pointer click at surface coordinates
    pub fn click(&self, x: f32, y: f32) {
        self.events.fire(kinds::CLICK, Payload::Point(Vec2::new(x, y)));
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    fn record(&mut self, command: DrawCommand) {
        if !self.destroyed {
            self.commands.push(command);
        }
    }
}

impl RenderSurface for RecordingSurface {
    fn size(&self) -> Vec2 {
        self.size
    }

    fn clear(&mut self) {
        self.record(DrawCommand::Clear);
    }

    fn draw_fill_rect(&mut self, rect: Rect, color: &str) {
        self.record(DrawCommand::FillRect {
            rect,
            color: color.to_owned(),
        });
    }

    fn draw_stroke_rect(&mut self, rect: Rect, style: &StrokeStyle) {
        self.record(DrawCommand::StrokeRect {
            rect,
            color: style.color.clone(),
            width: style.width,
        });
    }

    fn draw_fill_circle(&mut self, center: Vec2, radius: f32, color: &str) {
        self.record(DrawCommand::FillCircle {
            center,
            radius,
            color: color.to_owned(),
        });
    }

    fn draw_image(&mut self, rect: Rect, image: &str) {
        self.record(DrawCommand::Image {
            rect,
            name: image.to_owned(),
        });
    }

    fn draw_fill_text(&mut self, origin: Vec2, text: &str, style: &TextStyle) {
        self.record(DrawCommand::FillText {
            origin,
            text: text.to_owned(),
            size: style.size,
        });
    }

    /// Monospace approximation: half an em per character
    fn measure_text(&self, text: &str, style: &TextStyle) -> f32 {
        text.chars().count() as f32 * style.size * 0.5
    }

    fn events(&self) -> &EventHub {
        &self.events
    }

    fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        self.commands.clear();
        self.events.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::handler;
    use std::cell::Cell;

    #[test]
    fn test_mount_signals_asynchronously() {
        let queue = TaskQueue::new();
        let surface = RecordingSurface::new(400.0, 300.0);
        let ready = Rc::new(Cell::new(false));
        let flag = ready.clone();
        surface
            .events()
            .once(kinds::FINISH, handler(move |_| flag.set(true)));

        surface.mount(&queue);
        assert!(!ready.get());
        queue.run_due(0.0);
        assert!(ready.get());
    }

    #[test]
    fn test_resize_fires_event() {
        let mut surface = RecordingSurface::new(400.0, 300.0);
        let seen = Rc::new(RefCell::new(None));
        let s = seen.clone();
        surface
            .events()
            .on(kinds::RESIZED, handler(move |e| *s.borrow_mut() = Some(e.payload.clone())));

        surface.resize(800.0, 600.0);
        assert_eq!(surface.size(), Vec2::new(800.0, 600.0));
        assert_eq!(
            *seen.borrow(),
            Some(Payload::Size {
                width: 800.0,
                height: 600.0
            })
        );
    }

    #[test]
    fn test_destroy_stops_recording() {
        let mut surface = RecordingSurface::new(10.0, 10.0);
        surface.clear();
        surface.destroy();
        surface.destroy();
        surface.clear();
        assert!(surface.commands().is_empty());
        assert!(surface.is_destroyed());
    }
}
