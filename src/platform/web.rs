//! Browser bindings (wasm32 only)
//!
//! - `CanvasSurface`: a `<canvas>` appended to the container, drawn with the 2D context
//! - `HtmlImageBackend`: `<img>` based image loading for `AssetLoader`
//! - `RafScheduler`: requestAnimationFrame frame scheduling
//! - `mount`: builds a running game inside a container selector

use std::cell::RefCell;
use std::f64::consts::TAU;
use std::rc::Rc;

use glam::Vec2;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    CanvasRenderingContext2d, Element, EventTarget, HtmlCanvasElement, HtmlImageElement,
    MouseEvent,
};

use super::frame::{FrameCallback, FrameHandle, FrameScheduler, GameLoop};
use crate::assets::{AssetLoader, ImageBackend, LoadReply};
use crate::error::GameError;
use crate::event::{EventHub, Payload, kinds};
use crate::game::Game;
use crate::settings::GameOptions;
use crate::sim::rect::Rect;
use crate::surface::{RenderSurface, StrokeStyle, TextStyle};
use crate::task::TaskQueue;

const CANVAS_CLASS: &str = "collect-energy-canvas";

struct Listener {
    target: EventTarget,
    kind: &'static str,
    closure: Closure<dyn FnMut(web_sys::Event)>,
}

/// Canvas 2D render surface
pub struct CanvasSurface {
    container: Option<Element>,
    canvas: Option<HtmlCanvasElement>,
    context: Option<CanvasRenderingContext2d>,
    assets: Option<AssetLoader>,
    listeners: Vec<Listener>,
    events: EventHub,
}

impl CanvasSurface {
    /// Create a canvas inside the element matching `selector`.
    ///
    /// Readiness is reported on the next pump of `queue`: `finish` on
    /// success, `error` with a message when the container can not be found
    /// or the canvas can not be set up.
    pub fn mount(selector: &str, queue: &TaskQueue, assets: AssetLoader) -> Rc<RefCell<Self>> {
        let surface = Rc::new(RefCell::new(Self {
            container: None,
            canvas: None,
            context: None,
            assets: Some(assets),
            listeners: Vec::new(),
            events: EventHub::new(),
        }));

        let result = surface.borrow_mut().attach(selector);
        let events = surface.borrow().events.clone();
        match result {
            Ok(()) => {
                events.postpone_fire(queue, kinds::FINISH, Payload::None, 0.0);
            }
            Err(err) => {
                log::error!("{}", err);
                events.postpone_fire(queue, kinds::ERROR, Payload::Message(err.to_string()), 0.0);
            }
        }
        surface
    }

    fn attach(&mut self, selector: &str) -> Result<(), GameError> {
        let mount_error = || GameError::Mount {
            selector: selector.to_owned(),
        };
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| GameError::Surface("no document".into()))?;
        let container = document
            .query_selector(selector)
            .ok()
            .flatten()
            .ok_or_else(mount_error)?;

        let canvas: HtmlCanvasElement = document
            .create_element("canvas")
            .map_err(|e| GameError::Surface(format!("{:?}", e)))?
            .dyn_into()
            .map_err(|_| GameError::Surface("created element is not a canvas".into()))?;
        let _ = canvas.class_list().add_1(CANVAS_CLASS);
        fit_to(&canvas, &container);
        container
            .append_child(&canvas)
            .map_err(|e| GameError::Surface(format!("{:?}", e)))?;

        let context: CanvasRenderingContext2d = canvas
            .get_context("2d")
            .ok()
            .flatten()
            .ok_or_else(|| GameError::Surface("2d context unavailable".into()))?
            .dyn_into()
            .map_err(|_| GameError::Surface("unexpected context type".into()))?;

        self.listen_click(&canvas);
        self.listen_resize(&canvas, &container);
        self.container = Some(container);
        self.canvas = Some(canvas);
        self.context = Some(context);
        Ok(())
    }

    fn listen_click(&mut self, canvas: &HtmlCanvasElement) {
        let events = self.events.clone();
        let target = canvas.clone();
        let closure = Closure::<dyn FnMut(web_sys::Event)>::new(move |event: web_sys::Event| {
            let Ok(mouse) = event.dyn_into::<MouseEvent>() else {
                return;
            };
            let bounds = target.get_bounding_client_rect();
            let point = Vec2::new(
                (f64::from(mouse.client_x()) - bounds.left()) as f32,
                (f64::from(mouse.client_y()) - bounds.top()) as f32,
            );
            events.fire(kinds::CLICK, Payload::Point(point));
        });
        self.add_listener(canvas.clone().into(), "click", closure);
    }

    fn listen_resize(&mut self, canvas: &HtmlCanvasElement, container: &Element) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let events = self.events.clone();
        let (canvas, container) = (canvas.clone(), container.clone());
        let closure = Closure::<dyn FnMut(web_sys::Event)>::new(move |_event: web_sys::Event| {
            fit_to(&canvas, &container);
            events.fire(
                kinds::RESIZED,
                Payload::Size {
                    width: canvas.width() as f32,
                    height: canvas.height() as f32,
                },
            );
        });
        self.add_listener(window.into(), "resize", closure);
    }

    fn add_listener(
        &mut self,
        target: EventTarget,
        kind: &'static str,
        closure: Closure<dyn FnMut(web_sys::Event)>,
    ) {
        if target
            .add_event_listener_with_callback(kind, closure.as_ref().unchecked_ref())
            .is_ok()
        {
            self.listeners.push(Listener {
                target,
                kind,
                closure,
            });
        }
    }

    fn fill_style(&self, color: &str) -> Option<&CanvasRenderingContext2d> {
        let context = self.context.as_ref()?;
        context.set_fill_style_str(color);
        Some(context)
    }
}

fn fit_to(canvas: &HtmlCanvasElement, container: &Element) {
    canvas.set_width(container.client_width().max(0) as u32);
    canvas.set_height(container.client_height().max(0) as u32);
}

impl RenderSurface for CanvasSurface {
    fn size(&self) -> Vec2 {
        self.canvas
            .as_ref()
            .map(|c| Vec2::new(c.width() as f32, c.height() as f32))
            .unwrap_or(Vec2::ZERO)
    }

    fn clear(&mut self) {
        let size = self.size();
        if let Some(context) = self.context.as_ref() {
            context.clear_rect(0.0, 0.0, f64::from(size.x), f64::from(size.y));
        }
    }

    fn draw_fill_rect(&mut self, rect: Rect, color: &str) {
        if let Some(context) = self.fill_style(color) {
            context.fill_rect(
                f64::from(rect.left()),
                f64::from(rect.top()),
                f64::from(rect.width()),
                f64::from(rect.height()),
            );
        }
    }

    fn draw_stroke_rect(&mut self, rect: Rect, style: &StrokeStyle) {
        if let Some(context) = self.context.as_ref() {
            context.set_stroke_style_str(&style.color);
            context.set_line_width(f64::from(style.width));
            context.stroke_rect(
                f64::from(rect.left()),
                f64::from(rect.top()),
                f64::from(rect.width()),
                f64::from(rect.height()),
            );
        }
    }

    fn draw_fill_circle(&mut self, center: Vec2, radius: f32, color: &str) {
        if let Some(context) = self.fill_style(color) {
            context.begin_path();
            if context
                .arc(f64::from(center.x), f64::from(center.y), f64::from(radius), 0.0, TAU)
                .is_ok()
            {
                context.fill();
            }
        }
    }

    fn draw_image(&mut self, rect: Rect, image: &str) {
        let (Some(context), Some(assets)) = (self.context.as_ref(), self.assets.as_ref()) else {
            return;
        };
        let Some(source) = assets.get_image_source(image) else {
            return;
        };
        if let Some(img) = source.downcast_ref::<HtmlImageElement>() {
            let drawn = context.draw_image_with_html_image_element_and_dw_and_dh(
                img,
                f64::from(rect.left()),
                f64::from(rect.top()),
                f64::from(rect.width()),
                f64::from(rect.height()),
            );
            if drawn.is_err() {
                log::warn!("Could not draw image '{}'", image);
            }
        }
    }

    fn draw_fill_text(&mut self, origin: Vec2, text: &str, style: &TextStyle) {
        if let Some(context) = self.fill_style(&style.color) {
            context.set_font(&style.css_font());
            context.set_text_baseline("top");
            let _ = context.fill_text(text, f64::from(origin.x), f64::from(origin.y));
        }
    }

    fn measure_text(&self, text: &str, style: &TextStyle) -> f32 {
        let Some(context) = self.context.as_ref() else {
            return 0.0;
        };
        context.set_font(&style.css_font());
        context
            .measure_text(text)
            .map(|m| m.width() as f32)
            .unwrap_or(0.0)
    }

    fn events(&self) -> &EventHub {
        &self.events
    }

    fn destroy(&mut self) {
        for listener in self.listeners.drain(..) {
            let _ = listener.target.remove_event_listener_with_callback(
                listener.kind,
                listener.closure.as_ref().unchecked_ref(),
            );
        }
        if let Some(canvas) = self.canvas.take() {
            canvas.remove();
        }
        self.context = None;
        self.container = None;
        self.assets = None;
        self.events.destroy();
    }
}

/// Loads images through `<img>` elements
#[derive(Debug, Default)]
pub struct HtmlImageBackend;

impl ImageBackend for HtmlImageBackend {
    fn request(&self, name: &str, url: &str, reply: LoadReply) {
        let image = match HtmlImageElement::new() {
            Ok(image) => image,
            Err(e) => {
                log::warn!("Could not create <img> for '{}': {:?}", name, e);
                reply.fail();
                return;
            }
        };
        // onload and onerror share the reply; whichever runs first consumes it
        let reply = Rc::new(RefCell::new(Some(reply)));

        let (loaded, on_load_reply) = (image.clone(), reply.clone());
        let on_load = Closure::<dyn FnMut()>::new(move || {
            if let Some(reply) = on_load_reply.borrow_mut().take() {
                reply.succeed(Rc::new(loaded.clone()));
            }
        });
        let on_error = Closure::<dyn FnMut()>::new(move || {
            if let Some(reply) = reply.borrow_mut().take() {
                reply.fail();
            }
        });
        image.set_onload(Some(on_load.as_ref().unchecked_ref()));
        image.set_onerror(Some(on_error.as_ref().unchecked_ref()));
        on_load.forget();
        on_error.forget();
        image.set_src(url);
    }
}

/// requestAnimationFrame scheduling
#[derive(Debug, Default)]
pub struct RafScheduler;

impl FrameScheduler for RafScheduler {
    fn request(&self, callback: FrameCallback) -> FrameHandle {
        let Some(window) = web_sys::window() else {
            return FrameHandle(0);
        };
        let closure = Closure::once_into_js(move |time: f64| callback(time));
        match window.request_animation_frame(closure.unchecked_ref()) {
            Ok(id) => FrameHandle(id as u64),
            Err(e) => {
                log::error!("requestAnimationFrame failed: {:?}", e);
                FrameHandle(0)
            }
        }
    }

    fn cancel(&self, handle: FrameHandle) {
        if let Some(window) = web_sys::window() {
            let _ = window.cancel_animation_frame(handle.0 as i32);
        }
    }
}

/// A game mounted in the page together with its frame loop
pub struct MountedGame {
    pub game: Rc<RefCell<Game>>,
    pub frame_loop: GameLoop,
}

/// Mount a game inside `options.container` and start its frame loop.
/// Failures surface asynchronously through the game's `error` event.
pub fn mount(mut options: GameOptions) -> MountedGame {
    if options.tuning.seed.is_none() {
        options.tuning.seed = Some(js_sys::Date::now() as u64);
    }
    let queue = TaskQueue::new();
    let assets = AssetLoader::new(HtmlImageBackend);
    let surface = CanvasSurface::mount(&options.container, &queue, assets.clone());
    let game = Rc::new(RefCell::new(Game::new(options, surface, assets, queue)));

    let frame_loop = GameLoop::new(game.clone(), Rc::new(RafScheduler));
    frame_loop.start();
    MountedGame { game, frame_loop }
}
