//! Image asset loader
//!
//! Tracks named images through loading → success | error. Fires `load` per
//! successful image, `error` per failed one, and `finish` whenever no image is
//! left loading. The actual fetching is delegated to an `ImageBackend`
//! (`<img>` elements in the browser, a queued fake natively).

use std::any::Any;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};
use std::rc::{Rc, Weak};

use crate::error::GameError;
use crate::event::{EventHub, Payload, kinds};
use crate::task::TaskQueue;

/// Opaque loaded bitmap; the surface that drew it knows the concrete type
pub type ImageSource = Rc<dyn Any>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetState {
    Loading,
    Success,
    Error,
}

/// Fetches images on behalf of the loader
pub trait ImageBackend {
    /// Start fetching `url`; must answer through `reply` exactly once
    fn request(&self, name: &str, url: &str, reply: LoadReply);
}

/// Completion handle passed to an `ImageBackend`
pub struct LoadReply {
    loader: Weak<LoaderInner>,
    name: String,
}

impl LoadReply {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn succeed(self, image: ImageSource) {
        if let Some(inner) = self.loader.upgrade() {
            AssetLoader { inner }.complete(&self.name, Ok(image));
        }
    }

    pub fn fail(self) {
        if let Some(inner) = self.loader.upgrade() {
            AssetLoader { inner }.complete(&self.name, Err(()));
        }
    }
}

struct AssetInfo {
    url: String,
    state: AssetState,
    image: Option<ImageSource>,
}

struct LoaderInner {
    /// None once destroyed
    assets: RefCell<Option<BTreeMap<String, AssetInfo>>>,
    events: EventHub,
    backend: Box<dyn ImageBackend>,
}

/// Named image loader (clones share state)
#[derive(Clone)]
pub struct AssetLoader {
    inner: Rc<LoaderInner>,
}

impl AssetLoader {
    pub fn new(backend: impl ImageBackend + 'static) -> Self {
        Self {
            inner: Rc::new(LoaderInner {
                assets: RefCell::new(Some(BTreeMap::new())),
                events: EventHub::new(),
                backend: Box::new(backend),
            }),
        }
    }

    pub fn events(&self) -> &EventHub {
        &self.inner.events
    }

    /// Submit `url` under `name`. Repeated calls for a loading or loaded
    /// name are no-ops; a failed name is requested again.
    pub fn load(&self, name: &str, url: &str) -> &Self {
        {
            let mut assets = self.inner.assets.borrow_mut();
            let Some(assets) = assets.as_mut() else {
                return self;
            };
            if let Some(info) = assets.get(name) {
                if info.state != AssetState::Error {
                    return self;
                }
            }
            assets.insert(
                name.to_owned(),
                AssetInfo {
                    url: url.to_owned(),
                    state: AssetState::Loading,
                    image: None,
                },
            );
        }

        log::debug!("Loading image '{}' from {}", name, url);
        let reply = LoadReply {
            loader: Rc::downgrade(&self.inner),
            name: name.to_owned(),
        };
        self.inner.backend.request(name, url, reply);
        self
    }

    fn complete(&self, name: &str, result: Result<ImageSource, ()>) {
        let url = {
            let mut assets = self.inner.assets.borrow_mut();
            let Some(info) = assets.as_mut().and_then(|a| a.get_mut(name)) else {
                return;
            };
            if info.state != AssetState::Loading {
                return;
            }
            match result {
                Ok(image) => {
                    info.state = AssetState::Success;
                    info.image = Some(image);
                }
                Err(()) => info.state = AssetState::Error,
            }
            info.url.clone()
        };

        match self.state(name) {
            Some(AssetState::Success) => {
                self.inner.events.fire(
                    kinds::LOAD,
                    Payload::Asset {
                        name: name.to_owned(),
                        url,
                    },
                );
            }
            _ => {
                let err = GameError::Asset {
                    name: name.to_owned(),
                    url,
                };
                log::warn!("{}", err);
                self.inner
                    .events
                    .fire(kinds::ERROR, Payload::Message(err.to_string()));
            }
        }
        self.check_finish();
    }

    /// Fire `finish` if nothing is left loading
    fn check_finish(&self) -> bool {
        let complete = self
            .inner
            .assets
            .borrow()
            .as_ref()
            .map(|a| a.values().all(|info| info.state != AssetState::Loading))
            .unwrap_or(false);
        if complete {
            self.inner.events.fire(kinds::FINISH, Payload::None);
        }
        complete
    }

    pub fn state(&self, name: &str) -> Option<AssetState> {
        self.inner
            .assets
            .borrow()
            .as_ref()
            .and_then(|a| a.get(name))
            .map(|info| info.state)
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        self.state(name) == Some(AssetState::Success)
    }

    /// True when nothing is loading (vacuously true with no assets)
    pub fn is_settled(&self) -> bool {
        self.inner
            .assets
            .borrow()
            .as_ref()
            .map(|a| a.values().all(|info| info.state != AssetState::Loading))
            .unwrap_or(true)
    }

    /// The loaded bitmap for `name`, if it loaded successfully
    pub fn get_image_source(&self, name: &str) -> Option<ImageSource> {
        self.inner
            .assets
            .borrow()
            .as_ref()
            .and_then(|a| a.get(name))
            .and_then(|info| info.image.clone())
    }

    /// Forget every asset and drop handlers. Safe to call twice.
    pub fn destroy(&self) {
        self.inner.assets.borrow_mut().take();
        self.inner.events.destroy();
    }
}

/// Placeholder bitmap produced by `QueuedImageBackend`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderImage {
    pub url: String,
}

/// Backend that answers on the next pump of a task queue.
/// URLs listed in `failing` report an error instead.
pub struct QueuedImageBackend {
    queue: TaskQueue,
    failing: HashSet<String>,
}

impl QueuedImageBackend {
    pub fn new(queue: &TaskQueue) -> Self {
        Self {
            queue: queue.clone(),
            failing: HashSet::new(),
        }
    }

    pub fn with_failing(mut self, url: &str) -> Self {
        self.failing.insert(url.to_owned());
        self
    }
}

impl ImageBackend for QueuedImageBackend {
    fn request(&self, _name: &str, url: &str, reply: LoadReply) {
        let fail = self.failing.contains(url);
        let url = url.to_owned();
        self.queue.schedule(0.0, move || {
            if fail {
                reply.fail();
            } else {
                reply.succeed(Rc::new(PlaceholderImage { url }));
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::handler;
    use std::cell::Cell;

    fn recorder(loader: &AssetLoader, kind: &str) -> Rc<RefCell<Vec<Payload>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        loader
            .events()
            .on(kind, handler(move |e| s.borrow_mut().push(e.payload.clone())));
        seen
    }

    #[test]
    fn test_load_success_and_finish() {
        let queue = TaskQueue::new();
        let loader = AssetLoader::new(QueuedImageBackend::new(&queue));
        let loads = recorder(&loader, kinds::LOAD);
        let finishes = recorder(&loader, kinds::FINISH);

        loader.load("background", "bg.png");
        assert_eq!(loader.state("background"), Some(AssetState::Loading));
        assert!(loader.get_image_source("background").is_none());

        queue.run_due(0.0);
        assert!(loader.is_loaded("background"));
        assert_eq!(loads.borrow().len(), 1);
        assert_eq!(finishes.borrow().len(), 1);

        let image = loader.get_image_source("background").unwrap();
        let placeholder = image.downcast_ref::<PlaceholderImage>().unwrap();
        assert_eq!(placeholder.url, "bg.png");
    }

    #[test]
    fn test_load_is_idempotent_per_name() {
        let queue = TaskQueue::new();
        let loader = AssetLoader::new(QueuedImageBackend::new(&queue));
        loader.load("a", "a.png");
        loader.load("a", "other.png");
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_error_does_not_block_finish() {
        let queue = TaskQueue::new();
        let loader =
            AssetLoader::new(QueuedImageBackend::new(&queue).with_failing("broken.png"));
        let errors = recorder(&loader, kinds::ERROR);
        let finished = Rc::new(Cell::new(0));
        let f = finished.clone();
        loader
            .events()
            .on(kinds::FINISH, handler(move |_| f.set(f.get() + 1)));

        loader.load("good", "good.png");
        loader.load("bad", "broken.png");
        queue.run_due(0.0);

        assert_eq!(loader.state("bad"), Some(AssetState::Error));
        assert!(loader.is_loaded("good"));
        assert_eq!(errors.borrow().len(), 1);
        // Only the completion that emptied the loading set announces finish
        assert_eq!(finished.get(), 1);
        assert!(loader.is_settled());
    }

    #[test]
    fn test_reply_after_destroy_is_ignored() {
        let queue = TaskQueue::new();
        let loader = AssetLoader::new(QueuedImageBackend::new(&queue));
        loader.load("a", "a.png");
        loader.destroy();
        loader.destroy();
        queue.run_due(0.0);
        assert_eq!(loader.state("a"), None);
    }
}
