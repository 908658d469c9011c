//! Globe population: an arena keyed by `GlobeId`
//!
//! Ids come from a monotonic generator, so iteration order is spawn order and
//! the click index (a `BTreeSet`) walked backwards yields the topmost globe
//! first.

use std::collections::{BTreeMap, BTreeSet};

use glam::Vec2;

use super::globe::Globe;
use super::pop::Pop;
use super::state::{GlobeId, IdGenerator};

/// Lifecycle slot of one tracked globe
#[derive(Debug)]
pub enum GlobeSlot {
    /// Due to spawn; instantiated on the next display pass
    Prepare,
    /// On screen and hit-testable
    Exist(Globe),
    /// Gone; a burst may still be animating out
    Destroyed { pop: Option<Pop> },
}

#[derive(Debug, Default)]
pub struct Population {
    slots: BTreeMap<GlobeId, GlobeSlot>,
    clickable: BTreeSet<GlobeId>,
    ids: IdGenerator,
}

impl Population {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a new globe in `Prepare` state
    pub fn allocate(&mut self) -> GlobeId {
        let id = self.ids.next_id();
        self.slots.insert(id, GlobeSlot::Prepare);
        id
    }

    pub fn get(&self, id: GlobeId) -> Option<&GlobeSlot> {
        self.slots.get(&id)
    }

    pub fn get_mut(&mut self, id: GlobeId) -> Option<&mut GlobeSlot> {
        self.slots.get_mut(&id)
    }

    /// Replace the slot of an already tracked id
    pub fn set(&mut self, id: GlobeId, slot: GlobeSlot) {
        if let Some(existing) = self.slots.get_mut(&id) {
            *existing = slot;
        }
    }

    pub fn remove(&mut self, id: GlobeId) -> Option<GlobeSlot> {
        self.clickable.remove(&id);
        self.slots.remove(&id)
    }

    /// Snapshot of tracked ids in spawn order
    pub fn ids(&self) -> Vec<GlobeId> {
        self.slots.keys().copied().collect()
    }

    pub fn is_prepared(&self, id: GlobeId) -> bool {
        matches!(self.slots.get(&id), Some(GlobeSlot::Prepare))
    }

    pub fn globe(&self, id: GlobeId) -> Option<&Globe> {
        match self.slots.get(&id) {
            Some(GlobeSlot::Exist(globe)) => Some(globe),
            _ => None,
        }
    }

    pub fn pop(&self, id: GlobeId) -> Option<&Pop> {
        match self.slots.get(&id) {
            Some(GlobeSlot::Destroyed { pop }) => pop.as_ref(),
            _ => None,
        }
    }

    pub fn register_clickable(&mut self, id: GlobeId) {
        if self.slots.contains_key(&id) {
            self.clickable.insert(id);
        }
    }

    pub fn unregister_clickable(&mut self, id: GlobeId) {
        self.clickable.remove(&id);
    }

    pub fn clickable_count(&self) -> usize {
        self.clickable.len()
    }

    /// The touched globe with the highest id, if any
    pub fn topmost_hit(&self, point: Vec2, buffer: f32) -> Option<GlobeId> {
        self.clickable
            .iter()
            .rev()
            .copied()
            .find(|id| {
                self.globe(*id)
                    .map(|g| g.judge_has_been_touch(point, buffer))
                    .unwrap_or(false)
            })
    }

    /// A new globe is due once every tracked globe has fully passed below `top`
    pub fn spawn_due(&self, top: f32) -> bool {
        self.slots.values().all(|slot| match slot {
            GlobeSlot::Prepare => false,
            GlobeSlot::Exist(globe) => globe.top().map(|t| t >= top).unwrap_or(true),
            GlobeSlot::Destroyed { .. } => true,
        })
    }

    /// Globes currently on screen
    pub fn live_count(&self) -> usize {
        self.slots
            .values()
            .filter(|s| matches!(s, GlobeSlot::Exist(_)))
            .count()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Destroy every globe and burst and forget them
    pub fn clear(&mut self) {
        for (_, slot) in std::mem::take(&mut self.slots) {
            match slot {
                GlobeSlot::Exist(mut globe) => globe.destroy(),
                GlobeSlot::Destroyed { pop: Some(mut pop) } => pop.destroy(),
                _ => {}
            }
        }
        self.clickable.clear();
    }
}
