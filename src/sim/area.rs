//! Operational area: the part of the surface where globes live
//!
//! Derived from the surface size, a length spec per axis, an optional aspect
//! ratio and an anchor. Always fully contained in the surface.

use glam::Vec2;

use super::rect::Rect;
use crate::settings::{Anchor, GameOptions, LengthSpec};

/// Geometry request for the operational area
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AreaSpec {
    pub width: LengthSpec,
    pub height: LengthSpec,
    /// width / height; when set it replaces the length specs
    pub rate: Option<f32>,
    pub anchor: Anchor,
}

impl AreaSpec {
    pub fn from_options(options: &GameOptions) -> Self {
        Self {
            width: options.width,
            height: options.height,
            rate: options.effective_rate(),
            anchor: options.anchor,
        }
    }

    /// Size of the area inside a `surface`-sized surface
    pub fn resolve_size(&self, surface: Vec2) -> Vec2 {
        let (total_w, total_h) = (surface.x.max(0.0), surface.y.max(0.0));
        if total_w <= 0.0 || total_h <= 0.0 {
            return Vec2::ZERO;
        }

        match self.rate.filter(|r| r.is_finite() && *r > 0.0) {
            Some(rate) => {
                // Largest rectangle of that ratio: the wider-than-surface case
                // saturates width, otherwise height
                let surface_rate = total_w / total_h;
                if rate > surface_rate {
                    Vec2::new(total_w, total_w / rate)
                } else {
                    Vec2::new(total_h * rate, total_h)
                }
            }
            None => Vec2::new(self.width.resolve(total_w), self.height.resolve(total_h)),
        }
    }

    /// Position the area inside the surface according to `anchor`
    pub fn resolve(&self, surface: Vec2) -> Rect {
        let size = self.resolve_size(surface);
        let spare = (surface.max(Vec2::ZERO) - size).max(Vec2::ZERO);
        let half = spare * 0.5;

        let origin = match self.anchor {
            Anchor::Center => half,
            Anchor::Left => Vec2::new(0.0, half.y),
            Anchor::Right => Vec2::new(spare.x, half.y),
            Anchor::Top => Vec2::new(half.x, 0.0),
            Anchor::Bottom => Vec2::new(half.x, spare.y),
        };
        Rect::from_origin_size(origin, size.x, size.y)
    }
}
