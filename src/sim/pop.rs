//! Burst effect shown where a globe was clicked
//!
//! `count` small circles fly outward from the hit point while shrinking.
//! Once `during` seconds have elapsed the burst destroys itself and fires
//! `finish`.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::kinetic::KineticEntity;
use super::rect::Coordinate;
use crate::consts::*;
use crate::event::{EventHub, Payload, kinds};
use crate::surface::RenderSurface;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopOptions {
    /// Initial distance of the circles from the center
    pub buffer: f32,
    /// Circle radius at birth
    pub radius: f32,
    /// Lifetime (seconds)
    pub during: f32,
    /// Distance travelled over the lifetime
    pub distance: f32,
    pub color: String,
    pub count: u32,
    /// Angle of the first circle, degrees clockwise from straight up
    pub start_angle: f32,
}

impl Default for PopOptions {
    fn default() -> Self {
        Self {
            buffer: 0.0,
            radius: POP_RADIUS,
            during: POP_DURING,
            distance: POP_DISTANCE,
            color: "green".to_string(),
            count: POP_COUNT,
            start_angle: 0.0,
        }
    }
}

impl PopOptions {
    /// Circle centers at `fraction` (0..1) of the lifetime
    pub fn circles(&self, center: Vec2, fraction: f32) -> Vec<Vec2> {
        let count = self.count.max(1);
        let reach = self.distance * fraction + self.buffer;
        (0..count)
            .map(|i| {
                let angle = (360.0 / count as f32 * i as f32 + self.start_angle).to_radians();
                center + Vec2::new(angle.sin(), -angle.cos()) * reach
            })
            .collect()
    }
}

/// Short-lived radial burst
#[derive(Debug)]
pub struct Pop {
    body: KineticEntity,
    /// Seconds since birth
    age: f32,
    options: Option<PopOptions>,
}

impl Pop {
    pub fn new(coordinate: Coordinate, options: PopOptions) -> Self {
        Self {
            body: KineticEntity::stationary(coordinate),
            age: 0.0,
            options: Some(options),
        }
    }

    /// Hub carrying `finish`
    pub fn events(&self) -> &EventHub {
        self.body.events()
    }

    pub fn coordinate(&self) -> Option<Coordinate> {
        self.body.coordinate()
    }

    pub fn age(&self) -> f32 {
        self.age
    }

    pub fn is_finished(&self) -> bool {
        self.options.is_none()
    }

    /// Age the burst by `span` seconds
    pub fn update(&mut self, span: f32) -> &mut Self {
        if self.options.is_some() && span > 0.0 {
            self.age += span;
            self.body.update(span, None);
        }
        self
    }

    /// Draw the circles, or destroy the burst once its lifetime is over
    pub fn display(&mut self, surface: &mut dyn RenderSurface) -> &mut Self {
        let (Some(options), Some(center)) = (self.options.as_ref(), self.body.coordinate()) else {
            return self;
        };
        if options.during <= 0.0 || self.age >= options.during {
            self.destroy();
            return self;
        }

        let fraction = self.age / options.during;
        let radius = options.radius * (1.0 - fraction);
        for point in options.circles(center, fraction) {
            surface.draw_fill_circle(point, radius, &options.color);
        }
        self
    }

    /// Fire `finish` (once) and release state
    pub fn destroy(&mut self) {
        if self.options.take().is_some() {
            self.body.events().fire(kinds::FINISH, Payload::None);
        }
        self.age = 0.0;
        self.body.destroy();
    }
}
