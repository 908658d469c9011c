//! Kinetic entity: a moving point with per-axis speed, acceleration and a
//! speed ceiling
//!
//! Integration uses the average of the old and new speed over the step
//! (exact for constant acceleration). `maxSpeed` is a one-sided ceiling: the
//! speed delta is truncated so `speed + delta` never passes it.

use glam::Vec2;

use super::rect::Coordinate;
use crate::event::{EventHub, Payload, kinds};

/// Motion parameters. Speeds are signed pixels/s.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KineticConfig {
    pub x_speed: f32,
    pub y_speed: f32,
    pub x_max_speed: f32,
    pub y_max_speed: f32,
    pub x_acceleration: f32,
    pub y_acceleration: f32,
}

impl Default for KineticConfig {
    fn default() -> Self {
        Self {
            x_speed: 0.0,
            y_speed: 0.0,
            x_max_speed: f32::INFINITY,
            y_max_speed: f32::INFINITY,
            x_acceleration: 0.0,
            y_acceleration: 0.0,
        }
    }
}

/// Fields that may change after construction
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AccelerationOverride {
    pub x_acceleration: Option<f32>,
    pub y_acceleration: Option<f32>,
}

/// Speed change over `span`, truncated so the result does not pass `max_speed`
#[inline]
fn speed_delta(speed: f32, max_speed: f32, acceleration: f32, span: f32) -> f32 {
    let delta = span * acceleration;
    if speed + delta > max_speed {
        max_speed - speed
    } else {
        delta
    }
}

/// Moving point; fires `moved` with (from, to) whenever it is displaced
#[derive(Debug)]
pub struct KineticEntity {
    coordinate: Option<Coordinate>,
    config: Option<KineticConfig>,
    events: EventHub,
}

impl KineticEntity {
    pub fn new(coordinate: Coordinate, config: KineticConfig) -> Self {
        Self {
            coordinate: Some(coordinate),
            config: Some(config),
            events: EventHub::new(),
        }
    }

    /// A point that never moves (bursts anchor on one)
    pub fn stationary(coordinate: Coordinate) -> Self {
        Self::new(coordinate, KineticConfig::default())
    }

    pub fn events(&self) -> &EventHub {
        &self.events
    }

    /// Current position, None once destroyed
    pub fn coordinate(&self) -> Option<Coordinate> {
        self.coordinate
    }

    pub fn config(&self) -> Option<&KineticConfig> {
        self.config.as_ref()
    }

    pub fn speed(&self) -> Option<Vec2> {
        self.config.map(|c| Vec2::new(c.x_speed, c.y_speed))
    }

    pub fn is_destroyed(&self) -> bool {
        self.config.is_none()
    }

    /// Advance by `span` seconds, after merging acceleration overrides
    pub fn update(&mut self, span: f32, overrides: Option<&AccelerationOverride>) -> &mut Self {
        let Some(config) = self.config.as_mut() else {
            return self;
        };
        if let Some(o) = overrides {
            if let Some(ax) = o.x_acceleration {
                config.x_acceleration = ax;
            }
            if let Some(ay) = o.y_acceleration {
                config.y_acceleration = ay;
            }
        }
        if !(span > 0.0 && span.is_finite()) {
            return self;
        }
        let Some(from) = self.coordinate else {
            return self;
        };

        let dx = speed_delta(config.x_speed, config.x_max_speed, config.x_acceleration, span);
        let dy = speed_delta(config.y_speed, config.y_max_speed, config.y_acceleration, span);
        let distance = Vec2::new(
            (config.x_speed + dx / 2.0) * span,
            (config.y_speed + dy / 2.0) * span,
        );
        let to = from + distance;
        self.coordinate = Some(to);
        config.x_speed += dx;
        config.y_speed += dy;

        if distance.x != 0.0 || distance.y != 0.0 {
            self.events.fire(kinds::MOVED, Payload::Moved { from, to });
        }
        self
    }

    /// Release position and config; the entity is inert afterwards
    pub fn destroy(&mut self) {
        self.coordinate = None;
        self.config = None;
        self.events.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::handler;
    use proptest::prelude::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn falling(y_speed: f32, y_acceleration: f32, y_max_speed: f32) -> KineticEntity {
        KineticEntity::new(
            Vec2::ZERO,
            KineticConfig {
                y_speed,
                y_acceleration,
                y_max_speed,
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_trapezoidal_integration() {
        let mut e = falling(0.0, 10.0, f32::INFINITY);
        e.update(1.0, None);
        assert_eq!(e.speed(), Some(Vec2::new(0.0, 10.0)));
        assert_eq!(e.coordinate(), Some(Vec2::new(0.0, 5.0)));
    }

    #[test]
    fn test_speed_delta_truncated_at_ceiling() {
        let mut e = falling(8.0, 10.0, 10.0);
        e.update(1.0, None);
        // delta truncated to 2, displacement (8 + 1) * 1
        assert_eq!(e.speed().unwrap().y, 10.0);
        assert_eq!(e.coordinate().unwrap().y, 9.0);
    }

    #[test]
    fn test_horizontal_axis_integrates_independently() {
        let mut e = KineticEntity::new(
            Vec2::new(10.0, 0.0),
            KineticConfig {
                x_speed: 4.0,
                x_acceleration: 10.0,
                x_max_speed: 6.0,
                y_max_speed: f32::INFINITY,
                ..Default::default()
            },
        );
        e.update(1.0, None);
        // delta truncated to 2, displacement (4 + 1) * 1
        assert_eq!(e.speed(), Some(Vec2::new(6.0, 0.0)));
        assert_eq!(e.coordinate(), Some(Vec2::new(15.0, 0.0)));

        let brake = AccelerationOverride {
            x_acceleration: Some(-6.0),
            ..Default::default()
        };
        e.update(1.0, Some(&brake));
        assert_eq!(e.speed(), Some(Vec2::new(0.0, 0.0)));
        assert_eq!(e.coordinate(), Some(Vec2::new(18.0, 0.0)));
    }

    #[test]
    fn test_moved_event_carries_both_positions() {
        let mut e = falling(100.0, 0.0, f32::INFINITY);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        e.events()
            .on(kinds::MOVED, handler(move |ev| s.borrow_mut().push(ev.payload.clone())));

        e.update(0.5, None);
        assert_eq!(
            *seen.borrow(),
            vec![Payload::Moved {
                from: Vec2::ZERO,
                to: Vec2::new(0.0, 50.0)
            }]
        );
    }

    #[test]
    fn test_zero_span_applies_overrides_only() {
        let mut e = falling(0.0, 0.0, f32::INFINITY);
        let moved = Rc::new(RefCell::new(0));
        let m = moved.clone();
        e.events()
            .on(kinds::MOVED, handler(move |_| *m.borrow_mut() += 1));

        let o = AccelerationOverride {
            y_acceleration: Some(4.0),
            ..Default::default()
        };
        e.update(0.0, Some(&o));
        assert_eq!(*moved.borrow(), 0);
        assert_eq!(e.config().unwrap().y_acceleration, 4.0);

        e.update(1.0, None);
        assert_eq!(e.coordinate().unwrap().y, 2.0);
        assert_eq!(*moved.borrow(), 1);
    }

    #[test]
    fn test_destroyed_entity_is_inert() {
        let mut e = falling(10.0, 0.0, f32::INFINITY);
        e.destroy();
        e.destroy();
        e.update(1.0, None);
        assert!(e.is_destroyed());
        assert_eq!(e.coordinate(), None);
        assert_eq!(e.speed(), None);
    }

    proptest! {
        #[test]
        fn prop_speed_never_passes_ceiling(
            max in 1.0f32..500.0,
            start in 0.0f32..1.0,
            acceleration in 0.0f32..200.0,
            span in 0.0f32..5.0,
        ) {
            let v0 = start * max;
            let mut e = falling(v0, acceleration, max);
            e.update(span, None);
            let v1 = e.speed().unwrap().y;
            prop_assert!(v1.abs() <= max + 1e-3);
            prop_assert!(v1 >= v0 - 1e-3);
        }

        #[test]
        fn prop_horizontal_speed_never_passes_ceiling(
            max in 1.0f32..500.0,
            start in 0.0f32..1.0,
            acceleration in 0.0f32..200.0,
            span in 0.0f32..5.0,
        ) {
            let mut e = KineticEntity::new(
                Vec2::ZERO,
                KineticConfig {
                    x_speed: start * max,
                    x_acceleration: acceleration,
                    x_max_speed: max,
                    ..Default::default()
                },
            );
            e.update(span, None);
            let speed = e.speed().unwrap();
            prop_assert!(speed.x <= max + 1e-3);
            prop_assert_eq!(speed.y, 0.0);
        }
    }
}
