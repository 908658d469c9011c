//! Globes: the falling circular targets

use glam::Vec2;
use rand::Rng;

use super::kinetic::{KineticConfig, KineticEntity};
use super::rect::Coordinate;
use super::state::GlobeId;
use crate::event::EventHub;
use crate::surface::RenderSurface;

/// Random opaque CSS color, e.g. `rgb(12, 200, 97)`
pub fn random_color(rng: &mut impl Rng) -> String {
    format!(
        "rgb({}, {}, {})",
        rng.random::<u8>(),
        rng.random::<u8>(),
        rng.random::<u8>()
    )
}

/// A kinetic entity with a radius, a color and circular hit-testing
#[derive(Debug)]
pub struct Globe {
    id: GlobeId,
    body: KineticEntity,
    radius: f32,
    color: String,
}

impl Globe {
    pub fn new(
        id: GlobeId,
        coordinate: Coordinate,
        radius: f32,
        color: impl Into<String>,
        config: KineticConfig,
    ) -> Self {
        Self {
            id,
            body: KineticEntity::new(coordinate, config),
            radius,
            color: color.into(),
        }
    }

    pub fn id(&self) -> GlobeId {
        self.id
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn color(&self) -> &str {
        &self.color
    }

    /// Hub carrying `moved` and routed `click` events
    pub fn events(&self) -> &EventHub {
        self.body.events()
    }

    pub fn coordinate(&self) -> Option<Coordinate> {
        self.body.coordinate()
    }

    pub fn speed(&self) -> Option<Vec2> {
        self.body.speed()
    }

    pub fn is_destroyed(&self) -> bool {
        self.body.is_destroyed()
    }

    /// Highest point of the globe (smallest y)
    pub fn top(&self) -> Option<f32> {
        self.coordinate().map(|c| c.y - self.radius)
    }

    /// Lowest point of the globe (largest y)
    pub fn bottom(&self) -> Option<f32> {
        self.coordinate().map(|c| c.y + self.radius)
    }

    pub fn update(&mut self, span: f32) -> &mut Self {
        self.body.update(span, None);
        self
    }

    /// True iff `point` is strictly closer than `radius + buffer` to the center
    pub fn judge_has_been_touch(&self, point: Vec2, buffer: f32) -> bool {
        self.coordinate()
            .map(|c| c.distance(point) < self.radius + buffer)
            .unwrap_or(false)
    }

    pub fn display(&self, surface: &mut dyn RenderSurface) -> &Self {
        if let Some(center) = self.coordinate() {
            if self.radius > 0.0 {
                surface.draw_fill_circle(center, self.radius, &self.color);
            }
        }
        self
    }

    pub fn destroy(&mut self) {
        self.body.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{DrawCommand, RecordingSurface};
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn globe_at(x: f32, y: f32) -> Globe {
        Globe::new(
            GlobeId(1),
            Vec2::new(x, y),
            20.0,
            "green",
            KineticConfig::default(),
        )
    }

    #[test]
    fn test_touch_inside_and_outside() {
        let g = globe_at(100.0, 100.0);
        assert!(g.judge_has_been_touch(Vec2::new(115.0, 100.0), 0.0));
        assert!(!g.judge_has_been_touch(Vec2::new(125.0, 100.0), 0.0));
        // Boundary is exclusive
        assert!(!g.judge_has_been_touch(Vec2::new(120.0, 100.0), 0.0));
        // Buffer widens the target
        assert!(g.judge_has_been_touch(Vec2::new(125.0, 100.0), 10.0));
    }

    #[test]
    fn test_destroyed_globe_is_never_touched() {
        let mut g = globe_at(100.0, 100.0);
        g.destroy();
        assert!(!g.judge_has_been_touch(Vec2::new(100.0, 100.0), 50.0));
        assert_eq!(g.top(), None);
    }

    #[test]
    fn test_display_draws_circle() {
        let mut surface = RecordingSurface::new(200.0, 200.0);
        let g = globe_at(50.0, 60.0);
        g.display(&mut surface);
        assert_eq!(
            surface.commands(),
            &[DrawCommand::FillCircle {
                center: Vec2::new(50.0, 60.0),
                radius: 20.0,
                color: "green".into()
            }]
        );

        let mut gone = globe_at(0.0, 0.0);
        gone.destroy();
        gone.display(&mut surface);
        assert_eq!(surface.commands().len(), 1);
    }

    #[test]
    fn test_extents() {
        let g = globe_at(0.0, 100.0);
        assert_eq!(g.top(), Some(80.0));
        assert_eq!(g.bottom(), Some(120.0));
    }

    #[test]
    fn test_random_color_format() {
        let mut rng = Pcg32::seed_from_u64(7);
        let color = random_color(&mut rng);
        assert!(color.starts_with("rgb(") && color.ends_with(')'));
        assert_eq!(color.matches(',').count(), 2);
    }
}
