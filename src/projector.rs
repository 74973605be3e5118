use bevy::math::{IVec2, UVec2, Vec3};

use crate::starfield::Star;

/// `z + distance` closer to zero than this means the star sits on the camera
/// plane and is skipped for the frame.
pub const NEAR_EPSILON: f32 = 1e-3;

#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub enum DepthMode {
    /// Widen forever, never shrink.
    #[default]
    Cumulative,
    /// Widen at once, shrink toward the current frame's range by `rate`.
    Decaying { rate: f32 },
}

/// Depth span used to normalize brightness. Owned by the frame loop and
/// handed to the projector each frame.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct DepthRange {
    pub min: f32,
    pub max: f32,
}

impl Default for DepthRange {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl DepthRange {
    pub const EMPTY: Self = Self {
        min: f32::INFINITY,
        max: f32::NEG_INFINITY,
    };

    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub fn is_empty(&self) -> bool {
        self.min > self.max
    }

    pub fn observe(&mut self, z: f32) {
        self.min = self.min.min(z);
        self.max = self.max.max(z);
    }

    /// Folds one frame's span in according to `mode`.
    pub fn update(&mut self, frame: DepthRange, mode: DepthMode) {
        if frame.is_empty() {
            return;
        }
        match mode {
            DepthMode::Cumulative => {
                self.observe(frame.min);
                self.observe(frame.max);
            }
            DepthMode::Decaying { rate } => {
                if self.is_empty() {
                    *self = frame;
                    return;
                }
                let rate = rate.clamp(0.0, 1.0);
                self.min = if frame.min < self.min {
                    frame.min
                } else {
                    self.min + (frame.min - self.min) * rate
                };
                self.max = if frame.max > self.max {
                    frame.max
                } else {
                    self.max + (frame.max - self.max) * rate
                };
            }
        }
    }

    /// 255 at the near edge, 0 at the far edge. A range with no width yet
    /// gives full brightness.
    pub fn brightness(&self, z: f32) -> u8 {
        let span = self.max - self.min;
        if !(span > 0.0) {
            return 255;
        }
        let t = ((z - self.min) / span).clamp(0.0, 1.0);
        (255.0 - 255.0 * t) as u8
    }
}

/// Per-frame outcome of `Projector::project`.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct ProjectionStats {
    pub drawn: usize,
    pub skipped: usize,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Projected {
    pub screen: IVec2,
    pub brightness: u8,
}

/// Pinhole camera at `z = -distance` looking toward +z, centered on the screen.
#[derive(Clone, Copy, Debug)]
pub struct Projector {
    pub screen: UVec2,
    pub mode: DepthMode,
    pub near_epsilon: f32,
}

impl Projector {
    pub fn new(screen: UVec2) -> Self {
        Self {
            screen,
            mode: DepthMode::default(),
            near_epsilon: NEAR_EPSILON,
        }
    }

    pub fn with_mode(mut self, mode: DepthMode) -> Self {
        self.mode = mode;
        self
    }

    /// Widens `range` with this frame's depths, then fills in screen position
    /// and brightness of every star. Stars on the camera plane are marked not
    /// visible and left otherwise untouched.
    pub fn project(
        &self,
        stars: &mut [Star],
        scale: f32,
        distance: f32,
        range: &mut DepthRange,
    ) -> ProjectionStats {
        let mut frame = DepthRange::EMPTY;
        for star in stars.iter() {
            frame.observe(star.position.z);
        }
        range.update(frame, self.mode);

        let mut stats = ProjectionStats::default();
        for star in stars.iter_mut() {
            match self.project_point(star.position, scale, distance, range) {
                Some(p) => {
                    star.screen = p.screen;
                    star.brightness = p.brightness;
                    star.visible = true;
                    stats.drawn += 1;
                }
                None => {
                    star.visible = false;
                    stats.skipped += 1;
                }
            }
        }
        stats
    }

    /// Pure single-point projection against a fixed depth range.
    pub fn project_point(
        &self,
        p: Vec3,
        scale: f32,
        distance: f32,
        range: &DepthRange,
    ) -> Option<Projected> {
        let depth = p.z + distance;
        if !depth.is_finite() || depth.abs() < self.near_epsilon {
            return None;
        }
        let half = self.screen.as_vec2() / 2.0;
        let x = half.x + scale * p.x / depth;
        let y = half.y + scale * p.y / depth;
        if !x.is_finite() || !y.is_finite() {
            return None;
        }
        Some(Projected {
            // saturating casts
            screen: IVec2::new(x as i32, y as i32),
            brightness: range.brightness(p.z),
        })
    }

    pub fn on_screen(&self, screen: IVec2) -> bool {
        screen.x >= 0
            && screen.y >= 0
            && screen.x <= self.screen.x as i32
            && screen.y <= self.screen.y as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::{generate, GeneratorPolicy};
    use crate::rotation::{rotate, Composition};
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::SeedableRng;

    fn projector() -> Projector {
        Projector::new(UVec2::new(800, 600))
    }

    #[test]
    fn centre_of_view_lands_mid_screen() {
        let p = projector()
            .project_point(Vec3::new(0.0, 0.0, 100.0), 256.0, 3456.0, &DepthRange::EMPTY)
            .unwrap();
        assert_eq!(p.screen, IVec2::new(400, 300));
        assert_eq!(p.brightness, 255);
    }

    #[test]
    fn perspective_divides_by_depth() {
        let range = DepthRange::new(-1000.0, 1000.0);
        let p = projector()
            .project_point(Vec3::new(1000.0, -500.0, 0.0), 600.0, 4000.0, &range)
            .unwrap();
        // 400 + 600 * 1000 / 4000, 300 - 600 * 500 / 4000
        assert_eq!(p.screen, IVec2::new(550, 225));
        assert_eq!(p.brightness, 127);
    }

    #[test]
    fn nearer_is_brighter() {
        let range = DepthRange::new(-100.0, 100.0);
        assert_eq!(range.brightness(-100.0), 255);
        assert_eq!(range.brightness(100.0), 0);
        assert!(range.brightness(-50.0) > range.brightness(50.0));
    }

    #[test]
    fn flat_range_is_full_brightness() {
        let mut range = DepthRange::EMPTY;
        range.observe(12.0);
        assert_eq!(range.brightness(12.0), 255);
        assert_eq!(DepthRange::EMPTY.brightness(0.0), 255);
    }

    #[test]
    fn projection_is_deterministic() {
        let range = DepthRange::new(-2500.0, 2500.0);
        let p = Vec3::new(123.4, -56.7, 890.1);
        let a = projector().project_point(p, 600.0, 4000.0, &range);
        let b = projector().project_point(p, 600.0, 4000.0, &range);
        assert_eq!(a, b);
    }

    #[test]
    fn star_on_camera_plane_is_skipped() {
        let mut stars = vec![
            Star::at(Vec3::new(10.0, 10.0, -4000.0)),
            Star::at(Vec3::new(10.0, 10.0, 0.0)),
        ];
        let mut range = DepthRange::EMPTY;
        let stats = projector().project(&mut stars, 600.0, 4000.0, &mut range);

        assert_eq!(stats, ProjectionStats { drawn: 1, skipped: 1 });
        assert!(!stars[0].visible);
        assert!(stars[1].visible);
        assert_eq!(stars[1].screen, IVec2::new(401, 301));
        // the skipped star still counts toward the depth span
        assert_eq!(range, DepthRange::new(-4000.0, 0.0));
    }

    #[test]
    fn degenerate_controls_do_not_produce_garbage() {
        let mut stars = vec![Star::at(Vec3::new(50.0, 50.0, 10.0))];
        let mut range = DepthRange::EMPTY;
        for (scale, distance) in [(0.0, 4000.0), (600.0, -4000.0), (600.0, -9.0)] {
            projector().project(&mut stars, scale, distance, &mut range);
            assert!(stars[0].visible);
        }
        // flat against the camera plane
        projector().project(&mut stars, 600.0, -10.0, &mut range);
        assert!(!stars[0].visible);
    }

    #[test]
    fn cumulative_range_only_widens() {
        let mut range = DepthRange::EMPTY;
        range.update(DepthRange::new(-10.0, 10.0), DepthMode::Cumulative);
        range.update(DepthRange::new(-1.0, 1.0), DepthMode::Cumulative);
        assert_eq!(range, DepthRange::new(-10.0, 10.0));
        range.update(DepthRange::new(-20.0, 5.0), DepthMode::Cumulative);
        assert_eq!(range, DepthRange::new(-20.0, 10.0));
    }

    #[test]
    fn decaying_range_shrinks_toward_frame() {
        let mode = DepthMode::Decaying { rate: 0.5 };
        let mut range = DepthRange::EMPTY;
        range.update(DepthRange::new(-10.0, 10.0), mode);
        range.update(DepthRange::new(-2.0, 2.0), mode);
        assert_eq!(range, DepthRange::new(-6.0, 6.0));
        range.update(DepthRange::new(-8.0, 1.0), mode);
        assert_eq!(range, DepthRange::new(-8.0, 3.5));
    }

    #[test]
    fn shuffled_projection_matches() {
        let mut rng = StdRng::seed_from_u64(21);
        let field = generate(GeneratorPolicy::Sphere, 300, 5000.0, &mut rng).unwrap();
        let mut stars = field.stars().to_vec();
        let mut shuffled = stars.clone();
        shuffled.shuffle(&mut rng);

        let mut a = DepthRange::EMPTY;
        let mut b = DepthRange::EMPTY;
        projector().project(&mut stars, 600.0, 4000.0, &mut a);
        projector().project(&mut shuffled, 600.0, 4000.0, &mut b);

        assert_eq!(a, b);
        for star in &shuffled {
            assert!(stars.contains(star));
        }
    }

    #[test]
    fn box_scenario_mostly_on_screen() {
        let mut rng = StdRng::seed_from_u64(2024);
        let mut field = generate(GeneratorPolicy::Box, 100, 5000.0, &mut rng).unwrap();
        rotate(
            field.stars_mut(),
            Composition::Combined,
            0.0,
            0.0,
            std::f64::consts::PI / 180.0,
        );

        // a field 5000 wide seen from 4000 away at scale 600 needs a big
        // screen; at 800x600 the near corners spill off the edges
        let projector = Projector::new(UVec2::new(2000, 1500));
        let mut range = DepthRange::EMPTY;
        let stats = projector.project(field.stars_mut(), 600.0, 4000.0, &mut range);
        assert_eq!(stats.skipped, 0);

        let inside = field
            .visible()
            .filter(|s| projector.on_screen(s.screen))
            .count();
        assert!(inside >= 95, "only {inside} of 100 stars on screen");
    }
}
