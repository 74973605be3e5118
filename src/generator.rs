use bevy::math::{DVec3, Vec3};
use rand::Rng;

use crate::error::{Result, StarfieldError};
use crate::starfield::StarField;

/// Tries per star before the sphere sampler gives up.
pub const MAX_REJECTIONS: u32 = 10_000;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum GeneratorPolicy {
    /// Independent uniform draws per axis in `[-spread/2, spread/2]`.
    Box,
    /// Box points turned by a random whole-degree angle in `[0, 90)` about
    /// the vertical and then the horizontal axis.
    TiltedBox,
    /// Uniform density inside a ball of radius `spread/2`.
    #[default]
    Sphere,
}

pub fn generate<R: Rng + ?Sized>(
    policy: GeneratorPolicy,
    count: usize,
    spread: f32,
    rng: &mut R,
) -> Result<StarField> {
    if !spread.is_finite() || spread <= 0.0 {
        return Err(StarfieldError::InvalidSpread(spread));
    }
    let half = spread / 2.0;

    let mut positions = Vec::with_capacity(count);
    for _ in 0..count {
        let p = match policy {
            GeneratorPolicy::Box => box_point(half, rng),
            GeneratorPolicy::TiltedBox => {
                let degrees = rng.gen_range(0..90) as f64;
                tilt(box_point(half, rng).as_dvec3(), degrees).as_vec3()
            }
            GeneratorPolicy::Sphere => sample_unit_ball(rng)? * half,
        };
        positions.push(p);
    }
    Ok(StarField::from_positions(positions))
}

fn box_point<R: Rng + ?Sized>(half: f32, rng: &mut R) -> Vec3 {
    Vec3::new(
        rng.gen_range(-half..=half),
        rng.gen_range(-half..=half),
        rng.gen_range(-half..=half),
    )
}

fn tilt(p: DVec3, degrees: f64) -> DVec3 {
    let (s, c) = degrees.to_radians().sin_cos();
    let x = p.x * c - p.z * s;
    let z = p.x * s + p.z * c;
    DVec3::new(x, p.y * c - z * s, p.y * s + z * c)
}

/// Rejection sampling from the enclosing cube.
fn sample_unit_ball<R: Rng + ?Sized>(rng: &mut R) -> Result<Vec3> {
    for _ in 0..MAX_REJECTIONS {
        let p = Vec3::new(
            rng.gen_range(-1.0..=1.0),
            rng.gen_range(-1.0..=1.0),
            rng.gen_range(-1.0..=1.0),
        );
        if p.length_squared() <= 1.0 {
            return Ok(p);
        }
    }
    Err(StarfieldError::Generation {
        attempts: MAX_REJECTIONS,
    })
}
