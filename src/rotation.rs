use bevy::math::{DMat3, DVec3, Vec3};

use crate::starfield::Star;

/// How the three per-frame angle increments are turned into a rotation.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Composition {
    /// One matrix `Rz(yaw) * Ry(pitch) * Rx(roll)`, built in f64.
    #[default]
    Combined,
    /// Roll, then pitch, then yaw, each applied on its own in f32. Same
    /// rotation up to rounding; kept for the spin variant.
    Sequential,
}

/// Euler rotation flattened to nine coefficients, `p' = R * p`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RotationMatrix(DMat3);

impl RotationMatrix {
    /// Angles in radians: yaw about Z, pitch about Y, roll about X.
    pub fn from_euler(yaw: f64, pitch: f64, roll: f64) -> Self {
        let (sy, cy) = yaw.sin_cos();
        let (sp, cp) = pitch.sin_cos();
        let (sr, cr) = roll.sin_cos();

        // columns of Rz * Ry * Rx
        Self(DMat3::from_cols(
            DVec3::new(cy * cp, sy * cp, -sp),
            DVec3::new(cy * sp * sr - sy * cr, sy * sp * sr + cy * cr, cp * sr),
            DVec3::new(cy * sp * cr + sy * sr, sy * sp * cr - cy * sr, cp * cr),
        ))
    }

    /// Transpose, which is the inverse for a rotation.
    pub fn inverse(&self) -> Self {
        Self(self.0.transpose())
    }

    pub fn apply(&self, p: Vec3) -> Vec3 {
        (self.0 * p.as_dvec3()).as_vec3()
    }

    pub fn matrix(&self) -> DMat3 {
        self.0
    }
}

/// Turns every star in place by this frame's increments.
pub fn rotate(stars: &mut [Star], composition: Composition, pitch: f64, roll: f64, yaw: f64) {
    match composition {
        Composition::Combined => {
            rotate_with(stars, &RotationMatrix::from_euler(yaw, pitch, roll));
        }
        Composition::Sequential => {
            let (pitch, roll, yaw) = (pitch as f32, roll as f32, yaw as f32);
            for star in stars.iter_mut() {
                let p = about_x(star.position, roll);
                let p = about_y(p, pitch);
                star.position = about_z(p, yaw);
            }
        }
    }
}

pub fn rotate_with(stars: &mut [Star], rotation: &RotationMatrix) {
    for star in stars.iter_mut() {
        star.position = rotation.apply(star.position);
    }
}

fn about_x(p: Vec3, angle: f32) -> Vec3 {
    let (s, c) = angle.sin_cos();
    Vec3::new(p.x, p.y * c - p.z * s, p.y * s + p.z * c)
}

fn about_y(p: Vec3, angle: f32) -> Vec3 {
    let (s, c) = angle.sin_cos();
    Vec3::new(p.x * c + p.z * s, p.y, -p.x * s + p.z * c)
}

fn about_z(p: Vec3, angle: f32) -> Vec3 {
    let (s, c) = angle.sin_cos();
    Vec3::new(p.x * c - p.y * s, p.x * s + p.y * c, p.z)
}
