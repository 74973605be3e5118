use bevy::math::{IVec2, Vec3};

/// One point of the cloud. `screen` and `brightness` are only meaningful for
/// the frame in which `visible` was set by the projector.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Star {
    pub position: Vec3,
    pub screen: IVec2,
    pub brightness: u8,
    pub visible: bool,
}

impl Star {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            screen: IVec2::ZERO,
            brightness: 0,
            visible: false,
        }
    }
}

/// Fixed-length collection of stars. Built once by the generator and then
/// only mutated in place.
#[derive(Clone, Debug, Default)]
pub struct StarField {
    stars: Vec<Star>,
}

impl StarField {
    pub fn from_positions(positions: impl IntoIterator<Item = Vec3>) -> Self {
        Self {
            stars: positions.into_iter().map(Star::at).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.stars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stars.is_empty()
    }

    pub fn stars(&self) -> &[Star] {
        &self.stars
    }

    /// Mutable view of the stars. A slice, so the length can't change.
    pub fn stars_mut(&mut self) -> &mut [Star] {
        &mut self.stars
    }

    pub fn iter(&self) -> impl Iterator<Item = &Star> {
        self.stars.iter()
    }

    pub fn visible(&self) -> impl Iterator<Item = &Star> {
        self.stars.iter().filter(|s| s.visible)
    }
}
