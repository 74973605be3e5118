use bevy::math::UVec2;
use bevy::prelude::*;
use bevy::render::render_asset::RenderAssetUsages;
use bevy::render::render_resource::{Extent3d, TextureDimension, TextureFormat};
use bevy::render::texture::ImageSampler;

use crate::frame_loop::Surface;

const BLACK: [u8; 4] = [0, 0, 0, 0xff];

/// CPU back buffer behind the on-screen image. Points go to the back buffer;
/// `present` copies it into the image bytes.
#[derive(Resource)]
pub struct Framebuffer {
    pub image: Handle<Image>,
    size: UVec2,
    back: Vec<u8>,
    color: [u8; 4],
    presented: u64,
}

impl Framebuffer {
    pub fn new(image: Handle<Image>, size: UVec2) -> Self {
        Self {
            image,
            size,
            back: BLACK.repeat((size.x * size.y) as usize),
            color: BLACK,
            presented: 0,
        }
    }

    /// RGBA8 image matching the back buffer, sampled without filtering.
    pub fn blank_image(size: UVec2) -> Image {
        let mut image = Image::new_fill(
            Extent3d {
                width: size.x,
                height: size.y,
                depth_or_array_layers: 1,
            },
            TextureDimension::D2,
            &BLACK,
            TextureFormat::Rgba8UnormSrgb,
            RenderAssetUsages::default(),
        );
        image.sampler = ImageSampler::nearest();
        image
    }

    pub fn presented(&self) -> u64 {
        self.presented
    }

    /// Binds the back buffer to the bytes of the image it presents into.
    pub fn surface<'a>(&'a mut self, front: &'a mut Vec<u8>) -> FramebufferSurface<'a> {
        FramebufferSurface { buffer: self, front }
    }
}

pub struct FramebufferSurface<'a> {
    buffer: &'a mut Framebuffer,
    front: &'a mut Vec<u8>,
}

impl Surface for FramebufferSurface<'_> {
    fn set_draw_color(&mut self, r: u8, g: u8, b: u8, a: u8) {
        self.buffer.color = [r, g, b, a];
    }

    fn draw_point(&mut self, x: i32, y: i32) {
        let size = self.buffer.size;
        if x < 0 || y < 0 || x as u32 >= size.x || y as u32 >= size.y {
            return;
        }
        let i = ((y as u32 * size.x + x as u32) * 4) as usize;
        self.buffer.back[i..i + 4].copy_from_slice(&self.buffer.color);
    }

    fn clear(&mut self) {
        let color = self.buffer.color;
        for px in self.buffer.back.chunks_exact_mut(4) {
            px.copy_from_slice(&color);
        }
    }

    fn present(&mut self) {
        self.front.clear();
        self.front.extend_from_slice(&self.buffer.back);
        self.buffer.presented += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pixel(bytes: &[u8], size: UVec2, x: u32, y: u32) -> [u8; 4] {
        let i = ((y * size.x + x) * 4) as usize;
        [bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]]
    }

    #[test]
    fn points_show_up_only_after_present() {
        let size = UVec2::new(4, 3);
        let mut fb = Framebuffer::new(Handle::default(), size);
        let mut front = vec![0u8; 4 * 4 * 3];

        let mut surface = fb.surface(&mut front);
        surface.set_draw_color(10, 20, 30, 255);
        surface.draw_point(2, 1);
        drop(surface);
        assert_eq!(pixel(&front, size, 2, 1), [0, 0, 0, 0]);

        let mut surface = fb.surface(&mut front);
        surface.present();
        drop(surface);
        assert_eq!(pixel(&front, size, 2, 1), [10, 20, 30, 255]);
        assert_eq!(pixel(&front, size, 0, 0), BLACK);
        assert_eq!(fb.presented(), 1);
    }

    #[test]
    fn clear_after_present_keeps_the_shown_frame() {
        let size = UVec2::new(2, 2);
        let mut fb = Framebuffer::new(Handle::default(), size);
        let mut front = Vec::new();

        let mut surface = fb.surface(&mut front);
        surface.set_draw_color(255, 255, 0, 255);
        surface.draw_point(1, 1);
        surface.present();
        surface.set_draw_color(0, 0, 0, 255);
        surface.clear();
        drop(surface);

        assert_eq!(pixel(&front, size, 1, 1), [255, 255, 0, 255]);
        assert!(fb.back.chunks_exact(4).all(|px| px == BLACK));
    }

    #[test]
    fn off_screen_points_are_dropped() {
        let size = UVec2::new(2, 2);
        let mut fb = Framebuffer::new(Handle::default(), size);
        let mut front = Vec::new();
        let mut surface = fb.surface(&mut front);
        surface.set_draw_color(1, 1, 1, 1);
        for (x, y) in [(-1, 0), (0, -1), (2, 0), (0, 2), (i32::MAX, i32::MIN)] {
            surface.draw_point(x, y);
        }
        drop(surface);
        assert!(fb.back.chunks_exact(4).all(|px| px == BLACK));
    }
}
