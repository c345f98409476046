//! Conversion from logical pixels into clip space.

use cgmath::Vector2;

/// Maps a position in logical pixels into clip space.
pub trait ScreenTransform {
    fn transform(&self, v: Vector2<f32>) -> Vector2<f32>;
}

/// A screen of `width * height` physical pixels, where one logical pixel covers
/// `scale` physical pixels. The origin is at the center, y points down.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Screen {
    pub width: f32,
    pub height: f32,
    pub scale: f32,
}

impl Screen {
    pub fn new(width: f32, height: f32, scale: f32) -> Self {
        Screen {
            width,
            height,
            scale,
        }
    }
}

impl Default for Screen {
    fn default() -> Self {
        Screen::new(1024.0, 768.0, 1.0)
    }
}

impl ScreenTransform for Screen {
    fn transform(&self, v: Vector2<f32>) -> Vector2<f32> {
        Vector2::new(
            v.x * 2.0 / self.scale / self.width,
            v.y * -2.0 / self.scale / self.height,
        )
    }
}
