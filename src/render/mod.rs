mod camera;
pub mod handles;
pub mod pick;

pub use camera::CameraNavigator;
pub use handles::{Handle, ResizeHandles};
pub use pick::{PickHit, PickKind, PickTarget, Ray};

use glam::Vec2;

/// Size of the surface the gallery is presented on, in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    /// Pixel position (top-left origin) to normalized device coordinates
    /// (centre origin, y up).
    pub fn to_ndc(&self, pixel: Vec2) -> Vec2 {
        Vec2::new(
            pixel.x / self.width as f32 * 2.0 - 1.0,
            1.0 - pixel.y / self.height as f32 * 2.0,
        )
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280, 720)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ndc_corners() {
        let viewport = Viewport::new(800, 600);
        assert_eq!(viewport.to_ndc(Vec2::new(400.0, 300.0)), Vec2::ZERO);
        assert_eq!(viewport.to_ndc(Vec2::ZERO), Vec2::new(-1.0, 1.0));
        assert_eq!(viewport.to_ndc(Vec2::new(800.0, 600.0)), Vec2::new(1.0, -1.0));
    }

    #[test]
    fn zero_sized_viewport_is_clamped() {
        let viewport = Viewport::new(0, 0);
        assert_eq!(viewport.aspect(), 1.0);
    }
}
