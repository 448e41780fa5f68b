//! Viewport that follows the player
//!
//! The focus point trails the player exponentially, so sudden moves don't
//! snap the view while it still keeps up.

use glam::Vec2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    /// World-space point drawn at the centre of the screen
    pub focus: Vec2,
    /// Screen size in pixels
    pub viewport: Vec2,
}

impl Camera {
    pub fn new(focus: Vec2, viewport: Vec2) -> Self {
        Self { focus, viewport }
    }

    /// Move the focus a fraction of the way toward `target`
    pub fn follow(&mut self, target: Vec2, smoothing: f32) {
        self.focus += (target - self.focus) * smoothing;
    }

    /// Display surface changed size; entity state is untouched
    pub fn resize(&mut self, width: f32, height: f32) {
        self.viewport = Vec2::new(width, height);
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.viewport / 2.0
    }

    #[inline]
    pub fn world_to_screen(&self, world: Vec2) -> Vec2 {
        world - self.focus + self.center()
    }

    #[inline]
    pub fn screen_to_world(&self, screen: Vec2) -> Vec2 {
        screen - self.center() + self.focus
    }

    /// Whether a circle at `world` with `radius` intersects the screen
    pub fn is_visible(&self, world: Vec2, radius: f32) -> bool {
        let s = self.world_to_screen(world);
        s.x + radius >= 0.0
            && s.y + radius >= 0.0
            && s.x - radius <= self.viewport.x
            && s.y - radius <= self.viewport.y
    }
}
